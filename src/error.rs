use bevy::prelude::Entity;
use thiserror::Error;

/// Errors surfaced by the flex spline layout engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlexSplineError {
    /// The entity that owns the generated instances no longer exists,
    /// so no instance can be created for it.
    #[error("owner entity {0} no longer exists, cannot create instances")]
    OwnerMissing(Entity),
    /// A layer with this name is already present.
    #[error("a mesh layer named `{0}` already exists")]
    DuplicateLayer(String),
    /// No layer with this name is present.
    #[error("no mesh layer named `{0}`")]
    UnknownLayer(String),
    /// A per-point edit addressed a point that does not exist.
    #[error("point index {index} is out of range for {len} points")]
    PointOutOfRange { index: usize, len: usize },
}
