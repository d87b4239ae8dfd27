//! Engine-agnostic layout of mesh layers along a curve.
//!
//! Everything here is pure: a [`FlexLayout`] is reconciled against any
//! [`CurvePoints`] implementation and pushes its results through an
//! [`InstanceHost`]. The Bevy side lives in [`crate::flex`].

mod curve;
mod host;
mod identity;
mod layers;
mod placement;
mod point;
mod policy;
pub mod random;
mod rebuild;
mod store;
mod sync;
pub mod visibility;

#[cfg(test)]
pub(crate) mod testing;

pub use curve::CurvePoints;
pub use host::{
    ArrowUpdate, CollisionSettings, InstanceAppearance, InstanceHost, InstanceUpdate, LabelUpdate,
};
pub use identity::{deleted_indices, diff_points, inserted_indices, point_hash, PointDiff};
pub use layers::{
    CoordinateSpace, ForwardAxis, LayerConfig, LayerMap, LocationInfo, MeshInfo, MeshKind,
    MeshLayer, PhysicsInfo, RenderInfo, RenderMode, RotationInfo, ScaleInfo, UpVectorInfo,
};
pub use placement::{DeformedPlacement, Placement, SegmentPlacement};
pub use point::{CrossSection, PointOverride};
pub use policy::{CollisionMode, GlobalConfig, GlobalPolicy};
pub use rebuild::{rebuild, Rebuild, RebuildPhase, RebuildReport};
pub use store::{DebugDisplay, FlexLayout};
pub use sync::{start_section, synchronized_previous};
