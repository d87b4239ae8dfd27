//! # bevy_flex_spline
//!
//! A Bevy plugin that lays out configurable mesh layers along 3D splines.
//!
//! ## Features
//!
//! - Deformable layers bend one mesh per spline segment
//! - Rigid layers place one mesh per control point
//! - Per-point overrides for roll, scale, offset and up direction
//! - Deterministic, seeded randomization of offsets, rotations and scales
//! - Stable per-point identity: inserting or deleting a control point only
//!   touches the instances of that point
//! - Optional avian3d colliders on generated meshes
//!
//! ## Quick Start
//!
//! ```ignore
//! use bevy::prelude::*;
//! use bevy_flex_spline::prelude::*;
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(DefaultPlugins)
//!         .add_plugins(FlexSplinePlugin)
//!         .add_systems(Startup, setup)
//!         .run();
//! }
//!
//! fn setup(mut commands: Commands, mut meshes: ResMut<Assets<Mesh>>) {
//!     let rail = meshes.add(Cuboid::new(0.2, 0.1, 1.0));
//!     let post = meshes.add(Cylinder::new(0.1, 1.0));
//!
//!     let layout = FlexLayout::new()
//!         .with_layer("Rails", LayerConfig::new(MeshKind::Deformable, rail))
//!         .unwrap()
//!         .with_layer("Posts", LayerConfig::new(MeshKind::Rigid, post))
//!         .unwrap();
//!
//!     commands.spawn((
//!         Spline::new([
//!             Vec3::new(-4.0, 0.0, 0.0),
//!             Vec3::new(0.0, 1.0, 2.0),
//!             Vec3::new(4.0, 0.0, 0.0),
//!         ]),
//!         FlexSpline::new(layout),
//!     ));
//! }
//! ```
//!
//! ## Modules
//!
//! - [`layout`]: the engine-independent layout engine
//! - [`flex`]: Bevy components, systems and [`FlexSplinePlugin`]
//! - [`spline`]: the Hermite spline the layout follows

pub mod error;
pub mod flex;
pub mod geometry;
pub mod layout;
pub mod spline;

pub use flex::FlexSplinePlugin;
pub use spline::SplinePlugin;

/// Convenient re-exports of commonly used types.
pub mod prelude {
    pub use crate::error::FlexSplineError;
    pub use crate::flex::{
        deform_mesh, CollisionProfiles, FlexCollisionLayer, FlexInstance, FlexSpline,
        FlexSplinePlugin, FlexSplineSettings, NeedsRebuild, PointLabel, UpArrow,
    };
    pub use crate::geometry::Rotator;
    pub use crate::layout::{
        CollisionMode, CollisionSettings, CoordinateSpace, CurvePoints, FlexLayout, ForwardAxis,
        GlobalConfig, GlobalPolicy, LayerConfig, MeshKind, PointOverride, RenderMode,
    };
    pub use crate::spline::{Spline, SplinePlugin, SplinePoint};
}
