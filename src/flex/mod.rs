mod components;
mod deform;
mod host;
mod physics;
mod systems;

#[cfg(feature = "debug-gizmos")]
mod debug;

pub use components::*;
pub use deform::deform_mesh;

use bevy::prelude::*;

use crate::layout::{FlexLayout, LayerConfig, PointOverride, SegmentPlacement};
use crate::spline::SplinePlugin;

/// Plugin that lays out meshes along splines carrying a [`FlexSpline`].
///
/// # Usage
///
/// ```ignore
/// use bevy::prelude::*;
/// use bevy_flex_spline::prelude::*;
///
/// fn setup(mut commands: Commands, mut meshes: ResMut<Assets<Mesh>>) {
///     let rail = meshes.add(Cuboid::new(0.2, 0.2, 1.0));
///     let layout = FlexLayout::new()
///         .with_layer("Rails", LayerConfig::new(MeshKind::Deformable, rail))
///         .unwrap();
///
///     commands.spawn((
///         Spline::new([Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0), Vec3::new(8.0, 0.0, 3.0)]),
///         FlexSpline::new(layout),
///     ));
/// }
/// ```
///
/// Any change to the [`Spline`](crate::spline::Spline) or the
/// [`FlexSpline`] of an entity rebuilds its instances in the same frame.
/// Instances are children of the spline entity.
pub struct FlexSplinePlugin;

impl Plugin for FlexSplinePlugin {
    fn build(&self, app: &mut App) {
        if !app.is_plugin_added::<SplinePlugin>() {
            app.add_plugins(SplinePlugin);
        }

        app.init_resource::<FlexSplineSettings>()
            .init_resource::<CollisionProfiles>()
            .register_type::<FlexSpline>()
            .register_type::<FlexLayout>()
            .register_type::<LayerConfig>()
            .register_type::<PointOverride>()
            .register_type::<SegmentPlacement>()
            .add_systems(
                Update,
                (
                    systems::mark_changed_flex_splines,
                    systems::rebuild_flex_splines,
                    systems::cleanup_flex_splines,
                    deform::deform_segments,
                    physics::sync_instance_collision,
                )
                    .chain(),
            );

        #[cfg(feature = "debug-gizmos")]
        app.add_systems(
            PostUpdate,
            (
                debug::draw_flex_curves,
                debug::draw_up_arrows,
                debug::draw_point_labels,
            )
                .after(bevy::transform::TransformSystems::Propagate)
                .run_if(debug::debug_enabled),
        );
    }
}
