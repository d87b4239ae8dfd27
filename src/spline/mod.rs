mod components;

pub use components::*;

use bevy::prelude::*;

/// Plugin that registers the spline curve types for reflection/serialization.
pub struct SplinePlugin;

impl Plugin for SplinePlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<Spline>().register_type::<SplinePoint>();
    }
}
