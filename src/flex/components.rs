use std::collections::HashMap;

use avian3d::prelude::*;
use bevy::prelude::*;

use crate::layout::{FlexLayout, MeshKind};
use crate::spline::Spline;

/// Lays out mesh layers along the [`Spline`] of the same entity.
///
/// Generated instances are spawned as children, so everything they carry
/// is expressed in the spline's local space.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
#[require(Spline, Transform, Visibility)]
pub struct FlexSpline {
    pub layout: FlexLayout,
    /// Whether changes to the spline or layout trigger a rebuild.
    pub enabled: bool,
}

impl Default for FlexSpline {
    fn default() -> Self {
        Self {
            layout: FlexLayout::default(),
            enabled: true,
        }
    }
}

impl FlexSpline {
    pub fn new(layout: FlexLayout) -> Self {
        Self {
            layout,
            ..default()
        }
    }
}

/// Marker for flex splines waiting for a rebuild.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct NeedsRebuild;

/// A mesh instance generated by a [`FlexSpline`].
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlexInstance {
    pub owner: Entity,
    pub kind: MeshKind,
}

/// Undeformed mesh of a deformable instance.
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct SegmentSource(pub Handle<Mesh>);

/// Marker for deformable instances whose mesh must be regenerated.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct NeedsDeform;

/// Debug arrow showing the resolved up direction of a deformed segment.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct UpArrow {
    pub owner: Entity,
    /// Unit direction in the owner's space.
    pub direction: Vec3,
    pub layer_slot: usize,
    pub size: f32,
}

/// Debug label marking a control point.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct PointLabel {
    pub owner: Entity,
    pub index: usize,
    pub size: f32,
    pub color: Color,
}

/// Settings shared by every flex spline.
#[derive(Resource, Debug, Clone)]
pub struct FlexSplineSettings {
    /// Whether flex splines rebuild at all.
    pub enabled: bool,
    /// Whether to draw debug gizmos.
    pub show_debug: bool,
    /// Line segments per spline segment when drawing the curve.
    pub curve_resolution: usize,
    pub curve_color: Color,
    /// Up arrow colours, indexed by layer position. Layers past the end
    /// share the last colour.
    pub arrow_palette: Vec<Color>,
    /// Used by layers without a material of their own.
    pub default_material: Handle<StandardMaterial>,
}

impl Default for FlexSplineSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            show_debug: true,
            curve_resolution: 16,
            curve_color: Color::srgb(0.5, 0.5, 0.5),
            arrow_palette: vec![
                Color::srgb(1.0, 0.65, 0.0),
                Color::srgb(0.0, 1.0, 0.0),
                Color::srgb(0.0, 0.0, 1.0),
                Color::srgb(1.0, 0.0, 0.0),
                Color::srgb(0.31, 0.78, 0.47),
                Color::srgb(1.0, 0.0, 1.0),
                Color::srgb(0.0, 1.0, 1.0),
                Color::srgb(1.0, 1.0, 0.0),
                Color::srgb(0.5, 0.0, 0.5),
                Color::srgb(0.25, 0.88, 0.82),
                Color::srgb(0.75, 0.75, 0.75),
            ],
            default_material: Handle::default(),
        }
    }
}

impl FlexSplineSettings {
    /// Toggle debug drawing on/off.
    pub fn toggle_debug(&mut self) {
        self.show_debug = !self.show_debug;
    }

    pub fn arrow_color(&self, layer_slot: usize) -> Color {
        let last = self.arrow_palette.len().saturating_sub(1);
        self.arrow_palette
            .get(layer_slot.min(last))
            .copied()
            .unwrap_or(Color::WHITE)
    }
}

/// Physics layers used by the built-in collision profiles.
#[derive(PhysicsLayer, Clone, Copy, Debug, Default)]
pub enum FlexCollisionLayer {
    #[default]
    Default,
    /// Geometry generated along flex splines.
    Spline,
}

/// Named collision profiles, resolved into avian3d collision layers.
#[derive(Resource, Debug, Clone)]
pub struct CollisionProfiles {
    profiles: HashMap<String, CollisionLayers>,
    /// Used for names that are not registered.
    pub fallback: CollisionLayers,
}

impl Default for CollisionProfiles {
    fn default() -> Self {
        let block_all = CollisionLayers::new(LayerMask::ALL, LayerMask::ALL);
        let mut profiles = HashMap::new();
        profiles.insert("BlockAll".to_string(), block_all);
        profiles.insert(
            "Spline".to_string(),
            CollisionLayers::new(FlexCollisionLayer::Spline, LayerMask::ALL),
        );
        Self {
            profiles,
            fallback: block_all,
        }
    }
}

impl CollisionProfiles {
    pub fn insert(&mut self, name: impl Into<String>, layers: CollisionLayers) {
        self.profiles.insert(name.into(), layers);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.profiles.contains_key(name)
    }

    /// Layers of the named profile, or the fallback.
    pub fn layers(&self, name: &str) -> CollisionLayers {
        self.profiles.get(name).copied().unwrap_or(self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arrow_palette_clamps() {
        let settings = FlexSplineSettings::default();
        assert_eq!(settings.arrow_color(0), Color::srgb(1.0, 0.65, 0.0));
        assert_eq!(settings.arrow_color(100), Color::srgb(0.75, 0.75, 0.75));

        let empty = FlexSplineSettings {
            arrow_palette: Vec::new(),
            ..default()
        };
        assert_eq!(empty.arrow_color(3), Color::WHITE);
    }

    #[test]
    fn test_unknown_profile_falls_back() {
        let mut profiles = CollisionProfiles::default();
        assert!(profiles.contains("BlockAll"));
        assert_eq!(profiles.layers("Missing"), profiles.fallback);

        let custom = CollisionLayers::new(FlexCollisionLayer::Default, FlexCollisionLayer::Spline);
        profiles.insert("Rails", custom);
        assert_eq!(profiles.layers("Rails"), custom);
    }
}
