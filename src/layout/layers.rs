use std::ops::BitOr;

use bevy::prelude::*;

use crate::error::FlexSplineError;
use crate::geometry::Rotator;
use crate::layout::policy::CollisionMode;

/// How a layer's mesh follows the curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect)]
#[reflect(Default)]
pub enum MeshKind {
    /// Bent along the segment between a point and the next one.
    #[default]
    Deformable,
    /// Placed once per point with a rigid transform.
    Rigid,
}

/// Mesh axis that runs along the curve when the mesh is deformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect)]
#[reflect(Default)]
pub enum ForwardAxis {
    X,
    Y,
    #[default]
    Z,
}

impl ForwardAxis {
    /// Split `v` into its forward component and its cross-section
    /// components, ordered (right, up).
    pub fn split(self, v: Vec3) -> (f32, Vec2) {
        match self {
            Self::X => (v.x, Vec2::new(v.z, v.y)),
            Self::Y => (v.y, Vec2::new(v.x, v.z)),
            Self::Z => (v.z, Vec2::new(v.x, v.y)),
        }
    }

    /// Copy of `v` with its forward component replaced.
    pub fn with_forward(self, mut v: Vec3, forward: f32) -> Vec3 {
        match self {
            Self::X => v.x = forward,
            Self::Y => v.y = forward,
            Self::Z => v.z = forward,
        }
        v
    }
}

/// Space an offset or rotation is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect)]
#[reflect(Default)]
pub enum CoordinateSpace {
    /// Relative to the point, following the curve direction.
    #[default]
    PointLocal,
    /// Relative to the curve's own axes.
    CurveSystem,
}

/// Which point indices of a layer may render.
///
/// Flags combine with `|`; an index renders when any selected flag claims it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
#[reflect(Default)]
pub struct RenderMode(u8);

impl RenderMode {
    pub const NONE: Self = Self(0);
    /// The first point.
    pub const HEAD: Self = Self(1 << 0);
    /// The last rendered point.
    pub const TAIL: Self = Self(1 << 1);
    /// Everything between head and tail.
    pub const MIDDLE: Self = Self(1 << 2);
    /// The indices listed in [`RenderInfo::custom_indices`].
    pub const CUSTOM: Self = Self(1 << 3);

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// True when every flag of `other` is set. `NONE` is never contained.
    pub const fn contains(self, other: Self) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl Default for RenderMode {
    fn default() -> Self {
        Self::HEAD | Self::TAIL | Self::MIDDLE
    }
}

impl BitOr for RenderMode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Reflect)]
#[reflect(Default)]
pub struct MeshInfo {
    pub kind: MeshKind,
    /// Only used by deformable meshes.
    pub forward_axis: ForwardAxis,
    pub mesh: Handle<Mesh>,
    /// Falls back to the host's default material when `None`.
    pub material: Option<Handle<StandardMaterial>>,
}

#[derive(Debug, Clone, PartialEq, Reflect)]
#[reflect(Default)]
pub struct RenderInfo {
    /// Roll each index independently instead of spreading spawns evenly.
    pub randomize_spawn_chance: bool,
    /// Probability in [0, 1] that an index renders.
    pub spawn_chance: f32,
    pub mode: RenderMode,
    pub custom_indices: Vec<usize>,
}

impl Default for RenderInfo {
    fn default() -> Self {
        Self {
            randomize_spawn_chance: true,
            spawn_chance: 1.0,
            mode: RenderMode::default(),
            custom_indices: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Reflect)]
#[reflect(Default)]
pub struct PhysicsInfo {
    pub collision: CollisionMode,
    /// Name of a collision profile known to the host.
    pub profile: String,
    pub generate_overlap_events: bool,
}

impl Default for PhysicsInfo {
    fn default() -> Self {
        Self {
            collision: CollisionMode::QueryOnly,
            profile: "BlockAll".to_string(),
            generate_overlap_events: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect)]
#[reflect(Default)]
pub struct RotationInfo {
    pub space: CoordinateSpace,
    pub rotation: Rotator,
    /// Per-component amplitude of the seeded random rotation.
    pub random_offset: Rotator,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect)]
#[reflect(Default)]
pub struct LocationInfo {
    pub space: CoordinateSpace,
    pub location: Vec3,
    /// Per-component amplitude of the seeded random offset.
    pub random_offset: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Default)]
pub struct ScaleInfo {
    pub use_uniform_scale: bool,
    pub uniform_scale: f32,
    pub scale: Vec3,
    pub use_uniform_random_offset: bool,
    pub uniform_random_offset: f32,
    pub random_offset: Vec3,
}

impl Default for ScaleInfo {
    fn default() -> Self {
        Self {
            use_uniform_scale: true,
            uniform_scale: 1.0,
            scale: Vec3::ONE,
            use_uniform_random_offset: true,
            uniform_random_offset: 0.0,
            random_offset: Vec3::ZERO,
        }
    }
}

impl ScaleInfo {
    /// Base scale before per-point and random contributions.
    pub fn base(&self) -> Vec3 {
        if self.use_uniform_scale {
            Vec3::splat(self.uniform_scale)
        } else {
            self.scale
        }
    }

    /// Amplitude of the random scale offset.
    pub fn random_amplitude(&self) -> Vec3 {
        if self.use_uniform_random_offset {
            Vec3::splat(self.uniform_random_offset)
        } else {
            self.random_offset
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Default)]
pub struct UpVectorInfo {
    /// Draw a debug arrow for the resolved up direction.
    pub show_up_direction: bool,
    pub space: CoordinateSpace,
    pub up: Vec3,
}

impl Default for UpVectorInfo {
    fn default() -> Self {
        Self {
            show_up_direction: false,
            space: CoordinateSpace::CurveSystem,
            up: Vec3::Y,
        }
    }
}

/// Full configuration of one mesh layer.
///
/// A layer is identified by its key in the [`LayerMap`], never by its
/// contents: two layers with equal settings are still distinct layers.
#[derive(Debug, Clone, Reflect)]
#[reflect(Default)]
pub struct LayerConfig {
    pub active: bool,
    /// Bridge the final point back to the first.
    pub looping: bool,
    pub mesh: MeshInfo,
    pub render: RenderInfo,
    pub physics: PhysicsInfo,
    pub rotation: RotationInfo,
    pub location: LocationInfo,
    pub scale: ScaleInfo,
    pub up_vector: UpVectorInfo,
    /// One instance handle per point, index aligned.
    #[reflect(ignore)]
    pub(crate) instances: Vec<Entity>,
    /// One up-direction arrow per point, index aligned.
    #[reflect(ignore)]
    pub(crate) arrows: Vec<Entity>,
    initialized: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            active: true,
            looping: false,
            mesh: MeshInfo::default(),
            render: RenderInfo::default(),
            physics: PhysicsInfo::default(),
            rotation: RotationInfo::default(),
            location: LocationInfo::default(),
            scale: ScaleInfo::default(),
            up_vector: UpVectorInfo::default(),
            instances: Vec::new(),
            arrows: Vec::new(),
            initialized: false,
        }
    }
}

impl LayerConfig {
    /// A layer using `mesh` with the given kind and default settings otherwise.
    pub fn new(kind: MeshKind, mesh: Handle<Mesh>) -> Self {
        Self {
            mesh: MeshInfo {
                kind,
                mesh,
                ..default()
            },
            ..default()
        }
    }

    pub fn with_material(mut self, material: Handle<StandardMaterial>) -> Self {
        self.mesh.material = Some(material);
        self
    }

    pub fn with_forward_axis(mut self, axis: ForwardAxis) -> Self {
        self.mesh.forward_axis = axis;
        self
    }

    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn with_render_mode(mut self, mode: RenderMode) -> Self {
        self.render.mode = mode;
        self
    }

    pub fn with_spawn_chance(mut self, chance: f32, randomized: bool) -> Self {
        self.render.spawn_chance = chance;
        self.render.randomize_spawn_chance = randomized;
        self
    }

    pub fn with_collision(mut self, collision: CollisionMode) -> Self {
        self.physics.collision = collision;
        self
    }

    pub fn instances(&self) -> &[Entity] {
        &self.instances
    }

    pub fn arrows(&self) -> &[Entity] {
        &self.arrows
    }

    /// Whether the layer has been given a key and template settings.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Settings of `template` with this layer's instance handles kept.
    fn adopt_template(&mut self, template: &LayerConfig) {
        let instances = std::mem::take(&mut self.instances);
        let arrows = std::mem::take(&mut self.arrows);
        *self = LayerConfig {
            instances,
            arrows,
            initialized: true,
            ..template.clone()
        };
    }
}

/// A named entry of the [`LayerMap`].
#[derive(Debug, Clone, Reflect)]
pub struct MeshLayer {
    pub name: String,
    pub config: LayerConfig,
}

/// Insertion-ordered mapping from unique layer keys to their configuration.
#[derive(Debug, Clone, Default, Reflect)]
#[reflect(Default)]
pub struct LayerMap {
    layers: Vec<MeshLayer>,
    last_generated: Option<String>,
}

impl LayerMap {
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MeshLayer> {
        self.layers.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut MeshLayer> {
        self.layers.iter_mut()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().map(|layer| layer.name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.layers.iter().any(|layer| layer.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&LayerConfig> {
        self.layers
            .iter()
            .find(|layer| layer.name == name)
            .map(|layer| &layer.config)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut LayerConfig> {
        self.layers
            .iter_mut()
            .find(|layer| layer.name == name)
            .map(|layer| &mut layer.config)
    }

    /// Append a layer under an explicit key.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        mut config: LayerConfig,
    ) -> Result<&mut LayerConfig, FlexSplineError> {
        let name = name.into();
        if self.contains(&name) {
            return Err(FlexSplineError::DuplicateLayer(name));
        }
        config.instances.clear();
        config.arrows.clear();
        config.initialized = true;
        self.layers.push(MeshLayer { name, config });
        let index = self.layers.len() - 1;
        Ok(&mut self.layers[index].config)
    }

    /// Append an unnamed layer. It receives a generated key and the
    /// template's settings on the next rebuild.
    pub fn add(&mut self) {
        self.layers.push(MeshLayer {
            name: String::new(),
            config: LayerConfig::default(),
        });
    }

    pub(crate) fn remove(&mut self, name: &str) -> Result<LayerConfig, FlexSplineError> {
        let index = self
            .layers
            .iter()
            .position(|layer| layer.name == name)
            .ok_or_else(|| FlexSplineError::UnknownLayer(name.to_string()))?;
        Ok(self.layers.remove(index).config)
    }

    /// First key of the form `Layer {n}` that is neither in use nor the
    /// previously generated key.
    pub fn generate_key(&self) -> String {
        let mut n = 0usize;
        loop {
            let key = format!("Layer {n}");
            if !self.contains(&key) && self.last_generated.as_deref() != Some(key.as_str()) {
                return key;
            }
            n += 1;
        }
    }

    /// Give every uninitialized layer a fresh key and the template's
    /// settings. Returns how many layers were initialized.
    pub(crate) fn initialize_from(&mut self, template: &LayerConfig) -> usize {
        let mut initialized = 0;
        for index in 0..self.layers.len() {
            if self.layers[index].config.initialized {
                continue;
            }
            let key = self.generate_key();
            self.last_generated = Some(key.clone());
            let layer = &mut self.layers[index];
            layer.name = key;
            layer.config.adopt_template(template);
            initialized += 1;
        }
        initialized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_mode_flags() {
        let mode = RenderMode::HEAD | RenderMode::CUSTOM;
        assert!(mode.contains(RenderMode::HEAD));
        assert!(!mode.contains(RenderMode::TAIL));
        assert!(!mode.contains(RenderMode::NONE));

        let mut mode = RenderMode::default();
        assert!(mode.contains(RenderMode::MIDDLE));
        mode.remove(RenderMode::MIDDLE);
        assert!(!mode.contains(RenderMode::MIDDLE));
        mode.insert(RenderMode::CUSTOM);
        assert_eq!(mode.bits(), 0b1011);
    }

    #[test]
    fn test_forward_axis_split() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(ForwardAxis::Z.split(v), (3.0, Vec2::new(1.0, 2.0)));
        assert_eq!(ForwardAxis::X.split(v), (1.0, Vec2::new(3.0, 2.0)));
        assert_eq!(ForwardAxis::Y.split(v), (2.0, Vec2::new(1.0, 3.0)));
        assert_eq!(ForwardAxis::Y.with_forward(Vec3::ONE, 4.0), Vec3::new(1.0, 4.0, 1.0));
    }

    #[test]
    fn test_generate_key_skips_used_and_last() {
        let mut map = LayerMap::default();
        assert_eq!(map.generate_key(), "Layer 0");

        map.insert("Layer 0", LayerConfig::default()).unwrap();
        assert_eq!(map.generate_key(), "Layer 1");

        // A removed key is not handed out again right away
        map.last_generated = Some("Layer 1".to_string());
        assert_eq!(map.generate_key(), "Layer 2");
    }

    #[test]
    fn test_insert_rejects_duplicates() {
        let mut map = LayerMap::default();
        map.insert("Rails", LayerConfig::default()).unwrap();
        assert_eq!(
            map.insert("Rails", LayerConfig::default()).unwrap_err(),
            FlexSplineError::DuplicateLayer("Rails".to_string())
        );
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_initialize_from_template() {
        let template = LayerConfig::default()
            .with_looping(true)
            .with_spawn_chance(0.5, false);

        let mut map = LayerMap::default();
        map.insert("Layer 0", LayerConfig::default()).unwrap();
        map.add();
        map.add();
        assert_eq!(map.initialize_from(&template), 2);

        let names: Vec<_> = map.names().collect();
        assert_eq!(names, ["Layer 0", "Layer 1", "Layer 2"]);

        let layer = map.get("Layer 2").unwrap();
        assert!(layer.is_initialized());
        assert!(layer.looping);
        assert_eq!(layer.render.spawn_chance, 0.5);

        // Explicitly inserted layers keep their own settings
        assert!(!map.get("Layer 0").unwrap().looping);
        assert_eq!(map.initialize_from(&template), 0);
    }

    #[test]
    fn test_remove_unknown_layer() {
        let mut map = LayerMap::default();
        assert_eq!(
            map.remove("Missing").unwrap_err(),
            FlexSplineError::UnknownLayer("Missing".to_string())
        );
    }
}
