use bevy::prelude::*;

use crate::error::FlexSplineError;
use crate::layout::layers::MeshKind;
use crate::layout::placement::SegmentPlacement;
use crate::layout::policy::CollisionMode;

/// Collision settings handed to an instance.
#[derive(Component, Debug, Clone, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct CollisionSettings {
    pub mode: CollisionMode,
    /// Name of a collision profile.
    pub profile: String,
    pub overlap_events: bool,
}

/// Render and collision state shared by both kinds of visible instance.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceAppearance {
    pub name: String,
    pub mesh: Handle<Mesh>,
    pub material: Option<Handle<StandardMaterial>>,
    pub collision: CollisionSettings,
}

/// New state of a mesh instance.
#[derive(Debug, Clone, PartialEq)]
pub enum InstanceUpdate {
    /// Invisible, no collision.
    Hidden,
    Rigid {
        appearance: InstanceAppearance,
        transform: Transform,
    },
    Deformable {
        appearance: InstanceAppearance,
        /// Relative transform applied on top of the bent mesh.
        transform: Transform,
        segment: SegmentPlacement,
    },
}

/// New state of an up-direction arrow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowUpdate {
    pub position: Vec3,
    pub direction: Vec3,
    /// Position of the owning layer, used to pick a colour.
    pub layer_slot: usize,
    pub size: f32,
    pub visible: bool,
}

/// New state of a point-number label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelUpdate {
    pub index: usize,
    pub position: Vec3,
    pub size: f32,
    pub color: Color,
    pub visible: bool,
}

/// Owner of the visual and physical instances a layout generates.
///
/// Handles are plain entities. A handle may die behind the layout's back,
/// so every handle is checked with [`InstanceHost::is_alive`] before use.
pub trait InstanceHost {
    fn spawn_mesh(&mut self, kind: MeshKind) -> Result<Entity, FlexSplineError>;

    fn spawn_arrow(&mut self) -> Result<Entity, FlexSplineError>;

    fn spawn_label(&mut self) -> Result<Entity, FlexSplineError>;

    fn despawn(&mut self, handle: Entity);

    fn is_alive(&self, handle: Entity) -> bool;

    /// Kind of a live mesh instance.
    fn mesh_kind(&self, handle: Entity) -> Option<MeshKind>;

    fn apply_instance(&mut self, handle: Entity, update: InstanceUpdate);

    fn apply_arrow(&mut self, handle: Entity, update: ArrowUpdate);

    fn apply_label(&mut self, handle: Entity, update: LabelUpdate);

    /// Despawn `handle` if it is still alive.
    fn release(&mut self, handle: Entity) {
        if self.is_alive(handle) {
            self.despawn(handle);
        }
    }
}
