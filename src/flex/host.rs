use bevy::ecs::component::Mutable;
use bevy::prelude::*;

use crate::error::FlexSplineError;
use crate::layout::{
    ArrowUpdate, CollisionMode, CollisionSettings, InstanceAppearance, InstanceHost, InstanceUpdate,
    LabelUpdate, MeshKind, SegmentPlacement,
};

use super::{FlexInstance, NeedsDeform, PointLabel, SegmentSource, UpArrow};

/// Hosts the instances of one flex spline as children of its entity.
pub(crate) struct WorldHost<'w> {
    world: &'w mut World,
    owner: Entity,
    default_material: Handle<StandardMaterial>,
}

/// Write `value` only when it differs, so unchanged instances keep their
/// change ticks. Returns whether anything was written.
fn insert_if_changed<T>(entity: &mut EntityWorldMut, value: T) -> bool
where
    T: Component<Mutability = Mutable> + PartialEq,
{
    match entity.get_mut::<T>() {
        Some(mut current) => current.set_if_neq(value),
        None => {
            entity.insert(value);
            true
        }
    }
}

impl<'w> WorldHost<'w> {
    pub fn new(
        world: &'w mut World,
        owner: Entity,
        default_material: Handle<StandardMaterial>,
    ) -> Self {
        Self {
            world,
            owner,
            default_material,
        }
    }

    fn spawn_child(&mut self, bundle: impl Bundle) -> Result<Entity, FlexSplineError> {
        if self.world.get_entity(self.owner).is_err() {
            return Err(FlexSplineError::OwnerMissing(self.owner));
        }
        let entity = self
            .world
            .spawn((bundle, Transform::default(), Visibility::Hidden, ChildOf(self.owner)))
            .id();
        Ok(entity)
    }
}

impl InstanceHost for WorldHost<'_> {
    fn spawn_mesh(&mut self, kind: MeshKind) -> Result<Entity, FlexSplineError> {
        let owner = self.owner;
        self.spawn_child(FlexInstance { owner, kind })
    }

    fn spawn_arrow(&mut self) -> Result<Entity, FlexSplineError> {
        let owner = self.owner;
        self.spawn_child(UpArrow {
            owner,
            direction: Vec3::Y,
            layer_slot: 0,
            size: 1.0,
        })
    }

    fn spawn_label(&mut self) -> Result<Entity, FlexSplineError> {
        let owner = self.owner;
        self.spawn_child(PointLabel {
            owner,
            index: 0,
            size: 1.0,
            color: Color::WHITE,
        })
    }

    fn despawn(&mut self, handle: Entity) {
        self.world.despawn(handle);
    }

    fn is_alive(&self, handle: Entity) -> bool {
        self.world.get_entity(handle).is_ok()
    }

    fn mesh_kind(&self, handle: Entity) -> Option<MeshKind> {
        self.world.get::<FlexInstance>(handle).map(|instance| instance.kind)
    }

    fn apply_instance(&mut self, handle: Entity, update: InstanceUpdate) {
        let default_material = self.default_material.clone();
        let Ok(mut entity) = self.world.get_entity_mut(handle) else {
            return;
        };

        match update {
            InstanceUpdate::Hidden => {
                insert_if_changed(&mut entity, Visibility::Hidden);
                if let Some(mut collision) = entity.get_mut::<CollisionSettings>() {
                    if collision.mode != CollisionMode::NoCollision {
                        collision.mode = CollisionMode::NoCollision;
                    }
                }
            }
            InstanceUpdate::Rigid {
                appearance,
                transform,
            } => {
                let mesh = appearance.mesh.clone();
                apply_appearance(&default_material, &mut entity, appearance);
                insert_if_changed(&mut entity, transform);
                insert_if_changed(&mut entity, Mesh3d(mesh));
                entity.remove::<(SegmentSource, SegmentPlacement, NeedsDeform)>();
            }
            InstanceUpdate::Deformable {
                appearance,
                transform,
                segment,
            } => {
                let source = SegmentSource(appearance.mesh.clone());
                apply_appearance(&default_material, &mut entity, appearance);
                insert_if_changed(&mut entity, transform);
                let source_changed = insert_if_changed(&mut entity, source);
                let segment_changed = insert_if_changed(&mut entity, segment);
                if source_changed || segment_changed || !entity.contains::<Mesh3d>() {
                    entity.insert(NeedsDeform);
                }
            }
        }
    }

    fn apply_arrow(&mut self, handle: Entity, update: ArrowUpdate) {
        let owner = self.owner;
        let Ok(mut entity) = self.world.get_entity_mut(handle) else {
            return;
        };
        insert_if_changed(&mut entity, Transform::from_translation(update.position));
        insert_if_changed(
            &mut entity,
            UpArrow {
                owner,
                direction: update.direction,
                layer_slot: update.layer_slot,
                size: update.size,
            },
        );
        insert_if_changed(&mut entity, visibility(update.visible));
    }

    fn apply_label(&mut self, handle: Entity, update: LabelUpdate) {
        let owner = self.owner;
        let Ok(mut entity) = self.world.get_entity_mut(handle) else {
            return;
        };
        insert_if_changed(&mut entity, Name::new(format!("Point {}", update.index)));
        insert_if_changed(&mut entity, Transform::from_translation(update.position));
        insert_if_changed(
            &mut entity,
            PointLabel {
                owner,
                index: update.index,
                size: update.size,
                color: update.color,
            },
        );
        insert_if_changed(&mut entity, visibility(update.visible));
    }
}

fn apply_appearance(
    default_material: &Handle<StandardMaterial>,
    entity: &mut EntityWorldMut,
    appearance: InstanceAppearance,
) {
    let material = appearance
        .material
        .unwrap_or_else(|| default_material.clone());
    insert_if_changed(entity, Name::new(appearance.name));
    insert_if_changed(entity, Visibility::Inherited);
    insert_if_changed(entity, MeshMaterial3d(material));
    insert_if_changed(entity, appearance.collision);
}

fn visibility(visible: bool) -> Visibility {
    if visible {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    }
}
