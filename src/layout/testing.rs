use std::collections::{HashMap, HashSet};

use bevy::prelude::*;

use crate::error::FlexSplineError;
use crate::layout::host::{ArrowUpdate, InstanceHost, InstanceUpdate, LabelUpdate};
use crate::layout::layers::MeshKind;

/// Host that mints entities in a scratch world and records every update.
#[derive(Default)]
pub(crate) struct RecordingHost {
    world: World,
    pub kinds: HashMap<Entity, MeshKind>,
    pub arrows: HashSet<Entity>,
    pub labels: HashSet<Entity>,
    pub instance_updates: HashMap<Entity, InstanceUpdate>,
    pub arrow_updates: HashMap<Entity, ArrowUpdate>,
    pub label_updates: HashMap<Entity, LabelUpdate>,
    pub fail_spawns: bool,
}

impl RecordingHost {
    /// A host whose every spawn fails.
    pub fn failing() -> Self {
        Self {
            fail_spawns: true,
            ..Default::default()
        }
    }

    fn mint(&mut self) -> Result<Entity, FlexSplineError> {
        if self.fail_spawns {
            return Err(FlexSplineError::OwnerMissing(Entity::PLACEHOLDER));
        }
        Ok(self.world.spawn_empty().id())
    }

    pub fn visible_instances(&self) -> usize {
        self.instance_updates
            .values()
            .filter(|update| !matches!(update, InstanceUpdate::Hidden))
            .count()
    }
}

impl InstanceHost for RecordingHost {
    fn spawn_mesh(&mut self, kind: MeshKind) -> Result<Entity, FlexSplineError> {
        let entity = self.mint()?;
        self.kinds.insert(entity, kind);
        Ok(entity)
    }

    fn spawn_arrow(&mut self) -> Result<Entity, FlexSplineError> {
        let entity = self.mint()?;
        self.arrows.insert(entity);
        Ok(entity)
    }

    fn spawn_label(&mut self) -> Result<Entity, FlexSplineError> {
        let entity = self.mint()?;
        self.labels.insert(entity);
        Ok(entity)
    }

    fn despawn(&mut self, handle: Entity) {
        self.world.despawn(handle);
        self.kinds.remove(&handle);
        self.arrows.remove(&handle);
        self.labels.remove(&handle);
        self.instance_updates.remove(&handle);
        self.arrow_updates.remove(&handle);
        self.label_updates.remove(&handle);
    }

    fn is_alive(&self, handle: Entity) -> bool {
        self.world.get_entity(handle).is_ok()
    }

    fn mesh_kind(&self, handle: Entity) -> Option<MeshKind> {
        self.kinds.get(&handle).copied()
    }

    fn apply_instance(&mut self, handle: Entity, update: InstanceUpdate) {
        self.instance_updates.insert(handle, update);
    }

    fn apply_arrow(&mut self, handle: Entity, update: ArrowUpdate) {
        self.arrow_updates.insert(handle, update);
    }

    fn apply_label(&mut self, handle: Entity, update: LabelUpdate) {
        self.label_updates.insert(handle, update);
    }
}
