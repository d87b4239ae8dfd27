//! Collision of generated instances through avian3d.

use avian3d::prelude::*;
use bevy::prelude::*;

use crate::layout::{CollisionMode, CollisionSettings};

use super::CollisionProfiles;

/// Collider an instance receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColliderKind {
    /// Reports overlaps without a contact response.
    Sensor,
    Solid,
}

fn collider_kind(settings: &CollisionSettings, has_mesh: bool) -> Option<ColliderKind> {
    match settings.mode {
        _ if !has_mesh => None,
        CollisionMode::NoCollision => None,
        CollisionMode::QueryOnly => Some(ColliderKind::Sensor),
        CollisionMode::PhysicsOnly | CollisionMode::QueryAndPhysics => Some(ColliderKind::Solid),
    }
}

/// Mirror [`CollisionSettings`] onto avian3d components.
///
/// Enabled instances get a static trimesh collider built from their mesh.
pub fn sync_instance_collision(
    mut commands: Commands,
    profiles: Res<CollisionProfiles>,
    instances: Query<
        (Entity, &CollisionSettings, Has<Mesh3d>),
        Or<(Changed<CollisionSettings>, Changed<Mesh3d>)>,
    >,
) {
    for (entity, settings, has_mesh) in &instances {
        let mut entity_commands = commands.entity(entity);

        let Some(kind) = collider_kind(settings, has_mesh) else {
            entity_commands.remove::<(
                RigidBody,
                Collider,
                ColliderConstructor,
                Sensor,
                CollisionEventsEnabled,
                CollisionLayers,
            )>();
            continue;
        };

        if !profiles.contains(&settings.profile) {
            warn!(
                "Unknown collision profile `{}` on {entity}, using the fallback",
                settings.profile
            );
        }

        entity_commands.insert((
            RigidBody::Static,
            ColliderConstructor::TrimeshFromMesh,
            profiles.layers(&settings.profile),
        ));

        match kind {
            ColliderKind::Sensor => entity_commands.insert(Sensor),
            ColliderKind::Solid => entity_commands.remove::<Sensor>(),
        };

        if settings.overlap_events {
            entity_commands.insert(CollisionEventsEnabled);
        } else {
            entity_commands.remove::<CollisionEventsEnabled>();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(mode: CollisionMode) -> CollisionSettings {
        CollisionSettings {
            mode,
            profile: "BlockAll".to_string(),
            overlap_events: false,
        }
    }

    #[test]
    fn test_query_only_is_a_sensor() {
        assert_eq!(
            collider_kind(&settings(CollisionMode::QueryOnly), true),
            Some(ColliderKind::Sensor)
        );
    }

    #[test]
    fn test_physics_modes_are_solid() {
        for mode in [CollisionMode::PhysicsOnly, CollisionMode::QueryAndPhysics] {
            assert_eq!(collider_kind(&settings(mode), true), Some(ColliderKind::Solid));
        }
    }

    #[test]
    fn test_no_collider_without_mesh_or_collision() {
        assert_eq!(collider_kind(&settings(CollisionMode::NoCollision), true), None);
        assert_eq!(collider_kind(&settings(CollisionMode::QueryAndPhysics), false), None);
    }
}
