use bevy::prelude::*;

use crate::spline::Spline;

use super::host::WorldHost;
use super::{FlexInstance, FlexSpline, FlexSplineSettings, NeedsRebuild, PointLabel, UpArrow};

/// Mark flex splines whose curve or layout changed.
pub fn mark_changed_flex_splines(
    mut commands: Commands,
    changed: Query<Entity, (With<FlexSpline>, Or<(Changed<Spline>, Changed<FlexSpline>)>)>,
) {
    for entity in &changed {
        commands.entity(entity).insert(NeedsRebuild);
    }
}

/// Rebuild every flex spline marked [`NeedsRebuild`].
///
/// The layout is written back without triggering change detection, so a
/// rebuild never schedules another one.
pub fn rebuild_flex_splines(world: &mut World) {
    let Some(settings) = world.get_resource::<FlexSplineSettings>() else {
        return;
    };
    if !settings.enabled {
        return;
    }
    let default_material = settings.default_material.clone();

    let owners: Vec<Entity> = world
        .query_filtered::<Entity, (With<FlexSpline>, With<NeedsRebuild>)>()
        .iter(world)
        .collect();

    for owner in owners {
        let Ok(mut entity) = world.get_entity_mut(owner) else {
            continue;
        };
        entity.remove::<NeedsRebuild>();

        let Some(spline) = entity.get::<Spline>().cloned() else {
            continue;
        };
        let Some(mut flex) = entity.get_mut::<FlexSpline>() else {
            continue;
        };
        if !flex.enabled {
            continue;
        }
        let mut layout = std::mem::take(&mut flex.bypass_change_detection().layout);

        let mut host = WorldHost::new(world, owner, default_material.clone());
        let result = layout.rebuild(&spline, &mut host);

        if let Some(mut flex) = world.get_mut::<FlexSpline>(owner) {
            flex.bypass_change_detection().layout = layout;
        }

        match result {
            Ok(report) => debug!("Rebuilt flex spline {owner}: {report:?}"),
            Err(err) => error!("Failed to rebuild flex spline {owner}: {err}"),
        }
    }
}

/// Despawn everything generated for flex splines that were removed.
pub fn cleanup_flex_splines(
    mut commands: Commands,
    mut removed: RemovedComponents<FlexSpline>,
    instances: Query<(Entity, &FlexInstance)>,
    arrows: Query<(Entity, &UpArrow)>,
    labels: Query<(Entity, &PointLabel)>,
) {
    for owner in removed.read() {
        let generated = instances
            .iter()
            .filter(|(_, instance)| instance.owner == owner)
            .map(|(entity, _)| entity)
            .chain(arrows.iter().filter(|(_, arrow)| arrow.owner == owner).map(|(e, _)| e))
            .chain(labels.iter().filter(|(_, label)| label.owner == owner).map(|(e, _)| e));

        for entity in generated {
            if let Ok(mut entity_commands) = commands.get_entity(entity) {
                entity_commands.despawn();
            }
        }
    }
}
