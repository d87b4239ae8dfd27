//! The rebuild pipeline: diff, reconcile, place.

use bevy::prelude::*;

use crate::error::FlexSplineError;
use crate::layout::curve::CurvePoints;
use crate::layout::host::{
    ArrowUpdate, CollisionSettings, InstanceAppearance, InstanceHost, InstanceUpdate, LabelUpdate,
};
use crate::layout::identity::{diff_points, PointDiff};
use crate::layout::layers::{MeshKind, MeshLayer};
use crate::layout::placement::{DeformedPlacement, Placement};
use crate::layout::store::{DebugDisplay, FlexLayout};
use crate::layout::visibility::{self, instance_name, InstanceVisibility};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RebuildPhase {
    #[default]
    Idle,
    /// Comparing recorded point ids against the curve.
    Diffing,
    /// Bringing overrides and instance arrays to the curve's point count.
    Reconciling,
    /// Pushing visibility and placement to every instance.
    Placing,
}

/// What a rebuild changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildReport {
    /// Curve indices of points that appeared, ascending.
    pub inserted_points: Vec<usize>,
    /// Former indices of points that disappeared, descending.
    pub deleted_points: Vec<usize>,
    pub initialized_layers: usize,
    /// Handles of removed layers released by this rebuild.
    pub released_handles: usize,
    pub spawned_instances: usize,
    /// Instances recreated because their layer changed mesh kind.
    pub replaced_instances: usize,
    pub visible_instances: usize,
    pub hidden_instances: usize,
    /// Handles that died during placement and were left untouched.
    pub skipped_instances: usize,
}

/// One pass over a layout, from [`RebuildPhase::Idle`] back to idle.
pub struct Rebuild<'a, C, H> {
    layout: &'a mut FlexLayout,
    curve: &'a C,
    host: &'a mut H,
    phase: RebuildPhase,
    report: RebuildReport,
}

/// Run a full rebuild of `layout` against `curve`.
pub fn rebuild<C: CurvePoints, H: InstanceHost>(
    layout: &mut FlexLayout,
    curve: &C,
    host: &mut H,
) -> Result<RebuildReport, FlexSplineError> {
    Rebuild::new(layout, curve, host).run()
}

impl<'a, C: CurvePoints, H: InstanceHost> Rebuild<'a, C, H> {
    pub fn new(layout: &'a mut FlexLayout, curve: &'a C, host: &'a mut H) -> Self {
        Self {
            layout,
            curve,
            host,
            phase: RebuildPhase::Idle,
            report: RebuildReport::default(),
        }
    }

    pub fn phase(&self) -> RebuildPhase {
        self.phase
    }

    fn enter(&mut self, phase: RebuildPhase) {
        trace!("Flex spline rebuild: {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    pub fn run(mut self) -> Result<RebuildReport, FlexSplineError> {
        self.enter(RebuildPhase::Diffing);
        let diff = diff_points(&self.layout.points, self.curve);

        self.enter(RebuildPhase::Reconciling);
        self.reconcile(&diff)?;

        self.enter(RebuildPhase::Placing);
        self.place()?;

        self.enter(RebuildPhase::Idle);
        self.report.inserted_points = diff.inserted;
        self.report.deleted_points = diff.deleted;
        Ok(self.report)
    }

    fn reconcile(&mut self, diff: &PointDiff) -> Result<(), FlexSplineError> {
        let count = self.curve.point_count();
        let layout = &mut *self.layout;
        let host = &mut *self.host;

        self.report.initialized_layers = layout.initialize_layers();
        self.report.released_handles = layout.release_pending(host);

        if !diff.is_empty() {
            debug!(
                "Flex spline points changed: inserted {:?}, deleted {:?}",
                diff.inserted, diff.deleted
            );
        }

        layout.insert_points(&diff.inserted, count, host)?;
        layout.grow_points(count, host)?;
        layout.shrink_points(&diff.deleted, count, host);

        self.report.spawned_instances += layout.insert_layer_slots(&diff.inserted, count, host)?;
        self.report.spawned_instances += layout.grow_layer_slots(count, host)?;
        layout.shrink_layer_slots(&diff.deleted, count, host);

        let respawned = layout.replace_dead_handles(host)?;
        if respawned > 0 {
            debug!("Respawned {respawned} dead flex spline instances");
        }
        self.report.spawned_instances += respawned;
        Ok(())
    }

    fn place(&mut self) -> Result<(), FlexSplineError> {
        let count = self.curve.point_count();
        self.layout.refresh_ids(self.curve);

        let FlexLayout {
            policy,
            layers,
            points,
            debug: display,
            ..
        } = &mut *self.layout;

        for (slot, layer) in layers.iter_mut().enumerate() {
            let MeshLayer { name, config } = layer;
            for index in 0..count.min(config.instances.len()) {
                let handle = config.instances[index];
                if !self.host.is_alive(handle) {
                    debug!("Skipping dead instance {} of layer `{}`", index, name);
                    self.report.skipped_instances += 1;
                    continue;
                }

                let kind = config.mesh.kind;
                if self.host.mesh_kind(handle) != Some(kind) {
                    self.host.despawn(handle);
                    config.instances[index] = self.host.spawn_mesh(kind)?;
                    self.report.replaced_instances += 1;
                }
                let handle = config.instances[index];

                let placement =
                    Placement::new(self.curve, name.as_str(), config, points.as_slice(), policy);
                let update = instance_update(&placement, index, count);
                if update == InstanceUpdate::Hidden {
                    self.report.hidden_instances += 1;
                } else {
                    self.report.visible_instances += 1;
                }
                self.host.apply_instance(handle, update);

                if let Some(&arrow) = config.arrows.get(index) {
                    if self.host.is_alive(arrow) {
                        let update = arrow_update(&placement, slot, index, count, display);
                        self.host.apply_arrow(arrow, update);
                    }
                }
            }
        }

        for (index, point) in points.iter().enumerate() {
            let Some(label) = point.label.filter(|&label| self.host.is_alive(label)) else {
                continue;
            };
            self.host.apply_label(
                label,
                LabelUpdate {
                    index,
                    position: self.curve.location(index),
                    size: display.point_number_size,
                    color: display.label_color,
                    visible: display.show_point_numbers,
                },
            );
        }
        Ok(())
    }
}

fn instance_update<C: CurvePoints>(
    placement: &Placement<'_, C>,
    index: usize,
    count: usize,
) -> InstanceUpdate {
    let config = placement.config;
    let name = instance_name(placement.layer_name, index);
    let InstanceVisibility::Shown { collision } =
        visibility::resolve(placement.policy, config, index, count, &name)
    else {
        return InstanceUpdate::Hidden;
    };

    let appearance = InstanceAppearance {
        name,
        mesh: config.mesh.mesh.clone(),
        material: config.mesh.material.clone(),
        collision: CollisionSettings {
            mode: collision,
            profile: config.physics.profile.clone(),
            overlap_events: config.physics.generate_overlap_events,
        },
    };

    match config.mesh.kind {
        MeshKind::Rigid => InstanceUpdate::Rigid {
            appearance,
            transform: placement.rigid_transform(index),
        },
        MeshKind::Deformable => {
            let DeformedPlacement { transform, segment } = placement.deformed(index);
            InstanceUpdate::Deformable {
                appearance,
                transform,
                segment,
            }
        }
    }
}

/// Arrows only show for deformed segments that exist, and sit above the
/// point's label.
fn arrow_update<C: CurvePoints>(
    placement: &Placement<'_, C>,
    slot: usize,
    index: usize,
    count: usize,
    display: &DebugDisplay,
) -> ArrowUpdate {
    let config = placement.config;
    ArrowUpdate {
        // Mesh bounds are unknown until deformation runs, so heights are
        // fixed offsets from the point.
        position: placement.curve.location(index)
            + Vec3::Y * (display.point_number_size + display.up_arrow_offset),
        direction: placement.up_direction(index).normalize_or_zero(),
        layer_slot: slot,
        size: display.up_arrow_size,
        visible: config.up_vector.show_up_direction
            && config.mesh.kind == MeshKind::Deformable
            && index + 1 < count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::layers::{LayerConfig, RenderMode};
    use crate::layout::testing::RecordingHost;
    use crate::spline::Spline;

    fn spline(count: usize) -> Spline {
        Spline::new((0..count).map(|i| Vec3::new(i as f32 * 2.0, 0.0, 0.0)))
    }

    fn layout() -> FlexLayout {
        FlexLayout::new()
            .with_layer("Rails", LayerConfig::default())
            .unwrap()
            .with_layer("Posts", LayerConfig::new(MeshKind::Rigid, Handle::default()))
            .unwrap()
    }

    fn assert_aligned(layout: &FlexLayout, count: usize) {
        assert_eq!(layout.points().len(), count);
        for layer in layout.layers.iter() {
            assert_eq!(layer.config.instances().len(), count, "layer {}", layer.name);
            assert_eq!(layer.config.arrows().len(), count, "layer {}", layer.name);
        }
    }

    #[test]
    fn test_first_rebuild_spawns_everything() {
        let mut layout = layout();
        let mut host = RecordingHost::default();
        let report = layout.rebuild(&spline(4), &mut host).unwrap();

        assert_aligned(&layout, 4);
        assert_eq!(report.spawned_instances, 8);
        assert_eq!(report.inserted_points, [0, 1, 2, 3]);
        // The last point of each non-looping layer stays hidden
        assert_eq!(report.visible_instances, 6);
        assert_eq!(report.hidden_instances, 2);
        assert_eq!(host.visible_instances(), 6);
        assert_eq!(host.labels.len(), 4);
        assert!(layout.points().iter().all(|point| point.id().is_some()));
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let curve = spline(5);
        let mut layout = layout();
        let mut host = RecordingHost::default();
        layout.rebuild(&curve, &mut host).unwrap();

        let handles: Vec<_> = layout.layers.iter().map(|l| l.config.instances().to_vec()).collect();
        let updates = host.instance_updates.clone();

        let report = layout.rebuild(&curve, &mut host).unwrap();
        assert_eq!(report.spawned_instances, 0);
        assert!(report.inserted_points.is_empty());
        assert!(report.deleted_points.is_empty());

        let again: Vec<_> = layout.layers.iter().map(|l| l.config.instances().to_vec()).collect();
        assert_eq!(handles, again);
        assert_eq!(updates, host.instance_updates);
    }

    #[test]
    fn test_deleted_point_keeps_neighbour_overrides() {
        let mut curve = spline(4);
        let mut layout = layout();
        let mut host = RecordingHost::default();
        layout.rebuild(&curve, &mut host).unwrap();

        layout.point_mut(2).unwrap().end_roll = 45.0;
        let rails = layout.layers.get("Rails").unwrap().instances().to_vec();

        curve.remove_point(1);
        let report = layout.rebuild(&curve, &mut host).unwrap();

        assert_eq!(report.deleted_points, [1]);
        assert_aligned(&layout, 3);
        assert_eq!(layout.points()[1].end_roll, 45.0);
        assert!(!host.is_alive(rails[1]));
        assert_eq!(
            layout.layers.get("Rails").unwrap().instances(),
            [rails[0], rails[2], rails[3]]
        );
    }

    #[test]
    fn test_inserted_point_shifts_overrides() {
        let mut curve = spline(3);
        let mut layout = layout();
        let mut host = RecordingHost::default();
        layout.rebuild(&curve, &mut host).unwrap();

        layout.point_mut(1).unwrap().end_roll = 30.0;
        let rails = layout.layers.get("Rails").unwrap().instances().to_vec();

        curve.insert_point(1, Vec3::new(1.0, 1.0, 0.0));
        let report = layout.rebuild(&curve, &mut host).unwrap();

        assert_eq!(report.inserted_points, [1]);
        assert_eq!(report.spawned_instances, 2);
        assert_aligned(&layout, 4);
        assert_eq!(layout.points()[1].end_roll, 0.0);
        assert_eq!(layout.points()[2].end_roll, 30.0);

        let after = layout.layers.get("Rails").unwrap().instances();
        assert_eq!(after[0], rails[0]);
        assert_eq!(after[2], rails[1]);
        assert_eq!(after[3], rails[2]);
    }

    #[test]
    fn test_added_layer_takes_template() {
        let mut layout = FlexLayout::new().with_template(LayerConfig::default().with_looping(true));
        layout.add_layer();
        let mut host = RecordingHost::default();
        let report = layout.rebuild(&spline(3), &mut host).unwrap();

        assert_eq!(report.initialized_layers, 1);
        let config = layout.layers.get("Layer 0").unwrap();
        assert!(config.looping);
        assert_eq!(config.instances().len(), 3);
        assert_eq!(report.visible_instances, 3);
    }

    #[test]
    fn test_kind_change_replaces_instances() {
        let curve = spline(3);
        let mut layout = layout();
        let mut host = RecordingHost::default();
        layout.rebuild(&curve, &mut host).unwrap();

        layout.layers.get_mut("Rails").unwrap().mesh.kind = MeshKind::Rigid;
        let report = layout.rebuild(&curve, &mut host).unwrap();

        assert_eq!(report.replaced_instances, 3);
        for &handle in layout.layers.get("Rails").unwrap().instances() {
            assert_eq!(host.mesh_kind(handle), Some(MeshKind::Rigid));
        }
    }

    #[test]
    fn test_dead_handles_are_respawned() {
        let curve = spline(3);
        let mut layout = layout();
        let mut host = RecordingHost::default();
        layout.rebuild(&curve, &mut host).unwrap();

        let dead = layout.layers.get("Posts").unwrap().instances()[0];
        let dead_arrow = layout.layers.get("Rails").unwrap().arrows()[1];
        let dead_label = layout.points()[2].label().unwrap();
        host.despawn(dead);
        host.despawn(dead_arrow);
        host.despawn(dead_label);
        let report = layout.rebuild(&curve, &mut host).unwrap();

        assert_eq!(report.spawned_instances, 1);
        assert_eq!(report.skipped_instances, 0);

        let respawned = layout.layers.get("Posts").unwrap().instances()[0];
        assert_ne!(respawned, dead);
        assert!(host.is_alive(respawned));
        assert_eq!(host.mesh_kind(respawned), Some(MeshKind::Rigid));
        assert!(matches!(host.instance_updates[&respawned], InstanceUpdate::Rigid { .. }));

        let arrow = layout.layers.get("Rails").unwrap().arrows()[1];
        assert!(host.is_alive(arrow));
        assert!(host.arrow_updates.contains_key(&arrow));
        let label = layout.points()[2].label().unwrap();
        assert!(host.is_alive(label));
        assert_eq!(host.label_updates[&label].index, 2);
        assert_aligned(&layout, 3);
    }

    #[test]
    fn test_looping_segment_bridges_to_first_point() {
        let curve = spline(5);
        let mut layout = FlexLayout::new()
            .with_layer("Rails", LayerConfig::default().with_looping(true))
            .unwrap();
        let mut host = RecordingHost::default();
        layout.rebuild(&curve, &mut host).unwrap();

        let last = layout.layers.get("Rails").unwrap().instances()[4];
        let InstanceUpdate::Deformable { segment, .. } = &host.instance_updates[&last] else {
            panic!("expected the final segment to render");
        };
        assert_eq!(segment.start_location, curve.location(4));
        assert_eq!(segment.end_location, curve.location(0));
    }

    #[test]
    fn test_removed_layer_is_released() {
        let curve = spline(3);
        let mut layout = layout();
        let mut host = RecordingHost::default();
        layout.rebuild(&curve, &mut host).unwrap();

        let posts = layout.layers.get("Posts").unwrap().instances().to_vec();
        layout.remove_layer("Posts").unwrap();
        let report = layout.rebuild(&curve, &mut host).unwrap();

        assert_eq!(report.released_handles, 6);
        assert!(posts.iter().all(|&handle| !host.is_alive(handle)));
        assert_eq!(host.kinds.len(), 3);
    }

    #[test]
    fn test_head_only_render_mode() {
        let mut layout = FlexLayout::new()
            .with_layer(
                "Caps",
                LayerConfig::new(MeshKind::Rigid, Handle::default())
                    .with_render_mode(RenderMode::HEAD),
            )
            .unwrap();
        let mut host = RecordingHost::default();
        let report = layout.rebuild(&spline(5), &mut host).unwrap();
        assert_eq!(report.visible_instances, 1);

        let head = layout.layers.get("Caps").unwrap().instances()[0];
        assert!(matches!(host.instance_updates[&head], InstanceUpdate::Rigid { .. }));
    }

    #[test]
    fn test_accumulated_spawn_chance() {
        let mut layout = FlexLayout::new()
            .with_layer(
                "Posts",
                LayerConfig::new(MeshKind::Rigid, Handle::default())
                    .with_looping(true)
                    .with_spawn_chance(0.5, false),
            )
            .unwrap();
        let mut host = RecordingHost::default();
        layout.rebuild(&spline(6), &mut host).unwrap();

        let instances = layout.layers.get("Posts").unwrap().instances();
        let shown: Vec<_> = (0..6)
            .filter(|&i| host.instance_updates[&instances[i]] != InstanceUpdate::Hidden)
            .collect();
        assert_eq!(shown, [0, 2, 4]);
    }

    #[test]
    fn test_deformed_segments_synchronize() {
        let mut layout = layout();
        let mut host = RecordingHost::default();
        let curve = spline(3);
        layout.rebuild(&curve, &mut host).unwrap();

        layout.point_mut(0).unwrap().end_roll = 20.0;
        layout.rebuild(&curve, &mut host).unwrap();

        let second = layout.layers.get("Rails").unwrap().instances()[1];
        let InstanceUpdate::Deformable { segment, appearance, .. } = &host.instance_updates[&second]
        else {
            panic!("expected a deformed instance");
        };
        assert_eq!(segment.start_roll, 20.0);
        assert_eq!(appearance.name, "Rails #1");
    }

    #[test]
    fn test_debug_arrows_and_labels() {
        let mut layout = layout();
        layout.layers.get_mut("Rails").unwrap().up_vector.show_up_direction = true;
        layout.debug.show_point_numbers = true;
        let mut host = RecordingHost::default();
        layout.rebuild(&spline(3), &mut host).unwrap();

        let arrows = layout.layers.get("Rails").unwrap().arrows().to_vec();
        assert!(host.arrow_updates[&arrows[0]].visible);
        assert!(!host.arrow_updates[&arrows[2]].visible);
        let posts = layout.layers.get("Posts").unwrap().arrows()[0];
        assert!(!host.arrow_updates[&posts].visible);

        assert_eq!(host.label_updates.len(), 3);
        assert!(host.label_updates.values().all(|label| label.visible));

        let label = layout.points()[0].label().unwrap();
        let arrow = &host.arrow_updates[&arrows[0]];
        assert!(arrow.position.y > host.label_updates[&label].position.y);
    }

    #[test]
    fn test_spawn_failure_is_reported() {
        let mut layout = layout();
        let mut host = RecordingHost::failing();
        let err = layout.rebuild(&spline(2), &mut host).unwrap_err();
        assert_eq!(err, FlexSplineError::OwnerMissing(Entity::PLACEHOLDER));
    }

    #[test]
    fn test_empty_curve() {
        let mut layout = layout();
        let mut host = RecordingHost::default();
        layout.rebuild(&spline(3), &mut host).unwrap();
        let report = layout.rebuild(&spline(0), &mut host).unwrap();

        assert_eq!(report.deleted_points, [2, 1, 0]);
        assert_aligned(&layout, 0);
        assert!(host.kinds.is_empty());
        assert!(host.labels.is_empty());
    }

    #[test]
    fn test_phase_starts_idle() {
        let mut layout = layout();
        let mut host = RecordingHost::default();
        let curve = spline(2);
        let rebuild = Rebuild::new(&mut layout, &curve, &mut host);
        assert_eq!(rebuild.phase(), RebuildPhase::Idle);
    }
}
