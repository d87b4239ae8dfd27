use bevy::prelude::*;

use crate::error::FlexSplineError;
use crate::layout::curve::CurvePoints;
use crate::layout::host::InstanceHost;
use crate::layout::identity::point_hash;
use crate::layout::layers::{LayerConfig, LayerMap, MeshKind};
use crate::layout::point::PointOverride;
use crate::layout::policy::GlobalPolicy;
use crate::layout::rebuild::{rebuild, RebuildReport};

/// Debug visualisation settings.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Default)]
pub struct DebugDisplay {
    /// Label every control point with its index.
    pub show_point_numbers: bool,
    pub point_number_size: f32,
    pub up_arrow_size: f32,
    /// Gap between a point's label and the up arrows above it.
    pub up_arrow_offset: f32,
    pub label_color: Color,
}

impl Default for DebugDisplay {
    fn default() -> Self {
        Self {
            show_point_numbers: false,
            point_number_size: 0.25,
            up_arrow_size: 0.5,
            up_arrow_offset: 0.25,
            label_color: Color::srgb(0.0, 1.0, 1.0),
        }
    }
}

/// Everything a flex spline remembers between rebuilds: the spline-wide
/// policy, one override per curve point and the mesh layers.
///
/// After every [`FlexLayout::rebuild`] each layer holds exactly one
/// instance and one arrow handle per curve point, and there is exactly one
/// point override per curve point.
#[derive(Debug, Clone, Default, Reflect)]
#[reflect(Default)]
pub struct FlexLayout {
    pub policy: GlobalPolicy,
    /// Settings given to every layer added with [`FlexLayout::add_layer`].
    pub template: LayerConfig,
    pub debug: DebugDisplay,
    pub layers: LayerMap,
    pub(crate) points: Vec<PointOverride>,
    #[reflect(ignore)]
    pub(crate) pending_release: Vec<Entity>,
}

impl FlexLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: GlobalPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_template(mut self, template: LayerConfig) -> Self {
        self.template = template;
        self
    }

    /// Add a layer under an explicit name.
    pub fn with_layer(
        mut self,
        name: impl Into<String>,
        config: LayerConfig,
    ) -> Result<Self, FlexSplineError> {
        self.insert_layer(name, config)?;
        Ok(self)
    }

    pub fn points(&self) -> &[PointOverride] {
        &self.points
    }

    pub fn point_mut(&mut self, index: usize) -> Result<&mut PointOverride, FlexSplineError> {
        let len = self.points.len();
        self.points
            .get_mut(index)
            .ok_or(FlexSplineError::PointOutOfRange { index, len })
    }

    /// Apply `edit` to each of the given points. Nothing is edited if any
    /// index is out of range.
    pub fn edit_points(
        &mut self,
        indices: &[usize],
        mut edit: impl FnMut(&mut PointOverride),
    ) -> Result<(), FlexSplineError> {
        let len = self.points.len();
        if let Some(&index) = indices.iter().find(|&&index| index >= len) {
            return Err(FlexSplineError::PointOutOfRange { index, len });
        }
        for &index in indices {
            edit(&mut self.points[index]);
        }
        Ok(())
    }

    pub fn insert_layer(
        &mut self,
        name: impl Into<String>,
        config: LayerConfig,
    ) -> Result<(), FlexSplineError> {
        self.layers.insert(name, config).map(|_| ())
    }

    /// Add a layer that takes a generated name and the template's settings
    /// on the next rebuild.
    pub fn add_layer(&mut self) {
        self.layers.add();
    }

    /// Remove a layer. Its instances are released on the next rebuild.
    pub fn remove_layer(&mut self, name: &str) -> Result<LayerConfig, FlexSplineError> {
        let mut config = self.layers.remove(name)?;
        self.pending_release.append(&mut config.instances);
        self.pending_release.append(&mut config.arrows);
        Ok(config)
    }

    /// Number of active layers using meshes of `kind`.
    pub fn active_layer_count(&self, kind: MeshKind) -> usize {
        self.layers
            .iter()
            .filter(|layer| layer.config.active && layer.config.mesh.kind == kind)
            .count()
    }

    /// Reconcile with `curve` and push the new state to `host`.
    pub fn rebuild<C: CurvePoints, H: InstanceHost>(
        &mut self,
        curve: &C,
        host: &mut H,
    ) -> Result<RebuildReport, FlexSplineError> {
        rebuild(self, curve, host)
    }

    pub(crate) fn initialize_layers(&mut self) -> usize {
        self.layers.initialize_from(&self.template)
    }

    pub(crate) fn release_pending(&mut self, host: &mut impl InstanceHost) -> usize {
        let released = self.pending_release.len();
        for handle in self.pending_release.drain(..) {
            host.release(handle);
        }
        released
    }

    fn new_point(host: &mut impl InstanceHost) -> Result<PointOverride, FlexSplineError> {
        Ok(PointOverride {
            label: Some(host.spawn_label()?),
            ..default()
        })
    }

    /// Insert fresh overrides at the given ascending indices.
    pub(crate) fn insert_points(
        &mut self,
        inserted: &[usize],
        count: usize,
        host: &mut impl InstanceHost,
    ) -> Result<(), FlexSplineError> {
        for &index in inserted {
            if self.points.len() < count && index <= self.points.len() {
                self.points.insert(index, Self::new_point(host)?);
            }
        }
        Ok(())
    }

    pub(crate) fn grow_points(
        &mut self,
        count: usize,
        host: &mut impl InstanceHost,
    ) -> Result<(), FlexSplineError> {
        while self.points.len() < count {
            self.points.push(Self::new_point(host)?);
        }
        Ok(())
    }

    /// Drop the overrides at the given descending indices, then any excess.
    pub(crate) fn shrink_points(
        &mut self,
        deleted: &[usize],
        count: usize,
        host: &mut impl InstanceHost,
    ) {
        for &index in deleted {
            if self.points.len() > count && index < self.points.len() {
                if let Some(label) = self.points.remove(index).label {
                    host.release(label);
                }
            }
        }
        while self.points.len() > count {
            if let Some(label) = self.points.pop().and_then(|point| point.label) {
                host.release(label);
            }
        }
    }

    /// Spawn instances and arrows at the given ascending indices of every
    /// layer that is still short of `count`. Returns how many were spawned.
    pub(crate) fn insert_layer_slots(
        &mut self,
        inserted: &[usize],
        count: usize,
        host: &mut impl InstanceHost,
    ) -> Result<usize, FlexSplineError> {
        let mut spawned = 0;
        for layer in self.layers.iter_mut() {
            let config = &mut layer.config;
            for &index in inserted {
                if config.instances.len() < count && index <= config.instances.len() {
                    config.instances.insert(index, host.spawn_mesh(config.mesh.kind)?);
                    spawned += 1;
                }
                if config.arrows.len() < count && index <= config.arrows.len() {
                    config.arrows.insert(index, host.spawn_arrow()?);
                }
            }
        }
        Ok(spawned)
    }

    pub(crate) fn grow_layer_slots(
        &mut self,
        count: usize,
        host: &mut impl InstanceHost,
    ) -> Result<usize, FlexSplineError> {
        let mut spawned = 0;
        for layer in self.layers.iter_mut() {
            let config = &mut layer.config;
            while config.instances.len() < count {
                config.instances.push(host.spawn_mesh(config.mesh.kind)?);
                spawned += 1;
            }
            while config.arrows.len() < count {
                config.arrows.push(host.spawn_arrow()?);
            }
        }
        Ok(spawned)
    }

    /// Release the instances and arrows at the given descending indices of
    /// every layer holding more than `count`, then any excess.
    pub(crate) fn shrink_layer_slots(
        &mut self,
        deleted: &[usize],
        count: usize,
        host: &mut impl InstanceHost,
    ) {
        for layer in self.layers.iter_mut() {
            let config = &mut layer.config;
            for handles in [&mut config.instances, &mut config.arrows] {
                for &index in deleted {
                    if handles.len() > count && index < handles.len() {
                        host.release(handles.remove(index));
                    }
                }
                while handles.len() > count {
                    if let Some(handle) = handles.pop() {
                        host.release(handle);
                    }
                }
            }
        }
    }

    /// Respawn every label, instance and arrow whose handle died since the
    /// last rebuild. Returns how many instances were respawned.
    pub(crate) fn replace_dead_handles(
        &mut self,
        host: &mut impl InstanceHost,
    ) -> Result<usize, FlexSplineError> {
        for point in &mut self.points {
            if !point.label.is_some_and(|label| host.is_alive(label)) {
                point.label = Some(host.spawn_label()?);
            }
        }

        let mut spawned = 0;
        for layer in self.layers.iter_mut() {
            let config = &mut layer.config;
            for handle in &mut config.instances {
                if !host.is_alive(*handle) {
                    *handle = host.spawn_mesh(config.mesh.kind)?;
                    spawned += 1;
                }
            }
            for handle in &mut config.arrows {
                if !host.is_alive(*handle) {
                    *handle = host.spawn_arrow()?;
                }
            }
        }
        Ok(spawned)
    }

    /// Record the current content hash of every curve point.
    pub(crate) fn refresh_ids(&mut self, curve: &impl CurvePoints) {
        for (index, point) in self.points.iter_mut().enumerate() {
            point.id = Some(point_hash(curve.location(index)));
        }
    }
}
