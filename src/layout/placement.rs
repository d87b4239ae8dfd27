//! Transforms of rigid instances and segment parameters of deformed ones.

use bevy::prelude::*;

use crate::geometry::{direction_rotation, Rotator};
use crate::layout::curve::CurvePoints;
use crate::layout::layers::{CoordinateSpace, ForwardAxis, LayerConfig};
use crate::layout::point::PointOverride;
use crate::layout::policy::GlobalPolicy;
use crate::layout::random::{randomize_rotator, randomize_vec3};
use crate::layout::sync::start_section;

/// Everything a deformer needs to bend a mesh between two curve points.
///
/// Locations and tangents are in the curve's space. Rolls are in degrees,
/// scales and offsets act on the cross-section (right, up).
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component, Default)]
pub struct SegmentPlacement {
    pub start_location: Vec3,
    pub start_tangent: Vec3,
    pub end_location: Vec3,
    pub end_tangent: Vec3,
    pub start_roll: f32,
    pub end_roll: f32,
    pub start_scale: Vec2,
    pub end_scale: Vec2,
    pub start_offset: Vec2,
    pub end_offset: Vec2,
    pub up: Vec3,
    pub forward_axis: ForwardAxis,
}

impl Default for SegmentPlacement {
    fn default() -> Self {
        Self {
            start_location: Vec3::ZERO,
            start_tangent: Vec3::NEG_Z,
            end_location: Vec3::NEG_Z,
            end_tangent: Vec3::NEG_Z,
            start_roll: 0.0,
            end_roll: 0.0,
            start_scale: Vec2::ONE,
            end_scale: Vec2::ONE,
            start_offset: Vec2::ZERO,
            end_offset: Vec2::ZERO,
            up: Vec3::Y,
            forward_axis: ForwardAxis::Z,
        }
    }
}

/// Placement of one deformed instance: its relative transform on top of
/// the segment it is bent along.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeformedPlacement {
    pub transform: Transform,
    pub segment: SegmentPlacement,
}

/// Placement math for one layer over one curve.
pub struct Placement<'a, C> {
    pub curve: &'a C,
    pub layer_name: &'a str,
    pub config: &'a LayerConfig,
    pub points: &'a [PointOverride],
    pub policy: &'a GlobalPolicy,
}

impl<'a, C: CurvePoints> Placement<'a, C> {
    pub fn new(
        curve: &'a C,
        layer_name: &'a str,
        config: &'a LayerConfig,
        points: &'a [PointOverride],
        policy: &'a GlobalPolicy,
    ) -> Self {
        Self {
            curve,
            layer_name,
            config,
            points,
            policy,
        }
    }

    fn point(&self, index: usize) -> PointOverride {
        self.points.get(index).cloned().unwrap_or_default()
    }

    fn random_scale(&self, index: usize) -> Vec3 {
        randomize_vec3(self.config.scale.random_amplitude(), index, self.layer_name)
    }

    fn random_rotation(&self, index: usize) -> Rotator {
        randomize_rotator(self.config.rotation.random_offset, index, self.layer_name)
    }

    fn random_location(&self, index: usize) -> Vec3 {
        randomize_vec3(self.config.location.random_offset, index, self.layer_name)
    }

    /// Location of a rigid instance.
    pub fn location(&self, index: usize) -> Vec3 {
        let offset = self.config.location.location
            + self.point(index).location_offset
            + self.random_location(index);
        let offset = match self.config.location.space {
            CoordinateSpace::PointLocal => direction_rotation(self.curve.direction(index)) * offset,
            CoordinateSpace::CurveSystem => offset,
        };
        self.curve.location(index) + offset
    }

    /// Rotation of a rigid instance.
    pub fn rotation(&self, index: usize) -> Rotator {
        let mut rotation = self.config.rotation.rotation
            + self.random_rotation(index)
            + self.point(index).rotation;
        if self.config.rotation.space == CoordinateSpace::PointLocal {
            rotation += Rotator::from_quat(self.curve.rotation(index));
        }
        rotation
    }

    /// Scale of a rigid instance.
    pub fn scale(&self, index: usize) -> Vec3 {
        self.config.scale.base() * self.curve.scale(index)
            + self.point(index).scale
            + self.random_scale(index)
    }

    pub fn rigid_transform(&self, index: usize) -> Transform {
        Transform {
            translation: self.location(index),
            rotation: self.rotation(index).to_quat(),
            scale: self.scale(index),
        }
    }

    /// Up direction of the instance at `index`.
    ///
    /// In point-local space both the layer up vector and the point's own
    /// up offset follow the average direction of the neighbouring points.
    pub fn up_direction(&self, index: usize) -> Vec3 {
        let mut base = self.config.up_vector.up;
        let mut point_up = self.point(index).up_direction;

        if self.config.up_vector.space == CoordinateSpace::PointLocal {
            let last = self.curve.point_count().saturating_sub(1);
            let previous = index.saturating_sub(1);
            let next = (index + 1).min(last);
            let average = self
                .curve
                .direction(previous)
                .lerp(self.curve.direction(next), 0.5);
            let rotation = direction_rotation(average);
            base = rotation * base;
            point_up = rotation * point_up;
        }

        base + point_up
    }

    /// Placement of a deformed instance spanning `index` to the next point.
    pub fn deformed(&self, index: usize) -> DeformedPlacement {
        let count = self.curve.point_count();
        let next = if count == 0 { index } else { (index + 1) % count };
        let point = self.point(index);
        let axis = self.config.mesh.forward_axis;
        let scale = &self.config.scale;

        let (random_forward, random_cross) = axis.split(self.random_scale(index));
        let (base_forward, base_cross) = if scale.use_uniform_scale {
            (1.0, Vec2::splat(scale.uniform_scale))
        } else {
            axis.split(scale.scale)
        };
        let cross = base_cross + random_cross;
        let start = start_section(self.policy, self.points, index);

        let mut segment = SegmentPlacement {
            start_location: self.curve.location(index),
            start_tangent: self.curve.tangent(index),
            end_location: self.curve.location(next),
            end_tangent: self.curve.tangent(next),
            start_roll: start.roll,
            end_roll: point.end_roll,
            start_scale: start.scale * cross,
            end_scale: point.end_scale * cross,
            start_offset: start.offset,
            end_offset: point.end_offset,
            up: self.up_direction(index),
            forward_axis: axis,
        };

        let location = &self.config.location;
        let translation = match location.space {
            CoordinateSpace::PointLocal => {
                let start_rotation = direction_rotation(self.curve.direction(index));
                let end_rotation = direction_rotation(self.curve.direction(next));
                segment.start_location +=
                    start_rotation * location.location + self.random_location(index);
                segment.end_location +=
                    end_rotation * location.location + self.random_location(next);
                Vec3::ZERO
            }
            CoordinateSpace::CurveSystem => location.location + self.random_location(index),
        };

        let rotation = self.config.rotation.rotation + self.random_rotation(index);
        DeformedPlacement {
            transform: Transform {
                translation,
                rotation: rotation.to_quat(),
                scale: axis.with_forward(Vec3::ONE, base_forward + random_forward),
            },
            segment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::layers::{MeshKind, ScaleInfo};
    use crate::spline::Spline;

    fn spline() -> Spline {
        Spline::new([Vec3::ZERO, Vec3::X * 2.0, Vec3::X * 4.0])
    }

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn test_rigid_location_point_local() {
        let curve = spline();
        let mut config = LayerConfig::new(MeshKind::Rigid, Handle::default());
        // Local +X is to the right of a curve heading along world +X
        config.location.location = Vec3::X;
        let points = vec![PointOverride::default(); 3];
        let policy = GlobalPolicy::default();
        let placement = Placement::new(&curve, "Layer 0", &config, &points, &policy);

        assert!(close(placement.location(1), Vec3::new(2.0, 0.0, 1.0)));

        config.location.space = CoordinateSpace::CurveSystem;
        let placement = Placement::new(&curve, "Layer 0", &config, &points, &policy);
        assert!(close(placement.location(1), Vec3::new(3.0, 0.0, 0.0)));
    }

    #[test]
    fn test_rigid_scale_combines_sources() {
        let curve = spline();
        let mut config = LayerConfig::new(MeshKind::Rigid, Handle::default());
        config.scale = ScaleInfo {
            uniform_scale: 2.0,
            ..default()
        };
        let mut points = vec![PointOverride::default(); 3];
        points[0].scale = Vec3::new(0.5, 0.0, 0.0);
        let policy = GlobalPolicy::default();
        let placement = Placement::new(&curve, "Layer 0", &config, &points, &policy);

        assert!(close(placement.scale(0), Vec3::new(2.5, 2.0, 2.0)));
    }

    #[test]
    fn test_rigid_rotation_follows_curve() {
        let curve = spline();
        let config = LayerConfig::new(MeshKind::Rigid, Handle::default());
        let points = vec![PointOverride::default(); 3];
        let policy = GlobalPolicy::default();
        let placement = Placement::new(&curve, "Layer 0", &config, &points, &policy);

        let forward = placement.rigid_transform(1).rotation * Vec3::NEG_Z;
        assert!(close(forward, Vec3::X));
    }

    #[test]
    fn test_deformed_segment_spans_to_next_point() {
        let curve = spline();
        let config = LayerConfig::default();
        let points = vec![PointOverride::default(); 3];
        let policy = GlobalPolicy::default();
        let placement = Placement::new(&curve, "Layer 0", &config, &points, &policy);

        let deformed = placement.deformed(0);
        assert!(close(deformed.segment.start_location, Vec3::ZERO));
        assert!(close(deformed.segment.end_location, Vec3::X * 2.0));
        assert!(close(deformed.segment.up, Vec3::Y));
        assert_eq!(deformed.segment.start_scale, Vec2::ONE);
        assert_eq!(deformed.transform.translation, Vec3::ZERO);

        // The last point wraps to the first
        let deformed = placement.deformed(2);
        assert!(close(deformed.segment.end_location, Vec3::ZERO));
    }

    #[test]
    fn test_deformed_start_synchronizes() {
        let curve = spline();
        let config = LayerConfig::default();
        let mut points = vec![PointOverride::default(); 3];
        points[0].end_roll = 30.0;
        points[0].end_scale = Vec2::new(2.0, 3.0);
        points[1].start_roll = -5.0;
        let policy = GlobalPolicy::default();
        let placement = Placement::new(&curve, "Layer 0", &config, &points, &policy);

        let segment = placement.deformed(1).segment;
        assert_eq!(segment.start_roll, 30.0);
        assert_eq!(segment.start_scale, Vec2::new(2.0, 3.0));

        points[1].synchronize_with_previous = false;
        let placement = Placement::new(&curve, "Layer 0", &config, &points, &policy);
        assert_eq!(placement.deformed(1).segment.start_roll, -5.0);
    }

    #[test]
    fn test_up_direction_point_local() {
        let curve = Spline::new([Vec3::ZERO, Vec3::NEG_Z * 2.0]);
        let mut config = LayerConfig::default();
        config.up_vector.space = CoordinateSpace::PointLocal;
        config.up_vector.up = Vec3::X;
        let points = vec![PointOverride::default(); 2];
        let policy = GlobalPolicy::default();
        let placement = Placement::new(&curve, "Layer 0", &config, &points, &policy);

        // Heading along -Z keeps the identity frame
        assert!(close(placement.up_direction(0), Vec3::X));
    }
}
