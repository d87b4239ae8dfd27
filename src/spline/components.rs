use bevy::prelude::*;

use crate::geometry::{direction_rotation, hermite, CoordinateFrame};
use crate::layout::CurvePoints;

/// A single control point of a [`Spline`].
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Default)]
pub struct SplinePoint {
    /// Position relative to the owning entity.
    pub position: Vec3,
    /// Roll around the curve direction, in degrees.
    pub roll: f32,
    /// Scale carried by this point.
    pub scale: Vec3,
    /// Explicit tangent. Automatic (Catmull-Rom style) when `None`.
    pub tangent: Option<Vec3>,
}

impl Default for SplinePoint {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            roll: 0.0,
            scale: Vec3::ONE,
            tangent: None,
        }
    }
}

impl SplinePoint {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            ..default()
        }
    }

    /// Set the roll in degrees.
    pub fn with_roll(mut self, roll: f32) -> Self {
        self.roll = roll;
        self
    }

    /// Set the per-point scale.
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Pin the tangent instead of deriving it from the neighbours.
    pub fn with_tangent(mut self, tangent: Vec3) -> Self {
        self.tangent = Some(tangent);
        self
    }
}

/// A 3D spline that passes through every control point.
///
/// Segments between consecutive points are cubic Hermite curves. All queries
/// are expressed in the local space of the owning entity.
#[derive(Component, Debug, Clone, Reflect, Default)]
#[reflect(Component)]
pub struct Spline {
    /// Control points, in curve order.
    pub points: Vec<SplinePoint>,
    /// Whether the spline forms a closed loop.
    pub closed: bool,
}

impl Spline {
    /// Create an open spline through the given positions.
    pub fn new(positions: impl IntoIterator<Item = Vec3>) -> Self {
        Self {
            points: positions.into_iter().map(SplinePoint::new).collect(),
            closed: false,
        }
    }

    /// Create a closed spline through the given positions.
    pub fn closed(positions: impl IntoIterator<Item = Vec3>) -> Self {
        Self {
            closed: true,
            ..Self::new(positions)
        }
    }

    /// Check if the spline has enough points to form a segment.
    pub fn is_valid(&self) -> bool {
        self.points.len() >= 2
    }

    /// Number of Hermite segments.
    pub fn segment_count(&self) -> usize {
        match self.points.len() {
            0 | 1 => 0,
            n if self.closed => n,
            n => n - 1,
        }
    }

    /// Add a control point at the end.
    pub fn add_point(&mut self, position: Vec3) {
        self.points.push(SplinePoint::new(position));
    }

    /// Insert a control point at the given index.
    pub fn insert_point(&mut self, index: usize, position: Vec3) {
        if index <= self.points.len() {
            self.points.insert(index, SplinePoint::new(position));
        }
    }

    /// Remove the control point at the given index.
    pub fn remove_point(&mut self, index: usize) -> Option<SplinePoint> {
        if index < self.points.len() {
            Some(self.points.remove(index))
        } else {
            None
        }
    }

    /// Toggle between closed and open spline.
    pub fn toggle_closed(&mut self) {
        self.closed = !self.closed;
    }

    /// Evaluate the segment starting at `segment` at local parameter `s`.
    pub fn evaluate_segment(&self, segment: usize, s: f32) -> Option<Vec3> {
        if segment >= self.segment_count() {
            return None;
        }
        let next = (segment + 1) % self.points.len();
        Some(hermite(
            self.points[segment].position,
            self.tangent(segment),
            self.points[next].position,
            self.tangent(next),
            s.clamp(0.0, 1.0),
        ))
    }

    /// Sample the spline into a series of points for rendering.
    pub fn sample(&self, samples_per_segment: usize) -> Vec<Vec3> {
        let segments = self.segment_count();
        if segments == 0 || samples_per_segment == 0 {
            return Vec::new();
        }

        let mut points = Vec::with_capacity(segments * samples_per_segment + 1);
        for segment in 0..segments {
            for i in 0..samples_per_segment {
                let s = i as f32 / samples_per_segment as f32;
                points.extend(self.evaluate_segment(segment, s));
            }
        }
        points.extend(self.evaluate_segment(segments - 1, 1.0));

        points
    }

    fn neighbours(&self, index: usize) -> (usize, usize) {
        let n = self.points.len();
        if self.closed {
            ((index + n - 1) % n, (index + 1) % n)
        } else {
            (index.saturating_sub(1), (index + 1).min(n - 1))
        }
    }
}

impl CurvePoints for Spline {
    fn point_count(&self) -> usize {
        self.points.len()
    }

    fn location(&self, index: usize) -> Vec3 {
        self.points
            .get(index)
            .map(|p| p.position)
            .unwrap_or(Vec3::ZERO)
    }

    fn tangent(&self, index: usize) -> Vec3 {
        let Some(point) = self.points.get(index) else {
            return Vec3::ZERO;
        };
        if let Some(tangent) = point.tangent {
            return tangent;
        }
        if self.points.len() < 2 {
            return Vec3::ZERO;
        }

        let (prev, next) = self.neighbours(index);
        let span = self.points[next].position - self.points[prev].position;
        if prev == index || next == index {
            // One-sided difference at the open ends
            span
        } else {
            span * 0.5
        }
    }

    fn rotation(&self, index: usize) -> Quat {
        let roll = self.points.get(index).map(|p| p.roll).unwrap_or(0.0);
        let frame = CoordinateFrame::from_tangent(self.direction(index)).rolled(roll.to_radians());
        if frame.is_valid() {
            frame.to_rotation()
        } else {
            direction_rotation(self.direction(index))
        }
    }

    fn scale(&self, index: usize) -> Vec3 {
        self.points
            .get(index)
            .map(|p| p.scale)
            .unwrap_or(Vec3::ONE)
    }
}
