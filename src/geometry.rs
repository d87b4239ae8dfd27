//! Geometry utilities shared by the layout engine and the Bevy host.

use std::ops::{Add, AddAssign};

use bevy::prelude::*;

/// A local coordinate frame defined by tangent, right, and up vectors.
///
/// The frame is constructed from a tangent direction with automatic handling
/// of degenerate cases (e.g., when tangent is parallel to the preferred up).
#[derive(Debug, Clone, Copy)]
pub struct CoordinateFrame {
    /// The tangent (forward along spline) direction.
    pub tangent: Vec3,
    /// The right direction (perpendicular to tangent and up).
    pub right: Vec3,
    /// The corrected up direction (perpendicular to tangent and right).
    pub up: Vec3,
}

impl CoordinateFrame {
    /// Build a coordinate frame from a tangent direction using Y-up convention.
    pub fn from_tangent(tangent: Vec3) -> Self {
        Self::from_tangent_with_up(tangent, Vec3::Y)
    }

    /// Build a coordinate frame from a tangent and preferred up direction.
    ///
    /// The actual up vector may differ from `preferred_up` to maintain
    /// orthogonality with the tangent. Falls back to X as the reference axis
    /// when the tangent is parallel to `preferred_up`.
    pub fn from_tangent_with_up(tangent: Vec3, preferred_up: Vec3) -> Self {
        let tangent = tangent.normalize_or_zero();

        let right = tangent.cross(preferred_up).normalize_or_zero();
        let up = right.cross(tangent).normalize_or_zero();

        let (right, up) = if right.length_squared() < 0.001 {
            let right = tangent.cross(Vec3::X).normalize_or_zero();
            let up = right.cross(tangent).normalize_or_zero();
            (right, up)
        } else {
            (right, up)
        };

        Self { tangent, right, up }
    }

    /// Check if this frame is valid (non-degenerate).
    pub fn is_valid(&self) -> bool {
        self.right.length_squared() > 0.001 && self.up.length_squared() > 0.001
    }

    /// Convert to a rotation quaternion.
    ///
    /// Local -Z maps onto the tangent, local +Y onto `up` and local +X onto `right`,
    /// matching Bevy's forward convention.
    pub fn to_rotation(&self) -> Quat {
        if !self.is_valid() {
            return Quat::IDENTITY;
        }
        let forward = -self.tangent;
        Quat::from_mat3(&Mat3::from_cols(self.right, self.up, forward))
    }

    /// Rotate the frame around its tangent by `roll` radians.
    pub fn rolled(&self, roll: f32) -> Self {
        if roll == 0.0 {
            return *self;
        }
        let twist = Quat::from_axis_angle(self.tangent, roll);
        Self {
            tangent: self.tangent,
            right: twist * self.right,
            up: twist * self.up,
        }
    }

    /// Get the world offset for a local 2D point in the cross-section plane.
    pub fn transform_profile_point(&self, local_x: f32, local_y: f32) -> Vec3 {
        self.right * local_x + self.up * local_y
    }
}

/// Rotation of a frame whose forward axis follows `direction`, without roll.
pub fn direction_rotation(direction: Vec3) -> Quat {
    CoordinateFrame::from_tangent(direction).to_rotation()
}

/// Euler rotation in degrees that composes additively.
///
/// Yaw turns around +Y, pitch around +X and roll around +Z.
#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect)]
#[reflect(Default)]
pub struct Rotator {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Rotator {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }

    /// Read pitch, yaw and roll from the x, y and z components.
    pub fn from_vec3(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }

    /// Pack pitch, yaw and roll into the x, y and z components.
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.pitch, self.yaw, self.roll)
    }

    pub fn to_quat(self) -> Quat {
        Quat::from_euler(
            EulerRot::YXZ,
            self.yaw.to_radians(),
            self.pitch.to_radians(),
            self.roll.to_radians(),
        )
    }

    pub fn from_quat(rotation: Quat) -> Self {
        let (yaw, pitch, roll) = rotation.to_euler(EulerRot::YXZ);
        Self::new(pitch.to_degrees(), yaw.to_degrees(), roll.to_degrees())
    }
}

impl Add for Rotator {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.pitch + rhs.pitch, self.yaw + rhs.yaw, self.roll + rhs.roll)
    }
}

impl AddAssign for Rotator {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Evaluate a cubic Hermite segment at `s` in [0, 1].
pub fn hermite(p0: Vec3, t0: Vec3, p1: Vec3, t1: Vec3, s: f32) -> Vec3 {
    let s2 = s * s;
    let s3 = s2 * s;

    p0 * (2.0 * s3 - 3.0 * s2 + 1.0)
        + t0 * (s3 - 2.0 * s2 + s)
        + p1 * (-2.0 * s3 + 3.0 * s2)
        + t1 * (s3 - s2)
}

/// Derivative of [`hermite`] with respect to `s`.
pub fn hermite_derivative(p0: Vec3, t0: Vec3, p1: Vec3, t1: Vec3, s: f32) -> Vec3 {
    let s2 = s * s;

    p0 * (6.0 * s2 - 6.0 * s)
        + t0 * (3.0 * s2 - 4.0 * s + 1.0)
        + p1 * (-6.0 * s2 + 6.0 * s)
        + t1 * (3.0 * s2 - 2.0 * s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tangent_basic() {
        let frame = CoordinateFrame::from_tangent(Vec3::Z);
        assert!(frame.is_valid());
        assert!((frame.tangent - Vec3::Z).length() < 0.001);
        assert!((frame.up - Vec3::Y).length() < 0.001);
        assert!((frame.right - Vec3::NEG_X).length() < 0.001);
    }

    #[test]
    fn test_from_tangent_degenerate() {
        // Tangent parallel to Y should still produce valid frame
        let frame = CoordinateFrame::from_tangent(Vec3::Y);
        assert!(frame.is_valid());
    }

    #[test]
    fn test_rotation_points_forward_along_tangent() {
        let rotation = direction_rotation(Vec3::X);
        assert!((rotation * Vec3::NEG_Z - Vec3::X).length() < 0.001);
        assert!((rotation * Vec3::Y - Vec3::Y).length() < 0.001);
    }

    #[test]
    fn test_rolled_keeps_tangent() {
        let frame = CoordinateFrame::from_tangent(Vec3::Z).rolled(std::f32::consts::FRAC_PI_2);
        assert!((frame.tangent - Vec3::Z).length() < 0.001);
        assert!(frame.up.dot(Vec3::Y).abs() < 0.001);
        assert!(frame.is_valid());
    }

    #[test]
    fn test_rotator_quat_round_trip() {
        let rotator = Rotator::new(20.0, 45.0, -10.0);
        let back = Rotator::from_quat(rotator.to_quat());
        assert!((back.to_vec3() - rotator.to_vec3()).length() < 0.01);
    }

    #[test]
    fn test_hermite_endpoints() {
        let p0 = Vec3::ZERO;
        let p1 = Vec3::new(4.0, 0.0, 0.0);
        let t = Vec3::new(4.0, 0.0, 0.0);
        assert!((hermite(p0, t, p1, t, 0.0) - p0).length() < 0.001);
        assert!((hermite(p0, t, p1, t, 1.0) - p1).length() < 0.001);
        assert!((hermite(p0, t, p1, t, 0.5) - Vec3::new(2.0, 0.0, 0.0)).length() < 0.001);
        assert!((hermite_derivative(p0, t, p1, t, 0.0) - t).length() < 0.001);
    }
}
