use bevy::prelude::*;

/// Per-index queries the layout engine needs from a curve.
///
/// Every query is expressed in the curve's own space; the engine never
/// interpolates between points itself. Implementations must answer for any
/// `index < point_count()`.
pub trait CurvePoints {
    /// Current number of control points.
    fn point_count(&self) -> usize;

    /// Location of the point.
    fn location(&self, index: usize) -> Vec3;

    /// Tangent (unnormalized, carries magnitude) at the point.
    fn tangent(&self, index: usize) -> Vec3;

    /// Unit direction of the curve at the point.
    fn direction(&self, index: usize) -> Vec3 {
        self.tangent(index).try_normalize().unwrap_or(Vec3::NEG_Z)
    }

    /// Orientation of the point, including its roll.
    fn rotation(&self, index: usize) -> Quat;

    /// Scale carried by the point.
    fn scale(&self, index: usize) -> Vec3;
}
