use bevy::prelude::*;

use crate::geometry::Rotator;

/// Roll, scale and offset at one end of a deformed segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossSection {
    /// Degrees.
    pub roll: f32,
    pub scale: Vec2,
    pub offset: Vec2,
}

/// Per-point adjustments shared by every layer.
#[derive(Debug, Clone, PartialEq, Reflect)]
#[reflect(Default)]
pub struct PointOverride {
    /// Roll at the segment start, in degrees.
    pub start_roll: f32,
    /// Roll at the segment end, in degrees.
    pub end_roll: f32,
    pub start_scale: Vec2,
    pub end_scale: Vec2,
    pub start_offset: Vec2,
    pub end_offset: Vec2,
    /// Added to each layer's up vector.
    pub up_direction: Vec3,
    /// Take the start values from the previous point's end values.
    pub synchronize_with_previous: bool,
    /// Added to rigid instance locations.
    pub location_offset: Vec3,
    /// Added to rigid instance scales.
    pub scale: Vec3,
    /// Added to rigid instance rotations.
    pub rotation: Rotator,
    /// Content hash of the curve point at the last rebuild.
    #[reflect(ignore)]
    pub(crate) id: Option<u64>,
    #[reflect(ignore)]
    pub(crate) label: Option<Entity>,
}

impl Default for PointOverride {
    fn default() -> Self {
        Self {
            start_roll: 0.0,
            end_roll: 0.0,
            start_scale: Vec2::ONE,
            end_scale: Vec2::ONE,
            start_offset: Vec2::ZERO,
            end_offset: Vec2::ZERO,
            up_direction: Vec3::ZERO,
            synchronize_with_previous: true,
            location_offset: Vec3::ZERO,
            scale: Vec3::ZERO,
            rotation: Rotator::ZERO,
            id: None,
            label: None,
        }
    }
}

impl PointOverride {
    pub fn start_section(&self) -> CrossSection {
        CrossSection {
            roll: self.start_roll,
            scale: self.start_scale,
            offset: self.start_offset,
        }
    }

    pub fn end_section(&self) -> CrossSection {
        CrossSection {
            roll: self.end_roll,
            scale: self.end_scale,
            offset: self.end_offset,
        }
    }

    /// Identity recorded at the last rebuild. `None` until the first one.
    pub fn id(&self) -> Option<u64> {
        self.id
    }

    pub fn label(&self) -> Option<Entity> {
        self.label
    }
}
