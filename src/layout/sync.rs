//! Continuity between consecutive deformed segments.

use crate::layout::point::{CrossSection, PointOverride};
use crate::layout::policy::GlobalPolicy;

/// The previous point, when `index` takes its start values from it.
///
/// The first point never synchronizes.
pub fn synchronized_previous<'a>(
    policy: &GlobalPolicy,
    points: &'a [PointOverride],
    index: usize,
) -> Option<&'a PointOverride> {
    if index == 0 {
        return None;
    }
    let point = points.get(index)?;
    if !policy.synchronizes(point.synchronize_with_previous) {
        return None;
    }
    points.get(index - 1)
}

/// Start cross-section of the segment beginning at `index`.
pub fn start_section(
    policy: &GlobalPolicy,
    points: &[PointOverride],
    index: usize,
) -> CrossSection {
    match synchronized_previous(policy, points, index) {
        Some(previous) => previous.end_section(),
        None => points
            .get(index)
            .map(PointOverride::start_section)
            .unwrap_or_else(|| PointOverride::default().start_section()),
    }
}

#[cfg(test)]
mod tests {
    use bevy::prelude::*;

    use super::*;
    use crate::layout::policy::GlobalConfig;

    fn points() -> Vec<PointOverride> {
        (0..3)
            .map(|i| PointOverride {
                start_roll: i as f32,
                end_roll: 10.0 + i as f32,
                end_scale: Vec2::splat(2.0),
                ..default()
            })
            .collect()
    }

    #[test]
    fn test_first_point_never_synchronizes() {
        let policy = GlobalPolicy {
            synchronize: GlobalConfig::Everywhere,
            ..default()
        };
        assert!(synchronized_previous(&policy, &points(), 0).is_none());
        assert_eq!(start_section(&policy, &points(), 0).roll, 0.0);
    }

    #[test]
    fn test_synchronized_start_uses_previous_end() {
        let policy = GlobalPolicy::default();
        let section = start_section(&policy, &points(), 2);
        assert_eq!(section.roll, 11.0);
        assert_eq!(section.scale, Vec2::splat(2.0));
    }

    #[test]
    fn test_policy_overrides_point_flag() {
        let mut points = points();
        points[2].synchronize_with_previous = false;

        let policy = GlobalPolicy::default();
        assert_eq!(start_section(&policy, &points, 2).roll, 2.0);

        let policy = GlobalPolicy {
            synchronize: GlobalConfig::Everywhere,
            ..default()
        };
        assert_eq!(start_section(&policy, &points, 2).roll, 11.0);

        let policy = GlobalPolicy {
            synchronize: GlobalConfig::Nowhere,
            ..default()
        };
        assert_eq!(start_section(&policy, &points, 1).roll, 1.0);
    }
}
