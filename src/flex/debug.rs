//! Debug gizmos for flex splines.

use bevy::prelude::*;

use crate::spline::Spline;

use super::{FlexSpline, FlexSplineSettings, PointLabel, UpArrow};

/// Run condition for debug drawing.
pub fn debug_enabled(settings: Res<FlexSplineSettings>) -> bool {
    settings.show_debug
}

/// Draw the curve of every flex spline.
pub fn draw_flex_curves(
    mut gizmos: Gizmos,
    settings: Res<FlexSplineSettings>,
    splines: Query<(&Spline, &GlobalTransform), With<FlexSpline>>,
) {
    for (spline, transform) in &splines {
        if !spline.is_valid() {
            continue;
        }
        let points = spline
            .sample(settings.curve_resolution)
            .into_iter()
            .map(|p| transform.transform_point(p));
        gizmos.linestrip(points, settings.curve_color);
    }
}

/// Draw up arrows, coloured by the position of their layer.
pub fn draw_up_arrows(
    mut gizmos: Gizmos,
    settings: Res<FlexSplineSettings>,
    arrows: Query<(&UpArrow, &GlobalTransform, &Visibility)>,
) {
    for (arrow, transform, visibility) in &arrows {
        if *visibility == Visibility::Hidden {
            continue;
        }
        let start = transform.translation();
        let end = start + transform.rotation() * arrow.direction * arrow.size;
        gizmos.arrow(start, end, settings.arrow_color(arrow.layer_slot));
    }
}

/// Draw point labels as small spheres.
pub fn draw_point_labels(
    mut gizmos: Gizmos,
    labels: Query<(&PointLabel, &GlobalTransform, &Visibility)>,
) {
    for (label, transform, visibility) in &labels {
        if *visibility == Visibility::Hidden {
            continue;
        }
        gizmos.sphere(
            Isometry3d::from_translation(transform.translation()),
            label.size * 0.5,
            label.color,
        );
    }
}
