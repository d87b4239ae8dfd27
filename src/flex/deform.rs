use bevy::{
    mesh::{PrimitiveTopology, VertexAttributeValues},
    prelude::*,
};

use crate::geometry::{hermite, hermite_derivative, CoordinateFrame};
use crate::layout::SegmentPlacement;

use super::{NeedsDeform, SegmentSource};

/// Bend `mesh` along the Hermite segment described by `segment`.
///
/// The mesh's extent along the forward axis is stretched over the whole
/// segment: its minimum lands on the start point and its maximum on the
/// end point. The two cross-section axes follow the segment's right and up
/// directions, rolled, scaled and offset by the interpolated end values.
pub fn deform_mesh(mesh: &Mesh, segment: &SegmentPlacement) -> Option<Mesh> {
    let positions = match mesh.attribute(Mesh::ATTRIBUTE_POSITION)? {
        VertexAttributeValues::Float32x3(v) => v,
        _ => return None,
    };
    if positions.is_empty() {
        return None;
    }

    let axis = segment.forward_axis;
    let (min, max) = positions
        .iter()
        .map(|p| axis.split(Vec3::from_array(*p)).0)
        .fold((f32::MAX, f32::MIN), |(lo, hi), f| (lo.min(f), hi.max(f)));
    let length = max - min;

    let deformed: Vec<[f32; 3]> = positions
        .iter()
        .map(|p| {
            let (forward, cross) = axis.split(Vec3::from_array(*p));
            let t = if length > f32::EPSILON {
                (forward - min) / length
            } else {
                0.0
            };

            let center = hermite(
                segment.start_location,
                segment.start_tangent,
                segment.end_location,
                segment.end_tangent,
                t,
            );
            let tangent = hermite_derivative(
                segment.start_location,
                segment.start_tangent,
                segment.end_location,
                segment.end_tangent,
                t,
            );

            let roll = segment.start_roll + (segment.end_roll - segment.start_roll) * t;
            let scale = segment.start_scale.lerp(segment.end_scale, t);
            let offset = segment.start_offset.lerp(segment.end_offset, t);
            let frame = CoordinateFrame::from_tangent_with_up(tangent, segment.up)
                .rolled(roll.to_radians());

            let profile = cross * scale + offset;
            let world = center + frame.transform_profile_point(profile.x, profile.y);
            world.to_array()
        })
        .collect();

    let mut bent = mesh.clone();
    bent.insert_attribute(Mesh::ATTRIBUTE_POSITION, deformed);
    bent.remove_attribute(Mesh::ATTRIBUTE_TANGENT);
    if bent.primitive_topology() == PrimitiveTopology::TriangleList {
        bent.compute_normals();
    }
    Some(bent)
}

/// Regenerate the meshes of deformable instances marked [`NeedsDeform`].
///
/// Instances whose source mesh is still loading keep the marker and are
/// retried next frame.
pub fn deform_segments(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    pending: Query<(Entity, &SegmentSource, &SegmentPlacement), With<NeedsDeform>>,
) {
    for (entity, source, segment) in &pending {
        let Some(mesh) = meshes.get(&source.0) else {
            continue;
        };

        let Some(bent) = deform_mesh(mesh, segment) else {
            warn!("Cannot deform mesh of {entity}: no Float32x3 positions");
            commands.entity(entity).remove::<NeedsDeform>();
            continue;
        };

        let handle = meshes.add(bent);
        commands.entity(entity).insert(Mesh3d(handle)).remove::<NeedsDeform>();
    }
}
