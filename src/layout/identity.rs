//! Point identity and structural diffing.
//!
//! Each override records a content hash of its curve point. Comparing the
//! recorded hashes against the live curve tells which points were inserted
//! or deleted, so the overrides of surviving points stay attached to them.

use bevy::prelude::*;

use crate::layout::curve::CurvePoints;
use crate::layout::point::PointOverride;
use crate::layout::random::{canonical_bits, hash_bytes};

/// Content hash of a point location.
///
/// Identity is the hash of the 3D location and nothing else, so two
/// distinct points at the same location are indistinguishable. Deleting
/// one of them may detach the overrides of the wrong one. This is an
/// accepted approximation.
pub fn point_hash(location: Vec3) -> u64 {
    let mut bytes = [0u8; 12];
    for (chunk, value) in bytes.chunks_exact_mut(4).zip(location.to_array()) {
        chunk.copy_from_slice(&canonical_bits(value).to_le_bytes());
    }
    hash_bytes(&bytes)
}

/// Structural changes between the cached ids and the live curve.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PointDiff {
    /// Live indices of new points, ascending.
    pub inserted: Vec<usize>,
    /// Cached indices of removed points, descending.
    pub deleted: Vec<usize>,
}

impl PointDiff {
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.deleted.is_empty()
    }
}

/// An unrecorded id matches anything.
fn same(cached: Option<u64>, live: u64) -> bool {
    cached.is_none_or(|id| id == live)
}

/// Diff the recorded ids of `points` against the live `curve`.
pub fn diff_points(points: &[PointOverride], curve: &impl CurvePoints) -> PointDiff {
    let cached: Vec<Option<u64>> = points.iter().map(|point| point.id).collect();
    let live: Vec<u64> = (0..curve.point_count())
        .map(|index| point_hash(curve.location(index)))
        .collect();
    diff_ids(&cached, &live)
}

pub fn diff_ids(cached: &[Option<u64>], live: &[u64]) -> PointDiff {
    PointDiff {
        inserted: inserted_indices(cached, live),
        deleted: deleted_indices(cached, live),
    }
}

/// Cached indices with no counterpart in `live`, in descending order.
///
/// Walks both sequences together. On a mismatch it looks ahead in the
/// cache, at most as far as there are deletions left to explain; a hit
/// marks everything skipped as deleted, a miss means the point moved.
pub fn deleted_indices(cached: &[Option<u64>], live: &[u64]) -> Vec<usize> {
    if cached.len() <= live.len() {
        return Vec::new();
    }
    let excess = cached.len() - live.len();

    let mut deleted = Vec::with_capacity(excess);
    let mut data = 0;
    for &live_id in live {
        if data >= cached.len() {
            break;
        }
        let remaining = excess - deleted.len();
        let window_end = (data + remaining).min(cached.len() - 1);
        match cached[data..=window_end]
            .iter()
            .position(|&id| same(id, live_id))
        {
            Some(offset) => {
                deleted.extend(data..data + offset);
                data += offset + 1;
            }
            None => data += 1,
        }
    }
    deleted.extend(data..cached.len());
    deleted.reverse();
    deleted
}

/// Live indices with no counterpart in `cached`, in ascending order.
///
/// Mirror of [`deleted_indices`]: a mismatched cached id that shows up
/// a little further along the live curve marks the current live point as
/// inserted; otherwise the point moved. Live points past the end of the
/// cache are appended.
pub fn inserted_indices(cached: &[Option<u64>], live: &[u64]) -> Vec<usize> {
    if live.len() <= cached.len() {
        return Vec::new();
    }
    let excess = live.len() - cached.len();

    let mut inserted = Vec::with_capacity(excess);
    let mut data = 0;
    for (index, &live_id) in live.iter().enumerate() {
        let Some(&cached_id) = cached.get(data) else {
            inserted.push(index);
            continue;
        };
        if same(cached_id, live_id) {
            data += 1;
            continue;
        }
        let remaining = excess - inserted.len();
        let window_end = (index + remaining).min(live.len() - 1);
        let reappears = remaining > 0
            && live[index + 1..=window_end]
                .iter()
                .any(|&id| same(cached_id, id));
        if reappears {
            inserted.push(index);
        } else {
            data += 1;
        }
    }
    inserted
}
