//! Seeded, reproducible perturbations.
//!
//! Every draw is a pure function of its inputs so repeated rebuilds land
//! instances in exactly the same place.

use bevy::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::geometry::Rotator;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(mut state: u64, bytes: &[u8]) -> u64 {
    for byte in bytes {
        state ^= u64::from(*byte);
        state = state.wrapping_mul(FNV_PRIME);
    }
    state
}

/// Stable 64-bit hash of a byte string.
pub fn hash_bytes(bytes: &[u8]) -> u64 {
    fnv1a(FNV_OFFSET_BASIS, bytes)
}

/// Stable hash of a string.
pub fn hash_str(value: &str) -> u64 {
    hash_bytes(value.as_bytes())
}

/// Stable hash of a float. `-0.0` and `0.0` hash the same.
pub fn hash_f32(value: f32) -> u64 {
    hash_bytes(&canonical_bits(value).to_le_bytes())
}

pub(crate) fn canonical_bits(value: f32) -> u32 {
    if value == 0.0 {
        0
    } else {
        value.to_bits()
    }
}

/// Seed for a scalar draw: half the value hash plus half the layer hash,
/// plus the integral part of the value, minus the point index.
pub fn scalar_seed(base: f32, index: usize, layer: &str) -> u64 {
    (hash_f32(base) / 2)
        .wrapping_add(hash_str(layer) / 2)
        .wrapping_add(base.floor() as i64 as u64)
        .wrapping_sub(index as u64)
}

/// Returns `base * u` with `u` drawn uniformly from [-1, 1].
///
/// A zero `base` is returned untouched, so an axis without a random
/// offset never moves.
pub fn randomize_scalar(base: f32, index: usize, layer: &str) -> f32 {
    if base == 0.0 {
        return 0.0;
    }
    let mut rng = ChaCha8Rng::seed_from_u64(scalar_seed(base, index, layer));
    base * rng.random_range(-1.0..=1.0)
}

/// Randomize each component independently.
pub fn randomize_vec3(value: Vec3, index: usize, layer: &str) -> Vec3 {
    Vec3::new(
        randomize_scalar(value.x, index, layer),
        randomize_scalar(value.y, index, layer),
        randomize_scalar(value.z, index, layer),
    )
}

/// Randomize pitch, yaw and roll independently.
pub fn randomize_rotator(value: Rotator, index: usize, layer: &str) -> Rotator {
    Rotator::from_vec3(randomize_vec3(value.to_vec3(), index, layer))
}

/// Reproducible value in [0, 1) keyed only by `seed`.
pub fn seeded_unit(seed: u64) -> f32 {
    let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(1).wrapping_mul(13));
    rng.random::<f32>()
}
