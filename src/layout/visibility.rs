//! Which instances render, and with what collision.

use crate::layout::layers::{LayerConfig, RenderInfo, RenderMode};
use crate::layout::policy::{CollisionMode, GlobalPolicy};
use crate::layout::random::{hash_str, seeded_unit};

/// Resolved visibility of one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceVisibility {
    /// Invisible and without collision.
    Hidden,
    Shown { collision: CollisionMode },
}

/// Stable name of the instance of `layer` at `index`.
pub fn instance_name(layer: &str, index: usize) -> String {
    format!("{layer} #{index}")
}

/// Spawn-chance test for one index.
///
/// Randomized mode rolls independently per instance, seeded by the
/// instance name. Accumulated mode spreads spawns evenly: an index renders
/// when `floor(index * chance)` steps up from the previous index, and the
/// first index renders for any positive chance.
pub fn passes_spawn_chance(render: &RenderInfo, index: usize, instance_name: &str) -> bool {
    let chance = render.spawn_chance;
    if render.randomize_spawn_chance {
        let seed = (f64::from(hash_str(instance_name) as u32) * f64::from(chance)) as u64;
        chance > seeded_unit(seed)
    } else {
        let interval = 1.0 / chance.clamp(0.00001, 1.0);
        let current = (index as f32 / interval) as i64;
        let last = if index == 0 {
            i64::from(chance > 0.0)
        } else {
            ((index - 1) as f32 / interval) as i64
        };
        current != last
    }
}

/// Render-mode test for one index of a curve with `point_count` points.
///
/// The final index is the last point when looping and the one before it
/// otherwise. Middle covers every index that is neither the first nor the
/// final one.
pub fn passes_render_mode(
    render: &RenderInfo,
    index: usize,
    point_count: usize,
    loops: bool,
) -> bool {
    let mut final_index = point_count.saturating_sub(1);
    if !loops {
        final_index = final_index.saturating_sub(1);
    }

    let mode = render.mode;
    (mode.contains(RenderMode::HEAD) && index == 0)
        || (mode.contains(RenderMode::TAIL) && index == final_index)
        || (mode.contains(RenderMode::MIDDLE) && index != 0 && index != final_index)
        || (mode.contains(RenderMode::CUSTOM) && render.custom_indices.contains(&index))
}

/// Full visibility decision for the instance of a layer at `index`.
///
/// Hidden when the layer is inactive, when it is the last index of a
/// non-looping layer, or when spawn chance or render mode rule it out.
pub fn resolve(
    policy: &GlobalPolicy,
    config: &LayerConfig,
    index: usize,
    point_count: usize,
    instance_name: &str,
) -> InstanceVisibility {
    let loops = policy.loops(config.looping);
    let is_last = index + 1 == point_count;

    if !config.active
        || (is_last && !loops)
        || !passes_spawn_chance(&config.render, index, instance_name)
        || !passes_render_mode(&config.render, index, point_count, loops)
    {
        return InstanceVisibility::Hidden;
    }

    InstanceVisibility::Shown {
        collision: policy.collision_mode(config.physics.collision),
    }
}
