use bevy::prelude::*;

/// Generically defines where a configuration applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
#[reflect(Default)]
pub enum GlobalConfig {
    /// Force the configuration on for every layer or point.
    Everywhere,
    /// Force the configuration off for every layer or point.
    Nowhere,
    /// Each layer or point decides for itself.
    #[default]
    Custom,
}

impl GlobalConfig {
    /// Resolve against the flag of an individual layer or point.
    pub fn resolve(self, local: bool) -> bool {
        match self {
            Self::Everywhere => true,
            Self::Nowhere => false,
            Self::Custom => local,
        }
    }
}

/// How an instance takes part in collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
#[reflect(Default)]
pub enum CollisionMode {
    NoCollision,
    /// Visible to spatial queries and overlaps only.
    #[default]
    QueryOnly,
    /// Physical response without query visibility.
    PhysicsOnly,
    QueryAndPhysics,
}

impl CollisionMode {
    pub fn is_enabled(self) -> bool {
        self != Self::NoCollision
    }
}

/// Spline-wide switches that override or defer to per-layer and per-point flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Default)]
pub struct GlobalPolicy {
    /// Collision for every instance, or per layer (see `PhysicsInfo::collision`).
    pub collision: GlobalConfig,
    /// Whether points may copy the previous point's end values into their start values.
    pub synchronize: GlobalConfig,
    /// Whether the final point bridges back to the first.
    pub looping: GlobalConfig,
}

impl Default for GlobalPolicy {
    fn default() -> Self {
        Self {
            collision: GlobalConfig::Nowhere,
            synchronize: GlobalConfig::Custom,
            looping: GlobalConfig::Custom,
        }
    }
}

impl GlobalPolicy {
    /// Collision for a layer whose own setting is `layer_mode`.
    pub fn collision_mode(&self, layer_mode: CollisionMode) -> CollisionMode {
        match self.collision {
            GlobalConfig::Everywhere => CollisionMode::QueryAndPhysics,
            GlobalConfig::Nowhere => CollisionMode::NoCollision,
            GlobalConfig::Custom => layer_mode,
        }
    }

    /// Whether a layer with loop flag `layer_loops` loops.
    pub fn loops(&self, layer_loops: bool) -> bool {
        self.looping.resolve(layer_loops)
    }

    /// Whether a point with sync flag `point_syncs` synchronizes.
    pub fn synchronizes(&self, point_syncs: bool) -> bool {
        self.synchronize.resolve(point_syncs)
    }
}
