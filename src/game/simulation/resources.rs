/// Resource definitions for the simulation.
///
/// Fixed-point runtime configuration and the tick counter.

use bevy::prelude::*;
use crate::game::config::InitialConfig;
use crate::game::fixed_math::FixedNum;

// ============================================================================
// Tick Counter
// ============================================================================

/// Number of fixed simulation steps executed so far.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimTick(pub u64);

impl SimTick {
    pub fn increment(&mut self) {
        self.0 += 1;
    }
}

// ============================================================================
// Simulation Configuration
// ============================================================================

/// Runtime simulation configuration with fixed-point values for deterministic updates.
///
/// Converted from [`InitialConfig`] once at startup. All order execution reads
/// these values, never the float config, so every peer computes the same steps.
#[derive(Resource, Debug, Clone)]
pub struct SimConfig {
    pub tick_rate: f64,
    pub arrival_threshold: FixedNum,
    pub follow_distance: FixedNum,
    pub max_units: usize,
}

impl SimConfig {
    pub fn from_initial(initial: &InitialConfig) -> Self {
        Self {
            tick_rate: initial.tick_rate,
            arrival_threshold: FixedNum::from_num(initial.arrival_threshold),
            follow_distance: FixedNum::from_num(initial.follow_distance),
            max_units: initial.max_units,
        }
    }

    /// Length of one simulation step in seconds.
    pub fn dt(&self) -> FixedNum {
        FixedNum::ONE / FixedNum::from_num(self.tick_rate)
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::from_initial(&InitialConfig::default())
    }
}
