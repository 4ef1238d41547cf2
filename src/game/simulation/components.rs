/// Component definitions for the simulation layer.
///
/// Positions, health and reclaimable resources: everything an order can
/// point at or wear down.

use bevy::prelude::*;
use crate::game::fixed_math::{FixedVec2, FixedNum};

// ============================================================================
// Position Components
// ============================================================================

/// Logical position of an entity in the simulation world.
/// We use FixedVec2 for deterministic gameplay.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct SimPosition(pub FixedVec2);

// ============================================================================
// Destructible Components
// ============================================================================

/// Hit points. The entity is destroyed when `current` reaches zero.
#[derive(Component, Debug, Clone, Copy)]
pub struct Health {
    pub current: FixedNum,
    pub max: FixedNum,
}

impl Health {
    pub fn full(max: FixedNum) -> Self {
        Self { current: max, max }
    }
}

/// Resource deposit that engineers drain with Reclaim orders. Destroys itself
/// when empty.
#[derive(Component, Debug, Clone, Copy)]
pub struct Reclaimable {
    pub amount: FixedNum,
}

/// Marker for entities owned by the simulation (units, deposits).
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct SimEntity;

/// Bundle for a reclaimable deposit placed by the match setup.
pub fn reclaimable_bundle(position: FixedVec2, amount: FixedNum) -> impl Bundle {
    (SimEntity, SimPosition(position), Reclaimable { amount })
}
