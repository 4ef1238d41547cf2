/// Inbound commands and outbound notifications of the simulation.
///
/// Commands are written by input layers (players, agents, match lifecycle)
/// and consumed in `SimSet::Input`. Notifications are written during the tick
/// for rendering, UI and economy bookkeeping.

use bevy::prelude::*;
use crate::game::fixed_math::{FixedNum, FixedVec2};
use crate::game::orders::{OrderEvent, OrderTarget, OrderType};

// ============================================================================
// Inbound Commands
// ============================================================================

/// Issue one shared order to a group of units.
#[derive(Message, Debug, Clone)]
pub struct IssueOrderCommand {
    pub player_id: u8,
    pub order_type: OrderType,
    pub target: OrderTarget,
    pub units: Vec<Entity>,
    /// Queue behind existing orders instead of replacing them.
    pub additive: bool,
}

/// Spawn a unit from a named template.
#[derive(Message, Debug, Clone)]
pub struct SpawnUnitCommand {
    pub player_id: u8,
    pub template: String,
    pub position: FixedVec2,
}

/// Destroy a unit or any other targetable entity.
#[derive(Message, Debug, Clone)]
pub struct DestroyEntityCommand {
    pub entity: Entity,
}

// ============================================================================
// Outbound Notifications
// ============================================================================

#[derive(Message, Debug, Clone, PartialEq, Eq)]
pub struct EntityDestroyed {
    pub entity: Entity,
}

/// Amount drained from a deposit by one of `player_id`'s units this tick.
#[derive(Message, Debug, Clone, PartialEq, Eq)]
pub struct ResourceCollected {
    pub player_id: u8,
    pub amount: FixedNum,
}

#[derive(Message, Debug, Clone, PartialEq, Eq)]
pub struct OrderLifecycle(pub OrderEvent);
