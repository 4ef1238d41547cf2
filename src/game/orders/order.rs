use bevy::prelude::*;
use std::collections::BTreeSet;

use crate::game::fixed_math::FixedVec2;
use super::types::{OrderId, OrderPayload, OrderTarget, OrderType};

/// A shared command. Any number of units can hold the same order as their
/// active order; queued holders are tracked by the graph's links instead.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub order_type: OrderType,
    pub target: OrderTarget,
    pub payload: OrderPayload,
    assigned: BTreeSet<Entity>,
    /// Last observed position of an entity target, `FixedVec2::ZERO` until the
    /// first refresh. Equal to the fixed point for position targets.
    tracked_position: FixedVec2,
}

impl Order {
    pub(crate) fn new(id: OrderId, order_type: OrderType, target: OrderTarget) -> Self {
        let tracked_position = match target {
            OrderTarget::Position(pos) => pos,
            OrderTarget::Entity(_) => FixedVec2::ZERO,
        };
        Self {
            id,
            order_type,
            target,
            payload: OrderPayload::for_type(order_type),
            assigned: BTreeSet::new(),
            tracked_position,
        }
    }

    /// Target position. Entity targets report the position recorded by the
    /// most recent target refresh, so orders follow moving targets.
    pub fn position(&self) -> FixedVec2 {
        self.tracked_position
    }

    pub(crate) fn track(&mut self, position: FixedVec2) {
        if let OrderTarget::Entity(_) = self.target {
            self.tracked_position = position;
        }
    }

    pub fn follows_entity(&self) -> bool {
        matches!(self.target, OrderTarget::Entity(_))
    }

    /// Units holding this order as their active order.
    pub fn assigned_units(&self) -> impl Iterator<Item = Entity> + '_ {
        self.assigned.iter().copied()
    }

    pub fn is_assigned(&self, unit: Entity) -> bool {
        self.assigned.contains(&unit)
    }

    pub fn assigned_count(&self) -> usize {
        self.assigned.len()
    }

    pub(crate) fn assign_unit(&mut self, unit: Entity) -> bool {
        self.assigned.insert(unit)
    }

    /// Returns true when the assigned set is empty afterwards; the caller must
    /// then run the reachability check.
    pub(crate) fn unassign_unit(&mut self, unit: Entity) -> bool {
        self.assigned.remove(&unit);
        self.assigned.is_empty()
    }
}
