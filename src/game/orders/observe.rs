//! Read-only views of the order state for observation encoders and UI.

use bevy::prelude::*;
use serde::Serialize;

use crate::game::fixed_math::FixedVec2;
use super::graph::OrderGraph;
use super::types::OrderType;

/// What one unit is doing and how much is queued behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitOrderSummary {
    pub active_type: Option<OrderType>,
    pub target_position: Option<FixedVec2>,
    pub pending_count: usize,
    pub selected: bool,
}

pub fn summarize_unit(graph: &OrderGraph, unit: Entity, selected: bool) -> UnitOrderSummary {
    let active = graph.active_order(unit).and_then(|id| graph.order(id));
    UnitOrderSummary {
        active_type: active.map(|order| order.order_type),
        target_position: active.map(|order| order.position()),
        pending_count: graph.pending_count(unit),
        selected,
    }
}

/// Types of the unit's orders in execution order, active first.
pub fn order_sequence(graph: &OrderGraph, unit: Entity) -> Vec<OrderType> {
    graph
        .chain(unit)
        .into_iter()
        .filter_map(|id| graph.order(id))
        .map(|order| order.order_type)
        .collect()
}
