/// Capability modules - per-order-type behavior executors attached to units.
///
/// This module is organized into:
/// - **movement**: Move and Assist (straight-line travel, entity following)
/// - **reclaim**: Draining resource deposits
/// - **attack**: Approach/Engage state machine against entities with health
/// - **build**: Approach/Construct state machine producing new units
///
/// A unit's [`CapabilitySet`] owns one module per behavior and a static table
/// mapping each order tag to the modules registered for it. Modules never touch
/// the world directly: they read a [`ModuleContext`] snapshot and report
/// [`ModuleEffect`]s, which the execution system applies in unit order.

use bevy::prelude::*;
use smallvec::SmallVec;
use std::collections::BTreeMap;

use crate::game::fixed_math::{step_towards, FixedNum, FixedVec2};
use crate::game::orders::{Order, OrderId, OrderPayload, OrderTarget, OrderType, OrderTypeSet};
use crate::game::unit::UnitStats;

pub mod movement;
pub mod reclaim;
pub mod attack;
pub mod build;

#[cfg(test)]
mod tests;

pub use movement::MoveModule;
pub use reclaim::ReclaimModule;
pub use attack::AttackModule;
pub use build::BuildModule;

// ============================================================================
// Execution Context
// ============================================================================

/// Snapshot of the world a module sees during one update.
#[derive(Debug, Clone)]
pub struct ModuleContext {
    /// Unit position; modules write the moved position back here.
    pub position: FixedVec2,
    pub dt: FixedNum,
    pub stats: UnitStats,
    pub follow_distance: FixedNum,
    /// Tracked position of the active order's target.
    pub target_position: FixedVec2,
    /// Health of an attack target or amount left in a reclaim target.
    /// None when the target has nothing of the kind.
    pub target_remaining: Option<FixedNum>,
    /// Build time of the template a build order produces.
    pub build_time: Option<FixedNum>,
    pub effects: Vec<ModuleEffect>,
}

impl ModuleContext {
    pub fn new(position: FixedVec2, dt: FixedNum, stats: UnitStats, follow_distance: FixedNum) -> Self {
        Self {
            position,
            dt,
            stats,
            follow_distance,
            target_position: FixedVec2::ZERO,
            target_remaining: None,
            build_time: None,
            effects: Vec::new(),
        }
    }

    pub fn distance_to_target(&self) -> FixedNum {
        self.position.distance(self.target_position)
    }
}

/// World change requested by a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleEffect {
    Drain { target: Entity, amount: FixedNum },
    Damage { target: Entity, amount: FixedNum },
    Spawn { template: String, position: FixedVec2 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleStatus {
    /// No order to execute.
    Idle,
    Running,
    /// The order is done; the unit should advance.
    Completed,
}

// ============================================================================
// Modules
// ============================================================================

/// The parts of an order a module keeps while executing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedOrder {
    pub id: OrderId,
    pub order_type: OrderType,
    pub target: OrderTarget,
    pub payload: OrderPayload,
}

impl From<&Order> for ExecutedOrder {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            order_type: order.order_type,
            target: order.target,
            payload: order.payload.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ModuleState {
    #[default]
    Idle,
    Executing(ExecutedOrder),
}

impl ModuleState {
    pub fn order(&self) -> Option<&ExecutedOrder> {
        match self {
            ModuleState::Executing(order) => Some(order),
            ModuleState::Idle => None,
        }
    }
}

/// A behavior that executes orders of the tags it handles.
///
/// `set_executed_order` moves the module from Idle to Executing. `update`
/// returns [`ModuleStatus::Completed`] once the order is finished, at which
/// point the module is Idle again.
pub trait CapabilityModule: Send + Sync {
    fn name(&self) -> &'static str;

    /// Tags this module registers for.
    fn handles(&self) -> &OrderTypeSet;

    fn set_executed_order(&mut self, order: &ExecutedOrder);

    fn clear_active_order(&mut self);

    fn update(&mut self, ctx: &mut ModuleContext) -> ModuleStatus;

    fn executing(&self) -> Option<&ExecutedOrder>;
}

// ============================================================================
// Capability Set
// ============================================================================

/// A unit's modules and the tag dispatch table built from them.
#[derive(Component)]
pub struct CapabilitySet {
    modules: Vec<Box<dyn CapabilityModule>>,
    dispatch: BTreeMap<OrderType, SmallVec<[usize; 2]>>,
    active: Option<ExecutedOrder>,
}

impl CapabilitySet {
    pub fn new(modules: Vec<Box<dyn CapabilityModule>>) -> Self {
        let mut dispatch: BTreeMap<OrderType, SmallVec<[usize; 2]>> = BTreeMap::new();
        for (index, module) in modules.iter().enumerate() {
            for tag in module.handles().iter() {
                dispatch.entry(tag).or_default().push(index);
            }
        }
        Self { modules, dispatch, active: None }
    }

    /// Build the standard modules for a template's capability tags.
    pub fn from_capabilities(capabilities: &OrderTypeSet) -> Self {
        let mut modules: Vec<Box<dyn CapabilityModule>> = Vec::new();

        let movement = capabilities.intersection(&OrderTypeSet::from([OrderType::Move, OrderType::Assist]));
        if !movement.is_empty() {
            modules.push(Box::new(MoveModule::new(movement)));
        }
        if capabilities.contains(OrderType::Reclaim) {
            modules.push(Box::new(ReclaimModule::new()));
        }
        if capabilities.contains(OrderType::Attack) {
            modules.push(Box::new(AttackModule::new()));
        }
        let builds: OrderTypeSet = capabilities.iter().filter(|tag| tag.is_build()).collect();
        if !builds.is_empty() {
            modules.push(Box::new(BuildModule::new(builds)));
        }

        Self::new(modules)
    }

    pub fn capabilities(&self) -> OrderTypeSet {
        self.dispatch.keys().copied().collect()
    }

    pub fn can_execute(&self, order_type: OrderType) -> bool {
        self.dispatch.contains_key(&order_type)
    }

    pub fn active_order(&self) -> Option<OrderId> {
        self.active.as_ref().map(|order| order.id)
    }

    pub fn module_names(&self) -> Vec<&'static str> {
        self.modules.iter().map(|module| module.name()).collect()
    }

    /// Point the modules at the unit's current active order. Modules of the
    /// previous order are cleared; nothing happens if the order is unchanged.
    pub fn sync(&mut self, active: Option<&Order>) {
        if self.active_order() == active.map(|order| order.id) {
            return;
        }

        if let Some(previous) = self.active.take() {
            for &index in self.modules_for(previous.order_type).iter() {
                self.modules[index].clear_active_order();
            }
        }

        if let Some(order) = active {
            let executed = ExecutedOrder::from(order);
            let indices = self.modules_for(order.order_type);
            if indices.is_empty() {
                warn!("No module can execute {} ({:?})", order.id, order.order_type);
            }
            for &index in indices.iter() {
                self.modules[index].set_executed_order(&executed);
            }
            self.active = Some(executed);
        }
    }

    /// Update the modules registered for the active order.
    ///
    /// Completes when any of them completes. An order no module handles
    /// completes at once so the unit does not stall on it.
    pub fn update(&mut self, ctx: &mut ModuleContext) -> ModuleStatus {
        let Some(order_type) = self.active.as_ref().map(|order| order.order_type) else {
            return ModuleStatus::Idle;
        };
        let indices = self.modules_for(order_type);
        if indices.is_empty() {
            return ModuleStatus::Completed;
        }

        let mut status = ModuleStatus::Running;
        for &index in indices.iter() {
            if self.modules[index].update(ctx) == ModuleStatus::Completed {
                status = ModuleStatus::Completed;
            }
        }
        status
    }

    fn modules_for(&self, order_type: OrderType) -> SmallVec<[usize; 2]> {
        self.dispatch.get(&order_type).cloned().unwrap_or_default()
    }
}

// ============================================================================
// Shared Helpers
// ============================================================================

/// Move toward the target until within `range`. Returns true once in range.
pub(crate) fn approach(ctx: &mut ModuleContext, range: FixedNum) -> bool {
    let step = step_towards(ctx.position, ctx.target_position, ctx.stats.speed * ctx.dt, range);
    ctx.position = step.position;
    step.arrived
}
