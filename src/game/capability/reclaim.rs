use bevy::prelude::*;

use crate::game::fixed_math::FixedNum;
use crate::game::orders::{OrderType, OrderTypeSet};
use super::{approach, CapabilityModule, ExecutedOrder, ModuleContext, ModuleEffect, ModuleState, ModuleStatus};

/// Drains a reclaimable deposit at `reclaim_power` per second once in range.
pub struct ReclaimModule {
    handles: OrderTypeSet,
    state: ModuleState,
}

impl ReclaimModule {
    pub fn new() -> Self {
        Self {
            handles: OrderTypeSet::from([OrderType::Reclaim]),
            state: ModuleState::Idle,
        }
    }

    fn finish(&mut self) -> ModuleStatus {
        self.state = ModuleState::Idle;
        ModuleStatus::Completed
    }
}

impl Default for ReclaimModule {
    fn default() -> Self {
        Self::new()
    }
}

impl CapabilityModule for ReclaimModule {
    fn name(&self) -> &'static str {
        "reclaim"
    }

    fn handles(&self) -> &OrderTypeSet {
        &self.handles
    }

    fn set_executed_order(&mut self, order: &ExecutedOrder) {
        self.state = ModuleState::Executing(order.clone());
    }

    fn clear_active_order(&mut self) {
        self.state = ModuleState::Idle;
    }

    fn update(&mut self, ctx: &mut ModuleContext) -> ModuleStatus {
        let Some(order) = self.state.order() else { return ModuleStatus::Idle };

        let Some(target) = order.target.entity() else {
            debug!("{} targets a position, nothing to reclaim", order.id);
            return self.finish();
        };
        let Some(remaining) = ctx.target_remaining else {
            debug!("{} target {:?} holds no resource", order.id, target);
            return self.finish();
        };
        if remaining <= FixedNum::ZERO {
            return self.finish();
        }

        let range = ctx.stats.reclaim_range;
        if !approach(ctx, range) {
            return ModuleStatus::Running;
        }

        let amount = (ctx.stats.reclaim_power * ctx.dt).min(remaining);
        if amount <= FixedNum::ZERO {
            return ModuleStatus::Running;
        }
        ctx.effects.push(ModuleEffect::Drain { target, amount });
        ctx.target_remaining = Some(remaining - amount);

        if remaining - amount <= FixedNum::ZERO {
            return self.finish();
        }
        ModuleStatus::Running
    }

    fn executing(&self) -> Option<&ExecutedOrder> {
        self.state.order()
    }
}
