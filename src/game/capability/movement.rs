use bevy::prelude::*;

use crate::game::orders::OrderTypeSet;
use super::{approach, CapabilityModule, ExecutedOrder, ModuleContext, ModuleState, ModuleStatus};

/// Straight-line travel for Move and Assist.
///
/// Position targets complete on arrival. Entity targets are followed at the
/// configured follow distance and never complete on their own.
pub struct MoveModule {
    handles: OrderTypeSet,
    state: ModuleState,
}

impl MoveModule {
    pub fn new(handles: OrderTypeSet) -> Self {
        Self { handles, state: ModuleState::Idle }
    }
}

impl CapabilityModule for MoveModule {
    fn name(&self) -> &'static str {
        "move"
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

        if order.target.entity().is_some() {
            let follow_distance = ctx.follow_distance;
            approach(ctx, follow_distance);
            return ModuleStatus::Running;
        }

        let stopping_distance = ctx.stats.stopping_distance;
        if approach(ctx, stopping_distance) {
            debug!("{} reached {:?}", order.id, ctx.target_position);
            self.state = ModuleState::Idle;
            return ModuleStatus::Completed;
        }
        ModuleStatus::Running
    }

    fn executing(&self) -> Option<&ExecutedOrder> {
        self.state.order()
    }
}
