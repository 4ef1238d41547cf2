//! Attack: close in on a target with health, then wear it down.
//!
//! Runs as a two-state machine. `Approach` completes once the target is in
//! attack range; `Engage` deals damage every step and completes on the kill.
//! When the target walks out of range, `Engage` puts a fresh `Approach` in
//! front of itself and resumes once it is back in range.

use bevy::prelude::*;

use crate::game::fixed_math::FixedNum;
use crate::game::orders::{OrderType, OrderTypeSet};
use crate::game::state_machine::{Insert, State, StateControl, StateMachine};
use super::{approach, CapabilityModule, ExecutedOrder, ModuleContext, ModuleEffect, ModuleState, ModuleStatus};

/// Distance beyond attack range tolerated before re-approaching, so rounding
/// on the stopping ring does not bounce between the two states. 1/16 unit.
pub(crate) const RANGE_SLACK: FixedNum = FixedNum::from_bits(1 << 12);

struct Approach;

impl State<ModuleContext> for Approach {
    fn step(&mut self, ctx: &mut ModuleContext, control: &mut StateControl<ModuleContext>) {
        let range = ctx.stats.attack_range;
        if approach(ctx, range) {
            control.complete();
        }
    }

    fn name(&self) -> &'static str {
        "approach"
    }
}

struct Engage {
    target: Entity,
}

impl State<ModuleContext> for Engage {
    fn step(&mut self, ctx: &mut ModuleContext, control: &mut StateControl<ModuleContext>) {
        if ctx.distance_to_target() > ctx.stats.attack_range + RANGE_SLACK {
            control.add_state(Approach, Insert::Front);
            return;
        }

        let Some(remaining) = ctx.target_remaining else {
            control.complete();
            return;
        };
        let amount = ctx.stats.attack_damage * ctx.dt;
        if amount > FixedNum::ZERO {
            ctx.effects.push(ModuleEffect::Damage { target: self.target, amount });
        }
        let left = remaining - amount;
        ctx.target_remaining = Some(left);
        if left <= FixedNum::ZERO {
            control.complete();
        }
    }

    fn name(&self) -> &'static str {
        "engage"
    }
}

pub struct AttackModule {
    handles: OrderTypeSet,
    state: ModuleState,
    machine: StateMachine<ModuleContext>,
}

impl AttackModule {
    pub fn new() -> Self {
        Self {
            handles: OrderTypeSet::from([OrderType::Attack]),
            state: ModuleState::Idle,
            machine: StateMachine::new(),
        }
    }

    /// Name of the running step, for inspection.
    pub fn phase(&self) -> Option<&'static str> {
        self.machine.current()
    }

    fn finish(&mut self) -> ModuleStatus {
        self.machine.clear();
        self.state = ModuleState::Idle;
        ModuleStatus::Completed
    }
}

impl Default for AttackModule {
    fn default() -> Self {
        Self::new()
    }
}

impl CapabilityModule for AttackModule {
    fn name(&self) -> &'static str {
        "attack"
    }

    fn handles(&self) -> &OrderTypeSet {
        &self.handles
    }

    fn set_executed_order(&mut self, order: &ExecutedOrder) {
        self.machine.clear();
        if let Some(target) = order.target.entity() {
            self.machine.add_state(Approach, Insert::Back);
            self.machine.add_state(Engage { target }, Insert::Back);
        }
        self.state = ModuleState::Executing(order.clone());
    }

    fn clear_active_order(&mut self) {
        self.machine.clear();
        self.state = ModuleState::Idle;
    }

    fn update(&mut self, ctx: &mut ModuleContext) -> ModuleStatus {
        let Some(order) = self.state.order() else { return ModuleStatus::Idle };

        if order.target.entity().is_none() {
            debug!("{} targets a position, nothing to attack", order.id);
            return self.finish();
        }
        if ctx.target_remaining.is_none() {
            debug!("{} target has no health", order.id);
            return self.finish();
        }

        self.machine.step(ctx);
        if self.machine.is_empty() {
            return self.finish();
        }
        ModuleStatus::Running
    }

    fn executing(&self) -> Option<&ExecutedOrder> {
        self.state.order()
    }
}
