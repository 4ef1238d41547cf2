//! Build: walk to the site, then accumulate progress until the template's
//! build time is reached and a new unit appears at the site.

use bevy::prelude::*;

use crate::game::fixed_math::FixedNum;
use crate::game::orders::OrderTypeSet;
use crate::game::state_machine::{Insert, State, StateControl, StateMachine};
use super::{approach, CapabilityModule, ExecutedOrder, ModuleContext, ModuleEffect, ModuleState, ModuleStatus};

struct Approach;

impl State<ModuleContext> for Approach {
    fn step(&mut self, ctx: &mut ModuleContext, control: &mut StateControl<ModuleContext>) {
        let range = ctx.stats.build_range;
        if approach(ctx, range) {
            control.complete();
        }
    }

    fn name(&self) -> &'static str {
        "approach"
    }
}

struct Construct {
    template: String,
    build_time: FixedNum,
    progress: FixedNum,
}

impl State<ModuleContext> for Construct {
    fn step(&mut self, ctx: &mut ModuleContext, control: &mut StateControl<ModuleContext>) {
        self.progress += ctx.stats.build_rate * ctx.dt;
        if self.progress >= self.build_time {
            ctx.effects.push(ModuleEffect::Spawn {
                template: self.template.clone(),
                position: ctx.target_position,
            });
            control.complete();
        }
    }

    fn name(&self) -> &'static str {
        "construct"
    }
}

pub struct BuildModule {
    handles: OrderTypeSet,
    state: ModuleState,
    machine: StateMachine<ModuleContext>,
}

impl BuildModule {
    pub fn new(handles: OrderTypeSet) -> Self {
        Self { handles, state: ModuleState::Idle, machine: StateMachine::new() }
    }

    pub fn phase(&self) -> Option<&'static str> {
        self.machine.current()
    }

    fn finish(&mut self) -> ModuleStatus {
        self.machine.clear();
        self.state = ModuleState::Idle;
        ModuleStatus::Completed
    }
}

impl CapabilityModule for BuildModule {
    fn name(&self) -> &'static str {
        "build"
    }

    fn handles(&self) -> &OrderTypeSet {
        &self.handles
    }

    fn set_executed_order(&mut self, order: &ExecutedOrder) {
        self.machine.clear();
        self.state = ModuleState::Executing(order.clone());
    }

    fn clear_active_order(&mut self) {
        self.machine.clear();
        self.state = ModuleState::Idle;
    }

    fn update(&mut self, ctx: &mut ModuleContext) -> ModuleStatus {
        let Some(order) = self.state.order() else { return ModuleStatus::Idle };

        // Build time comes from the templates, which the first update sees.
        if self.machine.is_empty() {
            let Some(template) = order.payload.build_template() else {
                warn!("{} ({:?}) carries no template to build", order.id, order.order_type);
                return self.finish();
            };
            let Some(build_time) = ctx.build_time else {
                warn!("{} wants unknown template '{}'", order.id, template);
                return self.finish();
            };
            let template = template.to_string();
            self.machine.add_state(Approach, Insert::Back);
            self.machine.add_state(
                Construct { template, build_time, progress: FixedNum::ZERO },
                Insert::Back,
            );
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
