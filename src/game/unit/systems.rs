//! Per-tick order execution.
//!
//! Units are processed one at a time in ascending entity order. Each unit's
//! modules run once, their effects are applied, the unit advances if its order
//! completed, and every unit whose active order changed as a consequence is
//! resynchronised before the next unit runs.

use bevy::prelude::*;
use std::collections::BTreeSet;

use crate::game::fixed_math::FixedNum;
use crate::game::capability::{CapabilitySet, ModuleContext, ModuleEffect, ModuleStatus};
use crate::game::orders::{OrderGraph, OrderType};
use crate::game::simulation::{
    destroy_entity, EntityDestroyed, Health, Reclaimable, ResourceCollected, SimConfig, SimPosition, SimTick,
};
use crate::profile_log;

use super::components::{Unit, UnitStats};
use super::resources::UnitTemplates;
use super::spawn::spawn_unit;

type UnitQueryData = (
    Entity,
    &'static Unit,
    &'static UnitStats,
    &'static mut SimPosition,
    &'static mut CapabilitySet,
);

/// Point every unit in `changed` at its current active order.
fn resync_units(graph: &OrderGraph, units: &mut Query<UnitQueryData>, changed: Vec<Entity>) {
    for entity in changed {
        if let Ok((_, _, _, _, mut caps)) = units.get_mut(entity) {
            caps.sync(graph.active_order(entity).and_then(|id| graph.order(id)));
        }
    }
}

pub fn execute_unit_orders(
    mut commands: Commands,
    mut graph: ResMut<OrderGraph>,
    config: Res<SimConfig>,
    templates: Res<UnitTemplates>,
    tick: Res<SimTick>,
    mut units: Query<UnitQueryData>,
    mut health: Query<&mut Health>,
    mut deposits: Query<&mut Reclaimable>,
    mut destroyed: MessageWriter<EntityDestroyed>,
    mut collected: MessageWriter<ResourceCollected>,
) {
    let dt = config.dt();
    let mut order: Vec<Entity> = units.iter().map(|(entity, ..)| entity).collect();
    order.sort();

    let changed = graph.take_changed_units();
    resync_units(&graph, &mut units, changed);

    let mut gone: BTreeSet<Entity> = BTreeSet::new();
    let mut completed = 0usize;

    for entity in order {
        if gone.contains(&entity) {
            continue;
        }

        let active = graph.active_order(entity);
        let (owner, status, effects) = {
            let Ok((_, unit, stats, mut position, mut caps)) = units.get_mut(entity) else { continue };
            let Some(current) = active.and_then(|id| graph.order(id)) else {
                caps.sync(None);
                continue;
            };
            caps.sync(Some(current));

            let mut ctx = ModuleContext::new(position.0, dt, *stats, config.follow_distance);
            ctx.target_position = current.position();
            ctx.target_remaining = current.target.entity().and_then(|target| match current.order_type {
                OrderType::Attack => health.get(target).ok().map(|h| h.current),
                OrderType::Reclaim => deposits.get(target).ok().map(|r| r.amount),
                _ => None,
            });
            ctx.build_time = current
                .payload
                .build_template()
                .and_then(|name| templates.get(name))
                .map(|template| template.build_time);

            let status = caps.update(&mut ctx);
            position.0 = ctx.position;
            (unit.owner, status, ctx.effects)
        };

        for effect in effects {
            match effect {
                ModuleEffect::Drain { target, amount } => {
                    if gone.contains(&target) {
                        continue;
                    }
                    let Ok(mut deposit) = deposits.get_mut(target) else { continue };
                    let taken = amount.min(deposit.amount);
                    deposit.amount -= taken;
                    collected.write(ResourceCollected { player_id: owner, amount: taken });
                    if deposit.amount <= FixedNum::ZERO {
                        destroy_entity(&mut commands, &mut graph, &mut gone, &mut destroyed, target);
                    }
                }
                ModuleEffect::Damage { target, amount } => {
                    if gone.contains(&target) {
                        continue;
                    }
                    let Ok(mut hp) = health.get_mut(target) else { continue };
                    hp.current -= amount;
                    if hp.current <= FixedNum::ZERO {
                        destroy_entity(&mut commands, &mut graph, &mut gone, &mut destroyed, target);
                    }
                }
                ModuleEffect::Spawn { template, position } => {
                    spawn_unit(
                        &mut commands,
                        &mut graph,
                        &templates,
                        config.max_units,
                        &template,
                        position,
                        owner,
                    );
                }
            }
        }

        // A destroyed target may already have moved the unit on.
        if status == ModuleStatus::Completed && !gone.contains(&entity) && graph.active_order(entity) == active {
            completed += 1;
            if let Err(err) = graph.advance_unit(entity) {
                error!("Could not advance {:?}: {}", entity, err);
            }
        }

        let changed = graph.take_changed_units();
        resync_units(&graph, &mut units, changed);
    }

    profile_log!(tick, "[ORDERS] {} orders, {} links, {} completed this tick",
        graph.order_count(), graph.link_count(), completed);
}
