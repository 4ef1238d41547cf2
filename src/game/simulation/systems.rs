/// Core simulation systems.
///
/// This module contains systems for:
/// - Tick bookkeeping
/// - Startup conversion of the float config into fixed-point resources
/// - Spawn and destroy command processing
/// - The shared destruction path every despawn goes through

use bevy::prelude::*;
use std::collections::BTreeSet;

use crate::game::config::InitialConfig;
use crate::game::orders::OrderGraph;
use crate::game::unit::{spawn_unit, UnitTemplates};

use super::components::*;
use super::resources::*;
use super::events::*;

// ============================================================================
// Tick Management
// ============================================================================

/// Increment the global simulation tick counter.
///
/// Runs first in the FixedUpdate schedule so every other system sees the
/// current tick value.
pub fn increment_sim_tick(mut tick: ResMut<SimTick>) {
    tick.increment();
}

// ============================================================================
// Configuration
// ============================================================================

/// Convert the loaded [`InitialConfig`] into fixed-point runtime resources.
pub fn init_sim_config_from_initial(
    initial: Option<Res<InitialConfig>>,
    mut sim_config: ResMut<SimConfig>,
    mut templates: ResMut<UnitTemplates>,
    mut fixed_time: ResMut<Time<Fixed>>,
) {
    let Some(initial) = initial else {
        warn!("InitialConfig not loaded, keeping default simulation config");
        return;
    };
    if let Err(e) = initial.validate() {
        error!("InitialConfig rejected ({}), keeping default simulation config", e);
        return;
    }

    *sim_config = SimConfig::from_initial(&initial);
    *templates = UnitTemplates::from_initial(&initial);
    fixed_time.set_timestep_hz(initial.tick_rate);

    info!(
        "Simulation config: {} Hz, {} unit template(s), max {} units",
        initial.tick_rate,
        templates.len(),
        sim_config.max_units
    );
}

// ============================================================================
// Command Processing
// ============================================================================

/// Spawn requested units. Requests are applied in player order.
pub fn process_spawn_commands(
    mut commands: Commands,
    mut graph: ResMut<OrderGraph>,
    templates: Res<UnitTemplates>,
    config: Res<SimConfig>,
    mut spawn_events: MessageReader<SpawnUnitCommand>,
) {
    let mut spawns: Vec<&SpawnUnitCommand> = spawn_events.read().collect();
    spawns.sort_by_key(|e| e.player_id);

    for event in spawns {
        spawn_unit(
            &mut commands,
            &mut graph,
            &templates,
            config.max_units,
            &event.template,
            event.position,
            event.player_id,
        );
    }
}

/// Destroy requested entities, cancelling every order that targets them.
pub fn process_destroy_commands(
    mut commands: Commands,
    mut graph: ResMut<OrderGraph>,
    mut destroy_events: MessageReader<DestroyEntityCommand>,
    mut destroyed: MessageWriter<EntityDestroyed>,
    existing: Query<(), With<SimEntity>>,
) {
    let mut targets: Vec<Entity> = destroy_events.read().map(|e| e.entity).collect();
    targets.sort();

    let mut gone = BTreeSet::new();
    for entity in targets {
        if !existing.contains(entity) {
            if !gone.contains(&entity) {
                warn!("Destroy requested for unknown entity {:?}", entity);
            }
            continue;
        }
        destroy_entity(&mut commands, &mut graph, &mut gone, &mut destroyed, entity);
    }
}

// ============================================================================
// Destruction
// ============================================================================

/// Remove `entity` from the simulation.
///
/// Detaches it from the order graph if it is a unit, cancels every order
/// targeting it, queues the despawn and announces it. `gone` collects the
/// entities destroyed during the current system run; destroying one twice is
/// a no-op that returns false.
pub fn destroy_entity(
    commands: &mut Commands,
    graph: &mut OrderGraph,
    gone: &mut BTreeSet<Entity>,
    destroyed: &mut MessageWriter<EntityDestroyed>,
    entity: Entity,
) -> bool {
    if !gone.insert(entity) {
        return false;
    }

    graph.remove_unit(entity);
    let cancelled = graph.notify_target_destroyed(entity);
    commands.entity(entity).despawn();
    destroyed.write(EntityDestroyed { entity });

    debug!("Destroyed {:?}, {} dependent order(s) cancelled", entity, cancelled);
    true
}
