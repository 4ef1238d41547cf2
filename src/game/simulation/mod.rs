/// Simulation layer - deterministic game logic.
///
/// This module is organized into:
/// - **components**: Simulation components (position, health, reclaimable deposits)
/// - **resources**: Simulation resources (fixed-point config, tick counter)
/// - **events**: Inbound commands and outbound notifications
/// - **systems**: Tick bookkeeping, config conversion, spawn/destroy handling

use bevy::prelude::*;
use crate::game::config::load_initial_config;

// Module declarations
pub mod components;
pub mod resources;
pub mod events;
pub mod systems;

// Re-export commonly used items
pub use components::*;
pub use resources::*;
pub use events::*;

pub use systems::destroy_entity;

// System sets for organizing execution order
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum SimSet {
    Input,     // Applying destroy, spawn and order commands
    Targets,   // Refreshing positions of entity targets
    Execution, // Ticking capability modules and advancing units
    Publish,   // Emitting lifecycle notifications
}

/// Main simulation plugin
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        // Overwritten from InitialConfig at startup
        app.insert_resource(Time::<Fixed>::from_hz(20.0));

        app.init_resource::<SimConfig>();
        app.init_resource::<SimTick>();

        // Register messages
        app.add_message::<IssueOrderCommand>();
        app.add_message::<SpawnUnitCommand>();
        app.add_message::<DestroyEntityCommand>();
        app.add_message::<EntityDestroyed>();
        app.add_message::<ResourceCollected>();
        app.add_message::<OrderLifecycle>();

        // Configure System Sets
        app.configure_sets(FixedUpdate, (
            SimSet::Input,
            SimSet::Targets,
            SimSet::Execution,
            SimSet::Publish,
        ).chain());

        app.add_systems(Startup, systems::init_sim_config_from_initial.after(load_initial_config));

        // Fixed update systems (deterministic simulation)
        app.add_systems(FixedUpdate, (
            systems::increment_sim_tick.before(SimSet::Input),
            (
                systems::process_destroy_commands,
                systems::process_spawn_commands,
            ).chain().in_set(SimSet::Input),
        ));
    }
}
