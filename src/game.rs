use bevy::prelude::*;

pub mod config;
pub mod fixed_math;
pub mod state_machine;
pub mod orders;
pub mod capability;
pub mod simulation;
pub mod unit;

use config::GameConfigPlugin;
use orders::OrdersPlugin;
use simulation::SimulationPlugin;
use unit::UnitPlugin;

/// Headless order simulation: config loading, the fixed-step schedule, units
/// and the order graph. Rendering and input live outside this plugin.
pub struct GamePlugin;

impl Plugin for GamePlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            GameConfigPlugin,
            SimulationPlugin,
            UnitPlugin,
            OrdersPlugin,
        ));
        info!("Game plugins registered");
    }
}
