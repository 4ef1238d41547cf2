mod components;
mod resources;
mod spawn;
mod systems;

use bevy::prelude::*;
use crate::game::simulation::SimSet;

// Re-export public types
pub use components::{Unit, UnitStats, Selected};
pub use resources::{TemplateStats, UnitTemplates};
pub use spawn::{spawn_unit, spawn_unit_in_world, unit_bundle};
pub use systems::execute_unit_orders;

/// Plugin that manages unit templates and ticks every unit's active order
pub struct UnitPlugin;

impl Plugin for UnitPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<UnitTemplates>()
           .add_systems(FixedUpdate, execute_unit_orders.in_set(SimSet::Execution));
    }
}
