//! Spawning units from templates.
//!
//! Every spawned unit is registered with the order graph right away, so
//! orders can name it in the same tick it was requested.

use bevy::prelude::*;

use crate::game::capability::CapabilitySet;
use crate::game::fixed_math::FixedVec2;
use crate::game::orders::OrderGraph;
use crate::game::simulation::{Health, SimConfig, SimEntity, SimPosition};

use super::components::Unit;
use super::resources::{TemplateStats, UnitTemplates};

/// Everything a unit entity carries.
pub fn unit_bundle(name: &str, template: &TemplateStats, position: FixedVec2, owner: u8) -> impl Bundle {
    (
        SimEntity,
        Unit { template: name.to_string(), owner },
        template.stats,
        SimPosition(position),
        Health::full(template.max_health),
        CapabilitySet::from_capabilities(&template.capabilities),
    )
}

/// Look up `name` and enforce the unit cap. Logs and returns None when the
/// spawn must be dropped.
fn admit<'a>(
    graph: &OrderGraph,
    templates: &'a UnitTemplates,
    max_units: usize,
    name: &str,
) -> Option<&'a TemplateStats> {
    if graph.unit_count() >= max_units {
        warn!("Unit cap of {} reached, dropping spawn of '{}'", max_units, name);
        return None;
    }
    let template = templates.get(name);
    if template.is_none() {
        warn!("Unknown unit template '{}', spawn dropped", name);
    }
    template
}

/// Spawn a unit through `commands`. The entity exists once commands are applied.
pub fn spawn_unit(
    commands: &mut Commands,
    graph: &mut OrderGraph,
    templates: &UnitTemplates,
    max_units: usize,
    name: &str,
    position: FixedVec2,
    owner: u8,
) -> Option<Entity> {
    let template = admit(graph, templates, max_units, name)?;
    let entity = commands.spawn(unit_bundle(name, template, position, owner)).id();
    graph.register_unit(entity);
    debug!("Spawned {} {:?} for player {} at {:?}", name, entity, owner, position);
    Some(entity)
}

/// Spawn a unit directly into `world`, for setup code and tests running
/// outside the schedule.
pub fn spawn_unit_in_world(world: &mut World, name: &str, position: FixedVec2, owner: u8) -> Option<Entity> {
    let max_units = world.resource::<SimConfig>().max_units;
    let template = {
        let graph = world.resource::<OrderGraph>();
        let templates = world.resource::<UnitTemplates>();
        admit(graph, templates, max_units, name)?.clone()
    };
    let entity = world.spawn(unit_bundle(name, &template, position, owner)).id();
    world.resource_mut::<OrderGraph>().register_unit(entity);
    debug!("Spawned {} {:?} for player {} at {:?}", name, entity, owner, position);
    Some(entity)
}
