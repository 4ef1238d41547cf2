//! Systems that feed the order graph from messages and publish its events.

use bevy::prelude::*;

use crate::game::capability::CapabilitySet;
use crate::game::simulation::systems::process_spawn_commands;
use crate::game::simulation::{IssueOrderCommand, OrderLifecycle, SimEntity, SimPosition, SimSet};
use crate::game::unit::Unit;

use super::graph::OrderGraph;
use super::types::OrderTarget;

pub struct OrdersPlugin;

impl Plugin for OrdersPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<OrderGraph>();
        app.add_systems(FixedUpdate, (
            process_order_commands.in_set(SimSet::Input).after(process_spawn_commands),
            track_order_targets.in_set(SimSet::Targets),
            publish_order_events.in_set(SimSet::Publish),
        ));
    }
}

/// Turn order requests into graph orders.
///
/// Units the issuing player does not own, or that cannot execute the order
/// type, are left out. If nobody is left the request is dropped. Requests
/// aimed at an entity that is no longer alive are dropped as well, since no
/// destruction notice would ever end them.
pub fn process_order_commands(
    mut graph: ResMut<OrderGraph>,
    mut order_events: MessageReader<IssueOrderCommand>,
    units: Query<(&Unit, &CapabilitySet)>,
    targets: Query<&SimPosition, With<SimEntity>>,
) {
    let mut requests: Vec<&IssueOrderCommand> = order_events.read().collect();
    requests.sort_by_key(|e| e.player_id);

    for request in requests {
        let target_position = match request.target {
            OrderTarget::Entity(entity) => match targets.get(entity) {
                Ok(position) => Some((entity, position.0)),
                Err(_) => {
                    debug!(
                        "Player {} {:?}: target {} is gone, request dropped",
                        request.player_id, request.order_type, entity
                    );
                    continue;
                }
            },
            OrderTarget::Position(_) => None,
        };

        let capable: Vec<Entity> = request
            .units
            .iter()
            .copied()
            .filter(|&entity| match units.get(entity) {
                Ok((unit, caps)) => {
                    unit.owner == request.player_id
                        && caps.can_execute(request.order_type)
                        && graph.is_registered(entity)
                }
                Err(_) => false,
            })
            .collect();

        if capable.len() < request.units.len() {
            debug!(
                "Player {} {:?}: {} of {} unit(s) excluded",
                request.player_id,
                request.order_type,
                request.units.len() - capable.len(),
                request.units.len()
            );
        }
        if capable.is_empty() {
            continue;
        }

        match graph.issue_order(request.order_type, request.target, &capable, request.additive) {
            Ok(_) => {
                if let Some((entity, position)) = target_position {
                    graph.track_target(entity, position);
                }
            }
            Err(err) => {
                error!("Rejected {:?} order from player {}: {}", request.order_type, request.player_id, err);
            }
        }
    }
}

/// Copy the positions of targeted entities onto the orders following them.
/// Targets without a position keep their last known one.
pub fn track_order_targets(mut graph: ResMut<OrderGraph>, positions: Query<&SimPosition>) {
    for target in graph.watched_targets() {
        if let Ok(position) = positions.get(target) {
            graph.track_target(target, position.0);
        }
    }
}

pub fn publish_order_events(mut graph: ResMut<OrderGraph>, mut lifecycle: MessageWriter<OrderLifecycle>) {
    for event in graph.drain_events() {
        lifecycle.write(OrderLifecycle(event));
    }
}
