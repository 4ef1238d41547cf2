use bevy::prelude::*;
use peregrine_orders::game::fixed_math::{FixedNum, FixedVec2};
use peregrine_orders::game::orders::{order_sequence, OrderGraph, OrderTarget, OrderType};
use peregrine_orders::game::simulation::{reclaimable_bundle, SimPosition};
use peregrine_orders::game::unit::{spawn_unit_in_world, Unit};
use peregrine_orders::game::GamePlugin;

/// Build a small skirmish from a seed and run it for `ticks` fixed steps.
fn run_skirmish(seed: u64, ticks: usize) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(GamePlugin);
    app.update();

    let mut rng = fastrand::Rng::with_seed(seed);
    let world = app.world_mut();
    let mut coord = |spread: f32| (rng.f32() - 0.5) * spread;

    let deposits: Vec<Entity> = (0..6)
        .map(|_| {
            let position = FixedVec2::from_f32(coord(30.0), coord(30.0));
            world.spawn(reclaimable_bundle(position, FixedNum::from_num(3))).id()
        })
        .collect();
    let engineers: Vec<Entity> = (0..8)
        .filter_map(|_| spawn_unit_in_world(world, "engineer", FixedVec2::from_f32(coord(20.0) - 20.0, coord(20.0)), 0))
        .collect();
    let tanks: Vec<Entity> = (0..4)
        .filter_map(|_| spawn_unit_in_world(world, "tank", FixedVec2::from_f32(coord(20.0) + 20.0, coord(20.0)), 1))
        .collect();

    let mut graph = world.resource_mut::<OrderGraph>();
    for (i, deposit) in deposits.iter().enumerate() {
        let group = if i % 2 == 0 { &engineers[..4] } else { &engineers[4..] };
        graph.issue_order(OrderType::Reclaim, OrderTarget::Entity(*deposit), group, i > 1).unwrap();
    }
    graph.issue_order(OrderType::Attack, OrderTarget::Entity(engineers[0]), &tanks, false).unwrap();
    graph.issue_order(OrderType::Move, OrderTarget::Position(FixedVec2::ZERO), &tanks, true).unwrap();

    for _ in 0..ticks {
        app.world_mut().run_schedule(FixedUpdate);
    }
    app
}

fn snapshot(app: &mut App) -> Vec<(Entity, FixedVec2, Vec<OrderType>)> {
    let world = app.world_mut();
    let mut query = world.query_filtered::<(Entity, &SimPosition), With<Unit>>();
    let mut units: Vec<(Entity, FixedVec2)> = query.iter(world).map(|(e, p)| (e, p.0)).collect();
    units.sort_by_key(|(e, _)| *e);

    let graph = world.resource::<OrderGraph>();
    units
        .into_iter()
        .map(|(entity, position)| (entity, position, order_sequence(graph, entity)))
        .collect()
}

#[test]
fn test_same_commands_same_outcome() {
    let mut app1 = run_skirmish(42, 200);
    let mut app2 = run_skirmish(42, 200);

    let state1 = snapshot(&mut app1);
    let state2 = snapshot(&mut app2);
    assert!(!state1.is_empty());
    assert_eq!(state1, state2, "identical command streams must give bit-identical states");

    let graph1 = app1.world().resource::<OrderGraph>();
    let graph2 = app2.world().resource::<OrderGraph>();
    assert_eq!(graph1.order_count(), graph2.order_count());
    assert_eq!(graph1.link_count(), graph2.link_count());
    assert!(graph1.validate().is_ok());
}

#[test]
fn test_graph_stays_consistent_every_tick() {
    let mut app = run_skirmish(7, 0);
    for _ in 0..300 {
        app.world_mut().run_schedule(FixedUpdate);
        if let Err(err) = app.world().resource::<OrderGraph>().validate() {
            panic!("order graph invalid: {}", err);
        }
    }
}
