use super::*;
use crate::game::orders::{Order, OrderId, OrderTarget, OrderType, OrderTypeSet};

fn v(x: f32, y: f32) -> FixedVec2 {
    FixedVec2::from_f32(x, y)
}

fn n(value: f32) -> FixedNum {
    FixedNum::from_num(value)
}

fn engineer_stats() -> UnitStats {
    UnitStats {
        speed: n(4.0),
        stopping_distance: n(0.5),
        reclaim_power: n(5.0),
        reclaim_range: n(2.0),
        build_rate: n(1.0),
        build_range: n(3.0),
        ..Default::default()
    }
}

fn tank_stats() -> UnitStats {
    UnitStats {
        speed: n(6.0),
        stopping_distance: n(1.0),
        attack_damage: n(20.0),
        attack_range: n(6.0),
        ..Default::default()
    }
}

fn context(position: FixedVec2, stats: UnitStats) -> ModuleContext {
    ModuleContext::new(position, n(0.5), stats, n(2.0))
}

fn entity() -> Entity {
    World::new().spawn_empty().id()
}

fn order(id: u64, order_type: OrderType, target: OrderTarget) -> Order {
    Order::new(OrderId(id), order_type, target)
}

fn engineer() -> CapabilitySet {
    CapabilitySet::from_capabilities(&OrderTypeSet::from([
        OrderType::Move,
        OrderType::Reclaim,
        OrderType::Assist,
        OrderType::BuildFactory,
    ]))
}

fn tank() -> CapabilitySet {
    CapabilitySet::from_capabilities(&OrderTypeSet::from([OrderType::Move, OrderType::Attack, OrderType::Assist]))
}

#[test]
fn test_dispatch_table_from_capabilities() {
    let caps = engineer();
    assert_eq!(caps.module_names(), vec!["move", "reclaim", "build"]);
    assert!(caps.can_execute(OrderType::Assist));
    assert!(caps.can_execute(OrderType::BuildFactory));
    assert!(!caps.can_execute(OrderType::Attack));
    assert!(!caps.can_execute(OrderType::BuildTank));
    assert_eq!(caps.capabilities().len(), 4);
}

#[test]
fn test_move_completes_within_stopping_distance() {
    let mut caps = engineer();
    let move_order = order(1, OrderType::Move, OrderTarget::Position(v(3.0, 0.0)));
    caps.sync(Some(&move_order));

    let mut ctx = context(v(0.0, 0.0), engineer_stats());
    ctx.target_position = move_order.position();

    // 2 units per step, stop 0.5 short of the goal
    assert_eq!(caps.update(&mut ctx), ModuleStatus::Running);
    assert_eq!(ctx.position, v(2.0, 0.0));
    assert_eq!(caps.update(&mut ctx), ModuleStatus::Completed);
    assert_eq!(ctx.position, v(2.5, 0.0));
}

#[test]
fn test_following_entity_never_completes() {
    let mut caps = engineer();
    let assist = order(1, OrderType::Assist, OrderTarget::Entity(entity()));
    caps.sync(Some(&assist));

    let mut ctx = context(v(0.0, 0.0), engineer_stats());
    ctx.target_position = v(3.0, 0.0);
    for _ in 0..10 {
        assert_eq!(caps.update(&mut ctx), ModuleStatus::Running);
    }
    assert!(ctx.distance_to_target() <= n(2.0));
}

#[test]
fn test_reclaim_on_position_completes_immediately() {
    let mut caps = engineer();
    let reclaim = order(1, OrderType::Reclaim, OrderTarget::Position(v(5.0, 5.0)));
    caps.sync(Some(&reclaim));

    let mut ctx = context(v(0.0, 0.0), engineer_stats());
    assert_eq!(caps.update(&mut ctx), ModuleStatus::Completed);
    assert!(ctx.effects.is_empty());
    assert_eq!(ctx.position, v(0.0, 0.0));
}

#[test]
fn test_reclaim_approaches_then_drains() {
    let deposit = entity();
    let mut caps = engineer();
    caps.sync(Some(&order(1, OrderType::Reclaim, OrderTarget::Entity(deposit))));

    let mut ctx = context(v(0.0, 0.0), engineer_stats());
    ctx.target_position = v(6.0, 0.0);
    ctx.target_remaining = Some(n(3.0));

    // Out of range: move 2 units, nothing drained yet
    assert_eq!(caps.update(&mut ctx), ModuleStatus::Running);
    assert!(ctx.effects.is_empty());

    // Reaches the 2.0 ring and drains 5.0 * 0.5 = 2.5
    assert_eq!(caps.update(&mut ctx), ModuleStatus::Running);
    assert_eq!(ctx.effects, vec![ModuleEffect::Drain { target: deposit, amount: n(2.5) }]);

    // Only 0.5 left, drained in full
    ctx.effects.clear();
    ctx.target_remaining = Some(n(0.5));
    assert_eq!(caps.update(&mut ctx), ModuleStatus::Completed);
    assert_eq!(ctx.effects, vec![ModuleEffect::Drain { target: deposit, amount: n(0.5) }]);
}

#[test]
fn test_attack_engages_and_kills() {
    let target = entity();
    let mut module = AttackModule::new();
    module.set_executed_order(&ExecutedOrder::from(&order(1, OrderType::Attack, OrderTarget::Entity(target))));
    assert_eq!(module.phase(), Some("approach"));

    let mut ctx = context(v(0.0, 0.0), tank_stats());
    ctx.target_position = v(4.0, 0.0);
    ctx.target_remaining = Some(n(15.0));

    // Already in range: approach completes without moving
    assert_eq!(module.update(&mut ctx), ModuleStatus::Running);
    assert_eq!(module.phase(), Some("engage"));
    assert_eq!(ctx.position, v(0.0, 0.0));

    // 20 dps * 0.5s = 10 per step
    assert_eq!(module.update(&mut ctx), ModuleStatus::Running);
    assert_eq!(ctx.target_remaining, Some(n(5.0)));
    assert_eq!(module.update(&mut ctx), ModuleStatus::Completed);
    assert_eq!(ctx.effects.len(), 2);
    assert!(module.executing().is_none());
}

#[test]
fn test_attack_reapproaches_when_target_leaves_range() {
    let target = entity();
    let mut module = AttackModule::new();
    module.set_executed_order(&ExecutedOrder::from(&order(1, OrderType::Attack, OrderTarget::Entity(target))));

    let mut ctx = context(v(0.0, 0.0), tank_stats());
    ctx.target_position = v(5.0, 0.0);
    ctx.target_remaining = Some(n(100.0));
    module.update(&mut ctx);
    assert_eq!(module.phase(), Some("engage"));

    ctx.target_position = v(20.0, 0.0);
    assert_eq!(module.update(&mut ctx), ModuleStatus::Running);
    assert_eq!(module.phase(), Some("approach"));
    assert!(ctx.effects.is_empty());

    // 14 units to close at 3 per step
    for _ in 0..5 {
        module.update(&mut ctx);
    }
    assert_eq!(module.phase(), Some("engage"));
    assert!(ctx.distance_to_target() <= n(6.0) + attack::RANGE_SLACK);
}

#[test]
fn test_attack_on_position_completes_immediately() {
    let mut caps = tank();
    caps.sync(Some(&order(1, OrderType::Attack, OrderTarget::Position(v(1.0, 1.0)))));
    let mut ctx = context(v(0.0, 0.0), tank_stats());
    assert_eq!(caps.update(&mut ctx), ModuleStatus::Completed);
}

#[test]
fn test_build_spawns_template_at_site() {
    let mut caps = engineer();
    caps.sync(Some(&order(1, OrderType::BuildFactory, OrderTarget::Position(v(2.0, 0.0)))));

    let mut ctx = context(v(0.0, 0.0), engineer_stats());
    ctx.target_position = v(2.0, 0.0);
    ctx.build_time = Some(n(1.0));

    // Approach (in range), then 0.5 progress per step
    assert_eq!(caps.update(&mut ctx), ModuleStatus::Running);
    assert_eq!(caps.update(&mut ctx), ModuleStatus::Running);
    assert!(ctx.effects.is_empty());
    assert_eq!(caps.update(&mut ctx), ModuleStatus::Completed);
    assert_eq!(
        ctx.effects,
        vec![ModuleEffect::Spawn { template: "factory".to_string(), position: v(2.0, 0.0) }]
    );
}

#[test]
fn test_build_with_unknown_template_gives_up() {
    let mut caps = engineer();
    caps.sync(Some(&order(1, OrderType::BuildFactory, OrderTarget::Position(v(2.0, 0.0)))));
    let mut ctx = context(v(0.0, 0.0), engineer_stats());
    assert_eq!(caps.update(&mut ctx), ModuleStatus::Completed);
    assert!(ctx.effects.is_empty());
}

#[test]
fn test_sync_switches_modules() {
    let deposit = entity();
    let mut caps = engineer();
    let move_order = order(1, OrderType::Move, OrderTarget::Position(v(50.0, 0.0)));
    let reclaim = order(2, OrderType::Reclaim, OrderTarget::Entity(deposit));

    caps.sync(Some(&move_order));
    assert_eq!(caps.active_order(), Some(OrderId(1)));

    caps.sync(Some(&reclaim));
    assert_eq!(caps.active_order(), Some(OrderId(2)));
    let mut ctx = context(v(0.0, 0.0), engineer_stats());
    ctx.target_position = v(1.0, 0.0);
    ctx.target_remaining = Some(n(100.0));
    caps.update(&mut ctx);
    assert!(matches!(ctx.effects.as_slice(), [ModuleEffect::Drain { .. }]));

    caps.sync(None);
    assert_eq!(caps.active_order(), None);
    assert_eq!(caps.update(&mut ctx), ModuleStatus::Idle);
}
