use bevy::prelude::*;

use peregrine_orders::game::fixed_math::{FixedNum, FixedVec2};
use peregrine_orders::game::orders::{summarize_unit, OrderGraph, OrderTarget, OrderType};
use peregrine_orders::game::simulation::{reclaimable_bundle, SimConfig, SimTick};
use peregrine_orders::game::unit::{spawn_unit_in_world, Selected, Unit};
use peregrine_orders::game::GamePlugin;

use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use std::fs;
use std::path::PathBuf;

const DEFAULT_TICKS: u64 = 600;

fn setup_file_logging() -> String {
    // Create logs directory if it doesn't exist
    let log_dir = PathBuf::from("logs");
    if !log_dir.exists() {
        fs::create_dir_all(&log_dir).expect("Failed to create logs directory");
    }

    // Clean up old log files, keeping only the last 25
    cleanup_old_logs(&log_dir, 25);

    let now = chrono::Local::now();
    let log_filename = format!("peregrine_orders_{}.log", now.format("%Y%m%d_%H%M%S"));
    let log_path_str = log_dir.join(&log_filename).to_string_lossy().to_string();

    let file_appender = RollingFileAppender::new(Rotation::NEVER, &log_dir, &log_filename);

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false);

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("bevy_ecs=info,peregrine_orders=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    log_path_str
}

fn cleanup_old_logs(log_dir: &PathBuf, keep_count: usize) {
    if let Ok(entries) = fs::read_dir(log_dir) {
        let mut log_files: Vec<_> = entries
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(|s| s.starts_with("peregrine_orders") && s.ends_with(".log"))
                    .unwrap_or(false)
            })
            .collect();

        // Oldest first
        log_files.sort_by_key(|e| e.metadata().ok().and_then(|m| m.modified().ok()));

        if log_files.len() > keep_count {
            for file in log_files.iter().take(log_files.len() - keep_count) {
                let _ = fs::remove_file(file.path());
            }
        }
    }
}

fn scatter(rng: &mut StdRng, cx: f32, cz: f32) -> FixedVec2 {
    FixedVec2::from_world(cx + rng.random_range(-8.0..8.0), 0.0, cz + rng.random_range(-8.0..8.0))
}

fn issue(graph: &mut OrderGraph, order_type: OrderType, target: OrderTarget, units: &[Entity], additive: bool) {
    if let Err(err) = graph.issue_order(order_type, target, units, additive) {
        error!("Demo order rejected: {}", err);
    }
}

/// Two players, a field of deposits, and a few queued orders on each side.
fn setup_skirmish(world: &mut World, rng: &mut StdRng) {
    let deposits: Vec<Entity> = (0..12)
        .map(|_| {
            let position = scatter(rng, 0.0, 0.0);
            let amount = FixedNum::from_num(rng.random_range(5..40));
            world.spawn(reclaimable_bundle(position, amount)).id()
        })
        .collect();

    let mut engineers = Vec::new();
    let mut tanks = Vec::new();
    for _ in 0..6 {
        let position = scatter(rng, -30.0, 0.0);
        engineers.extend(spawn_unit_in_world(world, "engineer", position, 0));
        let position = scatter(rng, 30.0, 0.0);
        tanks.extend(spawn_unit_in_world(world, "tank", position, 1));
    }
    let factory = spawn_unit_in_world(world, "factory", FixedVec2::from_f32(30.0, 20.0), 1);

    for &engineer in &engineers {
        world.entity_mut(engineer).insert(Selected);
    }

    let mut graph = world.resource_mut::<OrderGraph>();

    // Engineers sweep the deposits, then regroup
    for (i, &deposit) in deposits.iter().enumerate() {
        issue(&mut graph, OrderType::Reclaim, OrderTarget::Entity(deposit), &engineers, i > 0);
    }
    issue(&mut graph, OrderType::Move, OrderTarget::Position(FixedVec2::from_f32(-30.0, 0.0)), &engineers, true);

    // Tanks hunt the first engineer, then hold the middle
    if let Some(&first) = engineers.first() {
        issue(&mut graph, OrderType::Attack, OrderTarget::Entity(first), &tanks, false);
    }
    issue(&mut graph, OrderType::Move, OrderTarget::Position(FixedVec2::ZERO), &tanks, true);

    if let Some(factory) = factory {
        issue(&mut graph, OrderType::BuildTank, OrderTarget::Position(FixedVec2::from_f32(30.0, 25.0)), &[factory], false);
        issue(&mut graph, OrderType::BuildEngineer, OrderTarget::Position(FixedVec2::from_f32(25.0, 25.0)), &[factory], true);
    }
}

fn main() {
    let log_file = setup_file_logging();

    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║  Peregrine Orders - headless run                         ║");
    println!("╠══════════════════════════════════════════════════════════╣");
    println!("║  Log file: {:<45} ║", log_file);
    println!("╚══════════════════════════════════════════════════════════╝");

    let ticks = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse::<u64>().ok())
        .unwrap_or(DEFAULT_TICKS);

    let mut app = App::new();
    app.add_plugins(MinimalPlugins).add_plugins(GamePlugin);

    // Runs Startup: config, templates
    app.update();

    let mut rng = StdRng::seed_from_u64(7);
    setup_skirmish(app.world_mut(), &mut rng);

    for _ in 0..ticks {
        app.world_mut().run_schedule(FixedUpdate);
    }

    let world = app.world_mut();
    let tick = world.resource::<SimTick>().0;
    let tick_rate = world.resource::<SimConfig>().tick_rate;

    let mut units = world.query::<(Entity, &Unit, Has<Selected>)>();
    let mut rows: Vec<(Entity, String, u8, bool)> = units
        .iter(world)
        .map(|(entity, unit, selected)| (entity, unit.template.clone(), unit.owner, selected))
        .collect();
    rows.sort_by_key(|row| row.0);

    let graph = world.resource::<OrderGraph>();
    info!(
        "Ran {} ticks ({:.1}s simulated): {} units, {} orders, {} links",
        tick,
        tick as f64 / tick_rate,
        rows.len(),
        graph.order_count(),
        graph.link_count()
    );
    if let Err(err) = graph.validate() {
        error!("Order graph inconsistent after run: {}", err);
    }

    for (entity, template, owner, selected) in rows {
        let summary = summarize_unit(graph, entity, selected);
        println!(
            "{:?} {:<9} p{} active={:?} pending={} selected={}",
            entity, template, owner, summary.active_type, summary.pending_count, summary.selected
        );
    }
}
