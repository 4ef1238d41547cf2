use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::game::orders::OrderType;

/// Static configuration loaded once at startup. These values define fundamental
/// simulation parameters that must not change during a match; changing them
/// mid-game would break determinism between peers.
#[derive(Resource, Deserialize, Serialize, Clone, Debug)]
pub struct InitialConfig {
    pub tick_rate: f64,
    /// Distance under which a Move order counts as reached when a template
    /// does not set its own stopping distance.
    pub arrival_threshold: f32,
    /// Distance a unit keeps from an entity it follows.
    pub follow_distance: f32,
    pub max_units: usize,
    pub unit_templates: Vec<UnitTemplate>,
}

/// Blueprint a unit is spawned from.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct UnitTemplate {
    pub name: String,
    pub capabilities: Vec<OrderType>,
    pub speed: f32,
    #[serde(default)]
    pub stopping_distance: Option<f32>,
    pub max_health: f32,
    #[serde(default)]
    pub reclaim_power: f32,
    #[serde(default)]
    pub reclaim_range: f32,
    #[serde(default)]
    pub attack_damage: f32,
    #[serde(default)]
    pub attack_range: f32,
    #[serde(default)]
    pub build_rate: f32,
    #[serde(default)]
    pub build_range: f32,
    /// Seconds of work at build rate 1.0 needed to produce this template.
    pub build_time: f32,
}

pub struct GameConfigPlugin;

impl Plugin for GameConfigPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, load_initial_config);
    }
}

pub const INITIAL_CONFIG_PATH: &str = "assets/initial_config.ron";

/// Load static initial configuration synchronously at startup.
/// This must complete before any system that depends on these values.
pub fn load_initial_config(mut commands: Commands) {
    commands.insert_resource(read_initial_config(INITIAL_CONFIG_PATH));
}

/// Read and parse a config file, falling back to defaults so the simulation always starts.
pub fn read_initial_config(path: &str) -> InitialConfig {
    match std::fs::read_to_string(path) {
        Ok(contents) => match ron::from_str::<InitialConfig>(&contents) {
            Ok(config) => match config.validate() {
                Ok(()) => {
                    info!("Loaded initial config from {} ({} unit templates)", path, config.unit_templates.len());
                    config
                }
                Err(e) => {
                    error!("Invalid initial config in {}: {}", path, e);
                    error!("Using default InitialConfig");
                    InitialConfig::default()
                }
            },
            Err(e) => {
                error!("Failed to parse initial config: {}", e);
                error!("Using default InitialConfig");
                InitialConfig::default()
            }
        },
        Err(e) => {
            error!("Failed to read {}: {}", path, e);
            error!("Using default InitialConfig");
            InitialConfig::default()
        }
    }
}

/// Largest magnitude accepted for any numeric config value. Anything beyond
/// this would overflow the fixed-point conversion.
const MAX_CONFIG_VALUE: f64 = 1.0e9;

fn check_value(field: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() || value.abs() > MAX_CONFIG_VALUE {
        return Err(format!("{} = {} is out of range", field, value));
    }
    Ok(())
}

impl InitialConfig {
    /// Reject values the fixed-point simulation cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        check_value("tick_rate", self.tick_rate)?;
        if self.tick_rate <= 0.0 {
            return Err(format!("tick_rate = {} must be positive", self.tick_rate));
        }
        check_value("arrival_threshold", self.arrival_threshold as f64)?;
        check_value("follow_distance", self.follow_distance as f64)?;

        for template in &self.unit_templates {
            let fields = [
                ("speed", template.speed),
                ("stopping_distance", template.stopping_distance.unwrap_or(0.0)),
                ("max_health", template.max_health),
                ("reclaim_power", template.reclaim_power),
                ("reclaim_range", template.reclaim_range),
                ("attack_damage", template.attack_damage),
                ("attack_range", template.attack_range),
                ("build_rate", template.build_rate),
                ("build_range", template.build_range),
                ("build_time", template.build_time),
            ];
            for (field, value) in fields {
                check_value(&format!("{}.{}", template.name, field), value as f64)?;
            }
        }
        Ok(())
    }
}

impl Default for InitialConfig {
    fn default() -> Self {
        Self {
            tick_rate: 20.0,
            arrival_threshold: 0.5,
            follow_distance: 2.0,
            max_units: 10_000,
            unit_templates: vec![
                UnitTemplate {
                    name: "engineer".to_string(),
                    capabilities: vec![
                        OrderType::Move,
                        OrderType::Reclaim,
                        OrderType::Assist,
                        OrderType::BuildFactory,
                    ],
                    speed: 4.0,
                    stopping_distance: Some(0.5),
                    max_health: 50.0,
                    reclaim_power: 5.0,
                    reclaim_range: 2.0,
                    attack_damage: 0.0,
                    attack_range: 0.0,
                    build_rate: 1.0,
                    build_range: 3.0,
                    build_time: 4.0,
                },
                UnitTemplate {
                    name: "tank".to_string(),
                    capabilities: vec![OrderType::Move, OrderType::Attack, OrderType::Assist],
                    speed: 6.0,
                    stopping_distance: Some(1.0),
                    max_health: 120.0,
                    reclaim_power: 0.0,
                    reclaim_range: 0.0,
                    attack_damage: 20.0,
                    attack_range: 6.0,
                    build_rate: 0.0,
                    build_range: 0.0,
                    build_time: 6.0,
                },
                UnitTemplate {
                    name: "factory".to_string(),
                    capabilities: vec![OrderType::BuildTank, OrderType::BuildEngineer],
                    speed: 0.0,
                    stopping_distance: None,
                    max_health: 800.0,
                    reclaim_power: 0.0,
                    reclaim_range: 0.0,
                    attack_damage: 0.0,
                    attack_range: 0.0,
                    build_rate: 2.0,
                    build_range: 12.0,
                    build_time: 20.0,
                },
            ],
        }
    }
}
