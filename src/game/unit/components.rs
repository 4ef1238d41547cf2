use bevy::prelude::*;

use crate::game::config::UnitTemplate;
use crate::game::fixed_math::FixedNum;

/// Marks an entity as a controllable unit
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    /// Template the unit was spawned from
    pub template: String,
    pub owner: u8,
}

/// Fixed-point per-unit tuning, copied from the template at spawn.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnitStats {
    /// Distance travelled per second
    pub speed: FixedNum,
    pub stopping_distance: FixedNum,
    /// Resource drained per second while in range
    pub reclaim_power: FixedNum,
    pub reclaim_range: FixedNum,
    /// Health removed per second while in range
    pub attack_damage: FixedNum,
    pub attack_range: FixedNum,
    /// Build progress per second
    pub build_rate: FixedNum,
    pub build_range: FixedNum,
}

impl UnitStats {
    /// Templates without their own stopping distance use `arrival_threshold`.
    pub fn from_template(template: &UnitTemplate, arrival_threshold: FixedNum) -> Self {
        Self {
            speed: FixedNum::from_num(template.speed),
            stopping_distance: template
                .stopping_distance
                .map(FixedNum::from_num)
                .unwrap_or(arrival_threshold),
            reclaim_power: FixedNum::from_num(template.reclaim_power),
            reclaim_range: FixedNum::from_num(template.reclaim_range),
            attack_damage: FixedNum::from_num(template.attack_damage),
            attack_range: FixedNum::from_num(template.attack_range),
            build_rate: FixedNum::from_num(template.build_rate),
            build_range: FixedNum::from_num(template.build_range),
        }
    }
}

/// Marks a unit as currently selected by the player
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Selected;
