use bevy::prelude::*;
use std::collections::BTreeMap;

use crate::game::config::InitialConfig;
use crate::game::fixed_math::FixedNum;
use crate::game::orders::OrderTypeSet;

use super::components::UnitStats;

/// Fixed-point form of one unit template.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateStats {
    pub capabilities: OrderTypeSet,
    pub stats: UnitStats,
    pub max_health: FixedNum,
    /// Work needed to build this template, in seconds at build rate 1.0
    pub build_time: FixedNum,
}

/// Unit templates by name, converted once from the initial config.
#[derive(Resource, Debug, Clone, Default)]
pub struct UnitTemplates {
    templates: BTreeMap<String, TemplateStats>,
}

impl UnitTemplates {
    pub fn from_initial(initial: &InitialConfig) -> Self {
        let arrival_threshold = FixedNum::from_num(initial.arrival_threshold);
        let mut templates = BTreeMap::new();
        for template in &initial.unit_templates {
            let stats = TemplateStats {
                capabilities: template.capabilities.iter().copied().collect(),
                stats: UnitStats::from_template(template, arrival_threshold),
                max_health: FixedNum::from_num(template.max_health),
                build_time: FixedNum::from_num(template.build_time),
            };
            if templates.insert(template.name.clone(), stats).is_some() {
                warn!("Duplicate unit template '{}', keeping the last definition", template.name);
            }
        }
        Self { templates }
    }

    pub fn get(&self, name: &str) -> Option<&TemplateStats> {
        self.templates.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
