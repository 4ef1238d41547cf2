use bevy::prelude::*;
use std::collections::BTreeSet;

use super::types::{LinkId, OrderId};

/// Edge of the order graph: the listed units start `to` once they finish `from`.
///
/// Exactly one link exists per `(from, to)` pair; units queuing the same
/// transition share it.
#[derive(Debug, Clone)]
pub struct Link {
    pub id: LinkId,
    pub from: OrderId,
    pub to: OrderId,
    units: BTreeSet<Entity>,
}

impl Link {
    pub(crate) fn new(id: LinkId, from: OrderId, to: OrderId) -> Self {
        Self { id, from, to, units: BTreeSet::new() }
    }

    pub fn units(&self) -> impl Iterator<Item = Entity> + '_ {
        self.units.iter().copied()
    }

    pub fn contains(&self, unit: Entity) -> bool {
        self.units.contains(&unit)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub(crate) fn insert(&mut self, unit: Entity) -> bool {
        self.units.insert(unit)
    }

    pub(crate) fn remove(&mut self, unit: Entity) -> bool {
        self.units.remove(&unit)
    }
}
