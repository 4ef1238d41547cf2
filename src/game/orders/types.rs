//! Order tags, tag sets, targets, payloads and the handle types of the graph tables.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use crate::game::fixed_math::FixedVec2;

// ============================================================================
// Order Types
// ============================================================================

/// Kind of command an order carries. A unit's capability is a subset of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OrderType {
    Move,
    Attack,
    Reclaim,
    Assist,
    BuildTank,
    BuildEngineer,
    BuildFactory,
}

impl OrderType {
    pub const ALL: [OrderType; 7] = [
        OrderType::Move,
        OrderType::Attack,
        OrderType::Reclaim,
        OrderType::Assist,
        OrderType::BuildTank,
        OrderType::BuildEngineer,
        OrderType::BuildFactory,
    ];

    pub fn is_build(self) -> bool {
        matches!(self, OrderType::BuildTank | OrderType::BuildEngineer | OrderType::BuildFactory)
    }

    /// Unit template produced by a build order.
    pub fn build_template(self) -> Option<&'static str> {
        match self {
            OrderType::BuildTank => Some("tank"),
            OrderType::BuildEngineer => Some("engineer"),
            OrderType::BuildFactory => Some("factory"),
            _ => None,
        }
    }
}

/// Set of order tags. Membership based; order of insertion is irrelevant and
/// iteration always follows the declaration order of [`OrderType`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTypeSet {
    tags: SmallVec<[OrderType; 4]>,
}

impl OrderTypeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the tag was already present.
    pub fn insert(&mut self, tag: OrderType) -> bool {
        match self.tags.binary_search(&tag) {
            Ok(_) => false,
            Err(pos) => {
                self.tags.insert(pos, tag);
                true
            }
        }
    }

    pub fn remove(&mut self, tag: OrderType) -> bool {
        match self.tags.binary_search(&tag) {
            Ok(pos) => {
                self.tags.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    pub fn contains(&self, tag: OrderType) -> bool {
        self.tags.binary_search(&tag).is_ok()
    }

    pub fn intersection(&self, other: &OrderTypeSet) -> OrderTypeSet {
        self.iter().filter(|tag| other.contains(*tag)).collect()
    }

    pub fn union(&self, other: &OrderTypeSet) -> OrderTypeSet {
        self.iter().chain(other.iter()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = OrderType> + '_ {
        self.tags.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl FromIterator<OrderType> for OrderTypeSet {
    fn from_iter<I: IntoIterator<Item = OrderType>>(iter: I) -> Self {
        let mut set = OrderTypeSet::new();
        for tag in iter {
            set.insert(tag);
        }
        set
    }
}

impl<const N: usize> From<[OrderType; N]> for OrderTypeSet {
    fn from(tags: [OrderType; N]) -> Self {
        tags.into_iter().collect()
    }
}

// ============================================================================
// Targets & Payloads
// ============================================================================

/// What an order is aimed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderTarget {
    /// Fixed point on the ground plane.
    Position(FixedVec2),
    /// Live entity. The order follows it and is cancelled when it is destroyed.
    Entity(Entity),
}

impl OrderTarget {
    pub fn entity(&self) -> Option<Entity> {
        match self {
            OrderTarget::Entity(entity) => Some(*entity),
            OrderTarget::Position(_) => None,
        }
    }
}

/// Per-type data attached to an order at creation.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum OrderPayload {
    #[default]
    None,
    Build { template: String },
}

impl OrderPayload {
    pub fn for_type(order_type: OrderType) -> Self {
        match order_type.build_template() {
            Some(template) => OrderPayload::Build { template: template.to_string() },
            None => OrderPayload::None,
        }
    }

    pub fn build_template(&self) -> Option<&str> {
        match self {
            OrderPayload::Build { template } => Some(template),
            OrderPayload::None => None,
        }
    }
}

// ============================================================================
// Handles
// ============================================================================

/// Handle into the graph's order table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "order#{}", self.0)
    }
}

/// Handle into the graph's link table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LinkId(pub u64);

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_set_is_membership_based() {
        let mut set = OrderTypeSet::from([OrderType::Reclaim, OrderType::Move, OrderType::Reclaim]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![OrderType::Move, OrderType::Reclaim]);

        assert!(!set.insert(OrderType::Move));
        assert!(set.remove(OrderType::Move));
        assert!(!set.contains(OrderType::Move));
        assert!(!set.remove(OrderType::Move));
    }

    #[test]
    fn test_intersection_and_union() {
        let engineer = OrderTypeSet::from([OrderType::Move, OrderType::Reclaim, OrderType::Assist]);
        let tank = OrderTypeSet::from([OrderType::Move, OrderType::Attack, OrderType::Assist]);

        assert_eq!(engineer.intersection(&tank), OrderTypeSet::from([OrderType::Move, OrderType::Assist]));
        assert_eq!(engineer.union(&tank).len(), 4);
        assert!(OrderTypeSet::new().intersection(&tank).is_empty());
    }

    #[test]
    fn test_build_orders_carry_template() {
        assert_eq!(OrderPayload::for_type(OrderType::BuildTank).build_template(), Some("tank"));
        assert_eq!(OrderPayload::for_type(OrderType::Move), OrderPayload::None);
        let builds: Vec<OrderType> = OrderType::ALL.into_iter().filter(|t| t.is_build()).collect();
        assert_eq!(builds.len(), 3);
    }
}
