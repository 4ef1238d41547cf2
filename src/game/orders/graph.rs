//! The order graph.
//!
//! Orders are shared between units; a unit's queue is not stored on the unit
//! but as links between orders. A unit with the chain `A -> B -> C` holds `A`
//! as its active order and appears in the links `(A, B)` and `(B, C)`. Units
//! with the same transition share the link, so reconstructing any unit's
//! queue is a walk along the links that contain it.
//!
//! Garbage collection rule: an order with no assigned units and no incoming
//! link can never become active again and is destroyed immediately.

use bevy::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::game::fixed_math::FixedVec2;
use super::link::Link;
use super::notify::{DestructionChannel, DestructionObserver};
use super::order::Order;
use super::types::{LinkId, OrderId, OrderTarget, OrderType};


#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderGraphError {
    #[error("unit {0:?} is not registered with the order graph")]
    UnregisteredUnit(Entity),
    #[error("{0} does not exist")]
    UnknownOrder(OrderId),
    #[error("advance of unit {0:?} re-entered while a previous advance is unwinding")]
    ReentrantAdvance(Entity),
    #[error("order graph invariant violated: {0}")]
    InvariantViolation(String),
}

/// Lifecycle notifications, drained once per tick and published as messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEvent {
    Created { order: OrderId, order_type: OrderType },
    Destroyed { order: OrderId, order_type: OrderType },
}

/// Result of advancing a unit past its active order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Next(OrderId),
    Idle,
}

#[derive(Debug, Default, Clone)]
struct UnitChain {
    active: Option<OrderId>,
    /// Outgoing links keyed by their `from` order. One entry per order, so a
    /// unit's queue never branches.
    outgoing: BTreeMap<OrderId, LinkId>,
}

#[derive(Resource, Default)]
pub struct OrderGraph {
    orders: BTreeMap<OrderId, Order>,
    links: BTreeMap<LinkId, Link>,
    link_index: FxHashMap<(OrderId, OrderId), LinkId>,
    incoming: FxHashMap<OrderId, SmallVec<[LinkId; 2]>>,
    outgoing: FxHashMap<OrderId, SmallVec<[LinkId; 2]>>,
    units: BTreeMap<Entity, UnitChain>,
    watches: DestructionChannel<OrderId>,
    next_order: u64,
    next_link: u64,
    advancing: FxHashSet<Entity>,
    changed_units: BTreeSet<Entity>,
    events: Vec<OrderEvent>,
}

impl OrderGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Units
    // ========================================================================

    /// Returns false if the unit was already registered.
    pub fn register_unit(&mut self, unit: Entity) -> bool {
        if self.units.contains_key(&unit) {
            return false;
        }
        self.units.insert(unit, UnitChain::default());
        true
    }

    pub fn is_registered(&self, unit: Entity) -> bool {
        self.units.contains_key(&unit)
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Detach a destroyed unit from its active order and from every link of
    /// its chain. Returns false, doing nothing, for unknown units.
    pub fn remove_unit(&mut self, unit: Entity) -> bool {
        if !self.units.contains_key(&unit) {
            return false;
        }
        self.clear_chain(unit);
        self.units.remove(&unit);
        self.advancing.remove(&unit);
        self.changed_units.remove(&unit);
        debug!("Removed unit {:?} from order graph", unit);
        true
    }

    // ========================================================================
    // Issuing
    // ========================================================================

    /// Create one order shared by `units`.
    ///
    /// Non-additive orders replace each unit's whole queue. Additive orders are
    /// appended behind each unit's terminal order, or become active directly for
    /// idle units. Returns `Ok(None)` when `units` is empty. Every unit is
    /// validated before anything is mutated. An entity target reports
    /// `FixedVec2::ZERO` as its position until `track_target` records one.
    pub fn issue_order(
        &mut self,
        order_type: OrderType,
        target: OrderTarget,
        units: &[Entity],
        additive: bool,
    ) -> Result<Option<OrderId>, OrderGraphError> {
        let mut seen = FxHashSet::default();
        let units: SmallVec<[Entity; 16]> = units.iter().copied().filter(|u| seen.insert(*u)).collect();
        if units.is_empty() {
            return Ok(None);
        }
        if let Some(unknown) = units.iter().find(|u| !self.units.contains_key(u)) {
            return Err(OrderGraphError::UnregisteredUnit(*unknown));
        }

        let order = self.create_order(order_type, target);
        for &unit in &units {
            if additive {
                match self.terminal_order(unit) {
                    Some(terminal) => self.enqueue(unit, terminal, order),
                    None => self.activate(unit, order),
                }
            } else {
                self.clear_chain(unit);
                self.activate(unit, order);
            }
        }

        debug!(
            "Issued {} ({:?}) to {} unit(s), additive={}",
            order, order_type, units.len(), additive
        );
        Ok(Some(order))
    }

    /// Force-destroy an order: queued holders skip it, active holders advance.
    pub fn cancel_order(&mut self, order: OrderId) -> Result<(), OrderGraphError> {
        if !self.orders.contains_key(&order) {
            return Err(OrderGraphError::UnknownOrder(order));
        }
        self.force_destroy(order);
        Ok(())
    }

    // ========================================================================
    // Advancing
    // ========================================================================

    /// Move `unit` past its active order: onto the next order of its chain, or
    /// idle when the active order was terminal. Advancing an idle unit is a no-op.
    pub fn advance_unit(&mut self, unit: Entity) -> Result<Advance, OrderGraphError> {
        if !self.units.contains_key(&unit) {
            return Err(OrderGraphError::UnregisteredUnit(unit));
        }
        if !self.advancing.insert(unit) {
            return Err(OrderGraphError::ReentrantAdvance(unit));
        }
        let advance = self.advance_inner(unit);
        self.advancing.remove(&unit);
        Ok(advance)
    }

    fn advance_inner(&mut self, unit: Entity) -> Advance {
        let Some(state) = self.units.get(&unit) else { return Advance::Idle };
        let Some(current) = state.active else { return Advance::Idle };

        let next_link = state.outgoing.get(&current).copied();
        let next = next_link.and_then(|id| self.links.get(&id)).map(|link| link.to);

        // Take the next order before leaving the link, so it never looks unreachable.
        match next {
            Some(next) => self.activate(unit, next),
            None => {
                if let Some(state) = self.units.get_mut(&unit) {
                    state.active = None;
                }
                self.changed_units.insert(unit);
            }
        }
        if let Some(link) = next_link {
            self.detach_from_link(unit, link);
        }
        if let Some(order) = self.orders.get_mut(&current) {
            order.unassign_unit(unit);
        }
        self.collect_if_unreachable(current);

        match next {
            Some(next) => Advance::Next(next),
            None => Advance::Idle,
        }
    }

    // ========================================================================
    // Targets
    // ========================================================================

    /// Deliver the destruction of `entity` to every order targeting it.
    /// Returns how many orders were cancelled.
    pub fn notify_target_destroyed(&mut self, entity: Entity) -> usize {
        let listeners = self.watches.take(entity);
        let cancelled = listeners.len();
        if cancelled > 0 {
            self.on_destroyed(entity, listeners);
        }
        cancelled
    }

    /// Record the current position of a targeted entity on every order following it.
    pub fn track_target(&mut self, entity: Entity, position: FixedVec2) {
        for order in self.watches.listeners(entity) {
            if let Some(order) = self.orders.get_mut(order) {
                order.track(position);
            }
        }
    }

    /// Entities that at least one live order targets.
    pub fn watched_targets(&self) -> Vec<Entity> {
        let mut targets: Vec<Entity> = self.watches.watched().collect();
        targets.sort();
        targets
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn active_order(&self, unit: Entity) -> Option<OrderId> {
        self.units.get(&unit).and_then(|state| state.active)
    }

    pub fn order(&self, order: OrderId) -> Option<&Order> {
        self.orders.get(&order)
    }

    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    pub fn link(&self, link: LinkId) -> Option<&Link> {
        self.links.get(&link)
    }

    pub fn link_between(&self, from: OrderId, to: OrderId) -> Option<&Link> {
        self.link_index.get(&(from, to)).and_then(|id| self.links.get(id))
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Links that contain `unit`, in chain order.
    pub fn links_of(&self, unit: Entity) -> Result<Vec<&Link>, OrderGraphError> {
        let state = self.units.get(&unit).ok_or(OrderGraphError::UnregisteredUnit(unit))?;
        Ok(self
            .chain(unit)
            .iter()
            .filter_map(|order| state.outgoing.get(order))
            .filter_map(|id| self.links.get(id))
            .collect())
    }

    /// Active order followed by every queued order. Empty for idle or unknown units.
    pub fn chain(&self, unit: Entity) -> Vec<OrderId> {
        let Some(state) = self.units.get(&unit) else { return Vec::new() };
        let mut chain = Vec::with_capacity(state.outgoing.len() + 1);
        let mut current = state.active;
        while let Some(order) = current {
            chain.push(order);
            if chain.len() > state.outgoing.len() {
                break;
            }
            current = state
                .outgoing
                .get(&order)
                .and_then(|id| self.links.get(id))
                .map(|link| link.to);
        }
        chain
    }

    /// Number of orders queued behind the active one.
    pub fn pending_count(&self, unit: Entity) -> usize {
        self.chain(unit).len().saturating_sub(1)
    }

    pub fn terminal_order(&self, unit: Entity) -> Option<OrderId> {
        self.chain(unit).last().copied()
    }

    /// Units whose active order changed since the last call.
    pub fn take_changed_units(&mut self) -> Vec<Entity> {
        std::mem::take(&mut self.changed_units).into_iter().collect()
    }

    pub fn drain_events(&mut self) -> Vec<OrderEvent> {
        std::mem::take(&mut self.events)
    }

    /// Audit every structural invariant of the graph.
    pub fn validate(&self) -> Result<(), OrderGraphError> {
        let violation = |msg: String| Err(OrderGraphError::InvariantViolation(msg));

        for (id, order) in &self.orders {
            if order.assigned_count() == 0 && !self.has_incoming(*id) {
                return violation(format!("{} is unreachable but alive", id));
            }
            for unit in order.assigned_units() {
                if self.active_order(unit) != Some(*id) {
                    return violation(format!("{} lists {:?} whose active order differs", id, unit));
                }
            }
        }

        for (unit, state) in &self.units {
            let chain = self.chain(*unit);
            if let Some(active) = state.active {
                match self.orders.get(&active) {
                    Some(order) if order.is_assigned(*unit) => {}
                    _ => return violation(format!("{:?} holds {} without being assigned", unit, active)),
                }
            }
            if chain.len() != state.outgoing.len() + usize::from(state.active.is_some()) {
                return violation(format!("{:?} has links outside its chain", unit));
            }
            for (from, link_id) in &state.outgoing {
                match self.links.get(link_id) {
                    Some(link) if link.from == *from && link.contains(*unit) => {}
                    _ => return violation(format!("{:?} has a stale link {}", unit, link_id)),
                }
            }
        }

        if self.link_index.len() != self.links.len() {
            return violation("link index out of sync with link table".to_string());
        }
        for (id, link) in &self.links {
            if link.is_empty() {
                return violation(format!("{} is empty but alive", id));
            }
            if self.link_index.get(&(link.from, link.to)) != Some(id) {
                return violation(format!("{} duplicates transition {} -> {}", id, link.from, link.to));
            }
            if !self.orders.contains_key(&link.from) || !self.orders.contains_key(&link.to) {
                return violation(format!("{} connects a destroyed order", id));
            }
            if !self.incoming.get(&link.to).is_some_and(|ids| ids.contains(id)) {
                return violation(format!("{} missing from incoming index", id));
            }
            for unit in link.units() {
                let registered = self.units.get(&unit).and_then(|s| s.outgoing.get(&link.from));
                if registered != Some(id) {
                    return violation(format!("{} lists {:?} which does not follow it", id, unit));
                }
            }
        }
        Ok(())
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn create_order(&mut self, order_type: OrderType, target: OrderTarget) -> OrderId {
        let id = OrderId(self.next_order);
        self.next_order += 1;
        self.orders.insert(id, Order::new(id, order_type, target));
        if let OrderTarget::Entity(entity) = target {
            self.watches.subscribe(entity, id);
        }
        self.events.push(OrderEvent::Created { order: id, order_type });
        id
    }

    fn activate(&mut self, unit: Entity, order: OrderId) {
        if let Some(state) = self.units.get_mut(&unit) {
            state.active = Some(order);
        }
        if let Some(order) = self.orders.get_mut(&order) {
            order.assign_unit(unit);
        }
        self.changed_units.insert(unit);
    }

    /// Queue `to` behind `from` for `unit`, reusing the link for this transition if one exists.
    fn enqueue(&mut self, unit: Entity, from: OrderId, to: OrderId) {
        let link_id = match self.link_index.get(&(from, to)) {
            Some(id) => *id,
            None => {
                let id = LinkId(self.next_link);
                self.next_link += 1;
                self.links.insert(id, Link::new(id, from, to));
                self.link_index.insert((from, to), id);
                self.incoming.entry(to).or_default().push(id);
                self.outgoing.entry(from).or_default().push(id);
                id
            }
        };
        if let Some(link) = self.links.get_mut(&link_id) {
            link.insert(unit);
        }
        if let Some(state) = self.units.get_mut(&unit) {
            state.outgoing.insert(from, link_id);
        }
    }

    /// Remove `unit` from a link, destroying the link once empty.
    fn detach_from_link(&mut self, unit: Entity, link_id: LinkId) {
        let Some(link) = self.links.get_mut(&link_id) else { return };
        link.remove(unit);
        let (from, empty) = (link.from, link.is_empty());

        if let Some(state) = self.units.get_mut(&unit) {
            if state.outgoing.get(&from) == Some(&link_id) {
                state.outgoing.remove(&from);
            }
        }
        if empty {
            self.destroy_link(link_id);
        }
    }

    fn destroy_link(&mut self, link_id: LinkId) {
        let Some(link) = self.links.remove(&link_id) else { return };
        self.link_index.remove(&(link.from, link.to));
        remove_indexed(&mut self.incoming, link.to, link_id);
        remove_indexed(&mut self.outgoing, link.from, link_id);
        for unit in link.units() {
            if let Some(state) = self.units.get_mut(&unit) {
                if state.outgoing.get(&link.from) == Some(&link_id) {
                    state.outgoing.remove(&link.from);
                }
            }
        }
    }

    /// Drop the unit's active order and every link of its chain, then collect
    /// whatever orders became unreachable.
    fn clear_chain(&mut self, unit: Entity) {
        let chain = self.chain(unit);
        let Some(state) = self.units.get_mut(&unit) else { return };
        let active = state.active.take();
        let mut outgoing = std::mem::take(&mut state.outgoing);

        let mut links: Vec<LinkId> = chain.iter().filter_map(|order| outgoing.remove(order)).collect();
        if !outgoing.is_empty() {
            warn!("Unit {:?} had {} link(s) outside its chain", unit, outgoing.len());
            links.extend(outgoing.into_values());
        }

        if let Some(active) = active {
            if let Some(order) = self.orders.get_mut(&active) {
                order.unassign_unit(unit);
            }
            self.changed_units.insert(unit);
        }
        for link in links {
            self.detach_from_link(unit, link);
        }
        for order in chain {
            self.collect_if_unreachable(order);
        }
    }

    fn has_incoming(&self, order: OrderId) -> bool {
        self.incoming.get(&order).is_some_and(|ids| !ids.is_empty())
    }

    fn collect_if_unreachable(&mut self, order: OrderId) -> bool {
        let Some(record) = self.orders.get(&order) else { return false };
        if record.assigned_count() > 0 || self.has_incoming(order) {
            return false;
        }
        self.destroy_order_record(order);
        true
    }

    fn destroy_order_record(&mut self, order: OrderId) {
        let leftover: SmallVec<[LinkId; 2]> = self.outgoing.get(&order).cloned().unwrap_or_default();
        for link in leftover {
            warn!("Destroying {} dropped dangling {}", order, link);
            self.destroy_link(link);
        }
        let Some(record) = self.orders.remove(&order) else { return };
        if let OrderTarget::Entity(entity) = record.target {
            self.watches.unsubscribe(entity, order);
        }
        self.events.push(OrderEvent::Destroyed { order, order_type: record.order_type });
        debug!("Destroyed {} ({:?})", order, record.order_type);
    }

    /// Queued holders have the order spliced out of their chain, active holders
    /// advance, and the order itself is destroyed.
    fn force_destroy(&mut self, order: OrderId) {
        let incoming: SmallVec<[LinkId; 2]> = self.incoming.get(&order).cloned().unwrap_or_default();
        for link_id in incoming {
            let Some(link) = self.links.get(&link_id) else { continue };
            let from = link.from;
            let queued: Vec<Entity> = link.units().collect();

            for unit in queued {
                let onward = self.units.get(&unit).and_then(|state| state.outgoing.get(&order)).copied();
                let next = onward.and_then(|id| self.links.get(&id)).map(|link| link.to);

                self.detach_from_link(unit, link_id);
                if let Some(next) = next {
                    self.enqueue(unit, from, next);
                }
                if let Some(onward) = onward {
                    self.detach_from_link(unit, onward);
                }
            }
        }

        let holders: Vec<Entity> = self
            .orders
            .get(&order)
            .map(|record| record.assigned_units().collect())
            .unwrap_or_default();
        for unit in holders {
            if let Err(err) = self.advance_unit(unit) {
                error!("Cancelling {} could not advance {:?}: {}", order, unit, err);
            }
        }

        if self.orders.contains_key(&order) {
            self.destroy_order_record(order);
        }
    }
}

impl DestructionObserver for OrderGraph {
    type Listener = OrderId;

    fn on_destroyed(&mut self, entity: Entity, listeners: SmallVec<[OrderId; 4]>) {
        debug!("Target {:?} destroyed, cancelling {} order(s)", entity, listeners.len());
        for order in listeners {
            if self.orders.contains_key(&order) {
                self.force_destroy(order);
            }
        }
    }
}

fn remove_indexed(index: &mut FxHashMap<OrderId, SmallVec<[LinkId; 2]>>, key: OrderId, link: LinkId) {
    if let Some(ids) = index.get_mut(&key) {
        ids.retain(|id| *id != link);
        if ids.is_empty() {
            index.remove(&key);
        }
    }
}
