//! Destruction notification channel.
//!
//! Entities that can be targeted expose a destruction notification. Listeners
//! subscribe at most once per entity and are removed when they unsubscribe or
//! when the notification is delivered: the owner of the channel takes the
//! listener list and hands it to its [`DestructionObserver`] implementation.

use bevy::prelude::*;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Receiver of destruction notifications.
pub trait DestructionObserver {
    type Listener;

    fn on_destroyed(&mut self, entity: Entity, listeners: SmallVec<[Self::Listener; 4]>);
}

/// Observer lists keyed by the observed entity.
#[derive(Debug, Clone)]
pub struct DestructionChannel<L> {
    subscribers: FxHashMap<Entity, SmallVec<[L; 4]>>,
}

impl<L> Default for DestructionChannel<L> {
    fn default() -> Self {
        Self { subscribers: FxHashMap::default() }
    }
}

impl<L: Copy + PartialEq> DestructionChannel<L> {
    /// Returns false if `listener` was already subscribed to `entity`.
    pub fn subscribe(&mut self, entity: Entity, listener: L) -> bool {
        let list = self.subscribers.entry(entity).or_default();
        if list.contains(&listener) {
            return false;
        }
        list.push(listener);
        true
    }

    /// Returns false if `listener` was not subscribed.
    pub fn unsubscribe(&mut self, entity: Entity, listener: L) -> bool {
        let Some(list) = self.subscribers.get_mut(&entity) else { return false };
        let Some(pos) = list.iter().position(|l| *l == listener) else { return false };
        list.remove(pos);
        if list.is_empty() {
            self.subscribers.remove(&entity);
        }
        true
    }

    pub fn is_watched(&self, entity: Entity) -> bool {
        self.subscribers.contains_key(&entity)
    }

    pub fn watched(&self) -> impl Iterator<Item = Entity> + '_ {
        self.subscribers.keys().copied()
    }

    pub fn listeners(&self, entity: Entity) -> &[L] {
        self.subscribers.get(&entity).map(|l| l.as_slice()).unwrap_or(&[])
    }

    /// Detach every listener of `entity`, in subscription order.
    pub fn take(&mut self, entity: Entity) -> SmallVec<[L; 4]> {
        self.subscribers.remove(&entity).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_once_and_take() {
        let mut world = World::new();
        let target = world.spawn_empty().id();
        let mut channel: DestructionChannel<u32> = DestructionChannel::default();

        assert!(channel.subscribe(target, 1));
        assert!(!channel.subscribe(target, 1));
        assert!(channel.subscribe(target, 2));
        assert_eq!(channel.listeners(target), &[1, 2]);

        assert_eq!(channel.take(target).as_slice(), &[1, 2]);
        assert!(!channel.is_watched(target));
        assert!(channel.take(target).is_empty());
    }

    #[test]
    fn test_last_unsubscribe_stops_watching() {
        let mut world = World::new();
        let target = world.spawn_empty().id();
        let mut channel: DestructionChannel<u32> = DestructionChannel::default();

        channel.subscribe(target, 7);
        assert!(channel.unsubscribe(target, 7));
        assert!(!channel.unsubscribe(target, 7));
        assert_eq!(channel.watched().count(), 0);
    }
}
