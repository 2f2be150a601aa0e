//! Seat membership and rotation order.

use std::collections::HashMap;

use uuid::Uuid;

use super::entities::{Player, PlayerId};
use super::state::ProtocolError;

/// Who is seated, in which join order, and who currently holds the
/// active flag. Join order is assigned on `add` and becomes the
/// immutable rotation for the encryption and table-decryption circles
/// once a hand starts.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    players: HashMap<PlayerId, Player>,
    order: Vec<PlayerId>,
    capacity: usize,
}

impl SessionRegistry {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            players: HashMap::with_capacity(capacity),
            order: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Seat a new player. Rejects once the table is at capacity.
    pub fn add(&mut self, name: &str) -> Result<PlayerId, ProtocolError> {
        if self.players.len() >= self.capacity {
            return Err(ProtocolError::RoomFull);
        }
        let id = Uuid::new_v4();
        self.players.insert(id, Player::new(id, name.to_string()));
        self.order.push(id);
        Ok(id)
    }

    /// Unseat a player, returning them if they were seated. Their slot
    /// in the rotation disappears with them.
    pub fn remove(&mut self, id: PlayerId) -> Option<Player> {
        let player = self.players.remove(&id)?;
        self.order.retain(|other| *other != id);
        Some(player)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.players.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// The rotation, in join order.
    #[must_use]
    pub fn order(&self) -> &[PlayerId] {
        &self.order
    }

    #[must_use]
    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.contains_key(&id)
    }

    #[must_use]
    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    /// Resolve a rotation index to its player id.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<PlayerId> {
        self.order.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.order.iter().filter_map(|id| self.players.get(id))
    }

    /// Mark exactly one player (or nobody) as the expected next actor.
    /// Invariant: at most one active flag is set at any instant.
    pub fn set_active(&mut self, id: Option<PlayerId>) {
        for player in self.players.values_mut() {
            player.active = Some(player.id) == id;
        }
    }

    /// The currently active player, if a circle is waiting on one.
    #[must_use]
    pub fn active_player(&self) -> Option<PlayerId> {
        self.players
            .values()
            .find(|player| player.active)
            .map(|player| player.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_enforced() {
        let mut registry = SessionRegistry::new(2);
        registry.add("alice").unwrap();
        registry.add("bob").unwrap();
        assert_eq!(registry.add("carol"), Err(ProtocolError::RoomFull));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_join_order_is_rotation_order() {
        let mut registry = SessionRegistry::new(5);
        let a = registry.add("alice").unwrap();
        let b = registry.add("bob").unwrap();
        let c = registry.add("carol").unwrap();
        assert_eq!(registry.order(), &[a, b, c]);
        assert_eq!(registry.at(1), Some(b));
    }

    #[test]
    fn test_remove_shrinks_rotation() {
        let mut registry = SessionRegistry::new(5);
        let a = registry.add("alice").unwrap();
        let b = registry.add("bob").unwrap();
        let removed = registry.remove(a).unwrap();
        assert_eq!(removed.name, "alice");
        assert_eq!(registry.order(), &[b]);
        assert!(registry.remove(a).is_none());
    }

    #[test]
    fn test_at_most_one_active_flag() {
        let mut registry = SessionRegistry::new(5);
        let a = registry.add("alice").unwrap();
        let b = registry.add("bob").unwrap();
        registry.set_active(Some(a));
        registry.set_active(Some(b));
        let active: Vec<_> = registry.iter().filter(|p| p.active).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, b);
        registry.set_active(None);
        assert_eq!(registry.active_player(), None);
    }
}
