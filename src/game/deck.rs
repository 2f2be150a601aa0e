//! The 52-slot deck and the dealer-private card identity map.

use std::collections::HashMap;

use super::constants::DECK_SIZE;
use super::entities::{Card, CardId, CardSlot, Suit};
use super::state::ProtocolError;

/// Owns the physical sequence of undealt card slots and the secret
/// `id -> identity` map. The map is consulted only by the audit log and
/// at explicit reveal points; it must never leak into a projection.
#[derive(Debug, Default)]
pub struct DeckManager {
    slots: Vec<CardSlot>,
    identities: HashMap<CardId, Card>,
}

impl DeckManager {
    /// Build the 52 slots suit-major (13 values per suit), each with its
    /// plaintext-equivalent placeholder ciphertext. Encryption happens
    /// peer-side once the circle starts.
    pub fn initialize(&mut self) {
        self.slots = Vec::with_capacity(DECK_SIZE);
        self.identities = HashMap::with_capacity(DECK_SIZE);
        let mut id = 0u8;
        for suit in Suit::ALL {
            for value in 2..=14u8 {
                let card_id = CardId(id);
                self.slots.push(CardSlot::new(card_id));
                self.identities.insert(card_id, Card(value, suit));
                id += 1;
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Snapshot of the undealt slots, used to seed the encryption circle.
    #[must_use]
    pub fn slots(&self) -> &[CardSlot] {
        &self.slots
    }

    /// Install the fully re-encrypted (and re-permuted) deck returned by
    /// a completed encryption circle.
    pub fn replace(&mut self, slots: Vec<CardSlot>) {
        self.slots = slots;
    }

    /// Remove and return `n` slots from the tail of the deck. Underflow
    /// is fatal to the hand: the caller must abort rather than deal a
    /// short or duplicate hand.
    pub fn pop(&mut self, n: usize) -> Result<Vec<CardSlot>, ProtocolError> {
        if self.slots.len() < n {
            return Err(ProtocolError::DeckExhausted {
                requested: n,
                remaining: self.slots.len(),
            });
        }
        Ok(self.slots.split_off(self.slots.len() - n))
    }

    /// Resolve a slot's real identity. Audit-log use only.
    #[must_use]
    pub fn identity(&self, id: CardId) -> Option<Card> {
        self.identities.get(&id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_initialize_builds_52_unique_slots() {
        let mut deck = DeckManager::default();
        deck.initialize();
        assert_eq!(deck.len(), 52);
        let ids: HashSet<_> = deck.slots().iter().map(|slot| slot.id).collect();
        assert_eq!(ids.len(), 52);
        let identities: HashSet<_> = (0..52u8)
            .map(|id| deck.identity(CardId(id)).unwrap().to_string())
            .collect();
        assert_eq!(identities.len(), 52);
    }

    #[test]
    fn test_pop_removes_from_tail() {
        let mut deck = DeckManager::default();
        deck.initialize();
        let last_id = deck.slots().last().unwrap().id;
        let dealt = deck.pop(2).unwrap();
        assert_eq!(dealt.len(), 2);
        assert_eq!(dealt.last().unwrap().id, last_id);
        assert_eq!(deck.len(), 50);
    }

    #[test]
    fn test_pop_underflow_is_an_error() {
        let mut deck = DeckManager::default();
        deck.initialize();
        deck.pop(50).unwrap();
        let err = deck.pop(3).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::DeckExhausted {
                requested: 3,
                remaining: 2
            }
        );
        // Nothing was dealt on failure.
        assert_eq!(deck.len(), 2);
    }

    #[test]
    fn test_identity_unknown_id() {
        let deck = DeckManager::default();
        assert!(deck.identity(CardId(0)).is_none());
    }
}
