//! Post-game key collection and the closing integrity check.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::entities::PlayerId;
use super::state::ProtocolError;

/// One player's encryption/decryption key pair, surrendered after the
/// hand. Useless for altering gameplay; only good for checking that the
/// pair was a valid commutative-cipher key against the shared modulus.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct KeyAuditRecord {
    pub player_id: PlayerId,
    pub name: String,
    pub c: u64,
    pub d: u64,
}

impl KeyAuditRecord {
    /// The closing check: `c * d ≡ 1 (mod p - 1)`.
    #[must_use]
    pub fn verify(&self, p: u64) -> bool {
        p > 1 && (u128::from(self.c) * u128::from(self.d)) % u128::from(p - 1) == 1
    }
}

/// Collects exactly one key pair per player once the hand has finished.
/// A failed verification never alters the already-completed hand.
#[derive(Debug, Default)]
pub struct KeyAudit {
    open: bool,
    expected: usize,
    received: HashMap<PlayerId, KeyAuditRecord>,
    arrival_order: Vec<PlayerId>,
}

impl KeyAudit {
    /// Start accepting submissions from `expected` players.
    pub fn open(&mut self, expected: usize) {
        self.open = true;
        self.expected = expected;
        self.received.clear();
        self.arrival_order.clear();
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Accept a key pair, once per player. Returns `true` when this was
    /// the final outstanding submission.
    pub fn submit(&mut self, record: KeyAuditRecord) -> Result<bool, ProtocolError> {
        if !self.open {
            return Err(ProtocolError::AuditClosed);
        }
        if self.received.contains_key(&record.player_id) {
            return Err(ProtocolError::DuplicateKeys);
        }
        self.arrival_order.push(record.player_id);
        self.received.insert(record.player_id, record);
        let complete = self.received.len() == self.expected;
        if complete {
            self.open = false;
        }
        Ok(complete)
    }

    /// Drop a departed player from the expectation, keeping any keys
    /// they already surrendered. Returns `true` when their departure
    /// was the last thing the audit was waiting on.
    pub fn on_player_removed(&mut self, id: PlayerId) -> bool {
        if !self.open {
            return false;
        }
        if !self.received.contains_key(&id) {
            self.expected = self.expected.saturating_sub(1);
        }
        let complete = self.received.len() >= self.expected;
        if complete {
            self.open = false;
        }
        complete
    }

    /// Records in arrival order, paired with their verification result.
    pub fn verified(&self, p: u64) -> impl Iterator<Item = (&KeyAuditRecord, bool)> {
        self.arrival_order
            .iter()
            .filter_map(|id| self.received.get(id))
            .map(move |record| (record, record.verify(p)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn record(c: u64, d: u64) -> KeyAuditRecord {
        KeyAuditRecord {
            player_id: Uuid::new_v4(),
            name: "alice".to_string(),
            c,
            d,
        }
    }

    #[test]
    fn test_verify_modular_inverse_pair() {
        // p = 23, so keys must satisfy c * d ≡ 1 (mod 22): 3 * 15 = 45 = 2*22 + 1.
        assert!(record(3, 15).verify(23));
        assert!(!record(3, 14).verify(23));
        assert!(!record(3, 15).verify(0));
    }

    #[test]
    fn test_submissions_accepted_once_per_player() {
        let mut audit = KeyAudit::default();
        audit.open(2);
        let first = record(3, 15);
        assert_eq!(audit.submit(first.clone()), Ok(false));
        assert_eq!(audit.submit(first), Err(ProtocolError::DuplicateKeys));
        assert_eq!(audit.submit(record(5, 9)), Ok(true));
        assert!(!audit.is_open());
    }

    #[test]
    fn test_closed_audit_rejects() {
        let mut audit = KeyAudit::default();
        assert_eq!(audit.submit(record(3, 15)), Err(ProtocolError::AuditClosed));
    }

    #[test]
    fn test_departed_player_shrinks_expectation() {
        let mut audit = KeyAudit::default();
        audit.open(3);
        let a = record(3, 15);
        audit.submit(a.clone()).unwrap();
        // A leaver whose keys are already in does not shrink anything.
        assert!(!audit.on_player_removed(a.player_id));
        // A leaver who never submitted does; the audit now waits on one.
        assert!(!audit.on_player_removed(Uuid::new_v4()));
        assert_eq!(audit.submit(record(5, 9)), Ok(true));
        assert!(!audit.is_open());
    }

    #[test]
    fn test_departure_can_complete_the_audit() {
        let mut audit = KeyAudit::default();
        audit.open(2);
        audit.submit(record(3, 15)).unwrap();
        assert!(audit.on_player_removed(Uuid::new_v4()));
        assert!(!audit.is_open());
        assert_eq!(audit.verified(23).count(), 1);
    }

    #[test]
    fn test_verified_preserves_arrival_order() {
        let mut audit = KeyAudit::default();
        audit.open(2);
        let a = record(3, 15);
        let b = record(5, 9);
        audit.submit(a.clone()).unwrap();
        audit.submit(b.clone()).unwrap();
        let results: Vec<_> = audit.verified(23).collect();
        assert_eq!(results[0].0.player_id, a.player_id);
        assert!(results[0].1);
        assert_eq!(results[1].0.player_id, b.player_id);
        // 5 * 9 = 45 ≡ 1 (mod 22) as well.
        assert!(results[1].1);
    }
}
