//! Turn circles: exactly one active peer, in rotation order, advances a
//! shared card payload.
//!
//! One primitive covers all three protocol circles:
//! - encryption: the full deck visits every player once, in join order;
//! - private decryption: a 2-card hand visits every player *except* its
//!   owner, starting just after the owner in rotation;
//! - table decryption: newly dealt community cards visit every player.
//!
//! The core cannot verify that a peer honestly re-encrypted or
//! re-permuted; what it can and does enforce is structural preservation
//! of the payload, by rejecting any submission whose id multiset differs
//! from the cards in flight.

use super::entities::{CardId, CardSlot, CircleMode, PlayerId};
use super::state::ProtocolError;

/// Outcome of an accepted circle submission.
#[derive(Debug)]
pub enum CircleOutcome {
    /// The payload moves on to the next actor in rotation.
    Continue { next: PlayerId },
    /// Every required actor has taken their step; the final payload is
    /// handed back to the state machine.
    Complete { payload: Vec<CardSlot> },
}

/// A single circulating payload and the rotation cursor driving it.
#[derive(Debug)]
pub struct TurnCircle {
    mode: CircleMode,
    /// Index into the rotation of the expected next actor.
    cursor: usize,
    /// Accepted steps so far.
    steps: usize,
    /// Rotation index of the hand owner; private mode only.
    target: Option<usize>,
    payload: Vec<CardSlot>,
}

impl TurnCircle {
    /// Circle the full deck through every player for encryption.
    #[must_use]
    pub fn encryption(deck: Vec<CardSlot>) -> Self {
        Self {
            mode: CircleMode::Encryption,
            cursor: 0,
            steps: 0,
            target: None,
            payload: deck,
        }
    }

    /// Circle a hand through everyone but its owner, starting at the
    /// seat just after the owner.
    #[must_use]
    pub fn private_hand(target: usize, hand: Vec<CardSlot>, rotation_len: usize) -> Self {
        Self {
            mode: CircleMode::DecryptionPrivate,
            cursor: (target + 1) % rotation_len,
            steps: 0,
            target: Some(target),
            payload: hand,
        }
    }

    /// Circle newly dealt community cards through every player.
    #[must_use]
    pub fn table(cards: Vec<CardSlot>) -> Self {
        Self {
            mode: CircleMode::DecryptionTable,
            cursor: 0,
            steps: 0,
            target: None,
            payload: cards,
        }
    }

    #[must_use]
    pub fn mode(&self) -> CircleMode {
        self.mode
    }

    /// Rotation index of the hand owner (private mode only).
    #[must_use]
    pub fn target(&self) -> Option<usize> {
        self.target
    }

    /// The cards currently in flight.
    #[must_use]
    pub fn payload(&self) -> &[CardSlot] {
        &self.payload
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The player whose step the circle is waiting on.
    #[must_use]
    pub fn current_actor(&self, order: &[PlayerId]) -> Option<PlayerId> {
        order.get(self.cursor).copied()
    }

    /// Steps required before the circle completes: the whole rotation,
    /// minus one in private mode (the owner never touches their own
    /// hand).
    #[must_use]
    pub fn required_steps(&self, rotation_len: usize) -> usize {
        match self.mode {
            CircleMode::DecryptionPrivate => rotation_len - 1,
            CircleMode::Encryption | CircleMode::DecryptionTable => rotation_len,
        }
    }

    /// Accept one actor's transformed payload, or reject it without any
    /// state change. The submitted cards may be re-permuted and carry
    /// new ciphertexts, but must preserve the id multiset exactly.
    pub fn submit(
        &mut self,
        player_id: PlayerId,
        cards: Vec<CardSlot>,
        order: &[PlayerId],
    ) -> Result<CircleOutcome, ProtocolError> {
        match self.current_actor(order) {
            Some(expected) if expected == player_id => {}
            _ => return Err(ProtocolError::WrongActor),
        }
        if !same_id_multiset(&self.payload, &cards) {
            return Err(ProtocolError::CardSetMismatch);
        }

        self.payload = cards;
        self.steps += 1;
        if self.steps == self.required_steps(order.len()) {
            return Ok(CircleOutcome::Complete {
                payload: std::mem::take(&mut self.payload),
            });
        }

        self.cursor = match self.mode {
            // Private circles wrap around the rotation; the others run
            // straight through from seat 0.
            CircleMode::DecryptionPrivate => (self.cursor + 1) % order.len(),
            CircleMode::Encryption | CircleMode::DecryptionTable => self.cursor + 1,
        };
        let next = order[self.cursor];
        Ok(CircleOutcome::Continue { next })
    }
}

fn same_id_multiset(before: &[CardSlot], after: &[CardSlot]) -> bool {
    if before.len() != after.len() {
        return false;
    }
    let mut lhs: Vec<CardId> = before.iter().map(|slot| slot.id).collect();
    let mut rhs: Vec<CardId> = after.iter().map(|slot| slot.id).collect();
    lhs.sort_unstable();
    rhs.sort_unstable();
    lhs == rhs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::Ciphertext;
    use uuid::Uuid;

    fn slots(ids: &[u8]) -> Vec<CardSlot> {
        ids.iter().map(|id| CardSlot::new(CardId(*id))).collect()
    }

    fn rotation(n: usize) -> Vec<PlayerId> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn test_encryption_circle_visits_everyone_once() {
        let order = rotation(3);
        let mut circle = TurnCircle::encryption(slots(&[0, 1, 2]));
        assert_eq!(circle.current_actor(&order), Some(order[0]));

        match circle.submit(order[0], slots(&[2, 0, 1]), &order).unwrap() {
            CircleOutcome::Continue { next } => assert_eq!(next, order[1]),
            outcome => panic!("unexpected outcome: {outcome:?}"),
        }
        match circle.submit(order[1], slots(&[1, 2, 0]), &order).unwrap() {
            CircleOutcome::Continue { next } => assert_eq!(next, order[2]),
            outcome => panic!("unexpected outcome: {outcome:?}"),
        }
        match circle.submit(order[2], slots(&[0, 2, 1]), &order).unwrap() {
            CircleOutcome::Complete { payload } => assert_eq!(payload, slots(&[0, 2, 1])),
            outcome => panic!("unexpected outcome: {outcome:?}"),
        }
    }

    #[test]
    fn test_wrong_actor_rejected_without_mutation() {
        let order = rotation(2);
        let mut circle = TurnCircle::encryption(slots(&[0, 1]));
        let err = circle.submit(order[1], slots(&[0, 1]), &order).unwrap_err();
        assert_eq!(err, ProtocolError::WrongActor);
        assert_eq!(circle.cursor(), 0);
        assert_eq!(circle.payload(), slots(&[0, 1]).as_slice());
    }

    #[test]
    fn test_id_multiset_change_rejected() {
        let order = rotation(2);
        let mut circle = TurnCircle::encryption(slots(&[0, 1, 2]));
        // Dropped a card.
        let err = circle.submit(order[0], slots(&[0, 1]), &order).unwrap_err();
        assert_eq!(err, ProtocolError::CardSetMismatch);
        // Swapped a card for one not in flight.
        let err = circle
            .submit(order[0], slots(&[0, 1, 7]), &order)
            .unwrap_err();
        assert_eq!(err, ProtocolError::CardSetMismatch);
        // Duplicated an id.
        let err = circle
            .submit(order[0], slots(&[0, 1, 1]), &order)
            .unwrap_err();
        assert_eq!(err, ProtocolError::CardSetMismatch);
        assert_eq!(circle.cursor(), 0);
    }

    #[test]
    fn test_private_circle_skips_target() {
        let order = rotation(3);
        let target = 1;
        let mut circle = TurnCircle::private_hand(target, slots(&[10, 11]), order.len());
        // Starts just after the target and wraps around it.
        assert_eq!(circle.current_actor(&order), Some(order[2]));

        match circle.submit(order[2], slots(&[10, 11]), &order).unwrap() {
            CircleOutcome::Continue { next } => assert_eq!(next, order[0]),
            outcome => panic!("unexpected outcome: {outcome:?}"),
        }
        // The target never gets a turn: submitting as the target fails.
        let err = circle
            .submit(order[target], slots(&[10, 11]), &order)
            .unwrap_err();
        assert_eq!(err, ProtocolError::WrongActor);
        // Exactly N - 1 steps complete the circle.
        match circle.submit(order[0], slots(&[11, 10]), &order).unwrap() {
            CircleOutcome::Complete { payload } => assert_eq!(payload.len(), 2),
            outcome => panic!("unexpected outcome: {outcome:?}"),
        }
    }

    #[test]
    fn test_private_circle_two_players_single_step() {
        let order = rotation(2);
        let mut circle = TurnCircle::private_hand(0, slots(&[4, 5]), order.len());
        assert_eq!(circle.current_actor(&order), Some(order[1]));
        match circle.submit(order[1], slots(&[4, 5]), &order).unwrap() {
            CircleOutcome::Complete { .. } => {}
            outcome => panic!("unexpected outcome: {outcome:?}"),
        }
    }

    #[test]
    fn test_ciphertext_rewrite_is_accepted() {
        let order = rotation(2);
        let mut circle = TurnCircle::table(slots(&[3]));
        let mut rewritten = slots(&[3]);
        rewritten[0].ciphertext = Ciphertext("987654321".to_string());
        match circle.submit(order[0], rewritten.clone(), &order).unwrap() {
            CircleOutcome::Continue { next } => assert_eq!(next, order[1]),
            outcome => panic!("unexpected outcome: {outcome:?}"),
        }
        assert_eq!(circle.payload(), rewritten.as_slice());
    }
}
