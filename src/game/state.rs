//! Game-level state machine for one mental-poker hand.
//!
//! `GameState` is the single mutation surface for a table: every inbound
//! player action is validated and applied here as one atomic turn-step,
//! and side effects come back out as an ordered [`GameEvent`] queue for
//! the transport to deliver. Phases only ever advance on an explicit
//! leader request or as the terminal step of a completing circle, so the
//! protocol can never skip ahead on its own.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::audit::{KeyAudit, KeyAuditRecord};
use super::circle::{CircleOutcome, TurnCircle};
use super::constants;
use super::deck::DeckManager;
use super::entities::{Card, CardSlot, CircleMode, Phase, Player, PlayerId};
use super::log::GameLog;
use super::prime;
use super::session::SessionRegistry;

/// Everything that can go wrong with an inbound player action.
///
/// Protocol violations (wrong actor, wrong phase, malformed card sets)
/// are resolved by the caller as silent rejections with no state change;
/// capacity and precondition errors surface as user-visible messages.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum ProtocolError {
    #[error("not your turn")]
    WrongActor,
    #[error("wrong phase for that action")]
    WrongPhase,
    #[error("submitted cards do not match the cards in flight")]
    CardSetMismatch,
    #[error("room full")]
    RoomFull,
    #[error("hand already in progress")]
    GameInProgress,
    #[error("need 2+ players")]
    NotEnoughPlayers,
    #[error("deck exhausted: requested {requested}, {remaining} remaining")]
    DeckExhausted { requested: usize, remaining: usize },
    #[error("keys already submitted")]
    DuplicateKeys,
    #[error("not collecting keys")]
    AuditClosed,
    #[error("player does not exist")]
    NoSuchPlayer,
    #[error("invalid key format")]
    InvalidKeyFormat,
}

/// Side effects produced by accepted mutations, drained by the table
/// actor and fanned out to the transport.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum GameEvent {
    PlayerJoined { id: PlayerId, name: String },
    PlayerLeft { id: PlayerId, name: String },
    /// Shared modulus for the peer-side commutative cipher.
    PrimeShared { p: u64, q: u64 },
    /// The named player must encrypt (and may re-permute) the payload.
    EncryptRequest {
        to: PlayerId,
        cards: Vec<CardSlot>,
        player_index: usize,
    },
    /// The named player must apply their decryption key to the payload.
    DecryptRequest {
        to: PlayerId,
        cards: Vec<CardSlot>,
        mode: CircleMode,
    },
    /// A fully decrypted hand, for the owner's private channel only.
    FinalPrivateHand { to: PlayerId, cards: Vec<CardSlot> },
    KeysRequested,
    GameCompleted,
    HandAborted { reason: String },
    /// Ground-truth audit line for the external log sink.
    AuditLine(String),
    /// Player-facing chat line for the room.
    LogBroadcast(String),
    /// Re-project and push a snapshot to every seated player.
    StateChanged,
}

/// Table-level game settings.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct GameSettings {
    pub max_players: usize,
    pub min_players: usize,
    pub prime_bits: u32,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            max_players: constants::MAX_PLAYERS,
            min_players: constants::MIN_PLAYERS,
            prime_bits: constants::DEFAULT_PRIME_BITS,
        }
    }
}

/// A community card slot plus its resolved identity once the table
/// decryption circle has run over it.
#[derive(Clone, Debug)]
pub struct TableCard {
    pub slot: CardSlot,
    pub identity: Option<Card>,
}

/// One table's complete game state. Created lazily on the first join,
/// lives for one hand, owned exclusively by its table actor.
#[derive(Debug)]
pub struct GameState {
    settings: GameSettings,
    registry: SessionRegistry,
    deck: DeckManager,
    phase: Phase,
    circle: Option<TurnCircle>,
    /// Rotation index of the hand currently being privately decrypted.
    decryption_target: usize,
    table_cards: Vec<TableCard>,
    prime: Option<(u64, u64)>,
    audit: KeyAudit,
    log: GameLog,
    events: VecDeque<GameEvent>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(GameSettings::default())
    }
}

impl GameState {
    #[must_use]
    pub fn new(settings: GameSettings) -> Self {
        Self {
            settings,
            registry: SessionRegistry::new(settings.max_players),
            deck: DeckManager::default(),
            phase: Phase::Waiting,
            circle: None,
            decryption_target: 0,
            table_cards: Vec::with_capacity(5),
            prime: None,
            audit: KeyAudit::default(),
            log: GameLog::new(),
            events: VecDeque::new(),
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn processing_phase(&self) -> Option<CircleMode> {
        self.circle.as_ref().map(TurnCircle::mode)
    }

    #[must_use]
    pub fn deck_size(&self) -> usize {
        self.deck.len()
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.registry.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    #[must_use]
    pub fn player_order(&self) -> &[PlayerId] {
        self.registry.order()
    }

    #[must_use]
    pub fn leader(&self) -> Option<PlayerId> {
        self.registry.at(0)
    }

    #[must_use]
    pub fn active_player(&self) -> Option<PlayerId> {
        self.registry.active_player()
    }

    #[must_use]
    pub fn table_cards(&self) -> &[TableCard] {
        &self.table_cards
    }

    #[must_use]
    pub fn prime(&self) -> Option<(u64, u64)> {
        self.prime
    }

    #[must_use]
    pub fn log(&self) -> &GameLog {
        &self.log
    }

    /// The undealt slots, as the server currently holds them.
    #[must_use]
    pub fn remaining_deck(&self) -> &[CardSlot] {
        self.deck.slots()
    }

    /// Server-side view of a seated player. The privacy boundary is the
    /// projector, not this accessor; the server owns all state.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.registry.get(id)
    }

    pub(super) fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Hand back all side effects accumulated since the last drain, in
    /// the order they occurred.
    pub fn drain_events(&mut self) -> VecDeque<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------
    // Membership
    // ------------------------------------------------------------------

    /// Seat a new player. Only possible while waiting: the rotation
    /// freezes when the hand starts, and a late join would re-route any
    /// running circle (in private mode, onto the target itself).
    pub fn add_player(&mut self, name: &str) -> Result<PlayerId, ProtocolError> {
        if self.phase != Phase::Waiting {
            return Err(ProtocolError::GameInProgress);
        }
        let id = self.registry.add(name)?;
        let line = self.log.audit(format!("[JOIN] Player '{name}' (ID: {id}) connected."));
        self.events.push_back(GameEvent::AuditLine(line));
        let chat = self.log.broadcast("System", &format!("{name} joined the table"));
        self.events.push_back(GameEvent::LogBroadcast(chat));
        self.events.push_back(GameEvent::PlayerJoined {
            id,
            name: name.to_string(),
        });
        self.events.push_back(GameEvent::StateChanged);
        Ok(id)
    }

    /// Unseat a player. Once a hand is underway, a departed player's key
    /// is unrecoverable, so the hand aborts rather than stalling the
    /// circle forever.
    pub fn remove_player(&mut self, id: PlayerId) {
        let Some(player) = self.registry.remove(id) else {
            return;
        };
        let line = self.log.audit(format!("[LEAVE] Player '{}' left.", player.name));
        self.events.push_back(GameEvent::AuditLine(line));
        self.events.push_back(GameEvent::PlayerLeft {
            id,
            name: player.name.clone(),
        });
        if !matches!(self.phase, Phase::Waiting | Phase::Completed) {
            self.abort_hand(&format!("player '{}' left mid-hand", player.name));
        }
        // A post-game leaver must not stall the key audit for everyone
        // who stayed.
        if self.audit.on_player_removed(id) {
            self.write_audit_block();
        }
        self.events.push_back(GameEvent::StateChanged);
    }

    // ------------------------------------------------------------------
    // Phase advancement (leader only)
    // ------------------------------------------------------------------

    /// Advance the game on the leader's request. Returns `false`, with
    /// no state change, for any non-leader or phase-incompatible
    /// request.
    pub fn next_phase(&mut self, player_id: PlayerId) -> bool {
        if self.leader() != Some(player_id) {
            log::debug!("phase advance from non-leader {player_id} ignored");
            return false;
        }
        // Streets only advance between circles.
        if self.circle.is_some() {
            log::debug!("phase advance ignored while a circle is running");
            return false;
        }
        match self.phase {
            Phase::Waiting => self.start_game(),
            Phase::KeyExchange => {
                self.start_encryption();
                true
            }
            Phase::Flop => self.deal_street(constants::FLOP_CARDS, "FLOP"),
            Phase::Turn => self.deal_street(constants::TURN_CARDS, "TURN"),
            Phase::River => self.deal_street(constants::RIVER_CARDS, "RIVER"),
            Phase::Showdown => {
                self.complete_game();
                true
            }
            Phase::Encryption | Phase::DecryptionPrivate | Phase::Completed => false,
        }
    }

    fn start_game(&mut self) -> bool {
        if self.registry.len() < self.settings.min_players {
            let chat = self
                .log
                .broadcast("System", "need at least 2 players to start");
            self.events.push_back(GameEvent::LogBroadcast(chat));
            return false;
        }
        let names: Vec<String> = self.registry.iter().map(|p| p.name.clone()).collect();
        let line = self.log.audit(format!(
            "--- GAME STARTED with {} players: {} ---",
            names.len(),
            names.join(", ")
        ));
        self.events.push_back(GameEvent::AuditLine(line));

        let (p, q) = prime::sophie_germain_pair(self.settings.prime_bits, &mut rand::rng());
        self.prime = Some((p, q));
        let line = self
            .log
            .audit(format!("  Sophie Germain Prime generated: P={p}, Q={q}"));
        self.events.push_back(GameEvent::AuditLine(line));
        let chat = self
            .log
            .broadcast("System", "game started, prime parameters shared");
        self.events.push_back(GameEvent::LogBroadcast(chat));

        self.phase = Phase::KeyExchange;
        self.events.push_back(GameEvent::PrimeShared { p, q });
        self.events.push_back(GameEvent::StateChanged);
        true
    }

    fn start_encryption(&mut self) {
        self.deck.initialize();
        let line = self.log.audit("--- 1. INITIAL DECK STATE ---");
        self.events.push_back(GameEvent::AuditLine(line));
        for slot in self.deck.slots() {
            if let Some(identity) = self.deck.identity(slot.id) {
                let line = self.log.audit_raw(format!(
                    "  ID {}: {:<4} (Numeric Value: {})",
                    slot.id, identity, slot.ciphertext
                ));
                self.events.push_back(GameEvent::AuditLine(line));
            }
        }

        self.phase = Phase::Encryption;
        let line = self.log.audit("--- 2. DECK ENCRYPTION PHASE ---");
        self.events.push_back(GameEvent::AuditLine(line));
        let chat = self.log.broadcast("System", "deck encryption started");
        self.events.push_back(GameEvent::LogBroadcast(chat));

        let circle = TurnCircle::encryption(self.deck.slots().to_vec());
        self.arm_circle(circle);
        self.events.push_back(GameEvent::StateChanged);
    }

    /// Install a circle and prompt its first actor.
    fn arm_circle(&mut self, circle: TurnCircle) {
        let order = self.registry.order().to_vec();
        let Some(actor) = circle.current_actor(&order) else {
            return;
        };
        let cards = circle.payload().to_vec();
        let mode = circle.mode();
        let player_index = circle.cursor();
        self.registry.set_active(Some(actor));
        self.events.push_back(match mode {
            CircleMode::Encryption => GameEvent::EncryptRequest {
                to: actor,
                cards,
                player_index,
            },
            CircleMode::DecryptionPrivate | CircleMode::DecryptionTable => {
                GameEvent::DecryptRequest { to: actor, cards, mode }
            }
        });
        self.circle = Some(circle);
    }

    // ------------------------------------------------------------------
    // Encryption circle
    // ------------------------------------------------------------------

    pub fn submit_encrypted(
        &mut self,
        player_id: PlayerId,
        cards: Vec<CardSlot>,
    ) -> Result<(), ProtocolError> {
        if self.processing_phase() != Some(CircleMode::Encryption) {
            return Err(ProtocolError::WrongPhase);
        }
        let order = self.registry.order().to_vec();
        let Some(circle) = self.circle.as_mut() else {
            return Err(ProtocolError::WrongPhase);
        };
        let outcome = circle.submit(player_id, cards, &order)?;

        let name = self.player_name(player_id);
        let chat = self.log.broadcast(&name, "encrypted the deck");
        self.events.push_back(GameEvent::LogBroadcast(chat));
        self.registry.set_active(None);

        match outcome {
            CircleOutcome::Continue { next } => {
                let payload = self
                    .circle
                    .as_ref()
                    .map(|circle| circle.payload().to_vec())
                    .unwrap_or_default();
                self.log_deck_step(&name, &payload);
                self.prompt_next(next);
            }
            CircleOutcome::Complete { payload } => {
                self.log_deck_step(&name, &payload);
                self.circle = None;
                self.deck.replace(payload);
                let line = self
                    .log
                    .audit("[ENCRYPTION] Final deck is fully encrypted and shuffled.");
                self.events.push_back(GameEvent::AuditLine(line));
                self.deal_hole_cards();
            }
        }
        self.events.push_back(GameEvent::StateChanged);
        Ok(())
    }

    /// Dump the in-flight deck after an encryption step, sorted by id
    /// for log readability while the live payload keeps the peer's
    /// permutation.
    fn log_deck_step(&mut self, name: &str, payload: &[CardSlot]) {
        let mut sorted = payload.to_vec();
        sorted.sort_by_key(|slot| slot.id);
        let line = self
            .log
            .audit(format!("  Deck state after encryption by '{name}':"));
        self.events.push_back(GameEvent::AuditLine(line));
        for slot in sorted {
            let line = self.log.audit_raw(format!(
                "    ID {} -> Encrypted Value: {}",
                slot.id, slot.ciphertext
            ));
            self.events.push_back(GameEvent::AuditLine(line));
        }
    }

    fn prompt_next(&mut self, next: PlayerId) {
        let Some(circle) = self.circle.as_ref() else {
            return;
        };
        let cards = circle.payload().to_vec();
        let mode = circle.mode();
        let player_index = circle.cursor();
        self.registry.set_active(Some(next));
        self.events.push_back(match mode {
            CircleMode::Encryption => GameEvent::EncryptRequest {
                to: next,
                cards,
                player_index,
            },
            CircleMode::DecryptionPrivate | CircleMode::DecryptionTable => {
                GameEvent::DecryptRequest { to: next, cards, mode }
            }
        });
    }

    // ------------------------------------------------------------------
    // Dealing
    // ------------------------------------------------------------------

    fn deal_hole_cards(&mut self) {
        let line = self.log.audit("--- 3. DEALING CARDS TO PLAYERS ---");
        self.events.push_back(GameEvent::AuditLine(line));
        let order = self.registry.order().to_vec();
        for id in order {
            let hand = match self.deck.pop(constants::HOLE_CARDS) {
                Ok(hand) => hand,
                Err(err) => {
                    self.abort_hand(&err.to_string());
                    return;
                }
            };
            let (ids, values) = dump_slots(&hand);
            if let Some(player) = self.registry.get_mut(id) {
                player.hand = hand;
            }
            let name = self.player_name(id);
            let line = self.log.audit(format!(
                "  Dealt to '{name}': Card IDs [{ids}] with Encrypted Values [{values}]"
            ));
            self.events.push_back(GameEvent::AuditLine(line));
        }

        self.phase = Phase::DecryptionPrivate;
        self.decryption_target = 0;
        let line = self.log.audit("--- 4. PRIVATE CARDS DECRYPTION ---");
        self.events.push_back(GameEvent::AuditLine(line));
        self.start_private_circle();
    }

    fn start_private_circle(&mut self) {
        let order = self.registry.order().to_vec();
        if self.decryption_target >= order.len() {
            self.phase = Phase::Flop;
            let line = self
                .log
                .audit("[DECRYPTION-PRIVATE] All player hands processed.");
            self.events.push_back(GameEvent::AuditLine(line));
            let chat = self
                .log
                .broadcast("System", "all hands decrypted, play begins");
            self.events.push_back(GameEvent::LogBroadcast(chat));
            return;
        }

        let target_id = order[self.decryption_target];
        let target_name = self.player_name(target_id);
        let hand = self
            .registry
            .get(target_id)
            .map(|player| player.hand.clone())
            .unwrap_or_default();
        let line = self.log.audit(format!(
            "  Starting decryption circle for '{target_name}'s hand."
        ));
        self.events.push_back(GameEvent::AuditLine(line));
        let chat = self
            .log
            .broadcast("System", &format!("decrypting {target_name}'s hand"));
        self.events.push_back(GameEvent::LogBroadcast(chat));

        let circle = TurnCircle::private_hand(self.decryption_target, hand, order.len());
        self.arm_circle(circle);
    }

    fn deal_street(&mut self, count: usize, street: &str) -> bool {
        let cards = match self.deck.pop(count) {
            Ok(cards) => cards,
            Err(err) => {
                self.abort_hand(&err.to_string());
                return true;
            }
        };
        let (ids, values) = dump_slots(&cards);
        let line = self
            .log
            .audit(format!("--- 5. DEALING {street} ({count} cards) ---"));
        self.events.push_back(GameEvent::AuditLine(line));
        let line = self.log.audit(format!(
            "  Moving cards to table (IDs [{ids}]). Encrypted values: [{values}]"
        ));
        self.events.push_back(GameEvent::AuditLine(line));
        let chat = self.log.broadcast("System", "decrypting table cards");
        self.events.push_back(GameEvent::LogBroadcast(chat));

        self.table_cards.extend(cards.iter().cloned().map(|slot| TableCard {
            slot,
            identity: None,
        }));
        let circle = TurnCircle::table(cards);
        self.arm_circle(circle);
        self.events.push_back(GameEvent::StateChanged);
        true
    }

    // ------------------------------------------------------------------
    // Decryption circles
    // ------------------------------------------------------------------

    pub fn submit_decrypted(
        &mut self,
        player_id: PlayerId,
        cards: Vec<CardSlot>,
        mode: CircleMode,
    ) -> Result<(), ProtocolError> {
        if mode == CircleMode::Encryption || self.processing_phase() != Some(mode) {
            return Err(ProtocolError::WrongPhase);
        }
        let order = self.registry.order().to_vec();
        let Some(circle) = self.circle.as_mut() else {
            return Err(ProtocolError::WrongPhase);
        };
        let outcome = circle.submit(player_id, cards, &order)?;
        self.registry.set_active(None);

        match mode {
            CircleMode::DecryptionPrivate => self.on_private_step(player_id, outcome),
            CircleMode::DecryptionTable => self.on_table_step(player_id, outcome),
            CircleMode::Encryption => unreachable!("rejected above"),
        }
        self.events.push_back(GameEvent::StateChanged);
        Ok(())
    }

    fn on_private_step(&mut self, actor: PlayerId, outcome: CircleOutcome) {
        let actor_name = self.player_name(actor);
        let target_id = self.registry.at(self.decryption_target);
        let target_name = target_id.map_or_else(|| "??".to_string(), |id| self.player_name(id));

        match outcome {
            CircleOutcome::Continue { next } => {
                if let Some(circle) = self.circle.as_ref() {
                    let (ids, values) = dump_slots(circle.payload());
                    let line = self.log.audit(format!(
                        "    '{actor_name}' decrypted hand of '{target_name}' (IDs [{ids}]). New values: [{values}]"
                    ));
                    self.events.push_back(GameEvent::AuditLine(line));
                }
                self.prompt_next(next);
            }
            CircleOutcome::Complete { payload } => {
                let (ids, values) = dump_slots(&payload);
                let line = self.log.audit(format!(
                    "    '{actor_name}' decrypted hand of '{target_name}' (IDs [{ids}]). New values: [{values}]"
                ));
                self.events.push_back(GameEvent::AuditLine(line));
                self.circle = None;
                // The decrypted hand goes only to its owner; it is never
                // broadcast and never written back into shared state.
                if let Some(target) = target_id {
                    self.events.push_back(GameEvent::FinalPrivateHand {
                        to: target,
                        cards: payload,
                    });
                }
                self.decryption_target += 1;
                self.start_private_circle();
            }
        }
    }

    fn on_table_step(&mut self, actor: PlayerId, outcome: CircleOutcome) {
        let actor_name = self.player_name(actor);
        match outcome {
            CircleOutcome::Continue { next } => {
                if let Some(circle) = self.circle.as_ref() {
                    let (ids, values) = dump_slots(circle.payload());
                    let line = self.log.audit(format!(
                        "    '{actor_name}' decrypted table cards (IDs [{ids}]). New values: [{values}]"
                    ));
                    self.events.push_back(GameEvent::AuditLine(line));
                }
                self.prompt_next(next);
            }
            CircleOutcome::Complete { payload } => {
                let (ids, values) = dump_slots(&payload);
                let line = self.log.audit(format!(
                    "    '{actor_name}' decrypted table cards (IDs [{ids}]). New values: [{values}]"
                ));
                self.events.push_back(GameEvent::AuditLine(line));
                self.circle = None;
                self.resolve_table_cards(payload);
                self.phase = match self.phase {
                    Phase::Flop => Phase::Turn,
                    Phase::Turn => Phase::River,
                    _ => Phase::Showdown,
                };
            }
        }
    }

    /// Merge a fully decrypted street back into the id-sorted table
    /// collection, resolving each card's identity through the map.
    fn resolve_table_cards(&mut self, payload: Vec<CardSlot>) {
        let mut revealed = Vec::with_capacity(payload.len());
        for slot in payload {
            let identity = self.deck.identity(slot.id);
            if let Some(card) = self
                .table_cards
                .iter_mut()
                .find(|table_card| table_card.slot.id == slot.id)
            {
                card.slot = slot;
                card.identity = identity;
                if let Some(identity) = identity {
                    revealed.push(identity.to_string());
                }
            }
        }
        self.table_cards.sort_by_key(|card| card.slot.id);
        let line = self
            .log
            .audit(format!("[DECRYPTION-TABLE] Revealed: [{}]", revealed.join(", ")));
        self.events.push_back(GameEvent::AuditLine(line));
    }

    // ------------------------------------------------------------------
    // Completion, audit, abort
    // ------------------------------------------------------------------

    fn complete_game(&mut self) {
        self.phase = Phase::Completed;
        let line = self
            .log
            .audit("--- GAME COMPLETED: REVEALING ALL CARDS FOR LOG ---");
        self.events.push_back(GameEvent::AuditLine(line));
        self.log_full_reveal();
        let chat = self
            .log
            .broadcast("System", "game over, all cards revealed in the log");
        self.events.push_back(GameEvent::LogBroadcast(chat));
        self.events.push_back(GameEvent::GameCompleted);

        self.audit.open(self.registry.len());
        let line = self.log.audit("--- 6. REQUESTING PLAYER KEYS FOR AUDIT ---");
        self.events.push_back(GameEvent::AuditLine(line));
        self.events.push_back(GameEvent::KeysRequested);
        self.events.push_back(GameEvent::StateChanged);
    }

    fn log_full_reveal(&mut self) {
        let table: Vec<String> = self
            .table_cards
            .iter()
            .map(|card| {
                self.deck
                    .identity(card.slot.id)
                    .map_or_else(|| "??".to_string(), |identity| identity.to_string())
            })
            .collect();
        let line = self
            .log
            .audit(format!("  Final Table: [{}]", table.join(", ")));
        self.events.push_back(GameEvent::AuditLine(line));

        let reveals: Vec<(String, String)> = self
            .registry
            .iter()
            .map(|player| {
                let cards: Vec<String> = player
                    .hand
                    .iter()
                    .map(|slot| {
                        self.deck
                            .identity(slot.id)
                            .map_or_else(|| "??".to_string(), |identity| identity.to_string())
                    })
                    .collect();
                (player.name.clone(), cards.join(", "))
            })
            .collect();
        for (name, cards) in reveals {
            let line = self.log.audit(format!("  Player '{name}' had: [{cards}]"));
            self.events.push_back(GameEvent::AuditLine(line));
        }
    }

    pub fn submit_keys(&mut self, player_id: PlayerId, c: u64, d: u64) -> Result<(), ProtocolError> {
        let name = self
            .registry
            .get(player_id)
            .map(|player| player.name.clone())
            .ok_or(ProtocolError::NoSuchPlayer)?;
        let complete = self.audit.submit(KeyAuditRecord {
            player_id,
            name: name.clone(),
            c,
            d,
        })?;
        let line = self
            .log
            .audit(format!("  Received keys from '{name}': C={c}, D={d}"));
        self.events.push_back(GameEvent::AuditLine(line));
        let chat = self.log.broadcast(&name, "surrendered audit keys");
        self.events.push_back(GameEvent::LogBroadcast(chat));

        if complete {
            self.write_audit_block();
        }
        Ok(())
    }

    fn write_audit_block(&mut self) {
        let p = self.prime.map_or(0, |(p, _)| p);
        let mut lines = vec!["--- PLAYER KEYS FOR AUDIT ---".to_string()];
        for (record, valid) in self.audit.verified(p) {
            lines.push(format!("  Player: {}", record.name));
            lines.push(format!("    C = {}", record.c));
            lines.push(format!("    D = {}", record.d));
            lines.push(format!(
                "    Verification (C*D mod P-1 == 1): {}",
                if valid { "OK" } else { "FAILED" }
            ));
        }
        for line in lines {
            let line = self.log.audit_raw(line);
            self.events.push_back(GameEvent::AuditLine(line));
        }

        let duration = self.log.duration_secs();
        let summary = [
            "--- FINAL SUMMARY ---".to_string(),
            format!("End Time: {}", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S")),
            format!("Duration: {duration:.1} seconds"),
            format!("Prime P: {p}"),
            "--- END OF LOG ---".to_string(),
        ];
        for line in summary {
            let line = self.log.audit_raw(line);
            self.events.push_back(GameEvent::AuditLine(line));
        }
    }

    /// Tear down the in-progress hand: full reveal to the log, terminal
    /// phase, recoverable failure to the room. Seats and connections
    /// survive the abort; a fresh hand means a fresh table.
    pub fn abort_hand(&mut self, reason: &str) {
        log::warn!("hand aborted: {reason}");
        self.circle = None;
        self.registry.set_active(None);
        self.phase = Phase::Completed;
        let line = self.log.audit(format!("--- HAND ABORTED: {reason} ---"));
        self.events.push_back(GameEvent::AuditLine(line));
        self.log_full_reveal();
        self.events.push_back(GameEvent::HandAborted {
            reason: reason.to_string(),
        });
        self.events.push_back(GameEvent::StateChanged);
    }

    fn player_name(&self, id: PlayerId) -> String {
        self.registry
            .get(id)
            .map_or_else(|| "??".to_string(), |player| player.name.clone())
    }
}

fn dump_slots(slots: &[CardSlot]) -> (String, String) {
    let ids: Vec<String> = slots.iter().map(|slot| slot.id.to_string()).collect();
    let values: Vec<String> = slots.iter().map(|slot| slot.ciphertext.to_string()).collect();
    (ids.join(", "), values.join(", "))
}
