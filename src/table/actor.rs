//! Table actor with async message handling.
//!
//! One actor task owns one table's `GameState` and consumes an ordered
//! inbox, so every mutation is applied whole before the next message is
//! looked at: the single-writer model, with no locks. Side effects come
//! out of the state machine as events and are fanned out here to the
//! registered per-player channels and the audit log sink.

use std::collections::HashMap;

use tokio::{
    sync::mpsc,
    time::{Duration, Instant, interval},
};

use super::{
    config::TableConfig,
    messages::{LogSink, TableId, TableMessage, TableResponse},
};
use crate::game::{GameEvent, GameState, PlayerId, projection};
use crate::net::{ClientMessage, DecryptionPhase, ServerEvent};

/// Table actor handle for sending messages.
#[derive(Clone)]
pub struct TableHandle {
    sender: mpsc::Sender<TableMessage>,
    table_id: TableId,
}

impl TableHandle {
    /// Create a new table handle
    pub fn new(sender: mpsc::Sender<TableMessage>, table_id: TableId) -> Self {
        Self { sender, table_id }
    }

    /// Get table ID
    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    /// Send a message to the table
    pub async fn send(&self, message: TableMessage) -> Result<(), String> {
        self.sender
            .send(message)
            .await
            .map_err(|_| "Table is closed".to_string())
    }
}

/// Table actor managing a single mental-poker table.
pub struct TableActor {
    /// Table ID
    id: TableId,

    /// Table configuration
    config: TableConfig,

    /// Game state (single writer: this task)
    state: GameState,

    /// Message inbox
    inbox: mpsc::Receiver<TableMessage>,

    /// Outbound event channel per seated player
    connections: HashMap<PlayerId, mpsc::Sender<ServerEvent>>,

    /// Where ground-truth audit lines go (file writer outside the crate)
    sink: Box<dyn LogSink>,

    /// Armed while a circle waits on an active player; expiry aborts the
    /// hand instead of deadlocking the table
    deadline: Option<(PlayerId, Instant)>,

    /// Is table closed
    is_closed: bool,
}

impl TableActor {
    /// Create a new table actor and its handle.
    pub fn new(
        id: TableId,
        config: TableConfig,
        sink: Box<dyn LogSink>,
    ) -> (Self, TableHandle) {
        let (sender, inbox) = mpsc::channel(100);
        let state = GameState::new(config.game_settings());

        let actor = Self {
            id,
            config,
            state,
            inbox,
            connections: HashMap::new(),
            sink,
            deadline: None,
            is_closed: false,
        };
        let handle = TableHandle::new(sender, id);
        (actor, handle)
    }

    /// Run the table actor event loop.
    pub async fn run(mut self) {
        log::info!("Table {} '{}' starting", self.id, self.config.name);

        let mut tick_interval = interval(Duration::from_secs(1));

        loop {
            tokio::select! {
                Some(message) = self.inbox.recv() => {
                    self.handle_message(message);
                    if self.is_closed {
                        break;
                    }
                }

                _ = tick_interval.tick() => {
                    self.check_deadline();
                }
            }
        }

        log::info!("Table {} '{}' closed", self.id, self.config.name);
    }

    fn handle_message(&mut self, message: TableMessage) {
        match message {
            TableMessage::Join { name, conn, response } => {
                let result = self.handle_join(&name, conn);
                let _ = response.send(result);
            }

            TableMessage::Leave { player_id, response } => {
                let result = self.handle_leave(player_id);
                let _ = response.send(result);
            }

            TableMessage::Client {
                player_id,
                message,
                response,
            } => {
                let result = self.handle_client(player_id, message);
                let _ = response.send(result);
            }

            TableMessage::GetSnapshot { viewer, response } => {
                let _ = response.send(projection::project(&self.state, viewer));
            }

            TableMessage::Close { response } => {
                self.is_closed = true;
                let _ = response.send(TableResponse::Success);
            }
        }
        self.dispatch_events();
        self.rearm_deadline();
    }

    fn handle_join(
        &mut self,
        name: &str,
        conn: mpsc::Sender<ServerEvent>,
    ) -> TableResponse {
        match self.state.add_player(name) {
            Ok(player_id) => {
                let _ = conn.try_send(ServerEvent::JoinSuccess {
                    player_id,
                    player_name: name.to_string(),
                    message: format!("welcome to '{}'", self.config.name),
                });
                self.connections.insert(player_id, conn);
                log::info!("Player '{name}' ({player_id}) joined table {}", self.id);
                TableResponse::Joined { player_id }
            }
            Err(err) => {
                let _ = conn.try_send(ServerEvent::RoomFull {
                    message: err.to_string(),
                });
                TableResponse::Rejected(err)
            }
        }
    }

    fn handle_leave(&mut self, player_id: PlayerId) -> TableResponse {
        self.connections.remove(&player_id);
        self.state.remove_player(player_id);
        if self.state.is_empty() {
            // Last seat emptied: the table tears itself down.
            self.is_closed = true;
            log::info!("Table {} empty, closing", self.id);
        }
        TableResponse::Success
    }

    fn handle_client(&mut self, player_id: PlayerId, message: ClientMessage) -> TableResponse {
        if !self.state.player_order().contains(&player_id) {
            return TableResponse::Rejected(crate::game::ProtocolError::NoSuchPlayer);
        }
        match message {
            ClientMessage::Join { .. } => {
                TableResponse::Error("already joined".to_string())
            }
            ClientMessage::NextPhase => {
                if self.state.next_phase(player_id) {
                    TableResponse::Success
                } else {
                    TableResponse::Ignored
                }
            }
            ClientMessage::EncryptedCards { cards } => {
                let result = self.state.submit_encrypted(player_id, cards);
                self.apply(result)
            }
            ClientMessage::DecryptedCards { cards, phase } => {
                let result = self.state.submit_decrypted(player_id, cards, phase.into());
                self.apply(result)
            }
            ClientMessage::SubmitKeys { key_c, key_d } => {
                let result = self.state.submit_keys(player_id, key_c, key_d);
                self.apply(result)
            }
        }
    }

    fn apply(&self, result: Result<(), crate::game::ProtocolError>) -> TableResponse {
        match result {
            Ok(()) => TableResponse::Success,
            Err(err) => {
                log::debug!("Table {}: rejected submission: {err}", self.id);
                TableResponse::Rejected(err)
            }
        }
    }

    /// Drain the state machine's event queue and deliver each effect.
    fn dispatch_events(&mut self) {
        for event in self.state.drain_events() {
            match event {
                GameEvent::PlayerJoined { id, name } => {
                    self.broadcast(&ServerEvent::PlayerJoined {
                        player_id: id,
                        player_name: name,
                    });
                }
                GameEvent::PlayerLeft { id, name } => {
                    self.broadcast(&ServerEvent::PlayerLeft {
                        player_id: id,
                        player_name: name,
                    });
                }
                GameEvent::PrimeShared { p, q } => {
                    self.broadcast(&ServerEvent::ReceivePrime { p, q });
                }
                GameEvent::EncryptRequest {
                    to,
                    cards,
                    player_index,
                } => {
                    self.send_to(to, ServerEvent::EncryptCards { cards, player_index });
                }
                GameEvent::DecryptRequest { to, cards, mode } => {
                    if let Ok(phase) = DecryptionPhase::try_from(mode) {
                        self.send_to(to, ServerEvent::DecryptCards { cards, phase });
                    }
                }
                GameEvent::FinalPrivateHand { to, cards } => {
                    // Private channel only; never broadcast.
                    self.send_to(to, ServerEvent::FinalPrivateDecryption { cards });
                }
                GameEvent::KeysRequested => {
                    self.broadcast(&ServerEvent::RequestKeys);
                }
                GameEvent::GameCompleted => {
                    self.broadcast(&ServerEvent::GameCompleted);
                }
                GameEvent::HandAborted { reason } => {
                    self.broadcast(&ServerEvent::HandAborted { reason });
                }
                GameEvent::AuditLine(line) => {
                    self.sink.append(&line);
                }
                GameEvent::LogBroadcast(line) => {
                    self.broadcast(&ServerEvent::LogUpdate { log: line });
                }
                GameEvent::StateChanged => {
                    self.push_snapshots();
                }
            }
        }
    }

    /// Re-project and push the filtered snapshot to every seated player.
    fn push_snapshots(&mut self) {
        let state = &self.state;
        self.connections.retain(|player_id, sender| {
            let snapshot = projection::project(state, Some(*player_id));
            match sender.try_send(ServerEvent::GameState { state: snapshot }) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    log::warn!("Player {player_id} channel full, dropping snapshot");
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    log::debug!("Player {player_id} disconnected, removing channel");
                    false
                }
            }
        });
    }

    fn broadcast(&mut self, event: &ServerEvent) {
        self.connections.retain(|player_id, sender| {
            match sender.try_send(event.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    log::warn!("Player {player_id} channel full, dropping event");
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    log::debug!("Player {player_id} disconnected, removing channel");
                    false
                }
            }
        });
    }

    fn send_to(&mut self, player_id: PlayerId, event: ServerEvent) {
        if let Some(sender) = self.connections.get(&player_id)
            && sender.try_send(event).is_err()
        {
            log::warn!("Failed to deliver event to player {player_id}");
        }
    }

    /// Arm, keep, or clear the per-step deadline depending on who (if
    /// anyone) the current circle is waiting on.
    fn rearm_deadline(&mut self) {
        match self.state.active_player() {
            None => self.deadline = None,
            Some(active) => {
                let changed = self.deadline.is_none_or(|(armed, _)| armed != active);
                if changed {
                    self.deadline = Some((active, Instant::now() + self.config.turn_deadline()));
                }
            }
        }
    }

    fn check_deadline(&mut self) {
        let Some((player_id, when)) = self.deadline else {
            return;
        };
        if Instant::now() < when {
            return;
        }
        log::warn!(
            "Table {}: active player {player_id} stalled past the turn deadline",
            self.id
        );
        self.deadline = None;
        self.state
            .abort_hand("active player stalled past the turn deadline");
        self.dispatch_events();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Phase;
    use crate::table::messages::MemorySink;
    use tokio::sync::oneshot;
    use uuid::Uuid;

    async fn spawn_table(config: TableConfig) -> TableHandle {
        let (actor, handle) = TableActor::new(Uuid::new_v4(), config, Box::new(MemorySink::default()));
        tokio::spawn(actor.run());
        handle
    }

    async fn join(
        handle: &TableHandle,
        name: &str,
    ) -> (PlayerId, mpsc::Receiver<ServerEvent>) {
        let (conn, events) = mpsc::channel(256);
        let (tx, rx) = oneshot::channel();
        handle
            .send(TableMessage::Join {
                name: name.to_string(),
                conn,
                response: tx,
            })
            .await
            .unwrap();
        match rx.await.unwrap() {
            TableResponse::Joined { player_id } => (player_id, events),
            other => panic!("join failed: {other:?}"),
        }
    }

    async fn client(
        handle: &TableHandle,
        player_id: PlayerId,
        message: ClientMessage,
    ) -> TableResponse {
        let (tx, rx) = oneshot::channel();
        handle
            .send(TableMessage::Client {
                player_id,
                message,
                response: tx,
            })
            .await
            .unwrap();
        rx.await.unwrap()
    }

    async fn snapshot(handle: &TableHandle, viewer: Option<PlayerId>) -> crate::game::GameSnapshot {
        let (tx, rx) = oneshot::channel();
        handle
            .send(TableMessage::GetSnapshot {
                viewer,
                response: tx,
            })
            .await
            .unwrap();
        rx.await.unwrap()
    }

    #[tokio::test]
    async fn test_join_capacity_and_snapshot() {
        let handle = spawn_table(TableConfig::default()).await;
        let (alice, _alice_events) = join(&handle, "alice").await;
        let (_bob, _bob_events) = join(&handle, "bob").await;

        let view = snapshot(&handle, Some(alice)).await;
        assert_eq!(view.phase, Phase::Waiting);
        assert_eq!(view.players.len(), 2);
        assert_eq!(view.your_player_id, Some(alice));
    }

    #[tokio::test]
    async fn test_non_leader_next_phase_is_ignored() {
        let handle = spawn_table(TableConfig::default()).await;
        let (_alice, _a) = join(&handle, "alice").await;
        let (bob, _b) = join(&handle, "bob").await;

        let response = client(&handle, bob, ClientMessage::NextPhase).await;
        assert_eq!(response, TableResponse::Ignored);
        let view = snapshot(&handle, Some(bob)).await;
        assert_eq!(view.phase, Phase::Waiting);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_active_player_aborts_instead_of_deadlocking() {
        let config = TableConfig {
            turn_deadline_secs: 30,
            ..TableConfig::default()
        };
        let handle = spawn_table(config).await;
        let (alice, mut alice_events) = join(&handle, "alice").await;
        let (_bob, _bob_events) = join(&handle, "bob").await;

        assert_eq!(
            client(&handle, alice, ClientMessage::NextPhase).await,
            TableResponse::Success
        );
        assert_eq!(
            client(&handle, alice, ClientMessage::NextPhase).await,
            TableResponse::Success
        );

        // Nobody submits; paused time auto-advances through the ticks
        // until the deadline fires and the hand aborts.
        loop {
            match alice_events.recv().await.expect("channel open") {
                ServerEvent::HandAborted { reason } => {
                    assert!(reason.contains("stalled"));
                    break;
                }
                _ => {}
            }
        }
        let view = snapshot(&handle, Some(alice)).await;
        assert_eq!(view.phase, Phase::Completed);
    }

    #[tokio::test]
    async fn test_last_leave_closes_table() {
        let handle = spawn_table(TableConfig::default()).await;
        let (alice, _a) = join(&handle, "alice").await;

        let (tx, rx) = oneshot::channel();
        handle
            .send(TableMessage::Leave {
                player_id: alice,
                response: tx,
            })
            .await
            .unwrap();
        assert_eq!(rx.await.unwrap(), TableResponse::Success);

        // The actor loop exits; a follow-up either fails to send or is
        // dropped unanswered when the inbox closes.
        let (tx, rx) = oneshot::channel();
        let sent = handle
            .send(TableMessage::GetSnapshot {
                viewer: None,
                response: tx,
            })
            .await;
        if sent.is_ok() {
            assert!(rx.await.is_err());
        }
    }
}
