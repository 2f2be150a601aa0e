//! Table actor message types.

use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::game::{GameSnapshot, PlayerId, ProtocolError};
use crate::net::ServerEvent;

/// Identifier for one table (one game room).
pub type TableId = Uuid;

/// Messages that can be sent to a `TableActor`.
#[derive(Debug)]
pub enum TableMessage {
    /// Seat a player and register their outbound event channel.
    Join {
        name: String,
        conn: mpsc::Sender<ServerEvent>,
        response: oneshot::Sender<TableResponse>,
    },

    /// Unseat a player (disconnect).
    Leave {
        player_id: PlayerId,
        response: oneshot::Sender<TableResponse>,
    },

    /// An inbound protocol frame from a seated player.
    Client {
        player_id: PlayerId,
        message: crate::net::ClientMessage,
        response: oneshot::Sender<TableResponse>,
    },

    /// Get the filtered snapshot for a viewer (None = spectator view).
    GetSnapshot {
        viewer: Option<PlayerId>,
        response: oneshot::Sender<GameSnapshot>,
    },

    /// Shut the table down.
    Close { response: oneshot::Sender<TableResponse> },
}

/// Replies from a `TableActor`.
#[derive(Debug, Eq, PartialEq)]
pub enum TableResponse {
    /// Join accepted; the assigned session id.
    Joined { player_id: PlayerId },

    /// Action accepted and applied.
    Success,

    /// Action was a no-op (e.g. non-leader phase advance).
    Ignored,

    /// Protocol violation; nothing changed.
    Rejected(ProtocolError),

    /// Transport-level failure.
    Error(String),
}

/// Receives the ordered, ground-truth audit lines of a hand. The file
/// writer lives outside this crate; tests use an in-memory sink.
pub trait LogSink: Send {
    fn append(&mut self, line: &str);
}

/// Default sink: keeps lines in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub lines: Vec<String>,
}

impl LogSink for MemorySink {
    fn append(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}
