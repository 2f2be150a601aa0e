//! Table module providing multi-table support with an async actor model.
//!
//! This module implements:
//! - `TableActor`: async actor owning a single table's game state
//! - `TableManager`: registry spawning one actor per table id
//! - Message-based communication with tokio channels
//! - The per-step turn deadline that keeps a stalled player from
//!   deadlocking a circle
//!
//! ## Architecture
//!
//! Each table runs in a separate Tokio task with an mpsc message inbox.
//! All game-state mutation happens inside that task, one message at a
//! time, which gives the single-writer guarantee without locks. The
//! actor drains the state machine's event queue after every message and
//! fans the effects out: circle prompts to the one active player,
//! filtered snapshots to everyone, audit lines to the log sink.

pub mod actor;
pub mod config;
pub mod manager;
pub mod messages;

pub use actor::{TableActor, TableHandle};
pub use config::TableConfig;
pub use manager::TableManager;
pub use messages::{LogSink, MemorySink, TableId, TableMessage, TableResponse};
