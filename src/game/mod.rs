//! Mental-poker game core.
//!
//! This module provides the dealer-less card game orchestration:
//! - Seat membership and the fixed player rotation ([`session`])
//! - The 52-slot deck and the dealer-private identity map ([`deck`])
//! - Turn circles: the one-active-peer sequencing primitive ([`circle`])
//! - The phase state machine and event queue ([`state`])
//! - Post-game key audit ([`audit`])
//! - Per-viewer state projection ([`projection`])
//! - The ground-truth game log ([`log`])
//!
//! The core never performs cryptography on card values: encryption and
//! decryption happen peer-side under a commutative cipher, and this
//! module only orders the peers, checks structural preservation of the
//! deck, and keeps card identities secret until the protocol's reveal
//! points.

pub mod audit;
pub mod circle;
pub mod constants;
pub mod deck;
pub mod entities;
pub mod log;
pub mod prime;
pub mod projection;
pub mod session;
pub mod state;

pub use audit::{KeyAudit, KeyAuditRecord};
pub use circle::{CircleOutcome, TurnCircle};
pub use deck::DeckManager;
pub use entities::{
    Card, CardId, CardSlot, Ciphertext, CircleMode, Phase, Player, PlayerId, Suit,
};
pub use log::GameLog;
pub use projection::{GameSnapshot, PlayerSnapshot, ProjectedCard, project};
pub use session::SessionRegistry;
pub use state::{GameEvent, GameSettings, GameState, ProtocolError, TableCard};
