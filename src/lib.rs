//! # Mental Poker
//!
//! A dealer-less poker table orchestrator built on commutative
//! encryption ("mental poker"). The crate coordinates an ordered set of
//! untrusted peers through the protocol's three circles: shuffle
//! encryption over the whole deck, private-hand decryption that
//! excludes each hand's owner, and public table decryption. Every
//! card's identity stays secret until its reveal point, and the whole
//! hand is recorded in a ground-truth audit trail.
//!
//! The cryptographic primitive itself is peer-side and opaque to this
//! crate: the server never encrypts, decrypts, inverts, or forges a
//! ciphertext. What it does enforce is ordering (exactly one active
//! peer at a time, in a fixed rotation), structural preservation of the
//! deck through every submission, and strict per-viewer filtering of
//! projected state.
//!
//! ## Core Modules
//!
//! - [`game`]: session registry, deck, turn circles, phase state
//!   machine, key audit, projection, and the game log
//! - [`net`]: the JSON message protocol spoken with players
//! - [`table`]: one actor task per table, with a manager keyed by
//!   table id
//!
//! ## Example
//!
//! ```
//! use mental_poker::{GameSettings, GameState};
//!
//! let mut game = GameState::new(GameSettings::default());
//! let alice = game.add_player("alice").unwrap();
//! let bob = game.add_player("bob").unwrap();
//!
//! // Only the leader (first in join order) can advance the phase.
//! assert!(!game.next_phase(bob));
//! assert!(game.next_phase(alice));
//! ```

/// Core game logic, entities, and state machine.
pub mod game;
pub use game::{
    CardSlot, CircleMode, GameEvent, GameSettings, GameSnapshot, GameState, Phase, PlayerId,
    ProtocolError, constants,
};

/// Wire protocol for client-server communication.
pub mod net;
pub use net::{ClientMessage, DecryptionPhase, ServerEvent};

/// Table actors and the table registry.
pub mod table;
pub use table::{TableConfig, TableHandle, TableManager};
