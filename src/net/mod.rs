//! Wire protocol types for client-server communication.
//!
//! Message delivery itself (sockets, reconnection) is out of scope for
//! this crate; the table actor speaks in these frames over whatever
//! channel the embedding server provides.

pub mod messages;

pub use messages::{ClientMessage, DecryptionPhase, ServerEvent};
