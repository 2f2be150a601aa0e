use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::constants;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Spade,
    Heart,
    Diamond,
    Club,
}

impl Suit {
    pub const ALL: [Self; 4] = [Self::Spade, Self::Heart, Self::Diamond, Self::Club];
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Spade => "♠",
            Self::Heart => "♥",
            Self::Diamond => "♦",
            Self::Club => "♣",
        };
        write!(f, "{repr}")
    }
}

/// Placeholder for card values (2u8 ... ace=14u8).
pub type Value = u8;

/// A card identity is a tuple of a uInt8 value and a suit.
/// Identities live in the dealer-private identity map and are only
/// written to the audit log or revealed at protocol reveal points.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card(pub Value, pub Suit);

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            14 => write!(f, "A{}", self.1),
            13 => write!(f, "K{}", self.1),
            12 => write!(f, "Q{}", self.1),
            11 => write!(f, "J{}", self.1),
            v => write!(f, "{v}{}", self.1),
        }
    }
}

/// A card slot's secret identity index (0..=51). Never serialized into
/// any outbound projection; only the audit log may resolve it.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct CardId(pub u8);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

/// Opaque ciphertext blob. Encoding and semantics belong entirely to the
/// peers; the core only moves, compares, and logs it. Stored as decimal
/// text so peer key sizes never constrain the server.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Ciphertext(pub String);

impl Ciphertext {
    /// The un-encrypted numeric encoding of a slot, used before the
    /// encryption circle has run: `100 + id`.
    #[must_use]
    pub fn placeholder(id: CardId) -> Self {
        Self((constants::CARD_NUMERIC_BASE + u64::from(id.0)).to_string())
    }
}

impl fmt::Display for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One physical card slot as it moves between deck, hands, and table.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct CardSlot {
    pub id: CardId,
    #[serde(rename = "encrypted_value")]
    pub ciphertext: Ciphertext,
}

impl CardSlot {
    #[must_use]
    pub fn new(id: CardId) -> Self {
        Self {
            ciphertext: Ciphertext::placeholder(id),
            id,
        }
    }
}

/// Session identifier, stable for the connection's lifetime.
pub type PlayerId = Uuid;

/// A seated player. Owned by the session registry; created on join,
/// removed on disconnect.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// 0-2 entries once hole cards are dealt.
    pub hand: Vec<CardSlot>,
    /// True while this player is the expected next actor in a circle.
    pub active: bool,
}

impl Player {
    #[must_use]
    pub fn new(id: PlayerId, name: String) -> Self {
        Self {
            id,
            name,
            hand: Vec::with_capacity(constants::HOLE_CARDS),
            active: false,
        }
    }
}

/// Game-level phase. `Waiting` is initial, `Completed` terminal.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Waiting,
    KeyExchange,
    Encryption,
    DecryptionPrivate,
    Flop,
    Turn,
    River,
    Showdown,
    Completed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Waiting => "waiting",
            Self::KeyExchange => "key_exchange",
            Self::Encryption => "encryption",
            Self::DecryptionPrivate => "decryption_private",
            Self::Flop => "flop",
            Self::Turn => "turn",
            Self::River => "river",
            Self::Showdown => "showdown",
            Self::Completed => "completed",
        };
        write!(f, "{repr}")
    }
}

/// Which turn circle is currently running (the processing sub-phase).
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircleMode {
    Encryption,
    DecryptionPrivate,
    DecryptionTable,
}

impl fmt::Display for CircleMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Encryption => "encryption",
            Self::DecryptionPrivate => "decryption_private",
            Self::DecryptionTable => "decryption_table",
        };
        write!(f, "{repr}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_display() {
        assert_eq!(Card(14, Suit::Spade).to_string(), "A♠");
        assert_eq!(Card(10, Suit::Heart).to_string(), "10♥");
        assert_eq!(Card(2, Suit::Club).to_string(), "2♣");
        assert_eq!(Card(11, Suit::Diamond).to_string(), "J♦");
    }

    #[test]
    fn test_placeholder_ciphertext_is_numeric_encoding() {
        assert_eq!(Ciphertext::placeholder(CardId(0)).0, "100");
        assert_eq!(Ciphertext::placeholder(CardId(51)).0, "151");
    }

    #[test]
    fn test_card_slot_serializes_ciphertext_as_encrypted_value() {
        let slot = CardSlot::new(CardId(7));
        let json = serde_json::to_value(&slot).unwrap();
        assert_eq!(json["encrypted_value"], "107");
        assert_eq!(json["id"], 7);
    }

    #[test]
    fn test_phase_display_matches_wire_names() {
        assert_eq!(Phase::KeyExchange.to_string(), "key_exchange");
        assert_eq!(Phase::DecryptionPrivate.to_string(), "decryption_private");
        let json = serde_json::to_value(Phase::Waiting).unwrap();
        assert_eq!(json, "waiting");
    }
}
