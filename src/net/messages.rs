//! JSON message protocol between players and the table server.
//!
//! Inbound frames are [`ClientMessage`]; everything the server pushes is
//! a [`ServerEvent`]. Both are internally tagged on `type`. Circle
//! payloads (`encrypt_cards` / `decrypt_cards` and their responses)
//! carry slot ids so submissions can be checked for structural
//! preservation; the broadcast `game_state` snapshot never does.

use serde::{Deserialize, Deserializer, Serialize, de};

use crate::game::{CardSlot, CircleMode, GameSnapshot, PlayerId};

/// Which decryption circle a `decrypted_cards` frame belongs to.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DecryptionPhase {
    Private,
    Table,
}

impl From<DecryptionPhase> for CircleMode {
    fn from(phase: DecryptionPhase) -> Self {
        match phase {
            DecryptionPhase::Private => Self::DecryptionPrivate,
            DecryptionPhase::Table => Self::DecryptionTable,
        }
    }
}

impl TryFrom<CircleMode> for DecryptionPhase {
    type Error = ();

    fn try_from(mode: CircleMode) -> Result<Self, ()> {
        match mode {
            CircleMode::DecryptionPrivate => Ok(Self::Private),
            CircleMode::DecryptionTable => Ok(Self::Table),
            CircleMode::Encryption => Err(()),
        }
    }
}

/// Audit keys arrive from heterogeneous clients as JSON numbers or
/// decimal strings; anything else is rejected locally at parse time.
fn key_from_number_or_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom("key must be a non-negative integer")),
    }
}

/// Player-to-server frames.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Implicit on connect.
    Join { name: String },
    NextPhase,
    /// Full deck payload during the encryption circle.
    EncryptedCards { cards: Vec<CardSlot> },
    DecryptedCards {
        cards: Vec<CardSlot>,
        phase: DecryptionPhase,
    },
    SubmitKeys {
        #[serde(deserialize_with = "key_from_number_or_string")]
        key_c: u64,
        #[serde(deserialize_with = "key_from_number_or_string")]
        key_d: u64,
    },
}

/// Server-to-player frames. Everything state-shaped is derived from the
/// projector; nothing here ever carries a secret slot id except the
/// circle payloads addressed to a single actor.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    JoinSuccess {
        player_id: PlayerId,
        player_name: String,
        message: String,
    },
    RoomFull {
        message: String,
    },
    PlayerJoined {
        player_id: PlayerId,
        player_name: String,
    },
    PlayerLeft {
        player_id: PlayerId,
        player_name: String,
    },
    GameState {
        #[serde(flatten)]
        state: GameSnapshot,
    },
    ReceivePrime {
        p: u64,
        q: u64,
    },
    EncryptCards {
        cards: Vec<CardSlot>,
        player_index: usize,
    },
    DecryptCards {
        cards: Vec<CardSlot>,
        phase: DecryptionPhase,
    },
    FinalPrivateDecryption {
        cards: Vec<CardSlot>,
    },
    RequestKeys,
    GameCompleted,
    HandAborted {
        reason: String,
    },
    LogUpdate {
        log: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_tagging() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type": "join", "name": "alice"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Join {
                name: "alice".to_string()
            }
        );
        let msg: ClientMessage = serde_json::from_str(r#"{"type": "next_phase"}"#).unwrap();
        assert_eq!(msg, ClientMessage::NextPhase);
    }

    #[test]
    fn test_decrypted_cards_phase_values() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"type": "decrypted_cards", "cards": [{"id": 3, "encrypted_value": "42"}], "phase": "private"}"#,
        )
        .unwrap();
        match msg {
            ClientMessage::DecryptedCards { cards, phase } => {
                assert_eq!(cards.len(), 1);
                assert_eq!(phase, DecryptionPhase::Private);
                assert_eq!(CircleMode::from(phase), CircleMode::DecryptionPrivate);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_submit_keys_accepts_numbers_and_strings() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"type": "submit_keys", "key_c": 12345, "key_d": "67891"}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            ClientMessage::SubmitKeys {
                key_c: 12345,
                key_d: 67891
            }
        );
    }

    #[test]
    fn test_submit_keys_rejects_non_integers() {
        let result: Result<ClientMessage, _> = serde_json::from_str(
            r#"{"type": "submit_keys", "key_c": "not-a-number", "key_d": 1}"#,
        );
        assert!(result.is_err());
        let result: Result<ClientMessage, _> =
            serde_json::from_str(r#"{"type": "submit_keys", "key_c": 1.5, "key_d": 1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_server_event_wire_names() {
        let event = ServerEvent::ReceivePrime { p: 23, q: 11 };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "receive_prime");
        assert_eq!(json["p"], 23);

        let event = ServerEvent::RequestKeys;
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "request_keys");
    }
}
