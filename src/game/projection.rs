//! Per-viewer state projection.
//!
//! The one place outbound state is shaped, and the privacy boundary of
//! the whole protocol: a secret slot id never crosses it, and a viewer
//! only ever sees card detail for their own hand. Pure and
//! side-effect-free; the table actor re-runs it for every seated player
//! after each accepted mutation and on every membership change.

use serde::{Deserialize, Serialize};

use super::entities::{CircleMode, Phase, PlayerId};
use super::state::GameState;

/// A card as one particular viewer is allowed to see it.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProjectedCard {
    /// Ciphertext (and, for revealed table cards, the resolved face).
    /// Carries no slot id.
    InPlay {
        encrypted_value: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    /// Somebody else's card: an opaque placeholder with no positional
    /// or value information.
    Hidden { encrypted: bool },
}

impl ProjectedCard {
    fn hidden() -> Self {
        Self::Hidden { encrypted: true }
    }
}

/// One seated player as seen by a particular viewer.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PlayerSnapshot {
    pub player_id: PlayerId,
    pub name: String,
    pub active: bool,
    pub cards: Vec<ProjectedCard>,
}

/// The filtered game state broadcast to a single viewer.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GameSnapshot {
    pub phase: Phase,
    pub table_cards: Vec<ProjectedCard>,
    pub deck_size: usize,
    pub player_order: Vec<PlayerId>,
    pub processing_phase: Option<CircleMode>,
    pub players: Vec<PlayerSnapshot>,
    pub your_player_id: Option<PlayerId>,
}

/// Build `viewer`'s snapshot of the game.
#[must_use]
pub fn project(state: &GameState, viewer: Option<PlayerId>) -> GameSnapshot {
    let table_cards = state
        .table_cards()
        .iter()
        .map(|card| ProjectedCard::InPlay {
            encrypted_value: card.slot.ciphertext.to_string(),
            value: card.identity.map(|identity| identity.to_string()),
        })
        .collect();

    let players = state
        .registry()
        .iter()
        .map(|player| {
            let cards = if Some(player.id) == viewer {
                player
                    .hand
                    .iter()
                    .map(|slot| ProjectedCard::InPlay {
                        encrypted_value: slot.ciphertext.to_string(),
                        value: None,
                    })
                    .collect()
            } else {
                vec![ProjectedCard::hidden(); player.hand.len()]
            };
            PlayerSnapshot {
                player_id: player.id,
                name: player.name.clone(),
                active: player.active,
                cards,
            }
        })
        .collect();

    GameSnapshot {
        phase: state.phase(),
        table_cards,
        deck_size: state.deck_size(),
        player_order: state.player_order().to_vec(),
        processing_phase: state.processing_phase(),
        players,
        your_player_id: viewer,
    }
}
