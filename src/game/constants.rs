//! Protocol constants.

/// Number of slots in a full deck.
pub const DECK_SIZE: usize = 52;

/// Hard cap on seated players per table.
pub const MAX_PLAYERS: usize = 5;

/// Minimum seated players before the leader may start a hand.
pub const MIN_PLAYERS: usize = 2;

/// Hole cards dealt to each player.
pub const HOLE_CARDS: usize = 2;

/// Offset added to a slot id to form its plaintext numeric encoding.
/// Keeps every encoding strictly above the id range so peers never see
/// a raw id on the wire.
pub const CARD_NUMERIC_BASE: u64 = 100;

/// Community cards dealt per street.
pub const FLOP_CARDS: usize = 3;
pub const TURN_CARDS: usize = 1;
pub const RIVER_CARDS: usize = 1;

/// Default bit length of the Sophie-Germain prime pair shared with the
/// players at game start.
pub const DEFAULT_PRIME_BITS: u32 = 32;
