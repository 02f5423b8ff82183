//! Scoring and table constants.

/// Highest hand value that isn't a bust.
pub const BLACKJACK: u32 = 21;

/// The dealer draws while below this value and stands at or above it.
pub const DEALER_STAND_VALUE: u32 = 17;

/// Aces are always worth 11. There's no soft-hand reduction, so two aces
/// are a bust.
pub const ACE_VALUE: u32 = 11;

/// Tens and face cards.
pub const FACE_VALUE: u32 = 10;

pub const DECK_SIZE: usize = 52;

/// Number of cards each party receives before the player's turn.
pub const INITIAL_HAND_SIZE: usize = 2;
