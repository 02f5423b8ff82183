//! Hand evaluation and outcome resolution.
//!
//! Shared by the dealer and the client mirror.

use super::{
    constants::{ACE_VALUE, BLACKJACK, DEALER_STAND_VALUE, FACE_VALUE},
    entities::{Card, Outcome},
};

/// Points a single card contributes. Aces are fixed at 11.
#[must_use]
pub fn card_value(card: &Card) -> u32 {
    match card.0 {
        1 => ACE_VALUE,
        v if u32::from(v) >= FACE_VALUE => FACE_VALUE,
        v => u32::from(v),
    }
}

/// Sum of card values. Order doesn't matter and aces are never reduced.
#[must_use]
pub fn hand_value(cards: &[Card]) -> u32 {
    cards.iter().map(card_value).sum()
}

#[must_use]
pub const fn is_bust(value: u32) -> bool {
    value > BLACKJACK
}

#[must_use]
pub const fn dealer_should_hit(value: u32) -> bool {
    value < DEALER_STAND_VALUE
}

/// Decide a round from the player's point of view.
#[must_use]
pub fn resolve(player_value: u32, dealer_value: u32, player_bust: bool) -> Outcome {
    if player_bust {
        Outcome::Loss
    } else if is_bust(dealer_value) {
        Outcome::Win
    } else if player_value > dealer_value {
        Outcome::Win
    } else if dealer_value > player_value {
        Outcome::Loss
    } else {
        Outcome::Tie
    }
}
