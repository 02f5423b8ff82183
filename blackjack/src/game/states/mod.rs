//! Phase definitions for the round FSM and its client-side mirror.
//!
//! Each phase represents a specific point in a round's lifecycle.

use std::fmt;

/// Dealer-side phases of a single round.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RoundPhase {
    /// Two cards each have been drawn; nothing has been sent yet.
    Dealt,
    /// The player's cards and the dealer's face-up card are out.
    DealerVisibleShown,
    /// Waiting on the player to hit or stand.
    PlayerTurn,
    /// The player stood; the dealer reveals and draws.
    DealerTurn,
    /// The outcome has been emitted.
    Resolved,
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Dealt => "dealt",
            Self::DealerVisibleShown => "dealer visible shown",
            Self::PlayerTurn => "player turn",
            Self::DealerTurn => "dealer turn",
            Self::Resolved => "resolved",
        };
        write!(f, "{repr}")
    }
}

/// Client-side phases, inferred from the order of card payloads.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum ViewPhase {
    /// The next cards are the player's opening two.
    #[default]
    InitialDeal,
    /// The next card is the dealer's face-up card.
    AwaitingUpCard,
    /// Cards are the player's hits.
    PlayerTurn,
    /// The player stood or busted; any further cards are the dealer's.
    DealerTurn,
}
