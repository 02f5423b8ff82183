//! Blackjack round state machine.
//!
//! A [`Round`] owns its deck and both hands. Every call to
//! [`Round::advance`] performs exactly one phase transition and returns
//! the events the transition produced, in the order they must reach the
//! player. The wire layer turns each event into one server payload.

use log::debug;
use thiserror::Error;

use super::{
    entities::{Card, Decision, Deck, DeckError, Hand, Outcome},
    functional::{dealer_should_hit, resolve},
    states::RoundPhase,
};

/// Errors that can occur while driving a round.
#[derive(Debug, Eq, Error, PartialEq)]
pub enum RoundError {
    #[error("player decision required")]
    DecisionRequired,
    #[error("round already resolved")]
    AlreadyResolved,
    #[error(transparent)]
    Deck(#[from] DeckError),
}

/// Something the player needs to hear about.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RoundEvent {
    PlayerCard(Card),
    DealerCard(Card),
    Finished(Outcome),
}

/// One deal-through-resolution cycle.
#[derive(Debug)]
pub struct Round {
    deck: Deck,
    player: Hand,
    /// First card is face-up, second is the hole card.
    dealer: Hand,
    phase: RoundPhase,
    outcome: Option<Outcome>,
}

impl Round {
    /// Deal two cards to the player and two to the dealer.
    ///
    /// # Errors
    ///
    /// Returns an error if the deck runs out, which can't happen with a
    /// fresh deck.
    pub fn deal(mut deck: Deck) -> Result<Self, RoundError> {
        let mut player = Hand::new();
        let mut dealer = Hand::new();
        player.push(deck.deal_card()?);
        player.push(deck.deal_card()?);
        dealer.push(deck.deal_card()?);
        dealer.push(deck.deal_card()?);
        Ok(Self {
            deck,
            player,
            dealer,
            phase: RoundPhase::Dealt,
            outcome: None,
        })
    }

    /// Perform the next transition.
    ///
    /// `decision` is only read during [`RoundPhase::PlayerTurn`]; it's
    /// ignored everywhere else.
    ///
    /// # Errors
    ///
    /// - [`RoundError::DecisionRequired`] if it's the player's turn and no
    ///   decision was given.
    /// - [`RoundError::AlreadyResolved`] if the round is over.
    /// - [`RoundError::Deck`] if the deck runs out.
    pub fn advance(&mut self, decision: Option<Decision>) -> Result<Vec<RoundEvent>, RoundError> {
        match self.phase {
            RoundPhase::Dealt => {
                let mut events: Vec<RoundEvent> = self
                    .player
                    .cards()
                    .iter()
                    .copied()
                    .map(RoundEvent::PlayerCard)
                    .collect();
                events.push(RoundEvent::DealerCard(self.dealer.cards()[0]));
                self.phase = RoundPhase::DealerVisibleShown;
                Ok(events)
            }
            RoundPhase::DealerVisibleShown => {
                if self.player.is_bust() {
                    Ok(vec![self.finish()])
                } else {
                    self.phase = RoundPhase::PlayerTurn;
                    Ok(Vec::new())
                }
            }
            RoundPhase::PlayerTurn => match decision.ok_or(RoundError::DecisionRequired)? {
                Decision::Stand => {
                    self.phase = RoundPhase::DealerTurn;
                    Ok(Vec::new())
                }
                Decision::Hit => {
                    let card = self.deck.deal_card()?;
                    self.player.push(card);
                    debug!("player draws {card}, hand {}", self.player);
                    let mut events = vec![RoundEvent::PlayerCard(card)];
                    if self.player.is_bust() {
                        events.push(self.finish());
                    }
                    Ok(events)
                }
            },
            RoundPhase::DealerTurn => {
                let mut events = vec![RoundEvent::DealerCard(self.dealer.cards()[1])];
                while dealer_should_hit(self.dealer.value()) {
                    let card = self.deck.deal_card()?;
                    self.dealer.push(card);
                    debug!("dealer draws {card}, hand {}", self.dealer);
                    events.push(RoundEvent::DealerCard(card));
                }
                events.push(self.finish());
                Ok(events)
            }
            RoundPhase::Resolved => Err(RoundError::AlreadyResolved),
        }
    }

    fn finish(&mut self) -> RoundEvent {
        let outcome = resolve(
            self.player.value(),
            self.dealer.value(),
            self.player.is_bust(),
        );
        self.outcome = Some(outcome);
        self.phase = RoundPhase::Resolved;
        RoundEvent::Finished(outcome)
    }

    #[must_use]
    pub fn awaiting_decision(&self) -> bool {
        self.phase == RoundPhase::PlayerTurn
    }

    #[must_use]
    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    #[must_use]
    pub fn player_hand(&self) -> &Hand {
        &self.player
    }

    #[must_use]
    pub fn dealer_hand(&self) -> &Hand {
        &self.dealer
    }

    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }
}
