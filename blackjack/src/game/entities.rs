use rand::{Rng, seq::SliceRandom};
use std::{fmt, num::NonZeroU8};
use thiserror::Error;

use super::{constants::DECK_SIZE, functional};

/// Card suits in wire order (hearts are 0, spades are 3).
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[repr(u8)]
pub enum Suit {
    Heart = 0,
    Diamond = 1,
    Club = 2,
    Spade = 3,
}

impl Suit {
    pub const ALL: [Self; 4] = [Self::Heart, Self::Diamond, Self::Club, Self::Spade];

    #[must_use]
    pub const fn to_wire(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub fn from_wire(value: u8) -> Option<Self> {
        Self::ALL.get(usize::from(value)).copied()
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Heart => "Hearts",
            Self::Diamond => "Diamonds",
            Self::Club => "Clubs",
            Self::Spade => "Spades",
        };
        write!(f, "{repr}")
    }
}

/// Placeholder for card ranks.
pub type Value = u8;

pub const ACE: Value = 1;
pub const JACK: Value = 11;
pub const QUEEN: Value = 12;
pub const KING: Value = 13;

/// A card is a tuple of a uInt8 rank (ace=1u8 ... king=13u8) and a suit.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Card(pub Value, pub Suit);

impl Card {
    #[must_use]
    pub const fn is_ace(&self) -> bool {
        self.0 == ACE
    }

    /// Build a card from its wire fields, rejecting anything outside
    /// rank 1..=13 and suit 0..=3.
    #[must_use]
    pub fn from_wire(rank: u16, suit: u8) -> Option<Self> {
        let rank = Value::try_from(rank).ok().filter(|r| (ACE..=KING).contains(r))?;
        Some(Self(rank, Suit::from_wire(suit)?))
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let value = match self.0 {
            ACE => "Ace",
            JACK => "Jack",
            QUEEN => "Queen",
            KING => "King",
            v => &v.to_string(),
        };
        write!(f, "{value} of {}", self.1)
    }
}

#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum DeckError {
    #[error("deck exhausted")]
    Exhausted,
    #[error("{0} stacked more than once")]
    DuplicateCard(Card),
    #[error("{0:?} isn't part of a standard deck")]
    UnknownCard(Card),
}

/// A single 52-card deck. Cards are dealt from the front and the deck is
/// never replenished; a new round gets a new deck.
#[derive(Debug)]
pub struct Deck {
    cards: [Card; DECK_SIZE],
    deck_idx: usize,
}

impl Deck {
    /// A freshly shuffled deck.
    #[must_use]
    pub fn shuffled() -> Self {
        let mut deck = Self::default();
        deck.shuffle();
        deck
    }

    /// A deck that deals `top` first, followed by the remaining cards in
    /// their standard order. Handy for scripting rounds.
    ///
    /// # Errors
    ///
    /// Returns an error if `top` repeats a card or contains a card that
    /// isn't in a standard deck.
    pub fn stacked(top: &[Card]) -> Result<Self, DeckError> {
        let mut deck = Self::default();
        for (i, card) in top.iter().enumerate() {
            if top[..i].contains(card) {
                return Err(DeckError::DuplicateCard(*card));
            }
            let j = deck.cards[i..]
                .iter()
                .position(|c| c == card)
                .ok_or(DeckError::UnknownCard(*card))?;
            deck.cards[i..=i + j].rotate_right(1);
        }
        Ok(deck)
    }

    /// Removes and returns the next card.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::Exhausted`] once all 52 cards are dealt.
    pub fn deal_card(&mut self) -> Result<Card, DeckError> {
        let card = *self.cards.get(self.deck_idx).ok_or(DeckError::Exhausted)?;
        self.deck_idx += 1;
        Ok(card)
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        DECK_SIZE - self.deck_idx
    }

    pub fn shuffle(&mut self) {
        self.shuffle_with(&mut rand::rng());
    }

    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
        self.deck_idx = 0;
    }
}

impl Default for Deck {
    fn default() -> Self {
        let mut cards: [Card; DECK_SIZE] = [Card(ACE, Suit::Heart); DECK_SIZE];
        for (i, suit) in Suit::ALL.into_iter().enumerate() {
            for (j, value) in (ACE..=KING).enumerate() {
                cards[13 * i + j] = Card(value, suit);
            }
        }
        Self { cards, deck_idx: 0 }
    }
}

/// Cards held by one party, in deal order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Hand(Vec<Card>);

impl Hand {
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::with_capacity(4))
    }

    pub fn push(&mut self, card: Card) {
        self.0.push(card);
    }

    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn value(&self) -> u32 {
        functional::hand_value(&self.0)
    }

    #[must_use]
    pub fn is_bust(&self) -> bool {
        functional::is_bust(self.value())
    }
}

impl From<Vec<Card>> for Hand {
    fn from(value: Vec<Card>) -> Self {
        Self(value)
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = self
            .0
            .iter()
            .map(Card::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "[{repr}] ({})", self.value())
    }
}

/// What the player wants to do on their turn.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Decision {
    Hit,
    Stand,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Hit => "hits",
            Self::Stand => "stands",
        };
        write!(f, "{repr}")
    }
}

/// Round result from the player's point of view.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Outcome {
    Tie,
    Loss,
    Win,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Tie => "tie",
            Self::Loss => "loss",
            Self::Win => "win",
        };
        write!(f, "{repr}")
    }
}

/// Bookkeeping for one connection: who's playing, how many rounds they
/// asked for, and how those rounds went.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Session {
    pub name: String,
    pub requested_rounds: NonZeroU8,
    pub rounds_played: u8,
    pub wins: u8,
    pub losses: u8,
    pub ties: u8,
}

impl Session {
    #[must_use]
    pub fn new(name: impl Into<String>, requested_rounds: NonZeroU8) -> Self {
        Self {
            name: name.into(),
            requested_rounds,
            rounds_played: 0,
            wins: 0,
            losses: 0,
            ties: 0,
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.rounds_played >= self.requested_rounds.get()
    }

    /// Record a finished round. Rounds past the requested count are
    /// ignored.
    pub fn record(&mut self, outcome: Outcome) {
        if self.is_complete() {
            return;
        }
        self.rounds_played += 1;
        match outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
            Outcome::Tie => self.ties += 1,
        }
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} won {}/{} rounds ({} lost, {} tied)",
            self.name, self.wins, self.rounds_played, self.losses, self.ties
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use std::collections::HashSet;

    fn rounds(n: u8) -> NonZeroU8 {
        NonZeroU8::new(n).unwrap()
    }

    // === Card Tests ===

    #[test]
    fn test_card_display() {
        assert_eq!(Card(ACE, Suit::Heart).to_string(), "Ace of Hearts");
        assert_eq!(Card(10, Suit::Diamond).to_string(), "10 of Diamonds");
        assert_eq!(Card(JACK, Suit::Club).to_string(), "Jack of Clubs");
        assert_eq!(Card(KING, Suit::Spade).to_string(), "King of Spades");
    }

    #[test]
    fn test_card_from_wire() {
        assert_eq!(Card::from_wire(1, 0), Some(Card(ACE, Suit::Heart)));
        assert_eq!(Card::from_wire(13, 3), Some(Card(KING, Suit::Spade)));
        assert_eq!(Card::from_wire(0, 0), None);
        assert_eq!(Card::from_wire(14, 0), None);
        assert_eq!(Card::from_wire(256 + 1, 0), None);
        assert_eq!(Card::from_wire(5, 4), None);
    }

    #[test]
    fn test_suit_wire_order() {
        for (i, suit) in Suit::ALL.into_iter().enumerate() {
            assert_eq!(usize::from(suit.to_wire()), i);
            assert_eq!(Suit::from_wire(suit.to_wire()), Some(suit));
        }
    }

    // === Deck Tests ===

    #[test]
    fn test_deck_initialization() {
        let deck = Deck::default();
        assert_eq!(deck.remaining(), 52);
        let unique: HashSet<Card> = deck.cards.iter().copied().collect();
        assert_eq!(unique.len(), 52);
    }

    #[test]
    fn test_deck_deal_card() {
        let mut deck = Deck::default();
        let card = deck.deal_card().unwrap();
        assert_eq!(card, Card(ACE, Suit::Heart));
        assert_eq!(deck.remaining(), 51);
    }

    #[test]
    fn test_deck_exhausted() {
        let mut deck = Deck::shuffled();
        for _ in 0..52 {
            deck.deal_card().unwrap();
        }
        assert_eq!(deck.remaining(), 0);
        assert_eq!(deck.deal_card(), Err(DeckError::Exhausted));
    }

    #[test]
    fn test_deck_shuffle_with_seed_is_deterministic() {
        let mut a = Deck::default();
        let mut b = Deck::default();
        a.shuffle_with(&mut StdRng::seed_from_u64(7));
        b.shuffle_with(&mut StdRng::seed_from_u64(7));
        assert_eq!(a.cards, b.cards);
    }

    #[test]
    fn test_deck_shuffle_resets_index() {
        let mut deck = Deck::default();
        deck.deal_card().unwrap();
        deck.deal_card().unwrap();
        assert_eq!(deck.remaining(), 50);
        deck.shuffle();
        assert_eq!(deck.remaining(), 52);
    }

    #[test]
    fn test_stacked_deck_deals_top_first() {
        let top = [Card(ACE, Suit::Spade), Card(ACE, Suit::Heart), Card(7, Suit::Club)];
        let mut deck = Deck::stacked(&top).unwrap();
        for card in top {
            assert_eq!(deck.deal_card().unwrap(), card);
        }
        // The rest keeps its standard order, minus the stacked cards.
        assert_eq!(deck.deal_card().unwrap(), Card(2, Suit::Heart));
        let mut seen: HashSet<Card> = top.into_iter().collect();
        seen.insert(Card(2, Suit::Heart));
        while let Ok(card) = deck.deal_card() {
            assert!(seen.insert(card), "{card} dealt twice");
        }
        assert_eq!(seen.len(), 52);
    }

    #[test]
    fn test_stacked_deck_rejects_duplicates() {
        let top = [Card(5, Suit::Club), Card(5, Suit::Club)];
        assert_eq!(
            Deck::stacked(&top).unwrap_err(),
            DeckError::DuplicateCard(Card(5, Suit::Club))
        );
    }

    #[test]
    fn test_stacked_deck_rejects_unknown_cards() {
        let top = [Card(14, Suit::Club)];
        assert_eq!(
            Deck::stacked(&top).unwrap_err(),
            DeckError::UnknownCard(Card(14, Suit::Club))
        );
    }

    // === Hand Tests ===

    #[test]
    fn test_hand_push_and_value() {
        let mut hand = Hand::new();
        assert!(hand.is_empty());
        hand.push(Card(KING, Suit::Heart));
        hand.push(Card(9, Suit::Club));
        assert_eq!(hand.len(), 2);
        assert_eq!(hand.value(), 19);
        assert!(!hand.is_bust());
    }

    #[test]
    fn test_hand_two_aces_bust() {
        let hand = Hand::from(vec![Card(ACE, Suit::Heart), Card(ACE, Suit::Spade)]);
        assert_eq!(hand.value(), 22);
        assert!(hand.is_bust());
    }

    #[test]
    fn test_hand_display() {
        let hand = Hand::from(vec![Card(ACE, Suit::Heart), Card(QUEEN, Suit::Spade)]);
        assert_eq!(hand.to_string(), "[Ace of Hearts, Queen of Spades] (21)");
    }

    // === Session Tests ===

    #[test]
    fn test_session_records_outcomes() {
        let mut session = Session::new("alice", rounds(3));
        session.record(Outcome::Win);
        session.record(Outcome::Tie);
        assert!(!session.is_complete());
        session.record(Outcome::Loss);
        assert!(session.is_complete());
        assert_eq!(
            (session.rounds_played, session.wins, session.losses, session.ties),
            (3, 1, 1, 1)
        );
    }

    #[test]
    fn test_session_ignores_extra_rounds() {
        let mut session = Session::new("bob", rounds(1));
        session.record(Outcome::Win);
        session.record(Outcome::Win);
        assert_eq!(session.rounds_played, 1);
        assert_eq!(session.wins, 1);
    }

    #[test]
    fn test_session_display() {
        let mut session = Session::new("carol", rounds(2));
        session.record(Outcome::Win);
        session.record(Outcome::Loss);
        assert_eq!(session.to_string(), "carol won 1/2 rounds (1 lost, 0 tied)");
    }
}
