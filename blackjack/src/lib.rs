//! # Blackjack
//!
//! A two-phase blackjack protocol: servers advertise themselves with UDP
//! broadcast offers, then play a requested number of rounds with each
//! player over its own TCP connection.
//!
//! Every round is driven by an explicit state machine ([`game::Round`])
//! on the dealer side. The player side mirrors it from the order of the
//! payloads it receives ([`net::client::PlayerView`]).
//!
//! ## Core Modules
//!
//! - [`game`]: Cards, decks, hand values, and the round state machine
//! - [`net`]: Wire messages, discovery, the session controller, and client
//!
//! ## Example
//!
//! ```
//! use blackjack::{Deck, Round};
//!
//! let mut round = Round::deal(Deck::shuffled()).unwrap();
//! let opening = round.advance(None).unwrap();
//! assert_eq!(opening.len(), 3);
//! ```

/// Networking components for discovery and sessions.
pub mod net;
pub use net::{
    client::{Client, ClientEvent, PlayerInterface, ThresholdPlayer},
    discovery, errors, messages, server, utils,
};

/// Core game logic, entities, and state machine.
pub mod game;
pub use game::{
    Round, RoundError, RoundEvent,
    constants,
    entities::{self, Card, Decision, Deck, Hand, Outcome, Session, Suit},
    functional,
};
