//! Blackjack game engine - round FSM and scoring.
//!
//! This module provides the authoritative game implementation including:
//! - Cards, decks, hands, and per-connection session bookkeeping
//! - Fixed-ace hand evaluation and outcome resolution
//! - An explicit round state machine shared by the dealer and the wire layer

pub mod constants;
pub mod entities;
pub mod functional;
pub mod state_machine;
pub mod states;

pub use state_machine::{Round, RoundError, RoundEvent};
pub use states::{RoundPhase, ViewPhase};
