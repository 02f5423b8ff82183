//! Internal modules for the blackjack client.
//!
//! This library provides input parsing and the console player used by the
//! bj_client binary.

pub mod commands;
pub mod console;
