//! Networking for the two protocol phases.
//!
//! Discovery runs over UDP broadcast; sessions run over TCP with the
//! fixed-layout messages in [`messages`]. The server uses `mio` to accept
//! connections and a thread per session.

/// Blocking TCP client and the player-side view of a round.
pub mod client;

/// Offer broadcasting and listening.
pub mod discovery;

/// Protocol and session errors.
pub mod errors;

/// Fixed-size wire messages.
pub mod messages;

/// Session controller and TCP acceptor.
pub mod server;

/// Message framing over streams and name field helpers.
pub mod utils;
