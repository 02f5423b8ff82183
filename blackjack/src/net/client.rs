//! Player side of the protocol.
//!
//! The client never sees the round state machine; it infers where the
//! round is from the order of card payloads, tracked by [`PlayerView`].
//! Everything a human would see or type goes through [`PlayerInterface`].

use anyhow::{Error, bail};
use log::{debug, info};
use std::{
    io::{Read, Write},
    net::{SocketAddr, TcpStream},
    num::NonZeroU8,
    thread,
    time::Duration,
};

use super::{
    errors::Result,
    messages::{ClientDecision, Payload, Request, ServerPayload},
    utils,
};
use crate::game::{
    ViewPhase,
    constants::{DEALER_STAND_VALUE, INITIAL_HAND_SIZE},
    entities::{Card, Decision, Hand, Outcome, Session},
};

/// Something the player should be shown.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ClientEvent {
    PlayerCard { card: Card, hand_value: u32 },
    DealerUpCard(Card),
    DealerCard { card: Card, hand_value: u32 },
    /// The player's hand went over 21 with this value.
    Busted(u32),
    RoundFinished { round: u8, outcome: Outcome },
}

/// The human I/O boundary.
pub trait PlayerInterface {
    /// Block until the player chooses what to do with `hand`.
    fn decide(&mut self, hand: &Hand) -> Decision;

    fn on_event(&mut self, _event: &ClientEvent) {}
}

/// Hits below `stand_at`, stands otherwise.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ThresholdPlayer {
    pub stand_at: u32,
}

impl Default for ThresholdPlayer {
    fn default() -> Self {
        Self {
            stand_at: DEALER_STAND_VALUE,
        }
    }
}

impl PlayerInterface for ThresholdPlayer {
    fn decide(&mut self, hand: &Hand) -> Decision {
        if hand.value() < self.stand_at {
            Decision::Hit
        } else {
            Decision::Stand
        }
    }
}

/// The player's picture of the current round.
#[derive(Clone, Debug, Default)]
pub struct PlayerView {
    phase: ViewPhase,
    hand: Hand,
    dealer: Hand,
}

impl PlayerView {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a dealt card according to the current phase.
    pub fn receive_card(&mut self, card: Card) -> ClientEvent {
        match self.phase {
            ViewPhase::InitialDeal => {
                self.hand.push(card);
                if self.hand.len() == INITIAL_HAND_SIZE {
                    self.phase = ViewPhase::AwaitingUpCard;
                }
                ClientEvent::PlayerCard {
                    card,
                    hand_value: self.hand.value(),
                }
            }
            ViewPhase::AwaitingUpCard => {
                self.dealer.push(card);
                self.phase = ViewPhase::PlayerTurn;
                ClientEvent::DealerUpCard(card)
            }
            ViewPhase::PlayerTurn => {
                self.hand.push(card);
                ClientEvent::PlayerCard {
                    card,
                    hand_value: self.hand.value(),
                }
            }
            ViewPhase::DealerTurn => {
                self.dealer.push(card);
                ClientEvent::DealerCard {
                    card,
                    hand_value: self.dealer.value(),
                }
            }
        }
    }

    /// Returns the decision to send, if the player has one to make.
    ///
    /// A busted hand ends the turn without a decision; the server already
    /// knows.
    pub fn take_turn<P: PlayerInterface + ?Sized>(&mut self, player: &mut P) -> Option<Decision> {
        if self.phase != ViewPhase::PlayerTurn {
            return None;
        }
        if self.hand.is_bust() {
            self.phase = ViewPhase::DealerTurn;
            player.on_event(&ClientEvent::Busted(self.hand.value()));
            return None;
        }
        let decision = player.decide(&self.hand);
        if decision == Decision::Stand {
            self.phase = ViewPhase::DealerTurn;
        }
        Some(decision)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn phase(&self) -> ViewPhase {
        self.phase
    }

    #[must_use]
    pub fn hand(&self) -> &Hand {
        &self.hand
    }

    #[must_use]
    pub fn dealer_hand(&self) -> &Hand {
        &self.dealer
    }
}

/// Play `rounds` rounds on an already-established session.
///
/// # Errors
///
/// Returns an error if the server disconnects or idles out, or sends a
/// payload that doesn't decode.
pub fn play_rounds<S, P>(
    stream: &mut S,
    name: &str,
    rounds: NonZeroU8,
    player: &mut P,
) -> Result<Session>
where
    S: Read + Write,
    P: PlayerInterface + ?Sized,
{
    let mut session = Session::new(name, rounds);
    let mut view = PlayerView::new();
    while !session.is_complete() {
        let payload: ServerPayload = utils::read_message(stream)?;
        match payload.content()? {
            Payload::Card(card) => {
                player.on_event(&view.receive_card(card));
                if let Some(decision) = view.take_turn(player) {
                    debug!("{name} {decision} on {}", view.hand());
                    utils::write_message(stream, &ClientDecision { decision })?;
                }
            }
            Payload::Finished(outcome) => {
                session.record(outcome);
                player.on_event(&ClientEvent::RoundFinished {
                    round: session.rounds_played,
                    outcome,
                });
                view.reset();
            }
        }
    }
    info!("{session}");
    Ok(session)
}

/// A blocking TCP client for one session.
pub struct Client {
    pub name: String,
    pub rounds: NonZeroU8,
    pub stream: TcpStream,
}

impl Client {
    /// Connect and send the session request.
    ///
    /// Connecting is attempted three times with decreasing timeouts (1s,
    /// 500ms, 100ms).
    ///
    /// # Errors
    ///
    /// Returns an error if unable to connect or send the request.
    pub fn connect(
        addr: &SocketAddr,
        name: &str,
        rounds: NonZeroU8,
        idle_timeout: Duration,
    ) -> std::result::Result<Self, Error> {
        let name = utils::truncate_name(name).to_string();
        let mut connect_timeouts = vec![
            Duration::from_secs(1),
            Duration::from_millis(500),
            Duration::from_millis(100),
        ];
        while let Some(connect_timeout) = connect_timeouts.pop() {
            match TcpStream::connect_timeout(addr, connect_timeout) {
                Ok(mut stream) => {
                    stream.set_nodelay(true)?;
                    stream.set_read_timeout(Some(idle_timeout))?;
                    stream.set_write_timeout(Some(idle_timeout))?;
                    let request = Request {
                        rounds: rounds.get(),
                        player_name: name.clone(),
                    };
                    utils::write_message(&mut stream, &request)?;
                    info!("connected to {addr} as {name} for {rounds} rounds");
                    return Ok(Self {
                        name,
                        rounds,
                        stream,
                    });
                }
                Err(error) => {
                    debug!("connecting to {addr} failed: {error}");
                    thread::sleep(connect_timeout);
                }
            }
        }
        bail!("couldn't connect to {addr} as {name}")
    }

    /// Play every requested round.
    ///
    /// # Errors
    ///
    /// See [`play_rounds`].
    pub fn play<P: PlayerInterface + ?Sized>(&mut self, player: &mut P) -> Result<Session> {
        play_rounds(&mut self.stream, &self.name, self.rounds, player)
    }
}
