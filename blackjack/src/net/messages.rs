//! Fixed-layout wire messages.
//!
//! Every message starts with a 4-byte magic cookie and a 1-byte message
//! type, and all integers are big-endian. Sizes never vary, so receivers
//! read exactly [`WireMessage::SIZE`] bytes before decoding.
//!
//! | Message          | Layout                                          | Size |
//! |------------------|-------------------------------------------------|------|
//! | [`Offer`]          | magic, type, port `u16`, service name `[u8; 32]` | 39   |
//! | [`Request`]        | magic, type, rounds `u8`, player name `[u8; 32]` | 38   |
//! | [`ClientDecision`] | magic, type, `"Hittt"` or `"Stand"`              | 10   |
//! | [`ServerPayload`]  | magic, type, result `u8`, rank `u16`, suit `u8`  | 9    |

use std::fmt;

use super::{
    errors::ProtocolViolation,
    utils::{decode_name, encode_name},
};
use crate::game::{
    RoundEvent,
    entities::{Card, Decision, Outcome},
};

pub const MAGIC_COOKIE: u32 = 0xabcd_dcba;

/// Length of the NUL-padded name fields.
pub const NAME_LEN: usize = 32;

/// Magic cookie plus message type.
pub const HEADER_LEN: usize = 5;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum MessageType {
    Offer = 0x2,
    Request = 0x3,
    Payload = 0x4,
}

/// A message with a fixed size and type tag.
pub trait WireMessage: Sized {
    const KIND: MessageType;
    const SIZE: usize;

    /// Append everything after the header.
    fn encode_body(&self, buf: &mut Vec<u8>);

    /// Parse everything after the header. `body` is always exactly
    /// `SIZE - 5` bytes.
    fn decode_body(body: &[u8]) -> Result<Self, ProtocolViolation>;

    fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::SIZE);
        buf.extend_from_slice(&MAGIC_COOKIE.to_be_bytes());
        buf.push(Self::KIND as u8);
        self.encode_body(&mut buf);
        buf
    }

    /// # Errors
    ///
    /// Fails if the length, magic cookie, or message type is off, or if the
    /// body holds a value this protocol doesn't define.
    fn decode(buf: &[u8]) -> Result<Self, ProtocolViolation> {
        if buf.len() != Self::SIZE {
            return Err(ProtocolViolation::WrongSize {
                expected: Self::SIZE,
                actual: buf.len(),
            });
        }
        Self::check_header(&buf[..HEADER_LEN])?;
        Self::decode_body(&buf[HEADER_LEN..])
    }

    /// Check the magic cookie and message type on their own, before the
    /// body has arrived.
    ///
    /// # Errors
    ///
    /// Fails if `header` isn't [`HEADER_LEN`] bytes or belongs to another
    /// message.
    fn check_header(header: &[u8]) -> Result<(), ProtocolViolation> {
        let [m0, m1, m2, m3, kind] = header else {
            return Err(ProtocolViolation::WrongSize {
                expected: HEADER_LEN,
                actual: header.len(),
            });
        };
        let magic = u32::from_be_bytes([*m0, *m1, *m2, *m3]);
        if magic != MAGIC_COOKIE {
            return Err(ProtocolViolation::BadMagic(magic));
        }
        if *kind != Self::KIND as u8 {
            return Err(ProtocolViolation::WrongType {
                expected: Self::KIND as u8,
                actual: *kind,
            });
        }
        Ok(())
    }
}

/// Broadcast by a server to advertise where it accepts sessions.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Offer {
    pub port: u16,
    pub service_name: String,
}

impl WireMessage for Offer {
    const KIND: MessageType = MessageType::Offer;
    const SIZE: usize = HEADER_LEN + 2 + NAME_LEN;

    fn encode_body(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.port.to_be_bytes());
        buf.extend_from_slice(&encode_name(&self.service_name));
    }

    fn decode_body(body: &[u8]) -> Result<Self, ProtocolViolation> {
        Ok(Self {
            port: u16::from_be_bytes([body[0], body[1]]),
            service_name: decode_name(&body[2..]),
        })
    }
}

/// The first and only message a client sends before play starts.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Request {
    pub rounds: u8,
    pub player_name: String,
}

impl WireMessage for Request {
    const KIND: MessageType = MessageType::Request;
    const SIZE: usize = HEADER_LEN + 1 + NAME_LEN;

    fn encode_body(&self, buf: &mut Vec<u8>) {
        buf.push(self.rounds);
        buf.extend_from_slice(&encode_name(&self.player_name));
    }

    fn decode_body(body: &[u8]) -> Result<Self, ProtocolViolation> {
        Ok(Self {
            rounds: body[0],
            player_name: decode_name(&body[1..]),
        })
    }
}

/// The player's hit or stand.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ClientDecision {
    pub decision: Decision,
}

impl ClientDecision {
    pub const HIT: &'static [u8; 5] = b"Hittt";
    pub const STAND: &'static [u8; 5] = b"Stand";
}

impl WireMessage for ClientDecision {
    const KIND: MessageType = MessageType::Payload;
    const SIZE: usize = HEADER_LEN + 5;

    fn encode_body(&self, buf: &mut Vec<u8>) {
        let repr = match self.decision {
            Decision::Hit => Self::HIT,
            Decision::Stand => Self::STAND,
        };
        buf.extend_from_slice(repr);
    }

    fn decode_body(body: &[u8]) -> Result<Self, ProtocolViolation> {
        let decision = match body {
            b"Hittt" => Decision::Hit,
            b"Stand" => Decision::Stand,
            other => {
                return Err(ProtocolViolation::UnknownDecision(
                    String::from_utf8_lossy(other).into_owned(),
                ));
            }
        };
        Ok(Self { decision })
    }
}

impl From<Decision> for ClientDecision {
    fn from(decision: Decision) -> Self {
        Self { decision }
    }
}

/// Result byte of a [`ServerPayload`]. Anything but `RoundActive` ends the
/// round.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum ResultCode {
    RoundActive = 0,
    Tie = 1,
    Loss = 2,
    Win = 3,
}

impl ResultCode {
    #[must_use]
    pub fn outcome(self) -> Option<Outcome> {
        match self {
            Self::RoundActive => None,
            Self::Tie => Some(Outcome::Tie),
            Self::Loss => Some(Outcome::Loss),
            Self::Win => Some(Outcome::Win),
        }
    }
}

impl TryFrom<u8> for ResultCode {
    type Error = ProtocolViolation;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::RoundActive),
            1 => Ok(Self::Tie),
            2 => Ok(Self::Loss),
            3 => Ok(Self::Win),
            code => Err(ProtocolViolation::UnknownResultCode(code)),
        }
    }
}

impl From<Outcome> for ResultCode {
    fn from(value: Outcome) -> Self {
        match value {
            Outcome::Tie => Self::Tie,
            Outcome::Loss => Self::Loss,
            Outcome::Win => Self::Win,
        }
    }
}

/// A dealt card or a round's outcome, depending on `result`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ServerPayload {
    pub result: ResultCode,
    pub rank: u16,
    pub suit: u8,
}

/// What a [`ServerPayload`] actually carries.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Payload {
    Card(Card),
    Finished(Outcome),
}

impl ServerPayload {
    #[must_use]
    pub fn card(card: Card) -> Self {
        Self {
            result: ResultCode::RoundActive,
            rank: u16::from(card.0),
            suit: card.1.to_wire(),
        }
    }

    #[must_use]
    pub fn finished(outcome: Outcome) -> Self {
        Self {
            result: outcome.into(),
            rank: 0,
            suit: 0,
        }
    }

    /// # Errors
    ///
    /// Fails if an active payload doesn't hold a real card.
    pub fn content(&self) -> Result<Payload, ProtocolViolation> {
        match self.result.outcome() {
            Some(outcome) => Ok(Payload::Finished(outcome)),
            None => Card::from_wire(self.rank, self.suit)
                .map(Payload::Card)
                .ok_or(ProtocolViolation::InvalidCard {
                    rank: self.rank,
                    suit: self.suit,
                }),
        }
    }
}

impl From<RoundEvent> for ServerPayload {
    fn from(value: RoundEvent) -> Self {
        match value {
            RoundEvent::PlayerCard(card) | RoundEvent::DealerCard(card) => Self::card(card),
            RoundEvent::Finished(outcome) => Self::finished(outcome),
        }
    }
}

impl WireMessage for ServerPayload {
    const KIND: MessageType = MessageType::Payload;
    const SIZE: usize = HEADER_LEN + 4;

    fn encode_body(&self, buf: &mut Vec<u8>) {
        buf.push(self.result as u8);
        buf.extend_from_slice(&self.rank.to_be_bytes());
        buf.push(self.suit);
    }

    fn decode_body(body: &[u8]) -> Result<Self, ProtocolViolation> {
        Ok(Self {
            result: ResultCode::try_from(body[0])?,
            rank: u16::from_be_bytes([body[1], body[2]]),
            suit: body[3],
        })
    }
}

impl fmt::Display for ServerPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.content() {
            Ok(Payload::Card(card)) => write!(f, "{card}"),
            Ok(Payload::Finished(outcome)) => write!(f, "round over ({outcome})"),
            Err(error) => write!(f, "{error}"),
        }
    }
}
