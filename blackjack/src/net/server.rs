//! Dealer side of the protocol.
//!
//! [`serve_session`] is the whole life of one connection: handshake, then
//! the requested number of rounds. [`Server`] accepts connections with a
//! `mio` poll loop and hands each one to its own thread, while a
//! [`Broadcaster`] advertises the listener in the background.

use log::{debug, error, info, warn};
use mio::{Events, Interest, Poll, Token, Waker, net::TcpListener};
use std::{
    io::{self, Read, Write},
    net::{SocketAddr, TcpStream},
    num::NonZeroU8,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use super::{
    discovery::{BROADCAST_INTERVAL, Broadcaster, DISCOVERY_PORT},
    errors::{Result, SessionError},
    messages::{ClientDecision, Offer, Request, ServerPayload},
    utils::{self, DEFAULT_IDLE_TIMEOUT},
};
use crate::game::{
    Round,
    entities::{Decision, Deck, Outcome, Session},
};

pub const DEFAULT_SERVICE_NAME: &str = "Blackjack Table";

const LISTENER: Token = Token(0);
const WAKER: Token = Token(1);

/// Where and how often offers are broadcast.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DiscoveryConfig {
    pub target: SocketAddr,
    pub interval: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            target: SocketAddr::from(([255, 255, 255, 255], DISCOVERY_PORT)),
            interval: BROADCAST_INTERVAL,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServerConfig {
    /// Port 0 lets the OS pick the session port.
    pub bind: SocketAddr,
    pub service_name: String,
    pub idle_timeout: Duration,
    /// `None` disables the offer broadcaster.
    pub discovery: Option<DiscoveryConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 0)),
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            discovery: Some(DiscoveryConfig::default()),
        }
    }
}

/// Run a whole session over `stream`.
///
/// The first message must be a [`Request`]. If it isn't, or it asks for
/// zero rounds, nothing is written and an error is returned so the caller
/// can drop the connection. Each round draws a fresh deck from `next_deck`.
///
/// # Errors
///
/// Returns an error if the handshake is rejected, the peer disconnects or
/// idles out, or the round state machine fails.
pub fn serve_session<S, F>(stream: &mut S, mut next_deck: F) -> Result<Session>
where
    S: Read + Write,
    F: FnMut() -> Deck,
{
    let request: Request = utils::read_message_checked(stream)?;
    let rounds = NonZeroU8::new(request.rounds).ok_or(SessionError::NoRounds)?;
    let mut session = Session::new(request.player_name, rounds);
    info!("{} connected, playing {rounds} rounds", session.name);

    while !session.is_complete() {
        let (round, outcome) = play_round(stream, &session.name, Round::deal(next_deck())?)?;
        session.record(outcome);
        info!(
            "{} round {}/{rounds}: {outcome} (player {}, dealer {})",
            session.name,
            session.rounds_played,
            round.player_hand().value(),
            round.dealer_hand().value(),
        );
    }

    info!("{session}");
    Ok(session)
}

fn play_round<S: Read + Write>(
    stream: &mut S,
    name: &str,
    mut round: Round,
) -> Result<(Round, Outcome)> {
    debug!("{name} dealer shows {}", round.dealer_hand().cards()[0]);
    loop {
        if let Some(outcome) = round.outcome() {
            return Ok((round, outcome));
        }
        let decision = if round.awaiting_decision() {
            Some(read_decision(stream, name)?)
        } else {
            None
        };
        for event in round.advance(decision)? {
            utils::write_message(stream, &ServerPayload::from(event))?;
        }
    }
}

/// Anything that reads as a full message but doesn't decode counts as a
/// stand rather than ending the session.
fn read_decision<S: Read>(stream: &mut S, name: &str) -> Result<Decision> {
    match utils::read_message::<ClientDecision, _>(stream) {
        Ok(msg) => {
            debug!("{name} {}", msg.decision);
            Ok(msg.decision)
        }
        Err(SessionError::Protocol(violation)) => {
            warn!("{name} sent a bad decision ({violation}), treating it as a stand");
            Ok(Decision::Stand)
        }
        Err(error) => Err(error),
    }
}

/// Stops a running [`Server`] from another thread.
#[derive(Clone, Debug)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
    waker: Arc<Waker>,
}

impl StopHandle {
    /// # Errors
    ///
    /// Returns an error if the poll loop can't be woken.
    pub fn stop(&self) -> io::Result<()> {
        self.stopped.store(true, Ordering::SeqCst);
        self.waker.wake()
    }
}

pub struct Server {
    config: ServerConfig,
    listener: TcpListener,
    poll: Poll,
    stopped: Arc<AtomicBool>,
    waker: Arc<Waker>,
}

impl Server {
    /// # Errors
    ///
    /// Returns an error if the listener can't be bound or registered.
    pub fn bind(config: ServerConfig) -> io::Result<Self> {
        let mut listener = TcpListener::bind(config.bind)?;
        let poll = Poll::new()?;
        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)?;
        let waker = Arc::new(Waker::new(poll.registry(), WAKER)?);
        Ok(Self {
            config,
            listener,
            poll,
            stopped: Arc::new(AtomicBool::new(false)),
            waker,
        })
    }

    /// # Errors
    ///
    /// Returns an error if the listener's address can't be read.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            stopped: self.stopped.clone(),
            waker: self.waker.clone(),
        }
    }

    /// Accept connections until stopped.
    ///
    /// # Errors
    ///
    /// Returns an error if the broadcaster can't start or polling fails.
    pub fn run(mut self) -> anyhow::Result<()> {
        let addr = self.listener.local_addr()?;
        info!("{} accepting sessions on {addr}", self.config.service_name);

        let broadcaster = match &self.config.discovery {
            Some(discovery) => {
                let offer = Offer {
                    port: addr.port(),
                    service_name: self.config.service_name.clone(),
                };
                Some(Broadcaster::spawn(&offer, discovery.target, discovery.interval)?)
            }
            None => None,
        };

        let mut events = Events::with_capacity(128);
        while !self.stopped.load(Ordering::SeqCst) {
            if let Err(error) = self.poll.poll(&mut events, None) {
                if error.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(error.into());
            }
            for event in &events {
                if event.token() == LISTENER {
                    self.accept_pending();
                }
            }
        }

        if let Some(broadcaster) = broadcaster {
            broadcaster.stop();
        }
        info!("{} stopped", self.config.service_name);
        Ok(())
    }

    fn accept_pending(&self) {
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    info!("new connection from {peer}");
                    spawn_session(stream.into(), peer, self.config.idle_timeout);
                }
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => break,
                Err(error) => {
                    error!("failed to accept connection: {error}");
                    break;
                }
            }
        }
    }
}

/// Bind and run a server until it fails.
///
/// # Errors
///
/// Returns an error if binding or running the server fails.
pub fn run(config: ServerConfig) -> anyhow::Result<()> {
    Server::bind(config)?.run()
}

fn spawn_session(stream: TcpStream, peer: SocketAddr, idle_timeout: Duration) {
    let spawned = thread::Builder::new()
        .name(format!("session-{peer}"))
        .spawn(move || handle_connection(stream, peer, idle_timeout));
    if let Err(error) = spawned {
        error!("failed to spawn session for {peer}: {error}");
    }
}

fn handle_connection(mut stream: TcpStream, peer: SocketAddr, idle_timeout: Duration) {
    if let Err(error) = configure_stream(&stream, idle_timeout) {
        error!("{peer}: failed to configure stream: {error}");
        return;
    }
    match serve_session(&mut stream, Deck::shuffled) {
        Ok(session) => info!("{peer}: finished, closing connection ({session})"),
        Err(error @ (SessionError::Protocol(_) | SessionError::NoRounds)) => {
            warn!("{peer}: rejected handshake: {error}");
        }
        Err(SessionError::Timeout) => warn!("{peer}: timed out"),
        Err(SessionError::Disconnected) => info!("{peer}: disconnected"),
        Err(error) => error!("{peer}: {error}"),
    }
}

fn configure_stream(stream: &TcpStream, idle_timeout: Duration) -> io::Result<()> {
    // Accepted from a non-blocking listener.
    stream.set_nonblocking(false)?;
    stream.set_nodelay(true)?;
    stream.set_read_timeout(Some(idle_timeout))?;
    stream.set_write_timeout(Some(idle_timeout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        game::entities::{Card, Suit},
        net::{
            errors::ProtocolViolation,
            messages::{Payload, WireMessage},
        },
    };
    use std::{collections::VecDeque, io::Cursor};

    /// Scripted input, captured output.
    struct MockStream {
        input: Cursor<Vec<u8>>,
        output: Vec<u8>,
    }

    impl MockStream {
        fn new(input: Vec<u8>) -> Self {
            Self {
                input: Cursor::new(input),
                output: Vec::new(),
            }
        }

        fn payloads(&self) -> Vec<ServerPayload> {
            self.output
                .chunks(ServerPayload::SIZE)
                .map(|chunk| ServerPayload::decode(chunk).unwrap())
                .collect()
        }
    }

    impl Read for MockStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for MockStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.output.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn request(rounds: u8) -> Vec<u8> {
        Request {
            rounds,
            player_name: "alice".to_string(),
        }
        .encode()
    }

    fn decision(decision: Decision) -> Vec<u8> {
        ClientDecision { decision }.encode()
    }

    fn decks(tops: Vec<Vec<Card>>) -> impl FnMut() -> Deck {
        let mut tops: VecDeque<Vec<Card>> = tops.into();
        move || Deck::stacked(&tops.pop_front().unwrap()).unwrap()
    }

    fn outcomes(payloads: &[ServerPayload]) -> Vec<Outcome> {
        payloads
            .iter()
            .filter_map(|p| match p.content().unwrap() {
                Payload::Finished(outcome) => Some(outcome),
                Payload::Card(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_bad_magic_handshake_sends_nothing() {
        let mut bytes = request(3);
        bytes[0] = 0;
        let mut stream = MockStream::new(bytes);
        let result = serve_session(&mut stream, Deck::shuffled);
        assert!(matches!(result, Err(SessionError::Protocol(_))));
        assert!(stream.output.is_empty());
    }

    #[test]
    fn test_wrong_type_handshake_sends_nothing() {
        let mut bytes = request(3);
        bytes[4] = 0x4;
        let mut stream = MockStream::new(bytes);
        let result = serve_session(&mut stream, Deck::shuffled);
        assert!(matches!(result, Err(SessionError::Protocol(_))));
        assert!(stream.output.is_empty());
    }

    #[test]
    fn test_decision_handshake_is_rejected_after_the_header() {
        let mut stream = MockStream::new(decision(Decision::Stand));
        let result = serve_session(&mut stream, Deck::shuffled);
        assert!(matches!(
            result,
            Err(SessionError::Protocol(ProtocolViolation::WrongType {
                expected: 0x3,
                actual: 0x4
            }))
        ));
        assert_eq!(stream.input.position(), 5);
        assert!(stream.output.is_empty());
    }

    #[test]
    fn test_short_handshake_is_a_disconnect() {
        let mut stream = MockStream::new(request(3)[..20].to_vec());
        let result = serve_session(&mut stream, Deck::shuffled);
        assert!(matches!(result, Err(SessionError::Disconnected)));
        assert!(stream.output.is_empty());
    }

    #[test]
    fn test_zero_rounds_sends_nothing() {
        let mut stream = MockStream::new(request(0));
        let result = serve_session(&mut stream, Deck::shuffled);
        assert!(matches!(result, Err(SessionError::NoRounds)));
        assert!(stream.output.is_empty());
    }

    #[test]
    fn test_three_round_session() {
        // Player stands on 20 every round.
        // Round 1: dealer 10 + 7 stops at 17 -> win.
        // Round 2: dealer 10 + Q makes 20 -> tie.
        // Round 3: dealer 10 + 6, draws K -> bust -> win.
        let tops = vec![
            vec![
                Card(13, Suit::Heart),
                Card(12, Suit::Heart),
                Card(10, Suit::Club),
                Card(7, Suit::Club),
            ],
            vec![
                Card(13, Suit::Heart),
                Card(12, Suit::Heart),
                Card(10, Suit::Club),
                Card(12, Suit::Club),
            ],
            vec![
                Card(13, Suit::Heart),
                Card(12, Suit::Heart),
                Card(10, Suit::Club),
                Card(6, Suit::Club),
                Card(13, Suit::Spade),
            ],
        ];
        let mut input = request(3);
        for _ in 0..3 {
            input.extend(decision(Decision::Stand));
        }
        let mut stream = MockStream::new(input);

        let session = serve_session(&mut stream, decks(tops)).unwrap();
        let payloads = stream.payloads();
        let outcomes = outcomes(&payloads);

        assert_eq!(outcomes, vec![Outcome::Win, Outcome::Tie, Outcome::Win]);
        assert_eq!(session.rounds_played, 3);
        assert_eq!(
            usize::from(session.wins),
            outcomes.iter().filter(|o| **o == Outcome::Win).count()
        );
        assert_eq!(session.ties, 1);
        assert_eq!(session.name, "alice");
        // 3 opening + hole card + finish, + one dealer draw in round 3.
        assert_eq!(payloads.len(), 5 + 5 + 6);
    }

    #[test]
    fn test_double_aces_never_read_a_decision() {
        let tops = vec![vec![
            Card(1, Suit::Heart),
            Card(1, Suit::Spade),
            Card(10, Suit::Club),
            Card(7, Suit::Club),
        ]];
        // No decision bytes at all; reading one would be a disconnect.
        let mut stream = MockStream::new(request(1));
        let session = serve_session(&mut stream, decks(tops)).unwrap();
        let payloads = stream.payloads();
        assert_eq!(payloads.len(), 4);
        assert_eq!(payloads[3], ServerPayload::finished(Outcome::Loss));
        assert_eq!(session.losses, 1);
    }

    #[test]
    fn test_bad_decision_is_an_implicit_stand() {
        let tops = vec![vec![
            Card(13, Suit::Heart),
            Card(12, Suit::Heart),
            Card(10, Suit::Club),
            Card(8, Suit::Club),
        ]];
        let mut input = request(1);
        let mut bad = decision(Decision::Hit);
        bad[5..].copy_from_slice(b"Hit!!");
        input.extend(bad);
        let mut stream = MockStream::new(input);

        let session = serve_session(&mut stream, decks(tops)).unwrap();
        let payloads = stream.payloads();
        // No extra player card: the dealer reveals and the player's 20 beats 18.
        assert_eq!(payloads[3], ServerPayload::card(Card(8, Suit::Club)));
        assert_eq!(payloads[4], ServerPayload::finished(Outcome::Win));
        assert_eq!(session.wins, 1);
    }

    #[test]
    fn test_hits_are_dealt_in_order() {
        let tops = vec![vec![
            Card(2, Suit::Heart),
            Card(3, Suit::Heart),
            Card(10, Suit::Club),
            Card(9, Suit::Club),
            Card(4, Suit::Heart),
            Card(5, Suit::Heart),
        ]];
        let mut input = request(1);
        input.extend(decision(Decision::Hit));
        input.extend(decision(Decision::Hit));
        input.extend(decision(Decision::Stand));
        let mut stream = MockStream::new(input);

        let session = serve_session(&mut stream, decks(tops)).unwrap();
        let payloads = stream.payloads();
        assert_eq!(payloads[3], ServerPayload::card(Card(4, Suit::Heart)));
        assert_eq!(payloads[4], ServerPayload::card(Card(5, Suit::Heart)));
        assert_eq!(payloads[5], ServerPayload::card(Card(9, Suit::Club)));
        // 14 against 19.
        assert_eq!(payloads[6], ServerPayload::finished(Outcome::Loss));
        assert_eq!(session.losses, 1);
    }

    #[test]
    fn test_disconnect_mid_round() {
        let tops = vec![vec![
            Card(2, Suit::Heart),
            Card(3, Suit::Heart),
            Card(10, Suit::Club),
            Card(9, Suit::Club),
        ]];
        let mut stream = MockStream::new(request(2));
        let result = serve_session(&mut stream, decks(tops));
        assert!(matches!(result, Err(SessionError::Disconnected)));
        // The opening deal went out before the player went quiet.
        assert_eq!(stream.payloads().len(), 3);
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind.port(), 0);
        assert_eq!(config.idle_timeout, DEFAULT_IDLE_TIMEOUT);
        let discovery = config.discovery.unwrap();
        assert_eq!(discovery.target.port(), DISCOVERY_PORT);
        assert_eq!(discovery.interval, Duration::from_secs(1));
    }
}
