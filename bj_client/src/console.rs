//! Terminal front end for a session.

use blackjack::{ClientEvent, Decision, Hand, Outcome, PlayerInterface, Session};
use std::{
    io::{self, BufRead, Write},
    num::NonZeroU8,
};

use crate::commands::{parse_decision, parse_rounds};

const RULE_WIDTH: usize = 30;

/// Reads decisions from `input` and writes the table to `output`.
///
/// Closed input counts as standing, since a decision has to be sent.
pub struct ConsolePlayer<R, W> {
    input: R,
    output: W,
    /// Decide automatically, hitting below this value.
    auto_stand_at: Option<u32>,
}

impl ConsolePlayer<io::StdinLock<'static>, io::Stdout> {
    #[must_use]
    pub fn stdio(auto_stand_at: Option<u32>) -> Self {
        Self::new(io::stdin().lock(), io::stdout(), auto_stand_at)
    }
}

impl<R: BufRead, W: Write> ConsolePlayer<R, W> {
    pub fn new(input: R, output: W, auto_stand_at: Option<u32>) -> Self {
        Self {
            input,
            output,
            auto_stand_at,
        }
    }

    /// Returns `None` once input is closed.
    fn prompt(&mut self, question: &str) -> io::Result<Option<String>> {
        write!(self.output, "{question}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    /// Ask how many rounds to play until a valid answer is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the console can't be read or written, or closes
    /// before an answer.
    pub fn ask_rounds(&mut self) -> io::Result<NonZeroU8> {
        loop {
            let Some(line) = self.prompt("How many rounds do you want to play? ")? else {
                return Err(io::ErrorKind::UnexpectedEof.into());
            };
            match parse_rounds(&line) {
                Ok(rounds) => return Ok(rounds),
                Err(error) => writeln!(self.output, "{error}")?,
            }
        }
    }

    fn ask_decision(&mut self, hand: &Hand) -> io::Result<Decision> {
        writeln!(self.output, "Your hand value: {}", hand.value())?;
        if let Some(stand_at) = self.auto_stand_at {
            let decision = if hand.value() < stand_at {
                Decision::Hit
            } else {
                Decision::Stand
            };
            writeln!(self.output, "You {decision}")?;
            return Ok(decision);
        }
        loop {
            let Some(line) = self.prompt("Choose action: (h)it or (s)tand? ")? else {
                return Ok(Decision::Stand);
            };
            match parse_decision(&line) {
                Ok(decision) => return Ok(decision),
                Err(error) => writeln!(self.output, "{error}")?,
            }
        }
    }

    fn show(&mut self, event: &ClientEvent) -> io::Result<()> {
        match event {
            ClientEvent::PlayerCard { card, hand_value } => {
                writeln!(self.output, "Got card: {card} (hand: {hand_value})")
            }
            ClientEvent::DealerUpCard(card) => {
                writeln!(self.output, "Dealer's face-up card: {card}")
            }
            ClientEvent::DealerCard { card, hand_value } => {
                writeln!(self.output, "Dealer played: {card} (dealer: {hand_value})")
            }
            ClientEvent::Busted(value) => writeln!(self.output, "Bust with {value}!"),
            ClientEvent::RoundFinished { round, outcome } => {
                let banner = match outcome {
                    Outcome::Win => "### YOU WON! ###",
                    Outcome::Loss => "### YOU LOST... ###",
                    Outcome::Tie => "### IT'S A TIE ###",
                };
                writeln!(self.output, "Round {round}: {banner}")?;
                writeln!(self.output, "{}", "-".repeat(RULE_WIDTH))
            }
        }
    }

    /// Print the end-of-session win rate.
    ///
    /// # Errors
    ///
    /// Returns an error if output can't be written.
    pub fn show_summary(&mut self, session: &Session) -> io::Result<()> {
        let rate = if session.rounds_played == 0 {
            0.0
        } else {
            f64::from(session.wins) / f64::from(session.rounds_played) * 100.0
        };
        writeln!(
            self.output,
            "Finished playing {} rounds. Win rate: {}/{} ({rate:.1}%)",
            session.rounds_played, session.wins, session.rounds_played
        )
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> PlayerInterface for ConsolePlayer<R, W> {
    fn decide(&mut self, hand: &Hand) -> Decision {
        // Broken console I/O leaves nothing to ask.
        self.ask_decision(hand).unwrap_or(Decision::Stand)
    }

    fn on_event(&mut self, event: &ClientEvent) {
        if let Err(error) = self.show(event) {
            log::warn!("failed to write to console: {error}");
        }
    }
}
