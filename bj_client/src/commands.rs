use blackjack::Decision;
use std::{fmt, num::NonZeroU8};

/// Errors that can occur while parsing console input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Not a round count between 1 and 255.
    InvalidRounds(String),
    /// Unrecognized decision.
    UnrecognizedDecision(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRounds(value) => write!(
                f,
                "Invalid number of rounds '{value}'. Must be a number from 1 to 255"
            ),
            Self::UnrecognizedDecision(value) => write!(
                f,
                "Unrecognized decision '{value}'. Type 'h' to hit or 's' to stand"
            ),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse a hit or stand from user input.
///
/// # Examples
///
/// ```
/// use bj_client::commands::parse_decision;
/// use blackjack::Decision;
///
/// assert_eq!(parse_decision("h"), Ok(Decision::Hit));
/// assert_eq!(parse_decision(" Stand\n"), Ok(Decision::Stand));
/// assert!(parse_decision("double").is_err());
/// ```
pub fn parse_decision(input: &str) -> Result<Decision, ParseError> {
    let trimmed = input.trim();
    match trimmed.to_lowercase().as_str() {
        "h" | "hit" => Ok(Decision::Hit),
        "s" | "stand" => Ok(Decision::Stand),
        _ => Err(ParseError::UnrecognizedDecision(trimmed.to_string())),
    }
}

/// Parse how many rounds to play.
pub fn parse_rounds(input: &str) -> Result<NonZeroU8, ParseError> {
    let trimmed = input.trim();
    trimmed
        .parse()
        .map_err(|_| ParseError::InvalidRounds(trimmed.to_string()))
}
