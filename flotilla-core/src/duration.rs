//! Duration codec for the `DD-hh:mm:ss` limit format
//!
//! Time limits travel as strings shaped `DD-hh:mm:ss` (days then a 24h
//! clock part, all left-padded). Empty input, or a value of zero seconds,
//! means "no limit".

use thiserror::Error;

/// Sentinel for "no limit".
pub const UNLIMITED: u64 = 0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DurationError {
    #[error("invalid duration {0:?}, expected DD-hh:mm:ss")]
    Invalid(String),

    #[error("duration {0:?} overflows")]
    Overflow(String),
}

/// Parses `DD-hh:mm:ss` into whole seconds.
///
/// The empty string parses to [`UNLIMITED`]. The clock fields must be
/// exactly two digits; the day field takes one or more.
pub fn parse(s: &str) -> Result<u64, DurationError> {
    if s.is_empty() {
        return Ok(UNLIMITED);
    }

    let invalid = || DurationError::Invalid(s.to_string());

    let (days, clock) = s.split_once('-').ok_or_else(invalid)?;
    if days.is_empty() || !days.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let mut parts = clock.split(':');
    let mut next_field = || -> Result<u64, DurationError> {
        let part = parts.next().ok_or_else(invalid)?;
        if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        part.parse().map_err(|_| invalid())
    };
    let hours = next_field()?;
    let minutes = next_field()?;
    let seconds = next_field()?;
    if parts.next().is_some() {
        return Err(invalid());
    }

    let days: u64 = days
        .parse()
        .map_err(|_| DurationError::Overflow(s.to_string()))?;

    days.checked_mul(86_400)
        .and_then(|total| total.checked_add(hours * 3_600 + minutes * 60 + seconds))
        .ok_or_else(|| DurationError::Overflow(s.to_string()))
}

/// Formats whole seconds as `DD-hh:mm:ss`, left-padded.
pub fn format(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;
    let secs = seconds % 60;
    format!("{:02}-{:02}:{:02}:{:02}", days, hours, minutes, secs)
}
