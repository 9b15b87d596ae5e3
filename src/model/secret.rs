use std::fmt::Display;
use std::str::FromStr;

use rand::distributions::{Distribution, Uniform};
use thiserror::Error;

/// Default number of digits in a session secret.
pub const DEFAULT_LENGTH: u32 = 7;
/// Longest secret we can generate; `10^18 - 1` still fits comfortably in a `u64`.
pub const MAX_LENGTH: u32 = 18;

/// The one-time capability that authorises concluding the election.
///
/// Generated once per session as a number with exactly `length` digits, drawn
/// uniformly from `10^(length - 1)..=10^length - 1`. Whoever holds the value
/// may trigger the tally and shutdown.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionSecret {
    digits: String,
}

impl SessionSecret {
    /// Generate a random secret with the given number of digits.
    pub fn random(length: u32) -> Result<Self, ParseError> {
        let (low, high) = bounds(length)?;
        let value = Uniform::new_inclusive(low, high).sample(&mut rand::thread_rng());
        Ok(Self {
            digits: value.to_string(),
        })
    }

    /// Number of digits in this secret.
    pub fn length(&self) -> usize {
        self.digits.len()
    }

    /// Does the presented value exactly equal this secret?
    /// The comparison does not exit early on the first differing byte.
    pub fn matches(&self, presented: &str) -> bool {
        let expected = self.digits.as_bytes();
        let presented = presented.as_bytes();
        if expected.len() != presented.len() {
            return false;
        }
        expected
            .iter()
            .zip(presented)
            .fold(0u8, |acc, (x, y)| acc | (x ^ y))
            == 0
    }
}

/// Inclusive range of values with exactly `length` decimal digits.
fn bounds(length: u32) -> Result<(u64, u64), ParseError> {
    if length == 0 || length > MAX_LENGTH {
        return Err(ParseError::InvalidLength(length as usize));
    }
    Ok((10u64.pow(length - 1), 10u64.pow(length) - 1))
}

/// Keep the secret out of debug logs.
impl std::fmt::Debug for SessionSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionSecret({} digits)", self.length())
    }
}

impl Display for SessionSecret {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.digits)
    }
}

impl FromStr for SessionSecret {
    type Err = ParseError;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        let len = string.len();
        if len == 0 || len > MAX_LENGTH as usize {
            return Err(Self::Err::InvalidLength(len));
        }
        if let Some(c) = string.chars().find(|c| !c.is_ascii_digit()) {
            return Err(Self::Err::InvalidChar(c));
        }
        if len > 1 && string.starts_with('0') {
            return Err(Self::Err::LeadingZero);
        }
        Ok(Self {
            digits: string.to_string(),
        })
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("secret must contain between 1 and {MAX_LENGTH} digits, not {0}")]
    InvalidLength(usize),
    #[error("secret must contain only digits, found '{0}'")]
    InvalidChar(char),
    #[error("secret must not start with zero")]
    LeadingZero,
}

#[cfg(test)]
mod tests {
    use super::*;

    impl SessionSecret {
        pub fn example() -> Self {
            "4815162".parse().unwrap()
        }
    }

    #[test]
    fn random_secret_has_requested_length() {
        for length in 1..=MAX_LENGTH {
            let secret = SessionSecret::random(length).unwrap();
            assert_eq!(secret.length(), length as usize);
            let value: u64 = secret.to_string().parse().unwrap();
            let (low, high) = bounds(length).unwrap();
            assert!((low..=high).contains(&value));
        }
    }

    #[test]
    fn default_length_range() {
        assert_eq!(bounds(DEFAULT_LENGTH), Ok((1_000_000, 9_999_999)));
    }

    #[test]
    fn invalid_lengths() {
        assert_eq!(SessionSecret::random(0), Err(ParseError::InvalidLength(0)));
        assert_eq!(
            SessionSecret::random(MAX_LENGTH + 1),
            Err(ParseError::InvalidLength(MAX_LENGTH as usize + 1))
        );
    }

    #[test]
    fn exact_match_only() {
        let secret = SessionSecret::example();
        assert!(secret.matches("4815162"));
        assert!(!secret.matches("4815163"));
        assert!(!secret.matches("481516"));
        assert!(!secret.matches("48151620"));
        assert!(!secret.matches(""));
        assert!(!secret.matches(" 4815162"));
    }

    #[test]
    fn parse() {
        assert_eq!("12a".parse::<SessionSecret>(), Err(ParseError::InvalidChar('a')));
        assert_eq!("0123".parse::<SessionSecret>(), Err(ParseError::LeadingZero));
        assert_eq!("".parse::<SessionSecret>(), Err(ParseError::InvalidLength(0)));
        assert_eq!("0".parse::<SessionSecret>().unwrap().to_string(), "0");
    }

    #[test]
    fn debug_hides_digits() {
        let debug = format!("{:?}", SessionSecret::example());
        assert!(!debug.contains("4815162"));
    }
}
