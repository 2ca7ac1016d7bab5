//! Positional parse errors.

use crate::tokens::Pos;
use std::fmt;

/// An error that occurred during parsing.
///
/// Carries the offending literal, the set of expected alternatives, and the
/// zero-based source position. Rendering is 1-indexed:
///
/// `found X, expected A, B at line L, char C`
///
/// Errors constructed with a free-form message render as
/// `MSG at line L, char C` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: Option<String>,
    pub found: String,
    pub expected: Vec<&'static str>,
    pub pos: Pos,
}

impl ParseError {
    pub fn new(found: impl Into<String>, expected: Vec<&'static str>, pos: Pos) -> Self {
        Self {
            message: None,
            found: found.into(),
            expected,
            pos,
        }
    }

    pub fn with_message(message: impl Into<String>, pos: Pos) -> Self {
        Self {
            message: Some(message.into()),
            found: String::new(),
            expected: Vec::new(),
            pos,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(message) = &self.message {
            write!(
                f,
                "{} at line {}, char {}",
                message,
                self.pos.line + 1,
                self.pos.char + 1
            )
        } else {
            write!(
                f,
                "found {}, expected {} at line {}, char {}",
                self.found,
                self.expected.join(", "),
                self.pos.line + 1,
                self.pos.char + 1
            )
        }
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_set_rendering() {
        let err = ParseError::new("EOF", vec!["identifier"], Pos::new(0, 30));
        assert_eq!(
            err.to_string(),
            "found EOF, expected identifier at line 1, char 31"
        );

        let err = ParseError::new("a", vec!["USE", "CREATE", "DROP", "SHOW"], Pos::new(0, 0));
        assert_eq!(
            err.to_string(),
            "found a, expected USE, CREATE, DROP, SHOW at line 1, char 1"
        );
    }

    #[test]
    fn test_message_rendering() {
        let err = ParseError::with_message("number must be an integer", Pos::new(2, 4));
        assert_eq!(err.to_string(), "number must be an integer at line 3, char 5");
    }
}
