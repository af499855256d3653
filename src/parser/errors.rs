//! Parse error type for the response-extraction cascade.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// None of the cascade's steps found anything resembling a JSON object.
    NoJsonFound,
    /// A JSON object was found but was missing required fields for the
    /// task's schema.
    MissingFields(Vec<String>),
    /// The lexical fallback heuristic also failed to produce a verdict.
    HeuristicFailed,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::NoJsonFound => write!(f, "no JSON object found in response text"),
            ParseError::MissingFields(fields) => {
                write!(f, "response missing required fields: {}", fields.join(", "))
            }
            ParseError::HeuristicFailed => write!(f, "lexical fallback heuristic found no verdict"),
        }
    }
}

impl std::error::Error for ParseError {}
