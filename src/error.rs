//! Errors surfaced while parsing a connection link

use std::num::ParseIntError;
use thiserror::Error;

/// Parse failure. Parsing is all-or-nothing, so no partial descriptor
/// accompanies any of these.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Input does not start with `vless://`
    #[error("link must start with vless://")]
    Scheme,

    /// Structural problem in the identity or address part
    #[error("invalid vless link: {0}")]
    Format(String),

    /// Port segment is not a valid decimal integer
    #[error("invalid port: {0}")]
    Numeric(#[from] ParseIntError),
}

impl ParseError {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }
}
