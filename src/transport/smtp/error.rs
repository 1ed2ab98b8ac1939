//! Errors of an SMTP session

use std::io;

use lettre::transport::smtp::{
    self,
    response::{Code, Severity},
};
use thiserror::Error;

/// An SMTP session error
#[derive(Debug, Error)]
pub enum Error {
    /// The server answered with a negative reply
    #[error("{code} {message}")]
    Rejected {
        /// Reply code
        code: Code,
        /// Reply text, lines joined with a space
        message: String,
    },
    /// The session cannot go on, the server lacks an extension or keeps challenging
    #[error("{0}")]
    Client(&'static str),
    /// A command argument holds a line break
    #[error("line break in {0} argument")]
    LineBreak(&'static str),
    /// The server closed the connection in the middle of a reply
    #[error("connection closed by server")]
    Closed,
    /// Malformed reply, or an AUTH exchange that could not be answered
    #[error(transparent)]
    Protocol(#[from] smtp::Error),
    /// The CA bundle holds no usable certificate
    #[error("invalid CA certificate: {0}")]
    Certificate(String),
    /// TLS setup or handshake failure
    #[error("tls: {0}")]
    Tls(#[from] native_tls::Error),
    /// I/O error on the connection
    #[error(transparent)]
    Network(#[from] io::Error),
}

impl Error {
    /// Returns the reply code if the server rejected a command
    pub fn status(&self) -> Option<Code> {
        match *self {
            Error::Rejected { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Returns true for a 5yz reply, retrying the same command is pointless
    pub fn is_permanent(&self) -> bool {
        self.status()
            .is_some_and(|code| code.severity == Severity::PermanentNegativeCompletion)
    }
}
