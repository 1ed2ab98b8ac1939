//! The SMTP transport sends the message using the SMTP protocol.
//!
//! This SMTP client follows [RFC 5321](https://tools.ietf.org/html/rfc5321),
//! and relies as much as possible on the relay server for sanity and RFC
//! compliance checks.
//!
//! It implements the following extensions:
//!
//! * STARTTLS ([RFC 3207](https://tools.ietf.org/html/rfc3207))
//! * AUTH ([RFC 4954](http://tools.ietf.org/html/rfc4954)) with PLAIN and LOGIN mechanisms
//! * 8BITMIME ([RFC 6152](https://tools.ietf.org/html/rfc6152)) and SMTPUTF8
//!   ([RFC 6531](https://tools.ietf.org/html/rfc6531)), announced in `MAIL FROM`
//!
//! Servers rejecting `EHLO` are greeted with `HELO`, no extension is used
//! then. Replies, extensions and AUTH mechanisms are the types of
//! [`lettre::transport::smtp`].
//!
//! A session is driven by [`SmtpTransport::send`]. Each step of the session
//! is tagged with a [`Stage`], so a failure reports where the conversation
//! with the server broke.
//!
//! The network is reached through a [`Connector`], which opens a
//! [`Session`]. [`NetworkConnector`] is the blocking TCP implementation.
//!
//! ```rust,no_run
//! use email_resource::{config::SmtpConfig, Message, NetworkConnector, SmtpTransport};
//!
//! let config = SmtpConfig {
//!     host: "localhost".to_owned(),
//!     port: "25".to_owned(),
//!     anonymous: true,
//!     ..Default::default()
//! };
//! let message = Message::builder()
//!     .from("ci@example.org".to_owned())
//!     .to(vec!["team@example.org".to_owned()])
//!     .subject("Build done")
//!     .body("All green")?;
//!
//! SmtpTransport::from_config(&config).send(&NetworkConnector::default(), &message)?;
//! # Ok::<(), email_resource::Error>(())
//! ```

use std::fmt::{self, Display, Formatter};

pub use lettre::transport::smtp::{authentication::Credentials, extension::ClientId};
use lettre::transport::smtp::authentication::DEFAULT_MECHANISMS;

pub use self::{error::Error, transport::SmtpTransport};
use self::{
    client::{SmtpConnection, TlsParameters},
    commands::Rcpt,
};

pub mod client;
pub mod commands;
mod error;
mod transport;

/// Step of an SMTP session
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum Stage {
    /// Connection, greeting and `EHLO`
    Dial,
    /// `STARTTLS` and `AUTH`
    Auth,
    /// `MAIL FROM`
    Mail,
    /// `RCPT TO`
    Rcpt,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match *self {
            Stage::Dial => "dial",
            Stage::Auth => "auth",
            Stage::Mail => "mail",
            Stage::Rcpt => "rcpt",
        })
    }
}

/// An open conversation with an SMTP server
///
/// The greeting and `EHLO` (or `HELO`) are handled when the session is
/// opened by its [`Connector`].
pub trait Session {
    /// Upgrades the connection to TLS
    fn starttls(&mut self, tls_parameters: &TlsParameters) -> Result<(), Error>;

    /// Authenticates with the given credentials
    fn auth(&mut self, credentials: &Credentials) -> Result<(), Error>;

    /// Sends `MAIL FROM`
    fn mail(&mut self, from: &str) -> Result<(), Error>;

    /// Sends `RCPT TO` for a single recipient
    fn rcpt(&mut self, to: &str) -> Result<(), Error>;

    /// Sends `DATA`, the message and its terminator
    fn data(&mut self, message: &[u8]) -> Result<(), Error>;

    /// Sends `QUIT`
    fn quit(&mut self) -> Result<(), Error>;
}

/// Opens sessions to an SMTP server
pub trait Connector {
    /// The session type opened by this connector
    type Session: Session;

    /// Connects to `host:port`, reads the greeting and says hello
    fn connect(&self, host: &str, port: &str) -> Result<Self::Session, Error>;
}

/// Blocking TCP connector
#[derive(Clone, Debug, Default)]
pub struct NetworkConnector {
    hello_name: ClientId,
}

impl NetworkConnector {
    /// Creates a connector sending the given name in `EHLO`
    ///
    /// The default uses the local hostname.
    pub fn new(hello_name: ClientId) -> Self {
        NetworkConnector { hello_name }
    }
}

impl Connector for NetworkConnector {
    type Session = NetworkSession;

    fn connect(&self, host: &str, port: &str) -> Result<NetworkSession, Error> {
        let connection = SmtpConnection::connect(format!("{host}:{port}"), &self.hello_name)?;
        Ok(NetworkSession {
            connection,
            hello_name: self.hello_name.clone(),
        })
    }
}

/// Session over an [`SmtpConnection`]
#[derive(Debug)]
pub struct NetworkSession {
    connection: SmtpConnection,
    hello_name: ClientId,
}

impl Session for NetworkSession {
    fn starttls(&mut self, tls_parameters: &TlsParameters) -> Result<(), Error> {
        self.connection.starttls(tls_parameters, &self.hello_name)
    }

    fn auth(&mut self, credentials: &Credentials) -> Result<(), Error> {
        self.connection
            .auth(DEFAULT_MECHANISMS, credentials)
            .map(drop)
    }

    fn mail(&mut self, from: &str) -> Result<(), Error> {
        self.connection.mail(from).map(drop)
    }

    fn rcpt(&mut self, to: &str) -> Result<(), Error> {
        self.connection.command(Rcpt::new(to)?).map(drop)
    }

    fn data(&mut self, message: &[u8]) -> Result<(), Error> {
        self.connection.data(message).map(drop)
    }

    fn quit(&mut self) -> Result<(), Error> {
        self.connection.quit().map(drop)
    }
}
