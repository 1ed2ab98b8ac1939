//! Message formatting
//!
//! The message is a minimal [RFC 5322](https://tools.ietf.org/html/rfc5322)
//! document: `To`, `From`, the configured raw header lines and `Subject`,
//! followed by a blank line and the body. No MIME structure is added, a
//! `Content-Type` must come from the configured headers.
//!
//! ```rust
//! use email_resource::Message;
//!
//! let message = Message::builder()
//!     .from("ci@example.org".to_owned())
//!     .to(vec!["team@example.org".to_owned()])
//!     .subject("Build done")
//!     .body("All green")?;
//!
//! assert_eq!(
//!     String::from_utf8_lossy(&message.formatted()),
//!     "To: team@example.org\nFrom: ci@example.org\nSubject: Build done\n\nAll green"
//! );
//! # Ok::<(), email_resource::Error>(())
//! ```

use crate::error::{Error, Field};

/// Simple email envelope representation
///
/// Addresses are kept as given, without any syntax check. Only line breaks
/// are refused, when the `MAIL` and `RCPT` commands are built.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Envelope {
    /// The envelope recipients' addresses
    ///
    /// This can not be empty.
    forward_path: Vec<String>,
    /// The envelope sender address
    reverse_path: String,
}

impl Envelope {
    /// Creates a new envelope, which may fail if `to` is empty.
    pub fn new(from: String, to: Vec<String>) -> Result<Envelope, Error> {
        if to.is_empty() {
            return Err(Error::MissingField(Field::To));
        }
        Ok(Envelope {
            forward_path: to,
            reverse_path: from,
        })
    }

    /// Gets the destination addresses of the envelope.
    pub fn to(&self) -> &[String] {
        self.forward_path.as_slice()
    }

    /// Gets the sender of the envelope.
    pub fn from(&self) -> &str {
        &self.reverse_path
    }
}

/// A builder for messages
#[derive(Default, Clone, Debug)]
pub struct MessageBuilder {
    from: String,
    to: Vec<String>,
    headers: String,
    subject: String,
}

impl MessageBuilder {
    /// Creates a new default message builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `From` header and envelope sender
    pub fn from(mut self, from: String) -> Self {
        self.from = from;
        self
    }

    /// Set `To` header and envelope recipients
    pub fn to(mut self, to: Vec<String>) -> Self {
        self.to = to;
        self
    }

    /// Raw header lines, inserted verbatim before `Subject`
    pub fn headers<S: Into<String>>(mut self, headers: S) -> Self {
        self.headers = headers.into();
        self
    }

    /// Set `Subject` header
    pub fn subject<S: Into<String>>(mut self, subject: S) -> Self {
        self.subject = subject.into();
        self
    }

    /// Create message using the body, fails when there is no recipient
    pub fn body<S: AsRef<str>>(self, body: S) -> Result<Message, Error> {
        let body = body.as_ref();

        let mut formatted = Vec::with_capacity(body.len() + 128);
        formatted.extend_from_slice(format!("To: {}\n", self.to.join(", ")).as_bytes());
        formatted.extend_from_slice(format!("From: {}\n", self.from).as_bytes());
        if !self.headers.is_empty() {
            formatted.extend_from_slice(self.headers.as_bytes());
            formatted.push(b'\n');
        }
        formatted.extend_from_slice(format!("Subject: {}\n", self.subject).as_bytes());
        formatted.push(b'\n');
        formatted.extend_from_slice(body.as_bytes());

        Ok(Message {
            envelope: Envelope::new(self.from, self.to)?,
            formatted,
        })
    }
}

/// Email message which can be sent
#[derive(Clone, Debug)]
pub struct Message {
    envelope: Envelope,
    formatted: Vec<u8>,
}

impl Message {
    /// Create a new message builder without headers
    pub fn builder() -> MessageBuilder {
        MessageBuilder::new()
    }

    /// Get the message envelope
    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Get message content formatted for sending
    pub fn formatted(&self) -> Vec<u8> {
        self.formatted.clone()
    }

    /// Borrow the formatted message
    pub fn as_bytes(&self) -> &[u8] {
        &self.formatted
    }
}
