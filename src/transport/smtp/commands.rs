//! Envelope and greeting commands
//!
//! `EHLO`, `STARTTLS`, `AUTH`, `DATA` and `QUIT` are the ones from
//! [`lettre::transport::smtp::commands`]. Addresses are written as given,
//! the relay is left to judge them.

use std::fmt::{self, Display, Formatter};

use lettre::transport::smtp::extension::{ClientId, MailParameter};

use super::Error;

/// HELO command, for servers which do not know EHLO
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Helo {
    client_id: ClientId,
}

impl Display for Helo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "HELO {}\r\n", self.client_id)
    }
}

impl Helo {
    /// Creates a HELO command
    pub fn new(client_id: ClientId) -> Helo {
        Helo { client_id }
    }
}

/// MAIL command
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Mail {
    sender: String,
    parameters: Vec<MailParameter>,
}

impl Display for Mail {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "MAIL FROM:<{}>", self.sender)?;
        for parameter in &self.parameters {
            write!(f, " {parameter}")?;
        }
        f.write_str("\r\n")
    }
}

impl Mail {
    /// Creates a MAIL command
    pub fn new(sender: &str, parameters: Vec<MailParameter>) -> Result<Mail, Error> {
        single_line("MAIL", sender)?;
        Ok(Mail {
            sender: sender.to_owned(),
            parameters,
        })
    }
}

/// RCPT command
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Rcpt {
    recipient: String,
}

impl Display for Rcpt {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "RCPT TO:<{}>\r\n", self.recipient)
    }
}

impl Rcpt {
    /// Creates a RCPT command
    pub fn new(recipient: &str) -> Result<Rcpt, Error> {
        single_line("RCPT", recipient)?;
        Ok(Rcpt {
            recipient: recipient.to_owned(),
        })
    }
}

fn single_line(command: &'static str, argument: &str) -> Result<(), Error> {
    if argument.contains(['\r', '\n']) {
        return Err(Error::LineBreak(command));
    }
    Ok(())
}
