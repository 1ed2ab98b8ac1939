//! Step configuration
//!
//! The input document holds the resource `source` and the step `params`.
//! Every field is optional for the decoder, [`Input::validate`] enforces the
//! required ones.

use std::fmt::{self, Debug, Formatter};

use serde::Deserialize;

use crate::error::{Error, Field};

/// Input document of the `out` step
#[derive(Default, Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Input {
    /// Resource configuration
    pub source: Source,
    /// Step parameters
    pub params: Params,
}

/// Resource configuration
#[derive(Default, Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Source {
    /// SMTP server settings
    pub smtp: SmtpConfig,
    /// Sender address
    pub from: String,
    /// Static recipients
    pub to: Vec<String>,
}

/// SMTP server settings
#[derive(Default, Clone, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    /// Server host name, also expected in its TLS certificate
    pub host: String,
    /// Server port
    pub port: String,
    /// Login, required unless `anonymous`
    pub username: String,
    /// Password, required unless `anonymous`
    pub password: String,
    /// Send without STARTTLS nor authentication
    pub anonymous: bool,
    /// Do not verify the server certificate
    pub skip_ssl_validation: bool,
    /// PEM encoded certificates to trust instead of the system roots
    pub ca_cert: String,
}

impl Debug for SmtpConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("anonymous", &self.anonymous)
            .field("skip_ssl_validation", &self.skip_ssl_validation)
            .field("ca_cert", &!self.ca_cert.is_empty())
            .finish_non_exhaustive()
    }
}

/// Step parameters
///
/// Text fields come in pairs: a path to a file below the source root and an
/// inline value. The inline value wins when both are set.
#[derive(Default, Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Path of the subject file
    pub subject: String,
    /// Inline subject
    pub subject_text: String,
    /// Path of the body file
    pub body: String,
    /// Inline body
    pub body_text: String,
    /// Path of a file holding raw header lines
    pub headers: String,
    /// Path of a file holding comma separated recipients
    pub to: String,
    /// Send even if the resolved body is empty
    pub send_empty_body: bool,
}

impl Input {
    /// Checks the required fields
    ///
    /// Stops at the first missing one.
    pub fn validate(&self) -> Result<(), Error> {
        let smtp = &self.source.smtp;
        let params = &self.params;

        let checks = [
            (Field::Host, smtp.host.is_empty()),
            (Field::Port, smtp.port.is_empty()),
            (Field::From, self.source.from.is_empty()),
            (Field::To, self.source.to.is_empty() && params.to.is_empty()),
            (
                Field::Subject,
                params.subject.is_empty() && params.subject_text.is_empty(),
            ),
            (Field::Username, !smtp.anonymous && smtp.username.is_empty()),
            (Field::Password, !smtp.anonymous && smtp.password.is_empty()),
        ];

        match checks.iter().find(|(_, missing)| *missing) {
            Some((field, _)) => Err(Error::MissingField(*field)),
            None => Ok(()),
        }
    }
}
