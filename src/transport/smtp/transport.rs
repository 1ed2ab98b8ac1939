use super::{
    client::{TlsParameters, Verification},
    Connector, Credentials, Error, Session, Stage,
};
use crate::{config::SmtpConfig, message::Message};

/// How the session is protected
#[derive(Clone, Debug)]
enum Security {
    /// No STARTTLS, no AUTH
    Anonymous,
    /// STARTTLS then AUTH
    Required {
        credentials: Credentials,
        skip_ssl_validation: bool,
        ca_cert: String,
    },
}

/// Sends emails using the SMTP protocol
///
/// Every call to [`send`](SmtpTransport::send) opens a new session, the
/// connection is not reused.
#[derive(Clone, Debug)]
pub struct SmtpTransport {
    host: String,
    port: String,
    security: Security,
}

impl SmtpTransport {
    /// Creates a transport from the resource SMTP settings
    pub fn from_config(config: &SmtpConfig) -> SmtpTransport {
        let security = if config.anonymous {
            Security::Anonymous
        } else {
            Security::Required {
                credentials: Credentials::new(config.username.clone(), config.password.clone()),
                skip_ssl_validation: config.skip_ssl_validation,
                ca_cert: config.ca_cert.clone(),
            }
        };

        SmtpTransport {
            host: config.host.clone(),
            port: config.port.clone(),
            security,
        }
    }

    /// Tells if the session skips STARTTLS and AUTH
    pub fn is_anonymous(&self) -> bool {
        matches!(self.security, Security::Anonymous)
    }

    /// Builds the TLS parameters for the STARTTLS upgrade
    ///
    /// The server certificate must be valid for the configured host.
    fn tls_parameters(
        skip_ssl_validation: bool,
        ca_cert: &str,
        host: &str,
    ) -> Result<TlsParameters, Error> {
        let verification = if skip_ssl_validation {
            Verification::Disabled
        } else if !ca_cert.is_empty() {
            Verification::Bundle(ca_cert)
        } else {
            Verification::System
        };

        TlsParameters::new(host.to_owned(), verification)
    }

    /// Sends the message
    ///
    /// The envelope recipients are sent one by one, the first rejected one
    /// aborts the session before `DATA`. On failure the connection is
    /// dropped without `QUIT`.
    ///
    /// STARTTLS problems, including a bad CA bundle, are reported at the
    /// [`Stage::Auth`] stage.
    pub fn send<C: Connector>(&self, connector: &C, message: &Message) -> Result<(), crate::Error> {
        let envelope = message.envelope();

        let mut session = connector
            .connect(&self.host, &self.port)
            .map_err(crate::Error::transport(Stage::Dial))?;

        if let Security::Required {
            ref credentials,
            skip_ssl_validation,
            ref ca_cert,
        } = self.security
        {
            Self::tls_parameters(skip_ssl_validation, ca_cert, &self.host)
                .and_then(|tls_parameters| session.starttls(&tls_parameters))
                .and_then(|()| session.auth(credentials))
                .map_err(crate::Error::transport(Stage::Auth))?;
        }

        session
            .mail(envelope.from())
            .map_err(crate::Error::transport(Stage::Mail))?;

        for to in envelope.to() {
            session
                .rcpt(to)
                .map_err(crate::Error::transport(Stage::Rcpt))?;
        }

        session
            .data(message.as_bytes())
            .map_err(crate::Error::Send)?;
        session.quit().map_err(crate::Error::Send)?;

        tracing::debug!(
            host = %self.host,
            recipients = envelope.to().len(),
            "session closed"
        );
        Ok(())
    }
}
