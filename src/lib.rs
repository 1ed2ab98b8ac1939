//! Pipeline resource step that sends a single email over SMTP.
//!
//! The step is driven by a JSON document (the resource `source` and the step
//! `params`) and a directory of build sources. Message fields are either
//! given inline or read from files below that directory, build metadata
//! placeholders such as `${BUILD_ID}` are substituted, and the resulting
//! message is sent with a blocking SMTP client which follows
//! [RFC 5321](https://tools.ietf.org/html/rfc5321) and supports
//! STARTTLS ([RFC 3207](https://tools.ietf.org/html/rfc3207)) and AUTH
//! ([RFC 4954](https://tools.ietf.org/html/rfc4954)). The protocol types
//! (replies, extensions, SASL) are the ones of [`lettre`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! let input = br#"{
//!     "source": {
//!         "smtp": { "host": "smtp.example.org", "port": "25", "anonymous": true },
//!         "from": "ci@example.org",
//!         "to": ["team@example.org"]
//!     },
//!     "params": { "subject_text": "Build ${BUILD_ID}", "body_text": "done" }
//! }"#;
//!
//! let output = email_resource::execute(Path::new("/tmp/build"), "1.0.0", input)?;
//! println!("{}", String::from_utf8_lossy(&output));
//! # Ok::<(), email_resource::Error>(())
//! ```

#![forbid(unsafe_code)]
#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    rust_2018_idioms
)]
#![warn(
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unused_qualifications
)]

pub mod config;
pub mod error;
pub mod message;
pub mod output;
pub mod resolve;
pub mod tokens;
pub mod transport;

use std::path::Path;

pub use crate::{
    config::Input,
    error::{Error, Field},
    message::{Envelope, Message},
    output::Output,
    resolve::Resolver,
    tokens::BuildTokens,
    transport::smtp::{Connector, NetworkConnector, Session, SmtpTransport, Stage},
};

/// Runs the `out` step.
///
/// `source_root` is the directory relative file paths are resolved against,
/// `version` is reported back in the output metadata and `input` is the raw
/// JSON configuration. Build placeholders are read from the process
/// environment.
///
/// Returns the serialized output record.
pub fn execute(source_root: &Path, version: &str, input: &[u8]) -> Result<Vec<u8>, Error> {
    execute_with(
        source_root,
        version,
        input,
        &BuildTokens::from_env(),
        &NetworkConnector::default(),
    )
}

/// Runs the `out` step with explicit build tokens and SMTP connector
pub fn execute_with<C: Connector>(
    source_root: &Path,
    version: &str,
    input: &[u8],
    tokens: &BuildTokens,
    connector: &C,
) -> Result<Vec<u8>, Error> {
    if source_root.as_os_str().is_empty() {
        return Err(Error::MissingSourceRoot);
    }

    let input: Input = serde_json::from_slice(input)?;
    input.validate()?;

    let resolver = Resolver::new(source_root, tokens);
    let params = &input.params;

    let subject = resolver.resolve(&params.subject_text, &params.subject)?;
    let subject = subject.trim_matches('\n');

    let headers = resolver.resolve("", &params.headers)?;
    let headers = headers.trim_matches('\n');

    let body = resolver.resolve(&params.body_text, &params.body)?;
    let to = resolver.recipients(&input.source.to, &params.to)?;

    let output = Output::new(&input.source.smtp.host, subject, version);
    let json = output.to_json()?;

    if !params.send_empty_body && body.is_empty() {
        tracing::warn!(
            "message not sent because the message body is empty and \
             send_empty_body parameter was set to false"
        );
        return Ok(json);
    }

    let message = Message::builder()
        .from(input.source.from.clone())
        .to(to)
        .headers(headers)
        .subject(subject)
        .body(body)?;

    SmtpTransport::from_config(&input.source.smtp).send(connector, &message)?;

    tracing::info!(
        host = %input.source.smtp.host,
        recipients = message.envelope().to().len(),
        "message sent"
    );
    Ok(json)
}
