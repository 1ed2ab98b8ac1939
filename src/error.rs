//! Error type for the `out` step

use std::{
    fmt::{self, Display, Formatter},
    io,
    path::PathBuf,
};

use thiserror::Error;

use crate::transport::smtp::{self, Stage};

/// A required configuration field
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum Field {
    /// `source.smtp.host`
    Host,
    /// `source.smtp.port`
    Port,
    /// `source.from`
    From,
    /// `source.to` or `params.to`
    To,
    /// `params.subject` or `params.subject_text`
    Subject,
    /// `source.smtp.username`, unless anonymous
    Username,
    /// `source.smtp.password`, unless anonymous
    Password,
}

impl Display for Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match *self {
            Field::Host => r#""source.smtp.host""#,
            Field::Port => r#""source.smtp.port""#,
            Field::From => r#""source.from""#,
            Field::To => r#""source.to" or "params.to". Must specify at least one"#,
            Field::Subject => {
                r#""params.subject" or "params.subject_text". Must specify at least one"#
            }
            Field::Username => {
                r#""source.smtp.username" if anonymous specify anonymous: true"#
            }
            Field::Password => {
                r#""source.smtp.password" if anonymous specify anonymous: true"#
            }
        })
    }
}

/// The errors that may occur while running the step
///
/// Every error aborts the whole invocation.
#[derive(Debug, Error)]
pub enum Error {
    /// No source directory was given
    #[error("expected path to build sources as first argument")]
    MissingSourceRoot,
    /// A required configuration field is empty
    #[error("missing required field {0}")]
    MissingField(Field),
    /// Malformed input, or the output record could not be serialized
    #[error(transparent)]
    Parse(#[from] serde_json::Error),
    /// A referenced file could not be read
    #[error("could not read {}: {source}", path.display())]
    Read {
        /// Absolute path of the file
        path: PathBuf,
        /// Underlying i/o error
        #[source]
        source: io::Error,
    },
    /// The SMTP session failed before any data was sent
    #[error("{stage}: {source}")]
    Transport {
        /// Step of the session which failed
        stage: Stage,
        /// Underlying SMTP error
        #[source]
        source: smtp::Error,
    },
    /// Writing the message or closing the session failed
    #[error(transparent)]
    Send(smtp::Error),
}

impl Error {
    /// Returns the session stage which failed, if the error comes from one
    pub fn stage(&self) -> Option<Stage> {
        match *self {
            Error::Transport { stage, .. } => Some(stage),
            _ => None,
        }
    }

    /// Returns true if the error comes from configuration validation
    pub fn is_config(&self) -> bool {
        matches!(self, Error::MissingSourceRoot | Error::MissingField(_))
    }

    pub(crate) fn transport(stage: Stage) -> impl FnOnce(smtp::Error) -> Error {
        move |source| Error::Transport { stage, source }
    }
}
