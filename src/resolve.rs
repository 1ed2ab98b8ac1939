//! Resolution of message fields from inline text or source files

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{error::Error, tokens::BuildTokens};

/// Resolves configured text against a source directory
#[derive(Clone, Copy, Debug)]
pub struct Resolver<'a> {
    source_root: &'a Path,
    tokens: &'a BuildTokens,
}

impl<'a> Resolver<'a> {
    /// Creates a resolver for files below `source_root`
    pub fn new(source_root: &'a Path, tokens: &'a BuildTokens) -> Resolver<'a> {
        Resolver {
            source_root,
            tokens,
        }
    }

    /// Absolute path of a configured file
    pub fn path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.source_root.join(path)
        }
    }

    /// Reads a configured file and substitutes the build placeholders
    pub fn read_source(&self, path: &str) -> Result<String, Error> {
        let path = self.path(path);
        let content = fs::read(&path).map_err(|source| Error::Read {
            path: path.clone(),
            source,
        })?;
        tracing::debug!("read {} bytes from {}", content.len(), path.display());
        Ok(self.tokens.substitute(&String::from_utf8_lossy(&content)))
    }

    /// Returns the inline text if set, the content of the file otherwise
    ///
    /// Both being empty resolves to an empty string.
    pub fn resolve(&self, text: &str, path: &str) -> Result<String, Error> {
        if !text.is_empty() {
            return Ok(self.tokens.substitute(text));
        }
        if !path.is_empty() {
            return self.read_source(path);
        }
        Ok(String::new())
    }

    /// Appends the recipients listed in `to_file` to the static ones
    ///
    /// The file holds comma separated addresses, surrounding whitespace is
    /// trimmed. Order is kept and duplicates are not removed.
    pub fn recipients(&self, to: &[String], to_file: &str) -> Result<Vec<String>, Error> {
        let mut recipients = to.to_vec();
        if !to_file.is_empty() {
            let list = self.read_source(to_file)?;
            if !list.is_empty() {
                recipients.extend(list.split(',').map(|address| address.trim().to_owned()));
            }
        }
        Ok(recipients)
    }
}
