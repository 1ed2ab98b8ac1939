//! Build metadata placeholders
//!
//! Text resolved from the configuration may contain `${NAME}` markers for a
//! fixed set of pipeline variables. They are replaced by the value of the
//! identically named environment variable.

use std::env;

/// Placeholder names, in substitution order
pub const NAMES: [&str; 6] = [
    "BUILD_ID",
    "BUILD_NAME",
    "BUILD_JOB_NAME",
    "BUILD_PIPELINE_NAME",
    "ATC_EXTERNAL_URL",
    "BUILD_TEAM_NAME",
];

const PLACEHOLDERS: [&str; 6] = [
    "${BUILD_ID}",
    "${BUILD_NAME}",
    "${BUILD_JOB_NAME}",
    "${BUILD_PIPELINE_NAME}",
    "${ATC_EXTERNAL_URL}",
    "${BUILD_TEAM_NAME}",
];

/// Values for the build placeholders
///
/// Unknown or unset variables are replaced by an empty string.
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct BuildTokens {
    values: [String; 6],
}

impl BuildTokens {
    /// Reads every placeholder value from the process environment
    pub fn from_env() -> BuildTokens {
        BuildTokens::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the values with a custom variable lookup
    pub fn from_lookup<F>(mut lookup: F) -> BuildTokens
    where
        F: FnMut(&str) -> Option<String>,
    {
        BuildTokens {
            values: NAMES.map(|name| lookup(name).unwrap_or_default()),
        }
    }

    /// Sets the value of a placeholder, names outside of [`NAMES`] are ignored
    pub fn with(mut self, name: &str, value: impl Into<String>) -> BuildTokens {
        if let Some(idx) = NAMES.iter().position(|n| *n == name) {
            self.values[idx] = value.into();
        }
        self
    }

    /// Value of a placeholder
    pub fn get(&self, name: &str) -> Option<&str> {
        NAMES
            .iter()
            .position(|n| *n == name)
            .map(|idx| self.values[idx].as_str())
    }

    /// Replaces every placeholder occurrence in `text`
    ///
    /// Each placeholder is replaced once over the whole string, in [`NAMES`]
    /// order. A value containing the marker of a placeholder which comes
    /// later in that order is expanded again by the later pass.
    pub fn substitute(&self, text: &str) -> String {
        let mut text = text.to_owned();
        for (placeholder, value) in PLACEHOLDERS.iter().zip(&self.values) {
            if text.contains(placeholder) {
                text = text.replace(placeholder, value);
            }
        }
        text
    }
}
