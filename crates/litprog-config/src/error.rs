use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::source::ConfigSource;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot use {attempted} as working directory: {source}")]
    WorkingDirectory {
        attempted: PathBuf,
        source: io::Error,
    },
    #[error("config file {path} given with --config does not exist")]
    OverrideNotFound { path: PathBuf },
    #[error("cannot read config {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("invalid TOML in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid configuration:\n{0}")]
    Validation(ConfigValidationErrors),
}

/// Every validation failure of one load, one per line.
#[derive(Debug)]
pub struct ConfigValidationErrors(pub Vec<ConfigValidationError>);

impl ConfigValidationErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ConfigValidationError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ConfigValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for error in &self.0 {
            if !first {
                f.write_str("\n")?;
            }
            first = false;
            write!(f, "  * {error}")?;
        }
        Ok(())
    }
}

/// One rejected setting and the layer that supplied it.
#[derive(Clone, Debug)]
pub struct ConfigValidationError {
    /// Dotted key, e.g. `litprog.output_filename`.
    pub key: &'static str,
    pub message: String,
    pub source: ConfigSource,
}

impl ConfigValidationError {
    pub(crate) fn new(key: &'static str, message: impl Into<String>, source: &ConfigSource) -> Self {
        ConfigValidationError {
            key,
            message: message.into(),
            source: source.clone(),
        }
    }
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} [{}]", self.key, self.message, self.source)
    }
}
