use std::io;
use std::path::PathBuf;

use litprog_config::ConfigError;
use litprog_core::WeaveError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to scan sources under {root}: {source}")]
    Discovery {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unreadable build environment {path} (rerun with --fresh): {source}")]
    Environment {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Weave(#[from] WeaveError),
    #[error("build finished with {count} warning(s) treated as errors")]
    Warnings { count: usize },
}

impl BuildError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }
}
