use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeaveError {
    #[error("failed to write woven output {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}
