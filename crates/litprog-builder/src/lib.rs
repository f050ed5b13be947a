//! Reference documentation build host for the litprog extension.
//!
//! A [`Builder`] discovers Markdown sources, restores the environment saved by
//! the previous run, purges and rereads outdated documents (in parallel), and
//! finally hands the snippet store and the include graph to the extension's
//! build-finished hook.

pub mod build;
pub mod discover;
pub mod environment;
pub mod error;
pub mod toctree;

pub use build::{page_path, BuildSummary, Builder, Warning};
pub use discover::{discover, docname_for};
pub use environment::{environment_path, Environment, Fingerprint, ReadSettings};
pub use error::BuildError;
