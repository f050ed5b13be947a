//! Literate-programming extension core.
//!
//! Documents contribute ordered code [`Fragment`]s through the `litprog`
//! directive. Fragments are kept per document in a [`SnippetStore`] that the
//! host persists between incremental builds and prunes whenever a document is
//! invalidated. Once a build finishes successfully the weave emitter walks the
//! host's TOC include graph depth-first from the root document and writes all
//! fragments, in that order, into a single output file.
//!
//! Hosts drive the extension through [`BuildHooks`], implemented by [`LitProg`].

pub mod directive;
pub mod error;
pub mod hooks;
pub mod store;
pub mod weave;

pub use directive::{Capture, DIRECTIVE_NAME};
pub use error::WeaveError;
pub use hooks::{BuildHooks, BuildStatus, ConfigValue, LitProg, Registration, ENV_VERSION};
pub use litprog_render::DirectiveError;
pub use store::{Fragment, SnippetStore};
pub use weave::{toc_order, weave_to_string, IncludeGraph, TocTree, WeaveReport, WeaveStats};
