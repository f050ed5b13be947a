//! Output-node construction for litprog builds.
//!
//! This crate owns the "render a formatted code block" capability. It knows
//! nothing about snippet capture; the litprog directive composes it by
//! extending [`code_block_option_spec`] and delegating to
//! [`render_code_block`] after its own bookkeeping.

mod code_block;
mod error;
mod html;
mod node;
mod options;

pub use code_block::{code_block_option_spec, parse_line_spec, render_code_block};
pub use error::DirectiveError;
pub use html::render_page;
pub use node::{LiteralBlock, Node, TocEntry, TocTreeNode};
pub use options::{parse_options, DirectiveOptions, OptionKind, OptionSpec, OptionValue};
