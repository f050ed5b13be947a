//! The `litprog` directive: capture a fragment, then optionally render it.

use litprog_parser::DirectiveBlock;
use litprog_render::{
    code_block_option_spec, parse_options, render_code_block, DirectiveError, Node, OptionKind,
    OptionSpec,
};

use crate::store::{Fragment, SnippetStore};

pub const DIRECTIVE_NAME: &str = "litprog";

/// Result of processing one directive occurrence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Capture {
    /// Position of the new fragment within its document's list.
    pub fragment_index: usize,
    /// Visible output; empty for hidden occurrences.
    pub nodes: Vec<Node>,
}

/// Every code-block option plus `hidden`.
pub fn option_spec() -> OptionSpec {
    code_block_option_spec().with("hidden", OptionKind::Flag)
}

/// Append `block`'s content to `docname`'s fragments and build its visible
/// output.
///
/// The fragment is recorded before rendering, so a rendering error still
/// leaves it captured. Option errors are raised before anything is captured.
pub fn process(
    store: &mut SnippetStore,
    docname: &str,
    block: &DirectiveBlock,
    placeholder_language: &str,
) -> Result<Capture, DirectiveError> {
    let options = parse_options(DIRECTIVE_NAME, &option_spec(), &block.options)?;

    let fragments = store.get_or_create_list(docname);
    fragments.push(Fragment::new(block.content.clone()));
    let fragment_index = fragments.len() - 1;

    if options.has("hidden") {
        return Ok(Capture {
            fragment_index,
            nodes: Vec::new(),
        });
    }

    let nodes = render_code_block(
        placeholder_language,
        block.argument.as_deref(),
        &block.content,
        &options,
    )?;
    Ok(Capture {
        fragment_index,
        nodes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use litprog_parser::RawOption;

    fn block(content: &[&str], options: &[(&str, Option<&str>)]) -> DirectiveBlock {
        DirectiveBlock {
            name: DIRECTIVE_NAME.into(),
            argument: None,
            options: options
                .iter()
                .map(|(name, value)| RawOption {
                    name: name.to_string(),
                    value: value.map(str::to_string),
                    line: 2,
                })
                .collect(),
            content: content.iter().map(|line| line.to_string()).collect(),
            line: 1,
        }
    }

    #[test]
    fn visible_occurrence_renders_with_placeholder_language() {
        let mut store = SnippetStore::new();
        let capture = process(&mut store, "index", &block(&["x = 1"], &[]), "default").unwrap();

        assert_eq!(capture.fragment_index, 0);
        assert_eq!(store.get("index"), [Fragment::from_iter(["x = 1"])]);
        match capture.nodes.as_slice() {
            [Node::LiteralBlock(literal)] => {
                assert_eq!(literal.language, "default");
                assert_eq!(literal.lines, vec!["x = 1".to_string()]);
            }
            other => panic!("unexpected nodes {other:?}"),
        }
    }

    #[test]
    fn hidden_occurrence_is_captured_without_output() {
        let mut store = SnippetStore::new();
        process(&mut store, "index", &block(&["a"], &[]), "default").unwrap();
        let capture = process(
            &mut store,
            "index",
            &block(&["b"], &[("hidden", None)]),
            "default",
        )
        .unwrap();

        assert_eq!(capture.fragment_index, 1);
        assert!(capture.nodes.is_empty());
        assert_eq!(store.get("index").len(), 2);
    }

    #[test]
    fn empty_content_appends_empty_fragment() {
        let mut store = SnippetStore::new();
        process(&mut store, "index", &block(&[], &[]), "default").unwrap();
        assert_eq!(store.get("index"), [Fragment::default()]);
    }

    #[test]
    fn option_errors_capture_nothing() {
        let mut store = SnippetStore::new();
        let err = process(
            &mut store,
            "index",
            &block(&["x"], &[("hidden", Some("yes"))]),
            "default",
        )
        .unwrap_err();
        assert!(matches!(err, DirectiveError::UnexpectedValue { .. }));
        assert!(!store.contains("index"));
    }

    #[test]
    fn rendering_errors_still_capture() {
        let mut store = SnippetStore::new();
        let err = process(
            &mut store,
            "index",
            &block(&["x"], &[("emphasize-lines", Some("5"))]),
            "default",
        )
        .unwrap_err();
        assert!(matches!(err, DirectiveError::LineSpecOutOfRange { .. }));
        assert_eq!(store.get("index").len(), 1);
    }

    #[test]
    fn dedent_affects_rendering_not_capture() {
        let mut store = SnippetStore::new();
        let capture = process(
            &mut store,
            "index",
            &block(&["    indented"], &[("dedent", None)]),
            "default",
        )
        .unwrap();
        assert_eq!(store.get("index")[0].lines(), ["    indented"]);
        match capture.nodes.as_slice() {
            [Node::LiteralBlock(literal)] => assert_eq!(literal.lines, vec!["indented"]),
            other => panic!("unexpected nodes {other:?}"),
        }
    }
}
