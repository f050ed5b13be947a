use std::fs;

use litprog_core::{
    BuildHooks, BuildStatus, IncludeGraph, LitProg, SnippetStore, TocTree, WeaveError,
};
use litprog_parser::parse_str;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

/// Feed every `litprog` directive of `source` through the hooks, the way a
/// host reads one document.
fn read(hooks: &LitProg, store: &mut SnippetStore, docname: &str, source: &str) {
    hooks.on_document_invalidated(store, docname);
    let document = parse_str(source);
    for block in document.directives().filter(|block| block.name == "litprog") {
        hooks.process_directive(store, docname, block).unwrap();
    }
}

/// Children are given as a space-separated list.
fn graph(root: &str, edges: &[(&str, &str)]) -> TocTree {
    let mut tree = TocTree::new(root);
    for (parent, children) in edges {
        tree.set_children(
            *parent,
            children.split_whitespace().map(str::to_string).collect(),
        );
    }
    tree
}

fn finish(hooks: &LitProg, store: &SnippetStore, graph: &dyn IncludeGraph) -> String {
    let dir = tempdir().unwrap();
    let report = hooks
        .on_build_finished(store, graph, dir.path(), BuildStatus::Succeeded)
        .unwrap()
        .expect("successful build weaves");
    fs::read_to_string(report.path).unwrap()
}

#[test]
fn concrete_scenario_output() {
    let hooks = LitProg::default();
    let mut store = SnippetStore::new();
    read(
        &hooks,
        &mut store,
        "index",
        "# Root\n\n```{litprog}\n1\n2\n```\n\nText.\n\n```{litprog}\n3\n4\n5\n```\n",
    );
    read(&hooks, &mut store, "child", "```{litprog}\n6\n```\n");

    let toc = graph("index", &[("index", "child")]);
    assert_eq!(finish(&hooks, &store, &toc), "1\n2\n3\n4\n5\n6\n");
}

#[test]
fn order_follows_toc_not_read_order() {
    let hooks = LitProg::default();
    let mut store = SnippetStore::new();
    for docname in ["C", "B", "A", "R"] {
        read(
            &hooks,
            &mut store,
            docname,
            &format!("```{{litprog}}\n{docname}\n```\n"),
        );
    }

    let toc = graph("R", &[("R", "A B"), ("A", "C")]);
    assert_eq!(finish(&hooks, &store, &toc), "R\nA\nC\nB\n");
}

#[test]
fn hidden_fragments_are_woven_but_not_rendered() {
    let hooks = LitProg::default();
    let mut store = SnippetStore::new();
    let document = parse_str("```{litprog}\n:hidden:\n\nsecret = 1\n```\n\n```{litprog} python\nshown = 2\n```\n");
    let captures: Vec<_> = document
        .directives()
        .map(|block| hooks.process_directive(&mut store, "index", block).unwrap())
        .collect();

    assert!(captures[0].nodes.is_empty());
    assert_eq!(captures[1].nodes.len(), 1);
    assert_eq!(
        finish(&hooks, &store, &TocTree::new("index")),
        "secret = 1\nshown = 2\n"
    );
}

#[test]
fn reparsing_without_directives_drops_old_fragments() {
    let hooks = LitProg::default();
    let mut store = SnippetStore::new();
    read(&hooks, &mut store, "index", "```{litprog}\nroot\n```\n");
    read(&hooks, &mut store, "guide", "```{litprog}\nold\n```\n");
    read(&hooks, &mut store, "guide", "Only prose now.\n");

    let toc = graph("index", &[("index", "guide")]);
    assert_eq!(finish(&hooks, &store, &toc), "root\n");
}

#[test]
fn unreachable_documents_stay_in_store_but_not_in_output() {
    let hooks = LitProg::default();
    let mut store = SnippetStore::new();
    read(&hooks, &mut store, "index", "```{litprog}\nroot\n```\n");
    read(&hooks, &mut store, "orphan", "```{litprog}\nlost\n```\n");

    assert_eq!(finish(&hooks, &store, &TocTree::new("index")), "root\n");
    assert_eq!(store.get("orphan")[0].lines(), ["lost"]);
}

#[test]
fn repeated_builds_are_byte_identical() {
    let hooks = LitProg::default();
    let mut store = SnippetStore::new();
    read(&hooks, &mut store, "index", "```{litprog}\na\n\nb\n```\n");
    let toc = TocTree::new("index");

    let dir = tempdir().unwrap();
    let first = hooks
        .on_build_finished(&store, &toc, dir.path(), BuildStatus::Succeeded)
        .unwrap()
        .unwrap();
    let first_bytes = fs::read(&first.path).unwrap();

    read(&hooks, &mut store, "index", "```{litprog}\na\n\nb\n```\n");
    let second = hooks
        .on_build_finished(&store, &toc, dir.path(), BuildStatus::Succeeded)
        .unwrap()
        .unwrap();
    assert_eq!(fs::read(&second.path).unwrap(), first_bytes);
}

#[test]
fn failed_build_leaves_previous_output() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("litprog.py");
    fs::write(&target, "previous\n").unwrap();

    let hooks = LitProg::default();
    let mut store = SnippetStore::new();
    read(&hooks, &mut store, "index", "```{litprog}\nnew\n```\n");

    let report = hooks
        .on_build_finished(&store, &TocTree::new("index"), dir.path(), BuildStatus::Failed)
        .unwrap();
    assert!(report.is_none());
    assert_eq!(fs::read_to_string(&target).unwrap(), "previous\n");
}

#[test]
fn unwritable_output_is_a_weave_error() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    fs::write(&blocker, "file").unwrap();

    let hooks = LitProg::default();
    let store = SnippetStore::new();
    let err = hooks
        .on_build_finished(&store, &TocTree::new("index"), &blocker, BuildStatus::Succeeded)
        .unwrap_err();
    let WeaveError::Write { path, .. } = err;
    assert_eq!(path, blocker.join("litprog.py"));
}

#[test]
fn empty_store_writes_empty_file() {
    let hooks = LitProg::default();
    let store = SnippetStore::new();
    assert_eq!(finish(&hooks, &store, &TocTree::new("index")), "");
}
