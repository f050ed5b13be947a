//! Depth-first weaving of captured fragments into one output file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use litprog_utils::atomic_write;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::WeaveError;
use crate::store::SnippetStore;

/// The host's TOC include structure: which documents each document includes,
/// in declaration order.
///
/// The graph restricted to documents reachable from [`root`](Self::root) must
/// be a tree; traversal does not guard against cycles.
pub trait IncludeGraph {
    fn root(&self) -> &str;
    fn children(&self, docname: &str) -> &[String];
}

/// Plain include graph, serialisable so hosts can persist it between builds.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocTree {
    root: String,
    includes: BTreeMap<String, Vec<String>>,
}

impl TocTree {
    pub fn new(root: impl Into<String>) -> Self {
        TocTree {
            root: root.into(),
            includes: BTreeMap::new(),
        }
    }

    pub fn set_root(&mut self, root: impl Into<String>) {
        self.root = root.into();
    }

    /// Replace the children declared by `parent`. An empty list removes the
    /// entry.
    pub fn set_children(&mut self, parent: impl Into<String>, children: Vec<String>) {
        let parent = parent.into();
        if children.is_empty() {
            self.includes.remove(&parent);
        } else {
            self.includes.insert(parent, children);
        }
    }

    pub fn remove(&mut self, parent: &str) {
        self.includes.remove(parent);
    }

    pub fn parents(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.includes
            .iter()
            .map(|(parent, children)| (parent.as_str(), children.as_slice()))
    }
}

impl IncludeGraph for TocTree {
    fn root(&self) -> &str {
        &self.root
    }

    fn children(&self, docname: &str) -> &[String] {
        self.includes
            .get(docname)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Pre-order iterator over document names, first child first.
pub struct TocOrder<'g, G: IncludeGraph + ?Sized> {
    graph: &'g G,
    stack: Vec<&'g str>,
}

impl<'g, G: IncludeGraph + ?Sized> Iterator for TocOrder<'g, G> {
    type Item = &'g str;

    fn next(&mut self) -> Option<Self::Item> {
        let docname = self.stack.pop()?;
        let graph = self.graph;
        self.stack
            .extend(graph.children(docname).iter().rev().map(String::as_str));
        Some(docname)
    }
}

/// Documents in depth-first TOC order, starting at the graph's root.
pub fn toc_order<G: IncludeGraph + ?Sized>(graph: &G) -> TocOrder<'_, G> {
    TocOrder {
        graph,
        stack: vec![graph.root()],
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WeaveStats {
    pub documents: usize,
    pub fragments: usize,
    pub lines: usize,
}

/// Concatenate the fragments of every reachable document in TOC order.
///
/// Each contributing document adds its lines joined by `\n` plus one trailing
/// `\n`. A document whose fragments hold no lines adds nothing.
pub fn weave_to_string<G: IncludeGraph + ?Sized>(
    store: &SnippetStore,
    graph: &G,
) -> (String, WeaveStats) {
    let mut output = String::new();
    let mut stats = WeaveStats::default();

    for docname in toc_order(graph) {
        let fragments = store.get(docname);
        let lines: Vec<&str> = fragments
            .iter()
            .flat_map(|fragment| fragment.lines().iter().map(String::as_str))
            .collect();
        if lines.is_empty() {
            continue;
        }

        output.push_str(&lines.join("\n"));
        output.push('\n');
        stats.documents += 1;
        stats.fragments += fragments.len();
        stats.lines += lines.len();
    }

    (output, stats)
}

/// Outcome of a successful weave.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeaveReport {
    pub path: PathBuf,
    pub stats: WeaveStats,
}

/// Weave into `outdir/filename`, replacing any previous file atomically.
pub fn emit<G: IncludeGraph + ?Sized>(
    store: &SnippetStore,
    graph: &G,
    outdir: &Path,
    filename: &str,
) -> Result<WeaveReport, WeaveError> {
    let path = outdir.join(filename);
    let (contents, stats) = weave_to_string(store, graph);
    atomic_write(&path, &contents).map_err(|source| WeaveError::Write {
        path: path.clone(),
        source,
    })?;

    info!(
        "woven {} fragment(s) from {} document(s) into {}",
        stats.fragments,
        stats.documents,
        path.display()
    );
    Ok(WeaveReport { path, stats })
}
