//! The `toctree` directive and include-graph sanitation.

use std::collections::BTreeSet;
use std::path::{Component, Path};

use globset::Glob;
use litprog_core::{toc_order, IncludeGraph, TocTree};
use litprog_parser::DirectiveBlock;
use litprog_render::{
    parse_options, DirectiveError, OptionKind, OptionSpec, TocEntry, TocTreeNode,
};

pub const TOCTREE_DIRECTIVE: &str = "toctree";

pub fn toctree_option_spec() -> OptionSpec {
    OptionSpec::new()
        .with("caption", OptionKind::Text)
        .with("glob", OptionKind::Flag)
        .with("hidden", OptionKind::Flag)
        .with("maxdepth", OptionKind::Unsigned)
        .with("numbered", OptionKind::OptionalUnsigned)
        .with("reversed", OptionKind::Flag)
        .with("titlesonly", OptionKind::Flag)
}

/// A toctree occurrence resolved against the known documents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedToc {
    pub node: TocTreeNode,
    /// Included documents in declared order, for the include graph.
    pub children: Vec<String>,
    /// Problems with individual entries; the entry is skipped.
    pub problems: Vec<String>,
}

/// Resolve the entries of a toctree found in `docname`.
pub fn resolve(
    docname: &str,
    block: &DirectiveBlock,
    known: &BTreeSet<String>,
) -> Result<ResolvedToc, DirectiveError> {
    let options = parse_options(TOCTREE_DIRECTIVE, &toctree_option_spec(), &block.options)?;
    if block.argument.is_some() {
        return Err(DirectiveError::UnexpectedArgument {
            directive: TOCTREE_DIRECTIVE.to_string(),
        });
    }
    let glob = options.has("glob");

    let mut entries = Vec::new();
    let mut problems = Vec::new();
    for line in &block.content {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (title, target) = split_entry(line);

        if glob && title.is_none() && has_glob_chars(target) {
            let pattern = resolve_target(docname, target);
            let matcher = match Glob::new(&pattern) {
                Ok(glob) => glob.compile_matcher(),
                Err(err) => {
                    problems.push(format!("invalid toctree glob pattern '{target}': {err}"));
                    continue;
                }
            };
            let before = entries.len();
            entries.extend(
                known
                    .iter()
                    .filter(|candidate| candidate.as_str() != docname)
                    .filter(|candidate| matcher.is_match(candidate.as_str()))
                    .map(|candidate| TocEntry {
                        title: None,
                        docname: candidate.clone(),
                    }),
            );
            if entries.len() == before {
                problems.push(format!(
                    "toctree glob pattern '{target}' didn't match any documents"
                ));
            }
            continue;
        }

        let target_doc = resolve_target(docname, target.trim_end_matches(".md"));
        if target_doc == docname {
            problems.push(format!("self referenced toctree found: '{target}'"));
        } else if !known.contains(&target_doc) {
            problems.push(format!(
                "toctree contains reference to nonexisting document '{target_doc}'"
            ));
        } else {
            entries.push(TocEntry {
                title: title.map(str::to_string),
                docname: target_doc,
            });
        }
    }

    if options.has("reversed") {
        entries.reverse();
    }

    let children = entries.iter().map(|entry| entry.docname.clone()).collect();
    Ok(ResolvedToc {
        node: TocTreeNode {
            caption: options.text("caption").map(str::to_string),
            entries,
            hidden: options.has("hidden"),
        },
        children,
        problems,
    })
}

/// Split `Title <target>` into its parts; other lines are a bare target.
fn split_entry(line: &str) -> (Option<&str>, &str) {
    if let Some(rest) = line.strip_suffix('>') {
        if let Some(open) = rest.rfind('<') {
            let title = rest[..open].trim();
            let target = rest[open + 1..].trim();
            if !title.is_empty() && !target.is_empty() {
                return (Some(title), target);
            }
        }
    }
    (None, line)
}

fn has_glob_chars(target: &str) -> bool {
    target.contains(['*', '?', '['])
}

/// Turn an entry into a document name. Entries are relative to the directory
/// of the including document unless they start with `/`.
fn resolve_target(docname: &str, target: &str) -> String {
    let joined = match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => match docname.rsplit_once('/') {
            Some((dir, _)) => format!("{dir}/{target}"),
            None => target.to_string(),
        },
    };

    let mut parts: Vec<&str> = Vec::new();
    for component in Path::new(&joined).components() {
        match component {
            Component::ParentDir => {
                parts.pop();
            }
            Component::Normal(part) => {
                if let Some(part) = part.to_str() {
                    parts.push(part);
                }
            }
            _ => {}
        }
    }
    parts.join("/")
}

/// Copy of `toc` with every edge that would close a cycle removed.
///
/// Returns the dropped `(parent, child)` edges. A document reached through
/// several parents keeps all of them.
pub fn sanitize(toc: &TocTree) -> (TocTree, Vec<(String, String)>) {
    let mut clean = TocTree::new(toc.root());
    let mut dropped = Vec::new();
    let mut path = vec![toc.root().to_string()];
    let mut done = BTreeSet::new();
    visit(toc, &mut clean, &mut dropped, &mut path, &mut done);

    // Parents not reachable from the root are never walked; keep their edges
    // for inspection.
    for (parent, children) in toc.parents() {
        if !done.contains(parent) {
            clean.set_children(parent, children.to_vec());
        }
    }
    (clean, dropped)
}

fn visit(
    toc: &TocTree,
    clean: &mut TocTree,
    dropped: &mut Vec<(String, String)>,
    path: &mut Vec<String>,
    done: &mut BTreeSet<String>,
) {
    let Some(current) = path.last().cloned() else {
        return;
    };
    if !done.insert(current.clone()) {
        return;
    }

    let mut kept = Vec::new();
    for child in toc.children(&current) {
        if path.contains(child) {
            dropped.push((current.clone(), child.clone()));
            continue;
        }
        kept.push(child.clone());
        path.push(child.clone());
        visit(toc, clean, dropped, path, done);
        path.pop();
    }
    clean.set_children(current, kept);
}

/// Documents reachable from the root of an acyclic include graph.
pub fn reachable(graph: &TocTree) -> BTreeSet<&str> {
    toc_order(graph).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use litprog_parser::RawOption;
    use pretty_assertions::assert_eq;

    fn known(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn toctree(content: &[&str], options: &[(&str, Option<&str>)]) -> DirectiveBlock {
        DirectiveBlock {
            name: TOCTREE_DIRECTIVE.into(),
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
    fn entries_resolve_relative_to_including_document() {
        let docs = known(&["guide/index", "guide/setup", "api", "guide/usage"]);
        let block = toctree(&["setup", "Usage <usage.md>", "/api", "../api"], &[]);
        let resolved = resolve("guide/index", &block, &docs).unwrap();

        assert_eq!(
            resolved.children,
            vec!["guide/setup", "guide/usage", "api", "api"]
        );
        assert_eq!(resolved.node.entries[1].title.as_deref(), Some("Usage"));
        assert!(resolved.problems.is_empty());
    }

    #[test]
    fn missing_and_self_references_are_reported() {
        let docs = known(&["index", "a"]);
        let block = toctree(&["a", "nope", "index"], &[]);
        let resolved = resolve("index", &block, &docs).unwrap();

        assert_eq!(resolved.children, vec!["a"]);
        assert_eq!(resolved.problems.len(), 2);
        assert!(resolved.problems[0].contains("nonexisting document 'nope'"));
        assert!(resolved.problems[1].contains("self referenced"));
    }

    #[test]
    fn glob_entries_are_sorted_and_skip_self() {
        let docs = known(&["index", "ch/b", "ch/a", "other"]);
        let block = toctree(&["ch/*", "other"], &[("glob", None), ("reversed", None)]);
        let resolved = resolve("index", &block, &docs).unwrap();
        assert_eq!(resolved.children, vec!["other", "ch/b", "ch/a"]);

        let block = toctree(&["*"], &[("glob", None)]);
        let resolved = resolve("index", &block, &docs).unwrap();
        assert!(!resolved.children.contains(&"index".to_string()));
    }

    #[test]
    fn unknown_options_are_directive_errors() {
        let block = toctree(&["a"], &[("depth", Some("2"))]);
        let err = resolve("index", &block, &known(&["a"])).unwrap_err();
        assert!(matches!(err, DirectiveError::UnknownOption { .. }));
    }

    #[test]
    fn sanitize_drops_cycle_closing_edges() {
        let mut toc = TocTree::new("R");
        toc.set_children("R", vec!["A".into(), "B".into()]);
        toc.set_children("A", vec!["R".into(), "C".into()]);
        toc.set_children("C", vec!["A".into()]);
        toc.set_children("B", vec!["C".into()]);

        let (clean, dropped) = sanitize(&toc);
        assert_eq!(
            dropped,
            vec![("A".to_string(), "R".to_string()), ("C".to_string(), "A".to_string())]
        );
        assert_eq!(
            toc_order(&clean).collect::<Vec<_>>(),
            vec!["R", "A", "C", "B", "C"]
        );
    }
}
