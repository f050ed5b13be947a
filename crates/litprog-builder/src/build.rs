//! One build run: discovery, incremental reading, finishing.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use litprog_config::Config;
use litprog_core::{BuildHooks, BuildStatus, LitProg, SnippetStore, WeaveReport, DIRECTIVE_NAME};
use litprog_parser::{parse_path, Block, DirectiveBlock};
use litprog_render::{code_block_option_spec, parse_options, render_code_block, render_page, Node};
use litprog_utils::{atomic_write, parallel_map};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::discover::discover;
use crate::environment::{environment_path, Environment, Fingerprint, ReadSettings};
use crate::error::BuildError;
use crate::toctree::{self, reachable, sanitize, TOCTREE_DIRECTIVE};

const CODE_BLOCK_DIRECTIVES: [&str; 3] = ["code-block", "code", "sourcecode"];

/// A non-fatal problem found during the build.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub docname: Option<String>,
    pub line: Option<usize>,
    pub message: String,
}

impl Warning {
    fn at(docname: &str, line: usize, message: impl Into<String>) -> Self {
        Warning {
            docname: Some(docname.to_string()),
            line: Some(line),
            message: message.into(),
        }
    }

    fn global(message: impl Into<String>) -> Self {
        Warning {
            docname: None,
            line: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.docname, self.line) {
            (Some(docname), Some(line)) => write!(f, "{docname}:{line}: {}", self.message),
            (Some(docname), None) => write!(f, "{docname}: {}", self.message),
            _ => f.write_str(&self.message),
        }
    }
}

/// Outcome of a successful build.
#[derive(Clone, Debug)]
pub struct BuildSummary {
    pub documents: usize,
    pub read: Vec<String>,
    pub removed: Vec<String>,
    /// All current warnings, including those recorded for documents that
    /// were not reread.
    pub warnings: Vec<Warning>,
    pub weave: Option<WeaveReport>,
}

/// Runs builds for one resolved configuration.
pub struct Builder {
    config: Config,
    hooks: LitProg,
}

struct DocumentRead {
    docname: String,
    fingerprint: Fingerprint,
    snippets: SnippetStore,
    children: Vec<String>,
    has_toctree: bool,
    warnings: Vec<Warning>,
    page: Option<String>,
}

impl Builder {
    pub fn new(config: Config) -> Self {
        let hooks = LitProg::new(config.litprog.clone());
        Builder { config, hooks }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn environment_path(&self) -> PathBuf {
        environment_path(&self.config.build.output_dir)
    }

    /// Read the environment saved by the last build, if any.
    pub fn load_environment(&self) -> Result<Option<Environment>, BuildError> {
        Environment::load(&self.environment_path())
    }

    /// Build all outdated documents and weave on success.
    ///
    /// With `fresh` the saved environment is ignored and every document is
    /// read again.
    pub fn build(&self, fresh: bool) -> Result<BuildSummary, BuildError> {
        let source_dir = &self.config.project.source_dir;
        let output_dir = &self.config.build.output_dir;
        let root_doc = &self.config.project.root_doc;

        let found = discover(source_dir, output_dir, &self.config.project.exclude)?;
        debug!("found {} document(s) under {}", found.len(), source_dir.display());

        let mut environment = if fresh {
            Environment::default()
        } else {
            self.load_environment()?.unwrap_or_default()
        };

        let removed: Vec<String> = environment
            .documents()
            .keys()
            .filter(|docname| !found.contains_key(*docname))
            .cloned()
            .collect();
        let added = found
            .keys()
            .any(|docname| !environment.documents().contains_key(docname));
        // Toctree entries resolve against the found set, so a changed set
        // rereads every document holding a toctree.
        let found_set_changed = added || !removed.is_empty();

        let settings = ReadSettings::for_config(&self.config);
        let settings_changed =
            !environment.documents().is_empty() && environment.settings() != &settings;
        if settings_changed {
            info!("page settings changed; rereading every document");
        }

        let mut outdated = Vec::new();
        for (docname, path) in &found {
            let fingerprint = Fingerprint::of(path).map_err(|err| BuildError::io(path, err))?;
            let stale = settings_changed
                || environment.documents().get(docname) != Some(&fingerprint)
                || (found_set_changed && environment.has_toctree(docname));
            if stale {
                outdated.push((docname.clone(), path.clone(), fingerprint));
            }
        }

        for docname in removed
            .iter()
            .chain(outdated.iter().map(|(docname, _, _)| docname))
        {
            self.hooks
                .on_document_invalidated(environment.snippets_mut(), docname);
            environment.forget(docname);
        }
        environment.set_settings(settings);
        if !removed.is_empty() {
            debug!("purged {} removed document(s)", removed.len());
        }
        info!(
            "{} of {} document(s) outdated",
            outdated.len(),
            found.len()
        );

        let known: BTreeSet<String> = found.keys().cloned().collect();
        let pages = self.config.build.pages;
        let results = parallel_map(outdated, |(docname, path, fingerprint)| {
            self.read_document(docname, &path, fingerprint, &known, pages)
        });

        let mut read = Vec::new();
        for result in results {
            let document = result?;
            if let Some(page) = &document.page {
                let target = page_path(output_dir, &document.docname);
                atomic_write(&target, page).map_err(|err| BuildError::io(&target, err))?;
            }
            environment.snippets_mut().merge(document.snippets);
            environment.record(
                document.docname.clone(),
                document.fingerprint,
                document.children,
                document.has_toctree,
                document.warnings,
            );
            read.push(document.docname);
        }
        environment.set_root(root_doc.clone());

        // Warnings of unchanged documents still count, so they are replayed.
        let mut warnings: Vec<Warning> =
            environment.warnings().values().flatten().cloned().collect();
        for warning in &warnings {
            warn!("{warning}");
        }

        if !found.contains_key(root_doc) {
            let warning = Warning::global(format!("root document '{root_doc}' not found"));
            warn!("{warning}");
            warnings.push(warning);
        }

        environment.save(&self.environment_path())?;

        let (graph, dropped) = sanitize(environment.toc());
        for (parent, child) in dropped {
            let warning = Warning {
                docname: Some(parent),
                line: None,
                message: format!("toctree entry '{child}' would create a cycle; ignored"),
            };
            warn!("{warning}");
            warnings.push(warning);
        }

        let included = reachable(&graph);
        for docname in found.keys().filter(|docname| !included.contains(docname.as_str())) {
            debug!("document {docname} is not included in any toctree reachable from {root_doc}");
        }

        let status = if self.config.build.fail_on_warning && !warnings.is_empty() {
            BuildStatus::Failed
        } else {
            BuildStatus::Succeeded
        };
        let weave =
            self.hooks
                .on_build_finished(environment.snippets(), &graph, output_dir, status)?;

        if !status.is_success() {
            return Err(BuildError::Warnings {
                count: warnings.len(),
            });
        }

        Ok(BuildSummary {
            documents: found.len(),
            read,
            removed,
            warnings,
            weave,
        })
    }

    /// Remove the output directory. Returns whether anything was removed.
    pub fn clean(&self) -> Result<bool, BuildError> {
        let output_dir = &self.config.build.output_dir;
        if !output_dir.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(output_dir).map_err(|err| BuildError::io(output_dir, err))?;
        debug!("removed {}", output_dir.display());
        Ok(true)
    }

    fn read_document(
        &self,
        docname: String,
        path: &Path,
        fingerprint: Fingerprint,
        known: &BTreeSet<String>,
        pages: bool,
    ) -> Result<DocumentRead, BuildError> {
        let document = parse_path(path).map_err(|err| BuildError::io(path, err))?;
        debug!("reading {docname}");

        let mut snippets = SnippetStore::new();
        let mut children = Vec::new();
        let mut warnings = Vec::new();
        let mut nodes = Vec::new();
        let mut has_toctree = false;

        for block in &document.blocks {
            match block {
                Block::Text(text) => nodes.push(Node::Markdown(text.text())),
                Block::Directive(directive) => {
                    has_toctree |= directive.name == TOCTREE_DIRECTIVE;
                    match self.dispatch(&docname, directive, &mut snippets, &mut children, known) {
                        Ok((rendered, problems)) => {
                            nodes.extend(rendered);
                            warnings.extend(
                                problems
                                    .into_iter()
                                    .map(|message| Warning::at(&docname, directive.line, message)),
                            );
                        }
                        Err(message) => {
                            nodes.push(Node::SystemMessage(message.clone()));
                            warnings.push(Warning::at(&docname, directive.line, message));
                        }
                    }
                }
            }
        }

        let page = pages.then(|| render_page(&docname, &nodes));
        Ok(DocumentRead {
            docname,
            fingerprint,
            snippets,
            children,
            has_toctree,
            warnings,
            page,
        })
    }

    /// Run one directive. Returns its output nodes plus non-fatal problems, or
    /// the message of an error that replaced its output.
    fn dispatch(
        &self,
        docname: &str,
        directive: &DirectiveBlock,
        snippets: &mut SnippetStore,
        children: &mut Vec<String>,
        known: &BTreeSet<String>,
    ) -> Result<(Vec<Node>, Vec<String>), String> {
        let name = directive.name.as_str();
        if name == DIRECTIVE_NAME {
            let capture = self
                .hooks
                .process_directive(snippets, docname, directive)
                .map_err(|err| err.to_string())?;
            Ok((capture.nodes, Vec::new()))
        } else if CODE_BLOCK_DIRECTIVES.contains(&name) {
            let options = parse_options(name, &code_block_option_spec(), &directive.options)
                .map_err(|err| err.to_string())?;
            let nodes = render_code_block(
                &self.config.litprog.highlight_language,
                directive.argument.as_deref(),
                &directive.content,
                &options,
            )
            .map_err(|err| err.to_string())?;
            Ok((nodes, Vec::new()))
        } else if name == TOCTREE_DIRECTIVE {
            let resolved =
                toctree::resolve(docname, directive, known).map_err(|err| err.to_string())?;
            children.extend(resolved.children);
            Ok((vec![Node::TocTree(resolved.node)], resolved.problems))
        } else {
            Err(format!("unknown directive type \"{name}\""))
        }
    }
}

/// Where the rendered page of `docname` is written.
pub fn page_path(output_dir: &Path, docname: &str) -> PathBuf {
    let mut path = output_dir.to_path_buf();
    path.extend(docname.split('/'));
    path.set_extension("html");
    path
}
