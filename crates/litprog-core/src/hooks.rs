//! Lifecycle surface a host build drives.

use std::path::Path;

use litprog_config::{LitProgSettings, DEFAULT_OUTPUT_FILENAME};
use litprog_parser::DirectiveBlock;
use litprog_render::DirectiveError;
use tracing::debug;

use crate::directive::{self, Capture, DIRECTIVE_NAME};
use crate::error::WeaveError;
use crate::store::SnippetStore;
use crate::weave::{self, IncludeGraph, WeaveReport};

/// Version of the persisted store layout. Hosts discard environments written
/// under any other value.
pub const ENV_VERSION: u32 = 1;

/// How the host's build run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildStatus {
    Succeeded,
    Failed,
}

impl BuildStatus {
    pub fn is_success(self) -> bool {
        matches!(self, BuildStatus::Succeeded)
    }
}

/// Callbacks a host invokes at fixed points of its build.
///
/// The store is always passed in by the host, which owns it and persists it
/// between incremental runs.
pub trait BuildHooks {
    /// A document's previous parse is being discarded. Must run before the
    /// document is read again.
    fn on_document_invalidated(&self, store: &mut SnippetStore, docname: &str);

    /// Handle one extraction directive found while reading `docname`.
    fn process_directive(
        &self,
        store: &mut SnippetStore,
        docname: &str,
        block: &DirectiveBlock,
    ) -> Result<Capture, DirectiveError>;

    /// The build ended. Output is produced only for a successful build.
    fn on_build_finished(
        &self,
        store: &SnippetStore,
        graph: &dyn IncludeGraph,
        outdir: &Path,
        status: BuildStatus,
    ) -> Result<Option<WeaveReport>, WeaveError>;
}

/// A configuration value the extension declares, with its default.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigValue {
    pub name: &'static str,
    pub default: &'static str,
}

/// What the extension registers with a host when loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registration {
    pub directive: &'static str,
    pub config_values: Vec<ConfigValue>,
    pub env_version: u32,
    pub parallel_read_safe: bool,
    pub parallel_write_safe: bool,
    pub version: &'static str,
}

/// The literate-programming extension.
#[derive(Clone, Debug, Default)]
pub struct LitProg {
    settings: LitProgSettings,
}

impl LitProg {
    pub fn new(settings: LitProgSettings) -> Self {
        LitProg { settings }
    }

    pub fn settings(&self) -> &LitProgSettings {
        &self.settings
    }

    pub fn registration() -> Registration {
        Registration {
            directive: DIRECTIVE_NAME,
            config_values: vec![ConfigValue {
                name: "output_filename",
                default: DEFAULT_OUTPUT_FILENAME,
            }],
            env_version: ENV_VERSION,
            parallel_read_safe: true,
            parallel_write_safe: true,
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

impl BuildHooks for LitProg {
    fn on_document_invalidated(&self, store: &mut SnippetStore, docname: &str) {
        if let Some(fragments) = store.remove(docname) {
            debug!(
                "dropped {} fragment(s) of invalidated document {docname}",
                fragments.len()
            );
        }
    }

    fn process_directive(
        &self,
        store: &mut SnippetStore,
        docname: &str,
        block: &DirectiveBlock,
    ) -> Result<Capture, DirectiveError> {
        directive::process(store, docname, block, &self.settings.highlight_language)
    }

    fn on_build_finished(
        &self,
        store: &SnippetStore,
        graph: &dyn IncludeGraph,
        outdir: &Path,
        status: BuildStatus,
    ) -> Result<Option<WeaveReport>, WeaveError> {
        if !status.is_success() {
            debug!("build failed; skipping weave");
            return Ok(None);
        }
        weave::emit(store, graph, outdir, &self.settings.output_filename).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Fragment;
    use crate::weave::TocTree;
    use tempfile::tempdir;

    #[test]
    fn registration_surface() {
        let registration = LitProg::registration();
        assert_eq!(registration.directive, "litprog");
        assert_eq!(
            registration.config_values,
            vec![ConfigValue {
                name: "output_filename",
                default: "litprog.py"
            }]
        );
        assert_eq!(registration.env_version, 1);
        assert!(registration.parallel_read_safe);
        assert!(registration.parallel_write_safe);
    }

    #[test]
    fn invalidation_forgets_document() {
        let hooks = LitProg::default();
        let mut store = SnippetStore::new();
        store
            .get_or_create_list("index")
            .push(Fragment::from_iter(["old"]));

        hooks.on_document_invalidated(&mut store, "index");
        hooks.on_document_invalidated(&mut store, "index");
        assert!(!store.contains("index"));
    }

    #[test]
    fn failed_build_writes_nothing() {
        let dir = tempdir().unwrap();
        let hooks = LitProg::default();
        let mut store = SnippetStore::new();
        store
            .get_or_create_list("index")
            .push(Fragment::from_iter(["x"]));

        let report = hooks
            .on_build_finished(
                &store,
                &TocTree::new("index"),
                dir.path(),
                BuildStatus::Failed,
            )
            .unwrap();
        assert!(report.is_none());
        assert!(!dir.path().join("litprog.py").exists());
    }
}
