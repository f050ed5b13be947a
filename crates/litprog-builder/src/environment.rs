//! Build state persisted between incremental runs.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use litprog_config::Config;
use litprog_core::{SnippetStore, TocTree, ENV_VERSION};
use litprog_utils::atomic_write;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::build::Warning;
use crate::error::BuildError;

const STATE_DIR: &str = ".litprog";
const ENVIRONMENT_FILE: &str = "environment.json";

/// Location of the persisted environment inside `output_dir`.
pub fn environment_path(output_dir: &Path) -> PathBuf {
    output_dir.join(STATE_DIR).join(ENVIRONMENT_FILE)
}

/// Cheap change detector for a source file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub modified_secs: u64,
    pub modified_nanos: u32,
    pub size: u64,
}

impl Fingerprint {
    pub fn of(path: &Path) -> io::Result<Self> {
        let metadata = fs::metadata(path)?;
        let modified = metadata
            .modified()?
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Ok(Fingerprint {
            modified_secs: modified.as_secs(),
            modified_nanos: modified.subsec_nanos(),
            size: metadata.len(),
        })
    }
}

/// Settings that shape what reading a document produces. Documents read
/// under different settings are read again.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadSettings {
    pub pages: bool,
    /// Only tracked while pages are rendered.
    pub highlight_language: Option<String>,
}

impl ReadSettings {
    pub fn for_config(config: &Config) -> Self {
        let pages = config.build.pages;
        ReadSettings {
            pages,
            highlight_language: pages.then(|| config.litprog.highlight_language.clone()),
        }
    }
}

/// Everything a build needs to remember about the previous one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    version: u32,
    #[serde(default)]
    settings: ReadSettings,
    documents: BTreeMap<String, Fingerprint>,
    toc: TocTree,
    /// Documents holding a toctree; their entries resolve against the set of
    /// found documents.
    #[serde(default)]
    toctrees: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    warnings: BTreeMap<String, Vec<Warning>>,
    snippets: SnippetStore,
}

impl Default for Environment {
    fn default() -> Self {
        Environment {
            version: ENV_VERSION,
            settings: ReadSettings::default(),
            documents: BTreeMap::new(),
            toc: TocTree::default(),
            toctrees: BTreeSet::new(),
            warnings: BTreeMap::new(),
            snippets: SnippetStore::new(),
        }
    }
}

#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

impl Environment {
    /// Restore the environment saved at `path`.
    ///
    /// Returns `None` when nothing was saved yet or when it was written under
    /// a different environment version.
    pub fn load(path: &Path) -> Result<Option<Self>, BuildError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(BuildError::io(path, err)),
        };
        let environment_error = |source| BuildError::Environment {
            path: path.to_path_buf(),
            source,
        };

        let probe: VersionProbe = serde_json::from_str(&contents).map_err(environment_error)?;
        if probe.version != ENV_VERSION {
            info!(
                "discarding build environment written under version {} (current {ENV_VERSION})",
                probe.version
            );
            return Ok(None);
        }

        let environment: Environment =
            serde_json::from_str(&contents).map_err(environment_error)?;
        debug!(
            "restored environment with {} document(s) from {}",
            environment.documents.len(),
            path.display()
        );
        Ok(Some(environment))
    }

    pub fn save(&self, path: &Path) -> Result<(), BuildError> {
        let json = serde_json::to_string_pretty(self).map_err(|source| BuildError::Environment {
            path: path.to_path_buf(),
            source,
        })?;
        atomic_write(path, &(json + "\n")).map_err(|err| BuildError::io(path, err))
    }

    pub fn settings(&self) -> &ReadSettings {
        &self.settings
    }

    pub fn documents(&self) -> &BTreeMap<String, Fingerprint> {
        &self.documents
    }

    pub fn has_toctree(&self, docname: &str) -> bool {
        self.toctrees.contains(docname)
    }

    /// Warnings raised when each document was last read, by document name.
    pub fn warnings(&self) -> &BTreeMap<String, Vec<Warning>> {
        &self.warnings
    }

    pub fn toc(&self) -> &TocTree {
        &self.toc
    }

    pub fn snippets(&self) -> &SnippetStore {
        &self.snippets
    }

    pub(crate) fn snippets_mut(&mut self) -> &mut SnippetStore {
        &mut self.snippets
    }

    pub(crate) fn set_settings(&mut self, settings: ReadSettings) {
        self.settings = settings;
    }

    pub(crate) fn set_root(&mut self, root_doc: String) {
        self.toc.set_root(root_doc);
    }

    /// Drop what was recorded for `docname`. Its snippets are left to the
    /// extension's invalidation hook.
    pub(crate) fn forget(&mut self, docname: &str) {
        self.documents.remove(docname);
        self.toc.remove(docname);
        self.toctrees.remove(docname);
        self.warnings.remove(docname);
    }

    /// Record the outcome of reading `docname`.
    pub(crate) fn record(
        &mut self,
        docname: String,
        fingerprint: Fingerprint,
        children: Vec<String>,
        has_toctree: bool,
        warnings: Vec<Warning>,
    ) {
        if has_toctree {
            self.toctrees.insert(docname.clone());
        }
        if !warnings.is_empty() {
            self.warnings.insert(docname.clone(), warnings);
        }
        self.toc.set_children(docname.clone(), children);
        self.documents.insert(docname, fingerprint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use litprog_core::{Fragment, IncludeGraph};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempdir().unwrap();
        assert!(Environment::load(&environment_path(dir.path()))
            .unwrap()
            .is_none());
    }

    #[test]
    fn save_then_load_restores_state() {
        let dir = tempdir().unwrap();
        let path = environment_path(dir.path());

        let mut environment = Environment::default();
        environment.set_root("index".into());
        environment.record(
            "index".into(),
            Fingerprint::default(),
            vec!["guide".into()],
            true,
            vec![Warning {
                docname: Some("index".into()),
                line: Some(3),
                message: "unknown directive type \"x\"".into(),
            }],
        );
        environment
            .snippets_mut()
            .get_or_create_list("index")
            .push(Fragment::from_iter(["x = 1"]));
        environment.save(&path).unwrap();

        let restored = Environment::load(&path).unwrap().unwrap();
        assert_eq!(restored, environment);
        assert!(restored.has_toctree("index"));
        assert_eq!(restored.warnings()["index"].len(), 1);
    }

    #[test]
    fn forget_drops_everything_but_snippets() {
        let mut environment = Environment::default();
        environment.record("a".into(), Fingerprint::default(), vec!["b".into()], true, Vec::new());
        environment
            .snippets_mut()
            .get_or_create_list("a")
            .push(Fragment::from_iter(["1"]));

        environment.forget("a");
        assert!(environment.documents().is_empty());
        assert!(!environment.has_toctree("a"));
        assert!(environment.toc().children("a").is_empty());
        assert!(environment.snippets().contains("a"));
    }

    #[test]
    fn highlight_language_only_matters_with_pages() {
        let config = |pages: bool, language: &str| {
            let dir = tempdir().unwrap();
            let mut config =
                Config::load(litprog_config::LoadOptions::default().with_working_dir(dir.path()))
                    .unwrap();
            config.build.pages = pages;
            config.litprog.highlight_language = language.to_string();
            config
        };
        assert_eq!(
            ReadSettings::for_config(&config(false, "python")),
            ReadSettings::for_config(&config(false, "rust"))
        );
        assert_ne!(
            ReadSettings::for_config(&config(true, "python")),
            ReadSettings::for_config(&config(true, "rust"))
        );
    }

    #[test]
    fn other_versions_are_discarded() {
        let dir = tempdir().unwrap();
        let path = environment_path(dir.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{"version": 999, "whatever": true}"#).unwrap();

        assert!(Environment::load(&path).unwrap().is_none());
    }

    #[test]
    fn corrupt_environment_is_an_error() {
        let dir = tempdir().unwrap();
        let path = environment_path(dir.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();

        let err = Environment::load(&path).unwrap_err();
        assert!(matches!(err, BuildError::Environment { .. }));
    }
}
