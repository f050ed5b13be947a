//! Configuration loader for litprog builds.
//!
//! Settings are stacked from four layers, later ones winning per key:
//! built-in defaults, the repository's `.litprog.toml`, the working
//! directory's `.litprog.toml`, and an explicit `--config` file. Every value
//! remembers which layer set it, so relative paths resolve against the
//! directory of the file that declared them and validation errors can point
//! at the offending file.

mod error;
mod layer;
mod pattern;
mod source;

use std::path::PathBuf;

pub use error::{ConfigError, ConfigValidationError, ConfigValidationErrors};
pub use pattern::{Pattern, PatternList};
pub use source::{ConfigSource, ConfigSourceKind, ConfigSources};

use layer::Layer;

pub const CONFIG_FILE_NAME: &str = ".litprog.toml";

/// Default name of the woven output file, relative to the output directory.
pub const DEFAULT_OUTPUT_FILENAME: &str = "litprog.py";

/// Placeholder language label handed to the code-block renderer when a
/// directive supplies no language of its own.
pub const DEFAULT_HIGHLIGHT_LANGUAGE: &str = "default";

const DEFAULT_ROOT_DOC: &str = "index";
const DEFAULT_OUTPUT_DIR: &str = "_build";

#[derive(Clone, Debug)]
pub struct Config {
    pub project: ProjectSettings,
    pub build: BuildSettings,
    pub litprog: LitProgSettings,
    pub sources: ConfigSources,
}

/// Where the documentation sources live.
#[derive(Clone, Debug)]
pub struct ProjectSettings {
    pub name: Option<String>,
    pub source_dir: PathBuf,
    /// Document name of the TOC root, without suffix.
    pub root_doc: String,
    /// Globs relative to `source_dir`.
    pub exclude: PatternList,
}

#[derive(Clone, Debug)]
pub struct BuildSettings {
    pub output_dir: PathBuf,
    pub fail_on_warning: bool,
    pub pages: bool,
}

/// Settings read by the litprog extension itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LitProgSettings {
    pub output_filename: String,
    pub highlight_language: String,
}

impl Default for LitProgSettings {
    fn default() -> Self {
        LitProgSettings {
            output_filename: DEFAULT_OUTPUT_FILENAME.to_owned(),
            highlight_language: DEFAULT_HIGHLIGHT_LANGUAGE.to_owned(),
        }
    }
}

/// Loader inputs, usually filled from command-line flags.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub override_path: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
}

impl LoadOptions {
    pub fn with_override_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_path = Some(path.into());
        self
    }

    pub fn with_working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }
}

impl Config {
    /// Resolve every layer that applies and validate the result.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let working_dir = source::working_directory(options.working_dir)?;
        let sources = ConfigSources::discover(working_dir, options.override_path)?;
        let defaults = ConfigSource::defaults(&sources.working_directory);

        let mut stack = Layer::defaults(&defaults);
        for file in sources.files() {
            stack.overlay(Layer::read(file)?);
        }
        let resolved = stack.resolve(&defaults).map_err(ConfigError::Validation)?;

        Ok(Config {
            project: resolved.project,
            build: resolved.build,
            litprog: resolved.litprog,
            sources,
        })
    }

    /// Path of the woven output file.
    pub fn output_file(&self) -> PathBuf {
        self.build.output_dir.join(&self.litprog.output_filename)
    }
}
