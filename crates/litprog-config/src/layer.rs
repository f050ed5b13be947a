//! Sparse per-file settings stacked into the final configuration.

use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use crate::error::{ConfigError, ConfigValidationError, ConfigValidationErrors};
use crate::pattern::{Pattern, PatternList};
use crate::source::ConfigSource;
use crate::{
    BuildSettings, LitProgSettings, ProjectSettings, DEFAULT_HIGHLIGHT_LANGUAGE,
    DEFAULT_OUTPUT_DIR, DEFAULT_OUTPUT_FILENAME, DEFAULT_ROOT_DOC,
};

/// A value together with the layer that set it.
#[derive(Clone, Debug)]
struct Sourced<T> {
    value: T,
    source: ConfigSource,
}

/// Replace `slot` when the higher layer set the value.
fn overlay<T>(slot: &mut Option<Sourced<T>>, higher: Option<Sourced<T>>) {
    if higher.is_some() {
        *slot = higher;
    }
}

fn stamp<T>(value: Option<T>, source: &ConfigSource) -> Option<Sourced<T>> {
    value.map(|value| Sourced {
        value,
        source: source.clone(),
    })
}

/// Every setting one layer may supply.
#[derive(Clone, Debug, Default)]
pub(crate) struct Layer {
    name: Option<Sourced<String>>,
    source_dir: Option<Sourced<PathBuf>>,
    root_doc: Option<Sourced<String>>,
    exclude: Option<Sourced<Vec<String>>>,
    output_dir: Option<Sourced<PathBuf>>,
    fail_on_warning: Option<Sourced<bool>>,
    pages: Option<Sourced<bool>>,
    output_filename: Option<Sourced<String>>,
    highlight_language: Option<Sourced<String>>,
}

pub(crate) struct Resolved {
    pub project: ProjectSettings,
    pub build: BuildSettings,
    pub litprog: LitProgSettings,
}

impl Layer {
    pub(crate) fn defaults(source: &ConfigSource) -> Self {
        Layer {
            name: None,
            source_dir: stamp(Some(PathBuf::from(".")), source),
            root_doc: stamp(Some(DEFAULT_ROOT_DOC.to_owned()), source),
            exclude: stamp(Some(Vec::new()), source),
            output_dir: stamp(Some(PathBuf::from(DEFAULT_OUTPUT_DIR)), source),
            fail_on_warning: stamp(Some(false), source),
            pages: stamp(Some(false), source),
            output_filename: stamp(Some(DEFAULT_OUTPUT_FILENAME.to_owned()), source),
            highlight_language: stamp(Some(DEFAULT_HIGHLIGHT_LANGUAGE.to_owned()), source),
        }
    }

    /// Parse the config file behind `source`.
    pub(crate) fn read(source: &ConfigSource) -> Result<Self, ConfigError> {
        let path = source.path.as_deref().unwrap_or(Path::new(""));
        let text = fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.to_path_buf(),
            source: err,
        })?;
        let file: ConfigFile = toml::from_str(&text).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            source: err,
        })?;

        let project = file.project.unwrap_or_default();
        let build = file.build.unwrap_or_default();
        let litprog = file.litprog.unwrap_or_default();
        Ok(Layer {
            name: stamp(project.name, source),
            source_dir: stamp(project.source_dir, source),
            root_doc: stamp(project.root_doc, source),
            exclude: stamp(project.exclude, source),
            output_dir: stamp(build.output_dir, source),
            fail_on_warning: stamp(build.fail_on_warning, source),
            pages: stamp(build.pages, source),
            output_filename: stamp(litprog.output_filename, source),
            highlight_language: stamp(litprog.highlight_language, source),
        })
    }

    /// Stack `higher` on top of this layer.
    pub(crate) fn overlay(&mut self, higher: Layer) {
        overlay(&mut self.name, higher.name);
        overlay(&mut self.source_dir, higher.source_dir);
        overlay(&mut self.root_doc, higher.root_doc);
        overlay(&mut self.exclude, higher.exclude);
        overlay(&mut self.output_dir, higher.output_dir);
        overlay(&mut self.fail_on_warning, higher.fail_on_warning);
        overlay(&mut self.pages, higher.pages);
        overlay(&mut self.output_filename, higher.output_filename);
        overlay(&mut self.highlight_language, higher.highlight_language);
    }

    /// Validate the stacked values and produce typed settings. All problems
    /// are reported together.
    pub(crate) fn resolve(self, defaults: &ConfigSource) -> Result<Resolved, ConfigValidationErrors> {
        let mut errors = Vec::new();
        let or_default = |slot: Option<Sourced<String>>, fallback: &str| {
            slot.unwrap_or_else(|| Sourced {
                value: fallback.to_owned(),
                source: defaults.clone(),
            })
        };

        let root_doc = or_default(self.root_doc, DEFAULT_ROOT_DOC);
        let root_doc_name = root_doc.value.trim().trim_start_matches('/').to_string();
        if root_doc_name.is_empty() {
            errors.push(ConfigValidationError::new(
                "project.root_doc",
                "cannot be empty",
                &root_doc.source,
            ));
        } else if root_doc_name.ends_with(".md") {
            errors.push(ConfigValidationError::new(
                "project.root_doc",
                format!("'{root_doc_name}' is a file name; give the document name without .md"),
                &root_doc.source,
            ));
        }

        let mut exclude = Vec::new();
        if let Some(globs) = self.exclude {
            for glob in globs.value {
                match Pattern::new(glob.as_str()) {
                    Ok(pattern) => exclude.push(pattern),
                    Err(err) => errors.push(ConfigValidationError::new(
                        "project.exclude",
                        format!("invalid glob '{glob}': {err}"),
                        &globs.source,
                    )),
                }
            }
        }

        let output_filename = or_default(self.output_filename, DEFAULT_OUTPUT_FILENAME);
        if output_filename.value.trim().is_empty() {
            errors.push(ConfigValidationError::new(
                "litprog.output_filename",
                "cannot be empty",
                &output_filename.source,
            ));
        } else if !Path::new(&output_filename.value)
            .components()
            .all(|part| matches!(part, Component::Normal(_)))
        {
            errors.push(ConfigValidationError::new(
                "litprog.output_filename",
                format!(
                    "'{}' must be relative to the output directory",
                    output_filename.value
                ),
                &output_filename.source,
            ));
        }

        let highlight_language = or_default(self.highlight_language, DEFAULT_HIGHLIGHT_LANGUAGE);
        let highlight_language_name = highlight_language.value.trim().to_string();
        if highlight_language_name.is_empty() {
            errors.push(ConfigValidationError::new(
                "litprog.highlight_language",
                "cannot be empty",
                &highlight_language.source,
            ));
        }

        if !errors.is_empty() {
            return Err(ConfigValidationErrors(errors));
        }

        let flag = |slot: Option<Sourced<bool>>| slot.map(|flag| flag.value).unwrap_or(false);
        Ok(Resolved {
            project: ProjectSettings {
                name: self.name.map(|name| name.value),
                source_dir: resolve_dir(self.source_dir, ".", defaults),
                root_doc: root_doc_name,
                exclude: exclude.into_iter().collect(),
            },
            build: BuildSettings {
                output_dir: resolve_dir(self.output_dir, DEFAULT_OUTPUT_DIR, defaults),
                fail_on_warning: flag(self.fail_on_warning),
                pages: flag(self.pages),
            },
            litprog: LitProgSettings {
                output_filename: output_filename.value,
                highlight_language: highlight_language_name,
            },
        })
    }
}

/// Absolute directory for a path setting, relative to its declaring layer.
fn resolve_dir(slot: Option<Sourced<PathBuf>>, fallback: &str, defaults: &ConfigSource) -> PathBuf {
    let (path, base) = match &slot {
        Some(sourced) => (sourced.value.as_path(), sourced.source.base_dir.as_path()),
        None => (Path::new(fallback), defaults.base_dir.as_path()),
    };
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        lexical_normalize(&base.join(path))
    }
}

/// Fold `.` and `..` without touching the filesystem.
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut folded = PathBuf::new();
    for part in path.components() {
        match part {
            Component::CurDir => {}
            Component::ParentDir if folded.pop() => {}
            other => folded.push(other.as_os_str()),
        }
    }
    folded
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    project: Option<ProjectTable>,
    build: Option<BuildTable>,
    litprog: Option<LitProgTable>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProjectTable {
    name: Option<String>,
    source_dir: Option<PathBuf>,
    root_doc: Option<String>,
    exclude: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct BuildTable {
    output_dir: Option<PathBuf>,
    fail_on_warning: Option<bool>,
    pages: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LitProgTable {
    output_filename: Option<String>,
    highlight_language: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexical_normalize_folds_parent_components() {
        assert_eq!(
            lexical_normalize(Path::new("/a/b/../c/./d")),
            PathBuf::from("/a/c/d")
        );
    }

    #[test]
    fn higher_layers_only_replace_what_they_set() {
        let base = ConfigSource::defaults(Path::new("/project"));
        let mut stack = Layer::defaults(&base);
        stack.overlay(Layer {
            pages: stamp(Some(true), &base),
            ..Layer::default()
        });

        let resolved = stack.resolve(&base).unwrap();
        assert!(resolved.build.pages);
        assert_eq!(resolved.project.root_doc, "index");
        assert_eq!(resolved.build.output_dir, PathBuf::from("/project/_build"));
    }
}
