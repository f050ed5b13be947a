//! Where configuration layers come from.

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::CONFIG_FILE_NAME;

/// Kinds of configuration sources, from lowest to highest precedence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigSourceKind {
    Default,
    GitRoot,
    Local,
    Override,
}

impl fmt::Display for ConfigSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConfigSourceKind::Default => "built-in defaults",
            ConfigSourceKind::GitRoot => "repository config",
            ConfigSourceKind::Local => "working-directory config",
            ConfigSourceKind::Override => "--config file",
        })
    }
}

/// One layer of configuration. Relative paths declared by the layer resolve
/// against `base_dir`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigSource {
    pub kind: ConfigSourceKind,
    pub path: Option<PathBuf>,
    pub base_dir: PathBuf,
}

impl ConfigSource {
    pub(crate) fn defaults(base_dir: &Path) -> Self {
        ConfigSource {
            kind: ConfigSourceKind::Default,
            path: None,
            base_dir: base_dir.to_path_buf(),
        }
    }

    fn file(kind: ConfigSourceKind, path: PathBuf) -> Self {
        let base_dir = match path.parent() {
            Some(parent) => parent.to_path_buf(),
            None => PathBuf::from("."),
        };
        ConfigSource {
            kind,
            path: Some(path),
            base_dir,
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{} {}", self.kind, path.display()),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// The layers that produced a [`Config`](crate::Config), in precedence order.
#[derive(Clone, Debug)]
pub struct ConfigSources {
    pub working_directory: PathBuf,
    pub layers: Vec<ConfigSource>,
}

impl ConfigSources {
    /// Collect the defaults layer plus every config file that applies to
    /// `working_dir`. A file is used once even if it qualifies for several
    /// layers; the highest one wins.
    pub(crate) fn discover(
        working_dir: PathBuf,
        override_path: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let override_path = override_path.map(|path| {
            if path.is_absolute() {
                path
            } else {
                working_dir.join(path)
            }
        });
        if let Some(path) = &override_path {
            if !path.is_file() {
                return Err(ConfigError::OverrideNotFound { path: path.clone() });
            }
        }

        let mut candidates: Vec<(ConfigSourceKind, PathBuf)> = Vec::new();
        if let Some(root) = enclosing_repository(&working_dir) {
            candidates.push((ConfigSourceKind::GitRoot, root.join(CONFIG_FILE_NAME)));
        }
        candidates.push((ConfigSourceKind::Local, working_dir.join(CONFIG_FILE_NAME)));
        if let Some(path) = override_path {
            candidates.push((ConfigSourceKind::Override, path));
        }

        let mut layers = vec![ConfigSource::defaults(&working_dir)];
        for (idx, (kind, path)) in candidates.iter().enumerate() {
            let shadowed = candidates[idx + 1..]
                .iter()
                .any(|(_, later)| later == path);
            if !shadowed && path.is_file() {
                layers.push(ConfigSource::file(*kind, path.clone()));
            }
        }

        Ok(ConfigSources {
            working_directory: working_dir,
            layers,
        })
    }

    /// Layers backed by a file, lowest precedence first.
    pub fn files(&self) -> impl Iterator<Item = &ConfigSource> {
        self.layers.iter().filter(|layer| layer.path.is_some())
    }
}

/// Absolute working directory, either the given one or the process's.
pub(crate) fn working_directory(requested: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    match requested {
        Some(dir) => fs::canonicalize(&dir).map_err(|source| ConfigError::WorkingDirectory {
            attempted: dir,
            source,
        }),
        None => env::current_dir().map_err(|source| ConfigError::WorkingDirectory {
            attempted: PathBuf::from("."),
            source,
        }),
    }
}

/// Closest ancestor of `start` (inclusive) holding a `.git` entry.
fn enclosing_repository(start: &Path) -> Option<&Path> {
    start.ancestors().find(|dir| dir.join(".git").exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn local_file_inside_repository_root_is_used_once() {
        let dir = tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        fs::create_dir(root.join(".git")).unwrap();
        fs::write(root.join(CONFIG_FILE_NAME), "").unwrap();

        let sources = ConfigSources::discover(root.clone(), None).unwrap();
        let kinds: Vec<_> = sources.layers.iter().map(|layer| layer.kind).collect();
        assert_eq!(kinds, vec![ConfigSourceKind::Default, ConfigSourceKind::Local]);
        assert_eq!(sources.files().count(), 1);
    }

    #[test]
    fn source_display_names_the_file() {
        let source = ConfigSource::file(ConfigSourceKind::Override, PathBuf::from("/x/o.toml"));
        assert_eq!(source.to_string(), "--config file /x/o.toml");
        assert_eq!(source.base_dir, PathBuf::from("/x"));
    }
}
