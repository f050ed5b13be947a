//! Source discovery and document naming.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use litprog_config::PatternList;
use walkdir::{DirEntry, WalkDir};

use crate::error::BuildError;

const SOURCE_SUFFIX: &str = "md";

/// Collect every Markdown source below `source_dir`, keyed by document name.
///
/// Hidden directories, `output_dir` and paths matching `exclude` (relative to
/// `source_dir`) are skipped.
pub fn discover(
    source_dir: &Path,
    output_dir: &Path,
    exclude: &PatternList,
) -> Result<BTreeMap<String, PathBuf>, BuildError> {
    let mut documents = BTreeMap::new();
    let walker = WalkDir::new(source_dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || (!is_hidden(entry)
                    && entry.path() != output_dir
                    && !is_excluded(entry.path(), source_dir, exclude))
        });

    for entry in walker {
        let entry = entry.map_err(|source| BuildError::Discovery {
            root: source_dir.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(source_dir) else {
            continue;
        };
        if let Some(docname) = docname_for(relative) {
            documents.insert(docname, entry.path().to_path_buf());
        }
    }

    Ok(documents)
}

/// Document name for a source path relative to the source directory:
/// `/`-separated and without the `.md` suffix.
pub fn docname_for(relative: &Path) -> Option<String> {
    if relative.extension().and_then(|ext| ext.to_str()) != Some(SOURCE_SUFFIX) {
        return None;
    }
    let stem = relative.with_extension("");
    let mut parts = Vec::new();
    for component in stem.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            _ => return None,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

fn is_excluded(path: &Path, source_dir: &Path, exclude: &PatternList) -> bool {
    path.strip_prefix(source_dir)
        .map(|relative| exclude.is_match(relative))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn docnames_drop_suffix_and_use_slashes() {
        assert_eq!(
            docname_for(Path::new("guide/setup.md")).as_deref(),
            Some("guide/setup")
        );
        assert_eq!(docname_for(Path::new("index.md")).as_deref(), Some("index"));
        assert_eq!(docname_for(Path::new("notes.txt")), None);
        assert_eq!(docname_for(Path::new("../escape.md")), None);
    }
}
