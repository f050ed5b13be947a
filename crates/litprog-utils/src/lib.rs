//! Shared utilities for litprog crates.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tempfile::{Builder, NamedTempFile};

/// Map `func` over `items` in parallel, preserving input order in the result.
pub fn parallel_map<T, R, F>(items: Vec<T>, func: F) -> Vec<R>
where
    T: Send,
    R: Send,
    F: Fn(T) -> R + Send + Sync,
{
    items.into_par_iter().map(func).collect()
}

/// Write a build artifact (woven program, saved environment, rendered page)
/// so that a reader sees either the previous file or the complete new one.
///
/// The bytes go to a hidden staging file next to `path`, which is synced and
/// renamed over the target. Missing parent directories are created, and an
/// existing target keeps its permission bits.
pub fn atomic_write(path: &Path, contents: impl AsRef<[u8]>) -> io::Result<()> {
    let mut staged = staging_file(path)?;
    staged.write_all(contents.as_ref())?;
    staged.as_file().sync_all()?;
    carry_permissions(path, staged.path());
    staged.persist(path).map(drop).map_err(|err| err.error)
}

fn staging_file(path: &Path) -> io::Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    Builder::new().prefix(".litprog-").suffix(".tmp").tempfile_in(dir)
}

#[cfg(unix)]
fn carry_permissions(target: &Path, staged: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Ok(metadata) = fs::metadata(target) {
        let mode = metadata.permissions().mode();
        // Best effort; the default mode of the staging file is acceptable.
        let _ = fs::set_permissions(staged, fs::Permissions::from_mode(mode));
    }
}

#[cfg(not(unix))]
fn carry_permissions(_target: &Path, _staged: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn atomic_write_creates_parents_and_replaces_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/out.txt");

        atomic_write(&path, "first\n").unwrap();
        atomic_write(&path, "second\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second\n");
        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(".litprog"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn atomic_write_into_a_directory_path_fails() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("occupied");
        fs::create_dir(&target).unwrap();

        assert!(atomic_write(&target, "data").is_err());
        assert!(target.is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn atomic_write_keeps_mode_of_replaced_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("program.py");
        fs::write(&path, "old\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();

        atomic_write(&path, b"new\n".as_slice()).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn parallel_map_preserves_order() {
        let doubled = parallel_map((0..64).collect(), |n: u32| n * 2);
        assert_eq!(doubled, (0..64).map(|n| n * 2).collect::<Vec<_>>());
    }
}
