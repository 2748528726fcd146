// ABOUTME: Stale archive reconciler for the output directory
// ABOUTME: Deletes local ZIP files whose names no longer match a remote directory

use anyhow::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::download::ARCHIVE_SUFFIX;
use crate::error::MirrorError;

/// Base name of an archive file, stripping exactly one trailing `.zip`.
///
/// Hidden files and a bare `.zip` are not treated as archives.
pub fn archive_base_name(file_name: &str) -> Option<&str> {
    if file_name.starts_with('.') {
        return None;
    }
    file_name
        .strip_suffix(ARCHIVE_SUFFIX)
        .filter(|base| !base.is_empty())
}

/// Removes every `*.zip` directly inside `save_dir` whose base name is not in
/// `target_set`. Returns the removed paths in file name order.
pub fn reconcile(save_dir: &Path, target_set: &[String]) -> Result<Vec<PathBuf>> {
    let known: HashSet<&str> = target_set.iter().map(String::as_str).collect();

    let entries = std::fs::read_dir(save_dir).map_err(|e| {
        MirrorError::Filesystem(format!("Cannot scan {}: {}", save_dir.display(), e))
    })?;

    let mut stale = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            MirrorError::Filesystem(format!("Cannot scan {}: {}", save_dir.display(), e))
        })?;
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }

        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            debug!("Ignoring non UTF-8 file name {:?}", entry.file_name());
            continue;
        };
        if let Some(base) = archive_base_name(file_name) {
            if !known.contains(base) {
                stale.push(entry.path());
            }
        }
    }
    stale.sort();

    for path in &stale {
        std::fs::remove_file(path).map_err(|e| {
            MirrorError::Filesystem(format!("Failed to remove {}: {}", path.display(), e))
        })?;
        info!(
            "Removed file '{}' as it seems to be obsolete.",
            path.file_name().unwrap_or_default().to_string_lossy()
        );
    }

    Ok(stale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"x").unwrap();
    }

    fn remaining(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn targets(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_archive_base_name() {
        assert_eq!(archive_base_name("Docs.zip"), Some("Docs"));
        assert_eq!(archive_base_name("pizza.zip"), Some("pizza"));
        assert_eq!(archive_base_name("a.zip.zip"), Some("a.zip"));
        assert_eq!(archive_base_name("Docs.ZIP"), None);
        assert_eq!(archive_base_name("notes.txt"), None);
        assert_eq!(archive_base_name(".zip"), None);
        assert_eq!(archive_base_name(".hidden.zip"), None);
    }

    #[test]
    fn test_reconcile_removes_unknown_archives() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "A.zip");
        touch(dir.path(), "B.zip");
        touch(dir.path(), "C.zip");

        let removed = reconcile(dir.path(), &targets(&["A", "C"])).unwrap();

        assert_eq!(removed, vec![dir.path().join("B.zip")]);
        assert_eq!(remaining(dir.path()), vec!["A.zip", "C.zip"]);
    }

    #[test]
    fn test_reconcile_uses_true_suffix() {
        let dir = TempDir::new().unwrap();
        // A character-class strip would turn "pizza.zip" into "pi".
        touch(dir.path(), "pizza.zip");
        touch(dir.path(), "pi.zip");

        let removed = reconcile(dir.path(), &targets(&["pizza"])).unwrap();

        assert_eq!(removed, vec![dir.path().join("pi.zip")]);
        assert_eq!(remaining(dir.path()), vec!["pizza.zip"]);
    }

    #[test]
    fn test_reconcile_ignores_other_entries() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "notes.txt");
        std::fs::create_dir(dir.path().join("Old.zip")).unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        touch(&dir.path().join("nested"), "Gone.zip");

        let removed = reconcile(dir.path(), &[]).unwrap();

        assert!(removed.is_empty());
        assert_eq!(remaining(dir.path()), vec!["Old.zip", "nested", "notes.txt"]);
        assert!(dir.path().join("nested").join("Gone.zip").exists());
    }

    #[test]
    fn test_reconcile_missing_dir_fails() {
        let dir = TempDir::new().unwrap();
        let err = reconcile(&dir.path().join("missing"), &[]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MirrorError>(),
            Some(MirrorError::Filesystem(_))
        ));
    }
}
