use std::path::{Component, Path};

use walkdir::WalkDir;

use crate::error::IgnoreResult;
use crate::matcher::IgnoreMatcher;

/// Repo-relative, `/`-separated form of `path` under `root`.
///
/// Returns `None` if `path` is not inside `root`, or is `root` itself.
pub fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

impl IgnoreMatcher {
    /// Every regular, non-excluded file under `dir`, as paths relative to
    /// `root`, sorted.
    ///
    /// Excluded directories (including the metadata directory) are pruned
    /// before descending.
    pub fn walk(&self, root: &Path, dir: &Path) -> IgnoreResult<Vec<String>> {
        let mut files = Vec::new();
        let walker = WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| match relative_path(root, entry.path()) {
                Some(rel) => !self.is_excluded(&rel),
                None => true,
            });
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(rel) = relative_path(root, entry.path()) {
                files.push(rel);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Every regular file under `root` that is not excluded.
    pub fn walk_tree(&self, root: &Path) -> IgnoreResult<Vec<String>> {
        self.walk(root, root)
    }

    /// Files under `root` that the patterns ignore.
    ///
    /// Ignored directories are pruned before descending, so their contents
    /// are not listed individually.
    pub fn list_ignored(&self, root: &Path) -> IgnoreResult<Vec<String>> {
        let mut ignored = Vec::new();
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                if !entry.file_type().is_dir() {
                    return true;
                }
                match relative_path(root, entry.path()) {
                    Some(rel) => !self.should_ignore(&rel),
                    None => true,
                }
            });
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(rel) = relative_path(root, entry.path()) {
                if self.should_ignore(&rel) {
                    ignored.push(rel);
                }
            }
        }
        ignored.sort();
        Ok(ignored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn populate(root: &Path) {
        for (rel, body) in [
            ("a.txt", "a"),
            ("debug.log", "log"),
            ("src/main.rs", "fn main() {}"),
            ("src/trace.log", "log"),
            ("target/debug/app", "bin"),
            (".loam/index", "{}"),
        ] {
            let path = root.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        }
    }

    #[test]
    fn relative_paths_use_forward_slashes() {
        let root = Path::new("/repo");
        assert_eq!(
            relative_path(root, Path::new("/repo/src/lib.rs")).as_deref(),
            Some("src/lib.rs")
        );
        assert_eq!(relative_path(root, Path::new("/repo")), None);
        assert_eq!(relative_path(root, Path::new("/elsewhere/x")), None);
    }

    #[test]
    fn walk_skips_ignored_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        populate(dir.path());
        let m = IgnoreMatcher::from_patterns(".loam", ["*.log", "target/"]).unwrap();

        let files = m.walk_tree(dir.path()).unwrap();
        assert_eq!(files, vec!["a.txt", "src/main.rs"]);
    }

    #[test]
    fn walk_subdirectory_keeps_root_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        populate(dir.path());
        let m = IgnoreMatcher::empty(".loam");

        let files = m.walk(dir.path(), &dir.path().join("src")).unwrap();
        assert_eq!(files, vec!["src/main.rs", "src/trace.log"]);
    }

    #[test]
    fn list_ignored_prunes_ignored_directories() {
        let dir = tempfile::tempdir().unwrap();
        populate(dir.path());
        let m = IgnoreMatcher::from_patterns(".loam", ["*.log", "target/"]).unwrap();

        let ignored = m.list_ignored(dir.path()).unwrap();
        assert_eq!(ignored, vec!["debug.log", "src/trace.log"]);
    }
}
