//! File collaborator: project file discovery and reads.
//!
//! The audit engine never touches `std::fs` directly. It goes through the
//! [`FileSystem`] trait so the same pipeline runs against a real project
//! directory ([`LocalFs`]) or an in-memory file set ([`MemoryFs`]).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use glob_match::glob_match;
use serde::Serialize;

use crate::error::{Error, Result};

/// Directories never descended into, regardless of exclude patterns.
const SKIP_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    ".svn",
    ".hg",
    ".next",
    ".turbo",
    "target",
    "vendor",
];

/// A discovered project file. `path` is relative to the project root and
/// always uses `/` separators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub path: String,
    pub absolute_path: String,
    pub size: u64,
    pub extension: String,
    pub directory: String,
    pub name: String,
}

impl FileInfo {
    pub fn from_relative(root: &Path, relative: &str, size: u64) -> Self {
        let (directory, name) = match relative.rfind('/') {
            Some(idx) => (relative[..idx].to_string(), relative[idx + 1..].to_string()),
            None => (String::new(), relative.to_string()),
        };
        let extension = name
            .rfind('.')
            .filter(|idx| *idx > 0)
            .map(|idx| name[idx + 1..].to_lowercase())
            .unwrap_or_default();

        Self {
            path: relative.to_string(),
            absolute_path: root.join(relative).to_string_lossy().to_string(),
            size,
            extension,
            directory,
            name,
        }
    }
}

/// Trait for project file access - on disk or in memory.
pub trait FileSystem {
    /// Project root every relative path is resolved against.
    fn root(&self) -> &Path;

    /// List files matching any `include` glob and no `exclude` glob, sorted by path.
    fn scan_files(&self, include: &[String], exclude: &[String]) -> Result<Vec<FileInfo>>;

    /// Read a file by project-relative path.
    fn read(&self, path: &str) -> Result<String>;

    fn exists(&self, path: &str) -> bool;
}

/// Match `path` against any pattern. A leading `**/` also matches files at the root.
pub fn matches_any(patterns: &[String], path: &str) -> bool {
    patterns.iter().any(|pattern| {
        glob_match(pattern, path)
            || pattern
                .strip_prefix("**/")
                .is_some_and(|rest| glob_match(rest, path))
    })
}

fn read_error(path: &str, err: &std::io::Error) -> Error {
    if err.kind() == std::io::ErrorKind::NotFound {
        Error::internal_io(
            format!("File not found: {}", path),
            Some("read file".to_string()),
        )
    } else {
        Error::internal_io(err.to_string(), Some(format!("read {}", path)))
    }
}

/// Local filesystem implementation rooted at a project directory.
pub struct LocalFs {
    root: PathBuf,
}

impl LocalFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn walk(&self, dir: &Path, files: &mut Vec<(String, u64)>) -> std::io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();

            if path.is_dir() {
                if !SKIP_DIRS.contains(&name.as_str()) {
                    self.walk(&path, files)?;
                }
                continue;
            }

            let relative = path
                .strip_prefix(&self.root)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            files.push((relative, size));
        }
        Ok(())
    }
}

impl FileSystem for LocalFs {
    fn root(&self) -> &Path {
        &self.root
    }

    fn scan_files(&self, include: &[String], exclude: &[String]) -> Result<Vec<FileInfo>> {
        if !self.root.is_dir() {
            return Err(Error::validation_invalid_argument(
                "path",
                format!("Not a directory: {}", self.root.display()),
                None,
                None,
            ));
        }

        let mut found = Vec::new();
        self.walk(&self.root, &mut found)
            .map_err(|e| Error::internal_io(e.to_string(), Some("scan project".to_string())))?;

        let mut files: Vec<FileInfo> = found
            .into_iter()
            .filter(|(path, _)| matches_any(include, path) && !matches_any(exclude, path))
            .map(|(path, size)| FileInfo::from_relative(&self.root, &path, size))
            .collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    fn read(&self, path: &str) -> Result<String> {
        fs::read_to_string(self.root.join(path)).map_err(|e| read_error(path, &e))
    }

    fn exists(&self, path: &str) -> bool {
        self.root.join(path).is_file()
    }
}

/// In-memory file set keyed by project-relative path.
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
    root: PathBuf,
    files: BTreeMap<String, String>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self {
            root: PathBuf::from("/memory"),
            files: BTreeMap::new(),
        }
    }

    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&mut self, path: &str, content: &str) {
        self.files.insert(path.to_string(), content.to_string());
    }
}

impl FileSystem for MemoryFs {
    fn root(&self) -> &Path {
        &self.root
    }

    fn scan_files(&self, include: &[String], exclude: &[String]) -> Result<Vec<FileInfo>> {
        Ok(self
            .files
            .iter()
            .filter(|(path, _)| matches_any(include, path) && !matches_any(exclude, path))
            .map(|(path, content)| FileInfo::from_relative(&self.root, path, content.len() as u64))
            .collect())
    }

    fn read(&self, path: &str) -> Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            Error::internal_io(
                format!("File not found: {}", path),
                Some("read file".to_string()),
            )
        })
    }

    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn patterns(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn file_info_splits_path() {
        let info = FileInfo::from_relative(Path::new("/app"), "src/ui/Button.tsx", 10);
        assert_eq!(info.directory, "src/ui");
        assert_eq!(info.name, "Button.tsx");
        assert_eq!(info.extension, "tsx");
        assert_eq!(info.absolute_path, "/app/src/ui/Button.tsx");
    }

    #[test]
    fn dotfile_has_no_extension() {
        let info = FileInfo::from_relative(Path::new("/app"), ".env", 1);
        assert_eq!(info.extension, "");
    }

    #[test]
    fn leading_globstar_matches_root_files() {
        assert!(matches_any(&patterns(&["**/*.css"]), "app.css"));
        assert!(matches_any(&patterns(&["**/*.css"]), "src/app.css"));
        assert!(!matches_any(&patterns(&["**/*.css"]), "src/app.scss"));
    }

    #[test]
    fn local_fs_scans_and_excludes() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        fs::create_dir_all(dir.path().join("dist")).unwrap();
        fs::write(dir.path().join("src/b.css"), "a{}").unwrap();
        fs::write(dir.path().join("src/a.tsx"), "x").unwrap();
        fs::write(dir.path().join("node_modules/pkg/c.css"), "a{}").unwrap();
        fs::write(dir.path().join("dist/d.css"), "a{}").unwrap();

        let local = LocalFs::new(dir.path());
        let files = local
            .scan_files(&patterns(&["**/*.css", "**/*.tsx"]), &patterns(&["**/dist/**", "dist/**"]))
            .unwrap();

        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["src/a.tsx", "src/b.css"]);
        assert_eq!(local.read("src/b.css").unwrap(), "a{}");
        assert!(local.exists("src/a.tsx"));
        assert!(!local.exists("src/missing.tsx"));
    }

    #[test]
    fn local_fs_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let err = LocalFs::new(dir.path()).read("nope.css").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn local_fs_rejects_missing_root() {
        let local = LocalFs::new("/nonexistent/path/that/does/not/exist");
        assert!(local.scan_files(&patterns(&["**/*"]), &[]).is_err());
    }

    #[test]
    fn memory_fs_round_trips() {
        let mem = MemoryFs::new()
            .with_file("a.css", "x")
            .with_file("b.test.tsx", "y");
        let files = mem
            .scan_files(&patterns(&["**/*.css", "**/*.tsx"]), &patterns(&["**/*.test.*"]))
            .unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(mem.read("a.css").unwrap(), "x");
        assert!(mem.read("zzz").unwrap_err().is_not_found());
    }
}
