//! Marker scan: source lines containing a marker token become diagnostics.

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::core::types::Diagnostic;

/// Marker used by `notes` mode when none is configured.
pub const DEFAULT_MARKER: &str = "TODO";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerScan {
    pub root: PathBuf,
    pub marker: String,
    /// File-name suffixes, e.g. `.go`.
    pub extensions: Vec<String>,
}

impl MarkerScan {
    /// Scan `root` and return one diagnostic per matching line.
    ///
    /// Files are visited in file-name order; hidden directories are skipped.
    /// Unreadable files are logged and skipped.
    pub fn scan(&self) -> Vec<Diagnostic> {
        let mut found = Vec::new();
        if self.marker.is_empty() {
            return found;
        }
        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(err = %err, "skipping unreadable path during marker scan");
                    continue;
                }
            };
            if !entry.file_type().is_file() || !self.matches_extension(entry.path()) {
                continue;
            }
            self.scan_file(entry.path(), &mut found);
        }
        debug!(root = %self.root.display(), hits = found.len(), "marker scan finished");
        found
    }

    fn scan_file(&self, path: &Path, found: &mut Vec<Diagnostic>) {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) => {
                warn!(path = %path.display(), err = %err, "skipping file during marker scan");
                return;
            }
        };
        let file = reported_path(&self.root, path).display().to_string();
        for (index, line) in contents.lines().enumerate() {
            let Some(offset) = line.find(&self.marker) else {
                continue;
            };
            let column = line[..offset].chars().count() + 1;
            found.push(Diagnostic::new(
                file.clone(),
                u32::try_from(index + 1).unwrap_or(u32::MAX),
                Some(u32::try_from(column).unwrap_or(u32::MAX)),
                line[offset..].trim(),
            ));
        }
    }

    fn matches_extension(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            return false;
        };
        self.extensions.iter().any(|ext| name.ends_with(ext.as_str()))
    }
}

/// Path of a scanned file as seen from the working directory.
///
/// `root` is kept as a prefix unless it is the working directory itself.
fn reported_path(root: &Path, path: &Path) -> PathBuf {
    let relative = path.strip_prefix(root).unwrap_or(path);
    if root.components().all(|component| component == Component::CurDir) {
        relative.to_path_buf()
    } else {
        root.join(relative)
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(root: &Path) -> MarkerScan {
        MarkerScan {
            root: root.to_path_buf(),
            marker: "TODO".to_string(),
            extensions: vec![".go".to_string()],
        }
    }

    fn under(root: &Path, relative: &str) -> String {
        root.join(relative).display().to_string()
    }

    #[test]
    fn reports_one_diagnostic_per_matching_line() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(
            temp.path().join("main.go"),
            "package main\n\n\t// TODO: handle errors\nfunc main() {} // TODO later TODO\n",
        )
        .expect("write");

        let file = under(temp.path(), "main.go");
        let hits = scan(temp.path()).scan();
        assert_eq!(
            hits,
            vec![
                Diagnostic::new(file.clone(), 3, Some(5), "TODO: handle errors"),
                Diagnostic::new(file, 4, Some(19), "TODO later TODO"),
            ]
        );
    }

    #[test]
    fn column_counts_characters_not_bytes() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("a.go"), "// é TODO\n").expect("write");
        let hits = scan(temp.path()).scan();
        assert_eq!(hits[0].column, Some(6));
    }

    #[test]
    fn skips_other_extensions_and_hidden_directories() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("notes.md"), "TODO\n").expect("write");
        fs::create_dir_all(temp.path().join(".git")).expect("mkdir");
        fs::write(temp.path().join(".git/hook.go"), "TODO\n").expect("write");
        fs::create_dir_all(temp.path().join("pkg")).expect("mkdir");
        fs::write(temp.path().join("pkg/b.go"), "x := 1 // TODO\n").expect("write");

        let hits = scan(temp.path()).scan();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].file, under(temp.path(), "pkg/b.go"));
    }

    #[test]
    fn visits_files_in_name_order() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("b.go"), "TODO b\n").expect("write");
        fs::write(temp.path().join("a.go"), "TODO a\n").expect("write");

        let files: Vec<String> = scan(temp.path())
            .scan()
            .into_iter()
            .map(|hit| hit.file)
            .collect();
        assert_eq!(
            files,
            vec![under(temp.path(), "a.go"), under(temp.path(), "b.go")]
        );
    }

    #[test]
    fn hits_under_a_subdirectory_root_open_from_the_workdir() {
        let workdir = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(workdir.path().join("pkg")).expect("mkdir");
        fs::write(workdir.path().join("pkg/b.go"), "// TODO\n").expect("write");

        let hits = scan(&workdir.path().join("pkg")).scan();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].file, under(workdir.path(), "pkg/b.go"));
        assert!(workdir.path().join(&hits[0].file).is_file());
    }

    #[test]
    fn reported_path_keeps_relative_root_prefix() {
        assert_eq!(
            reported_path(Path::new("pkg"), Path::new("pkg/b.go")),
            PathBuf::from("pkg/b.go")
        );
        assert_eq!(
            reported_path(Path::new("."), Path::new("./a.go")),
            PathBuf::from("a.go")
        );
        assert_eq!(
            reported_path(Path::new("./"), Path::new("./sub/a.go")),
            PathBuf::from("sub/a.go")
        );
    }
}
