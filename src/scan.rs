//! Markdown source discovery.
//!
//! A conversion source is either a single Markdown file or a directory tree.
//! Directories are walked recursively; hidden entries (`.git`, `.cache`, ...)
//! are skipped. Results are sorted so runs are reproducible.
//!
//! Each source maps to an output file with the same relative path and a
//! `.csf` extension:
//!
//! ```text
//! docs/                        out/
//! ├── index.md         →       ├── index.csf
//! └── guide/                   └── guide/
//!     └── setup.md     →           └── setup.csf
//! ```

use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Extension of converted storage-format files.
pub const OUTPUT_EXTENSION: &str = "csf";

const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Failed to walk source directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Source not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Not a Markdown file: {}", .0.display())]
    NotMarkdown(PathBuf),
}

pub fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            MARKDOWN_EXTENSIONS
                .iter()
                .any(|md| e.eq_ignore_ascii_case(md))
        })
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

/// Find the Markdown files to convert under `source`.
pub fn find_markdown_files(source: &Path) -> Result<Vec<PathBuf>, ScanError> {
    if !source.exists() {
        return Err(ScanError::NotFound(source.to_path_buf()));
    }
    if source.is_file() {
        return if is_markdown(source) {
            Ok(vec![source.to_path_buf()])
        } else {
            Err(ScanError::NotMarkdown(source.to_path_buf()))
        };
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(source)
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
    {
        let entry = entry?;
        if entry.file_type().is_file() && is_markdown(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Output path for `file` when converting `source` into `output_dir`.
///
/// For a single-file source the output lands directly in `output_dir`.
pub fn output_path(source: &Path, file: &Path, output_dir: &Path) -> PathBuf {
    let relative = if source.is_file() {
        file.file_name().map(PathBuf::from).unwrap_or_default()
    } else {
        file.strip_prefix(source)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| file.to_path_buf())
    };
    output_dir.join(relative).with_extension(OUTPUT_EXTENSION)
}

/// Display path of `file` relative to the conversion source.
pub fn relative_display(source: &Path, file: &Path) -> String {
    let relative = if source.is_file() {
        file.file_name().map(Path::new).unwrap_or(file)
    } else {
        file.strip_prefix(source).unwrap_or(file)
    };
    relative.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "# Title\n").unwrap();
    }

    #[test]
    fn finds_markdown_recursively_sorted() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("zeta.md"));
        touch(&tmp.path().join("alpha.markdown"));
        touch(&tmp.path().join("guide/setup.md"));
        touch(&tmp.path().join("guide/notes.txt"));

        let files = find_markdown_files(tmp.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|f| relative_display(tmp.path(), f))
            .collect();
        assert_eq!(names, vec!["alpha.markdown", "guide/setup.md", "zeta.md"]);
    }

    #[test]
    fn skips_hidden_directories() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("index.md"));
        touch(&tmp.path().join(".git/README.md"));
        touch(&tmp.path().join(".drafts.md"));

        let files = find_markdown_files(tmp.path()).unwrap();
        assert_eq!(files, vec![tmp.path().join("index.md")]);
    }

    #[test]
    fn hidden_root_is_still_walked() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join(".docs");
        touch(&root.join("index.md"));

        let files = find_markdown_files(&root).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn single_file_source() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("page.md");
        touch(&file);

        assert_eq!(find_markdown_files(&file).unwrap(), vec![file.clone()]);
        assert_eq!(
            output_path(&file, &file, Path::new("/out")),
            PathBuf::from("/out/page.csf")
        );
        assert_eq!(relative_display(&file, &file), "page.md");
    }

    #[test]
    fn non_markdown_file_rejected() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("image.png");
        fs::write(&file, b"x").unwrap();

        assert!(matches!(
            find_markdown_files(&file),
            Err(ScanError::NotMarkdown(_))
        ));
    }

    #[test]
    fn missing_source_rejected() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            find_markdown_files(&tmp.path().join("nope")),
            Err(ScanError::NotFound(_))
        ));
    }

    #[test]
    fn output_path_mirrors_tree() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("guide/setup.md");
        touch(&file);

        assert_eq!(
            output_path(tmp.path(), &file, Path::new("/out")),
            PathBuf::from("/out/guide/setup.csf")
        );
    }

    #[test]
    fn markdown_extension_case_insensitive() {
        assert!(is_markdown(Path::new("README.MD")));
        assert!(!is_markdown(Path::new("notes.txt")));
        assert!(!is_markdown(Path::new("Makefile")));
    }
}
