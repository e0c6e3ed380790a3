//! Shared test utilities for the md2storage test suite.
//!
//! Writes real image files (via the `image` crate) and Markdown documents
//! into temp directories so tests exercise the production probing backend.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! write_png(&tmp.path().join("large.png"), 1200, 800);
//! write_doc(tmp.path(), "index.md", "![Large](large.png)");
//! ```

use image::{ImageFormat, RgbImage};
use std::path::{Path, PathBuf};

// =========================================================================
// Image fixtures
// =========================================================================

/// Write a blank PNG of the given size, regardless of the path's extension.
pub fn write_png(path: &Path, width: u32, height: u32) {
    write_image(path, width, height, ImageFormat::Png);
}

/// Write a blank JPEG of the given size.
pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    write_image(path, width, height, ImageFormat::Jpeg);
}

fn write_image(path: &Path, width: u32, height: u32, format: ImageFormat) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    RgbImage::new(width, height)
        .save_with_format(path, format)
        .unwrap_or_else(|e| panic!("failed to write {}: {e}", path.display()));
}

// =========================================================================
// Document fixtures
// =========================================================================

/// Write a Markdown document under `dir` and return its path.
pub fn write_doc(dir: &Path, name: &str, markdown: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, markdown).unwrap();
    path
}

/// Number of non-overlapping occurrences of `needle` in `haystack`.
pub fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConversionOptions;
    use crate::convert::convert_file;
    use crate::imaging::RustBackend;
    use tempfile::TempDir;

    /// Mirrors the responsive-image fixture: a large landscape image and a
    /// smaller one, both referenced from one page.
    fn responsive_fixture() -> (TempDir, PathBuf) {
        let tmp = TempDir::new().unwrap();
        write_png(&tmp.path().join("images/large.png"), 1200, 800);
        write_jpeg(&tmp.path().join("images/medium.jpg"), 600, 400);
        let doc = write_doc(
            tmp.path(),
            "responsive_test.md",
            "# Responsive images\n\n\
             ![Large image](images/large.png)\n\n\
             ![Medium image](images/medium.jpg)\n\n\
             ![Another large](./images/large.png)\n",
        );
        (tmp, doc)
    }

    #[test]
    fn responsive_images_end_to_end() {
        let (_tmp, doc) = responsive_fixture();
        let options = ConversionOptions::with_image_width(700).unwrap();

        let xhtml = convert_file(&doc, &options, &RustBackend::new())
            .unwrap()
            .xhtml;

        assert!(xhtml.contains(r#"width="700""#));
        assert!(xhtml.contains(r#"data-width="700""#));
        assert!(xhtml.contains(r#"style="max-width: 100%; height: auto;""#));
        assert!(xhtml.contains(r#"data-height="467""#));
        assert!(count(&xhtml, r#"width="700""#) >= 2);
    }

    #[test]
    fn custom_image_width_end_to_end() {
        let (_tmp, doc) = responsive_fixture();
        let options = ConversionOptions::with_image_width(500).unwrap();

        let xhtml = convert_file(&doc, &options, &RustBackend::new())
            .unwrap()
            .xhtml;

        assert!(xhtml.contains(r#"width="500""#));
        assert!(xhtml.contains(r#"data-width="500""#));
        assert!(xhtml.contains(r#"style="max-width: 100%; height: auto;""#));
        // 500 * 800 / 1200 = 333.33, 500 * 400 / 600 = 333.33
        assert_eq!(count(&xhtml, r#"data-height="333""#), 3);
    }

    #[test]
    fn missing_asset_degrades_end_to_end() {
        let (tmp, _) = responsive_fixture();
        let doc = write_doc(
            tmp.path(),
            "broken.md",
            "![Gone](images/gone.png)\n\n![Large](images/large.png)\n",
        );
        let options = ConversionOptions::with_image_width(700).unwrap();

        let converted = convert_file(&doc, &options, &RustBackend::new()).unwrap();

        assert_eq!(converted.images.len(), 2);
        assert_eq!(count(&converted.xhtml, "data-width="), 1);
        assert_eq!(count(&converted.xhtml, "data-height="), 1);
        assert_eq!(count(&converted.xhtml, "style="), 1);
        assert!(converted.xhtml.contains(r#"ri:filename="gone.png""#));
    }
}
