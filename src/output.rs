//! CLI output formatting.
//!
//! Output is grouped per document: a header line naming the source (and the
//! file it was written to), then one indented line per embedded image with
//! its positional index and how it was sized.
//!
//! ```text
//! guide/setup.md → guide/setup.csf
//!     001 screenshot.png 1200×800 → 700×467
//!     002 diagram.svg: unsupported format
//!     003 missing.png: dimensions unknown
//!     004 https://example.com/logo.png: remote
//!
//! Converted 3 documents, 6 images (2 without dimensions)
//! ```
//!
//! Format functions return `Vec<String>` / `String` and do no I/O, so they
//! are unit-testable; the `print_*` wrappers write to stdout.

use crate::convert::ConvertedDocument;
use crate::imaging::has_supported_extension;
use crate::responsive::{ImageNode, ImageSource};

/// One line describing how an image was rendered.
pub fn image_line(index: usize, node: &ImageNode) -> String {
    let label = match &node.source {
        ImageSource::Attachment(_) => node.attachment_name().unwrap_or_default(),
        ImageSource::Remote(url) => url.clone(),
    };
    let detail = match (&node.source, node.intrinsic, &node.responsive) {
        (ImageSource::Remote(_), _, _) => ": remote".to_string(),
        (ImageSource::Attachment(path), None, _) if !has_supported_extension(path) => {
            ": unsupported format".to_string()
        }
        (_, None, _) => ": dimensions unknown".to_string(),
        (_, Some(dims), Some(attrs)) => format!(
            " {}×{} → {}×{}",
            dims.width, dims.height, attrs.data_width, attrs.data_height
        ),
        (_, Some(dims), None) => format!(" {}×{}", dims.width, dims.height),
    };
    format!("{:03} {}{}", index + 1, label, detail)
}

/// Lines for one converted document.
pub fn format_document(
    source: &str,
    written_to: Option<&str>,
    document: &ConvertedDocument,
) -> Vec<String> {
    let header = match written_to {
        Some(target) => format!("{} → {}", source, target),
        None => source.to_string(),
    };
    let mut lines = vec![header];
    lines.extend(
        document
            .images
            .iter()
            .enumerate()
            .map(|(i, node)| format!("    {}", image_line(i, node))),
    );
    lines
}

/// Closing summary line for a run.
pub fn format_summary(documents: &[&ConvertedDocument]) -> String {
    let images: usize = documents.iter().map(|d| d.images.len()).sum();
    let unknown: usize = documents
        .iter()
        .map(|d| d.unknown_dimensions().count())
        .sum();
    let plural = |n: usize, word: &str| {
        if n == 1 {
            format!("{n} {word}")
        } else {
            format!("{n} {word}s")
        }
    };
    let mut line = format!(
        "Converted {}, {}",
        plural(documents.len(), "document"),
        plural(images, "image")
    );
    if unknown > 0 {
        line.push_str(&format!(" ({unknown} without dimensions)"));
    }
    line
}

pub fn print_document(source: &str, written_to: Option<&str>, document: &ConvertedDocument) {
    for line in format_document(source, written_to, document) {
        println!("{}", line);
    }
}
