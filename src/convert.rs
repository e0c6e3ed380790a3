//! Markdown → storage-format conversion.
//!
//! A document is converted in three steps:
//!
//! ```text
//! 1. Split    pulldown-cmark events  →  events + image references (document order)
//! 2. Inject   image references       →  annotated image nodes     (parallel, rayon)
//! 3. Emit     events + nodes         →  storage-format XHTML
//! ```
//!
//! Every image span (`Start(Image)` … `End(Image)`) is lifted out of the
//! event stream and replaced by a placeholder. Injection is independent per
//! image, so it runs on the rayon pool; results are collected back in
//! document order and each placeholder becomes the serialized `ac:image`
//! element. Everything that is not an image goes through pulldown-cmark's
//! HTML writer unchanged.

use crate::config::ConversionOptions;
use crate::imaging::ImageBackend;
use crate::responsive::{ImageNode, ImageReference, ImageSource, inject};
use crate::storage::render_image;
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd, html};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result of converting one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedDocument {
    /// Storage-format markup.
    pub xhtml: String,
    /// Annotated images in document order.
    pub images: Vec<ImageNode>,
}

impl ConvertedDocument {
    /// Local files the document embeds, deduplicated, in document order.
    pub fn attachments(&self) -> Vec<&Path> {
        let mut seen: Vec<&Path> = Vec::new();
        for node in &self.images {
            if let ImageSource::Attachment(path) = &node.source
                && !seen.contains(&path.as_path())
            {
                seen.push(path);
            }
        }
        seen
    }

    /// Local images emitted without responsive attributes because their
    /// dimensions could not be read.
    pub fn unknown_dimensions(&self) -> impl Iterator<Item = &ImageNode> {
        self.images.iter().filter(|node| {
            matches!(node.source, ImageSource::Attachment(_)) && node.intrinsic.is_none()
        })
    }
}

/// Event stream with image spans replaced by indices into the image list.
enum Piece<'a> {
    Event(Event<'a>),
    Image(usize),
}

fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

/// An image span being collected.
struct OpenImage<'a> {
    destination: String,
    title: String,
    alt: String,
    /// Original events, replayed verbatim if the span cannot become a reference.
    raw: Vec<Event<'a>>,
    /// Nested image tags inside the alt text.
    depth: usize,
}

/// Start collecting a span if `event` opens an image.
fn open_image<'a>(event: &Event<'_>) -> Option<OpenImage<'a>> {
    match event {
        Event::Start(Tag::Image {
            dest_url, title, ..
        }) => Some(OpenImage {
            destination: dest_url.to_string(),
            title: title.to_string(),
            alt: String::new(),
            raw: Vec::new(),
            depth: 0,
        }),
        _ => None,
    }
}

/// Lift image spans out of the event stream.
fn split_images<'a>(
    events: impl Iterator<Item = Event<'a>>,
    base_dir: &Path,
) -> (Vec<Piece<'a>>, Vec<ImageReference>) {
    let mut pieces = Vec::new();
    let mut references = Vec::new();
    let mut open: Option<OpenImage<'a>> = None;

    for event in events {
        if open.is_none() {
            open = open_image(&event);
            match open.as_mut() {
                Some(image) => image.raw.push(event),
                None => pieces.push(Piece::Event(event)),
            }
            continue;
        }
        let Some(image) = open.as_mut() else {
            continue;
        };

        if image.depth == 0 && matches!(event, Event::End(TagEnd::Image)) {
            image.raw.push(event);
            if let Some(image) = open.take() {
                close_image(image, base_dir, &mut pieces, &mut references);
            }
            continue;
        }

        match &event {
            Event::Start(Tag::Image { .. }) => image.depth += 1,
            Event::End(TagEnd::Image) => image.depth -= 1,
            Event::Text(text) | Event::Code(text) | Event::InlineMath(text) => {
                image.alt.push_str(text)
            }
            Event::SoftBreak | Event::HardBreak => image.alt.push(' '),
            _ => {}
        }
        image.raw.push(event);
    }

    // Unterminated span: pulldown-cmark always closes tags, but keep the
    // events rather than drop them.
    if let Some(image) = open {
        pieces.extend(image.raw.into_iter().map(Piece::Event));
    }

    (pieces, references)
}

fn close_image<'a>(
    image: OpenImage<'a>,
    base_dir: &Path,
    pieces: &mut Vec<Piece<'a>>,
    references: &mut Vec<ImageReference>,
) {
    let destination = image.destination.trim();
    let reference = if destination.is_empty() {
        None
    } else {
        ImageReference::new(
            ImageSource::from_destination(destination, base_dir),
            Some(image.alt),
            Some(image.title),
        )
        .ok()
    };

    match reference {
        Some(reference) => {
            pieces.push(Piece::Image(references.len()));
            references.push(reference);
        }
        None => {
            tracing::warn!("image with empty source left unconverted");
            pieces.extend(image.raw.into_iter().map(Piece::Event));
        }
    }
}

/// Convert Markdown text whose relative image paths resolve against
/// `base_dir`.
pub fn convert_str(
    markdown: &str,
    base_dir: &Path,
    options: &ConversionOptions,
    backend: &impl ImageBackend,
) -> ConvertedDocument {
    let parser = Parser::new_ext(markdown, markdown_options());
    let (pieces, references) = split_images(parser, base_dir);

    let images: Vec<ImageNode> = references
        .par_iter()
        .map(|reference| inject(reference, options, backend))
        .collect();

    let events = pieces.into_iter().map(|piece| match piece {
        Piece::Event(event) => event,
        Piece::Image(index) => Event::InlineHtml(render_image(&images[index]).into()),
    });

    let mut xhtml = String::new();
    html::push_html(&mut xhtml, events);

    ConvertedDocument { xhtml, images }
}

/// Read and convert one Markdown file. Relative image paths resolve against
/// the file's directory.
pub fn convert_file(
    path: &Path,
    options: &ConversionOptions,
    backend: &impl ImageBackend,
) -> Result<ConvertedDocument, ConvertError> {
    let markdown = fs::read_to_string(path).map_err(|source| ConvertError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let document = convert_str(&markdown, base_dir, options, backend);
    tracing::info!(
        path = %path.display(),
        images = document.images.len(),
        "converted document"
    );
    Ok(document)
}

/// Convert many files in parallel. Results keep the input order; one file's
/// failure does not affect the others.
pub fn convert_files(
    paths: &[PathBuf],
    options: &ConversionOptions,
    backend: &impl ImageBackend,
) -> Vec<Result<ConvertedDocument, ConvertError>> {
    paths
        .par_iter()
        .map(|path| convert_file(path, options, backend))
        .collect()
}

/// Write a converted document's markup to `target`, creating parent
/// directories as needed.
pub fn write_document(document: &ConvertedDocument, target: &Path) -> Result<(), ConvertError> {
    let write_error = |source: std::io::Error| ConvertError::Write {
        path: target.to_path_buf(),
        source,
    };
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(write_error)?;
    }
    fs::write(target, &document.xhtml).map_err(write_error)
}
