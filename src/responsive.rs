//! Responsive image attributes.
//!
//! For every image a document embeds, [`inject`] decides whether responsive
//! sizing applies, resolves the display size, and returns a new
//! [`ImageNode`] carrying the attributes the storage serializer emits:
//!
//! ```text
//! ac:width="700"  data-width="700"  data-height="467"
//! style="max-width: 100%; height: auto;"
//! ```
//!
//! Decoration applies when all of these hold:
//!
//! - responsive output is enabled in [`ConversionOptions`]
//! - the image is a local attachment (remote URLs are never probed)
//! - the asset's intrinsic dimensions can be read
//!
//! Anything else degrades to a plain image with only its original
//! attributes. A failed probe is logged, never raised: one unreadable image
//! must not abort the rest of the document.

use crate::config::ConversionOptions;
use crate::imaging::{Dimensions, ImageBackend, probe, resolve_display_size};
use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

/// Inline style carried by every responsively decorated image.
pub const RESPONSIVE_STYLE: &str = "max-width: 100%; height: auto;";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("Image source path is empty")]
    EmptySource,
}

/// Where an image's bytes live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// A local file, uploaded alongside the page as an attachment.
    Attachment(PathBuf),
    /// A URL the platform fetches itself (`https:`, `data:`, ...).
    Remote(String),
}

impl ImageSource {
    /// Classify a Markdown image destination, resolving relative paths
    /// against `base_dir`.
    ///
    /// Local destinations are URL references: any `?query` or `#fragment`
    /// is dropped and `%XX` escapes are decoded, so `my%20chart.png` and
    /// `<my chart.png>` name the same file.
    pub fn from_destination(destination: &str, base_dir: &Path) -> Self {
        if has_url_scheme(destination) {
            return ImageSource::Remote(destination.to_string());
        }
        let path = destination
            .split(['?', '#'])
            .next()
            .unwrap_or(destination);
        let decoded = percent_decode_str(path).decode_utf8_lossy();
        let relative = decoded.strip_prefix("./").unwrap_or(&*decoded);
        ImageSource::Attachment(base_dir.join(relative))
    }
}

/// True for `scheme:` prefixes per RFC 3986 (letter, then letters, digits,
/// `+`, `-` or `.`). Single letters are excluded so `C:\img.png` stays local.
fn has_url_scheme(destination: &str) -> bool {
    let Some((scheme, _)) = destination.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    scheme.len() > 1
        && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// One embedded image encountered while converting a document.
///
/// Read-only after construction. Intrinsic dimensions are probed lazily on
/// first request and cached for the life of the value, so repeated lookups
/// never re-read the asset.
#[derive(Debug)]
pub struct ImageReference {
    source: ImageSource,
    alt_text: Option<String>,
    title: Option<String>,
    intrinsic: OnceLock<Option<Dimensions>>,
}

impl ImageReference {
    pub fn new(
        source: ImageSource,
        alt_text: Option<String>,
        title: Option<String>,
    ) -> Result<Self, ReferenceError> {
        let empty = match &source {
            ImageSource::Attachment(path) => path.as_os_str().is_empty(),
            ImageSource::Remote(url) => url.is_empty(),
        };
        if empty {
            return Err(ReferenceError::EmptySource);
        }
        Ok(Self {
            source,
            alt_text: alt_text.filter(|s| !s.is_empty()),
            title: title.filter(|s| !s.is_empty()),
            intrinsic: OnceLock::new(),
        })
    }

    /// Reference to a local file.
    pub fn attachment(
        path: impl Into<PathBuf>,
        alt_text: Option<String>,
    ) -> Result<Self, ReferenceError> {
        Self::new(ImageSource::Attachment(path.into()), alt_text, None)
    }

    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    pub fn alt_text(&self) -> Option<&str> {
        self.alt_text.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Intrinsic pixel dimensions, probing the asset on first call.
    ///
    /// `None` for remote images and for assets that cannot be probed.
    pub fn intrinsic_dimensions(&self, backend: &impl ImageBackend) -> Option<Dimensions> {
        *self.intrinsic.get_or_init(|| match &self.source {
            ImageSource::Remote(_) => None,
            ImageSource::Attachment(path) => match probe(backend, path) {
                Ok(dims) => Some(dims),
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "image dimensions unknown, emitting without responsive attributes"
                    );
                    None
                }
            },
        })
    }
}

/// Sizing attributes written onto a decorated image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponsiveAttributes {
    pub width: u32,
    pub data_width: u32,
    pub data_height: u32,
    pub style: &'static str,
}

/// An image ready for serialization: the reference's data plus whatever
/// attributes the injector decided on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageNode {
    pub source: ImageSource,
    pub alt_text: Option<String>,
    pub title: Option<String>,
    /// Intrinsic size, when it was probed successfully.
    pub intrinsic: Option<Dimensions>,
    pub responsive: Option<ResponsiveAttributes>,
}

impl ImageNode {
    /// Attachment file name as the platform stores it.
    pub fn attachment_name(&self) -> Option<String> {
        match &self.source {
            ImageSource::Attachment(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
            ImageSource::Remote(_) => None,
        }
    }
}

/// Decide and compute the responsive attributes for one image.
///
/// Pure per image: the result depends only on the reference, the options,
/// and what the backend reports for this one asset.
pub fn inject(
    reference: &ImageReference,
    options: &ConversionOptions,
    backend: &impl ImageBackend,
) -> ImageNode {
    let intrinsic = reference.intrinsic_dimensions(backend);

    let responsive = intrinsic
        .filter(|_| options.responsive)
        .map(|dims| {
            let size = resolve_display_size(dims, options);
            ResponsiveAttributes {
                width: size.width,
                data_width: size.width,
                data_height: size.height,
                style: RESPONSIVE_STYLE,
            }
        });

    ImageNode {
        source: reference.source.clone(),
        alt_text: reference.alt_text.clone(),
        title: reference.title.clone(),
        intrinsic,
        responsive,
    }
}
