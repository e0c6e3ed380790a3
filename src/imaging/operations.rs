//! High-level image operations.
//!
//! These functions combine calculations with backend execution: they take
//! configuration, probe through the backend, and compute display sizes.

use super::backend::{Dimensions, ImageBackend, ProbeError};
use super::calculations::calculate_display_dimensions;
use crate::config::ConversionOptions;
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, ProbeError>;

/// Probe an image asset for its intrinsic dimensions.
///
/// One-shot read with no retry. Callers that need the value more than once
/// should cache it (see [`ImageReference`](crate::responsive::ImageReference)).
pub fn probe(backend: &impl ImageBackend, path: &Path) -> Result<Dimensions> {
    tracing::debug!(path = %path.display(), "probing image dimensions");
    backend.identify(path)
}

/// Display size computed for one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplaySize {
    pub width: u32,
    pub height: u32,
}

/// Compute the display size of an image with known intrinsic dimensions
/// under the active conversion options.
pub fn resolve_display_size(intrinsic: Dimensions, options: &ConversionOptions) -> DisplaySize {
    let (width, height) = calculate_display_dimensions(
        (intrinsic.width, intrinsic.height),
        options.image_width.get(),
        options.scaling,
    );
    DisplaySize { width, height }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Scaling;
    use crate::imaging::backend::tests::MockBackend;

    #[test]
    fn probe_delegates_to_backend() {
        let backend = MockBackend::new().with_image("/a/b.png", 1200, 800);
        let dims = probe(&backend, Path::new("/a/b.png")).unwrap();
        assert_eq!((dims.width, dims.height), (1200, 800));
        assert_eq!(backend.probed(), vec!["/a/b.png".to_string()]);
    }

    #[test]
    fn probe_surfaces_backend_error() {
        let backend = MockBackend::new();
        assert!(probe(&backend, Path::new("/a/missing.png")).is_err());
    }

    #[test]
    fn resolve_uses_configured_width() {
        let options = ConversionOptions::with_image_width(700).unwrap();
        let size = resolve_display_size(
            Dimensions {
                width: 1200,
                height: 800,
            },
            &options,
        );
        assert_eq!(
            size,
            DisplaySize {
                width: 700,
                height: 467
            }
        );
    }

    #[test]
    fn resolve_honours_shrink_only() {
        let options = ConversionOptions {
            scaling: Scaling::ShrinkOnly,
            ..ConversionOptions::with_image_width(700).unwrap()
        };
        let size = resolve_display_size(
            Dimensions {
                width: 320,
                height: 240,
            },
            &options,
        );
        assert_eq!(
            size,
            DisplaySize {
                width: 320,
                height: 240
            }
        );
    }
}
