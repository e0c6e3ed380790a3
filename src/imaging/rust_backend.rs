//! Pure Rust probing backend. Reads headers only, never full pixel data.
//!
//! ## Crate mapping
//!
//! | Format | Crate / function |
//! |---|---|
//! | JPEG, PNG, GIF, TIFF, WebP | `image::ImageReader::into_dimensions` (header decode) |
//! | AVIF | `avif-parse` container metadata (`ispe` box) |
//!
//! Every probe opens the file through an owned reader that is dropped on
//! return, so handles are released on success, decode failure, and I/O
//! error alike.

use super::backend::{Dimensions, ImageBackend, ProbeError};
use image::{ImageFormat, ImageReader};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::LazyLock;

/// Extensions whose header decoders are compiled in.
///
/// AVIF is listed separately: the `image` crate cannot read AVIF without the
/// `avif-native` feature, so AVIF headers go through `avif-parse` instead.
const RASTER_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("gif", ImageFormat::Gif),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    let mut exts: Vec<&'static str> = RASTER_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect();
    exts.push("avif");
    exts
});

/// Returns the set of image file extensions this backend can probe.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Whether `path` carries an extension this backend has a header reader for.
pub fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            supported_input_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
}

/// Header-reading backend built on the `image` crate ecosystem.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn is_avif(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("avif"))
}

/// Extract dimensions from an AVIF file's container metadata (no decode needed).
fn identify_avif(path: &Path) -> Result<Dimensions, ProbeError> {
    let mut reader = BufReader::new(File::open(path)?);
    let avif = avif_parse::read_avif(&mut reader).map_err(|e| {
        ProbeError::Decode(format!("Failed to parse AVIF {}: {e:?}", path.display()))
    })?;
    let meta = avif.primary_item_metadata().map_err(|e| {
        ProbeError::Decode(format!(
            "Failed to read AVIF metadata {}: {e:?}",
            path.display()
        ))
    })?;
    Ok(Dimensions {
        width: meta.max_frame_width.get(),
        height: meta.max_frame_height.get(),
    })
}

/// Read dimensions from a raster header, sniffing the format from content
/// so misnamed files still probe correctly.
fn identify_raster(path: &Path) -> Result<Dimensions, ProbeError> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    match reader.format() {
        Some(format) if format.reading_enabled() => {}
        _ => return Err(ProbeError::Unsupported(path.to_path_buf())),
    }
    let (width, height) = reader.into_dimensions().map_err(|e| {
        ProbeError::Decode(format!("Failed to decode {}: {}", path.display(), e))
    })?;
    Ok(Dimensions { width, height })
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, ProbeError> {
        let dims = if is_avif(path) {
            identify_avif(path)?
        } else {
            identify_raster(path)?
        };
        if dims.width == 0 || dims.height == 0 {
            return Err(ProbeError::Empty(path.to_path_buf()));
        }
        Ok(dims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{write_jpeg, write_png};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn identify_png() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("chart.png");
        write_png(&path, 120, 80);

        let dims = RustBackend::new().identify(&path).unwrap();
        assert_eq!(
            dims,
            Dimensions {
                width: 120,
                height: 80
            }
        );
    }

    #[test]
    fn identify_jpeg() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("photo.jpg");
        write_jpeg(&path, 64, 48);

        let dims = RustBackend::new().identify(&path).unwrap();
        assert_eq!((dims.width, dims.height), (64, 48));
    }

    #[test]
    fn identify_sniffs_misnamed_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("actually-png.jpg");
        write_png(&path, 30, 10);

        let dims = RustBackend::new().identify(&path).unwrap();
        assert_eq!((dims.width, dims.height), (30, 10));
    }

    #[test]
    fn identify_missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let result = RustBackend::new().identify(&tmp.path().join("nope.png"));
        assert!(matches!(result, Err(ProbeError::Io(_))));
    }

    #[test]
    fn identify_svg_is_unsupported() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("diagram.svg");
        fs::write(
            &path,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"/>"#,
        )
        .unwrap();

        let result = RustBackend::new().identify(&path);
        assert!(matches!(result, Err(ProbeError::Unsupported(_))));
    }

    #[test]
    fn identify_truncated_png_is_decode_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.png");
        // Valid PNG signature, no IHDR chunk
        fs::write(&path, b"\x89PNG\r\n\x1a\n").unwrap();

        let result = RustBackend::new().identify(&path);
        assert!(matches!(result, Err(ProbeError::Decode(_))));
    }

    #[test]
    fn identify_garbage_avif_is_decode_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.avif");
        fs::write(&path, b"not an avif file").unwrap();

        let result = RustBackend::new().identify(&path);
        assert!(matches!(result, Err(ProbeError::Decode(_))));
    }

    #[test]
    fn supported_extensions_include_common_formats() {
        let exts = supported_input_extensions();
        for ext in ["jpg", "png", "gif", "webp", "avif"] {
            assert!(exts.contains(&ext), "missing {ext}");
        }
        assert!(!exts.contains(&"svg"));
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(has_supported_extension(Path::new("docs/Chart.PNG")));
        assert!(has_supported_extension(Path::new("photo.jpeg")));
        assert!(!has_supported_extension(Path::new("diagram.svg")));
        assert!(!has_supported_extension(Path::new("README")));
    }
}
