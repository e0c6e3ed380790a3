//! # md2storage
//!
//! Converts Markdown documents into a wiki platform's storage format: XHTML
//! with `ac:` / `ri:` namespaced elements for platform constructs. The part
//! that needs care is images, which get responsive sizing attributes so
//! they render at a consistent width whatever their pixel size.
//!
//! # Architecture
//!
//! ```text
//! Markdown ──pulldown-cmark──▶ events ──split──▶ image references
//!                                                      │ probe + scale (rayon)
//!                                                      ▼
//! storage XHTML ◀──push_html── events + <ac:image> ◀── image nodes
//! ```
//!
//! For each image the converter asks the attribute injector for a node; the
//! injector probes the asset's intrinsic size once, scales it to the
//! configured width, and attaches `width`, `data-width`, `data-height` and
//! `style`. Images that cannot be probed are emitted without them and the
//! document still converts.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`convert`] | Document conversion: event splitting, parallel injection, emission |
//! | [`responsive`] | Image references, the per-image attribute decision, image nodes |
//! | [`imaging`] | Dimension probing backends and display-size math |
//! | [`storage`] | `ac:image` serialization and attribute escaping |
//! | [`config`] | `md2storage.toml` loading, validation, layering, conversion options |
//! | [`cache`] | Content-addressed dimension cache shared across runs |
//! | [`scan`] | Markdown source discovery and output path mapping |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Always Render at the Configured Width
//!
//! By default every probed image renders at `images.width`, including images
//! narrower than it. A document's images then share one layout width; the
//! inline `max-width: 100%; height: auto;` style keeps them fluid in narrow
//! containers. `scaling = "shrink-only"` opts out of upscaling.
//!
//! ## Exact Rounding
//!
//! Heights are `round(width × h / w)` with halves rounded away from zero,
//! computed in integers so the same inputs give byte-identical markup on
//! every platform.
//!
//! ## No Global State
//!
//! [`config::ConversionOptions`] is built once per run and passed by
//! reference. Image nodes are returned, not mutated in place, so converting
//! one image never affects another.

pub mod cache;
pub mod config;
pub mod convert;
pub mod imaging;
pub mod output;
pub mod responsive;
pub mod scan;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_helpers;
