//! Image probing and display-size math. Pure Rust, header reads only.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions`, `avif-parse` |
//! | **Display size** | integer round-half-away-from-zero scaling |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
pub mod rust_backend;

pub use backend::{Dimensions, ImageBackend, ProbeError};
pub use calculations::calculate_display_dimensions;
pub use operations::{DisplaySize, probe, resolve_display_size};
pub use rust_backend::{RustBackend, has_supported_extension, supported_input_extensions};
