//! Variant generation in pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Fit** | `resize_exact` (Lanczos3) at planned dimensions |
//! | **Crop** | `resize_to_fill` (Lanczos3) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for size planning (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: Size registry → written variants + metadata
//! - **Generator**: [`VariantGenerator`], the seam used by the batch core

pub mod backend;
mod calculations;
pub mod generator;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
// Re-exported for tests (operations.rs, generator.rs tests use this)
#[cfg(test)]
pub use backend::Dimensions;
pub use calculations::{constrain_dimensions, plan_size};
pub use generator::{BackendGenerator, GenerateError, Generation, VariantGenerator};
pub use operations::{generate_variants, get_dimensions, mime_type_for_extension};
pub use params::{Quality, ResizeParams};
pub use rust_backend::RustBackend;
