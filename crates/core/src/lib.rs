#![deny(unsafe_code)]
//! Core types for the folio particle field background.
//!
//! Provides the `FlowField` angle grid, the `Surface` drawing trait shared by
//! the browser and CPU renderers, `Rgba` colors with CSS parsing, `Palette`
//! color variants, the `Xorshift64` PRNG, the injected `FrameMonitor`, and
//! JSON parameter helpers.

pub mod color;
pub mod error;
pub mod field;
pub mod monitor;
pub mod palette;
pub mod params;
pub mod prng;
pub mod surface;

pub use color::Rgba;
pub use error::FieldError;
pub use field::FlowField;
pub use monitor::{FrameMonitor, QualityTier};
pub use palette::Palette;
pub use prng::Xorshift64;
pub use surface::{Shape, Surface};
