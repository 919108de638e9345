#![deny(unsafe_code)]
//! Mouse-reactive particle flow field.
//!
//! Particles drift along a Perlin flow field, react to the pointer, push and
//! pull on a bounded sample of their neighbours, and respawn when their
//! lifespan runs out. The same [`ParticleField`] drives the browser canvas
//! and the CPU rasterizer through [`folio_core::Surface`].

pub mod config;
pub mod field;
pub mod gate;
pub mod particle;
pub mod render;

pub use config::{FlowConfig, Preset, MIN_LIFESPAN};
pub use field::{particle_count, ParticleField};
pub use gate::VisibilityGate;
pub use particle::{Behavior, Particle};
