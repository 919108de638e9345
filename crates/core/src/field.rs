//! Flow field: a coarse grid of steering angles covering the canvas.
//!
//! The grid has `floor(width / resolution) × floor(height / resolution)`
//! cells (never fewer than one per axis) stored row-major. Every frame the
//! whole grid is regenerated from 3D Perlin noise sampled at
//! `(col · scale, row · scale, time)`, so the field drifts smoothly over time
//! while staying a pure function of its seed and the elapsed time.

use crate::error::FieldError;
use noise::{NoiseFn, Perlin};
use std::f64::consts::TAU;

/// Default spatial frequency of the noise, per cell.
pub const DEFAULT_NOISE_SCALE: f64 = 0.1;
/// Default number of full turns the noise range [-1, 1] maps onto.
pub const DEFAULT_TURNS: f64 = 1.0;

/// Grid of angles (radians) sampled from time-varying Perlin noise.
#[derive(Clone)]
pub struct FlowField {
    cols: usize,
    rows: usize,
    resolution: usize,
    data: Vec<f64>,
    noise: Perlin,
    scale: f64,
    turns: f64,
}

impl std::fmt::Debug for FlowField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowField")
            .field("cols", &self.cols)
            .field("rows", &self.rows)
            .field("resolution", &self.resolution)
            .field("scale", &self.scale)
            .field("turns", &self.turns)
            .finish_non_exhaustive()
    }
}

/// Cell counts for a canvas, at least one per axis.
fn grid_dims(width: usize, height: usize, resolution: usize) -> (usize, usize) {
    ((width / resolution).max(1), (height / resolution).max(1))
}

impl FlowField {
    /// Builds a zeroed field for a `width × height` pixel canvas.
    ///
    /// Returns `FieldError::InvalidDimensions` if any of `width`, `height`
    /// or `resolution` is zero.
    pub fn new(
        width: usize,
        height: usize,
        resolution: usize,
        seed: u32,
    ) -> Result<Self, FieldError> {
        if width == 0 || height == 0 || resolution == 0 {
            return Err(FieldError::InvalidDimensions);
        }
        let (cols, rows) = grid_dims(width, height, resolution);
        let len = cols.checked_mul(rows).ok_or(FieldError::InvalidDimensions)?;
        Ok(Self {
            cols,
            rows,
            resolution,
            data: vec![0.0; len],
            noise: Perlin::new(seed),
            scale: DEFAULT_NOISE_SCALE,
            turns: DEFAULT_TURNS,
        })
    }

    /// Overrides the noise frequency and angular range.
    pub fn with_noise(mut self, scale: f64, turns: f64) -> Self {
        self.scale = scale;
        self.turns = turns;
        self
    }

    /// Re-grids the field for a new canvas size. Angles are reset to zero
    /// until the next [`FlowField::regenerate`].
    pub fn resize(&mut self, width: usize, height: usize) -> Result<(), FieldError> {
        if width == 0 || height == 0 {
            return Err(FieldError::InvalidDimensions);
        }
        let (cols, rows) = grid_dims(width, height, self.resolution);
        let len = cols.checked_mul(rows).ok_or(FieldError::InvalidDimensions)?;
        self.cols = cols;
        self.rows = rows;
        self.data.clear();
        self.data.resize(len, 0.0);
        Ok(())
    }

    /// Recomputes every cell for the given elapsed time in seconds.
    pub fn regenerate(&mut self, time: f64) {
        let cols = self.cols;
        let scale = self.scale;
        let turns = self.turns;
        let noise = &self.noise;
        self.data.iter_mut().enumerate().for_each(|(i, angle)| {
            let col = (i % cols) as f64;
            let row = (i / cols) as f64;
            *angle = noise.get([col * scale, row * scale, time]).clamp(-1.0, 1.0) * TAU * turns;
        });
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Cell edge length in pixels.
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Angle of the cell at `(col, row)`; coordinates are clamped to the grid.
    pub fn angle(&self, col: usize, row: usize) -> f64 {
        let c = col.min(self.cols - 1);
        let r = row.min(self.rows - 1);
        self.data[r * self.cols + c]
    }

    /// Angle under a pixel position. Positions outside the canvas use the
    /// nearest edge cell.
    pub fn angle_at(&self, x: f64, y: f64) -> f64 {
        let res = self.resolution as f64;
        let col = if x.is_finite() { (x / res).max(0.0) as usize } else { 0 };
        let row = if y.is_finite() { (y / res).max(0.0) as usize } else { 0 };
        self.angle(col, row)
    }

    /// Iterates `(col, row, angle)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.data
            .iter()
            .enumerate()
            .map(|(i, &a)| (i % self.cols, i / self.cols, a))
    }
}
