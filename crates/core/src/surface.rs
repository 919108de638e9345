//! The drawing target the particle field renders onto.
//!
//! `Surface` mirrors the handful of 2D canvas operations the renderer needs.
//! The browser binding forwards them to `CanvasRenderingContext2d`; the CPU
//! rasterizer in `folio-scene` implements them over an RGBA buffer. The trait
//! is object-safe so renderers take `&mut dyn Surface`.

use crate::color::Rgba;
use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Body shape of a particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Circle,
    Square,
    Triangle,
}

impl Shape {
    pub const ALL: [Shape; 3] = [Shape::Circle, Shape::Square, Shape::Triangle];
}

/// Vertices of an upward-pointing equilateral triangle inscribed in a circle
/// of `radius` around `center` (y grows downward).
pub fn triangle_vertices(center: DVec2, radius: f64) -> [DVec2; 3] {
    let half_base = radius * 3f64.sqrt() / 2.0;
    [
        DVec2::new(center.x, center.y - radius),
        DVec2::new(center.x + half_base, center.y + radius / 2.0),
        DVec2::new(center.x - half_base, center.y + radius / 2.0),
    ]
}

/// Minimal 2D drawing API used by the particle renderer.
pub trait Surface {
    /// Drawable size in pixels.
    fn size(&self) -> (f64, f64);

    /// Clears the whole surface to transparent.
    fn clear(&mut self);

    /// Strokes a straight segment.
    fn line(&mut self, from: DVec2, to: DVec2, width: f64, color: Rgba);

    /// Fills a circle.
    fn fill_circle(&mut self, center: DVec2, radius: f64, color: Rgba);

    /// Fills an axis-aligned square with half-extent `radius`.
    fn fill_square(&mut self, center: DVec2, radius: f64, color: Rgba);

    /// Fills the triangle given by [`triangle_vertices`].
    fn fill_triangle(&mut self, center: DVec2, radius: f64, color: Rgba);

    /// Sets the glow (shadow blur) applied to subsequent fills.
    /// A `blur` of 0 disables it.
    fn set_glow(&mut self, blur: f64, color: Rgba);

    /// Strokes consecutive segments through `points`.
    fn polyline(&mut self, points: &[DVec2], width: f64, color: Rgba) {
        for pair in points.windows(2) {
            self.line(pair[0], pair[1], width, color);
        }
    }

    /// Fills a particle body of the given shape.
    fn fill_shape(&mut self, shape: Shape, center: DVec2, radius: f64, color: Rgba) {
        match shape {
            Shape::Circle => self.fill_circle(center, radius, color),
            Shape::Square => self.fill_square(center, radius, color),
            Shape::Triangle => self.fill_triangle(center, radius, color),
        }
    }
}
