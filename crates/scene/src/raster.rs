//! CPU rasterizer implementing [`Surface`] over an RGBA buffer.
//!
//! Shapes are antialiased with a one-pixel coverage ramp measured from pixel
//! centers and composited source-over with straight alpha. Glow is
//! approximated by a soft radial halo painted under each fill.
//!
//! This module is always available (no feature gate) so that tests and the
//! CLI `profile` command can render without pulling in the `image` crate.

use folio_core::surface::triangle_vertices;
use folio_core::{FieldError, Rgba, Surface};
use glam::DVec2;

/// Halo opacity relative to the glow color at the shape's edge.
const GLOW_STRENGTH: f64 = 0.5;

/// An in-memory drawing surface.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    width: usize,
    height: usize,
    background: Rgba,
    pixels: Vec<Rgba>,
    glow: Option<(f64, Rgba)>,
}

impl RasterSurface {
    /// Creates a transparent surface.
    ///
    /// Returns `FieldError::InvalidDimensions` if either dimension is zero.
    pub fn new(width: usize, height: usize) -> Result<Self, FieldError> {
        if width == 0 || height == 0 {
            return Err(FieldError::InvalidDimensions);
        }
        let len = width.checked_mul(height).ok_or(FieldError::InvalidDimensions)?;
        Ok(Self {
            width,
            height,
            background: Rgba::TRANSPARENT,
            pixels: vec![Rgba::TRANSPARENT; len],
            glow: None,
        })
    }

    /// Sets the color `clear` fills with and clears to it.
    pub fn with_background(mut self, background: Rgba) -> Self {
        self.background = background;
        self.clear();
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Color at `(x, y)`, or `None` outside the surface.
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgba> {
        (x < self.width && y < self.height).then(|| self.pixels[y * self.width + x])
    }

    /// Quantized RGBA8 buffer, row-major, `width * height * 4` bytes.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|c| c.to_rgba8()).collect()
    }

    fn blend(&mut self, x: usize, y: usize, color: Rgba, coverage: f64) {
        let sa = color.a * coverage.clamp(0.0, 1.0);
        if sa <= 0.0 {
            return;
        }
        let dst = &mut self.pixels[y * self.width + x];
        let da = dst.a * (1.0 - sa);
        let out_a = sa + da;
        if out_a <= 0.0 {
            return;
        }
        let mix = |s: f64, d: f64| (s * sa + d * da) / out_a;
        *dst = Rgba {
            r: mix(color.r, dst.r),
            g: mix(color.g, dst.g),
            b: mix(color.b, dst.b),
            a: out_a,
        };
    }

    /// Visits every pixel whose center lies in the box `[min, max]`, clipped
    /// to the surface, passing the pixel center.
    fn each_pixel_in(&mut self, min: DVec2, max: DVec2, mut f: impl FnMut(&mut Self, usize, usize, DVec2)) {
        if !(min.is_finite() && max.is_finite()) {
            return;
        }
        let x0 = min.x.floor().max(0.0) as usize;
        let y0 = min.y.floor().max(0.0) as usize;
        let x1 = (max.x.ceil().max(0.0) as usize).min(self.width);
        let y1 = (max.y.ceil().max(0.0) as usize).min(self.height);
        for y in y0..y1 {
            for x in x0..x1 {
                let center = DVec2::new(x as f64 + 0.5, y as f64 + 0.5);
                f(self, x, y, center);
            }
        }
    }

    fn halo(&mut self, center: DVec2, radius: f64) {
        let Some((blur, color)) = self.glow else {
            return;
        };
        let outer = radius + blur;
        let reach = DVec2::splat(outer);
        self.each_pixel_in(center - reach, center + reach, |s, x, y, p| {
            let d = p.distance(center);
            if d > radius && d < outer {
                let t = 1.0 - (d - radius) / blur;
                s.blend(x, y, color, GLOW_STRENGTH * t * t);
            }
        });
    }
}

/// Distance from `p` to the segment `a`–`b`.
fn segment_distance(p: DVec2, a: DVec2, b: DVec2) -> f64 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Signed area test: positive when `p` is left of `a`→`b`.
fn edge(a: DVec2, b: DVec2, p: DVec2) -> f64 {
    (b - a).perp_dot(p - a)
}

impl Surface for RasterSurface {
    fn size(&self) -> (f64, f64) {
        (self.width as f64, self.height as f64)
    }

    fn clear(&mut self) {
        let bg = self.background;
        self.pixels.fill(bg);
    }

    fn line(&mut self, from: DVec2, to: DVec2, width: f64, color: Rgba) {
        let half = width.max(0.0) / 2.0;
        let pad = DVec2::splat(half + 1.0);
        self.each_pixel_in(from.min(to) - pad, from.max(to) + pad, |s, x, y, p| {
            let d = segment_distance(p, from, to);
            s.blend(x, y, color, half + 0.5 - d);
        });
    }

    fn fill_circle(&mut self, center: DVec2, radius: f64, color: Rgba) {
        self.halo(center, radius);
        let pad = DVec2::splat(radius + 1.0);
        self.each_pixel_in(center - pad, center + pad, |s, x, y, p| {
            s.blend(x, y, color, radius + 0.5 - p.distance(center));
        });
    }

    fn fill_square(&mut self, center: DVec2, radius: f64, color: Rgba) {
        self.halo(center, radius);
        let pad = DVec2::splat(radius + 1.0);
        self.each_pixel_in(center - pad, center + pad, |s, x, y, p| {
            let d = (p - center).abs().max_element();
            s.blend(x, y, color, radius + 0.5 - d);
        });
    }

    fn fill_triangle(&mut self, center: DVec2, radius: f64, color: Rgba) {
        self.halo(center, radius);
        let [a, b, c] = triangle_vertices(center, radius);
        let pad = DVec2::splat(1.0);
        let min = a.min(b).min(c) - pad;
        let max = a.max(b).max(c) + pad;
        self.each_pixel_in(min, max, |s, x, y, p| {
            let (e0, e1, e2) = (edge(a, b, p), edge(b, c, p), edge(c, a, p));
            let inside = (e0 >= 0.0 && e1 >= 0.0 && e2 >= 0.0) || (e0 <= 0.0 && e1 <= 0.0 && e2 <= 0.0);
            let coverage = if inside {
                1.0
            } else {
                let d = segment_distance(p, a, b)
                    .min(segment_distance(p, b, c))
                    .min(segment_distance(p, c, a));
                0.5 - d
            };
            s.blend(x, y, color, coverage);
        });
    }

    fn set_glow(&mut self, blur: f64, color: Rgba) {
        self.glow = (blur > 0.0 && blur.is_finite()).then_some((blur, color));
    }
}
