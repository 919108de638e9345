//! [`Surface`] over a browser `CanvasRenderingContext2d`.
//!
//! Canvas calls that can fail (`arc`) are best effort: a failed path is
//! skipped rather than aborting the frame.

use folio_core::surface::triangle_vertices;
use folio_core::{Rgba, Surface};
use glam::DVec2;
use std::f64::consts::TAU;
use web_sys::CanvasRenderingContext2d;

pub struct CanvasSurface<'a> {
    ctx: &'a CanvasRenderingContext2d,
    width: f64,
    height: f64,
}

impl<'a> CanvasSurface<'a> {
    pub fn new(ctx: &'a CanvasRenderingContext2d, width: f64, height: f64) -> Self {
        Self { ctx, width, height }
    }

    fn stroke(&self, width: f64, color: Rgba) {
        self.ctx.set_line_width(width);
        self.ctx.set_stroke_style_str(&color.to_css());
        self.ctx.stroke();
    }
}

impl Surface for CanvasSurface<'_> {
    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.ctx.clear_rect(0.0, 0.0, self.width, self.height);
    }

    fn line(&mut self, from: DVec2, to: DVec2, width: f64, color: Rgba) {
        self.ctx.begin_path();
        self.ctx.move_to(from.x, from.y);
        self.ctx.line_to(to.x, to.y);
        self.stroke(width, color);
    }

    /// One path for the whole trail instead of a stroke per segment.
    fn polyline(&mut self, points: &[DVec2], width: f64, color: Rgba) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        if rest.is_empty() {
            return;
        }
        self.ctx.begin_path();
        self.ctx.move_to(first.x, first.y);
        for p in rest {
            self.ctx.line_to(p.x, p.y);
        }
        self.stroke(width, color);
    }

    fn fill_circle(&mut self, center: DVec2, radius: f64, color: Rgba) {
        self.ctx.begin_path();
        if self.ctx.arc(center.x, center.y, radius.max(0.0), 0.0, TAU).is_ok() {
            self.ctx.set_fill_style_str(&color.to_css());
            self.ctx.fill();
        }
    }

    fn fill_square(&mut self, center: DVec2, radius: f64, color: Rgba) {
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx
            .fill_rect(center.x - radius, center.y - radius, radius * 2.0, radius * 2.0);
    }

    fn fill_triangle(&mut self, center: DVec2, radius: f64, color: Rgba) {
        let [a, b, c] = triangle_vertices(center, radius);
        self.ctx.begin_path();
        self.ctx.move_to(a.x, a.y);
        self.ctx.line_to(b.x, b.y);
        self.ctx.line_to(c.x, c.y);
        self.ctx.close_path();
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.fill();
    }

    fn set_glow(&mut self, blur: f64, color: Rgba) {
        self.ctx.set_shadow_blur(blur.max(0.0));
        self.ctx.set_shadow_color(&color.to_css());
    }
}
