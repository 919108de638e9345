//! Drawing a [`ParticleField`] onto a [`Surface`].
//!
//! Layers are drawn back to front: connective lines, trails, then bodies.
//! Quality tiers thin out connections and switch glow off.

use crate::field::ParticleField;
use crate::particle::Particle;
use folio_core::{Rgba, Surface};

/// Trail stroke width relative to the particle size.
const TRAIL_WIDTH_SCALE: f64 = 0.5;

/// Connective line candidates for particle `i`: indices of later particles
/// closer than `max_dist`, nearest first, at most `max` of them.
pub fn connections(particles: &[Particle], i: usize, max_dist: f64, max: usize) -> Vec<(usize, f64)> {
    if max == 0 {
        return Vec::new();
    }
    let here = particles[i].position;
    let mut near: Vec<(usize, f64)> = particles
        .iter()
        .enumerate()
        .skip(i + 1)
        .map(|(j, p)| (j, here.distance(p.position)))
        .filter(|&(_, d)| d < max_dist)
        .collect();
    near.sort_by(|a, b| a.1.total_cmp(&b.1));
    near.truncate(max);
    near
}

/// Connective lines for a whole frame as `(i, j, distance)` with `i < j`.
/// Each particle takes part in at most `max` lines, counting both ends;
/// nearer candidates claim slots first.
pub fn links(particles: &[Particle], max_dist: f64, max: usize) -> Vec<(usize, usize, f64)> {
    if max == 0 {
        return Vec::new();
    }
    let mut degree = vec![0_usize; particles.len()];
    let mut out = Vec::new();
    for i in 0..particles.len() {
        for (j, dist) in connections(particles, i, max_dist, usize::MAX) {
            if degree[i] >= max {
                break;
            }
            if degree[j] >= max {
                continue;
            }
            degree[i] += 1;
            degree[j] += 1;
            out.push((i, j, dist));
        }
    }
    out
}

impl ParticleField {
    /// Clears `surface` and draws the current frame.
    pub fn render(&self, surface: &mut dyn Surface) {
        surface.clear();
        self.render_connections(surface);
        self.render_trails(surface);
        self.render_bodies(surface);
    }

    fn render_connections(&self, surface: &mut dyn Surface) {
        let config = self.config();
        let max = (config.max_connections as f64 * self.quality().connection_scale()).round() as usize;
        let link = self.palette().link();
        let particles = self.particles();
        for (i, j, dist) in links(particles, config.link_distance, max) {
            let (a, b) = (&particles[i], &particles[j]);
            let falloff = 1.0 - dist / config.link_distance;
            let alpha = link.a * config.link_alpha * falloff * a.alpha.min(b.alpha);
            if alpha <= 0.0 {
                continue;
            }
            surface.line(a.position, b.position, config.link_width, link.with_alpha(alpha));
        }
    }

    fn render_trails(&self, surface: &mut dyn Surface) {
        let config = self.config();
        if config.trail_length == 0 {
            return;
        }
        let mut points = Vec::with_capacity(config.trail_length + 1);
        for p in self.particles() {
            if p.trail_len() == 0 || p.alpha <= 0.0 {
                continue;
            }
            points.clear();
            points.extend(p.trail());
            points.push(p.position);
            let color = self.palette().color(p.variant);
            let alpha = color.a * p.alpha * config.trail_alpha;
            surface.polyline(&points, p.size * TRAIL_WIDTH_SCALE, color.with_alpha(alpha));
        }
    }

    fn render_bodies(&self, surface: &mut dyn Surface) {
        let config = self.config();
        let glow = config.glow_blur > 0.0 && self.quality().glow_enabled();
        let mut glowing = false;
        for p in self.particles() {
            if p.alpha <= 0.0 {
                continue;
            }
            let color = self.palette().color(p.variant);
            let (radius, fill) = if p.captured {
                (p.size * config.capture_scale, color.with_alpha(p.alpha))
            } else {
                (p.size, color.with_alpha(color.a * p.alpha))
            };
            // Captured particles always glow; the rest only when enabled.
            let wants_glow = p.captured || glow;
            if wants_glow {
                let blur = config.glow_blur.max(if p.captured { radius * 4.0 } else { 0.0 });
                surface.set_glow(blur, color);
                glowing = true;
            } else if glowing {
                surface.set_glow(0.0, Rgba::TRANSPARENT);
                glowing = false;
            }
            surface.fill_shape(p.shape, p.position, radius, fill);
        }
        if glowing {
            surface.set_glow(0.0, Rgba::TRANSPARENT);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FlowConfig, Preset};
    use folio_core::{QualityTier, Shape};
    use glam::DVec2;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Clear,
        Line(DVec2, DVec2, Rgba),
        Fill(Shape, DVec2, f64, Rgba),
        Glow(f64),
    }

    #[derive(Default)]
    struct Recorder {
        ops: Vec<Op>,
    }

    impl Surface for Recorder {
        fn size(&self) -> (f64, f64) {
            (400.0, 300.0)
        }
        fn clear(&mut self) {
            self.ops.push(Op::Clear);
        }
        fn line(&mut self, from: DVec2, to: DVec2, _width: f64, color: Rgba) {
            self.ops.push(Op::Line(from, to, color));
        }
        fn fill_circle(&mut self, c: DVec2, r: f64, color: Rgba) {
            self.ops.push(Op::Fill(Shape::Circle, c, r, color));
        }
        fn fill_square(&mut self, c: DVec2, r: f64, color: Rgba) {
            self.ops.push(Op::Fill(Shape::Square, c, r, color));
        }
        fn fill_triangle(&mut self, c: DVec2, r: f64, color: Rgba) {
            self.ops.push(Op::Fill(Shape::Triangle, c, r, color));
        }
        fn set_glow(&mut self, blur: f64, _color: Rgba) {
            self.ops.push(Op::Glow(blur));
        }
    }

    impl Recorder {
        fn fills(&self) -> usize {
            self.ops.iter().filter(|o| matches!(o, Op::Fill(..))).count()
        }
        fn lines(&self) -> usize {
            self.ops.iter().filter(|o| matches!(o, Op::Line(..))).count()
        }
    }

    /// A settled field: every particle mid-life and visible.
    fn settled(config: FlowConfig) -> ParticleField {
        let mut f = ParticleField::new(400, 300, 11, config).unwrap();
        for frame in 0..80 {
            f.advance_frame(frame as f64 * 16.0);
        }
        f
    }

    fn points(xs: &[(f64, f64)]) -> Vec<Particle> {
        let f = ParticleField::new(400, 300, 1, FlowConfig::default()).unwrap();
        let template = f.particles()[0].clone();
        xs.iter()
            .map(|&(x, y)| {
                let mut p = template.clone();
                p.position = DVec2::new(x, y);
                p
            })
            .collect()
    }

    #[test]
    fn connections_are_sorted_and_capped() {
        let ps = points(&[(0.0, 0.0), (30.0, 0.0), (10.0, 0.0), (20.0, 0.0), (500.0, 0.0)]);
        let near = connections(&ps, 0, 110.0, 2);
        assert_eq!(near.iter().map(|c| c.0).collect::<Vec<_>>(), vec![2, 3]);
        assert!(connections(&ps, 0, 110.0, 0).is_empty());
        assert!(connections(&ps, 4, 110.0, 3).is_empty());
    }

    #[test]
    fn links_cap_both_ends_of_every_line() {
        // Four particles clustered around a hub at the last index.
        let ps = points(&[(90.0, 100.0), (110.0, 100.0), (100.0, 90.0), (100.0, 110.0), (100.0, 100.0)]);
        let lines = links(&ps, 110.0, 2);
        let mut degree = [0_usize; 5];
        for &(i, j, _) in &lines {
            assert!(i < j);
            degree[i] += 1;
            degree[j] += 1;
        }
        assert!(degree.iter().all(|&d| d <= 2), "degrees {degree:?}");
        assert_eq!(degree[4], 2);
        assert!(links(&ps, 110.0, 0).is_empty());
    }

    #[test]
    fn render_clears_first_and_draws_every_visible_body() {
        let f = settled(FlowConfig::default());
        let mut r = Recorder::default();
        f.render(&mut r);
        assert_eq!(r.ops[0], Op::Clear);
        let visible = f.particles().iter().filter(|p| p.alpha > 0.0).count();
        assert_eq!(r.fills(), visible);
    }

    #[test]
    fn bodies_draw_after_lines() {
        let f = settled(FlowConfig::default());
        let mut r = Recorder::default();
        f.render(&mut r);
        let first_fill = r.ops.iter().position(|o| matches!(o, Op::Fill(..)));
        let last_line = r.ops.iter().rposition(|o| matches!(o, Op::Line(..)));
        if let (Some(fill), Some(line)) = (first_fill, last_line) {
            assert!(line < fill);
        }
    }

    #[test]
    fn minimal_quality_drops_connections_and_glow() {
        let mut f = settled(FlowConfig {
            trail_length: 0,
            ..FlowConfig::default()
        });
        f.apply_quality(QualityTier::Minimal);
        for p in f.particles_mut() {
            p.captured = false;
        }
        let mut r = Recorder::default();
        f.render(&mut r);
        assert_eq!(r.lines(), 0);
        assert!(!r.ops.iter().any(|o| matches!(o, Op::Glow(b) if *b > 0.0)));
    }

    #[test]
    fn minimal_preset_draws_only_bodies() {
        let f = settled(Preset::Minimal.config());
        let mut r = Recorder::default();
        f.render(&mut r);
        assert_eq!(r.lines(), 0);
        assert!(r.fills() > 0);
    }

    #[test]
    fn captured_particles_are_larger_and_glow() {
        let mut f = settled(Preset::Ambient.config());
        let (size, pos) = {
            let p = &mut f.particles_mut()[0];
            p.captured = true;
            p.alpha = 0.5;
            (p.size, p.position)
        };
        let scale = f.config().capture_scale;
        let mut r = Recorder::default();
        f.render(&mut r);
        let fill = r
            .ops
            .iter()
            .position(|o| matches!(o, Op::Fill(_, c, _, _) if *c == pos))
            .unwrap();
        match &r.ops[fill] {
            Op::Fill(_, _, radius, color) => {
                assert!((radius - size * scale).abs() < 1e-12);
                assert_eq!(color.a, 0.5);
            }
            other => panic!("unexpected op {other:?}"),
        }
        assert!(matches!(r.ops[fill - 1], Op::Glow(b) if b > 0.0));
        assert!(r.ops[fill + 1..].contains(&Op::Glow(0.0)), "glow is reset");
    }

    #[test]
    fn link_alpha_falls_off_with_distance() {
        let mut f = settled(FlowConfig {
            trail_length: 0,
            glow_blur: 0.0,
            ..FlowConfig::default()
        });
        for p in f.particles_mut() {
            p.position = DVec2::new(-1000.0, -1000.0);
            p.alpha = 1.0;
            p.captured = false;
        }
        let near = 10.0;
        let far = 100.0;
        {
            let ps = f.particles_mut();
            ps[0].position = DVec2::new(100.0, 100.0);
            ps[1].position = DVec2::new(100.0 + near, 100.0);
            ps[2].position = DVec2::new(300.0, 100.0);
            ps[3].position = DVec2::new(300.0 + far, 100.0);
        }
        let mut r = Recorder::default();
        f.render(&mut r);
        let alpha_of = |from: DVec2| {
            r.ops.iter().find_map(|o| match o {
                Op::Line(a, _, c) if *a == from => Some(c.a),
                _ => None,
            })
        };
        let a_near = alpha_of(DVec2::new(100.0, 100.0)).unwrap();
        let a_far = alpha_of(DVec2::new(300.0, 100.0)).unwrap();
        assert!(a_near > a_far);
    }
}
