//! The particle field simulator.
//!
//! A [`ParticleField`] owns its particles, the [`FlowField`] that steers them,
//! the last pointer position, and its own PRNG. Each call to
//! [`ParticleField::advance_frame`] runs one physics step:
//!
//! 1. flow field push along the angle of the particle's cell,
//! 2. pointer attraction / repulsion / capture,
//! 3. interaction with a bounded window of other particles,
//! 4. soft repulsion from the canvas edges,
//! 5. integration with damping and a speed cap,
//! 6. aging with fade-in / fade-out,
//! 7. respawn of expired particles.

use crate::config::{FlowConfig, Preset};
use crate::particle::Particle;
use folio_core::params::param_str;
use folio_core::{FieldError, FlowField, Palette, QualityTier, Xorshift64};
use glam::DVec2;
use serde_json::Value;
use tracing::{debug, info};

/// Frame gaps longer than this do not advance the noise clock any further.
const MAX_FRAME_DELTA_MS: f64 = 100.0;

/// Below this distance two points are treated as coincident.
const COINCIDENT_EPS: f64 = 1e-9;

/// Mouse-reactive particle field covering a canvas.
pub struct ParticleField {
    width: usize,
    height: usize,
    config: FlowConfig,
    palette: Palette,
    quality: QualityTier,
    particles: Vec<Particle>,
    flow: FlowField,
    pointer: Option<DVec2>,
    rng: Xorshift64,
    last_timestamp: Option<f64>,
    elapsed_ms: f64,
    frame: u64,
}

/// Particle count for a canvas: proportional to area, capped, at least one.
pub fn particle_count(width: usize, height: usize, config: &FlowConfig) -> usize {
    let area = width as f64 * height as f64;
    let wanted = (area * config.density).floor();
    let capped = wanted.min(config.max_particles as f64).max(1.0);
    capped as usize
}

/// Folds a 64-bit seed into the 32-bit seed the noise generator takes.
fn noise_seed(seed: u64) -> u32 {
    (seed ^ (seed >> 32)) as u32
}

impl ParticleField {
    /// Creates and initializes a field for a `width × height` canvas.
    ///
    /// Returns `FieldError::InvalidDimensions` if either dimension is zero.
    pub fn new(
        width: usize,
        height: usize,
        seed: u64,
        config: FlowConfig,
    ) -> Result<Self, FieldError> {
        let config = config.sanitized();
        let flow = FlowField::new(width, height, config.resolution, noise_seed(seed))?
            .with_noise(config.noise_scale, config.noise_turns);
        let mut field = Self {
            width,
            height,
            config,
            palette: Palette::accent(),
            quality: QualityTier::Full,
            particles: Vec::new(),
            flow,
            pointer: None,
            rng: Xorshift64::new(seed),
            last_timestamp: None,
            elapsed_ms: 0.0,
            frame: 0,
        };
        field.initialize();
        Ok(field)
    }

    /// Creates a field from a preset.
    pub fn from_preset(
        width: usize,
        height: usize,
        seed: u64,
        preset: Preset,
    ) -> Result<Self, FieldError> {
        Self::new(width, height, seed, preset.config())
    }

    /// Creates a field from a JSON object.
    ///
    /// `"preset"` picks the base configuration (default `"contact"`) and
    /// `"palette"` a built-in palette (default `"accent"`); every other key
    /// overrides a [`FlowConfig`] field.
    pub fn from_json(
        width: usize,
        height: usize,
        seed: u64,
        params: &Value,
    ) -> Result<Self, FieldError> {
        let preset = match param_str(params, "preset") {
            Some(name) => Preset::from_name(name)?,
            None => Preset::Contact,
        };
        let palette = match param_str(params, "palette") {
            Some(name) => Palette::from_name(name)?,
            None => Palette::accent(),
        };
        let mut field = Self::new(width, height, seed, preset.config().with_overrides(params))?;
        field.palette = palette;
        Ok(field)
    }

    /// Rebuilds the particle set and flow field for the current size.
    fn initialize(&mut self) {
        let count = self.target_count();
        let size = self.size();
        self.flow.regenerate(self.noise_time());
        self.particles = (0..count)
            .map(|_| Particle::spawn_anywhere(&mut self.rng, size, &self.config))
            .collect();
        debug!(
            width = self.width,
            height = self.height,
            particles = count,
            cols = self.flow.cols(),
            rows = self.flow.rows(),
            "particle field initialized"
        );
    }

    fn target_count(&self) -> usize {
        let base = particle_count(self.width, self.height, &self.config);
        ((base as f64 * self.quality.particle_scale()).round() as usize).max(1)
    }

    /// Resizes the canvas and re-initializes the field.
    pub fn resize(&mut self, width: usize, height: usize) -> Result<(), FieldError> {
        if width == self.width && height == self.height {
            return Ok(());
        }
        self.flow.resize(width, height)?;
        self.width = width;
        self.height = height;
        self.initialize();
        Ok(())
    }

    /// Updates the pointer position; `None` when the pointer leaves.
    pub fn set_pointer(&mut self, pointer: Option<DVec2>) {
        self.pointer = pointer.filter(|p| p.is_finite());
    }

    pub fn pointer(&self) -> Option<DVec2> {
        self.pointer
    }

    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = palette;
    }

    /// Forgets the previous frame timestamp so the next frame starts a fresh
    /// baseline instead of jumping the noise clock forward.
    pub fn rebaseline(&mut self) {
        self.last_timestamp = None;
    }

    /// Adopts a quality tier, growing or shrinking the particle set.
    ///
    /// Returns true if the tier changed.
    pub fn apply_quality(&mut self, tier: QualityTier) -> bool {
        if tier == self.quality {
            return false;
        }
        let from = self.quality;
        self.quality = tier;
        let target = self.target_count();
        let size = self.size();
        if target < self.particles.len() {
            self.particles.truncate(target);
        } else {
            while self.particles.len() < target {
                let p = Particle::respawn(&mut self.rng, size, &self.config);
                self.particles.push(p);
            }
        }
        info!(
            from = from.name(),
            to = tier.name(),
            particles = target,
            "particle field quality changed"
        );
        true
    }

    /// Runs one simulation step at the given animation timestamp.
    pub fn advance_frame(&mut self, timestamp_ms: f64) {
        let delta = match self.last_timestamp {
            Some(last) if timestamp_ms.is_finite() => {
                (timestamp_ms - last).clamp(0.0, MAX_FRAME_DELTA_MS)
            }
            _ => 0.0,
        };
        if timestamp_ms.is_finite() {
            self.last_timestamp = Some(timestamp_ms);
        }
        self.elapsed_ms += delta;
        self.frame += 1;
        self.flow.regenerate(self.noise_time());

        let positions: Vec<DVec2> = self.particles.iter().map(|p| p.position).collect();
        let size = self.size();
        let config = &self.config;
        let flow = &self.flow;
        let pointer = self.pointer;

        for (i, p) in self.particles.iter_mut().enumerate() {
            let angle = flow.angle_at(p.position.x, p.position.y);
            p.apply_force(DVec2::from_angle(angle) * config.flow_strength);
            apply_pointer(p, pointer, config);
            p.apply_force(neighbor_force(i, &positions, config));
            p.apply_force(edge_force(p.position, size, config));
            p.integrate(config);
            contain(p, size, config.edge_margin);
        }

        for p in self.particles.iter_mut() {
            if p.age(&self.config) {
                *p = Particle::respawn(&mut self.rng, size, &self.config);
            }
        }
    }

    fn noise_time(&self) -> f64 {
        self.elapsed_ms / 1000.0 * self.config.noise_speed
    }

    fn size(&self) -> DVec2 {
        DVec2::new(self.width as f64, self.height as f64)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn flow_field(&self) -> &FlowField {
        &self.flow
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn quality(&self) -> QualityTier {
        self.quality
    }

    /// Frames advanced since construction.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Animation time accumulated from frame timestamps.
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    #[cfg(test)]
    pub(crate) fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }
}

/// Pointer attraction, repulsion, and capture.
fn apply_pointer(p: &mut Particle, pointer: Option<DVec2>, config: &FlowConfig) {
    let Some(target) = pointer else {
        p.captured = false;
        return;
    };
    let offset = target - p.position;
    let dist = offset.length();
    if dist < COINCIDENT_EPS {
        p.captured = p.behavior.capturable;
        return;
    }
    let dir = offset / dist;
    if dist < config.pointer_radius {
        let falloff = 1.0 - dist / config.pointer_radius;
        if p.behavior.attracted {
            p.apply_force(dir * config.pointer_attract * falloff);
        } else {
            p.apply_force(-dir * config.pointer_repel * falloff);
        }
    }
    p.captured = p.behavior.capturable && dist < config.capture_radius;
    if p.captured {
        p.apply_force(dir.perp() * config.orbit_strength);
    }
}

/// Repulsion at close range and weak attraction at medium range, computed
/// against the next `neighbor_sample` particles in the collection (wrapping).
fn neighbor_force(i: usize, positions: &[DVec2], config: &FlowConfig) -> DVec2 {
    let n = positions.len();
    let sample = config.neighbor_sample.min(n.saturating_sub(1));
    let here = positions[i];
    (1..=sample)
        .map(|k| positions[(i + k) % n] - here)
        .fold(DVec2::ZERO, |acc, offset| {
            let dist = offset.length();
            if dist < COINCIDENT_EPS {
                return acc;
            }
            let dir = offset / dist;
            if dist < config.neighbor_repel_radius {
                acc - dir * config.neighbor_repel * (1.0 - dist / config.neighbor_repel_radius)
            } else if dist < config.neighbor_attract_radius {
                acc + dir * config.neighbor_attract
            } else {
                acc
            }
        })
}

/// Inward push that grows linearly with depth into the edge margin and keeps
/// growing past the border.
fn edge_force(pos: DVec2, size: DVec2, config: &FlowConfig) -> DVec2 {
    let m = config.edge_margin;
    let push = |dist_to_edge: f64| {
        if dist_to_edge < m {
            (m - dist_to_edge) / m * config.edge_strength
        } else {
            0.0
        }
    };
    DVec2::new(
        push(pos.x) - push(size.x - pos.x),
        push(pos.y) - push(size.y - pos.y),
    )
}

/// Backstop for the soft edge: a particle that escapes `buffer` pixels past
/// the canvas is held at the buffer line with its outward velocity removed.
fn contain(p: &mut Particle, size: DVec2, buffer: f64) {
    let min = DVec2::splat(-buffer);
    let max = size + buffer;
    if p.position.x < min.x {
        p.position.x = min.x;
        p.velocity.x = p.velocity.x.max(0.0);
    } else if p.position.x > max.x {
        p.position.x = max.x;
        p.velocity.x = p.velocity.x.min(0.0);
    }
    if p.position.y < min.y {
        p.position.y = min.y;
        p.velocity.y = p.velocity.y.max(0.0);
    } else if p.position.y > max.y {
        p.position.y = max.y;
        p.velocity.y = p.velocity.y.min(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MIN_LIFESPAN;
    use serde_json::json;

    fn field(w: usize, h: usize, seed: u64) -> ParticleField {
        ParticleField::new(w, h, seed, FlowConfig::default()).unwrap()
    }

    /// Runs `frames` frames at 60 fps starting from t = 0.
    fn run(f: &mut ParticleField, frames: usize) {
        for i in 0..frames {
            f.advance_frame(i as f64 * 16.0);
        }
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        assert!(ParticleField::new(0, 100, 1, FlowConfig::default()).is_err());
        assert!(ParticleField::new(100, 0, 1, FlowConfig::default()).is_err());
    }

    #[test]
    fn count_scales_with_area_and_is_capped() {
        let c = FlowConfig::default();
        assert_eq!(particle_count(300, 300, &c), 10);
        assert_eq!(particle_count(3000, 3000, &c), c.max_particles);
        assert_eq!(particle_count(10, 10, &c), 1);
        assert_eq!(field(300, 300, 1).particles().len(), 10);
    }

    #[test]
    fn flow_field_matches_canvas() {
        let f = field(810, 415, 1);
        assert_eq!(f.flow_field().cols(), 40);
        assert_eq!(f.flow_field().rows(), 20);
    }

    #[test]
    fn resize_reinitializes() {
        let mut f = field(300, 300, 1);
        f.resize(900, 600).unwrap();
        assert_eq!((f.width(), f.height()), (900, 600));
        assert_eq!(f.particles().len(), 60);
        assert_eq!(f.flow_field().cols(), 45);
        assert_eq!(f.flow_field().rows(), 30);
        assert!(f.particles().iter().all(|p| p.position.x <= 900.0));
    }

    #[test]
    fn failed_resize_keeps_previous_state() {
        let mut f = field(300, 300, 1);
        assert!(f.resize(0, 300).is_err());
        assert_eq!((f.width(), f.height()), (300, 300));
        assert_eq!(f.particles().len(), 10);
    }

    #[test]
    fn same_seed_same_evolution() {
        let mut a = field(400, 300, 77);
        let mut b = field(400, 300, 77);
        a.set_pointer(Some(DVec2::new(200.0, 150.0)));
        b.set_pointer(Some(DVec2::new(200.0, 150.0)));
        run(&mut a, 300);
        run(&mut b, 300);
        for (pa, pb) in a.particles().iter().zip(b.particles()) {
            assert_eq!(pa.position.x.to_bits(), pb.position.x.to_bits());
            assert_eq!(pa.position.y.to_bits(), pb.position.y.to_bits());
            assert_eq!(pa.lifespan, pb.lifespan);
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let a = field(400, 300, 1);
        let b = field(400, 300, 2);
        assert!(a
            .particles()
            .iter()
            .zip(b.particles())
            .any(|(pa, pb)| pa.position != pb.position));
    }

    #[test]
    fn lifespan_counts_down_then_resets_to_at_least_minimum() {
        let mut f = field(400, 300, 5);
        let mut previous: Vec<u32> = f.particles().iter().map(|p| p.lifespan).collect();
        let mut respawns = 0;
        for frame in 0..1200 {
            f.advance_frame(frame as f64 * 16.0);
            for (p, prev) in f.particles().iter().zip(previous.iter_mut()) {
                if p.lifespan > *prev {
                    assert!(p.lifespan >= MIN_LIFESPAN, "respawned with {}", p.lifespan);
                    assert_eq!(p.lifespan, p.initial_lifespan);
                    respawns += 1;
                } else {
                    assert_eq!(p.lifespan, *prev - 1, "lifespan must tick by one");
                }
                *prev = p.lifespan;
            }
        }
        assert!(respawns > 0, "1200 frames should outlive every lifespan");
    }

    #[test]
    fn speed_never_exceeds_cap() {
        let mut f = field(500, 400, 9);
        f.set_pointer(Some(DVec2::new(250.0, 200.0)));
        for frame in 0..600 {
            f.advance_frame(frame as f64 * 16.0);
            for p in f.particles() {
                assert!(p.speed() <= 2.0 + 1e-9, "speed {}", p.speed());
            }
        }
    }

    #[test]
    fn pointer_attracts_attracted_particles() {
        let mut f = field(400, 400, 3);
        let pointer = DVec2::new(200.0, 200.0);
        f.set_pointer(Some(pointer));
        let p = &mut f.particles_mut()[0];
        p.behavior.attracted = true;
        p.behavior.capturable = false;
        p.position = DVec2::new(260.0, 200.0);
        p.velocity = DVec2::ZERO;
        let mut probe = p.clone();
        apply_pointer(&mut probe, Some(pointer), &f.config);
        assert!(probe.force.x < 0.0, "force should point at the pointer");
        assert!(!probe.captured);
    }

    #[test]
    fn pointer_repels_other_particles() {
        let f = field(400, 400, 3);
        let mut p = f.particles()[0].clone();
        p.behavior.attracted = false;
        p.position = DVec2::new(260.0, 200.0);
        p.force = DVec2::ZERO;
        apply_pointer(&mut p, Some(DVec2::new(200.0, 200.0)), f.config());
        assert!(p.force.x > 0.0, "force should point away from the pointer");
    }

    #[test]
    fn pointer_outside_radius_has_no_effect() {
        let f = field(400, 400, 3);
        let mut p = f.particles()[0].clone();
        p.behavior.capturable = true;
        p.position = DVec2::new(0.0, 0.0);
        p.force = DVec2::ZERO;
        apply_pointer(&mut p, Some(DVec2::new(390.0, 390.0)), f.config());
        assert_eq!(p.force, DVec2::ZERO);
        assert!(!p.captured);
    }

    #[test]
    fn close_capturable_particles_are_captured_and_released() {
        let f = field(400, 400, 3);
        let mut p = f.particles()[0].clone();
        p.behavior.capturable = true;
        p.position = DVec2::new(220.0, 200.0);
        apply_pointer(&mut p, Some(DVec2::new(200.0, 200.0)), f.config());
        assert!(p.captured);
        apply_pointer(&mut p, None, f.config());
        assert!(!p.captured);
    }

    #[test]
    fn neighbors_repel_when_close_and_attract_at_range() {
        let c = FlowConfig::default();
        let close = [DVec2::new(0.0, 0.0), DVec2::new(5.0, 0.0)];
        assert!(neighbor_force(0, &close, &c).x < 0.0);
        let medium = [DVec2::new(0.0, 0.0), DVec2::new(50.0, 0.0)];
        assert!(neighbor_force(0, &medium, &c).x > 0.0);
        let far = [DVec2::new(0.0, 0.0), DVec2::new(500.0, 0.0)];
        assert_eq!(neighbor_force(0, &far, &c), DVec2::ZERO);
        assert_eq!(neighbor_force(0, &[DVec2::ZERO], &c), DVec2::ZERO);
    }

    #[test]
    fn neighbor_sample_is_bounded() {
        let c = FlowConfig {
            neighbor_sample: 2,
            ..FlowConfig::default()
        };
        // Only particles 1 and 2 are sampled from 0; particle 3 sits close
        // but outside the window.
        let pts = [
            DVec2::ZERO,
            DVec2::new(500.0, 0.0),
            DVec2::new(0.0, 500.0),
            DVec2::new(3.0, 0.0),
        ];
        assert_eq!(neighbor_force(0, &pts, &c), DVec2::ZERO);
    }

    #[test]
    fn edge_force_points_inward() {
        let c = FlowConfig::default();
        let size = DVec2::new(400.0, 300.0);
        assert!(edge_force(DVec2::new(5.0, 150.0), size, &c).x > 0.0);
        assert!(edge_force(DVec2::new(395.0, 150.0), size, &c).x < 0.0);
        assert!(edge_force(DVec2::new(200.0, 2.0), size, &c).y > 0.0);
        assert!(edge_force(DVec2::new(200.0, 299.0), size, &c).y < 0.0);
        assert_eq!(edge_force(DVec2::new(200.0, 150.0), size, &c), DVec2::ZERO);
        let outside = edge_force(DVec2::new(-20.0, 150.0), size, &c).x;
        assert!(outside > c.edge_strength, "push keeps growing past the edge");
    }

    #[test]
    fn particles_stay_near_canvas_under_edge_pressure() {
        let mut f = field(300, 200, 12);
        for p in f.particles_mut() {
            p.position = DVec2::new(1.0, 1.0);
            p.velocity = DVec2::new(-2.0, -2.0);
        }
        let buffer = f.config().edge_margin;
        for frame in 0..2000 {
            // Repelling pointer parked in the middle keeps pushing outward.
            f.set_pointer(Some(DVec2::new(150.0, 100.0)));
            f.advance_frame(frame as f64 * 16.0);
            for p in f.particles() {
                assert!(p.position.x >= -buffer && p.position.x <= 300.0 + buffer);
                assert!(p.position.y >= -buffer && p.position.y <= 200.0 + buffer);
            }
        }
    }

    #[test]
    fn contain_removes_outward_velocity() {
        let f = field(100, 100, 1);
        let mut p = f.particles()[0].clone();
        p.position = DVec2::new(-500.0, 700.0);
        p.velocity = DVec2::new(-1.0, 1.0);
        contain(&mut p, DVec2::new(100.0, 100.0), 10.0);
        assert_eq!(p.position, DVec2::new(-10.0, 110.0));
        assert_eq!(p.velocity, DVec2::ZERO);
    }

    #[test]
    fn first_frame_and_rebaseline_do_not_jump_the_clock() {
        let mut f = field(200, 200, 1);
        f.advance_frame(10_000.0);
        assert_eq!(f.elapsed_ms(), 0.0);
        f.advance_frame(10_016.0);
        assert_eq!(f.elapsed_ms(), 16.0);
        f.rebaseline();
        f.advance_frame(50_000.0);
        assert_eq!(f.elapsed_ms(), 16.0);
        f.advance_frame(50_500.0);
        assert_eq!(f.elapsed_ms(), 16.0 + MAX_FRAME_DELTA_MS);
        assert_eq!(f.frame(), 4);
    }

    #[test]
    fn non_finite_pointer_is_ignored() {
        let mut f = field(200, 200, 1);
        f.set_pointer(Some(DVec2::new(f64::NAN, 3.0)));
        assert_eq!(f.pointer(), None);
    }

    #[test]
    fn quality_tier_scales_particles() {
        let mut f = field(900, 900, 4);
        assert_eq!(f.particles().len(), 90);
        assert!(f.apply_quality(QualityTier::Minimal));
        assert_eq!(f.particles().len(), 27);
        assert!(!f.apply_quality(QualityTier::Minimal));
        assert!(f.apply_quality(QualityTier::Full));
        assert_eq!(f.particles().len(), 90);
        run(&mut f, 5);
    }

    #[test]
    fn from_json_selects_preset_and_palette() {
        let f = ParticleField::from_json(
            400,
            300,
            1,
            &json!({"preset": "minimal", "palette": "sunset", "max_particles": 3}),
        )
        .unwrap();
        assert_eq!(f.config().trail_length, 0);
        assert_eq!(f.config().max_particles, 3);
        assert_eq!(f.palette(), &Palette::sunset());
        assert!(f.particles().len() <= 3);
    }

    #[test]
    fn from_json_rejects_unknown_names() {
        assert!(matches!(
            ParticleField::from_json(10, 10, 1, &json!({"preset": "nope"})),
            Err(FieldError::UnknownPreset(_))
        ));
        assert!(matches!(
            ParticleField::from_json(10, 10, 1, &json!({"palette": "nope"})),
            Err(FieldError::UnknownPalette(_))
        ));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(24))]

            #[test]
            fn invariants_hold_for_any_canvas(
                w in 50_usize..800,
                h in 50_usize..800,
                seed in any::<u64>(),
                px in 0.0_f64..800.0,
                py in 0.0_f64..800.0,
            ) {
                let mut f = ParticleField::new(w, h, seed, FlowConfig::default()).unwrap();
                f.set_pointer(Some(DVec2::new(px, py)));
                let buffer = f.config().edge_margin;
                for frame in 0..120 {
                    f.advance_frame(frame as f64 * 16.7);
                    for p in f.particles() {
                        prop_assert!(p.speed() <= f.config().max_speed + 1e-9);
                        prop_assert!(p.position.x >= -buffer && p.position.x <= w as f64 + buffer);
                        prop_assert!(p.position.y >= -buffer && p.position.y <= h as f64 + buffer);
                        prop_assert!((0.0..=1.0).contains(&p.alpha));
                    }
                }
            }

            #[test]
            fn flow_dims_track_resizes(
                sizes in proptest::collection::vec((1_usize..1500, 1_usize..1500), 1..5),
            ) {
                let mut f = ParticleField::new(640, 480, 1, FlowConfig::default()).unwrap();
                let res = f.config().resolution;
                for (w, h) in sizes {
                    f.resize(w, h).unwrap();
                    prop_assert_eq!(f.flow_field().cols(), (w / res).max(1));
                    prop_assert_eq!(f.flow_field().rows(), (h / res).max(1));
                }
            }
        }
    }
}
