//! A single particle: kinematics, lifecycle, and the trail it leaves.

use crate::config::FlowConfig;
use folio_core::{Shape, Xorshift64};
use glam::DVec2;
use std::collections::VecDeque;

/// Number of distinct color variants handed out at spawn. Divisible by every
/// built-in palette length so variants spread evenly.
pub const COLOR_VARIANTS: usize = 12;

/// Initial speed of a particle entering from a canvas edge.
const EDGE_ENTRY_SPEED: f64 = 0.5;

/// How a particle reacts to the pointer, fixed for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Behavior {
    /// Pulled toward the pointer when true, pushed away otherwise.
    pub attracted: bool,
    /// Highlighted and set orbiting when the pointer comes very close.
    pub capturable: bool,
}

/// A point mass with a bounded lifespan.
#[derive(Debug, Clone)]
pub struct Particle {
    pub position: DVec2,
    pub velocity: DVec2,
    /// Force accumulated this frame; cleared by [`Particle::integrate`].
    pub force: DVec2,
    /// Frames left before respawn.
    pub lifespan: u32,
    /// Lifespan at spawn, used for the fade-in window.
    pub initial_lifespan: u32,
    pub size: f64,
    /// Index into the palette, wrapped at draw time.
    pub variant: usize,
    pub shape: Shape,
    /// Opacity at full visibility.
    pub base_alpha: f64,
    /// Current opacity after fading.
    pub alpha: f64,
    pub behavior: Behavior,
    /// Set while the pointer holds the particle.
    pub captured: bool,
    trail: VecDeque<DVec2>,
}

impl Particle {
    /// Spawns a particle at a uniformly random position on the canvas.
    pub fn spawn_anywhere(rng: &mut Xorshift64, size: DVec2, config: &FlowConfig) -> Self {
        let position = DVec2::new(rng.next_range(0.0, size.x), rng.next_range(0.0, size.y));
        let velocity = DVec2::from_angle(rng.next_angle()) * rng.next_range(0.0, config.max_speed * 0.25);
        Self::spawn_at(rng, position, velocity, config)
    }

    /// Spawns a particle on a random canvas edge, heading inward.
    pub fn spawn_on_edge(rng: &mut Xorshift64, size: DVec2, config: &FlowConfig) -> Self {
        let (position, inward) = match rng.next_usize(4) {
            0 => (DVec2::new(rng.next_range(0.0, size.x), 0.0), DVec2::Y),
            1 => (DVec2::new(size.x, rng.next_range(0.0, size.y)), DVec2::NEG_X),
            2 => (DVec2::new(rng.next_range(0.0, size.x), size.y), DVec2::NEG_Y),
            _ => (DVec2::new(0.0, rng.next_range(0.0, size.y)), DVec2::X),
        };
        let speed = EDGE_ENTRY_SPEED.min(config.max_speed);
        Self::spawn_at(rng, position, inward * speed, config)
    }

    /// Respawn used when a lifespan runs out: edge or anywhere, by config ratio.
    pub fn respawn(rng: &mut Xorshift64, size: DVec2, config: &FlowConfig) -> Self {
        if rng.chance(config.edge_spawn_ratio) {
            Self::spawn_on_edge(rng, size, config)
        } else {
            Self::spawn_anywhere(rng, size, config)
        }
    }

    fn spawn_at(
        rng: &mut Xorshift64,
        position: DVec2,
        velocity: DVec2,
        config: &FlowConfig,
    ) -> Self {
        let lifespan = rng.next_u32_inclusive(config.min_lifespan, config.max_lifespan);
        let shape = config.shapes[rng.next_usize(config.shapes.len())];
        Self {
            position,
            velocity,
            force: DVec2::ZERO,
            lifespan,
            initial_lifespan: lifespan,
            size: rng.next_range(config.size_min, config.size_max),
            variant: rng.next_usize(COLOR_VARIANTS),
            shape,
            base_alpha: rng.next_range(config.alpha_min, config.alpha_max),
            alpha: 0.0,
            behavior: Behavior {
                attracted: rng.chance(config.attract_ratio),
                capturable: rng.chance(config.capture_ratio),
            },
            captured: false,
            trail: VecDeque::with_capacity(config.trail_length),
        }
    }

    /// Adds to this frame's accumulated force.
    pub fn apply_force(&mut self, force: DVec2) {
        self.force += force;
    }

    /// Applies the accumulated force, damps, clamps speed, moves, and records
    /// the previous position in the trail.
    ///
    /// Speed never exceeds `config.max_speed` afterward.
    pub fn integrate(&mut self, config: &FlowConfig) {
        self.velocity = ((self.velocity + self.force) * config.damping)
            .clamp_length_max(config.max_speed);
        if !self.velocity.is_finite() {
            self.velocity = DVec2::ZERO;
        }
        if config.trail_length > 0 {
            if self.trail.len() >= config.trail_length {
                self.trail.pop_front();
            }
            self.trail.push_back(self.position);
        }
        self.position += self.velocity;
        self.force = DVec2::ZERO;
    }

    /// Counts down one frame and updates alpha from the fade windows.
    ///
    /// Returns true once the lifespan is exhausted.
    pub fn age(&mut self, config: &FlowConfig) -> bool {
        self.lifespan = self.lifespan.saturating_sub(1);
        let fade = f64::from(config.fade_frames);
        let lived = f64::from(self.initial_lifespan - self.lifespan);
        let fade_in = (lived / fade).min(1.0);
        let fade_out = (f64::from(self.lifespan) / fade).min(1.0);
        let visibility = fade_in.min(fade_out);
        self.alpha = if self.captured {
            visibility
        } else {
            self.base_alpha * visibility
        };
        self.lifespan == 0
    }

    /// Previous positions, oldest first.
    pub fn trail(&self) -> impl ExactSizeIterator<Item = DVec2> + '_ {
        self.trail.iter().copied()
    }

    pub fn trail_len(&self) -> usize {
        self.trail.len()
    }

    pub fn speed(&self) -> f64 {
        self.velocity.length()
    }
}
