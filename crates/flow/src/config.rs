//! Tuning constants for the particle field and the named presets that bundle them.

use folio_core::params::{param_bool, param_f64, param_f64_in, param_u32, param_usize};
use folio_core::{FieldError, Shape};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lower bound on a freshly spawned particle's lifespan, in frames.
pub const MIN_LIFESPAN: u32 = 200;

/// Every constant that shapes the simulation and its rendering.
///
/// Forces are in px/frame² and speeds in px/frame; the simulation advances
/// one physics step per animation frame regardless of frame duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Particles per square pixel of canvas.
    pub density: f64,
    /// Upper bound on the particle count.
    pub max_particles: usize,
    /// Flow field cell size in pixels.
    pub resolution: usize,
    /// Noise frequency per flow field cell.
    pub noise_scale: f64,
    /// Full turns the noise range maps onto.
    pub noise_turns: f64,
    /// Noise time units advanced per second of animation.
    pub noise_speed: f64,
    /// Magnitude of the flow field push.
    pub flow_strength: f64,

    /// Distance within which the pointer attracts or repels.
    pub pointer_radius: f64,
    pub pointer_attract: f64,
    pub pointer_repel: f64,
    /// Probability that a particle is pointer-attracted rather than repelled.
    pub attract_ratio: f64,
    /// Distance within which capturable particles are captured.
    pub capture_radius: f64,
    /// Probability that a particle is capturable.
    pub capture_ratio: f64,
    /// Tangential force applied to captured particles.
    pub orbit_strength: f64,

    /// How many following particles each particle interacts with.
    pub neighbor_sample: usize,
    pub neighbor_repel_radius: f64,
    pub neighbor_attract_radius: f64,
    pub neighbor_repel: f64,
    pub neighbor_attract: f64,

    /// Width of the band along each edge that pushes particles inward.
    pub edge_margin: f64,
    /// Edge push at zero penetration depth into the canvas border.
    pub edge_strength: f64,

    pub max_speed: f64,
    /// Per-frame velocity multiplier.
    pub damping: f64,

    pub min_lifespan: u32,
    pub max_lifespan: u32,
    /// Length of the fade-in and fade-out windows, in frames.
    pub fade_frames: u32,
    /// Probability that a respawn happens on a canvas edge.
    pub edge_spawn_ratio: f64,

    pub size_min: f64,
    pub size_max: f64,
    pub alpha_min: f64,
    pub alpha_max: f64,
    /// Size multiplier while captured.
    pub capture_scale: f64,
    pub shapes: Vec<Shape>,

    /// Number of previous positions kept per particle.
    pub trail_length: usize,
    /// Trail opacity relative to the particle.
    pub trail_alpha: f64,

    /// Maximum distance for a connective line.
    pub link_distance: f64,
    /// Maximum lines drawn from a single particle.
    pub max_connections: usize,
    pub link_width: f64,
    pub link_alpha: f64,

    /// Shadow blur for particle glow; 0 disables glow.
    pub glow_blur: f64,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Preset::Contact.config()
    }
}

impl FlowConfig {
    /// Applies overrides from a JSON object on top of `self`.
    ///
    /// Unknown keys are ignored and bad values keep the current setting. The
    /// result is passed through [`FlowConfig::sanitized`].
    pub fn with_overrides(self, params: &Value) -> Self {
        let c = self;
        let shapes = params
            .get("shapes")
            .and_then(|v| serde_json::from_value::<Vec<Shape>>(v.clone()).ok())
            .unwrap_or(c.shapes);
        let glow = param_bool(params, "glow", c.glow_blur > 0.0);
        Self {
            density: param_f64(params, "density", c.density),
            max_particles: param_usize(params, "max_particles", c.max_particles),
            resolution: param_usize(params, "resolution", c.resolution),
            noise_scale: param_f64(params, "noise_scale", c.noise_scale),
            noise_turns: param_f64(params, "noise_turns", c.noise_turns),
            noise_speed: param_f64(params, "noise_speed", c.noise_speed),
            flow_strength: param_f64(params, "flow_strength", c.flow_strength),
            pointer_radius: param_f64(params, "pointer_radius", c.pointer_radius),
            pointer_attract: param_f64(params, "pointer_attract", c.pointer_attract),
            pointer_repel: param_f64(params, "pointer_repel", c.pointer_repel),
            attract_ratio: param_f64_in(params, "attract_ratio", c.attract_ratio, 0.0, 1.0),
            capture_radius: param_f64(params, "capture_radius", c.capture_radius),
            capture_ratio: param_f64_in(params, "capture_ratio", c.capture_ratio, 0.0, 1.0),
            orbit_strength: param_f64(params, "orbit_strength", c.orbit_strength),
            neighbor_sample: param_usize(params, "neighbor_sample", c.neighbor_sample),
            neighbor_repel_radius: param_f64(
                params,
                "neighbor_repel_radius",
                c.neighbor_repel_radius,
            ),
            neighbor_attract_radius: param_f64(
                params,
                "neighbor_attract_radius",
                c.neighbor_attract_radius,
            ),
            neighbor_repel: param_f64(params, "neighbor_repel", c.neighbor_repel),
            neighbor_attract: param_f64(params, "neighbor_attract", c.neighbor_attract),
            edge_margin: param_f64(params, "edge_margin", c.edge_margin),
            edge_strength: param_f64(params, "edge_strength", c.edge_strength),
            max_speed: param_f64(params, "max_speed", c.max_speed),
            damping: param_f64_in(params, "damping", c.damping, 0.0, 1.0),
            min_lifespan: param_u32(params, "min_lifespan", c.min_lifespan),
            max_lifespan: param_u32(params, "max_lifespan", c.max_lifespan),
            fade_frames: param_u32(params, "fade_frames", c.fade_frames),
            edge_spawn_ratio: param_f64_in(params, "edge_spawn_ratio", c.edge_spawn_ratio, 0.0, 1.0),
            size_min: param_f64(params, "size_min", c.size_min),
            size_max: param_f64(params, "size_max", c.size_max),
            alpha_min: param_f64_in(params, "alpha_min", c.alpha_min, 0.0, 1.0),
            alpha_max: param_f64_in(params, "alpha_max", c.alpha_max, 0.0, 1.0),
            capture_scale: param_f64(params, "capture_scale", c.capture_scale),
            shapes,
            trail_length: param_usize(params, "trail_length", c.trail_length),
            trail_alpha: param_f64_in(params, "trail_alpha", c.trail_alpha, 0.0, 1.0),
            link_distance: param_f64(params, "link_distance", c.link_distance),
            max_connections: param_usize(params, "max_connections", c.max_connections),
            link_width: param_f64(params, "link_width", c.link_width),
            link_alpha: param_f64_in(params, "link_alpha", c.link_alpha, 0.0, 1.0),
            glow_blur: if glow {
                param_f64(params, "glow_blur", c.glow_blur.max(0.0))
            } else {
                0.0
            },
        }
        .sanitized()
    }

    /// Repairs settings that would break the simulation's invariants.
    pub fn sanitized(mut self) -> Self {
        self.density = self.density.max(0.0);
        self.max_particles = self.max_particles.max(1);
        self.resolution = self.resolution.max(1);
        self.max_speed = if self.max_speed > 0.0 { self.max_speed } else { 2.0 };
        self.damping = self.damping.clamp(0.0, 1.0);
        self.min_lifespan = self.min_lifespan.max(MIN_LIFESPAN);
        self.max_lifespan = self.max_lifespan.max(self.min_lifespan);
        self.fade_frames = self.fade_frames.max(1);
        self.edge_margin = self.edge_margin.max(1.0);
        self.edge_strength = self.edge_strength.max(0.0);
        self.size_min = self.size_min.max(0.1);
        self.size_max = self.size_max.max(self.size_min);
        if self.alpha_max < self.alpha_min {
            std::mem::swap(&mut self.alpha_min, &mut self.alpha_max);
        }
        if self.shapes.is_empty() {
            self.shapes = vec![Shape::Circle];
        }
        self.neighbor_repel_radius = self.neighbor_repel_radius.max(0.0);
        self.neighbor_attract_radius = self.neighbor_attract_radius.max(self.neighbor_repel_radius);
        self.link_distance = self.link_distance.max(0.0);
        self.glow_blur = self.glow_blur.max(0.0);
        self
    }
}

/// Named bundles of [`FlowConfig`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// The interactive field behind the contact section.
    Contact,
    /// Slow, sparse drift for long-reading pages.
    Ambient,
    /// Few plain particles for low-power devices.
    Minimal,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Contact, Preset::Ambient, Preset::Minimal];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Contact => "contact",
            Preset::Ambient => "ambient",
            Preset::Minimal => "minimal",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, FieldError> {
        Preset::ALL
            .into_iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| FieldError::UnknownPreset(name.to_string()))
    }

    pub fn config(self) -> FlowConfig {
        let contact = FlowConfig {
            density: 1.0 / 9000.0,
            max_particles: 150,
            resolution: 20,
            noise_scale: 0.1,
            noise_turns: 1.0,
            noise_speed: 0.3,
            flow_strength: 0.05,
            pointer_radius: 150.0,
            pointer_attract: 0.2,
            pointer_repel: 0.3,
            attract_ratio: 0.5,
            capture_radius: 60.0,
            capture_ratio: 0.3,
            orbit_strength: 0.12,
            neighbor_sample: 8,
            neighbor_repel_radius: 20.0,
            neighbor_attract_radius: 80.0,
            neighbor_repel: 0.05,
            neighbor_attract: 0.004,
            edge_margin: 50.0,
            edge_strength: 0.5,
            max_speed: 2.0,
            damping: 0.98,
            min_lifespan: MIN_LIFESPAN,
            max_lifespan: 500,
            fade_frames: 60,
            edge_spawn_ratio: 0.5,
            size_min: 1.0,
            size_max: 3.0,
            alpha_min: 0.4,
            alpha_max: 0.9,
            capture_scale: 1.6,
            shapes: Shape::ALL.to_vec(),
            trail_length: 6,
            trail_alpha: 0.35,
            link_distance: 110.0,
            max_connections: 3,
            link_width: 0.6,
            link_alpha: 0.35,
            glow_blur: 8.0,
        };
        match self {
            Preset::Contact => contact,
            Preset::Ambient => FlowConfig {
                density: 1.0 / 16000.0,
                max_particles: 90,
                noise_speed: 0.15,
                flow_strength: 0.03,
                capture_ratio: 0.0,
                max_speed: 1.2,
                min_lifespan: 300,
                max_lifespan: 700,
                trail_length: 10,
                link_distance: 140.0,
                max_connections: 2,
                glow_blur: 0.0,
                ..contact
            },
            Preset::Minimal => FlowConfig {
                density: 1.0 / 25000.0,
                max_particles: 40,
                pointer_radius: 100.0,
                capture_ratio: 0.0,
                neighbor_sample: 2,
                shapes: vec![Shape::Circle],
                trail_length: 0,
                max_connections: 0,
                glow_blur: 0.0,
                ..contact
            },
        }
    }
}
