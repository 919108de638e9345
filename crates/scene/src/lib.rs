#![deny(unsafe_code)]
//! Scene registry: maps preset names to configured particle fields and
//! provides CPU-side rendering.
//!
//! This crate sits between `folio-flow` (the simulator) and the front ends.
//! Both the CLI and the WASM binding depend on it to avoid duplicating
//! preset dispatch.

pub mod raster;

#[cfg(feature = "png")]
pub mod snapshot;

use folio_core::{FieldError, Surface};
use folio_flow::{ParticleField, Preset};
use serde_json::{json, Value};

pub use raster::RasterSurface;

/// A runnable background scene.
///
/// Use [`SceneKind::from_name`] for string-based construction (CLI, WASM).
pub enum SceneKind {
    /// A particle field built from one of the named presets.
    Particles {
        preset: Preset,
        field: ParticleField,
    },
}

impl SceneKind {
    /// Constructs a scene by preset name. `params` may override any
    /// configuration value and pick a `"palette"`; a `"preset"` key inside
    /// `params` is ignored in favor of `name`.
    ///
    /// Returns `FieldError::UnknownPreset` if the name is not recognized.
    pub fn from_name(
        name: &str,
        width: usize,
        height: usize,
        seed: u64,
        params: &Value,
    ) -> Result<Self, FieldError> {
        let preset = Preset::from_name(name)?;
        let mut params = match params {
            Value::Object(map) => Value::Object(map.clone()),
            _ => json!({}),
        };
        params["preset"] = json!(preset.name());
        let field = ParticleField::from_json(width, height, seed, &params)?;
        Ok(SceneKind::Particles { preset, field })
    }

    /// All recognized preset names.
    pub fn list_presets() -> Vec<&'static str> {
        Preset::ALL.iter().map(|p| p.name()).collect()
    }

    pub fn preset(&self) -> Preset {
        match self {
            SceneKind::Particles { preset, .. } => *preset,
        }
    }

    pub fn field(&self) -> &ParticleField {
        match self {
            SceneKind::Particles { field, .. } => field,
        }
    }

    pub fn field_mut(&mut self) -> &mut ParticleField {
        match self {
            SceneKind::Particles { field, .. } => field,
        }
    }

    /// Releases the field for callers that drive it directly.
    pub fn into_field(self) -> ParticleField {
        match self {
            SceneKind::Particles { field, .. } => field,
        }
    }

    /// Advances one frame at the given animation timestamp.
    pub fn step(&mut self, timestamp_ms: f64) {
        self.field_mut().advance_frame(timestamp_ms);
    }

    pub fn render(&self, surface: &mut dyn Surface) {
        self.field().render(surface);
    }

    /// Effective configuration as a JSON object.
    pub fn params(&self) -> Value {
        serde_json::to_value(self.field().config()).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_name_contact_succeeds() {
        let scene = SceneKind::from_name("contact", 320, 240, 42, &json!({}));
        assert!(scene.is_ok());
    }

    #[test]
    fn from_name_unknown_returns_error() {
        let result = SceneKind::from_name("nonexistent", 32, 32, 42, &json!({}));
        assert!(matches!(result, Err(FieldError::UnknownPreset(_))));
    }

    #[test]
    fn list_presets_covers_every_preset() {
        let names = SceneKind::list_presets();
        assert_eq!(names, vec!["contact", "ambient", "minimal"]);
        for name in names {
            let scene = SceneKind::from_name(name, 64, 64, 1, &json!({})).unwrap();
            assert_eq!(scene.preset().name(), name);
        }
    }

    #[test]
    fn name_wins_over_params_preset() {
        let scene =
            SceneKind::from_name("minimal", 200, 200, 1, &json!({"preset": "contact"})).unwrap();
        assert_eq!(scene.preset(), Preset::Minimal);
        assert_eq!(scene.field().config(), &Preset::Minimal.config());
    }

    #[test]
    fn params_expose_overrides() {
        let scene =
            SceneKind::from_name("contact", 200, 200, 1, &json!({"max_speed": 1.5})).unwrap();
        assert_eq!(scene.params()["max_speed"], 1.5);
        assert_eq!(scene.params()["damping"], 0.98);
    }

    #[test]
    fn non_object_params_are_ignored() {
        let scene = SceneKind::from_name("ambient", 200, 200, 1, &json!([1, 2])).unwrap();
        assert_eq!(scene.field().config(), &Preset::Ambient.config());
    }

    #[test]
    fn determinism_same_seed() {
        let mut a = SceneKind::from_name("contact", 200, 150, 99, &json!({})).unwrap();
        let mut b = SceneKind::from_name("contact", 200, 150, 99, &json!({})).unwrap();
        for i in 0..30 {
            a.step(i as f64 * 16.0);
            b.step(i as f64 * 16.0);
        }
        assert!(a
            .field()
            .particles()
            .iter()
            .zip(b.field().particles())
            .all(|(pa, pb)| pa.position.x.to_bits() == pb.position.x.to_bits()
                && pa.position.y.to_bits() == pb.position.y.to_bits()));
    }

    #[test]
    fn renders_onto_raster() {
        let mut scene = SceneKind::from_name("contact", 300, 300, 5, &json!({})).unwrap();
        for i in 0..90 {
            scene.step(i as f64 * 16.0);
        }
        let mut surface = RasterSurface::new(300, 300).unwrap();
        scene.render(&mut surface);
        assert!(surface.to_rgba8().chunks(4).any(|px| px[3] > 0));
    }
}
