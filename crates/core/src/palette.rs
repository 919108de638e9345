//! Color variants assigned to particles.
//!
//! Each particle stores a variant index; the palette resolves it (modulo the
//! palette length) at draw time, so swapping palettes recolors a running
//! field without respawning anything.

use crate::color::Rgba;
use crate::error::FieldError;

/// Names accepted by [`Palette::from_name`].
const PALETTE_NAMES: &[&str] = &["accent", "mono", "sunset"];

/// An ordered, non-empty list of particle colors plus the line color used
/// for connections.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    colors: Vec<Rgba>,
    link: Rgba,
}

impl Palette {
    /// Creates a palette. Requires at least one color.
    pub fn new(colors: Vec<Rgba>, link: Rgba) -> Result<Self, FieldError> {
        if colors.is_empty() {
            return Err(FieldError::InvalidPalette(
                "palette requires at least 1 color".to_string(),
            ));
        }
        Ok(Self { colors, link })
    }

    /// Parses CSS color strings; the first entry doubles as the link color.
    pub fn from_css(colors: &[&str]) -> Result<Self, FieldError> {
        let parsed = colors
            .iter()
            .map(|c| Rgba::parse_css(c))
            .collect::<Result<Vec<_>, _>>()?;
        let link = parsed.first().copied().unwrap_or(Rgba::WHITE);
        Self::new(parsed, link)
    }

    /// Like [`Palette::from_css`] but substitutes `fallback` for entries that
    /// fail to parse. Used for colors read from the live stylesheet.
    pub fn from_css_lossy(colors: &[&str], fallback: Rgba) -> Result<Self, FieldError> {
        let parsed: Vec<Rgba> = colors
            .iter()
            .map(|c| Rgba::parse_css_or(c, fallback))
            .collect();
        let link = parsed.first().copied().unwrap_or(fallback);
        Self::new(parsed, link)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always false for a constructed palette.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Color for a particle's variant index, wrapping around the palette.
    pub fn color(&self, variant: usize) -> Rgba {
        self.colors[variant % self.colors.len()]
    }

    /// Color of the connective lines between particles.
    pub fn link(&self) -> Rgba {
        self.link
    }

    /// Builder-style override of the link color.
    pub fn with_link(mut self, link: Rgba) -> Self {
        self.link = link;
        self
    }

    /// Looks up a built-in palette by name.
    pub fn from_name(name: &str) -> Result<Self, FieldError> {
        match name {
            "accent" => Ok(Self::accent()),
            "mono" => Ok(Self::mono()),
            "sunset" => Ok(Self::sunset()),
            other => Err(FieldError::UnknownPalette(other.to_string())),
        }
    }

    pub fn list_names() -> &'static [&'static str] {
        PALETTE_NAMES
    }

    // -- Built-in palettes --

    /// Indigo and violet accents on a dark page.
    pub fn accent() -> Self {
        Self::from_css(&["#6366f1", "#8b5cf6", "#a78bfa", "#38bdf8"])
            .expect("accent palette colors are valid")
    }

    /// Grays for the reduced-motion theme.
    pub fn mono() -> Self {
        Self::from_css(&["#e5e7eb", "#9ca3af", "#6b7280"]).expect("mono palette colors are valid")
    }

    /// Warm oranges and pinks.
    pub fn sunset() -> Self {
        Self::from_css(&["#f97316", "#fb7185", "#facc15", "#f472b6"])
            .expect("sunset palette colors are valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_palette_is_rejected() {
        assert!(Palette::new(vec![], Rgba::WHITE).is_err());
        assert!(Palette::from_css(&[]).is_err());
    }

    #[test]
    fn invalid_css_is_rejected_by_strict_constructor() {
        assert!(Palette::from_css(&["#ffffff", "var(--x)"]).is_err());
    }

    #[test]
    fn lossy_constructor_substitutes_fallback() {
        let fallback = Rgba::rgb(0.5, 0.5, 0.5);
        let p = Palette::from_css_lossy(&["var(--x)", "#000000"], fallback).unwrap();
        assert_eq!(p.color(0), fallback);
        assert_eq!(p.color(1), Rgba::BLACK);
        assert_eq!(p.link(), fallback);
    }

    #[test]
    fn color_wraps_variant_index() {
        let p = Palette::from_css(&["#ff0000", "#00ff00"]).unwrap();
        assert_eq!(p.color(0), p.color(2));
        assert_eq!(p.color(1), p.color(5));
    }

    #[test]
    fn link_defaults_to_first_color_and_can_be_overridden() {
        let p = Palette::from_css(&["#ff0000", "#00ff00"]).unwrap();
        assert_eq!(p.link(), p.color(0));
        let p = p.with_link(Rgba::WHITE);
        assert_eq!(p.link(), Rgba::WHITE);
    }

    #[test]
    fn every_listed_name_resolves() {
        for name in Palette::list_names() {
            let p = Palette::from_name(name).unwrap();
            assert!(!p.is_empty(), "{name} should have colors");
        }
    }

    #[test]
    fn unknown_name_is_an_error() {
        assert!(matches!(
            Palette::from_name("plaid"),
            Err(FieldError::UnknownPalette(_))
        ));
    }
}
