//! PNG export of a [`RasterSurface`].
//!
//! This module is feature-gated behind `png` (default on) so that WASM builds
//! can depend on the `scene` crate without pulling in the `image` crate.

use folio_core::FieldError;
use std::path::Path;

use crate::raster::RasterSurface;

/// Writes the surface as an RGBA PNG.
///
/// Returns `FieldError::InvalidDimensions` if the surface dimensions overflow
/// `u32`, or `FieldError::Io` on write failure.
pub fn write_png(surface: &RasterSurface, path: &Path) -> Result<(), FieldError> {
    let w = u32::try_from(surface.width()).map_err(|_| FieldError::InvalidDimensions)?;
    let h = u32::try_from(surface.height()).map_err(|_| FieldError::InvalidDimensions)?;
    let img = image::RgbaImage::from_raw(w, h, surface.to_rgba8())
        .ok_or_else(|| FieldError::Io("RGBA buffer size mismatch".into()))?;
    img.save(path).map_err(|e| FieldError::Io(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{Rgba, Surface};
    use glam::DVec2;

    #[test]
    fn write_png_round_trip() {
        let mut surface = RasterSurface::new(24, 16).unwrap().with_background(Rgba::BLACK);
        surface.fill_circle(DVec2::new(12.0, 8.0), 4.0, Rgba::WHITE);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("field.png");

        write_png(&surface, &path).unwrap();

        let img = image::open(&path).unwrap().to_rgba8();
        assert_eq!(img.width(), 24);
        assert_eq!(img.height(), 16);
        assert_eq!(img.get_pixel(12, 8).0, [255, 255, 255, 255]);
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 255]);
    }

    #[test]
    fn write_png_reports_io_errors() {
        let surface = RasterSurface::new(4, 4).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("field.png");
        assert!(matches!(write_png(&surface, &path), Err(FieldError::Io(_))));
    }
}
