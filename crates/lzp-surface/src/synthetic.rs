//! Synthetic time-lapse volumes with a known in-focus surface.
//!
//! The focused surface sits at `focus_z + tilt_x * x + drift * t`. Every
//! plane holds a checker texture whose contrast decays as a gaussian of the
//! distance to that surface, on top of a flat background, so variance-based
//! estimators recover the surface exactly on integer focus positions.

use lzp_core::{Shape, Volume};

/// Generator for test and demo volumes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticFocus {
    /// Focus plane at x = 0, t = 0.
    pub focus_z: f64,
    /// Focus shift per pixel along X.
    pub tilt_x: f64,
    /// Focus shift per time point.
    pub drift: f64,
    /// Texture contrast at the focus plane.
    pub amplitude: f64,
    /// Flat background level.
    pub background: f64,
    /// Gaussian width of the contrast falloff along Z.
    pub width_z: f64,
    /// Checker cell side in pixels.
    pub cell: usize,
}

impl Default for SyntheticFocus {
    fn default() -> Self {
        Self {
            focus_z: 10.0,
            tilt_x: 0.0,
            drift: 0.0,
            amplitude: 50.0,
            background: 100.0,
            width_z: 2.0,
            cell: 2,
        }
    }
}

impl SyntheticFocus {
    /// Focus position at column `x` of time point `t`.
    #[inline]
    pub fn focus_at(&self, x: usize, t: usize) -> f64 {
        self.focus_z + self.tilt_x * x as f64 + self.drift * t as f64
    }

    /// Texture contrast of plane `z` at column `x` of time point `t`.
    pub fn contrast(&self, x: usize, z: usize, t: usize) -> f64 {
        let d = z as f64 - self.focus_at(x, t);
        self.amplitude * (-(d * d) / (2.0 * self.width_z * self.width_z)).exp()
    }

    /// Renders a `u16` volume. Channel `c` is offset by `20 * c` so channels
    /// stay distinguishable.
    pub fn render(&self, shape: Shape) -> Volume<u16> {
        let cell = self.cell.max(1);
        Volume::from_fn(shape, |x, y, z, c, t| {
            let checker = ((x / cell + y / cell) % 2) as f64;
            let v = self.background + 20.0 * c as f64 + self.contrast(x, z, t) * checker;
            v.round().clamp(0.0, u16::MAX as f64) as u16
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contrast_peaks_at_focus() {
        let s = SyntheticFocus {
            tilt_x: 0.5,
            drift: 1.0,
            ..SyntheticFocus::default()
        };
        assert_eq!(s.focus_at(4, 3), 15.0);
        assert_eq!(s.contrast(4, 15, 3), 50.0);
        assert!(s.contrast(4, 14, 3) < 50.0);
    }

    #[test]
    fn test_render_levels() {
        let vol = SyntheticFocus::default().render(Shape::stack(4, 4, 12).with_channels(2));
        // Cell (0, 0) is background, cell (1, 0) carries the texture.
        assert_eq!(vol.plane(0, 10, 0).unwrap()[0], 100);
        assert_eq!(vol.plane(0, 10, 0).unwrap()[2], 150);
        assert_eq!(vol.plane(1, 10, 0).unwrap()[2], 170);
        assert!(vol.plane(0, 0, 0).unwrap().iter().all(|&v| v == 100));
    }
}
