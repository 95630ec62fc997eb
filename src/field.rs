use glam::DVec2;

use crate::error::{MazeError, Result};

/// A bilinearly-interpolated scalar field over a world rectangle. Used by
/// [`crate::curve::evolver::CurveEvolver`] to make Brownian strength,
/// fairing strength, attraction strength, and the anisotropy gradient
/// spatially varying instead of flat constants.
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterField {
    width: usize,
    height: usize,
    min: DVec2,
    max: DVec2,
    default_value: f64,
    values: Vec<f64>,
}

impl ParameterField {
    pub fn new(width: usize, height: usize, min: DVec2, max: DVec2, default_value: f64) -> Self {
        Self {
            width,
            height,
            min,
            max,
            default_value,
            values: vec![default_value; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn cell_extent(&self) -> DVec2 {
        DVec2::new(
            (self.max.x - self.min.x) / (self.width.max(1) as f64 - 1.0).max(1.0),
            (self.max.y - self.min.y) / (self.height.max(1) as f64 - 1.0).max(1.0),
        )
    }

    fn node(&self, gx: usize, gy: usize) -> f64 {
        let gx = gx.min(self.width.saturating_sub(1));
        let gy = gy.min(self.height.saturating_sub(1));
        self.values[gy * self.width + gx]
    }

    fn set_node(&mut self, gx: usize, gy: usize, value: f64) {
        if gx < self.width && gy < self.height {
            self.values[gy * self.width + gx] = value;
        }
    }

    /// World coordinates to continuous, clamped grid coordinates `(u, v)`.
    fn grid_coords(&self, x: f64, y: f64) -> (f64, f64) {
        let u = ((x - self.min.x) / (self.max.x - self.min.x)).clamp(0.0, 1.0);
        let v = ((y - self.min.y) / (self.max.y - self.min.y)).clamp(0.0, 1.0);
        (
            u * (self.width.max(1) as f64 - 1.0),
            v * (self.height.max(1) as f64 - 1.0),
        )
    }

    /// Clamped-bilinear sample at world coordinates `(x, y)`.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        if self.values.is_empty() {
            return self.default_value;
        }
        let (gx, gy) = self.grid_coords(x, y);
        let x0 = gx.floor() as usize;
        let y0 = gy.floor() as usize;
        let x1 = (x0 + 1).min(self.width.saturating_sub(1));
        let y1 = (y0 + 1).min(self.height.saturating_sub(1));
        let tx = gx - x0 as f64;
        let ty = gy - y0 as f64;

        let v00 = self.node(x0, y0);
        let v10 = self.node(x1, y0);
        let v01 = self.node(x0, y1);
        let v11 = self.node(x1, y1);

        let top = v00 * (1.0 - tx) + v10 * tx;
        let bottom = v01 * (1.0 - tx) + v11 * tx;
        top * (1.0 - ty) + bottom * ty
    }

    /// Central-difference gradient, `epsilon = half the smaller cell extent`.
    pub fn gradient(&self, x: f64, y: f64) -> DVec2 {
        let extent = self.cell_extent();
        let eps = extent.x.min(extent.y) * 0.5;
        let eps = if eps <= 0.0 { 1e-6 } else { eps };
        let dx = (self.sample(x + eps, y) - self.sample(x - eps, y)) / (2.0 * eps);
        let dy = (self.sample(x, y + eps) - self.sample(x, y - eps)) / (2.0 * eps);
        DVec2::new(dx, dy)
    }

    /// Blends cells within `radius` world units toward `value`, weighted by
    /// quadratic falloff `(1 - d/r)^2`, scaled by `strength`.
    pub fn paint_brush(&mut self, x: f64, y: f64, radius: f64, value: f64, strength: f64) -> Result<()> {
        if radius <= 0.0 {
            return Err(MazeError::NonPositiveRadius(radius));
        }
        if self.values.is_empty() {
            return Ok(());
        }
        let extent = self.cell_extent();
        let cells_x = (radius / extent.x.max(1e-9)).ceil() as isize + 1;
        let cells_y = (radius / extent.y.max(1e-9)).ceil() as isize + 1;
        let (cx, cy) = self.grid_coords(x, y);
        let (cx, cy) = (cx.round() as isize, cy.round() as isize);

        for gy in (cy - cells_y).max(0)..=(cy + cells_y).min(self.height as isize - 1) {
            for gx in (cx - cells_x).max(0)..=(cx + cells_x).min(self.width as isize - 1) {
                let world_x = self.min.x + gx as f64 * extent.x;
                let world_y = self.min.y + gy as f64 * extent.y;
                let d = DVec2::new(world_x - x, world_y - y).length();
                if d >= radius {
                    continue;
                }
                let falloff = (1.0 - d / radius).powi(2);
                let current = self.node(gx as usize, gy as usize);
                let blended = current + (value - current) * strength * falloff;
                self.set_node(gx as usize, gy as usize, blended);
            }
        }
        Ok(())
    }

    /// Evaluates `f(world_x, world_y)` at every grid node.
    pub fn fill_procedural(&mut self, f: impl Fn(f64, f64) -> f64) {
        let extent = self.cell_extent();
        for gy in 0..self.height {
            for gx in 0..self.width {
                let world_x = self.min.x + gx as f64 * extent.x;
                let world_y = self.min.y + gy as f64 * extent.y;
                self.values[gy * self.width + gx] = f(world_x, world_y);
            }
        }
    }

    /// Loads already-decoded single-channel samples (length `width*height`,
    /// row-major, normalized to `[0, 1]`) into the field. Decoding an image
    /// file into such a buffer is a presentation-layer concern.
    pub fn load_from_image(&mut self, channel: &[f64]) {
        let n = self.values.len().min(channel.len());
        self.values[..n].copy_from_slice(&channel[..n]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_clamps_outside_rect() {
        let mut field = ParameterField::new(2, 2, DVec2::ZERO, DVec2::new(10.0, 10.0), 0.0);
        field.fill_procedural(|x, _y| x);
        assert_eq!(field.sample(-100.0, 0.0), field.sample(0.0, 0.0));
        assert_eq!(field.sample(1000.0, 0.0), field.sample(10.0, 0.0));
    }

    #[test]
    fn bilinear_interpolates_between_corners() {
        let mut field = ParameterField::new(2, 2, DVec2::ZERO, DVec2::new(10.0, 10.0), 0.0);
        field.fill_procedural(|x, _y| x);
        let mid = field.sample(5.0, 5.0);
        assert!((mid - 5.0).abs() < 1e-9);
    }

    #[test]
    fn paint_brush_blends_toward_value() {
        let mut field = ParameterField::new(20, 20, DVec2::ZERO, DVec2::new(100.0, 100.0), 0.0);
        field.paint_brush(50.0, 50.0, 20.0, 1.0, 1.0).unwrap();
        assert!(field.sample(50.0, 50.0) > 0.5);
        assert!(field.sample(0.0, 0.0) < 0.1);
    }

    #[test]
    fn paint_brush_rejects_non_positive_radius() {
        let mut field = ParameterField::new(20, 20, DVec2::ZERO, DVec2::new(100.0, 100.0), 0.0);
        let err = field.paint_brush(50.0, 50.0, 0.0, 1.0, 1.0).unwrap_err();
        assert_eq!(err, crate::error::MazeError::NonPositiveRadius(0.0));
    }

    #[test]
    fn gradient_is_zero_on_constant_field() {
        let field = ParameterField::new(5, 5, DVec2::ZERO, DVec2::new(50.0, 50.0), 3.0);
        let g = field.gradient(25.0, 25.0);
        assert!(g.length() < 1e-6);
    }
}
