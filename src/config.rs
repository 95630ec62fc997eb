use glam::DVec2;

/// Everything a tick needs that would otherwise be scattered global state:
/// gravity, world bounds, spatial-hash cell size, solver iteration count.
///
/// Constructed once by the caller and threaded through the engines; nothing
/// in this crate reads ambient globals.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Acceleration applied to unlocked grid particles, pixels/s^2.
    pub gravity: DVec2,
    /// Fixed timestep used regardless of wall-clock drift.
    pub dt: f64,
    /// World width in pixels; the clamp rectangle's right edge is `width - 10`.
    pub width: f64,
    /// World height in pixels.
    pub height: f64,
    /// Reserved space at the bottom of the world (e.g. for a toolbar); the
    /// clamp rectangle's bottom edge is `height - bottom_margin`.
    pub bottom_margin: f64,
    /// Side length of a spatial-hash cell.
    pub cell_size: f64,
    /// Gauss-Seidel iteration count for the grid solver.
    pub solver_iterations: usize,
    /// Minimum allowed separation between unlocked particles.
    pub contact_min_distance: f64,
    /// Bounded history depth for undo/redo.
    pub history_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gravity: DVec2::new(0.0, 980.0),
            dt: 1.0 / 60.0,
            width: 800.0,
            height: 600.0,
            bottom_margin: 60.0,
            cell_size: 32.0,
            solver_iterations: 6,
            contact_min_distance: 8.0,
            history_capacity: 50,
        }
    }
}

impl EngineConfig {
    /// World-space rectangle particles are clamped into: `(min, max)`.
    pub fn clamp_rect(&self) -> (DVec2, DVec2) {
        (
            DVec2::new(10.0, 10.0),
            DVec2::new(self.width - 10.0, self.height - self.bottom_margin),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_rect_respects_bottom_margin() {
        let config = EngineConfig {
            width: 800.0,
            height: 600.0,
            bottom_margin: 60.0,
            ..Default::default()
        };
        let (min, max) = config.clamp_rect();
        assert_eq!(min, DVec2::new(10.0, 10.0));
        assert_eq!(max, DVec2::new(790.0, 540.0));
    }
}
