use glam::DVec2;

use crate::spatial::Positioned;

/// A mass point belonging to a [`super::curve::Curve`]. Unlike a grid
/// [`crate::particle::Particle`], samples carry a local scale `delta` (used to
/// modulate fairing weights and resample thresholds) and their own place in
/// their owning curve, reconciled after every structural mutation.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    pub pos: DVec2,
    pub prev: DVec2,
    /// Local scale factor, always positive.
    pub delta: f64,
    pub locked: bool,
    /// When set, attraction-repulsion skips this sample entirely (used for
    /// samples that should never react to nearby curves).
    pub ignore_neighbors: bool,
    pub curve_id: u64,
    pub index_in_curve: usize,
}

impl Sample {
    pub fn new(pos: DVec2, delta: f64, curve_id: u64, index_in_curve: usize) -> Self {
        Self {
            pos,
            prev: pos,
            delta,
            locked: false,
            ignore_neighbors: false,
            curve_id,
            index_in_curve,
        }
    }

    pub fn set_position(&mut self, p: DVec2) {
        self.pos = p;
        self.prev = p;
    }

    /// Applies `force * dt` as an impulse to `pos`, then runs the Verlet step
    /// with zero acceleration (all forces for samples are applied as
    /// pre-integration impulses, per spec.md §4.1/§4.3).
    pub fn step(&mut self, force: DVec2, dt: f64) {
        if self.locked {
            self.prev = self.pos;
            return;
        }
        self.pos += force * dt;
        let v = self.pos - self.prev;
        self.prev = self.pos;
        self.pos += v;
    }
}

impl Positioned for Sample {
    fn position(&self) -> DVec2 {
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locked_sample_ignores_force() {
        let mut s = Sample::new(DVec2::ZERO, 1.0, 0, 0);
        s.locked = true;
        s.step(DVec2::new(100.0, 0.0), 1.0 / 60.0);
        assert_eq!(s.pos, DVec2::ZERO);
    }

    #[test]
    fn zero_force_preserves_verlet_velocity() {
        let mut s = Sample::new(DVec2::new(1.0, 0.0), 1.0, 0, 0);
        s.pos = DVec2::new(2.0, 0.0); // velocity now (1, 0)
        s.step(DVec2::ZERO, 1.0 / 60.0);
        assert_eq!(s.pos, DVec2::new(3.0, 0.0));
    }
}
