use glam::DVec2;

use crate::error::{MazeError, Result};
use crate::spatial::Positioned;

/// A point mass in the constraint-grid engine.
///
/// Velocity is implicit: `pos - prev`. `locked` particles are excluded from
/// integration and from any corrective write made by the solver.
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub pos: DVec2,
    pub prev: DVec2,
    pub locked: bool,
    pub mass: f64,
}

impl Particle {
    pub fn new(pos: DVec2) -> Self {
        Self {
            pos,
            prev: pos,
            locked: false,
            mass: 1.0,
        }
    }

    pub fn locked(pos: DVec2) -> Self {
        Self {
            locked: true,
            ..Self::new(pos)
        }
    }

    /// Like [`Particle::new`], but with an explicit, validated mass.
    pub fn with_mass(pos: DVec2, mass: f64) -> Result<Self> {
        if mass <= 0.0 {
            return Err(MazeError::NonPositiveMass(mass));
        }
        Ok(Self { mass, ..Self::new(pos) })
    }

    /// Current velocity proxy, `pos - prev`.
    pub fn velocity(&self) -> DVec2 {
        self.pos - self.prev
    }

    pub fn inv_mass(&self) -> f64 {
        if self.locked {
            0.0
        } else {
            1.0 / self.mass
        }
    }

    /// Writes both `pos` and `prev`, destroying velocity.
    pub fn set_position(&mut self, p: DVec2) {
        self.pos = p;
        self.prev = p;
    }

    /// One position-Verlet step: `pos <- pos + (pos - prev) + accel * dt^2`.
    /// No-op for locked particles.
    pub fn integrate(&mut self, accel: DVec2, dt: f64) {
        if self.locked {
            self.prev = self.pos;
            return;
        }
        let v = self.velocity();
        self.prev = self.pos;
        self.pos += v + accel * dt * dt;
    }
}

impl Positioned for Particle {
    fn position(&self) -> DVec2 {
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locked_particle_never_moves() {
        let mut p = Particle::locked(DVec2::new(1.0, 2.0));
        p.integrate(DVec2::new(0.0, 980.0), 1.0 / 60.0);
        assert_eq!(p.pos, DVec2::new(1.0, 2.0));
        assert_eq!(p.prev, DVec2::new(1.0, 2.0));
    }

    #[test]
    fn set_position_destroys_velocity() {
        let mut p = Particle::new(DVec2::new(0.0, 0.0));
        p.pos = DVec2::new(5.0, 0.0);
        assert_eq!(p.velocity(), DVec2::new(5.0, 0.0));
        p.set_position(DVec2::new(10.0, 10.0));
        assert_eq!(p.velocity(), DVec2::ZERO);
    }

    #[test]
    fn with_mass_rejects_non_positive_mass() {
        let err = Particle::with_mass(DVec2::ZERO, 0.0).unwrap_err();
        assert_eq!(err, crate::error::MazeError::NonPositiveMass(0.0));
        assert!(Particle::with_mass(DVec2::ZERO, -1.0).is_err());
        assert!(Particle::with_mass(DVec2::ZERO, 2.0).is_ok());
    }

    #[test]
    fn free_fall_matches_verlet_formula() {
        let dt = 1.0 / 60.0;
        let g = DVec2::new(0.0, 980.0);
        let mut p = Particle::new(DVec2::new(0.0, 0.0));
        p.integrate(g, dt);
        // first step: prev was equal to pos, so velocity is zero before the step
        assert_eq!(p.pos, g * dt * dt);
    }
}
