use glam::DVec2;
use tracing::warn;

use crate::config::EngineConfig;
use crate::constraint::{DistanceConstraint, ParticleId};
use crate::error::{MazeError, Result};
use crate::particle::Particle;
use crate::solver::GridSolver;
use crate::spatial::SpatialIndex;

/// Owns the particles, distance constraints, and spatial index of the
/// constraint-based grid engine, and runs one tick at a time.
pub struct GridEngine {
    pub particles: Vec<Particle>,
    pub constraints: Vec<DistanceConstraint>,
    config: EngineConfig,
    index: SpatialIndex,
    solver: GridSolver,
}

impl GridEngine {
    pub fn new(config: EngineConfig) -> Self {
        let index = SpatialIndex::new(config.cell_size);
        Self {
            particles: Vec::new(),
            constraints: Vec::new(),
            config,
            index,
            solver: GridSolver,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn add_particle(&mut self, particle: Particle) -> ParticleId {
        self.particles.push(particle);
        ParticleId(self.particles.len() - 1)
    }

    pub fn add_constraint(&mut self, a: ParticleId, b: ParticleId, rest_length: Option<f64>) -> Result<()> {
        if a.index() >= self.particles.len() {
            return Err(MazeError::ParticleIndexOutOfRange {
                index: a.index(),
                len: self.particles.len(),
            });
        }
        if b.index() >= self.particles.len() {
            return Err(MazeError::ParticleIndexOutOfRange {
                index: b.index(),
                len: self.particles.len(),
            });
        }
        let rest_length = rest_length
            .unwrap_or_else(|| self.particles[b.index()].pos.distance(self.particles[a.index()].pos));
        self.constraints.push(DistanceConstraint::new(a, b, rest_length));
        Ok(())
    }

    /// Removes the particle nearest `point` within `tolerance`, cascading
    /// removal to any constraint touching it, and reindexing the remaining
    /// constraints to the shifted particle list.
    pub fn remove_at(&mut self, point: DVec2, tolerance: f64) -> bool {
        let Some((idx, _)) = self
            .particles
            .iter()
            .enumerate()
            .map(|(i, p)| (i, p.pos.distance(point)))
            .filter(|&(_, d)| d <= tolerance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
        else {
            return false;
        };
        self.particles.remove(idx);
        self.constraints.retain(|c| c.a.index() != idx && c.b.index() != idx);
        for c in self.constraints.iter_mut() {
            if c.a.index() > idx {
                c.a = ParticleId(c.a.index() - 1);
            }
            if c.b.index() > idx {
                c.b = ParticleId(c.b.index() - 1);
            }
        }
        true
    }

    pub fn drag_to(&mut self, id: ParticleId, point: DVec2) {
        if let Some(p) = self.particles.get_mut(id.index()) {
            p.set_position(point);
        }
    }

    pub fn clear(&mut self) {
        self.particles.clear();
        self.constraints.clear();
        self.index.clear();
    }

    /// Drops constraints referencing particles beyond the current particle
    /// list (spec.md §7's structural-integrity audit), logging a warning for
    /// each one dropped.
    pub fn audit_structural_integrity(&mut self) {
        let len = self.particles.len();
        self.constraints.retain(|c| {
            let valid = c.a.index() < len && c.b.index() < len;
            if !valid {
                warn!("dropping constraint with dangling endpoint: {:?}", c);
            }
            valid
        });
    }

    /// Runs one tick: audit, then the full solver pass.
    pub fn tick(&mut self) {
        self.audit_structural_integrity();
        self.solver
            .step(&mut self.particles, &self.constraints, &mut self.index, &self.config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dangling_constraint_is_dropped_with_warning_and_sim_continues() {
        let mut engine = GridEngine::new(EngineConfig::default());
        let a = engine.add_particle(Particle::new(DVec2::new(0.0, 0.0)));
        let b = engine.add_particle(Particle::new(DVec2::new(10.0, 0.0)));
        engine.add_constraint(a, b, Some(10.0)).unwrap();
        engine.remove_at(DVec2::new(10.0, 0.0), 1.0);
        assert!(engine.constraints.is_empty());
        engine.tick();
        assert!(engine.particles[0].pos.is_finite());
    }

    #[test]
    fn out_of_range_constraint_index_is_rejected() {
        let mut engine = GridEngine::new(EngineConfig::default());
        engine.add_particle(Particle::new(DVec2::ZERO));
        let err = engine
            .add_constraint(ParticleId(0), ParticleId(5), Some(1.0))
            .unwrap_err();
        assert_eq!(
            err,
            MazeError::ParticleIndexOutOfRange { index: 5, len: 1 }
        );
    }
}
