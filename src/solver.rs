use tracing::{instrument, trace_span};

use crate::config::EngineConfig;
use crate::constraint::{resolve_contact, DistanceConstraint};
use crate::particle::Particle;
use crate::spatial::SpatialIndex;

/// Verlet integration + position-based distance-constraint relaxation +
/// contact resolution + world clamp, run once per tick by [`crate::grid_engine::GridEngine`].
#[derive(Debug, Default)]
pub struct GridSolver;

impl GridSolver {
    /// Runs one full tick in the four steps spec.md §4.2 numbers:
    /// integrate, rebuild the index, `K` Gauss-Seidel iterations of
    /// (constraints then contacts), clamp.
    #[instrument(level = "trace", skip_all)]
    pub fn step(
        &self,
        particles: &mut [Particle],
        constraints: &[DistanceConstraint],
        index: &mut SpatialIndex,
        config: &EngineConfig,
    ) {
        self.integrate(particles, config);
        index.rebuild(particles);

        for iter in 0..config.solver_iterations {
            let span = trace_span!("iteration", iter);
            let _enter = span.enter();
            self.relax_constraints(particles, constraints);
            self.resolve_contacts(particles, index, config);
        }

        self.clamp(particles, config);
    }

    #[instrument(level = "trace", skip_all)]
    fn integrate(&self, particles: &mut [Particle], config: &EngineConfig) {
        for p in particles.iter_mut() {
            p.integrate(config.gravity, config.dt);
        }
    }

    #[instrument(level = "trace", skip_all)]
    fn relax_constraints(&self, particles: &mut [Particle], constraints: &[DistanceConstraint]) {
        for c in constraints {
            c.relax(particles);
        }
    }

    /// Queries the 3x3 neighborhood of every particle and resolves overlaps.
    /// Order follows particle insertion order, and within a cell, bucket
    /// insertion order, so results are deterministic given identical input.
    #[instrument(level = "trace", skip_all)]
    fn resolve_contacts(&self, particles: &mut [Particle], index: &SpatialIndex, config: &EngineConfig) {
        for i in 0..particles.len() {
            let neighbors = index.query_neighbors(particles[i].pos);
            for j in neighbors {
                if j <= i {
                    continue;
                }
                resolve_contact(particles, i, j, config.contact_min_distance);
            }
        }
    }

    #[instrument(level = "trace", skip_all)]
    fn clamp(&self, particles: &mut [Particle], config: &EngineConfig) {
        let (min, max) = config.clamp_rect();
        for p in particles.iter_mut() {
            p.pos.x = p.pos.x.clamp(min.x, max.x);
            p.pos.y = p.pos.y.clamp(min.y, max.y);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::ParticleId;
    use glam::DVec2;

    fn config() -> EngineConfig {
        EngineConfig {
            width: 800.0,
            height: 600.0,
            bottom_margin: 60.0,
            ..Default::default()
        }
    }

    #[test]
    fn pendulum_stays_near_rest_length() {
        let config = config();
        let mut particles = vec![
            Particle::locked(DVec2::new(100.0, 100.0)),
            Particle::new(DVec2::new(140.0, 100.0)),
        ];
        let constraints = vec![DistanceConstraint::new(ParticleId(0), ParticleId(1), 40.0)];
        let mut index = SpatialIndex::new(config.cell_size);
        let solver = GridSolver;
        for _ in 0..600 {
            solver.step(&mut particles, &constraints, &mut index, &config);
            let d = particles[1].pos.distance(particles[0].pos);
            assert!((d - 40.0).abs() <= 1e-6, "distance {d} out of pendulum bound");
        }
    }

    #[test]
    fn overlap_resolves_within_one_tick() {
        let config = config();
        let mut particles = vec![
            Particle::new(DVec2::new(100.0, 100.0)),
            Particle::new(DVec2::new(104.0, 100.0)),
        ];
        let mut index = SpatialIndex::new(config.cell_size);
        let solver = GridSolver;
        solver.step(&mut particles, &[], &mut index, &config);
        let d = particles[1].pos.distance(particles[0].pos);
        assert!(d >= 7.9);
    }

    #[test]
    fn all_particles_stay_in_clamp_rect_after_tick() {
        let config = config();
        let mut particles = vec![Particle::new(DVec2::new(5.0, 595.0))];
        let mut index = SpatialIndex::new(config.cell_size);
        let solver = GridSolver;
        for _ in 0..10 {
            solver.step(&mut particles, &[], &mut index, &config);
        }
        let (min, max) = config.clamp_rect();
        for p in &particles {
            assert!(p.pos.x >= min.x && p.pos.x <= max.x);
            assert!(p.pos.y >= min.y && p.pos.y <= max.y);
        }
    }

    #[test]
    fn double_lock_unchanged_across_many_ticks() {
        let config = config();
        let mut particles = vec![
            Particle::locked(DVec2::new(0.0, 0.0)),
            Particle::locked(DVec2::new(20.0, 0.0)),
        ];
        let constraints = vec![DistanceConstraint::new(ParticleId(0), ParticleId(1), 10.0)];
        let mut index = SpatialIndex::new(config.cell_size);
        let solver = GridSolver;
        for _ in 0..20 {
            solver.step(&mut particles, &constraints, &mut index, &config);
        }
        assert_eq!(particles[0].pos, DVec2::new(0.0, 0.0));
        assert_eq!(particles[1].pos, DVec2::new(20.0, 0.0));
    }
}
