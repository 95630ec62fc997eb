use glam::DVec2;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constraint::{DistanceConstraint, ParticleId};
use crate::particle::Particle;

fn default_one() -> f64 {
    1.0
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParticleRecord {
    pub x: f64,
    pub y: f64,
    pub locked: bool,
    #[serde(default = "default_one")]
    pub mass: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConstraintRecord {
    pub a: usize,
    pub b: usize,
    #[serde(rename = "restLength")]
    pub rest_length: f64,
    #[serde(default = "default_one")]
    pub stiffness: f64,
}

/// The persisted maze JSON format: particles plus index-referencing
/// constraints. Solver state (`prev`) is not persisted; on load every
/// particle's `prev` is set equal to `pos`, yielding zero initial velocity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MazeFile {
    pub particles: Vec<ParticleRecord>,
    pub constraints: Vec<ConstraintRecord>,
}

impl MazeFile {
    pub fn from_engine(particles: &[Particle], constraints: &[DistanceConstraint]) -> Self {
        Self {
            particles: particles
                .iter()
                .map(|p| ParticleRecord {
                    x: p.pos.x,
                    y: p.pos.y,
                    locked: p.locked,
                    mass: p.mass,
                })
                .collect(),
            constraints: constraints
                .iter()
                .map(|c| ConstraintRecord {
                    a: c.a.index(),
                    b: c.b.index(),
                    rest_length: c.rest_length,
                    stiffness: c.stiffness,
                })
                .collect(),
        }
    }

    /// Reconstructs particles and constraints. Out-of-range constraint
    /// indices are dropped with a warning rather than failing the whole
    /// load, per spec.md §6/§7.
    pub fn into_engine_state(self) -> (Vec<Particle>, Vec<DistanceConstraint>) {
        let particles: Vec<Particle> = self
            .particles
            .into_iter()
            .map(|r| {
                let pos = DVec2::new(r.x, r.y);
                Particle {
                    pos,
                    prev: pos,
                    locked: r.locked,
                    mass: r.mass,
                }
            })
            .collect();

        let len = particles.len();
        let constraints = self
            .constraints
            .into_iter()
            .filter_map(|r| {
                if r.a >= len || r.b >= len {
                    warn!(
                        "dropping constraint with out-of-range endpoint: a={}, b={}, len={}",
                        r.a, r.b, len
                    );
                    return None;
                }
                Some(DistanceConstraint {
                    a: ParticleId(r.a),
                    b: ParticleId(r.b),
                    rest_length: r.rest_length,
                    stiffness: r.stiffness,
                })
            })
            .collect();

        (particles, constraints)
    }

    pub fn to_json(&self) -> crate::error::Result<String> {
        serde_json::to_string(self).map_err(Into::into)
    }

    pub fn from_json(s: &str) -> crate::error::Result<Self> {
        serde_json::from_str(s).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let particles = vec![Particle::locked(DVec2::ZERO), Particle::new(DVec2::new(10.0, 0.0))];
        let constraints = vec![DistanceConstraint::new(ParticleId(0), ParticleId(1), 10.0)];
        let file = MazeFile::from_engine(&particles, &constraints);
        let json = file.to_json().unwrap();
        let loaded = MazeFile::from_json(&json).unwrap();
        let (p2, c2) = loaded.into_engine_state();
        assert_eq!(p2.len(), 2);
        assert_eq!(c2.len(), 1);
        assert_eq!(p2[1].pos, p2[1].prev);
    }

    #[test]
    fn out_of_range_constraint_is_dropped_not_fatal() {
        let json = r#"{
            "particles": [{"x": 0.0, "y": 0.0, "locked": true}],
            "constraints": [{"a": 0, "b": 5, "restLength": 10.0}]
        }"#;
        let file = MazeFile::from_json(json).unwrap();
        let (particles, constraints) = file.into_engine_state();
        assert_eq!(particles.len(), 1);
        assert!(constraints.is_empty());
    }

    #[test]
    fn missing_optional_fields_default_to_one() {
        let json = r#"{
            "particles": [{"x": 0.0, "y": 0.0, "locked": false}],
            "constraints": []
        }"#;
        let file = MazeFile::from_json(json).unwrap();
        assert_eq!(file.particles[0].mass, 1.0);
    }

    #[test]
    fn malformed_json_is_a_specific_error_not_a_panic() {
        let err = MazeFile::from_json("not json").unwrap_err();
        assert!(matches!(err, crate::error::MazeError::Malformed(_)));
    }
}
