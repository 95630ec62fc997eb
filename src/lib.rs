//! A two-dimensional physical-simulation core that evolves mass-point
//! networks and poly-lines into maze-like geometries.
//!
//! Two engines share a Verlet integrator and a uniform spatial hash:
//! - [`grid_engine::GridEngine`]: particles linked by rigid distance
//!   constraints, with gravity and contact collisions, solved by
//!   [`solver::GridSolver`].
//! - [`curve::evolver::CurveEvolver`]: poly-lines (`Curve`s of `Sample`s)
//!   driven by Brownian noise, Laplacian fairing, and a long-range
//!   attraction-repulsion potential, with adaptive resampling.
//!
//! [`facade::Facade`] is the crate's single entry point for a presentation
//! layer: it owns both engines, forwards edits, and exposes undo/redo. This
//! crate renders nothing and reads no input devices or files itself — see
//! [`io`] for the persisted JSON format it can serialize to/from a string.

pub mod config;
pub mod constraint;
pub mod curve;
pub mod error;
pub mod facade;
pub mod field;
pub mod grid_engine;
pub mod history;
pub mod io;
pub mod particle;
pub mod solver;
pub mod spatial;

pub use config::EngineConfig;
pub use constraint::{DistanceConstraint, ParticleId};
pub use curve::{Curve, CurveEvolver, CurveKind, CurveParams, FieldId, Sample};
pub use error::{MazeError, Result};
pub use facade::{ActiveEngine, Facade, FrameStats, Mode};
pub use field::ParameterField;
pub use grid_engine::GridEngine;
pub use history::History;
pub use io::MazeFile;
pub use particle::Particle;
pub use solver::GridSolver;
pub use spatial::{Positioned, SpatialIndex};
