use glam::DVec2;

use crate::config::EngineConfig;
use crate::constraint::{DistanceConstraint, ParticleId};
use crate::curve::{Curve, CurveEvolver};
use crate::error::Result;
use crate::field::ParameterField;
use crate::grid_engine::GridEngine;
use crate::history::History;
use crate::particle::Particle;

/// User-editing mode. `Drag` is used by the grid engine, `Select` names the
/// same gesture for the curve engine; both map to the same facade calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Draw,
    Erase,
    Drag,
    Select,
}

/// Which simulation core `tick()` currently advances. Both engines coexist
/// in memory; only one receives ticks at a time (spec.md §2/§5).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActiveEngine {
    Grid,
    Curve,
}

/// Per-frame inspection output (spec.md §6).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameStats {
    pub fps_ema: f64,
    pub entity_count: usize,
    pub link_count: usize,
}

#[derive(Clone)]
struct GridSnapshot {
    particles: Vec<Particle>,
    constraints: Vec<DistanceConstraint>,
}

#[derive(Clone)]
struct CurveSnapshot {
    curves: Vec<Curve>,
}

const FPS_EMA_FACTOR: f64 = 0.9;

/// Orchestrates one tick of the active engine and forwards user edits to the
/// relevant subsystem. This is the crate's sole public entry point for a
/// presentation layer: it never renders, reads input devices, or touches a
/// filesystem itself (see `io.rs` for the persisted format it hands JSON
/// strings to/from).
pub struct Facade {
    pub grid: GridEngine,
    pub curves: CurveEvolver,
    active: ActiveEngine,
    mode: Mode,
    paused: bool,
    show_force_vectors: bool,
    grid_history: History<GridSnapshot>,
    curve_history: History<CurveSnapshot>,
    fps_ema: Option<f64>,
}

impl Facade {
    pub fn new(config: EngineConfig, seed: u64, anisotropy_field: ParameterField) -> Self {
        let history_capacity = config.history_capacity;
        let cell_size = config.cell_size;
        Self {
            grid: GridEngine::new(config),
            curves: CurveEvolver::new(seed, cell_size, anisotropy_field),
            active: ActiveEngine::Grid,
            mode: Mode::Draw,
            paused: false,
            show_force_vectors: false,
            grid_history: History::new(history_capacity),
            curve_history: History::new(history_capacity),
            fps_ema: None,
        }
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_active_engine(&mut self, active: ActiveEngine) {
        self.active = active;
    }

    pub fn active_engine(&self) -> ActiveEngine {
        self.active
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn set_show_force_vectors(&mut self, show: bool) {
        self.show_force_vectors = show;
    }

    /// Advances the active engine by one fixed tick. A no-op while paused;
    /// queries and edits remain available regardless (spec.md §5).
    pub fn tick(&mut self) {
        if self.paused {
            return;
        }
        match self.active {
            ActiveEngine::Grid => self.grid.tick(),
            ActiveEngine::Curve => {
                let dt = self.grid.config().dt;
                self.curves.tick(dt);
            }
        }
    }

    /// Updates the rolling FPS estimate from an instantaneous sample,
    /// `ema <- factor*ema + (1-factor)*sample`.
    pub fn record_frame_time(&mut self, instantaneous_fps: f64) {
        self.fps_ema = Some(match self.fps_ema {
            Some(prev) => FPS_EMA_FACTOR * prev + (1.0 - FPS_EMA_FACTOR) * instantaneous_fps,
            None => instantaneous_fps,
        });
    }

    pub fn frame_stats(&self) -> FrameStats {
        let (entity_count, link_count) = match self.active {
            ActiveEngine::Grid => (self.grid.particles.len(), self.grid.constraints.len()),
            ActiveEngine::Curve => (
                self.curves.curves.iter().map(|c| c.len()).sum(),
                self.curves.curves.len(),
            ),
        };
        FrameStats {
            fps_ema: self.fps_ema.unwrap_or(0.0),
            entity_count,
            link_count,
        }
    }

    /// `(pos - prev) * 10` for every live particle/sample, only computed
    /// when force-vector display is toggled on.
    pub fn debug_vectors(&self) -> Vec<(DVec2, DVec2)> {
        if !self.show_force_vectors {
            return Vec::new();
        }
        match self.active {
            ActiveEngine::Grid => self
                .grid
                .particles
                .iter()
                .map(|p| (p.pos, (p.pos - p.prev) * 10.0))
                .collect(),
            ActiveEngine::Curve => self
                .curves
                .curves
                .iter()
                .flat_map(|c| c.samples.iter())
                .map(|s| (s.pos, (s.pos - s.prev) * 10.0))
                .collect(),
        }
    }

    // --- Grid edit operations ---

    pub fn add_particle(&mut self, particle: Particle) -> ParticleId {
        self.grid.add_particle(particle)
    }

    pub fn add_constraint(&mut self, a: ParticleId, b: ParticleId, rest_length: Option<f64>) -> Result<()> {
        self.grid.add_constraint(a, b, rest_length)
    }

    pub fn remove_at(&mut self, point: DVec2, tolerance: f64) -> bool {
        self.grid.remove_at(point, tolerance)
    }

    pub fn drag_to(&mut self, id: ParticleId, point: DVec2) {
        self.grid.drag_to(id, point)
    }

    pub fn clear(&mut self) {
        match self.active {
            ActiveEngine::Grid => self.grid.clear(),
            ActiveEngine::Curve => self.curves.curves.clear(),
        }
    }

    // --- Curve edit operations ---

    pub fn add_curve(&mut self, curve: Curve) {
        self.curves.add_curve(curve);
    }

    pub fn remove_curve(&mut self, id: u64) {
        self.curves.remove_curve(id);
    }

    pub fn insert_sample_on_nearest_segment(&mut self, point: DVec2, tolerance: f64) -> bool {
        self.curves.insert_sample_on_nearest_segment(point, tolerance)
    }

    pub fn remove_nearest_sample(&mut self, point: DVec2, tolerance: f64) -> bool {
        self.curves.remove_nearest_sample(point, tolerance)
    }

    /// Clears the active engine and reseeds it with a default shape: a
    /// closed ring of locked-free particles linked by distance constraints
    /// for the grid engine, or a closed circular curve for the curve
    /// engine. Bound to the `G` key per spec.md §6.
    pub fn generate(&mut self) {
        match self.active {
            ActiveEngine::Grid => {
                self.grid.clear();
                let center = DVec2::new(self.grid.config().width / 2.0, self.grid.config().height / 3.0);
                let radius = 100.0;
                let n = 16;
                let ids: Vec<ParticleId> = (0..n)
                    .map(|i| {
                        let theta = 2.0 * std::f64::consts::PI * (i as f64) / (n as f64);
                        let pos = center + DVec2::new(theta.cos(), theta.sin()) * radius;
                        self.grid.add_particle(Particle::new(pos))
                    })
                    .collect();
                for i in 0..n {
                    let a = ids[i];
                    let b = ids[(i + 1) % n];
                    self.grid.add_constraint(a, b, None).expect("freshly created ids are in range");
                }
            }
            ActiveEngine::Curve => {
                self.curves.curves.clear();
            }
        }
    }

    /// Serializes the grid engine's particles/constraints to the persisted
    /// maze JSON format (spec.md §6). The curve engine has no persisted
    /// format in scope.
    pub fn export(&self) -> Result<String> {
        crate::io::MazeFile::from_engine(&self.grid.particles, &self.grid.constraints).to_json()
    }

    /// Loads the persisted maze JSON format into the grid engine, replacing
    /// its current particles/constraints. Leaves state unchanged if the JSON
    /// itself fails to parse; out-of-range constraint indices within an
    /// otherwise-valid file are dropped individually (spec.md §7).
    pub fn import(&mut self, json: &str) -> Result<()> {
        let file = crate::io::MazeFile::from_json(json)?;
        let (particles, constraints) = file.into_engine_state();
        self.grid.particles = particles;
        self.grid.constraints = constraints;
        Ok(())
    }

    // --- History ---

    /// Saves one snapshot of the active engine. Called once per user gesture
    /// (e.g. on mouse release), not per intermediate frame.
    pub fn save_state(&mut self) {
        match self.active {
            ActiveEngine::Grid => self.grid_history.save(GridSnapshot {
                particles: self.grid.particles.clone(),
                constraints: self.grid.constraints.clone(),
            }),
            ActiveEngine::Curve => self.curve_history.save(CurveSnapshot {
                curves: self.curves.curves.clone(),
            }),
        }
    }

    pub fn undo(&mut self) {
        match self.active {
            ActiveEngine::Grid => {
                if let Some(snapshot) = self.grid_history.undo() {
                    self.grid.particles = snapshot.particles.clone();
                    self.grid.constraints = snapshot.constraints.clone();
                }
            }
            ActiveEngine::Curve => {
                if let Some(snapshot) = self.curve_history.undo() {
                    self.curves.curves = snapshot.curves.clone();
                }
            }
        }
    }

    pub fn redo(&mut self) {
        match self.active {
            ActiveEngine::Grid => {
                if let Some(snapshot) = self.grid_history.redo() {
                    self.grid.particles = snapshot.particles.clone();
                    self.grid.constraints = snapshot.constraints.clone();
                }
            }
            ActiveEngine::Curve => {
                if let Some(snapshot) = self.curve_history.redo() {
                    self.curves.curves = snapshot.curves.clone();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{CurveKind, CurveParams};

    fn flat_field() -> ParameterField {
        ParameterField::new(2, 2, DVec2::new(-500.0, -500.0), DVec2::new(500.0, 500.0), 0.0)
    }

    #[test]
    fn history_round_trip_restores_grid_state() {
        let mut facade = Facade::new(EngineConfig::default(), 1, flat_field());
        let a = facade.add_particle(Particle::locked(DVec2::ZERO));
        let b = facade.add_particle(Particle::new(DVec2::new(40.0, 0.0)));
        facade.add_constraint(a, b, Some(40.0)).unwrap();
        facade.save_state();

        for _ in 0..30 {
            facade.tick();
        }
        let moved = facade.grid.particles[1].pos;
        facade.save_state();

        // One undo steps from the just-saved "moved" snapshot back to the
        // first ("at rest") one.
        facade.undo();
        assert_eq!(facade.grid.particles[1].pos, DVec2::new(40.0, 0.0));

        // Already at the oldest snapshot: a further undo is a silent no-op.
        facade.undo();
        assert_eq!(facade.grid.particles[1].pos, DVec2::new(40.0, 0.0));

        facade.redo();
        assert_eq!(facade.grid.particles[1].pos, moved);
    }

    #[test]
    fn paused_facade_does_not_integrate() {
        let mut facade = Facade::new(EngineConfig::default(), 1, flat_field());
        facade.add_particle(Particle::new(DVec2::new(100.0, 100.0)));
        facade.set_paused(true);
        let before = facade.grid.particles[0].pos;
        facade.tick();
        assert_eq!(facade.grid.particles[0].pos, before);
    }

    #[test]
    fn debug_vectors_empty_unless_enabled() {
        let mut facade = Facade::new(EngineConfig::default(), 1, flat_field());
        facade.add_particle(Particle::new(DVec2::new(100.0, 100.0)));
        assert!(facade.debug_vectors().is_empty());
        facade.set_show_force_vectors(true);
        facade.tick();
        assert_eq!(facade.debug_vectors().len(), 1);
    }

    #[test]
    fn generate_reseeds_a_closed_ring() {
        let mut facade = Facade::new(EngineConfig::default(), 1, flat_field());
        facade.generate();
        assert_eq!(facade.grid.particles.len(), 16);
        assert_eq!(facade.grid.constraints.len(), 16);
    }

    #[test]
    fn export_then_import_round_trips_grid_state() {
        let mut facade = Facade::new(EngineConfig::default(), 1, flat_field());
        facade.generate();
        let json = facade.export().unwrap();
        let mut other = Facade::new(EngineConfig::default(), 1, flat_field());
        other.import(&json).unwrap();
        assert_eq!(other.grid.particles.len(), facade.grid.particles.len());
        assert_eq!(other.grid.constraints.len(), facade.grid.constraints.len());
    }

    #[test]
    fn curve_history_round_trip() {
        let mut facade = Facade::new(EngineConfig::default(), 1, flat_field());
        facade.set_active_engine(ActiveEngine::Curve);
        let f = facade.curves.add_field(flat_field());
        let params = CurveParams {
            f_b: f,
            f_f: f,
            f_a: f,
            d: 20.0,
            kmin: 0.2,
            kmax: 1.2,
            nmin: 1,
        };
        let curve = Curve::from_positions(
            1,
            vec![DVec2::ZERO, DVec2::new(10.0, 0.0)],
            1.0,
            false,
            CurveKind::Labyrinth,
            params,
        );
        facade.add_curve(curve);
        facade.save_state();
        facade.remove_curve(1);
        assert!(facade.curves.curves.is_empty());
        facade.undo();
        assert_eq!(facade.curves.curves.len(), 1);
    }
}
