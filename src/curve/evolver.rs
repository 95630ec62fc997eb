use glam::DVec2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use tracing::{instrument, trace, trace_span};

use crate::field::ParameterField;
use crate::spatial::{Positioned, SpatialIndex};

use super::curve::{Curve, FieldId};

/// Standard deviation of the per-component Brownian noise, and (per spec.md
/// §4.3's formula, which names the same `σ = 0.1` twice: once as the noise
/// distribution's stddev and once as a multiplicative "σ_base") the base
/// scale the noise is further multiplied by. See DESIGN.md for this reading.
const BROWNIAN_SIGMA: f64 = 0.1;

/// `k1` in `R1 = k1 * delta(pos)`. Spec.md §9 allows either `0.4` or `0.45`;
/// this engine fixes `0.4`.
const ATTRACTION_RADIUS_FACTOR: f64 = 0.4;

const LENNARD_JONES_SIGMA: f64 = 5.0;
const LENNARD_JONES_CLAMP: f64 = 10.0;

const ATTRACTION_EPSILON: f64 = 1e-3;
const ANISOTROPY_EPSILON: f64 = 1e-3;

/// A candidate segment for the attraction-repulsion broad phase, keyed by
/// its midpoint in the shared spatial index.
#[derive(Clone, Copy, Debug)]
struct SegmentRef {
    curve_index: usize,
    curve_id: u64,
    i: usize,
    j: usize,
    mid: DVec2,
}

impl Positioned for SegmentRef {
    fn position(&self) -> DVec2 {
        self.mid
    }
}

/// Closest point on segment `(u, v)` to `p`, and the parametric `t` it sits
/// at (`0` at `u`, `1` at `v`).
fn closest_point_on_segment(p: DVec2, u: DVec2, v: DVec2) -> DVec2 {
    let d = v - u;
    let len_sq = d.length_squared();
    if len_sq < 1e-12 {
        return u;
    }
    let t = ((p - u).dot(d) / len_sq).clamp(0.0, 1.0);
    u + d * t
}

/// Force assembly (Brownian, fairing, attraction-repulsion, anisotropy warp)
/// and Verlet integration for every sample of every owned curve, followed by
/// adaptive resampling. Owns the `ParameterField`s referenced by curve
/// parameters and the RNG, for determinism per spec.md §5.
pub struct CurveEvolver {
    pub curves: Vec<Curve>,
    fields: Vec<ParameterField>,
    anisotropy_field: FieldId,
    rng: StdRng,
    segment_index: SpatialIndex,
    segment_refs: Vec<SegmentRef>,
    dirty: bool,
}

impl CurveEvolver {
    pub fn new(seed: u64, cell_size: f64, anisotropy_field: ParameterField) -> Self {
        Self {
            curves: Vec::new(),
            fields: vec![anisotropy_field],
            anisotropy_field: FieldId(0),
            rng: StdRng::seed_from_u64(seed),
            segment_index: SpatialIndex::new(cell_size),
            segment_refs: Vec::new(),
            dirty: true,
        }
    }

    pub fn add_field(&mut self, field: ParameterField) -> FieldId {
        self.fields.push(field);
        FieldId(self.fields.len() - 1)
    }

    pub fn field(&self, id: FieldId) -> &ParameterField {
        &self.fields[id.0]
    }

    pub fn field_mut(&mut self, id: FieldId) -> &mut ParameterField {
        &mut self.fields[id.0]
    }

    pub fn add_curve(&mut self, curve: Curve) {
        self.curves.push(curve);
        self.dirty = true;
    }

    pub fn remove_curve(&mut self, id: u64) {
        self.curves.retain(|c| c.id != id);
        self.dirty = true;
    }

    fn rebuild_segment_index(&mut self) {
        let mut refs = Vec::new();
        for (ci, curve) in self.curves.iter().enumerate() {
            for (i, j) in curve.segment_indices() {
                let mid = (curve.samples[i].pos + curve.samples[j].pos) * 0.5;
                refs.push(SegmentRef {
                    curve_index: ci,
                    curve_id: curve.id,
                    i,
                    j,
                    mid,
                });
            }
        }
        self.segment_index.rebuild(&refs);
        self.segment_refs = refs;
        self.dirty = false;
    }

    fn brownian_force(rng: &mut StdRng, delta: f64, f_b: f64) -> DVec2 {
        if f_b <= 0.0 {
            return DVec2::ZERO;
        }
        let normal = Normal::new(0.0, BROWNIAN_SIGMA).expect("valid stddev");
        let xi = DVec2::new(normal.sample(rng), normal.sample(rng));
        xi * f_b * delta * BROWNIAN_SIGMA
    }

    fn fairing_force(curve: &Curve, i: usize, f_f: f64) -> DVec2 {
        let (Some(pi), Some(ni)) = (curve.prev_index(i), curve.next_index(i)) else {
            return DVec2::ZERO;
        };
        let sp = &curve.samples[pi];
        let sn = &curve.samples[ni];
        let dp = sp.delta;
        let dn = sn.delta;
        let sum = dp + dn;
        if sum <= 0.0 {
            return DVec2::ZERO;
        }
        let target = (sp.pos * dn + sn.pos * dp) / sum - curve.samples[i].pos;
        target * f_f
    }

    /// Reads `segment_index` and `curves` by explicit reference rather than
    /// `&self` so callers can hold this borrow alongside a disjoint `&mut
    /// self.rng` in the same scope.
    fn attraction_repulsion_force(
        segment_index: &SpatialIndex,
        curves: &[Curve],
        curve: &Curve,
        i: usize,
        f_a: f64,
        segment_refs: &[SegmentRef],
    ) -> DVec2 {
        let sample = &curve.samples[i];
        if sample.ignore_neighbors {
            return DVec2::ZERO;
        }
        let r1 = ATTRACTION_RADIUS_FACTOR * sample.delta;
        if r1 <= 0.0 {
            return DVec2::ZERO;
        }
        let candidates = segment_index.query_radius(segment_refs, sample.pos.x, sample.pos.y, r1);

        let mut force = DVec2::ZERO;
        for idx in candidates {
            let seg = &segment_refs[idx];
            if seg.curve_id == curve.id {
                let topo = curve.topological_distance(i, seg.i).min(curve.topological_distance(i, seg.j));
                if topo <= curve.params.nmin {
                    continue;
                }
            }
            let other_curve = &curves[seg.curve_index];
            let u = other_curve.samples[seg.i].pos;
            let v = other_curve.samples[seg.j].pos;
            let q = closest_point_on_segment(sample.pos, u, v);
            let r = sample.pos.distance(q);
            if r >= r1 || r < ATTRACTION_EPSILON {
                continue;
            }
            let ratio = LENNARD_JONES_SIGMA / r;
            let w = (ratio.powi(12) - ratio.powi(6)).clamp(-LENNARD_JONES_CLAMP, LENNARD_JONES_CLAMP);
            force += (sample.pos - q) / r * w * f_a;
        }
        force
    }

    fn anisotropy_warp(anisotropy_field: &ParameterField, pos: DVec2, force: DVec2) -> DVec2 {
        let g = anisotropy_field.gradient(pos.x, pos.y);
        if g.length() < ANISOTROPY_EPSILON {
            return force;
        }
        let g_hat = g.normalize();
        force + g_hat * g_hat.dot(force)
    }

    /// One tick: assemble forces for every sample (Brownian, fairing,
    /// attraction-repulsion with anisotropy warp), apply them with a Verlet
    /// step, then resample every curve (split, then merge).
    #[instrument(level = "trace", skip_all)]
    pub fn tick(&mut self, dt: f64) {
        if self.dirty {
            self.rebuild_segment_index();
        }
        let segment_refs = self.segment_refs.clone();

        let mut forces: Vec<Vec<DVec2>> = Vec::with_capacity(self.curves.len());
        {
            let span = trace_span!("assemble_forces");
            let _enter = span.enter();
            // Disjoint field borrows, not `&self`/`&mut self` method calls:
            // `rng` needs exclusive access while `fields`/`curves`/
            // `segment_index` are read, and the borrow checker only allows
            // that split when every access below goes through these local
            // bindings rather than back through `self`.
            let fields = &self.fields;
            let curves = &self.curves;
            let segment_index = &self.segment_index;
            let rng = &mut self.rng;
            let anisotropy_field = &fields[self.anisotropy_field.0];
            for curve in curves.iter() {
                let f_b = &fields[curve.params.f_b.0];
                let f_f = &fields[curve.params.f_f.0];
                let f_a = &fields[curve.params.f_a.0];
                let mut curve_forces = Vec::with_capacity(curve.samples.len());
                for i in 0..curve.samples.len() {
                    let pos = curve.samples[i].pos;
                    let fb_val = f_b.sample(pos.x, pos.y);
                    let ff_val = f_f.sample(pos.x, pos.y);
                    let fa_val = f_a.sample(pos.x, pos.y);

                    let brownian = Self::brownian_force(rng, curve.samples[i].delta, fb_val);
                    let fairing = Self::fairing_force(curve, i, ff_val);
                    let mut attraction = Self::attraction_repulsion_force(
                        segment_index,
                        curves,
                        curve,
                        i,
                        fa_val,
                        &segment_refs,
                    );
                    attraction = Self::anisotropy_warp(anisotropy_field, pos, attraction);

                    let total = brownian + fairing + attraction;
                    trace!(sample = i, curve = curve.id, force = ?total, "assembled force");
                    curve_forces.push(total);
                }
                forces.push(curve_forces);
            }
        }

        {
            let span = trace_span!("integrate");
            let _enter = span.enter();
            for (curve, curve_forces) in self.curves.iter_mut().zip(forces.iter()) {
                for (sample, &force) in curve.samples.iter_mut().zip(curve_forces.iter()) {
                    sample.step(force, dt);
                }
            }
        }

        {
            let span = trace_span!("resample");
            let _enter = span.enter();
            for curve in self.curves.iter_mut() {
                curve.resample();
            }
        }

        self.dirty = true;
    }

    pub fn insert_sample_on_nearest_segment(&mut self, point: DVec2, tolerance: f64) -> bool {
        let mut best: Option<(usize, usize, usize, DVec2, f64)> = None;
        for (ci, curve) in self.curves.iter().enumerate() {
            for (i, j) in curve.segment_indices() {
                let q = closest_point_on_segment(point, curve.samples[i].pos, curve.samples[j].pos);
                let d = point.distance(q);
                if d <= tolerance && best.as_ref().map_or(true, |b| d < b.4) {
                    best = Some((ci, i, j, q, d));
                }
            }
        }
        let Some((ci, i, _j, q, _d)) = best else {
            return false;
        };
        let curve = &mut self.curves[ci];
        let delta = (curve.samples[i].delta + curve.samples[curve.next_index(i).unwrap_or(i)].delta) * 0.5;
        let id = curve.id;
        curve.samples.insert(i + 1, super::sample::Sample::new(q, delta, id, 0));
        curve.reconcile_indices();
        self.dirty = true;
        true
    }

    pub fn remove_nearest_sample(&mut self, point: DVec2, tolerance: f64) -> bool {
        let mut best: Option<(usize, usize, f64)> = None;
        for (ci, curve) in self.curves.iter().enumerate() {
            for (i, sample) in curve.samples.iter().enumerate() {
                if sample.locked {
                    continue;
                }
                let d = point.distance(sample.pos);
                if d <= tolerance && best.as_ref().map_or(true, |b| d < b.2) {
                    best = Some((ci, i, d));
                }
            }
        }
        let Some((ci, i, _)) = best else {
            return false;
        };
        self.curves[ci].samples.remove(i);
        self.curves[ci].reconcile_indices();
        self.dirty = true;
        true
    }
}
