use glam::DVec2;

use super::sample::Sample;

/// Opaque handle into a [`super::evolver::CurveEvolver`]'s `ParameterField`
/// table, picked out for the spatially-varying per-curve weights (`fB`,
/// `fF`, `fA`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldId(pub usize);

/// Role a curve plays in the generated maze; purely descriptive, carried for
/// the presentation layer to style curves differently.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CurveKind {
    Boundary,
    Gap,
    Labyrinth,
    Solution,
}

/// Per-curve evolution weights. `f_b`/`f_f`/`f_a` name a
/// [`crate::field::ParameterField`] the evolver samples at each point
/// instead of a flat scalar, so the strength of each force can vary across
/// the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurveParams {
    pub f_b: FieldId,
    pub f_f: FieldId,
    pub f_a: FieldId,
    /// Baseline segment-length unit; resample thresholds are `kmin*d*avg_delta`
    /// and `kmax*d*avg_delta`.
    pub d: f64,
    pub kmin: f64,
    pub kmax: f64,
    /// Minimum topological index distance within which a curve's own
    /// segments are excluded from its samples' attraction-repulsion query.
    pub nmin: usize,
}

impl CurveParams {
    pub fn validate(&self) -> bool {
        self.kmin >= 0.0 && self.kmin < self.kmax && self.nmin >= 1 && self.d > 0.0
    }
}

/// An ordered sequence of samples, open or closed, with role and evolution
/// parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct Curve {
    pub id: u64,
    pub samples: Vec<Sample>,
    pub closed: bool,
    pub kind: CurveKind,
    pub params: CurveParams,
}

impl Curve {
    pub fn new(id: u64, closed: bool, kind: CurveKind, params: CurveParams) -> Self {
        debug_assert!(params.validate());
        Self {
            id,
            samples: Vec::new(),
            closed,
            kind,
            params,
        }
    }

    pub fn from_positions(
        id: u64,
        positions: impl IntoIterator<Item = DVec2>,
        delta: f64,
        closed: bool,
        kind: CurveKind,
        params: CurveParams,
    ) -> Self {
        let mut curve = Self::new(id, closed, kind, params);
        curve.samples = positions
            .into_iter()
            .enumerate()
            .map(|(i, pos)| Sample::new(pos, delta, id, i))
            .collect();
        curve
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Index pairs for every segment: consecutive samples, plus the
    /// wrap-around pair iff `closed` and there are more than two samples.
    pub fn segment_indices(&self) -> Vec<(usize, usize)> {
        let n = self.samples.len();
        if n < 2 {
            return Vec::new();
        }
        let mut segments: Vec<(usize, usize)> = (0..n - 1).map(|i| (i, i + 1)).collect();
        if self.closed && n > 2 {
            segments.push((n - 1, 0));
        }
        segments
    }

    /// This sample's previous neighbor on the curve, wrapping only for
    /// closed curves; `None` at an open curve's first sample.
    pub fn prev_index(&self, i: usize) -> Option<usize> {
        let n = self.samples.len();
        if i > 0 {
            Some(i - 1)
        } else if self.closed && n > 2 {
            Some(n - 1)
        } else {
            None
        }
    }

    /// This sample's next neighbor on the curve, wrapping only for closed
    /// curves; `None` at an open curve's last sample.
    pub fn next_index(&self, i: usize) -> Option<usize> {
        let n = self.samples.len();
        if i + 1 < n {
            Some(i + 1)
        } else if self.closed && n > 2 {
            Some(0)
        } else {
            None
        }
    }

    /// Circular (for closed curves) or linear topological distance between
    /// two sample indices on this curve.
    pub fn topological_distance(&self, i: usize, j: usize) -> usize {
        let n = self.samples.len();
        let linear = if i > j { i - j } else { j - i };
        if self.closed && n > 0 {
            linear.min(n - linear)
        } else {
            linear
        }
    }

    /// Re-stamps every sample's `curve_id`/`index_in_curve` to match its
    /// current position in `self.samples`. Must run after any structural
    /// mutation, before the next force evaluation.
    pub fn reconcile_indices(&mut self) {
        for (i, s) in self.samples.iter_mut().enumerate() {
            s.curve_id = self.id;
            s.index_in_curve = i;
        }
    }

    fn avg_delta(&self, indices: &[usize]) -> f64 {
        let sum: f64 = indices.iter().map(|&i| self.samples[i].delta).sum();
        sum / indices.len() as f64
    }

    /// Splits any segment longer than `kmax*d*avg_delta` by inserting a
    /// linearly-interpolated midpoint, iterating last-to-first so insertions
    /// don't invalidate not-yet-visited indices.
    pub fn split_long_segments(&mut self) {
        let segments = self.segment_indices();
        for &(i, j) in segments.iter().rev() {
            let avg_delta = self.avg_delta(&[i, j]);
            let dmax = self.params.kmax * self.params.d * avg_delta;
            let length = self.samples[j].pos.distance(self.samples[i].pos);
            if length > dmax {
                let mid_pos = (self.samples[i].pos + self.samples[j].pos) * 0.5;
                let mid = Sample::new(mid_pos, avg_delta, self.id, 0);
                // A wrap segment (j == 0, i == len-1) inserts after i, i.e. at the end.
                let insert_at = i + 1;
                self.samples.insert(insert_at, mid);
            }
        }
        self.reconcile_indices();
    }

    /// Removes interior samples whose distance to either neighbor falls
    /// below `kmin*d*avg_delta`, skipping locked samples, iterating
    /// last-to-first so removals don't invalidate not-yet-visited indices.
    pub fn merge_short_segments(&mut self) {
        let n = self.samples.len();
        if n < 3 {
            return;
        }
        for i in (1..n - 1).rev() {
            if self.samples[i].locked {
                continue;
            }
            let prev = i - 1;
            let next = i + 1;
            let avg_delta = self.avg_delta(&[prev, i, next]);
            let dmin = self.params.kmin * self.params.d * avg_delta;
            let to_prev = self.samples[i].pos.distance(self.samples[prev].pos);
            let to_next = self.samples[i].pos.distance(self.samples[next].pos);
            if to_prev < dmin || to_next < dmin {
                self.samples.remove(i);
            }
        }
        self.reconcile_indices();
    }

    /// Split pass then merge pass, per spec.md §4.3 (split must precede
    /// merge to avoid oscillation across ticks).
    pub fn resample(&mut self) {
        self.split_long_segments();
        self.merge_short_segments();
    }

    pub fn perimeter(&self) -> f64 {
        self.segment_indices()
            .iter()
            .map(|&(i, j)| self.samples[j].pos.distance(self.samples[i].pos))
            .sum()
    }
}
