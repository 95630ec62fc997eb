use std::collections::HashMap;

use glam::DVec2;

/// Capability required of anything stored in a [`SpatialIndex`].
pub trait Positioned {
    fn position(&self) -> DVec2;
}

/// Packs signed grid coordinates into a single 64-bit key.
fn cell_key(ix: i32, iy: i32) -> i64 {
    ((ix as i64) << 32) | (iy as i64 & 0xFFFF_FFFF)
}

fn cell_of(pos: DVec2, cell_size: f64) -> (i32, i32) {
    (
        (pos.x / cell_size).floor() as i32,
        (pos.y / cell_size).floor() as i32,
    )
}

/// Uniform-grid spatial hash. Rebuilt from scratch each tick; it does not
/// track whether the positions it was built from are still current, so
/// callers must rebuild before querying if anything moved.
pub struct SpatialIndex {
    cell_size: f64,
    buckets: HashMap<i64, Vec<usize>>,
}

impl SpatialIndex {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            buckets: HashMap::new(),
        }
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }

    /// Inserts `index`, keyed by `pos`. Items in the same bucket retain
    /// insertion order.
    pub fn insert(&mut self, index: usize, pos: DVec2) {
        let (ix, iy) = cell_of(pos, self.cell_size);
        self.buckets.entry(cell_key(ix, iy)).or_default().push(index);
    }

    /// Rebuilds the index from scratch over `items`, in iteration order.
    pub fn rebuild<T: Positioned>(&mut self, items: &[T]) {
        self.clear();
        for (i, item) in items.iter().enumerate() {
            self.insert(i, item.position());
        }
    }

    /// Union of the nine cells surrounding `pos`, in insertion order.
    pub fn query_neighbors(&self, pos: DVec2) -> Vec<usize> {
        let (cx, cy) = cell_of(pos, self.cell_size);
        let mut out = Vec::new();
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(bucket) = self.buckets.get(&cell_key(cx + dx, cy + dy)) {
                    out.extend_from_slice(bucket);
                }
            }
        }
        out
    }

    /// All indices within Euclidean distance `radius` of `(x, y)`. Scans
    /// `ceil(radius / cell_size)` cells in each direction around the query
    /// point and filters by exact distance.
    pub fn query_radius<T: Positioned>(&self, items: &[T], x: f64, y: f64, radius: f64) -> Vec<usize> {
        let center = DVec2::new(x, y);
        let (cx, cy) = cell_of(center, self.cell_size);
        let reach = (radius / self.cell_size).ceil() as i32;
        let reach = reach.max(1);
        let mut out = Vec::new();
        for dx in -reach..=reach {
            for dy in -reach..=reach {
                if let Some(bucket) = self.buckets.get(&cell_key(cx + dx, cy + dy)) {
                    for &idx in bucket {
                        if items[idx].position().distance(center) <= radius {
                            out.push(idx);
                        }
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pt(DVec2);
    impl Positioned for Pt {
        fn position(&self) -> DVec2 {
            self.0
        }
    }

    #[test]
    fn neighbors_found_across_adjacent_cells() {
        let items = vec![Pt(DVec2::new(0.0, 0.0)), Pt(DVec2::new(33.0, 0.0))];
        let mut idx = SpatialIndex::new(32.0);
        idx.rebuild(&items);
        let neighbors = idx.query_neighbors(DVec2::new(0.0, 0.0));
        assert_eq!(neighbors.len(), 2);
    }

    #[test]
    fn radius_query_filters_by_exact_distance() {
        let items = vec![
            Pt(DVec2::new(0.0, 0.0)),
            Pt(DVec2::new(5.0, 0.0)),
            Pt(DVec2::new(50.0, 0.0)),
        ];
        let mut idx = SpatialIndex::new(32.0);
        idx.rebuild(&items);
        let found = idx.query_radius(&items, 0.0, 0.0, 10.0);
        assert_eq!(found, vec![0, 1]);
    }

    #[test]
    fn clear_drops_all_buckets() {
        let items = vec![Pt(DVec2::new(0.0, 0.0))];
        let mut idx = SpatialIndex::new(32.0);
        idx.rebuild(&items);
        idx.clear();
        assert!(idx.query_neighbors(DVec2::new(0.0, 0.0)).is_empty());
    }
}
