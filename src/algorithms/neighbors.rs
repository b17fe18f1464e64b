use ndarray::{Array1, Array2, ArrayView1, Axis};
use rayon::prelude::*;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub row: usize,
    pub distance: f64,
}

impl Neighbor {
    pub fn similarity(&self) -> f64 {
        1.0 - self.distance
    }
}

/// Exact k-nearest-neighbor index over matrix rows using cosine distance.
///
/// Every query scans all fitted rows; there is no approximate structure.
#[derive(Debug, Clone)]
pub struct NearestNeighbors {
    data: Array2<f64>,
    norms: Array1<f64>,
    k: usize,
}

impl NearestNeighbors {
    /// Fits over the rows of `data`. Returns `None` when there are no rows,
    /// since no neighbor query is defined in that case.
    pub fn fit(data: &Array2<f64>, n_neighbors: usize) -> Option<Self> {
        let n_rows = data.nrows();
        if n_rows == 0 {
            return None;
        }

        let norms = data.map_axis(Axis(1), |row| row.dot(&row).sqrt());

        Some(Self {
            data: data.clone(),
            norms,
            k: n_neighbors.max(1).min(n_rows),
        })
    }

    pub fn k_effective(&self) -> usize {
        self.k
    }

    /// Returns the `k_effective` closest rows, closest first. Equal
    /// distances are ordered by row index.
    pub fn query(&self, vector: ArrayView1<'_, f64>) -> Vec<Neighbor> {
        let query_norm = vector.dot(&vector).sqrt();

        let mut neighbors: Vec<Neighbor> = (0..self.data.nrows())
            .into_par_iter()
            .map(|row| Neighbor {
                row,
                distance: cosine_distance(
                    vector,
                    query_norm,
                    self.data.row(row),
                    self.norms[row],
                ),
            })
            .collect();

        neighbors.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(Ordering::Equal)
                .then(a.row.cmp(&b.row))
        });
        neighbors.truncate(self.k);
        neighbors
    }
}

/// Cosine distance in `[0, 2]`. A zero vector on either side is treated as
/// having similarity 0, i.e. distance 1.
pub fn cosine_distance(a: ArrayView1<'_, f64>, norm_a: f64, b: ArrayView1<'_, f64>, norm_b: f64) -> f64 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }

    (1.0 - a.dot(&b) / (norm_a * norm_b)).clamp(0.0, 2.0)
}
