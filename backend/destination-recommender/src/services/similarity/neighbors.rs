use super::{SimilarityModel, StandardScaler};
use crate::error::{RecommendError, Result};
use crate::utils::{distance_to_similarity, euclidean_distance};
use ndarray::{Array1, Array2};
use std::cmp::Ordering;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Position in the catalog snapshot the index was fitted on
    pub index: usize,
    pub distance: f64,
}

impl Neighbor {
    pub fn similarity(&self) -> f64 {
        distance_to_similarity(self.distance)
    }
}

/// Exact Euclidean nearest-neighbor index over standardized feature vectors.
#[derive(Debug, Clone, Default)]
pub struct NeighborIndex {
    scaler: StandardScaler,
    points: Array2<f64>,
    fitted: bool,
}

impl NeighborIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// The `k` closest entries, ascending by distance, ties by catalog order.
    /// `k` is clamped to the catalog size.
    pub fn nearest(&self, prepared: &Array1<f64>, k: usize) -> Result<Vec<Neighbor>> {
        if !self.fitted {
            return Err(RecommendError::ModelNotTrained);
        }

        let mut neighbors: Vec<Neighbor> = self
            .points
            .outer_iter()
            .enumerate()
            .map(|(index, point)| Neighbor {
                index,
                distance: euclidean_distance(point, prepared.view()),
            })
            .collect();

        neighbors.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(Ordering::Equal)
                .then(a.index.cmp(&b.index))
        });
        neighbors.truncate(k.min(self.points.nrows()));

        Ok(neighbors)
    }

    /// Scale a raw query vector and return its `k` nearest entries.
    pub fn query(&self, vector: &Array1<f64>, k: usize) -> Result<Vec<Neighbor>> {
        let prepared = self.prepare(vector)?;
        self.nearest(&prepared, k)
    }
}

impl SimilarityModel for NeighborIndex {
    type Corpus = Array2<f64>;
    type Query = Array1<f64>;
    type Prepared = Array1<f64>;

    fn fit(&mut self, vectors: &Array2<f64>) -> Result<()> {
        self.fitted = false;

        let mut scaler = StandardScaler::new();
        scaler.fit(vectors)?;
        let points = scaler.transform_matrix(vectors)?;

        debug!(
            points = points.nrows(),
            dimensions = points.ncols(),
            "Neighbor index fitted"
        );

        self.scaler = scaler;
        self.points = points;
        self.fitted = true;
        Ok(())
    }

    fn is_fitted(&self) -> bool {
        self.fitted
    }

    fn len(&self) -> usize {
        if self.fitted {
            self.points.nrows()
        } else {
            0
        }
    }

    fn prepare(&self, vector: &Array1<f64>) -> Result<Array1<f64>> {
        if !self.fitted {
            return Err(RecommendError::ModelNotTrained);
        }
        self.scaler.transform(vector.view())
    }

    fn similarity_at(&self, prepared: &Array1<f64>, index: usize) -> f64 {
        if !self.fitted || index >= self.points.nrows() {
            return 0.0;
        }
        distance_to_similarity(euclidean_distance(self.points.row(index), prepared.view()))
    }
}
