// Vector helpers shared by the similarity models

use ndarray::{Array1, ArrayView1};

/// Euclidean distance between two equally sized vectors
pub fn euclidean_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Normalize vector to unit length
pub fn normalize_vector(vec: &mut Array1<f64>) {
    let norm = vec.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        *vec /= norm;
    }
}

/// Map a non-negative distance onto (0, 1], 1.0 meaning identical
pub fn distance_to_similarity(distance: f64) -> f64 {
    1.0 / (1.0 + distance.max(0.0))
}

/// Round a score for presentation
pub fn round_score(score: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (score * factor).round() / factor
}
