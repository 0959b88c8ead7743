use crate::error::{RecommendError, Result};
use ndarray::{Array1, Array2, ArrayView1, Axis};

/// Relative threshold under which a field is treated as constant
const ZERO_VARIANCE_TOLERANCE: f64 = 1e-9;

/// Per-field standardization fitted on the training catalog.
///
/// Constant fields map to 0.0 for every input, so they never contribute to
/// a distance.
#[derive(Debug, Clone, Default)]
pub struct StandardScaler {
    mean: Array1<f64>,
    /// `None` marks a zero-variance field
    std_dev: Vec<Option<f64>>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fitted(&self) -> bool {
        !self.std_dev.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.std_dev.len()
    }

    pub fn fit(&mut self, data: &Array2<f64>) -> Result<()> {
        if data.nrows() == 0 {
            return Err(RecommendError::NoDataAvailable);
        }

        let mean = data
            .mean_axis(Axis(0))
            .ok_or(RecommendError::NoDataAvailable)?;
        // Population variance (ddof = 0)
        let variance = data.var_axis(Axis(0), 0.0);

        self.std_dev = variance
            .iter()
            .zip(mean.iter())
            .map(|(&var, &mu)| {
                let std = var.sqrt();
                if std <= ZERO_VARIANCE_TOLERANCE * mu.abs().max(1.0) {
                    None
                } else {
                    Some(std)
                }
            })
            .collect();
        self.mean = mean;

        Ok(())
    }

    pub fn transform(&self, vector: ArrayView1<f64>) -> Result<Array1<f64>> {
        if !self.is_fitted() {
            return Err(RecommendError::ModelNotTrained);
        }
        if vector.len() != self.n_features() {
            return Err(RecommendError::InvalidInput(format!(
                "Expected {} features, got {}",
                self.n_features(),
                vector.len()
            )));
        }

        Ok(Array1::from_iter(
            vector
                .iter()
                .zip(self.mean.iter())
                .zip(self.std_dev.iter())
                .map(|((&x, &mu), std)| match std {
                    Some(std) => (x - mu) / std,
                    None => 0.0,
                }),
        ))
    }

    pub fn transform_matrix(&self, data: &Array2<f64>) -> Result<Array2<f64>> {
        let mut scaled = Array2::zeros(data.raw_dim());
        for (row, source) in data.outer_iter().enumerate() {
            scaled.row_mut(row).assign(&self.transform(source)?);
        }
        Ok(scaled)
    }
}
