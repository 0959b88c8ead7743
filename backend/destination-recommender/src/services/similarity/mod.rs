/// Similarity Models
///
/// Two independently fitted models sit behind the same capability:
/// - **Neighbor index**: standardized feature vectors, Euclidean distance
/// - **Text model**: TF-IDF term vectors over descriptions, cosine similarity
///
/// The hybrid ranker prepares a query once per request and then scores only
/// the candidates it cares about.
pub mod neighbors;
pub mod scaler;
pub mod stopwords;
pub mod text;

pub use neighbors::{Neighbor, NeighborIndex};
pub use scaler::StandardScaler;
pub use text::TextSimilarityModel;

use crate::error::Result;

pub trait SimilarityModel: Send + Sync {
    /// Training input covering the whole catalog, in catalog order
    type Corpus: ?Sized;
    /// Raw query as built from a user profile
    type Query: ?Sized;
    /// Query after projection into the fitted space
    type Prepared;

    fn fit(&mut self, corpus: &Self::Corpus) -> Result<()>;

    fn is_fitted(&self) -> bool;

    /// Number of fitted catalog entries
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn prepare(&self, query: &Self::Query) -> Result<Self::Prepared>;

    /// Similarity in [0, 1] between a prepared query and one catalog entry.
    fn similarity_at(&self, prepared: &Self::Prepared, index: usize) -> f64;
}
