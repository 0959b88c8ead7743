pub mod features;
pub mod lifecycle;
pub mod ranking;
pub mod similarity;

pub use features::{FeatureDefaults, FeatureEncoder};
pub use lifecycle::{EngineState, RecommendationEngine, TrainedModel, TrainingSummary};
pub use ranking::{HybridRanker, RankingPolicy};
pub use similarity::{NeighborIndex, SimilarityModel, TextSimilarityModel};
