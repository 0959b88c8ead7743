pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use catalog::{CatalogSource, FileCatalog, InMemoryCatalog};
pub use config::{Config, EngineConfig};
pub use error::{RecommendError, Result};
pub use models::{Destination, Recommendation, UserPreferences};
pub use services::{EngineState, HybridRanker, RecommendationEngine, TrainingSummary};
