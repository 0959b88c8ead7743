/// Training lifecycle for the hybrid engine.
///
/// State transitions:
/// - Untrained → Trained: explicit `train`, or the first `recommend` when
///   auto-train is enabled
/// - Trained → Trained: retrain swaps in a fresh snapshot; also taken
///   implicitly when the catalog revision moved since the last fit
/// - any → Untrained: failed training or `invalidate`
///
/// Readers clone an `Arc` to an immutable snapshot, so a retrain never
/// disturbs a request already in flight.
use crate::catalog::CatalogSource;
use crate::config::EngineConfig;
use crate::error::{RecommendError, Result};
use crate::models::{Destination, Recommendation, UserPreferences};
use crate::services::features::FeatureEncoder;
use crate::services::ranking::{HybridRanker, RankingPolicy};
use crate::services::similarity::{NeighborIndex, SimilarityModel, TextSimilarityModel};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Untrained,
    Trained,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingSummary {
    pub destinations: usize,
    pub vocabulary_size: usize,
    pub catalog_revision: u64,
    pub trained_at: DateTime<Utc>,
}

/// Everything fitted from one catalog snapshot. Always built and replaced
/// as a unit.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub destinations: Vec<Destination>,
    pub encoder: FeatureEncoder,
    pub neighbors: NeighborIndex,
    pub text: TextSimilarityModel,
    pub catalog_revision: u64,
    pub trained_at: DateTime<Utc>,
}

impl TrainedModel {
    pub fn fit(
        destinations: Vec<Destination>,
        config: &EngineConfig,
        catalog_revision: u64,
    ) -> Result<Self> {
        if destinations.is_empty() {
            return Err(RecommendError::NoDataAvailable);
        }

        let encoder = FeatureEncoder::default();
        let vectors = encoder.encode_all(&destinations);

        let mut neighbors = NeighborIndex::new();
        neighbors.fit(&vectors)?;

        let descriptions: Vec<String> = destinations
            .iter()
            .map(|d| d.description().to_string())
            .collect();
        let mut text = TextSimilarityModel::new(config.max_vocabulary);
        text.fit(&descriptions)?;

        Ok(Self {
            destinations,
            encoder,
            neighbors,
            text,
            catalog_revision,
            trained_at: Utc::now(),
        })
    }

    pub fn summary(&self) -> TrainingSummary {
        TrainingSummary {
            destinations: self.destinations.len(),
            vocabulary_size: self.text.vocabulary_size(),
            catalog_revision: self.catalog_revision,
            trained_at: self.trained_at,
        }
    }
}

pub struct RecommendationEngine {
    catalog: Arc<dyn CatalogSource>,
    ranker: HybridRanker,
    config: EngineConfig,
    model: RwLock<Option<Arc<TrainedModel>>>,
    training_runs: AtomicU64,
}

impl RecommendationEngine {
    pub fn new(catalog: Arc<dyn CatalogSource>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            catalog,
            ranker: HybridRanker::new(RankingPolicy::from(&config)),
            config,
            model: RwLock::new(None),
            training_runs: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> EngineState {
        if self.model.read().is_some() {
            EngineState::Trained
        } else {
            EngineState::Untrained
        }
    }

    /// Successful fits since construction, explicit and implicit.
    pub fn training_runs(&self) -> u64 {
        self.training_runs.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> Option<Arc<TrainedModel>> {
        self.model.read().clone()
    }

    /// Drop the fitted model; the next request starts from Untrained.
    pub fn invalidate(&self) {
        *self.model.write() = None;
        debug!("Recommendation model invalidated");
    }

    /// Fit on the catalog collaborator's current records.
    pub fn train(&self) -> Result<TrainingSummary> {
        let mut guard = self.model.write();
        let revision = self.catalog.revision();
        let destinations = match self.catalog.destinations() {
            Ok(destinations) => destinations,
            Err(e) => {
                *guard = None;
                return Err(e);
            }
        };
        self.fit_locked(&mut guard, destinations, revision)
            .map(|model| model.summary())
    }

    /// Fit on an explicitly supplied catalog.
    pub fn train_with(&self, destinations: Vec<Destination>) -> Result<TrainingSummary> {
        let mut guard = self.model.write();
        let revision = self.catalog.revision();
        self.fit_locked(&mut guard, destinations, revision)
            .map(|model| model.summary())
    }

    /// Rank destinations for a preference profile, training first if needed.
    pub fn recommend(
        &self,
        preferences: &UserPreferences,
        top_n: usize,
    ) -> Result<Vec<Recommendation>> {
        if top_n == 0 {
            return Ok(Vec::new());
        }
        let top_n = top_n.min(self.config.max_top_n.max(1));

        let model = self.ensure_trained()?;
        let (results, stats) = self.ranker.rank(&model, preferences, top_n)?;

        if results.is_empty() {
            warn!(top_n, "No recommendations produced");
        }
        info!(
            top_n,
            candidates = stats.unique_candidates,
            returned = stats.returned,
            "Recommendations generated"
        );

        Ok(results)
    }

    fn ensure_trained(&self) -> Result<Arc<TrainedModel>> {
        let revision = self.catalog.revision();

        if let Some(model) = self.model.read().as_ref() {
            if model.catalog_revision == revision {
                return Ok(Arc::clone(model));
            }
            if !self.config.auto_train {
                warn!(
                    trained_revision = model.catalog_revision,
                    catalog_revision = revision,
                    "Catalog changed but auto-train is disabled, serving stale model"
                );
                return Ok(Arc::clone(model));
            }
        } else if !self.config.auto_train {
            return Err(RecommendError::ModelNotTrained);
        }

        let mut guard = self.model.write();
        // Another request may have trained while we waited for the lock
        let revision = self.catalog.revision();
        if let Some(model) = guard.as_ref() {
            if model.catalog_revision == revision {
                return Ok(Arc::clone(model));
            }
        }

        info!(catalog_revision = revision, "Model untrained or stale, training");
        let destinations = match self.catalog.destinations() {
            Ok(destinations) => destinations,
            Err(e) => {
                *guard = None;
                return Err(e);
            }
        };
        self.fit_locked(&mut guard, destinations, revision)
    }

    fn fit_locked(
        &self,
        slot: &mut Option<Arc<TrainedModel>>,
        destinations: Vec<Destination>,
        revision: u64,
    ) -> Result<Arc<TrainedModel>> {
        match TrainedModel::fit(destinations, &self.config, revision) {
            Ok(model) => {
                let model = Arc::new(model);
                *slot = Some(Arc::clone(&model));
                self.training_runs.fetch_add(1, Ordering::SeqCst);
                info!(
                    destinations = model.destinations.len(),
                    vocabulary = model.text.vocabulary_size(),
                    catalog_revision = revision,
                    "Recommendation models trained"
                );
                Ok(model)
            }
            Err(e) => {
                *slot = None;
                warn!(error = %e, "Training failed, engine left untrained");
                Err(e)
            }
        }
    }
}
