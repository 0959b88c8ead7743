use crate::error::{RecommendError, Result};
use serde::Deserialize;

const ENV_PREFIX: &str = "RECOMMENDER_";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,
    #[serde(default = "default_preferences_path")]
    pub preferences_path: String,
    #[serde(default)]
    pub top_n: Option<usize>,
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

/// Tuning knobs for the hybrid engine.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_knn_weight")]
    pub knn_weight: f64,
    #[serde(default = "default_content_weight")]
    pub content_weight: f64,
    /// Neighbor candidates fetched per requested result.
    #[serde(default = "default_candidate_multiplier")]
    pub candidate_multiplier: usize,
    #[serde(default = "default_max_vocabulary")]
    pub max_vocabulary: usize,
    /// Daily cost may exceed the budget reference by this factor before
    /// the budget penalty kicks in.
    #[serde(default = "default_budget_tolerance")]
    pub budget_tolerance: f64,
    #[serde(default = "default_budget_penalty")]
    pub budget_penalty: f64,
    #[serde(default = "default_difficulty_penalty")]
    pub difficulty_penalty: f64,
    #[serde(default = "default_fitness_slack")]
    pub fitness_slack: i32,
    #[serde(default = "default_fallback_phrase")]
    pub fallback_phrase: String,
    #[serde(default = "default_auto_train")]
    pub auto_train: bool,
    #[serde(default = "default_top_n")]
    pub default_top_n: usize,
    #[serde(default = "default_max_top_n")]
    pub max_top_n: usize,
}

fn default_service_name() -> String {
    "destination-recommender".to_string()
}

fn default_catalog_path() -> String {
    "data/destinations.csv".to_string()
}

fn default_preferences_path() -> String {
    "data/preferences.json".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_knn_weight() -> f64 {
    0.6
}

fn default_content_weight() -> f64 {
    0.4
}

fn default_candidate_multiplier() -> usize {
    2
}

fn default_max_vocabulary() -> usize {
    500
}

fn default_budget_tolerance() -> f64 {
    1.5
}

fn default_budget_penalty() -> f64 {
    0.7
}

fn default_difficulty_penalty() -> f64 {
    0.8
}

fn default_fitness_slack() -> i32 {
    1
}

fn default_fallback_phrase() -> String {
    "tourism travel nepal".to_string()
}

fn default_auto_train() -> bool {
    true
}

fn default_top_n() -> usize {
    10
}

fn default_max_top_n() -> usize {
    100
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            knn_weight: default_knn_weight(),
            content_weight: default_content_weight(),
            candidate_multiplier: default_candidate_multiplier(),
            max_vocabulary: default_max_vocabulary(),
            budget_tolerance: default_budget_tolerance(),
            budget_penalty: default_budget_penalty(),
            difficulty_penalty: default_difficulty_penalty(),
            fitness_slack: default_fitness_slack(),
            fallback_phrase: default_fallback_phrase(),
            auto_train: default_auto_train(),
            default_top_n: default_top_n(),
            max_top_n: default_max_top_n(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, weight) in [
            ("knn_weight", self.knn_weight),
            ("content_weight", self.content_weight),
            ("budget_tolerance", self.budget_tolerance),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(RecommendError::Config(format!(
                    "{} must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }

        for (name, penalty) in [
            ("budget_penalty", self.budget_penalty),
            ("difficulty_penalty", self.difficulty_penalty),
        ] {
            if !(penalty > 0.0 && penalty <= 1.0) {
                return Err(RecommendError::Config(format!(
                    "{} must be in (0, 1], got {}",
                    name, penalty
                )));
            }
        }

        if self.candidate_multiplier == 0 {
            return Err(RecommendError::Config(
                "candidate_multiplier must be at least 1".to_string(),
            ));
        }

        if self.max_vocabulary == 0 {
            return Err(RecommendError::Config(
                "max_vocabulary must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let service: ServiceConfig = envy::prefixed(ENV_PREFIX).from_env()?;
        let engine: EngineConfig = envy::prefixed(ENV_PREFIX).from_env()?;
        engine.validate()?;

        Ok(Config { service, engine })
    }
}
