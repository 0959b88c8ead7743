/// Hybrid Ranking Module
///
/// Fuses the neighbor index and the text model into one ranked list.
///
/// # Workflow
/// 1. Build a query feature vector from the preference profile
/// 2. Pull `candidate_multiplier × top_n` nearest destinations
/// 3. Build a weighted interest phrase and score each candidate against it
/// 4. Fuse: `knn_weight × neighbor + content_weight × content`
/// 5. Apply budget and difficulty penalties
/// 6. Deduplicate, sort (score desc, catalog order asc), truncate
use crate::config::EngineConfig;
use crate::error::Result;
use crate::models::{
    Category, Destination, RankingStats, Recommendation, ScoreBreakdown, Season, UserPreferences,
};
use crate::services::features::{
    FeatureDefaults, ALTITUDE, CATEGORY_OFFSET, COST, DIFFICULTY, FEATURE_VECTOR_SIZE, PERMIT,
    POPULARITY, SEASON_OFFSET,
};
use crate::services::lifecycle::TrainedModel;
use crate::services::similarity::SimilarityModel;
use ndarray::Array1;
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::debug;

/// Fusion weights and penalty rules.
#[derive(Debug, Clone)]
pub struct RankingPolicy {
    pub knn_weight: f64,
    pub content_weight: f64,
    pub candidate_multiplier: usize,
    pub budget_tolerance: f64,
    pub budget_penalty: f64,
    pub difficulty_penalty: f64,
    pub fitness_slack: i32,
    pub fallback_phrase: String,
}

impl Default for RankingPolicy {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for RankingPolicy {
    fn from(config: &EngineConfig) -> Self {
        Self {
            knn_weight: config.knn_weight,
            content_weight: config.content_weight,
            candidate_multiplier: config.candidate_multiplier,
            budget_tolerance: config.budget_tolerance,
            budget_penalty: config.budget_penalty,
            difficulty_penalty: config.difficulty_penalty,
            fitness_slack: config.fitness_slack,
            fallback_phrase: config.fallback_phrase.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HybridRanker {
    policy: RankingPolicy,
}

impl HybridRanker {
    pub fn new(policy: RankingPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RankingPolicy {
        &self.policy
    }

    /// Rank destinations of a trained model for one preference profile.
    pub fn rank(
        &self,
        model: &TrainedModel,
        preferences: &UserPreferences,
        top_n: usize,
    ) -> Result<(Vec<Recommendation>, RankingStats)> {
        let mut stats = RankingStats::default();
        if top_n == 0 {
            return Ok((Vec::new(), stats));
        }

        let defaults = model.encoder.defaults();
        let budget = preferences.budget_tier().reference_cost();

        let query_vector = build_query_vector(preferences, defaults);
        let k = top_n
            .saturating_mul(self.policy.candidate_multiplier)
            .max(top_n);
        let neighbors = model.neighbors.query(&query_vector, k)?;
        stats.neighbor_candidates = neighbors.len();

        let phrase = self.build_query_phrase(preferences);
        let text_query = model.text.prepare(&phrase)?;

        let mut seen: HashSet<i64> = HashSet::new();
        let mut scored: Vec<(usize, Recommendation)> = Vec::with_capacity(neighbors.len());

        for neighbor in &neighbors {
            let Some(destination) = model.destinations.get(neighbor.index) else {
                continue;
            };
            if !seen.insert(destination.destination_id) {
                continue;
            }

            let neighbor_similarity = neighbor.similarity();
            let content_similarity = model.text.similarity_at(&text_query, neighbor.index);
            let mut score = self.policy.knn_weight * neighbor_similarity
                + self.policy.content_weight * content_similarity;

            let budget_penalized = self.exceeds_budget(destination, budget, defaults);
            if budget_penalized {
                score *= self.policy.budget_penalty;
                stats.budget_penalized += 1;
            }

            let difficulty_penalized =
                self.exceeds_fitness(destination, preferences.fitness(), defaults);
            if difficulty_penalized {
                score *= self.policy.difficulty_penalty;
                stats.difficulty_penalized += 1;
            }

            scored.push((
                neighbor.index,
                Recommendation {
                    destination_id: destination.destination_id,
                    name: destination.name.clone(),
                    category: destination
                        .category
                        .clone()
                        .unwrap_or_else(|| Category::Unknown.as_str().to_string()),
                    description: destination.description().to_string(),
                    image_url: destination.image_url.clone(),
                    score,
                    breakdown: ScoreBreakdown {
                        neighbor_similarity,
                        content_similarity,
                        budget_penalized,
                        difficulty_penalized,
                    },
                },
            ));
        }
        stats.unique_candidates = scored.len();

        // NaN scores are treated as equal; catalog order breaks ties
        scored.sort_by(|(ia, a), (ib, b)| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(ia.cmp(ib))
        });
        scored.truncate(top_n);

        let results: Vec<Recommendation> = scored.into_iter().map(|(_, r)| r).collect();
        stats.returned = results.len();

        debug!(
            top_n,
            neighbor_candidates = stats.neighbor_candidates,
            unique_candidates = stats.unique_candidates,
            budget_penalized = stats.budget_penalized,
            difficulty_penalized = stats.difficulty_penalized,
            returned = stats.returned,
            "Hybrid ranking complete"
        );

        Ok((results, stats))
    }

    /// Interest names repeated by strength: 3x at >= 7, 2x at >= 5, 1x at >= 3.
    pub fn build_query_phrase(&self, preferences: &UserPreferences) -> String {
        let mut keywords: Vec<&str> = Vec::new();
        for (interest, &strength) in &preferences.interests {
            let repeats = match strength {
                s if s >= 7 => 3,
                s if s >= 5 => 2,
                s if s >= 3 => 1,
                _ => 0,
            };
            keywords.extend(std::iter::repeat(interest.as_str()).take(repeats));
        }

        if keywords.is_empty() {
            self.policy.fallback_phrase.clone()
        } else {
            keywords.join(" ")
        }
    }

    /// Strictly above `budget_tolerance × budget`; the boundary itself is fine.
    fn exceeds_budget(&self, destination: &Destination, budget: f64, defaults: &FeatureDefaults) -> bool {
        defaults.daily_cost_of(destination) > budget * self.policy.budget_tolerance
    }

    fn exceeds_fitness(&self, destination: &Destination, fitness: i32, defaults: &FeatureDefaults) -> bool {
        let ceiling = fitness.saturating_add(self.policy.fitness_slack);
        defaults.difficulty_of(destination) > f64::from(ceiling)
    }
}

/// Query vector in the same 16-field layout the encoder produces.
pub fn build_query_vector(preferences: &UserPreferences, defaults: &FeatureDefaults) -> Array1<f64> {
    let mut vector = Array1::zeros(FEATURE_VECTOR_SIZE);

    vector[DIFFICULTY] = f64::from(preferences.difficulty());
    vector[COST] = preferences.budget_tier().reference_cost();
    vector[POPULARITY] = defaults.query_popularity;
    vector[ALTITUDE] = defaults.query_altitude;
    vector[PERMIT] = 0.0;

    let category_scores: Vec<f64> = Category::ENCODED
        .iter()
        .map(|category| {
            category
                .interest_key()
                .map(|key| f64::from(preferences.interest(key)))
                .unwrap_or(0.0)
        })
        .collect();
    let max_score = category_scores.iter().copied().fold(f64::MIN, f64::max);
    for (slot, score) in category_scores.iter().enumerate() {
        vector[CATEGORY_OFFSET + slot] = if max_score > 0.0 { score / max_score } else { 0.5 };
    }

    let preferred: HashSet<Season> = preferences.seasons().into_iter().collect();
    for (slot, season) in Season::ENCODED.iter().enumerate() {
        let accepted = *season == Season::All || preferred.contains(season);
        vector[SEASON_OFFSET + slot] = if accepted { 1.0 } else { 0.0 };
    }

    vector
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::lifecycle::TrainedModel;
    use std::collections::BTreeMap;

    fn destination(id: i64, category: &str, difficulty: i32, cost: f64, description: &str) -> Destination {
        Destination {
            destination_id: id,
            name: format!("Destination {}", id),
            category: Some(category.to_string()),
            description: Some(description.to_string()),
            difficulty_level: Some(difficulty),
            best_season: Some("Autumn".to_string()),
            avg_cost_per_day: Some(cost),
            popularity_score: Some(60),
            altitude: Some(1500),
            ..Default::default()
        }
    }

    fn preferences(interests: &[(&str, i32)]) -> UserPreferences {
        UserPreferences {
            interests: interests
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect::<BTreeMap<_, _>>(),
            ..Default::default()
        }
    }

    fn train(catalog: Vec<Destination>) -> TrainedModel {
        TrainedModel::fit(catalog, &EngineConfig::default(), 0).unwrap()
    }

    #[test]
    fn test_query_vector_layout() {
        let prefs = UserPreferences {
            interests: [("adventure".to_string(), 10), ("cultural".to_string(), 5)]
                .into_iter()
                .collect(),
            budget_range: Some("luxury".to_string()),
            difficulty_preference: Some(4),
            preferred_seasons: Some(vec!["Winter".to_string()]),
            ..Default::default()
        };
        let vector = build_query_vector(&prefs, &FeatureDefaults::STANDARD);

        assert_eq!(vector.len(), FEATURE_VECTOR_SIZE);
        assert_eq!(vector[DIFFICULTY], 4.0);
        assert_eq!(vector[COST], 100.0);
        assert_eq!(vector[POPULARITY], 50.0);
        assert_eq!(vector[ALTITUDE], 2.0);
        assert_eq!(vector[PERMIT], 0.0);
        // Trekking and Adventure both follow the adventure interest
        assert_eq!(vector[CATEGORY_OFFSET], 1.0);
        assert_eq!(vector[CATEGORY_OFFSET + 5], 1.0);
        assert_eq!(vector[CATEGORY_OFFSET + 1], 0.5);
        // Winter and the always-on All slot
        assert_eq!(
            vector.slice(ndarray::s![SEASON_OFFSET..]).to_vec(),
            vec![0.0, 0.0, 0.0, 1.0, 1.0]
        );
    }

    #[test]
    fn test_query_vector_all_zero_interests() {
        let prefs = preferences(&[
            ("adventure", 0),
            ("cultural", 0),
            ("religious", 0),
            ("nature", 0),
            ("wildlife", 0),
        ]);
        let vector = build_query_vector(&prefs, &FeatureDefaults::STANDARD);
        for slot in 0..6 {
            assert_eq!(vector[CATEGORY_OFFSET + slot], 0.5);
        }
    }

    #[test]
    fn test_query_phrase_repetition() {
        let ranker = HybridRanker::default();
        let prefs = preferences(&[("adventure", 9), ("cultural", 5), ("nature", 3), ("wildlife", 2)]);
        let phrase = ranker.build_query_phrase(&prefs);

        let words: Vec<&str> = phrase.split(' ').collect();
        assert_eq!(words.iter().filter(|w| **w == "adventure").count(), 3);
        assert_eq!(words.iter().filter(|w| **w == "cultural").count(), 2);
        assert_eq!(words.iter().filter(|w| **w == "nature").count(), 1);
        assert!(!words.contains(&"wildlife"));
    }

    #[test]
    fn test_query_phrase_fallback() {
        let ranker = HybridRanker::default();
        assert_eq!(ranker.build_query_phrase(&preferences(&[("nature", 1)])), "tourism travel nepal");
        assert_eq!(ranker.build_query_phrase(&UserPreferences::default()), "tourism travel nepal");
    }

    #[test]
    fn test_zero_top_n_returns_empty() {
        let model = train(vec![destination(1, "Nature", 2, 30.0, "lake")]);
        let (results, _) = HybridRanker::default()
            .rank(&model, &UserPreferences::default(), 0)
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_scores_bounded_and_sorted() {
        let model = train(vec![
            destination(1, "Trekking", 4, 45.0, "trekking adventure mountains"),
            destination(2, "Cultural", 1, 30.0, "temples heritage culture"),
            destination(3, "Wildlife", 2, 60.0, "safari wildlife jungle"),
            destination(4, "Nature", 2, 35.0, "lake nature forest"),
        ]);
        let (results, stats) = HybridRanker::default()
            .rank(&model, &preferences(&[("adventure", 8), ("nature", 6)]), 4)
            .unwrap();

        assert_eq!(results.len(), 4);
        assert_eq!(stats.returned, 4);
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        for r in &results {
            assert!(r.score >= 0.0 && r.score <= 1.0);
            let unpenalized = 0.6 * r.breakdown.neighbor_similarity + 0.4 * r.breakdown.content_similarity;
            assert!(r.score <= unpenalized + 1e-12);
        }
    }

    #[test]
    fn test_budget_boundary_is_exclusive() {
        // Budget tier reference is 30, so the threshold is 45
        let model = train(vec![
            destination(1, "Nature", 2, 45.0, "forest lake"),
            destination(2, "Nature", 2, 46.0, "forest lake"),
            destination(3, "Cultural", 5, 200.0, "temple"),
        ]);
        let prefs = UserPreferences {
            budget_range: Some("budget".to_string()),
            ..preferences(&[("nature", 8)])
        };
        let (results, _) = HybridRanker::default().rank(&model, &prefs, 3).unwrap();

        let at_boundary = results.iter().find(|r| r.destination_id == 1).unwrap();
        let over = results.iter().find(|r| r.destination_id == 2).unwrap();
        assert!(!at_boundary.breakdown.budget_penalized);
        assert!(over.breakdown.budget_penalized);
        assert!(at_boundary.score > over.score);
    }

    #[test]
    fn test_difficulty_penalty_threshold() {
        let model = train(vec![
            destination(1, "Trekking", 4, 40.0, "trek"),
            destination(2, "Trekking", 5, 40.0, "trek"),
            destination(3, "Cultural", 1, 40.0, "temple"),
        ]);
        let prefs = UserPreferences {
            fitness_level: Some(3),
            ..Default::default()
        };
        let (results, _) = HybridRanker::default().rank(&model, &prefs, 3).unwrap();

        let moderate = results.iter().find(|r| r.destination_id == 1).unwrap();
        let hard = results.iter().find(|r| r.destination_id == 2).unwrap();
        assert!(!moderate.breakdown.difficulty_penalized);
        assert!(hard.breakdown.difficulty_penalized);
    }

    #[test]
    fn test_duplicate_destination_ids_collapse() {
        let model = train(vec![
            destination(7, "Nature", 2, 40.0, "lake"),
            destination(7, "Nature", 2, 40.0, "lake"),
            destination(8, "Wildlife", 3, 50.0, "safari"),
        ]);
        let (results, stats) = HybridRanker::default()
            .rank(&model, &UserPreferences::default(), 3)
            .unwrap();

        assert_eq!(stats.neighbor_candidates, 3);
        assert_eq!(results.len(), 2);
        let ids: HashSet<i64> = results.iter().map(|r| r.destination_id).collect();
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn test_identical_destinations_keep_catalog_order() {
        let model = train(vec![
            destination(1, "Wildlife", 5, 90.0, "safari"),
            destination(2, "Nature", 2, 40.0, "lake"),
            destination(3, "Nature", 2, 40.0, "lake"),
        ]);
        let (results, _) = HybridRanker::default()
            .rank(&model, &UserPreferences::default(), 3)
            .unwrap();

        let pos2 = results.iter().position(|r| r.destination_id == 2).unwrap();
        let pos3 = results.iter().position(|r| r.destination_id == 3).unwrap();
        assert_eq!(results[pos2].score, results[pos3].score);
        assert!(pos2 < pos3);
    }

    #[test]
    fn test_missing_category_reported_as_unknown() {
        let mut dest = destination(1, "Nature", 2, 40.0, "lake");
        dest.category = None;
        let model = train(vec![dest]);
        let (results, _) = HybridRanker::default()
            .rank(&model, &UserPreferences::default(), 1)
            .unwrap();
        assert_eq!(results[0].category, "Unknown");
    }

    #[test]
    fn test_result_carries_description_and_image() {
        let mut dest = destination(1, "Nature", 2, 40.0, "quiet lake");
        dest.image_url = Some("https://img.example/lake.jpg".to_string());
        let model = train(vec![dest, destination(2, "Cultural", 1, 30.0, "")]);
        let (results, _) = HybridRanker::default()
            .rank(&model, &UserPreferences::default(), 2)
            .unwrap();

        let lake = results.iter().find(|r| r.destination_id == 1).unwrap();
        assert_eq!(lake.description, "quiet lake");
        assert_eq!(lake.image_url.as_deref(), Some("https://img.example/lake.jpg"));
        let bare = results.iter().find(|r| r.destination_id == 2).unwrap();
        assert_eq!(bare.description, "");
        assert_eq!(bare.image_url, None);
    }

    #[test]
    fn test_extreme_fitness_does_not_overflow() {
        let model = train(vec![
            destination(1, "Trekking", 5, 40.0, "trek"),
            destination(2, "Cultural", 1, 40.0, "temple"),
        ]);
        let prefs: UserPreferences =
            serde_json::from_str(r#"{"fitness_level": 2147483647}"#).unwrap();
        let (results, stats) = HybridRanker::default().rank(&model, &prefs, 2).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(stats.difficulty_penalized, 0);

        let policy = RankingPolicy {
            fitness_slack: i32::MAX,
            ..RankingPolicy::default()
        };
        let prefs = UserPreferences {
            fitness_level: Some(5),
            ..Default::default()
        };
        let (results, _) = HybridRanker::new(policy).rank(&model, &prefs, 2).unwrap();
        assert!(results.iter().all(|r| !r.breakdown.difficulty_penalized));
    }

    #[test]
    fn test_zero_cost_and_difficulty_use_defaults_for_penalties() {
        // Tight policy: a zero would pass both checks, the defaults (40, 2) fail them
        let policy = RankingPolicy {
            budget_tolerance: 1.0,
            fitness_slack: 0,
            ..RankingPolicy::default()
        };
        let model = train(vec![
            destination(1, "Nature", 0, 0.0, "lake"),
            destination(2, "Nature", 1, 30.0, "lake"),
        ]);
        let prefs = UserPreferences {
            budget_range: Some("budget".to_string()),
            fitness_level: Some(1),
            ..Default::default()
        };
        let (results, _) = HybridRanker::new(policy).rank(&model, &prefs, 2).unwrap();

        let zeroed = results.iter().find(|r| r.destination_id == 1).unwrap();
        assert!(zeroed.breakdown.budget_penalized);
        assert!(zeroed.breakdown.difficulty_penalized);
        let modest = results.iter().find(|r| r.destination_id == 2).unwrap();
        assert!(!modest.breakdown.budget_penalized);
        assert!(!modest.breakdown.difficulty_penalized);
    }
}
