use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Destination category. `Unknown` covers anything outside the curated set
/// and encodes as an all-zero block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Trekking,
    Cultural,
    Religious,
    Nature,
    Wildlife,
    Adventure,
    Unknown,
}

impl Category {
    /// One-hot slot order shared by destination and query vectors.
    pub const ENCODED: [Category; 6] = [
        Category::Trekking,
        Category::Cultural,
        Category::Religious,
        Category::Nature,
        Category::Wildlife,
        Category::Adventure,
    ];

    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "trekking" => Category::Trekking,
            "cultural" => Category::Cultural,
            "religious" => Category::Religious,
            "nature" => Category::Nature,
            "wildlife" => Category::Wildlife,
            "adventure" => Category::Adventure,
            _ => Category::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Trekking => "Trekking",
            Category::Cultural => "Cultural",
            Category::Religious => "Religious",
            Category::Nature => "Nature",
            Category::Wildlife => "Wildlife",
            Category::Adventure => "Adventure",
            Category::Unknown => "Unknown",
        }
    }

    /// Interest key a user scores this category with. Trekking is read
    /// from the adventure interest.
    pub fn interest_key(&self) -> Option<&'static str> {
        match self {
            Category::Trekking | Category::Adventure => Some("adventure"),
            Category::Cultural => Some("cultural"),
            Category::Religious => Some("religious"),
            Category::Nature => Some("nature"),
            Category::Wildlife => Some("wildlife"),
            Category::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
    All,
}

impl Season {
    pub const ENCODED: [Season; 5] = [
        Season::Spring,
        Season::Summer,
        Season::Autumn,
        Season::Winter,
        Season::All,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "spring" => Some(Season::Spring),
            "summer" => Some(Season::Summer),
            "autumn" | "fall" => Some(Season::Autumn),
            "winter" => Some(Season::Winter),
            "all" => Some(Season::All),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Autumn => "Autumn",
            Season::Winter => "Winter",
            Season::All => "All",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BudgetTier {
    Budget,
    MidRange,
    Luxury,
}

impl BudgetTier {
    /// Unrecognized tiers fall back to mid-range.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "budget" => BudgetTier::Budget,
            "luxury" => BudgetTier::Luxury,
            _ => BudgetTier::MidRange,
        }
    }

    /// Reference daily cost the tier stands for.
    pub fn reference_cost(&self) -> f64 {
        match self {
            BudgetTier::Budget => 30.0,
            BudgetTier::MidRange => 50.0,
            BudgetTier::Luxury => 100.0,
        }
    }
}

/// Destination record as handed over by the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub destination_id: i64,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub activities: Option<Vec<String>>,
    #[serde(default)]
    pub difficulty_level: Option<i32>,
    #[serde(default)]
    pub best_season: Option<String>,
    #[serde(default)]
    pub avg_cost_per_day: Option<f64>,
    #[serde(default)]
    pub duration_days: Option<i32>,
    #[serde(default)]
    pub popularity_score: Option<i32>,
    #[serde(default)]
    pub altitude: Option<i32>,
    #[serde(default)]
    pub permits_required: Option<bool>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Destination {
    pub fn category(&self) -> Category {
        self.category
            .as_deref()
            .map(Category::parse)
            .unwrap_or(Category::Unknown)
    }

    pub fn season(&self) -> Option<Season> {
        self.best_season.as_deref().and_then(Season::parse)
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}

/// Weighted preference profile. Every field is optional; missing or
/// unrecognized values resolve to defaults rather than errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(default)]
    pub interests: BTreeMap<String, i32>,
    #[serde(default)]
    pub budget_range: Option<String>,
    #[serde(default)]
    pub fitness_level: Option<i32>,
    #[serde(default)]
    pub difficulty_preference: Option<i32>,
    #[serde(default)]
    pub preferred_seasons: Option<Vec<String>>,
    #[serde(default)]
    pub travel_style: Option<String>,
    #[serde(default)]
    pub duration_days: Option<i32>,
}

impl UserPreferences {
    pub const DEFAULT_INTEREST: i32 = 5;
    pub const DEFAULT_FITNESS: i32 = 3;
    pub const DEFAULT_DIFFICULTY: i32 = 2;
    pub const DEFAULT_SEASONS: [Season; 2] = [Season::Spring, Season::Autumn];
    /// Accepted range for fitness and difficulty ratings
    pub const RATING_RANGE: (i32, i32) = (1, 5);

    pub fn interest(&self, name: &str) -> i32 {
        self.interests
            .get(name)
            .copied()
            .unwrap_or(Self::DEFAULT_INTEREST)
    }

    pub fn budget_tier(&self) -> BudgetTier {
        self.budget_range
            .as_deref()
            .map(BudgetTier::parse)
            .unwrap_or(BudgetTier::MidRange)
    }

    /// Fitness rating in 1..=5. Zero counts as unset.
    pub fn fitness(&self) -> i32 {
        Self::rating(self.fitness_level, Self::DEFAULT_FITNESS)
    }

    /// Preferred difficulty in 1..=5. Zero counts as unset.
    pub fn difficulty(&self) -> i32 {
        Self::rating(self.difficulty_preference, Self::DEFAULT_DIFFICULTY)
    }

    fn rating(value: Option<i32>, default: i32) -> i32 {
        let (low, high) = Self::RATING_RANGE;
        match value {
            Some(v) if v != 0 => v.clamp(low, high),
            _ => default,
        }
    }

    /// Seasons the user accepts; unknown names are skipped.
    pub fn seasons(&self) -> Vec<Season> {
        match &self.preferred_seasons {
            Some(raw) => raw.iter().filter_map(|s| Season::parse(s)).collect(),
            None => Self::DEFAULT_SEASONS.to_vec(),
        }
    }
}

/// How a candidate's final score was put together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub neighbor_similarity: f64,
    pub content_similarity: f64,
    pub budget_penalized: bool,
    pub difficulty_penalized: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub destination_id: i64,
    pub name: String,
    pub category: String,
    /// Empty when the catalog has no description
    pub description: String,
    pub image_url: Option<String>,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

#[derive(Debug, Clone, Default)]
pub struct RankingStats {
    pub neighbor_candidates: usize,
    pub unique_candidates: usize,
    pub budget_penalized: usize,
    pub difficulty_penalized: usize,
    pub returned: usize,
}
