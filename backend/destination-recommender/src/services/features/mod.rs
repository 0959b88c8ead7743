/// Feature Encoding Module
///
/// Turns destination records into fixed-length numeric vectors for the
/// neighbor index.
///
/// Layout (16 fields):
/// - [0..5]: difficulty, daily cost, popularity, altitude / 1000, permit flag
/// - [5..11]: category one-hot (Trekking, Cultural, Religious, Nature, Wildlife, Adventure)
/// - [11..16]: season one-hot (Spring, Summer, Autumn, Winter, All)
use crate::models::{Category, Destination, Season};
use ndarray::{Array1, Array2};

pub const FEATURE_VECTOR_SIZE: usize = 16;

pub const DIFFICULTY: usize = 0;
pub const COST: usize = 1;
pub const POPULARITY: usize = 2;
pub const ALTITUDE: usize = 3;
pub const PERMIT: usize = 4;
pub const CATEGORY_OFFSET: usize = 5;
pub const SEASON_OFFSET: usize = CATEGORY_OFFSET + Category::ENCODED.len();

/// Defaults and normalization rules for every numeric field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureDefaults {
    pub difficulty: f64,
    pub daily_cost: f64,
    pub popularity: f64,
    pub altitude_meters: f64,
    pub altitude_divisor: f64,
    /// Neutral values used when building a query vector
    pub query_popularity: f64,
    pub query_altitude: f64,
}

impl FeatureDefaults {
    pub const STANDARD: FeatureDefaults = FeatureDefaults {
        difficulty: 2.0,
        daily_cost: 40.0,
        popularity: 50.0,
        altitude_meters: 1000.0,
        altitude_divisor: 1000.0,
        query_popularity: 50.0,
        query_altitude: 2.0,
    };
}

impl FeatureDefaults {
    // Zero and missing values are both treated as unset.

    pub fn difficulty_of(&self, destination: &Destination) -> f64 {
        nonzero(destination.difficulty_level.map(f64::from)).unwrap_or(self.difficulty)
    }

    pub fn daily_cost_of(&self, destination: &Destination) -> f64 {
        nonzero(destination.avg_cost_per_day).unwrap_or(self.daily_cost)
    }

    pub fn popularity_of(&self, destination: &Destination) -> f64 {
        nonzero(destination.popularity_score.map(f64::from)).unwrap_or(self.popularity)
    }

    /// Altitude scaled by `altitude_divisor`.
    pub fn scaled_altitude_of(&self, destination: &Destination) -> f64 {
        nonzero(destination.altitude.map(f64::from)).unwrap_or(self.altitude_meters)
            / self.altitude_divisor
    }
}

fn nonzero(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0)
}

impl Default for FeatureDefaults {
    fn default() -> Self {
        Self::STANDARD
    }
}

#[derive(Debug, Clone, Default)]
pub struct FeatureEncoder {
    defaults: FeatureDefaults,
}

impl FeatureEncoder {
    pub fn new(defaults: FeatureDefaults) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> &FeatureDefaults {
        &self.defaults
    }

    pub fn encode(&self, destination: &Destination) -> Array1<f64> {
        let d = &self.defaults;
        let mut vector = Array1::zeros(FEATURE_VECTOR_SIZE);

        vector[DIFFICULTY] = d.difficulty_of(destination);
        vector[COST] = d.daily_cost_of(destination);
        vector[POPULARITY] = d.popularity_of(destination);
        vector[ALTITUDE] = d.scaled_altitude_of(destination);
        vector[PERMIT] = if destination.permits_required.unwrap_or(false) {
            1.0
        } else {
            0.0
        };

        if let Some(slot) = category_slot(destination.category()) {
            vector[CATEGORY_OFFSET + slot] = 1.0;
        }

        match destination.season() {
            Some(Season::All) => {
                for slot in 0..Season::ENCODED.len() {
                    vector[SEASON_OFFSET + slot] = 1.0;
                }
            }
            Some(season) => {
                if let Some(slot) = season_slot(season) {
                    vector[SEASON_OFFSET + slot] = 1.0;
                }
            }
            None => {}
        }

        vector
    }

    /// Encode a whole catalog, one row per destination in catalog order.
    pub fn encode_all(&self, destinations: &[Destination]) -> Array2<f64> {
        let mut matrix = Array2::zeros((destinations.len(), FEATURE_VECTOR_SIZE));
        for (row, destination) in destinations.iter().enumerate() {
            matrix.row_mut(row).assign(&self.encode(destination));
        }
        matrix
    }
}

pub fn category_slot(category: Category) -> Option<usize> {
    Category::ENCODED.iter().position(|c| *c == category)
}

pub fn season_slot(season: Season) -> Option<usize> {
    Season::ENCODED.iter().position(|s| *s == season)
}
