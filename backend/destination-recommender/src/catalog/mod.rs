// ============================================
// Destination Catalog Accessors
// ============================================
//
// The engine never touches storage itself. It asks a CatalogSource for a
// full snapshot of destination records and for a revision number that
// moves whenever the records change.

use crate::error::{RecommendError, Result};
use crate::models::Destination;
use parking_lot::RwLock;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::{info, warn};

pub trait CatalogSource: Send + Sync {
    /// All current destination records, in catalog order.
    fn destinations(&self) -> Result<Vec<Destination>>;

    /// Changes whenever the records returned by `destinations` change.
    fn revision(&self) -> u64 {
        0
    }
}

/// Catalog held in memory, for tests and embedding callers.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    inner: RwLock<(Vec<Destination>, u64)>,
}

impl InMemoryCatalog {
    pub fn new(destinations: Vec<Destination>) -> Self {
        Self {
            inner: RwLock::new((destinations, 1)),
        }
    }

    pub fn replace(&self, destinations: Vec<Destination>) {
        let mut inner = self.inner.write();
        inner.0 = destinations;
        inner.1 += 1;
    }

    pub fn push(&self, destination: Destination) {
        let mut inner = self.inner.write();
        inner.0.push(destination);
        inner.1 += 1;
    }

    pub fn len(&self) -> usize {
        self.inner.read().0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CatalogSource for InMemoryCatalog {
    fn destinations(&self) -> Result<Vec<Destination>> {
        Ok(self.inner.read().0.clone())
    }

    fn revision(&self) -> u64 {
        self.inner.read().1
    }
}

/// Catalog read from a `.json` array or a `.csv` export on every fetch.
#[derive(Debug, Clone)]
pub struct FileCatalog {
    path: PathBuf,
}

/// CSV row shape; `activities` is a JSON array string and blank cells
/// are treated as missing.
#[derive(Debug, Deserialize)]
struct CsvDestinationRow {
    destination_id: i64,
    name: String,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    activities: Option<String>,
    #[serde(default)]
    difficulty_level: Option<i32>,
    #[serde(default)]
    best_season: Option<String>,
    #[serde(default)]
    avg_cost_per_day: Option<f64>,
    #[serde(default)]
    duration_days: Option<i32>,
    #[serde(default)]
    popularity_score: Option<i32>,
    #[serde(default)]
    altitude: Option<i32>,
    #[serde(default)]
    permits_required: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
}

impl CsvDestinationRow {
    fn into_destination(self) -> Destination {
        let activities = self.activities.and_then(|raw| {
            serde_json::from_str::<Vec<String>>(&raw)
                .map_err(|e| {
                    warn!(
                        destination_id = self.destination_id,
                        error = %e,
                        "Unparseable activities column, ignoring"
                    );
                })
                .ok()
        });

        Destination {
            destination_id: self.destination_id,
            name: self.name,
            location: non_blank(self.location),
            latitude: self.latitude,
            longitude: self.longitude,
            category: non_blank(self.category),
            description: non_blank(self.description),
            activities,
            difficulty_level: self.difficulty_level,
            best_season: non_blank(self.best_season),
            avg_cost_per_day: self.avg_cost_per_day,
            duration_days: self.duration_days,
            popularity_score: self.popularity_score,
            altitude: self.altitude,
            permits_required: self
                .permits_required
                .map(|raw| raw.trim().eq_ignore_ascii_case("true")),
            image_url: non_blank(self.image_url),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl FileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_json(&self) -> Result<Vec<Destination>> {
        let reader = BufReader::new(File::open(&self.path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    fn load_csv(&self) -> Result<Vec<Destination>> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Fields)
            .from_path(&self.path)?;

        let mut destinations = Vec::new();
        for row in reader.deserialize::<CsvDestinationRow>() {
            destinations.push(row?.into_destination());
        }
        Ok(destinations)
    }
}

impl CatalogSource for FileCatalog {
    fn destinations(&self) -> Result<Vec<Destination>> {
        let extension = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        let destinations = match extension.as_str() {
            "json" => self.load_json()?,
            "csv" => self.load_csv()?,
            other => {
                return Err(RecommendError::Catalog(format!(
                    "Unsupported catalog format '{}' for {}",
                    other,
                    self.path.display()
                )))
            }
        };

        info!(
            destinations = destinations.len(),
            path = %self.path.display(),
            "Loaded destination catalog"
        );

        Ok(destinations)
    }

    /// Modification time in nanoseconds mixed with the file length, so a
    /// rewrite inside one timestamp tick still moves it. 0 when unavailable.
    fn revision(&self) -> u64 {
        let Ok(metadata) = std::fs::metadata(&self.path) else {
            return 0;
        };
        let modified = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        modified ^ metadata.len().rotate_left(40)
    }
}
