//! Persistence layer.
//!
//! Flat JSON files in one data directory:
//! - `picks.json`: every generated pick, keyed by game
//! - `grades.json`: grade records, finals and "score not found" placeholders
//! - `calibration.json`: the last published calibration fit
//! - `calibration_history.json`: backtest prediction/outcome pairs, the
//!   calibration fallback sample (read only)
//!
//! Daily inputs (`ratings.json`, `slate-YYYY-MM-DD.json`,
//! `availability-YYYY-MM-DD.json`) are read from the same directory.
//! A missing file is never an error: it loads as empty / `None`.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::backtest::{CalibrationPoint, CalibrationResult};
use crate::strategy::AvailabilityReport;
use crate::types::{GameKey, GradeRecord, Matchup, Pick, TeamRating};

const PICKS_FILE: &str = "picks.json";
const GRADES_FILE: &str = "grades.json";
const CALIBRATION_FILE: &str = "calibration.json";
const CALIBRATION_HISTORY_FILE: &str = "calibration_history.json";
const RATINGS_FILE: &str = "ratings.json";

/// JSON file store rooted at a data directory.
#[derive(Debug, Clone)]
pub struct DataStore {
    dir: PathBuf,
}

impl DataStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    // -- Picks ---------------------------------------------------------------

    pub fn load_picks(&self) -> Result<Vec<Pick>> {
        Ok(load_json(&self.path(PICKS_FILE))?.unwrap_or_default())
    }

    /// Merge `picks` into the stored set. A new pick replaces a stored pick
    /// for the same game.
    pub fn save_picks(&self, picks: &[Pick]) -> Result<usize> {
        let mut merged: BTreeMap<GameKey, Pick> = self
            .load_picks()?
            .into_iter()
            .map(|p| (p.key(), p))
            .collect();
        for pick in picks {
            merged.insert(pick.key(), pick.clone());
        }
        let all: Vec<Pick> = merged.into_values().collect();
        save_json(&self.path(PICKS_FILE), &all)?;
        debug!(new = picks.len(), total = all.len(), "Picks saved");
        Ok(all.len())
    }

    /// Stored picks for one slate date.
    pub fn picks_for(&self, date: NaiveDate) -> Result<Vec<Pick>> {
        Ok(self
            .load_picks()?
            .into_iter()
            .filter(|p| p.date == date)
            .collect())
    }

    // -- Grades --------------------------------------------------------------

    pub fn load_grades(&self) -> Result<Vec<GradeRecord>> {
        Ok(load_json(&self.path(GRADES_FILE))?.unwrap_or_default())
    }

    /// Overwrite the grade file with the full record set.
    pub fn save_grades<'a, I>(&self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a GradeRecord>,
    {
        let records: Vec<&GradeRecord> = records.into_iter().collect();
        save_json(&self.path(GRADES_FILE), &records)?;
        debug!(records = records.len(), "Grades saved");
        Ok(())
    }

    // -- Calibration ---------------------------------------------------------

    pub fn load_calibration(&self) -> Result<Option<CalibrationResult>> {
        let loaded: Option<CalibrationResult> = load_json(&self.path(CALIBRATION_FILE))?;
        if let Some(c) = &loaded {
            info!(
                a = format!("{:.4}", c.a),
                b = format!("{:.4}", c.b),
                samples = c.sample_size,
                status = ?c.status,
                "Calibration loaded from disk"
            );
        }
        Ok(loaded)
    }

    pub fn save_calibration(&self, result: &CalibrationResult) -> Result<()> {
        save_json(&self.path(CALIBRATION_FILE), result)
    }

    /// Historical points used when too few live picks have been graded.
    pub fn load_calibration_history(&self) -> Result<Vec<CalibrationPoint>> {
        let points: Vec<CalibrationPoint> =
            load_json(&self.path(CALIBRATION_HISTORY_FILE))?.unwrap_or_default();
        debug!(points = points.len(), "Calibration history loaded");
        Ok(points)
    }

    // -- Daily inputs --------------------------------------------------------

    /// Team ratings keyed by the name carried in each record.
    pub fn load_ratings(&self) -> Result<HashMap<String, TeamRating>> {
        let ratings: Vec<TeamRating> = load_json(&self.path(RATINGS_FILE))?.unwrap_or_default();
        Ok(ratings.into_iter().map(|r| (r.name.clone(), r)).collect())
    }

    pub fn load_slate(&self, date: NaiveDate) -> Result<Vec<Matchup>> {
        let file = format!("slate-{}.json", date.format("%Y-%m-%d"));
        Ok(load_json(&self.path(&file))?.unwrap_or_default())
    }

    pub fn load_availability(&self, date: NaiveDate) -> Result<AvailabilityReport> {
        let file = format!("availability-{}.json", date.format("%Y-%m-%d"));
        Ok(load_json(&self.path(&file))?.unwrap_or_default())
    }
}

/// Write `value` as pretty JSON, creating the parent directory if needed.
fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .context(format!("Failed to create data directory {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value)
        .context(format!("Failed to serialise {}", path.display()))?;
    std::fs::write(path, json).context(format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Read JSON from `path`. Returns None if the file doesn't exist.
fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        debug!(path = %path.display(), "No file found, starting empty");
        return Ok(None);
    }
    let json = std::fs::read_to_string(path)
        .context(format!("Failed to read {}", path.display()))?;
    let value = serde_json::from_str(&json)
        .context(format!("Failed to parse {}", path.display()))?;
    Ok(Some(value))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
