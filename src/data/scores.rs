//! JSON score files.
//!
//! One file per date, `<dir>/<YYYY-MM-DD>.json`, holding either a bare array
//! of games or `{ "games": [...] }`. Field names vary between exporters, so
//! the raw record accepts the known aliases and is converted to
//! [`FinalScore`] right here.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info};

use super::ScoreFeed;
use crate::types::FinalScore;

#[derive(Debug, Deserialize)]
struct RawScore {
    #[serde(default, alias = "game_date", alias = "gameDate")]
    date: Option<NaiveDate>,
    #[serde(alias = "home", alias = "home_team", alias = "homeTeam", alias = "team1")]
    team_a: String,
    #[serde(alias = "away", alias = "away_team", alias = "awayTeam", alias = "team2")]
    team_b: String,
    #[serde(
        default,
        alias = "a_score",
        alias = "homeScore",
        alias = "home_score",
        alias = "home_points"
    )]
    score_a: Option<u32>,
    #[serde(
        default,
        alias = "b_score",
        alias = "awayScore",
        alias = "away_score",
        alias = "away_points"
    )]
    score_b: Option<u32>,
    #[serde(
        default,
        alias = "closingSpread",
        alias = "close",
        alias = "spread_close",
        alias = "market_spread_close"
    )]
    closing_spread: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScoreFile {
    List(Vec<RawScore>),
    Wrapped { games: Vec<RawScore> },
}

/// Parse a score document for `date`.
///
/// Games without both scores (not final) and games dated on another day
/// are dropped.
pub fn parse_scores(json: &str, date: NaiveDate) -> Result<Vec<FinalScore>> {
    let file: ScoreFile = serde_json::from_str(json).context("Failed to parse score file")?;
    let raw = match file {
        ScoreFile::List(games) | ScoreFile::Wrapped { games } => games,
    };

    let total = raw.len();
    let scores: Vec<FinalScore> = raw
        .into_iter()
        .filter(|g| g.date.map_or(true, |d| d == date))
        .filter_map(|g| {
            Some(FinalScore {
                date,
                team_a: g.team_a,
                team_b: g.team_b,
                score_a: g.score_a?,
                score_b: g.score_b?,
                closing_spread: g.closing_spread,
            })
        })
        .collect();

    debug!(%date, total, finals = scores.len(), "Scores parsed");
    Ok(scores)
}

/// Score feed backed by a directory of per-date JSON files.
#[derive(Debug, Clone)]
pub struct JsonScoreFeed {
    dir: PathBuf,
}

impl JsonScoreFeed {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("{date}.json"))
    }
}

#[async_trait]
impl ScoreFeed for JsonScoreFeed {
    async fn final_scores(&self, date: NaiveDate) -> Result<Vec<FinalScore>> {
        let path = self.path_for(date);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            info!(path = %path.display(), "No score file yet");
            return Ok(Vec::new());
        }
        let json = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read scores from {}", path.display()))?;
        parse_scores(&json, date).with_context(|| format!("Bad score file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 20).unwrap()
    }

    #[test]
    fn test_parse_aliased_fields() {
        let json = r#"[
            {"home": "Duke", "away": "UNC", "homeScore": 80, "awayScore": 71},
            {"team_a": "Kansas", "team_b": "Baylor", "a_score": 66, "b_score": 70},
            {"home_team": "Iowa St.", "away_team": "TCU", "home_points": 75, "away_points": 60}
        ]"#;
        let scores = parse_scores(json, day()).unwrap();
        assert_eq!(scores.len(), 3);
        assert_eq!(scores[0].team_a, "Duke");
        assert_eq!(scores[0].score_a, 80);
        assert_eq!(scores[1].score_b, 70);
        assert_eq!(scores[2].team_a, "Iowa St.");
        assert!(scores.iter().all(|s| s.date == day()));
    }

    #[test]
    fn test_parse_wrapped_and_filters() {
        let json = r#"{"games": [
            {"home": "Duke", "away": "UNC", "homeScore": 80, "awayScore": 71, "gameDate": "2026-01-19"},
            {"home": "Kansas", "away": "Baylor", "homeScore": 70},
            {"home": "Houston", "away": "Rice", "homeScore": 90, "awayScore": 50, "date": "2026-01-20"}
        ]}"#;
        let scores = parse_scores(json, day()).unwrap();
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].team_a, "Houston");
    }

    #[test]
    fn test_parse_closing_spread() {
        let json = r#"[
            {"home": "Duke", "away": "UNC", "homeScore": 80, "awayScore": 71, "closingSpread": 5.5},
            {"home": "Kansas", "away": "Baylor", "homeScore": 66, "awayScore": 70}
        ]"#;
        let scores = parse_scores(json, day()).unwrap();
        assert_eq!(scores[0].closing_spread, Some(5.5));
        assert_eq!(scores[1].closing_spread, None);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_scores("not json", day()).is_err());
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let feed = JsonScoreFeed::new(dir.path());
        assert!(feed.final_scores(day()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reads_file_for_date() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("2026-01-20.json"),
            r#"[{"home": "Duke", "away": "UNC", "home_score": 80, "away_score": 71}]"#,
        )
        .unwrap();
        let feed = JsonScoreFeed::new(dir.path());
        let scores = feed.final_scores(day()).await.unwrap();
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].score_b, 71);
    }
}
