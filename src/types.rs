//! Shared types for the COURTSIDE engine.
//!
//! These types form the data model used across all modules. Ratings and
//! matchups come in from the acquisition layer; picks, grade records and
//! alerts go out. Everything here is plain data so that any storage the
//! host chooses can persist it.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Probability helpers
// ---------------------------------------------------------------------------

/// Smallest distance a probability keeps from 0 and 1.
pub const PROB_EPSILON: f64 = 1e-4;

/// Clamp a probability into the open interval (0, 1).
///
/// Non-finite input maps to 0.5 so that a bad upstream value never
/// propagates as NaN.
pub fn clamp_probability(p: f64) -> f64 {
    if !p.is_finite() {
        return 0.5;
    }
    p.clamp(PROB_EPSILON, 1.0 - PROB_EPSILON)
}

// ---------------------------------------------------------------------------
// Team ratings
// ---------------------------------------------------------------------------

/// Recent-form record (e.g. last ten games).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentForm {
    pub wins: u32,
    pub losses: u32,
}

impl RecentForm {
    /// Net wins minus losses.
    pub fn net(&self) -> i64 {
        self.wins as i64 - self.losses as i64
    }
}

/// Qualitative role of a player, used for the fixed starter-out penalty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerRole {
    PrimaryScorer,
    SecondaryScorer,
    DefensiveAnchor,
}

/// Per-team rating record, keyed by canonical team name.
///
/// Immutable within one simulation call: what-if analysis produces a new
/// record through [`crate::model::availability::adjust`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRating {
    /// Canonical team name (see [`crate::identity::TeamResolver`]).
    pub name: String,
    /// Adjusted offensive efficiency (points per 100 possessions).
    #[serde(default)]
    pub offensive_efficiency: Option<f64>,
    /// Adjusted defensive efficiency (points allowed per 100 possessions).
    #[serde(default)]
    pub defensive_efficiency: Option<f64>,
    /// Explicit tempo / pace metric.
    #[serde(default)]
    pub pace: Option<f64>,
    /// Raw possessions-per-game stat, used when no pace metric exists.
    #[serde(default)]
    pub possessions_per_game: Option<f64>,
    /// Optional adjusted margin from an external rating system.
    #[serde(default)]
    pub adj_margin: Option<f64>,
    #[serde(default)]
    pub recent_form: Option<RecentForm>,
    /// Player id → net-rating point contribution.
    #[serde(default)]
    pub player_impacts: BTreeMap<String, f64>,
    /// Player id → role, for players whose absence carries a fixed penalty.
    #[serde(default)]
    pub player_roles: BTreeMap<String, PlayerRole>,
}

impl TeamRating {
    /// A rating with only a name; every metric falls back to defaults.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            offensive_efficiency: None,
            defensive_efficiency: None,
            pace: None,
            possessions_per_game: None,
            adj_margin: None,
            recent_form: None,
            player_impacts: BTreeMap::new(),
            player_roles: BTreeMap::new(),
        }
    }

    /// Convenience builder for the common offense/defense/pace triple.
    pub fn with_efficiencies(name: impl Into<String>, off: f64, def: f64, pace: f64) -> Self {
        Self {
            offensive_efficiency: Some(off),
            defensive_efficiency: Some(def),
            pace: Some(pace),
            ..Self::named(name)
        }
    }
}

// ---------------------------------------------------------------------------
// Matchups
// ---------------------------------------------------------------------------

/// Where the game is played, relative to team A.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Venue {
    TeamAHome,
    TeamBHome,
    Neutral,
}

impl Venue {
    pub fn a_is_home(&self) -> bool {
        matches!(self, Venue::TeamAHome)
    }

    pub fn b_is_home(&self) -> bool {
        matches!(self, Venue::TeamBHome)
    }

    /// The same venue seen with teams A and B swapped.
    pub fn flipped(&self) -> Venue {
        match self {
            Venue::TeamAHome => Venue::TeamBHome,
            Venue::TeamBHome => Venue::TeamAHome,
            Venue::Neutral => Venue::Neutral,
        }
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Venue::TeamAHome => write!(f, "A home"),
            Venue::TeamBHome => write!(f, "B home"),
            Venue::Neutral => write!(f, "neutral"),
        }
    }
}

/// A scheduled game with its market lines.
///
/// Spreads use the margin convention: the market's expected margin for
/// team A, positive when team A is favored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matchup {
    pub team_a: String,
    pub team_b: String,
    pub date: NaiveDate,
    pub venue: Venue,
    #[serde(default)]
    pub market_spread: Option<f64>,
    #[serde(default)]
    pub market_total: Option<f64>,
    /// American moneyline for team A.
    #[serde(default)]
    pub moneyline_a: Option<i32>,
    /// American moneyline for team B.
    #[serde(default)]
    pub moneyline_b: Option<i32>,
    /// American price on the spread (defaults to the configured -110).
    #[serde(default)]
    pub spread_odds: Option<i32>,
}

impl Matchup {
    pub fn label(&self) -> String {
        format!("{} vs {}", self.team_a, self.team_b)
    }
}

// ---------------------------------------------------------------------------
// Picks
// ---------------------------------------------------------------------------

/// Qualification tier, a pure function of cover probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    Strict,
    Relaxed,
    Skip,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Strict => write!(f, "STRICT"),
            Tier::Relaxed => write!(f, "RELAXED"),
            Tier::Skip => write!(f, "SKIP"),
        }
    }
}

/// Which side of the original matchup a pick backs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickSide {
    TeamA,
    TeamB,
}

/// Identity of a game for grading and joins: date plus both team names.
///
/// The names are stored in sorted order, so a game has one key whichever
/// side a pick backs. Build keys through [`GameKey::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GameKey {
    pub date: NaiveDate,
    pub team_a: String,
    pub team_b: String,
}

impl GameKey {
    pub fn new(date: NaiveDate, one: impl Into<String>, other: impl Into<String>) -> Self {
        let (one, other) = (one.into(), other.into());
        let (team_a, team_b) = if one <= other { (one, other) } else { (other, one) };
        Self { date, team_a, team_b }
    }
}

impl fmt::Display for GameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} vs {}", self.date, self.team_a, self.team_b)
    }
}

/// A graded-at-decision-time recommendation.
///
/// Picks are oriented toward the backed team: `team_a` is the side the
/// pick backs, and both spreads are that team's expected margin. Grading
/// reconciles against exactly these fields, so a re-evaluation produces a
/// new `Pick` rather than editing this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pick {
    pub date: NaiveDate,
    pub team_a: String,
    pub team_b: String,
    /// Side of the original matchup this pick backs.
    pub side: PickSide,
    pub model_spread: f64,
    pub market_spread: f64,
    /// Simulated cover probability before calibration.
    pub raw_cover_prob: f64,
    /// Cover probability after calibration (equal to raw when uncalibrated).
    pub cover_prob: f64,
    /// Model win probability for the backed team.
    pub win_prob: f64,
    pub tier: Tier,
    pub decimal_odds: f64,
    pub kelly_fraction: f64,
    pub stake: Decimal,
    pub confidence: f64,
    /// Unit size mapped from confidence, `None` below the lowest band.
    #[serde(default)]
    pub units: Option<f64>,
    #[serde(default)]
    pub total_edge: Option<f64>,
    #[serde(default)]
    pub reasons: Vec<String>,
}

impl Pick {
    pub fn key(&self) -> GameKey {
        GameKey::new(self.date, self.team_a.clone(), self.team_b.clone())
    }

    /// Signed spread edge from the backed team's perspective.
    pub fn spread_edge(&self) -> f64 {
        self.model_spread - self.market_spread
    }
}

impl fmt::Display for Pick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} over {} ({:+.1} vs mkt {:+.1}) cover {:.1}% [{}] stake ${}",
            self.date,
            self.team_a,
            self.team_b,
            self.model_spread,
            self.market_spread,
            self.cover_prob * 100.0,
            self.tier,
            self.stake,
        )
    }
}

// ---------------------------------------------------------------------------
// Scores & grading
// ---------------------------------------------------------------------------

/// A final score as delivered by the results feed (orientation-agnostic).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalScore {
    pub date: NaiveDate,
    pub team_a: String,
    pub team_b: String,
    pub score_a: u32,
    pub score_b: u32,
    /// Closing spread in team A's margin convention, when the feed carries it.
    #[serde(default)]
    pub closing_spread: Option<f64>,
}

/// Outcome of reconciling one pick against the results feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeRecord {
    pub date: NaiveDate,
    pub team_a: String,
    pub team_b: String,
    /// Backed team's final score.
    pub score_a: Option<u32>,
    pub score_b: Option<u32>,
    pub margin: Option<i64>,
    /// Market spread copied from the originating pick.
    pub market_spread: f64,
    pub covered: bool,
    pub won: bool,
    pub stake: Decimal,
    pub profit: Decimal,
    /// Closing line value in points: closing spread minus the spread taken,
    /// both in the backed team's convention. Positive means the pick beat
    /// the close.
    #[serde(default)]
    pub clv: Option<f64>,
    #[serde(default)]
    pub note: Option<String>,
}

impl GradeRecord {
    pub fn key(&self) -> GameKey {
        GameKey::new(self.date, self.team_a.clone(), self.team_b.clone())
    }

    /// Whether this record is a retryable "score not found" placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.margin.is_none()
    }
}

// ---------------------------------------------------------------------------
// Health alerts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Ephemeral alert produced by a health-check run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthAlert {
    pub severity: Severity,
    pub metric: String,
    pub message: String,
    pub current_value: f64,
    pub threshold: f64,
}

impl fmt::Display for HealthAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} - {} (current {:.3}, threshold {:.3})",
            self.severity, self.metric, self.message, self.current_value, self.threshold
        )
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Domain errors. Per-record failures are turned into skip records by the
/// batch operations; these surface only from single-record APIs.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Team not found: {0}")]
    TeamNotFound(String),

    #[error("No market line for {0}")]
    MissingMarket(String),

    #[error("Invalid odds: {0}")]
    InvalidOdds(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn make_pick() -> Pick {
        Pick {
            date: NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
            team_a: "Kansas".into(),
            team_b: "Baylor".into(),
            side: PickSide::TeamA,
            model_spread: 7.2,
            market_spread: 4.5,
            raw_cover_prob: 0.62,
            cover_prob: 0.62,
            win_prob: 0.7,
            tier: Tier::Skip,
            decimal_odds: 1.909,
            kelly_fraction: 0.0,
            stake: dec!(0),
            confidence: 0.5,
            units: None,
            total_edge: None,
            reasons: Vec::new(),
        }
    }

    #[test]
    fn test_clamp_probability_open_interval() {
        assert!(clamp_probability(1.0) < 1.0);
        assert!(clamp_probability(0.0) > 0.0);
        assert!(clamp_probability(-3.0) > 0.0);
        assert_eq!(clamp_probability(0.42), 0.42);
        assert_eq!(clamp_probability(f64::NAN), 0.5);
    }

    #[test]
    fn test_recent_form_net() {
        let form = RecentForm { wins: 3, losses: 7 };
        assert_eq!(form.net(), -4);
    }

    #[test]
    fn test_pick_spread_edge_and_key() {
        let pick = make_pick();
        assert!((pick.spread_edge() - 2.7).abs() < 1e-9);
        let key = pick.key();
        assert_eq!(key.team_a, "Baylor");
        assert_eq!(key.to_string(), "2026-01-10 Baylor vs Kansas");
    }

    #[test]
    fn test_game_key_ignores_orientation() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
        assert_eq!(
            GameKey::new(date, "Kansas", "Baylor"),
            GameKey::new(date, "Baylor", "Kansas")
        );
    }

    #[test]
    fn test_tier_serde_uppercase() {
        let json = serde_json::to_string(&Tier::Strict).unwrap();
        assert_eq!(json, "\"STRICT\"");
        let back: Tier = serde_json::from_str("\"RELAXED\"").unwrap();
        assert_eq!(back, Tier::Relaxed);
    }

    #[test]
    fn test_team_rating_defaults_from_json() {
        let rating: TeamRating = serde_json::from_str(r#"{"name":"Duke"}"#).unwrap();
        assert_eq!(rating, TeamRating::named("Duke"));
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }
}
