//! Grader: reconciles picks against final scores.
//!
//! Grading is idempotent per (date, team A, team B) after identity
//! resolution. A final record is never re-processed; a "score not found"
//! placeholder is replaced once the score shows up.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::prelude::*;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::data::ScoreFeed;
use crate::identity::TeamResolver;
use crate::types::{FinalScore, GameKey, GradeRecord, Pick};

/// Note attached to placeholder records.
pub const SCORE_NOT_FOUND: &str = "score not found";

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// All grade records, one per canonical game key.
#[derive(Debug, Clone, Default)]
pub struct GradeLedger {
    records: BTreeMap<GameKey, GradeRecord>,
}

impl GradeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from persisted records. A final record wins over a
    /// placeholder for the same key.
    pub fn from_records(records: Vec<GradeRecord>) -> Self {
        let mut ledger = Self::new();
        for record in records {
            let key = record.key();
            match ledger.records.get(&key) {
                Some(existing) if !existing.is_placeholder() => {}
                _ => {
                    ledger.records.insert(key, record);
                }
            }
        }
        ledger
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, key: &GameKey) -> Option<&GradeRecord> {
        self.records.get(key)
    }

    /// Whether a final (non-placeholder) record exists for `key`.
    pub fn is_final(&self, key: &GameKey) -> bool {
        self.records.get(key).is_some_and(|r| !r.is_placeholder())
    }

    /// Records ordered by date then teams.
    pub fn records(&self) -> Vec<GradeRecord> {
        self.records.values().cloned().collect()
    }

    /// Final records only.
    pub fn finals(&self) -> impl Iterator<Item = &GradeRecord> {
        self.records.values().filter(|r| !r.is_placeholder())
    }

    fn insert(&mut self, record: GradeRecord) {
        self.records.insert(record.key(), record);
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Counts and money for one grading run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GradingSummary {
    /// Picks graded against a final score in this run.
    pub graded: usize,
    pub covers: usize,
    pub wins: usize,
    /// Picks with no score yet (placeholder kept or written).
    pub placeholders: usize,
    /// Picks already graded in an earlier run.
    pub skipped: usize,
    pub total_stake: Decimal,
    pub total_profit: Decimal,
    /// Graded picks whose feed carried a closing line.
    pub clv_samples: usize,
    /// Sum of closing line value over `clv_samples`, in points.
    pub total_clv: f64,
    /// Picks that beat the closing line (CLV > 0).
    pub beat_close: usize,
}

impl GradingSummary {
    /// Profit over stake, 0 when nothing was staked.
    pub fn roi(&self) -> f64 {
        if self.total_stake.is_zero() {
            return 0.0;
        }
        (self.total_profit / self.total_stake).to_f64().unwrap_or(0.0)
    }

    /// Mean closing line value, `None` without any closing lines.
    pub fn avg_clv(&self) -> Option<f64> {
        (self.clv_samples > 0).then(|| self.total_clv / self.clv_samples as f64)
    }

    /// Fold another run's counts into this one.
    pub fn absorb(&mut self, other: &GradingSummary) {
        self.graded += other.graded;
        self.covers += other.covers;
        self.wins += other.wins;
        self.placeholders += other.placeholders;
        self.skipped += other.skipped;
        self.total_stake += other.total_stake;
        self.total_profit += other.total_profit;
        self.clv_samples += other.clv_samples;
        self.total_clv += other.total_clv;
        self.beat_close += other.beat_close;
    }

    /// Cover rate among picks graded in this run.
    pub fn cover_rate(&self) -> f64 {
        if self.graded == 0 {
            0.0
        } else {
            self.covers as f64 / self.graded as f64
        }
    }
}

/// Result of grading every outstanding date.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PendingRun {
    /// Dates attempted, oldest first.
    pub dates: Vec<NaiveDate>,
    /// Dates whose score feed failed; their picks stay pending.
    pub feed_errors: usize,
    pub summary: GradingSummary,
}

// ---------------------------------------------------------------------------
// Grader
// ---------------------------------------------------------------------------

pub struct Grader {
    resolver: Arc<TeamResolver>,
}

impl Grader {
    pub fn new(resolver: Arc<TeamResolver>) -> Self {
        Self { resolver }
    }

    /// (backed team, opponent) resolved to canonical names.
    fn canonical_teams(&self, pick: &Pick) -> (String, String) {
        (
            self.resolver.resolve(&pick.team_a),
            self.resolver.resolve(&pick.team_b),
        )
    }

    fn canonical_key(&self, pick: &Pick) -> GameKey {
        let (team, opponent) = self.canonical_teams(pick);
        GameKey::new(pick.date, team, opponent)
    }

    /// Grade one pick. `score` must already be oriented as
    /// (backed team's points, opponent's points); `None` yields a placeholder.
    ///
    /// `covered = margin − market_spread > 0`, using the spread stored on the
    /// pick. A cover pays `stake × (decimal_odds − 1)`; anything else loses
    /// the stake.
    pub fn grade_pick(&self, pick: &Pick, score: Option<(u32, u32)>) -> GradeRecord {
        self.grade_pick_with_close(pick, score, None)
    }

    /// [`Grader::grade_pick`] plus closing line value. `closing_spread` is
    /// in the backed team's convention, like the pick's own spread.
    pub fn grade_pick_with_close(
        &self,
        pick: &Pick,
        score: Option<(u32, u32)>,
        closing_spread: Option<f64>,
    ) -> GradeRecord {
        let (team, opponent) = self.canonical_teams(pick);
        let Some((points_for, points_against)) = score else {
            return GradeRecord {
                date: pick.date,
                team_a: team,
                team_b: opponent,
                score_a: None,
                score_b: None,
                margin: None,
                market_spread: pick.market_spread,
                covered: false,
                won: false,
                stake: Decimal::ZERO,
                profit: Decimal::ZERO,
                clv: None,
                note: Some(SCORE_NOT_FOUND.to_string()),
            };
        };

        let margin = points_for as i64 - points_against as i64;
        let covered = margin as f64 - pick.market_spread > 0.0;
        let won = margin > 0;
        let profit = if covered {
            Decimal::from_f64(pick.decimal_odds - 1.0)
                .map(|payout| (pick.stake * payout).round_dp(2))
                .unwrap_or(Decimal::ZERO)
        } else {
            -pick.stake
        };

        GradeRecord {
            date: pick.date,
            team_a: team,
            team_b: opponent,
            score_a: Some(points_for),
            score_b: Some(points_against),
            margin: Some(margin),
            market_spread: pick.market_spread,
            covered,
            won,
            stake: pick.stake,
            profit,
            clv: closing_spread.map(|close| close - pick.market_spread),
            note: None,
        }
    }

    /// Grade `picks` against `scores`, updating `ledger` in place.
    pub fn grade(
        &self,
        picks: &[Pick],
        scores: &[FinalScore],
        ledger: &mut GradeLedger,
    ) -> GradingSummary {
        // (date, team, opponent) → (points for, points against, close), both orientations.
        let mut index: HashMap<(NaiveDate, String, String), ScoreLine> = HashMap::new();
        for s in scores {
            let a = self.resolver.resolve(&s.team_a);
            let b = self.resolver.resolve(&s.team_b);
            index.insert(
                (s.date, a.clone(), b.clone()),
                ((s.score_a, s.score_b), s.closing_spread),
            );
            index.insert((s.date, b, a), ((s.score_b, s.score_a), s.closing_spread.map(|c| -c)));
        }

        let mut summary = GradingSummary::default();
        for pick in picks {
            let (team, opponent) = self.canonical_teams(pick);
            let key = GameKey::new(pick.date, team.clone(), opponent.clone());
            if ledger.is_final(&key) {
                debug!(game = %key, "Already graded, skipping");
                summary.skipped += 1;
                continue;
            }

            let line = index.get(&(pick.date, team, opponent)).copied();
            let record = self.grade_pick_with_close(
                pick,
                line.map(|(score, _)| score),
                line.and_then(|(_, close)| close),
            );

            if record.is_placeholder() {
                warn!(game = %key, "Score not found, leaving placeholder");
                summary.placeholders += 1;
            } else {
                summary.graded += 1;
                summary.covers += usize::from(record.covered);
                summary.wins += usize::from(record.won);
                summary.total_stake += record.stake;
                summary.total_profit += record.profit;
                if let Some(clv) = record.clv {
                    summary.clv_samples += 1;
                    summary.total_clv += clv;
                    summary.beat_close += usize::from(clv > 0.0);
                }
                debug!(
                    game = %key,
                    margin = ?record.margin,
                    covered = record.covered,
                    profit = %record.profit,
                    clv = ?record.clv,
                    "Pick graded"
                );
            }
            ledger.insert(record);
        }

        info!(
            graded = summary.graded,
            covers = summary.covers,
            placeholders = summary.placeholders,
            skipped = summary.skipped,
            profit = %summary.total_profit,
            roi = format!("{:.1}%", summary.roi() * 100.0),
            avg_clv = ?summary.avg_clv(),
            "Grading complete"
        );
        summary
    }

    /// Grade the picks dated `date` with scores pulled from `feed`.
    pub async fn grade_date(
        &self,
        date: NaiveDate,
        picks: &[Pick],
        feed: &dyn ScoreFeed,
        ledger: &mut GradeLedger,
    ) -> Result<GradingSummary> {
        let day: Vec<Pick> = picks.iter().filter(|p| p.date == date).cloned().collect();
        if day.is_empty() {
            info!(%date, "No picks to grade");
            return Ok(GradingSummary::default());
        }
        let scores = feed
            .final_scores(date)
            .await
            .with_context(|| format!("Failed to fetch scores for {date}"))?;
        info!(%date, picks = day.len(), scores = scores.len(), "Grading date");
        Ok(self.grade(&day, &scores, ledger))
    }

    /// Dates before `before` holding at least one pick without a final
    /// grade, oldest first. Placeholders count as outstanding.
    pub fn pending_dates(
        &self,
        picks: &[Pick],
        ledger: &GradeLedger,
        before: NaiveDate,
    ) -> Vec<NaiveDate> {
        let dates: BTreeSet<NaiveDate> = picks
            .iter()
            .filter(|p| p.date < before)
            .filter(|p| !ledger.is_final(&self.canonical_key(p)))
            .map(|p| p.date)
            .collect();
        dates.into_iter().collect()
    }

    /// Grade every outstanding date before `today`. A feed failure is
    /// logged and counted; the remaining dates are still graded.
    pub async fn grade_pending(
        &self,
        today: NaiveDate,
        picks: &[Pick],
        feed: &dyn ScoreFeed,
        ledger: &mut GradeLedger,
    ) -> PendingRun {
        let mut run = PendingRun {
            dates: self.pending_dates(picks, ledger, today),
            ..PendingRun::default()
        };
        for &date in &run.dates {
            match self.grade_date(date, picks, feed, ledger).await {
                Ok(summary) => run.summary.absorb(&summary),
                Err(e) => {
                    error!(%date, error = %e, "Grading failed for date");
                    run.feed_errors += 1;
                }
            }
        }
        info!(
            dates = run.dates.len(),
            feed_errors = run.feed_errors,
            graded = run.summary.graded,
            placeholders = run.summary.placeholders,
            "Pending grades processed"
        );
        run
    }
}

/// Oriented score plus the closing spread in the same orientation.
type ScoreLine = ((u32, u32), Option<f64>);

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
