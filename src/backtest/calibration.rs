//! Calibration module.
//!
//! Measures how well simulated cover probabilities match realized results
//! and fits a linear correction `calibrated = a + b·raw` by ordinary least
//! squares. Also produces the per-bucket predicted-vs-actual curve and a
//! Brier score for the same sample.
//!
//! A fitted result replaces the previous one whole; see [`CalibrationStore`].

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::CalibrationConfig;
use crate::identity::TeamResolver;
use crate::types::{clamp_probability, GameKey, GradeRecord, Pick};

// ---------------------------------------------------------------------------
// Calibration data
// ---------------------------------------------------------------------------

/// A single prediction–outcome pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    pub key: GameKey,
    /// Raw (uncalibrated) cover probability at decision time.
    pub predicted: f64,
    pub covered: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CalibrationStatus {
    Ok,
    SmallSample,
    InsufficientVariance,
}

/// Where the fitted sample came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationSource {
    /// Picks joined to their grade records.
    Matched,
    /// Secondary historical source (e.g. a backtest), used when too few
    /// live picks have been graded.
    Fallback,
}

/// A bucket in the calibration curve (e.g. all predictions in 0.60–0.70).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationBucket {
    pub bin_start: f64,
    pub bin_end: f64,
    pub count: usize,
    pub mean_predicted: f64,
    pub actual_rate: f64,
    /// `|mean_predicted − actual_rate|`
    pub deviation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationDiagnosis {
    WellCalibrated,
    /// Raw probabilities too extreme (slope well below 1).
    OverConfident,
    /// Raw probabilities too central (slope well above 1).
    UnderConfident,
    InsufficientData,
}

/// Fitted calibration. Superseded whole by the next fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationResult {
    /// Intercept.
    pub a: f64,
    /// Slope.
    pub b: f64,
    pub sample_size: usize,
    pub status: CalibrationStatus,
    pub source: CalibrationSource,
    pub buckets: Vec<CalibrationBucket>,
    pub brier: f64,
    pub diagnosis: CalibrationDiagnosis,
    pub clamp_low: f64,
    pub clamp_high: f64,
    pub fitted_at: DateTime<Utc>,
}

impl Default for CalibrationResult {
    /// Identity mapping with no data behind it.
    fn default() -> Self {
        let cfg = CalibrationConfig::default();
        Self {
            a: 0.0,
            b: 1.0,
            sample_size: 0,
            status: CalibrationStatus::SmallSample,
            source: CalibrationSource::Matched,
            buckets: Vec::new(),
            brier: 0.0,
            diagnosis: CalibrationDiagnosis::InsufficientData,
            clamp_low: cfg.clamp_low,
            clamp_high: cfg.clamp_high,
            fitted_at: Utc::now(),
        }
    }
}

impl CalibrationResult {
    /// Whether the coefficients may be used on live probabilities.
    pub fn is_trusted(&self) -> bool {
        self.status == CalibrationStatus::Ok
    }

    /// Calibrated probability for a raw one.
    ///
    /// Untrusted fits leave the raw probability alone (still clamped into
    /// the open unit interval).
    pub fn apply(&self, raw: f64) -> f64 {
        if !raw.is_finite() {
            return clamp_probability(raw);
        }
        if !self.is_trusted() {
            return clamp_probability(raw);
        }
        (self.a + self.b * raw).clamp(self.clamp_low, self.clamp_high)
    }
}

// ---------------------------------------------------------------------------
// Fitter
// ---------------------------------------------------------------------------

pub struct CalibrationFitter {
    config: CalibrationConfig,
    resolver: Arc<TeamResolver>,
}

impl CalibrationFitter {
    pub fn new(config: CalibrationConfig, resolver: Arc<TeamResolver>) -> Self {
        Self { config, resolver }
    }

    fn canonical_key(&self, key: &GameKey) -> GameKey {
        GameKey::new(
            key.date,
            self.resolver.resolve(&key.team_a),
            self.resolver.resolve(&key.team_b),
        )
    }

    /// Join picks to final grade records through the resolver.
    ///
    /// Returns the matched points and the number of picks left unmatched.
    /// Placeholder grades (no score yet) never match, and neither does a
    /// grade recorded for the other side of the game.
    pub fn matched_points(
        &self,
        picks: &[Pick],
        grades: &[GradeRecord],
    ) -> (Vec<CalibrationPoint>, usize) {
        let graded: HashMap<GameKey, (String, &GradeRecord)> = grades
            .iter()
            .filter(|g| !g.is_placeholder())
            .map(|g| (self.canonical_key(&g.key()), (self.resolver.resolve(&g.team_a), g)))
            .collect();

        let mut points = Vec::new();
        let mut unmatched = 0;
        for pick in picks {
            let key = self.canonical_key(&pick.key());
            let backed = self.resolver.resolve(&pick.team_a);
            match graded.get(&key).filter(|(team, _)| *team == backed) {
                Some((_, grade)) => points.push(CalibrationPoint {
                    key,
                    predicted: pick.raw_cover_prob,
                    covered: grade.covered,
                }),
                None => unmatched += 1,
            }
        }
        (points, unmatched)
    }

    /// Fit from the full pick/grade history, falling back to `fallback`
    /// when fewer than `min_samples` live points are matched.
    pub fn fit_history(
        &self,
        picks: &[Pick],
        grades: &[GradeRecord],
        fallback: &[CalibrationPoint],
    ) -> CalibrationResult {
        let (matched, unmatched) = self.matched_points(picks, grades);
        info!(
            matched = matched.len(),
            unmatched,
            fallback = fallback.len(),
            "Calibration sample collected"
        );
        self.fit(&matched, fallback)
    }

    pub fn fit(&self, matched: &[CalibrationPoint], fallback: &[CalibrationPoint]) -> CalibrationResult {
        let (points, source) =
            if matched.len() < self.config.min_samples && fallback.len() > matched.len() {
                (fallback, CalibrationSource::Fallback)
            } else {
                (matched, CalibrationSource::Matched)
            };

        let points: Vec<&CalibrationPoint> =
            points.iter().filter(|p| p.predicted.is_finite()).collect();
        let n = points.len();
        let buckets = self.buckets(&points);
        let brier = brier_score(&points);

        let mut result = CalibrationResult {
            sample_size: n,
            source,
            buckets,
            brier,
            clamp_low: self.config.clamp_low,
            clamp_high: self.config.clamp_high,
            ..CalibrationResult::default()
        };

        if n < self.config.absolute_min_samples.max(1) {
            warn!(n, "Too few samples to fit calibration");
            return result;
        }

        let nf = n as f64;
        let mean_p = points.iter().map(|p| p.predicted).sum::<f64>() / nf;
        let mean_y = points.iter().map(|p| outcome(p)).sum::<f64>() / nf;
        let var_p = points.iter().map(|p| (p.predicted - mean_p).powi(2)).sum::<f64>() / nf;
        let var_y = points.iter().map(|p| (outcome(p) - mean_y).powi(2)).sum::<f64>() / nf;
        let cov = points
            .iter()
            .map(|p| (p.predicted - mean_p) * (outcome(p) - mean_y))
            .sum::<f64>()
            / nf;

        let b = if var_p > 0.0 { cov / var_p } else { 0.0 };
        let a = mean_y - b * mean_p;
        result.a = a;
        result.b = b;

        result.status = if var_y == 0.0 || var_p == 0.0 {
            CalibrationStatus::InsufficientVariance
        } else if n < self.config.min_samples {
            CalibrationStatus::SmallSample
        } else {
            CalibrationStatus::Ok
        };
        result.diagnosis = diagnose(&result);

        info!(
            a = format!("{:.4}", a),
            b = format!("{:.4}", b),
            n,
            status = ?result.status,
            source = ?source,
            brier = format!("{:.4}", brier),
            "Calibration fitted"
        );
        if !result.is_trusted() {
            warn!(status = ?result.status, "Calibration not trusted, raw probabilities stay in use");
        }
        result
    }

    /// Populated buckets of width `1 / buckets`, keyed by `floor(p·k)/k`.
    fn buckets(&self, points: &[&CalibrationPoint]) -> Vec<CalibrationBucket> {
        let k = self.config.buckets.max(1);
        let width = 1.0 / k as f64;
        let mut bins: Vec<(usize, f64, usize)> = vec![(0, 0.0, 0); k];

        for p in points {
            let idx = ((p.predicted.clamp(0.0, 1.0) * k as f64).floor() as usize).min(k - 1);
            let bin = &mut bins[idx];
            bin.0 += 1;
            bin.1 += p.predicted;
            bin.2 += usize::from(p.covered);
        }

        bins.into_iter()
            .enumerate()
            .filter(|(_, (count, _, _))| *count > 0)
            .map(|(i, (count, sum_p, hits))| {
                let mean_predicted = sum_p / count as f64;
                let actual_rate = hits as f64 / count as f64;
                CalibrationBucket {
                    bin_start: i as f64 * width,
                    bin_end: (i + 1) as f64 * width,
                    count,
                    mean_predicted,
                    actual_rate,
                    deviation: (mean_predicted - actual_rate).abs(),
                }
            })
            .collect()
    }
}

fn outcome(p: &CalibrationPoint) -> f64 {
    if p.covered {
        1.0
    } else {
        0.0
    }
}

/// Brier = (1/N) · Σ(predicted − outcome)². 0 is perfect, 0.25 is a coin flip.
fn brier_score(points: &[&CalibrationPoint]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    points.iter().map(|p| (p.predicted - outcome(p)).powi(2)).sum::<f64>() / points.len() as f64
}

fn diagnose(result: &CalibrationResult) -> CalibrationDiagnosis {
    if result.status != CalibrationStatus::Ok {
        return CalibrationDiagnosis::InsufficientData;
    }
    if result.b < 0.8 {
        CalibrationDiagnosis::OverConfident
    } else if result.b > 1.2 {
        CalibrationDiagnosis::UnderConfident
    } else {
        CalibrationDiagnosis::WellCalibrated
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Shared handle to the current calibration.
///
/// Readers get an `Arc` snapshot; `publish` swaps the whole result, so a
/// reader sees either the old fit or the new one.
#[derive(Debug, Clone, Default)]
pub struct CalibrationStore {
    current: Arc<RwLock<Arc<CalibrationResult>>>,
}

impl CalibrationStore {
    pub fn new(result: CalibrationResult) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(result))),
        }
    }

    pub fn current(&self) -> Arc<CalibrationResult> {
        Arc::clone(&self.current.read())
    }

    pub fn publish(&self, result: CalibrationResult) {
        *self.current.write() = Arc::new(result);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn make_point(i: usize, predicted: f64, covered: bool) -> CalibrationPoint {
        CalibrationPoint {
            key: GameKey::new(
                NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                format!("Team {i}"),
                "Opponent",
            ),
            predicted,
            covered,
        }
    }

    fn make_fitter() -> CalibrationFitter {
        CalibrationFitter::new(CalibrationConfig::default(), Arc::new(TeamResolver::new()))
    }

    #[test]
    fn test_all_wins_is_insufficient_variance() {
        let points: Vec<_> = (0..10)
            .map(|i| make_point(i, 0.54 + i as f64 * 0.002, true))
            .collect();
        let result = make_fitter().fit(&points, &[]);
        assert_eq!(result.status, CalibrationStatus::InsufficientVariance);
        assert!(!result.is_trusted());
        assert_eq!(result.apply(0.55), 0.55);
    }

    #[test]
    fn test_rounded_outcomes_recover_identity() {
        let mut points = Vec::new();
        for (i, p) in [0.005, 0.01, 0.015, 0.985, 0.99, 0.995].iter().enumerate() {
            for j in 0..5 {
                points.push(make_point(i * 10 + j, *p, p.round() == 1.0));
            }
        }
        let result = make_fitter().fit(&points, &[]);
        assert_eq!(result.status, CalibrationStatus::Ok);
        assert!((result.b - 1.0).abs() < 0.05, "b = {}", result.b);
        assert!(result.a.abs() < 0.05, "a = {}", result.a);
        assert_eq!(result.diagnosis, CalibrationDiagnosis::WellCalibrated);
    }

    /// `per_group` points at each of 0.3..=0.7, `hits[g]` of them covered.
    fn make_mid_range(per_group: usize, hits: [usize; 5]) -> Vec<CalibrationPoint> {
        let mut points = Vec::new();
        for (g, &covered) in hits.iter().enumerate() {
            let p = 0.3 + g as f64 * 0.1;
            for j in 0..per_group {
                points.push(make_point(g * per_group + j, p, j < covered));
            }
        }
        points
    }

    #[test]
    fn test_mid_range_matching_rates_fit_identity() {
        let points = make_mid_range(10, [3, 4, 5, 6, 7]);
        let result = make_fitter().fit(&points, &[]);
        assert_eq!(result.status, CalibrationStatus::Ok);
        assert!((result.b - 1.0).abs() < 1e-9, "b = {}", result.b);
        assert!(result.a.abs() < 1e-9, "a = {}", result.a);
        assert_eq!(result.diagnosis, CalibrationDiagnosis::WellCalibrated);
        assert!((result.apply(0.45) - 0.45).abs() < 1e-9);
        assert!(result.buckets.iter().all(|b| b.deviation < 1e-9));
    }

    #[test]
    fn test_mid_range_overconfidence_flattens_slope() {
        // Realized rates move half as far from 0.5 as the predictions do.
        let points = make_mid_range(20, [8, 9, 10, 11, 12]);
        let result = make_fitter().fit(&points, &[]);
        assert_eq!(result.status, CalibrationStatus::Ok);
        assert!((result.b - 0.5).abs() < 1e-9, "b = {}", result.b);
        assert!((result.a - 0.25).abs() < 1e-9, "a = {}", result.a);
        assert_eq!(result.diagnosis, CalibrationDiagnosis::OverConfident);
        assert!((result.apply(0.7) - 0.6).abs() < 1e-9);
        assert!((result.apply(0.3) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_small_sample_falls_back() {
        let matched: Vec<_> = (0..4).map(|i| make_point(i, 0.6, i % 2 == 0)).collect();
        let fallback: Vec<_> = (0..40)
            .map(|i| make_point(i, 0.3 + (i % 5) as f64 * 0.1, i % 3 != 0))
            .collect();
        let result = make_fitter().fit(&matched, &fallback);
        assert_eq!(result.source, CalibrationSource::Fallback);
        assert_eq!(result.sample_size, 40);

        let alone = make_fitter().fit(&matched, &[]);
        assert_eq!(alone.source, CalibrationSource::Matched);
        assert_eq!(alone.status, CalibrationStatus::InsufficientVariance);
    }

    #[test]
    fn test_small_sample_status() {
        let points: Vec<_> = (0..8)
            .map(|i| make_point(i, 0.5 + (i % 4) as f64 * 0.1, i % 2 == 0))
            .collect();
        let result = make_fitter().fit(&points, &[]);
        assert_eq!(result.status, CalibrationStatus::SmallSample);
        assert_eq!(result.apply(0.7), 0.7);
    }

    #[test]
    fn test_apply_clamps_trusted_fit() {
        let result = CalibrationResult {
            a: 0.2,
            b: 1.0,
            status: CalibrationStatus::Ok,
            ..CalibrationResult::default()
        };
        assert!((result.apply(0.5) - 0.7).abs() < 1e-9);
        assert_eq!(result.apply(0.95), 0.99);
        let low = CalibrationResult {
            a: -0.5,
            ..result.clone()
        };
        assert_eq!(low.apply(0.1), 0.01);
    }

    #[test]
    fn test_buckets_only_populated() {
        let points = vec![
            make_point(0, 0.62, true),
            make_point(1, 0.68, false),
            make_point(2, 0.91, true),
        ];
        let result = make_fitter().fit(&points, &[]);
        assert_eq!(result.buckets.len(), 2);
        let b6 = &result.buckets[0];
        assert!((b6.bin_start - 0.6).abs() < 1e-9);
        assert_eq!(b6.count, 2);
        assert!((b6.mean_predicted - 0.65).abs() < 1e-9);
        assert!((b6.actual_rate - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_brier_score() {
        let points = vec![make_point(0, 0.9, true), make_point(1, 0.1, false)];
        let refs: Vec<&CalibrationPoint> = points.iter().collect();
        assert!((brier_score(&refs) - 0.01).abs() < 1e-9);
    }

    #[test]
    fn test_matched_points_join_through_resolver() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        let pick = Pick {
            date,
            team_a: "Ball St.".into(),
            team_b: "St. Francis".into(),
            side: crate::types::PickSide::TeamA,
            model_spread: 5.0,
            market_spread: 2.0,
            raw_cover_prob: 0.64,
            cover_prob: 0.64,
            win_prob: 0.7,
            tier: crate::types::Tier::Skip,
            decimal_odds: 1.91,
            kelly_fraction: 0.0,
            stake: Decimal::ZERO,
            confidence: 0.6,
            units: None,
            total_edge: None,
            reasons: Vec::new(),
        };
        let grade = GradeRecord {
            date,
            team_a: "Ball State".into(),
            team_b: "Saint Francis".into(),
            score_a: Some(70),
            score_b: Some(60),
            margin: Some(10),
            market_spread: 2.0,
            covered: true,
            won: true,
            stake: Decimal::ZERO,
            profit: Decimal::ZERO,
            clv: None,
            note: None,
        };
        let mut other = pick.clone();
        other.team_a = "Nowhere".into();

        let (points, unmatched) = make_fitter().matched_points(&[pick, other], &[grade]);
        assert_eq!(points.len(), 1);
        assert_eq!(unmatched, 1);
        assert!(points[0].covered);
        assert_eq!(points[0].predicted, 0.64);
    }

    #[test]
    fn test_grade_for_other_side_is_unmatched() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        let grade = GradeRecord {
            date,
            team_a: "Rider".into(),
            team_b: "Marist".into(),
            score_a: Some(70),
            score_b: Some(60),
            margin: Some(10),
            market_spread: 2.0,
            covered: true,
            won: true,
            stake: Decimal::ZERO,
            profit: Decimal::ZERO,
            clv: None,
            note: None,
        };
        let pick = Pick {
            date,
            team_a: "Marist".into(),
            team_b: "Rider".into(),
            side: crate::types::PickSide::TeamB,
            model_spread: 1.0,
            market_spread: -2.0,
            raw_cover_prob: 0.58,
            cover_prob: 0.58,
            win_prob: 0.45,
            tier: crate::types::Tier::Skip,
            decimal_odds: 1.91,
            kelly_fraction: 0.0,
            stake: Decimal::ZERO,
            confidence: 0.5,
            units: None,
            total_edge: None,
            reasons: Vec::new(),
        };
        let (points, unmatched) = make_fitter().matched_points(&[pick], &[grade]);
        assert!(points.is_empty());
        assert_eq!(unmatched, 1);
    }

    #[test]
    fn test_store_publishes_whole_result() {
        let store = CalibrationStore::default();
        let before = store.current();
        assert_eq!(before.sample_size, 0);

        store.publish(CalibrationResult {
            sample_size: 42,
            ..CalibrationResult::default()
        });
        assert_eq!(store.current().sample_size, 42);
        // Old snapshot is unaffected.
        assert_eq!(before.sample_size, 0);
    }
}
