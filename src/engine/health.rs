//! Health monitor: rolling performance checks over graded picks.
//!
//! Compares a recent window of graded days against a longer baseline and
//! raises alerts for hit-rate regressions, ROI regressions, systematic
//! overconfidence, volatility and thin volume. Alerts are regenerated on
//! every run and never persisted as state.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::*;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::HealthConfig;
use crate::types::{GradeRecord, HealthAlert, Severity};

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// One graded day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyMetrics {
    pub date: NaiveDate,
    pub picks: usize,
    pub covers: usize,
    pub hit_rate: f64,
    pub stake: Decimal,
    pub profit: Decimal,
    /// Profit over stake; 0 on a day with nothing staked.
    pub roi: f64,
}

/// Aggregate over the last `days` graded days.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WindowMetrics {
    pub days: usize,
    pub picks: usize,
    pub hit_rate: f64,
    pub roi: f64,
    /// Standard deviation of daily ROI.
    pub roi_sd: f64,
    pub avg_daily_picks: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub generated_at: DateTime<Utc>,
    pub latest: Option<DailyMetrics>,
    pub recent: WindowMetrics,
    pub baseline: WindowMetrics,
    /// Largest peak-to-trough fall of cumulative profit.
    pub max_drawdown: Decimal,
    /// Most severe first.
    pub alerts: Vec<HealthAlert>,
}

impl HealthReport {
    pub fn worst(&self) -> Option<Severity> {
        self.alerts.iter().map(|a| a.severity).max()
    }
}

fn ratio(num: Decimal, den: Decimal) -> f64 {
    if den.is_zero() {
        0.0
    } else {
        (num / den).to_f64().unwrap_or(0.0)
    }
}

// ---------------------------------------------------------------------------
// Monitor
// ---------------------------------------------------------------------------

pub struct HealthMonitor {
    config: HealthConfig,
}

impl HealthMonitor {
    pub fn new(config: HealthConfig) -> Self {
        Self { config }
    }

    /// Per-day metrics from final grade records, oldest first.
    pub fn daily_metrics(&self, grades: &[GradeRecord]) -> Vec<DailyMetrics> {
        let mut by_day: BTreeMap<NaiveDate, (usize, usize, Decimal, Decimal)> = BTreeMap::new();
        for g in grades.iter().filter(|g| !g.is_placeholder()) {
            let day = by_day
                .entry(g.date)
                .or_insert((0, 0, Decimal::ZERO, Decimal::ZERO));
            day.0 += 1;
            day.1 += usize::from(g.covered);
            day.2 += g.stake;
            day.3 += g.profit;
        }

        by_day
            .into_iter()
            .map(|(date, (picks, covers, stake, profit))| DailyMetrics {
                date,
                picks,
                covers,
                hit_rate: covers as f64 / picks as f64,
                stake,
                profit,
                roi: ratio(profit, stake),
            })
            .collect()
    }

    /// Metrics over the last `days` entries of `daily`.
    pub fn window(&self, daily: &[DailyMetrics], days: usize) -> WindowMetrics {
        let start = daily.len().saturating_sub(days);
        let slice = &daily[start..];
        if slice.is_empty() {
            return WindowMetrics::default();
        }

        let picks: usize = slice.iter().map(|d| d.picks).sum();
        let covers: usize = slice.iter().map(|d| d.covers).sum();
        let stake: Decimal = slice.iter().map(|d| d.stake).sum();
        let profit: Decimal = slice.iter().map(|d| d.profit).sum();

        let n = slice.len() as f64;
        let mean_roi = slice.iter().map(|d| d.roi).sum::<f64>() / n;
        let roi_sd = if slice.len() < 2 {
            0.0
        } else {
            (slice.iter().map(|d| (d.roi - mean_roi).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
        };

        WindowMetrics {
            days: slice.len(),
            picks,
            hit_rate: if picks == 0 { 0.0 } else { covers as f64 / picks as f64 },
            roi: ratio(profit, stake),
            roi_sd,
            avg_daily_picks: picks as f64 / n,
        }
    }

    /// Alerts for a recent window against its baseline.
    pub fn alerts(&self, recent: &WindowMetrics, baseline: &WindowMetrics) -> Vec<HealthAlert> {
        let c = &self.config;
        let mut alerts = Vec::new();
        let have_rates = recent.picks > 0 && baseline.picks > 0;

        if have_rates
            && recent.hit_rate < c.break_even_hit_rate
            && baseline.hit_rate > c.regression_baseline
        {
            alerts.push(HealthAlert {
                severity: Severity::Warning,
                metric: "hit_rate".into(),
                message: format!(
                    "Recent hit rate {:.1}% below break-even {:.1}% (baseline {:.1}%)",
                    recent.hit_rate * 100.0,
                    c.break_even_hit_rate * 100.0,
                    baseline.hit_rate * 100.0
                ),
                current_value: recent.hit_rate,
                threshold: c.break_even_hit_rate,
            });
        }

        if have_rates && recent.roi < c.roi_floor && baseline.roi > c.roi_baseline {
            alerts.push(HealthAlert {
                severity: Severity::Critical,
                metric: "roi".into(),
                message: format!(
                    "Recent ROI {:.1}% turned negative after baseline {:.1}%",
                    recent.roi * 100.0,
                    baseline.roi * 100.0
                ),
                current_value: recent.roi,
                threshold: c.roi_floor,
            });
        }

        if have_rates
            && recent.hit_rate < c.mismatch_recent_hit_rate
            && baseline.hit_rate < c.mismatch_baseline_hit_rate
        {
            alerts.push(HealthAlert {
                severity: Severity::Critical,
                metric: "confidence_mismatch".into(),
                message: format!(
                    "Hit rate persistently low ({:.1}% recent, {:.1}% baseline): probabilities look overconfident",
                    recent.hit_rate * 100.0,
                    baseline.hit_rate * 100.0
                ),
                current_value: recent.hit_rate,
                threshold: c.mismatch_recent_hit_rate,
            });
        }

        if recent.roi_sd > c.max_roi_sd {
            alerts.push(HealthAlert {
                severity: Severity::Warning,
                metric: "roi_volatility".into(),
                message: format!(
                    "Daily ROI standard deviation {:.1}% exceeds {:.1}%",
                    recent.roi_sd * 100.0,
                    c.max_roi_sd * 100.0
                ),
                current_value: recent.roi_sd,
                threshold: c.max_roi_sd,
            });
        }

        if recent.avg_daily_picks < c.min_daily_picks {
            alerts.push(HealthAlert {
                severity: Severity::Info,
                metric: "volume".into(),
                message: format!(
                    "Average {:.1} picks/day is below {:.0} needed for significance",
                    recent.avg_daily_picks, c.min_daily_picks
                ),
                current_value: recent.avg_daily_picks,
                threshold: c.min_daily_picks,
            });
        }

        alerts.sort_by(|a, b| b.severity.cmp(&a.severity));
        alerts
    }

    /// Full health check over the grade history.
    pub fn check(&self, grades: &[GradeRecord]) -> HealthReport {
        let daily = self.daily_metrics(grades);
        let recent = self.window(&daily, self.config.recent_days);
        let baseline = self.window(&daily, self.config.baseline_days);
        let alerts = self.alerts(&recent, &baseline);

        for alert in &alerts {
            match alert.severity {
                Severity::Critical => error!(metric = %alert.metric, "{}", alert.message),
                Severity::Warning => warn!(metric = %alert.metric, "{}", alert.message),
                Severity::Info => info!(metric = %alert.metric, "{}", alert.message),
            }
        }
        info!(
            days = daily.len(),
            recent_hit = format!("{:.1}%", recent.hit_rate * 100.0),
            recent_roi = format!("{:.1}%", recent.roi * 100.0),
            alerts = alerts.len(),
            "Health check complete"
        );

        HealthReport {
            generated_at: Utc::now(),
            latest: daily.last().cloned(),
            max_drawdown: max_drawdown(&daily),
            recent,
            baseline,
            alerts,
        }
    }
}

/// Largest peak-to-trough fall of the cumulative profit curve (from zero).
pub fn max_drawdown(daily: &[DailyMetrics]) -> Decimal {
    let mut cumulative = Decimal::ZERO;
    let mut peak = Decimal::ZERO;
    let mut worst = Decimal::ZERO;
    for day in daily {
        cumulative += day.profit;
        peak = peak.max(cumulative);
        worst = worst.max(peak - cumulative);
    }
    worst
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
