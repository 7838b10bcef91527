//! Edge & qualification.
//!
//! Spreads use the margin convention throughout: a spread is team A's
//! expected margin, positive when team A is favored. Signed edges are
//! `model − market`, so a positive spread edge favors team A and a negative
//! one favors team B. Rule qualification looks at the edge magnitude; the
//! sign only picks the side.

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::EdgeConfig;
use crate::types::{PickSide, Tier};

// ---------------------------------------------------------------------------
// Odds conversions
// ---------------------------------------------------------------------------

/// American odds → implied probability. `None` for zero odds.
///
/// `-110` → 0.5238, `+150` → 0.40.
pub fn american_to_implied(odds: i32) -> Option<f64> {
    if odds == 0 {
        return None;
    }
    let o = odds as f64;
    if odds < 0 {
        Some(-o / (-o + 100.0))
    } else {
        Some(100.0 / (o + 100.0))
    }
}

/// American odds → decimal odds (stake included). `None` for zero odds.
pub fn american_to_decimal(odds: i32) -> Option<f64> {
    if odds == 0 {
        return None;
    }
    let o = odds as f64;
    if odds < 0 {
        Some(1.0 + 100.0 / -o)
    } else {
        Some(1.0 + o / 100.0)
    }
}

/// Team A's no-vig win probability from a moneyline pair.
///
/// With both sides quoted the overround is removed proportionally; with
/// only team A's price the raw implied probability is returned.
pub fn implied_win_prob(moneyline_a: Option<i32>, moneyline_b: Option<i32>) -> Option<f64> {
    let pa = moneyline_a.and_then(american_to_implied)?;
    match moneyline_b.and_then(american_to_implied) {
        Some(pb) if pa + pb > 0.0 => Some(pa / (pa + pb)),
        _ => Some(pa),
    }
}

// ---------------------------------------------------------------------------
// Assessment
// ---------------------------------------------------------------------------

/// Result of running both qualification rules on one matchup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeAssessment {
    pub spread_edge: Option<f64>,
    pub total_edge: Option<f64>,
    /// Side the assessment was made for.
    pub side: PickSide,
    /// Spread edge toward `side` at or above the spread threshold, or
    /// `|total edge| ≥ total threshold`.
    pub rule_qualified: bool,
    /// Cover probability at or above the loose floor.
    pub probability_qualified: bool,
    /// Cover probability at or above the relaxed tier bound.
    pub strong_signal: bool,
    pub tier: Tier,
    pub reasons: Vec<String>,
}

impl EdgeAssessment {
    /// Union of the rule and probability qualifiers.
    pub fn qualified(&self) -> bool {
        self.rule_qualified || self.probability_qualified
    }
}

/// Model-vs-market divergence flagged by the sanity check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketWarning {
    pub model_win_prob: f64,
    pub implied_win_prob: f64,
    pub divergence: f64,
}

#[derive(Debug, Clone)]
pub struct EdgeEngine {
    config: EdgeConfig,
}

impl EdgeEngine {
    pub fn new(config: EdgeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EdgeConfig {
        &self.config
    }

    /// `model − market`.
    pub fn spread_edge(model_spread: f64, market_spread: f64) -> f64 {
        model_spread - market_spread
    }

    /// `model − market`; positive leans over.
    pub fn total_edge(model_total: f64, market_total: f64) -> f64 {
        model_total - market_total
    }

    /// Points-threshold rule over whichever edges are present.
    pub fn rule_qualifies(&self, spread_edge: Option<f64>, total_edge: Option<f64>) -> bool {
        let spread = spread_edge
            .filter(|e| e.is_finite())
            .is_some_and(|e| e.abs() >= self.config.spread_edge_threshold);
        let total = total_edge
            .filter(|e| e.is_finite())
            .is_some_and(|e| e.abs() >= self.config.total_edge_threshold);
        spread || total
    }

    /// Probability-threshold rule; non-finite input never qualifies.
    pub fn probability_qualifies(&self, cover_prob: f64) -> bool {
        cover_prob.is_finite() && cover_prob >= self.config.min_cover_prob
    }

    /// Tier from cover probability alone. Both bounds are inclusive.
    pub fn classify_tier(&self, cover_prob: f64) -> Tier {
        if !cover_prob.is_finite() {
            Tier::Skip
        } else if cover_prob >= self.config.strict_min {
            Tier::Strict
        } else if cover_prob >= self.config.relaxed_min {
            Tier::Relaxed
        } else {
            Tier::Skip
        }
    }

    /// Assess with the side taken from the sign of the spread edge.
    pub fn assess(
        &self,
        spread_edge: Option<f64>,
        total_edge: Option<f64>,
        cover_prob: f64,
    ) -> EdgeAssessment {
        let side = match spread_edge {
            Some(e) if e < 0.0 => PickSide::TeamB,
            _ => PickSide::TeamA,
        };
        self.assess_for(side, spread_edge, total_edge, cover_prob)
    }

    /// Assess a pick on `side`, where `cover_prob` is that side's cover
    /// probability. The spread rule only counts an edge pointing toward
    /// `side`, so a points edge can never qualify the other team.
    pub fn assess_for(
        &self,
        side: PickSide,
        spread_edge: Option<f64>,
        total_edge: Option<f64>,
        cover_prob: f64,
    ) -> EdgeAssessment {
        let backed_edge = spread_edge.filter(|e| e.is_finite()).map(|e| match side {
            PickSide::TeamA => e,
            PickSide::TeamB => -e,
        });
        let spread_rule = backed_edge.is_some_and(|e| e >= self.config.spread_edge_threshold);
        let total_rule = self.rule_qualifies(None, total_edge);
        let rule_qualified = spread_rule || total_rule;
        let probability_qualified = self.probability_qualifies(cover_prob);
        let strong_signal = cover_prob.is_finite() && cover_prob >= self.config.relaxed_min;
        let tier = self.classify_tier(cover_prob);

        let mut reasons = Vec::new();
        if let (true, Some(e)) = (spread_rule, spread_edge) {
            reasons.push(format!(
                "spread edge {e:+.1} beyond {:.1}",
                self.config.spread_edge_threshold
            ));
        }
        if let Some(e) = total_edge.filter(|e| e.abs() >= self.config.total_edge_threshold) {
            let lean = if e > 0.0 { "over" } else { "under" };
            reasons.push(format!("total edge {e:+.1} ({lean})"));
        }
        if probability_qualified {
            reasons.push(format!("cover probability {:.1}%", cover_prob * 100.0));
        }

        debug!(
            spread_edge = ?spread_edge,
            total_edge = ?total_edge,
            cover = format!("{:.1}%", cover_prob * 100.0),
            rule_qualified,
            probability_qualified,
            tier = %tier,
            "Edge assessed"
        );

        EdgeAssessment {
            spread_edge,
            total_edge,
            side,
            rule_qualified,
            probability_qualified,
            strong_signal,
            tier,
            reasons,
        }
    }

    /// Compare model win probability with the moneyline-implied one.
    ///
    /// Returns a warning when they diverge by more than the configured
    /// margin. This never blocks a pick.
    pub fn market_sanity(
        &self,
        model_win_prob: f64,
        moneyline_a: Option<i32>,
        moneyline_b: Option<i32>,
    ) -> Option<MarketWarning> {
        let implied = implied_win_prob(moneyline_a, moneyline_b)?;
        if !model_win_prob.is_finite() {
            return None;
        }
        let divergence = (model_win_prob - implied).abs();
        if divergence <= self.config.market_divergence {
            return None;
        }
        warn!(
            model = format!("{:.1}%", model_win_prob * 100.0),
            implied = format!("{:.1}%", implied * 100.0),
            divergence = format!("{:.1}pp", divergence * 100.0),
            "Model diverges from moneyline, possible miscalibration"
        );
        Some(MarketWarning {
            model_win_prob,
            implied_win_prob: implied,
            divergence,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
