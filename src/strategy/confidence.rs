//! Confidence scoring and unit sizing.
//!
//! `confidence = w_edge·min(|edge|/E, 1) + w_sim·cover + w_align·max(0, 1 − |edge|/A)
//! + w_avail·certainty`, clamped into (0, 1). The alignment term rewards picks
//! that don't stray too far from the market.

use crate::config::ConfidenceConfig;
use crate::types::clamp_probability;

/// Confidence bands → unit size, highest first.
const UNIT_BANDS: &[(f64, f64)] = &[(0.90, 1.5), (0.85, 1.25), (0.80, 1.0), (0.75, 0.75)];

#[derive(Debug, Clone)]
pub struct ConfidenceScorer {
    config: ConfidenceConfig,
}

impl ConfidenceScorer {
    pub fn new(config: ConfidenceConfig) -> Self {
        Self { config }
    }

    /// Score one pick.
    ///
    /// `availability_certainty` is 1.0 when every listed player's status is
    /// definite (fully in or fully out) and lower when statuses are fractional.
    pub fn score(&self, spread_edge: f64, cover_prob: f64, availability_certainty: f64) -> f64 {
        let c = &self.config;
        let edge = if spread_edge.is_finite() { spread_edge.abs() } else { 0.0 };
        let edge_signal = if c.edge_normalizer > 0.0 {
            (edge / c.edge_normalizer).min(1.0)
        } else {
            0.0
        };
        let alignment = if c.alignment_normalizer > 0.0 {
            (1.0 - edge / c.alignment_normalizer).max(0.0)
        } else {
            0.0
        };
        let sim = if cover_prob.is_finite() { cover_prob.clamp(0.0, 1.0) } else { 0.0 };
        let certainty = if availability_certainty.is_finite() {
            availability_certainty.clamp(0.0, 1.0)
        } else {
            1.0
        };

        clamp_probability(
            c.edge_weight * edge_signal
                + c.simulation_weight * sim
                + c.alignment_weight * alignment
                + c.availability_weight * certainty,
        )
    }
}

/// Unit size for a confidence level, `None` below the lowest band.
pub fn units_for(confidence: f64) -> Option<f64> {
    UNIT_BANDS
        .iter()
        .find(|(floor, _)| confidence >= *floor)
        .map(|(_, units)| *units)
}

/// Share of listed availability entries that are definite (0 or 1).
pub fn availability_certainty<'a>(levels: impl IntoIterator<Item = &'a f64>) -> f64 {
    let (definite, total) = levels.into_iter().fold((0usize, 0usize), |(d, t), a| {
        let is_definite = *a <= 0.0 || *a >= 1.0;
        (d + usize::from(is_definite), t + 1)
    });
    if total == 0 {
        1.0
    } else {
        definite as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_scorer() -> ConfidenceScorer {
        ConfidenceScorer::new(ConfidenceConfig::default())
    }

    #[test]
    fn test_score_components() {
        let s = make_scorer();
        // edge 2.5: 0.4·0.5 + 0.3·0.8 + 0.2·0.75 + 0.1·1 = 0.69
        assert!((s.score(2.5, 0.8, 1.0) - 0.69).abs() < 1e-9);
        // sign of the edge doesn't matter
        assert!((s.score(-2.5, 0.8, 1.0) - 0.69).abs() < 1e-9);
    }

    #[test]
    fn test_large_edge_loses_alignment() {
        let s = make_scorer();
        // edge 12: 0.4 + 0.3·0.9 + 0 + 0.1 = 0.77
        assert!((s.score(12.0, 0.9, 1.0) - 0.77).abs() < 1e-9);
    }

    #[test]
    fn test_score_stays_in_open_interval() {
        let s = make_scorer();
        let c = s.score(f64::NAN, f64::NAN, f64::NAN);
        assert!(c > 0.0 && c < 1.0);
    }

    #[test]
    fn test_unit_bands() {
        assert_eq!(units_for(0.93), Some(1.5));
        assert_eq!(units_for(0.90), Some(1.5));
        assert_eq!(units_for(0.86), Some(1.25));
        assert_eq!(units_for(0.80), Some(1.0));
        assert_eq!(units_for(0.76), Some(0.75));
        assert_eq!(units_for(0.70), None);
    }

    #[test]
    fn test_availability_certainty() {
        assert_eq!(availability_certainty(std::iter::empty()), 1.0);
        assert_eq!(availability_certainty(&[0.0, 1.0]), 1.0);
        assert_eq!(availability_certainty(&[0.0, 0.5]), 0.5);
    }
}
