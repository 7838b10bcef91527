//! Deterministic Comparator.
//!
//! Expected points per side are `possessions × off/100 × opp_def/100`, with
//! the scoring home-court bonus on the home side. The Simulator draws its
//! score means from [`Comparator::expected_points`], and the model spread
//! priced against the market is the same projected margin, so edges and
//! simulated cover probabilities always share one base. Power ratings are
//! reported alongside for ranking.

use serde::Serialize;

use super::{PossessionEstimator, RatingComposer};
use crate::config::ModelConfig;
use crate::types::{TeamRating, Venue};

/// Cheap, reproducible projection of one matchup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub possessions: f64,
    pub expected_a: f64,
    pub expected_b: f64,
    /// `expected_a − expected_b`.
    pub projected_margin: f64,
    pub projected_total: f64,
    pub power_a: f64,
    pub power_b: f64,
    /// `power_a − power_b`.
    pub power_spread: f64,
    /// Spread priced against the market: the projected margin.
    pub model_spread: f64,
    /// `model_spread − market_spread`, when a market spread was given.
    pub spread_edge: Option<f64>,
    /// `projected_total − market_total`, when a market total was given.
    pub total_edge: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct Comparator {
    composer: RatingComposer,
    possessions: PossessionEstimator,
    scoring_home_court: f64,
}

impl Comparator {
    pub fn new(config: &ModelConfig) -> Self {
        Self {
            composer: RatingComposer::new(config),
            possessions: PossessionEstimator::new(config),
            scoring_home_court: config.scoring_home_court,
        }
    }

    pub fn composer(&self) -> &RatingComposer {
        &self.composer
    }

    /// Expected points for (team A, team B), home-court included.
    pub fn expected_points(&self, a: &TeamRating, b: &TeamRating, venue: Venue) -> (f64, f64) {
        let poss = self.possessions.projected_possessions(a, b);
        let mut exp_a = poss * (self.composer.offense(a) / 100.0) * (self.composer.defense(b) / 100.0);
        let mut exp_b = poss * (self.composer.offense(b) / 100.0) * (self.composer.defense(a) / 100.0);
        if venue.a_is_home() {
            exp_a += self.scoring_home_court;
        } else if venue.b_is_home() {
            exp_b += self.scoring_home_court;
        }
        (exp_a, exp_b)
    }

    /// Model spread: team A's projected margin over team B.
    pub fn model_spread(&self, a: &TeamRating, b: &TeamRating, venue: Venue) -> f64 {
        let (exp_a, exp_b) = self.expected_points(a, b, venue);
        exp_a - exp_b
    }

    pub fn compare(
        &self,
        a: &TeamRating,
        b: &TeamRating,
        venue: Venue,
        market_spread: Option<f64>,
        market_total: Option<f64>,
    ) -> Comparison {
        let possessions = self.possessions.projected_possessions(a, b);
        let (expected_a, expected_b) = self.expected_points(a, b, venue);
        let power_a = self.composer.power_rating(a, venue.a_is_home(), None);
        let power_b = self.composer.power_rating(b, venue.b_is_home(), None);
        let projected_margin = expected_a - expected_b;
        let projected_total = expected_a + expected_b;

        Comparison {
            possessions,
            expected_a,
            expected_b,
            projected_margin,
            projected_total,
            power_a,
            power_b,
            power_spread: power_a - power_b,
            model_spread: projected_margin,
            spread_edge: market_spread.map(|m| projected_margin - m),
            total_edge: market_total.map(|m| projected_total - m),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_pair() -> (TeamRating, TeamRating) {
        (
            TeamRating::with_efficiencies("Alpha", 110.0, 95.0, 70.0),
            TeamRating::with_efficiencies("Beta", 100.0, 100.0, 70.0),
        )
    }

    #[test]
    fn test_home_favorite_projects_positive_margin() {
        let (a, b) = make_pair();
        let cmp = Comparator::new(&ModelConfig::default()).compare(&a, &b, Venue::TeamAHome, None, None);
        assert_eq!(cmp.possessions, 70.0);
        assert!((cmp.expected_a - 80.5).abs() < 1e-9);
        assert!((cmp.expected_b - 66.5).abs() < 1e-9);
        assert!(cmp.projected_margin > 0.0);
        assert!((cmp.model_spread - 14.0).abs() < 1e-9);
        assert!((cmp.power_spread - 17.5).abs() < 1e-9);
        assert!(cmp.spread_edge.is_none());
    }

    #[test]
    fn test_edges_against_market() {
        let (a, b) = make_pair();
        let cmp = Comparator::new(&ModelConfig::default()).compare(
            &a,
            &b,
            Venue::Neutral,
            Some(10.0),
            Some(150.0),
        );
        // 70 × 1.10 − 70 × 0.95
        assert!((cmp.model_spread - 10.5).abs() < 1e-9);
        assert!((cmp.power_spread - 15.0).abs() < 1e-9);
        assert!((cmp.spread_edge.unwrap() - 0.5).abs() < 1e-9);
        assert!((cmp.total_edge.unwrap() - (cmp.projected_total - 150.0)).abs() < 1e-9);
    }

    #[test]
    fn test_away_home_court_goes_to_b() {
        let (a, b) = make_pair();
        let c = Comparator::new(&ModelConfig::default());
        let (_, neutral_b) = c.expected_points(&a, &b, Venue::Neutral);
        let (_, home_b) = c.expected_points(&a, &b, Venue::TeamBHome);
        assert!((home_b - neutral_b - 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_model_spread_matches_projected_margin() {
        let (mut a, b) = make_pair();
        a.recent_form = Some(crate::types::RecentForm { wins: 8, losses: 2 });
        let c = Comparator::new(&ModelConfig::default());
        for venue in [Venue::Neutral, Venue::TeamAHome, Venue::TeamBHome] {
            let cmp = c.compare(&a, &b, venue, Some(3.0), None);
            assert_eq!(cmp.model_spread, cmp.projected_margin);
            assert_eq!(c.model_spread(&a, &b, venue), cmp.projected_margin);
            assert_eq!(cmp.spread_edge, Some(cmp.projected_margin - 3.0));
        }
    }
}
