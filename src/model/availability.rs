//! Player-Availability Model.
//!
//! Turns a per-player availability vector into a signed net-rating delta,
//! and applies such a delta to a rating as a pure transform. The original
//! [`TeamRating`] is never touched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ModelConfig;
use crate::types::{PlayerRole, TeamRating};

#[derive(Debug, Clone)]
pub struct AvailabilityModel {
    primary_scorer_out: f64,
    secondary_scorer_out: f64,
    defensive_anchor_out: f64,
}

impl AvailabilityModel {
    pub fn new(config: &ModelConfig) -> Self {
        Self {
            primary_scorer_out: config.primary_scorer_out,
            secondary_scorer_out: config.secondary_scorer_out,
            defensive_anchor_out: config.defensive_anchor_out,
        }
    }

    /// Fixed penalty for a fully-out player with the given role.
    pub fn role_penalty(&self, role: PlayerRole) -> f64 {
        match role {
            PlayerRole::PrimaryScorer => self.primary_scorer_out,
            PlayerRole::SecondaryScorer => self.secondary_scorer_out,
            PlayerRole::DefensiveAnchor => self.defensive_anchor_out,
        }
    }

    /// Signed delta in net-rating points.
    ///
    /// `availability` maps player id → fraction available in `[0, 1]`;
    /// players not listed are fully available. The delta is
    /// `Σ impact × availability − Σ impact`, plus the role penalty for each
    /// role-flagged player whose availability is exactly zero.
    pub fn delta(&self, rating: &TeamRating, availability: &BTreeMap<String, f64>) -> f64 {
        let level = |id: &str| -> f64 {
            availability
                .get(id)
                .copied()
                .filter(|a| a.is_finite())
                .map(|a| a.clamp(0.0, 1.0))
                .unwrap_or(1.0)
        };

        let (current, full) = rating
            .player_impacts
            .iter()
            .filter(|(_, impact)| impact.is_finite())
            .fold((0.0, 0.0), |(cur, full), (id, impact)| {
                (cur + impact * level(id), full + impact)
            });

        let penalties: f64 = rating
            .player_roles
            .iter()
            .filter(|(id, _)| level(id) == 0.0)
            .map(|(_, role)| self.role_penalty(*role))
            .sum();

        let delta = current - full + penalties;
        debug!(team = %rating.name, delta = format!("{delta:.2}"), "Availability delta");
        delta
    }
}

/// Apply a net-rating delta to a rating, returning a new record.
///
/// Half the delta moves offense, half moves defense in the opposite
/// direction, so `off − def` shifts by exactly `delta`. An external
/// adjusted margin shifts by `delta` as well.
pub fn adjust(rating: &TeamRating, delta: f64, league_average: f64) -> TeamRating {
    let mut out = rating.clone();
    if !delta.is_finite() || delta == 0.0 {
        return out;
    }
    let half = delta / 2.0;
    let has_efficiency =
        rating.offensive_efficiency.is_some() || rating.defensive_efficiency.is_some();
    if has_efficiency || rating.adj_margin.is_none() {
        out.offensive_efficiency = Some(rating.offensive_efficiency.unwrap_or(league_average) + half);
        out.defensive_efficiency = Some(rating.defensive_efficiency.unwrap_or(league_average) - half);
    }
    if let Some(margin) = rating.adj_margin {
        out.adj_margin = Some(margin + delta);
    }
    out
}

/// Box-score line used to derive a player's impact score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerLine {
    pub id: String,
    /// Share of team possessions used while on court.
    pub usage: f64,
    /// Points produced per possession used.
    pub efficiency: f64,
    /// Share of available minutes played.
    pub minutes_share: f64,
}

/// `usage × efficiency × minutes share`; non-finite inputs count as zero.
pub fn player_impact_score(usage: f64, efficiency: f64, minutes_share: f64) -> f64 {
    let f = |v: f64| if v.is_finite() { v } else { 0.0 };
    f(usage) * f(efficiency) * f(minutes_share)
}

/// Build a player-impact map from box-score lines.
pub fn impact_scores_for(players: &[PlayerLine]) -> BTreeMap<String, f64> {
    players
        .iter()
        .map(|p| {
            (
                p.id.clone(),
                player_impact_score(p.usage, p.efficiency, p.minutes_share),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RatingComposer;

    fn make_team() -> TeamRating {
        let mut r = TeamRating::with_efficiencies("Houston", 112.0, 92.0, 64.0);
        r.player_impacts.insert("guard".into(), 4.0);
        r.player_impacts.insert("wing".into(), 2.0);
        r.player_impacts.insert("big".into(), 3.0);
        r.player_roles.insert("guard".into(), PlayerRole::PrimaryScorer);
        r.player_roles.insert("big".into(), PlayerRole::DefensiveAnchor);
        r
    }

    fn make_model() -> AvailabilityModel {
        AvailabilityModel::new(&ModelConfig::default())
    }

    #[test]
    fn test_everyone_available_is_zero() {
        let delta = make_model().delta(&make_team(), &BTreeMap::new());
        assert_eq!(delta, 0.0);
    }

    #[test]
    fn test_fractional_availability() {
        let mut avail = BTreeMap::new();
        avail.insert("wing".to_string(), 0.5);
        let delta = make_model().delta(&make_team(), &avail);
        assert!((delta + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_role_penalty_when_fully_out() {
        let mut avail = BTreeMap::new();
        avail.insert("guard".to_string(), 0.0);
        let delta = make_model().delta(&make_team(), &avail);
        // -4 impact, -2.5 primary scorer
        assert!((delta + 6.5).abs() < 1e-9);

        avail.insert("guard".to_string(), 0.2);
        let delta = make_model().delta(&make_team(), &avail);
        assert!((delta + 3.2).abs() < 1e-9);
    }

    #[test]
    fn test_adjust_is_pure_and_matches_composer() {
        let team = make_team();
        let composer = RatingComposer::new(&ModelConfig::default());
        let adjusted = adjust(&team, -4.0, 100.0);

        assert_eq!(team.offensive_efficiency, Some(112.0));
        assert_eq!(adjusted.offensive_efficiency, Some(110.0));
        assert_eq!(adjusted.defensive_efficiency, Some(94.0));
        assert!(
            (composer.power_rating(&adjusted, false, None)
                - composer.power_rating(&team, false, Some(-4.0)))
            .abs()
                < 1e-9
        );
    }

    #[test]
    fn test_adjust_margin_only_rating() {
        let mut team = TeamRating::named("Margin");
        team.adj_margin = Some(5.0);
        let adjusted = adjust(&team, -2.0, 100.0);
        assert_eq!(adjusted.adj_margin, Some(3.0));
        assert_eq!(adjusted.offensive_efficiency, None);
    }

    #[test]
    fn test_player_impact_score() {
        assert!((player_impact_score(0.28, 1.1, 0.85) - 0.2618).abs() < 1e-9);
        assert_eq!(player_impact_score(f64::NAN, 1.0, 1.0), 0.0);

        let map = impact_scores_for(&[PlayerLine {
            id: "p1".into(),
            usage: 0.5,
            efficiency: 1.0,
            minutes_share: 0.5,
        }]);
        assert_eq!(map.get("p1"), Some(&0.25));
    }
}
