//! Rating Composer: one scalar power rating per team per game.

use crate::config::ModelConfig;
use crate::types::TeamRating;

/// Pure power-rating function over a [`TeamRating`].
///
/// `power = (off − def) + home_court + form × scale + availability_delta`
///
/// Missing or non-finite efficiencies fall back to the league average from
/// [`ModelConfig`]. When a team has neither efficiency but does carry an
/// external adjusted margin, that margin stands in for `off − def`.
#[derive(Debug, Clone)]
pub struct RatingComposer {
    league_average: f64,
    home_court: f64,
    form_scale: f64,
}

impl RatingComposer {
    pub fn new(config: &ModelConfig) -> Self {
        Self {
            league_average: config.league_average_efficiency,
            home_court: config.rating_home_court,
            form_scale: config.recent_form_scale,
        }
    }

    /// Offensive efficiency with the league-average fallback applied.
    pub fn offense(&self, rating: &TeamRating) -> f64 {
        finite_or(rating.offensive_efficiency, self.league_average)
    }

    /// Defensive efficiency with the league-average fallback applied.
    pub fn defense(&self, rating: &TeamRating) -> f64 {
        finite_or(rating.defensive_efficiency, self.league_average)
    }

    /// Net efficiency before situational terms.
    pub fn base(&self, rating: &TeamRating) -> f64 {
        let has_off = rating.offensive_efficiency.is_some_and(f64::is_finite);
        let has_def = rating.defensive_efficiency.is_some_and(f64::is_finite);
        if !has_off && !has_def {
            if let Some(margin) = rating.adj_margin.filter(|m| m.is_finite()) {
                return margin;
            }
        }
        self.offense(rating) - self.defense(rating)
    }

    pub fn power_rating(
        &self,
        rating: &TeamRating,
        is_home: bool,
        availability_delta: Option<f64>,
    ) -> f64 {
        let home = if is_home { self.home_court } else { 0.0 };
        let form = rating
            .recent_form
            .map(|f| f.net() as f64 * self.form_scale)
            .unwrap_or(0.0);
        let delta = availability_delta.filter(|d| d.is_finite()).unwrap_or(0.0);
        self.base(rating) + home + form + delta
    }
}

fn finite_or(value: Option<f64>, fallback: f64) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(fallback)
}
