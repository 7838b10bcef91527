//! Possession Estimator.

use crate::config::ModelConfig;
use crate::types::TeamRating;

/// Projects game possessions as the mean of both teams' tempo.
///
/// Each team's tempo falls through `pace` → `possessions_per_game` →
/// the configured default. Only finite, positive values count.
#[derive(Debug, Clone)]
pub struct PossessionEstimator {
    default_tempo: f64,
}

impl PossessionEstimator {
    pub fn new(config: &ModelConfig) -> Self {
        Self {
            default_tempo: config.default_tempo,
        }
    }

    pub fn team_tempo(&self, rating: &TeamRating) -> f64 {
        [rating.pace, rating.possessions_per_game]
            .into_iter()
            .flatten()
            .find(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(self.default_tempo)
    }

    pub fn projected_possessions(&self, a: &TeamRating, b: &TeamRating) -> f64 {
        (self.team_tempo(a) + self.team_tempo(b)) / 2.0
    }
}
