//! Stochastic Simulator.
//!
//! Draws `N` independent normal score pairs around the Comparator's expected
//! points. Means and variances are accumulated in one pass (Welford), and the
//! full sample sequences are kept so callers can price any line afterwards.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use tracing::debug;

use super::{adjust, Comparator};
use crate::config::{ModelConfig, SimulationConfig};
use crate::types::{clamp_probability, PickSide, TeamRating, Venue};

/// Output of one simulation call. Never mutated after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    /// Sampled margins (team A − team B), in draw order.
    pub margins: Vec<f64>,
    /// Sampled totals, in draw order.
    pub totals: Vec<f64>,
    pub mean_margin: f64,
    pub sd_margin: f64,
    pub mean_total: f64,
    pub sd_total: f64,
    /// Fraction of samples with a positive margin, clamped into (0, 1).
    pub win_prob: f64,
}

impl SimulationResult {
    /// Probability that team A's margin beats `line` (margin convention).
    pub fn cover_probability(&self, line: f64) -> f64 {
        fraction(&self.margins, |m| m > line)
    }

    /// Probability that team B covers: margins at or below `line`.
    pub fn opponent_cover_probability(&self, line: f64) -> f64 {
        fraction(&self.margins, |m| m <= line)
    }

    /// Probability that the game total goes over `line`.
    pub fn over_probability(&self, line: f64) -> f64 {
        fraction(&self.totals, |t| t > line)
    }

    pub fn len(&self) -> usize {
        self.margins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.margins.is_empty()
    }
}

fn fraction(samples: &[f64], pred: impl Fn(f64) -> bool) -> f64 {
    if samples.is_empty() {
        return 0.5;
    }
    let hits = samples.iter().filter(|v| pred(**v)).count();
    clamp_probability(hits as f64 / samples.len() as f64)
}

/// Running mean/variance accumulator.
#[derive(Default)]
struct Welford {
    n: u64,
    mean: f64,
    m2: f64,
}

impl Welford {
    fn push(&mut self, x: f64) {
        self.n += 1;
        let d = x - self.mean;
        self.mean += d / self.n as f64;
        self.m2 += d * (x - self.mean);
    }

    fn sd(&self) -> f64 {
        if self.n < 2 {
            0.0
        } else {
            (self.m2 / (self.n - 1) as f64).sqrt()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Simulator {
    comparator: Comparator,
    samples: usize,
    score_sd: f64,
    seed: Option<u64>,
    default_player_impact: f64,
    league_average: f64,
}

impl Simulator {
    pub fn new(model: &ModelConfig, sim: &SimulationConfig) -> Self {
        Self {
            comparator: Comparator::new(model),
            samples: sim.samples.max(1),
            score_sd: sim.score_sd,
            seed: sim.seed,
            default_player_impact: model.default_player_impact,
            league_average: model.league_average_efficiency,
        }
    }

    /// Override the sample count. A caller with a time budget caps `n` here.
    pub fn with_samples(mut self, n: usize) -> Self {
        self.samples = n.max(1);
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    pub fn comparator(&self) -> &Comparator {
        &self.comparator
    }

    /// Simulate with a fresh generator (seeded if configured).
    pub fn simulate(&self, a: &TeamRating, b: &TeamRating, venue: Venue) -> SimulationResult {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.simulate_with_rng(a, b, venue, &mut rng)
    }

    /// Simulate with a caller-supplied generator.
    pub fn simulate_with_rng<R: Rng>(
        &self,
        a: &TeamRating,
        b: &TeamRating,
        venue: Venue,
        rng: &mut R,
    ) -> SimulationResult {
        let (mean_a, mean_b) = self.comparator.expected_points(a, b, venue);
        let sd = if self.score_sd.is_finite() && self.score_sd >= 0.0 {
            self.score_sd
        } else {
            0.0
        };

        let mut margins = Vec::with_capacity(self.samples);
        let mut totals = Vec::with_capacity(self.samples);
        let mut margin_acc = Welford::default();
        let mut total_acc = Welford::default();
        let mut wins = 0usize;

        for _ in 0..self.samples {
            let za: f64 = rng.sample(StandardNormal);
            let zb: f64 = rng.sample(StandardNormal);
            let score_a = mean_a + sd * za;
            let score_b = mean_b + sd * zb;
            let margin = score_a - score_b;
            let total = score_a + score_b;
            if margin > 0.0 {
                wins += 1;
            }
            margin_acc.push(margin);
            total_acc.push(total);
            margins.push(margin);
            totals.push(total);
        }

        let win_prob = clamp_probability(wins as f64 / self.samples as f64);
        debug!(
            team_a = %a.name,
            team_b = %b.name,
            samples = self.samples,
            mean_margin = format!("{:.2}", margin_acc.mean),
            win_prob = format!("{:.3}", win_prob),
            "Simulation complete"
        );

        SimulationResult {
            margins,
            totals,
            mean_margin: margin_acc.mean,
            sd_margin: margin_acc.sd(),
            mean_total: total_acc.mean,
            sd_total: total_acc.sd(),
            win_prob,
        }
    }

    /// What-if: re-simulate with `player` removed from one side.
    ///
    /// The player's impact comes from that team's impact map, or the
    /// configured default when the player isn't listed. Neither input rating
    /// is modified.
    pub fn simulate_without_player(
        &self,
        a: &TeamRating,
        b: &TeamRating,
        venue: Venue,
        side: PickSide,
        player: &str,
    ) -> SimulationResult {
        let team = match side {
            PickSide::TeamA => a,
            PickSide::TeamB => b,
        };
        let impact = self.player_impact(team, player);
        let adjusted = adjust(team, -impact, self.league_average);
        debug!(team = %team.name, player, impact, "What-if: player out");
        match side {
            PickSide::TeamA => self.simulate(&adjusted, b, venue),
            PickSide::TeamB => self.simulate(a, &adjusted, venue),
        }
    }

    /// Point impact of `player` on `team`, with the configured fallback.
    pub fn player_impact(&self, team: &TeamRating, player: &str) -> f64 {
        team.player_impacts
            .get(player)
            .copied()
            .filter(|v| v.is_finite())
            .unwrap_or(self.default_player_impact)
    }
}
