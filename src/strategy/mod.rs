//! Strategy engine: edge detection, calibration, Kelly sizing and confidence.

pub mod confidence;
pub mod edge;
pub mod kelly;

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backtest::CalibrationStore;
use crate::config::EngineConfig;
use crate::identity::TeamResolver;
use crate::model::{adjust, AvailabilityModel, Comparison, Simulator};
use crate::types::{
    clamp_probability, EngineError, Matchup, Pick, PickSide, TeamRating, Tier, Venue,
};
use confidence::{availability_certainty, units_for, ConfidenceScorer};
use edge::{american_to_decimal, EdgeAssessment, EdgeEngine, MarketWarning};
use kelly::{KellyCalculator, SizedStake};

/// Player id → availability in `[0, 1]` for one team.
pub type TeamAvailability = BTreeMap<String, f64>;

/// Canonical team name → that team's availability vector.
pub type AvailabilityReport = HashMap<String, TeamAvailability>;

/// Availability for both sides of one matchup.
#[derive(Debug, Clone, Default)]
pub struct GameAvailability {
    pub team_a: TeamAvailability,
    pub team_b: TeamAvailability,
}

// ---------------------------------------------------------------------------
// Decision log
// ---------------------------------------------------------------------------

/// Record of every decision made (or skipped) during a slate pass,
/// including the games passed on and why.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum DecisionRecord {
    /// At least one qualification rule passed; a pick was produced.
    Qualified { pick: Pick },
    /// Neither the points rule nor the probability rule passed.
    NotQualified {
        game: String,
        spread_edge: f64,
        cover_prob: f64,
    },
    MissingTeam { game: String, team: String },
    MissingMarket { game: String },
    InvalidOdds { game: String, detail: String },
}

/// Counts for one slate, so data-quality problems stay visible.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SlateSummary {
    pub games: usize,
    pub qualified: usize,
    pub strict: usize,
    pub relaxed: usize,
    /// Qualified picks with a positive stake.
    pub staked: usize,
    pub not_qualified: usize,
    pub missing_team: usize,
    pub missing_market: usize,
    pub invalid_odds: usize,
    pub total_stake: Decimal,
}

#[derive(Debug, Clone)]
pub struct SlateEvaluation {
    /// Qualified picks, highest confidence first.
    pub picks: Vec<Pick>,
    pub decisions: Vec<DecisionRecord>,
    pub summary: SlateSummary,
}

/// Full output of evaluating one matchup.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub pick: Pick,
    pub assessment: EdgeAssessment,
    pub comparison: Comparison,
    pub market_warning: Option<MarketWarning>,
}

impl Evaluation {
    pub fn qualified(&self) -> bool {
        self.assessment.qualified()
    }
}

// ---------------------------------------------------------------------------
// Player-out analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerOutRecommendation {
    /// Team to back (the missing player's opponent).
    pub back: String,
    pub cover_prob: f64,
    pub decimal_odds: f64,
    pub stake: SizedStake,
}

/// Effect of one player's absence, from the player's team's perspective.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerOutAnalysis {
    pub team: String,
    pub opponent: String,
    pub player: String,
    pub impact: f64,
    pub baseline_mean: f64,
    pub new_mean: f64,
    /// `new_mean − baseline_mean`.
    pub expected_line_shift: f64,
    pub observed_market_shift: Option<f64>,
    /// Market moved the right way but not far enough.
    pub market_underreaction: bool,
    /// Probability the opponent covers the current market spread.
    pub opponent_cover_prob: f64,
    pub recommendation: Option<PlayerOutRecommendation>,
}

fn sign(x: f64) -> i8 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Pipelines compare → simulate → edge → calibrate → stake → confidence.
///
/// Build once from [`EngineConfig`]; the calibration handle may be shared
/// with whatever republishes fits.
pub struct PickEngine {
    simulator: Simulator,
    edge: EdgeEngine,
    kelly: KellyCalculator,
    confidence: ConfidenceScorer,
    availability: AvailabilityModel,
    calibration: CalibrationStore,
    league_average: f64,
}

impl PickEngine {
    pub fn new(config: &EngineConfig, calibration: CalibrationStore) -> Self {
        Self {
            simulator: Simulator::new(&config.model, &config.simulation),
            edge: EdgeEngine::new(config.edge.clone()),
            kelly: KellyCalculator::new(config.staking.clone()),
            confidence: ConfidenceScorer::new(config.confidence.clone()),
            availability: AvailabilityModel::new(&config.model),
            calibration,
            league_average: config.model.league_average_efficiency,
        }
    }

    pub fn simulator(&self) -> &Simulator {
        &self.simulator
    }

    pub fn edge_engine(&self) -> &EdgeEngine {
        &self.edge
    }

    pub fn calibration(&self) -> &CalibrationStore {
        &self.calibration
    }

    /// Evaluate one matchup into a pick oriented toward the backed side.
    ///
    /// Fails only for record-level problems (missing market line, unusable
    /// odds); [`PickEngine::evaluate_slate`] turns those into log entries.
    pub fn evaluate(
        &self,
        matchup: &Matchup,
        a: &TeamRating,
        b: &TeamRating,
        availability: &GameAvailability,
    ) -> Result<Evaluation, EngineError> {
        let label = matchup.label();
        let market_spread = matchup
            .market_spread
            .filter(|s| s.is_finite())
            .ok_or_else(|| EngineError::MissingMarket(label.clone()))?;
        let odds = matchup
            .spread_odds
            .unwrap_or(self.edge.config().default_spread_odds);
        let decimal_odds = american_to_decimal(odds)
            .ok_or_else(|| EngineError::InvalidOdds(format!("{odds} for {label}")))?;

        let rating_a = self.with_availability(a, &availability.team_a);
        let rating_b = self.with_availability(b, &availability.team_b);

        let comparison = self.simulator.comparator().compare(
            &rating_a,
            &rating_b,
            matchup.venue,
            Some(market_spread),
            matchup.market_total,
        );
        let sim = self.simulator.simulate(&rating_a, &rating_b, matchup.venue);

        // Back whichever side the simulation prices to cover more often.
        let spread_edge = comparison.spread_edge.unwrap_or(0.0);
        let cover_a = sim.cover_probability(market_spread);
        let cover_b = sim.opponent_cover_probability(market_spread);
        let (side, raw_cover_prob) = if cover_b > cover_a {
            (PickSide::TeamB, cover_b)
        } else {
            (PickSide::TeamA, cover_a)
        };
        let cover_prob = self.calibration.current().apply(raw_cover_prob);

        let assessment =
            self.edge
                .assess_for(side, Some(spread_edge), comparison.total_edge, cover_prob);
        let market_warning =
            self.edge
                .market_sanity(sim.win_prob, matchup.moneyline_a, matchup.moneyline_b);

        let sized = if assessment.tier == Tier::Skip {
            SizedStake::zero()
        } else {
            self.kelly.size(cover_prob, decimal_odds)
        };

        let certainty =
            availability_certainty(availability.team_a.values().chain(availability.team_b.values()));
        let confidence = self.confidence.score(spread_edge, cover_prob, certainty);

        let mut reasons = assessment.reasons.clone();
        if let Some(w) = &market_warning {
            reasons.push(format!(
                "model win {:.1}% vs market {:.1}%",
                w.model_win_prob * 100.0,
                w.implied_win_prob * 100.0
            ));
        }

        let (team_a, team_b, model_spread, oriented_market, win_prob) = match side {
            PickSide::TeamA => (
                matchup.team_a.clone(),
                matchup.team_b.clone(),
                comparison.model_spread,
                market_spread,
                sim.win_prob,
            ),
            PickSide::TeamB => (
                matchup.team_b.clone(),
                matchup.team_a.clone(),
                -comparison.model_spread,
                -market_spread,
                clamp_probability(1.0 - sim.win_prob),
            ),
        };

        let pick = Pick {
            date: matchup.date,
            team_a,
            team_b,
            side,
            model_spread,
            market_spread: oriented_market,
            raw_cover_prob,
            cover_prob,
            win_prob,
            tier: assessment.tier,
            decimal_odds,
            kelly_fraction: sized.kelly_fraction,
            stake: sized.stake,
            confidence,
            units: units_for(confidence),
            total_edge: comparison.total_edge,
            reasons,
        };

        if assessment.qualified() {
            info!(
                game = %label,
                backing = %pick.team_a,
                edge = format!("{:+.1}", spread_edge),
                cover = format!("{:.1}%", cover_prob * 100.0),
                tier = %pick.tier,
                stake = %pick.stake,
                "Edge detected"
            );
        } else {
            debug!(
                game = %label,
                edge = format!("{:+.1}", spread_edge),
                cover = format!("{:.1}%", cover_prob * 100.0),
                "No qualifying edge"
            );
        }

        Ok(Evaluation {
            pick,
            assessment,
            comparison,
            market_warning,
        })
    }

    fn with_availability(&self, rating: &TeamRating, availability: &TeamAvailability) -> TeamRating {
        if availability.is_empty() {
            return rating.clone();
        }
        let delta = self.availability.delta(rating, availability);
        adjust(rating, delta, self.league_average)
    }

    /// Evaluate a whole slate. One bad record never stops the rest.
    ///
    /// Team names on both the matchups and the rating map are resolved
    /// through `resolver` before lookup.
    pub fn evaluate_slate(
        &self,
        games: &[Matchup],
        ratings: &HashMap<String, TeamRating>,
        resolver: &TeamResolver,
        availability: &AvailabilityReport,
    ) -> SlateEvaluation {
        let index: HashMap<String, &TeamRating> = ratings
            .iter()
            .map(|(name, rating)| (resolver.resolve(name), rating))
            .collect();
        let avail_index: HashMap<String, &TeamAvailability> = availability
            .iter()
            .map(|(name, a)| (resolver.resolve(name), a))
            .collect();

        let mut picks = Vec::new();
        let mut decisions = Vec::with_capacity(games.len());
        let mut summary = SlateSummary {
            games: games.len(),
            ..SlateSummary::default()
        };

        for game in games {
            let name_a = resolver.resolve(&game.team_a);
            let name_b = resolver.resolve(&game.team_b);
            let label = format!("{name_a} vs {name_b}");

            let (rating_a, rating_b) = match (index.get(&name_a), index.get(&name_b)) {
                (Some(a), Some(b)) => (*a, *b),
                (None, _) | (_, None) => {
                    let team = if index.contains_key(&name_a) { name_b } else { name_a };
                    warn!(game = %label, team = %team, "Team not found, skipping");
                    summary.missing_team += 1;
                    decisions.push(DecisionRecord::MissingTeam { game: label, team });
                    continue;
                }
            };

            let game_availability = GameAvailability {
                team_a: avail_index.get(&name_a).map(|a| (*a).clone()).unwrap_or_default(),
                team_b: avail_index.get(&name_b).map(|a| (*a).clone()).unwrap_or_default(),
            };
            let resolved = Matchup {
                team_a: name_a,
                team_b: name_b,
                ..game.clone()
            };

            match self.evaluate(&resolved, rating_a, rating_b, &game_availability) {
                Ok(eval) if eval.qualified() => {
                    summary.qualified += 1;
                    match eval.pick.tier {
                        Tier::Strict => summary.strict += 1,
                        Tier::Relaxed => summary.relaxed += 1,
                        Tier::Skip => {}
                    }
                    if eval.pick.stake > Decimal::ZERO {
                        summary.staked += 1;
                        summary.total_stake += eval.pick.stake;
                    }
                    decisions.push(DecisionRecord::Qualified {
                        pick: eval.pick.clone(),
                    });
                    picks.push(eval.pick);
                }
                Ok(eval) => {
                    summary.not_qualified += 1;
                    decisions.push(DecisionRecord::NotQualified {
                        game: label,
                        spread_edge: eval.pick.spread_edge(),
                        cover_prob: eval.pick.cover_prob,
                    });
                }
                Err(EngineError::MissingMarket(_)) => {
                    warn!(game = %label, "No market line, skipping");
                    summary.missing_market += 1;
                    decisions.push(DecisionRecord::MissingMarket { game: label });
                }
                Err(e) => {
                    warn!(game = %label, error = %e, "Evaluation failed, skipping");
                    summary.invalid_odds += 1;
                    decisions.push(DecisionRecord::InvalidOdds {
                        game: label,
                        detail: e.to_string(),
                    });
                }
            }
        }

        picks.sort_by(|x, y| {
            y.confidence
                .partial_cmp(&x.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        info!(
            games = summary.games,
            qualified = summary.qualified,
            staked = summary.staked,
            missing_team = summary.missing_team,
            missing_market = summary.missing_market,
            total_stake = %summary.total_stake,
            "Slate evaluated"
        );

        SlateEvaluation {
            picks,
            decisions,
            summary,
        }
    }

    /// Re-derive probability-dependent fields under the current calibration.
    ///
    /// Produces new picks; the inputs are left as recorded.
    pub fn recalibrate(&self, picks: &[Pick]) -> Vec<Pick> {
        let calibration = self.calibration.current();
        picks
            .iter()
            .map(|pick| {
                let cover_prob = calibration.apply(pick.raw_cover_prob);
                let tier = self.edge.classify_tier(cover_prob);
                let sized = if tier == Tier::Skip {
                    SizedStake::zero()
                } else {
                    self.kelly.size(cover_prob, pick.decimal_odds)
                };
                Pick {
                    cover_prob,
                    tier,
                    kelly_fraction: sized.kelly_fraction,
                    stake: sized.stake,
                    ..pick.clone()
                }
            })
            .collect()
    }

    /// Quantify a player's absence and whether the market has caught up.
    ///
    /// `side` says which team the player is on. `observed_market_shift` is
    /// how far the market spread has moved since the news, in the player's
    /// team's margin convention.
    pub fn analyze_player_out(
        &self,
        matchup: &Matchup,
        a: &TeamRating,
        b: &TeamRating,
        side: PickSide,
        player: &str,
        observed_market_shift: Option<f64>,
    ) -> Result<PlayerOutAnalysis, EngineError> {
        let market = matchup
            .market_spread
            .filter(|s| s.is_finite())
            .ok_or_else(|| EngineError::MissingMarket(matchup.label()))?;

        // Orient everything toward the player's team.
        let (team, opponent, venue, market) = match side {
            PickSide::TeamA => (a, b, matchup.venue, market),
            PickSide::TeamB => (b, a, matchup.venue.flipped(), -market),
        };

        let odds = matchup
            .spread_odds
            .unwrap_or(self.edge.config().default_spread_odds);
        let decimal_odds = american_to_decimal(odds)
            .ok_or_else(|| EngineError::InvalidOdds(format!("{odds} for {}", matchup.label())))?;

        let impact = self.simulator.player_impact(team, player);
        let baseline = self.simulator.simulate(team, opponent, venue);
        let without =
            self.simulator
                .simulate_without_player(team, opponent, venue, PickSide::TeamA, player);

        let expected_line_shift = without.mean_margin - baseline.mean_margin;
        let market_underreaction = observed_market_shift.is_some_and(|shift| {
            sign(shift) == sign(expected_line_shift) && shift.abs() < expected_line_shift.abs()
        });
        let opponent_cover_prob = without.opponent_cover_probability(market);

        let recommendation = if market_underreaction
            && self.edge.probability_qualifies(opponent_cover_prob)
        {
            Some(PlayerOutRecommendation {
                back: opponent.name.clone(),
                cover_prob: opponent_cover_prob,
                decimal_odds,
                stake: self.kelly.size(opponent_cover_prob, decimal_odds),
            })
        } else {
            None
        };

        info!(
            team = %team.name,
            player,
            shift = format!("{:+.2}", expected_line_shift),
            observed = ?observed_market_shift,
            underreaction = market_underreaction,
            opponent_cover = format!("{:.1}%", opponent_cover_prob * 100.0),
            recommend = recommendation.is_some(),
            "Player-out analysis"
        );

        Ok(PlayerOutAnalysis {
            team: team.name.clone(),
            opponent: opponent.name.clone(),
            player: player.to_string(),
            impact,
            baseline_mean: baseline.mean_margin,
            new_mean: without.mean_margin,
            expected_line_shift,
            observed_market_shift,
            market_underreaction,
            opponent_cover_prob,
            recommendation,
        })
    }
}

/// Venue from the home team's name; neutral when it names neither side.
pub fn venue_for(home: Option<&str>, team_a: &str, team_b: &str) -> Venue {
    match home {
        Some(h) if h == team_a => Venue::TeamAHome,
        Some(h) if h == team_b => Venue::TeamBHome,
        _ => Venue::Neutral,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
