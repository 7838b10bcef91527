//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs. Every
//! section carries `#[serde(default)]`, so a partial file only overrides
//! what it names. All numeric fallbacks used by the engine live here.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::fs;

use crate::types::EngineError;

/// Top-level engine configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub model: ModelConfig,
    pub simulation: SimulationConfig,
    pub edge: EdgeConfig,
    pub staking: StakingConfig,
    pub confidence: ConfidenceConfig,
    pub calibration: CalibrationConfig,
    pub health: HealthConfig,
    pub storage: StorageConfig,
}

/// Rating and scoring constants (league-average fallbacks included).
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ModelConfig {
    /// Efficiency used when a team has no offensive/defensive figure.
    pub league_average_efficiency: f64,
    /// Tempo used when a team has neither pace nor possessions per game.
    pub default_tempo: f64,
    /// Home-court points added to the home side's power rating.
    pub rating_home_court: f64,
    /// Home-court points added to the home side's expected score.
    pub scoring_home_court: f64,
    /// Points per net recent win.
    pub recent_form_scale: f64,
    /// Impact assumed for a player missing from the impact map in what-if mode.
    pub default_player_impact: f64,
    /// Fixed penalties applied when a flagged starter is fully out.
    pub primary_scorer_out: f64,
    pub secondary_scorer_out: f64,
    pub defensive_anchor_out: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            league_average_efficiency: 100.0,
            default_tempo: 70.0,
            rating_home_court: 2.5,
            scoring_home_court: 3.5,
            recent_form_scale: 1.5,
            default_player_impact: 2.0,
            primary_scorer_out: -2.5,
            secondary_scorer_out: -1.0,
            defensive_anchor_out: -1.5,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimulationConfig {
    /// Samples per simulation call.
    pub samples: usize,
    /// Game-to-game standard deviation of each team's score.
    pub score_sd: f64,
    /// Fixed RNG seed; unseeded runs draw from OS entropy.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            samples: 5_000,
            score_sd: 12.0,
            seed: None,
        }
    }
}

/// Qualification thresholds. These are fixed constants, never fitted.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EdgeConfig {
    /// Minimum |model spread − market spread| in points.
    pub spread_edge_threshold: f64,
    /// Minimum |model total − market total| in points.
    pub total_edge_threshold: f64,
    /// Loose cover-probability floor for probability qualification.
    pub min_cover_prob: f64,
    /// Inclusive lower bound of the STRICT tier.
    pub strict_min: f64,
    /// Inclusive lower bound of the RELAXED tier.
    pub relaxed_min: f64,
    /// Model vs moneyline-implied win probability gap that triggers a warning.
    pub market_divergence: f64,
    /// American price assumed for spread bets without an explicit price.
    pub default_spread_odds: i32,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            spread_edge_threshold: 2.0,
            total_edge_threshold: 3.5,
            min_cover_prob: 0.55,
            strict_min: 0.90,
            relaxed_min: 0.80,
            market_divergence: 0.15,
            default_spread_odds: -110,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StakingConfig {
    /// Fractional Kelly multiplier (0.5 = half-Kelly).
    pub multiplier: f64,
    /// Hard cap on the bankroll fraction per pick.
    pub max_fraction: f64,
    /// Bankroll in currency units.
    pub bankroll: Decimal,
}

impl Default for StakingConfig {
    fn default() -> Self {
        Self {
            multiplier: 0.5,
            max_fraction: 0.25,
            bankroll: dec!(1000),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ConfidenceConfig {
    pub edge_weight: f64,
    pub simulation_weight: f64,
    pub alignment_weight: f64,
    pub availability_weight: f64,
    /// Spread edge (points) that counts as a full edge signal.
    pub edge_normalizer: f64,
    /// Spread edge (points) at which market alignment reaches zero.
    pub alignment_normalizer: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            edge_weight: 0.4,
            simulation_weight: 0.3,
            alignment_weight: 0.2,
            availability_weight: 0.1,
            edge_normalizer: 5.0,
            alignment_normalizer: 10.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Matched samples needed before the fallback source is consulted.
    pub min_samples: usize,
    /// Below this many samples no fit is attempted at all.
    pub absolute_min_samples: usize,
    pub clamp_low: f64,
    pub clamp_high: f64,
    pub buckets: usize,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            min_samples: 15,
            absolute_min_samples: 3,
            clamp_low: 0.01,
            clamp_high: 0.99,
            buckets: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HealthConfig {
    pub recent_days: usize,
    pub baseline_days: usize,
    /// Break-even hit rate against standard -110 vig.
    pub break_even_hit_rate: f64,
    /// Baseline hit rate above which a recent drop counts as regression.
    pub regression_baseline: f64,
    /// Recent ROI below this after a positive baseline is critical.
    pub roi_floor: f64,
    /// Baseline ROI above this makes a negative recent ROI a regression.
    pub roi_baseline: f64,
    /// Recent hit rate below this, with the baseline also low, is critical.
    pub mismatch_recent_hit_rate: f64,
    pub mismatch_baseline_hit_rate: f64,
    /// Daily ROI standard deviation that counts as high volatility.
    pub max_roi_sd: f64,
    /// Average picks per day needed for the window to be meaningful.
    pub min_daily_picks: f64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            recent_days: 7,
            baseline_days: 30,
            break_even_hit_rate: 0.524,
            regression_baseline: 0.55,
            roi_floor: -0.05,
            roi_baseline: 0.05,
            mismatch_recent_hit_rate: 0.45,
            mismatch_baseline_hit_rate: 0.50,
            max_roi_sd: 0.20,
            min_daily_picks: 5.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject threshold combinations that would make tiers or staking meaningless.
    pub fn validate(&self) -> Result<(), EngineError> {
        let e = &self.edge;
        if !(0.0 < e.relaxed_min && e.relaxed_min <= e.strict_min && e.strict_min <= 1.0) {
            return Err(EngineError::Config(format!(
                "tier bounds must satisfy 0 < relaxed_min ({}) <= strict_min ({}) <= 1",
                e.relaxed_min, e.strict_min
            )));
        }
        if !(0.0..=1.0).contains(&self.staking.max_fraction) {
            return Err(EngineError::Config(format!(
                "staking.max_fraction out of range: {}",
                self.staking.max_fraction
            )));
        }
        if self.simulation.samples == 0 {
            return Err(EngineError::Config("simulation.samples must be > 0".into()));
        }
        if self.calibration.buckets == 0 {
            return Err(EngineError::Config("calibration.buckets must be > 0".into()));
        }
        Ok(())
    }
}
