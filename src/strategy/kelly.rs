//! Kelly criterion staking.
//!
//! Fractional Kelly with a hard cap. Degenerate inputs (odds at or below
//! even money-back, non-finite probability) size to exactly zero.

use rust_decimal::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::config::StakingConfig;

/// Full Kelly fraction `f = (p·d − (1−p)) / (d−1)`, clamped to ≥ 0.
///
/// `p` is the win probability, `d` the decimal odds (stake included).
/// Returns 0 when `d ≤ 1` or either input is non-finite.
pub fn stake_fraction(p: f64, d: f64) -> f64 {
    if !p.is_finite() || !d.is_finite() || d <= 1.0 {
        return 0.0;
    }
    let p = p.clamp(0.0, 1.0);
    let f = (p * d - (1.0 - p)) / (d - 1.0);
    if f.is_finite() {
        f.max(0.0)
    } else {
        0.0
    }
}

/// Sized stake for one pick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizedStake {
    /// Raw Kelly fraction before the multiplier and cap.
    pub kelly_fraction: f64,
    /// Bankroll fraction actually staked.
    pub bet_fraction: f64,
    pub stake: Decimal,
}

impl SizedStake {
    pub fn zero() -> Self {
        Self {
            kelly_fraction: 0.0,
            bet_fraction: 0.0,
            stake: Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone)]
pub struct KellyCalculator {
    config: StakingConfig,
}

impl KellyCalculator {
    pub fn new(config: StakingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StakingConfig {
        &self.config
    }

    /// Bankroll fraction after the multiplier and cap.
    pub fn bet_fraction(&self, p: f64, d: f64) -> f64 {
        let fractional = stake_fraction(p, d) * self.config.multiplier.max(0.0);
        fractional.min(self.config.max_fraction).max(0.0)
    }

    /// Size a stake against the configured bankroll.
    pub fn size(&self, p: f64, d: f64) -> SizedStake {
        self.size_with_bankroll(p, d, self.config.bankroll)
    }

    pub fn size_with_bankroll(&self, p: f64, d: f64, bankroll: Decimal) -> SizedStake {
        if bankroll <= Decimal::ZERO {
            return SizedStake::zero();
        }
        let kelly_fraction = stake_fraction(p, d);
        let bet_fraction = self.bet_fraction(p, d);
        let stake = Decimal::from_f64(bet_fraction)
            .map(|f| (f * bankroll).round_dp(2))
            .unwrap_or(Decimal::ZERO);

        debug!(
            p = format!("{:.3}", p),
            odds = format!("{:.3}", d),
            kelly = format!("{:.4}", kelly_fraction),
            fraction = format!("{:.4}", bet_fraction),
            stake = %stake,
            "Stake sized"
        );

        SizedStake {
            kelly_fraction,
            bet_fraction,
            stake,
        }
    }
}
