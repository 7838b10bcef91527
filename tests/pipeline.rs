//! End-to-end daily cycle through the public API:
//! slate evaluation → grading → calibration → recalibration → health.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use courtside::backtest::{CalibrationFitter, CalibrationStatus, CalibrationStore};
use courtside::config::EngineConfig;
use courtside::data::JsonScoreFeed;
use courtside::engine::{GradeLedger, Grader, HealthMonitor};
use courtside::identity::TeamResolver;
use courtside::storage::DataStore;
use courtside::strategy::{AvailabilityReport, PickEngine};
use courtside::types::{GradeRecord, Matchup, Pick, PickSide, Severity, TeamRating, Tier, Venue};

fn game_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
}

fn make_config() -> EngineConfig {
    let mut cfg = EngineConfig::default();
    cfg.simulation.seed = Some(11);
    cfg
}

fn make_ratings() -> HashMap<String, TeamRating> {
    [
        TeamRating::with_efficiencies("Alpha State", 115.0, 92.0, 70.0),
        TeamRating::with_efficiencies("Beta Tech", 100.0, 100.0, 70.0),
        TeamRating::with_efficiencies("Gamma College", 104.0, 99.0, 68.0),
    ]
    .into_iter()
    .map(|r| (r.name.clone(), r))
    .collect()
}

fn make_matchup(team_a: &str, team_b: &str, market_spread: Option<f64>) -> Matchup {
    Matchup {
        team_a: team_a.into(),
        team_b: team_b.into(),
        date: game_day(),
        venue: Venue::Neutral,
        market_spread,
        market_total: None,
        moneyline_a: None,
        moneyline_b: None,
        spread_odds: None,
    }
}

/// One graded pick per day for `n` days; every third pick fails to cover.
fn make_history(grader: &Grader, n: usize) -> (Vec<Pick>, Vec<GradeRecord>) {
    let start = game_day() - Duration::days(n as i64);
    let mut picks = Vec::new();
    let mut grades = Vec::new();
    for i in 0..n {
        let raw = 0.50 + 0.02 * i as f64;
        let pick = Pick {
            date: start + Duration::days(i as i64),
            team_a: "Alpha State".into(),
            team_b: "Beta Tech".into(),
            side: PickSide::TeamA,
            model_spread: 6.0,
            market_spread: 3.0,
            raw_cover_prob: raw,
            cover_prob: raw,
            win_prob: 0.7,
            tier: Tier::Relaxed,
            decimal_odds: 1.91,
            kelly_fraction: 0.05,
            stake: dec!(20),
            confidence: 60.0,
            units: Some(1.0),
            total_edge: None,
            reasons: vec![],
        };
        let score = if i % 3 == 0 { (70, 69) } else { (80, 70) };
        grades.push(grader.grade_pick(&pick, Some(score)));
        picks.push(pick);
    }
    (picks, grades)
}

#[tokio::test]
async fn test_daily_cycle() {
    let cfg = make_config();
    let ratings = make_ratings();
    let resolver = Arc::new(TeamResolver::with_teams(ratings.keys()));
    let calibration = CalibrationStore::default();
    let engine = PickEngine::new(&cfg, calibration.clone());

    // -- Slate -------------------------------------------------------------

    let slate = vec![
        make_matchup("Alpha St.", "Beta Tech", Some(0.0)),
        make_matchup("Zeta Poly", "Beta Tech", Some(1.5)),
        make_matchup("Gamma College", "Alpha State", None),
    ];
    let evaluation =
        engine.evaluate_slate(&slate, &ratings, &resolver, &AvailabilityReport::new());

    assert_eq!(evaluation.summary.games, 3);
    assert_eq!(evaluation.summary.qualified, 1);
    assert_eq!(evaluation.summary.missing_team, 1);
    assert_eq!(evaluation.summary.missing_market, 1);
    assert_eq!(evaluation.decisions.len(), 3);

    let pick = &evaluation.picks[0];
    assert_eq!(pick.team_a, "Alpha State");
    assert_eq!(pick.side, PickSide::TeamA);
    assert_ne!(pick.tier, Tier::Skip);
    assert!(pick.stake > Decimal::ZERO);

    // -- Persist and grade through the JSON score feed ---------------------

    let dir = tempfile::tempdir().unwrap();
    let store = DataStore::new(dir.path());
    store.save_picks(&evaluation.picks).unwrap();

    let scores_dir = dir.path().join("scores");
    std::fs::create_dir_all(&scores_dir).unwrap();
    std::fs::write(
        scores_dir.join("2026-03-01.json"),
        r#"[{"home": "Beta Tech", "away": "Alpha St.", "homeScore": 60, "awayScore": 82}]"#,
    )
    .unwrap();

    let grader = Grader::new(Arc::clone(&resolver));
    let feed = JsonScoreFeed::new(&scores_dir);
    let mut ledger = GradeLedger::from_records(store.load_grades().unwrap());
    let picks = store.load_picks().unwrap();

    let summary = grader
        .grade_date(game_day(), &picks, &feed, &mut ledger)
        .await
        .unwrap();
    assert_eq!(summary.graded, 1);
    assert_eq!(summary.covers, 1);
    assert!(summary.total_profit > Decimal::ZERO);

    store.save_grades(ledger.records().iter()).unwrap();
    let reloaded = GradeLedger::from_records(store.load_grades().unwrap());
    assert_eq!(reloaded.len(), 1);

    // Re-running the same day is a no-op.
    let again = grader
        .grade_date(game_day(), &picks, &feed, &mut ledger)
        .await
        .unwrap();
    assert_eq!(again.skipped, 1);
    assert_eq!(again.graded, 0);
    let tomorrow = game_day() + Duration::days(1);
    assert!(grader.pending_dates(&picks, &ledger, tomorrow).is_empty());

    // -- Calibration -------------------------------------------------------

    let (history, mut history_grades) = make_history(&grader, 20);
    history_grades.extend(ledger.records());
    let mut all_picks = history.clone();
    all_picks.extend(picks.iter().cloned());

    let fitter = CalibrationFitter::new(cfg.calibration.clone(), Arc::clone(&resolver));
    let fit = fitter.fit_history(&all_picks, &history_grades, &[]);
    assert_eq!(fit.status, CalibrationStatus::Ok);
    assert_eq!(fit.sample_size, 21);

    calibration.publish(fit.clone());
    store.save_calibration(&fit).unwrap();
    assert_eq!(engine.calibration().current().b, fit.b);

    let recalibrated = engine.recalibrate(&history);
    for (old, new) in history.iter().zip(&recalibrated) {
        assert_eq!(new.raw_cover_prob, old.raw_cover_prob);
        assert!((new.cover_prob - fit.apply(old.raw_cover_prob)).abs() < 1e-12);
        if new.tier == Tier::Skip {
            assert_eq!(new.stake, Decimal::ZERO);
        }
    }

    // -- Health ------------------------------------------------------------

    let monitor = HealthMonitor::new(cfg.health.clone());
    let report = monitor.check(&history_grades);
    assert_eq!(report.latest.as_ref().map(|d| d.date), Some(game_day()));
    assert_eq!(report.baseline.days, 21);
    assert!(report
        .alerts
        .iter()
        .any(|a| a.metric == "volume" && a.severity == Severity::Info));
}

#[test]
fn test_shipped_config_matches_defaults() {
    let cfg = EngineConfig::load("config.toml").unwrap();
    let defaults = EngineConfig::default();
    assert_eq!(cfg.simulation.samples, defaults.simulation.samples);
    assert_eq!(cfg.edge.strict_min, defaults.edge.strict_min);
    assert_eq!(cfg.edge.default_spread_odds, defaults.edge.default_spread_odds);
    assert_eq!(cfg.staking.bankroll, defaults.staking.bankroll);
    assert_eq!(cfg.calibration.min_samples, defaults.calibration.min_samples);
    assert_eq!(cfg.health.break_even_hit_rate, defaults.health.break_even_hit_rate);
    assert_eq!(cfg.storage.data_dir, "data");
}
