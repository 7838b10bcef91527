//! Courtside daily cycle.
//!
//! Entry point. Loads configuration, initialises structured logging, then
//! runs one pass of: grade every outstanding date → refit calibration →
//! evaluate today's slate → health check. All state lives as JSON files in
//! the configured data directory.
//!
//! Usage: `courtside [YYYY-MM-DD]` (defaults to today's local date).

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use courtside::backtest::{CalibrationFitter, CalibrationStore};
use courtside::config::EngineConfig;
use courtside::data::JsonScoreFeed;
use courtside::engine::{GradeLedger, Grader, HealthMonitor};
use courtside::identity::TeamResolver;
use courtside::storage::DataStore;
use courtside::strategy::{DecisionRecord, PickEngine};

const CONFIG_FILE: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    init_logging();

    let cfg = if Path::new(CONFIG_FILE).exists() {
        EngineConfig::load(CONFIG_FILE)?
    } else {
        warn!(path = CONFIG_FILE, "No config file found, using defaults");
        EngineConfig::default()
    };

    let today = match std::env::args().nth(1) {
        Some(arg) => NaiveDate::parse_from_str(&arg, "%Y-%m-%d")
            .with_context(|| format!("Invalid date argument: {arg}"))?,
        None => Local::now().date_naive(),
    };

    info!(
        %today,
        data_dir = %cfg.storage.data_dir,
        samples = cfg.simulation.samples,
        "Courtside starting up"
    );

    // -- Load state ------------------------------------------------------

    let store = DataStore::new(&cfg.storage.data_dir);
    let ratings = store.load_ratings()?;
    let resolver = Arc::new(TeamResolver::with_teams(ratings.keys()));
    let picks = store.load_picks()?;
    let mut ledger = GradeLedger::from_records(store.load_grades()?);

    let calibration = CalibrationStore::new(store.load_calibration()?.unwrap_or_default());

    // -- 1. Grade outstanding dates ---------------------------------------

    let grader = Grader::new(Arc::clone(&resolver));
    let feed = JsonScoreFeed::new(store.dir().join("scores"));
    let run = grader.grade_pending(today, &picks, &feed, &mut ledger).await;
    store.save_grades(ledger.records().iter())?;
    if run.feed_errors > 0 {
        warn!(
            feed_errors = run.feed_errors,
            dates = run.dates.len(),
            "Some dates could not be graded, will retry next run"
        );
    }
    info!(
        dates = run.dates.len(),
        graded = run.summary.graded,
        placeholders = run.summary.placeholders,
        profit = %run.summary.total_profit,
        avg_clv = ?run.summary.avg_clv(),
        "Grading complete"
    );

    // -- 2. Refit calibration --------------------------------------------

    let fitter = CalibrationFitter::new(cfg.calibration.clone(), Arc::clone(&resolver));
    let grades = ledger.records();
    let history = store.load_calibration_history()?;
    let fit = fitter.fit_history(&picks, &grades, &history);
    store.save_calibration(&fit)?;
    calibration.publish(fit);

    // -- 3. Evaluate today's slate ---------------------------------------

    let engine = PickEngine::new(&cfg, calibration);
    let slate = store.load_slate(today)?;
    let availability = store.load_availability(today)?;
    let evaluation = engine.evaluate_slate(&slate, &ratings, &resolver, &availability);

    for decision in &evaluation.decisions {
        if let DecisionRecord::Qualified { pick } = decision {
            info!("{pick}");
        }
    }

    let stored = store.save_picks(&evaluation.picks)?;
    info!(
        picks = evaluation.picks.len(),
        stored,
        total_stake = %evaluation.summary.total_stake,
        "Slate saved"
    );

    // -- 4. Health check -------------------------------------------------

    let monitor = HealthMonitor::new(cfg.health.clone());
    let report = monitor.check(&grades);
    match report.worst() {
        Some(severity) => warn!(%severity, alerts = report.alerts.len(), "Health check raised alerts"),
        None => info!("Health check clean"),
    }

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("courtside=info"));

    let json_logging = std::env::var("COURTSIDE_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
