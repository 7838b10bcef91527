//! Courtside: matchup simulation, edge detection, staking & calibration.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod identity;
pub mod model;
pub mod strategy;
pub mod engine;
pub mod backtest;
pub mod data;
pub mod storage;
