//! Post-game engine: grading picks against final scores and monitoring
//! rolling performance.

pub mod grader;
pub mod health;

pub use grader::{GradeLedger, Grader, GradingSummary, PendingRun};
pub use health::{DailyMetrics, HealthMonitor, HealthReport, WindowMetrics};
