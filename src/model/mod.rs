//! Matchup model: ratings, tempo, deterministic comparison and simulation.
//!
//! The Comparator and the Simulator share one `Comparator::expected_points`
//! so the cheap projection and the sampled distribution never disagree on
//! tempo or efficiency assumptions.

pub mod availability;
pub mod compare;
pub mod possessions;
pub mod rating;
pub mod simulate;

pub use availability::{adjust, AvailabilityModel};
pub use compare::{Comparator, Comparison};
pub use possessions::PossessionEstimator;
pub use rating::RatingComposer;
pub use simulate::{SimulationResult, Simulator};
