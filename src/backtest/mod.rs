//! Historical evaluation: calibration of simulated probabilities.

pub mod calibration;

pub use calibration::{
    CalibrationFitter, CalibrationPoint, CalibrationResult, CalibrationStatus, CalibrationStore,
};
