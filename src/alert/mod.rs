//! Threshold-based alerting.

pub mod thresholds;
