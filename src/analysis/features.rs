//! Lag, rolling-sum and calendar features from a rainfall window.
//!
//! # Clock injection
//! `build` takes the evaluation time as a parameter. Calendar features
//! describe when scoring happens, not when the rain was recorded.

use chrono::{DateTime, Datelike, Utc};

use crate::model::EngineError;

/// Feature names in the order the feature vector is produced.
pub const FEATURE_NAMES: [&str; 10] = [
    "lag_1", "lag_2", "lag_3", "lag_4", "lag_5", "lag_6", "sum_3d", "sum_6d", "dayofyear",
    "month",
];

/// Named numeric features in a fixed order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    entries: Vec<(&'static str, f64)>,
}

impl FeatureVector {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(n, _)| *n).collect()
    }

    /// Projects the vector onto `order`, e.g. a classifier's trained
    /// feature list.
    pub fn select<S: AsRef<str>>(&self, order: &[S]) -> Result<Vec<f64>, EngineError> {
        order
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.get(name).ok_or_else(|| {
                    EngineError::MalformedInput(format!("feature '{}' is not produced", name))
                })
            })
            .collect()
    }
}

/// Returns `true` if `name` is one of the features `build` produces.
pub fn is_known_feature(name: &str) -> bool {
    FEATURE_NAMES.contains(&name)
}

/// Builds the feature vector for a window (oldest first) at `now`.
///
/// - `lag_i` is the value `i` steps before the most recent one, or 0 when
///   the window is too short.
/// - `sum_3d` / `sum_6d` sum the 3 / 6 most recent values (fewer if the
///   window is shorter).
pub fn build(history: &[f64], now: DateTime<Utc>) -> FeatureVector {
    let lag = |i: usize| -> f64 {
        if history.len() > i {
            history[history.len() - 1 - i]
        } else {
            0.0
        }
    };

    let mut entries = Vec::with_capacity(FEATURE_NAMES.len());
    for (i, name) in FEATURE_NAMES.iter().take(6).enumerate() {
        entries.push((*name, lag(i + 1)));
    }
    entries.push(("sum_3d", rolling_sum(history, 3)));
    entries.push(("sum_6d", rolling_sum(history, 6)));
    entries.push(("dayofyear", f64::from(now.ordinal())));
    entries.push(("month", f64::from(now.month())));

    FeatureVector { entries }
}

fn rolling_sum(history: &[f64], k: usize) -> f64 {
    history.iter().rev().take(k).sum()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
