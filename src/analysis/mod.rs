/// Feature derivation for the risk scorers.
///
/// Turns a node's rolling rainfall window into the fixed-shape feature
/// vector the trained classifier expects. Threshold scoring works from the
/// latest reading directly and never goes through this module.
///
/// Submodules:
/// - `features` — lag, rolling-sum and calendar features.

pub mod features;
