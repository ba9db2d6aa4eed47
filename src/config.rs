//! Session-level knobs for model construction and lookup.
//!
//! [`SpinModelConfig::default`] reproduces the constants of
//! [`crate::constants`]; a config can also be deserialized (for example from a
//! JSON or TOML block owned by the calling application) and passed to the
//! [`SpinModelBuilder`](crate::builder::SpinModelBuilder) and the
//! [`SpinModelRegistry`](crate::registry::SpinModelRegistry).

use serde::{Deserialize, Serialize};

use crate::constants::{
    ACCEL_EPSILON, BRIDGE_THRESHOLD_SPINS, CONTIGUITY_TOLERANCE, MIN_IDPU_SPINPER,
};

/// Tolerances and behaviour switches shared by the builder, the query engine
/// and the registry.
///
/// Fields
/// -----------------
/// * `contiguity_tolerance` — max distance (s) between `t2` of a segment and `t1` of the next
///   for both to be considered contiguous.
/// * `accel_epsilon` — angular accelerations below this magnitude (deg/s²) are treated as zero.
/// * `min_idpu_spinper` — onboard spin periods at or below this value (s) are invalid.
/// * `bridge_threshold_spins` — gaps of at least this many spins are bridged.
/// * `quiet_registry_misses` — suppress the warning emitted on a registry miss.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpinModelConfig {
    pub contiguity_tolerance: f64,
    pub accel_epsilon: f64,
    pub min_idpu_spinper: f64,
    pub bridge_threshold_spins: f64,
    pub quiet_registry_misses: bool,
}

impl Default for SpinModelConfig {
    fn default() -> Self {
        SpinModelConfig {
            contiguity_tolerance: CONTIGUITY_TOLERANCE,
            accel_epsilon: ACCEL_EPSILON,
            min_idpu_spinper: MIN_IDPU_SPINPER,
            bridge_threshold_spins: BRIDGE_THRESHOLD_SPINS,
            quiet_registry_misses: false,
        }
    }
}

#[cfg(test)]
mod config_test {
    use super::*;

    #[test]
    fn test_default_matches_constants() {
        let config = SpinModelConfig::default();
        assert_eq!(config.contiguity_tolerance, 1.0e-6);
        assert_eq!(config.bridge_threshold_spins, 0.5);
        assert!(!config.quiet_registry_misses);
    }
}
