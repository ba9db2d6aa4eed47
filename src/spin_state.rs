//! Spin state at a single query time.
//!
//! Overview
//! -----------------
//! [`SpinState`] is the value produced both by single-segment evaluation
//! ([`Segment::interp_t`](crate::segment::Segment::interp_t)) and, once per
//! query time, by the batch engine
//! ([`SpinModel::interp_t`](crate::spinmodel::SpinModel::interp_t)). A batch
//! query therefore returns a `Vec<SpinState>` aligned with its input times.
//!
//! Units
//! -----------------
//! * `spin_phase`, `eclipse_delta_phi`: degrees, phase in `[0, 360)`
//! * `spin_period`, `dt`: seconds
//! * `t_last`: Unix seconds
//!
//! Extrapolation
//! -----------------
//! `dt` is always measured from the start `t1` of the segment used. A query is
//! extrapolated exactly when `dt < 0` or `dt > t2 − t1`; see
//! [`SpinState::is_extrapolated`].

use serde::{Deserialize, Serialize};

use crate::{
    constants::{Degree, Second, UnixSeconds},
    segment::SegmentFlags,
};

/// Spin phase, count and period at one instant.
///
/// Fields
/// -----------------
/// * `spin_phase` — angle since the last reference crossing, in `[0, 360)`.
/// * `spin_count` — number of complete spins since the start of the model.
/// * `spin_period` — instantaneous spin period.
/// * `t_last` — time of the last reference (zero phase) crossing.
/// * `eclipse_delta_phi` — phase offset between the model and the onboard clock inside eclipses.
/// * `segflags` — flags of the segment used.
/// * `seg_index` — index of the segment used in the model.
/// * `dt` — signed time from the start of the segment used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpinState {
    pub spin_phase: Degree,
    pub spin_count: i64,
    pub spin_period: Second,
    pub t_last: UnixSeconds,
    pub eclipse_delta_phi: Degree,
    pub segflags: SegmentFlags,
    pub seg_index: usize,
    pub dt: Second,
}

impl SpinState {
    /// Was this state obtained outside `[t1, t2]` of its segment?
    ///
    /// Arguments
    /// -----------------
    /// * `seg_duration`: `t2 − t1` of the segment at `seg_index`.
    pub fn is_extrapolated(&self, seg_duration: Second) -> bool {
        self.dt < 0.0 || self.dt > seg_duration
    }

    /// Spin count including the fractional part carried by the phase.
    pub fn fractional_count(&self) -> f64 {
        self.spin_count as f64 + self.spin_phase / 360.0
    }
}
