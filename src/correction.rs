//! # Phase corrections
//!
//! Two auxiliary inputs refine the raw spin model:
//!
//! * [`PhaseCorrection`] — a dense `(time, degrees)` curve derived from waveform
//!   data. It is attached to every model and subtracted from the interpolated
//!   phase when a query asks for corrected output.
//! * [`CorrectionWindow`] — FGM-derived eclipse offsets. Each window adds its
//!   offset to the `initial_delta_phi` of every segment whose midpoint lies in
//!   `[start, end]` and marks it [`SegmentFlags::SPINFIT_CORRECTED`]. This is the
//!   only mutation a [`SpinModel`] accepts after construction, and it must
//!   complete before the model is shared with readers.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{Degree, UnixSeconds},
    segment::SegmentFlags,
    spinmodel::SpinModel,
    spinmodel_errors::SpinModelError,
};

/// Dense phase-correction curve, linearly interpolated between samples and held
/// constant beyond its ends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseCorrection {
    times: Vec<UnixSeconds>,
    values: Vec<Degree>,
}

impl PhaseCorrection {
    /// Create a correction curve.
    ///
    /// Arguments
    /// -----------------
    /// * `times`: sample times, non-decreasing.
    /// * `values`: correction in degrees at each sample time.
    ///
    /// Return
    /// ----------
    /// * The curve, or [`SpinModelError::LengthMismatch`] if the two arrays differ in length,
    ///   or [`SpinModelError::InvalidTime`] if `times` decreases somewhere.
    pub fn new(times: Vec<UnixSeconds>, values: Vec<Degree>) -> Result<Self, SpinModelError> {
        if times.len() != values.len() {
            return Err(SpinModelError::LengthMismatch {
                field: "correction",
                expected: times.len(),
                found: values.len(),
            });
        }
        if let Some(i) = times.windows(2).position(|w| w[1] < w[0]) {
            return Err(SpinModelError::InvalidTime(format!(
                "phase correction times decrease at sample {}",
                i + 1
            )));
        }
        Ok(PhaseCorrection { times, values })
    }

    /// Curve without samples; evaluates to zero everywhere.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Correction at `t` in degrees.
    pub fn at(&self, t: UnixSeconds) -> Degree {
        let n = self.times.len();
        if n == 0 {
            return 0.0;
        }
        if t <= self.times[0] {
            return self.values[0];
        }
        if t >= self.times[n - 1] {
            return self.values[n - 1];
        }

        // times[hi - 1] < t < times[hi]
        let hi = self.times.partition_point(|&x| x <= t);
        let (t0, t1) = (self.times[hi - 1], self.times[hi]);
        let (v0, v1) = (self.values[hi - 1], self.values[hi]);
        if t1 == t0 {
            v1
        } else {
            v0 + (v1 - v0) * (t - t0) / (t1 - t0)
        }
    }
}

/// FGM-derived eclipse correction: `offset` degrees applied on `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrectionWindow {
    pub start: UnixSeconds,
    pub end: UnixSeconds,
    pub offset: Degree,
}

impl CorrectionWindow {
    pub fn contains(&self, t: UnixSeconds) -> bool {
        t >= self.start && t <= self.end
    }
}

impl SpinModel {
    /// Add the offset of `window` to every segment whose midpoint lies inside it.
    ///
    /// Offsets of overlapping windows accumulate.
    ///
    /// Return
    /// ----------
    /// * The number of segments that were adjusted.
    pub fn adjust_delta_phi(&mut self, window: &CorrectionWindow) -> usize {
        let columns = &mut self.columns;
        let hits: Vec<usize> = (0..columns.len())
            .filter(|&i| window.contains(0.5 * (columns.t1[i] + columns.t2[i])))
            .collect();

        for &i in &hits {
            columns.initial_delta_phi[i] += window.offset;
            columns.segflags[i] |= SegmentFlags::SPINFIT_CORRECTED;
        }

        debug!(
            "Correction window [{}, {}] offset {} deg applied to {} segment(s)",
            window.start,
            window.end,
            window.offset,
            hits.len()
        );
        hits.len()
    }

    /// Apply `windows` in order and keep them on the model for introspection.
    pub fn apply_corrections(&mut self, windows: &[CorrectionWindow]) -> usize {
        let adjusted = windows.iter().map(|w| self.adjust_delta_phi(w)).sum();
        self.fgm_corrections.extend_from_slice(windows);
        adjusted
    }
}
