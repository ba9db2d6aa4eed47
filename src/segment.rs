//! One piecewise-quadratic interval of the spin model.
//!
//! Inside a segment the phase accumulated since `t1` is
//!
//! ```text
//! phi(dt) = b·dt + c·dt²      dt = t − t1
//! ```
//!
//! with `b` the angular rate at `t1` (deg/s) and `c` the quadratic coefficient
//! (deg/s²). `phi(t2 − t1)` is an integral number of spins `c2 − c1`, so every
//! segment starts and ends on a reference crossing.
//!
//! Outside `[t1, t2]` a segment extrapolates at constant rate: the start rate
//! `b` before `t1`, the end rate `b + 2·c·(t2 − t1)` after `t2`. This is only
//! meant for short extrapolations; the batch engine in
//! [`crate::query`] applies the same formulas to the first and last segment.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::{
    config::SpinModelConfig,
    constants::{Degree, Second, UnixSeconds, DEG_PER_SPIN},
    spin_state::SpinState,
    spinmodel_errors::SpinModelError,
    telemetry::SegmentRecord,
};

/// Distance (in spins) below which an accumulated phase is snapped onto a spin boundary.
pub(crate) const SPIN_SNAP_EPSILON: f64 = 1.0e-9;

bitflags! {
    /// Status bits carried by each segment.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct SegmentFlags: u8 {
        /// The segment lies inside an eclipse.
        const ECLIPSE = 0b001;
        /// A waveform-derived phase correction has been applied.
        const WAVEFORM_CORRECTED = 0b010;
        /// An FGM spin-fit correction has been applied.
        const SPINFIT_CORRECTED = 0b100;
    }
}

impl SegmentFlags {
    /// Flags under which the eclipse phase offset is computed.
    pub const ECLIPSE_OFFSET: SegmentFlags =
        SegmentFlags::ECLIPSE.union(SegmentFlags::WAVEFORM_CORRECTED);
}

/// A single interval of constant angular acceleration.
///
/// Fields
/// -----------------
/// * `t1`, `t2` — start and end times (Unix seconds), `t1 < t2`.
/// * `c1`, `c2` — spin count at `t1` and `t2`, `c2 >= c1`.
/// * `b` — angular rate at `t1` (deg/s).
/// * `c` — quadratic phase coefficient (deg/s²).
/// * `npts` — telemetry points used in the fit; `0` for bridge segments.
/// * `maxgap` — largest telemetry gap absorbed by the fit (s).
/// * `phaserr` — maximum fit residual (s).
/// * `initial_delta_phi` — phase offset accumulated by eclipse corrections (deg).
/// * `idpu_spinper` — onboard spin period, only meaningful inside eclipses (s).
/// * `segflags` — see [`SegmentFlags`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub t1: UnixSeconds,
    pub t2: UnixSeconds,
    pub c1: i64,
    pub c2: i64,
    pub b: f64,
    pub c: f64,
    pub npts: u32,
    pub maxgap: Second,
    pub phaserr: Second,
    pub initial_delta_phi: Degree,
    pub idpu_spinper: Second,
    pub segflags: SegmentFlags,
}

/// Time needed to accumulate `phi` degrees from rate `b` with quadratic coefficient `c`.
///
/// Takes the smallest non-negative root of `c·dt² + b·dt − phi = 0`, written as
/// `2·phi / (b + sqrt(b² + 4·c·phi))` so that no cancellation occurs when `c`
/// is tiny. The discriminant is clamped at zero so that rounding noise never
/// yields NaN.
pub(crate) fn elapsed_for_phase(phi: f64, b: f64, c: f64, accel_epsilon: f64) -> f64 {
    if c.abs() < accel_epsilon {
        phi / b
    } else {
        let disc = (b * b + 4.0 * c * phi).max(0.0);
        2.0 * phi / (b + disc.sqrt())
    }
}

/// Round `fracspins` to the nearest integer when it is within [`SPIN_SNAP_EPSILON`] of it.
pub(crate) fn snap_spins(fracspins: f64) -> f64 {
    let nearest = fracspins.round();
    if (fracspins - nearest).abs() < SPIN_SNAP_EPSILON {
        nearest
    } else {
        fracspins
    }
}

/// Split an accumulated number of spins into whole spins and phase, snapping
/// values that sit on a spin boundary up to rounding noise.
pub(crate) fn split_spins(fracspins: f64) -> (f64, Degree) {
    let fracspins = snap_spins(fracspins);
    let whole = fracspins.floor();
    (whole, (fracspins - whole) * DEG_PER_SPIN)
}

impl Segment {
    /// Build a segment from one telemetry record.
    ///
    /// The record gives the end time, the period at the start of the segment,
    /// the quadratic coefficient and the number of spins; the start time is
    /// recovered by solving `b·Δ + c·Δ² = 360·nspins`. Spin counts are local
    /// (`c1 = 0`) until [`SpinModelBuilder::addseg`](crate::builder::SpinModelBuilder::addseg)
    /// offsets them.
    ///
    /// Return
    /// ----------
    /// * The segment, or [`SpinModelError::InvalidRecord`] when the record cannot
    ///   describe a segment with `t1 < t2`: non-positive period or spin count,
    ///   or a deceleration that stops the spin before `nspins` are completed.
    pub fn from_record(
        record: &SegmentRecord,
        config: &SpinModelConfig,
    ) -> Result<Self, SpinModelError> {
        let invalid = |reason: String| SpinModelError::InvalidRecord {
            tend: record.tend,
            reason,
        };

        if !record.tend.is_finite() {
            return Err(invalid("end time is not finite".into()));
        }
        if !(record.spinper.is_finite() && record.spinper > 0.0) {
            return Err(invalid(format!("spin period {} is not positive", record.spinper)));
        }
        if record.nspins < 1 {
            return Err(invalid(format!("spin count {} is not positive", record.nspins)));
        }
        if !record.c.is_finite() {
            return Err(invalid("quadratic coefficient is not finite".into()));
        }

        let b = DEG_PER_SPIN / record.spinper;
        let total_phase = DEG_PER_SPIN * record.nspins as f64;
        if b * b + 4.0 * record.c * total_phase < 0.0 {
            return Err(invalid(format!(
                "deceleration {} stops the spin before {} spins",
                record.c, record.nspins
            )));
        }
        let duration = elapsed_for_phase(total_phase, b, record.c, config.accel_epsilon);
        if !(duration.is_finite() && duration > 0.0) {
            return Err(invalid(format!("segment duration {duration} is not positive")));
        }

        Ok(Segment {
            t1: record.tend - duration,
            t2: record.tend,
            c1: 0,
            c2: record.nspins,
            b,
            c: record.c,
            npts: record.npts,
            maxgap: record.maxgap,
            phaserr: record.phaserr,
            initial_delta_phi: record.initial_delta_phi,
            idpu_spinper: record.idpu_spinper,
            segflags: SegmentFlags::from_bits_retain(record.segflags),
        })
    }

    /// `t2 − t1`
    pub fn duration(&self) -> Second {
        self.t2 - self.t1
    }

    /// Center of the segment, used to match correction windows.
    pub fn midpoint(&self) -> UnixSeconds {
        0.5 * (self.t1 + self.t2)
    }

    /// Angular rate at the end of the segment (deg/s).
    pub fn end_rate(&self) -> f64 {
        self.b + 2.0 * self.c * self.duration()
    }

    /// Synthesized segments covering a telemetry gap carry no fit points.
    pub fn is_bridge(&self) -> bool {
        self.npts == 0
    }

    /// Offset both spin counts by `offset`.
    pub(crate) fn shift_counts(&mut self, offset: i64) {
        self.c1 += offset;
        self.c2 += offset;
    }

    /// Total phase accumulated since `t1`, extrapolated at constant rate outside the segment.
    pub(crate) fn model_phase(&self, dt: Second) -> Degree {
        let duration = self.duration();
        if dt < 0.0 {
            self.b * dt
        } else if dt > duration {
            self.b * duration + self.c * duration * duration + self.end_rate() * (dt - duration)
        } else {
            self.b * dt + self.c * dt * dt
        }
    }

    /// Eclipse phase offset at `dt`, or `0` when the segment does not qualify.
    pub(crate) fn eclipse_delta_phi(&self, dt: Second, config: &SpinModelConfig) -> Degree {
        if self.segflags.contains(SegmentFlags::ECLIPSE_OFFSET)
            && self.idpu_spinper > config.min_idpu_spinper
        {
            let idpu_phase = DEG_PER_SPIN * dt / self.idpu_spinper;
            self.initial_delta_phi + (self.model_phase(dt) - idpu_phase)
        } else {
            0.0
        }
    }

    /// Evaluate the segment at a single time.
    ///
    /// Arguments
    /// -----------------
    /// * `t`: query time, inside or close to `[t1, t2]`.
    /// * `seg_index`: index of the segment in its model, echoed in the result.
    /// * `config`: tolerances used for the zero-acceleration test and the onboard period check.
    ///
    /// Return
    /// ----------
    /// * The spin state at `t`. Outside `[t1, t2]` the result is extrapolated at the boundary rate.
    pub fn interp_t(&self, t: UnixSeconds, seg_index: usize, config: &SpinModelConfig) -> SpinState {
        let dt = t - self.t1;

        let (spin_period, spin_phase, spin_count, t_last) = if t < self.t1 {
            let spinper = DEG_PER_SPIN / self.b;
            let fracspins = snap_spins((self.t1 - t) / spinper);
            let intspins = fracspins.ceil();
            (
                spinper,
                (intspins - fracspins) * DEG_PER_SPIN,
                self.c1 - intspins as i64,
                self.t1 - intspins * spinper,
            )
        } else if t > self.t2 {
            let spinper = DEG_PER_SPIN / self.end_rate();
            let (intspins, phase) = split_spins((t - self.t2) / spinper);
            (
                spinper,
                phase,
                self.c2 + intspins as i64,
                self.t2 + intspins * spinper,
            )
        } else {
            let phi = self.b * dt + self.c * dt * dt;
            let spinper = DEG_PER_SPIN / (self.b + 2.0 * self.c * dt);
            let (intspins, phase) = split_spins(phi / DEG_PER_SPIN);
            let last_dt =
                elapsed_for_phase(intspins * DEG_PER_SPIN, self.b, self.c, config.accel_epsilon);
            (
                spinper,
                phase,
                self.c1 + intspins as i64,
                self.t1 + last_dt,
            )
        };

        SpinState {
            spin_phase,
            spin_count,
            spin_period,
            t_last,
            eclipse_delta_phi: self.eclipse_delta_phi(dt, config),
            segflags: self.segflags,
            seg_index,
            dt,
        }
    }

    /// Time at which the (possibly fractional) spin count `n` is reached.
    ///
    /// Outside `[c1, c2]` the count is extrapolated at the boundary rate, mirroring [`Self::interp_t`].
    pub fn interp_n(&self, n: f64, config: &SpinModelConfig) -> UnixSeconds {
        if n < self.c1 as f64 {
            self.t1 - (self.c1 as f64 - n) * DEG_PER_SPIN / self.b
        } else if n > self.c2 as f64 {
            self.t2 + (n - self.c2 as f64) * DEG_PER_SPIN / self.end_rate()
        } else {
            let phi = (n - self.c1 as f64) * DEG_PER_SPIN;
            self.t1 + elapsed_for_phase(phi, self.b, self.c, config.accel_epsilon)
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.6}, {:.6}] spins {}..{} b={:.9} c={:.3e} npts={} maxgap={:.3} phaserr={:.3e} dphi={:.6} idpu_spinper={:.6} flags={:#05b}",
            self.t1,
            self.t2,
            self.c1,
            self.c2,
            self.b,
            self.c,
            self.npts,
            self.maxgap,
            self.phaserr,
            self.initial_delta_phi,
            self.idpu_spinper,
            self.segflags.bits()
        )
    }
}
