//! # Batch spin-phase queries
//!
//! [`SpinModel::interp_t`] evaluates the model at an arbitrary batch of times.
//! The work is organised as successive masked passes over flat arrays rather
//! than as per-time control flow:
//!
//! 1. **Locate** — two binary searches against the `t1` and `t2` columns give
//!    the covering segment of each time; times past the last segment end are
//!    clamped onto the last segment.
//! 2. **Gather** — the attributes of the located segments are copied into
//!    per-query arrays.
//! 3. **Partition** — query indices are split into *before start*, *after end*
//!    and *inside*; each set is evaluated with a single formula. The *inside*
//!    set is split once more on whether the acceleration is zero, to solve for
//!    the last reference crossing.
//! 4. **Eclipse** — the subset whose segment qualifies gets its eclipse phase
//!    offset.
//! 5. **Correction** — optionally subtract the waveform phase correction and
//!    re-wrap into `[0, 360)`.
//!
//! Queries never fail: out-of-range times are extrapolated and can be
//! recognised by their `dt` (see [`SpinState::is_extrapolated`]).

use crate::{
    constants::{Degree, UnixSeconds, DEG_PER_SPIN},
    segment::{elapsed_for_phase, snap_spins, split_spins, SegmentFlags},
    spin_state::SpinState,
    spinmodel::SpinModel,
};

/// Wrap an angle into `[0, 360)`.
pub fn wrap_degrees(angle: Degree) -> Degree {
    let wrapped = angle.rem_euclid(DEG_PER_SPIN);
    // rem_euclid may round tiny negative inputs up to exactly 360
    if wrapped >= DEG_PER_SPIN {
        0.0
    } else {
        wrapped
    }
}

fn gather<T: Copy>(values: &[T], idx: &[usize]) -> Vec<T> {
    idx.iter().map(|&i| values[i]).collect()
}

/// Attributes of the located segment, one entry per query time.
struct Gathered {
    t1: Vec<f64>,
    t2: Vec<f64>,
    c1: Vec<i64>,
    c2: Vec<i64>,
    b: Vec<f64>,
    c: Vec<f64>,
    initial_delta_phi: Vec<f64>,
    idpu_spinper: Vec<f64>,
    segflags: Vec<SegmentFlags>,
}

/// Output arrays filled by the masked passes.
struct Outputs {
    spin_phase: Vec<f64>,
    spin_count: Vec<i64>,
    spin_period: Vec<f64>,
    t_last: Vec<f64>,
    model_phase: Vec<f64>,
    eclipse_delta_phi: Vec<f64>,
}

impl Outputs {
    fn zeros(n: usize) -> Self {
        Outputs {
            spin_phase: vec![0.0; n],
            spin_count: vec![0; n],
            spin_period: vec![0.0; n],
            t_last: vec![0.0; n],
            model_phase: vec![0.0; n],
            eclipse_delta_phi: vec![0.0; n],
        }
    }
}

impl SpinModel {
    /// Index of the segment used for each time.
    ///
    /// `t1` is searched for the last segment starting at or before `t`, `t2`
    /// for the first segment ending at or after `t`. Times before the first
    /// segment map to segment 0, times after the last segment end to the last one.
    fn locate(&self, times: &[UnixSeconds]) -> Vec<usize> {
        let columns = &self.columns;
        let last = self.len() - 1;
        times
            .iter()
            .map(|&t| {
                let started = columns.t1.partition_point(|&t1| t1 <= t);
                let ended = columns.t2.partition_point(|&t2| t2 < t);
                if ended > last {
                    last
                } else {
                    started.saturating_sub(1)
                }
            })
            .collect()
    }

    fn gather(&self, seg_idx: &[usize]) -> Gathered {
        let columns = &self.columns;
        Gathered {
            t1: gather(&columns.t1, seg_idx),
            t2: gather(&columns.t2, seg_idx),
            c1: gather(&columns.c1, seg_idx),
            c2: gather(&columns.c2, seg_idx),
            b: gather(&columns.b, seg_idx),
            c: gather(&columns.c, seg_idx),
            initial_delta_phi: gather(&columns.initial_delta_phi, seg_idx),
            idpu_spinper: gather(&columns.idpu_spinper, seg_idx),
            segflags: gather(&columns.segflags, seg_idx),
        }
    }

    /// Spin state at every time of `times`.
    ///
    /// Arguments
    /// -----------------
    /// * `times`: query times (Unix seconds), in any order.
    /// * `use_correction`: subtract the waveform phase correction from the phase.
    ///
    /// Return
    /// ----------
    /// * One [`SpinState`] per input time, in input order.
    ///
    /// See also
    /// ------------
    /// * [`Segment::interp_t`](crate::segment::Segment::interp_t) – the same formulas for one time and one segment.
    pub fn interp_t(&self, times: &[UnixSeconds], use_correction: bool) -> Vec<SpinState> {
        let n = times.len();
        let seg_idx = self.locate(times);
        let seg = self.gather(&seg_idx);
        let dt: Vec<f64> = times.iter().zip(&seg.t1).map(|(t, t1)| t - t1).collect();
        let mut out = Outputs::zeros(n);

        let before: Vec<usize> = (0..n).filter(|&k| times[k] < seg.t1[k]).collect();
        let after: Vec<usize> = (0..n).filter(|&k| times[k] > seg.t2[k]).collect();
        let inside: Vec<usize> = (0..n)
            .filter(|&k| times[k] >= seg.t1[k] && times[k] <= seg.t2[k])
            .collect();

        // Before start: count whole spins backward at the start rate
        for &k in &before {
            let spinper = DEG_PER_SPIN / seg.b[k];
            let fracspins = snap_spins(-dt[k] / spinper);
            let intspins = fracspins.ceil();
            out.spin_period[k] = spinper;
            out.spin_phase[k] = (intspins - fracspins) * DEG_PER_SPIN;
            out.spin_count[k] = seg.c1[k] - intspins as i64;
            out.t_last[k] = seg.t1[k] - intspins * spinper;
            out.model_phase[k] = seg.b[k] * dt[k];
        }

        // After end: count whole spins forward at the end rate
        for &k in &after {
            let duration = seg.t2[k] - seg.t1[k];
            let end_rate = seg.b[k] + 2.0 * seg.c[k] * duration;
            let spinper = DEG_PER_SPIN / end_rate;
            let (intspins, phase) = split_spins((times[k] - seg.t2[k]) / spinper);
            out.spin_period[k] = spinper;
            out.spin_phase[k] = phase;
            out.spin_count[k] = seg.c2[k] + intspins as i64;
            out.t_last[k] = seg.t2[k] + intspins * spinper;
            out.model_phase[k] = seg.b[k] * duration
                + seg.c[k] * duration * duration
                + end_rate * (times[k] - seg.t2[k]);
        }

        // Inside: quadratic phase, whole spins kept for the last-crossing solve
        let mut whole_spins = vec![0.0; n];
        for &k in &inside {
            let phi = seg.b[k] * dt[k] + seg.c[k] * dt[k] * dt[k];
            let (intspins, phase) = split_spins(phi / DEG_PER_SPIN);
            out.spin_period[k] = DEG_PER_SPIN / (seg.b[k] + 2.0 * seg.c[k] * dt[k]);
            out.spin_phase[k] = phase;
            out.spin_count[k] = seg.c1[k] + intspins as i64;
            out.model_phase[k] = phi;
            whole_spins[k] = intspins;
        }

        let eps = self.config.accel_epsilon;
        let (linear, quadratic): (Vec<usize>, Vec<usize>) =
            inside.iter().partition(|&&k| seg.c[k].abs() < eps);
        for &k in &linear {
            out.t_last[k] = seg.t1[k] + whole_spins[k] * DEG_PER_SPIN / seg.b[k];
        }
        for &k in &quadratic {
            out.t_last[k] = seg.t1[k]
                + elapsed_for_phase(whole_spins[k] * DEG_PER_SPIN, seg.b[k], seg.c[k], eps);
        }

        // Eclipse: model phase against the phase implied by the onboard period
        let min_idpu = self.config.min_idpu_spinper;
        let eclipse: Vec<usize> = (0..n)
            .filter(|&k| {
                seg.segflags[k].contains(SegmentFlags::ECLIPSE_OFFSET)
                    && seg.idpu_spinper[k] > min_idpu
            })
            .collect();
        for &k in &eclipse {
            let idpu_phase = DEG_PER_SPIN * dt[k] / seg.idpu_spinper[k];
            out.eclipse_delta_phi[k] = seg.initial_delta_phi[k] + (out.model_phase[k] - idpu_phase);
        }

        if use_correction && !self.phase_correction.is_empty() {
            for (phase, &t) in out.spin_phase.iter_mut().zip(times) {
                *phase = wrap_degrees(*phase - self.phase_correction.at(t));
            }
        }

        (0..n)
            .map(|k| SpinState {
                spin_phase: out.spin_phase[k],
                spin_count: out.spin_count[k],
                spin_period: out.spin_period[k],
                t_last: out.t_last[k],
                eclipse_delta_phi: out.eclipse_delta_phi[k],
                segflags: seg.segflags[k],
                seg_index: seg_idx[k],
                dt: dt[k],
            })
            .collect()
    }

    /// Time at which each (possibly fractional) spin count of `counts` is reached.
    ///
    /// Counts below the first segment or above the last one are extrapolated at
    /// the boundary rate, as in [`Self::interp_t`].
    pub fn interp_n(&self, counts: &[f64]) -> Vec<UnixSeconds> {
        let columns = &self.columns;
        let last = self.len() - 1;
        counts
            .iter()
            .map(|&count| {
                let started = columns.c1.partition_point(|&c1| (c1 as f64) <= count);
                let ended = columns.c2.partition_point(|&c2| (c2 as f64) < count);
                let i = if ended > last {
                    last
                } else {
                    started.saturating_sub(1)
                };
                columns.segment(i).interp_n(count, &self.config)
            })
            .collect()
    }
}
