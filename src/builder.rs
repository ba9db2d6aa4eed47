//! # Spin model construction
//!
//! [`SpinModelBuilder`] turns telemetry records, taken in time order, into a
//! contiguous chain of [`Segment`]s and finally into a [`SpinModel`].
//!
//! ## Stitching rules (`addseg`)
//!
//! Let `gap` be the time between the end of the last accepted segment and the
//! start of the new one, expressed in spins at the last segment's end rate:
//!
//! | gap (spins)          | action                                                    |
//! |----------------------|-----------------------------------------------------------|
//! | `abs(gap) <= tol`    | append, offsetting the new spin counts                    |
//! | `>= 0.5`             | insert a constant-rate bridge of `round(gap)` spins, then append |
//! | `[-0.5, 0.5)`        | [`SpinModelError::ShortGap`], construction aborts          |
//! | `< -0.5`             | [`SpinModelError::NegativeGap`], construction aborts       |
//!
//! Bridges are expected at UTC day boundaries, where consecutive telemetry
//! files do not overlap.

use log::{debug, info};

use crate::{
    config::SpinModelConfig,
    constants::{CorrectionLevel, DEG_PER_SPIN},
    correction::{CorrectionWindow, PhaseCorrection},
    segment::Segment,
    spinmodel::SpinModel,
    spinmodel_errors::SpinModelError,
    telemetry::{SegmentRecord, SegmentTable},
    time::{crosses_utc_midnight, format_unix},
};

/// Incremental builder of a segment chain.
#[derive(Debug, Clone)]
pub struct SpinModelBuilder {
    config: SpinModelConfig,
    segments: Vec<Segment>,
    bridge_count: usize,
    day_boundary_bridges: usize,
}

impl SpinModelBuilder {
    pub fn new(config: SpinModelConfig) -> Self {
        SpinModelBuilder {
            config,
            segments: Vec::new(),
            bridge_count: 0,
            day_boundary_bridges: 0,
        }
    }

    /// Builder fed with every record of `records`, in order.
    pub fn from_records(
        records: &[SegmentRecord],
        config: SpinModelConfig,
    ) -> Result<Self, SpinModelError> {
        let mut builder = SpinModelBuilder::new(config);
        for record in records {
            builder.addseg(Segment::from_record(record, &config)?)?;
        }
        Ok(builder)
    }

    /// Segments accepted so far, bridges included.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of bridge segments synthesized so far.
    pub fn bridge_count(&self) -> usize {
        self.bridge_count
    }

    /// Number of bridges whose gap contains a UTC midnight.
    pub fn day_boundary_bridges(&self) -> usize {
        self.day_boundary_bridges
    }

    /// Append one segment to the chain.
    ///
    /// The new segment carries local spin counts (`c1 = 0`); they are shifted so
    /// that the global count stays continuous. See the module documentation for
    /// the gap rules.
    ///
    /// Return
    /// ----------
    /// * `Ok(())` once the segment, and a bridge if one was needed, is appended.
    /// * [`SpinModelError::ShortGap`] or [`SpinModelError::NegativeGap`] for gaps
    ///   that cannot be bridged; the chain is left unchanged.
    pub fn addseg(&mut self, mut newseg: Segment) -> Result<(), SpinModelError> {
        let Some(lastseg) = self.segments.last().cloned() else {
            self.segments.push(newseg);
            return Ok(());
        };

        let gap_time = newseg.t1 - lastseg.t2;
        if gap_time.abs() <= self.config.contiguity_tolerance {
            newseg.shift_counts(lastseg.c2);
            self.segments.push(newseg);
            return Ok(());
        }

        let last_spinper = DEG_PER_SPIN / lastseg.end_rate();
        let gap_spins = gap_time / last_spinper;

        if gap_spins >= self.config.bridge_threshold_spins {
            let bridge = self.bridge(&lastseg, gap_time, gap_spins);
            newseg.shift_counts(bridge.c2);
            self.segments.push(bridge);
            self.segments.push(newseg);
            Ok(())
        } else if gap_spins >= -self.config.bridge_threshold_spins {
            Err(SpinModelError::ShortGap {
                prev_end: lastseg.t2,
                next_start: newseg.t1,
                gap_spins,
            })
        } else {
            Err(SpinModelError::NegativeGap {
                prev_end: lastseg.t2,
                next_start: newseg.t1,
                gap_spins,
            })
        }
    }

    /// Constant-rate segment covering `gap_time` seconds after `lastseg` with an
    /// integral number of spins.
    fn bridge(&mut self, lastseg: &Segment, gap_time: f64, gap_spins: f64) -> Segment {
        let nspins = gap_spins.round().max(1.0);
        let spinper = gap_time / nspins;

        let crosses_midnight = crosses_utc_midnight(lastseg.t2, lastseg.t2 + gap_time);
        self.bridge_count += 1;
        if crosses_midnight {
            self.day_boundary_bridges += 1;
        }
        debug!(
            "Bridging {gap_time:.3} s gap after {} with {nspins} spin(s) of {spinper:.6} s (UTC midnight: {crosses_midnight})",
            format_unix(lastseg.t2)
        );

        Segment {
            t1: lastseg.t2,
            t2: lastseg.t2 + gap_time,
            c1: lastseg.c2,
            c2: lastseg.c2 + nspins as i64,
            b: DEG_PER_SPIN / spinper,
            c: 0.0,
            npts: 0,
            maxgap: gap_time,
            phaserr: 0.0,
            initial_delta_phi: lastseg.eclipse_delta_phi(lastseg.duration(), &self.config),
            idpu_spinper: lastseg.idpu_spinper,
            segflags: lastseg.segflags,
        }
    }

    /// Convert the chain into its columnar model.
    ///
    /// Return
    /// ----------
    /// * The model, or [`SpinModelError::EmptyModel`] if no segment was added,
    ///   or [`SpinModelError::InvariantViolation`] if the chain is not ordered and contiguous.
    pub fn finish(
        self,
        probe: &str,
        level: CorrectionLevel,
        phase_correction: PhaseCorrection,
    ) -> Result<SpinModel, SpinModelError> {
        let model =
            SpinModel::from_segments(probe, level, &self.segments, phase_correction, self.config)?;
        model.validate()?;
        let (start, end) = model.get_timerange();
        info!(
            "Built spin model {probe} {level}: {} segment(s), {} bridge(s) ({} at UTC midnight), {} to {}",
            model.len(),
            self.bridge_count,
            self.day_boundary_bridges,
            format_unix(start),
            format_unix(end)
        );
        Ok(model)
    }
}

impl SpinModel {
    /// Build, and correct when appropriate, the model of `probe` at `level`.
    ///
    /// Arguments
    /// -----------------
    /// * `table`: segment telemetry of the probe at this level.
    /// * `phase_correction`: waveform correction curve, attached to the model.
    /// * `fgm_corrections`: eclipse windows, applied only at [`CorrectionLevel::SpinFitCorrected`].
    /// * `config`: construction tolerances.
    ///
    /// Return
    /// ----------
    /// * The finished model, or the first error met: missing/mismatched telemetry,
    ///   an unbridgeable gap, or an empty table. No partial model is returned.
    pub fn from_telemetry(
        probe: &str,
        level: CorrectionLevel,
        table: &SegmentTable,
        phase_correction: PhaseCorrection,
        fgm_corrections: &[CorrectionWindow],
        config: SpinModelConfig,
    ) -> Result<SpinModel, SpinModelError> {
        let records = table.records(probe, level)?;
        let builder = SpinModelBuilder::from_records(&records, config)?;
        let mut model = builder.finish(probe, level, phase_correction)?;
        if level == CorrectionLevel::SpinFitCorrected {
            model.apply_corrections(fgm_corrections);
        }
        Ok(model)
    }
}
