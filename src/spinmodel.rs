//! # Spin model: columnar segment storage and introspection
//!
//! A [`SpinModel`] owns the finished segment chain of one probe at one
//! [`CorrectionLevel`]. Segments are assembled one record at a time by the
//! [`SpinModelBuilder`](crate::builder::SpinModelBuilder), then converted once into
//! [`SegmentColumns`], one array per attribute, so that batch queries
//! ([`SpinModel::interp_t`], [`SpinModel::interp_n`]) work on flat slices.
//!
//! ## Lifecycle
//!
//! 1. **Build** — [`SpinModelBuilder::finish`](crate::builder::SpinModelBuilder::finish).
//! 2. **Correct** — [`SpinModel::apply_corrections`] (level 2 only); the only mutation.
//! 3. **Query** — any number of concurrent readers, typically through an
//!    `Arc<SpinModel>` handed out by the [`SpinModelRegistry`](crate::registry::SpinModelRegistry).
//!
//! ## Invariants
//!
//! For consecutive segments `i`, `i + 1`: `t2[i] == t1[i + 1]` within the
//! contiguity tolerance and `c2[i] == c1[i + 1]`; for every segment
//! `t1 < t2` and `c1 <= c2`. [`SpinModel::validate`] checks all of them.

use std::fmt;

use itertools::Itertools;

use crate::{
    config::SpinModelConfig,
    constants::{CorrectionLevel, Degree, Probe, Second, UnixSeconds},
    correction::{CorrectionWindow, PhaseCorrection},
    segment::{Segment, SegmentFlags},
    spinmodel_errors::SpinModelError,
};

/// Segment attributes laid out as parallel arrays, indexed in temporal order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentColumns {
    pub t1: Vec<UnixSeconds>,
    pub t2: Vec<UnixSeconds>,
    pub c1: Vec<i64>,
    pub c2: Vec<i64>,
    pub b: Vec<f64>,
    pub c: Vec<f64>,
    pub npts: Vec<u32>,
    pub maxgap: Vec<Second>,
    pub phaserr: Vec<Second>,
    pub initial_delta_phi: Vec<Degree>,
    pub idpu_spinper: Vec<Second>,
    pub segflags: Vec<SegmentFlags>,
}

impl SegmentColumns {
    /// Single conversion step from the construction-time segment list.
    pub fn from_segments(segments: &[Segment]) -> Self {
        SegmentColumns {
            t1: segments.iter().map(|s| s.t1).collect(),
            t2: segments.iter().map(|s| s.t2).collect(),
            c1: segments.iter().map(|s| s.c1).collect(),
            c2: segments.iter().map(|s| s.c2).collect(),
            b: segments.iter().map(|s| s.b).collect(),
            c: segments.iter().map(|s| s.c).collect(),
            npts: segments.iter().map(|s| s.npts).collect(),
            maxgap: segments.iter().map(|s| s.maxgap).collect(),
            phaserr: segments.iter().map(|s| s.phaserr).collect(),
            initial_delta_phi: segments.iter().map(|s| s.initial_delta_phi).collect(),
            idpu_spinper: segments.iter().map(|s| s.idpu_spinper).collect(),
            segflags: segments.iter().map(|s| s.segflags).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.t1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t1.is_empty()
    }

    /// Reassemble the segment stored at index `i`.
    ///
    /// Panics if `i` is out of bounds.
    pub fn segment(&self, i: usize) -> Segment {
        Segment {
            t1: self.t1[i],
            t2: self.t2[i],
            c1: self.c1[i],
            c2: self.c2[i],
            b: self.b[i],
            c: self.c[i],
            npts: self.npts[i],
            maxgap: self.maxgap[i],
            phaserr: self.phaserr[i],
            initial_delta_phi: self.initial_delta_phi[i],
            idpu_spinper: self.idpu_spinper[i],
            segflags: self.segflags[i],
        }
    }
}

/// Piecewise-quadratic spin model of one probe at one correction level.
#[derive(Debug, Clone)]
pub struct SpinModel {
    pub(crate) probe: Probe,
    pub(crate) level: CorrectionLevel,
    pub(crate) columns: SegmentColumns,
    pub(crate) phase_correction: PhaseCorrection,
    pub(crate) fgm_corrections: Vec<CorrectionWindow>,
    pub(crate) config: SpinModelConfig,
}

impl SpinModel {
    /// Wrap already contiguous segments into a model.
    ///
    /// Most callers go through [`SpinModelBuilder`](crate::builder::SpinModelBuilder),
    /// which enforces contiguity; this constructor only rejects an empty list.
    pub fn from_segments(
        probe: &str,
        level: CorrectionLevel,
        segments: &[Segment],
        phase_correction: PhaseCorrection,
        config: SpinModelConfig,
    ) -> Result<Self, SpinModelError> {
        if segments.is_empty() {
            return Err(SpinModelError::EmptyModel);
        }
        Ok(SpinModel {
            probe: probe.to_string(),
            level,
            columns: SegmentColumns::from_segments(segments),
            phase_correction,
            fgm_corrections: Vec::new(),
            config,
        })
    }

    pub fn probe(&self) -> &str {
        &self.probe
    }

    pub fn level(&self) -> CorrectionLevel {
        self.level
    }

    pub fn config(&self) -> &SpinModelConfig {
        &self.config
    }

    /// Read-only view on the columnar storage.
    pub fn columns(&self) -> &SegmentColumns {
        &self.columns
    }

    pub fn phase_correction(&self) -> &PhaseCorrection {
        &self.phase_correction
    }

    /// FGM windows applied to this model, in application order.
    pub fn fgm_corrections(&self) -> &[CorrectionWindow] {
        &self.fgm_corrections
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Segment records in temporal order.
    pub fn segments(&self) -> Vec<Segment> {
        (0..self.len()).map(|i| self.columns.segment(i)).collect()
    }

    /// Time span covered by the model: start of the first segment, end of the last.
    pub fn get_timerange(&self) -> (UnixSeconds, UnixSeconds) {
        // A model always holds at least one segment
        (self.columns.t1[0], self.columns.t2[self.len() - 1])
    }

    /// Eclipse intervals contained in the model.
    ///
    /// Runs of adjacent segments flagged [`SegmentFlags::ECLIPSE`] are merged
    /// into a single `(start, end)` interval.
    ///
    /// Arguments
    /// -----------------
    /// * `min_duration`: intervals shorter than this (s) are dropped.
    pub fn get_eclipse_times(&self, min_duration: Second) -> Vec<(UnixSeconds, UnixSeconds)> {
        let columns = &self.columns;
        (0..self.len())
            .chunk_by(move |&i| columns.segflags[i].contains(SegmentFlags::ECLIPSE))
            .into_iter()
            .filter(|(in_eclipse, _)| *in_eclipse)
            .filter_map(move |(_, mut run)| {
                let first = run.next()?;
                let last = run.last().unwrap_or(first);
                Some((columns.t1[first], columns.t2[last]))
            })
            .filter(|(start, end)| end - start >= min_duration)
            .collect()
    }

    /// Check the ordering and continuity invariants of the segment chain.
    pub fn validate(&self) -> Result<(), SpinModelError> {
        let columns = &self.columns;
        let tolerance = self.config.contiguity_tolerance;

        for i in 0..self.len() {
            if columns.t1[i] >= columns.t2[i] {
                return Err(SpinModelError::InvariantViolation(format!(
                    "segment {i}: t1 {} >= t2 {}",
                    columns.t1[i], columns.t2[i]
                )));
            }
            if columns.c1[i] > columns.c2[i] {
                return Err(SpinModelError::InvariantViolation(format!(
                    "segment {i}: c1 {} > c2 {}",
                    columns.c1[i], columns.c2[i]
                )));
            }
        }

        if let Some((i, _)) = (0..self.len())
            .tuple_windows()
            .find(|&(i, j)| (columns.t2[i] - columns.t1[j]).abs() > tolerance)
        {
            return Err(SpinModelError::InvariantViolation(format!(
                "segments {i} and {}: t2 {} != t1 {}",
                i + 1,
                columns.t2[i],
                columns.t1[i + 1]
            )));
        }

        if let Some((i, _)) = (0..self.len())
            .tuple_windows()
            .find(|&(i, j)| columns.c2[i] != columns.c1[j])
        {
            return Err(SpinModelError::InvariantViolation(format!(
                "segments {i} and {}: c2 {} != c1 {}",
                i + 1,
                columns.c2[i],
                columns.c1[i + 1]
            )));
        }

        Ok(())
    }
}

impl fmt::Display for SpinModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (start, end) = self.get_timerange();
        writeln!(
            f,
            "Spin model {} {}: {} segment(s) over [{start:.6}, {end:.6}]",
            self.probe,
            self.level,
            self.len()
        )?;
        for (i, segment) in self.segments().iter().enumerate() {
            writeln!(f, "{i:>6} {segment}")?;
        }
        Ok(())
    }
}
