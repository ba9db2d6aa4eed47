//! # Telemetry inputs of the spin model
//!
//! The model is built from per-segment telemetry arrays that are produced
//! elsewhere (CDF ingestion, variable stores). This module defines only what
//! the builder consumes:
//!
//! 1. [`SegmentTable`] — equal-length columns, one entry per telemetry segment.
//!    Columns are optional so that a store can report what it actually holds;
//!    [`SegmentTable::records`] checks presence and lengths.
//! 2. [`SegmentRecord`] — one validated row of a table.
//! 3. [`SpinTelemetryStore`] — the lookup seam used by
//!    [`SpinModelRegistry::load_probe`](crate::registry::SpinModelRegistry::load_probe),
//!    with an in-memory and a CSV-backed implementation.
//!
//! ## CSV layout
//!
//! [`CsvTelemetryStore`] reads a directory containing, per probe:
//!
//! ```text
//! <probe>_segments_l<level>.csv   tend,spinper,c,phaserr,nspins,npts,maxgap[,initial_delta_phi,idpu_spinper,segflags]
//! <probe>_spin_correction.csv     time,correction
//! <probe>_fgm_corrections.csv     start,end,offset
//! ```
//!
//! Missing files are reported as absent data, not as errors.

use std::collections::HashMap;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::{
    constants::{CorrectionLevel, Degree, Probe, Second, UnixSeconds},
    correction::{CorrectionWindow, PhaseCorrection},
    spinmodel_errors::SpinModelError,
};

/// One telemetry segment, as consumed by [`Segment::from_record`](crate::segment::Segment::from_record).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
    pub tend: UnixSeconds,
    pub spinper: Second,
    pub c: f64,
    pub phaserr: Second,
    pub nspins: i64,
    pub npts: u32,
    pub maxgap: Second,
    pub initial_delta_phi: Degree,
    pub idpu_spinper: Second,
    pub segflags: u8,
}

/// Column-oriented telemetry for one probe and correction level.
///
/// `initial_delta_phi`, `idpu_spinper` and `segflags` only exist once eclipse
/// corrections have been computed; at [`CorrectionLevel::Raw`] they may be
/// absent and default to zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentTable {
    pub tend: Option<Vec<UnixSeconds>>,
    pub spinper: Option<Vec<Second>>,
    pub c: Option<Vec<f64>>,
    pub phaserr: Option<Vec<Second>>,
    pub nspins: Option<Vec<i64>>,
    pub npts: Option<Vec<u32>>,
    pub maxgap: Option<Vec<Second>>,
    pub initial_delta_phi: Option<Vec<Degree>>,
    pub idpu_spinper: Option<Vec<Second>>,
    pub segflags: Option<Vec<u8>>,
}

fn required<'a, T>(
    column: &'a Option<Vec<T>>,
    field: &'static str,
    probe: &str,
    level: CorrectionLevel,
) -> Result<&'a [T], SpinModelError> {
    column
        .as_deref()
        .ok_or_else(|| SpinModelError::MissingTelemetry {
            probe: probe.to_string(),
            level,
            field,
        })
}

fn check_len<T>(column: &[T], field: &'static str, expected: usize) -> Result<(), SpinModelError> {
    if column.len() == expected {
        Ok(())
    } else {
        Err(SpinModelError::LengthMismatch {
            field,
            expected,
            found: column.len(),
        })
    }
}

impl SegmentTable {
    /// Number of segments announced by the `tend` column.
    pub fn len(&self) -> usize {
        self.tend.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build a table with every column filled from already validated rows.
    pub fn from_records(records: &[SegmentRecord]) -> Self {
        SegmentTable {
            tend: Some(records.iter().map(|r| r.tend).collect()),
            spinper: Some(records.iter().map(|r| r.spinper).collect()),
            c: Some(records.iter().map(|r| r.c).collect()),
            phaserr: Some(records.iter().map(|r| r.phaserr).collect()),
            nspins: Some(records.iter().map(|r| r.nspins).collect()),
            npts: Some(records.iter().map(|r| r.npts).collect()),
            maxgap: Some(records.iter().map(|r| r.maxgap).collect()),
            initial_delta_phi: Some(records.iter().map(|r| r.initial_delta_phi).collect()),
            idpu_spinper: Some(records.iter().map(|r| r.idpu_spinper).collect()),
            segflags: Some(records.iter().map(|r| r.segflags).collect()),
        }
    }

    /// Validate the table and turn it into rows.
    ///
    /// Arguments
    /// -----------------
    /// * `probe`, `level`: only used to label errors.
    ///
    /// Return
    /// ----------
    /// * The rows in table order, or
    ///   [`SpinModelError::MissingTelemetry`] when a required column is absent (the
    ///   eclipse columns are required above [`CorrectionLevel::Raw`]), or
    ///   [`SpinModelError::LengthMismatch`] when columns disagree in length.
    pub fn records(
        &self,
        probe: &str,
        level: CorrectionLevel,
    ) -> Result<Vec<SegmentRecord>, SpinModelError> {
        let tend = required(&self.tend, "tend", probe, level)?;
        let spinper = required(&self.spinper, "spinper", probe, level)?;
        let c = required(&self.c, "c", probe, level)?;
        let phaserr = required(&self.phaserr, "phaserr", probe, level)?;
        let nspins = required(&self.nspins, "nspins", probe, level)?;
        let npts = required(&self.npts, "npts", probe, level)?;
        let maxgap = required(&self.maxgap, "maxgap", probe, level)?;

        let n = tend.len();
        check_len(spinper, "spinper", n)?;
        check_len(c, "c", n)?;
        check_len(phaserr, "phaserr", n)?;
        check_len(nspins, "nspins", n)?;
        check_len(npts, "npts", n)?;
        check_len(maxgap, "maxgap", n)?;

        let (initial_delta_phi, idpu_spinper, segflags) = if level == CorrectionLevel::Raw {
            (
                self.initial_delta_phi.clone().unwrap_or_else(|| vec![0.0; n]),
                self.idpu_spinper.clone().unwrap_or_else(|| vec![0.0; n]),
                self.segflags.clone().unwrap_or_else(|| vec![0; n]),
            )
        } else {
            (
                required(&self.initial_delta_phi, "initial_delta_phi", probe, level)?.to_vec(),
                required(&self.idpu_spinper, "idpu_spinper", probe, level)?.to_vec(),
                required(&self.segflags, "segflags", probe, level)?.to_vec(),
            )
        };
        check_len(&initial_delta_phi, "initial_delta_phi", n)?;
        check_len(&idpu_spinper, "idpu_spinper", n)?;
        check_len(&segflags, "segflags", n)?;

        Ok((0..n)
            .map(|i| SegmentRecord {
                tend: tend[i],
                spinper: spinper[i],
                c: c[i],
                phaserr: phaserr[i],
                nspins: nspins[i],
                npts: npts[i],
                maxgap: maxgap[i],
                initial_delta_phi: initial_delta_phi[i],
                idpu_spinper: idpu_spinper[i],
                segflags: segflags[i],
            })
            .collect())
    }
}

/// Source of the arrays needed to build the models of a probe.
///
/// Every method returns `Ok(None)` when the data simply does not exist, and an
/// error only when existing data cannot be read.
pub trait SpinTelemetryStore {
    /// Segment columns of `probe` at `level`.
    fn segment_table(
        &self,
        probe: &str,
        level: CorrectionLevel,
    ) -> Result<Option<SegmentTable>, SpinModelError>;

    /// Dense waveform phase-correction curve of `probe`.
    fn phase_correction(&self, probe: &str) -> Result<Option<PhaseCorrection>, SpinModelError>;

    /// FGM-derived eclipse correction windows of `probe`.
    fn fgm_corrections(&self, probe: &str)
        -> Result<Option<Vec<CorrectionWindow>>, SpinModelError>;
}

/// Store holding already materialized arrays.
#[derive(Debug, Clone, Default)]
pub struct MemoryTelemetryStore {
    tables: HashMap<(Probe, CorrectionLevel), SegmentTable>,
    phase_corrections: HashMap<Probe, PhaseCorrection>,
    fgm_corrections: HashMap<Probe, Vec<CorrectionWindow>>,
}

impl MemoryTelemetryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_table(&mut self, probe: &str, level: CorrectionLevel, table: SegmentTable) {
        self.tables.insert((probe.to_string(), level), table);
    }

    pub fn insert_phase_correction(&mut self, probe: &str, correction: PhaseCorrection) {
        self.phase_corrections.insert(probe.to_string(), correction);
    }

    pub fn insert_fgm_corrections(&mut self, probe: &str, windows: Vec<CorrectionWindow>) {
        self.fgm_corrections.insert(probe.to_string(), windows);
    }
}

impl SpinTelemetryStore for MemoryTelemetryStore {
    fn segment_table(
        &self,
        probe: &str,
        level: CorrectionLevel,
    ) -> Result<Option<SegmentTable>, SpinModelError> {
        Ok(self.tables.get(&(probe.to_string(), level)).cloned())
    }

    fn phase_correction(&self, probe: &str) -> Result<Option<PhaseCorrection>, SpinModelError> {
        Ok(self.phase_corrections.get(probe).cloned())
    }

    fn fgm_corrections(
        &self,
        probe: &str,
    ) -> Result<Option<Vec<CorrectionWindow>>, SpinModelError> {
        Ok(self.fgm_corrections.get(probe).cloned())
    }
}

/// One line of a segment CSV file. Every column may be missing from the header.
#[derive(Debug, Deserialize)]
struct SegmentRow {
    #[serde(default)]
    tend: Option<f64>,
    #[serde(default)]
    spinper: Option<f64>,
    #[serde(default)]
    c: Option<f64>,
    #[serde(default)]
    phaserr: Option<f64>,
    #[serde(default)]
    nspins: Option<i64>,
    #[serde(default)]
    npts: Option<u32>,
    #[serde(default)]
    maxgap: Option<f64>,
    #[serde(default)]
    initial_delta_phi: Option<f64>,
    #[serde(default)]
    idpu_spinper: Option<f64>,
    #[serde(default)]
    segflags: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct CorrectionRow {
    time: f64,
    correction: f64,
}

/// Read a segment table from a CSV file with a header row.
///
/// A column is reported as present only if every row carries a value for it.
pub fn read_segment_table_csv(path: &Utf8Path) -> Result<SegmentTable, SpinModelError> {
    let mut reader = csv::Reader::from_path(path)?;
    let rows = reader
        .deserialize::<SegmentRow>()
        .collect::<Result<Vec<_>, _>>()?;

    fn column<T>(rows: &[SegmentRow], get: impl Fn(&SegmentRow) -> Option<T>) -> Option<Vec<T>> {
        rows.iter().map(get).collect()
    }

    Ok(SegmentTable {
        tend: column(&rows, |r| r.tend),
        spinper: column(&rows, |r| r.spinper),
        c: column(&rows, |r| r.c),
        phaserr: column(&rows, |r| r.phaserr),
        nspins: column(&rows, |r| r.nspins),
        npts: column(&rows, |r| r.npts),
        maxgap: column(&rows, |r| r.maxgap),
        initial_delta_phi: column(&rows, |r| r.initial_delta_phi),
        idpu_spinper: column(&rows, |r| r.idpu_spinper),
        segflags: column(&rows, |r| r.segflags),
    })
}

/// Read a `time,correction` curve.
pub fn read_phase_correction_csv(path: &Utf8Path) -> Result<PhaseCorrection, SpinModelError> {
    let mut reader = csv::Reader::from_path(path)?;
    let rows = reader
        .deserialize::<CorrectionRow>()
        .collect::<Result<Vec<_>, _>>()?;
    let (times, values): (Vec<_>, Vec<_>) = rows.iter().map(|r| (r.time, r.correction)).unzip();
    PhaseCorrection::new(times, values)
}

/// Read a list of `start,end,offset` windows.
pub fn read_fgm_corrections_csv(path: &Utf8Path) -> Result<Vec<CorrectionWindow>, SpinModelError> {
    let mut reader = csv::Reader::from_path(path)?;
    let windows = reader
        .deserialize::<CorrectionWindow>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(windows)
}

/// Directory of CSV files, see the module documentation for the naming scheme.
#[derive(Debug, Clone)]
pub struct CsvTelemetryStore {
    root: Utf8PathBuf,
}

impl CsvTelemetryStore {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        CsvTelemetryStore { root: root.into() }
    }

    fn existing(&self, file_name: String) -> Option<Utf8PathBuf> {
        let path = self.root.join(file_name);
        path.is_file().then_some(path)
    }
}

impl SpinTelemetryStore for CsvTelemetryStore {
    fn segment_table(
        &self,
        probe: &str,
        level: CorrectionLevel,
    ) -> Result<Option<SegmentTable>, SpinModelError> {
        self.existing(format!("{probe}_segments_l{}.csv", level.as_u8()))
            .map(|path| read_segment_table_csv(&path))
            .transpose()
    }

    fn phase_correction(&self, probe: &str) -> Result<Option<PhaseCorrection>, SpinModelError> {
        self.existing(format!("{probe}_spin_correction.csv"))
            .map(|path| read_phase_correction_csv(&path))
            .transpose()
    }

    fn fgm_corrections(
        &self,
        probe: &str,
    ) -> Result<Option<Vec<CorrectionWindow>>, SpinModelError> {
        self.existing(format!("{probe}_fgm_corrections.csv"))
            .map(|path| read_fgm_corrections_csv(&path))
            .transpose()
    }
}

#[cfg(test)]
mod telemetry_test {
    use super::*;

    fn raw_table() -> SegmentTable {
        SegmentTable {
            tend: Some(vec![60.0, 120.0]),
            spinper: Some(vec![60.0, 60.0]),
            c: Some(vec![0.0, 0.0]),
            phaserr: Some(vec![0.0, 0.0]),
            nspins: Some(vec![1, 1]),
            npts: Some(vec![5, 5]),
            maxgap: Some(vec![0.0, 0.0]),
            ..Default::default()
        }
    }

    #[test]
    fn test_records_raw_defaults() {
        let records = raw_table().records("tha", CorrectionLevel::Raw).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].tend, 120.0);
        assert_eq!(records[1].segflags, 0);
        assert_eq!(records[1].idpu_spinper, 0.0);
    }

    #[test]
    fn test_records_missing_fields() {
        let err = raw_table()
            .records("tha", CorrectionLevel::WaveformCorrected)
            .unwrap_err();
        assert_eq!(
            err,
            SpinModelError::MissingTelemetry {
                probe: "tha".into(),
                level: CorrectionLevel::WaveformCorrected,
                field: "initial_delta_phi",
            }
        );

        let table = SegmentTable {
            spinper: None,
            ..raw_table()
        };
        assert!(matches!(
            table.records("tha", CorrectionLevel::Raw),
            Err(SpinModelError::MissingTelemetry {
                field: "spinper",
                ..
            })
        ));
    }

    #[test]
    fn test_records_length_mismatch() {
        let table = SegmentTable {
            npts: Some(vec![5]),
            ..raw_table()
        };
        assert_eq!(
            table.records("tha", CorrectionLevel::Raw).unwrap_err(),
            SpinModelError::LengthMismatch {
                field: "npts",
                expected: 2,
                found: 1,
            }
        );
    }

    #[test]
    fn test_from_records_round_trip() {
        let records = raw_table().records("tha", CorrectionLevel::Raw).unwrap();
        let table = SegmentTable::from_records(&records);
        assert_eq!(
            table.records("tha", CorrectionLevel::SpinFitCorrected).unwrap(),
            records
        );
    }
}
