use thiserror::Error;

use crate::constants::{CorrectionLevel, UnixSeconds};

#[derive(Error, Debug)]
pub enum SpinModelError {
    #[error(
        "Short gap of {gap_spins:.3} spins between segment ending at {prev_end} and segment starting at {next_start}"
    )]
    ShortGap {
        prev_end: UnixSeconds,
        next_start: UnixSeconds,
        gap_spins: f64,
    },

    #[error(
        "Negative gap of {gap_spins:.3} spins: segment starting at {next_start} precedes previous end {prev_end}"
    )]
    NegativeGap {
        prev_end: UnixSeconds,
        next_start: UnixSeconds,
        gap_spins: f64,
    },

    #[error("Missing telemetry field `{field}` for probe {probe} at {level}")]
    MissingTelemetry {
        probe: String,
        level: CorrectionLevel,
        field: &'static str,
    },

    #[error("Telemetry field `{field}` has {found} values, expected {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Invalid telemetry record ending at {tend}: {reason}")]
    InvalidRecord { tend: UnixSeconds, reason: String },

    #[error("Spin model contains no segment")]
    EmptyModel,

    #[error("Invalid correction level: {0}")]
    InvalidCorrectionLevel(u8),

    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Spin model invariant violated: {0}")]
    InvariantViolation(String),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),
}

impl PartialEq for SpinModelError {
    fn eq(&self, other: &Self) -> bool {
        use SpinModelError::*;
        match (self, other) {
            (
                ShortGap {
                    prev_end: a1,
                    next_start: b1,
                    gap_spins: g1,
                },
                ShortGap {
                    prev_end: a2,
                    next_start: b2,
                    gap_spins: g2,
                },
            ) => a1 == a2 && b1 == b2 && g1 == g2,
            (
                NegativeGap {
                    prev_end: a1,
                    next_start: b1,
                    gap_spins: g1,
                },
                NegativeGap {
                    prev_end: a2,
                    next_start: b2,
                    gap_spins: g2,
                },
            ) => a1 == a2 && b1 == b2 && g1 == g2,
            (
                MissingTelemetry {
                    probe: p1,
                    level: l1,
                    field: f1,
                },
                MissingTelemetry {
                    probe: p2,
                    level: l2,
                    field: f2,
                },
            ) => p1 == p2 && l1 == l2 && f1 == f2,
            (
                LengthMismatch {
                    field: f1,
                    expected: e1,
                    found: n1,
                },
                LengthMismatch {
                    field: f2,
                    expected: e2,
                    found: n2,
                },
            ) => f1 == f2 && e1 == e2 && n1 == n2,
            (
                InvalidRecord {
                    tend: t1,
                    reason: r1,
                },
                InvalidRecord {
                    tend: t2,
                    reason: r2,
                },
            ) => t1 == t2 && r1 == r2,
            (InvalidCorrectionLevel(a), InvalidCorrectionLevel(b)) => a == b,
            (InvalidTime(a), InvalidTime(b)) => a == b,
            (InvariantViolation(a), InvariantViolation(b)) => a == b,

            // Wrapped library errors only compare by variant
            (CsvError(_), CsvError(_)) => true,
            (IoError(_), IoError(_)) => true,

            (EmptyModel, EmptyModel) => true,

            _ => false,
        }
    }
}
