//! # Constants and type definitions for spinmodel
//!
//! This module centralizes the **numerical tolerances**, **unit aliases**, and **key types**
//! shared by the segment, builder, correction and query layers.
//!
//! ## Overview
//!
//! - Time and angle aliases used across the crate
//! - Tolerances used when stitching segments and when solving the phase quadratic
//! - The [`CorrectionLevel`] identifier and the [`ModelKey`] used by the registry
//!
//! The tolerance constants are the defaults of
//! [`SpinModelConfig`](crate::config::SpinModelConfig); change them there rather than here
//! when a different behaviour is wanted for a single session.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::spinmodel_errors::SpinModelError;

// -------------------------------------------------------------------------------------------------
// Units and conversions
// -------------------------------------------------------------------------------------------------

/// Degrees in one full spin
pub const DEG_PER_SPIN: f64 = 360.0;

/// Number of seconds in a UTC day (leap seconds ignored for day-boundary tests)
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Maximum distance between two segment boundaries still considered contiguous (s)
pub const CONTIGUITY_TOLERANCE: f64 = 1.0e-6;

/// Below this magnitude the angular acceleration is treated as zero (deg/s²)
pub const ACCEL_EPSILON: f64 = 1.0e-12;

/// Onboard spin periods at or below this value are treated as invalid (s)
pub const MIN_IDPU_SPINPER: f64 = 1.0;

/// Gap size, in spins, from which a bridge segment is synthesized
pub const BRIDGE_THRESHOLD_SPINS: f64 = 0.5;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Duration in seconds
pub type Second = f64;
/// Time stamp in seconds since 1970-01-01T00:00:00 UTC
pub type UnixSeconds = f64;
/// Identifier of a spacecraft (e.g. `"tha"`)
pub type Probe = String;

// -------------------------------------------------------------------------------------------------
// Identifiers
// -------------------------------------------------------------------------------------------------

/// Fidelity tier of a spin model.
///
/// The three levels describe the same underlying spin history:
/// * `Raw` — segments exactly as reported by telemetry,
/// * `WaveformCorrected` — eclipse phase offsets derived from waveform data,
/// * `SpinFitCorrected` — additionally corrected with FGM spin-fit windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CorrectionLevel {
    Raw = 0,
    WaveformCorrected = 1,
    SpinFitCorrected = 2,
}

impl CorrectionLevel {
    /// All levels, lowest fidelity first.
    pub const ALL: [CorrectionLevel; 3] = [
        CorrectionLevel::Raw,
        CorrectionLevel::WaveformCorrected,
        CorrectionLevel::SpinFitCorrected,
    ];

    /// Numeric value of the level, as used in file names.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for CorrectionLevel {
    type Error = SpinModelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CorrectionLevel::Raw),
            1 => Ok(CorrectionLevel::WaveformCorrected),
            2 => Ok(CorrectionLevel::SpinFitCorrected),
            other => Err(SpinModelError::InvalidCorrectionLevel(other)),
        }
    }
}

impl fmt::Display for CorrectionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "level {}", self.as_u8())
    }
}

/// Registry key: one model per probe and correction level.
pub type ModelKey = (Probe, CorrectionLevel);
