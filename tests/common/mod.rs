#![allow(dead_code)]

use approx::assert_abs_diff_eq;
use spinmodel::{
    builder::SpinModelBuilder, config::SpinModelConfig, constants::CorrectionLevel,
    correction::PhaseCorrection, spin_state::SpinState, telemetry::SegmentRecord, SpinModel,
};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Constant-rate telemetry record ending at `tend`.
pub fn constant_rate_record(tend: f64, spinper: f64, nspins: i64) -> SegmentRecord {
    SegmentRecord {
        tend,
        spinper,
        c: 0.0,
        phaserr: 0.0,
        nspins,
        npts: 12,
        maxgap: 0.0,
        initial_delta_phi: 0.0,
        idpu_spinper: 0.0,
        segflags: 0,
    }
}

/// Same as [`constant_rate_record`], flagged as an eclipse segment with an onboard period.
pub fn eclipse_record(tend: f64, spinper: f64, nspins: i64, idpu_spinper: f64) -> SegmentRecord {
    SegmentRecord {
        idpu_spinper,
        segflags: 0b011,
        ..constant_rate_record(tend, spinper, nspins)
    }
}

/// Spin-up over `[0, 12]` (12 s to 4 s period) followed by the symmetric spin-down over `[12, 24]`.
pub fn accelerating_records() -> Vec<SegmentRecord> {
    vec![
        SegmentRecord {
            c: 2.5,
            ..constant_rate_record(12.0, 12.0, 2)
        },
        SegmentRecord {
            c: -2.5,
            ..constant_rate_record(24.0, 4.0, 2)
        },
    ]
}

pub fn build_model(records: &[SegmentRecord], level: CorrectionLevel) -> SpinModel {
    SpinModelBuilder::from_records(records, SpinModelConfig::default())
        .unwrap()
        .finish("tha", level, PhaseCorrection::empty())
        .unwrap()
}

pub fn assert_state_close(actual: &SpinState, expected: &SpinState, epsilon: f64) {
    assert_eq!(actual.spin_count, expected.spin_count);
    assert_eq!(actual.seg_index, expected.seg_index);
    assert_eq!(actual.segflags, expected.segflags);
    assert_abs_diff_eq!(actual.spin_phase, expected.spin_phase, epsilon = epsilon);
    assert_abs_diff_eq!(actual.spin_period, expected.spin_period, epsilon = epsilon);
    assert_abs_diff_eq!(actual.t_last, expected.t_last, epsilon = epsilon);
    assert_abs_diff_eq!(
        actual.eclipse_delta_phi,
        expected.eclipse_delta_phi,
        epsilon = epsilon
    );
    assert_abs_diff_eq!(actual.dt, expected.dt, epsilon = epsilon);
}
