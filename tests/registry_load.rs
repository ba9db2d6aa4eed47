mod common;

use std::{fs, sync::Arc, thread};

use approx::assert_abs_diff_eq;
use camino::Utf8PathBuf;
use common::{constant_rate_record, eclipse_record, init_logger};
use spinmodel::{
    config::SpinModelConfig,
    constants::CorrectionLevel,
    correction::{CorrectionWindow, PhaseCorrection},
    registry::SpinModelRegistry,
    segment::SegmentFlags,
    spinmodel_errors::SpinModelError,
    telemetry::{CsvTelemetryStore, MemoryTelemetryStore, SegmentTable},
};

fn memory_store() -> MemoryTelemetryStore {
    let mut store = MemoryTelemetryStore::new();
    let sunlit = [
        constant_rate_record(30.0, 3.0, 10),
        constant_rate_record(60.0, 3.0, 10),
    ];
    let eclipsed = [
        eclipse_record(30.0, 3.0, 10, 3.1),
        eclipse_record(60.0, 3.0, 10, 3.1),
    ];
    store.insert_table("tha", CorrectionLevel::Raw, SegmentTable::from_records(&sunlit));
    store.insert_table(
        "tha",
        CorrectionLevel::WaveformCorrected,
        SegmentTable::from_records(&eclipsed),
    );
    store.insert_table(
        "tha",
        CorrectionLevel::SpinFitCorrected,
        SegmentTable::from_records(&eclipsed),
    );
    store.insert_phase_correction(
        "tha",
        PhaseCorrection::new(vec![0.0, 60.0], vec![1.0, 1.0]).unwrap(),
    );
    store.insert_fgm_corrections(
        "tha",
        vec![CorrectionWindow {
            start: 0.0,
            end: 20.0,
            offset: -4.0,
        }],
    );
    store
}

#[test]
fn test_load_probe_from_memory() {
    init_logger();
    let store = memory_store();
    let mut registry = SpinModelRegistry::default();

    let loaded = registry.load_probe(&store, "tha").unwrap();
    assert_eq!(loaded, CorrectionLevel::ALL.to_vec());
    assert_eq!(registry.len(), 3);

    let spinfit = registry
        .get("tha", CorrectionLevel::SpinFitCorrected, false)
        .unwrap();
    let waveform = registry
        .get("tha", CorrectionLevel::WaveformCorrected, false)
        .unwrap();
    let segments = spinfit.segments();
    assert!(segments[0].segflags.contains(SegmentFlags::SPINFIT_CORRECTED));
    assert!(!segments[1].segflags.contains(SegmentFlags::SPINFIT_CORRECTED));
    assert_abs_diff_eq!(segments[0].initial_delta_phi, -4.0, epsilon = 1e-12);
    assert!(waveform.fgm_corrections().is_empty());

    // Every level shares the probe's waveform curve
    let state = spinfit.interp_t(&[16.5], true)[0];
    assert_abs_diff_eq!(state.spin_phase, 179.0, epsilon = 1e-9);
}

#[test]
fn test_missing_probe_is_not_an_error() {
    let store = memory_store();
    let mut registry = SpinModelRegistry::default();
    assert!(registry.load_probe(&store, "thb").unwrap().is_empty());
    assert!(registry.is_empty());
    assert!(registry.get("thb", CorrectionLevel::Raw, false).is_none());
}

#[test]
fn test_unbridgeable_gap_aborts_load() {
    let mut store = MemoryTelemetryStore::new();
    store.insert_table(
        "thc",
        CorrectionLevel::Raw,
        SegmentTable::from_records(&[
            constant_rate_record(30.0, 3.0, 10),
            constant_rate_record(61.0, 3.0, 10),
        ]),
    );

    let mut registry = SpinModelRegistry::default();
    let err = registry.load_probe(&store, "thc").unwrap_err();
    assert!(matches!(err, SpinModelError::ShortGap { .. }));
    assert!(!registry.contains("thc", CorrectionLevel::Raw));
}

#[test]
fn test_load_probe_from_csv_directory() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();

    fs::write(
        root.join("thd_segments_l0.csv"),
        "tend,spinper,c,phaserr,nspins,npts,maxgap\n\
         60.0,60.0,0.0,0.0,1,10,0.0\n\
         120.0,60.0,0.0,0.0,1,10,0.0\n",
    )
    .unwrap();
    fs::write(
        root.join("thd_segments_l2.csv"),
        "tend,spinper,c,phaserr,nspins,npts,maxgap,initial_delta_phi,idpu_spinper,segflags\n\
         30.0,3.0,0.0,0.0,10,10,0.0,0.0,3.1,3\n\
         60.0,3.0,0.0,0.0,10,10,0.0,0.0,3.1,3\n",
    )
    .unwrap();
    fs::write(
        root.join("thd_spin_correction.csv"),
        "time,correction\n0.0,2.0\n120.0,4.0\n",
    )
    .unwrap();
    fs::write(
        root.join("thd_fgm_corrections.csv"),
        "start,end,offset\n40.0,50.0,1.5\n",
    )
    .unwrap();

    let store = CsvTelemetryStore::new(root);
    let mut registry = SpinModelRegistry::new(SpinModelConfig {
        quiet_registry_misses: true,
        ..SpinModelConfig::default()
    });
    let loaded = registry.load_probe(&store, "thd").unwrap();
    assert_eq!(
        loaded,
        vec![CorrectionLevel::Raw, CorrectionLevel::SpinFitCorrected]
    );

    let raw = registry.get("thd", CorrectionLevel::Raw, false).unwrap();
    let state = raw.interp_t(&[90.0], true)[0];
    assert_eq!(state.spin_count, 1);
    // 180 deg minus the 3.5 deg interpolated at t = 90
    assert_abs_diff_eq!(state.spin_phase, 176.5, epsilon = 1e-9);

    let spinfit = registry
        .get("thd", CorrectionLevel::SpinFitCorrected, false)
        .unwrap();
    assert_eq!(spinfit.fgm_corrections().len(), 1);
    assert_abs_diff_eq!(spinfit.segments()[1].initial_delta_phi, 1.5, epsilon = 1e-12);
}

#[test]
fn test_concurrent_readers_share_a_model() {
    let store = memory_store();
    let mut registry = SpinModelRegistry::default();
    registry.load_probe(&store, "tha").unwrap();

    let model = registry
        .get("tha", CorrectionLevel::SpinFitCorrected, false)
        .unwrap();
    let times: Vec<f64> = (0..500).map(|i| -5.0 + 0.14 * i as f64).collect();
    let expected = model.interp_t(&times, true);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let model = Arc::clone(&model);
            let times = times.clone();
            thread::spawn(move || model.interp_t(&times, true))
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}
