//! # spinmodel
//!
//! Continuous model of a spinning spacecraft's rotation phase, built from
//! per-segment spin telemetry.
//!
//! Each telemetry segment describes the spin phase over `[t1, t2]` as a
//! quadratic `phi(dt) = b·dt + c·dt²` together with the whole-spin counts at its
//! ends. Segments are stitched into one contiguous chain (short telemetry gaps
//! are bridged with constant-rate segments), refined with eclipse corrections,
//! and queried in batches for phase, spin count, period, time of the last
//! sun-sensor crossing and eclipse phase offset.
//!
//! ## Layout
//!
//! * [`segment`]: the per-segment quadratic, its flags and scalar evaluation.
//! * [`builder`]: `addseg` stitching and bridge synthesis.
//! * [`spinmodel`]: the columnar [`SpinModel`] and its introspection.
//! * [`query`]: vectorized `interp_t` / `interp_n`.
//! * [`correction`]: phase correction curve and FGM eclipse windows.
//! * [`registry`]: per-session `(probe, level)` cache.
//! * [`telemetry`]: input tables and the store seam (memory, CSV).
//!
//! ## Example
//!
//! ```rust
//! use spinmodel::{
//!     config::SpinModelConfig, constants::CorrectionLevel, correction::PhaseCorrection,
//!     registry::SpinModelRegistry, telemetry::SegmentRecord, builder::SpinModelBuilder,
//! };
//!
//! let record = SegmentRecord {
//!     tend: 60.0, spinper: 60.0, c: 0.0, phaserr: 0.0, nspins: 1, npts: 10,
//!     maxgap: 0.0, initial_delta_phi: 0.0, idpu_spinper: 0.0, segflags: 0,
//! };
//! let config = SpinModelConfig::default();
//! let model = SpinModelBuilder::from_records(&[record], config)?
//!     .finish("tha", CorrectionLevel::Raw, PhaseCorrection::empty())?;
//!
//! let mut registry = SpinModelRegistry::new(config);
//! let model = registry.save("tha", CorrectionLevel::Raw, model);
//! let states = model.interp_t(&[30.0], false);
//! assert_eq!(states[0].spin_phase, 180.0);
//! # Ok::<(), spinmodel::spinmodel_errors::SpinModelError>(())
//! ```

pub mod builder;
pub mod config;
pub mod constants;
pub mod correction;
pub mod query;
pub mod registry;
pub mod segment;
pub mod spin_state;
pub mod spinmodel;
pub mod spinmodel_errors;
pub mod telemetry;
pub mod time;

pub use spinmodel::SpinModel;
