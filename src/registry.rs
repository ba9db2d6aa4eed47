//! # Spin model registry
//!
//! [`SpinModelRegistry`] is the session-owned cache mapping
//! `(probe, correction level)` to a finished, read-only [`SpinModel`]. It is
//! created by the caller's top-level context and passed by reference to the
//! components that need lookups; there is no process-global instance.
//!
//! Models are stored behind [`Arc`] so that any number of threads can query
//! the same model concurrently once it has been saved.
//!
//! ## Misses
//!
//! [`SpinModelRegistry::get`] never fails: a missing model yields `None` and a
//! `warn!` log line unless the lookup (or the registry config) asks for quiet
//! behaviour. Callers typically fall back to an uncorrected computation.
//!
//! ## Loading
//!
//! [`SpinModelRegistry::load_probe`] builds every level of a probe available in
//! a [`SpinTelemetryStore`]:
//! * a level whose telemetry is absent, empty, inconsistent or malformed is
//!   skipped with a warning;
//! * an unbridgeable gap aborts the load with the builder error.

use std::{collections::HashMap, sync::Arc};

use log::{debug, warn};

use crate::{
    config::SpinModelConfig,
    constants::{CorrectionLevel, ModelKey},
    correction::PhaseCorrection,
    spinmodel::SpinModel,
    spinmodel_errors::SpinModelError,
    telemetry::SpinTelemetryStore,
};

#[derive(Debug, Clone, Default)]
pub struct SpinModelRegistry {
    models: HashMap<ModelKey, Arc<SpinModel>>,
    config: SpinModelConfig,
}

impl SpinModelRegistry {
    pub fn new(config: SpinModelConfig) -> Self {
        SpinModelRegistry {
            models: HashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &SpinModelConfig {
        &self.config
    }

    /// Store `model` under `(probe, level)`, replacing any previous model.
    ///
    /// Return
    /// ----------
    /// * The shared handle now held by the registry.
    pub fn save(&mut self, probe: &str, level: CorrectionLevel, model: SpinModel) -> Arc<SpinModel> {
        let model = Arc::new(model);
        if self
            .models
            .insert((probe.to_string(), level), Arc::clone(&model))
            .is_some()
        {
            debug!("Replaced spin model {probe} {level}");
        }
        model
    }

    /// Look up the model of `probe` at `level`.
    ///
    /// Arguments
    /// -----------------
    /// * `quiet`: do not log a miss (the registry config can also silence all misses).
    ///
    /// Return
    /// ----------
    /// * A shared handle on the model, or `None` if it was never saved.
    pub fn get(&self, probe: &str, level: CorrectionLevel, quiet: bool) -> Option<Arc<SpinModel>> {
        let model = self.models.get(&(probe.to_string(), level)).cloned();
        if model.is_none() && !quiet && !self.config.quiet_registry_misses {
            warn!("No spin model loaded for probe {probe} at {level}");
        }
        model
    }

    pub fn contains(&self, probe: &str, level: CorrectionLevel) -> bool {
        self.models.contains_key(&(probe.to_string(), level))
    }

    /// Drop the model of `probe` at `level`, if any.
    pub fn remove(&mut self, probe: &str, level: CorrectionLevel) -> Option<Arc<SpinModel>> {
        self.models.remove(&(probe.to_string(), level))
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Levels currently held for `probe`, lowest first.
    pub fn levels(&self, probe: &str) -> Vec<CorrectionLevel> {
        CorrectionLevel::ALL
            .into_iter()
            .filter(|&level| self.contains(probe, level))
            .collect()
    }

    /// Build and save every correction level of `probe` found in `store`.
    ///
    /// Return
    /// ----------
    /// * The levels that were built and saved.
    /// * The first store read error or unbridgeable gap ([`SpinModelError::ShortGap`],
    ///   [`SpinModelError::NegativeGap`]); models saved before it are kept.
    pub fn load_probe(
        &mut self,
        store: &impl SpinTelemetryStore,
        probe: &str,
    ) -> Result<Vec<CorrectionLevel>, SpinModelError> {
        let phase_correction = store.phase_correction(probe)?.unwrap_or_else(|| {
            debug!("No phase correction curve for probe {probe}");
            PhaseCorrection::empty()
        });

        let mut loaded = Vec::new();
        for level in CorrectionLevel::ALL {
            let Some(table) = store.segment_table(probe, level)? else {
                warn!("No spin model telemetry for probe {probe} at {level}, skipping");
                continue;
            };

            let fgm_corrections = if level == CorrectionLevel::SpinFitCorrected {
                store.fgm_corrections(probe)?.unwrap_or_else(|| {
                    warn!("No FGM eclipse corrections for probe {probe}, {level} left uncorrected");
                    Vec::new()
                })
            } else {
                Vec::new()
            };

            match SpinModel::from_telemetry(
                probe,
                level,
                &table,
                phase_correction.clone(),
                &fgm_corrections,
                self.config,
            ) {
                Ok(model) => {
                    self.save(probe, level, model);
                    loaded.push(level);
                }
                Err(err @ (SpinModelError::ShortGap { .. } | SpinModelError::NegativeGap { .. })) => {
                    return Err(err)
                }
                Err(err) => {
                    warn!("Spin model {probe} {level} not built: {err}, skipping");
                }
            }
        }
        Ok(loaded)
    }
}
