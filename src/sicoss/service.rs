//! SicossService — run-level orchestration: one extraction plus one
//! pipeline run per request, enforcing that the same fiscal period is never
//! processed by two runs at once, and exposing cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use dashmap::DashMap;
use sqlx::PgPool;

use crate::config::SicossConfig;
use crate::domain::legajo::EmployeeId;
use crate::domain::FiscalPeriod;
use crate::errors::SicossError;

use super::extractor::ExtractorSet;
use super::pipeline::{self, PipelineOutcome};

/// Tracks whether a period is currently being processed, and if so, the
/// cancellation flag that run is watching. `config` sits behind a
/// `RwLock` so the HTTP facade can hot-swap it (`PUT /sicoss/config`)
/// without taking `&mut self` through the shared `Arc<SicossService<_>>`.
pub struct SicossService<E: ExtractorSet> {
    extractor: Arc<E>,
    pool: Option<PgPool>,
    config: RwLock<SicossConfig>,
    in_progress: DashMap<String, Arc<AtomicBool>>,
}

impl<E: ExtractorSet> SicossService<E> {
    pub fn new(extractor: Arc<E>, pool: Option<PgPool>, config: SicossConfig) -> Self {
        Self { extractor, pool, config: RwLock::new(config), in_progress: DashMap::new() }
    }

    pub fn config(&self) -> SicossConfig {
        self.config.read().expect("config lock poisoned").clone()
    }

    pub fn replace_config(&self, config: SicossConfig) {
        *self.config.write().expect("config lock poisoned") = config;
    }

    /// Whether `period` currently has a run in flight.
    pub fn is_busy(&self, period: FiscalPeriod) -> bool {
        self.in_progress.contains_key(&period.canonical())
    }

    /// Requests cancellation of an in-flight run for `period`. Returns
    /// `false` if no run is in flight for that period.
    pub fn cancel(&self, period: FiscalPeriod) -> bool {
        if let Some(flag) = self.in_progress.get(&period.canonical()) {
            flag.store(true, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    /// Extracts and runs the full pipeline for `period`, persisting when
    /// `persist` is true and a pool was configured. Rejects a second
    /// concurrent run for the same period with `SicossError::PeriodBusy`.
    /// `config_override` lets a single request supply its own `config_topes`
    /// (§6.3) without mutating the service-wide configuration that `GET
    /// /sicoss/config` reports.
    pub async fn process(
        &self,
        period: FiscalPeriod,
        nro_legaj: Option<EmployeeId>,
        persist: bool,
        config_override: Option<SicossConfig>,
    ) -> Result<PipelineOutcome, SicossError> {
        let config = config_override.unwrap_or_else(|| self.config());
        config.validate()?;

        let key = period.canonical();
        let cancel = match self.in_progress.entry(key.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => return Err(SicossError::PeriodBusy(key)),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                let cancel = Arc::new(AtomicBool::new(false));
                slot.insert(cancel.clone());
                cancel
            }
        };

        let result = self.run(period, nro_legaj, persist, &config, &cancel).await;
        self.in_progress.remove(&key);
        result
    }

    async fn run(
        &self,
        period: FiscalPeriod,
        nro_legaj: Option<EmployeeId>,
        persist: bool,
        config: &SicossConfig,
        cancel: &Arc<AtomicBool>,
    ) -> Result<PipelineOutcome, SicossError> {
        let tables = self.extractor.extract(period, nro_legaj).await?;
        let pool = if persist { self.pool.as_ref() } else { None };
        pipeline::run_pipeline(tables, period, config, pool, cancel).await
    }
}
