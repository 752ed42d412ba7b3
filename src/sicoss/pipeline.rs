//! Pipeline — wires Consolidator, Calculator, CapEngine, and Validator into
//! one per-employee computation, fanned out with `rayon` across the roster,
//! then reduces with the Aggregator and optionally hands the result to the
//! Persister.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use sqlx::PgPool;

use crate::config::SicossConfig;
use crate::domain::legajo::EmployeeId;
use crate::domain::record::SicossRecord;
use crate::domain::{FiscalPeriod, OtraActividad};
use crate::errors::SicossError;

use super::aggregator::{self, SicossTotals};
use super::cap_engine;
use super::consolidator;
use super::extractor::ExtractedTables;
use super::persister::{self, PersistenceOutcome};
use super::{calculator, validator};

#[derive(Clone, Debug)]
pub struct PipelineOutcome {
    pub records: Vec<SicossRecord>,
    pub totals: SicossTotals,
    pub persistence: Option<PersistenceOutcome>,
}

/// Runs the Consolidator through Validator stages for every employee in
/// `tables`, totals the surviving rows, and persists them when `pool` is
/// given. `cancel` is polled once before the parallel stage starts and once
/// more before persistence; mid-batch cancellation of individual employees
/// is not supported — a run either completes a stage or is cancelled before
/// it begins the next one.
pub async fn run_pipeline(
    tables: ExtractedTables,
    periodo: FiscalPeriod,
    config: &SicossConfig,
    pool: Option<&PgPool>,
    cancel: &Arc<AtomicBool>,
) -> Result<PipelineOutcome, SicossError> {
    config.validate()?;

    if cancel.load(Ordering::Relaxed) {
        return Err(SicossError::Cancelled);
    }

    let consolidated = consolidator::consolidate(&tables.legajos, &tables.conceptos)?;

    let otra_actividad_by_legajo: HashMap<EmployeeId, OtraActividad> =
        tables.otra_actividad.into_iter().map(|o| (o.nro_legaj, o)).collect();

    let config_for_closure = config.clone();
    let periodo_owned = periodo;
    let otra_map = otra_actividad_by_legajo;

    let records = tokio::task::spawn_blocking(move || -> Result<Vec<SicossRecord>, SicossError> {
        let config = config_for_closure;
        consolidated
            .into_par_iter()
            .map(|row| {
                let otra = otra_map.get(&row.legajo.nro_legaj);
                let legajo = row.legajo.clone();
                let record = calculator::calculate(&row, &config, periodo_owned);
                let record = cap_engine::apply_caps(record, otra, &config)?;
                record.check_invariants()?;
                Ok(validator::validate(record, &legajo, &config))
            })
            .collect()
    })
    .await
    .map_err(|e| SicossError::ExtractionFailed { period: periodo.canonical(), source: e.into() })??;

    let totals = aggregator::aggregate(&records);

    if cancel.load(Ordering::Relaxed) {
        return Err(SicossError::Cancelled);
    }

    let persistence = match pool {
        Some(pool) => Some(persister::persist(pool, periodo, &records, &config).await?),
        None => None,
    };

    Ok(PipelineOutcome { records, totals, persistence })
}
