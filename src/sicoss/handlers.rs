//! ApiFacade — the HTTP surface over `SicossService`.
//!
//! `POST /sicoss/process` runs a period; `GET /sicoss/status/:periodo_fiscal`
//! and `GET /health` report liveness; `GET /sicoss/config` / `PUT
//! /sicoss/config` read and hot-swap the run-wide configuration; `GET
//! /metrics` exposes a Prometheus text export of the counters this facade
//! tracks across runs.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::SicossConfig;
use crate::domain::legajo::EmployeeId;
use crate::domain::FiscalPeriod;
use crate::errors::SicossError;
use crate::ops::MetricsRegistry;

use super::extractor::ExtractorSet;
use super::service::SicossService;

const API_VERSION: &str = env!("CARGO_PKG_VERSION");
const BACKEND_NAME: &str = "sicoss-core";

pub struct AppState<E: ExtractorSet> {
    pub service: Arc<SicossService<E>>,
    pub metrics: Arc<Mutex<MetricsRegistry>>,
    pub started_at: Instant,
}

impl<E: ExtractorSet> Clone for AppState<E> {
    fn clone(&self) -> Self {
        Self { service: self.service.clone(), metrics: self.metrics.clone(), started_at: self.started_at }
    }
}

pub fn router<E: ExtractorSet + 'static>(state: AppState<E>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics::<E>))
        .route("/sicoss/process", post(process::<E>))
        .route("/sicoss/status/:periodo_fiscal", get(status::<E>))
        .route("/sicoss/config", get(get_config::<E>).put(put_config::<E>))
        .with_state(state)
}

/// Per-request cap overrides (§6.3 `config_topes`). Any field left `None`
/// falls back to the service's current configuration for that field.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigTopes {
    pub tope_jubilatorio_patronal: Option<rust_decimal::Decimal>,
    pub tope_jubilatorio_personal: Option<rust_decimal::Decimal>,
    pub tope_otros_aportes_personales: Option<rust_decimal::Decimal>,
    pub trunca_tope: Option<bool>,
}

impl ConfigTopes {
    fn apply(self, mut base: SicossConfig) -> SicossConfig {
        if let Some(v) = self.tope_jubilatorio_patronal {
            base.tope_jubilatorio_patronal = v;
        }
        if let Some(v) = self.tope_jubilatorio_personal {
            base.tope_jubilatorio_personal = v;
        }
        if let Some(v) = self.tope_otros_aportes_personales {
            base.tope_otros_aportes_personales = v;
        }
        if let Some(v) = self.trunca_tope {
            base.trunca_tope = v;
        }
        base
    }
}

#[derive(Debug, Deserialize, validator::Validate)]
pub struct ProcessRequest {
    #[validate(length(equal = 6, message = "periodo_fiscal must be YYYYMM"))]
    pub periodo_fiscal: String,
    #[validate(range(min = 1, message = "nro_legajo must be positive"))]
    pub nro_legajo: Option<i64>,
    /// `"completo"` (every field), `"resumen"` (totals plus row count),
    /// or `"solo_totales"` (totals only, no per-employee rows).
    #[serde(default = "default_formato_respuesta")]
    pub formato_respuesta: String,
    #[serde(default)]
    pub guardar_en_bd: bool,
    #[serde(default)]
    pub config_topes: Option<ConfigTopes>,
}

fn default_formato_respuesta() -> String {
    "completo".to_string()
}

/// `estadisticas`: per-run counters, independent of the monetary totals.
#[derive(Debug, Serialize)]
struct Estadisticas {
    legajos_procesados: usize,
    legajos_validos: usize,
    legajos_excluidos: usize,
    legajos_con_tope_superado: usize,
}

/// `resumen`: a short summary of what this run did, separate from the
/// monetary `totales` block.
#[derive(Debug, Serialize)]
struct Resumen {
    periodo_fiscal: String,
    guardado_en_bd: bool,
    legajos_guardados: Option<usize>,
}

fn estadisticas(outcome: &super::pipeline::PipelineOutcome) -> Estadisticas {
    Estadisticas {
        legajos_procesados: outcome.records.len(),
        legajos_validos: outcome.totals.legajos_validos,
        legajos_excluidos: outcome.totals.legajos_excluidos,
        legajos_con_tope_superado: outcome.totals.legajos_con_tope_superado,
    }
}

fn resumen(periodo: FiscalPeriod, outcome: &super::pipeline::PipelineOutcome) -> Resumen {
    Resumen {
        periodo_fiscal: periodo.canonical(),
        guardado_en_bd: outcome.persistence.is_some(),
        legajos_guardados: outcome.persistence.as_ref().map(|p| p.legajos_guardados),
    }
}

#[derive(Debug, Serialize)]
struct ProcessData {
    #[serde(skip_serializing_if = "Option::is_none")]
    legajos: Option<Vec<crate::domain::record::SicossRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    estadisticas: Option<Estadisticas>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resumen: Option<Resumen>,
    totales: super::aggregator::SicossTotals,
}

/// `"completo"` (the default, and fallback for any unrecognized value)
/// carries every per-employee record plus the counts and summary blocks;
/// `"resumen"` drops the rows but keeps those blocks; `"solo_totales"`
/// reports the monetary totals alone.
fn build_process_data(
    formato_respuesta: &str,
    periodo: FiscalPeriod,
    outcome: super::pipeline::PipelineOutcome,
) -> ProcessData {
    let (legajos, stats, summary) = match formato_respuesta {
        "solo_totales" => (None, None, None),
        "resumen" => (None, Some(estadisticas(&outcome)), Some(resumen(periodo, &outcome))),
        _ => (Some(outcome.records.clone()), Some(estadisticas(&outcome)), Some(resumen(periodo, &outcome))),
    };
    ProcessData { legajos, estadisticas: stats, resumen: summary, totales: outcome.totals }
}

async fn process<E: ExtractorSet + 'static>(
    State(state): State<AppState<E>>,
    Json(request): Json<ProcessRequest>,
) -> Result<impl IntoResponse, SicossError> {
    use validator::Validate;
    request.validate().map_err(|e| SicossError::InvalidRequest(e.to_string()))?;

    let periodo: FiscalPeriod = request
        .periodo_fiscal
        .parse()
        .map_err(|e: crate::domain::FiscalPeriodError| SicossError::InvalidRequest(e.to_string()))?;
    let nro_legaj = request.nro_legajo.map(EmployeeId);
    let config_override = request.config_topes.map(|topes| topes.apply(state.service.config()));

    state.metrics.lock().expect("metrics lock poisoned").increment("sicoss_runs_started_total", 1);
    let started = Instant::now();

    let outcome =
        match state.service.process(periodo, nro_legaj, request.guardar_en_bd, config_override).await {
            Ok(outcome) => {
                let mut metrics = state.metrics.lock().expect("metrics lock poisoned");
                metrics.increment("sicoss_runs_succeeded_total", 1);
                metrics.record_histogram("sicoss_run_duration_seconds", started.elapsed().as_secs_f64());
                outcome
            }
            Err(err) => {
                state.metrics.lock().expect("metrics lock poisoned").increment("sicoss_runs_failed_total", 1);
                return Err(err);
            }
        };

    let body = build_process_data(&request.formato_respuesta, periodo, outcome);

    Ok(Json(json!({
        "success": true,
        "message": "period processed",
        "data": body,
        "metadata": {
            "backend": BACKEND_NAME,
            "api_version": API_VERSION,
            "processing_time_ms": started.elapsed().as_millis() as u64,
        },
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

async fn status<E: ExtractorSet + 'static>(
    State(state): State<AppState<E>>,
    Path(periodo_fiscal): Path<String>,
) -> Result<impl IntoResponse, SicossError> {
    let periodo: FiscalPeriod = periodo_fiscal
        .parse()
        .map_err(|e: crate::domain::FiscalPeriodError| SicossError::InvalidRequest(e.to_string()))?;
    let busy = state.service.is_busy(periodo);
    Ok(Json(json!({
        "success": true,
        "message": "status",
        "data": { "periodo_fiscal": periodo.canonical(), "en_proceso": busy },
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

/// `{ status: "ok" }` per §6.3's literal contract. `ops::SystemHealth` backs
/// the computation so a future probed component can degrade this response
/// without changing the handler's shape.
async fn health<E: ExtractorSet + 'static>(State(state): State<AppState<E>>) -> impl IntoResponse {
    use crate::ops::{ComponentHealth, HealthStatus, SystemHealth};

    let mut health = SystemHealth::new(API_VERSION, state.started_at.elapsed().as_secs());
    health.add_component(ComponentHealth {
        name: "sicoss_service".to_string(),
        status: HealthStatus::Healthy,
        message: None,
        latency_ms: None,
    });

    let status = if health.is_ready() { "ok" } else { "degraded" };
    Json(json!({ "success": true, "message": "ok", "data": { "status": status } }))
}

/// Prometheus text exposition, built from the run counters `process`
/// accumulates over the life of the process.
async fn metrics<E: ExtractorSet + 'static>(State(state): State<AppState<E>>) -> impl IntoResponse {
    let body = state.metrics.lock().expect("metrics lock poisoned").export_prometheus();
    ([("content-type", "text/plain; version=0.0.4")], body)
}

async fn get_config<E: ExtractorSet + 'static>(State(state): State<AppState<E>>) -> impl IntoResponse {
    Json(json!({ "success": true, "message": "config", "data": state.service.config() }))
}

async fn put_config<E: ExtractorSet + 'static>(
    State(state): State<AppState<E>>,
    Json(config): Json<SicossConfig>,
) -> Result<impl IntoResponse, SicossError> {
    config.validate()?;
    state.service.replace_config(config.clone());
    Ok(Json(json!({ "success": true, "message": "config updated", "data": config })))
}
