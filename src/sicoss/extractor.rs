//! ExtractorSet — out-of-core interface onto the HR store.
//!
//! The raw SQL against the HR schema is out of scope; this module
//! specifies only the shape extraction must produce and the retry policy
//! around transient failures (`ExtractionFailed`).

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{Concepto, FiscalPeriod, Legajo, OtraActividad};
use crate::errors::SicossError;

/// One employee's obra-social code, extracted separately because it is
/// sourced from a different view than the rest of `Legajos`.
#[derive(Clone, Debug)]
pub struct ObraSocialCode {
    pub nro_legaj: crate::domain::legajo::EmployeeId,
    pub cod_os: i32,
}

/// The four tables ExtractorSet produces for one fiscal period.
#[derive(Clone, Debug, Default)]
pub struct ExtractedTables {
    pub legajos: Vec<Legajo>,
    pub conceptos: Vec<Concepto>,
    pub otra_actividad: Vec<OtraActividad>,
    pub obra_social_codes: Vec<ObraSocialCode>,
}

#[async_trait]
pub trait ExtractorSet: Send + Sync {
    /// Extracts all four tables for `period`, optionally restricted to a
    /// single `nro_legaj`. A period with no matching legajos returns `Ok`
    /// with empty tables rather than this trait returning `Err`.
    async fn extract(
        &self,
        period: FiscalPeriod,
        nro_legaj: Option<crate::domain::legajo::EmployeeId>,
    ) -> Result<ExtractedTables, SicossError>;
}

/// Production `ExtractorSet` backed by Postgres source views. The views/
/// tables themselves are assumed to already exist.
pub struct SqlxExtractorSet {
    pool: PgPool,
    max_attempts: u32,
    backoff_base: Duration,
}

impl SqlxExtractorSet {
    pub fn new(pool: PgPool) -> Self {
        Self { pool, max_attempts: 3, backoff_base: Duration::from_millis(200) }
    }

    /// Runs `op` with exponential backoff: retried up to 3 attempts, then
    /// the underlying error is surfaced as `ExtractionFailed`.
    async fn with_retry<T, F, Fut>(&self, period: FiscalPeriod, op: F) -> Result<T, SicossError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, sqlx::Error>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(source) if attempt < self.max_attempts => {
                    let delay = self.backoff_base * 2u32.pow(attempt - 1);
                    tracing::warn!(attempt, ?delay, error = %source, "transient extraction error, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(source) => {
                    return Err(SicossError::ExtractionFailed {
                        period: period.canonical(),
                        source: source.into(),
                    });
                }
            }
        }
    }
}

#[async_trait]
impl ExtractorSet for SqlxExtractorSet {
    async fn extract(
        &self,
        period: FiscalPeriod,
        nro_legaj: Option<crate::domain::legajo::EmployeeId>,
    ) -> Result<ExtractedTables, SicossError> {
        // The four queries below are intentionally simple SELECTs against
        // the assumed source views; filter and period binding are shared.
        let legajo_filter = nro_legaj.map(|id| id.0);

        let legajo_rows = self
            .with_retry(period, || async {
                sqlx::query_as::<_, LegajoRow>(
                    r#"
                    SELECT nro_legaj, cuil, apnom, cod_situacion, cod_condicion,
                           cod_actividad, cod_zona, cod_mod_contratacion,
                           cod_obra_social, regimen, conyuge, hijos, adherentes,
                           licencia, trabajador_convencionado, provincia_localidad
                    FROM mapuche.v_sicoss_legajos
                    WHERE periodo_fiscal = $1 AND ($2::bigint IS NULL OR nro_legaj = $2)
                    "#,
                )
                .bind(period.canonical())
                .bind(legajo_filter)
                .fetch_all(&self.pool)
                .await
            })
            .await?;

        if legajo_rows.is_empty() {
            tracing::info!(period = %period, "no legajos found for period");
            return Ok(ExtractedTables::default());
        }

        let concepto_rows = self
            .with_retry(period, || async {
                sqlx::query_as::<_, ConceptoRow>(
                    r#"
                    SELECT nro_legaj, codn_conce, impp_conce, tipos_grupos,
                           tipo_conce, nro_orimp, escalafon
                    FROM mapuche.v_sicoss_conceptos
                    WHERE periodo_fiscal = $1 AND ($2::bigint IS NULL OR nro_legaj = $2)
                    "#,
                )
                .bind(period.canonical())
                .bind(legajo_filter)
                .fetch_all(&self.pool)
                .await
            })
            .await?;

        let otra_actividad_rows = self
            .with_retry(period, || async {
                sqlx::query_as::<_, OtraActividadRow>(
                    r#"
                    SELECT nro_legaj, importe_jubilatorio, importe_otros
                    FROM mapuche.v_sicoss_otra_actividad
                    WHERE periodo_fiscal = $1 AND ($2::bigint IS NULL OR nro_legaj = $2)
                    "#,
                )
                .bind(period.canonical())
                .bind(legajo_filter)
                .fetch_all(&self.pool)
                .await
            })
            .await?;

        let obra_social_rows = self
            .with_retry(period, || async {
                sqlx::query_as::<_, ObraSocialRow>(
                    r#"
                    SELECT nro_legaj, cod_os
                    FROM mapuche.v_sicoss_obra_social
                    WHERE periodo_fiscal = $1 AND ($2::bigint IS NULL OR nro_legaj = $2)
                    "#,
                )
                .bind(period.canonical())
                .bind(legajo_filter)
                .fetch_all(&self.pool)
                .await
            })
            .await?;

        Ok(ExtractedTables {
            legajos: legajo_rows.into_iter().map(Into::into).collect(),
            conceptos: concepto_rows.into_iter().map(Into::into).collect(),
            otra_actividad: otra_actividad_rows.into_iter().map(Into::into).collect(),
            obra_social_codes: obra_social_rows.into_iter().map(Into::into).collect(),
        })
    }
}

// Raw row shapes as sqlx sees the source views; converted into domain types
// at the extraction boundary so nothing downstream depends on column names.

#[derive(sqlx::FromRow)]
struct LegajoRow {
    nro_legaj: i64,
    cuil: String,
    apnom: String,
    cod_situacion: i32,
    cod_condicion: i32,
    cod_actividad: i32,
    cod_zona: i32,
    cod_mod_contratacion: i32,
    cod_obra_social: i32,
    regimen: String,
    conyuge: bool,
    hijos: i32,
    adherentes: i32,
    licencia: bool,
    trabajador_convencionado: String,
    provincia_localidad: Option<String>,
}

impl From<LegajoRow> for Legajo {
    fn from(r: LegajoRow) -> Self {
        Legajo {
            nro_legaj: r.nro_legaj.into(),
            cuil: r.cuil,
            apnom: r.apnom,
            cod_situacion: r.cod_situacion,
            cod_condicion: r.cod_condicion,
            cod_actividad: r.cod_actividad,
            cod_zona: r.cod_zona,
            cod_mod_contratacion: r.cod_mod_contratacion,
            cod_obra_social: r.cod_obra_social,
            regimen: crate::domain::legajo::RegimeChar(r.regimen.chars().next().unwrap_or('0')),
            conyuge: r.conyuge,
            hijos: r.hijos.max(0) as u32,
            adherentes: r.adherentes.max(0) as u32,
            licencia: r.licencia,
            trabajador_convencionado: crate::domain::legajo::RegimeChar(
                r.trabajador_convencionado.chars().next().unwrap_or('0'),
            ),
            provincia_localidad: r.provincia_localidad,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ConceptoRow {
    nro_legaj: i64,
    codn_conce: i32,
    impp_conce: rust_decimal::Decimal,
    tipos_grupos: Vec<i16>,
    tipo_conce: String,
    nro_orimp: i32,
    escalafon: Option<String>,
}

impl From<ConceptoRow> for Concepto {
    fn from(r: ConceptoRow) -> Self {
        Concepto {
            nro_legaj: r.nro_legaj.into(),
            codn_conce: r.codn_conce,
            impp_conce: r.impp_conce,
            tipos_grupos: r.tipos_grupos.into_iter().map(|g| g as u8).collect(),
            tipo_conce: if r.tipo_conce == "N" {
                crate::domain::concepto::TipoConce::N
            } else {
                crate::domain::concepto::TipoConce::C
            },
            nro_orimp: r.nro_orimp,
            escalafon: r.escalafon.as_deref().and_then(|s| match s {
                "DOCE" => Some(crate::domain::concepto::Escalafon::Doce),
                "AUTO" => Some(crate::domain::concepto::Escalafon::Auto),
                "NODO" => Some(crate::domain::concepto::Escalafon::Nodo),
                _ => None,
            }),
        }
    }
}

#[derive(sqlx::FromRow)]
struct OtraActividadRow {
    nro_legaj: i64,
    importe_jubilatorio: rust_decimal::Decimal,
    importe_otros: rust_decimal::Decimal,
}

impl From<OtraActividadRow> for OtraActividad {
    fn from(r: OtraActividadRow) -> Self {
        OtraActividad {
            nro_legaj: r.nro_legaj.into(),
            importe_jubilatorio: r.importe_jubilatorio,
            importe_otros: r.importe_otros,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ObraSocialRow {
    nro_legaj: i64,
    cod_os: i32,
}

impl From<ObraSocialRow> for ObraSocialCode {
    fn from(r: ObraSocialRow) -> Self {
        ObraSocialCode { nro_legaj: r.nro_legaj.into(), cod_os: r.cod_os }
    }
}

/// In-memory `ExtractorSet` used by tests and by the HTTP facade's
/// `"solo_totales"` dry-run path when no database round-trip is needed.
#[derive(Clone, Debug, Default)]
pub struct FakeExtractorSet {
    pub tables: ExtractedTables,
}

#[async_trait]
impl ExtractorSet for FakeExtractorSet {
    async fn extract(
        &self,
        _period: FiscalPeriod,
        nro_legaj: Option<crate::domain::legajo::EmployeeId>,
    ) -> Result<ExtractedTables, SicossError> {
        match nro_legaj {
            None => Ok(self.tables.clone()),
            Some(id) => Ok(ExtractedTables {
                legajos: self.tables.legajos.iter().filter(|l| l.nro_legaj == id).cloned().collect(),
                conceptos: self.tables.conceptos.iter().filter(|c| c.nro_legaj == id).cloned().collect(),
                otra_actividad: self
                    .tables
                    .otra_actividad
                    .iter()
                    .filter(|o| o.nro_legaj == id)
                    .cloned()
                    .collect(),
                obra_social_codes: self
                    .tables
                    .obra_social_codes
                    .iter()
                    .filter(|o| o.nro_legaj == id)
                    .cloned()
                    .collect(),
            }),
        }
    }
}
