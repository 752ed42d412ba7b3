//! Persister — validates and bulk-inserts the valid rows of a run into
//! `suc.afip_mapuche_sicoss`, optionally replacing whatever was previously
//! stored for the same period, all inside one transaction.

use std::time::{Duration, Instant};

use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::config::SicossConfig;
use crate::domain::record::SicossRecord;
use crate::domain::FiscalPeriod;
use crate::errors::SicossError;

const DESTINATION_TABLE: &str = "suc.afip_mapuche_sicoss";

/// `apnom` is persisted truncated to this width; AFIP's fixed-width layout
/// has no room for longer names.
const APNOM_MAX_LEN: usize = 40;

#[derive(Clone, Debug)]
pub struct PersistenceOutcome {
    pub legajos_guardados: usize,
    pub duracion: Duration,
    pub tabla_destino: String,
    pub periodo: FiscalPeriod,
}

/// Validates and inserts `records` for `periodo`. Only rows with
/// `valid == true` are considered; the caller is expected to have already
/// run them through the Validator.
pub async fn persist(
    pool: &PgPool,
    periodo: FiscalPeriod,
    records: &[SicossRecord],
    config: &SicossConfig,
) -> Result<PersistenceOutcome, SicossError> {
    let started = Instant::now();
    let valid_records: Vec<&SicossRecord> = records.iter().filter(|r| r.valid).collect();

    for (row_index, record) in valid_records.iter().enumerate() {
        validate_row(row_index, record)?;
    }

    let mut tx = pool.begin().await?;

    if config.replace_existing_period {
        sqlx::query(&format!("DELETE FROM {DESTINATION_TABLE} WHERE periodo_fiscal = $1"))
            .bind(periodo.canonical())
            .execute(&mut *tx)
            .await?;
    }

    for (chunk_index, chunk) in valid_records.chunks(config.insert_chunk_size).enumerate() {
        if let Err(err) = insert_chunk(&mut tx, chunk).await {
            tx.rollback().await.ok();
            return Err(SicossError::PersistenceFailed {
                row_index: chunk_index * config.insert_chunk_size,
                column: "bulk_insert",
                message: err.to_string(),
            });
        }
    }

    tx.commit().await?;

    Ok(PersistenceOutcome {
        legajos_guardados: valid_records.len(),
        duracion: started.elapsed(),
        tabla_destino: DESTINATION_TABLE.to_string(),
        periodo,
    })
}

/// Defensive checks the database's own constraints should also enforce:
/// exact-11-digit CUIL and non-empty identity fields. Caught here so a
/// malformed row produces a descriptive `PersistenceFailed` instead of an
/// opaque constraint-violation error from Postgres.
fn validate_row(row_index: usize, record: &SicossRecord) -> Result<(), SicossError> {
    let cuil_digits: String = record.cuil.chars().filter(|c| c.is_ascii_digit()).collect();
    if cuil_digits.len() != 11 {
        return Err(SicossError::PersistenceFailed {
            row_index,
            column: "cuil",
            message: format!("expected 11 digits, got {} ({:?})", cuil_digits.len(), record.cuil),
        });
    }
    if record.apnom.trim().is_empty() {
        return Err(SicossError::PersistenceFailed {
            row_index,
            column: "apnom",
            message: "apnom must not be empty".to_string(),
        });
    }
    Ok(())
}

fn truncated_apnom(apnom: &str) -> String {
    apnom.chars().take(APNOM_MAX_LEN).collect()
}

async fn insert_chunk(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    chunk: &[&SicossRecord],
) -> Result<(), sqlx::Error> {
    if chunk.is_empty() {
        return Ok(());
    }

    // Column list mirrors the full SicossRecord wide row (§3); this
    // mapping table is the one place core field names are translated to
    // target-table column names.
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
        "INSERT INTO {DESTINATION_TABLE} (\
         periodo_fiscal, nro_legaj, cuil, apnom, \
         conyuge, cant_hijos, cant_adh, \
         cod_situacion, cod_cond, cod_act, cod_zona, porc_aporte, cod_mod_cont, cod_os, \
         rem_total, rem_impo1, rem_impo2, rem_impo3, rem_impo4, rem_impo5, rem_impo6, \
         rem_impo7, rem_impo8, rem_impo9, sac, no_remun, \
         tipo_de_operacion, prioridad_tipo_de_actividad, trabajador_convencionado, \
         sit_rev1, sit_rev2, sit_rev3, dia_ini_sit_rev1, dia_ini_sit_rev2, dia_ini_sit_rev3, \
         asignaciones_familiares, informar_becarios, art_con_tope, conceptos_no_remun_en_art, \
         porc_aporte_adicional_jubilacion, tope_superado, tope_excedente, \
         differential_category_applied, \
         fecha_procesamiento, version_sistema, metodo_procesamiento) "
    ));

    builder.push_values(chunk.iter(), |mut b, record| {
        b.push_bind(record.periodo_fiscal.canonical())
            .push_bind(record.nro_legaj.0)
            .push_bind(record.cuil.chars().filter(|c| c.is_ascii_digit()).collect::<String>())
            .push_bind(truncated_apnom(&record.apnom))
            .push_bind(record.conyuge)
            .push_bind(record.cant_hijos as i32)
            .push_bind(record.cant_adh as i32)
            .push_bind(record.cod_situacion)
            .push_bind(record.cod_cond)
            .push_bind(record.cod_act)
            .push_bind(record.cod_zona)
            .push_bind(record.porc_aporte)
            .push_bind(record.cod_mod_cont)
            .push_bind(record.cod_os)
            .push_bind(record.rem_total)
            .push_bind(record.rem_impo1)
            .push_bind(record.rem_impo2)
            .push_bind(record.rem_impo3)
            .push_bind(record.rem_impo4)
            .push_bind(record.rem_impo5)
            .push_bind(record.rem_impo6)
            .push_bind(record.rem_impo7)
            .push_bind(record.rem_impo8)
            .push_bind(record.rem_impo9)
            .push_bind(record.sac)
            .push_bind(record.no_remun)
            .push_bind(record.tipo_de_operacion)
            .push_bind(record.prioridad_tipo_de_actividad)
            .push_bind(record.trabajador_convencionado.to_string())
            .push_bind(record.sit_rev1)
            .push_bind(record.sit_rev2)
            .push_bind(record.sit_rev3)
            .push_bind(record.dia_ini_sit_rev1)
            .push_bind(record.dia_ini_sit_rev2)
            .push_bind(record.dia_ini_sit_rev3)
            .push_bind(record.asignaciones_familiares)
            .push_bind(record.informar_becarios)
            .push_bind(record.art_con_tope)
            .push_bind(record.conceptos_no_remun_en_art)
            .push_bind(record.porc_aporte_adicional_jubilacion)
            .push_bind(record.tope_superado)
            .push_bind(record.tope_excedente)
            .push_bind(record.differential_category_applied)
            .push_bind(record.fecha_procesamiento)
            .push_bind(record.version_sistema.clone())
            .push_bind(record.metodo_procesamiento.clone());
    });

    builder.build().execute(&mut **tx).await?;
    Ok(())
}
