//! Calculator — derives the nine imponible bases, activity priority, and
//! family-allowance passthrough for one employee from its consolidated row.
//!
//! Runs after the consolidator and before CapEngine; everything here is a
//! pure function of one employee's `ConsolidatedRow` plus the run-wide
//! config, so the pipeline can fan it out with `rayon` across the roster.

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::config::SicossConfig;
use crate::domain::concepto::groups;
use crate::domain::record::{
    SicossRecord, INVESTIGATOR_FLOOR, INVESTIGATOR_PRIORITY_CLASS, TIPO_OPERACION_GENERAL,
    TIPO_OPERACION_INVESTIGADOR,
};
use crate::domain::FiscalPeriod;

use super::consolidator::ConsolidatedRow;

/// Per-child component of `AsignacionesFamiliares = 1000·hijos +
/// 500·(conyuge?1:0) + ImporteAsignacionesFamiliares`.
const FAMILY_ALLOWANCE_PER_CHILD: Decimal = dec!(1_000.00);
/// Flat spouse component of the same formula.
const FAMILY_ALLOWANCE_SPOUSE: Decimal = dec!(500.00);

/// Priority class attached to a becario row when `informar_becarios` is set;
/// strictly below the investigator class so a roster member tagged with
/// both wins on the investigator side (highest class wins ties).
const BECARIO_PRIORITY_CLASS: i32 = 20;

const DEFAULT_PRIORITY_CLASS: i32 = 1;

/// Picks the highest-ranked activity class an employee's concepts put them
/// in. Investigator subtypes always outrank the becario class, which
/// outranks the roster default.
fn prioridad_tipo_de_actividad(row: &ConsolidatedRow, config: &SicossConfig) -> i32 {
    let mut priority = DEFAULT_PRIORITY_CLASS;
    if config.informar_becarios && row.contributing_groups.contains(groups::BECARIO) {
        priority = priority.max(BECARIO_PRIORITY_CLASS);
    }
    if row.contributing_groups.iter().any(|g| groups::INVESTIGADOR_SUBTYPES.contains(&g)) {
        priority = priority.max(INVESTIGATOR_PRIORITY_CLASS);
    }
    priority
}

/// `AsignacionesFamiliares = 1000·hijos + 500·(conyuge?1:0) +
/// ImporteAsignacionesFamiliares`, or 0 when the config flag is off.
fn asignaciones_familiares(row: &ConsolidatedRow, config: &SicossConfig) -> Decimal {
    if !config.asignacion_familiar {
        return Decimal::ZERO;
    }
    let mut total = FAMILY_ALLOWANCE_PER_CHILD * Decimal::from(row.legajo.hijos);
    if row.legajo.conyuge {
        total += FAMILY_ALLOWANCE_SPOUSE;
    }
    total += row.importe_asignaciones_familiares;
    total
}

/// Derives one employee's pre-cap `SicossRecord` from its consolidated row.
/// CapEngine settles the statutory caps and the differential-category rule
/// afterward; Validator settles `valid`/`exclusion_reason`.
pub fn calculate(row: &ConsolidatedRow, config: &SicossConfig, periodo_fiscal: FiscalPeriod) -> SicossRecord {
    let legajo = &row.legajo;
    let priority = prioridad_tipo_de_actividad(row, config);
    let tipo_de_operacion =
        if priority >= INVESTIGATOR_PRIORITY_CLASS { TIPO_OPERACION_INVESTIGADOR } else { TIPO_OPERACION_GENERAL };

    let rem_impo1 = row.remuner_78805;
    let rem_impo2 = row.remuner_78805;
    let rem_impo3 = row.importe_imponible_patronal;
    // Imponible_4 starts life as the non-SAC patronal mass; CapEngine may
    // truncate it against T_OA net of OtraActividad credits.
    let rem_impo4 = row.importe_imponible_sin_sac;
    let rem_impo5 = row.remuner_78805;
    let rem_impo7 = row.importe_imponible_sin_sac;
    let rem_impo8 = row.importe_no_remun;
    // Imponible_9 (ART base) starts out equal to Imponible_4; CapEngine
    // re-clamps it to at most 105% of Imponible_4 once that has settled.
    let rem_impo9 = rem_impo4;

    let mut rem_impo6 = row.importe_investigador;
    if priority >= INVESTIGATOR_PRIORITY_CLASS {
        rem_impo6 = rem_impo6.max(INVESTIGATOR_FLOOR);
    }

    SicossRecord {
        periodo_fiscal,
        nro_legaj: legajo.nro_legaj,
        cuil: legajo.cuil.clone(),
        apnom: legajo.apnom.clone(),

        conyuge: legajo.conyuge,
        cant_hijos: legajo.hijos,
        cant_adh: legajo.adherentes,

        cod_situacion: legajo.cod_situacion,
        cod_cond: legajo.cod_condicion,
        cod_act: legajo.cod_actividad,
        cod_zona: legajo.cod_zona,
        porc_aporte: config.porc_aporte_adicional_jubilacion,
        cod_mod_cont: legajo.cod_mod_contratacion,
        cod_os: legajo.cod_obra_social,

        rem_total: row.importe_bruto,
        rem_impo1,
        rem_impo2,
        rem_impo3,
        rem_impo4,
        rem_impo5,
        rem_impo6,
        rem_impo7,
        rem_impo8,
        rem_impo9,
        sac: row.importe_sac,
        no_remun: row.importe_no_remun,

        tipo_de_operacion,
        prioridad_tipo_de_actividad: priority,
        trabajador_convencionado: legajo.trabajador_convencionado,

        sit_rev1: legajo.cod_situacion,
        sit_rev2: 0,
        sit_rev3: 0,
        dia_ini_sit_rev1: None,
        dia_ini_sit_rev2: None,
        dia_ini_sit_rev3: None,

        asignaciones_familiares: asignaciones_familiares(row, config),
        informar_becarios: config.informar_becarios,
        art_con_tope: config.art_con_tope,
        conceptos_no_remun_en_art: config.conceptos_no_remun_en_art,
        porc_aporte_adicional_jubilacion: config.porc_aporte_adicional_jubilacion,

        tope_superado: false,
        tope_excedente: Decimal::ZERO,
        differential_category_applied: false,

        valid: true,
        exclusion_reason: None,

        fecha_procesamiento: Utc::now(),
        version_sistema: config.version_sistema.clone(),
        metodo_procesamiento: "pipeline".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::legajo::{EmployeeId, RegimeChar};
    use crate::domain::{GroupTagSet, Legajo};

    fn legajo(conyuge: bool, hijos: u32, adherentes: u32) -> Legajo {
        Legajo {
            nro_legaj: EmployeeId(1),
            cuil: "20123456789".to_string(),
            apnom: "PEREZ, JUAN".to_string(),
            cod_situacion: 1,
            cod_condicion: 1,
            cod_actividad: 0,
            cod_zona: 1,
            cod_mod_contratacion: 1,
            cod_obra_social: 101,
            regimen: RegimeChar('0'),
            conyuge,
            hijos,
            adherentes,
            licencia: false,
            trabajador_convencionado: RegimeChar('0'),
            provincia_localidad: None,
        }
    }

    fn consolidated(legajo: Legajo, groups: Vec<u8>, remuner: Decimal, investigador: Decimal) -> ConsolidatedRow {
        ConsolidatedRow {
            legajo,
            importe_sac: Decimal::ZERO,
            importe_zona_desfavorable: Decimal::ZERO,
            importe_vacaciones: Decimal::ZERO,
            importe_premios: Decimal::ZERO,
            importe_adicionales: Decimal::ZERO,
            importe_horas_extras: Decimal::ZERO,
            importe_imponible_becario: Decimal::ZERO,
            importe_no_remun: Decimal::ZERO,
            importe_sac_doce: Decimal::ZERO,
            importe_seguro_vida: Decimal::ZERO,
            importe_investigador: investigador,
            importe_asignaciones_familiares: Decimal::ZERO,
            contributing_groups: GroupTagSet::new(groups),
            remuner_78805: remuner,
            importe_imponible_patronal: remuner,
            importe_sac_patronal: Decimal::ZERO,
            importe_imponible_sin_sac: remuner,
            importe_bruto: remuner,
            importe_impon: remuner,
        }
    }

    #[test]
    fn general_employee_gets_default_priority_and_tipo() {
        let row = consolidated(legajo(false, 0, 0), vec![groups::SAC], dec!(100_000.00), Decimal::ZERO);
        let record = calculate(&row, &SicossConfig::default(), "202401".parse().unwrap());
        assert_eq!(record.prioridad_tipo_de_actividad, DEFAULT_PRIORITY_CLASS);
        assert_eq!(record.tipo_de_operacion, TIPO_OPERACION_GENERAL);
    }

    #[test]
    fn investigator_subtype_outranks_becario() {
        let row = consolidated(
            legajo(false, 0, 0),
            vec![groups::BECARIO, 11],
            dec!(10_000.00),
            dec!(5_000.00),
        );
        let mut config = SicossConfig::default();
        config.informar_becarios = true;
        let record = calculate(&row, &config, "202401".parse().unwrap());
        assert_eq!(record.prioridad_tipo_de_actividad, INVESTIGATOR_PRIORITY_CLASS);
        assert_eq!(record.tipo_de_operacion, TIPO_OPERACION_INVESTIGADOR);
    }

    #[test]
    fn investigator_base_is_floored() {
        let row = consolidated(legajo(false, 0, 0), vec![11], dec!(1_000.00), dec!(500.00));
        let record = calculate(&row, &SicossConfig::default(), "202401".parse().unwrap());
        assert_eq!(record.rem_impo6, INVESTIGATOR_FLOOR);
    }

    #[test]
    fn non_investigator_base_ignores_remuner_78805() {
        let row = consolidated(legajo(false, 0, 0), vec![groups::SAC], dec!(500_000.00), Decimal::ZERO);
        let record = calculate(&row, &SicossConfig::default(), "202401".parse().unwrap());
        assert_eq!(record.rem_impo6, Decimal::ZERO);
    }

    #[test]
    fn investigator_base_is_subtype_sum_not_inflated_by_remuner_78805() {
        let row = consolidated(legajo(false, 0, 0), vec![11], dec!(500_000.00), dec!(20_000.00));
        let record = calculate(&row, &SicossConfig::default(), "202401".parse().unwrap());
        assert_eq!(record.rem_impo6, INVESTIGATOR_FLOOR);
    }

    #[test]
    fn family_allowance_is_zero_when_disabled() {
        let row = consolidated(legajo(true, 2, 1), vec![], dec!(0), Decimal::ZERO);
        let record = calculate(&row, &SicossConfig::default(), "202401".parse().unwrap());
        assert_eq!(record.asignaciones_familiares, Decimal::ZERO);
    }

    #[test]
    fn family_allowance_sums_spouse_children_and_concept_amount() {
        let mut row = consolidated(legajo(true, 2, 1), vec![], dec!(0), Decimal::ZERO);
        row.importe_asignaciones_familiares = dec!(750.00);
        let mut config = SicossConfig::default();
        config.asignacion_familiar = true;
        let record = calculate(&row, &config, "202401".parse().unwrap());
        let expected = FAMILY_ALLOWANCE_PER_CHILD * dec!(2) + FAMILY_ALLOWANCE_SPOUSE + dec!(750.00);
        assert_eq!(record.asignaciones_familiares, expected);
    }
}
