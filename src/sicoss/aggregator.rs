//! Aggregator — totals the valid rows of a run. The reduction is associative
//! and commutative over rows, so the pipeline can fold per-`rayon`-chunk
//! partials and combine them in any order without changing the result.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::record::SicossRecord;

/// Run-wide totals over every row the Validator kept. Excluded rows are
/// counted but do not contribute to the monetary sums.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SicossTotals {
    pub legajos_validos: usize,
    pub legajos_excluidos: usize,
    pub legajos_con_tope_superado: usize,

    pub rem_total: Decimal,
    pub rem_impo1: Decimal,
    pub rem_impo2: Decimal,
    pub rem_impo3: Decimal,
    pub rem_impo4: Decimal,
    pub rem_impo5: Decimal,
    pub rem_impo6: Decimal,
    pub rem_impo7: Decimal,
    pub rem_impo8: Decimal,
    pub rem_impo9: Decimal,
    pub sac: Decimal,
    pub no_remun: Decimal,
}

impl SicossTotals {
    /// Folds one record into the running totals. Excluded rows only move
    /// the exclusion counter.
    pub fn fold(mut self, record: &SicossRecord) -> Self {
        if !record.valid {
            self.legajos_excluidos += 1;
            return self;
        }

        self.legajos_validos += 1;
        if record.tope_superado {
            self.legajos_con_tope_superado += 1;
        }

        self.rem_total += record.rem_total;
        self.rem_impo1 += record.rem_impo1;
        self.rem_impo2 += record.rem_impo2;
        self.rem_impo3 += record.rem_impo3;
        self.rem_impo4 += record.rem_impo4;
        self.rem_impo5 += record.rem_impo5;
        self.rem_impo6 += record.rem_impo6;
        self.rem_impo7 += record.rem_impo7;
        self.rem_impo8 += record.rem_impo8;
        self.rem_impo9 += record.rem_impo9;
        self.sac += record.sac;
        self.no_remun += record.no_remun;

        self
    }

    /// Combines two partial totals, e.g. from independently reduced
    /// `rayon` chunks. Order of the two arguments does not matter.
    pub fn combine(self, other: Self) -> Self {
        Self {
            legajos_validos: self.legajos_validos + other.legajos_validos,
            legajos_excluidos: self.legajos_excluidos + other.legajos_excluidos,
            legajos_con_tope_superado: self.legajos_con_tope_superado + other.legajos_con_tope_superado,
            rem_total: self.rem_total + other.rem_total,
            rem_impo1: self.rem_impo1 + other.rem_impo1,
            rem_impo2: self.rem_impo2 + other.rem_impo2,
            rem_impo3: self.rem_impo3 + other.rem_impo3,
            rem_impo4: self.rem_impo4 + other.rem_impo4,
            rem_impo5: self.rem_impo5 + other.rem_impo5,
            rem_impo6: self.rem_impo6 + other.rem_impo6,
            rem_impo7: self.rem_impo7 + other.rem_impo7,
            rem_impo8: self.rem_impo8 + other.rem_impo8,
            rem_impo9: self.rem_impo9 + other.rem_impo9,
            sac: self.sac + other.sac,
            no_remun: self.no_remun + other.no_remun,
        }
    }
}

/// Serial reduction over a slice of records; used directly for small
/// rosters and as the reference result in partition-invariance tests.
pub fn aggregate(records: &[SicossRecord]) -> SicossTotals {
    records.iter().fold(SicossTotals::default(), SicossTotals::fold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::legajo::{EmployeeId, RegimeChar};
    use crate::domain::record::TIPO_OPERACION_GENERAL;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn record(id: i64, amount: rust_decimal::Decimal, valid: bool) -> SicossRecord {
        SicossRecord {
            periodo_fiscal: "202401".parse().unwrap(),
            nro_legaj: EmployeeId(id),
            cuil: "20123456789".to_string(),
            apnom: "PEREZ, JUAN".to_string(),
            conyuge: false,
            cant_hijos: 0,
            cant_adh: 0,
            cod_situacion: 1,
            cod_cond: 1,
            cod_act: 0,
            cod_zona: 1,
            porc_aporte: rust_decimal::Decimal::ZERO,
            cod_mod_cont: 1,
            cod_os: 101,
            rem_total: amount,
            rem_impo1: amount,
            rem_impo2: amount,
            rem_impo3: amount,
            rem_impo4: amount,
            rem_impo5: amount,
            rem_impo6: amount,
            rem_impo7: amount,
            rem_impo8: rust_decimal::Decimal::ZERO,
            rem_impo9: amount,
            sac: rust_decimal::Decimal::ZERO,
            no_remun: rust_decimal::Decimal::ZERO,
            tipo_de_operacion: TIPO_OPERACION_GENERAL,
            prioridad_tipo_de_actividad: 1,
            trabajador_convencionado: RegimeChar('0'),
            sit_rev1: 1,
            sit_rev2: 0,
            sit_rev3: 0,
            dia_ini_sit_rev1: None,
            dia_ini_sit_rev2: None,
            dia_ini_sit_rev3: None,
            asignaciones_familiares: rust_decimal::Decimal::ZERO,
            informar_becarios: false,
            art_con_tope: false,
            conceptos_no_remun_en_art: false,
            porc_aporte_adicional_jubilacion: rust_decimal::Decimal::ZERO,
            tope_superado: false,
            tope_excedente: rust_decimal::Decimal::ZERO,
            differential_category_applied: false,
            valid,
            exclusion_reason: if valid { None } else { Some("test".to_string()) },
            fecha_procesamiento: Utc::now(),
            version_sistema: "test".to_string(),
            metodo_procesamiento: "test".to_string(),
        }
    }

    #[test]
    fn excluded_rows_do_not_contribute_to_sums() {
        let records = vec![record(1, dec!(100.00), true), record(2, dec!(999.00), false)];
        let totals = aggregate(&records);
        assert_eq!(totals.legajos_validos, 1);
        assert_eq!(totals.legajos_excluidos, 1);
        assert_eq!(totals.rem_total, dec!(100.00));
    }

    #[test]
    fn partition_and_combine_matches_whole_reduction() {
        let records: Vec<_> = (0..10).map(|i| record(i, dec!(1_000.00) * rust_decimal::Decimal::from(i + 1), true)).collect();
        let whole = aggregate(&records);

        let (left, right) = records.split_at(4);
        let partitioned = aggregate(left).combine(aggregate(right));

        assert_eq!(whole, partitioned);
    }
}
