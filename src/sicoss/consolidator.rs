//! ConceptConsolidator — folds the Conceptos line-item stream into
//! per-employee consolidated columns and derives the base remunerative sums.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::domain::concepto::{groups, Escalafon, GroupTagSet};
use crate::domain::legajo::EmployeeId;
use crate::domain::{Concepto, Legajo};
use crate::errors::SicossError;

/// One accumulator column a concept's group tag can route to. The mapping
/// from `(group, escalafon)` to this enum is the static routing table; see
/// `destination_columns` below.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DestinationColumn {
    Sac,
    ZonaDesfavorable,
    Vacaciones,
    Premios,
    Adicionales,
    HorasExtras,
    Becario,
    NoRemun,
    SacDoce,
    SeguroVida,
    Investigador,
    AsignacionesFamiliares,
}

/// Routes one concept's group tag (plus its escalafón, when relevant) to
/// the destination column(s) it contributes to. Returns an empty slice for
/// unrecognized groups — the caller logs and ignores those.
fn destination_columns(tag: u8, escalafon: Option<Escalafon>) -> &'static [DestinationColumn] {
    use DestinationColumn::*;
    match tag {
        groups::SAC => &[Sac],
        groups::ZONA_DESFAVORABLE => &[ZonaDesfavorable],
        groups::VACACIONES => &[Vacaciones],
        groups::PREMIOS => &[Premios],
        groups::ADICIONALES => &[Adicionales],
        groups::HORAS_EXTRAS => &[HorasExtras],
        groups::BECARIO => &[Becario],
        groups::NO_REMUN => &[NoRemun],
        groups::SAC_ESCALAFON => {
            if escalafon == Some(Escalafon::Doce) {
                &[Sac, SacDoce]
            } else {
                &[Sac]
            }
        }
        groups::SEGURO_VIDA => &[SeguroVida],
        groups::ASIGNACIONES_FAMILIARES => &[AsignacionesFamiliares],
        t if groups::INVESTIGADOR_SUBTYPES.contains(&t) => &[Investigador],
        _ => &[],
    }
}

#[derive(Clone, Debug, Default)]
struct Accumulator {
    importe_sac: Decimal,
    importe_zona_desfavorable: Decimal,
    importe_vacaciones: Decimal,
    importe_premios: Decimal,
    importe_adicionales: Decimal,
    importe_horas_extras: Decimal,
    importe_becario: Decimal,
    importe_no_remun: Decimal,
    importe_sac_doce: Decimal,
    importe_seguro_vida: Decimal,
    importe_investigador: Decimal,
    importe_asignaciones_familiares: Decimal,
    contributing_groups: Vec<u8>,
}

impl Accumulator {
    fn add(&mut self, column: DestinationColumn, amount: Decimal) {
        match column {
            DestinationColumn::Sac => self.importe_sac += amount,
            DestinationColumn::ZonaDesfavorable => self.importe_zona_desfavorable += amount,
            DestinationColumn::Vacaciones => self.importe_vacaciones += amount,
            DestinationColumn::Premios => self.importe_premios += amount,
            DestinationColumn::Adicionales => self.importe_adicionales += amount,
            DestinationColumn::HorasExtras => self.importe_horas_extras += amount,
            DestinationColumn::Becario => self.importe_becario += amount,
            DestinationColumn::NoRemun => self.importe_no_remun += amount,
            DestinationColumn::SacDoce => self.importe_sac_doce += amount,
            DestinationColumn::SeguroVida => self.importe_seguro_vida += amount,
            DestinationColumn::Investigador => self.importe_investigador += amount,
            DestinationColumn::AsignacionesFamiliares => self.importe_asignaciones_familiares += amount,
        }
    }
}

/// Per-employee consolidated row: the Legajo joined with every aggregate
/// column the concept explosion produced, plus the derived base sums.
#[derive(Clone, Debug)]
pub struct ConsolidatedRow {
    pub legajo: Legajo,

    pub importe_sac: Decimal,
    pub importe_zona_desfavorable: Decimal,
    pub importe_vacaciones: Decimal,
    pub importe_premios: Decimal,
    pub importe_adicionales: Decimal,
    pub importe_horas_extras: Decimal,
    pub importe_imponible_becario: Decimal,
    pub importe_no_remun: Decimal,
    pub importe_sac_doce: Decimal,
    pub importe_seguro_vida: Decimal,
    pub importe_investigador: Decimal,
    /// Family-allowance amount sourced directly from concepts, added to
    /// the per-dependent formula in the Calculator's `AsignacionesFamiliares`.
    pub importe_asignaciones_familiares: Decimal,

    /// Union of every group tag this employee's concepts carried; feeds
    /// `PrioridadTipoDeActividad` derivation in the Calculator.
    pub contributing_groups: GroupTagSet,

    // derived base sums
    pub remuner_78805: Decimal,
    pub importe_imponible_patronal: Decimal,
    pub importe_sac_patronal: Decimal,
    pub importe_imponible_sin_sac: Decimal,
    pub importe_bruto: Decimal,
    pub importe_impon: Decimal,
}

impl ConsolidatedRow {
    fn from_parts(legajo: Legajo, acc: Accumulator) -> Self {
        let remuner_78805 = acc.importe_sac
            + acc.importe_horas_extras
            + acc.importe_zona_desfavorable
            + acc.importe_vacaciones
            + acc.importe_premios
            + acc.importe_adicionales
            + acc.importe_becario;
        let importe_imponible_patronal = remuner_78805;
        let importe_sac_patronal = acc.importe_sac;
        let importe_imponible_sin_sac = importe_imponible_patronal - importe_sac_patronal;
        let importe_bruto = importe_imponible_patronal + acc.importe_no_remun;
        let importe_impon = remuner_78805;

        Self {
            legajo,
            importe_sac: acc.importe_sac,
            importe_zona_desfavorable: acc.importe_zona_desfavorable,
            importe_vacaciones: acc.importe_vacaciones,
            importe_premios: acc.importe_premios,
            importe_adicionales: acc.importe_adicionales,
            importe_horas_extras: acc.importe_horas_extras,
            importe_imponible_becario: acc.importe_becario,
            importe_no_remun: acc.importe_no_remun,
            importe_sac_doce: acc.importe_sac_doce,
            importe_seguro_vida: acc.importe_seguro_vida,
            importe_investigador: acc.importe_investigador,
            importe_asignaciones_familiares: acc.importe_asignaciones_familiares,
            contributing_groups: GroupTagSet::new(acc.contributing_groups),
            remuner_78805,
            importe_imponible_patronal,
            importe_sac_patronal,
            importe_imponible_sin_sac,
            importe_bruto,
            importe_impon,
        }
    }
}

/// Runs the explode -> map -> sum -> derive -> join algorithm over the
/// whole roster.
pub fn consolidate(legajos: &[Legajo], conceptos: &[Concepto]) -> Result<Vec<ConsolidatedRow>, SicossError> {
    let mut accumulators: HashMap<EmployeeId, Accumulator> = HashMap::new();

    for concepto in conceptos {
        let acc = accumulators.entry(concepto.nro_legaj).or_default();
        // Explode: one logical contribution per tag this concept carries.
        for tag in concepto.tipos_grupos.iter() {
            let columns = destination_columns(tag, concepto.escalafon);
            if columns.is_empty() {
                tracing::warn!(
                    nro_legaj = concepto.nro_legaj.0,
                    codn_conce = concepto.codn_conce,
                    group = tag,
                    "unrecognized concept group tag, ignoring"
                );
                continue;
            }
            acc.contributing_groups.push(tag);
            for &column in columns {
                acc.add(column, concepto.impp_conce);
            }
        }
    }

    // Left-join onto Legajos: employees without concepts get all-zero
    // aggregates via `Accumulator::default()`.
    let rows = legajos
        .iter()
        .cloned()
        .map(|legajo| {
            let acc = accumulators.remove(&legajo.nro_legaj).unwrap_or_default();
            ConsolidatedRow::from_parts(legajo, acc)
        })
        .collect();

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::concepto::TipoConce;
    use crate::domain::legajo::RegimeChar;
    use rust_decimal_macros::dec;

    fn sample_legajo(id: i64) -> Legajo {
        Legajo {
            nro_legaj: EmployeeId(id),
            cuil: "20123456789".to_string(),
            apnom: "PEREZ, JUAN".to_string(),
            cod_situacion: 1,
            cod_condicion: 1,
            cod_actividad: 0,
            cod_zona: 1,
            cod_mod_contratacion: 1,
            cod_obra_social: 101,
            regimen: RegimeChar('0'),
            conyuge: false,
            hijos: 0,
            adherentes: 0,
            licencia: false,
            trabajador_convencionado: RegimeChar('0'),
            provincia_localidad: None,
        }
    }

    fn concept(id: i64, amount: Decimal, tags: Vec<u8>) -> Concepto {
        Concepto {
            nro_legaj: EmployeeId(id),
            codn_conce: 1,
            impp_conce: amount,
            tipos_grupos: GroupTagSet::new(tags),
            tipo_conce: TipoConce::C,
            nro_orimp: 1,
            escalafon: None,
        }
    }

    #[test]
    fn mapping_table_is_exhaustive() {
        // Every documented group tag must route somewhere.
        let documented = [
            groups::SAC,
            groups::ZONA_DESFAVORABLE,
            groups::VACACIONES,
            groups::PREMIOS,
            groups::ADICIONALES,
            groups::HORAS_EXTRAS,
            groups::BECARIO,
            groups::NO_REMUN,
            groups::SAC_ESCALAFON,
            groups::SEGURO_VIDA,
            groups::ASIGNACIONES_FAMILIARES,
        ];
        for tag in documented {
            assert!(!destination_columns(tag, None).is_empty(), "tag {tag} is unmapped");
        }
        for tag in groups::INVESTIGADOR_SUBTYPES {
            assert!(!destination_columns(tag, None).is_empty(), "investigator tag {tag} is unmapped");
        }
        assert!(destination_columns(200, None).is_empty());
    }

    #[test]
    fn sac_with_doce_escalafon_credits_both_columns() {
        let rows = consolidate(
            &[sample_legajo(1)],
            &[concept(1, dec!(1_000.00), vec![groups::SAC_ESCALAFON])
                .tap_escalafon(Escalafon::Doce)],
        )
        .unwrap();
        assert_eq!(rows[0].importe_sac, dec!(1_000.00));
        assert_eq!(rows[0].importe_sac_doce, dec!(1_000.00));
    }

    #[test]
    fn mass_is_conserved_across_mapped_groups() {
        let conceptos = vec![
            concept(1, dec!(500_000.00), vec![groups::ZONA_DESFAVORABLE]),
            concept(1, dec!(50_000.00), vec![groups::NO_REMUN]),
        ];
        let rows = consolidate(&[sample_legajo(1)], &conceptos).unwrap();
        let total_input: Decimal = conceptos.iter().map(|c| c.impp_conce).sum();
        let total_output = rows[0].importe_zona_desfavorable + rows[0].importe_no_remun;
        assert_eq!(total_input, total_output);
    }

    #[test]
    fn unmapped_group_does_not_contribute() {
        let rows = consolidate(&[sample_legajo(1)], &[concept(1, dec!(100.00), vec![250])]).unwrap();
        assert_eq!(rows[0].remuner_78805, Decimal::ZERO);
    }

    #[test]
    fn employee_without_concepts_gets_all_zero_row() {
        let rows = consolidate(&[sample_legajo(1)], &[]).unwrap();
        assert_eq!(rows[0].remuner_78805, Decimal::ZERO);
        assert_eq!(rows[0].importe_bruto, Decimal::ZERO);
    }

    #[test]
    fn derives_base_columns_per_spec_formula() {
        let conceptos = vec![
            concept(1, dec!(100_000.00), vec![groups::SAC]),
            concept(1, dec!(50_000.00), vec![groups::HORAS_EXTRAS]),
            concept(1, dec!(20_000.00), vec![groups::NO_REMUN]),
        ];
        let rows = consolidate(&[sample_legajo(1)], &conceptos).unwrap();
        let row = &rows[0];
        assert_eq!(row.remuner_78805, dec!(150_000.00));
        assert_eq!(row.importe_imponible_patronal, dec!(150_000.00));
        assert_eq!(row.importe_sac_patronal, dec!(100_000.00));
        assert_eq!(row.importe_imponible_sin_sac, dec!(50_000.00));
        assert_eq!(row.importe_bruto, dec!(170_000.00));
        assert_eq!(row.importe_impon, dec!(150_000.00));
    }

    trait TapEscalafon {
        fn tap_escalafon(self, e: Escalafon) -> Self;
    }
    impl TapEscalafon for Concepto {
        fn tap_escalafon(mut self, e: Escalafon) -> Self {
            self.escalafon = Some(e);
            self
        }
    }
}
