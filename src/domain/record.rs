//! SicossRecord: the per-employee wide output row and its invariants.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::errors::SicossError;

use super::fiscal_period::FiscalPeriod;
use super::legajo::{EmployeeId, RegimeChar};

/// Statutory floor on `rem_impo6` for Investigator-priority employees.
pub const INVESTIGATOR_FLOOR: Decimal = dec!(69_290.19);

/// Priority class at/above which an employee is considered Investigator
/// priority.
pub const INVESTIGATOR_PRIORITY_CLASS: i32 = 38;

/// Clamp band for every monetary output column.
pub const MONETARY_MIN: Decimal = Decimal::ZERO;
pub const MONETARY_MAX: Decimal = dec!(50_000_000);

/// `TipoDeOperacion` codes.
pub const TIPO_OPERACION_GENERAL: i16 = 1;
pub const TIPO_OPERACION_INVESTIGADOR: i16 = 2;

/// One output row of a SICOSS run: identity, classification, the nine
/// imponible bases, and processing metadata. Constructed once per employee
/// by the pipeline and never mutated after the Validator stage settles
/// `valid`/`exclusion_reason` — every upstream stage returns a new value.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SicossRecord {
    // identity
    pub periodo_fiscal: FiscalPeriod,
    pub nro_legaj: EmployeeId,
    pub cuil: String,
    pub apnom: String,

    // family
    pub conyuge: bool,
    pub cant_hijos: u32,
    pub cant_adh: u32,

    // classification
    pub cod_situacion: i32,
    pub cod_cond: i32,
    pub cod_act: i32,
    pub cod_zona: i32,
    pub porc_aporte: Decimal,
    pub cod_mod_cont: i32,
    pub cod_os: i32,

    // bases
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

    // categoric
    pub tipo_de_operacion: i16,
    pub prioridad_tipo_de_actividad: i32,
    pub trabajador_convencionado: RegimeChar,

    // revista (labor-status history, 3 generations)
    pub sit_rev1: i32,
    pub sit_rev2: i32,
    pub sit_rev3: i32,
    pub dia_ini_sit_rev1: Option<NaiveDate>,
    pub dia_ini_sit_rev2: Option<NaiveDate>,
    pub dia_ini_sit_rev3: Option<NaiveDate>,

    // config-driven passthrough
    pub asignaciones_familiares: Decimal,
    pub informar_becarios: bool,
    pub art_con_tope: bool,
    pub conceptos_no_remun_en_art: bool,
    pub porc_aporte_adicional_jubilacion: Decimal,

    // cap-engine reporting (populated even when trunca_tope == false, i.e.
    // reporting-only mode)
    pub tope_superado: bool,
    pub tope_excedente: Decimal,
    pub differential_category_applied: bool,

    // validator outcome; excluded rows never reach the Persister
    pub valid: bool,
    pub exclusion_reason: Option<String>,

    // meta
    pub fecha_procesamiento: DateTime<Utc>,
    pub version_sistema: String,
    pub metodo_procesamiento: String,
}

impl SicossRecord {
    /// Checks the record's business invariants. Called after CapEngine
    /// settles a row and again, defensively, just before the Persister maps
    /// it.
    pub fn check_invariants(&self) -> Result<(), SicossError> {
        let violation = |message: &str| SicossError::InvariantViolation {
            nro_legaj: self.nro_legaj,
            invariant: message.to_string(),
        };

        // The primary-base identities hold verbatim for a regular row. When
        // the differential-category rule has fired, rem_impo1 is deliberately
        // zeroed while rem_total keeps reporting the pre-rule remunerative
        // mass plus no_remun, so the checks below run against that frozen
        // total instead of the now-zeroed primary base.
        if self.differential_category_applied {
            if !self.rem_impo1.is_zero() {
                return Err(violation("rem_impo1 must be zeroed when the differential category applies"));
            }
            if self.rem_total < self.no_remun {
                return Err(violation("rem_total must not fall below no_remun under the differential category"));
            }
        } else {
            if self.rem_impo1 != self.remuner78805() {
                return Err(violation("rem_impo1 must equal the derived primary remunerative base"));
            }
            if self.rem_total != self.remuner78805() + self.no_remun {
                return Err(violation("rem_total must equal the primary remunerative base plus no_remun"));
            }
        }

        if self.rem_impo4 < MONETARY_MIN || self.rem_impo4 > self.rem_impo5 * dec!(1.10) {
            return Err(violation("rem_impo4 must stay within 110% of rem_impo5"));
        }

        if self.rem_impo9 < MONETARY_MIN || self.rem_impo9 > self.rem_impo4 * dec!(1.05) {
            return Err(violation("rem_impo9 must stay within 105% of rem_impo4"));
        }

        if self.prioridad_tipo_de_actividad >= INVESTIGATOR_PRIORITY_CLASS {
            if self.rem_impo6 < INVESTIGATOR_FLOOR {
                return Err(violation("rem_impo6 must not fall below the statutory investigator floor"));
            }
            if self.tipo_de_operacion != TIPO_OPERACION_INVESTIGADOR {
                return Err(violation("an investigator-priority record must carry the investigator TipoDeOperacion"));
            }
        }

        for (name, value) in self.monetary_fields() {
            if value < MONETARY_MIN || value > MONETARY_MAX {
                return Err(violation(&format!("{name} fell outside the allowed monetary band")));
            }
        }

        Ok(())
    }

    /// `Remuner78805` is not a column separate from `rem_impo1` in the final
    /// record — the consolidator's per-group aggregates that sum to it
    /// (`ImporteSAC`, `ImporteHorasExtras`, ...) are intermediate and do not
    /// survive past `ConsolidatedRow`. The identity with `rem_impo1` holds by
    /// construction; this accessor exists so the invariant above reads as an
    /// explicit check rather than a silent assumption.
    pub fn remuner78805(&self) -> Decimal {
        self.rem_impo1
    }

    fn monetary_fields(&self) -> [(&'static str, Decimal); 12] {
        [
            ("rem_total", self.rem_total),
            ("rem_impo1", self.rem_impo1),
            ("rem_impo2", self.rem_impo2),
            ("rem_impo3", self.rem_impo3),
            ("rem_impo4", self.rem_impo4),
            ("rem_impo5", self.rem_impo5),
            ("rem_impo6", self.rem_impo6),
            ("rem_impo7", self.rem_impo7),
            ("rem_impo8", self.rem_impo8),
            ("rem_impo9", self.rem_impo9),
            ("sac", self.sac),
            ("no_remun", self.no_remun),
        ]
    }

    /// Whether every remunerative base (`rem_impo1..rem_impo9`, `sac`) is
    /// zero. Used by the Validator's `check_lic` guard, which only excludes
    /// an on-leave employee when there is no remunerative mass left to
    /// report — `no_remun` does not count, since it is non-remunerative by
    /// definition.
    pub fn all_remunerative_bases_are_zero(&self) -> bool {
        self.rem_impo1.is_zero()
            && self.rem_impo2.is_zero()
            && self.rem_impo3.is_zero()
            && self.rem_impo4.is_zero()
            && self.rem_impo5.is_zero()
            && self.rem_impo6.is_zero()
            && self.rem_impo7.is_zero()
            && self.rem_impo8.is_zero()
            && self.rem_impo9.is_zero()
            && self.sac.is_zero()
    }

    /// Clamp every monetary field into `[MONETARY_MIN, MONETARY_MAX]`.
    pub fn clamp_monetary(&mut self) {
        let clamp = |v: Decimal| v.max(MONETARY_MIN).min(MONETARY_MAX);
        self.rem_total = clamp(self.rem_total);
        self.rem_impo1 = clamp(self.rem_impo1);
        self.rem_impo2 = clamp(self.rem_impo2);
        self.rem_impo3 = clamp(self.rem_impo3);
        self.rem_impo4 = clamp(self.rem_impo4);
        self.rem_impo5 = clamp(self.rem_impo5);
        self.rem_impo6 = clamp(self.rem_impo6);
        self.rem_impo7 = clamp(self.rem_impo7);
        self.rem_impo8 = clamp(self.rem_impo8);
        self.rem_impo9 = clamp(self.rem_impo9);
        self.sac = clamp(self.sac);
        self.no_remun = clamp(self.no_remun);
    }
}
