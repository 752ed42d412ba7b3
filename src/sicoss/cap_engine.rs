//! CapEngine — applies the statutory caps and the differential-category
//! rule to one employee's pre-cap record.
//!
//! Modeled as an explicit state machine so each transition's precondition
//! and the order caps apply in (patronal, then personal net of other-job
//! credits, then "other contributions", then the ART re-clamp and
//! differential-category rule) stays visible in the type rather than
//! buried in one long function.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::config::SicossConfig;
use crate::domain::record::SicossRecord;
use crate::domain::OtraActividad;
use crate::errors::SicossError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Open,
    CappedPatronal,
    CappedPersonal,
    CappedOtros,
    Final,
}

/// Drives one employee's record through the cap pipeline. Each `step` call
/// advances exactly one stage; `run` drives it to `Final` in one call for
/// callers that don't need to inspect intermediate stages.
pub struct CapEngine<'a> {
    stage: Stage,
    config: &'a SicossConfig,
    otra_actividad: Option<&'a OtraActividad>,
}

impl<'a> CapEngine<'a> {
    pub fn new(config: &'a SicossConfig, otra_actividad: Option<&'a OtraActividad>) -> Self {
        Self { stage: Stage::Open, config, otra_actividad }
    }

    pub fn run(mut self, mut record: SicossRecord) -> Result<SicossRecord, SicossError> {
        loop {
            match self.stage {
                Stage::Open => {
                    record = self.cap_patronal(record);
                    self.stage = Stage::CappedPatronal;
                }
                Stage::CappedPatronal => {
                    record = self.cap_personal(record);
                    self.stage = Stage::CappedPersonal;
                }
                Stage::CappedPersonal => {
                    record = self.cap_otros(record);
                    self.stage = Stage::CappedOtros;
                }
                Stage::CappedOtros => {
                    record = self.finalize(record);
                    self.stage = Stage::Final;
                }
                Stage::Final => return Ok(record),
            }
        }
    }

    /// Patronal base (`rem_impo3`, `ImporteSAC` + `ImporteImponibleSinSAC`)
    /// against `tope_jubilatorio_patronal`. SAC and non-SAC patronal mass
    /// truncate independently: the non-SAC component (carried in
    /// `rem_impo7`) absorbs the room left after the SAC component (`sac`)
    /// has been capped, matching the source's `ImporteSACPatronal` /
    /// `ImporteImponibleSinSAC` split. `rem_impo1..rem_impo3` are then
    /// recomputed from the (possibly truncated) split so later stages see
    /// a single settled primary base.
    fn cap_patronal(&self, mut record: SicossRecord) -> SicossRecord {
        let cap = self.config.tope_jubilatorio_patronal;
        if record.rem_impo3 > cap {
            let excedente = record.rem_impo3 - cap;
            if self.config.trunca_tope {
                record.sac = record.sac.min(cap);
                let room = (cap - record.sac).max(Decimal::ZERO);
                record.rem_impo7 = record.rem_impo7.min(room);
            } else {
                record.tope_superado = true;
                record.tope_excedente += excedente;
            }
        }
        let settled = record.rem_impo7 + record.sac;
        record.rem_impo1 = settled;
        record.rem_impo2 = settled;
        record.rem_impo3 = settled;
        record
    }

    /// Personal bases (`rem_impo1`, `rem_impo2`) against
    /// `tope_jubilatorio_personal`, net of jubilatorio contributions already
    /// credited at another employer.
    fn cap_personal(&self, mut record: SicossRecord) -> SicossRecord {
        let credited = self.otra_actividad.map(|o| o.importe_jubilatorio).unwrap_or_default();
        let effective_cap = (self.config.tope_jubilatorio_personal - credited).max(Decimal::ZERO);

        for base in [&mut record.rem_impo1, &mut record.rem_impo2] {
            if *base > effective_cap {
                let excedente = *base - effective_cap;
                if self.config.trunca_tope {
                    *base = effective_cap;
                } else {
                    record.tope_superado = true;
                    record.tope_excedente += excedente;
                }
            }
        }
        record
    }

    /// `rem_impo4` (other personal contributions base) against
    /// `tope_otros_aportes_personales`, net of credits from other jobs.
    fn cap_otros(&self, mut record: SicossRecord) -> SicossRecord {
        let credited = self.otra_actividad.map(|o| o.importe_otros).unwrap_or_default();
        let effective_cap = (self.config.tope_otros_aportes_personales - credited).max(Decimal::ZERO);

        if record.rem_impo4 > effective_cap {
            let excedente = record.rem_impo4 - effective_cap;
            if self.config.trunca_tope {
                record.rem_impo4 = effective_cap;
            } else {
                record.tope_superado = true;
                record.tope_excedente += excedente;
            }
        }
        record
    }

    /// ART re-clamp ordering (`rem_impo4` settles against `rem_impo5` first,
    /// `rem_impo9` re-settles against the now-final `rem_impo4` second) and
    /// the differential-category rule.
    fn finalize(&self, mut record: SicossRecord) -> SicossRecord {
        // OtraActividad credits can push Imponible_4 above 110% of
        // Imponible_5 even after the T_OA truncation above.
        if record.rem_impo4 > record.rem_impo5 * dec!(1.10) {
            record.rem_impo4 = record.rem_impo5;
        }
        let art_ceiling = record.rem_impo4 * dec!(1.05);
        if record.rem_impo9 > art_ceiling {
            record.rem_impo9 = art_ceiling;
        }

        // Freeze rem_total from the settled primary base before the
        // differential-category rule, if it fires, zeroes rem_impo1 —
        // rem_total keeps reporting the pre-rule remunerative mass plus
        // no_remun, it does not collapse to no_remun alone.
        record.rem_total = record.rem_impo1 + record.no_remun;

        if is_differential_category(&record, self.config) {
            record.differential_category_applied = true;
            record.rem_impo1 = Decimal::ZERO;
        }

        record
    }
}

/// Whether `record`'s activity code is in the configured differential set.
/// Zeroes `rem_impo1` when true while leaving SAC, no-remunerative, and
/// `rem_impo4..rem_impo9` untouched.
fn is_differential_category(record: &SicossRecord, config: &SicossConfig) -> bool {
    config.differential_activity_codes.contains(&record.cod_act)
}

/// Convenience entry point equivalent to `CapEngine::new(..).run(record)`.
pub fn apply_caps(
    record: SicossRecord,
    otra_actividad: Option<&OtraActividad>,
    config: &SicossConfig,
) -> Result<SicossRecord, SicossError> {
    CapEngine::new(config, otra_actividad).run(record)
}
