//! Validator — the inclusion predicate that decides whether a capped record
//! is reported at all. Exclusion is not an error: an excluded row is simply
//! left out of the Aggregator's totals and the Persister's insert batch.

use crate::config::SicossConfig;
use crate::domain::record::SicossRecord;
use crate::domain::Legajo;

/// Applies the `check_lic` / `check_retro` / `check_sin_activo` guards and
/// settles `valid` / `exclusion_reason` on `record`. The first guard to
/// trip wins; later guards are not evaluated once one has excluded the row.
pub fn validate(mut record: SicossRecord, legajo: &Legajo, config: &SicossConfig) -> SicossRecord {
    if config.check_lic && legajo.licencia && record.all_remunerative_bases_are_zero() {
        record.valid = false;
        record.exclusion_reason = Some("on_leave_no_remunerative_mass".to_string());
        return record;
    }

    if config.check_retro && is_retro_only_with_no_current_activity(&record) {
        record.valid = false;
        record.exclusion_reason = Some("retro_only_no_current_activity".to_string());
        return record;
    }

    if config.check_sin_activo
        && record.rem_impo1.is_zero()
        && record.rem_impo4.is_zero()
        && record.sac.is_zero()
    {
        record.valid = false;
        record.exclusion_reason = Some("sin_actividad".to_string());
        return record;
    }

    record.valid = true;
    record.exclusion_reason = None;
    record
}

/// `sit_rev1` is the employee's current-generation labor-status code; a
/// zero value means no current revista situation. `sit_rev2`/`sit_rev3` are
/// older generations carried for retroactive movements. An employee with no
/// current generation but a retroactive one is "retro-only, no current
/// activity".
fn is_retro_only_with_no_current_activity(record: &SicossRecord) -> bool {
    record.sit_rev1 == 0 && (record.sit_rev2 != 0 || record.sit_rev3 != 0)
}
