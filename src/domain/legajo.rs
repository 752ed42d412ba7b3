//! Legajo (employee roster row) and its identity

use serde::{Deserialize, Serialize};
use std::fmt;

/// `nro_legaj`: the employee's primary key within a fiscal period.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EmployeeId(pub i64);

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for EmployeeId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// One-character labor regime tag (`trabajador_convencionado`, `regimen`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegimeChar(pub char);

impl fmt::Display for RegimeChar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One row of the `Legajos` extraction: an employee's classification and
/// family data for a fiscal period. Produced by ExtractorSet; never
/// mutated once read.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Legajo {
    // identity
    pub nro_legaj: EmployeeId,
    pub cuil: String,
    pub apnom: String,

    // classification
    pub cod_situacion: i32,
    pub cod_condicion: i32,
    pub cod_actividad: i32,
    pub cod_zona: i32,
    pub cod_mod_contratacion: i32,
    pub cod_obra_social: i32,
    pub regimen: RegimeChar,

    // family
    pub conyuge: bool,
    pub hijos: u32,
    pub adherentes: u32,

    // status
    pub licencia: bool,
    pub trabajador_convencionado: RegimeChar,

    // used by the differential-category predicate / revista columns
    pub provincia_localidad: Option<String>,
}

impl Legajo {
    /// `cuil` with digit-only normalization, per the 11-digit persistence
    /// contract.
    pub fn cuil_digits(&self) -> String {
        self.cuil.chars().filter(|c| c.is_ascii_digit()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Legajo {
        Legajo {
            nro_legaj: EmployeeId(1001),
            cuil: "20-12345678-9".to_string(),
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

    #[test]
    fn strips_non_digits_from_cuil() {
        assert_eq!(sample().cuil_digits(), "20123456789");
    }
}
