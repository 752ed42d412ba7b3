//! OtraActividad: contributions credited at other employers

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::legajo::EmployeeId;

/// Per-employee contributions made at other employers, counted toward the
/// personal caps this employer must respect in the CapEngine.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OtraActividad {
    pub nro_legaj: EmployeeId,
    pub importe_jubilatorio: Decimal,
    pub importe_otros: Decimal,
}
