//! Domain module
//!
//! `fiscal_period`, `legajo`, `concepto`, `otra_actividad`, and `record`
//! hold the full SICOSS data model.

pub mod concepto;
pub mod fiscal_period;
pub mod legajo;
pub mod otra_actividad;
pub mod record;

pub use concepto::{Concepto, Escalafon, GroupTagSet, TipoConce};
pub use fiscal_period::{FiscalPeriod, FiscalPeriodError};
pub use legajo::{EmployeeId as SicossEmployeeId, Legajo, RegimeChar};
pub use otra_actividad::OtraActividad;
pub use record::SicossRecord;
