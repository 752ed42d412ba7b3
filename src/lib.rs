//! SICOSS computation engine: imponible-base derivation, statutory caps,
//! inclusion filtering, and AFIP-format persistence for one payroll period.
//!
//! `domain` holds the data model, `config` the run-wide settings, `errors`
//! the crate-wide error taxonomy, `sicoss` the computation pipeline and its
//! HTTP facade, and `ops` the ambient health/metrics surface.

pub mod config;
pub mod domain;
pub mod errors;
pub mod ops;
pub mod sicoss;

pub use config::{DbConfig, SicossConfig};
pub use errors::SicossError;
