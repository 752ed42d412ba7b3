//! Concepto (pay line-item) and the group-tag classification it carries

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::legajo::EmployeeId;

/// Escalafón (pay-scale regime) a concept can be attributed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Escalafon {
    Doce,
    Auto,
    Nodo,
}

/// `tipo_conce`: whether a concept is a "C"oncept (normal) or "N"ovelty row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TipoConce {
    C,
    N,
}

/// A small, deduplicated, sorted set of classification-group tags.
///
/// A concept row can belong to several groups at once (e.g. an overtime
/// bonus paid in December might carry both the "horas extras" and "SAC"
/// tags); the explode step in the consolidator walks this set once per
/// concept and emits one logical contribution per tag.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTagSet(Vec<u8>);

impl GroupTagSet {
    pub fn new(mut tags: Vec<u8>) -> Self {
        tags.sort_unstable();
        tags.dedup();
        Self(tags)
    }

    pub fn contains(&self, tag: u8) -> bool {
        self.0.binary_search(&tag).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<u8> for GroupTagSet {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// One row of the `Conceptos` extraction: a single pay line-item for one
/// employee, tagged with the classification groups it participates in.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Concepto {
    pub nro_legaj: EmployeeId,
    pub codn_conce: i32,
    pub impp_conce: Decimal,
    pub tipos_grupos: GroupTagSet,
    pub tipo_conce: TipoConce,
    pub nro_orimp: i32,
    pub escalafon: Option<Escalafon>,
}

/// Known classification-group tags and the destination aggregate column
/// each maps to. This table is the single source of truth for step 2 of
/// the consolidator algorithm — it is covered end-to-end by
/// `consolidator::tests::mapping_table_is_exhaustive`.
pub mod groups {
    pub const SAC: u8 = 1;
    pub const ZONA_DESFAVORABLE: u8 = 2;
    pub const VACACIONES: u8 = 3;
    pub const PREMIOS: u8 = 4;
    pub const ADICIONALES: u8 = 5;
    pub const HORAS_EXTRAS: u8 = 6;
    pub const BECARIO: u8 = 7;
    pub const NO_REMUN: u8 = 8;
    /// SAC variant that also credits `ImporteSACDoce` when tagged with
    /// `Escalafon::Doce`.
    pub const SAC_ESCALAFON: u8 = 9;
    pub const SEGURO_VIDA: u8 = 10;
    /// Investigator subtypes, grouped for the investigator-priority rules.
    pub const INVESTIGADOR_SUBTYPES: [u8; 7] = [11, 12, 13, 14, 15, 48, 49];
    /// Concept-sourced family-allowance amount, added on top of the
    /// per-dependent formula in `AsignacionesFamiliares`.
    pub const ASIGNACIONES_FAMILIARES: u8 = 16;
}
