//! Fiscal period value object

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A year/month pair identifying one SICOSS processing run.
///
/// Canonical string form is `YYYYMM`; ordering is chronological.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FiscalPeriod {
    year: u16,
    month: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FiscalPeriodError {
    #[error("invalid fiscal period string: {0:?} (expected YYYYMM)")]
    BadFormat(String),
    #[error("month out of range: {0} (expected 1..=12)")]
    BadMonth(u8),
}

impl FiscalPeriod {
    pub fn new(year: u16, month: u8) -> Result<Self, FiscalPeriodError> {
        if !(1..=12).contains(&month) {
            return Err(FiscalPeriodError::BadMonth(month));
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    /// Canonical `YYYYMM` wire form, e.g. `202403`.
    pub fn canonical(&self) -> String {
        format!("{:04}{:02}", self.year, self.month)
    }
}

impl fmt::Display for FiscalPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

impl FromStr for FiscalPeriod {
    type Err = FiscalPeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 6 || !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(FiscalPeriodError::BadFormat(s.to_string()));
        }
        let year: u16 = s[0..4].parse().map_err(|_| FiscalPeriodError::BadFormat(s.to_string()))?;
        let month: u8 = s[4..6].parse().map_err(|_| FiscalPeriodError::BadFormat(s.to_string()))?;
        Self::new(year, month)
    }
}

impl TryFrom<String> for FiscalPeriod {
    type Error = FiscalPeriodError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FiscalPeriod> for String {
    fn from(value: FiscalPeriod) -> Self {
        value.canonical()
    }
}
