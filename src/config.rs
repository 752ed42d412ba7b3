//! Configuration.
//!
//! `SicossConfig` is one immutable value holding every explicitly enumerated
//! behavioral flag the pipeline consults; there is no dynamic kwargs bag.
//! Database connection parameters come from an INI file's `postgresql`
//! section, overridable by environment variables, matching the reference
//! platform's `DATABASE_URL`-first convention but adapted to an on-disk INI
//! contract.

use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::errors::SicossError;

/// Statutory caps and the behavioral flags that drive CapEngine and
/// Validator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SicossConfig {
    // caps
    pub tope_jubilatorio_patronal: Decimal,
    pub tope_jubilatorio_personal: Decimal,
    pub tope_otros_aportes_personales: Decimal,
    pub trunca_tope: bool,

    // validator guards
    pub check_lic: bool,
    pub check_retro: bool,
    pub check_sin_activo: bool,

    // calculator passthrough
    pub asignacion_familiar: bool,
    pub trabajador_convencionado: bool,
    pub informar_becarios: bool,
    pub art_con_tope: bool,
    pub conceptos_no_remun_en_art: bool,
    pub porc_aporte_adicional_jubilacion: Decimal,

    // differential-category predicate membership; accepted as
    // configuration, never hardcoded
    pub differential_activity_codes: HashSet<i32>,

    // persister
    pub replace_existing_period: bool,
    pub insert_chunk_size: usize,

    pub version_sistema: String,
}

impl Default for SicossConfig {
    fn default() -> Self {
        Self {
            tope_jubilatorio_patronal: dec!(1_000_000.00),
            tope_jubilatorio_personal: dec!(1_000_000.00),
            tope_otros_aportes_personales: dec!(1_000_000.00),
            trunca_tope: true,
            check_lic: true,
            check_retro: true,
            check_sin_activo: true,
            asignacion_familiar: false,
            trabajador_convencionado: false,
            informar_becarios: false,
            art_con_tope: false,
            conceptos_no_remun_en_art: false,
            porc_aporte_adicional_jubilacion: Decimal::ZERO,
            differential_activity_codes: HashSet::new(),
            replace_existing_period: false,
            insert_chunk_size: 1000,
            version_sistema: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl SicossConfig {
    /// Validates the `InvalidConfig` fatal case: negative caps. Called once
    /// at construction, not per-employee.
    pub fn validate(&self) -> Result<(), SicossError> {
        let caps = [
            ("tope_jubilatorio_patronal", self.tope_jubilatorio_patronal),
            ("tope_jubilatorio_personal", self.tope_jubilatorio_personal),
            ("tope_otros_aportes_personales", self.tope_otros_aportes_personales),
            ("porc_aporte_adicional_jubilacion", self.porc_aporte_adicional_jubilacion),
        ];
        for (name, value) in caps {
            if value < Decimal::ZERO {
                return Err(SicossError::InvalidConfig(format!("{name} must be >= 0, got {value}")));
            }
        }
        if self.insert_chunk_size == 0 {
            return Err(SicossError::InvalidConfig("insert_chunk_size must be >= 1".to_string()));
        }
        Ok(())
    }
}

/// Postgres connection parameters, read from an INI file's `[postgresql]`
/// section.
#[derive(Clone, Debug)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl DbConfig {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }

    /// Loads from an INI file, then applies `SICOSS_DB_*` environment
    /// overrides (env wins when present).
    pub fn load(ini_path: &Path) -> Result<Self, SicossError> {
        let conf = ini::Ini::load_from_file(ini_path)
            .map_err(|e| SicossError::InvalidConfig(format!("cannot read {ini_path:?}: {e}")))?;
        let section = conf.section(Some("postgresql")).ok_or_else(|| {
            SicossError::InvalidConfig(format!("{ini_path:?} has no [postgresql] section"))
        })?;

        let get = |key: &str| -> Option<String> { section.get(key).map(str::to_string) };

        let host = env_or("SICOSS_DB_HOST", get("host"))
            .ok_or_else(|| SicossError::InvalidConfig("missing postgresql.host".to_string()))?;
        let port: u16 = env_or("SICOSS_DB_PORT", get("port"))
            .ok_or_else(|| SicossError::InvalidConfig("missing postgresql.port".to_string()))?
            .parse()
            .map_err(|_| SicossError::InvalidConfig("postgresql.port is not a valid u16".to_string()))?;
        let database = env_or("SICOSS_DB_NAME", get("database"))
            .ok_or_else(|| SicossError::InvalidConfig("missing postgresql.database".to_string()))?;
        let user = env_or("SICOSS_DB_USER", get("user"))
            .ok_or_else(|| SicossError::InvalidConfig("missing postgresql.user".to_string()))?;
        let password = env_or("SICOSS_DB_PASSWORD", get("password")).unwrap_or_default();

        Ok(Self { host, port, database, user, password })
    }
}

fn env_or(var: &str, fallback: Option<String>) -> Option<String> {
    std::env::var(var).ok().or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(SicossConfig::default().validate().is_ok());
    }

    #[test]
    fn negative_cap_is_rejected() {
        let mut cfg = SicossConfig::default();
        cfg.tope_jubilatorio_patronal = dec!(-1);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let mut cfg = SicossConfig::default();
        cfg.insert_chunk_size = 0;
        assert!(cfg.validate().is_err());
    }
}
