//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the legal
//! tables from YAML files.

use chrono::NaiveDate;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};
use crate::models::SimplesAnnex;

use super::types::{
    AnnexTable, EngineConfig, JurisdictionMetadata, PayrollTables, SimplesConfig,
};

/// Loads and provides access to the legal tables.
///
/// The `ConfigLoader` reads YAML configuration files from a directory,
/// validates every table, and answers date-based lookups.
///
/// # Directory Structure
///
/// ```text
/// config/brazil/
/// ├── metadata.yaml        # Jurisdiction metadata
/// ├── simples.yaml         # Simples Nacional annexes
/// └── payroll/
///     └── 2025-05-01.yaml  # INSS/IRRF tables effective from this date
/// ```
///
/// # Example
///
/// ```no_run
/// use folha_engine::config::ConfigLoader;
/// use chrono::NaiveDate;
///
/// let loader = ConfigLoader::load("./config/brazil").unwrap();
/// let date = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();
/// let tables = loader.payroll_tables(date).unwrap();
/// println!("IRRF dependent deduction: {}", tables.irrf_dependent_deduction);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: EngineConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - Any required file is missing
    /// - Any file contains invalid YAML
    /// - Any table violates its invariants (`Configuration`)
    ///
    /// # Example
    ///
    /// ```no_run
    /// use folha_engine::config::ConfigLoader;
    ///
    /// let loader = ConfigLoader::load("./config/brazil")?;
    /// # Ok::<(), folha_engine::error::EngineError>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let metadata = Self::load_yaml::<JurisdictionMetadata>(&path.join("metadata.yaml"))?;

        let simples = Self::load_yaml::<SimplesConfig>(&path.join("simples.yaml"))?;
        simples.validate()?;

        let payroll = Self::load_payroll(&path.join("payroll"))?;

        debug!(
            path = %path.display(),
            version = %metadata.version,
            payroll_tables = payroll.len(),
            annexes = simples.annexes.len(),
            "Loaded legal tables"
        );

        Ok(Self {
            config: EngineConfig::new(metadata, payroll, simples)?,
        })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Loads all payroll table files from the payroll directory.
    fn load_payroll(payroll_dir: &Path) -> EngineResult<Vec<PayrollTables>> {
        let dir_str = payroll_dir.display().to_string();

        if !payroll_dir.exists() {
            return Err(EngineError::ConfigNotFound { path: dir_str });
        }

        let entries = fs::read_dir(payroll_dir).map_err(|_| EngineError::ConfigNotFound {
            path: dir_str.clone(),
        })?;

        let mut tables = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|_| EngineError::ConfigNotFound {
                path: dir_str.clone(),
            })?;

            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "yaml") {
                let payroll = Self::load_yaml::<PayrollTables>(&path)?;
                payroll.validate()?;
                tables.push(payroll);
            } else {
                warn!(path = %path.display(), "Ignoring non-YAML entry in payroll directory");
            }
        }

        if tables.is_empty() {
            return Err(EngineError::ConfigNotFound {
                path: format!("{} (no payroll table files found)", dir_str),
            });
        }

        Ok(tables)
    }

    /// Returns the underlying configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the table set metadata.
    pub fn metadata(&self) -> &JurisdictionMetadata {
        self.config.metadata()
    }

    /// Gets the payroll tables effective on a given date.
    ///
    /// The method finds the most recent table set that is effective
    /// on or before the given date.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use folha_engine::config::ConfigLoader;
    /// use chrono::NaiveDate;
    ///
    /// let loader = ConfigLoader::load("./config/brazil")?;
    /// let date = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();
    /// let tables = loader.payroll_tables(date)?;
    /// println!("INSS ceiling: {:?}", tables.inss.base_ceiling());
    /// # Ok::<(), folha_engine::error::EngineError>(())
    /// ```
    pub fn payroll_tables(&self, date: NaiveDate) -> EngineResult<&PayrollTables> {
        self.config.payroll_tables(date)
    }

    /// Returns all Simples Nacional tables.
    pub fn simples(&self) -> &SimplesConfig {
        self.config.simples()
    }

    /// Gets the tables of one Simples Nacional annex.
    pub fn simples_annex(&self, annex: SimplesAnnex) -> EngineResult<&AnnexTable> {
        self.config.simples().annex(annex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SimplesTax;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn config_path() -> &'static str {
        "./config/brazil"
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_load_valid_configuration() {
        let result = ConfigLoader::load(config_path());
        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());

        let loader = result.unwrap();
        assert_eq!(loader.metadata().code, "BR");
        assert!(!loader.metadata().source_urls.is_empty());
    }

    #[test]
    fn test_payroll_tables_for_2025() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();

        let tables = loader.payroll_tables(date).unwrap();

        assert_eq!(tables.inss.brackets().len(), 4);
        assert_eq!(tables.inss.base_ceiling(), Some(dec("8157.41")));
        assert_eq!(tables.irrf.brackets().len(), 5);
        assert_eq!(tables.irrf.last().rate, dec("0.275"));
        assert_eq!(tables.irrf_dependent_deduction, dec("189.59"));
    }

    #[test]
    fn test_payroll_tables_pick_most_recent_version() {
        let loader = ConfigLoader::load(config_path()).unwrap();

        let before_may = loader
            .payroll_tables(NaiveDate::from_ymd_opt(2025, 3, 15).unwrap())
            .unwrap();
        let after_may = loader
            .payroll_tables(NaiveDate::from_ymd_opt(2025, 6, 15).unwrap())
            .unwrap();

        assert_eq!(
            before_may.effective_date,
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
        );
        assert_eq!(
            after_may.effective_date,
            NaiveDate::from_ymd_opt(2025, 5, 1).unwrap()
        );
        assert_eq!(before_may.irrf.brackets()[0].upper_limit, Some(dec("2259.20")));
        assert_eq!(after_may.irrf.brackets()[0].upper_limit, Some(dec("2428.80")));
    }

    #[test]
    fn test_table_not_found_for_date_before_effective() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();

        match loader.payroll_tables(date) {
            Err(EngineError::TableNotFound { table, date: d }) => {
                assert_eq!(table, "payroll");
                assert_eq!(d, date);
            }
            other => panic!("Expected TableNotFound error, got {:?}", other),
        }
    }

    #[test]
    fn test_all_simples_annexes_loaded() {
        let loader = ConfigLoader::load(config_path()).unwrap();

        for annex in [
            SimplesAnnex::I,
            SimplesAnnex::II,
            SimplesAnnex::III,
            SimplesAnnex::IV,
            SimplesAnnex::V,
        ] {
            let table = loader.simples_annex(annex).unwrap();
            assert_eq!(table.brackets.brackets().len(), 6);
            assert_eq!(table.distribution.len(), 6);
        }
    }

    #[test]
    fn test_annex_i_bracket_4_values() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let annex = loader.simples_annex(SimplesAnnex::I).unwrap();

        let bracket = &annex.brackets.brackets()[3];
        assert_eq!(bracket.upper_limit, Some(dec("1800000.00")));
        assert_eq!(bracket.rate, dec("0.107"));
        assert_eq!(bracket.deduction, dec("22500.00"));
        assert_eq!(annex.distribution[3][&SimplesTax::Icms], dec("33.5"));
    }

    #[test]
    fn test_annex_iv_has_no_cpp() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let annex = loader.simples_annex(SimplesAnnex::IV).unwrap();

        assert!(annex
            .distribution
            .iter()
            .all(|row| !row.contains_key(&SimplesTax::Cpp)));
    }

    #[test]
    fn test_load_missing_directory_returns_error() {
        let result = ConfigLoader::load("/nonexistent/path");

        match result {
            Err(EngineError::ConfigNotFound { path }) => {
                assert!(path.contains("metadata.yaml"));
            }
            other => panic!("Expected ConfigNotFound error, got {:?}", other),
        }
    }

    #[test]
    fn test_distribution_row_count_mismatch_is_rejected() {
        let yaml = r#"
annexes:
  I:
    description: "Comércio"
    brackets:
      name: simples.annex_i
      brackets:
        - { upper_limit: "180000.00", rate: "0.04", deduction: "0" }
        - { rate: "0.073", deduction: "5940.00" }
    distribution:
      - { irpj: "5.5", csll: "3.5", cofins: "12.74", pis: "2.76", cpp: "41.5", icms: "34" }
"#;
        let simples: SimplesConfig = serde_yaml::from_str(yaml).unwrap();

        match simples.validate() {
            Err(EngineError::Configuration { table, message }) => {
                assert_eq!(table, "simples.annex_i");
                assert!(message.contains("1 distribution rows for 2 brackets"));
            }
            other => panic!("Expected Configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_effective_date_is_rejected() {
        let dir = Path::new(config_path());
        let metadata =
            ConfigLoader::load_yaml::<JurisdictionMetadata>(&dir.join("metadata.yaml")).unwrap();
        let simples = ConfigLoader::load_yaml::<SimplesConfig>(&dir.join("simples.yaml")).unwrap();
        let may = dir.join("payroll").join("2025-05-01.yaml");
        let payroll = vec![
            ConfigLoader::load_yaml::<PayrollTables>(&may).unwrap(),
            ConfigLoader::load_yaml::<PayrollTables>(&dir.join("payroll").join("2025-01-01.yaml"))
                .unwrap(),
            ConfigLoader::load_yaml::<PayrollTables>(&may).unwrap(),
        ];

        match EngineConfig::new(metadata, payroll, simples) {
            Err(EngineError::Configuration { table, message }) => {
                assert_eq!(table, "payroll");
                assert!(message.contains("2025-05-01"));
            }
            other => panic!("Expected Configuration error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_missing_annex_is_configuration_error() {
        let simples = SimplesConfig {
            annexes: Default::default(),
        };

        assert!(matches!(
            simples.annex(SimplesAnnex::V),
            Err(EngineError::Configuration { .. })
        ));
        assert!(simples.validate().is_err());
    }
}
