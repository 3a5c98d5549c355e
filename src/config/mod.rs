//! Configuration loading and management for the calculation engine.
//!
//! This module loads the legal tables (INSS, IRRF, Simples Nacional) from
//! YAML files. Payroll tables are versioned by effective date so a
//! calculation always uses the rates in force on its reference date.
//!
//! # Example
//!
//! ```no_run
//! use folha_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/brazil").unwrap();
//! println!("Loaded tables: {}", config.metadata().name);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    AnnexTable, DistributionRow, EngineConfig, JurisdictionMetadata, PayrollTables, SimplesConfig,
};
