//! Configuration types for the legal tables.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::error::{EngineError, EngineResult};
use crate::models::{BracketTable, SimplesAnnex, SimplesTax};

/// Metadata about the table set.
///
/// Contains identifying information about the jurisdiction and the
/// official sources the tables were transcribed from.
#[derive(Debug, Clone, Deserialize)]
pub struct JurisdictionMetadata {
    /// Short code (e.g. "BR").
    pub code: String,
    /// Human-readable name.
    pub name: String,
    /// Version label of this table set.
    pub version: String,
    /// Official publications backing the tables.
    #[serde(default)]
    pub source_urls: Vec<String>,
}

/// Payroll withholding tables effective from a given date.
#[derive(Debug, Clone, Deserialize)]
pub struct PayrollTables {
    /// The first day these tables apply.
    pub effective_date: NaiveDate,
    /// Employee social security table (progressive, capped at the ceiling).
    pub inss: BracketTable,
    /// Monthly income tax table.
    pub irrf: BracketTable,
    /// Amount deducted from the IRRF base per dependent.
    pub irrf_dependent_deduction: Decimal,
}

impl PayrollTables {
    /// Checks the values the bracket tables do not validate themselves.
    pub fn validate(&self) -> EngineResult<()> {
        if self.irrf_dependent_deduction < Decimal::ZERO {
            return Err(EngineError::configuration(
                "irrf",
                format!(
                    "dependent deduction {} is negative",
                    self.irrf_dependent_deduction
                ),
            ));
        }
        Ok(())
    }
}

/// Apportionment of the unified rate among taxes, one row per bracket.
pub type DistributionRow = BTreeMap<SimplesTax, Decimal>;

/// The nominal-rate table and distribution rows of one annex.
#[derive(Debug, Clone, Deserialize)]
pub struct AnnexTable {
    /// Activities covered by the annex.
    #[serde(default)]
    pub description: String,
    /// Nominal rate and deduction per RBT12 bracket.
    pub brackets: BracketTable,
    /// Tax distribution for each bracket, in bracket order.
    pub distribution: Vec<DistributionRow>,
}

impl AnnexTable {
    /// Ensures there is one non-empty, non-negative distribution row per bracket.
    pub fn validate(&self) -> EngineResult<()> {
        let table = self.brackets.name();

        if self.distribution.len() != self.brackets.brackets().len() {
            return Err(EngineError::configuration(
                table,
                format!(
                    "{} distribution rows for {} brackets",
                    self.distribution.len(),
                    self.brackets.brackets().len()
                ),
            ));
        }

        for (index, row) in self.distribution.iter().enumerate() {
            if row.values().any(|share| *share < Decimal::ZERO) {
                return Err(EngineError::configuration(
                    table,
                    format!("distribution row {} has a negative share", index + 1),
                ));
            }
            let total: Decimal = row.values().copied().sum();
            if total <= Decimal::ZERO {
                return Err(EngineError::configuration(
                    table,
                    format!("distribution row {} has no positive share", index + 1),
                ));
            }
        }

        Ok(())
    }
}

/// Simples Nacional configuration from simples.yaml.
#[derive(Debug, Clone, Deserialize)]
pub struct SimplesConfig {
    /// Tables keyed by annex.
    pub annexes: BTreeMap<SimplesAnnex, AnnexTable>,
}

impl SimplesConfig {
    /// Gets the table for an annex.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Configuration`] if the annex is not configured.
    pub fn annex(&self, annex: SimplesAnnex) -> EngineResult<&AnnexTable> {
        self.annexes.get(&annex).ok_or_else(|| {
            EngineError::configuration("simples", format!("annex {} is not configured", annex))
        })
    }

    /// Validates every annex.
    pub fn validate(&self) -> EngineResult<()> {
        if self.annexes.is_empty() {
            return Err(EngineError::configuration("simples", "no annexes configured"));
        }
        self.annexes.values().try_for_each(AnnexTable::validate)
    }
}

/// The complete configuration loaded from YAML files.
///
/// This struct aggregates all configuration loaded from the various
/// YAML files in a configuration directory.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Table set metadata.
    metadata: JurisdictionMetadata,
    /// Payroll tables by effective date (sorted oldest first).
    payroll: Vec<PayrollTables>,
    /// Simples Nacional tables.
    simples: SimplesConfig,
}

impl EngineConfig {
    /// Creates a new EngineConfig from its component parts.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Configuration`] if two payroll table sets
    /// share an effective date.
    pub fn new(
        metadata: JurisdictionMetadata,
        payroll: Vec<PayrollTables>,
        simples: SimplesConfig,
    ) -> EngineResult<Self> {
        let mut sorted_payroll = payroll;
        sorted_payroll.sort_by(|a, b| a.effective_date.cmp(&b.effective_date));

        if let Some(pair) = sorted_payroll
            .windows(2)
            .find(|pair| pair[0].effective_date == pair[1].effective_date)
        {
            return Err(EngineError::configuration(
                "payroll",
                format!(
                    "more than one table set effective from {}",
                    pair[0].effective_date
                ),
            ));
        }

        Ok(Self {
            metadata,
            payroll: sorted_payroll,
            simples,
        })
    }

    /// Returns the table set metadata.
    pub fn metadata(&self) -> &JurisdictionMetadata {
        &self.metadata
    }

    /// Returns all payroll table sets, oldest first.
    pub fn payroll(&self) -> &[PayrollTables] {
        &self.payroll
    }

    /// Returns the Simples Nacional tables.
    pub fn simples(&self) -> &SimplesConfig {
        &self.simples
    }

    /// Returns the most recent payroll tables effective on or before `date`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::TableNotFound`] if every table set starts
    /// after `date`.
    pub fn payroll_tables(&self, date: NaiveDate) -> EngineResult<&PayrollTables> {
        self.payroll
            .iter()
            .rfind(|t| t.effective_date <= date)
            .ok_or_else(|| EngineError::TableNotFound {
                table: "payroll".to_string(),
                date,
            })
    }
}
