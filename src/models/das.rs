//! Simples Nacional (DAS) models.
//!
//! Inputs and outputs of the DAS calculator: the annex a company is taxed
//! under, the taxes that make up the unified rate, and the apportioned
//! result.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::calculation::ensure_amount;
use crate::error::{EngineError, EngineResult};

use super::AuditTrace;

/// The Simples Nacional annexes of LC 123/2006.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SimplesAnnex {
    /// Annex I - commerce.
    #[serde(rename = "I")]
    I,
    /// Annex II - industry.
    #[serde(rename = "II")]
    II,
    /// Annex III - services (with CPP).
    #[serde(rename = "III")]
    III,
    /// Annex IV - services (CPP paid outside the DAS).
    #[serde(rename = "IV")]
    IV,
    /// Annex V - services subject to the payroll factor.
    #[serde(rename = "V")]
    V,
}

impl fmt::Display for SimplesAnnex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SimplesAnnex::I => "I",
            SimplesAnnex::II => "II",
            SimplesAnnex::III => "III",
            SimplesAnnex::IV => "IV",
            SimplesAnnex::V => "V",
        };
        write!(f, "{}", s)
    }
}

/// Taxes collected through the DAS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimplesTax {
    /// Corporate income tax.
    Irpj,
    /// Social contribution on net profit.
    Csll,
    /// COFINS contribution.
    Cofins,
    /// PIS/PASEP contribution.
    Pis,
    /// Employer social security contribution.
    Cpp,
    /// State VAT.
    Icms,
    /// Federal excise tax.
    Ipi,
    /// Municipal services tax.
    Iss,
}

/// Input to the DAS calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DasInput {
    /// Company the assessment belongs to.
    pub company_id: String,
    /// Any date within the assessment month.
    pub period: NaiveDate,
    /// Annex the revenue is taxed under.
    pub annex: SimplesAnnex,
    /// Gross revenue of the assessment month (RPA).
    pub rpa: Decimal,
    /// Gross revenue of the twelve months before the assessment month (RBT12).
    pub rbt12: Decimal,
}

impl DasInput {
    /// Rejects a blank company id and revenue outside `0..=MAX_AMOUNT`.
    pub fn validate(&self) -> EngineResult<()> {
        if self.company_id.trim().is_empty() {
            return Err(EngineError::validation("company_id", "must not be empty"));
        }
        ensure_amount("rpa", self.rpa)?;
        ensure_amount("rbt12", self.rbt12)
    }
}

/// One tax's slice of the unified rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxShare {
    /// The tax.
    pub tax: SimplesTax,
    /// Percentage of the unified rate assigned to the tax by the annex.
    pub share_percent: Decimal,
    /// `effective_rate × share / total_share`.
    pub rate: Decimal,
    /// `rpa × rate`, rounded to cents.
    pub amount: Decimal,
}

/// Result of a DAS calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DasResult {
    /// Company the assessment belongs to.
    pub company_id: String,
    /// The assessment month (first day).
    pub period: NaiveDate,
    /// Annex used.
    pub annex: SimplesAnnex,
    /// Monthly gross revenue.
    pub rpa: Decimal,
    /// Revenue used to select the bracket (annualised when the company has no history).
    pub rbt12: Decimal,
    /// 1-based bracket index within the annex.
    pub bracket_index: usize,
    /// Nominal rate of the bracket.
    pub nominal_rate: Decimal,
    /// Amount deducted in the bracket.
    pub deduction: Decimal,
    /// `(rbt12 × nominal − deduction) / rbt12`.
    pub effective_rate: Decimal,
    /// Total DAS due.
    pub tax: Decimal,
    /// Per-tax apportionment.
    pub breakdown: Vec<TaxShare>,
    /// Audit trace of the calculation.
    pub audit_trace: AuditTrace,
}
