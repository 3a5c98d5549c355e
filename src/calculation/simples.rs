//! Simples Nacional (DAS) calculation functionality.
//!
//! The unified monthly tax of LC 123/2006: the annex bracket is chosen by
//! the trailing twelve-month revenue (RBT12), the nominal rate is turned
//! into an effective rate, and the tax on the month's revenue (RPA) is
//! apportioned among the component taxes.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::debug;

use crate::config::SimplesConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AuditStep, AuditTrace, AuditWarning, DasInput, DasResult, SimplesTax, TaxShare,
};

use super::bracket_lookup::lookup_bracket_index;
use super::common::{first_day_of_month, round_money};

/// Calculates the DAS due for one month.
///
/// `effective_rate = (rbt12 × nominal − deduction) / rbt12` and
/// `tax = rpa × effective_rate`. A company without revenue history
/// (`rbt12` zero) is assessed on its annualised monthly revenue. Revenue
/// above the last bracket is flagged with a warning and taxed in the last
/// bracket.
///
/// # Errors
///
/// Returns [`EngineError::Validation`] for revenue that is negative or above
/// [`MAX_AMOUNT`](super::MAX_AMOUNT), [`EngineError::Configuration`] if the
/// annex is not configured, and [`EngineError::CalculationError`] if the
/// annualised RBT12 cannot be represented.
///
/// # Examples
///
/// ```no_run
/// use folha_engine::calculation::calculate_das;
/// use folha_engine::config::ConfigLoader;
/// use folha_engine::models::{DasInput, SimplesAnnex};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let loader = ConfigLoader::load("config/brazil").unwrap();
/// let input = DasInput {
///     company_id: "cmp_001".to_string(),
///     period: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
///     annex: SimplesAnnex::I,
///     rpa: Decimal::from_str("90000.00").unwrap(),
///     rbt12: Decimal::from_str("1000000.00").unwrap(),
/// };
///
/// let result = calculate_das(&input, loader.simples()).unwrap();
/// // (1,000,000 × 10.7% − 22,500) / 1,000,000 = 8.45%
/// assert_eq!(result.effective_rate, Decimal::from_str("0.0845").unwrap());
/// assert_eq!(result.tax, Decimal::from_str("7605.00").unwrap());
/// ```
pub fn calculate_das(input: &DasInput, simples: &SimplesConfig) -> EngineResult<DasResult> {
    input.validate()?;

    let annex = simples.annex(input.annex)?;
    let mut trace = AuditTrace::default();

    let annualised = input.rbt12 == Decimal::ZERO && input.rpa > Decimal::ZERO;
    let rbt12 = if annualised {
        input
            .rpa
            .checked_mul(Decimal::from(12))
            .ok_or_else(|| EngineError::CalculationError {
                message: format!("annualising RPA {} overflows", input.rpa),
            })?
    } else {
        input.rbt12
    };
    if annualised {
        trace.warnings.push(AuditWarning {
            code: "RBT12_ANNUALISED".to_string(),
            message: format!(
                "No revenue history: RBT12 taken as 12 × {} = {}",
                input.rpa.normalize(),
                rbt12.normalize()
            ),
            severity: "low".to_string(),
        });
    }

    let (bracket_index, bracket) = lookup_bracket_index(&annex.brackets, rbt12);
    if let Some(limit) = annex.brackets.last().upper_limit.filter(|limit| rbt12 > *limit) {
        trace.warnings.push(AuditWarning {
            code: "SIMPLES_CEILING_EXCEEDED".to_string(),
            message: format!(
                "RBT12 {} exceeds the regime ceiling {}; last bracket applied",
                rbt12.normalize(),
                limit.normalize()
            ),
            severity: "high".to_string(),
        });
    }

    trace.steps.push(AuditStep {
        step_number: trace.next_step_number(),
        rule_id: "simples_bracket".to_string(),
        rule_name: "Simples Nacional Bracket".to_string(),
        legal_ref: "LC 123/2006 art. 18, § 1".to_string(),
        input: serde_json::json!({
            "annex": input.annex,
            "rbt12": input.rbt12.normalize().to_string(),
            "rbt12_used": rbt12.normalize().to_string(),
        }),
        output: serde_json::json!({
            "bracket_index": bracket_index,
            "nominal_rate": bracket.rate.normalize().to_string(),
            "deduction": bracket.deduction.normalize().to_string(),
        }),
        reasoning: format!(
            "RBT12 {} falls in bracket {} of annex {}",
            rbt12.normalize(),
            bracket_index,
            input.annex
        ),
    });

    let effective_rate = if rbt12 > Decimal::ZERO {
        ((rbt12 * bracket.rate - bracket.deduction) / rbt12).max(Decimal::ZERO)
    } else {
        Decimal::ZERO
    };
    let tax = round_money(input.rpa * effective_rate);

    trace.steps.push(AuditStep {
        step_number: trace.next_step_number(),
        rule_id: "simples_effective_rate".to_string(),
        rule_name: "Simples Nacional Effective Rate".to_string(),
        legal_ref: "LC 123/2006 art. 18, § 1-A".to_string(),
        input: serde_json::json!({
            "rbt12": rbt12.normalize().to_string(),
            "rpa": input.rpa.normalize().to_string(),
        }),
        output: serde_json::json!({
            "effective_rate": effective_rate.normalize().to_string(),
            "tax": tax.to_string(),
        }),
        reasoning: format!(
            "({} × {} − {}) / {} = {}; {} × {} = {}",
            rbt12.normalize(),
            bracket.rate.normalize(),
            bracket.deduction.normalize(),
            rbt12.normalize(),
            effective_rate.normalize(),
            input.rpa.normalize(),
            effective_rate.normalize(),
            tax
        ),
    });

    let row = annex.distribution.get(bracket_index - 1);
    let total_share: Decimal = row.map(|r| r.values().copied().sum()).unwrap_or(Decimal::ZERO);
    let breakdown: Vec<TaxShare> = match row {
        Some(row) if total_share > Decimal::ZERO => row
            .iter()
            .map(|(tax, share)| {
                let rate = effective_rate * *share / total_share;
                TaxShare {
                    tax: *tax,
                    share_percent: *share,
                    rate,
                    amount: round_money(input.rpa * rate),
                }
            })
            .collect(),
        _ => Vec::new(),
    };

    let amounts: BTreeMap<SimplesTax, String> = breakdown
        .iter()
        .map(|share| (share.tax, share.amount.to_string()))
        .collect();
    trace.steps.push(AuditStep {
        step_number: trace.next_step_number(),
        rule_id: "simples_distribution".to_string(),
        rule_name: "Simples Nacional Tax Distribution".to_string(),
        legal_ref: "LC 123/2006 Anexos I a V".to_string(),
        input: serde_json::json!({
            "bracket_index": bracket_index,
            "total_share": total_share.normalize().to_string(),
        }),
        output: serde_json::json!(amounts),
        reasoning: format!(
            "Effective rate split among {} taxes by the bracket {} distribution row",
            breakdown.len(),
            bracket_index
        ),
    });

    debug!(
        company_id = %input.company_id,
        annex = %input.annex,
        bracket_index,
        tax = %tax,
        "Calculated DAS"
    );

    Ok(DasResult {
        company_id: input.company_id.clone(),
        period: first_day_of_month(input.period),
        annex: input.annex,
        rpa: input.rpa,
        rbt12,
        bracket_index,
        nominal_rate: bracket.rate,
        deduction: bracket.deduction,
        effective_rate,
        tax,
        breakdown,
        audit_trace: trace,
    })
}
