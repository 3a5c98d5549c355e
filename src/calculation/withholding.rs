//! Progressive withholding (INSS / IRRF) calculation functionality.
//!
//! Both employee social security and monthly income tax use the same
//! "parcela a deduzir" formula over a [`BracketTable`]:
//! `tax = base × rate − deduction`, with the bracket chosen by the base.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::models::{AuditStep, BracketTable};

use super::bracket_lookup::lookup_bracket_index;
use super::common::{ensure_amount, percent_label, round_money};

/// Input to a single withholding computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithholdingInput {
    /// Gross amount subject to the withholding.
    pub gross_base: Decimal,
    /// Number of dependents declared for IRRF.
    #[serde(default)]
    pub dependents: u32,
    /// Amount deducted from the base per dependent (zero for INSS).
    #[serde(default)]
    pub dependent_deduction: Decimal,
}

impl WithholdingInput {
    /// Creates an input with no dependents.
    pub fn new(gross_base: Decimal) -> Self {
        Self {
            gross_base,
            dependents: 0,
            dependent_deduction: Decimal::ZERO,
        }
    }

    /// Creates an input with dependents deducted from the base.
    pub fn with_dependents(gross_base: Decimal, dependents: u32, dependent_deduction: Decimal) -> Self {
        Self {
            gross_base,
            dependents,
            dependent_deduction,
        }
    }
}

/// The result of a withholding calculation, including the audit step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithholdingResult {
    /// Base after dependent deductions and the ceiling.
    pub taxable_base: Decimal,
    /// 1-based index of the bracket applied.
    pub bracket_index: usize,
    /// Nominal rate of the bracket applied.
    pub rate: Decimal,
    /// Deduction of the bracket applied.
    pub deduction: Decimal,
    /// Amount withheld, rounded to cents and never negative.
    pub tax: Decimal,
    /// `tax / gross_base`, zero when the gross is zero.
    pub effective_rate: Decimal,
    /// True when the base was limited by the table ceiling.
    pub capped: bool,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Calculates a progressive withholding over `table`.
///
/// The dependent deduction is subtracted from the gross, the result is
/// limited to the table's `base_ceiling` (if any), and the bracket formula
/// is applied. Negative results clamp to zero.
///
/// # Errors
///
/// Returns [`EngineError::Validation`](crate::error::EngineError::Validation)
/// if the gross base or the dependent deduction is negative or above
/// [`MAX_AMOUNT`](super::MAX_AMOUNT).
///
/// # Examples
///
/// ```no_run
/// use folha_engine::calculation::{calculate_withholding, WithholdingInput};
/// use folha_engine::config::ConfigLoader;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let loader = ConfigLoader::load("config/brazil").unwrap();
/// let tables = loader
///     .payroll_tables(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap())
///     .unwrap();
///
/// let input = WithholdingInput::new(Decimal::from_str("4000.00").unwrap());
/// let result = calculate_withholding(&input, &tables.inss, 1).unwrap();
/// // 4000.00 × 12% − 106.59 = 373.41
/// assert_eq!(result.tax, Decimal::from_str("373.41").unwrap());
/// ```
pub fn calculate_withholding(
    input: &WithholdingInput,
    table: &BracketTable,
    step_number: u32,
) -> EngineResult<WithholdingResult> {
    ensure_amount("gross_base", input.gross_base)?;
    ensure_amount("dependent_deduction", input.dependent_deduction)?;

    let dependents_total = input.dependent_deduction * Decimal::from(input.dependents);
    let mut taxable_base = (input.gross_base - dependents_total).max(Decimal::ZERO);

    let capped = match table.base_ceiling() {
        Some(ceiling) if taxable_base > ceiling => {
            taxable_base = ceiling;
            true
        }
        _ => false,
    };

    let (bracket_index, bracket) = lookup_bracket_index(table, taxable_base);
    let tax = round_money(taxable_base * bracket.rate - bracket.deduction).max(Decimal::ZERO);

    let effective_rate = if input.gross_base > Decimal::ZERO {
        (tax / input.gross_base).round_dp(4)
    } else {
        Decimal::ZERO
    };

    let reasoning = if capped {
        format!(
            "Base {} capped at ceiling {}; bracket {} ({}): {} × {} − {} = {}",
            input.gross_base.normalize(),
            taxable_base.normalize(),
            bracket_index,
            percent_label(bracket.rate),
            taxable_base.normalize(),
            bracket.rate.normalize(),
            bracket.deduction.normalize(),
            tax
        )
    } else {
        format!(
            "Bracket {} ({}): {} × {} − {} = {}",
            bracket_index,
            percent_label(bracket.rate),
            taxable_base.normalize(),
            bracket.rate.normalize(),
            bracket.deduction.normalize(),
            tax
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: format!("{}_withholding", table.name()),
        rule_name: format!("{} Progressive Withholding", table.name().to_uppercase()),
        legal_ref: legal_ref_for(table.name()).to_string(),
        input: serde_json::json!({
            "gross_base": input.gross_base.normalize().to_string(),
            "dependents": input.dependents,
            "dependent_deduction": input.dependent_deduction.normalize().to_string(),
        }),
        output: serde_json::json!({
            "taxable_base": taxable_base.normalize().to_string(),
            "bracket_index": bracket_index,
            "rate": bracket.rate.normalize().to_string(),
            "deduction": bracket.deduction.normalize().to_string(),
            "tax": tax.to_string(),
            "capped": capped,
        }),
        reasoning,
    };

    Ok(WithholdingResult {
        taxable_base,
        bracket_index,
        rate: bracket.rate,
        deduction: bracket.deduction,
        tax,
        effective_rate,
        capped,
        audit_step,
    })
}

fn legal_ref_for(table: &str) -> &'static str {
    match table {
        "inss" => "Lei 8.212/1991 art. 20; EC 103/2019 art. 28",
        "irrf" => "Lei 7.713/1988 art. 7; Lei 15.191/2025",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::models::Bracket;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn bracket(limit: Option<&str>, rate: &str, deduction: &str) -> Bracket {
        Bracket {
            upper_limit: limit.map(dec),
            rate: dec(rate),
            deduction: dec(deduction),
        }
    }

    fn create_inss_table() -> BracketTable {
        BracketTable::new(
            "inss",
            vec![
                bracket(Some("1518.00"), "0.075", "0"),
                bracket(Some("2793.88"), "0.09", "22.77"),
                bracket(Some("4190.83"), "0.12", "106.59"),
                bracket(Some("8157.41"), "0.14", "190.40"),
            ],
            Some(dec("8157.41")),
        )
        .unwrap()
    }

    fn create_irrf_table() -> BracketTable {
        BracketTable::new(
            "irrf",
            vec![
                bracket(Some("2428.80"), "0", "0"),
                bracket(Some("2826.65"), "0.075", "182.16"),
                bracket(Some("3751.05"), "0.15", "394.16"),
                bracket(Some("4664.68"), "0.225", "675.49"),
                bracket(None, "0.275", "908.73"),
            ],
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_inss_third_bracket() {
        let input = WithholdingInput::new(dec("4000.00"));
        let result = calculate_withholding(&input, &create_inss_table(), 1).unwrap();

        assert_eq!(result.bracket_index, 3);
        assert_eq!(result.rate, dec("0.12"));
        assert_eq!(result.tax, dec("373.41"));
        assert!(!result.capped);
        assert_eq!(result.audit_step.rule_id, "inss_withholding");
    }

    #[test]
    fn test_inss_is_capped_at_ceiling() {
        let input = WithholdingInput::new(dec("20000.00"));
        let result = calculate_withholding(&input, &create_inss_table(), 1).unwrap();

        // 8157.41 × 14% − 190.40 = 951.6374
        assert!(result.capped);
        assert_eq!(result.taxable_base, dec("8157.41"));
        assert_eq!(result.tax, dec("951.64"));
        assert!(result.audit_step.reasoning.contains("capped"));
    }

    #[test]
    fn test_irrf_exempt_bracket() {
        let input = WithholdingInput::new(dec("2000.00"));
        let result = calculate_withholding(&input, &create_irrf_table(), 1).unwrap();

        assert_eq!(result.tax, Decimal::ZERO);
        assert_eq!(result.effective_rate, Decimal::ZERO);
    }

    #[test]
    fn test_irrf_with_dependents_reduces_base() {
        let input = WithholdingInput::with_dependents(dec("3626.59"), 2, dec("189.59"));
        let result = calculate_withholding(&input, &create_irrf_table(), 1).unwrap();

        // 3626.59 − 379.18 = 3247.41; 3247.41 × 15% − 394.16 = 92.9515
        assert_eq!(result.taxable_base, dec("3247.41"));
        assert_eq!(result.tax, dec("92.95"));
    }

    #[test]
    fn test_irrf_without_dependents() {
        let input = WithholdingInput::new(dec("3626.59"));
        let result = calculate_withholding(&input, &create_irrf_table(), 4).unwrap();

        assert_eq!(result.tax, dec("149.83"));
        assert_eq!(result.audit_step.step_number, 4);
    }

    #[test]
    fn test_dependent_deduction_larger_than_gross_clamps_to_zero() {
        let input = WithholdingInput::with_dependents(dec("300.00"), 3, dec("189.59"));
        let result = calculate_withholding(&input, &create_irrf_table(), 1).unwrap();

        assert_eq!(result.taxable_base, Decimal::ZERO);
        assert_eq!(result.tax, Decimal::ZERO);
    }

    #[test]
    fn test_zero_gross_has_zero_effective_rate() {
        let input = WithholdingInput::new(Decimal::ZERO);
        let result = calculate_withholding(&input, &create_inss_table(), 1).unwrap();

        assert_eq!(result.tax, Decimal::ZERO);
        assert_eq!(result.effective_rate, Decimal::ZERO);
    }

    #[test]
    fn test_effective_rate() {
        let input = WithholdingInput::new(dec("4000.00"));
        let result = calculate_withholding(&input, &create_inss_table(), 1).unwrap();

        // 373.41 / 4000 = 0.0933525
        assert_eq!(result.effective_rate, dec("0.0934"));
    }

    #[test]
    fn test_negative_gross_is_rejected() {
        let input = WithholdingInput::new(dec("-1.00"));

        match calculate_withholding(&input, &create_inss_table(), 1) {
            Err(EngineError::Validation { field, .. }) => assert_eq!(field, "gross_base"),
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_dependent_deduction_is_rejected() {
        let input = WithholdingInput::with_dependents(dec("3000.00"), 1, dec("-189.59"));

        assert!(matches!(
            calculate_withholding(&input, &create_irrf_table(), 1),
            Err(EngineError::Validation { .. })
        ));
    }

    #[test]
    fn test_gross_above_max_amount_is_rejected() {
        let input = WithholdingInput::new(Decimal::MAX);

        match calculate_withholding(&input, &create_inss_table(), 1) {
            Err(EngineError::Validation { field, .. }) => assert_eq!(field, "gross_base"),
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_bracket_boundaries_do_not_decrease_tax() {
        let table = create_inss_table();
        let below = calculate_withholding(&WithholdingInput::new(dec("2793.88")), &table, 1).unwrap();
        let above = calculate_withholding(&WithholdingInput::new(dec("2793.89")), &table, 1).unwrap();

        assert_eq!(below.bracket_index, 2);
        assert_eq!(above.bracket_index, 3);
        assert!(above.tax >= below.tax);
    }
}
