//! Thirteenth salary (gratificação natalina) calculation functionality.
//!
//! The 13th salary is `base × months/12`, where a month counts when at
//! least 15 days of it were worked. It is paid in two parcels (or a single
//! one): the first carries no withholding, the second carries INSS and IRRF
//! on the full gross and discounts the first parcel.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::PayrollTables;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AuditStep, AuditTrace, CalculationResult, CalculatorKind, Employee, EventKind, LineItem,
};

use super::common::{calendar_months_worked, ensure_amount, percent_label, round_money};
use super::withholding::{WithholdingInput, calculate_withholding};

/// Which 13th-salary payment is being calculated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThirteenthParcel {
    /// First parcel, paid by November 30th.
    First,
    /// Second parcel, paid by December 20th.
    Second,
    /// Whole amount paid at once.
    Unique,
}

impl ThirteenthParcel {
    /// Legal payment deadline of the parcel in `year`.
    pub fn payment_date(&self, year: i32) -> Option<NaiveDate> {
        match self {
            ThirteenthParcel::First => NaiveDate::from_ymd_opt(year, 11, 30),
            ThirteenthParcel::Second | ThirteenthParcel::Unique => {
                NaiveDate::from_ymd_opt(year, 12, 20)
            }
        }
    }
}

/// Input to the 13th-salary calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThirteenthInput {
    /// The employee receiving the 13th salary.
    pub employee: Employee,
    /// Reference year.
    pub year: i32,
    /// Parcel being paid.
    pub parcel: ThirteenthParcel,
    /// Amount actually paid as the first parcel, discounted from the
    /// second. Defaults to half of the gross.
    #[serde(default)]
    pub first_parcel_paid: Option<Decimal>,
}

/// Calculates a 13th-salary payment.
///
/// The reference date of the result (and of the withholding tables the
/// caller should pass) is [`ThirteenthParcel::payment_date`].
///
/// # Errors
///
/// Returns [`EngineError::Validation`] if the employee was admitted after
/// the reference year, if `first_parcel_paid` is negative, or if the
/// employee record is invalid.
///
/// # Examples
///
/// ```no_run
/// use folha_engine::calculation::{calculate_thirteenth, ThirteenthInput, ThirteenthParcel};
/// use folha_engine::config::ConfigLoader;
/// use folha_engine::models::Employee;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let loader = ConfigLoader::load("config/brazil").unwrap();
/// let input = ThirteenthInput {
///     employee: Employee {
///         id: "emp_001".to_string(),
///         company_id: "cmp_001".to_string(),
///         name: "Ana".to_string(),
///         base_salary: Decimal::from_str("3000.00").unwrap(),
///         admission_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
///         dependents: 0,
///     },
///     year: 2025,
///     parcel: ThirteenthParcel::First,
///     first_parcel_paid: None,
/// };
///
/// let date = input.parcel.payment_date(input.year).unwrap();
/// let tables = loader.payroll_tables(date).unwrap();
/// let result = calculate_thirteenth(&input, tables).unwrap();
/// assert_eq!(result.net_amount, Decimal::from_str("1500.00").unwrap());
/// ```
pub fn calculate_thirteenth(
    input: &ThirteenthInput,
    tables: &PayrollTables,
) -> EngineResult<CalculationResult> {
    let employee = &input.employee;
    employee.validate()?;

    let (Some(year_start), Some(year_end), Some(reference_date)) = (
        NaiveDate::from_ymd_opt(input.year, 1, 1),
        NaiveDate::from_ymd_opt(input.year, 12, 31),
        input.parcel.payment_date(input.year),
    ) else {
        return Err(EngineError::validation(
            "year",
            format!("{} is not a supported year", input.year),
        ));
    };

    if employee.admission_date > year_end {
        return Err(EngineError::validation(
            "year",
            format!(
                "employee admitted on {} after the reference year {}",
                employee.admission_date, input.year
            ),
        ));
    }
    if let Some(paid) = input.first_parcel_paid {
        ensure_amount("first_parcel_paid", paid)?;
    }

    let base = employee.base_salary;
    let months = calendar_months_worked(employee.admission_date, year_start, year_end).min(12);
    let gross = base * Decimal::from(months) / Decimal::from(12);
    let months_label = format!("{}/12", months);

    let mut trace = AuditTrace::default();
    let mut events = Vec::new();

    trace.steps.push(AuditStep {
        step_number: trace.next_step_number(),
        rule_id: "thirteenth_gross".to_string(),
        rule_name: "13th Salary Gross".to_string(),
        legal_ref: "Lei 4.090/1962 art. 1".to_string(),
        input: serde_json::json!({
            "base_salary": base.normalize().to_string(),
            "admission_date": employee.admission_date.to_string(),
            "year": input.year,
        }),
        output: serde_json::json!({
            "months_worked": months,
            "gross": round_money(gross).to_string(),
        }),
        reasoning: format!(
            "{} months worked in {} (months with 15+ days count): {} × {} = {}",
            months,
            input.year,
            base.normalize(),
            months_label,
            round_money(gross)
        ),
    });

    match input.parcel {
        ThirteenthParcel::First => {
            let parcel = LineItem::earning(
                EventKind::ThirteenthFirstParcel,
                "13º salário - 1ª parcela",
                months_label,
                gross / Decimal::from(2),
            );
            trace.steps.push(AuditStep {
                step_number: trace.next_step_number(),
                rule_id: "thirteenth_first_parcel".to_string(),
                rule_name: "13th Salary First Parcel".to_string(),
                legal_ref: "Lei 4.749/1965 art. 2".to_string(),
                input: serde_json::json!({
                    "gross": round_money(gross).to_string(),
                }),
                output: serde_json::json!({
                    "amount": parcel.earning.to_string(),
                }),
                reasoning: format!("50% of the gross, no withholding: {}", parcel.earning),
            });
            events.push(parcel);
        }
        ThirteenthParcel::Second | ThirteenthParcel::Unique => {
            let salary = LineItem::earning(
                EventKind::ThirteenthSalary,
                "13º salário",
                months_label,
                gross,
            );

            let inss = calculate_withholding(
                &WithholdingInput::new(salary.earning),
                &tables.inss,
                trace.next_step_number(),
            )?;
            trace.steps.push(inss.audit_step.clone());

            let irrf = calculate_withholding(
                &WithholdingInput::with_dependents(
                    salary.earning - inss.tax,
                    employee.dependents,
                    tables.irrf_dependent_deduction,
                ),
                &tables.irrf,
                trace.next_step_number(),
            )?;
            trace.steps.push(irrf.audit_step.clone());

            let advance_paid = if input.parcel == ThirteenthParcel::Second {
                let paid = input
                    .first_parcel_paid
                    .unwrap_or_else(|| round_money(gross / Decimal::from(2)));
                trace.steps.push(AuditStep {
                    step_number: trace.next_step_number(),
                    rule_id: "thirteenth_advance_discount".to_string(),
                    rule_name: "First Parcel Discount".to_string(),
                    legal_ref: "Lei 4.749/1965 art. 3".to_string(),
                    input: serde_json::json!({
                        "first_parcel_paid": input.first_parcel_paid.map(|p| p.normalize().to_string()),
                    }),
                    output: serde_json::json!({
                        "discount": round_money(paid).to_string(),
                    }),
                    reasoning: match input.first_parcel_paid {
                        Some(_) => format!("Discounting the first parcel paid: {}", round_money(paid)),
                        None => format!(
                            "First parcel amount not given, assuming 50% of the gross: {}",
                            round_money(paid)
                        ),
                    },
                });
                Some(paid)
            } else {
                None
            };

            events.push(salary);
            events.push(LineItem::deduction(
                EventKind::InssThirteenth,
                "INSS sobre 13º salário",
                percent_label(inss.rate),
                inss.tax,
            ));
            events.push(LineItem::deduction(
                EventKind::IrrfThirteenth,
                "IRRF sobre 13º salário",
                percent_label(irrf.rate),
                irrf.tax,
            ));
            if let Some(paid) = advance_paid {
                events.push(LineItem::deduction(
                    EventKind::ThirteenthAdvanceDiscount,
                    "Adiantamento 1ª parcela",
                    "1ª parcela",
                    paid,
                ));
            }
        }
    }

    let result = CalculationResult::from_events(
        employee.company_id.clone(),
        employee.id.clone(),
        CalculatorKind::Thirteenth,
        reference_date,
        events,
        trace,
    );

    debug!(
        company_id = %result.company_id,
        employee_id = %result.employee_id,
        year = input.year,
        parcel = ?input.parcel,
        months,
        net_amount = %result.net_amount,
        "Calculated 13th salary"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Bracket, BracketTable};
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

    fn create_tables() -> PayrollTables {
        PayrollTables {
            effective_date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            inss: BracketTable::new(
                "inss",
                vec![
                    bracket(Some("1518.00"), "0.075", "0"),
                    bracket(Some("2793.88"), "0.09", "22.77"),
                    bracket(Some("4190.83"), "0.12", "106.59"),
                    bracket(Some("8157.41"), "0.14", "190.40"),
                ],
                Some(dec("8157.41")),
            )
            .unwrap(),
            irrf: BracketTable::new(
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
            .unwrap(),
            irrf_dependent_deduction: dec("189.59"),
        }
    }

    fn create_input(parcel: ThirteenthParcel, admission: NaiveDate) -> ThirteenthInput {
        ThirteenthInput {
            employee: Employee {
                id: "emp_001".to_string(),
                company_id: "cmp_001".to_string(),
                name: "Ana Souza".to_string(),
                base_salary: dec("3000.00"),
                admission_date: admission,
                dependents: 0,
            },
            year: 2025,
            parcel,
            first_parcel_paid: None,
        }
    }

    fn long_tenure() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
    }

    #[test]
    fn test_first_parcel_is_half_without_withholding() {
        let result =
            calculate_thirteenth(&create_input(ThirteenthParcel::First, long_tenure()), &create_tables())
                .unwrap();

        assert_eq!(result.events.len(), 1);
        let parcel = result.event(EventKind::ThirteenthFirstParcel).unwrap();
        assert_eq!(parcel.earning, dec("1500.00"));
        assert_eq!(parcel.reference.to_string(), "12/12");
        assert_eq!(result.total_deductions, Decimal::ZERO);
        assert_eq!(
            result.reference_date,
            NaiveDate::from_ymd_opt(2025, 11, 30).unwrap()
        );
    }

    #[test]
    fn test_unique_parcel_withholds_on_gross() {
        let result =
            calculate_thirteenth(&create_input(ThirteenthParcel::Unique, long_tenure()), &create_tables())
                .unwrap();

        // INSS: 3000 × 12% − 106.59 = 253.41
        // IRRF: (3000 − 253.41) = 2746.59 × 7.5% − 182.16 = 23.83425
        assert_eq!(result.event(EventKind::ThirteenthSalary).unwrap().earning, dec("3000.00"));
        assert_eq!(result.event(EventKind::InssThirteenth).unwrap().deduction, dec("253.41"));
        assert_eq!(result.event(EventKind::IrrfThirteenth).unwrap().deduction, dec("23.83"));
        assert!(result.event(EventKind::ThirteenthAdvanceDiscount).is_none());
        assert_eq!(result.net_amount, dec("2722.76"));
    }

    #[test]
    fn test_second_parcel_discounts_default_advance() {
        let result =
            calculate_thirteenth(&create_input(ThirteenthParcel::Second, long_tenure()), &create_tables())
                .unwrap();

        assert_eq!(
            result.events.iter().map(|e| e.kind).collect::<Vec<_>>(),
            vec![
                EventKind::ThirteenthSalary,
                EventKind::InssThirteenth,
                EventKind::IrrfThirteenth,
                EventKind::ThirteenthAdvanceDiscount
            ]
        );
        assert_eq!(
            result.event(EventKind::ThirteenthAdvanceDiscount).unwrap().deduction,
            dec("1500.00")
        );
        // 3000 − 253.41 − 23.83 − 1500
        assert_eq!(result.net_amount, dec("1222.76"));
    }

    #[test]
    fn test_second_parcel_uses_amount_actually_paid() {
        let mut input = create_input(ThirteenthParcel::Second, long_tenure());
        input.first_parcel_paid = Some(dec("1250.00"));

        let result = calculate_thirteenth(&input, &create_tables()).unwrap();
        assert_eq!(
            result.event(EventKind::ThirteenthAdvanceDiscount).unwrap().deduction,
            dec("1250.00")
        );
        assert_eq!(result.net_amount, dec("1472.76"));
    }

    #[test]
    fn test_first_and_second_parcels_add_up_to_unique() {
        let tables = create_tables();
        let first =
            calculate_thirteenth(&create_input(ThirteenthParcel::First, long_tenure()), &tables).unwrap();
        let second =
            calculate_thirteenth(&create_input(ThirteenthParcel::Second, long_tenure()), &tables).unwrap();
        let unique =
            calculate_thirteenth(&create_input(ThirteenthParcel::Unique, long_tenure()), &tables).unwrap();

        assert_eq!(first.net_amount + second.net_amount, unique.net_amount);
    }

    #[test]
    fn test_admission_during_year_counts_partial_months() {
        // Admitted March 17th: March has 15 days and counts, so 10 months.
        let admission = NaiveDate::from_ymd_opt(2025, 3, 17).unwrap();
        let result =
            calculate_thirteenth(&create_input(ThirteenthParcel::First, admission), &create_tables())
                .unwrap();

        let parcel = result.event(EventKind::ThirteenthFirstParcel).unwrap();
        assert_eq!(parcel.reference.to_string(), "10/12");
        assert_eq!(parcel.earning, dec("1250.00"));
    }

    #[test]
    fn test_admission_late_in_december_yields_zero() {
        let admission = NaiveDate::from_ymd_opt(2025, 12, 20).unwrap();
        let result =
            calculate_thirteenth(&create_input(ThirteenthParcel::Unique, admission), &create_tables())
                .unwrap();

        assert_eq!(result.total_earnings, Decimal::ZERO);
        assert_eq!(result.net_amount, Decimal::ZERO);
    }

    #[test]
    fn test_admission_after_year_is_rejected() {
        let admission = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();

        match calculate_thirteenth(&create_input(ThirteenthParcel::First, admission), &create_tables()) {
            Err(EngineError::Validation { field, .. }) => assert_eq!(field, "year"),
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_first_parcel_paid_is_rejected() {
        let mut input = create_input(ThirteenthParcel::Second, long_tenure());
        input.first_parcel_paid = Some(dec("-10"));

        match calculate_thirteenth(&input, &create_tables()) {
            Err(EngineError::Validation { field, .. }) => assert_eq!(field, "first_parcel_paid"),
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_parcel_payment_dates() {
        assert_eq!(
            ThirteenthParcel::First.payment_date(2025),
            NaiveDate::from_ymd_opt(2025, 11, 30)
        );
        assert_eq!(
            ThirteenthParcel::Second.payment_date(2025),
            NaiveDate::from_ymd_opt(2025, 12, 20)
        );
    }

    #[test]
    fn test_parcel_deserializes_snake_case() {
        let parcel: ThirteenthParcel = serde_json::from_str("\"unique\"").unwrap();
        assert_eq!(parcel, ThirteenthParcel::Unique);
    }
}
