//! Vacation pay (férias) calculation functionality.
//!
//! Builds the vacation payslip: pay for the days taken, the constitutional
//! one-third, the optional sale of a third of the days (abono pecuniário),
//! the optional 13th-salary advance and the INSS/IRRF withholdings.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::PayrollTables;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AuditStep, AuditTrace, AuditWarning, CalculationResult, CalculatorKind, Employee, EventKind,
    LineItem,
};

use super::common::{calendar_months_worked, last_day_of_month, percent_label};
use super::withholding::{WithholdingInput, calculate_withholding};

/// Shortest vacation period that may be granted.
pub const MIN_VACATION_DAYS: u32 = 5;

/// Longest vacation period (one full acquisition period).
pub const MAX_VACATION_DAYS: u32 = 30;

/// Input to the vacation calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacationInput {
    /// The employee going on vacation.
    pub employee: Employee,
    /// First day of the vacation.
    pub start_date: NaiveDate,
    /// Vacation days granted, before any sale.
    pub days: u32,
    /// Sell one third of the days (abono pecuniário).
    #[serde(default)]
    pub sell_one_third: bool,
    /// Pay the first 13th-salary installment with the vacation.
    #[serde(default)]
    pub advance_thirteenth: bool,
}

/// Calculates a vacation payslip.
///
/// Lines are produced in this order: vacation pay, its one-third, the
/// sale of days (when selling), the 13th advance (when requested), INSS
/// and IRRF. Only the vacation pay and its one-third are withholding bases.
///
/// # Errors
///
/// Returns [`EngineError::Validation`] if `days` is outside 5..=30, if
/// selling would leave fewer than 5 days to take, if the vacation starts
/// before admission, or if the employee record is invalid.
///
/// # Examples
///
/// ```no_run
/// use folha_engine::calculation::{calculate_vacation, VacationInput};
/// use folha_engine::config::ConfigLoader;
/// use folha_engine::models::Employee;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let loader = ConfigLoader::load("config/brazil").unwrap();
/// let start_date = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
/// let input = VacationInput {
///     employee: Employee {
///         id: "emp_001".to_string(),
///         company_id: "cmp_001".to_string(),
///         name: "Ana".to_string(),
///         base_salary: Decimal::from_str("3000.00").unwrap(),
///         admission_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
///         dependents: 0,
///     },
///     start_date,
///     days: 30,
///     sell_one_third: false,
///     advance_thirteenth: false,
/// };
///
/// let tables = loader.payroll_tables(start_date).unwrap();
/// let result = calculate_vacation(&input, tables).unwrap();
/// // 3000.00 + 1000.00 − 373.41 (INSS) − 149.83 (IRRF)
/// assert_eq!(result.net_amount, Decimal::from_str("3476.76").unwrap());
/// ```
pub fn calculate_vacation(
    input: &VacationInput,
    tables: &PayrollTables,
) -> EngineResult<CalculationResult> {
    let employee = &input.employee;
    employee.validate()?;

    if !(MIN_VACATION_DAYS..=MAX_VACATION_DAYS).contains(&input.days) {
        return Err(EngineError::validation(
            "days",
            format!(
                "must be between {} and {}, got {}",
                MIN_VACATION_DAYS, MAX_VACATION_DAYS, input.days
            ),
        ));
    }
    if input.start_date < employee.admission_date {
        return Err(EngineError::validation(
            "start_date",
            format!(
                "vacation starts {} before admission on {}",
                input.start_date, employee.admission_date
            ),
        ));
    }

    let sold_days = if input.sell_one_third { input.days / 3 } else { 0 };
    let taken_days = input.days - sold_days;
    if taken_days < MIN_VACATION_DAYS {
        return Err(EngineError::validation(
            "days",
            format!(
                "selling {} of {} days leaves fewer than {} days of rest",
                sold_days, input.days, MIN_VACATION_DAYS
            ),
        ));
    }

    let base = employee.base_salary;
    let mut trace = AuditTrace::default();
    let mut events = Vec::new();

    trace.steps.push(AuditStep {
        step_number: trace.next_step_number(),
        rule_id: "vacation_days".to_string(),
        rule_name: "Vacation Days Split".to_string(),
        legal_ref: "CLT art. 143".to_string(),
        input: serde_json::json!({
            "days": input.days,
            "sell_one_third": input.sell_one_third,
        }),
        output: serde_json::json!({
            "taken_days": taken_days,
            "sold_days": sold_days,
        }),
        reasoning: if sold_days > 0 {
            format!(
                "Selling one third of {} days: {} sold, {} taken",
                input.days, sold_days, taken_days
            )
        } else {
            format!("No sale: all {} days taken", taken_days)
        },
    });

    // Férias + 1/3
    let pay = LineItem::earning(
        EventKind::VacationPay,
        "Férias",
        taken_days,
        base * Decimal::from(taken_days) / Decimal::from(30),
    );
    let one_third = LineItem::earning(
        EventKind::VacationOneThird,
        "1/3 constitucional de férias",
        "1/3",
        pay.earning / Decimal::from(3),
    );
    let withholding_base = pay.earning + one_third.earning;

    trace.steps.push(AuditStep {
        step_number: trace.next_step_number(),
        rule_id: "vacation_pay".to_string(),
        rule_name: "Vacation Pay and One-Third".to_string(),
        legal_ref: "CF art. 7, XVII; CLT art. 142".to_string(),
        input: serde_json::json!({
            "base_salary": base.normalize().to_string(),
            "taken_days": taken_days,
        }),
        output: serde_json::json!({
            "vacation_pay": pay.earning.to_string(),
            "one_third": one_third.earning.to_string(),
        }),
        reasoning: format!(
            "{} / 30 × {} = {}; one third = {}",
            base.normalize(),
            taken_days,
            pay.earning,
            one_third.earning
        ),
    });

    events.push(pay);
    events.push(one_third);

    if sold_days > 0 {
        let sale = LineItem::earning(
            EventKind::VacationSale,
            "Abono pecuniário + 1/3",
            sold_days,
            base * Decimal::from(sold_days) * Decimal::from(4) / Decimal::from(90),
        );

        trace.steps.push(AuditStep {
            step_number: trace.next_step_number(),
            rule_id: "vacation_sale".to_string(),
            rule_name: "Vacation Sale (Abono Pecuniário)".to_string(),
            legal_ref: "CLT art. 143, 144".to_string(),
            input: serde_json::json!({
                "base_salary": base.normalize().to_string(),
                "sold_days": sold_days,
            }),
            output: serde_json::json!({
                "amount": sale.earning.to_string(),
            }),
            reasoning: format!(
                "({} / 30 × {}) × 4/3 = {}, exempt from INSS and IRRF",
                base.normalize(),
                sold_days,
                sale.earning
            ),
        });

        events.push(sale);
    }

    if input.advance_thirteenth {
        let year_start = NaiveDate::from_ymd_opt(input.start_date.year(), 1, 1)
            .unwrap_or(input.start_date);
        let months = calendar_months_worked(
            employee.admission_date,
            year_start,
            last_day_of_month(input.start_date),
        )
        .min(12);

        let advance = LineItem::earning(
            EventKind::ThirteenthAdvance,
            "Adiantamento 13º salário",
            format!("{}/12", months),
            base * Decimal::from(months) / Decimal::from(24),
        );

        trace.steps.push(AuditStep {
            step_number: trace.next_step_number(),
            rule_id: "thirteenth_advance".to_string(),
            rule_name: "13th Salary Advance on Vacation".to_string(),
            legal_ref: "Lei 4.749/1965 art. 2, § 2".to_string(),
            input: serde_json::json!({
                "base_salary": base.normalize().to_string(),
                "months_worked": months,
            }),
            output: serde_json::json!({
                "amount": advance.earning.to_string(),
            }),
            reasoning: format!(
                "50% of {} × {}/12 = {}",
                base.normalize(),
                months,
                advance.earning
            ),
        });

        events.push(advance);
    }

    let inss = calculate_withholding(
        &WithholdingInput::new(withholding_base),
        &tables.inss,
        trace.next_step_number(),
    )?;
    trace.steps.push(inss.audit_step.clone());
    if inss.capped {
        trace.warnings.push(AuditWarning {
            code: "INSS_CEILING_APPLIED".to_string(),
            message: format!(
                "INSS base {} limited to the ceiling {}",
                withholding_base, inss.taxable_base
            ),
            severity: "low".to_string(),
        });
    }

    let irrf = calculate_withholding(
        &WithholdingInput::with_dependents(
            withholding_base - inss.tax,
            employee.dependents,
            tables.irrf_dependent_deduction,
        ),
        &tables.irrf,
        trace.next_step_number(),
    )?;
    trace.steps.push(irrf.audit_step.clone());

    events.push(LineItem::deduction(
        EventKind::Inss,
        "INSS sobre férias",
        percent_label(inss.rate),
        inss.tax,
    ));
    events.push(LineItem::deduction(
        EventKind::Irrf,
        "IRRF sobre férias",
        percent_label(irrf.rate),
        irrf.tax,
    ));

    let result = CalculationResult::from_events(
        employee.company_id.clone(),
        employee.id.clone(),
        CalculatorKind::Vacation,
        input.start_date,
        events,
        trace,
    );

    debug!(
        company_id = %result.company_id,
        employee_id = %result.employee_id,
        days = input.days,
        total_earnings = %result.total_earnings,
        net_amount = %result.net_amount,
        "Calculated vacation"
    );

    Ok(result)
}
