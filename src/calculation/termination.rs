//! Contract termination (TRCT) calculation functionality.
//!
//! This module computes the severance lines owed when an employment
//! contract ends: salary balance, notice, proportional 13th salary,
//! overdue and proportional vacation, the FGTS fine and the withholdings.
//! Which lines are due depends on the [`TerminationReason`] and the
//! [`NoticeType`].

use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::PayrollTables;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AuditStep, AuditTrace, CalculationResult, CalculatorKind, Employee, EventKind, LineItem,
};

use super::common::{
    acquisition_months, acquisition_period_start, calendar_months_worked, ensure_amount,
    percent_label,
};
use super::withholding::{WithholdingInput, calculate_withholding};

/// Base notice period in days.
pub const BASE_NOTICE_DAYS: u32 = 30;

/// Extra notice days per completed year of service (Lei 12.506/2011).
pub const NOTICE_DAYS_PER_YEAR: u32 = 3;

/// Longest notice period in days.
pub const MAX_NOTICE_DAYS: u32 = 90;

/// Why the contract ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// Dismissal by the employer without just cause.
    WithoutCause,
    /// Dismissal for just cause (CLT art. 482).
    WithCause,
    /// The employee resigned.
    Resignation,
    /// Termination by mutual agreement (CLT art. 484-A).
    MutualAgreement,
}

impl TerminationReason {
    /// FGTS fine rate owed by the employer.
    pub fn fgts_fine_rate(&self) -> Decimal {
        match self {
            TerminationReason::WithoutCause => Decimal::new(40, 2),
            TerminationReason::MutualAgreement => Decimal::new(20, 2),
            TerminationReason::WithCause | TerminationReason::Resignation => Decimal::ZERO,
        }
    }
}

/// How the notice period was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeType {
    /// The notice period was worked; it is paid as ordinary salary.
    Worked,
    /// The employer paid the notice instead of it being worked.
    Indemnified,
    /// The resigning employee did not work the notice.
    NotFulfilled,
}

/// Input to the termination calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationInput {
    /// The employee leaving.
    pub employee: Employee,
    /// Last day worked.
    pub termination_date: NaiveDate,
    /// Why the contract ended.
    pub reason: TerminationReason,
    /// How notice was handled.
    pub notice: NoticeType,
    /// FGTS account balance used for the fine.
    #[serde(default)]
    pub fgts_balance: Decimal,
    /// Complete acquisition periods whose vacation was never taken.
    #[serde(default)]
    pub overdue_vacation_periods: u32,
}

/// Notice days owed for `completed_years` of service.
///
/// # Examples
///
/// ```
/// use folha_engine::calculation::notice_days;
///
/// assert_eq!(notice_days(0), 30);
/// assert_eq!(notice_days(5), 45);
/// assert_eq!(notice_days(25), 90);
/// ```
pub fn notice_days(completed_years: u32) -> u32 {
    BASE_NOTICE_DAYS
        .saturating_add(NOTICE_DAYS_PER_YEAR.saturating_mul(completed_years))
        .min(MAX_NOTICE_DAYS)
}

fn validate(input: &TerminationInput) -> EngineResult<()> {
    input.employee.validate()?;

    if input.termination_date < input.employee.admission_date {
        return Err(EngineError::validation(
            "termination_date",
            format!(
                "termination on {} precedes admission on {}",
                input.termination_date, input.employee.admission_date
            ),
        ));
    }
    ensure_amount("fgts_balance", input.fgts_balance)?;

    let years = input.employee.completed_years(input.termination_date);
    if input.overdue_vacation_periods > years {
        return Err(EngineError::validation(
            "overdue_vacation_periods",
            format!(
                "{} overdue periods exceed the {} completed years of service",
                input.overdue_vacation_periods, years
            ),
        ));
    }

    match (input.notice, input.reason) {
        (
            NoticeType::Indemnified,
            TerminationReason::WithCause | TerminationReason::Resignation,
        ) => Err(EngineError::validation(
            "notice",
            "indemnified notice applies only to dismissal without cause or mutual agreement",
        )),
        (NoticeType::NotFulfilled, reason) if reason != TerminationReason::Resignation => {
            Err(EngineError::validation(
                "notice",
                "only a resigning employee can leave the notice unfulfilled",
            ))
        }
        _ => Ok(()),
    }
}

/// Months of 13th salary owed in each calendar year from the termination
/// year through `projected_end`, skipping years with none.
fn thirteenth_months_by_year(
    admission: NaiveDate,
    termination_date: NaiveDate,
    projected_end: NaiveDate,
) -> BTreeMap<i32, u32> {
    (termination_date.year()..=projected_end.year())
        .filter_map(|year| {
            let year_start = NaiveDate::from_ymd_opt(year, 1, 1)?;
            let year_end = NaiveDate::from_ymd_opt(year, 12, 31)?;
            let months =
                calendar_months_worked(admission, year_start, projected_end.min(year_end)).min(12);
            (months > 0).then_some((year, months))
        })
        .collect()
}

/// Calculates the termination settlement.
///
/// An indemnified notice projects the contract end by the notice days;
/// the projected end drives the proportional 13th salary and vacation.
/// When the projection crosses into the next year, the 13th salary covers
/// the months of both years.
/// Only the salary balance and the 13th salary are withholding bases, each
/// with its own INSS and IRRF line.
///
/// # Errors
///
/// Returns [`EngineError::Validation`] if the termination precedes the
/// admission, the FGTS balance is out of range, more vacation periods are
/// overdue than years were served, the notice type does not fit the
/// reason, the projected end is not a representable date, or the employee
/// record is invalid.
///
/// # Examples
///
/// ```no_run
/// use folha_engine::calculation::{
///     calculate_termination, NoticeType, TerminationInput, TerminationReason,
/// };
/// use folha_engine::config::ConfigLoader;
/// use folha_engine::models::{Employee, EventKind};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let loader = ConfigLoader::load("config/brazil").unwrap();
/// let termination_date = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
/// let input = TerminationInput {
///     employee: Employee {
///         id: "emp_001".to_string(),
///         company_id: "cmp_001".to_string(),
///         name: "Ana".to_string(),
///         base_salary: Decimal::from_str("3000.00").unwrap(),
///         admission_date: NaiveDate::from_ymd_opt(2022, 3, 1).unwrap(),
///         dependents: 0,
///     },
///     termination_date,
///     reason: TerminationReason::WithoutCause,
///     notice: NoticeType::Indemnified,
///     fgts_balance: Decimal::from_str("10000.00").unwrap(),
///     overdue_vacation_periods: 0,
/// };
///
/// let tables = loader.payroll_tables(termination_date).unwrap();
/// let result = calculate_termination(&input, tables).unwrap();
/// // 30 + 3 × 3 years = 39 days of notice
/// let notice = result.event(EventKind::NoticeIndemnity).unwrap();
/// assert_eq!(notice.earning, Decimal::from_str("3900.00").unwrap());
/// ```
pub fn calculate_termination(
    input: &TerminationInput,
    tables: &PayrollTables,
) -> EngineResult<CalculationResult> {
    validate(input)?;

    let employee = &input.employee;
    let base = employee.base_salary;
    let reason = input.reason;
    let thirty = Decimal::from(30);

    let years = employee.completed_years(input.termination_date);
    let notice_days = notice_days(years);
    let projected_end = if input.notice == NoticeType::Indemnified {
        input
            .termination_date
            .checked_add_days(Days::new(u64::from(notice_days)))
            .ok_or_else(|| {
                EngineError::validation(
                    "termination_date",
                    format!(
                        "{} plus {} days of notice is out of range",
                        input.termination_date, notice_days
                    ),
                )
            })?
    } else {
        input.termination_date
    };

    let mut trace = AuditTrace::default();
    let mut events = Vec::new();

    trace.steps.push(AuditStep {
        step_number: trace.next_step_number(),
        rule_id: "notice_period".to_string(),
        rule_name: "Notice Period".to_string(),
        legal_ref: "CLT art. 487; Lei 12.506/2011".to_string(),
        input: serde_json::json!({
            "admission_date": employee.admission_date.to_string(),
            "termination_date": input.termination_date.to_string(),
            "reason": reason,
            "notice": input.notice,
        }),
        output: serde_json::json!({
            "completed_years": years,
            "notice_days": notice_days,
            "projected_end": projected_end.to_string(),
        }),
        reasoning: format!(
            "{} + {} × {} years = {} days (max {}); contract ends {}",
            BASE_NOTICE_DAYS, NOTICE_DAYS_PER_YEAR, years, notice_days, MAX_NOTICE_DAYS, projected_end
        ),
    });

    // Saldo de salário
    let balance_days = input.termination_date.day().min(30);
    let balance = LineItem::earning(
        EventKind::SalaryBalance,
        "Saldo de salário",
        balance_days,
        base * Decimal::from(balance_days) / thirty,
    );
    let balance_amount = balance.earning;
    events.push(balance);

    if input.notice == NoticeType::Indemnified {
        let full = base * Decimal::from(notice_days) / thirty;
        let (amount, description) = if reason == TerminationReason::MutualAgreement {
            (full / Decimal::from(2), "Aviso prévio indenizado (50%)")
        } else {
            (full, "Aviso prévio indenizado")
        };
        let line = LineItem::earning(EventKind::NoticeIndemnity, description, notice_days, amount);

        trace.steps.push(AuditStep {
            step_number: trace.next_step_number(),
            rule_id: "notice_indemnity".to_string(),
            rule_name: "Indemnified Notice".to_string(),
            legal_ref: if reason == TerminationReason::MutualAgreement {
                "CLT art. 484-A, I, a".to_string()
            } else {
                "CLT art. 487, § 1".to_string()
            },
            input: serde_json::json!({
                "base_salary": base.normalize().to_string(),
                "notice_days": notice_days,
            }),
            output: serde_json::json!({
                "amount": line.earning.to_string(),
            }),
            reasoning: format!(
                "{} / 30 × {} days = {}",
                base.normalize(),
                notice_days,
                line.earning
            ),
        });
        events.push(line);
    }

    let mut thirteenth_amount = None;
    if reason != TerminationReason::WithCause {
        let months_by_year = thirteenth_months_by_year(
            employee.admission_date,
            input.termination_date,
            projected_end,
        );
        let months: u32 = months_by_year.values().sum();

        if months > 0 {
            let line = LineItem::earning(
                EventKind::ProportionalThirteenth,
                "13º salário proporcional",
                format!("{}/12", months),
                base * Decimal::from(months) / Decimal::from(12),
            );
            let per_year: Vec<String> = months_by_year
                .iter()
                .map(|(year, m)| format!("{}/12 in {}", m, year))
                .collect();
            trace.steps.push(AuditStep {
                step_number: trace.next_step_number(),
                rule_id: "proportional_thirteenth".to_string(),
                rule_name: "Proportional 13th Salary".to_string(),
                legal_ref: "Lei 4.090/1962 art. 3".to_string(),
                input: serde_json::json!({
                    "base_salary": base.normalize().to_string(),
                    "projected_end": projected_end.to_string(),
                }),
                output: serde_json::json!({
                    "months_by_year": months_by_year,
                    "months": months,
                    "amount": line.earning.to_string(),
                }),
                reasoning: format!(
                    "{}: {} × {}/12 = {}",
                    per_year.join(" + "),
                    base.normalize(),
                    months,
                    line.earning
                ),
            });
            thirteenth_amount = Some(line.earning);
            events.push(line);
        }
    }

    if input.overdue_vacation_periods > 0 {
        let periods = input.overdue_vacation_periods;
        let vacation = LineItem::earning(
            EventKind::OverdueVacation,
            "Férias vencidas",
            periods * 30,
            base * Decimal::from(periods),
        );
        let one_third = LineItem::earning(
            EventKind::OverdueVacationOneThird,
            "1/3 férias vencidas",
            "1/3",
            vacation.earning / Decimal::from(3),
        );
        trace.steps.push(AuditStep {
            step_number: trace.next_step_number(),
            rule_id: "overdue_vacation".to_string(),
            rule_name: "Overdue Vacation".to_string(),
            legal_ref: "CLT art. 146".to_string(),
            input: serde_json::json!({
                "base_salary": base.normalize().to_string(),
                "periods": periods,
            }),
            output: serde_json::json!({
                "vacation": vacation.earning.to_string(),
                "one_third": one_third.earning.to_string(),
            }),
            reasoning: format!(
                "{} overdue period(s) × {} = {}; one third = {}",
                periods,
                base.normalize(),
                vacation.earning,
                one_third.earning
            ),
        });
        events.push(vacation);
        events.push(one_third);
    }

    if reason != TerminationReason::WithCause {
        let period_start = acquisition_period_start(employee.admission_date, projected_end);
        let months = acquisition_months(period_start, projected_end);

        if months > 0 {
            let vacation = LineItem::earning(
                EventKind::ProportionalVacation,
                "Férias proporcionais",
                format!("{}/12", months),
                base * Decimal::from(months) / Decimal::from(12),
            );
            let one_third = LineItem::earning(
                EventKind::ProportionalVacationOneThird,
                "1/3 férias proporcionais",
                "1/3",
                vacation.earning / Decimal::from(3),
            );
            trace.steps.push(AuditStep {
                step_number: trace.next_step_number(),
                rule_id: "proportional_vacation".to_string(),
                rule_name: "Proportional Vacation".to_string(),
                legal_ref: "CLT art. 146, parágrafo único; Súmula 261 TST".to_string(),
                input: serde_json::json!({
                    "base_salary": base.normalize().to_string(),
                    "period_start": period_start.to_string(),
                    "projected_end": projected_end.to_string(),
                }),
                output: serde_json::json!({
                    "months": months,
                    "vacation": vacation.earning.to_string(),
                    "one_third": one_third.earning.to_string(),
                }),
                reasoning: format!(
                    "{} months since {}: {} × {}/12 = {}; one third = {}",
                    months,
                    period_start,
                    base.normalize(),
                    months,
                    vacation.earning,
                    one_third.earning
                ),
            });
            events.push(vacation);
            events.push(one_third);
        }
    }

    let fine_rate = reason.fgts_fine_rate();
    if fine_rate > Decimal::ZERO && input.fgts_balance > Decimal::ZERO {
        let fine = LineItem::earning(
            EventKind::FgtsFine,
            "Multa FGTS",
            percent_label(fine_rate),
            input.fgts_balance * fine_rate,
        );
        trace.steps.push(AuditStep {
            step_number: trace.next_step_number(),
            rule_id: "fgts_fine".to_string(),
            rule_name: "FGTS Termination Fine".to_string(),
            legal_ref: "Lei 8.036/1990 art. 18, § 1".to_string(),
            input: serde_json::json!({
                "fgts_balance": input.fgts_balance.normalize().to_string(),
                "reason": reason,
            }),
            output: serde_json::json!({
                "rate": fine_rate.normalize().to_string(),
                "amount": fine.earning.to_string(),
            }),
            reasoning: format!(
                "{} of {} = {}",
                percent_label(fine_rate),
                input.fgts_balance.normalize(),
                fine.earning
            ),
        });
        events.push(fine);
    }

    // Withholdings: salary balance and 13th salary are separate bases.
    let inss = calculate_withholding(
        &WithholdingInput::new(balance_amount),
        &tables.inss,
        trace.next_step_number(),
    )?;
    trace.steps.push(inss.audit_step.clone());
    events.push(LineItem::deduction(
        EventKind::Inss,
        "INSS sobre saldo de salário",
        percent_label(inss.rate),
        inss.tax,
    ));

    let inss_thirteenth = match thirteenth_amount {
        Some(amount) => {
            let result = calculate_withholding(
                &WithholdingInput::new(amount),
                &tables.inss,
                trace.next_step_number(),
            )?;
            trace.steps.push(result.audit_step.clone());
            events.push(LineItem::deduction(
                EventKind::InssThirteenth,
                "INSS sobre 13º salário",
                percent_label(result.rate),
                result.tax,
            ));
            Some(result.tax)
        }
        None => None,
    };

    let irrf = calculate_withholding(
        &WithholdingInput::with_dependents(
            balance_amount - inss.tax,
            employee.dependents,
            tables.irrf_dependent_deduction,
        ),
        &tables.irrf,
        trace.next_step_number(),
    )?;
    trace.steps.push(irrf.audit_step.clone());
    events.push(LineItem::deduction(
        EventKind::Irrf,
        "IRRF sobre saldo de salário",
        percent_label(irrf.rate),
        irrf.tax,
    ));

    if let (Some(amount), Some(inss_tax)) = (thirteenth_amount, inss_thirteenth) {
        let result = calculate_withholding(
            &WithholdingInput::with_dependents(
                amount - inss_tax,
                employee.dependents,
                tables.irrf_dependent_deduction,
            ),
            &tables.irrf,
            trace.next_step_number(),
        )?;
        trace.steps.push(result.audit_step.clone());
        events.push(LineItem::deduction(
            EventKind::IrrfThirteenth,
            "IRRF sobre 13º salário",
            percent_label(result.rate),
            result.tax,
        ));
    }

    if input.notice == NoticeType::NotFulfilled {
        let line = LineItem::deduction(
            EventKind::NoticeNotFulfilled,
            "Aviso prévio não cumprido",
            BASE_NOTICE_DAYS,
            base * Decimal::from(BASE_NOTICE_DAYS) / thirty,
        );
        trace.steps.push(AuditStep {
            step_number: trace.next_step_number(),
            rule_id: "notice_not_fulfilled".to_string(),
            rule_name: "Unfulfilled Notice Discount".to_string(),
            legal_ref: "CLT art. 487, § 2".to_string(),
            input: serde_json::json!({
                "base_salary": base.normalize().to_string(),
            }),
            output: serde_json::json!({
                "amount": line.deduction.to_string(),
            }),
            reasoning: format!(
                "Resignation without working notice: {} days discounted = {}",
                BASE_NOTICE_DAYS, line.deduction
            ),
        });
        events.push(line);
    }

    let result = CalculationResult::from_events(
        employee.company_id.clone(),
        employee.id.clone(),
        CalculatorKind::Termination,
        input.termination_date,
        events,
        trace,
    );

    debug!(
        company_id = %result.company_id,
        employee_id = %result.employee_id,
        reason = ?reason,
        notice = ?input.notice,
        total_earnings = %result.total_earnings,
        net_amount = %result.net_amount,
        "Calculated termination"
    );

    Ok(result)
}
