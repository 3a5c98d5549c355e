//! Calculation result models.
//!
//! This module contains the [`CalculationResult`] type and the line items
//! ("events") it is made of, together with the audit trace recorded while
//! a calculator runs.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::calculation::round_money;

/// The calculator that produced a result or an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculatorKind {
    /// Vacation pay (férias).
    Vacation,
    /// Thirteenth salary.
    Thirteenth,
    /// Contract termination (TRCT).
    Termination,
    /// Simples Nacional DAS.
    Simples,
}

/// Discriminator for every line item the engine can emit.
///
/// # Example
///
/// ```
/// use folha_engine::models::{CalculatorKind, EventKind};
///
/// assert_eq!(EventKind::VacationOneThird.calculator(), Some(CalculatorKind::Vacation));
/// assert_eq!(EventKind::Inss.calculator(), None);
/// assert!(EventKind::Irrf.is_withholding());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Pay for the vacation days actually taken.
    VacationPay,
    /// Constitutional one-third bonus on vacation pay.
    VacationOneThird,
    /// Sale of vacation days (abono pecuniário) including its one-third.
    VacationSale,
    /// First 13th-salary installment advanced with vacation.
    ThirteenthAdvance,
    /// 13th-salary first parcel.
    ThirteenthFirstParcel,
    /// 13th-salary gross for the second or unique parcel.
    ThirteenthSalary,
    /// First parcel already paid, discounted at settlement.
    ThirteenthAdvanceDiscount,
    /// Salary for the days worked in the termination month.
    SalaryBalance,
    /// Indemnified notice period.
    NoticeIndemnity,
    /// Proportional 13th salary on termination.
    ProportionalThirteenth,
    /// Vacation periods already acquired and not taken.
    OverdueVacation,
    /// One-third bonus on overdue vacation.
    OverdueVacationOneThird,
    /// Vacation accrued in the current acquisition period.
    ProportionalVacation,
    /// One-third bonus on proportional vacation.
    ProportionalVacationOneThird,
    /// FGTS termination fine.
    FgtsFine,
    /// Notice not worked by a resigning employee.
    NoticeNotFulfilled,
    /// Social security withholding.
    Inss,
    /// Income tax withholding.
    Irrf,
    /// Social security withheld on the 13th salary.
    InssThirteenth,
    /// Income tax withheld on the 13th salary.
    IrrfThirteenth,
}

impl EventKind {
    /// Returns the calculator that owns this event, or `None` for the
    /// withholding events shared by all payroll calculators.
    pub fn calculator(&self) -> Option<CalculatorKind> {
        match self {
            EventKind::VacationPay
            | EventKind::VacationOneThird
            | EventKind::VacationSale
            | EventKind::ThirteenthAdvance => Some(CalculatorKind::Vacation),
            EventKind::ThirteenthFirstParcel
            | EventKind::ThirteenthSalary
            | EventKind::ThirteenthAdvanceDiscount => Some(CalculatorKind::Thirteenth),
            EventKind::SalaryBalance
            | EventKind::NoticeIndemnity
            | EventKind::ProportionalThirteenth
            | EventKind::OverdueVacation
            | EventKind::OverdueVacationOneThird
            | EventKind::ProportionalVacation
            | EventKind::ProportionalVacationOneThird
            | EventKind::FgtsFine
            | EventKind::NoticeNotFulfilled => Some(CalculatorKind::Termination),
            EventKind::Inss
            | EventKind::Irrf
            | EventKind::InssThirteenth
            | EventKind::IrrfThirteenth => None,
        }
    }

    /// Returns true for INSS/IRRF withholding events.
    pub fn is_withholding(&self) -> bool {
        self.calculator().is_none()
    }
}

/// The "reference" column of a payslip line: a quantity or a label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reference {
    /// A numeric reference (days, percentage).
    Number(Decimal),
    /// A textual reference (e.g. "7/12").
    Text(String),
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Number(n) => write!(f, "{}", n.normalize()),
            Reference::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<u32> for Reference {
    fn from(value: u32) -> Self {
        Reference::Number(Decimal::from(value))
    }
}

impl From<Decimal> for Reference {
    fn from(value: Decimal) -> Self {
        Reference::Number(value)
    }
}

impl From<&str> for Reference {
    fn from(value: &str) -> Self {
        Reference::Text(value.to_string())
    }
}

impl From<String> for Reference {
    fn from(value: String) -> Self {
        Reference::Text(value)
    }
}

/// A single line of a payroll calculation.
///
/// Exactly one of `earning` / `deduction` is non-zero for lines built via
/// [`LineItem::earning`] and [`LineItem::deduction`]. Amounts are rounded
/// to cents on construction.
///
/// # Example
///
/// ```
/// use folha_engine::models::{EventKind, LineItem};
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let line = LineItem::earning(
///     EventKind::VacationOneThird,
///     "1/3 constitucional de férias",
///     "1/3",
///     Decimal::from_str("333.3333").unwrap(),
/// );
/// assert_eq!(line.earning, Decimal::from_str("333.33").unwrap());
/// assert_eq!(line.deduction, Decimal::ZERO);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// What the line represents.
    pub kind: EventKind,
    /// Human-readable description (as printed on the payslip).
    pub description: String,
    /// Quantity or label shown in the reference column.
    pub reference: Reference,
    /// Amount credited to the employee.
    pub earning: Decimal,
    /// Amount withheld from the employee.
    pub deduction: Decimal,
}

impl LineItem {
    /// Creates an earning line.
    pub fn earning(
        kind: EventKind,
        description: impl Into<String>,
        reference: impl Into<Reference>,
        amount: Decimal,
    ) -> Self {
        Self {
            kind,
            description: description.into(),
            reference: reference.into(),
            earning: round_money(amount),
            deduction: Decimal::ZERO,
        }
    }

    /// Creates a deduction line.
    pub fn deduction(
        kind: EventKind,
        description: impl Into<String>,
        reference: impl Into<Reference>,
        amount: Decimal,
    ) -> Self {
        Self {
            kind,
            description: description.into(),
            reference: reference.into(),
            earning: Decimal::ZERO,
            deduction: round_money(amount),
        }
    }
}

/// A single step in the audit trace recording a calculation decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// Statute or table backing the rule (e.g. "CLT art. 143").
    pub legal_ref: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// A warning generated during calculation.
///
/// Warnings flag situations that do not prevent the calculation but
/// should be reviewed (e.g. a base capped at the INSS ceiling).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable description of the warning.
    pub message: String,
    /// The severity level ("low", "medium", "high").
    pub severity: String,
}

/// The complete audit trace for a calculation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrace {
    /// The sequence of calculation steps.
    pub steps: Vec<AuditStep>,
    /// Any warnings generated during calculation.
    pub warnings: Vec<AuditWarning>,
}

impl AuditTrace {
    /// Number to assign to the next step.
    pub fn next_step_number(&self) -> u32 {
        self.steps.len() as u32 + 1
    }
}

/// The complete result of a payroll calculation.
///
/// Totals are derived from the events, so `net_amount` always equals
/// `total_earnings - total_deductions`. The result holds no timestamps or
/// generated ids: identical inputs yield identical results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationResult {
    /// The company the calculation belongs to.
    pub company_id: String,
    /// The employee the calculation is for.
    pub employee_id: String,
    /// Which calculator produced this result.
    pub calculator: CalculatorKind,
    /// The date the calculation refers to (vacation start, termination date...).
    pub reference_date: NaiveDate,
    /// Line items in legal computation order.
    pub events: Vec<LineItem>,
    /// Sum of all earnings.
    pub total_earnings: Decimal,
    /// Sum of all deductions.
    pub total_deductions: Decimal,
    /// `total_earnings - total_deductions`.
    pub net_amount: Decimal,
    /// Complete audit trace of calculation decisions.
    pub audit_trace: AuditTrace,
}

impl CalculationResult {
    /// Builds a result from its events, deriving the totals.
    ///
    /// # Example
    ///
    /// ```
    /// use folha_engine::models::{
    ///     AuditTrace, CalculationResult, CalculatorKind, EventKind, LineItem,
    /// };
    /// use chrono::NaiveDate;
    /// use rust_decimal::Decimal;
    ///
    /// let result = CalculationResult::from_events(
    ///     "cmp_001",
    ///     "emp_001",
    ///     CalculatorKind::Vacation,
    ///     NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
    ///     vec![
    ///         LineItem::earning(EventKind::VacationPay, "Férias", 30u32, Decimal::new(3000, 0)),
    ///         LineItem::deduction(EventKind::Inss, "INSS", "9%", Decimal::new(250, 0)),
    ///     ],
    ///     AuditTrace::default(),
    /// );
    /// assert_eq!(result.net_amount, Decimal::new(2750, 0));
    /// ```
    pub fn from_events(
        company_id: impl Into<String>,
        employee_id: impl Into<String>,
        calculator: CalculatorKind,
        reference_date: NaiveDate,
        events: Vec<LineItem>,
        audit_trace: AuditTrace,
    ) -> Self {
        let total_earnings: Decimal = events.iter().map(|e| e.earning).sum();
        let total_deductions: Decimal = events.iter().map(|e| e.deduction).sum();

        Self {
            company_id: company_id.into(),
            employee_id: employee_id.into(),
            calculator,
            reference_date,
            events,
            total_earnings,
            total_deductions,
            net_amount: total_earnings - total_deductions,
            audit_trace,
        }
    }

    /// Returns the first event of the given kind, if present.
    pub fn event(&self, kind: EventKind) -> Option<&LineItem> {
        self.events.iter().find(|e| e.kind == kind)
    }
}
