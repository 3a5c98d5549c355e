//! Request types for the payroll engine API.
//!
//! This module defines the JSON request structures for the calculation
//! endpoints. Every request names its company explicitly in `company_id`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculation::{
    NoticeType, TerminationInput, TerminationReason, ThirteenthInput, ThirteenthParcel,
    VacationInput,
};
use crate::models::{DasInput, Employee, SimplesAnnex};

/// Employee information in a calculation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeRequest {
    /// Unique identifier for the employee.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Monthly base salary.
    pub base_salary: Decimal,
    /// The date the employment contract started.
    pub admission_date: NaiveDate,
    /// Number of dependents declared for IRRF.
    #[serde(default)]
    pub dependents: u32,
}

impl EmployeeRequest {
    /// Builds the domain employee, attaching it to `company_id`.
    pub fn into_employee(self, company_id: String) -> Employee {
        Employee {
            id: self.id,
            company_id,
            name: self.name,
            base_salary: self.base_salary,
            admission_date: self.admission_date,
            dependents: self.dependents,
        }
    }
}

/// Which withholding table to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithholdingTax {
    /// Employee social security.
    Inss,
    /// Monthly income tax.
    Irrf,
}

/// Request body for the `/withholding` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithholdingRequest {
    /// The company the calculation belongs to.
    pub company_id: String,
    /// Date selecting the table version.
    pub date: NaiveDate,
    /// Table to apply.
    pub tax: WithholdingTax,
    /// Gross amount subject to withholding.
    pub gross_base: Decimal,
    /// Dependents declared (IRRF only).
    #[serde(default)]
    pub dependents: u32,
}

/// Request body for the `/vacation` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VacationRequest {
    /// The company the employee belongs to.
    pub company_id: String,
    /// The employee going on vacation.
    pub employee: EmployeeRequest,
    /// First day of the vacation.
    pub start_date: NaiveDate,
    /// Vacation days granted.
    pub days: u32,
    /// Sell one third of the days.
    #[serde(default)]
    pub sell_one_third: bool,
    /// Advance the first 13th-salary parcel.
    #[serde(default)]
    pub advance_thirteenth: bool,
}

impl From<VacationRequest> for VacationInput {
    fn from(req: VacationRequest) -> Self {
        VacationInput {
            employee: req.employee.into_employee(req.company_id),
            start_date: req.start_date,
            days: req.days,
            sell_one_third: req.sell_one_third,
            advance_thirteenth: req.advance_thirteenth,
        }
    }
}

/// Request body for the `/thirteenth` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThirteenthRequest {
    /// The company the employee belongs to.
    pub company_id: String,
    /// The employee receiving the 13th salary.
    pub employee: EmployeeRequest,
    /// Reference year.
    pub year: i32,
    /// Parcel being paid.
    pub parcel: ThirteenthParcel,
    /// First parcel already paid (second parcel only).
    #[serde(default)]
    pub first_parcel_paid: Option<Decimal>,
}

impl From<ThirteenthRequest> for ThirteenthInput {
    fn from(req: ThirteenthRequest) -> Self {
        ThirteenthInput {
            employee: req.employee.into_employee(req.company_id),
            year: req.year,
            parcel: req.parcel,
            first_parcel_paid: req.first_parcel_paid,
        }
    }
}

/// Request body for the `/termination` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminationRequest {
    /// The company the employee belongs to.
    pub company_id: String,
    /// The employee leaving.
    pub employee: EmployeeRequest,
    /// Last day worked.
    pub termination_date: NaiveDate,
    /// Why the contract ended.
    pub reason: TerminationReason,
    /// How notice was handled.
    pub notice: NoticeType,
    /// FGTS account balance.
    #[serde(default)]
    pub fgts_balance: Decimal,
    /// Acquisition periods with vacation not taken.
    #[serde(default)]
    pub overdue_vacation_periods: u32,
}

impl From<TerminationRequest> for TerminationInput {
    fn from(req: TerminationRequest) -> Self {
        TerminationInput {
            employee: req.employee.into_employee(req.company_id),
            termination_date: req.termination_date,
            reason: req.reason,
            notice: req.notice,
            fgts_balance: req.fgts_balance,
            overdue_vacation_periods: req.overdue_vacation_periods,
        }
    }
}

/// Request body for the `/simples` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimplesRequest {
    /// The company being assessed.
    pub company_id: String,
    /// Any date within the assessment month.
    pub period: NaiveDate,
    /// Annex the revenue is taxed under.
    pub annex: SimplesAnnex,
    /// Gross revenue of the month.
    pub rpa: Decimal,
    /// Gross revenue of the previous twelve months.
    pub rbt12: Decimal,
}

impl From<SimplesRequest> for DasInput {
    fn from(req: SimplesRequest) -> Self {
        DasInput {
            company_id: req.company_id,
            period: req.period,
            annex: req.annex,
            rpa: req.rpa,
            rbt12: req.rbt12,
        }
    }
}
