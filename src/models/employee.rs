//! Employee model.
//!
//! This module defines the Employee struct used as input by every payroll
//! calculator.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculation::ensure_amount;
use crate::error::{EngineError, EngineResult};

/// Represents an employee of a client company.
///
/// The owning company is carried explicitly in `company_id`; calculators
/// never look it up from ambient state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier for the employee.
    pub id: String,
    /// Identifier of the company (tenant) the employee belongs to.
    pub company_id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Monthly base salary.
    pub base_salary: Decimal,
    /// The date the employment contract started.
    pub admission_date: NaiveDate,
    /// Number of dependents declared for IRRF purposes.
    #[serde(default)]
    pub dependents: u32,
}

impl Employee {
    /// Rejects records that cannot be used in a calculation.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Validation`] when the base salary is negative
    /// or above [`MAX_AMOUNT`](crate::calculation::MAX_AMOUNT), or an
    /// identifier is blank.
    pub fn validate(&self) -> EngineResult<()> {
        if self.id.trim().is_empty() {
            return Err(EngineError::validation("employee.id", "must not be empty"));
        }
        if self.company_id.trim().is_empty() {
            return Err(EngineError::validation(
                "employee.company_id",
                "must not be empty",
            ));
        }
        ensure_amount("employee.base_salary", self.base_salary)
    }

    /// Number of full years of service completed on `date`.
    ///
    /// # Examples
    ///
    /// ```
    /// use folha_engine::models::Employee;
    /// use chrono::NaiveDate;
    /// use rust_decimal::Decimal;
    ///
    /// let employee = Employee {
    ///     id: "emp_001".to_string(),
    ///     company_id: "cmp_001".to_string(),
    ///     name: "Ana".to_string(),
    ///     base_salary: Decimal::new(300000, 2),
    ///     admission_date: NaiveDate::from_ymd_opt(2020, 3, 10).unwrap(),
    ///     dependents: 0,
    /// };
    /// assert_eq!(employee.completed_years(NaiveDate::from_ymd_opt(2025, 3, 9).unwrap()), 4);
    /// assert_eq!(employee.completed_years(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()), 5);
    /// ```
    pub fn completed_years(&self, date: NaiveDate) -> u32 {
        if date < self.admission_date {
            return 0;
        }
        let mut years = date.year() - self.admission_date.year();
        if (date.month(), date.day()) < (self.admission_date.month(), self.admission_date.day())
        {
            years -= 1;
        }
        years.max(0) as u32
    }
}
