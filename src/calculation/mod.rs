//! Calculation logic for the payroll engine.
//!
//! This module contains the calculators: progressive withholding (INSS and
//! IRRF), vacation pay, 13th salary, contract termination and the Simples
//! Nacional DAS. They are synchronous free functions that borrow the legal
//! tables and return an [`EngineResult`](crate::error::EngineResult); all of
//! them share the bracket lookup primitive.

mod bracket_lookup;
mod common;
mod simples;
mod termination;
mod thirteenth;
mod vacation;
mod withholding;

pub use bracket_lookup::{lookup_bracket, lookup_bracket_index};
pub use common::{
    MAX_AMOUNT, MIN_DAYS_FOR_MONTH, acquisition_months, acquisition_period_start,
    calendar_months_worked, ensure_amount, first_day_of_month, last_day_of_month, round_money,
};
pub use simples::calculate_das;
pub use termination::{
    BASE_NOTICE_DAYS, MAX_NOTICE_DAYS, NOTICE_DAYS_PER_YEAR, NoticeType, TerminationInput,
    TerminationReason, calculate_termination, notice_days,
};
pub use thirteenth::{ThirteenthInput, ThirteenthParcel, calculate_thirteenth};
pub use vacation::{MAX_VACATION_DAYS, MIN_VACATION_DAYS, VacationInput, calculate_vacation};
pub use withholding::{WithholdingInput, WithholdingResult, calculate_withholding};
