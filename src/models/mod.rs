//! Core data models for the calculation engine.
//!
//! This module contains all the domain models used throughout the engine.

mod bracket;
mod calculation_result;
mod das;
mod employee;

pub use bracket::{Bracket, BracketTable};
pub use calculation_result::{
    AuditStep, AuditTrace, AuditWarning, CalculationResult, CalculatorKind, EventKind, LineItem,
    Reference,
};
pub use das::{DasInput, DasResult, SimplesAnnex, SimplesTax, TaxShare};
pub use employee::Employee;
