//! HTTP API module for the payroll engine.
//!
//! This module exposes the calculators as JSON endpoints:
//! `POST /withholding`, `/vacation`, `/thirteenth`, `/termination` and
//! `/simples`.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{
    EmployeeRequest, SimplesRequest, TerminationRequest, ThirteenthRequest, VacationRequest,
    WithholdingRequest, WithholdingTax,
};
pub use response::{ApiError, WithholdingResponse};
pub use state::AppState;
