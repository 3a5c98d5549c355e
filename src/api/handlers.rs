//! HTTP request handlers for the payroll engine API.
//!
//! This module contains the handler functions for all API endpoints.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::{
    ThirteenthInput, TerminationInput, VacationInput, WithholdingInput, calculate_das,
    calculate_termination, calculate_thirteenth, calculate_vacation, calculate_withholding,
};
use crate::config::PayrollTables;
use crate::error::{EngineError, EngineResult};
use crate::models::DasInput;

use super::request::{
    SimplesRequest, TerminationRequest, ThirteenthRequest, VacationRequest, WithholdingRequest,
    WithholdingTax,
};
use super::response::{ApiError, ApiErrorResponse, WithholdingResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/withholding", post(withholding_handler))
        .route("/vacation", post(vacation_handler))
        .route("/thirteenth", post(thirteenth_handler))
        .route("/termination", post(termination_handler))
        .route("/simples", post(simples_handler))
        .with_state(state)
}

/// Handler for POST /withholding.
///
/// Computes a single INSS or IRRF withholding with the tables effective on
/// the request date.
async fn withholding_handler(
    State(state): State<AppState>,
    payload: Result<Json<WithholdingRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, endpoint = "withholding", "Processing calculation request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let start_time = Instant::now();
    let result = state
        .config()
        .payroll_tables(request.date)
        .and_then(|tables| withhold(&request, tables));

    respond(correlation_id, "withholding", start_time, result)
}

/// Applies the requested table to the request's gross base.
fn withhold(
    request: &WithholdingRequest,
    tables: &PayrollTables,
) -> EngineResult<WithholdingResponse> {
    if request.company_id.trim().is_empty() {
        return Err(EngineError::validation("company_id", "must not be empty"));
    }

    let (input, table) = match request.tax {
        WithholdingTax::Inss => (WithholdingInput::new(request.gross_base), &tables.inss),
        WithholdingTax::Irrf => (
            WithholdingInput::with_dependents(
                request.gross_base,
                request.dependents,
                tables.irrf_dependent_deduction,
            ),
            &tables.irrf,
        ),
    };

    let result = calculate_withholding(&input, table, 1)?;
    Ok(WithholdingResponse {
        company_id: request.company_id.clone(),
        tax: request.tax,
        table_effective_date: tables.effective_date,
        result,
    })
}

/// Handler for POST /vacation.
async fn vacation_handler(
    State(state): State<AppState>,
    payload: Result<Json<VacationRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, endpoint = "vacation", "Processing calculation request");

    let input: VacationInput = match payload {
        Ok(Json(req)) => req.into(),
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let start_time = Instant::now();
    let result = state
        .config()
        .payroll_tables(input.start_date)
        .and_then(|tables| calculate_vacation(&input, tables));

    respond(correlation_id, "vacation", start_time, result)
}

/// Handler for POST /thirteenth.
///
/// Tables are selected by the legal payment date of the requested parcel.
async fn thirteenth_handler(
    State(state): State<AppState>,
    payload: Result<Json<ThirteenthRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, endpoint = "thirteenth", "Processing calculation request");

    let input: ThirteenthInput = match payload {
        Ok(Json(req)) => req.into(),
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let start_time = Instant::now();
    let result = input
        .parcel
        .payment_date(input.year)
        .ok_or_else(|| {
            EngineError::validation("year", format!("{} is not a supported year", input.year))
        })
        .and_then(|date| state.config().payroll_tables(date))
        .and_then(|tables| calculate_thirteenth(&input, tables));

    respond(correlation_id, "thirteenth", start_time, result)
}

/// Handler for POST /termination.
async fn termination_handler(
    State(state): State<AppState>,
    payload: Result<Json<TerminationRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, endpoint = "termination", "Processing calculation request");

    let input: TerminationInput = match payload {
        Ok(Json(req)) => req.into(),
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let start_time = Instant::now();
    let result = state
        .config()
        .payroll_tables(input.termination_date)
        .and_then(|tables| calculate_termination(&input, tables));

    respond(correlation_id, "termination", start_time, result)
}

/// Handler for POST /simples.
async fn simples_handler(
    State(state): State<AppState>,
    payload: Result<Json<SimplesRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, endpoint = "simples", "Processing calculation request");

    let input: DasInput = match payload {
        Ok(Json(req)) => req.into(),
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let start_time = Instant::now();
    let result = calculate_das(&input, state.config().simples());

    respond(correlation_id, "simples", start_time, result)
}

/// Turns a calculation outcome into a JSON response, logging either way.
fn respond<T: Serialize>(
    correlation_id: Uuid,
    endpoint: &'static str,
    start_time: Instant,
    result: EngineResult<T>,
) -> Response {
    match result {
        Ok(body) => {
            info!(
                correlation_id = %correlation_id,
                endpoint,
                duration_us = start_time.elapsed().as_micros(),
                "Calculation completed successfully"
            );
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                Json(body),
            )
                .into_response()
        }
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                endpoint,
                error = %err,
                "Calculation failed"
            );
            let api_error: ApiErrorResponse = err.into();
            (
                api_error.status,
                [(header::CONTENT_TYPE, "application/json")],
                Json(api_error.error),
            )
                .into_response()
        }
    }
}

/// Maps a JSON extraction failure to a 400 response.
fn rejection_response(correlation_id: Uuid, rejection: JsonRejection) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };

    (
        StatusCode::BAD_REQUEST,
        [(header::CONTENT_TYPE, "application/json")],
        Json(error),
    )
        .into_response()
}
