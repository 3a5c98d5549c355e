//! Payroll and Simples Nacional calculation engine for Brazil.
//!
//! This crate computes vacation pay, 13th salary and contract termination
//! settlements with their INSS and IRRF withholdings, and the monthly
//! Simples Nacional DAS, from legal tables loaded out of YAML files.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
