//! Immunoglobulin test tracking: age-bracketed guideline evaluation and trends.

pub mod config;
pub mod error;
pub mod evaluation;
pub mod guidelines;
pub mod records;
pub mod telemetry;
