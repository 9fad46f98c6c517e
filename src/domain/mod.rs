//! Core domain types and logic.

pub mod price_bar;
pub mod dataset;
pub mod indicator;
pub mod query;
pub mod session;
pub mod config_validation;
pub mod error;
