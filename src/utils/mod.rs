//! Conversion and formatting helpers

pub mod decimal;
pub mod helper;

pub use decimal::to_decimal;
