//! CLI command implementations

pub mod commands;

pub use commands::{cast, inspect, validate, watch, CastRequest, ValidateRequest};
