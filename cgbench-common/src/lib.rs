//! Shared foundation for the cgbench dashboard
//!
//! This crate provides the pieces every other cgbench crate depends on:
//! - The metric and sample types exchanged between runner, router and charts
//! - The workspace-wide error type and `Result` alias
//! - Dashboard and runner configuration with TOML loading

pub mod config;
pub mod error;
pub mod types;

pub use error::{DashboardError, Result};
pub use types::*;
