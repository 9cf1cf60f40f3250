//! catalog-report - PostgreSQL catalog and usage statistics export.
//!
//! This library exposes the core modules for use by the binary and the
//! integration tests.

pub mod config;
pub mod db;
pub mod driver;
pub mod emit;
pub mod error;
pub mod logging;
pub mod report;
