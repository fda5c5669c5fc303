//! Test Utilities Crate
//!
//! Shared test infrastructure, fixtures, and helpers for the billing
//! workspace test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built test data for common entities
//! - `builders`: Builder patterns for templates, invoice requests and stored invoices
//! - `database`: Postgres test containers and in-memory port wiring
//! - `assertions`: Custom assertion helpers for domain types
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
