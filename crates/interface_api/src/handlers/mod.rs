//! Request handlers

pub mod clients;
pub mod expenses;
pub mod health;
pub mod invoices;
pub mod recurring;
pub mod settings;
pub mod templates;
