//! Signet node: HTTP shell and process CLI around the ledger core

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod commands;
pub mod errors;
pub mod handlers;
pub mod models;

pub use errors::ApiError;
