//! MedAuth database bootstrap.
//!
//! This crate owns everything that happens between reading the MongoDB connection
//! string from the environment and handing a ready database handle to the rest of
//! the MedAuth services:
//!
//! - [`utils::mongo_uri`] percent-encodes the credential segment of the connection string
//! - [`core::connection::ConnectionCache`] connects once and caches the handle
//! - [`schema::reconciler`] converges the secondary indexes of the auth collections
//!   (patients, doctors, OTP codes, sessions and pending sign-ups) to their canonical
//!   definitions, dropping indexes left behind by the old driver-default naming

pub mod cli;
pub mod core;
pub mod error;
pub mod schema;
pub mod types;
pub mod utils;

#[cfg(test)]
pub mod tests;

// Re-export commonly used item
pub use error::{MedauthError, MedauthResult};
