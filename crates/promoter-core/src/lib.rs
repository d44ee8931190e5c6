//! Promotion engine for package-metadata repositories.
//!
//! Records declare the catalogs they belong to. Named policies move records
//! from one catalog set to another once they have dwelt in it long enough.
//! This crate decides which records are due and what they become; it is
//! free of filesystem walking, HTTP and terminal concerns.
//!
//! Records are processed one at a time with no locking, so two runs must not
//! operate on the same repository concurrently.

pub mod batch;
pub mod config;
pub mod dates;
pub mod eligibility;
pub mod error;
pub mod record;
pub mod selection;
pub mod store;

pub use error::{Error, Result};

#[cfg(test)]
mod tests;
