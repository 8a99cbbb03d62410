//! # epass-fixtures — Test Fixture Providers
//!
//! Sample passport data for tests and demos. The canonicalization pipeline
//! never calls into this crate; it only consumes the records produced here.
//!
//! - [`SyntheticPassport`]: seeded generator of internally consistent TD3
//!   records (valid check digits, matching security object, mock signature).
//! - [`Mutation`]: single-byte corruptions for negative tests.
//! - [`CachedProvider`]: generate once, reuse from disk.

pub mod cache;
pub mod error;
pub mod mutation;
pub mod synthetic;

pub use cache::CachedProvider;
pub use error::FixtureError;
pub use mutation::Mutation;
pub use synthetic::SyntheticPassport;

use epass_circuit::PassportRecord;

/// Source of passport records for tests.
pub trait FixtureProvider {
    /// Produce one record.
    fn passport(&self) -> Result<PassportRecord, FixtureError>;
}
