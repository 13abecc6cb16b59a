//! visitd core - shared domain types for the visit tracker daemon.
//!
//! This crate provides the types shared between the daemon and its tests:
//! - `visit` - visit records and the aggregated counters
//! - `clock` - the site-local timezone and hour-bucket labels
//! - `config` - mail relay settings read from the environment
//!
//! All production code follows the panic-free policy: no `.unwrap()`,
//! `.expect()`, `panic!()`, `unreachable!()`, or `todo!()` outside tests
//! and compile-time constants.

pub mod clock;
pub mod config;
pub mod error;
pub mod visit;

// Re-exports for convenience
pub use clock::{hour_label, local_now, SITE_TZ};
pub use config::MailConfig;
pub use error::ConfigError;
pub use visit::{VisitCounters, VisitRecord};
