//! visitd - web visit tracker daemon.
//!
//! Records hits to a site, aggregates counts per hour, and emails a daily
//! summary report at 18:00 site-local time.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐   record_visit     ┌──────────────────┐
//! │ HTTP handlers │───────────────────▶│  VisitRegistry   │
//! │ (axum routes) │   snapshot         │ Mutex<Counters>  │
//! └───────┬───────┘                    └────────▲─────────┘
//!         │ send (manual trigger)              │ drain_and_reset (daily)
//!         ▼                                    │
//! ┌───────────────┐                   ┌────────┴─────────┐
//! │ ReportSender  │◀──────────────────│    Scheduler     │
//! │ (SMTP relay)  │       send        │  (18:00 local)   │
//! └───────────────┘                   └──────────────────┘
//! ```
//!
//! The registry lock is never held across I/O: both report paths operate
//! on a copy of the counters obtained under the lock.
//!
//! # Panic-Free Guarantees
//!
//! All production code in this crate avoids `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, and `todo!()`; fallible operations
//! return `Result` or fall back via `unwrap_or`-style handling.

pub mod http;
pub mod registry;
pub mod report;
pub mod scheduler;
