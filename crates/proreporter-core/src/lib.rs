//! Core types and trait definitions for ProReporter.
//!
//! This crate is deliberately free of HTTP and database dependencies. It holds
//! the report data model, the insight accumulator, and the [`ReportStore`]
//! abstraction that storage backends implement.
//!
//! [`ReportStore`]: store::ReportStore

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod accumulate;
pub mod context;
pub mod dataset;
pub mod error;
pub mod insight;
pub mod report;
pub mod store;

pub use context::Caller;
pub use error::{Error, Result};
