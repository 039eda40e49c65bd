//! The analysis side of ProReporter: asking a structured-completion service
//! about a dataset and folding its answers into a report's insights.
//!
//! - [`CompletionService`] is the seam to the language model;
//!   [`OpenAiClient`] implements it over HTTP.
//! - [`Dispatcher`] turns a dataset and a query into an
//!   [`Analysis`](proreporter_core::insight::Analysis), falling back to a
//!   canned answer on any failure.
//! - [`AnalysisSession`] runs chat turns per report, one at a time, and
//!   persists the result in the background.

pub mod completion;
pub mod dispatch;
pub mod error;
pub mod openai;
pub mod session;

pub use completion::{CompletionRequest, CompletionService};
pub use dispatch::Dispatcher;
pub use error::{CompletionError, SessionError};
pub use openai::{OpenAiClient, OpenAiConfig};
pub use session::{AnalysisSession, TurnOutcome};
