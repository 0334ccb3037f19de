//! # Feed Validation Subsystem (SSB-03)
//!
//! Turns verified messages into sequentially appended log entries.
//!
//! ## Pipeline
//!
//! ```text
//! raw bytes ─→ FormatCodec.decode ─→ verify ─→ validate_next(state, msg)
//!                                                   │
//!                         Accepted ─→ append main log ─→ append feed index ─→ advance
//!                         Skip     ─→ IngestOutcome::Skipped
//!                         Reject   ─→ IngestError::SequenceViolation
//! ```
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): `validate_next`, feed state, errors
//! - **Ports Layer** (`ports/`): `FeedIngestApi` (inbound), `AppendOnlyLog`
//!   and `MultiLog` (outbound)
//! - **Adapters** (`adapters/`): in-memory logs
//! - **Service Layer** (`service.rs`): `FeedIngestService`

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{InMemoryLog, InMemoryMultiLog};
pub use domain::errors::{IngestError, LogError};
pub use domain::validator::{validate_next, Decision, FeedState, RejectReason, ValidatorState};
pub use ports::inbound::{FeedIngestApi, IngestOutcome};
pub use ports::outbound::{AppendOnlyLog, LogStream, MultiLog};
pub use service::FeedIngestService;
