//! # Domain Layer
//!
//! - `validator`: the pure next-message transition shared with the offline checker
//! - `errors`: log and ingest error taxonomy

pub mod errors;
pub mod validator;
