//! # Scuttle-Core Test Suite
//!
//! Cross-crate scenarios run against a fully wired node.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── flows.rs          # ingest → log → FSCK
//!     └── replication.rs    # contacts → trust graph → want-list
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p ssb-tests
//! cargo test -p ssb-tests integration::flows
//! ```

pub mod integration;
