//! # Domain Layer
//!
//! Pure canonicalization logic, no I/O.

pub mod errors;
pub mod parser;
pub mod printer;
pub mod v8;
pub mod value;
