//! Domain types for Strata.
//!
//! This module contains the shared error taxonomy and result alias used by
//! the resolution pipeline.
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T>`](crate::domain::Result):
//!
//! ```rust
//! use strata::domain::{Result, StrataError};
//!
//! fn example() -> Result<()> {
//!     Err(StrataError::Configuration("bad document".to_string()))
//! }
//! ```
//!
//! Not-found conditions on optional configuration layers are deliberately not
//! part of the error taxonomy; they resolve to `None`/empty layers instead.

pub mod errors;
pub mod result;

pub use errors::StrataError;
pub use result::Result;
