//! # hc-core
//!
//! Shared error type for the histcfg workspace.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;

pub use error::{Error, Result};
