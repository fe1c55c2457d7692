// This module holds the infrastructure shared by every frontend and the runtime: the error
// types (contract violations only, guest-data conditions are never errors), the translation
// options consulted by translators and the dispatcher, and the statistics counters reported
// by the irdump tool.

//! Shared infrastructure.
//!
//! # Components
//!
//! ## Errors (`error`)
//! - [`TranslateError`] for IR contract violations
//! - [`DispatchError`] for the dispatch loop
//!
//! ## Configuration (`config`)
//! - [`TranslationOptions`] with block limits, the UNPREDICTABLE policy and
//!   coprocessor capabilities
//!
//! ## Statistics (`stats`)
//! - [`TranslationStats`], [`CacheStats`] and [`DispatchStats`]

pub mod config;
pub mod error;
pub mod stats;

pub use config::{TranslationOptions, UnpredictablePolicy};
pub use error::{DispatchError, TranslateError, TranslateResult};
pub use stats::{CacheStats, DispatchStats, TranslationStats};
