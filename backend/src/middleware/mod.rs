//! Request middleware.
//!
//! Purpose: Define middleware components for request lifecycle concerns such
//! as request correlation.

pub mod trace;

pub use trace::{RequestPath, Trace};
