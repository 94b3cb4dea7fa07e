//! Shared building blocks for the realtime workspace.
//!
//! Every error enum in the workspace records where it was raised using
//! [`ErrorLocation`], so log lines point straight at the failing call site.

pub mod error_location;

pub use error_location::ErrorLocation;
