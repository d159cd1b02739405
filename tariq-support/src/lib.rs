//! # Tariq Support
//!
//! Shared utilities for the Tariq crates.
//!
//! This crate provides:
//! - Word splitting for method names ([`naming`])
//! - Text rendering for diagnostics and route tables ([`rendering`])

pub mod naming;
pub mod rendering;
