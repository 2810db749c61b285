//! CLI utilities for WorkKar tools
//!
//! Provides shared CLI functionality:
//! - Worker, distance and rating formatting
//! - Progress spinners
//! - Status messages

#![warn(missing_docs)]

pub mod output;
pub mod progress;
