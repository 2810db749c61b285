//! Core utilities for WorkKar
//!
//! This crate provides shared functionality used by the discovery pipeline,
//! the backend client and the command-line front end:
//!
//! - **Error handling**: Structured errors with codes, context, and recovery suggestions
//! - **Configuration**: TOML-based configuration with environment overrides and validation
//! - **Caching**: File-backed cache with an in-memory layer and TTLs
//! - **Resilience**: Retry backoff, circuit breaker, and token-bucket rate limiting
//!
//! # Example
//!
//! ```rust,no_run
//! use workkar_core::config::Config;
//!
//! let config = Config::load(None)?;
//! println!("Page size: {}", config.schema.discovery.page_size);
//! # Ok::<(), workkar_core::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod config;
pub mod error;
pub mod rate_limit;
pub mod retry;

pub use error::{Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::cache::{Cache, CacheConfig};
    pub use crate::config::{Config, ConfigSchema};
    pub use crate::error::{Error, ErrorCode, Result, ResultExt};
    pub use crate::rate_limit::{RateLimitConfig, RateLimiter};
    pub use crate::retry::{CircuitBreaker, RetryConfig};
}
