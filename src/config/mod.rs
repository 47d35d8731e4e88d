//! Configuration module for Site-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use site_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Per-minute ceiling: {}", config.rate_limit.per_minute);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, ExtractorConfig, OutputConfig, RateLimitConfig, RateLimitedPolicy, RetryConfig,
    RunConfig, SourceConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
