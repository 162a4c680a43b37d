//! Configuration module for Sumi-Spider
//!
//! This module handles loading, parsing, and validating the TOML service
//! configuration. Every section has defaults, so an empty file is valid.
//!
//! # Example
//!
//! ```no_run
//! use sumi_spider::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("spider.toml")).unwrap();
//! println!("Default max depth: {}", config.spider.default_max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    AuthConfig, Config, ExtractionSettings, LlmConfig, SpiderConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
