//! Output module for spider results
//!
//! This module handles:
//! - Writing the full response JSON of a job
//! - Generating a plain-text sitemap of crawled and failed pages
//! - Printing a short summary to stdout

mod results;
mod sitemap;
mod summary;

pub use results::{write_results_json, OutputPaths};
pub use sitemap::{format_sitemap, write_sitemap};
pub use summary::{format_summary, print_summary};

use thiserror::Error;

/// Output-specific errors
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for output operations
pub type OutputResult<T> = Result<T, OutputError>;
