//! URL handling module for Sumi-Spider
//!
//! This module provides URL normalization, host extraction and the crawl
//! eligibility classifier.

mod classifier;
mod domain;
mod normalize;

pub use classifier::{UrlClassification, UrlClassifier};
pub use domain::{extract_domain, host_key};
pub use normalize::{normalize_parsed, normalize_url};
