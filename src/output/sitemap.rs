//! Plain-text sitemap of one spider job

use crate::api::SpiderResponse;
use crate::output::OutputResult;
use chrono::{DateTime, Local};
use std::fs;
use std::path::Path;

/// Formats a sitemap listing crawled pages (with titles) and failed pages
///
/// # Arguments
///
/// * `seed` - The seed URL of the job
/// * `response` - The job summary
/// * `generated_at` - Timestamp printed in the header
pub fn format_sitemap(seed: &str, response: &SpiderResponse, generated_at: DateTime<Local>) -> String {
    let mut out = String::new();

    out.push_str(&format!("Sitemap for {}\n", seed));
    out.push_str(&format!("Generated on: {}\n", generated_at.to_rfc3339()));
    out.push_str(&format!(
        "Crawled: {}, Failed: {}, Max depth reached: {}\n",
        response.crawled_count, response.failed_count, response.max_depth_reached
    ));
    out.push_str(&"=".repeat(50));
    out.push_str("\n\n");

    out.push_str("Successfully crawled pages:\n");
    for (url, page) in &response.results {
        out.push_str(&format!("- {}\n", url));
        if let Some(title) = &page.metadata.title {
            out.push_str(&format!("    Title: {}\n", title));
        }
    }

    if !response.failed_urls.is_empty() {
        out.push_str("\nFailed pages:\n");
        for (url, error) in &response.failed_urls {
            out.push_str(&format!("- {}\n", url));
            out.push_str(&format!("    Error: {}\n", error));
        }
    }

    out
}

/// Writes the sitemap to `path`
pub fn write_sitemap(
    seed: &str,
    response: &SpiderResponse,
    generated_at: DateTime<Local>,
    path: &Path,
) -> OutputResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, format_sitemap(seed, response, generated_at))?;

    tracing::info!("Sitemap written to {}", path.display());
    Ok(())
}
