use crate::api::SpiderResponse;
use std::collections::BTreeMap;
use std::time::Duration;

/// Formats the end-of-job summary shown by the CLI
///
/// `elapsed` is the wall-clock time the spider request took.
pub fn format_summary(response: &SpiderResponse, elapsed: Duration) -> String {
    let mut out = String::new();
    let total = response.crawled_count + response.failed_count;

    out.push_str("=== Spider Summary ===\n\n");
    out.push_str(&format!("  Pages crawled: {}\n", response.crawled_count));
    out.push_str(&format!("  Pages failed: {}\n", response.failed_count));
    out.push_str(&format!("  Max depth reached: {}\n", response.max_depth_reached));
    out.push_str(&format!("  Duration: {:.2}s\n", elapsed.as_secs_f64()));

    if total > 0 {
        let rate = response.crawled_count as f64 / total as f64 * 100.0;
        out.push_str(&format!("  Success rate: {:.1}%\n", rate));
    }

    if !response.failed_urls.is_empty() {
        out.push_str("\nErrors:\n");
        let mut by_reason: BTreeMap<&str, usize> = BTreeMap::new();
        for reason in response.failed_urls.values() {
            *by_reason.entry(reason.as_str()).or_default() += 1;
        }

        let mut counts: Vec<_> = by_reason.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        for (reason, count) in counts {
            out.push_str(&format!("  {}: {}\n", reason, count));
        }
    }

    out
}

/// Prints the end-of-job summary to stdout
pub fn print_summary(response: &SpiderResponse, elapsed: Duration) {
    print!("{}", format_summary(response, elapsed));
}
