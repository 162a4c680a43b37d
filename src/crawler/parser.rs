//! HTML parser for extracting links, media and metadata
//!
//! This module turns a fetched HTML document into the pieces of a
//! `PageResult`:
//! - Links, split into internal (same host as the page) and external
//! - Page title and `<meta>` description, keywords, author
//! - Images, videos and audio sources
//! - A cleaned copy of the body without scripts and styles
//! - Visible text blocks, used by the extraction strategies

use crate::crawler::page::{Link, MediaItem, PageLinks, PageMedia, PageMetadata};
use crate::url::host_key;
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

/// Elements dropped entirely from `cleaned_html`
const STRIPPED_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "iframe", "svg", "head", "template", "object", "embed",
];

/// Attributes kept on elements in `cleaned_html`
const KEPT_ATTRIBUTES: &[&str] = &["href", "src", "alt", "title"];

/// Elements whose text forms one extraction block
const BLOCK_SELECTOR: &str = "h1, h2, h3, h4, h5, h6, p, li, pre, blockquote, td, th";

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    pub metadata: PageMetadata,

    pub links: PageLinks,

    pub media: PageMedia,

    pub cleaned_html: String,

    /// Visible text blocks in document order
    pub blocks: Vec<String>,
}

impl ParsedPage {
    /// Absolute hrefs of internal links, in document order
    pub fn internal_hrefs(&self) -> Vec<String> {
        self.links.internal.iter().map(|l| l.href.clone()).collect()
    }
}

/// Parses HTML content and extracts links and metadata
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links
///
/// `rel="nofollow"` links are kept. Each href is reported once per page.
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `base_url` - The page URL, used to resolve relative links and to decide
///   which links are internal
///
/// # Example
///
/// ```
/// use sumi_spider::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.metadata.title, Some("Test".to_string()));
/// assert_eq!(parsed.links.internal[0].href, "https://example.com/page");
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    let metadata = PageMetadata {
        title: extract_title(&document),
        description: extract_meta(&document, "description"),
        keywords: extract_meta(&document, "keywords"),
        author: extract_meta(&document, "author"),
    };

    ParsedPage {
        metadata,
        links: extract_links(&document, base_url),
        media: extract_media(&document, base_url),
        cleaned_html: clean_html(&document),
        blocks: extract_blocks(&document),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

fn extract_meta(document: &Html, name: &str) -> Option<String> {
    let selector = Selector::parse(&format!("meta[name='{}'][content]", name)).ok()?;

    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("content"))
        .map(|content| content.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extracts all valid links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> PageLinks {
    let page_host = host_key(base_url);
    let mut links = PageLinks::default();
    let mut seen = std::collections::HashSet::new();

    let mut push = |href: String, text: String| {
        if !seen.insert(href.clone()) {
            return;
        }
        let is_internal = Url::parse(&href)
            .ok()
            .and_then(|u| host_key(&u))
            .is_some_and(|h| Some(&h) == page_host.as_ref());
        let link = Link { href, text };
        if is_internal {
            links.internal.push(link);
        } else {
            links.external.push(link);
        }
    };

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    let text = collapse_whitespace(&element.text().collect::<String>());
                    push(absolute_url, text);
                }
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    push(absolute_url, String::new());
                }
            }
        }
    }

    links
}

fn extract_media(document: &Html, base_url: &Url) -> PageMedia {
    PageMedia {
        images: collect_media(document, base_url, "img[src]"),
        videos: collect_media(document, base_url, "video[src], video source[src]"),
        audios: collect_media(document, base_url, "audio[src], audio source[src]"),
    }
}

fn collect_media(document: &Html, base_url: &Url, selector: &str) -> Vec<MediaItem> {
    let Ok(selector) = Selector::parse(selector) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| {
            let src = element.value().attr("src")?;
            let src = resolve_media(src, base_url)?;
            let alt = element
                .value()
                .attr("alt")
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty());
            Some(MediaItem { src, alt })
        })
        .collect()
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only hrefs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if matches!(absolute_url.scheme(), "http" | "https") => {
            Some(absolute_url.to_string())
        }
        _ => None,
    }
}

/// Media sources may be data URIs; those are kept out of the result
fn resolve_media(src: &str, base_url: &Url) -> Option<String> {
    let src = src.trim();
    if src.is_empty() || src.to_ascii_lowercase().starts_with("data:") {
        return None;
    }
    base_url
        .join(src)
        .ok()
        .filter(|u| matches!(u.scheme(), "http" | "https"))
        .map(|u| u.to_string())
}

/// Text of every block-level element, whitespace collapsed, empties dropped
fn extract_blocks(document: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse(BLOCK_SELECTOR) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .map(|element| collapse_whitespace(&element.text().collect::<Vec<_>>().join(" ")))
        .filter(|text| !text.is_empty())
        .collect()
}

/// Serializes the body (or the whole document) without stripped elements
fn clean_html(document: &Html) -> String {
    let root = Selector::parse("body")
        .ok()
        .and_then(|s| document.select(&s).next())
        .unwrap_or_else(|| document.root_element());

    let mut out = String::new();
    write_element(root, &mut out);
    out
}

fn write_element(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    if STRIPPED_ELEMENTS.contains(&name) {
        return;
    }

    out.push('<');
    out.push_str(name);
    for (attr, value) in element.value().attrs() {
        if KEPT_ATTRIBUTES.contains(&attr) {
            out.push(' ');
            out.push_str(attr);
            out.push_str("=\"");
            out.push_str(&escape(value, true));
            out.push('"');
        }
    }
    out.push('>');

    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                if !text.trim().is_empty() {
                    out.push_str(&escape(text, false));
                }
            }
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    write_element(child_element, out);
                }
            }
            _ => {}
        }
    }

    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn escape(text: &str, in_attribute: bool) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' if in_attribute => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
