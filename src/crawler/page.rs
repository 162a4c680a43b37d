//! Page-result types returned by a fetch and echoed in the response `results`

use serde::{Deserialize, Serialize};

/// Everything the spider keeps about one successfully fetched page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    /// Final URL after redirects
    pub url: String,

    /// Raw HTML body
    pub html: String,

    pub success: bool,

    pub status_code: Option<u16>,

    /// HTML with scripts, styles and presentational attributes stripped
    pub cleaned_html: Option<String>,

    pub links: PageLinks,

    pub media: PageMedia,

    /// Base64 screenshot; always `None` without a rendering backend
    pub screenshot: Option<String>,

    /// Output of the selected extraction strategy (a JSON string)
    pub extracted_content: Option<String>,

    pub metadata: PageMetadata,
}

/// Links found on a page, split by whether they share the page's host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageLinks {
    pub internal: Vec<Link>,
    pub external: Vec<Link>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Absolute URL
    pub href: String,
    /// Anchor text, whitespace collapsed
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMedia {
    pub images: Vec<MediaItem>,
    pub videos: Vec<MediaItem>,
    pub audios: Vec<MediaItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pub src: String,
    pub alt: Option<String>,
}

/// Document metadata from `<title>` and `<meta name=...>`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub author: Option<String>,
}
