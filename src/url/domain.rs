use url::Url;

/// Extracts the domain from a URL
///
/// Returns the lowercase host portion, or `None` for URLs without a host.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_spider::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Extracts the host plus explicit port, used for exact-origin comparison
///
/// Default ports are dropped by the `url` crate, so `https://a.com:443/` and
/// `https://a.com/` produce the same key.
///
/// ```
/// use url::Url;
/// use sumi_spider::url::host_key;
///
/// let url = Url::parse("http://127.0.0.1:8080/page").unwrap();
/// assert_eq!(host_key(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn host_key(url: &Url) -> Option<String> {
    let domain = extract_domain(url)?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", domain, port),
        None => domain,
    })
}
