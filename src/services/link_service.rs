use url::Url;

/// Schemes that run code when navigated to.
const SCRIPT_SCHEMES: &[&str] = &["javascript", "vbscript", "data"];

/// Schemes the app hands to the system browser.
const EXTERNAL_SCHEMES: &[&str] = &["http", "https", "mailto", "tel"];

/// Returns the trimmed href if it can be rendered as a link.
///
/// Empty hrefs and script-capable schemes yield `None`. Relative references
/// are kept; the webview resolves them.
pub fn sanitize_href(href: &str) -> Option<&str> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    match Url::parse(href) {
        Ok(url) if SCRIPT_SCHEMES.contains(&url.scheme()) => None,
        _ => Some(href),
    }
}

/// Returns the absolute URL the `open_link` command may pass to the system
/// browser, or `None` if it must not be opened.
pub fn external_target(href: &str) -> Option<String> {
    let href = sanitize_href(href)?;
    let url = Url::parse(href).ok()?;

    if EXTERNAL_SCHEMES.contains(&url.scheme()) {
        Some(url.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_script_hrefs() {
        assert_eq!(sanitize_href(""), None);
        assert_eq!(sanitize_href("   "), None);
        assert_eq!(sanitize_href("javascript:alert(1)"), None);
        assert_eq!(sanitize_href(" JavaScript:alert(1)"), None);
        assert_eq!(sanitize_href("data:text/html,<script>x</script>"), None);
    }

    #[test]
    fn keeps_regular_hrefs() {
        assert_eq!(sanitize_href("https://krisha.kz/a/1"), Some("https://krisha.kz/a/1"));
        assert_eq!(sanitize_href("/listing/42"), Some("/listing/42"));
    }

    #[test]
    fn external_target_requires_absolute_web_url() {
        assert_eq!(
            external_target("https://krisha.kz/a/1").as_deref(),
            Some("https://krisha.kz/a/1")
        );
        assert_eq!(external_target("tel:+77071234569").as_deref(), Some("tel:+77071234569"));
        assert_eq!(external_target("/listing/42"), None);
        assert_eq!(external_target("file:///etc/passwd"), None);
        assert_eq!(external_target("javascript:alert(1)"), None);
    }
}
