//! render::metadata
//!
//! Idempotent icon and title injection into a map document.
//!
//! Injection is a two-pass rewrite: the first pass inspects `<head>`, the
//! second edits it. Running it any number of times yields the same document
//! as running it once.
//!
//! - An icon `<link>` is appended to `<head>` unless a `link[rel~=icon]`
//!   with the same `href` is already present.
//! - The first `<title>` in `<head>` has its text replaced; when there is no
//!   title, one is appended.

use std::path::Path;

use lol_html::html_content::ContentType;
use lol_html::{element, rewrite_str, RewriteStrSettings};

use super::artifact::{self, ArtifactInfo};
use super::{escape_html, RenderError};
use crate::core::config::{DEFAULT_ICON_HREF, DEFAULT_TITLE};

/// Page metadata to inject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub icon_href: String,
    pub title: String,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            icon_href: DEFAULT_ICON_HREF.to_string(),
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

impl Metadata {
    pub fn new(icon_href: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            icon_href: icon_href.into(),
            title: title.into(),
        }
    }
}

#[derive(Debug, Default)]
struct HeadScan {
    has_head: bool,
    has_icon: bool,
    has_title: bool,
}

fn scan(html: &str, metadata: &Metadata) -> Result<HeadScan, RenderError> {
    let mut has_head = false;
    let mut has_icon = false;
    let mut has_title = false;
    let escaped_href = escape_html(&metadata.icon_href);

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("head", |_el| {
                    has_head = true;
                    Ok(())
                }),
                element!("head link[rel~=icon]", |el| {
                    // Attribute values are reported as written, entities included.
                    if let Some(href) = el.get_attribute("href") {
                        if href == metadata.icon_href || href == escaped_href {
                            has_icon = true;
                        }
                    }
                    Ok(())
                }),
                element!("head > title", |_el| {
                    has_title = true;
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::new()
        },
    )
    .map_err(|e| RenderError::RewriteError(e.to_string()))?;

    Ok(HeadScan {
        has_head,
        has_icon,
        has_title,
    })
}

/// Inject `metadata` into an HTML document.
///
/// Returns [`RenderError::MissingHead`] when the document has no `<head>`.
pub fn inject_metadata(html: &str, metadata: &Metadata) -> Result<String, RenderError> {
    let found = scan(html, metadata)?;
    if !found.has_head {
        return Err(RenderError::MissingHead);
    }

    let icon_link = format!(
        r#"<link rel="icon" href="{}" />"#,
        escape_html(&metadata.icon_href)
    );
    let title_element = format!("<title>{}</title>", escape_html(&metadata.title));
    let mut head_done = false;
    let mut title_done = false;

    let rewritten = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("head", |el| {
                    if head_done {
                        return Ok(());
                    }
                    head_done = true;
                    if !found.has_icon {
                        el.append(&icon_link, ContentType::Html);
                    }
                    if !found.has_title {
                        el.append(&title_element, ContentType::Html);
                    }
                    Ok(())
                }),
                element!("head > title", |el| {
                    if !title_done {
                        title_done = true;
                        el.set_inner_content(&metadata.title, ContentType::Text);
                    }
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::new()
        },
    )
    .map_err(|e| RenderError::RewriteError(e.to_string()));
    rewritten
}

/// Inject `metadata` into the persisted document at `path`.
///
/// The file is rewritten atomically, and only when injection changed it.
pub fn inject_metadata_file(path: &Path, metadata: &Metadata) -> Result<ArtifactInfo, RenderError> {
    let current = artifact::read(path)?;
    let updated = inject_metadata(&current, metadata)?;

    if updated == current {
        tracing::debug!(path = %path.display(), "metadata already present");
        return Ok(ArtifactInfo {
            path: path.to_path_buf(),
            bytes: current.len(),
            digest: artifact::digest(&current),
        });
    }

    artifact::persist(path, &updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BARE: &str = "<html><head><meta charset=\"utf-8\"></head><body></body></html>";

    fn count(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    #[test]
    fn adds_icon_and_title() {
        let out = inject_metadata(BARE, &Metadata::default()).unwrap();
        assert_eq!(
            out,
            "<html><head><meta charset=\"utf-8\">\
             <link rel=\"icon\" href=\"/static/MSB_Logo_transparent.png\" />\
             <title>MSB Map</title></head><body></body></html>"
        );
    }

    #[test]
    fn injection_is_idempotent() {
        let metadata = Metadata::default();
        let once = inject_metadata(BARE, &metadata).unwrap();
        let twice = inject_metadata(&once, &metadata).unwrap();
        assert_eq!(once, twice);
        assert_eq!(count(&twice, "<title>"), 1);
        assert_eq!(count(&twice, "rel=\"icon\""), 1);
    }

    #[test]
    fn existing_title_is_replaced() {
        let html = "<html><head><title>Old</title></head><body></body></html>";
        let out = inject_metadata(html, &Metadata::new("/i.png", "New")).unwrap();
        assert!(out.contains("<title>New</title>"));
        assert!(!out.contains("Old"));
        assert_eq!(count(&out, "<title>"), 1);
    }

    #[test]
    fn other_icon_links_do_not_block_injection() {
        let html = r#"<html><head><link rel="shortcut icon" href="/other.ico"></head></html>"#;
        let out = inject_metadata(html, &Metadata::new("/i.png", "T")).unwrap();
        assert!(out.contains(r#"href="/other.ico""#));
        assert!(out.contains(r#"<link rel="icon" href="/i.png" />"#));
    }

    #[test]
    fn matching_icon_with_extra_rel_tokens_is_kept() {
        let html = r#"<html><head><link rel="shortcut icon" href="/i.png"></head></html>"#;
        let out = inject_metadata(html, &Metadata::new("/i.png", "T")).unwrap();
        assert_eq!(count(&out, "/i.png"), 1);
    }

    #[test]
    fn title_text_is_escaped() {
        let out = inject_metadata(BARE, &Metadata::new("/i.png", "A & <B>")).unwrap();
        assert!(out.contains("<title>A &amp; &lt;B&gt;</title>"));
        let again = inject_metadata(&out, &Metadata::new("/i.png", "A & <B>")).unwrap();
        assert_eq!(out, again);
    }

    #[test]
    fn icon_href_with_ampersand_is_idempotent() {
        let metadata = Metadata::new("/static/logo.png?v=1&size=32", "MSB Map");
        let once = inject_metadata(BARE, &metadata).unwrap();
        let twice = inject_metadata(&once, &metadata).unwrap();
        assert!(once.contains(r#"href="/static/logo.png?v=1&amp;size=32""#));
        assert_eq!(once, twice);
        assert_eq!(count(&twice, "rel=\"icon\""), 1);
    }

    #[test]
    fn unescaped_matching_icon_is_kept() {
        let html = r#"<html><head><link rel="icon" href="/i.png?a=1&b=2"></head></html>"#;
        let out = inject_metadata(html, &Metadata::new("/i.png?a=1&b=2", "T")).unwrap();
        assert_eq!(count(&out, "rel=\"icon\""), 1);
    }

    #[test]
    fn missing_head_is_an_error() {
        let result = inject_metadata("<p>fragment</p>", &Metadata::default());
        assert!(matches!(result, Err(RenderError::MissingHead)));
    }

    #[test]
    fn file_injection_rewrites_once() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("map.html");
        std::fs::write(&path, BARE).unwrap();

        let first = inject_metadata_file(&path, &Metadata::default()).unwrap();
        let second = inject_metadata_file(&path, &Metadata::default()).unwrap();

        assert_eq!(first.digest, second.digest);
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<title>MSB Map</title>"));
    }

    #[test]
    fn file_injection_missing_file() {
        let result = inject_metadata_file(Path::new("/nonexistent/map.html"), &Metadata::default());
        assert!(matches!(result, Err(RenderError::ReadError { .. })));
    }
}
