//! HTML parser for search result and photo detail pages
//!
//! This module handles parsing HTML content to extract:
//! - Detail page links, one per result card on a search page
//! - The aircraft type text and full-size image URL of a detail page

use scraper::{Html, Selector};
use url::Url;

/// A result card on a search page
const RESULT_CARD: &str = "div.resultPreview";

/// Container whose last link holds the aircraft type on a detail page
const TYPE_SECTION: &str = "div.pib-section-content-left";

/// The main photo on a detail page
const IMAGE_WRAPPER_IMG: &str = "div.pdp-image-wrapper img";

/// What a detail page yields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailEntry {
    /// Free-text aircraft type, e.g. "Boeing 737-8AS"
    pub plane_type: String,

    /// Absolute URL of the photo
    pub image_url: String,
}

/// Extracts detail page links from a search results page
///
/// Each result card contributes the first `a[href]` inside it, resolved
/// against `base_url`. Cards without a usable link are skipped.
///
/// # Example
///
/// ```
/// use plane_harvest::crawler::extract_detail_links;
/// use url::Url;
///
/// let html = r#"<div class="resultPreview"><a href="/photo/123">x</a></div>"#;
/// let base = Url::parse("https://photos.example.com").unwrap();
/// assert_eq!(
///     extract_detail_links(html, &base),
///     vec!["https://photos.example.com/photo/123".to_string()]
/// );
/// ```
pub fn extract_detail_links(html: &str, base_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);

    let (Ok(card_selector), Ok(link_selector)) =
        (Selector::parse(RESULT_CARD), Selector::parse("a[href]"))
    else {
        return Vec::new();
    };

    document
        .select(&card_selector)
        .filter_map(|card| {
            card.select(&link_selector)
                .next()
                .and_then(|a| a.value().attr("href"))
                .and_then(|href| resolve_link(href, base_url))
        })
        .collect()
}

/// Extracts the aircraft type and image URL from a photo detail page
///
/// Returns `None` when either piece is missing; such pages are skipped
/// rather than treated as errors.
pub fn parse_detail_page(html: &str, page_url: &Url) -> Option<DetailEntry> {
    let document = Html::parse_document(html);

    let plane_type = extract_plane_type(&document)?;
    let image_url = extract_image_url(&document, page_url)?;

    Some(DetailEntry {
        plane_type,
        image_url,
    })
}

/// The type is the text of the last link in the info section
fn extract_plane_type(document: &Html) -> Option<String> {
    let section_selector = Selector::parse(TYPE_SECTION).ok()?;
    let link_selector = Selector::parse("a[href]").ok()?;

    let section = document.select(&section_selector).next()?;
    section
        .select(&link_selector)
        .last()
        .map(|a| a.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_image_url(document: &Html, page_url: &Url) -> Option<String> {
    let img_selector = Selector::parse(IMAGE_WRAPPER_IMG).ok()?;

    document
        .select(&img_selector)
        .next()
        .and_then(|img| img.value().attr("src"))
        .and_then(|src| resolve_link(src, page_url))
}

/// Resolves a link to an absolute HTTP(S) URL
///
/// Returns None for empty links, fragments, special schemes, and anything
/// that does not resolve to http or https.
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:") || href.starts_with("mailto:") || href.starts_with("data:") {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
        Some(absolute_url.to_string())
    } else {
        None
    }
}
