//! Image, design and SEO checks over a parsed page.

use scraper::Html;
use sitescout_core::audit::{DesignSignals, SeoChecks};

use super::{has_match, select_all};

/// `src` values that point nowhere.
const BROKEN_SRC: &[&str] = &["", "#", "undefined"];

const RESPONSIVE_MARKERS: &[&str] = &["max-width", "object-fit"];
const FLASH_MARKERS: &[&str] = &["<embed", "shockwave-flash", ".swf"];
const MODERN_CSS_MARKERS: &[&str] =
    &["flexbox", "display:flex", "display: flex", "grid", "@media", "tailwind", "bootstrap"];

/// Image counts used by the broken-resources and alt-text checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageCensus {
    pub total: usize,
    pub broken: usize,
    pub with_alt: usize,
}

impl ImageCensus {
    /// 100 minus the rounded broken percentage; 100 with no images.
    pub fn broken_resources_score(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        let pct = (self.broken as f64 / self.total as f64 * 100.0).round() as u8;
        100 - pct.min(100)
    }

    /// More than half the images carry alt text. Vacuously true with none.
    pub fn has_alt_text(&self) -> bool {
        self.total == 0 || self.with_alt * 2 > self.total
    }
}

/// Count every `<img>`; a missing `src` counts as empty.
pub fn census_images(document: &Html) -> ImageCensus {
    let mut census = ImageCensus::default();
    for img in select_all(document, "img") {
        let element = img.value();
        census.total += 1;
        if BROKEN_SRC.contains(&element.attr("src").unwrap_or_default().trim()) {
            census.broken += 1;
        }
        if element.attr("alt").is_some_and(|alt| !alt.trim().is_empty()) {
            census.with_alt += 1;
        }
    }
    census
}

/// Modern-design signals. Marker checks run against the raw source so
/// inline `<style>` blocks and class names are seen too.
pub fn design_signals(document: &Html, html: &str) -> DesignSignals {
    let contains_any = |markers: &[&str]| markers.iter().any(|m| html.contains(m));

    DesignSignals {
        has_viewport: has_match(document, r#"meta[name="viewport"]"#),
        has_responsive_images: has_match(document, "img[srcset]")
            || has_match(document, "picture")
            || contains_any(RESPONSIVE_MARKERS),
        no_flash: !contains_any(FLASH_MARKERS),
        modern_css: contains_any(MODERN_CSS_MARKERS) || has_match(document, r#"link[rel="stylesheet"]"#),
    }
}

/// Trimmed text of the first `<title>`, if non-empty.
pub fn page_title(document: &Html) -> Option<String> {
    select_all(document, "title")
        .first()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

pub fn seo_checks(document: &Html, title: Option<&str>, images: &ImageCensus) -> SeoChecks {
    let has_meta_description = select_all(document, r#"meta[name="description"]"#)
        .first()
        .and_then(|m| m.value().attr("content"))
        .is_some_and(|content| !content.trim().is_empty());

    SeoChecks {
        has_title: title.is_some(),
        has_meta_description,
        has_h1: has_match(document, "h1"),
        has_alt_text: images.has_alt_text(),
    }
}
