//! Key page detection from anchors.
//!
//! A category counts as present when any `<a>` on the page mentions one of
//! its keywords in the href or the link text. The match is a lowercase
//! substring match, so `/about-us` and "About Our Team" both count for
//! `about`.

use scraper::{ElementRef, Html};
use sitescout_core::audit::KeyPages;

use super::select_all;

const ABOUT: &[&str] = &["about", "about-us", "our-story", "who-we-are"];
const CONTACT: &[&str] = &["contact", "contact-us", "get-in-touch", "reach-us"];
const SERVICES: &[&str] = &["services", "menu", "products", "offerings", "what-we-do", "our-services"];
const HOURS: &[&str] = &["hours", "schedule", "business-hours", "open"];
const BOOKING: &[&str] = &["book", "booking", "appointment", "reserve", "order", "schedule"];

/// Raw-page markers that show contact details without a contact link.
const CONTACT_MARKERS: &[&str] = &["tel:", "email"];

/// Lowercased `href + " " + text` for one anchor.
fn anchor_haystack(anchor: &ElementRef<'_>) -> String {
    let href = anchor.value().attr("href").unwrap_or_default();
    let text = anchor.text().collect::<String>();
    format!("{} {}", href.to_lowercase(), text.to_lowercase())
}

fn mentions(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| haystack.contains(k))
}

/// Detect which key page categories `document` links to.
///
/// `html` is the raw source the document was parsed from; it is searched
/// for contact markers such as `tel:` links.
pub fn detect_key_pages(document: &Html, html: &str) -> KeyPages {
    let mut pages = KeyPages::default();

    for anchor in select_all(document, "a") {
        let haystack = anchor_haystack(&anchor);
        pages.about |= mentions(&haystack, ABOUT);
        pages.contact |= mentions(&haystack, CONTACT);
        pages.services |= mentions(&haystack, SERVICES);
        pages.hours |= mentions(&haystack, HOURS);
        pages.booking |= mentions(&haystack, BOOKING);
    }

    if !pages.contact {
        let lower = html.to_lowercase();
        pages.contact = mentions(&lower, CONTACT_MARKERS);
    }

    pages
}
