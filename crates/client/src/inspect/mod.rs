//! Page signal source: fetch a site and judge its static HTML.
//!
//! ### Sub-scores
//! - **ssl**: 100 if the final (post-redirect) URL is https, else 0
//! - **brokenResources**: share of `<img>` tags with a usable `src`
//! - **keyPages**: about/contact/services/hours/booking links, 20 points each
//! - **modernDesign**: viewport, responsive images, no Flash, modern CSS; 25 each
//! - **seo**: title, meta description, h1, alt text; 25 each
//!
//! Scripts are never executed. A page that cannot be fetched falls back to
//! the fixed scores of [`PageSignals::unreachable`].

pub mod key_pages;
pub mod markup;

pub use key_pages::detect_key_pages;
pub use markup::{ImageCensus, census_images, design_signals, page_title, seo_checks};

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use sitescout_core::Error;
use sitescout_core::audit::{PageDetails, PageEvidence};
use url::Url;

use crate::fetch::{FetchClient, FetchConfig};
use crate::signals::{PageSignals, PageSource};

/// Elements matching `css`, or none if the selector does not parse.
pub(crate) fn select_all<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

pub(crate) fn has_match(document: &Html, css: &str) -> bool {
    Selector::parse(css).is_ok_and(|selector| document.select(&selector).next().is_some())
}

/// Share of `part` in `whole` as a 0..100 score.
fn ratio_score(part: usize, whole: usize) -> u8 {
    (part as f64 / whole as f64 * 100.0).round() as u8
}

/// Score an already-fetched page.
pub fn analyze(html: &str, final_url: &Url, http_status: u16) -> PageSignals {
    let document = Html::parse_document(html);

    let has_ssl = final_url.scheme() == "https";
    let images = census_images(&document);
    let key_pages = detect_key_pages(&document, html);
    let modern_design = design_signals(&document, html);
    let title = page_title(&document);
    let seo = seo_checks(&document, title.as_deref(), &images);

    PageSignals {
        ssl: if has_ssl { 100 } else { 0 },
        broken_resources: images.broken_resources_score(),
        key_pages: ratio_score(key_pages.found(), 5),
        modern_design: ratio_score(modern_design.present(), 4),
        seo: ratio_score(seo.passed(), 4),
        details: PageDetails::Fetched(PageEvidence {
            http_status,
            final_url: final_url.to_string(),
            has_ssl,
            total_images: images.total,
            broken_images: images.broken,
            key_pages,
            modern_design,
            seo,
            page_title: title,
        }),
    }
}

/// [`PageSource`] backed by a direct HTTP fetch.
#[derive(Debug, Clone)]
pub struct PageInspector {
    client: FetchClient,
}

impl PageInspector {
    pub fn new(client: FetchClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: FetchConfig) -> Result<Self, Error> {
        Ok(Self::new(FetchClient::new(config)?))
    }
}

#[async_trait]
impl PageSource for PageInspector {
    async fn inspect(&self, url: &Url) -> PageSignals {
        match self.client.fetch(url).await {
            Ok(response) => {
                if !response.status.is_success() {
                    tracing::debug!(url = %url, status = response.status.as_u16(), "analyzing non-2xx page");
                }
                analyze(&response.text(), &response.final_url, response.status.as_u16())
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "page fetch failed, using fallback scores");
                PageSignals::unreachable(url, e.to_string())
            }
        }
    }
}
