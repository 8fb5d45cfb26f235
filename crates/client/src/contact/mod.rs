//! Contact detail scraping for lead follow-up.
//!
//! Off by default. When enabled it runs beside the two signal sources and
//! never touches the sub-scores: whatever it finds lands in
//! `details.contact`, and every failure is swallowed.

use async_trait::async_trait;
use regex::Regex;
use sitescout_core::audit::ContactInfo;
use sitescout_core::{AppConfig, Error};
use std::sync::LazyLock;
use url::Url;

use crate::fetch::{FetchClient, FetchConfig};
use crate::signals::ContactSource;

/// Pages probed on the site's origin when the homepage is not enough.
pub const PROBE_PATHS: &[&str] = &["/about", "/contact", "/about-us", "/contact-us"];

/// Fragments that mark an address as a tracker, asset or placeholder.
const EMAIL_BLOCKLIST: &[&str] =
    &["example.com", "sentry", "webpack", ".png", ".jpg", "wixpress", "schema.org", "protection"];

static RE_EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("email regex compiles")
});
static RE_MAILTO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"mailto:([a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,})").expect("mailto regex compiles")
});
static RE_OWNER: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        r"(?i)(?:owner|founder|proprietor|ceo|president|operated by|owned by)[:\s]*([A-Z][a-z]+ [A-Z][a-z]+)",
        r"(?:Dr\.|Dr)\s+([A-Z][a-z]+ [A-Z][a-z]+)",
        r"(?i)(?:meet|about)\s+(?:the\s+)?(?:owner|founder)?[:\s]*([A-Z][a-z]+ [A-Z][a-z]+)",
    ]
    .map(|pattern| Regex::new(pattern).expect("owner regex compiles"))
});
static RE_FACEBOOK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)href=["'](https?://(?:www\.)?facebook\.com/[^"'\s>]+)"#).expect("facebook regex compiles")
});
static RE_INSTAGRAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)href=["'](https?://(?:www\.)?instagram\.com/[^"'\s>]+)"#).expect("instagram regex compiles")
});

fn first_email(html: &str) -> Option<String> {
    RE_EMAIL
        .find_iter(html)
        .map(|m| m.as_str())
        .find(|email| !EMAIL_BLOCKLIST.iter().any(|blocked| email.contains(blocked)))
        .or_else(|| RE_MAILTO.captures(html).and_then(|c| c.get(1)).map(|m| m.as_str()))
        .map(String::from)
}

fn owner_name(html: &str) -> Option<String> {
    RE_OWNER
        .iter()
        .find_map(|re| re.captures(html).and_then(|c| c.get(1)))
        .map(|m| m.as_str().trim().to_string())
}

fn first_capture(re: &Regex, html: &str) -> Option<String> {
    re.captures(html).and_then(|c| c.get(1)).map(|m| m.as_str().to_string())
}

/// Fill whichever fields of `info` are still empty from `html`.
pub fn scan(html: &str, info: &mut ContactInfo) {
    if info.email.is_none() {
        info.email = first_email(html);
    }
    if info.owner_name.is_none() {
        info.owner_name = owner_name(html);
    }
    if info.facebook.is_none() {
        info.facebook = first_capture(&RE_FACEBOOK, html);
    }
    if info.instagram.is_none() {
        info.instagram = first_capture(&RE_INSTAGRAM, html);
    }
}

/// [`ContactSource`] that reads the homepage and then common about/contact pages.
#[derive(Debug, Clone)]
pub struct ContactExtractor {
    client: FetchClient,
}

impl ContactExtractor {
    pub fn new(client: FetchClient) -> Self {
        Self { client }
    }

    /// Extractor using the contact timeout from `config`.
    pub fn from_app(config: &AppConfig) -> Result<Self, Error> {
        let fetch = FetchConfig::from_app(config).with_timeout(config.contact_timeout());
        Ok(Self::new(FetchClient::new(fetch)?))
    }

    /// Body of a 2xx response, or `None` for anything else.
    async fn page(&self, url: &Url) -> Option<String> {
        match self.client.fetch(url).await {
            Ok(response) if response.status.is_success() => Some(response.text()),
            Ok(response) => {
                tracing::debug!(url = %url, status = response.status.as_u16(), "skipping contact probe");
                None
            }
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "contact probe failed");
                None
            }
        }
    }
}

#[async_trait]
impl ContactSource for ContactExtractor {
    async fn extract(&self, url: &Url) -> ContactInfo {
        let mut info = ContactInfo::default();

        if let Some(html) = self.page(url).await {
            scan(&html, &mut info);
        }

        for path in PROBE_PATHS {
            if info.is_complete() {
                break;
            }
            let Ok(probe) = url.join(path) else { continue };
            if let Some(html) = self.page(&probe).await {
                scan(&html, &mut info);
            }
        }

        tracing::debug!(
            url = %url,
            email = info.email.is_some(),
            owner = info.owner_name.is_some(),
            "contact extraction finished"
        );

        info
    }
}
