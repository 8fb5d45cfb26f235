//! Supporting evidence recorded alongside the sub-scores.
//!
//! Each signal source owns its own details type. They stay separate while the
//! result moves through the engine and the cache, and are merged into one
//! flat JSON object only by [`AuditDetails::to_wire`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Tag field used by the per-source enums in their stored form.
const OUTCOME_TAG: &str = "outcome";

/// Timing and category numbers reported by the performance API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LighthouseMetrics {
    pub lighthouse_performance: u8,
    /// Mobile score before the floor of 10 is applied.
    pub lighthouse_mobile: u8,
    pub first_contentful_paint: String,
    pub largest_contentful_paint: String,
    pub speed_index: String,
    pub total_blocking_time: String,
    pub cumulative_layout_shift: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PerformanceDetails {
    Measured(LighthouseMetrics),
    /// Fell back to fixed scores; the note says why.
    Degraded {
        #[serde(rename = "pageSpeedError")]
        page_speed_error: String,
    },
}

impl PerformanceDetails {
    pub fn degraded(reason: impl Into<String>) -> Self {
        Self::Degraded { page_speed_error: reason.into() }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}

/// Which of the five key page categories a site links to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPages {
    pub about: bool,
    pub contact: bool,
    pub services: bool,
    pub hours: bool,
    pub booking: bool,
}

impl KeyPages {
    pub fn found(&self) -> usize {
        [self.about, self.contact, self.services, self.hours, self.booking]
            .into_iter()
            .filter(|found| *found)
            .count()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignSignals {
    pub has_viewport: bool,
    pub has_responsive_images: bool,
    pub no_flash: bool,
    #[serde(rename = "modernCSS")]
    pub modern_css: bool,
}

impl DesignSignals {
    pub fn present(&self) -> usize {
        [self.has_viewport, self.has_responsive_images, self.no_flash, self.modern_css]
            .into_iter()
            .filter(|signal| *signal)
            .count()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoChecks {
    pub has_title: bool,
    pub has_meta_description: bool,
    #[serde(rename = "hasH1")]
    pub has_h1: bool,
    pub has_alt_text: bool,
}

impl SeoChecks {
    pub fn passed(&self) -> usize {
        [self.has_title, self.has_meta_description, self.has_h1, self.has_alt_text]
            .into_iter()
            .filter(|check| *check)
            .count()
    }
}

/// Evidence gathered from a page that was fetched and parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageEvidence {
    pub http_status: u16,
    pub final_url: String,
    #[serde(rename = "hasSSL")]
    pub has_ssl: bool,
    pub total_images: usize,
    pub broken_images: usize,
    pub key_pages: KeyPages,
    pub modern_design: DesignSignals,
    pub seo: SeoChecks,
    #[serde(default)]
    pub page_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PageDetails {
    Fetched(PageEvidence),
    Unreachable {
        #[serde(rename = "fetchError")]
        fetch_error: String,
    },
}

impl PageDetails {
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self::Unreachable { fetch_error: reason.into() }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Unreachable { .. })
    }
}

/// Contact details scraped from a business website.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    pub email: Option<String>,
    pub owner_name: Option<String>,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
}

impl ContactInfo {
    /// True once both email and owner name are known.
    pub fn is_complete(&self) -> bool {
        self.email.is_some() && self.owner_name.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<PerformanceDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<PageDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<ContactInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuditDetails {
    /// True when either signal source fell back to fixed defaults.
    pub fn is_degraded(&self) -> bool {
        self.performance.as_ref().is_some_and(PerformanceDetails::is_degraded)
            || self.page.as_ref().is_some_and(PageDetails::is_degraded)
    }

    /// Flatten into the single JSON object consumers expect.
    pub fn to_wire(&self) -> Map<String, Value> {
        let mut map = Map::new();
        if let Some(performance) = &self.performance {
            merge_untagged(&mut map, performance);
        }
        if let Some(page) = &self.page {
            merge_untagged(&mut map, page);
        }
        if let Some(contact) = &self.contact
            && let Ok(value) = serde_json::to_value(contact)
        {
            map.insert("contact".into(), value);
        }
        if let Some(message) = &self.message {
            map.insert("message".into(), Value::String(message.clone()));
        }
        if let Some(error) = &self.error {
            map.insert("error".into(), Value::String(error.clone()));
        }
        map
    }
}

fn merge_untagged<T: Serialize>(map: &mut Map<String, Value>, value: &T) {
    if let Ok(Value::Object(fields)) = serde_json::to_value(value) {
        map.extend(fields.into_iter().filter(|(key, _)| key != OUTCOME_TAG));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evidence() -> PageEvidence {
        PageEvidence {
            http_status: 200,
            final_url: "https://example.com/".into(),
            has_ssl: true,
            total_images: 2,
            broken_images: 0,
            key_pages: KeyPages { about: true, contact: true, ..Default::default() },
            modern_design: DesignSignals { has_viewport: true, no_flash: true, ..Default::default() },
            seo: SeoChecks { has_title: true, ..Default::default() },
            page_title: Some("Joe's Diner".into()),
        }
    }

    #[test]
    fn test_counts() {
        let evidence = evidence();
        assert_eq!(evidence.key_pages.found(), 2);
        assert_eq!(evidence.modern_design.present(), 2);
        assert_eq!(evidence.seo.passed(), 1);
    }

    #[test]
    fn test_to_wire_merges_sources() {
        let details = AuditDetails {
            performance: Some(PerformanceDetails::degraded("API returned 500")),
            page: Some(PageDetails::Fetched(evidence())),
            ..Default::default()
        };

        let wire = details.to_wire();
        assert_eq!(wire["pageSpeedError"], "API returned 500");
        assert_eq!(wire["httpStatus"], 200);
        assert_eq!(wire["hasSSL"], true);
        assert_eq!(wire["pageTitle"], "Joe's Diner");
        assert_eq!(wire["keyPages"]["about"], true);
        assert_eq!(wire["modernDesign"]["modernCSS"], false);
        assert_eq!(wire["seo"]["hasH1"], false);
        assert!(!wire.contains_key(OUTCOME_TAG));
    }

    #[test]
    fn test_stored_form_round_trips() {
        let details = AuditDetails {
            performance: Some(PerformanceDetails::Measured(LighthouseMetrics {
                lighthouse_performance: 88,
                lighthouse_mobile: 5,
                first_contentful_paint: "1.2 s".into(),
                largest_contentful_paint: "2.0 s".into(),
                speed_index: "1.9 s".into(),
                total_blocking_time: "40 ms".into(),
                cumulative_layout_shift: "0.01".into(),
            })),
            page: Some(PageDetails::unreachable("connection refused")),
            ..Default::default()
        };

        let json = serde_json::to_string(&details).unwrap();
        let back: AuditDetails = serde_json::from_str(&json).unwrap();
        assert_eq!(back, details);
        assert!(back.is_degraded());
    }

    #[test]
    fn test_contact_complete() {
        let mut contact = ContactInfo { email: Some("joe@diner.com".into()), ..Default::default() };
        assert!(!contact.is_complete());
        contact.owner_name = Some("Joe Smith".into());
        assert!(contact.is_complete());
    }
}
