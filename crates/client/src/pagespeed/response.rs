//! PageSpeed Insights response types and normalization.

use serde::Deserialize;
use sitescout_core::audit::{LighthouseMetrics, PerformanceDetails};
use std::collections::HashMap;

use crate::signals::PerformanceSignals;

/// Lowest mobile score reported for a site the API did measure.
pub const MOBILE_SCORE_FLOOR: u8 = 10;

const NOT_AVAILABLE: &str = "N/A";

/// Raw response from the runPagespeed endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSpeedApiResponse {
    #[serde(default)]
    pub lighthouse_result: Option<LighthouseResult>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LighthouseResult {
    #[serde(default)]
    pub categories: Categories,
    #[serde(default)]
    pub audits: HashMap<String, LighthouseAudit>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Categories {
    #[serde(default)]
    pub performance: Option<CategoryScore>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CategoryScore {
    #[serde(default)]
    pub score: Option<f64>,
}

/// One Lighthouse audit. Both fields are null for audits that did not run.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LighthouseAudit {
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub display_value: Option<String>,
}

impl LighthouseResult {
    fn audit_score(&self, id: &str) -> Option<f64> {
        self.audits.get(id).and_then(|a| a.score)
    }

    fn display(&self, id: &str) -> String {
        self.audits
            .get(id)
            .and_then(|a| a.display_value.as_deref())
            .filter(|v| !v.is_empty())
            .unwrap_or(NOT_AVAILABLE)
            .to_string()
    }
}

/// Scale a 0..1 fraction to a 0..100 integer.
fn percent(fraction: f64) -> u8 {
    (fraction * 100.0).round().clamp(0.0, 100.0) as u8
}

impl From<PageSpeedApiResponse> for PerformanceSignals {
    /// Performance comes straight from the category score. Mobile is the
    /// average of the viewport, font-size and tap-target audits, with the
    /// latter two counted as half-passing when Lighthouse omits them.
    fn from(raw: PageSpeedApiResponse) -> Self {
        let lighthouse = raw.lighthouse_result.unwrap_or_default();

        let performance = percent(
            lighthouse
                .categories
                .performance
                .as_ref()
                .and_then(|c| c.score)
                .unwrap_or(0.0),
        );

        let viewport = lighthouse.audit_score("viewport").unwrap_or(0.0);
        let font_size = lighthouse.audit_score("font-size").unwrap_or(0.5);
        let tap_targets = lighthouse.audit_score("tap-targets").unwrap_or(0.5);
        let mobile = percent((viewport + font_size + tap_targets) / 3.0);

        let metrics = LighthouseMetrics {
            lighthouse_performance: performance,
            lighthouse_mobile: mobile,
            first_contentful_paint: lighthouse.display("first-contentful-paint"),
            largest_contentful_paint: lighthouse.display("largest-contentful-paint"),
            speed_index: lighthouse.display("speed-index"),
            total_blocking_time: lighthouse.display("total-blocking-time"),
            cumulative_layout_shift: lighthouse.display("cumulative-layout-shift"),
        };

        PerformanceSignals {
            performance_score: performance,
            mobile_score: mobile.max(MOBILE_SCORE_FLOOR),
            details: PerformanceDetails::Measured(metrics),
        }
    }
}
