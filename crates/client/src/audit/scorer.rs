//! Weighted combination of the seven sub-scores.

use std::collections::BTreeMap;

use sitescout_core::audit::{AuditDetails, AuditResult, AuditStatus, Category, SubScore};
use url::Url;

use crate::signals::{PageSignals, PerformanceSignals};

/// Build the audited result for one URL. Pure; degraded inputs score the
/// same way as measured ones and are only visible through `details`.
pub fn score(
    correlation_id: impl Into<String>, normalized_url: &Url, perf: PerformanceSignals, page: PageSignals,
) -> AuditResult {
    let sub_scores: BTreeMap<String, SubScore> = [
        (Category::Performance, perf.performance_score),
        (Category::Mobile, perf.mobile_score),
        (Category::Ssl, page.ssl),
        (Category::BrokenResources, page.broken_resources),
        (Category::KeyPages, page.key_pages),
        (Category::ModernDesign, page.modern_design),
        (Category::Seo, page.seo),
    ]
    .into_iter()
    .map(|(category, value)| (category.key().to_string(), SubScore::new(category, value)))
    .collect();

    AuditResult {
        correlation_id: correlation_id.into(),
        site_score: site_score(sub_scores.values()),
        status: AuditStatus::Audited,
        sub_scores,
        details: AuditDetails { performance: Some(perf.details), page: Some(page.details), ..Default::default() },
        normalized_url: Some(normalized_url.to_string()),
    }
}

/// `round(Σ score × weight)`, kept within 0..=100.
pub fn site_score<'a>(sub_scores: impl IntoIterator<Item = &'a SubScore>) -> u8 {
    let total: f64 = sub_scores.into_iter().map(SubScore::weighted).sum();
    total.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitescout_core::audit::{PageDetails, PerformanceDetails};

    fn perf(performance_score: u8, mobile_score: u8) -> PerformanceSignals {
        PerformanceSignals { performance_score, mobile_score, details: PerformanceDetails::degraded("test") }
    }

    fn page(values: [u8; 5]) -> PageSignals {
        let [ssl, broken_resources, key_pages, modern_design, seo] = values;
        PageSignals { ssl, broken_resources, key_pages, modern_design, seo, details: PageDetails::unreachable("test") }
    }

    fn url() -> Url {
        Url::parse("https://joes-diner.example/").unwrap()
    }

    #[test]
    fn test_all_hundreds() {
        let result = score("biz", &url(), perf(100, 100), page([100; 5]));
        assert_eq!(result.site_score, 100);
        assert_eq!(result.status, AuditStatus::Audited);
        assert_eq!(result.sub_scores.len(), 7);
        assert_eq!(result.normalized_url.as_deref(), Some("https://joes-diner.example/"));
    }

    #[test]
    fn test_all_zeros() {
        assert_eq!(score("biz", &url(), perf(0, 0), page([0; 5])).site_score, 0);
    }

    #[test]
    fn test_weighted_sum() {
        // 80*.25 + 60*.20 + 100*.10 + 75*.10 + 40*.15 + 50*.10 + 25*.10 = 63
        let result = score("biz", &url(), perf(80, 60), page([100, 75, 40, 50, 25]));
        assert_eq!(result.site_score, 63);
        assert_eq!(result.sub_scores["keyPages"].score, 40);
        assert_eq!(result.sub_scores["keyPages"].weight, 0.15);
        assert_eq!(result.sub_scores["mobile"].label, "Mobile Responsiveness");
    }

    #[test]
    fn test_both_sources_degraded() {
        // 30*.25 + 30*.20 + 50*.10 + 50*.10 + 30*.15 + 30*.10 + 30*.10 = 34
        let unreachable = PageSignals::unreachable(&url(), "connection refused");
        let result = score("biz", &url(), PerformanceSignals::degraded("API returned 500"), unreachable);
        assert_eq!(result.site_score, 34);
        assert_eq!(result.status, AuditStatus::Audited);
        assert!(result.details.is_degraded());
    }

    #[test]
    fn test_site_score_rounds_half_up() {
        // 1*.25 + 1*.25 = 0.5
        let subs = [SubScore::new(Category::Performance, 1), SubScore::new(Category::Performance, 1)];
        assert_eq!(site_score(&subs), 1);
    }

    #[test]
    fn test_site_score_bounds() {
        for a in (0..=100).step_by(10) {
            for b in (0..=100).step_by(25) {
                let result = score("biz", &url(), perf(a, b), page([b, a, b, a, b]));
                assert!(result.site_score <= 100);
            }
        }
    }
}
