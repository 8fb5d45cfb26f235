//! Scoring categories and their fixed weights.

use serde::{Deserialize, Serialize};

/// One of the seven weighted categories that make up a SiteScore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Performance,
    Mobile,
    Ssl,
    BrokenResources,
    KeyPages,
    ModernDesign,
    Seo,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Performance,
        Category::Mobile,
        Category::Ssl,
        Category::BrokenResources,
        Category::KeyPages,
        Category::ModernDesign,
        Category::Seo,
    ];

    /// Map key used in `subScores`.
    pub fn key(self) -> &'static str {
        match self {
            Category::Performance => "performance",
            Category::Mobile => "mobile",
            Category::Ssl => "ssl",
            Category::BrokenResources => "brokenResources",
            Category::KeyPages => "keyPages",
            Category::ModernDesign => "modernDesign",
            Category::Seo => "seo",
        }
    }

    /// Weights sum to 1.0 across [`Category::ALL`].
    pub fn weight(self) -> f64 {
        match self {
            Category::Performance => 0.25,
            Category::Mobile => 0.20,
            Category::Ssl => 0.10,
            Category::BrokenResources => 0.10,
            Category::KeyPages => 0.15,
            Category::ModernDesign => 0.10,
            Category::Seo => 0.10,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Performance => "Performance",
            Category::Mobile => "Mobile Responsiveness",
            Category::Ssl => "SSL Certificate",
            Category::BrokenResources => "Broken Resources",
            Category::KeyPages => "Key Pages Present",
            Category::ModernDesign => "Modern Design",
            Category::Seo => "SEO Basics",
        }
    }
}

/// A single weighted category score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubScore {
    pub score: u8,
    pub weight: f64,
    pub label: String,
}

impl SubScore {
    /// Build the sub-score for `category`, clamping `score` to 0..=100.
    pub fn new(category: Category, score: u8) -> Self {
        Self { score: score.min(100), weight: category.weight(), label: category.label().to_string() }
    }

    pub fn weighted(&self) -> f64 {
        f64::from(self.score) * self.weight
    }
}
