//! Weighted rollup of audit categories into an overall score, grade and
//! ranked recommendations.

use serde::Serialize;
use serde_json::Value;

use crate::defaults::CategoryWeights;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Grade::A
        } else if score >= 80.0 {
            Grade::B
        } else if score >= 70.0 {
            Grade::C
        } else if score >= 60.0 {
            Grade::D
        } else {
            Grade::F
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks a healthy score; fix first.
    Critical,
    Warning,
    /// Context only, never turned into a recommendation.
    Info,
}

impl Severity {
    fn weight(&self) -> f64 {
        match self {
            Severity::Critical => 3.0,
            Severity::Warning => 2.0,
            Severity::Info => 1.0,
        }
    }
}

/// Impact or effort estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    Medium,
    High,
}

impl Level {
    fn weight(&self) -> f64 {
        match self {
            Level::Low => 1.0,
            Level::Medium => 2.0,
            Level::High => 3.0,
        }
    }

    /// Inverse weight: low effort ranks highest.
    fn ease(&self) -> f64 {
        4.0 - self.weight()
    }
}

fn is_empty(v: &[String]) -> bool {
    v.is_empty()
}

/// One actionable observation within a category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub kind: String,
    pub severity: Severity,
    pub impact: Level,
    pub effort: Level,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "is_empty")]
    pub files: Vec<String>,
}

/// A category's contribution to the overall audit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResult {
    pub id: String,
    pub name: String,
    pub score: f64,
    pub grade: Grade,
    pub findings: Vec<Finding>,
    pub metrics: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryScore {
    pub id: String,
    pub name: String,
    pub score: f64,
    pub grade: Grade,
    /// Effective weight after renormalization.
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub category: String,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    pub severity: Severity,
    pub impact: Level,
    pub effort: Level,
    pub priority: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditScore {
    pub overall: f64,
    pub grade: Grade,
    pub categories: Vec<CategoryScore>,
    pub recommendations: Vec<Recommendation>,
}

/// Combine categories with fixed weights, renormalized over the categories
/// present. Unknown categories carry no weight unless every category is
/// unknown, in which case they are averaged.
pub fn score_categories(categories: &[CategoryResult], weights: &CategoryWeights) -> AuditScore {
    let raw: Vec<f64> = categories
        .iter()
        .map(|c| weights.weight_for(&c.id).unwrap_or(0.0).max(0.0))
        .collect();
    let total: f64 = raw.iter().sum();
    let effective: Vec<f64> = if total > 0.0 {
        raw.iter().map(|w| w / total).collect()
    } else {
        vec![1.0 / categories.len().max(1) as f64; categories.len()]
    };

    let overall = if categories.is_empty() {
        0.0
    } else {
        let sum: f64 = categories
            .iter()
            .zip(&effective)
            .map(|(c, w)| c.score * w)
            .sum();
        (sum * 10.0).round() / 10.0
    };

    let scores = categories
        .iter()
        .zip(&effective)
        .map(|(c, w)| CategoryScore {
            id: c.id.clone(),
            name: c.name.clone(),
            score: c.score,
            grade: c.grade,
            weight: (w * 1000.0).round() / 1000.0,
        })
        .collect();

    AuditScore {
        overall,
        grade: Grade::from_score(overall),
        categories: scores,
        recommendations: recommendations(categories),
    }
}

/// Non-informational findings, highest priority first. Ties sort by title.
pub fn recommendations(categories: &[CategoryResult]) -> Vec<Recommendation> {
    let mut recs: Vec<Recommendation> = categories
        .iter()
        .flat_map(|category| {
            category
                .findings
                .iter()
                .filter(|f| f.severity != Severity::Info)
                .map(move |f| Recommendation {
                    category: category.id.clone(),
                    title: f.title.clone(),
                    description: f.description.clone(),
                    suggestion: f.suggestion.clone(),
                    severity: f.severity,
                    impact: f.impact,
                    effort: f.effort,
                    priority: f.severity.weight() * f.impact.weight() * f.effort.ease(),
                })
        })
        .collect();

    recs.sort_by(|a, b| {
        b.priority
            .total_cmp(&a.priority)
            .then_with(|| a.title.cmp(&b.title))
    });
    recs
}
