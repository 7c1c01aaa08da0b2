use std::collections::BTreeMap;

use serde::Serialize;

use super::usage::{UsageMap, UsageRecord};
use crate::tokens::{TokenCatalog, TokenType};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCoverage {
    pub total: usize,
    pub used: usize,
    pub percentage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub least_used: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageMetrics {
    pub total_tokens: usize,
    pub used_tokens: usize,
    /// Catalog order.
    pub unused_tokens: Vec<String>,
    pub coverage_percentage: f64,
    pub by_category: BTreeMap<String, CategoryCoverage>,
    /// Usages of every catalog token combined.
    pub total_usages: usize,
}

impl CoverageMetrics {
    pub fn category(&self, token_type: TokenType) -> Option<&CategoryCoverage> {
        self.by_category.get(token_type.as_str())
    }
}

pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    ((part as f64 / whole as f64) * 1000.0).round() / 10.0
}

/// Coverage over catalog tokens only. Dynamic records never count.
pub fn compute_metrics(catalog: &TokenCatalog, usage: &UsageMap) -> CoverageMetrics {
    let records: Vec<(&UsageRecord, TokenType)> = catalog
        .tokens()
        .iter()
        .filter_map(|token| usage.get(&token.name).map(|r| (r, token.token_type)))
        .collect();

    let unused_tokens: Vec<String> = records
        .iter()
        .filter(|(r, _)| !r.is_used())
        .map(|(r, _)| r.token_name.clone())
        .collect();
    let total = records.len();
    let used = total - unused_tokens.len();

    let mut grouped: BTreeMap<&'static str, Vec<&UsageRecord>> = BTreeMap::new();
    for &(record, token_type) in &records {
        grouped.entry(token_type.as_str()).or_default().push(record);
    }

    let by_category = grouped
        .into_iter()
        .map(|(name, members)| (name.to_string(), category_coverage(&members)))
        .collect();

    CoverageMetrics {
        total_tokens: total,
        used_tokens: used,
        unused_tokens,
        coverage_percentage: percentage(used, total),
        by_category,
        total_usages: records.iter().map(|(r, _)| r.usage_count).sum(),
    }
}

/// Ties on count go to the earlier token in catalog order.
fn category_coverage(members: &[&UsageRecord]) -> CategoryCoverage {
    let used = members.iter().filter(|r| r.is_used()).count();

    let mut most: Option<&UsageRecord> = None;
    let mut least: Option<&UsageRecord> = None;
    for &record in members {
        if most.map_or(true, |m| record.usage_count > m.usage_count) {
            most = Some(record);
        }
        if least.map_or(true, |l| record.usage_count < l.usage_count) {
            least = Some(record);
        }
    }

    CategoryCoverage {
        total: members.len(),
        used,
        percentage: percentage(used, members.len()),
        most_used: most.filter(|r| r.is_used()).map(|r| r.token_name.clone()),
        least_used: least.map(|r| r.token_name.clone()),
    }
}
