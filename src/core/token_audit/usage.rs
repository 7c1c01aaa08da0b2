//! The usage map: one record per catalog token, plus dynamic records for
//! custom properties that belong to the token system without being tokens.

use std::collections::{HashMap, HashSet};

use heck::ToKebabCase;
use serde::Serialize;

use super::matcher::ValueMatcher;
use crate::tokens::TokenCatalog;

/// Where a usage or hardcoded value was seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReference {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub context: String,
}

impl FileReference {
    pub fn new(path: &str, line: usize, context: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            line: Some(line),
            context: context.into(),
        }
    }
}

fn is_false(v: &bool) -> bool {
    !*v
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    pub token_name: String,
    pub token_value: String,
    pub usage_count: usize,
    pub files: Vec<FileReference>,
    /// Created during the scan for a custom property rather than from the catalog.
    #[serde(skip_serializing_if = "is_false")]
    pub dynamic: bool,
}

impl UsageRecord {
    fn new(token_name: &str, token_value: &str, dynamic: bool) -> Self {
        Self {
            token_name: token_name.to_string(),
            token_value: token_value.to_string(),
            usage_count: 0,
            files: Vec::new(),
            dynamic,
        }
    }

    pub fn is_used(&self) -> bool {
        self.usage_count > 0
    }
}

/// Accumulates usages across the scan. Records are never removed.
#[derive(Debug, Clone, Default)]
pub struct UsageMap {
    records: Vec<UsageRecord>,
    index: HashMap<String, usize>,
    system_variables: HashSet<String>,
}

impl UsageMap {
    /// An empty record for every token, then one synthetic usage per alias
    /// on the token it points at. Dangling aliases credit nothing.
    pub fn from_catalog(catalog: &TokenCatalog) -> Self {
        let mut map = Self::default();
        for token in catalog.tokens() {
            map.insert(UsageRecord::new(&token.name, &token.value, false));
        }

        for token in catalog.tokens() {
            let Some(target) = token.alias_of.as_deref() else {
                continue;
            };
            if catalog.get(target).is_none() {
                continue;
            }
            map.record(
                target,
                FileReference {
                    path: token.source_path.clone(),
                    line: None,
                    context: format!("referenced by token: {}", token.name),
                },
            );
        }
        map
    }

    fn insert(&mut self, record: UsageRecord) {
        if self.index.contains_key(&record.token_name) {
            return;
        }
        self.index.insert(record.token_name.clone(), self.records.len());
        self.records.push(record);
    }

    /// Count one usage. Returns false when no record exists for `name`.
    pub fn record(&mut self, name: &str, reference: FileReference) -> bool {
        let Some(idx) = self.index.get(name) else {
            return false;
        };
        let record = &mut self.records[*idx];
        record.usage_count += 1;
        record.files.push(reference);
        true
    }

    /// Mark a custom property (without `--`) as part of the token system, for
    /// instance because its definition points at a token.
    pub fn register_system_variable(&mut self, variable: &str) {
        self.system_variables.insert(variable.to_string());
    }

    /// Count a `var(--name)` usage.
    ///
    /// The variable resolves to a token when the matcher recognizes it.
    /// Otherwise it lands on a dynamic record, created only when a token's
    /// name or resolved value mentions the variable, or its definition
    /// pointed into the token system. Unrelated variables are ignored.
    pub fn record_custom_property(
        &mut self,
        matcher: &ValueMatcher<'_>,
        variable: &str,
        reference: FileReference,
    ) -> bool {
        let variable = variable.trim_start_matches("--");
        if let Some(token) = matcher.find_token_by_custom_property_name(variable) {
            return self.record(&token.name, reference);
        }

        let key = format!("--{}", variable);
        if self.index.contains_key(&key) {
            return self.record(&key, reference);
        }

        if self.system_variables.contains(variable) || mentions_variable(matcher.catalog(), variable) {
            self.insert(UsageRecord::new(&key, &format!("var({})", key), true));
            return self.record(&key, reference);
        }
        false
    }

    pub fn get(&self, name: &str) -> Option<&UsageRecord> {
        self.index.get(name).map(|idx| &self.records[*idx])
    }

    pub fn records(&self) -> &[UsageRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<UsageRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Whether a token's name or resolved value mentions the variable.
fn mentions_variable(catalog: &TokenCatalog, variable: &str) -> bool {
    let needle = format!("-{}-", variable);
    let var_call = format!("--{}", variable);
    catalog.tokens().iter().any(|token| {
        format!("-{}-", token.name.to_kebab_case()).contains(&needle)
            || catalog
                .resolve_value(token)
                .is_some_and(|value| value.contains(&var_call))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::MatchingConfig;
    use crate::token_audit::convention::TransformPattern;
    use crate::tokens::{Token, TokenType};

    fn catalog(tokens: &[(&str, &str)]) -> TokenCatalog {
        TokenCatalog::new(
            tokens
                .iter()
                .map(|(n, v)| Token::new(*n, *v, TokenType::infer(n, v)).with_source("tokens/core.json"))
                .collect(),
        )
    }

    fn at(line: usize) -> FileReference {
        FileReference::new("src/a.css", line, "a")
    }

    #[test]
    fn every_token_gets_a_record() {
        let cat = catalog(&[("color.a", "#fff"), ("color.b", "#000")]);
        let map = UsageMap::from_catalog(&cat);
        assert_eq!(map.len(), 2);
        assert!(map.records().iter().all(|r| r.usage_count == 0 && !r.dynamic));
    }

    #[test]
    fn aliases_credit_their_target() {
        let cat = catalog(&[
            ("color.blue", "#00f"),
            ("color.primary", "{color.blue}"),
            ("color.link", "{color.blue}"),
            ("color.broken", "{color.nope}"),
        ]);
        let map = UsageMap::from_catalog(&cat);
        let blue = map.get("color.blue").unwrap();
        assert_eq!(blue.usage_count, 2);
        assert_eq!(blue.files[0].context, "referenced by token: color.primary");
        assert_eq!(blue.files[0].line, None);
        assert_eq!(blue.files[0].path, "tokens/core.json");
        assert_eq!(map.get("color.primary").unwrap().usage_count, 0);
        assert!(map.get("color.nope").is_none());
    }

    #[test]
    fn cyclic_aliases_do_not_loop() {
        let cat = catalog(&[("a", "{b}"), ("b", "{a}")]);
        let map = UsageMap::from_catalog(&cat);
        assert_eq!(map.get("a").unwrap().usage_count, 1);
        assert_eq!(map.get("b").unwrap().usage_count, 1);
    }

    #[test]
    fn record_requires_existing_record() {
        let cat = catalog(&[("color.a", "#fff")]);
        let mut map = UsageMap::from_catalog(&cat);
        assert!(map.record("color.a", at(1)));
        assert!(!map.record("color.zzz", at(2)));
        assert_eq!(map.get("color.a").unwrap().files, vec![at(1)]);
    }

    #[test]
    fn custom_properties_resolve_or_create_dynamic_records() {
        let cat = catalog(&[
            ("color.primary", "#00f"),
            ("button.background", "var(--brand-surface)"),
        ]);
        let matcher = ValueMatcher::new(&cat, TransformPattern::default(), &MatchingConfig::default());
        let mut map = UsageMap::from_catalog(&cat);

        assert!(map.record_custom_property(&matcher, "color-primary", at(1)));
        assert_eq!(map.get("color.primary").unwrap().usage_count, 1);

        assert!(map.record_custom_property(&matcher, "--brand-surface", at(2)));
        assert!(map.record_custom_property(&matcher, "brand-surface", at(3)));
        let dynamic = map.get("--brand-surface").unwrap();
        assert!(dynamic.dynamic);
        assert_eq!(dynamic.usage_count, 2);

        assert!(!map.record_custom_property(&matcher, "header-height", at(4)));
        assert!(map.get("--header-height").is_none());

        map.register_system_variable("header-height");
        assert!(map.record_custom_property(&matcher, "header-height", at(5)));
        assert_eq!(map.len(), 4);
    }
}
