//! Static keyword rules, the first and cheapest resolution stage.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// Lowercase whitespace tokens. No stemming and no punctuation stripping.
pub fn tokenize(text: &str) -> HashSet<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// All `keywords` must appear in the prompt for `slug` to be chosen.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IntentRule {
    pub keywords: HashSet<String>,
    pub slug: String,
}

impl IntentRule {
    pub fn new<I, S>(keywords: I, slug: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .collect(),
            slug: slug.into(),
        }
    }

    pub fn matches(&self, tokens: &HashSet<String>) -> bool {
        self.keywords.is_subset(tokens)
    }
}

/// Ordered rule list. Earlier rules win when several match.
#[derive(Debug, Clone, Default)]
pub struct IntentMap {
    rules: Vec<IntentRule>,
}

impl IntentMap {
    pub fn new(rules: Vec<IntentRule>) -> Result<Self> {
        for (i, rule) in rules.iter().enumerate() {
            if rule.keywords.is_empty() {
                bail!("intent rule #{} ({}) has no keywords", i, rule.slug);
            }
            if rule.slug.trim().is_empty() {
                bail!("intent rule #{} has an empty slug", i);
            }
        }
        Ok(Self { rules })
    }

    /// Rules shipped with the router.
    pub fn builtin() -> Self {
        Self {
            rules: vec![
                IntentRule::new(["uddi", "aws", "azure"], "infoblox-uddi-ipam"),
                IntentRule::new(["dns"], "infoblox-lab1"),
            ],
        }
    }

    /// Load rules from a YAML list of `{keywords: [...], slug: ...}`.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read intent rules from {}", path.display()))?;
        Self::from_yaml_str(&text)
            .with_context(|| format!("invalid intent rules in {}", path.display()))
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let raw: Vec<IntentRule> = serde_yaml::from_str(text)?;
        let rules = raw
            .into_iter()
            .map(|r| IntentRule::new(r.keywords, r.slug))
            .collect();
        Self::new(rules)
    }

    pub fn find(&self, tokens: &HashSet<String>) -> Option<&IntentRule> {
        self.rules.iter().find(|rule| rule.matches(tokens))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
