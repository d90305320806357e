//! Category catalog
//!
//! A tree of category names whose leaves carry the commission label for
//! that category (e.g. `"2.59%"`). The catalog only resolves a path to a
//! label and a parsed percentage; the engine never walks the tree.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::error::PricingError;
use crate::pricing::parse_fee_label;
use crate::types::StoreTier;

/// Node of the category tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryNode {
    /// Leaf: free-text fee label
    Fee(String),
    /// Named subcategories
    Group(BTreeMap<String, CategoryNode>),
}

/// A resolved leaf
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryMatch {
    pub path: Vec<String>,
    pub fee_label: String,
    pub fee_percent: f64,
}

/// Category tree keyed by top-level category name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryTree {
    roots: BTreeMap<String, CategoryNode>,
}

impl CategoryTree {
    pub fn new(roots: BTreeMap<String, CategoryNode>) -> Self {
        Self { roots }
    }

    /// Parse a JSON category document
    pub fn from_json(json: &str) -> Result<Self> {
        let tree: CategoryTree =
            serde_json::from_str(json).context("Failed to parse category tree JSON")?;
        Ok(tree)
    }

    /// Load a JSON category document from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(PricingError::from)
            .with_context(|| format!("Failed to read category file {}", path.display()))?;
        let tree = Self::from_json(&json)?;
        info!(
            path = %path.display(),
            leaves = tree.leaf_count(),
            "Loaded category catalog"
        );
        Ok(tree)
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    fn node(&self, path: &[&str]) -> Option<&CategoryNode> {
        let (first, rest) = path.split_first()?;
        let mut node = self.roots.get(*first)?;
        for segment in rest {
            match node {
                CategoryNode::Group(children) => node = children.get(*segment)?,
                CategoryNode::Fee(_) => return None,
            }
        }
        Some(node)
    }

    /// Names directly below `path`; the top level for an empty path.
    /// Empty when `path` is a leaf or unknown.
    pub fn children(&self, path: &[&str]) -> Vec<String> {
        if path.is_empty() {
            return self.roots.keys().cloned().collect();
        }
        match self.node(path) {
            Some(CategoryNode::Group(children)) => children.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Whether `path` names a subtree rather than a leaf
    pub fn has_subcategories(&self, path: &[&str]) -> bool {
        matches!(self.node(path), Some(CategoryNode::Group(_)))
    }

    /// Fee label at the leaf `path`
    pub fn fee_label(&self, path: &[&str]) -> Option<&str> {
        match self.node(path)? {
            CategoryNode::Fee(label) => Some(label.as_str()),
            CategoryNode::Group(_) => None,
        }
    }

    /// Parsed commission percentage at the leaf `path`
    pub fn fee_percent(&self, path: &[&str]) -> Option<f64> {
        self.fee_label(path).map(parse_fee_label)
    }

    /// Resolve a leaf, refusing paths deeper than the tier can browse
    pub fn lookup_for_tier(
        &self,
        path: &[&str],
        tier: StoreTier,
    ) -> Result<CategoryMatch, PricingError> {
        let joined = path.join(" > ");
        if path.is_empty() || path.len() > tier.category_depth() {
            return Err(PricingError::UnknownCategory(joined));
        }
        let label = self
            .fee_label(path)
            .ok_or_else(|| PricingError::UnknownCategory(joined))?;
        Ok(CategoryMatch {
            path: path.iter().map(|s| s.to_string()).collect(),
            fee_label: label.to_string(),
            fee_percent: parse_fee_label(label),
        })
    }

    /// Every leaf, depth-first in name order
    pub fn leaves(&self) -> Vec<CategoryMatch> {
        let mut out = Vec::new();
        let mut prefix = Vec::new();
        collect_leaves(&self.roots, &mut prefix, &mut out);
        out
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves().len()
    }

    /// Leaves with any path segment containing `query`, case-insensitive.
    /// A blank query matches nothing.
    pub fn search(&self, query: &str) -> Vec<CategoryMatch> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        let hits: Vec<CategoryMatch> = self
            .leaves()
            .into_iter()
            .filter(|leaf| {
                leaf.path
                    .iter()
                    .any(|segment| segment.to_lowercase().contains(&needle))
            })
            .collect();
        debug!(query, hits = hits.len(), "Category search");
        hits
    }
}

fn collect_leaves(
    nodes: &BTreeMap<String, CategoryNode>,
    prefix: &mut Vec<String>,
    out: &mut Vec<CategoryMatch>,
) {
    for (name, node) in nodes {
        prefix.push(name.clone());
        match node {
            CategoryNode::Fee(label) => out.push(CategoryMatch {
                path: prefix.clone(),
                fee_label: label.clone(),
                fee_percent: parse_fee_label(label),
            }),
            CategoryNode::Group(children) => collect_leaves(children, prefix, out),
        }
        prefix.pop();
    }
}
