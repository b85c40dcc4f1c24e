//! Field definition metadata used by the access evaluators.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Maximum number of values a reference field may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cardinality {
    Unlimited,
    Limited(u32),
}

impl Cardinality {
    /// Whether a field already holding `count` values accepts one more.
    pub fn accepts_more(&self, count: usize) -> bool {
        match self {
            Cardinality::Unlimited => true,
            Cardinality::Limited(limit) => count < *limit as usize,
        }
    }
}

/// Introspection metadata for a paragraph reference field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub translatable: bool,
    pub cardinality: Cardinality,
    /// Paragraph bundles the field accepts. `None` means unrestricted.
    pub target_bundles: Option<BTreeSet<String>>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            translatable: false,
            cardinality: Cardinality::Unlimited,
            target_bundles: None,
        }
    }

    pub fn translatable(mut self, translatable: bool) -> Self {
        self.translatable = translatable;
        self
    }

    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = cardinality;
        self
    }

    pub fn with_target_bundles<I, S>(mut self, bundles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target_bundles = Some(bundles.into_iter().map(Into::into).collect());
        self
    }

    /// Whether the field accepts a paragraph of the given bundle.
    pub fn allows_bundle(&self, bundle: &str) -> bool {
        match &self.target_bundles {
            Some(bundles) => bundles.contains(bundle),
            None => true,
        }
    }
}
