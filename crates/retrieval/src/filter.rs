//! Metadata filter expressions.
//!
//! A [`RetrievalFilter`] is a boolean tree over key/value predicates. It
//! serializes to the knowledge-base filter JSON shape, e.g.
//! `{"andAll":[{"equals":{"key":"tenantId","value":"acme"}}, ...]}`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tenrag_core::{AppError, AppResult};

/// Scalar value stored in document metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    String(String),
    Number(f64),
    Bool(bool),
}

impl MetadataValue {
    /// Convert a JSON value, returning `None` for null, arrays and objects.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Some(Self::String(s.clone())),
            serde_json::Value::Number(n) => n.as_f64().map(Self::Number),
            serde_json::Value::Bool(b) => Some(Self::Bool(*b)),
            _ => None,
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<f64> for MetadataValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for MetadataValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<bool> for MetadataValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{}", s),
            Self::Number(n) => write!(f, "{}", n),
            Self::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// A single `key == value` style predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub key: String,
    pub value: MetadataValue,
}

/// A membership predicate over a list of values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListPredicate {
    pub key: String,
    pub value: Vec<MetadataValue>,
}

/// Boolean filter tree applied by the backend at query time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetrievalFilter {
    #[serde(rename = "equals")]
    Equals(Predicate),

    #[serde(rename = "notEquals")]
    NotEquals(Predicate),

    #[serde(rename = "in")]
    In(ListPredicate),

    #[serde(rename = "notIn")]
    NotIn(ListPredicate),

    #[serde(rename = "andAll")]
    AndAll(Vec<RetrievalFilter>),

    #[serde(rename = "orAll")]
    OrAll(Vec<RetrievalFilter>),
}

impl RetrievalFilter {
    /// `key == value`
    pub fn equals(key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        Self::Equals(Predicate {
            key: key.into(),
            value: value.into(),
        })
    }

    /// `key != value`
    pub fn not_equals(key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        Self::NotEquals(Predicate {
            key: key.into(),
            value: value.into(),
        })
    }

    /// `key` is one of `values`
    pub fn one_of(key: impl Into<String>, values: Vec<MetadataValue>) -> Self {
        Self::In(ListPredicate {
            key: key.into(),
            value: values,
        })
    }

    /// `key` is none of `values`
    pub fn none_of(key: impl Into<String>, values: Vec<MetadataValue>) -> Self {
        Self::NotIn(ListPredicate {
            key: key.into(),
            value: values,
        })
    }

    /// Conjunction of two filters.
    ///
    /// Existing `andAll` groups on either side are flattened so the result is
    /// a single group.
    pub fn and(self, other: RetrievalFilter) -> Self {
        let mut members = Vec::new();
        for side in [self, other] {
            match side {
                Self::AndAll(inner) => members.extend(inner),
                single => members.push(single),
            }
        }
        Self::AndAll(members)
    }

    /// Disjunction of two filters.
    pub fn or(self, other: RetrievalFilter) -> Self {
        Self::OrAll(vec![self, other])
    }

    /// Collapse one-member `andAll`/`orAll` groups into their member, at any depth.
    ///
    /// The backend rejects groups with fewer than two members; the collapsed
    /// tree matches exactly the same rows.
    pub fn simplify(self) -> Self {
        match self {
            Self::AndAll(members) => Self::collapse(members, Self::AndAll),
            Self::OrAll(members) => Self::collapse(members, Self::OrAll),
            leaf => leaf,
        }
    }

    fn collapse(members: Vec<RetrievalFilter>, group: fn(Vec<RetrievalFilter>) -> Self) -> Self {
        let mut members: Vec<RetrievalFilter> = members.into_iter().map(Self::simplify).collect();
        if members.len() == 1 {
            members.remove(0)
        } else {
            group(members)
        }
    }

    /// Parse a filter from its JSON form.
    pub fn from_json_str(s: &str) -> AppResult<Self> {
        let filter: Self = serde_json::from_str(s)
            .map_err(|e| AppError::invalid_input(format!("Invalid filter JSON: {}", e)))?;
        filter.validate()?;
        Ok(filter)
    }

    /// Reject structurally empty filters.
    pub fn validate(&self) -> AppResult<()> {
        match self {
            Self::Equals(p) | Self::NotEquals(p) => check_key(&p.key),
            Self::In(p) | Self::NotIn(p) => {
                check_key(&p.key)?;
                if p.value.is_empty() {
                    return Err(AppError::invalid_input(format!(
                        "Membership filter on '{}' has no values",
                        p.key
                    )));
                }
                Ok(())
            }
            Self::AndAll(members) | Self::OrAll(members) => {
                if members.is_empty() {
                    return Err(AppError::invalid_input(
                        "Filter group must have at least one member",
                    ));
                }
                members.iter().try_for_each(|m| m.validate())
            }
        }
    }

    /// Evaluate the filter against one metadata row.
    ///
    /// A missing key fails `equals`/`in` and satisfies `notEquals`/`notIn`.
    pub fn matches(&self, metadata: &BTreeMap<String, MetadataValue>) -> bool {
        match self {
            Self::Equals(p) => metadata.get(&p.key) == Some(&p.value),
            Self::NotEquals(p) => metadata.get(&p.key) != Some(&p.value),
            Self::In(p) => metadata
                .get(&p.key)
                .map(|v| p.value.contains(v))
                .unwrap_or(false),
            Self::NotIn(p) => metadata
                .get(&p.key)
                .map(|v| !p.value.contains(v))
                .unwrap_or(true),
            Self::AndAll(members) => members.iter().all(|m| m.matches(metadata)),
            Self::OrAll(members) => members.iter().any(|m| m.matches(metadata)),
        }
    }

    /// True if any predicate in the tree mentions `key`.
    pub fn references_key(&self, key: &str) -> bool {
        match self {
            Self::Equals(p) | Self::NotEquals(p) => p.key == key,
            Self::In(p) | Self::NotIn(p) => p.key == key,
            Self::AndAll(members) | Self::OrAll(members) => {
                members.iter().any(|m| m.references_key(key))
            }
        }
    }

    /// True if every row matching this filter must have `key == value`.
    ///
    /// Only looks through conjunctions; an `equals` under `orAll` does not count.
    pub fn requires_equals(&self, key: &str, value: &MetadataValue) -> bool {
        match self {
            Self::Equals(p) => p.key == key && &p.value == value,
            Self::AndAll(members) => members.iter().any(|m| m.requires_equals(key, value)),
            _ => false,
        }
    }
}

fn check_key(key: &str) -> AppResult<()> {
    if key.trim().is_empty() {
        return Err(AppError::invalid_input("Filter key must not be blank"));
    }
    Ok(())
}
