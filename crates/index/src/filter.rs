//! Metadata filter algebra for vector-index queries.
//!
//! A small, provider-independent predicate type: per-field equality and
//! inequality conditions combined by implicit conjunction. Backends
//! evaluate it in process ([`Filter::matches`]) or push it down as SQL
//! ([`Filter::to_sql`]); the engine never sees provider filter syntax.

use crate::types::ProfileMetadata;
use serde::{Deserialize, Serialize};

/// Comparison operator for a single condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    /// Field equals the value (`$eq`)
    Eq,
    /// Field differs from the value (`$ne`)
    Ne,
}

/// A filterable field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterValue {
    Str(String),
    Int(i64),
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Str(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Str(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Int(value)
    }
}

impl From<u32> for FilterValue {
    fn from(value: u32) -> Self {
        FilterValue::Int(value as i64)
    }
}

/// One field condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub op: FilterOp,
    pub value: FilterValue,
}

/// Conjunction of field conditions; empty means "match everything".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    /// Create an empty filter (matches every record).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality condition.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.conditions.push(Condition {
            field: field.into(),
            op: FilterOp::Eq,
            value: value.into(),
        });
        self
    }

    /// Add an inequality condition.
    pub fn ne(mut self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.conditions.push(Condition {
            field: field.into(),
            op: FilterOp::Ne,
            value: value.into(),
        });
        self
    }

    /// Whether no conditions are set.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Evaluate the filter against one record in process.
    ///
    /// A condition on an unknown field never matches.
    pub fn matches(&self, id: &str, metadata: &ProfileMetadata) -> bool {
        self.conditions.iter().all(|condition| {
            let Some(actual) = field_value(id, metadata, &condition.field) else {
                return false;
            };

            match condition.op {
                FilterOp::Eq => actual == condition.value,
                FilterOp::Ne => actual != condition.value,
            }
        })
    }

    /// Render the filter as a SQL predicate for backends with pushdown.
    ///
    /// Returns `None` for an empty filter.
    pub fn to_sql(&self) -> Option<String> {
        if self.conditions.is_empty() {
            return None;
        }

        let clauses: Vec<String> = self
            .conditions
            .iter()
            .map(|condition| {
                let op = match condition.op {
                    FilterOp::Eq => "=",
                    FilterOp::Ne => "!=",
                };
                match &condition.value {
                    FilterValue::Str(s) => {
                        format!("{} {} '{}'", condition.field, op, escape_sql(s))
                    }
                    FilterValue::Int(i) => format!("{} {} {}", condition.field, op, i),
                }
            })
            .collect();

        Some(clauses.join(" AND "))
    }
}

/// Escape a string literal for a single-quoted SQL context.
pub(crate) fn escape_sql(value: &str) -> String {
    value.replace('\'', "''")
}

/// Look up a filterable field on a record.
fn field_value(id: &str, metadata: &ProfileMetadata, field: &str) -> Option<FilterValue> {
    match field {
        "id" => Some(FilterValue::Str(id.to_string())),
        "owner_id" => Some(FilterValue::Str(metadata.owner_id.clone())),
        "name" => Some(FilterValue::Str(metadata.name.clone())),
        "gender" => Some(FilterValue::Str(metadata.gender.as_str().to_string())),
        "location" => Some(FilterValue::Str(metadata.location.clone())),
        "age" => Some(FilterValue::Int(metadata.age as i64)),
        "match_id" => Some(FilterValue::Str(metadata.match_id.clone())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Gender;
    use chrono::Utc;

    fn test_metadata(owner_id: &str, match_id: &str) -> ProfileMetadata {
        ProfileMetadata {
            owner_id: owner_id.to_string(),
            name: "Ada".to_string(),
            gender: Gender::Female,
            location: "Turin".to_string(),
            age: 30,
            insights: vec!["Loves hiking".to_string()],
            narrative: "A thoughtful explorer.".to_string(),
            match_id: match_id.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = Filter::new();
        assert!(filter.is_empty());
        assert!(filter.matches("p1", &test_metadata("o1", "")));
        assert_eq!(filter.to_sql(), None);
    }

    #[test]
    fn test_eq_condition() {
        let filter = Filter::new().eq("match_id", "");
        assert!(filter.matches("p1", &test_metadata("o1", "")));
        assert!(!filter.matches("p1", &test_metadata("o1", "p2")));
    }

    #[test]
    fn test_ne_condition() {
        let filter = Filter::new().ne("owner_id", "o1");
        assert!(!filter.matches("p1", &test_metadata("o1", "")));
        assert!(filter.matches("p2", &test_metadata("o2", "")));
    }

    #[test]
    fn test_conjunction() {
        let filter = Filter::new().eq("match_id", "").ne("owner_id", "o1");
        assert!(filter.matches("p2", &test_metadata("o2", "")));
        assert!(!filter.matches("p2", &test_metadata("o2", "p9")));
        assert!(!filter.matches("p1", &test_metadata("o1", "")));
    }

    #[test]
    fn test_int_field() {
        let filter = Filter::new().eq("age", 30u32);
        assert!(filter.matches("p1", &test_metadata("o1", "")));

        let filter = Filter::new().ne("age", 30u32);
        assert!(!filter.matches("p1", &test_metadata("o1", "")));
    }

    #[test]
    fn test_unknown_field_never_matches() {
        let filter = Filter::new().eq("bio", "anything");
        assert!(!filter.matches("p1", &test_metadata("o1", "")));
    }

    #[test]
    fn test_to_sql() {
        let filter = Filter::new().eq("match_id", "").ne("owner_id", "o1");
        assert_eq!(
            filter.to_sql().unwrap(),
            "match_id = '' AND owner_id != 'o1'"
        );

        let filter = Filter::new().eq("age", 30u32);
        assert_eq!(filter.to_sql().unwrap(), "age = 30");
    }

    #[test]
    fn test_to_sql_escapes_quotes() {
        let filter = Filter::new().eq("name", "O'Brien");
        assert_eq!(filter.to_sql().unwrap(), "name = 'O''Brien'");
    }
}
