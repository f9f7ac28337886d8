//! Query vocabulary shared by both store backends.

use serde_json::Value;

/// A single predicate over a stored document.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    IdEq(String),
    IdNot(String),
    /// String field equals the value exactly.
    Eq(&'static str, String),
    /// String field equals the value, compared lower-cased.
    EqIgnoreCase(&'static str, String),
    /// Field is absent, null or anything other than `false`.
    NotFalse(&'static str),
}

/// Conjunction of conditions. An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: impl Into<String>) -> Self {
        Self::all().with(Condition::IdEq(id.into()))
    }

    pub fn with(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn eq(self, field: &'static str, value: impl Into<String>) -> Self {
        self.with(Condition::Eq(field, value.into()))
    }

    pub fn eq_ignore_case(self, field: &'static str, value: impl Into<String>) -> Self {
        self.with(Condition::EqIgnoreCase(field, value.into()))
    }

    pub fn not_false(self, field: &'static str) -> Self {
        self.with(Condition::NotFalse(field))
    }

    pub fn id_not(self, id: impl Into<String>) -> Self {
        self.with(Condition::IdNot(id.into()))
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Evaluates the filter against a document held in memory.
    pub fn matches(&self, id: &str, doc: &Value) -> bool {
        self.conditions.iter().all(|condition| match condition {
            Condition::IdEq(expected) => id == expected,
            Condition::IdNot(excluded) => id != excluded,
            Condition::Eq(field, expected) => {
                doc.get(*field).and_then(Value::as_str) == Some(expected.as_str())
            }
            Condition::EqIgnoreCase(field, expected) => doc
                .get(*field)
                .and_then(Value::as_str)
                .is_some_and(|actual| actual.to_lowercase() == expected.to_lowercase()),
            Condition::NotFalse(field) => doc.get(*field) != Some(&Value::Bool(false)),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sort {
    NewestFirst,
    NameAscending,
}

/// Offset/limit slice of a sorted result. `limit: None` returns everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Window {
    pub skip: u64,
    pub limit: Option<u64>,
}

impl Window {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn first() -> Self {
        Self {
            skip: 0,
            limit: Some(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(Filter::all().matches("a", &json!({})));
    }

    #[test]
    fn test_eq_ignore_case() {
        let filter = Filter::all().eq_ignore_case("name", "react");
        assert!(filter.matches("1", &json!({ "name": "React" })));
        assert!(!filter.matches("1", &json!({ "name": "Preact" })));
        assert!(!filter.matches("1", &json!({})));
    }

    #[test]
    fn test_not_false_keeps_legacy_documents() {
        let filter = Filter::all().not_false("visible");
        assert!(filter.matches("1", &json!({ "visible": true })));
        assert!(filter.matches("2", &json!({})));
        assert!(filter.matches("3", &json!({ "visible": null })));
        assert!(!filter.matches("4", &json!({ "visible": false })));
    }

    #[test]
    fn test_conditions_are_conjunctive() {
        let filter = Filter::all().eq("status", "unread").id_not("1");
        assert!(!filter.matches("1", &json!({ "status": "unread" })));
        assert!(filter.matches("2", &json!({ "status": "unread" })));
        assert!(!filter.matches("2", &json!({ "status": "read" })));
    }
}
