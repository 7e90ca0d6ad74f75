// jmap-rpc/src/filter.rs
use serde::{Deserialize, Serialize};
use std::ops::{BitAnd, BitOr, Not};

/// `/query` filter: a tree of AND/OR/NOT nodes over leaf conditions of a
/// data type's condition type `C`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Filter<C> {
    Operator(FilterOperator<C>),
    Condition(C),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOperator<C> {
    pub operator: Operator,
    pub conditions: Vec<Filter<C>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operator {
    And,
    Or,
    /// None of the conditions match.
    Not,
}

impl<C> Filter<C> {
    pub fn condition(condition: C) -> Self {
        Filter::Condition(condition)
    }

    pub fn operator(operator: Operator, conditions: impl IntoIterator<Item = Filter<C>>) -> Self {
        Filter::Operator(FilterOperator {
            operator,
            conditions: conditions.into_iter().collect(),
        })
    }

    pub fn and(conditions: impl IntoIterator<Item = Filter<C>>) -> Self {
        Self::operator(Operator::And, conditions)
    }

    pub fn or(conditions: impl IntoIterator<Item = Filter<C>>) -> Self {
        Self::operator(Operator::Or, conditions)
    }

    pub fn not(conditions: impl IntoIterator<Item = Filter<C>>) -> Self {
        Self::operator(Operator::Not, conditions)
    }

    // a & b & c becomes one AND node with three children.
    fn join(self, operator: Operator, rhs: Self) -> Self {
        match self {
            Filter::Operator(mut node) if node.operator == operator => {
                node.conditions.push(rhs);
                Filter::Operator(node)
            }
            lhs => Self::operator(operator, [lhs, rhs]),
        }
    }
}

impl<C> From<C> for Filter<C> {
    fn from(condition: C) -> Self {
        Filter::Condition(condition)
    }
}

impl<C> BitAnd for Filter<C> {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        self.join(Operator::And, rhs)
    }
}

impl<C> BitOr for Filter<C> {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.join(Operator::Or, rhs)
    }
}

impl<C> Not for Filter<C> {
    type Output = Self;

    fn not(self) -> Self {
        Filter::not([self])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Cond {
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        in_folder: Option<String>,
    }

    fn text(s: &str) -> Filter<Cond> {
        Filter::condition(Cond {
            text: Some(s.to_string()),
            in_folder: None,
        })
    }

    #[test]
    fn test_leaf_serializes_flat() {
        assert_eq!(serde_json::to_value(text("hi")).unwrap(), json!({"text": "hi"}));
    }

    #[test]
    fn test_operators_flatten_same_kind() {
        let filter = text("a") & text("b") & text("c");
        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            json!({
                "operator": "AND",
                "conditions": [{"text": "a"}, {"text": "b"}, {"text": "c"}]
            })
        );
    }

    #[test]
    fn test_mixed_operators_nest() {
        let filter = (text("a") | text("b")) & !text("c");
        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            json!({
                "operator": "AND",
                "conditions": [
                    {"operator": "OR", "conditions": [{"text": "a"}, {"text": "b"}]},
                    {"operator": "NOT", "conditions": [{"text": "c"}]}
                ]
            })
        );
    }

    #[test]
    fn test_deserialize_prefers_operator() {
        let filter: Filter<Cond> = serde_json::from_value(json!({
            "operator": "OR",
            "conditions": [{"inFolder": "x"}]
        }))
        .unwrap();
        assert!(matches!(filter, Filter::Operator(FilterOperator { operator: Operator::Or, .. })));
    }
}
