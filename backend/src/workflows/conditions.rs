// Workflow Conditions - predicates used by check-condition actions and entity queries

use automate_shared::value_to_text;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single condition to evaluate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Condition {
    /// Field name to evaluate
    #[serde(alias = "field")]
    pub field_name: String,
    /// Operator for comparison
    pub operator: ConditionOperator,
    /// Value to compare against
    #[serde(default)]
    pub value: Value,
}

/// Condition operators
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    // Equality
    #[serde(alias = "is_equal", alias = "eq")]
    Equals,
    #[serde(alias = "is_not_equal", alias = "ne")]
    NotEquals,

    // String operations
    Contains,
    NotContains,
    #[serde(alias = "begins_with", alias = "begins")]
    StartsWith,
    EndsWith,
    Regex,

    // Numeric comparisons
    #[serde(alias = "is_greater", alias = "gt")]
    GreaterThan,
    #[serde(alias = "is_greater_or_equal", alias = "gte")]
    GreaterThanOrEquals,
    #[serde(alias = "is_less", alias = "lt")]
    LessThan,
    #[serde(alias = "is_less_or_equal", alias = "lte")]
    LessThanOrEquals,

    // Array operations
    In,
    NotIn,

    // Null/Empty checks
    #[serde(alias = "is_empty")]
    IsNull,
    #[serde(alias = "is_not_empty")]
    IsNotNull,
}

impl Condition {
    pub fn new(field_name: &str, operator: ConditionOperator, value: Value) -> Self {
        Self {
            field_name: field_name.to_string(),
            operator,
            value,
        }
    }

    pub fn equals(field_name: &str, value: impl Into<Value>) -> Self {
        Self::new(field_name, ConditionOperator::Equals, value.into())
    }

    pub fn not_equals(field_name: &str, value: impl Into<Value>) -> Self {
        Self::new(field_name, ConditionOperator::NotEquals, value.into())
    }

    pub fn contains(field_name: &str, value: &str) -> Self {
        Self::new(field_name, ConditionOperator::Contains, Value::String(value.to_string()))
    }

    pub fn is_null(field_name: &str) -> Self {
        Self::new(field_name, ConditionOperator::IsNull, Value::Null)
    }

    pub fn greater_than(field_name: &str, value: f64) -> Self {
        Self::new(field_name, ConditionOperator::GreaterThan, serde_json::json!(value))
    }

    pub fn in_list(field_name: &str, values: Vec<Value>) -> Self {
        Self::new(field_name, ConditionOperator::In, Value::Array(values))
    }

    pub fn matches(&self, field_value: Option<&Value>) -> bool {
        self.operator.evaluate(field_value, &self.value)
    }
}

impl ConditionOperator {
    /// Evaluates `field_value <op> expected`. A missing field behaves like null.
    pub fn evaluate(&self, field_value: Option<&Value>, expected: &Value) -> bool {
        let field_value = field_value.filter(|v| !is_blank(v));

        match self {
            Self::Equals => match field_value {
                Some(v) => values_equal(v, expected),
                None => is_blank(expected),
            },
            Self::NotEquals => !Self::Equals.evaluate(field_value, expected),
            Self::Contains => field_value
                .map(|v| text_lower(v).contains(&text_lower(expected)))
                .unwrap_or(false),
            Self::NotContains => !Self::Contains.evaluate(field_value, expected),
            Self::StartsWith => field_value
                .map(|v| text_lower(v).starts_with(&text_lower(expected)))
                .unwrap_or(false),
            Self::EndsWith => field_value
                .map(|v| text_lower(v).ends_with(&text_lower(expected)))
                .unwrap_or(false),
            Self::Regex => {
                let (Some(v), Some(pattern)) = (field_value, expected.as_str()) else {
                    return false;
                };
                regex::Regex::new(pattern)
                    .map(|re| re.is_match(&value_to_text(v)))
                    .unwrap_or(false)
            }
            Self::GreaterThan => compare_numbers(field_value, expected, |a, b| a > b),
            Self::GreaterThanOrEquals => compare_numbers(field_value, expected, |a, b| a >= b),
            Self::LessThan => compare_numbers(field_value, expected, |a, b| a < b),
            Self::LessThanOrEquals => compare_numbers(field_value, expected, |a, b| a <= b),
            Self::In => match (field_value, expected.as_array()) {
                (Some(v), Some(options)) => options.iter().any(|o| values_equal(v, o)),
                _ => false,
            },
            Self::NotIn => !Self::In.evaluate(field_value, expected),
            Self::IsNull => field_value.is_none(),
            Self::IsNotNull => field_value.is_some(),
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn text_lower(value: &Value) -> String {
    value_to_text(value).to_lowercase()
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Loose equality: numbers compare numerically, multi-value fields match on membership.
fn values_equal(actual: &Value, expected: &Value) -> bool {
    if let Value::Array(items) = actual {
        return items.iter().any(|item| values_equal(item, expected));
    }
    if let (Some(a), Some(b)) = (as_number(actual), as_number(expected)) {
        return a == b;
    }
    value_to_text(actual) == value_to_text(expected)
}

fn compare_numbers(field_value: Option<&Value>, expected: &Value, cmp: fn(f64, f64) -> bool) -> bool {
    match (field_value.and_then(as_number), as_number(expected)) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}
