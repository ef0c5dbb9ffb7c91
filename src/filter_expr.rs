//! Rendering of filter predicates as a TraceQL expression.

use std::str::FromStr;
use std::sync::LazyLock;

use anyhow::{anyhow, Result};
use regex::Regex;

static NUMBER_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d+\.?\d*$").unwrap());

/// Keys whose values are TraceQL keywords or durations and must not be quoted.
const UNQUOTED_KEYS: &[&str] = &[
    "status",
    "kind",
    "span:status",
    "span:kind",
    "duration",
    "span:duration",
    "trace:duration",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FilterOperator {
    Equal,
    NotEqual,
    Greater,
    Less,
    GreaterOrEqual,
    LessOrEqual,
    Regex,
    NotRegex,
}

impl FilterOperator {
    pub const ALL: [FilterOperator; 8] = [
        FilterOperator::Equal,
        FilterOperator::NotEqual,
        FilterOperator::Greater,
        FilterOperator::Less,
        FilterOperator::GreaterOrEqual,
        FilterOperator::LessOrEqual,
        FilterOperator::Regex,
        FilterOperator::NotRegex,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FilterOperator::Equal => "=",
            FilterOperator::NotEqual => "!=",
            FilterOperator::Greater => ">",
            FilterOperator::Less => "<",
            FilterOperator::GreaterOrEqual => ">=",
            FilterOperator::LessOrEqual => "<=",
            FilterOperator::Regex => "=~",
            FilterOperator::NotRegex => "!~",
        }
    }

    pub fn parse(text: &str) -> Option<FilterOperator> {
        FilterOperator::ALL
            .into_iter()
            .find(|op| op.as_str() == text)
    }
}

impl std::fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Number(f64),
    Text(String),
}

impl FilterValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, FilterValue::Text(text) if text.is_empty())
    }
}

impl std::fmt::Display for FilterValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterValue::Number(n) => write!(f, "{n}"),
            FilterValue::Text(text) => write!(f, "{text}"),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Number(value)
    }
}

/// A single `key <operator> value` condition.
///
/// The operator is kept as text so that whatever the user typed is passed through to the query
/// unchanged; [`FilterPredicate::operator_kind`] gives the parsed form.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FilterPredicate {
    pub key: String,
    pub operator: String,
    pub value: FilterValue,
}

impl FilterPredicate {
    pub fn new(key: &str, operator: FilterOperator, value: impl Into<FilterValue>) -> Self {
        FilterPredicate {
            key: key.to_string(),
            operator: operator.as_str().to_string(),
            value: value.into(),
        }
    }

    /// Key, operator and value are all present.
    pub fn is_well_formed(&self) -> bool {
        !self.key.is_empty() && !self.operator.is_empty() && !self.value.is_empty()
    }

    pub fn operator_kind(&self) -> Option<FilterOperator> {
        FilterOperator::parse(&self.operator)
    }

    fn rendered_value(&self) -> String {
        match &self.value {
            FilterValue::Number(n) => n.to_string(),
            FilterValue::Text(text) => {
                let is_quoted = text.len() >= 2 && text.starts_with('"') && text.ends_with('"');
                if is_quoted
                    || NUMBER_REGEX.is_match(text)
                    || UNQUOTED_KEYS.contains(&self.key.as_str())
                {
                    text.clone()
                } else {
                    format!("\"{text}\"")
                }
            }
        }
    }

    pub fn render(&self) -> String {
        format!("{}{}{}", self.key, self.operator, self.rendered_value())
    }
}

impl FromStr for FilterPredicate {
    type Err = anyhow::Error;

    /// Parses `key<op>value`, e.g. `span.http.route="/api"` or `status=error`.
    fn from_str(s: &str) -> Result<Self> {
        // Leftmost operator wins, the longest one on ties (`!=` over `=`)
        let (position, operator) = FilterOperator::ALL
            .into_iter()
            .filter_map(|op| s.find(op.as_str()).map(|pos| (pos, op)))
            .min_by(|(pos_a, op_a), (pos_b, op_b)| {
                pos_a
                    .cmp(pos_b)
                    .then(op_b.as_str().len().cmp(&op_a.as_str().len()))
            })
            .ok_or_else(|| anyhow!("No operator found in filter '{}'", s))?;

        let key = s[..position].trim();
        let value = s[position + operator.as_str().len()..].trim();
        if key.is_empty() {
            return Err(anyhow!("Missing attribute name in filter '{}'", s));
        }
        if value.is_empty() {
            return Err(anyhow!("Missing value in filter '{}'", s));
        }
        Ok(FilterPredicate::new(key, operator, value))
    }
}

/// Render predicates joined with `&&`. Malformed predicates are skipped and an empty result
/// renders as `true`, so the output can always be combined with more conditions.
pub fn render(filters: &[FilterPredicate]) -> String {
    let rendered: Vec<String> = filters
        .iter()
        .filter(|filter| filter.is_well_formed())
        .map(FilterPredicate::render)
        .collect();

    if rendered.is_empty() {
        return "true".to_string();
    }
    rendered.join("&&")
}

/// Full span set query, e.g. `{status=error&&span.http.route="/api"}`.
pub fn span_set(filters: &[FilterPredicate]) -> String {
    format!("{{{}}}", render(filters))
}
