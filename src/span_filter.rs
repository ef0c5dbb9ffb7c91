//! Evaluating filter predicates against loaded spans.
//!
//! Attribute names use TraceQL spelling: `resource.x`, `span.x`, `event.x`, unscoped `.x` and
//! intrinsics such as `name`, `status`, `kind` and `duration`.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use regex::Regex;

use crate::attribute_groups::AttributeOption;
use crate::filter_expr::{FilterOperator, FilterPredicate, FilterValue};
use crate::types::{kind_to_text, status_to_text, value_to_text, Span};

/// Intrinsic attributes every span has.
pub const INTRINSICS: &[&str] = &[
    "name",
    "status",
    "statusMessage",
    "kind",
    "duration",
    "trace:id",
    "span:id",
];

/// Text value of `key` on `span`, `None` when the span doesn't have it.
pub fn attribute_value(span: &Span, key: &str) -> Option<String> {
    if let Some(name) = key.strip_prefix("resource.") {
        return span.node.attributes.get(name).map(value_to_text);
    }
    if let Some(name) = key.strip_prefix("span.") {
        return span.attributes.get(name).map(value_to_text);
    }
    if let Some(name) = key.strip_prefix("event.") {
        return span
            .events
            .iter()
            .find_map(|event| event.attributes.get(name))
            .map(value_to_text);
    }
    if let Some(name) = key.strip_prefix('.') {
        return span
            .attributes
            .get(name)
            .or_else(|| span.node.attributes.get(name))
            .map(value_to_text);
    }

    match key {
        "name" | "span:name" => Some(span.name.clone()),
        "status" | "span:status" => Some(status_to_text(span.status).to_string()),
        "statusMessage" | "span:statusMessage" => Some(span.status_message.clone()),
        "kind" | "span:kind" => Some(kind_to_text(span.kind).to_string()),
        "duration" | "span:duration" => Some(span.duration_nanos().to_string()),
        "trace:id" => Some(hex::encode(&span.trace_id)),
        "span:id" => Some(hex::encode(&span.span_id)),
        _ => None,
    }
}

/// All attribute names present on `spans` plus the intrinsics, sorted.
pub fn attribute_options(spans: &[Span]) -> Vec<AttributeOption> {
    let mut names: BTreeSet<String> = INTRINSICS.iter().map(|name| name.to_string()).collect();
    for span in spans {
        for key in span.node.attributes.keys() {
            names.insert(format!("resource.{key}"));
        }
        for key in span.attributes.keys() {
            names.insert(format!("span.{key}"));
        }
        for event in &span.events {
            for key in event.attributes.keys() {
                names.insert(format!("event.{key}"));
            }
        }
    }
    names.iter().map(|name| AttributeOption::new(name)).collect()
}

#[derive(Debug)]
enum Condition {
    Compare(FilterOperator, String),
    Regex { regex: Option<Regex>, negate: bool },
}

#[derive(Debug)]
struct CompiledPredicate {
    key: String,
    condition: Condition,
}

/// A conjunction of predicates, compiled once and evaluated per span.
#[derive(Debug, Default)]
pub struct SpanFilter {
    predicates: Vec<CompiledPredicate>,
}

impl SpanFilter {
    /// Malformed predicates and predicates with an unknown operator are skipped.
    pub fn new(filters: &[FilterPredicate]) -> SpanFilter {
        let mut predicates = Vec::new();
        for filter in filters.iter().filter(|f| f.is_well_formed()) {
            let Some(operator) = filter.operator_kind() else {
                tracing::warn!(
                    "Skipping filter on '{}' with unknown operator '{}'",
                    filter.key,
                    filter.operator
                );
                continue;
            };

            let expected = match &filter.value {
                FilterValue::Number(n) => n.to_string(),
                FilterValue::Text(text) => strip_quotes(text).to_string(),
            };

            let condition = match operator {
                FilterOperator::Regex | FilterOperator::NotRegex => {
                    let regex = match Regex::new(&format!("^(?:{expected})$")) {
                        Ok(regex) => Some(regex),
                        Err(err) => {
                            tracing::warn!("Invalid regex in filter on '{}': {}", filter.key, err);
                            None
                        }
                    };
                    Condition::Regex {
                        regex,
                        negate: operator == FilterOperator::NotRegex,
                    }
                }
                _ => Condition::Compare(operator, expected),
            };

            predicates.push(CompiledPredicate {
                key: filter.key.clone(),
                condition,
            });
        }
        SpanFilter { predicates }
    }

    /// A filter without predicates matches every span.
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn matches(&self, span: &Span) -> bool {
        self.predicates
            .iter()
            .all(|predicate| predicate.matches(attribute_value(span, &predicate.key).as_deref()))
    }
}

impl CompiledPredicate {
    fn matches(&self, actual: Option<&str>) -> bool {
        match &self.condition {
            Condition::Compare(operator, expected) => {
                let Some(actual) = actual else {
                    return *operator == FilterOperator::NotEqual;
                };
                let ordering = compare_values(actual, expected);
                match operator {
                    FilterOperator::Equal => ordering == Ordering::Equal,
                    FilterOperator::NotEqual => ordering != Ordering::Equal,
                    FilterOperator::Greater => ordering == Ordering::Greater,
                    FilterOperator::Less => ordering == Ordering::Less,
                    FilterOperator::GreaterOrEqual => ordering != Ordering::Less,
                    FilterOperator::LessOrEqual => ordering != Ordering::Greater,
                    FilterOperator::Regex | FilterOperator::NotRegex => unreachable!(),
                }
            }
            Condition::Regex { regex, negate } => {
                let Some(actual) = actual else {
                    return *negate;
                };
                match regex {
                    Some(regex) => regex.is_match(actual) != *negate,
                    None => false,
                }
            }
        }
    }
}

/// Numbers compare numerically, everything else as text.
fn compare_values(actual: &str, expected: &str) -> Ordering {
    match (actual.parse::<f64>(), expected.parse::<f64>()) {
        (Ok(a), Ok(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        _ => actual.cmp(expected),
    }
}

fn strip_quotes(text: &str) -> &str {
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        &text[1..text.len() - 1]
    } else {
        text
    }
}
