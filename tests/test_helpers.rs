use std::collections::BTreeMap;
use std::rc::Rc;

use opentelemetry_proto::tonic::common::v1::any_value::Value;
use opentelemetry_proto::tonic::trace::v1::{span::SpanKind, status::StatusCode};

use spanscope::types::{Attributes, Event, Node, Span, TimePoint};

/// Helper to create a simple fake node
#[allow(dead_code)]
pub fn create_test_node(name: &str) -> Rc<Node> {
    let mut attributes = BTreeMap::new();
    attributes.insert("service.name".to_string(), string_attr(name));
    Rc::new(Node {
        name: name.to_string(),
        attributes,
    })
}

/// Helper to create a fake span with minimal required fields
#[allow(dead_code)]
pub fn create_test_span(
    name: &str,
    node: Rc<Node>,
    start_time: TimePoint,
    end_time: TimePoint,
) -> Span {
    create_test_span_with_attributes(name, node, start_time, end_time, BTreeMap::new())
}

/// Helper to create a span with attributes
#[allow(dead_code)]
pub fn create_test_span_with_attributes(
    name: &str,
    node: Rc<Node>,
    start_time: TimePoint,
    end_time: TimePoint,
    attributes: Attributes,
) -> Span {
    Span {
        name: name.to_string(),
        span_id: vec![1, 2, 3, 4, 5, 6, 7, 8],
        trace_id: vec![1, 2, 3, 4],
        parent_span_id: vec![],
        start_time,
        end_time,
        kind: SpanKind::Internal,
        status: StatusCode::Unset,
        status_message: String::new(),
        attributes,
        events: vec![],
        node,
        scope: None,
    }
}

/// Builder for spans in tests that only care about a few fields.
#[allow(dead_code)]
pub struct SpanBuilder {
    span: Span,
}

#[allow(dead_code)]
impl SpanBuilder {
    pub fn new(name: &str, node: &Rc<Node>) -> Self {
        SpanBuilder {
            span: create_test_span(name, node.clone(), 0.0, 1.0),
        }
    }

    pub fn attr(mut self, key: &str, value: Option<Value>) -> Self {
        self.span.attributes.insert(key.to_string(), value);
        self
    }

    pub fn kind(mut self, kind: SpanKind) -> Self {
        self.span.kind = kind;
        self
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.span.status = status;
        self
    }

    pub fn time(mut self, start_time: TimePoint, end_time: TimePoint) -> Self {
        self.span.start_time = start_time;
        self.span.end_time = end_time;
        self
    }

    pub fn event(mut self, name: &str, attributes: Attributes) -> Self {
        self.span.events.push(Event {
            name: name.to_string(),
            time: self.span.start_time,
            attributes,
        });
        self
    }

    pub fn build(self) -> Span {
        self.span
    }
}

/// Helper to create a string attribute value
#[allow(dead_code)]
pub fn string_attr(value: &str) -> Option<Value> {
    Some(Value::StringValue(value.to_string()))
}

/// Helper to create an int attribute value
#[allow(dead_code)]
pub fn int_attr(value: i64) -> Option<Value> {
    Some(Value::IntValue(value))
}

/// Helper to create a bool attribute value
#[allow(dead_code)]
pub fn bool_attr(value: bool) -> Option<Value> {
    Some(Value::BoolValue(value))
}
