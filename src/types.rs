use std::collections::BTreeMap;
use std::rc::Rc;

use opentelemetry_proto::tonic::common::v1::any_value::Value;
use opentelemetry_proto::tonic::trace::v1::{span::SpanKind, status::StatusCode};

/// Seconds since epoch
pub type TimePoint = f64;

pub const NANOSECONDS_PER_SECOND: f64 = 1_000_000_000.0;

pub fn time_point_from_unix_nano(unix_nano: u64) -> TimePoint {
    unix_nano as f64 / NANOSECONDS_PER_SECOND
}

pub fn time_point_to_utc_string(time: TimePoint) -> String {
    let date_time = chrono::DateTime::from_timestamp_nanos((time * NANOSECONDS_PER_SECOND) as i64);
    date_time.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

pub type Attributes = BTreeMap<String, Option<Value>>;

#[derive(Debug, Clone)]
pub struct Span {
    pub name: String,
    pub span_id: Vec<u8>,
    pub trace_id: Vec<u8>,
    pub parent_span_id: Vec<u8>,
    pub start_time: TimePoint,
    pub end_time: TimePoint,
    pub kind: SpanKind,
    pub status: StatusCode,
    pub status_message: String,
    pub attributes: Attributes,
    pub events: Vec<Event>,
    pub node: Rc<Node>,
    pub scope: Option<Rc<Scope>>,
}

impl Span {
    pub fn duration(&self) -> TimePoint {
        self.end_time - self.start_time
    }

    /// Duration in whole nanoseconds, the unit TraceQL compares `duration` in.
    pub fn duration_nanos(&self) -> u64 {
        (self.duration().max(0.0) * NANOSECONDS_PER_SECOND).round() as u64
    }
}

#[derive(Debug, Clone)]
pub struct Event {
    pub name: String,
    pub time: TimePoint,
    pub attributes: Attributes,
}

/// Resource that emitted the span, named after its `service.name`.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub attributes: Attributes,
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub name: String,
    pub version: String,
    pub attributes: Attributes,
}

/// TraceQL spelling of a span kind.
pub fn kind_to_text(kind: SpanKind) -> &'static str {
    match kind {
        SpanKind::Unspecified => "unspecified",
        SpanKind::Internal => "internal",
        SpanKind::Server => "server",
        SpanKind::Client => "client",
        SpanKind::Producer => "producer",
        SpanKind::Consumer => "consumer",
    }
}

/// TraceQL spelling of a status code.
pub fn status_to_text(status: StatusCode) -> &'static str {
    match status {
        StatusCode::Unset => "unset",
        StatusCode::Ok => "ok",
        StatusCode::Error => "error",
    }
}

pub fn value_to_text(value_opt: &Option<Value>) -> String {
    let Some(value) = value_opt else {
        return "empty".to_string();
    };

    match value {
        Value::StringValue(s) => s.clone(),
        Value::BoolValue(b) => b.to_string(),
        Value::IntValue(i) => i.to_string(),
        Value::DoubleValue(d) => d.to_string(),
        Value::ArrayValue(a) => format!(
            "[{}]",
            a.values
                .iter()
                .map(|v| value_to_text(&v.value))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        Value::KvlistValue(kv) => format!(
            "{{{}}}",
            kv.values
                .iter()
                .map(|v| format!(
                    "{}: {}",
                    v.key,
                    value_to_text(match &v.value {
                        Some(opt) => &opt.value,
                        None => &None,
                    })
                ))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        Value::BytesValue(b) => hex::encode(b),
    }
}
