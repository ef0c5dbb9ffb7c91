//! Loading spans from an OTLP JSON export (`Vec<ExportTraceServiceRequest>`).

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use opentelemetry_proto::tonic::collector::trace::v1::ExportTraceServiceRequest;
use opentelemetry_proto::tonic::common::v1::any_value::Value;
use opentelemetry_proto::tonic::common::v1::KeyValue;
use opentelemetry_proto::tonic::trace::v1::{span::SpanKind, status::StatusCode};

use crate::task_timer::TaskTimer;
use crate::types::{time_point_from_unix_nano, Attributes, Event, Node, Scope, Span};

/// Read a trace file. Files ending in `.gz` are decompressed first.
pub fn load_trace_file(path: &Path) -> Result<Vec<Span>> {
    let mut file_bytes = Vec::new();
    let mut file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open trace file {}", path.display()))?;

    let is_gzip = path.extension().is_some_and(|ext| ext == "gz");
    if is_gzip {
        GzDecoder::new(file)
            .read_to_end(&mut file_bytes)
            .with_context(|| format!("Failed to decompress {}", path.display()))?;
    } else {
        file.read_to_end(&mut file_bytes)?;
    }

    let requests = parse_trace_file(&file_bytes)?;
    let spans = extract_spans(&requests);
    tracing::info!(
        "Loaded {} spans from {} requests in {}",
        spans.len(),
        requests.len(),
        path.display()
    );
    Ok(spans)
}

pub fn parse_trace_file(file_bytes: &[u8]) -> Result<Vec<ExportTraceServiceRequest>> {
    let t = TaskTimer::new("Parsing trace file");

    let file_str =
        std::str::from_utf8(file_bytes).map_err(|e| anyhow::anyhow!("File is not UTF8!: {}", e))?;
    let traces: Vec<ExportTraceServiceRequest> =
        serde_json::from_str(file_str).context("Trace file is not a list of OTLP requests")?;

    t.stop();
    Ok(traces)
}

fn collect_attributes(key_values: &[KeyValue]) -> Attributes {
    let mut attributes = BTreeMap::new();
    for attribute in key_values {
        attributes.insert(
            attribute.key.clone(),
            attribute.value.clone().and_then(|v| v.value),
        );
    }
    attributes
}

/// Flatten the raw OTel data into a list of spans, in file order.
pub fn extract_spans(requests: &[ExportTraceServiceRequest]) -> Vec<Span> {
    let t = TaskTimer::new("Extracting spans");

    let mut spans = Vec::new();
    for request in requests {
        for rs in &request.resource_spans {
            let node = match &rs.resource {
                Some(r) => {
                    let attributes = collect_attributes(&r.attributes);
                    let name = match attributes.get("service.name") {
                        Some(Some(Value::StringValue(service_name))) => service_name.clone(),
                        _ => "unknown".to_string(),
                    };
                    Rc::new(Node { name, attributes })
                }
                None => Rc::new(Node {
                    name: "no resource".to_string(),
                    attributes: BTreeMap::new(),
                }),
            };

            for ss in &rs.scope_spans {
                let scope = ss.scope.as_ref().map(|s| {
                    Rc::new(Scope {
                        name: s.name.clone(),
                        version: s.version.clone(),
                        attributes: collect_attributes(&s.attributes),
                    })
                });

                for span in &ss.spans {
                    let events = span
                        .events
                        .iter()
                        .map(|event| Event {
                            name: event.name.clone(),
                            time: time_point_from_unix_nano(event.time_unix_nano),
                            attributes: collect_attributes(&event.attributes),
                        })
                        .collect();

                    let (status, status_message) = match &span.status {
                        Some(status) => (
                            StatusCode::try_from(status.code).unwrap_or(StatusCode::Unset),
                            status.message.clone(),
                        ),
                        None => (StatusCode::Unset, String::new()),
                    };

                    spans.push(Span {
                        name: span.name.clone(),
                        span_id: span.span_id.clone(),
                        trace_id: span.trace_id.clone(),
                        parent_span_id: span.parent_span_id.clone(),
                        start_time: time_point_from_unix_nano(span.start_time_unix_nano),
                        end_time: time_point_from_unix_nano(span.end_time_unix_nano),
                        kind: SpanKind::try_from(span.kind).unwrap_or(SpanKind::Unspecified),
                        status,
                        status_message,
                        attributes: collect_attributes(&span.attributes),
                        events,
                        node: node.clone(),
                        scope: scope.clone(),
                    });
                }
            }
        }
    }

    t.stop();
    spans
}
