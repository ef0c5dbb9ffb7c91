use std::collections::BTreeMap;

use opentelemetry_proto::tonic::trace::v1::{span::SpanKind, status::StatusCode};
use spanscope::filter_expr::{FilterOperator, FilterPredicate, FilterValue};
use spanscope::span_filter::{attribute_options, attribute_value, SpanFilter};

mod test_helpers;
use test_helpers::*;

fn filter(predicates: Vec<FilterPredicate>) -> SpanFilter {
    SpanFilter::new(&predicates)
}

#[test]
fn test_attribute_lookup() {
    let node = create_test_node("checkout");
    let mut event_attrs = BTreeMap::new();
    event_attrs.insert("exception.type".to_string(), string_attr("Timeout"));
    let span = SpanBuilder::new("GET /cart", &node)
        .attr("http.status_code", int_attr(503))
        .attr("retry", bool_attr(true))
        .kind(SpanKind::Server)
        .status(StatusCode::Error)
        .time(1.0, 1.25)
        .event("exception", event_attrs)
        .build();

    let cases = vec![
        ("resource.service.name", Some("checkout")),
        ("span.http.status_code", Some("503")),
        ("span.retry", Some("true")),
        ("event.exception.type", Some("Timeout")),
        (".http.status_code", Some("503")),
        (".service.name", Some("checkout")),
        ("name", Some("GET /cart")),
        ("status", Some("error")),
        ("kind", Some("server")),
        ("duration", Some("250000000")),
        ("span:id", Some("0102030405060708")),
        ("trace:id", Some("01020304")),
        ("span.missing", None),
        ("unknown", None),
    ];
    for (key, expected) in cases {
        assert_eq!(
            attribute_value(&span, key).as_deref(),
            expected,
            "lookup of {key} failed"
        );
    }
}

#[test]
fn test_operators() {
    let node = create_test_node("api");
    let span = SpanBuilder::new("GET /users", &node)
        .attr("http.status_code", int_attr(404))
        .attr("http.route", string_attr("/users/:id"))
        .build();

    let cases = vec![
        (FilterPredicate::new("span.http.status_code", FilterOperator::Equal, 404.0), true),
        (FilterPredicate::new("span.http.status_code", FilterOperator::Greater, "399"), true),
        (FilterPredicate::new("span.http.status_code", FilterOperator::Less, "400"), false),
        // Numeric, not lexical comparison
        (FilterPredicate::new("span.http.status_code", FilterOperator::Less, "1000"), true),
        (FilterPredicate::new("span.http.status_code", FilterOperator::GreaterOrEqual, "404"), true),
        (FilterPredicate::new("span.http.status_code", FilterOperator::LessOrEqual, "403"), false),
        (FilterPredicate::new("span.http.route", FilterOperator::Equal, "\"/users/:id\""), true),
        (FilterPredicate::new("span.http.route", FilterOperator::NotEqual, "/users/:id"), false),
        (FilterPredicate::new("span.http.route", FilterOperator::Regex, "/users/.*"), true),
        (FilterPredicate::new("span.http.route", FilterOperator::Regex, "users"), false),
        (FilterPredicate::new("span.http.route", FilterOperator::NotRegex, "/orders.*"), true),
        (FilterPredicate::new("name", FilterOperator::Regex, "GET.*"), true),
    ];
    for (predicate, expected) in cases {
        let rendered = predicate.render();
        assert_eq!(
            filter(vec![predicate]).matches(&span),
            expected,
            "{rendered} failed"
        );
    }
}

#[test]
fn test_missing_attribute() {
    let node = create_test_node("api");
    let span = SpanBuilder::new("GET /users", &node).build();

    let cases = vec![
        (FilterOperator::Equal, "x", false),
        (FilterOperator::NotEqual, "x", true),
        (FilterOperator::Regex, ".*", false),
        (FilterOperator::NotRegex, ".*", true),
    ];
    for (operator, value, expected) in cases {
        let predicate = FilterPredicate::new("span.db", operator, value);
        assert_eq!(filter(vec![predicate]).matches(&span), expected, "{operator} failed");
    }
}

#[test]
fn test_conjunction_and_skipped_predicates() {
    let node = create_test_node("api");
    let error_span = SpanBuilder::new("GET /users", &node)
        .status(StatusCode::Error)
        .kind(SpanKind::Server)
        .build();
    let ok_span = SpanBuilder::new("GET /users", &node)
        .status(StatusCode::Ok)
        .kind(SpanKind::Server)
        .build();

    let span_filter = filter(vec![
        FilterPredicate::new("status", FilterOperator::Equal, "error"),
        FilterPredicate::new("kind", FilterOperator::Equal, "server"),
        // Malformed, skipped
        FilterPredicate {
            key: "span.anything".to_string(),
            operator: "=".to_string(),
            value: FilterValue::Text(String::new()),
        },
        // Unknown operator, skipped
        FilterPredicate {
            key: "span.anything".to_string(),
            operator: "~~".to_string(),
            value: FilterValue::Text("x".to_string()),
        },
    ]);
    assert!(span_filter.matches(&error_span));
    assert!(!span_filter.matches(&ok_span));

    let empty = filter(vec![]);
    assert!(empty.is_empty());
    assert!(empty.matches(&ok_span));
}

#[test]
fn test_invalid_regex_never_matches() {
    let node = create_test_node("api");
    let span = SpanBuilder::new("GET /users", &node).build();
    for operator in [FilterOperator::Regex, FilterOperator::NotRegex] {
        let predicate = FilterPredicate::new("name", operator, "(");
        assert!(!filter(vec![predicate]).matches(&span));
    }
}

#[test]
fn test_attribute_options() {
    let node = create_test_node("api");
    let mut event_attrs = BTreeMap::new();
    event_attrs.insert("exception.type".to_string(), string_attr("Timeout"));
    let spans = vec![
        SpanBuilder::new("a", &node)
            .attr("http.method", string_attr("GET"))
            .build(),
        SpanBuilder::new("b", &node)
            .attr("http.method", string_attr("POST"))
            .event("exception", event_attrs)
            .build(),
    ];

    let names: Vec<String> = attribute_options(&spans)
        .into_iter()
        .map(|option| option.value)
        .collect();
    assert!(names.contains(&"resource.service.name".to_string()));
    assert!(names.contains(&"span.http.method".to_string()));
    assert!(names.contains(&"event.exception.type".to_string()));
    assert!(names.contains(&"status".to_string()));
    assert_eq!(
        names.iter().filter(|n| *n == "span.http.method").count(),
        1
    );
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
}
