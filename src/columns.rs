use std::collections::HashSet;

/// Columns added by the "add recommended columns" action.
pub const RECOMMENDED_COLUMNS: &[&str] = &[
    "span.http.method",
    "span.http.request.method",
    "span.http.route",
    "span.http.path",
    "span.http.status_code",
    "span.http.response.status_code",
];

/// Merge `additional` columns into a comma separated column list.
///
/// Duplicates are dropped, the first occurrence decides the position. The result is rendered as
/// `a, b, c`.
pub fn merge_columns<S: AsRef<str>>(existing: Option<&str>, additional: &[S]) -> String {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut merged: Vec<&str> = Vec::new();

    let existing_columns = existing.unwrap_or_default().split(',');
    let additional_columns = additional.iter().map(|column| column.as_ref());
    for column in existing_columns.chain(additional_columns) {
        let column = column.trim();
        if column.is_empty() {
            continue;
        }
        if seen.insert(column) {
            merged.push(column);
        }
    }

    merged.join(", ")
}

/// Split a column list back into column names.
pub fn parse_columns(columns: &str) -> Vec<String> {
    columns
        .split(',')
        .map(str::trim)
        .filter(|column| !column.is_empty())
        .map(str::to_string)
        .collect()
}
