//! Per-value span counts of one attribute, for the baseline (all spans) and the selection (spans
//! matching a filter).

use std::collections::{BTreeMap, HashMap};

use anyhow::Result;

use crate::comparison::{split_for_comparison, ComparisonUnit, VALUE_LABEL};
use crate::reconcile::ComparisonTotals;
use crate::series::{Field, FieldKind, FieldType, FieldValue, Series};
use crate::span_filter::{attribute_value, SpanFilter};
use crate::task_timer::TaskTimer;
use crate::types::Span;

/// Label holding the attribute name a field was computed for.
pub const ATTRIBUTE_LABEL: &str = "attribute";

#[derive(Debug, Default)]
struct ValueCounts {
    baseline: u64,
    selection: u64,
}

#[derive(Debug, Clone)]
pub struct AttributeBreakdown {
    pub attribute: String,
    /// Value, Baseline and Selection fields, one row per attribute value.
    pub series: Series,
    /// BaselineTotal and SelectionTotal fields, one row.
    pub totals_series: Series,
    /// Baseline and Selection fields of every single value.
    pub per_value: BTreeMap<String, Vec<Field>>,
}

impl AttributeBreakdown {
    /// Count spans per value of `attribute`. Spans without the attribute only count toward the
    /// totals.
    pub fn build(spans: &[Span], attribute: &str, selection: &SpanFilter) -> Result<Self> {
        let t = TaskTimer::new(format!("Breakdown of {attribute}"));

        let mut counts: HashMap<String, ValueCounts> = HashMap::new();
        let mut baseline_total = 0u64;
        let mut selection_total = 0u64;
        for span in spans {
            let is_selected = selection.matches(span);
            baseline_total += 1;
            if is_selected {
                selection_total += 1;
            }

            let Some(value) = attribute_value(span, attribute) else {
                continue;
            };
            let entry = counts.entry(value).or_default();
            entry.baseline += 1;
            if is_selected {
                entry.selection += 1;
            }
        }

        let mut values: Vec<(String, ValueCounts)> = counts.into_iter().collect();
        values.sort_by(|(name_a, a), (name_b, b)| {
            b.baseline.cmp(&a.baseline).then_with(|| name_a.cmp(name_b))
        });

        let mut value_column = Vec::with_capacity(values.len());
        let mut baseline_column = Vec::with_capacity(values.len());
        let mut selection_column = Vec::with_capacity(values.len());
        let mut per_value = BTreeMap::new();
        for (value, count) in values {
            value_column.push(FieldValue::String(value.clone()));
            baseline_column.push(count.baseline as f64);
            selection_column.push(count.selection as f64);
            per_value.insert(
                value.clone(),
                vec![
                    count_field(attribute, FieldKind::Baseline, count.baseline as f64)
                        .with_label(VALUE_LABEL, value.as_str()),
                    count_field(attribute, FieldKind::Selection, count.selection as f64)
                        .with_label(VALUE_LABEL, value.as_str()),
                ],
            );
        }

        let series = Series::new(
            attribute,
            vec![
                Field::new(attribute, FieldType::String, FieldKind::Value, value_column),
                Field::numbers("baseline", FieldKind::Baseline, &baseline_column)
                    .with_label(ATTRIBUTE_LABEL, attribute),
                Field::numbers("selection", FieldKind::Selection, &selection_column)
                    .with_label(ATTRIBUTE_LABEL, attribute),
            ],
        )?;

        let totals_series = Series::new(
            format!("{attribute} totals"),
            vec![
                count_field(attribute, FieldKind::BaselineTotal, baseline_total as f64),
                count_field(attribute, FieldKind::SelectionTotal, selection_total as f64),
            ],
        )?;

        tracing::debug!(
            attribute,
            values = series.row_count(),
            baseline_total,
            selection_total,
            "Built attribute breakdown"
        );
        t.stop();

        Ok(AttributeBreakdown {
            attribute: attribute.to_string(),
            series,
            totals_series,
            per_value,
        })
    }

    pub fn totals(&self) -> ComparisonTotals {
        ComparisonTotals::reconcile(std::slice::from_ref(&self.totals_series), &self.per_value)
    }

    /// Comparison units, highest selection count first.
    pub fn ranked_units(&self) -> Vec<ComparisonUnit> {
        split_for_comparison(Some(&self.series))
    }
}

fn count_field(attribute: &str, kind: FieldKind, count: f64) -> Field {
    let name = match kind {
        FieldKind::Baseline => "baseline",
        FieldKind::BaselineTotal => "baseline_total",
        FieldKind::Selection => "selection",
        FieldKind::SelectionTotal => "selection_total",
        FieldKind::Value | FieldKind::Other => "count",
    };
    Field::numbers(name, kind, &[count]).with_label(ATTRIBUTE_LABEL, attribute)
}
