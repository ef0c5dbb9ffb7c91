//! Splitting an attribute series into one comparable unit per attribute value.

use crate::reconcile::ComparisonTotals;
use crate::series::{Field, FieldKind, FieldType, FieldValue, MetaType, Series};

/// Label that identifies which attribute value a unit's fields belong to.
pub const VALUE_LABEL: &str = "value";

/// Baseline and selection magnitudes of a single attribute value.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonUnit {
    /// Attribute value with wrapping quotes removed.
    pub value: String,
    pub baseline: Field,
    pub selection: Field,
    /// Units are displayed in descending order of this key.
    pub ranking_key: f64,
}

impl ComparisonUnit {
    pub fn baseline_count(&self) -> f64 {
        self.baseline.first_number()
    }

    pub fn selection_count(&self) -> f64 {
        self.selection.first_number()
    }

    pub fn count(&self, meta: MetaType) -> f64 {
        match meta {
            MetaType::Baseline => self.baseline_count(),
            MetaType::Selection => self.selection_count(),
        }
    }

    /// Share of the baseline population that has this value.
    pub fn baseline_ratio(&self, totals: &ComparisonTotals) -> f64 {
        self.baseline_count() / totals.baseline
    }

    /// Share of the selection population that has this value.
    pub fn selection_ratio(&self, totals: &ComparisonTotals) -> f64 {
        self.selection_count() / totals.selection
    }

    /// Positive when the value is over-represented in the selection.
    pub fn difference(&self, totals: &ComparisonTotals) -> f64 {
        self.selection_ratio(totals) - self.baseline_ratio(totals)
    }
}

/// Split a series with value/baseline/selection fields into ranked units.
///
/// Rows without a value label, or without both magnitudes, are skipped. A row that has only one
/// of the magnitudes is kept: the value was seen in one population only.
pub fn split_for_comparison(series: Option<&Series>) -> Vec<ComparisonUnit> {
    let Some(series) = series else {
        return vec![];
    };
    let (Some(value_field), Some(baseline_field), Some(selection_field)) = (
        series.field_by_kind(FieldKind::Value),
        series.field_by_kind(FieldKind::Baseline),
        series.field_by_kind(FieldKind::Selection),
    ) else {
        tracing::debug!(series = %series.name, "Series is missing comparison fields");
        return vec![];
    };

    let mut units = Vec::new();
    for row in 0..series.row_count() {
        let raw_value = value_field.value(row);
        let baseline_value = baseline_field.value(row);
        let selection_value = selection_field.value(row);
        if !raw_value.is_truthy() || (!baseline_value.is_truthy() && !selection_value.is_truthy())
        {
            continue;
        }

        let value = raw_value.to_text().trim_matches('"').to_string();
        let baseline = unit_field(baseline_field, baseline_value, &value);
        let selection = unit_field(selection_field, selection_value, &value);
        let ranking_key = selection.max_number();

        units.push(ComparisonUnit {
            value,
            baseline,
            selection,
            ranking_key,
        });
    }

    // Stable, equal keys keep row order
    units.sort_by(|a, b| {
        b.ranking_key
            .partial_cmp(&a.ranking_key)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    units
}

fn unit_field(source: &Field, value: &FieldValue, key: &str) -> Field {
    let mut field = Field::new(
        source.name.clone(),
        FieldType::Number,
        source.kind,
        vec![value.clone()],
    );
    field.labels = source.labels.clone();
    field.labels.insert(VALUE_LABEL.to_string(), key.to_string());
    field
}
