//! Reconciling a population's declared total with the sum of its per-value counts.
//!
//! Per-value breakdowns can undercount (spans without the attribute, sampling), and the
//! declared total can be missing or stale. The larger of the two is used as the denominator
//! so that normalized shares never exceed 1, and it's never smaller than 1.

use std::collections::BTreeMap;

use crate::series::{Field, MetaType, Series};

/// Reconciled population size for `meta`, always >= 1.
pub fn reconcile_total(
    series: &[Series],
    meta: MetaType,
    per_value: &BTreeMap<String, Vec<Field>>,
) -> f64 {
    let total_kind = meta.total_kind();
    let declared_total = series
        .iter()
        .flat_map(|s| s.fields.iter())
        .find(|f| f.kind == total_kind)
        .map(Field::first_number)
        .unwrap_or(0.0);

    let value_kind = meta.value_kind();
    let observed_total: f64 = per_value
        .values()
        .flat_map(|fields| fields.iter())
        .filter(|f| f.kind == value_kind)
        .map(Field::first_number)
        .sum();

    let total = declared_total.max(observed_total);
    if total > 0.0 {
        total
    } else {
        1.0
    }
}

/// Reconciled totals of both populations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparisonTotals {
    pub baseline: f64,
    pub selection: f64,
}

impl ComparisonTotals {
    pub fn reconcile(series: &[Series], per_value: &BTreeMap<String, Vec<Field>>) -> Self {
        ComparisonTotals {
            baseline: reconcile_total(series, MetaType::Baseline, per_value),
            selection: reconcile_total(series, MetaType::Selection, per_value),
        }
    }

    pub fn get(&self, meta: MetaType) -> f64 {
        match meta {
            MetaType::Baseline => self.baseline,
            MetaType::Selection => self.selection,
        }
    }
}
