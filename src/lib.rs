pub mod attribute_groups;
pub mod breakdown;
pub mod columns;
pub mod comparison;
pub mod filter_expr;
pub mod persistent;
pub mod reconcile;
pub mod series;
pub mod span_filter;
pub mod task_timer;
pub mod trace_file;
pub mod types;

pub use attribute_groups::{classify, AttributeGroup, AttributeOption, GroupLabel, PrefixRules};
pub use breakdown::AttributeBreakdown;
pub use columns::merge_columns;
pub use comparison::{split_for_comparison, ComparisonUnit};
pub use filter_expr::{render, FilterOperator, FilterPredicate, FilterValue};
pub use reconcile::{reconcile_total, ComparisonTotals};
pub use series::{Field, FieldKind, FieldValue, MetaType, Series};
pub use types::Span;
