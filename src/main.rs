use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use spanscope::attribute_groups::{classify, recommended_set, PrefixRules, RECOMMENDED_ATTRIBUTES};
use spanscope::breakdown::AttributeBreakdown;
use spanscope::columns::{merge_columns, parse_columns, RECOMMENDED_COLUMNS};
use spanscope::filter_expr::{span_set, FilterPredicate};
use spanscope::persistent::{SavedView, Settings};
use spanscope::span_filter::{attribute_options, SpanFilter};
use spanscope::trace_file::load_trace_file;
use spanscope::types::{time_point_to_utc_string, Span};

#[derive(Parser)]
#[command(name = "spanscope")]
#[command(about = "Compare span attributes between all spans and a filtered selection")]
struct Args {
    /// OTLP JSON trace export, optionally gzipped (.gz)
    trace_file: PathBuf,

    /// Attribute to compare, e.g. resource.service.name or span.http.route
    #[arg(short, long, default_value = "resource.service.name")]
    attribute: String,

    /// Selection filter like `status=error` or `span.http.route="/api"`, can be repeated
    #[arg(short, long)]
    filter: Vec<String>,

    /// Use the filters of a saved view
    #[arg(long)]
    view: Option<String>,

    /// Columns to add to the column list, comma separated
    #[arg(long)]
    columns: Option<String>,

    /// Add the recommended columns to the column list
    #[arg(long)]
    recommended_columns: bool,

    /// Store the resulting column list
    #[arg(long)]
    save_columns: bool,

    /// Store the active filters as a view with this name
    #[arg(long)]
    save_view: Option<String>,

    /// Number of attribute values to show
    #[arg(long, default_value_t = 20)]
    top: usize,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let mut settings = match Settings::load() {
        Ok(settings) => settings,
        Err(err) => {
            tracing::warn!("Failed to load persistent data: {err:#}");
            Settings::default()
        }
    };

    let spans = load_trace_file(&args.trace_file)?;
    print_time_range(&spans);

    let mut filters = Vec::new();
    if let Some(view_name) = &args.view {
        let view = settings
            .find_view(view_name)
            .ok_or_else(|| anyhow!("No saved view named '{}'", view_name))?;
        filters.extend(view.filters.iter().cloned());
    }
    for filter in &args.filter {
        filters.push(filter.parse::<FilterPredicate>()?);
    }

    print_attribute_groups(&spans);
    update_columns(&args, &mut settings)?;

    if let Some(view_name) = &args.save_view {
        settings.upsert_view(SavedView::new(view_name, filters.clone()));
        settings.save()?;
    }

    println!("Query: {}", span_set(&filters));
    println!();

    let selection = SpanFilter::new(&filters);
    let breakdown = AttributeBreakdown::build(&spans, &args.attribute, &selection)?;
    print_comparison(&breakdown, args.top);

    Ok(())
}

fn print_time_range(spans: &[Span]) {
    let min_time = spans.iter().map(|s| s.start_time).reduce(f64::min);
    let max_time = spans.iter().map(|s| s.end_time).reduce(f64::max);
    if let (Some(min_time), Some(max_time)) = (min_time, max_time) {
        println!(
            "{} spans from {} to {}",
            spans.len(),
            time_point_to_utc_string(min_time),
            time_point_to_utc_string(max_time)
        );
    } else {
        println!("No spans in trace file");
    }
}

fn print_attribute_groups(spans: &[Span]) {
    let options = attribute_options(spans);
    let groups = classify(
        &options,
        &recommended_set(RECOMMENDED_ATTRIBUTES),
        &PrefixRules::default(),
    );
    println!("Attributes:");
    for group in groups {
        let labels: Vec<&str> = group.options.iter().map(|o| o.label.as_str()).collect();
        println!("  {}: {}", group.group, labels.join(", "));
    }
    println!();
}

fn update_columns(args: &Args, settings: &mut Settings) -> Result<()> {
    let mut added = args.columns.as_deref().map(parse_columns).unwrap_or_default();
    if args.recommended_columns {
        added.extend(RECOMMENDED_COLUMNS.iter().map(|c| c.to_string()));
    }
    if added.is_empty() && settings.columns.is_empty() {
        return Ok(());
    }

    let merged = merge_columns(Some(settings.columns.as_str()), added.as_slice());
    settings.columns = merged;
    println!("Columns: {}", settings.columns);
    println!();
    if args.save_columns {
        settings.save()?;
    }
    Ok(())
}

fn print_comparison(breakdown: &AttributeBreakdown, top: usize) {
    let totals = breakdown.totals();
    let units = breakdown.ranked_units();
    println!(
        "Comparing {} ({} values), baseline total {}, selection total {}",
        breakdown.attribute,
        units.len(),
        totals.baseline,
        totals.selection
    );

    let value_width = units
        .iter()
        .take(top)
        .map(|u| u.value.len())
        .max()
        .unwrap_or(0)
        .max("value".len());
    println!(
        "{:<value_width$}  {:>10} {:>8}  {:>10} {:>8}  {:>8}",
        "value", "baseline", "%", "selection", "%", "diff"
    );
    for unit in units.iter().take(top) {
        println!(
            "{:<value_width$}  {:>10} {:>7.2}%  {:>10} {:>7.2}%  {:>+7.2}%",
            unit.value,
            unit.baseline_count(),
            unit.baseline_ratio(&totals) * 100.0,
            unit.selection_count(),
            unit.selection_ratio(&totals) * 100.0,
            unit.difference(&totals) * 100.0,
        );
    }
    if units.len() > top {
        println!("... {} more", units.len() - top);
    }
}
