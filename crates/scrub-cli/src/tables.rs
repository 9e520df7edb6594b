//! comfy-table rendering of schemas and suggestions.

use std::collections::BTreeMap;

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{CellAlignment, ContentArrangement, Table};

use scrub_model::{ColumnId, Diagnostics, SchemaReport, StageAction, SuggestionRecord};
use scrub_session::StageSuggestions;

pub fn schema_table(schema: &SchemaReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["ID", "Column", "Kind", "Missing", "Unique"]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);
    for column in &schema.columns {
        table.add_row(vec![
            column.id.to_string(),
            column.name.clone(),
            column.kind.to_string(),
            percent(column.missing_fraction),
            percent(column.unique_fraction),
        ]);
    }
    table
}

pub fn suggestion_table(suggestions: &StageSuggestions) -> Table {
    match suggestions {
        StageSuggestions::Prune => {
            let mut table = Table::new();
            table.set_header(vec!["Column pruning is manual; pick ids from the schema"]);
            apply_table_style(&mut table);
            table
        }
        StageSuggestions::Missing { suggestions } => record_table(suggestions),
        StageSuggestions::Outliers { suggestions } => record_table(suggestions),
        StageSuggestions::Encoding { suggestions } => record_table(suggestions),
        StageSuggestions::Scaling { suggestions } => record_table(suggestions),
        StageSuggestions::Correlation { preview } => {
            let mut table = Table::new();
            table.set_header(vec!["Left", "Right", "|r|", "Drop"]);
            apply_table_style(&mut table);
            align_column(&mut table, 2, CellAlignment::Right);
            for pair in &preview.pairs {
                let victim = [pair.left, pair.right]
                    .into_iter()
                    .find(|id| preview.drop.contains(id))
                    .map(|id| id.to_string())
                    .unwrap_or_default();
                table.add_row(vec![
                    pair.left.to_string(),
                    pair.right.to_string(),
                    format!("{:.3}", pair.correlation.abs()),
                    victim,
                ]);
            }
            table
        }
    }
}

fn record_table<A: StageAction>(
    suggestions: &BTreeMap<ColumnId, SuggestionRecord<A>>,
) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["ID", "Column", "Action", "Why"]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    for (id, record) in suggestions {
        table.add_row(vec![
            id.to_string(),
            record.column.clone(),
            record.action.token().to_string(),
            describe(&record.stats),
        ]);
    }
    table
}

/// One-line rendering of whichever diagnostics the engine filled in.
fn describe(stats: &Diagnostics) -> String {
    let mut parts = Vec::new();
    if let Some(v) = stats.missing_fraction {
        parts.push(format!("missing {}", percent(v)));
    }
    if let Some(v) = stats.skewness {
        parts.push(format!("skew {v:.2}"));
    }
    if let Some(v) = stats.outlier_fraction {
        parts.push(format!("outliers {}", percent(v)));
    }
    if let (Some(lo), Some(hi)) = (stats.lower_fence, stats.upper_fence) {
        parts.push(format!("fences [{lo:.2}, {hi:.2}]"));
    }
    if let Some(v) = stats.distinct_count {
        parts.push(format!("{v} distinct"));
    }
    if let Some(v) = stats.unique_fraction {
        parts.push(format!("unique {}", percent(v)));
    }
    parts.join(", ")
}

fn percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}
