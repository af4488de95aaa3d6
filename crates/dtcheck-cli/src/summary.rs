use std::time::Duration;

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use dtcheck_runner::{RunReport, SpecOutcome};

pub fn print_summary(report: &RunReport) {
    println!("{}", summary_table(report));
    let details = failure_details(report);
    if !details.is_empty() {
        eprintln!("Failures:");
        for line in details {
            eprintln!("- {line}");
        }
    }
    if report.stopped_early {
        eprintln!("Stopped after the first failure (--fail-fast).");
    }
}

pub fn summary_table(report: &RunReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Spec"),
        header_cell("Status"),
        header_cell("Sources"),
        header_cell("Rows"),
        header_cell("Targets"),
        header_cell("Duration"),
    ]);
    apply_table_style(&mut table);
    for column in 2..=5 {
        align_column(&mut table, column, CellAlignment::Right);
    }

    let mut total_rows = 0usize;
    let mut total_duration = Duration::ZERO;
    for run in &report.runs {
        total_rows += run.stats.rows_inserted;
        total_duration += run.duration;
        table.add_row(vec![
            Cell::new(&run.name),
            status_cell(&run.outcome),
            Cell::new(run.stats.sources_loaded),
            Cell::new(run.stats.rows_inserted),
            Cell::new(run.stats.targets_extracted),
            Cell::new(format_duration(run.duration)),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(format!("{}/{} passed", report.passed(), report.runs.len()))
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        Cell::new(total_rows).add_attribute(Attribute::Bold),
        dim_cell("-"),
        Cell::new(format_duration(total_duration)).add_attribute(Attribute::Bold),
    ]);
    table
}

/// One line per failed specification or unmet expectation.
pub fn failure_details(report: &RunReport) -> Vec<String> {
    let mut lines = Vec::new();
    for run in &report.runs {
        match &run.outcome {
            SpecOutcome::Passed => {}
            SpecOutcome::TransformFailed { reason } => {
                lines.push(format!("{}: transformation failed: {reason}", run.name));
            }
            SpecOutcome::ExpectationsFailed { failures } => {
                lines.extend(
                    failures
                        .iter()
                        .map(|failure| format!("{}: {failure}", run.name)),
                );
            }
        }
    }
    lines
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn format_duration(duration: Duration) -> String {
    format!("{} ms", duration.as_millis())
}

fn status_cell(outcome: &SpecOutcome) -> Cell {
    let color = match outcome {
        SpecOutcome::Passed => Color::Green,
        SpecOutcome::TransformFailed { .. } => Color::Red,
        SpecOutcome::ExpectationsFailed { .. } => Color::Yellow,
    };
    Cell::new(outcome.label())
        .fg(color)
        .add_attribute(Attribute::Bold)
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
