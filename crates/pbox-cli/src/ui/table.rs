//! Table rendering for CLI output using comfy-table.
//!
//! | Command | Table Function |
//! |---------|----------------|
//! | `experiment list` | `render_experiments_table()` |
//! | `experiment show` | `render_artifacts_table()`, `render_configs_table()` |

use std::path::Path;

use comfy_table::presets::NOTHING;
use comfy_table::{Cell, CellAlignment, ColumnConstraint, Table, Width};
use pbox_core::{ArtifactSummary, ConfigEntry, ExperimentSummary};

use super::format::{format_bytes, format_names, format_relative_time};
use super::style::Style;

/// Render the experiment listing. The active experiment is marked with `*`.
///
/// # Example Output
///
/// ```text
///   NAME        DATASETS   MODELS   OVERRIDES            MODIFIED
/// * upx-study          2        1   detectors, packers   3h ago
///   baseline           0        0   -                    2d ago
/// ```
pub fn render_experiments_table(rows: &[ExperimentSummary], active: Option<&Path>) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_header(vec![
        Cell::new(""),
        Cell::new("NAME"),
        Cell::new("DATASETS").set_alignment(CellAlignment::Right),
        Cell::new("MODELS").set_alignment(CellAlignment::Right),
        Cell::new("OVERRIDES"),
        Cell::new("MODIFIED"),
    ]);
    table.set_constraints(vec![
        ColumnConstraint::LowerBoundary(Width::Fixed(1)),
        ColumnConstraint::LowerBoundary(Width::Fixed(10)),
        ColumnConstraint::LowerBoundary(Width::Fixed(8)),
        ColumnConstraint::LowerBoundary(Width::Fixed(6)),
        ColumnConstraint::LowerBoundary(Width::Fixed(10)),
        ColumnConstraint::LowerBoundary(Width::Fixed(10)),
    ]);

    for row in rows {
        let marker = if active == Some(row.path.as_path()) { "*" } else { "" };
        let modified = row
            .modified
            .map(format_relative_time)
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            Cell::new(marker),
            Cell::new(&row.name),
            Cell::new(row.datasets).set_alignment(CellAlignment::Right),
            Cell::new(row.models).set_alignment(CellAlignment::Right),
            Cell::new(format_names(&row.overrides)),
            Cell::new(modified),
        ]);
    }

    table.to_string()
}

/// Render datasets or models of an experiment.
pub fn render_artifacts_table(artifacts: &[ArtifactSummary], show_fileless: bool) -> String {
    if artifacts.is_empty() {
        return String::new();
    }

    let mut table = Table::new();
    table.load_preset(NOTHING);

    let mut headers = vec![
        Cell::new("NAME"),
        Cell::new("FILES").set_alignment(CellAlignment::Right),
        Cell::new("SIZE").set_alignment(CellAlignment::Right),
    ];
    if show_fileless {
        headers.push(Cell::new("FILELESS"));
    }
    table.set_header(headers);

    for artifact in artifacts {
        let mut row = vec![
            Cell::new(&artifact.name),
            Cell::new(artifact.files).set_alignment(CellAlignment::Right),
            Cell::new(format_bytes(artifact.size_bytes)).set_alignment(CellAlignment::Right),
        ];
        if show_fileless {
            row.push(Cell::new(if artifact.fileless { "yes" } else { "no" }));
        }
        table.add_row(row);
    }

    table.to_string()
}

/// Render the state of every configuration kind.
pub fn render_configs_table(entries: &[ConfigEntry], style: &Style) -> String {
    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_header(vec![Cell::new("KIND"), Cell::new("STATE"), Cell::new("PATH")]);

    for entry in entries {
        table.add_row(vec![
            Cell::new(&entry.kind),
            Cell::new(style.config_state(&entry.state)),
            Cell::new(entry.path().display()),
        ]);
    }

    table.to_string()
}
