//! Metric summary table across all experiments in a directory

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use colored::Colorize;

use crate::container::Container;
use crate::error::Result;
use crate::experiment::{Experiment, META_DIR_NAME};

use super::diff::render_node;

pub(crate) fn run(directory: &Path, sort: Option<&str>) -> Result<()> {
    let rows = collect_results(directory)?;

    if rows.is_empty() {
        println!("Directory {} contains no experiments.", directory.display());
        return Ok(());
    }

    println!();
    println!("{}", format!("Results for {}:", directory.display()).bold());
    println!();
    println!("{}", render_table(rows, sort));
    Ok(())
}

/// One experiment's flattened metrics, keyed by dotted metric name.
type ResultRow = (String, Vec<(String, String)>);

fn collect_results(directory: &Path) -> Result<Vec<ResultRow>> {
    let mut rows = Vec::new();

    let mut entries: Vec<_> = fs::read_dir(directory)?
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| Experiment::is_experiment(path))
        .collect();
    entries.sort();

    for path in entries {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let results_file = path.join(META_DIR_NAME).join("results.json");
        let metrics = if results_file.is_file() {
            Container::from_json_file(&results_file)?
                .as_flat_map()
                .into_iter()
                .map(|(key, node)| (key, render_node(&node)))
                .collect()
        } else {
            Vec::new()
        };
        rows.push((name, metrics));
    }

    Ok(rows)
}

fn render_table(mut rows: Vec<ResultRow>, sort: Option<&str>) -> String {
    let metrics: BTreeSet<String> = rows
        .iter()
        .flat_map(|(_, metrics)| metrics.iter().map(|(key, _)| key.clone()))
        .collect();

    if let Some(metric) = sort {
        // descending by the chosen metric, rows without it last
        rows.sort_by(|a, b| {
            let value = |row: &ResultRow| {
                row.1
                    .iter()
                    .find(|(key, _)| key == metric)
                    .and_then(|(_, v)| v.parse::<f64>().ok())
            };
            value(b)
                .partial_cmp(&value(a))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    let mut header = vec!["experiment".to_string()];
    header.extend(metrics.iter().cloned());

    let mut table: Vec<Vec<String>> = vec![header];
    for (name, row_metrics) in rows {
        let mut row = vec![name];
        for metric in &metrics {
            let cell = row_metrics
                .iter()
                .find(|(key, _)| key == metric)
                .map(|(_, value)| value.clone())
                .unwrap_or_default();
            row.push(cell);
        }
        table.push(row);
    }

    let widths: Vec<usize> = (0..table[0].len())
        .map(|col| table.iter().map(|row| row[col].len()).max().unwrap_or(0))
        .collect();

    table
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let line = row
                .iter()
                .zip(&widths)
                .map(|(cell, &width)| format!("{cell:width$}"))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string();
            if i == 0 {
                line.bold().to_string()
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
