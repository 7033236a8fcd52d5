//! Rendering of command results.

use std::io::Write;

use clap::ValueEnum;
use serde::Serialize;

use super::CliError;

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Aligned columns
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
}

/// Column-aligned text table.
#[derive(Debug, Default)]
pub struct Table {
    headers: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&'static str]) -> Self {
        Self {
            headers: headers.to_vec(),
            rows: Vec::new(),
        }
    }

    pub fn row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }
        widths
    }

    pub fn write_to(&self, out: &mut impl Write) -> std::io::Result<()> {
        let widths = self.widths();
        writeln!(out, "{}", format_line(self.headers.iter().copied(), &widths))?;
        for row in &self.rows {
            writeln!(out, "{}", format_line(row.iter().map(String::as_str), &widths))?;
        }
        Ok(())
    }
}

fn format_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_owned()
}

/// Print `value` in the chosen format; `table` builds the table view.
pub fn emit<T, F>(format: OutputFormat, value: &T, table: F) -> Result<(), CliError>
where
    T: Serialize + ?Sized,
    F: FnOnce(&T) -> Table,
{
    let mut out = std::io::stdout().lock();
    match format {
        OutputFormat::Table => table(value).write_to(&mut out)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputFormat::Yaml => serde_yaml::to_writer(&mut out, value)?,
    }
    Ok(())
}

/// Print a one-line status message (server replies, file paths).
pub fn message(text: &str) -> Result<(), CliError> {
    if !text.is_empty() {
        writeln!(std::io::stdout().lock(), "{text}")?;
    }
    Ok(())
}

pub fn yes_no(value: bool) -> String {
    if value { "yes" } else { "no" }.to_owned()
}

pub fn or_dash(value: Option<impl ToString>) -> String {
    value.map_or_else(|| "-".to_owned(), |v| v.to_string())
}
