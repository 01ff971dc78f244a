//! CSV result reporting.
//!
//! One row per trial, flushed as soon as it is complete so partial results
//! survive an interrupted run. `finish` appends an `average` row over the
//! metric columns; parameter columns and the trial index are left blank
//! there, and a metric that was undefined in every trial stays blank too.

use crate::error::Result;
use crate::labels::LabelScheme;
use crate::search::ParamValue;
use std::collections::HashMap;
use std::io::Write;

/// One report cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// A rate or score.
    Float(f32),
    /// A confusion-matrix count.
    Count(u32),
    /// A tuned hyperparameter, excluded from averaging.
    Param(ParamValue),
    /// Free text (the trial index column).
    Text(String),
}

impl Cell {
    fn render(&self) -> String {
        match self {
            Self::Float(v) => format!("{v}"),
            Self::Count(v) => format!("{v}"),
            Self::Param(v) => v.to_string(),
            Self::Text(v) => v.clone(),
        }
    }

    /// The cell's contribution to the average row, if any.
    fn metric_value(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Count(v) => Some(*v as f32),
            Self::Param(_) | Self::Text(_) => None,
        }
    }
}

/// One trial's worth of report cells, keyed by column name.
#[derive(Debug, Clone, Default)]
pub struct Row {
    cells: HashMap<String, Cell>,
}

impl Row {
    /// Creates an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a cell.
    pub fn set(&mut self, column: &str, cell: Cell) {
        self.cells.insert(column.to_string(), cell);
    }

    /// Sets a rate cell, leaving the column blank when the rate is
    /// undefined.
    pub fn set_rate(&mut self, column: &str, rate: Option<f32>) {
        if let Some(v) = rate {
            self.set(column, Cell::Float(v));
        }
    }

    /// Looks up a cell by column name.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.cells.get(column)
    }
}

/// The report column layout for a labeling scheme.
///
/// Multi-class schemes get `TPR`/`TNR`/`PPV` triplets per class name and per
/// raw rhythm name; binary schemes get the fixed operating-point layout.
/// Sorted hyperparameter names come last in both.
#[must_use]
pub fn columns_for_scheme(
    scheme: LabelScheme,
    rhythm_names: &[String],
    param_names: &[String],
) -> Vec<String> {
    let mut columns = vec!["iter".to_string()];
    if scheme.is_multiclass() {
        let names = scheme
            .class_names()
            .iter()
            .copied()
            .chain(rhythm_names.iter().map(String::as_str));
        for name in names {
            for field in ["TPR", "TNR", "PPV"] {
                columns.push(format!("{field}[{name}]"));
            }
        }
    } else {
        for field in [
            "Se", "Sp", "PPV", "Acc", "Se(Sp95)", "Se(Sp97)", "Se(Sp99)", "TP", "TN", "FP", "FN",
        ] {
            columns.push(field.to_string());
        }
    }
    columns.extend(param_names.iter().cloned());
    columns
}

/// Line-buffered CSV writer with automatic averaging.
#[derive(Debug)]
pub struct ReportWriter<W: Write> {
    writer: W,
    columns: Vec<String>,
    // Per-column running (sum, count) over the defined metric cells.
    sums: Vec<(f32, usize)>,
}

impl<W: Write> ReportWriter<W> {
    /// Writes the header line and prepares for rows.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure.
    pub fn new(mut writer: W, columns: Vec<String>) -> Result<Self> {
        writeln!(writer, "{}", columns.join(","))?;
        writer.flush()?;
        let sums = vec![(0.0, 0); columns.len()];
        Ok(Self {
            writer,
            columns,
            sums,
        })
    }

    /// The column layout.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Writes and flushes one trial row; missing cells render empty.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure.
    pub fn write_row(&mut self, row: &Row) -> Result<()> {
        let rendered: Vec<String> = self
            .columns
            .iter()
            .map(|column| row.get(column).map(Cell::render).unwrap_or_default())
            .collect();
        writeln!(self.writer, "{}", rendered.join(","))?;
        self.writer.flush()?;

        for (sum, column) in self.sums.iter_mut().zip(self.columns.iter()) {
            if let Some(v) = row.get(column).and_then(Cell::metric_value) {
                sum.0 += v;
                sum.1 += 1;
            }
        }
        Ok(())
    }

    /// Appends the `average` row and flushes.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure.
    pub fn finish(mut self) -> Result<()> {
        let rendered: Vec<String> = self
            .columns
            .iter()
            .zip(self.sums.iter())
            .map(|(column, &(sum, count))| {
                if column == "iter" {
                    "average".to_string()
                } else if count > 0 {
                    format!("{}", sum / count as f32)
                } else {
                    String::new()
                }
            })
            .collect();
        writeln!(self.writer, "{}", rendered.join(","))?;
        self.writer.flush()?;
        Ok(())
    }
}
