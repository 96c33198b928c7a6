//! Dataset assembly
//!
//! Flattens the per-record week rows into one ordered dataset and applies
//! the display sort: unit priority first, then the week label. Week labels
//! compare as plain strings; the zero-padded MMDD convention keeps that
//! chronological within a year.

use crate::model::OutputRow;

/// The final, ordered collection of output rows for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    pub rows: Vec<OutputRow>,
    /// True when any contributing file fell back to the placeholder week
    /// labels, meaning the date column is not trustworthy.
    pub fallback_window: bool,
}

impl Dataset {
    /// Sort rows into display order and wrap them up. The sort is stable,
    /// so rows that tie on `(priority, date)` keep their input order.
    pub fn assemble(mut rows: Vec<OutputRow>, fallback_window: bool) -> Self {
        rows.sort_by(|a, b| {
            (a.unit_priority, a.date_label.as_str()).cmp(&(b.unit_priority, b.date_label.as_str()))
        });
        Self {
            rows,
            fallback_window,
        }
    }

    /// Concatenate per-file datasets in input order. Each part keeps its
    /// own internal sort; batch output is grouped by source file, not
    /// re-sorted globally.
    pub fn merge(parts: Vec<Dataset>) -> Self {
        let mut merged = Dataset::default();
        for part in parts {
            merged.fallback_window |= part.fallback_window;
            merged.rows.extend(part.rows);
        }
        merged
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}
