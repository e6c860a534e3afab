//! In-memory rectangular table of nullable string cells
//!
//! Every loaded file, lookup and enriched result is a `Table`. Cells are
//! `None` when the source was empty or a left join found no match.

use crate::error::{PanelError, Result};
use std::collections::BTreeSet;

/// A single nullable cell
pub type Cell = Option<String>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Build a table from string literals, mapping empty strings to null
    pub fn from_strs(headers: &[&str], rows: &[&[&str]]) -> Self {
        let mut table = Table::new(headers.iter().map(|h| h.to_string()).collect());
        for row in rows {
            table.push_row(
                row.iter()
                    .map(|v| if v.is_empty() { None } else { Some(v.to_string()) })
                    .collect(),
            );
        }
        table
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row, padding with nulls or truncating to the header width
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.headers.len(), None);
        self.rows.push(row);
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Fail with the full list of absent columns
    pub fn require_columns(&self, table: &str, names: &[&str]) -> Result<()> {
        let missing: Vec<&str> = names
            .iter()
            .copied()
            .filter(|n| !self.has_column(n))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(PanelError::missing_columns(table, &missing))
        }
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)?.as_deref()
    }

    pub fn column_values(&self, name: &str) -> Option<Vec<Option<&str>>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r[idx].as_deref()).collect())
    }

    /// Add a column, or replace its values when it already exists
    pub fn set_column(&mut self, name: &str, values: Vec<Cell>) {
        debug_assert_eq!(values.len(), self.rows.len());
        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.headers.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
    }

    /// Returns false when `from` does not exist
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        match self.column_index(from) {
            Some(idx) => {
                self.headers[idx] = to.to_string();
                true
            }
            None => false,
        }
    }

    /// Keep only the named columns, in the given order
    pub fn select(&self, table: &str, names: &[&str]) -> Result<Table> {
        self.require_columns(table, names)?;
        let indices: Vec<usize> = names
            .iter()
            .filter_map(|n| self.column_index(n))
            .collect();
        let mut out = Table::new(names.iter().map(|n| n.to_string()).collect());
        for row in &self.rows {
            out.rows.push(indices.iter().map(|&i| row[i].clone()).collect());
        }
        Ok(out)
    }

    pub fn filter_rows<F>(&self, keep: F) -> Table
    where
        F: Fn(&[Cell]) -> bool,
    {
        Table {
            headers: self.headers.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// Stack tables vertically. Columns are the union of all parts in
    /// first-seen order; cells a part does not have are null.
    pub fn concat(parts: Vec<Table>) -> Table {
        let mut headers: Vec<String> = Vec::new();
        for part in &parts {
            for h in &part.headers {
                if !headers.contains(h) {
                    headers.push(h.clone());
                }
            }
        }

        let mut out = Table::new(headers);
        for part in parts {
            let mapping: Vec<usize> = part
                .headers
                .iter()
                .filter_map(|h| out.column_index(h))
                .collect();
            for row in part.rows {
                let mut full = vec![None; out.headers.len()];
                for (cell, &target) in row.into_iter().zip(&mapping) {
                    full[target] = cell;
                }
                out.rows.push(full);
            }
        }
        out
    }

    /// Sorted distinct non-null values of a column
    pub fn distinct_values(&self, name: &str) -> Vec<String> {
        let Some(idx) = self.column_index(name) else {
            return Vec::new();
        };
        let set: BTreeSet<&str> = self
            .rows
            .iter()
            .filter_map(|r| r[idx].as_deref())
            .collect();
        set.into_iter().map(String::from).collect()
    }
}
