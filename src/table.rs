//! Ordered rows of named columns, keyed by the first column.
//!
//! Components keep their reload-spanning bookkeeping here so a host can
//! persist it between runs with [`Table::save`] / [`Table::load`].

use crate::Result;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Append a row. Missing trailing cells are filled with empty strings and
    /// extra cells are dropped so every row matches the column count.
    pub fn append_row<I, S>(&mut self, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row: Vec<String> = values
            .into_iter()
            .take(self.columns.len())
            .map(Into::into)
            .collect();
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    /// Delete the first row whose key matches. Returns whether a row was removed.
    pub fn delete_row(&mut self, key: &str) -> bool {
        match self.rows.iter().position(|r| key_of(r) == key) {
            Some(i) => {
                self.rows.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn row(&self, key: &str) -> Option<&[String]> {
        self.rows
            .iter()
            .find(|r| key_of(r) == key)
            .map(Vec::as_slice)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.row(key).is_some()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.rows.iter().map(Vec::as_slice)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| key_of(r))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Load a table saved by [`Table::save`]. The stored columns must match
    /// `columns` exactly.
    pub fn load(path: impl AsRef<Path>, columns: &[&str]) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("read table file {}", path.display()))?;
        let table: Table = serde_json::from_str(&text)
            .with_context(|| format!("parse table file {}", path.display()))?;

        if table.columns != columns {
            bail!(
                "table file {} has columns {:?}, expected {:?}",
                path.display(),
                table.columns,
                columns
            );
        }
        Ok(table)
    }

    /// Like [`Table::load`], but a missing file yields an empty table.
    pub fn load_or_new(path: impl AsRef<Path>, columns: &[&str]) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Table::new(columns));
        }
        Table::load(path, columns)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("write table file {}", path.display()))
    }
}

fn key_of(row: &[String]) -> &str {
    row.first().map(String::as_str).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn keyed_rows_append_and_delete() {
        let mut table = Table::new(&["address", "value_out", "kind"]);
        table.append_row(["/a", "/ctl/a/valueOut", "CHOP"]);
        table.append_row(["/b"]);

        assert_eq!(table.len(), 2);
        assert_eq!(table.row("/b").unwrap(), ["/b", "", ""]);
        assert!(table.delete_row("/a"));
        assert!(!table.delete_row("/a"));
        assert_eq!(table.keys().collect::<Vec<_>>(), vec!["/b"]);

        table.clear();
        assert!(table.is_empty());
    }

    #[test]
    fn saves_and_loads_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("initialized.json");

        let mut table = Table::new(&["address"]);
        table.append_row(["/composition/layers/1/video/opacity"]);
        table.save(&path).unwrap();

        let loaded = Table::load(&path, &["address"]).unwrap();
        assert_eq!(loaded, table);
        assert!(Table::load(&path, &["address", "kind"]).is_err());
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let table = Table::load_or_new(dir.path().join("absent.json"), &["address"]).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns(), ["address"]);
    }
}
