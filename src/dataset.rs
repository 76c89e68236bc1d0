use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashSet;

use crate::error::{Error, Result};

/// One table row keyed by column id, the shape the table component displays.
pub type Record = Map<String, Value>;

/// A rectangular, in-memory table of named columns.
///
/// Constructors validate the shape. A dataset deserialised from a config file
/// skips that check, so figures call [`Dataset::validate`] again at build time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Build a dataset from `(column name, values)` pairs, column by column.
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<Value>)>,
        S: Into<String>,
    {
        let (names, values): (Vec<String>, Vec<Vec<Value>>) = columns
            .into_iter()
            .map(|(name, values)| (name.into(), values))
            .unzip();

        let height = values.first().map(Vec::len).unwrap_or(0);
        if let Some((name, column)) = names
            .iter()
            .zip(&values)
            .find(|(_, column)| column.len() != height)
        {
            return Err(Error::MalformedDataset(format!(
                "column '{}' has {} values, expected {}",
                name,
                column.len(),
                height
            )));
        }

        let rows = (0..height)
            .map(|r| values.iter().map(|column| column[r].clone()).collect())
            .collect();

        Self::from_rows(names, rows)
    }

    /// Build a dataset from a header and a list of rows.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let dataset = Self { columns, rows };
        dataset.validate()?;
        Ok(dataset)
    }

    /// The dataset shown when no other data is configured: `{A: [1,2,3], B: [4,5,6]}`.
    pub fn sample() -> Self {
        Self {
            columns: vec!["A".into(), "B".into()],
            rows: vec![
                vec![json!(1), json!(4)],
                vec![json!(2), json!(5)],
                vec![json!(3), json!(6)],
            ],
        }
    }

    /// Check that the dataset has at least one column, unique column names
    /// and rows of matching width.
    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(Error::MalformedDataset("dataset has no columns".into()));
        }

        let mut seen = HashSet::new();
        for name in &self.columns {
            if name.is_empty() {
                return Err(Error::MalformedDataset("empty column name".into()));
            }
            if !seen.insert(name.as_str()) {
                return Err(Error::MalformedDataset(format!(
                    "duplicate column '{}'",
                    name
                )));
            }
        }

        if let Some((index, row)) = self
            .rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != self.columns.len())
        {
            return Err(Error::MalformedDataset(format!(
                "row {} has {} cells, expected {}",
                index,
                row.len(),
                self.columns.len()
            )));
        }

        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column_id: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column_id)
    }

    /// Value at `(row, column_id)`, or `None` when either is out of range.
    pub fn cell(&self, row: usize, column_id: &str) -> Option<&Value> {
        let col = self.column_index(column_id)?;
        self.rows.get(row)?.get(col)
    }

    pub fn records(&self) -> Vec<Record> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect::<Record>()
            })
            .collect()
    }
}
