use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Stable identifier of a row, either numeric or textual.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowId::Int(value) => write!(f, "{value}"),
            RowId::Text(value) => write!(f, "{value}"),
        }
    }
}

impl From<i64> for RowId {
    fn from(value: i64) -> Self {
        RowId::Int(value)
    }
}

impl From<i32> for RowId {
    fn from(value: i32) -> Self {
        RowId::Int(i64::from(value))
    }
}

impl From<&str> for RowId {
    fn from(value: &str) -> Self {
        RowId::Text(value.to_string())
    }
}

impl From<String> for RowId {
    fn from(value: String) -> Self {
        RowId::Text(value)
    }
}

/// A typed cell value. `Null` stands for "no value" in every field type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellValue {
    #[default]
    Null,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Null or the empty string; what `required` rejects.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(text) => text.is_empty(),
            _ => false,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        CellValue::Date(value)
    }
}

pub type RowValues = BTreeMap<String, CellValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: RowId,
    pub values: RowValues,
}

impl Row {
    pub fn new(id: impl Into<RowId>) -> Self {
        Self {
            id: id.into(),
            values: RowValues::new(),
        }
    }

    pub fn with(mut self, field: &str, value: impl Into<CellValue>) -> Self {
        self.values.insert(field.to_string(), value.into());
        self
    }

    /// Missing fields read as `Null`.
    pub fn value(&self, field: &str) -> CellValue {
        self.values.get(field).cloned().unwrap_or_default()
    }
}

/// The in-memory row array handed over by the row data source, kept in display order.
#[derive(Debug, Clone, Default)]
pub struct RowCollection {
    rows: IndexMap<RowId, Row>,
}

impl RowCollection {
    pub fn new(rows: Vec<Row>) -> Self {
        let mut collection = Self::default();
        for row in rows {
            if collection.rows.contains_key(&row.id) {
                tracing::warn!(target: "grid.rows", id = %row.id, "duplicate row id, keeping last");
            }
            collection.rows.insert(row.id.clone(), row);
        }
        collection
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, id: &RowId) -> bool {
        self.rows.contains_key(id)
    }

    pub fn get(&self, id: &RowId) -> Option<&Row> {
        self.rows.get(id)
    }

    pub fn get_mut(&mut self, id: &RowId) -> Option<&mut Row> {
        self.rows.get_mut(id)
    }

    pub fn push(&mut self, row: Row) {
        self.rows.insert(row.id.clone(), row);
    }

    pub fn remove(&mut self, id: &RowId) -> Option<Row> {
        self.rows.shift_remove(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.rows.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &RowId> {
        self.rows.keys()
    }

    pub fn to_vec(&self) -> Vec<Row> {
        self.rows.values().cloned().collect()
    }
}
