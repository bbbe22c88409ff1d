use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::domain::entities::row::{CellValue, Row, RowId, RowValues};

/// The cell that currently owns editor focus.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CellKey {
    pub row_id: RowId,
    pub field: String,
}

impl CellKey {
    pub fn new(row_id: RowId, field: &str) -> Self {
        Self {
            row_id,
            field: field.to_string(),
        }
    }
}

/// Live edit state for one row, from first touch until save or cancel.
#[derive(Debug, Clone)]
pub struct EditSession {
    original: RowValues,
    current: RowValues,
    dirty: BTreeSet<String>,
    field_errors: BTreeMap<String, String>,
    row_errors: BTreeMap<String, String>,
    is_addition: bool,
}

impl EditSession {
    /// Snapshots an existing row; nothing is dirty yet.
    pub fn for_existing(row: &Row) -> Self {
        Self {
            original: row.values.clone(),
            current: row.values.clone(),
            dirty: BTreeSet::new(),
            field_errors: BTreeMap::new(),
            row_errors: BTreeMap::new(),
            is_addition: false,
        }
    }

    /// A freshly added row counts every field as a pending change.
    pub fn for_addition(values: RowValues) -> Self {
        Self {
            dirty: values.keys().cloned().collect(),
            original: values.clone(),
            current: values,
            field_errors: BTreeMap::new(),
            row_errors: BTreeMap::new(),
            is_addition: true,
        }
    }

    pub fn is_addition(&self) -> bool {
        self.is_addition
    }

    pub fn original(&self) -> &RowValues {
        &self.original
    }

    pub fn current(&self) -> &RowValues {
        &self.current
    }

    pub fn value(&self, field: &str) -> CellValue {
        self.current.get(field).cloned().unwrap_or_default()
    }

    fn original_value(&self, field: &str) -> CellValue {
        self.original.get(field).cloned().unwrap_or_default()
    }

    /// Stores the value and recomputes the field's net dirtiness.
    pub fn set_value(&mut self, field: &str, value: CellValue) {
        let changed = value != self.original_value(field);
        self.current.insert(field.to_string(), value);
        if self.is_addition || changed {
            self.dirty.insert(field.to_string());
        } else {
            self.dirty.remove(field);
        }
    }

    /// Moves the snapshot onto refreshed source values and replays the net
    /// changes over them; dirtiness is recomputed against the new snapshot.
    pub fn rebase(&mut self, fresh: &RowValues) {
        let changes = self.changes();
        self.original = fresh.clone();
        self.current = fresh.clone();
        self.dirty.clear();
        for (field, value) in changes {
            self.set_value(&field, value);
        }
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn is_field_dirty(&self, field: &str) -> bool {
        self.dirty.contains(field)
    }

    pub fn dirty_fields(&self) -> &BTreeSet<String> {
        &self.dirty
    }

    /// The dirty subset of the current values.
    pub fn changes(&self) -> RowValues {
        self.dirty
            .iter()
            .map(|field| (field.clone(), self.value(field)))
            .collect()
    }

    pub fn set_field_error(&mut self, field: &str, message: Option<String>) {
        match message {
            Some(message) => {
                self.field_errors.insert(field.to_string(), message);
            }
            None => {
                self.field_errors.remove(field);
            }
        }
    }

    pub fn set_row_errors(&mut self, errors: BTreeMap<String, String>) {
        self.row_errors = errors;
    }

    pub fn has_field_errors(&self) -> bool {
        !self.field_errors.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.field_errors.is_empty() || !self.row_errors.is_empty()
    }

    /// Field-level and row-level errors merged; a field rule's message wins.
    pub fn errors(&self) -> BTreeMap<String, String> {
        let mut merged = self.row_errors.clone();
        merged.extend(
            self.field_errors
                .iter()
                .map(|(field, message)| (field.clone(), message.clone())),
        );
        merged
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellError {
    pub row_id: RowId,
    pub field: String,
    pub message: String,
}

/// Derived preview of what a save would send for one row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingChange {
    pub row_id: RowId,
    pub changes: RowValues,
    pub is_addition: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowEdit {
    pub id: RowId,
    pub changes: RowValues,
}

/// Payload handed to the persistence callback once per save.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ChangeSet {
    pub edits: Vec<RowEdit>,
    pub additions: Vec<Row>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty() && self.additions.is_empty()
    }
}
