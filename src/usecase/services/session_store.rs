use std::collections::BTreeMap;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::domain::entities::column::ColumnSet;
use crate::domain::entities::edit::{CellError, CellKey, EditSession, PendingChange};
use crate::domain::entities::row::{CellValue, Row, RowId, RowValues};
use crate::domain::validation::Validator;

/// Sole owner of in-progress edit state: one [`EditSession`] per touched row,
/// plus the pointer to the cell that currently has editor focus.
///
/// The store does not decide whether an edit is allowed; the grid coordinator
/// checks mode and column rules before calling in.
#[derive(Debug)]
pub struct RowEditSessionStore {
    columns: Arc<ColumnSet>,
    validator: Validator,
    sessions: IndexMap<RowId, EditSession>,
    current_cell: Option<CellKey>,
}

impl RowEditSessionStore {
    pub fn new(columns: Arc<ColumnSet>, validator: Validator) -> Self {
        Self {
            columns,
            validator,
            sessions: IndexMap::new(),
            current_cell: None,
        }
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn contains(&self, id: &RowId) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn session(&self, id: &RowId) -> Option<&EditSession> {
        self.sessions.get(id)
    }

    pub fn is_addition(&self, id: &RowId) -> bool {
        self.sessions
            .get(id)
            .map(EditSession::is_addition)
            .unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RowId, &EditSession)> {
        self.sessions.iter()
    }

    pub fn current_cell(&self) -> Option<&CellKey> {
        self.current_cell.as_ref()
    }

    /// Opens a session on first touch and moves focus to the cell.
    pub fn start_editing_row(&mut self, row: &Row, field: &str) {
        open_session(&mut self.sessions, row);
        self.current_cell = Some(CellKey::new(row.id.clone(), field));
    }

    pub fn update_cell_value(&mut self, row: &Row, field: &str, value: CellValue) {
        let session = open_session(&mut self.sessions, row);
        session.set_value(field, value);
        revalidate_field(&self.validator, &self.columns, session, field);
        trace!(
            target: "grid.session",
            id = %row.id,
            field,
            dirty = session.is_field_dirty(field),
            "cell updated"
        );
    }

    /// Registers a generated row; focus lands on the first editable column.
    pub fn insert_addition(&mut self, row: &Row) {
        self.sessions
            .insert(row.id.clone(), EditSession::for_addition(row.values.clone()));
        self.current_cell = self
            .columns
            .first_editable()
            .map(|column| CellKey::new(row.id.clone(), &column.field));
        debug!(target: "grid.session", id = %row.id, "addition session opened");
    }

    pub fn stop_editing_row(&mut self, id: &RowId) {
        if self
            .current_cell
            .as_ref()
            .is_some_and(|cell| &cell.row_id == id)
        {
            self.current_cell = None;
        }
    }

    pub fn stop_editing_cell(&mut self) {
        self.current_cell = None;
    }

    pub fn is_row_dirty(&self, id: &RowId) -> bool {
        self.sessions
            .get(id)
            .map(EditSession::is_dirty)
            .unwrap_or(false)
    }

    pub fn is_field_dirty(&self, id: &RowId, field: &str) -> bool {
        self.sessions
            .get(id)
            .map(|session| session.is_field_dirty(field))
            .unwrap_or(false)
    }

    pub fn row_errors(&self, id: &RowId) -> BTreeMap<String, String> {
        self.sessions
            .get(id)
            .map(EditSession::errors)
            .unwrap_or_default()
    }

    pub fn all_validation_errors(&self) -> Vec<CellError> {
        self.sessions
            .iter()
            .flat_map(|(id, session)| {
                session
                    .errors()
                    .into_iter()
                    .map(move |(field, message)| CellError {
                        row_id: id.clone(),
                        field,
                        message,
                    })
            })
            .collect()
    }

    pub fn has_validation_errors(&self) -> bool {
        self.sessions.values().any(EditSession::has_errors)
    }

    pub fn pending_changes(&self) -> Vec<PendingChange> {
        self.sessions
            .iter()
            .filter(|(_, session)| session.is_dirty())
            .map(|(id, session)| PendingChange {
                row_id: id.clone(),
                changes: session.changes(),
                is_addition: session.is_addition(),
            })
            .collect()
    }

    /// Sessions carrying a net change.
    pub fn edited_row_count(&self) -> usize {
        self.sessions
            .values()
            .filter(|session| session.is_dirty())
            .count()
    }

    /// Re-runs every column rule plus the row validator for one session.
    pub fn validate_session(&mut self, id: &RowId) -> BTreeMap<String, String> {
        let Some(session) = self.sessions.get_mut(id) else {
            return BTreeMap::new();
        };
        validate_whole_session(&self.validator, &self.columns, session);
        session.errors()
    }

    /// Whole-grid validation; returns the number of failing cells.
    pub fn validate_all(&mut self) -> usize {
        for session in self.sessions.values_mut() {
            validate_whole_session(&self.validator, &self.columns, session);
        }
        self.all_validation_errors().len()
    }

    /// Re-anchors an existing-row session on refreshed source data and
    /// re-validates what it touches. Returns the live values, if a session exists.
    pub fn rebase(&mut self, row: &Row) -> Option<&RowValues> {
        let session = self.sessions.get_mut(&row.id)?;
        session.rebase(&row.values);
        let fields: Vec<String> = session
            .dirty_fields()
            .iter()
            .cloned()
            .chain(session.errors().into_keys())
            .collect();
        for field in &fields {
            let result = self.validator.validate_field(&self.columns, session.current(), field);
            session.set_field_error(field, result.message);
        }
        refresh_row_errors(&self.validator, session);
        debug!(target: "grid.session", id = %row.id, "session rebased on refreshed row");
        Some(session.current())
    }

    pub fn remove(&mut self, id: &RowId) -> Option<EditSession> {
        self.stop_editing_row(id);
        self.sessions.shift_remove(id)
    }

    /// Empties the store, handing every session to the caller in open order.
    pub fn drain(&mut self) -> Vec<(RowId, EditSession)> {
        self.current_cell = None;
        self.sessions.drain(..).collect()
    }
}

fn open_session<'a>(sessions: &'a mut IndexMap<RowId, EditSession>, row: &Row) -> &'a mut EditSession {
    sessions.entry(row.id.clone()).or_insert_with(|| {
        debug!(target: "grid.session", id = %row.id, "session opened");
        EditSession::for_existing(row)
    })
}

fn revalidate_field(
    validator: &Validator,
    columns: &ColumnSet,
    session: &mut EditSession,
    field: &str,
) {
    let result = validator.validate_field(columns, session.current(), field);
    session.set_field_error(field, result.message);
    refresh_row_errors(validator, session);
}

fn validate_whole_session(validator: &Validator, columns: &ColumnSet, session: &mut EditSession) {
    for (field, result) in validator.validate_row(columns, session.current()) {
        session.set_field_error(&field, result.message);
    }
    refresh_row_errors(validator, session);
}

/// Cross-field rules only run once every field rule passes; stale row errors are dropped.
fn refresh_row_errors(validator: &Validator, session: &mut EditSession) {
    let errors = if session.has_field_errors() {
        BTreeMap::new()
    } else {
        validator.row_level_errors(session.current())
    };
    session.set_row_errors(errors);
}
