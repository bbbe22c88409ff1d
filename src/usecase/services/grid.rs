use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::GridConfig;
use crate::domain::entities::column::{ColumnDescriptor, ColumnSet};
use crate::domain::entities::edit::{CellError, CellKey, ChangeSet, PendingChange};
use crate::domain::entities::mode::GridMode;
use crate::domain::entities::row::{CellValue, Row, RowCollection, RowId, RowValues};
use crate::domain::field_type::FieldType;
use crate::domain::validation::{RowValidatorFn, ValidationResult, Validator};
use crate::error::GridError;
use crate::usecase::ports::save::{SaveHandler, SelectionPrompt};
use crate::usecase::services::commit::{self, RollbackSummary};
use crate::usecase::services::mode::GridModeMachine;
use crate::usecase::services::selection::SelectionModel;
use crate::usecase::services::session_store::RowEditSessionStore;

pub struct EditableGridBuilder {
    columns: Vec<ColumnDescriptor>,
    rows: Vec<Row>,
    row_validator: Option<RowValidatorFn>,
    save_handler: Option<Box<dyn SaveHandler>>,
    selection_prompt: Option<Box<dyn SelectionPrompt>>,
    config: GridConfig,
}

impl EditableGridBuilder {
    pub fn rows(mut self, rows: Vec<Row>) -> Self {
        self.rows = rows;
        self
    }

    pub fn row_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&RowValues) -> BTreeMap<String, String> + Send + Sync + 'static,
    {
        self.row_validator = Some(Arc::new(validator));
        self
    }

    pub fn on_save(mut self, handler: impl SaveHandler + 'static) -> Self {
        self.save_handler = Some(Box::new(handler));
        self
    }

    pub fn selection_prompt(mut self, prompt: impl SelectionPrompt + 'static) -> Self {
        self.selection_prompt = Some(Box::new(prompt));
        self
    }

    pub fn config(mut self, config: GridConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<EditableGrid, GridError> {
        let columns = Arc::new(ColumnSet::new(self.columns)?);
        let validator = Validator::new(self.config.messages.clone(), self.row_validator);
        Ok(EditableGrid {
            sessions: RowEditSessionStore::new(Arc::clone(&columns), validator),
            columns,
            rows: RowCollection::new(self.rows),
            mode: GridModeMachine::new(),
            selection: SelectionModel::new(),
            save_handler: self.save_handler,
            selection_prompt: self.selection_prompt,
            config: self.config,
            addition_counter: 0,
        })
    }
}

/// One editable grid instance: the row collection it was handed, the edit
/// sessions layered over it, the interaction mode and the checkbox selection.
///
/// Every user intent enters through a method here. Refusals come back as
/// [`GridError`] values and are logged; none of them leave partial state behind.
pub struct EditableGrid {
    columns: Arc<ColumnSet>,
    rows: RowCollection,
    sessions: RowEditSessionStore,
    mode: GridModeMachine,
    selection: SelectionModel,
    save_handler: Option<Box<dyn SaveHandler>>,
    selection_prompt: Option<Box<dyn SelectionPrompt>>,
    config: GridConfig,
    addition_counter: u64,
}

impl EditableGrid {
    pub fn builder(columns: Vec<ColumnDescriptor>) -> EditableGridBuilder {
        EditableGridBuilder {
            columns,
            rows: Vec::new(),
            row_validator: None,
            save_handler: None,
            selection_prompt: None,
            config: GridConfig::default(),
        }
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    pub fn rows(&self) -> &RowCollection {
        &self.rows
    }

    pub fn mode(&self) -> GridMode {
        self.mode.mode()
    }

    pub fn current_cell(&self) -> Option<&CellKey> {
        self.sessions.current_cell()
    }

    pub fn sessions(&self) -> &RowEditSessionStore {
        &self.sessions
    }

    fn editable_column(&self, field: &str) -> Result<&ColumnDescriptor, GridError> {
        let Some(column) = self.columns.get(field) else {
            warn!(target: "grid.edit", field, "unknown column");
            return Err(GridError::UnknownField(field.to_string()));
        };
        if !column.editable {
            warn!(target: "grid.edit", field, "column is read-only");
            return Err(GridError::FieldNotEditable(field.to_string()));
        }
        Ok(column)
    }

    fn require_row(&self, id: &RowId) -> Result<(), GridError> {
        if self.rows.contains(id) {
            Ok(())
        } else {
            warn!(target: "grid.edit", %id, "unknown row");
            Err(GridError::UnknownRow(id.clone()))
        }
    }

    /// Runs the gate for opening (or re-entering) an editing context on `id`.
    fn admit_edit(&mut self, id: &RowId) -> Result<(), GridError> {
        let is_addition = self.sessions.is_addition(id);
        if let Err(err) = self.mode.check_start_edit(is_addition) {
            warn!(target: "grid.mode", %id, mode = %self.mode.mode(), "edit refused");
            return Err(err);
        }
        self.confirm_selection_clear()
    }

    fn confirm_selection_clear(&mut self) -> Result<(), GridError> {
        let selected = self.selection.len();
        if !self.mode.needs_selection_confirmation(selected) {
            return Ok(());
        }
        let confirmed = match self.selection_prompt.as_mut() {
            Some(prompt) => prompt.confirm_clear(selected),
            None => {
                debug!(target: "grid.selection", selected, "no prompt installed, clearing selection");
                true
            }
        };
        if !confirmed {
            info!(target: "grid.selection", selected, "selection clear declined");
            return Err(GridError::SelectionChangeDeclined { selected });
        }
        self.selection.clear();
        self.mode.sync_selection(0);
        Ok(())
    }

    fn after_edit(&mut self, id: &RowId) {
        if !self.sessions.is_addition(id) {
            self.mode.enter_edit();
        }
    }

    pub fn start_editing_row(&mut self, id: &RowId, field: &str) -> Result<(), GridError> {
        self.editable_column(field)?;
        self.require_row(id)?;
        self.admit_edit(id)?;
        if let Some(row) = self.rows.get(id) {
            self.sessions.start_editing_row(row, field);
        }
        self.after_edit(id);
        Ok(())
    }

    /// Values of the wrong variant are coerced through the column's parser.
    pub fn update_cell_value(
        &mut self,
        id: &RowId,
        field: &str,
        value: CellValue,
    ) -> Result<(), GridError> {
        let column = self.editable_column(field)?;
        let value = if column.field_type.is_valid_type(&value) {
            value
        } else {
            let raw = FieldType::String.format(&value);
            debug!(target: "grid.edit", field, raw = %raw, "coercing value to column type");
            column.field_type.parse(&raw)
        };
        self.require_row(id)?;
        if !self.sessions.contains(id) {
            self.admit_edit(id)?;
            warn!(target: "grid.edit", %id, field, "cell updated without an open session");
        }
        if let Some(row) = self.rows.get(id) {
            self.sessions.update_cell_value(row, field, value.clone());
        }
        if let Some(row) = self.rows.get_mut(id) {
            row.values.insert(field.to_string(), value);
        }
        self.after_edit(id);
        Ok(())
    }

    /// Parses editor text through the column's field type, then updates the cell.
    pub fn update_cell_input(&mut self, id: &RowId, field: &str, raw: &str) -> Result<(), GridError> {
        let value = self.editable_column(field)?.field_type.parse(raw);
        self.update_cell_value(id, field, value)
    }

    fn next_addition_id(&mut self) -> RowId {
        loop {
            self.addition_counter += 1;
            let candidate = RowId::Text(format!(
                "{}{}",
                self.config.grid.new_row_id_prefix, self.addition_counter
            ));
            if !self.rows.contains(&candidate) && !self.sessions.contains(&candidate) {
                return candidate;
            }
        }
    }

    /// Appends a default-filled row and opens it as a fully dirty addition.
    pub fn add_row(&mut self) -> Result<RowId, GridError> {
        if let Err(err) = self.mode.check_add() {
            warn!(target: "grid.mode", mode = %self.mode.mode(), "add refused");
            return Err(err);
        }
        self.confirm_selection_clear()?;

        let id = self.next_addition_id();
        let row = Row {
            id: id.clone(),
            values: self
                .columns
                .iter()
                .map(|column| (column.field.clone(), column.initial_value()))
                .collect(),
        };
        self.sessions.insert_addition(&row);
        self.rows.push(row);
        self.mode.enter_add();
        info!(target: "grid.edit", %id, "row added");
        Ok(id)
    }

    pub fn stop_editing_row(&mut self, id: &RowId) {
        self.sessions.stop_editing_row(id);
    }

    pub fn stop_editing_cell(&mut self) {
        self.sessions.stop_editing_cell();
    }

    pub fn is_row_dirty(&self, id: &RowId) -> bool {
        self.sessions.is_row_dirty(id)
    }

    pub fn is_field_dirty(&self, id: &RowId, field: &str) -> bool {
        self.sessions.is_field_dirty(id, field)
    }

    pub fn is_addition(&self, id: &RowId) -> bool {
        self.sessions.is_addition(id)
    }

    pub fn row_errors(&self, id: &RowId) -> BTreeMap<String, String> {
        self.sessions.row_errors(id)
    }

    pub fn all_validation_errors(&self) -> Vec<CellError> {
        self.sessions.all_validation_errors()
    }

    pub fn has_validation_errors(&self) -> bool {
        self.sessions.has_validation_errors()
    }

    pub fn pending_changes(&self) -> Vec<PendingChange> {
        self.sessions.pending_changes()
    }

    pub fn pending_changes_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.pending_changes())
    }

    pub fn edited_row_count(&self) -> usize {
        self.sessions.edited_row_count()
    }

    pub fn open_session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Live values: the session's current values when one is open.
    fn live_values(&self, id: &RowId) -> Option<RowValues> {
        match self.sessions.session(id) {
            Some(session) => Some(session.current().clone()),
            None => self.rows.get(id).map(|row| row.values.clone()),
        }
    }

    pub fn cell_value(&self, id: &RowId, field: &str) -> CellValue {
        match self.sessions.session(id) {
            Some(session) => session.value(field),
            None => self
                .rows
                .get(id)
                .map(|row| row.value(field))
                .unwrap_or_default(),
        }
    }

    pub fn display_value(&self, id: &RowId, field: &str) -> String {
        let value = self.cell_value(id, field);
        match self.columns.get(field) {
            Some(column) => column.field_type.format(&value),
            None => FieldType::String.format(&value),
        }
    }

    pub fn validate_field(&self, id: &RowId, field: &str) -> ValidationResult {
        match self.live_values(id) {
            Some(values) => self
                .sessions
                .validator()
                .validate_field(&self.columns, &values, field),
            None => ValidationResult::ok(),
        }
    }

    pub fn validate_row(&self, id: &RowId) -> BTreeMap<String, ValidationResult> {
        match self.live_values(id) {
            Some(values) => self.sessions.validator().validate_row(&self.columns, &values),
            None => BTreeMap::new(),
        }
    }

    /// Re-validates every open session and records the results.
    pub fn validate_all(&mut self) -> usize {
        self.sessions.validate_all()
    }

    pub fn can_add_row(&self) -> bool {
        self.mode.check_add().is_ok()
    }

    pub fn can_save(&self) -> bool {
        !self.sessions.is_empty() && !self.sessions.has_validation_errors()
    }

    pub fn can_cancel(&self) -> bool {
        !self.sessions.is_empty()
    }

    /// Commits every open session at once, or nothing at all.
    ///
    /// The whole grid is re-validated first; any error refuses the save. The
    /// save handler sees the payload exactly once; if it fails, sessions stay
    /// open and nothing is applied.
    pub fn save_changes(&mut self) -> Result<ChangeSet, GridError> {
        if self.sessions.is_empty() {
            debug!(target: "grid.commit", "save requested with no open sessions");
            return Err(GridError::NothingToSave);
        }
        let count = self.sessions.validate_all();
        if count > 0 {
            warn!(target: "grid.commit", count, "save refused by validation");
            return Err(GridError::ValidationFailed { count });
        }

        let changes = commit::collect_changes(&self.sessions);
        if let Some(handler) = self.save_handler.as_mut() {
            if let Err(err) = handler.on_save(&changes) {
                warn!(target: "grid.commit", error = %err, "save handler failed, sessions kept");
                return Err(GridError::Save(err));
            }
        } else {
            debug!(target: "grid.commit", "no save handler installed");
        }

        commit::apply_changes(&mut self.rows, &changes);
        self.sessions.drain();
        self.mode.finish(self.selection.len());
        info!(
            target: "grid.commit",
            edits = changes.edits.len(),
            additions = changes.additions.len(),
            "changes saved"
        );
        Ok(changes)
    }

    /// Full rollback of every open session; never calls the save handler.
    pub fn cancel_changes(&mut self) -> RollbackSummary {
        let summary = commit::rollback(&mut self.rows, self.sessions.drain());
        let rows = &self.rows;
        self.selection.retain(|id| rows.contains(id));
        self.mode.finish(self.selection.len());
        info!(
            target: "grid.commit",
            reverted = summary.reverted,
            discarded = summary.discarded,
            "changes cancelled"
        );
        summary
    }

    /// Accepts a refreshed row array from the data source.
    ///
    /// Open sessions survive on rows that still exist: their snapshot moves
    /// to the fresh data and their net changes are replayed over it.
    /// Additions are carried over; sessions whose row disappeared are dropped.
    pub fn replace_rows(&mut self, rows: Vec<Row>) {
        let mut incoming = RowCollection::new(rows);
        let ids: Vec<RowId> = self.sessions.iter().map(|(id, _)| id.clone()).collect();
        for id in ids {
            let Some(session) = self.sessions.session(&id) else {
                continue;
            };
            if session.is_addition() {
                if !incoming.contains(&id) {
                    incoming.push(Row {
                        id: id.clone(),
                        values: session.current().clone(),
                    });
                }
            } else if let Some(row) = incoming.get_mut(&id) {
                if let Some(live) = self.sessions.rebase(row) {
                    row.values = live.clone();
                }
            } else {
                warn!(target: "grid.rows", %id, "row vanished from data source, session dropped");
                self.sessions.remove(&id);
            }
        }
        self.rows = incoming;

        let rows = &self.rows;
        self.selection.retain(|id| rows.contains(id));
        if self.sessions.is_empty() {
            self.mode.finish(self.selection.len());
        }
    }

    pub fn is_row_selectable(&self, id: &RowId) -> bool {
        !self.mode.mode().is_interaction_locked() && self.rows.contains(id)
    }

    pub fn is_row_selected(&self, id: &RowId) -> bool {
        self.selection.contains(id)
    }

    pub fn selected_rows(&self) -> Vec<RowId> {
        self.selection.ids()
    }

    fn require_selectable(&self, id: &RowId) -> Result<(), GridError> {
        if self.is_row_selectable(id) {
            return Ok(());
        }
        self.require_row(id)?;
        debug!(target: "grid.selection", %id, "row not selectable while editing");
        Err(GridError::RowNotSelectable(id.clone()))
    }

    pub fn select_row(&mut self, id: &RowId) -> Result<(), GridError> {
        self.require_selectable(id)?;
        self.selection.select(id.clone());
        self.mode.sync_selection(self.selection.len());
        Ok(())
    }

    pub fn deselect_row(&mut self, id: &RowId) -> Result<(), GridError> {
        self.require_selectable(id)?;
        self.selection.deselect(id);
        self.mode.sync_selection(self.selection.len());
        Ok(())
    }

    /// Returns whether the row ends up selected.
    pub fn toggle_row_selection(&mut self, id: &RowId) -> Result<bool, GridError> {
        self.require_selectable(id)?;
        let selected = self.selection.toggle(id.clone());
        self.mode.sync_selection(self.selection.len());
        Ok(selected)
    }

    pub fn select_all(&mut self) -> Result<usize, GridError> {
        if self.mode.mode().is_interaction_locked() {
            return Err(GridError::EditingLocked {
                mode: self.mode.mode(),
            });
        }
        for id in self.rows.ids() {
            self.selection.select(id.clone());
        }
        self.mode.sync_selection(self.selection.len());
        Ok(self.selection.len())
    }

    /// Always allowed; this is the explicit clear that releases retained selections.
    pub fn clear_selection(&mut self) -> usize {
        let cleared = self.selection.clear();
        self.mode.sync_selection(0);
        cleared
    }
}
