use thiserror::Error;

use crate::domain::entities::mode::GridMode;
use crate::domain::entities::row::RowId;
use crate::usecase::ports::repo::RepoError;

/// Every refusal the grid core can report. All of them are recoverable data:
/// the caller renders them, nothing is raised past the presentation layer.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("invalid column set: {0}")]
    InvalidColumns(String),
    #[error("row {0} does not exist")]
    UnknownRow(RowId),
    #[error("column '{0}' does not exist")]
    UnknownField(String),
    #[error("column '{0}' is not editable")]
    FieldNotEditable(String),
    #[error("another editing context is open (mode: {mode})")]
    EditingLocked { mode: GridMode },
    #[error("clearing {selected} selected rows was declined")]
    SelectionChangeDeclined { selected: usize },
    #[error("row {0} cannot be selected while editing")]
    RowNotSelectable(RowId),
    #[error("there are no pending changes to save")]
    NothingToSave,
    #[error("save refused: {count} validation errors")]
    ValidationFailed { count: usize },
    #[error("save callback failed: {0}")]
    Save(#[from] RepoError),
}
