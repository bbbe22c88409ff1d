use thiserror::Error;

use crate::domain::entities::edit::ChangeSet;
use crate::domain::entities::row::Row;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepoError {
    #[error("{0}")]
    Message(String),
}

/// External row data source and persistence target.
pub trait RowRepository {
    fn init(&self) -> Result<(), RepoError>;
    fn load_rows(&self) -> Result<Vec<Row>, RepoError>;
    fn apply_changes(&self, changes: &ChangeSet) -> Result<(), RepoError>;
}
