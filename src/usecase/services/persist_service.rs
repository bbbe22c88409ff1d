use std::rc::Rc;

use crate::domain::entities::edit::ChangeSet;
use crate::domain::entities::row::Row;
use crate::usecase::ports::repo::{RepoError, RowRepository};
use crate::usecase::ports::save::SaveHandler;

/// Bridges a [`RowRepository`] to the grid: it supplies the initial rows and
/// receives every committed [`ChangeSet`].
#[derive(Clone)]
pub struct PersistService {
    repo: Rc<dyn RowRepository>,
}

impl PersistService {
    pub fn new(repo: Rc<dyn RowRepository>) -> Self {
        Self { repo }
    }

    pub fn load_rows(&self) -> Result<Vec<Row>, RepoError> {
        self.repo.init()?;
        self.repo.load_rows()
    }

    pub fn apply_changes(&self, changes: &ChangeSet) -> Result<(), RepoError> {
        self.repo.apply_changes(changes)
    }
}

impl SaveHandler for PersistService {
    fn on_save(&mut self, changes: &ChangeSet) -> Result<(), RepoError> {
        self.apply_changes(changes)
    }
}
