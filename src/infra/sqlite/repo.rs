use std::path::PathBuf;

use crate::domain::entities::edit::ChangeSet;
use crate::domain::entities::row::Row;
use crate::infra::sqlite::queries::{apply_change_set, load_rows, seed_rows};
use crate::infra::sqlite::schema::init_db;
use crate::usecase::ports::repo::{RepoError, RowRepository};

pub struct SqliteRowRepository {
    pub db_path: PathBuf,
}

impl SqliteRowRepository {
    pub fn new(db_path: PathBuf) -> Self {
        Self { db_path }
    }

    pub fn seed(&self, rows: &[Row]) -> Result<usize, RepoError> {
        seed_rows(&self.db_path, rows).map_err(|err| RepoError::Message(format!("{err:#}")))
    }
}

impl RowRepository for SqliteRowRepository {
    fn init(&self) -> Result<(), RepoError> {
        init_db(&self.db_path).map_err(|err| RepoError::Message(format!("{err:#}")))
    }

    fn load_rows(&self) -> Result<Vec<Row>, RepoError> {
        load_rows(&self.db_path).map_err(|err| RepoError::Message(format!("{err:#}")))
    }

    fn apply_changes(&self, changes: &ChangeSet) -> Result<(), RepoError> {
        apply_change_set(&self.db_path, changes)
            .map_err(|err| RepoError::Message(format!("{err:#}")))
    }
}
