use crate::domain::entities::edit::ChangeSet;
use crate::usecase::ports::repo::RepoError;

/// Persistence callback, invoked exactly once per successful save request.
pub trait SaveHandler {
    fn on_save(&mut self, changes: &ChangeSet) -> Result<(), RepoError>;
}

impl<F> SaveHandler for F
where
    F: FnMut(&ChangeSet) -> Result<(), RepoError>,
{
    fn on_save(&mut self, changes: &ChangeSet) -> Result<(), RepoError> {
        self(changes)
    }
}

/// Asked before an edit or add clears an active row selection.
pub trait SelectionPrompt {
    fn confirm_clear(&mut self, selected: usize) -> bool;
}

impl<F> SelectionPrompt for F
where
    F: FnMut(usize) -> bool,
{
    fn confirm_clear(&mut self, selected: usize) -> bool {
        self(selected)
    }
}
