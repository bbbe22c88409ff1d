use indexmap::IndexSet;

use crate::domain::entities::row::RowId;

/// Ordered set of checkbox-selected rows, independent of edit state.
#[derive(Debug, Clone, Default)]
pub struct SelectionModel {
    selected: IndexSet<RowId>,
}

impl SelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn contains(&self, id: &RowId) -> bool {
        self.selected.contains(id)
    }

    pub fn select(&mut self, id: RowId) -> bool {
        self.selected.insert(id)
    }

    pub fn deselect(&mut self, id: &RowId) -> bool {
        self.selected.shift_remove(id)
    }

    /// Returns whether the row is selected afterwards.
    pub fn toggle(&mut self, id: RowId) -> bool {
        if self.selected.shift_remove(&id) {
            false
        } else {
            self.selected.insert(id);
            true
        }
    }

    pub fn clear(&mut self) -> usize {
        let count = self.selected.len();
        self.selected.clear();
        count
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&RowId) -> bool) {
        self.selected.retain(|id| keep(id));
    }

    pub fn ids(&self) -> Vec<RowId> {
        self.selected.iter().cloned().collect()
    }
}
