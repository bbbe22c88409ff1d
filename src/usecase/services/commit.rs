//! Change aggregation: turning open sessions into a save payload, applying a
//! committed payload to the row collection, and rolling sessions back.

use tracing::debug;

use crate::domain::entities::edit::{ChangeSet, EditSession, RowEdit};
use crate::domain::entities::row::{Row, RowCollection, RowId};
use crate::usecase::services::session_store::RowEditSessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RollbackSummary {
    pub reverted: usize,
    pub discarded: usize,
}

/// Additions carry every current value; edits carry only their net changes and
/// are skipped entirely when nothing is left to send.
pub fn collect_changes(store: &RowEditSessionStore) -> ChangeSet {
    let mut changes = ChangeSet::default();
    for (id, session) in store.iter() {
        if session.is_addition() {
            changes.additions.push(Row {
                id: id.clone(),
                values: session.current().clone(),
            });
        } else if session.is_dirty() {
            changes.edits.push(RowEdit {
                id: id.clone(),
                changes: session.changes(),
            });
        } else {
            debug!(target: "grid.commit", %id, "no-op edit skipped");
        }
    }
    changes
}

pub fn apply_changes(rows: &mut RowCollection, changes: &ChangeSet) {
    for edit in &changes.edits {
        match rows.get_mut(&edit.id) {
            Some(row) => row.values.extend(edit.changes.clone()),
            None => debug!(target: "grid.commit", id = %edit.id, "edited row vanished before commit"),
        }
    }
    for addition in &changes.additions {
        match rows.get_mut(&addition.id) {
            Some(row) => row.values = addition.values.clone(),
            None => rows.push(addition.clone()),
        }
    }
}

/// Added rows leave the collection; edited rows get their snapshot back verbatim.
pub fn rollback(rows: &mut RowCollection, sessions: Vec<(RowId, EditSession)>) -> RollbackSummary {
    let mut summary = RollbackSummary::default();
    for (id, session) in sessions {
        if session.is_addition() {
            rows.remove(&id);
            summary.discarded += 1;
        } else if let Some(row) = rows.get_mut(&id) {
            row.values = session.original().clone();
            summary.reverted += 1;
        }
    }
    summary
}
