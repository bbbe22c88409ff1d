use tracing::debug;

use crate::domain::entities::mode::GridMode;
use crate::error::GridError;

/// Gatekeeper for the grid-wide interaction mode.
///
/// It only answers whether a request is legal and records the resulting
/// state; it never queues or merges a refused request.
#[derive(Debug, Clone, Default)]
pub struct GridModeMachine {
    mode: GridMode,
}

impl GridModeMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> GridMode {
        self.mode
    }

    /// Editing an existing row is refused while an add context is open;
    /// editing an added row is only possible inside that add context.
    pub fn check_start_edit(&self, target_is_addition: bool) -> Result<(), GridError> {
        match (self.mode, target_is_addition) {
            (GridMode::Add, false) | (GridMode::Edit, true) => Err(GridError::EditingLocked {
                mode: self.mode,
            }),
            _ => Ok(()),
        }
    }

    pub fn check_add(&self) -> Result<(), GridError> {
        match self.mode {
            GridMode::Edit => Err(GridError::EditingLocked { mode: self.mode }),
            _ => Ok(()),
        }
    }

    /// Leaving `select` for an editing mode needs the user to accept losing the selection.
    pub fn needs_selection_confirmation(&self, selected: usize) -> bool {
        self.mode == GridMode::Select && selected > 0
    }

    pub fn enter_edit(&mut self) {
        if !self.mode.is_interaction_locked() {
            self.transition(GridMode::Edit);
        }
    }

    pub fn enter_add(&mut self) {
        if !self.mode.is_interaction_locked() {
            self.transition(GridMode::Add);
        }
    }

    /// Called once every session is gone after a save or cancel.
    pub fn finish(&mut self, selected: usize) {
        let next = if selected > 0 {
            GridMode::Select
        } else {
            GridMode::None
        };
        self.transition(next);
    }

    /// `none` and `select` follow the selection size; editing modes ignore it.
    pub fn sync_selection(&mut self, selected: usize) {
        if self.mode.is_interaction_locked() {
            return;
        }
        self.finish(selected);
    }

    fn transition(&mut self, next: GridMode) {
        if self.mode != next {
            debug!(target: "grid.mode", from = %self.mode, to = %next, "mode transition");
            self.mode = next;
        }
    }
}
