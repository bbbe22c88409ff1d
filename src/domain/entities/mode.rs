use std::fmt;

use serde::Serialize;

/// Grid-wide interaction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GridMode {
    #[default]
    None,
    Edit,
    Add,
    Select,
}

impl GridMode {
    /// `Edit` and `Add` both lock out any new, unrelated editing context.
    pub fn is_interaction_locked(self) -> bool {
        matches!(self, GridMode::Edit | GridMode::Add)
    }
}

impl fmt::Display for GridMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GridMode::None => "none",
            GridMode::Edit => "edit",
            GridMode::Add => "add",
            GridMode::Select => "select",
        };
        f.write_str(label)
    }
}
