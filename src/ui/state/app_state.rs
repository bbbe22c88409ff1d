use std::collections::BTreeMap;

use dioxus::prelude::{use_signal, Signal};

use crate::domain::entities::mode::GridMode;
use crate::domain::entities::row::RowId;
use crate::domain::field_type::FieldType;
use crate::usecase::services::grid::EditableGrid;

/// Signals owned by the root component. The grid itself sits behind one
/// signal; everything the table renders is derived from it per frame.
pub struct AppState {
    pub grid: Signal<Result<EditableGrid, String>>,
    pub editing_text: Signal<String>,
    pub status: Signal<String>,
}

impl AppState {
    pub fn new(init: impl FnOnce() -> Result<EditableGrid, String>) -> Self {
        Self {
            grid: use_signal(init),
            editing_text: use_signal(String::new),
            status: use_signal(|| "Ready".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderView {
    pub field: String,
    pub title: String,
    pub editable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellView {
    pub field: String,
    pub text: String,
    pub editable: bool,
    pub editing: bool,
    pub dirty: bool,
    pub error: Option<String>,
    /// Option labels when the column is a select.
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowView {
    pub id: RowId,
    pub selected: bool,
    pub selectable: bool,
    pub dirty: bool,
    pub addition: bool,
    pub cells: Vec<CellView>,
}

impl RowView {
    pub fn style(&self) -> &'static str {
        if self.cells.iter().any(|cell| cell.error.is_some()) {
            "background: #fde2e2;"
        } else if self.addition {
            "background: #d9f7d9;"
        } else if self.dirty {
            "background: #fff4d6;"
        } else {
            ""
        }
    }
}

/// Snapshot of everything the table and toolbar need for one render.
#[derive(Debug, Clone, PartialEq)]
pub struct GridView {
    pub headers: Vec<HeaderView>,
    pub rows: Vec<RowView>,
    pub mode: GridMode,
    pub edited_rows: usize,
    pub error_count: usize,
    pub selected_count: usize,
    pub can_add: bool,
    pub can_save: bool,
    pub can_cancel: bool,
}

impl GridView {
    pub fn from_grid(grid: &EditableGrid) -> Self {
        let headers = grid
            .columns()
            .iter()
            .map(|column| HeaderView {
                field: column.field.clone(),
                title: column.header_name.clone(),
                editable: column.editable,
            })
            .collect();

        let current = grid.current_cell();
        let rows = grid
            .rows()
            .iter()
            .map(|row| {
                let errors: BTreeMap<String, String> = grid.row_errors(&row.id);
                let cells = grid
                    .columns()
                    .iter()
                    .map(|column| CellView {
                        field: column.field.clone(),
                        text: grid.display_value(&row.id, &column.field),
                        editable: column.editable,
                        editing: current.is_some_and(|cell| {
                            cell.row_id == row.id && cell.field == column.field
                        }),
                        dirty: grid.is_field_dirty(&row.id, &column.field),
                        error: errors.get(&column.field).cloned(),
                        options: match &column.field_type {
                            FieldType::Select { options } => {
                                options.iter().map(|option| option.label.clone()).collect()
                            }
                            _ => Vec::new(),
                        },
                    })
                    .collect();
                RowView {
                    id: row.id.clone(),
                    selected: grid.is_row_selected(&row.id),
                    selectable: grid.is_row_selectable(&row.id),
                    dirty: grid.is_row_dirty(&row.id),
                    addition: grid.is_addition(&row.id),
                    cells,
                }
            })
            .collect();

        Self {
            headers,
            rows,
            mode: grid.mode(),
            edited_rows: grid.edited_row_count(),
            error_count: grid.all_validation_errors().len(),
            selected_count: grid.selected_rows().len(),
            can_add: grid.can_add_row(),
            can_save: grid.can_save(),
            can_cancel: grid.can_cancel(),
        }
    }

    pub fn summary(&self) -> String {
        let mut parts = vec![format!("mode: {}", self.mode)];
        if self.edited_rows > 0 {
            parts.push(format!("{} edited", self.edited_rows));
        }
        if self.error_count > 0 {
            parts.push(format!("{} errors", self.error_count));
        }
        if self.selected_count > 0 {
            parts.push(format!("{} selected", self.selected_count));
        }
        parts.join(" | ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::column::ColumnDescriptor;
    use crate::domain::entities::row::{CellValue, Row};
    use crate::domain::field_type::SelectOption;
    use crate::domain::validation::ValidationRules;

    fn grid() -> EditableGrid {
        EditableGrid::builder(vec![
            ColumnDescriptor::new("id", "ID", FieldType::Number),
            ColumnDescriptor::new("name", "Name", FieldType::String)
                .editable()
                .rules(ValidationRules::new().required()),
            ColumnDescriptor::new(
                "role",
                "Role",
                FieldType::select(vec![
                    SelectOption::new("dev", "Developer"),
                    SelectOption::new("ops", "Operations"),
                ]),
            )
            .editable(),
        ])
        .rows(vec![
            Row::new(1).with("id", 1_i64).with("name", "John").with("role", "dev"),
            Row::new(2).with("id", 2_i64).with("name", "Mary").with("role", "ops"),
        ])
        .build()
        .expect("grid should build")
    }

    #[test]
    fn idle_grid_renders_plain_rows() {
        let view = GridView::from_grid(&grid());

        assert_eq!(view.headers.len(), 3);
        assert!(!view.headers[0].editable);
        assert_eq!(view.rows.len(), 2);
        assert_eq!(view.rows[0].cells[2].text, "Developer");
        assert_eq!(view.rows[0].cells[2].options, vec!["Developer", "Operations"]);
        assert!(view.rows.iter().all(|row| row.selectable && !row.dirty));
        assert_eq!(view.rows[0].style(), "");
        assert!(view.can_add && !view.can_save && !view.can_cancel);
        assert_eq!(view.summary(), "mode: none");
    }

    #[test]
    fn editing_marks_cell_and_locks_selection() {
        let mut grid = grid();
        let id = RowId::Int(1);
        grid.start_editing_row(&id, "name").expect("edit should start");
        grid.update_cell_value(&id, "name", CellValue::from(""))
            .expect("update should apply");

        let view = GridView::from_grid(&grid);
        let row = &view.rows[0];

        assert!(row.cells[1].editing);
        assert!(row.cells[1].dirty);
        assert_eq!(row.cells[1].error.as_deref(), Some("This field is required"));
        assert_eq!(row.style(), "background: #fde2e2;");
        assert!(view.rows.iter().all(|row| !row.selectable));
        assert!(!view.can_add && !view.can_save && view.can_cancel);
        assert_eq!(view.summary(), "mode: edit | 1 edited | 1 errors");
    }
}
