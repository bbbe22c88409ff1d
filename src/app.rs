use std::collections::BTreeMap;
use std::rc::Rc;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use dioxus::prelude::*;
use regex::Regex;
use rfd::{MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};
use tracing::{error, info};

use crate::config::{default_config_path, GridConfig};
use crate::domain::entities::column::ColumnDescriptor;
use crate::domain::entities::row::{CellValue, Row, RowValues};
use crate::domain::field_type::{FieldType, SelectOption};
use crate::domain::validation::{CustomOutcome, ValidationRules};
use crate::error::GridError;
use crate::infra::sqlite::repo::SqliteRowRepository;
use crate::ui::state::app_state::{AppState, GridView};
use crate::usecase::services::grid::EditableGrid;
use crate::usecase::services::persist_service::PersistService;

const CELL_STYLE: &str = "border: 1px solid #bbb; padding: 4px;";
const HEADER_STYLE: &str = "border: 1px solid #bbb; padding: 6px; background: #f2f2f2;";

pub fn demo_columns() -> Result<Vec<ColumnDescriptor>> {
    let email = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").context("invalid email pattern")?;
    Ok(vec![
        ColumnDescriptor::new("id", "ID", FieldType::Number),
        ColumnDescriptor::new("name", "Name", FieldType::String)
            .editable()
            .rules(ValidationRules::new().required()),
        ColumnDescriptor::new("age", "Age", FieldType::Number)
            .editable()
            .rules(
                ValidationRules::new()
                    .min(0.0, None)
                    .max(150.0, Some("Age looks wrong")),
            ),
        ColumnDescriptor::new("email", "Email", FieldType::String)
            .editable()
            .rules(ValidationRules::new().pattern(email, Some("Not an email address"))),
        ColumnDescriptor::new(
            "role",
            "Role",
            FieldType::select(vec![
                SelectOption::new("dev", "Developer"),
                SelectOption::new("ops", "Operations"),
                SelectOption::new("mgr", "Manager"),
            ]),
        )
        .editable()
        .default_value("dev"),
        ColumnDescriptor::new("active", "Active", FieldType::Boolean).editable(),
        ColumnDescriptor::new("joined", "Joined", FieldType::Date)
            .editable()
            .rules(ValidationRules::new().custom(|value: &CellValue| match value {
                CellValue::Date(date) if date.year() < 2000 => {
                    CustomOutcome::Message("Joined before the company existed".to_string())
                }
                _ => CustomOutcome::Pass,
            })),
    ])
}

pub fn demo_rows() -> Vec<Row> {
    let joined = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).map(CellValue::Date).unwrap_or_default();
    vec![
        Row::new(1)
            .with("id", 1_i64)
            .with("name", "John")
            .with("age", 30_i64)
            .with("email", "john@example.com")
            .with("role", "dev")
            .with("active", true)
            .with("joined", joined(2019, 4, 1)),
        Row::new(2)
            .with("id", 2_i64)
            .with("name", "Mary")
            .with("age", 25_i64)
            .with("email", "mary@example.com")
            .with("role", "ops")
            .with("active", true)
            .with("joined", joined(2021, 9, 15)),
        Row::new(3)
            .with("id", 3_i64)
            .with("name", "Li")
            .with("age", 41_i64)
            .with("email", "li@example.com")
            .with("role", "mgr")
            .with("active", false)
            .with("joined", joined(2012, 1, 9)),
    ]
}

/// Adult-only managers; a cross-field rule attached at row level.
fn demo_row_validator(values: &RowValues) -> BTreeMap<String, String> {
    let mut errors = BTreeMap::new();
    let is_manager = values.get("role") == Some(&CellValue::from("mgr"));
    let age = values.get("age").and_then(CellValue::as_number).unwrap_or(0.0);
    if is_manager && age < 18.0 {
        errors.insert("age".to_string(), "Managers must be adults".to_string());
    }
    errors
}

fn confirm_selection_clear(selected: usize) -> bool {
    MessageDialog::new()
        .set_level(MessageLevel::Warning)
        .set_title("Clear selection")
        .set_description(format!(
            "{selected} selected rows will be deselected to start editing. Continue?"
        ))
        .set_buttons(MessageButtons::YesNo)
        .show()
        == MessageDialogResult::Yes
}

pub fn bootstrap_grid() -> Result<EditableGrid> {
    let config = GridConfig::load(&default_config_path()?)?;
    let db_path = config.db_path()?;
    let repo = Rc::new(SqliteRowRepository::new(db_path));
    let persist = PersistService::new(repo.clone());
    let rows = persist.load_rows()?;
    let rows = if rows.is_empty() {
        let seeded = repo.seed(&demo_rows())?;
        info!(target: "app", seeded, "seeded demo rows");
        persist.load_rows()?
    } else {
        rows
    };

    let grid = EditableGrid::builder(demo_columns()?)
        .rows(rows)
        .row_validator(demo_row_validator)
        .on_save(persist)
        .selection_prompt(confirm_selection_clear)
        .config(config)
        .build()?;
    Ok(grid)
}

/// Runs one grid intent and reports the outcome on the status line.
fn dispatch(
    mut grid: Signal<Result<EditableGrid, String>>,
    mut status: Signal<String>,
    action: impl FnOnce(&mut EditableGrid) -> Result<String, GridError>,
) -> bool {
    let mut guard = grid.write();
    let Ok(grid) = &mut *guard else {
        return false;
    };
    match action(grid) {
        Ok(message) => {
            if !message.is_empty() {
                status.set(message);
            }
            true
        }
        Err(err) => {
            status.set(err.to_string());
            false
        }
    }
}

#[component]
pub fn App() -> Element {
    let state = AppState::new(|| {
        bootstrap_grid().map_err(|err| {
            error!(target: "app", error = %err, "grid bootstrap failed");
            format!("{err:#}")
        })
    });
    let grid = state.grid;
    let mut editing_text = state.editing_text;
    let status = state.status;

    let view = match &*grid.read() {
        Ok(grid) => GridView::from_grid(grid),
        Err(err) => {
            return rsx! {
                div {
                    p { "Failed to open the grid: {err}" }
                }
            };
        }
    };
    let summary = view.summary();
    let all_selected = !view.rows.is_empty() && view.selected_count == view.rows.len();

    rsx! {
        div {
            nav {
                style: "display: flex; gap: 12px; align-items: center; flex-wrap: wrap; padding: 8px 0;",
                button {
                    disabled: !view.can_add,
                    onclick: move |_| {
                        dispatch(grid, status, |grid| {
                            let id = grid.add_row()?;
                            Ok(format!("Row {id} added"))
                        });
                    },
                    "Add row"
                }
                button {
                    disabled: !view.can_save,
                    onclick: move |_| {
                        dispatch(grid, status, |grid| {
                            let changes = grid.save_changes()?;
                            Ok(format!(
                                "Saved {} edits and {} new rows",
                                changes.edits.len(),
                                changes.additions.len()
                            ))
                        });
                    },
                    "Save"
                }
                button {
                    disabled: !view.can_cancel,
                    onclick: move |_| {
                        dispatch(grid, status, |grid| {
                            let summary = grid.cancel_changes();
                            Ok(format!(
                                "Reverted {} rows, discarded {} new rows",
                                summary.reverted, summary.discarded
                            ))
                        });
                    },
                    "Cancel"
                }
                span { "{summary}" }
            }

            div {
                span { "{status}" }
            }

            table { style: "border-collapse: collapse; width: 100%; border: 1px solid #bbb;",
                thead {
                    tr {
                        th { style: HEADER_STYLE,
                            input {
                                r#type: "checkbox",
                                checked: all_selected,
                                disabled: view.mode.is_interaction_locked(),
                                onclick: move |_| {
                                    dispatch(grid, status, |grid| {
                                        if all_selected {
                                            grid.clear_selection();
                                        } else {
                                            grid.select_all()?;
                                        }
                                        Ok(String::new())
                                    });
                                }
                            }
                        }
                        for header in view.headers.iter() {
                            th { style: HEADER_STYLE, "{header.title}" }
                        }
                    }
                }
                tbody {
                    if view.rows.is_empty() {
                        tr {
                            td { style: CELL_STYLE,
                                colspan: view.headers.len() + 1,
                                "No rows"
                            }
                        }
                    }
                    {view.rows.iter().cloned().map(|row| {
                        let toggle_id = row.id.clone();
                        rsx!(
                            tr {
                                key: "{row.id}",
                                style: row.style(),
                                td { style: "{CELL_STYLE} text-align: center;",
                                    input {
                                        r#type: "checkbox",
                                        checked: row.selected,
                                        disabled: !row.selectable,
                                        onclick: move |_| {
                                            dispatch(grid, status, |grid| {
                                                grid.toggle_row_selection(&toggle_id)?;
                                                Ok(String::new())
                                            });
                                        }
                                    }
                                }
                                {row.cells.iter().cloned().map(|cell| {
                                    let id = row.id.clone();
                                    let field = cell.field.clone();
                                    let cell_flag_style = if cell.error.is_some() {
                                        "outline: 2px solid #d33;"
                                    } else if cell.dirty {
                                        "font-weight: bold;"
                                    } else {
                                        ""
                                    };
                                    let title = cell.error.clone().unwrap_or_default();
                                    if cell.editing {
                                        let input_id = id.clone();
                                        let input_field = field.clone();
                                        let key_id = id.clone();
                                        rsx!(
                                            td { style: "{CELL_STYLE} {cell_flag_style}", title: "{title}",
                                                if cell.options.is_empty() {
                                                    input {
                                                        value: editing_text(),
                                                        autofocus: true,
                                                        oninput: move |event| {
                                                            let raw = event.value();
                                                            editing_text.set(raw.clone());
                                                            dispatch(grid, status, |grid| {
                                                                grid.update_cell_input(&input_id, &input_field, &raw)?;
                                                                Ok(String::new())
                                                            });
                                                        },
                                                        onkeydown: move |event| {
                                                            if event.key() == Key::Enter || event.key() == Key::Escape {
                                                                dispatch(grid, status, |grid| {
                                                                    grid.stop_editing_cell();
                                                                    Ok(format!("Row {key_id} pending"))
                                                                });
                                                                editing_text.set(String::new());
                                                            }
                                                        }
                                                    }
                                                } else {
                                                    select {
                                                        value: "{cell.text}",
                                                        onchange: move |event| {
                                                            let raw = event.value();
                                                            dispatch(grid, status, |grid| {
                                                                grid.update_cell_input(&input_id, &input_field, &raw)?;
                                                                grid.stop_editing_cell();
                                                                Ok(String::new())
                                                            });
                                                        },
                                                        option { value: "", "" }
                                                        for label in cell.options.iter() {
                                                            option { value: "{label}", "{label}" }
                                                        }
                                                    }
                                                }
                                            }
                                        )
                                    } else {
                                        let text = cell.text.clone();
                                        let editable = cell.editable;
                                        rsx!(
                                            td { style: "{CELL_STYLE} {cell_flag_style}", title: "{title}",
                                                ondoubleclick: move |_| {
                                                    if !editable {
                                                        return;
                                                    }
                                                    let started = dispatch(grid, status, |grid| {
                                                        grid.start_editing_row(&id, &field)?;
                                                        Ok(String::new())
                                                    });
                                                    if started {
                                                        editing_text.set(text.clone());
                                                    }
                                                },
                                                "{cell.text}"
                                            }
                                        )
                                    }
                                })}
                            }
                        )
                    })}
                }
            }
        }
    }
}
