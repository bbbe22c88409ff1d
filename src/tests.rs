use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::config::GridConfig;
use crate::domain::entities::column::ColumnDescriptor;
use crate::domain::entities::edit::{ChangeSet, RowEdit};
use crate::domain::entities::mode::GridMode;
use crate::domain::entities::row::{CellValue, Row, RowId, RowValues};
use crate::domain::field_type::FieldType;
use crate::domain::validation::ValidationRules;
use crate::error::GridError;
use crate::infra::sqlite::repo::SqliteRowRepository;
use crate::usecase::ports::repo::{RepoError, RowRepository};
use crate::usecase::services::grid::EditableGrid;
use crate::usecase::services::persist_service::PersistService;

fn people_columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new("name", "Name", FieldType::String)
            .editable()
            .rules(ValidationRules::new().required()),
        ColumnDescriptor::new("age", "Age", FieldType::Number).editable(),
    ]
}

fn people() -> Vec<Row> {
    vec![
        Row::new(1).with("name", "John").with("age", 30_i64),
        Row::new(2).with("name", "Mary").with("age", 25_i64),
    ]
}

fn people_grid() -> EditableGrid {
    EditableGrid::builder(people_columns())
        .rows(people())
        .build()
        .expect("grid should build")
}

type SaveLog = Rc<RefCell<Vec<ChangeSet>>>;

fn recording_grid() -> (EditableGrid, SaveLog) {
    let log: SaveLog = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let grid = EditableGrid::builder(people_columns())
        .rows(people())
        .on_save(move |changes: &ChangeSet| -> Result<(), RepoError> {
            sink.borrow_mut().push(changes.clone());
            Ok(())
        })
        .build()
        .expect("grid should build");
    (grid, log)
}

fn values(pairs: &[(&str, CellValue)]) -> RowValues {
    pairs
        .iter()
        .map(|(field, value)| (field.to_string(), value.clone()))
        .collect()
}

#[test]
fn editing_back_to_original_value_clears_dirty_state() {
    let mut grid = people_grid();
    let id = RowId::Int(1);

    grid.start_editing_row(&id, "age").expect("edit should start");
    grid.update_cell_value(&id, "age", CellValue::from(31_i64))
        .expect("update should apply");
    assert!(grid.is_row_dirty(&id));
    assert_eq!(grid.edited_row_count(), 1);

    grid.update_cell_value(&id, "age", CellValue::from(30_i64))
        .expect("update should apply");

    assert!(!grid.is_row_dirty(&id));
    assert!(!grid.is_field_dirty(&id, "age"));
    assert_eq!(grid.edited_row_count(), 0);
    assert_eq!(grid.mode(), GridMode::Edit, "session stays open until save or cancel");
}

#[test]
fn added_row_reports_every_column_as_pending() {
    let mut grid = people_grid();

    let id = grid.add_row().expect("add should succeed");

    assert_eq!(id, RowId::from("new-1"));
    assert_eq!(grid.mode(), GridMode::Add);
    assert_eq!(
        grid.current_cell().map(|cell| cell.field.as_str()),
        Some("name")
    );
    let pending = grid.pending_changes();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].row_id, id);
    assert!(pending[0].is_addition);
    assert_eq!(
        pending[0].changes,
        values(&[
            ("name", CellValue::from("")),
            ("age", CellValue::from(0_i64)),
        ])
    );
    assert_eq!(grid.rows().len(), 3, "addition is appended to the collection");
}

#[test]
fn save_sends_only_net_edits_once() {
    let (mut grid, log) = recording_grid();
    let john = RowId::Int(1);
    let mary = RowId::Int(2);

    grid.start_editing_row(&john, "age").expect("edit should start");
    grid.update_cell_value(&john, "age", CellValue::from(31_i64))
        .expect("update should apply");
    grid.start_editing_row(&mary, "name").expect("second row joins the edit");
    grid.update_cell_input(&mary, "name", "Maria").expect("update should apply");
    grid.update_cell_input(&mary, "name", "Mary").expect("update should apply");

    let changes = grid.save_changes().expect("save should succeed");

    let mut expected = RowValues::new();
    expected.insert("age".to_string(), CellValue::from(31_i64));
    assert_eq!(
        changes.edits,
        vec![RowEdit {
            id: john.clone(),
            changes: expected,
        }]
    );
    assert!(changes.additions.is_empty());
    assert_eq!(log.borrow().len(), 1, "handler runs exactly once");
    assert_eq!(log.borrow()[0], changes);
    assert_eq!(grid.mode(), GridMode::None);
    assert_eq!(grid.open_session_count(), 0);
    assert_eq!(grid.cell_value(&john, "age"), CellValue::from(31_i64));
}

#[test]
fn required_field_error_blocks_save() {
    let (mut grid, log) = recording_grid();
    let id = RowId::Int(1);

    grid.start_editing_row(&id, "name").expect("edit should start");
    grid.update_cell_input(&id, "name", "").expect("update should apply");

    assert_eq!(
        grid.row_errors(&id).get("name").map(String::as_str),
        Some("This field is required")
    );
    assert!(grid.has_validation_errors());
    assert!(!grid.can_save());

    let result = grid.save_changes();

    assert!(matches!(result, Err(GridError::ValidationFailed { count: 1 })));
    assert!(log.borrow().is_empty(), "handler must not run");
    assert_eq!(grid.open_session_count(), 1);
    assert_eq!(grid.mode(), GridMode::Edit);
}

#[test]
fn cancel_after_add_removes_the_row() {
    let mut grid = people_grid();
    let id = grid.add_row().expect("add should succeed");

    let summary = grid.cancel_changes();

    assert_eq!(summary.discarded, 1);
    assert!(!grid.rows().contains(&id));
    assert_eq!(grid.rows().len(), 2);
    assert_eq!(grid.mode(), GridMode::None);
}

#[test]
fn cancel_restores_every_edited_row() {
    let mut grid = people_grid();
    let before = grid.rows().to_vec();
    let john = RowId::Int(1);
    let mary = RowId::Int(2);

    grid.start_editing_row(&john, "age").expect("edit should start");
    grid.update_cell_input(&john, "age", "44").expect("update should apply");
    grid.update_cell_input(&mary, "name", "Maria").expect("implicit session opens");
    assert_eq!(grid.cell_value(&mary, "name"), CellValue::from("Maria"));

    let summary = grid.cancel_changes();

    assert_eq!(summary.reverted, 2);
    assert_eq!(grid.rows().to_vec(), before);
    assert_eq!(grid.mode(), GridMode::None);
    assert!(!grid.can_cancel());
}

#[test]
fn add_is_refused_while_editing_existing_rows() {
    let mut grid = people_grid();
    let id = RowId::Int(1);
    grid.start_editing_row(&id, "age").expect("edit should start");

    let result = grid.add_row();

    assert!(matches!(
        result,
        Err(GridError::EditingLocked {
            mode: GridMode::Edit
        })
    ));
    assert!(!grid.can_add_row());
    assert_eq!(grid.open_session_count(), 1);
    assert_eq!(grid.rows().len(), 2);
}

#[test]
fn editing_existing_row_is_refused_while_adding() {
    let mut grid = people_grid();
    let added = grid.add_row().expect("add should succeed");

    let result = grid.start_editing_row(&RowId::Int(1), "name");

    assert!(matches!(
        result,
        Err(GridError::EditingLocked { mode: GridMode::Add })
    ));
    assert_eq!(grid.open_session_count(), 1);
    grid.update_cell_input(&added, "name", "Ann")
        .expect("the added row itself stays editable");
    assert_eq!(grid.cell_value(&added, "name"), CellValue::from("Ann"));
}

#[test]
fn saving_additions_appends_them_as_plain_rows() {
    let (mut grid, log) = recording_grid();
    let id = grid.add_row().expect("add should succeed");
    grid.update_cell_input(&id, "name", "Ann").expect("update should apply");
    grid.update_cell_input(&id, "age", "1,024").expect("update should apply");

    let changes = grid.save_changes().expect("save should succeed");

    assert!(changes.edits.is_empty());
    assert_eq!(changes.additions.len(), 1);
    assert_eq!(changes.additions[0].value("age"), CellValue::from(1024_i64));
    assert_eq!(log.borrow().len(), 1);
    assert!(grid.rows().contains(&id));
    assert!(!grid.is_addition(&id));
    assert_eq!(grid.mode(), GridMode::None);
}

#[test]
fn save_without_sessions_reports_nothing_to_save() {
    let (mut grid, log) = recording_grid();

    assert!(matches!(grid.save_changes(), Err(GridError::NothingToSave)));
    assert!(log.borrow().is_empty());
}

#[test]
fn failing_save_handler_keeps_sessions_open() {
    let mut grid = EditableGrid::builder(people_columns())
        .rows(people())
        .on_save(|_changes: &ChangeSet| -> Result<(), RepoError> {
            Err(RepoError::Message("disk full".to_string()))
        })
        .build()
        .expect("grid should build");
    let id = RowId::Int(1);
    grid.start_editing_row(&id, "age").expect("edit should start");
    grid.update_cell_input(&id, "age", "31").expect("update should apply");

    let result = grid.save_changes();

    match result {
        Err(GridError::Save(err)) => assert_eq!(err.to_string(), "disk full"),
        other => panic!("expected save failure, got {other:?}"),
    }
    assert!(grid.is_row_dirty(&id));
    assert_eq!(grid.mode(), GridMode::Edit);
}

#[test]
fn edit_with_active_selection_asks_before_clearing() {
    let answers = Rc::new(RefCell::new(vec![true, false]));
    let asked = Rc::new(RefCell::new(Vec::new()));
    let (answers_in, asked_in) = (Rc::clone(&answers), Rc::clone(&asked));
    let mut grid = EditableGrid::builder(people_columns())
        .rows(people())
        .selection_prompt(move |selected: usize| -> bool {
            asked_in.borrow_mut().push(selected);
            answers_in.borrow_mut().pop().unwrap_or(false)
        })
        .build()
        .expect("grid should build");
    grid.select_row(&RowId::Int(1)).expect("select should succeed");
    grid.select_row(&RowId::Int(2)).expect("select should succeed");
    assert_eq!(grid.mode(), GridMode::Select);

    let declined = grid.start_editing_row(&RowId::Int(1), "age");

    assert!(matches!(
        declined,
        Err(GridError::SelectionChangeDeclined { selected: 2 })
    ));
    assert_eq!(grid.mode(), GridMode::Select);
    assert_eq!(grid.selected_rows().len(), 2);
    assert_eq!(grid.open_session_count(), 0);

    grid.start_editing_row(&RowId::Int(1), "age")
        .expect("confirmed edit should start");

    assert_eq!(*asked.borrow(), vec![2, 2]);
    assert_eq!(grid.mode(), GridMode::Edit);
    assert!(grid.selected_rows().is_empty());
}

#[test]
fn rows_are_not_selectable_while_editing() {
    let mut grid = people_grid();
    grid.start_editing_row(&RowId::Int(1), "age").expect("edit should start");

    assert!(!grid.is_row_selectable(&RowId::Int(2)));
    assert!(matches!(
        grid.toggle_row_selection(&RowId::Int(2)),
        Err(GridError::RowNotSelectable(_))
    ));
    assert!(grid.select_all().is_err());

    grid.cancel_changes();

    assert!(grid.is_row_selectable(&RowId::Int(2)));
    assert!(grid.toggle_row_selection(&RowId::Int(2)).expect("toggle should succeed"));
    assert_eq!(grid.mode(), GridMode::Select);
    assert_eq!(grid.clear_selection(), 1);
    assert_eq!(grid.mode(), GridMode::None);
}

#[test]
fn read_only_and_unknown_columns_are_refused() {
    let mut grid = EditableGrid::builder(vec![
        ColumnDescriptor::new("id", "ID", FieldType::Number),
        ColumnDescriptor::new("name", "Name", FieldType::String).editable(),
    ])
    .rows(vec![Row::new(1).with("id", 1_i64).with("name", "John")])
    .build()
    .expect("grid should build");
    let id = RowId::Int(1);

    assert!(matches!(
        grid.start_editing_row(&id, "id"),
        Err(GridError::FieldNotEditable(_))
    ));
    assert!(matches!(
        grid.start_editing_row(&id, "salary"),
        Err(GridError::UnknownField(_))
    ));
    assert!(matches!(
        grid.start_editing_row(&RowId::Int(9), "name"),
        Err(GridError::UnknownRow(_))
    ));
    assert_eq!(grid.mode(), GridMode::None);
}

#[test]
fn row_validator_reports_against_named_field() {
    let mut grid = EditableGrid::builder(people_columns())
        .rows(people())
        .row_validator(|values: &RowValues| {
            let mut errors = BTreeMap::new();
            if values.get("name") == Some(&CellValue::from("Bob"))
                && values.get("age").and_then(CellValue::as_number) == Some(30.0)
            {
                errors.insert("age".to_string(), "Bob cannot be 30".to_string());
            }
            errors
        })
        .build()
        .expect("grid should build");
    let id = RowId::Int(1);

    grid.update_cell_input(&id, "name", "Bob").expect("update should apply");

    assert_eq!(
        grid.row_errors(&id).get("age").map(String::as_str),
        Some("Bob cannot be 30")
    );
    assert!(grid.has_validation_errors());

    grid.update_cell_input(&id, "age", "29").expect("update should apply");

    assert!(!grid.has_validation_errors());
}

#[test]
fn replace_rows_overlays_open_edits() {
    let mut grid = people_grid();
    let john = RowId::Int(1);
    grid.update_cell_input(&john, "age", "31").expect("update should apply");
    let added = grid.add_row();
    assert!(added.is_err(), "edit blocks add");

    grid.replace_rows(vec![
        Row::new(1).with("name", "Johnny").with("age", 30_i64),
        Row::new(3).with("name", "Zoe").with("age", 22_i64),
    ]);

    assert_eq!(grid.rows().len(), 2);
    assert_eq!(grid.cell_value(&john, "age"), CellValue::from(31_i64));
    assert_eq!(
        grid.rows().get(&john).map(|row| row.value("name")),
        Some(CellValue::from("Johnny"))
    );
    assert!(grid.is_row_dirty(&john));
    assert_eq!(grid.cell_value(&john, "name"), CellValue::from("Johnny"));
    assert_eq!(grid.display_value(&john, "name"), "Johnny");
    assert_eq!(
        grid.rows().get(&john).map(|row| row.value("age")),
        Some(CellValue::from(31_i64))
    );
    assert_eq!(grid.mode(), GridMode::Edit);

    grid.cancel_changes();

    assert_eq!(
        grid.rows().get(&john).map(|row| row.value("name")),
        Some(CellValue::from("Johnny")),
        "cancel falls back to the refreshed row"
    );
    assert_eq!(grid.cell_value(&john, "age"), CellValue::from(30_i64));
}

#[test]
fn replace_rows_clears_dirty_flag_when_source_catches_up() {
    let mut grid = people_grid();
    let john = RowId::Int(1);
    grid.update_cell_input(&john, "age", "31").expect("update should apply");

    grid.replace_rows(vec![
        Row::new(1).with("name", "John").with("age", 31_i64),
        Row::new(2).with("name", "Mary").with("age", 25_i64),
    ]);

    assert!(!grid.is_field_dirty(&john, "age"));
    assert_eq!(grid.edited_row_count(), 0);
    assert!(grid.pending_changes().is_empty());
}

#[test]
fn on_demand_validation_reads_live_values() {
    let mut grid = people_grid();
    let john = RowId::Int(1);

    assert!(grid.validate_field(&john, "name").valid);

    grid.update_cell_input(&john, "name", "").expect("update should apply");

    let name = grid.validate_field(&john, "name");
    assert!(!name.valid);
    assert_eq!(name.message.as_deref(), Some("This field is required"));
    let row = grid.validate_row(&john);
    assert!(!row["name"].valid);
    assert!(row["age"].valid);

    assert!(grid.validate_field(&RowId::Int(9), "name").valid);
    assert!(grid.validate_row(&RowId::Int(9)).is_empty());
    assert!(
        grid.validate_field(&RowId::Int(2), "name").valid,
        "rows without a session validate their stored values"
    );
}

#[test]
fn replace_rows_drops_sessions_of_vanished_rows() {
    let mut grid = people_grid();
    grid.update_cell_input(&RowId::Int(2), "name", "Maria")
        .expect("update should apply");

    grid.replace_rows(vec![Row::new(1).with("name", "John").with("age", 30_i64)]);

    assert_eq!(grid.open_session_count(), 0);
    assert_eq!(grid.mode(), GridMode::None);
}

#[test]
fn display_value_formats_through_field_type() {
    let mut grid = people_grid();
    let id = RowId::Int(1);

    grid.update_cell_value(&id, "age", CellValue::from("42"))
        .expect("text is coerced for number columns");

    assert_eq!(grid.cell_value(&id, "age"), CellValue::from(42_i64));
    assert_eq!(grid.display_value(&id, "age"), "42");
    assert_eq!(grid.display_value(&RowId::Int(9), "age"), "");
}

#[test]
fn pending_changes_json_lists_dirty_fields() {
    let mut grid = people_grid();
    let id = RowId::Int(1);
    grid.update_cell_input(&id, "age", "31").expect("update should apply");

    let json = grid.pending_changes_json().expect("pending changes should serialize");
    let parsed: serde_json::Value = serde_json::from_str(&json).expect("json should parse");

    assert_eq!(parsed[0]["row_id"], serde_json::json!(1));
    assert_eq!(parsed[0]["is_addition"], serde_json::json!(false));
    assert!(parsed[0]["changes"].get("age").is_some());
    assert!(parsed[0]["changes"].get("name").is_none());
}

#[test]
fn custom_new_row_prefix_comes_from_config() {
    let config = GridConfig::from_toml_str("[grid]\nnew_row_id_prefix = \"draft-\"")
        .expect("config should parse");
    let mut grid = EditableGrid::builder(people_columns())
        .rows(people())
        .config(config)
        .build()
        .expect("grid should build");

    let first = grid.add_row().expect("add should succeed");
    let second = grid.add_row().expect("add stays allowed in add mode");

    assert_eq!(first, RowId::from("draft-1"));
    assert_eq!(second, RowId::from("draft-2"));
    assert_eq!(grid.open_session_count(), 2);
}

#[test]
fn configured_required_message_is_used() {
    let config = GridConfig::from_toml_str("[messages]\nrequired = \"Cannot be blank\"")
        .expect("config should parse");
    let mut grid = EditableGrid::builder(people_columns())
        .rows(people())
        .config(config)
        .build()
        .expect("grid should build");
    let id = RowId::Int(1);

    grid.update_cell_input(&id, "name", "").expect("update should apply");

    assert_eq!(
        grid.row_errors(&id).get("name").map(String::as_str),
        Some("Cannot be blank")
    );
}

#[test]
fn duplicate_columns_are_rejected_at_build() {
    let result = EditableGrid::builder(vec![
        ColumnDescriptor::new("name", "Name", FieldType::String),
        ColumnDescriptor::new("name", "Again", FieldType::String),
    ])
    .build();

    assert!(matches!(result, Err(GridError::InvalidColumns(_))));
}

#[test]
fn save_through_sqlite_persists_edits_and_additions() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let repo = Rc::new(SqliteRowRepository::new(dir.path().join("grid.sqlite")));
    repo.init().expect("init should succeed");
    repo.seed(&people()).expect("seed should succeed");
    let persist = PersistService::new(repo.clone());
    let rows = persist.load_rows().expect("rows should load");
    let mut grid = EditableGrid::builder(people_columns())
        .rows(rows)
        .on_save(persist.clone())
        .build()
        .expect("grid should build");
    let john = RowId::Int(1);

    grid.update_cell_input(&john, "age", "31").expect("update should apply");
    grid.save_changes().expect("edit save should succeed");
    let added = grid.add_row().expect("add should succeed");
    grid.update_cell_input(&added, "name", "Ann").expect("update should apply");
    grid.save_changes().expect("addition save should succeed");

    let stored = persist.load_rows().expect("rows should reload");
    assert_eq!(stored.len(), 3);
    assert_eq!(stored[0].value("age"), CellValue::from(31_i64));
    assert_eq!(stored[1].value("name"), CellValue::from("Mary"));
    assert_eq!(stored[2].id, added);
    assert_eq!(stored[2].value("name"), CellValue::from("Ann"));
    assert_eq!(stored, grid.rows().to_vec());
}
