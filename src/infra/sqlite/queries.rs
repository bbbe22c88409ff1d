use std::path::Path;

use anyhow::{anyhow, Context, Result};
use rusqlite::{params, OptionalExtension, Transaction};
use tracing::debug;

use crate::domain::entities::edit::ChangeSet;
use crate::domain::entities::row::{Row, RowId, RowValues};
use crate::infra::sqlite::schema::open_connection;

fn encode_id(id: &RowId) -> Result<String> {
    serde_json::to_string(id).with_context(|| format!("failed to encode row id {id}"))
}

fn decode_id(raw: &str) -> Result<RowId> {
    serde_json::from_str(raw).with_context(|| format!("failed to decode row id {raw}"))
}

fn encode_values(values: &RowValues) -> Result<String> {
    serde_json::to_string(values).context("failed to encode row values")
}

fn decode_values(raw: &str) -> Result<RowValues> {
    serde_json::from_str(raw).context("failed to decode row values")
}

pub fn load_rows(db_path: &Path) -> Result<Vec<Row>> {
    let conn = open_connection(db_path)?;
    let mut stmt = conn
        .prepare("SELECT id, data FROM grid_row ORDER BY position")
        .context("failed to prepare row query")?;
    let raw_rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
        .context("failed to query rows")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to read rows")?;

    raw_rows
        .iter()
        .map(|(id, data)| {
            Ok(Row {
                id: decode_id(id)?,
                values: decode_values(data)?,
            })
        })
        .collect()
}

pub fn count_rows(db_path: &Path) -> Result<i64> {
    let conn = open_connection(db_path)?;
    conn.query_row("SELECT COUNT(*) FROM grid_row", [], |row| row.get(0))
        .context("failed to count rows")
}

fn next_position(tx: &Transaction<'_>) -> Result<i64> {
    tx.query_row(
        "SELECT COALESCE(MAX(position) + 1, 0) FROM grid_row",
        [],
        |row| row.get(0),
    )
    .context("failed to compute next row position")
}

fn insert_row(tx: &Transaction<'_>, row: &Row) -> Result<()> {
    let position = next_position(tx)?;
    tx.execute(
        "INSERT INTO grid_row(id, position, data) VALUES (?1, ?2, ?3)",
        params![encode_id(&row.id)?, position, encode_values(&row.values)?],
    )
    .with_context(|| format!("failed to insert row {}", row.id))?;
    Ok(())
}

/// Writes one committed change set atomically: edits merge into the stored
/// values, additions land after the last row.
pub fn apply_change_set(db_path: &Path, changes: &ChangeSet) -> Result<()> {
    let mut conn = open_connection(db_path)?;
    let tx = conn
        .transaction()
        .context("failed to start update transaction")?;

    for edit in &changes.edits {
        let key = encode_id(&edit.id)?;
        let stored: Option<String> = tx
            .query_row(
                "SELECT data FROM grid_row WHERE id = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .context("failed to load edited row")?;
        let Some(stored) = stored else {
            return Err(anyhow!("row {} does not exist", edit.id));
        };
        let mut values = decode_values(&stored)?;
        values.extend(edit.changes.clone());
        tx.execute(
            "UPDATE grid_row SET data = ?1, updated_at = CURRENT_TIMESTAMP WHERE id = ?2",
            params![encode_values(&values)?, key],
        )
        .with_context(|| format!("failed to update row {}", edit.id))?;
    }

    for addition in &changes.additions {
        insert_row(&tx, addition)?;
    }

    tx.commit().context("failed to commit change set")?;
    debug!(
        target: "infra.sqlite",
        edits = changes.edits.len(),
        additions = changes.additions.len(),
        "change set written"
    );
    Ok(())
}

/// Inserts `rows` only when the table is still empty; returns how many were written.
pub fn seed_rows(db_path: &Path, rows: &[Row]) -> Result<usize> {
    if count_rows(db_path)? > 0 {
        return Ok(0);
    }
    let mut conn = open_connection(db_path)?;
    let tx = conn
        .transaction()
        .context("failed to start seed transaction")?;
    for row in rows {
        insert_row(&tx, row)?;
    }
    tx.commit().context("failed to commit seed rows")?;
    Ok(rows.len())
}
