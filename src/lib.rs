//! Editable data grid core: typed columns, per-row edit sessions with net
//! dirty tracking, layered validation, an interaction mode machine and an
//! all-or-nothing commit, plus a SQLite-backed Dioxus front end.

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod infra;
pub mod ui;
pub mod usecase;

#[cfg(test)]
mod tests;
