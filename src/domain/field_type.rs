//! Per-column value semantics.
//!
//! Each [`FieldType`] knows how to turn raw editor input into a typed
//! [`CellValue`], how to render a value back into display text, which value a
//! freshly added row starts with, and whether a value belongs to the type at
//! all. Parsing never fails loudly: malformed input becomes `Null` and the
//! `required` rule decides whether that matters.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::entities::row::CellValue;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: CellValue,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<CellValue>, label: &str) -> Self {
        Self {
            value: value.into(),
            label: label.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    String,
    Number,
    Boolean,
    Date,
    Select { options: Vec<SelectOption> },
}

impl FieldType {
    pub fn select(options: Vec<SelectOption>) -> Self {
        FieldType::Select { options }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Select { .. } => "select",
        }
    }

    pub fn parse(&self, raw: &str) -> CellValue {
        match self {
            FieldType::String => CellValue::Text(raw.to_string()),
            FieldType::Number => parse_number(raw),
            FieldType::Boolean => CellValue::Bool(parse_bool(raw)),
            FieldType::Date => parse_date(raw),
            FieldType::Select { options } => {
                let needle = raw.trim();
                options
                    .iter()
                    .find(|option| format_plain(&option.value) == needle || option.label == needle)
                    .map(|option| option.value.clone())
                    .unwrap_or(CellValue::Null)
            }
        }
    }

    pub fn format(&self, value: &CellValue) -> String {
        match (self, value) {
            (_, CellValue::Null) => String::new(),
            (FieldType::Select { options }, value) => options
                .iter()
                .find(|option| &option.value == value)
                .map(|option| option.label.clone())
                .unwrap_or_else(|| format_plain(value)),
            (_, value) => format_plain(value),
        }
    }

    pub fn default_value(&self) -> CellValue {
        match self {
            FieldType::String => CellValue::Text(String::new()),
            FieldType::Number => CellValue::Number(0.0),
            FieldType::Boolean => CellValue::Bool(false),
            FieldType::Date => CellValue::Null,
            FieldType::Select { .. } => CellValue::Null,
        }
    }

    /// `Null` belongs to every type; absence is the `required` rule's business.
    pub fn is_valid_type(&self, value: &CellValue) -> bool {
        match (self, value) {
            (_, CellValue::Null) => true,
            (FieldType::String, CellValue::Text(_)) => true,
            (FieldType::Number, CellValue::Number(number)) => number.is_finite(),
            (FieldType::Boolean, CellValue::Bool(_)) => true,
            (FieldType::Date, CellValue::Date(_)) => true,
            (FieldType::Select { options }, value) => {
                options.iter().any(|option| &option.value == value)
            }
            _ => false,
        }
    }
}

fn parse_number(raw: &str) -> CellValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return CellValue::Null;
    }
    match trimmed.replace(',', "").parse::<f64>() {
        Ok(number) if number.is_finite() => CellValue::Number(number),
        _ => CellValue::Null,
    }
}

fn parse_bool(raw: &str) -> bool {
    let normalized = raw.trim().to_ascii_lowercase();
    !matches!(
        normalized.as_str(),
        "" | "false" | "0" | "no" | "off" | "null"
    )
}

fn parse_date(raw: &str) -> CellValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return CellValue::Null;
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        return CellValue::Date(date);
    }
    if let Ok(date_time) = DateTime::parse_from_rfc3339(trimmed) {
        return CellValue::Date(date_time.date_naive());
    }
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S")
        .map(|date_time| CellValue::Date(date_time.date()))
        .unwrap_or(CellValue::Null)
}

/// Integral values print without a fraction while they fit exactly in an `i64`.
pub(crate) fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

fn format_plain(value: &CellValue) -> String {
    match value {
        CellValue::Null => String::new(),
        CellValue::Text(text) => text.clone(),
        CellValue::Number(number) => format_number(*number),
        CellValue::Bool(flag) => flag.to_string(),
        CellValue::Date(date) => date.format(DATE_FORMAT).to_string(),
    }
}
