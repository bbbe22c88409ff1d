//! Declarative per-field rules plus an optional cross-field row validator.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::entities::column::{ColumnDescriptor, ColumnSet};
use crate::domain::entities::row::{CellValue, RowValues};
use crate::domain::field_type::format_number;

/// Outcome of a custom rule: pass, fail with the generic message, or fail with its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomOutcome {
    Pass,
    Fail,
    Message(String),
}

impl From<bool> for CustomOutcome {
    fn from(value: bool) -> Self {
        if value {
            CustomOutcome::Pass
        } else {
            CustomOutcome::Fail
        }
    }
}

impl From<String> for CustomOutcome {
    fn from(value: String) -> Self {
        CustomOutcome::Message(value)
    }
}

impl From<&str> for CustomOutcome {
    fn from(value: &str) -> Self {
        CustomOutcome::Message(value.to_string())
    }
}

pub type CustomRuleFn = Arc<dyn Fn(&CellValue) -> CustomOutcome + Send + Sync>;

/// Cross-field validator: receives every current value, returns field -> message.
pub type RowValidatorFn = Arc<dyn Fn(&RowValues) -> BTreeMap<String, String> + Send + Sync>;

#[derive(Debug, Clone)]
pub struct PatternRule {
    pub regex: Regex,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundRule {
    pub value: f64,
    pub message: Option<String>,
}

/// Rules for one column. Evaluated in a fixed order and stop at the first failure:
/// required, pattern, min, max, custom.
#[derive(Clone, Default)]
pub struct ValidationRules {
    pub required: Option<Option<String>>,
    pub pattern: Option<PatternRule>,
    pub min: Option<BoundRule>,
    pub max: Option<BoundRule>,
    pub custom: Option<CustomRuleFn>,
}

impl fmt::Debug for ValidationRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationRules")
            .field("required", &self.required)
            .field("pattern", &self.pattern)
            .field("min", &self.min)
            .field("max", &self.max)
            .field("custom", &self.custom.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl ValidationRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self) -> Self {
        self.required = Some(None);
        self
    }

    pub fn required_with(mut self, message: &str) -> Self {
        self.required = Some(Some(message.to_string()));
        self
    }

    pub fn pattern(mut self, regex: Regex, message: Option<&str>) -> Self {
        self.pattern = Some(PatternRule {
            regex,
            message: message.map(str::to_string),
        });
        self
    }

    pub fn min(mut self, value: f64, message: Option<&str>) -> Self {
        self.min = Some(BoundRule {
            value,
            message: message.map(str::to_string),
        });
        self
    }

    pub fn max(mut self, value: f64, message: Option<&str>) -> Self {
        self.max = Some(BoundRule {
            value,
            message: message.map(str::to_string),
        });
        self
    }

    pub fn custom<F, O>(mut self, rule: F) -> Self
    where
        F: Fn(&CellValue) -> O + Send + Sync + 'static,
        O: Into<CustomOutcome>,
    {
        self.custom = Some(Arc::new(move |value: &CellValue| -> CustomOutcome {
            rule(value).into()
        }));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.required.is_none()
            && self.pattern.is_none()
            && self.min.is_none()
            && self.max.is_none()
            && self.custom.is_none()
    }
}

/// Fallback texts for rules that do not carry their own message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationMessages {
    pub required: String,
    pub pattern: String,
    pub min: String,
    pub max: String,
    pub invalid: String,
}

impl Default for ValidationMessages {
    fn default() -> Self {
        Self {
            required: "This field is required".to_string(),
            pattern: "Invalid format".to_string(),
            min: "Value must be at least {min}".to_string(),
            max: "Value must be at most {max}".to_string(),
            invalid: "Invalid value".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
        }
    }
}

#[derive(Clone, Default)]
pub struct Validator {
    messages: ValidationMessages,
    row_validator: Option<RowValidatorFn>,
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("messages", &self.messages)
            .field("row_validator", &self.row_validator.is_some())
            .finish()
    }
}

impl Validator {
    pub fn new(messages: ValidationMessages, row_validator: Option<RowValidatorFn>) -> Self {
        Self {
            messages,
            row_validator,
        }
    }

    pub fn messages(&self) -> &ValidationMessages {
        &self.messages
    }

    pub fn validate_value(&self, column: &ColumnDescriptor, value: &CellValue) -> ValidationResult {
        let rules = &column.validation;

        if value.is_empty() {
            return match &rules.required {
                Some(message) => ValidationResult::fail(
                    message.clone().unwrap_or_else(|| self.messages.required.clone()),
                ),
                None => ValidationResult::ok(),
            };
        }

        if let (Some(rule), Some(text)) = (&rules.pattern, value.as_text()) {
            if !rule.regex.is_match(text) {
                return ValidationResult::fail(
                    rule.message.clone().unwrap_or_else(|| self.messages.pattern.clone()),
                );
            }
        }

        if let Some(number) = value.as_number() {
            if let Some(rule) = &rules.min {
                if number < rule.value {
                    return ValidationResult::fail(rule.message.clone().unwrap_or_else(|| {
                        self.messages.min.replace("{min}", &format_number(rule.value))
                    }));
                }
            }
            if let Some(rule) = &rules.max {
                if number > rule.value {
                    return ValidationResult::fail(rule.message.clone().unwrap_or_else(|| {
                        self.messages.max.replace("{max}", &format_number(rule.value))
                    }));
                }
            }
        }

        match rules.custom.as_ref().map(|rule| rule(value)) {
            Some(CustomOutcome::Fail) => ValidationResult::fail(self.messages.invalid.clone()),
            Some(CustomOutcome::Message(message)) => ValidationResult::fail(message),
            Some(CustomOutcome::Pass) | None => ValidationResult::ok(),
        }
    }

    /// Field validation against a row's values; unknown fields validate as ok.
    pub fn validate_field(
        &self,
        columns: &ColumnSet,
        values: &RowValues,
        field: &str,
    ) -> ValidationResult {
        match columns.get(field) {
            Some(column) => {
                let value = values.get(field).cloned().unwrap_or_default();
                self.validate_value(column, &value)
            }
            None => ValidationResult::ok(),
        }
    }

    pub fn validate_row(
        &self,
        columns: &ColumnSet,
        values: &RowValues,
    ) -> BTreeMap<String, ValidationResult> {
        columns
            .iter()
            .map(|column| {
                (
                    column.field.clone(),
                    self.validate_field(columns, values, &column.field),
                )
            })
            .collect()
    }

    /// Cross-field errors; only meaningful once every field rule passes.
    pub fn row_level_errors(&self, values: &RowValues) -> BTreeMap<String, String> {
        self.row_validator
            .as_ref()
            .map(|validator| validator(values))
            .unwrap_or_default()
    }
}
