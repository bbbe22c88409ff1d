use std::collections::HashSet;

use crate::domain::entities::row::CellValue;
use crate::domain::field_type::FieldType;
use crate::domain::validation::ValidationRules;
use crate::error::GridError;

/// Static description of one grid column, supplied by the integrator.
#[derive(Debug, Clone)]
pub struct ColumnDescriptor {
    pub field: String,
    pub header_name: String,
    pub editable: bool,
    pub field_type: FieldType,
    pub validation: ValidationRules,
    /// Overrides the field type's default for newly added rows.
    pub default_value: Option<CellValue>,
}

impl ColumnDescriptor {
    pub fn new(field: &str, header_name: &str, field_type: FieldType) -> Self {
        Self {
            field: field.to_string(),
            header_name: header_name.to_string(),
            editable: false,
            field_type,
            validation: ValidationRules::default(),
            default_value: None,
        }
    }

    pub fn editable(mut self) -> Self {
        self.editable = true;
        self
    }

    pub fn rules(mut self, rules: ValidationRules) -> Self {
        self.validation = rules;
        self
    }

    pub fn default_value(mut self, value: impl Into<CellValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn initial_value(&self) -> CellValue {
        self.default_value
            .clone()
            .unwrap_or_else(|| self.field_type.default_value())
    }
}

/// The immutable column list of one grid instance.
#[derive(Debug, Clone)]
pub struct ColumnSet {
    columns: Vec<ColumnDescriptor>,
}

impl ColumnSet {
    pub fn new(columns: Vec<ColumnDescriptor>) -> Result<Self, GridError> {
        let mut seen = HashSet::new();
        for column in &columns {
            if column.field.trim().is_empty() {
                return Err(GridError::InvalidColumns(
                    "column field name must not be empty".to_string(),
                ));
            }
            if !seen.insert(column.field.as_str()) {
                return Err(GridError::InvalidColumns(format!(
                    "duplicate column field '{}'",
                    column.field
                )));
            }
        }
        Ok(Self { columns })
    }

    pub fn get(&self, field: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|column| column.field == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn first_editable(&self) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|column| column.editable)
    }
}
