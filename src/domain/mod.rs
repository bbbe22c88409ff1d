pub mod entities;
pub mod field_type;
pub mod validation;
