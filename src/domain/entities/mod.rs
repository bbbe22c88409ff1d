pub mod column;
pub mod edit;
pub mod mode;
pub mod row;
