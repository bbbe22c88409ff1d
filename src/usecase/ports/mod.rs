pub mod repo;
pub mod save;
