pub mod commit;
pub mod grid;
pub mod mode;
pub mod persist_service;
pub mod selection;
pub mod session_store;
