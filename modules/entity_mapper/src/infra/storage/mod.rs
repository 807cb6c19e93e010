//! Storage layer - row cursors and repositories over concrete backends

pub mod json_row;
pub mod mapper;
pub mod repositories;

pub use json_row::JsonRow;
pub use repositories::{InMemoryRowRepository, SeaOrmForeignKeyRepository};
