//! Dialect-specific type mappers
//!
//! Each dialect implements the [`TypeMapper`](crate::domain::TypeMapper)
//! contract on its own, knowing its literal syntax for reading and its
//! conversion function for binding.

mod mysql;
mod postgres;
mod wkt;

pub use mysql::{MysqlEnumMapper, MysqlPointMapper};
pub use postgres::{PostgisPointMapper, PostgresEnumMapper};
