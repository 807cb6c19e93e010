//! Contract layer - boundary types shared with the query-execution layer
//!
//! Boxed values, the row cursor, the entity identity capability and the
//! error taxonomy. Nothing here performs I/O.

pub mod entity;
pub mod error;
pub mod model;
pub mod row;

pub use entity::{Entity, ManyToOne, OneToMany, RelationField};
pub use error::MappingError;
pub use model::{DbValue, Dialect, Point};
pub use row::RowCursor;
