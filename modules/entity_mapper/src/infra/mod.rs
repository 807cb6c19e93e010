//! Infrastructure layer - dialect mappers and storage adapters

pub mod dialect;
pub mod storage;
