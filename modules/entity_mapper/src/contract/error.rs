//! Contract error types for the entity mapper
//!
//! Every failure raised by the engine carries the column, parameter or
//! relationship field it happened on, so callers can locate the offending data.

use thiserror::Error;

/// Entity mapper errors
#[derive(Debug, Error)]
pub enum MappingError {
    /// A column value cannot be converted to or from the target type
    #[error("cannot convert column '{column}' to {target_type}: {reason}")]
    Conversion {
        /// Column (or parameter) name
        column: String,
        /// Attempted host type
        target_type: &'static str,
        /// What went wrong
        reason: String,
    },

    /// No mapper can handle the runtime shape of the value
    #[error("no mapper for {value_kind} value in column '{column}' (type {type_key})")]
    UnsupportedType {
        /// Column (or parameter) name
        column: String,
        /// Semantic type the mapper was resolved for
        type_key: String,
        /// Runtime shape of the offending value
        value_kind: &'static str,
    },

    /// A dialect-specific textual literal failed its grammar
    #[error("malformed {grammar} literal in column '{column}': {literal:?} ({reason})")]
    MalformedLiteral {
        /// Column (or parameter) name
        column: String,
        /// Grammar the literal was parsed with (e.g. "WKT point")
        grammar: &'static str,
        /// Offending text
        literal: String,
        /// Parser diagnostic
        reason: String,
    },

    /// Child fetch failed while populating a relationship field
    #[error("failed to resolve relationship {entity_type}.{field}")]
    RelationshipResolution {
        /// Owning entity type
        entity_type: &'static str,
        /// Relationship field name
        field: &'static str,
        /// Underlying repository error
        #[source]
        source: anyhow::Error,
    },

    /// The row cursor failed to deliver a column value
    #[error("failed to read column '{column}'")]
    ColumnRead {
        /// Column name
        column: String,
        /// Underlying cursor error
        #[source]
        source: anyhow::Error,
    },

    /// A relationship declaration is inconsistent with the entity types
    #[error("invalid relationship {entity_type}.{field}: {reason}")]
    InvalidDescriptor {
        /// Owning entity type
        entity_type: &'static str,
        /// Relationship field name
        field: String,
        /// What is wrong with it
        reason: String,
    },

    /// A second mapper was registered for the same type and dialect
    #[error("type mapper already registered for {type_key} ({dialect})")]
    DuplicateRegistration {
        /// Semantic type
        type_key: String,
        /// Dialect qualifier ("generic" when unqualified)
        dialect: String,
    },
}

impl MappingError {
    /// Create a Conversion error
    pub fn conversion(
        column: impl Into<String>,
        target_type: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self::Conversion {
            column: column.into(),
            target_type,
            reason: reason.into(),
        }
    }

    /// Create a MalformedLiteral error
    pub fn malformed(
        column: impl Into<String>,
        grammar: &'static str,
        literal: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedLiteral {
            column: column.into(),
            grammar,
            literal: literal.into(),
            reason: reason.into(),
        }
    }

    /// Column or parameter the error refers to, if any
    pub fn column(&self) -> Option<&str> {
        match self {
            Self::Conversion { column, .. }
            | Self::UnsupportedType { column, .. }
            | Self::MalformedLiteral { column, .. }
            | Self::ColumnRead { column, .. } => Some(column),
            _ => None,
        }
    }

    /// Attach a column/parameter name to an error raised without one.
    ///
    /// `to_database` has no column to report; the binding layer fills it in.
    #[must_use]
    pub fn at_column(mut self, name: &str) -> Self {
        match &mut self {
            Self::Conversion { column, .. }
            | Self::UnsupportedType { column, .. }
            | Self::MalformedLiteral { column, .. }
            | Self::ColumnRead { column, .. }
                if column.is_empty() =>
            {
                *column = name.to_string();
            }
            _ => {}
        }
        self
    }
}
