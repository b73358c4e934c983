//! Catalog mutation services.
//!
//! # Responsibility
//! - Orchestrate store mutations into use-case level operations.
//! - Keep multi-item cascades ordered leaves-first so observers never see a
//!   child pointing at an already-removed parent.

use crate::model::item::ItemId;
use crate::query::QueryError;
use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod catalog_service;
pub mod template_service;

pub type CascadeResult<T> = Result<T, CascadeError>;

/// Failures raised by lifecycle and cascade operations.
#[derive(Debug)]
pub enum CascadeError {
    /// Item access failure.
    Store(StoreError),
    /// Relationship resolution failure.
    Query(QueryError),
    /// The reserved entry-images field cannot be deleted or retyped.
    ReservedField(ItemId),
    /// The auto-generated "all" grouping cannot be deleted or renamed.
    ProtectedGrouping(ItemId),
    /// Structural precondition violated (wrong parent, duplicate name, ...).
    Validation(String),
}

impl Display for CascadeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Query(err) => write!(f, "{err}"),
            Self::ReservedField(id) => {
                write!(f, "field {id} is the reserved entry-images field")
            }
            Self::ProtectedGrouping(id) => {
                write!(f, "grouping {id} is the protected auto grouping")
            }
            Self::Validation(message) => write!(f, "{message}"),
        }
    }
}

impl Error for CascadeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Query(err) => Some(err),
            Self::ReservedField(_) | Self::ProtectedGrouping(_) | Self::Validation(_) => None,
        }
    }
}

impl From<StoreError> for CascadeError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<QueryError> for CascadeError {
    fn from(value: QueryError) -> Self {
        Self::Query(value)
    }
}