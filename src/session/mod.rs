//! The in-progress invoice and every edit that can be applied to it.
//!
//! Edits are plain functions over `&mut Invoice`. Callers clone the current
//! draft, apply edits to the clone, and hand it back through
//! `CurrentInvoice::set`, which is the only way the shared value changes.

pub mod current;
pub mod edit;
pub mod positions;
pub mod sections;

use thiserror::Error;

use crate::catalog::Layout;

pub use current::{CurrentInvoice, SubscriptionId};

#[derive(Debug, Error, PartialEq)]
pub enum EditError {
    #[error("No item at index {0}")]
    ItemNotFound(usize),
    #[error("An invoice needs at least one item")]
    LastItem,
    #[error("Unknown invoice field '{0}'")]
    UnknownField(String),
    #[error("Section '{0}' not found")]
    SectionNotFound(String),
    #[error("Section '{0}' is not a table")]
    NotATable(String),
    #[error("No column at index {0}")]
    ColumnNotFound(usize),
    #[error("Unknown column '{0}'")]
    UnknownColumn(String),
    #[error("A table needs at least one column")]
    LastColumn,
    #[error("No row at index {0}")]
    RowNotFound(usize),
    #[error("Layout '{0}' has no gallery id")]
    NotInGallery(Layout),
}
