//! Failure kinds and the latched status channel.

use thiserror::Error;

use crate::item::HEADER_SIZE;
use crate::table::Table;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableError {
    #[error("memory allocation failed")]
    Mem,
    #[error("declared record size {size} is smaller than the {header}-byte item header")]
    ItemSize { size: usize, header: usize },
    #[error("probe wrapped around the slot array without finding a free slot")]
    Full,
}

impl TableError {
    pub(crate) fn item_size(size: usize) -> Self {
        TableError::ItemSize {
            size,
            header: HEADER_SIZE,
        }
    }
}

/// Outcome of the last mutating operation, latched on the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Status {
    #[default]
    Ok,
    MemError,
    ItemSizeError,
    Full,
    /// Only reported for an absent table.
    Unknown,
}

impl Status {
    /// Status of an optional table handle; `Unknown` when there is none.
    pub fn of<V, H>(table: Option<&Table<V, H>>) -> Status {
        table.map(Table::status).unwrap_or(Status::Unknown)
    }

    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }
}

impl From<TableError> for Status {
    fn from(e: TableError) -> Self {
        match e {
            TableError::Mem => Status::MemError,
            TableError::ItemSize { .. } => Status::ItemSizeError,
            TableError::Full => Status::Full,
        }
    }
}

impl<T> From<&Result<T, TableError>> for Status {
    fn from(r: &Result<T, TableError>) -> Self {
        match r {
            Ok(_) => Status::Ok,
            Err(e) => Status::from(*e),
        }
    }
}
