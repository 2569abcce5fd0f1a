//! Downstream driver traits.
//!
//! The translation layer sits on top of a native database driver that exposes
//! a DB-API style cursor: `execute`, `executemany`, and the `fetch*` family,
//! plus result-set metadata. Implementations adapt a concrete driver's types
//! onto these traits; the layer never opens sockets or owns pooling itself.

use async_trait::async_trait;

use crate::core::value::{ColumnMeta, SqlValue};
use crate::error::DriverError;

/// Result type for raw driver calls.
pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// A native driver connection.
///
/// One connection handles one statement lifecycle at a time; the layer
/// performs no internal locking and callers must serialize access.
#[async_trait]
pub trait DriverConnection: Send + Sync {
    type Cursor: DriverCursor;

    /// Open a cursor on this connection.
    async fn open_cursor(&self) -> DriverResult<Self::Cursor>;

    /// Roll back the current transaction.
    ///
    /// Required by dialects whose connections become unusable after an error
    /// until a rollback is issued.
    async fn rollback(&self) -> DriverResult<()>;
}

/// A native driver cursor.
///
/// The SQL handed to `execute`/`execute_many` already uses the dialect's
/// native placeholder markers and wire-coerced parameter values; rows coming
/// back are raw driver values that still need from-wire coercion.
#[async_trait]
pub trait DriverCursor: Send {
    /// Execute a statement with positional parameters.
    async fn execute(&mut self, sql: &str, params: &[SqlValue<'static>]) -> DriverResult<()>;

    /// Execute a statement once per parameter row.
    async fn execute_many(
        &mut self,
        sql: &str,
        param_lists: &[Vec<SqlValue<'static>>],
    ) -> DriverResult<()>;

    /// Fetch the next row, or `None` when the result set is exhausted.
    async fn fetch_one(&mut self) -> DriverResult<Option<Vec<SqlValue<'static>>>>;

    /// Fetch up to `size` rows.
    async fn fetch_many(&mut self, size: usize) -> DriverResult<Vec<Vec<SqlValue<'static>>>>;

    /// Fetch all remaining rows.
    async fn fetch_all(&mut self) -> DriverResult<Vec<Vec<SqlValue<'static>>>>;

    /// Column metadata of the current result set, in column order.
    ///
    /// Empty until a statement producing a result set has been executed.
    fn describe(&self) -> &[ColumnMeta];
}
