//! Core abstractions shared by every dialect.
//!
//! - [`value`]: SQL value representation and column metadata
//! - [`statement`]: parameterized statements, pagination windows, ordering
//! - [`driver`]: traits the native database driver is adapted onto
//!
//! Everything dialect-specific lives in the [`crate::dialect`] descriptor
//! table; the types here are deliberately dialect-agnostic.

pub mod driver;
pub mod statement;
pub mod value;

// Re-export commonly used types for convenience
pub use driver::{DriverConnection, DriverCursor, DriverResult};
pub use statement::{OrderDirection, OrderTerm, Ordering, Statement, Window};
pub use value::{ColumnMeta, SqlValue, WireTypeCode};
