//! Cross-dialect SQL translation layer.
//!
//! Applications write statements once, against a generic surface: `%s`
//! positional placeholders, host-typed parameter values, and LIMIT/OFFSET
//! expressed as an abstract row window. This crate translates that surface
//! onto a concrete backend:
//!
//! - [`rewrite`]: placeholder rewriting to the dialect's native marker
//!   syntax (`?`, `$1`, `@P1`), string-literal aware
//! - [`coerce`]: bidirectional value coercion between host types and what
//!   the backend's driver can bind or returns
//! - [`paginate`]: LIMIT/OFFSET emulation via native clauses, `ROW_NUMBER()`
//!   wrappers, `ROWNUM` nesting, or temp-table materialization
//! - [`cursor`]: a DB-API style cursor façade that drives all of the above
//!   against a native driver adapted onto the [`core::driver`] traits
//!
//! Backends are described by static [`dialect::Dialect`] tables rather than
//! per-backend types; supporting a new backend means filling in a table
//! entry.
//!
//! # Example
//!
//! Planning a page of an ordered query for SQL Server:
//!
//! ```
//! use sqlshim::core::{Ordering, Statement, Window};
//! use sqlshim::dialect::MSSQL;
//! use sqlshim::paginate::{plan, PagePlan};
//!
//! let stmt = Statement::bare("SELECT id, name FROM app_user");
//! let page = plan(
//!     &MSSQL,
//!     &stmt,
//!     Some(&Ordering::asc("id")),
//!     Window::new(Some(20), Some(30)),
//! )
//! .unwrap();
//! match page {
//!     PagePlan::Rewritten { stmt, .. } => {
//!         assert!(stmt.sql().contains("ROW_NUMBER() OVER (ORDER BY id ASC)"));
//!     }
//!     _ => unreachable!(),
//! }
//! ```

pub mod coerce;
pub mod config;
pub mod core;
pub mod cursor;
pub mod dialect;
pub mod error;
pub mod paginate;
pub mod rewrite;

pub use config::ConnectionSettings;
pub use crate::core::{
    ColumnMeta, DriverConnection, DriverCursor, DriverResult, OrderDirection, OrderTerm, Ordering,
    SqlValue, Statement, Window, WireTypeCode,
};
pub use cursor::{Connection, Cursor};
pub use dialect::{ConnectInfo, Dialect};
pub use error::{DriverError, Result, ShimError};
pub use paginate::{plan, PagePlan};
pub use rewrite::rewrite_placeholders;
