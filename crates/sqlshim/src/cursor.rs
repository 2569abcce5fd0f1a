//! Connection and cursor façade.
//!
//! [`Cursor`] is the execution surface that ties the layer together: it
//! rewrites placeholders, coerces parameters to the wire, drives the native
//! driver cursor, and decodes fetched rows through the column metadata. It
//! also owns the connection-hygiene rules a raw driver does not give you:
//! rollback after errors on dialects that require it, session init statements
//! on fresh connections, and the multi-statement temp-table sequence for
//! materialized pagination.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::coerce;
use crate::core::driver::{DriverConnection, DriverCursor};
use crate::core::statement::{Ordering, Statement, Window};
use crate::core::value::{ColumnMeta, SqlValue};
use crate::dialect::Dialect;
use crate::error::{Result, ShimError};
use crate::paginate::{self, MaterializePlan, PagePlan};
use crate::rewrite;

/// A dialect-aware wrapper around a native driver connection.
pub struct Connection<D: DriverConnection> {
    driver: D,
    dialect: &'static Dialect,
}

impl<D: DriverConnection> Connection<D> {
    pub fn new(driver: D, dialect: &'static Dialect) -> Self {
        Connection { driver, dialect }
    }

    pub fn dialect(&self) -> &'static Dialect {
        self.dialect
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Run the dialect's session init statements.
    ///
    /// Call once per fresh driver connection, before any application
    /// statements.
    pub async fn init_session(&self) -> Result<()> {
        if self.dialect.session_init.is_empty() {
            return Ok(());
        }
        let mut cursor = self.driver.open_cursor().await?;
        for &sql in self.dialect.session_init {
            debug!(dialect = self.dialect.name, sql, "session init");
            cursor.execute(sql, &[]).await?;
        }
        Ok(())
    }

    /// Open a translating cursor on this connection.
    pub async fn cursor(&self) -> Result<Cursor<'_, D>> {
        let inner = self.driver.open_cursor().await?;
        Ok(Cursor {
            conn: self,
            inner,
            strip_leading_rownum: false,
            buffer: None,
            meta_override: None,
        })
    }
}

/// A translating cursor.
///
/// Statements go in with generic `%s` placeholders and host-typed parameters;
/// rows come out decoded through the result set's column metadata. State from
/// one statement (row buffer, metadata override, rownum stripping) is reset
/// by the next execute call.
pub struct Cursor<'a, D: DriverConnection> {
    conn: &'a Connection<D>,
    inner: D::Cursor,
    /// The current result set carries a synthetic leading row-number column.
    strip_leading_rownum: bool,
    /// Pre-fetched rows served instead of the driver cursor (materialized
    /// pagination, empty windows).
    buffer: Option<VecDeque<Vec<SqlValue<'static>>>>,
    /// Metadata captured before the driver's current result set was replaced
    /// by shim statements.
    meta_override: Option<Vec<ColumnMeta>>,
}

impl<D: DriverConnection> Cursor<'_, D> {
    /// Execute one statement.
    pub async fn execute(&mut self, stmt: &Statement) -> Result<()> {
        self.reset();
        let params = coerce::to_wire_params(stmt.params(), self.conn.dialect)?;
        let sql =
            rewrite::rewrite_placeholders(stmt.sql(), params.len(), self.conn.dialect.placeholder)?;
        self.run(&sql, &params).await
    }

    /// Execute a statement once per parameter row.
    ///
    /// An empty batch is a no-op; callers routinely build batches from
    /// collections that may be empty.
    pub async fn execute_many(
        &mut self,
        sql: &str,
        param_lists: &[Vec<SqlValue<'static>>],
    ) -> Result<()> {
        self.reset();
        let Some(first) = param_lists.first() else {
            return Ok(());
        };
        let width = first.len();
        let native =
            rewrite::rewrite_placeholders(sql, width, self.conn.dialect.placeholder)?;
        let mut wire_lists = Vec::with_capacity(param_lists.len());
        for list in param_lists {
            if list.len() != width {
                return Err(ShimError::malformed(format!(
                    "parameter rows have inconsistent widths ({} vs {width})",
                    list.len()
                )));
            }
            wire_lists.push(coerce::to_wire_params(list, self.conn.dialect)?);
        }
        debug!(sql = %native, rows = wire_lists.len(), "execute_many");
        let result = self.inner.execute_many(&native, &wire_lists).await;
        self.absorb(result).await
    }

    /// Execute a query with a pagination window applied.
    ///
    /// The window is half-open [low, high); an empty window skips execution
    /// and serves an empty result set.
    pub async fn execute_paginated(
        &mut self,
        stmt: &Statement,
        ordering: Option<&Ordering>,
        window: Window,
    ) -> Result<()> {
        self.reset();
        match paginate::plan(self.conn.dialect, stmt, ordering, window)? {
            PagePlan::Empty => {
                self.buffer = Some(VecDeque::new());
                Ok(())
            }
            PagePlan::Rewritten {
                stmt,
                strip_leading_rownum,
            } => {
                let params = coerce::to_wire_params(stmt.params(), self.conn.dialect)?;
                let sql = rewrite::rewrite_placeholders(
                    stmt.sql(),
                    params.len(),
                    self.conn.dialect.placeholder,
                )?;
                self.run(&sql, &params).await?;
                self.strip_leading_rownum = strip_leading_rownum;
                Ok(())
            }
            PagePlan::Materialize(plan) => self.run_materialized(plan).await,
        }
    }

    /// Fetch and decode the next row.
    pub async fn fetch_one(&mut self) -> Result<Option<Vec<SqlValue<'static>>>> {
        if let Some(buf) = &mut self.buffer {
            let row = buf.pop_front();
            return Ok(row.map(|r| self.decode(r)));
        }
        let row = self.inner.fetch_one().await?;
        Ok(row.map(|r| self.decode(r)))
    }

    /// Fetch and decode up to `size` rows.
    pub async fn fetch_many(&mut self, size: usize) -> Result<Vec<Vec<SqlValue<'static>>>> {
        let rows = match &mut self.buffer {
            Some(buf) => {
                let take = size.min(buf.len());
                buf.drain(..take).collect()
            }
            None => self.inner.fetch_many(size).await?,
        };
        Ok(rows.into_iter().map(|r| self.decode(r)).collect())
    }

    /// Fetch and decode all remaining rows.
    pub async fn fetch_all(&mut self) -> Result<Vec<Vec<SqlValue<'static>>>> {
        let rows = match &mut self.buffer {
            Some(buf) => buf.drain(..).collect(),
            None => self.inner.fetch_all().await?,
        };
        Ok(rows.into_iter().map(|r| self.decode(r)).collect())
    }

    /// Column metadata of the current result set, shim columns excluded.
    pub fn describe(&self) -> &[ColumnMeta] {
        let metas = match &self.meta_override {
            Some(m) => m.as_slice(),
            None => self.inner.describe(),
        };
        if self.strip_leading_rownum && !metas.is_empty() {
            &metas[1..]
        } else {
            metas
        }
    }

    fn reset(&mut self) {
        self.strip_leading_rownum = false;
        self.buffer = None;
        self.meta_override = None;
    }

    /// Run a native statement, applying the dialect's rollback rule on error.
    async fn run(&mut self, sql: &str, params: &[SqlValue<'static>]) -> Result<()> {
        debug!(sql = %sql, params = params.len(), "execute");
        let result = self.inner.execute(sql, params).await;
        self.absorb(result).await
    }

    /// On dialects where an errored connection refuses further statements,
    /// roll back before surfacing the error so the connection stays usable.
    async fn absorb(&mut self, result: crate::core::driver::DriverResult<()>) -> Result<()> {
        match result {
            Ok(()) => Ok(()),
            Err(err) => {
                if self.conn.dialect.rollback_on_error {
                    if let Err(rb) = self.conn.driver.rollback().await {
                        warn!(error = %rb, "rollback after failed statement also failed");
                    }
                }
                Err(ShimError::Driver(err))
            }
        }
    }

    /// Drive the temp-table pagination sequence.
    ///
    /// Probe the base query for metadata, create the temp table, fill it,
    /// read the requested window eagerly, then drop the table. Teardown runs
    /// whether or not the fill/read steps succeeded.
    async fn run_materialized(&mut self, plan: MaterializePlan) -> Result<()> {
        let dialect = self.conn.dialect;
        let params = coerce::to_wire_params(plan.base().params(), dialect)?;
        let base_sql =
            rewrite::rewrite_placeholders(plan.base().sql(), params.len(), dialect.placeholder)?;

        self.inner
            .execute(&base_sql, &params)
            .await
            .map_err(|e| ShimError::pagination("probe", e))?;
        let metas = self.inner.describe().to_vec();
        let create_sql = plan.create_table_sql(&metas)?;
        self.inner
            .execute(&create_sql, &[])
            .await
            .map_err(|e| ShimError::pagination("create", e))?;

        // The table now exists in this session; everything below must reach
        // the drop.
        let filled = self.fill_and_read(&plan, &metas, &params).await;
        let dropped = self.inner.execute(&MaterializePlan::drop_sql(), &[]).await;

        let rows = match filled {
            Ok(rows) => rows,
            Err(err) => {
                if let Err(drop_err) = dropped {
                    warn!(error = %drop_err, "temp table teardown failed after shim error");
                }
                return Err(err);
            }
        };
        dropped.map_err(|e| ShimError::pagination("teardown", e))?;

        debug!(rows = rows.len(), "materialized page fetched");
        self.buffer = Some(rows.into());
        self.meta_override = Some(metas);
        Ok(())
    }

    async fn fill_and_read(
        &mut self,
        plan: &MaterializePlan,
        metas: &[ColumnMeta],
        params: &[SqlValue<'static>],
    ) -> Result<Vec<Vec<SqlValue<'static>>>> {
        // The embedded base query still carries generic placeholders.
        let insert_sql = rewrite::rewrite_placeholders(
            &plan.insert_sql(metas),
            params.len(),
            self.conn.dialect.placeholder,
        )?;
        self.inner
            .execute(&insert_sql, params)
            .await
            .map_err(|e| ShimError::pagination("insert", e))?;
        self.inner
            .execute(&plan.select_sql(metas), &[])
            .await
            .map_err(|e| ShimError::pagination("select", e))?;
        self.inner
            .fetch_all()
            .await
            .map_err(|e| ShimError::pagination("fetch", e))
    }

    fn decode(&self, mut row: Vec<SqlValue<'static>>) -> Vec<SqlValue<'static>> {
        if self.strip_leading_rownum && !row.is_empty() {
            row.remove(0);
        }
        coerce::from_wire_row(row, self.describe())
    }
}
