//! Scripted in-memory driver for exercising the cursor façade.
//!
//! Each execute call consumes the next scripted [`MockResponse`] in order;
//! every statement and parameter list is recorded for assertions.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sqlshim::core::{ColumnMeta, DriverConnection, DriverCursor, DriverResult, SqlValue};
use sqlshim::error::DriverError;

/// What one execute call should produce.
#[derive(Clone, Default)]
pub struct MockResponse {
    pub error: Option<DriverError>,
    pub metas: Vec<ColumnMeta>,
    pub rows: Vec<Vec<SqlValue<'static>>>,
}

impl MockResponse {
    pub fn ok() -> Self {
        MockResponse::default()
    }

    pub fn rows(metas: Vec<ColumnMeta>, rows: Vec<Vec<SqlValue<'static>>>) -> Self {
        MockResponse {
            error: None,
            metas,
            rows,
        }
    }

    pub fn error(message: &str) -> Self {
        MockResponse {
            error: Some(DriverError::new(message)),
            ..Default::default()
        }
    }
}

#[derive(Default)]
struct MockState {
    responses: VecDeque<MockResponse>,
    executed: Vec<(String, Vec<Vec<SqlValue<'static>>>)>,
    rollbacks: usize,
}

/// Shared-state mock connection; clones observe the same script and log.
#[derive(Clone, Default)]
pub struct MockConnection {
    state: Arc<Mutex<MockState>>,
}

impl MockConnection {
    pub fn scripted(responses: Vec<MockResponse>) -> Self {
        MockConnection {
            state: Arc::new(Mutex::new(MockState {
                responses: responses.into(),
                ..Default::default()
            })),
        }
    }

    /// SQL texts in execution order.
    pub fn executed_sql(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .executed
            .iter()
            .map(|(sql, _)| sql.clone())
            .collect()
    }

    /// Full execution log: SQL plus the parameter rows bound to it.
    pub fn executed(&self) -> Vec<(String, Vec<Vec<SqlValue<'static>>>)> {
        self.state.lock().unwrap().executed.clone()
    }

    pub fn rollbacks(&self) -> usize {
        self.state.lock().unwrap().rollbacks
    }
}

pub struct MockCursor {
    state: Arc<Mutex<MockState>>,
    metas: Vec<ColumnMeta>,
    pending: VecDeque<Vec<SqlValue<'static>>>,
}

impl MockCursor {
    fn consume(
        &mut self,
        sql: &str,
        param_lists: Vec<Vec<SqlValue<'static>>>,
    ) -> DriverResult<()> {
        let response = {
            let mut state = self.state.lock().unwrap();
            state.executed.push((sql.to_string(), param_lists));
            state.responses.pop_front().unwrap_or_default()
        };
        if let Some(err) = response.error {
            return Err(err);
        }
        self.metas = response.metas;
        self.pending = response.rows.into();
        Ok(())
    }
}

#[async_trait]
impl DriverConnection for MockConnection {
    type Cursor = MockCursor;

    async fn open_cursor(&self) -> DriverResult<MockCursor> {
        Ok(MockCursor {
            state: Arc::clone(&self.state),
            metas: Vec::new(),
            pending: VecDeque::new(),
        })
    }

    async fn rollback(&self) -> DriverResult<()> {
        self.state.lock().unwrap().rollbacks += 1;
        Ok(())
    }
}

#[async_trait]
impl DriverCursor for MockCursor {
    async fn execute(&mut self, sql: &str, params: &[SqlValue<'static>]) -> DriverResult<()> {
        let lists = if params.is_empty() {
            Vec::new()
        } else {
            vec![params.to_vec()]
        };
        self.consume(sql, lists)
    }

    async fn execute_many(
        &mut self,
        sql: &str,
        param_lists: &[Vec<SqlValue<'static>>],
    ) -> DriverResult<()> {
        self.consume(sql, param_lists.to_vec())
    }

    async fn fetch_one(&mut self) -> DriverResult<Option<Vec<SqlValue<'static>>>> {
        Ok(self.pending.pop_front())
    }

    async fn fetch_many(&mut self, size: usize) -> DriverResult<Vec<Vec<SqlValue<'static>>>> {
        let take = size.min(self.pending.len());
        Ok(self.pending.drain(..take).collect())
    }

    async fn fetch_all(&mut self) -> DriverResult<Vec<Vec<SqlValue<'static>>>> {
        Ok(self.pending.drain(..).collect())
    }

    fn describe(&self) -> &[ColumnMeta] {
        &self.metas
    }
}
