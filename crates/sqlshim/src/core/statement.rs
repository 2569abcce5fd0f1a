//! Statement, pagination window, and ordering types.

use crate::core::value::SqlValue;

/// An immutable parameterized SQL statement.
///
/// The SQL text uses the generic `%s` positional placeholder; the placeholder
/// rewriter converts it to the dialect's native marker at execute time.
/// Created per query and discarded after execution.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    params: Vec<SqlValue<'static>>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<SqlValue<'static>>) -> Self {
        Statement {
            sql: sql.into(),
            params,
        }
    }

    /// Statement without bound parameters.
    pub fn bare(sql: impl Into<String>) -> Self {
        Statement::new(sql, Vec::new())
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[SqlValue<'static>] {
        &self.params
    }
}

/// Half-open row range [low, high) requested from an ordered result set.
///
/// `low` is inclusive and zero-based; absence means 0. `high` is exclusive;
/// absence means unbounded. A window with both marks absent means "no limit".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Window {
    pub low: Option<u64>,
    pub high: Option<u64>,
}

impl Window {
    pub fn new(low: Option<u64>, high: Option<u64>) -> Self {
        Window { low, high }
    }

    /// The effective low mark (0 when absent).
    pub fn low_mark(&self) -> u64 {
        self.low.unwrap_or(0)
    }

    /// True when no row limiting was requested at all.
    pub fn is_unbounded(&self) -> bool {
        self.low.is_none() && self.high.is_none()
    }

    /// True when the window selects nothing (high <= low).
    pub fn is_empty(&self) -> bool {
        self.high.map_or(false, |h| h <= self.low_mark())
    }

    /// Number of rows selected, when the high mark is bounded.
    pub fn limit(&self) -> Option<u64> {
        self.high.map(|h| h.saturating_sub(self.low_mark()))
    }
}

/// Sort direction of one ordering term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    fn as_sql(self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

/// One term of an ORDER BY clause: a column or expression plus direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTerm {
    pub expr: String,
    pub direction: OrderDirection,
}

/// The ordering a pagination window is evaluated against.
///
/// Dialects that emulate LIMIT/OFFSET through row numbering need an explicit
/// ordering to produce a deterministic window; the planner rejects pagination
/// without one on those dialects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ordering {
    terms: Vec<OrderTerm>,
}

impl Ordering {
    pub fn new(terms: Vec<OrderTerm>) -> Self {
        Ordering { terms }
    }

    /// Single ascending term.
    pub fn asc(expr: impl Into<String>) -> Self {
        Ordering::default().then_asc(expr)
    }

    /// Single descending term.
    pub fn desc(expr: impl Into<String>) -> Self {
        Ordering::default().then_desc(expr)
    }

    pub fn then_asc(mut self, expr: impl Into<String>) -> Self {
        self.terms.push(OrderTerm {
            expr: expr.into(),
            direction: OrderDirection::Asc,
        });
        self
    }

    pub fn then_desc(mut self, expr: impl Into<String>) -> Self {
        self.terms.push(OrderTerm {
            expr: expr.into(),
            direction: OrderDirection::Desc,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Render as the body of an ORDER BY clause.
    pub fn to_sql(&self) -> String {
        self.terms
            .iter()
            .map(|t| format!("{} {}", t.expr, t.direction.as_sql()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
