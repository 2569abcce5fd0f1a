//! Pagination planning.
//!
//! Emulates `LIMIT n OFFSET m` semantics across dialects. The planner takes a
//! base query, an ordering, and a half-open [low, high) window and produces
//! an executable plan for the dialect's strategy:
//!
//! - native `LIMIT/OFFSET` append (PostgreSQL, MySQL, SQLite)
//! - `ROW_NUMBER()` window wrapper (SQL Server 2005+)
//! - nested `ROWNUM` filter (Oracle)
//! - temp-table materialization (SQL Server 2000), executed by the cursor
//!   façade as a multi-round-trip sequence with guaranteed teardown
//!
//! Window bounds are inlined as integer literals; bound parameters are never
//! added or reordered by the planner.

use crate::core::statement::{Ordering, Statement, Window};
use crate::core::value::{ColumnMeta, WireTypeCode};
use crate::dialect::{Dialect, PaginationStrategy};
use crate::error::{Result, ShimError};

/// Session-scoped temp table used by the materialize strategy.
pub const TEMP_TABLE: &str = "#page_shim";

/// Identity column recording insertion order in the temp table.
const SORT_COLUMN: &str = "page_shim_sort_id";

/// An executable pagination plan.
#[derive(Debug, Clone)]
pub enum PagePlan {
    /// The window selects nothing; skip execution entirely.
    Empty,
    /// A single rewritten statement.
    Rewritten {
        stmt: Statement,
        /// The result set carries a synthetic leading row-number column that
        /// must be stripped from fetched rows (Oracle ROWNUM wrap).
        strip_leading_rownum: bool,
    },
    /// Multi-round-trip temp-table sequence; driven by the cursor façade.
    Materialize(MaterializePlan),
}

/// Plan pagination of `base` for the given dialect.
///
/// An unbounded window degenerates to the base statement with the ordering
/// appended, so the same ordering applies whether or not the caller also
/// limits rows. Dialects that need an ordering for a deterministic window
/// reject pagination without one with [`ShimError::AmbiguousPagination`]; the
/// row-number and ROWNUM strategies require it unconditionally since the
/// ordering is what the row numbers are computed over.
pub fn plan(
    dialect: &Dialect,
    base: &Statement,
    ordering: Option<&Ordering>,
    window: Window,
) -> Result<PagePlan> {
    let ordering = ordering.filter(|o| !o.is_empty());

    if window.is_unbounded() {
        let mut sql = base.sql().to_string();
        if let Some(ord) = ordering {
            sql.push_str(" ORDER BY ");
            sql.push_str(&ord.to_sql());
        }
        return Ok(PagePlan::Rewritten {
            stmt: Statement::new(sql, base.params().to_vec()),
            strip_leading_rownum: false,
        });
    }
    if window.is_empty() {
        return Ok(PagePlan::Empty);
    }

    if ordering.is_none() && dialect.requires_ordering {
        return Err(ShimError::AmbiguousPagination);
    }

    match dialect.pagination {
        PaginationStrategy::LimitOffset => Ok(limit_offset(dialect, base, ordering, window)),
        PaginationStrategy::RowNumber => row_number(base, ordering, window),
        PaginationStrategy::RownumWrap => rownum_wrap(base, ordering, window),
        PaginationStrategy::Materialize => Ok(PagePlan::Materialize(MaterializePlan {
            base: base.clone(),
            order_by: ordering.map(Ordering::to_sql),
            window,
        })),
    }
}

fn limit_offset(
    dialect: &Dialect,
    base: &Statement,
    ordering: Option<&Ordering>,
    window: Window,
) -> PagePlan {
    let mut sql = base.sql().to_string();
    if let Some(ord) = ordering {
        sql.push_str(" ORDER BY ");
        sql.push_str(&ord.to_sql());
    }
    let low = window.low_mark();
    match window.limit() {
        Some(n) => sql.push_str(&format!(" LIMIT {n}")),
        None => {
            // A bare OFFSET needs an explicit "no limit" literal on some
            // backends (MySQL, SQLite); others just omit the clause.
            if low > 0 {
                if let Some(v) = dialect.no_limit_value {
                    sql.push_str(&format!(" LIMIT {v}"));
                }
            }
        }
    }
    if low > 0 {
        sql.push_str(&format!(" OFFSET {low}"));
    }
    PagePlan::Rewritten {
        stmt: Statement::new(sql, base.params().to_vec()),
        strip_leading_rownum: false,
    }
}

fn row_number(base: &Statement, ordering: Option<&Ordering>, window: Window) -> Result<PagePlan> {
    let ordering = ordering.ok_or(ShimError::AmbiguousPagination)?;
    // The wrapper re-projects the base query's output columns, so the select
    // list must be introspectable up front.
    let cols = select_aliases(base.sql())?;
    let col_list = cols.join(", ");
    let low = window.low_mark();

    let inner = format!(
        "SELECT {col_list}, ROW_NUMBER() OVER (ORDER BY {}) AS _rn FROM ({}) AS _sub",
        ordering.to_sql(),
        base.sql()
    );
    let mut outer = format!("SELECT {col_list} FROM ({inner}) AS _page WHERE _rn > {low}");
    if let Some(high) = window.high {
        outer.push_str(&format!(" AND _rn <= {high}"));
    }
    Ok(PagePlan::Rewritten {
        stmt: Statement::new(outer, base.params().to_vec()),
        strip_leading_rownum: false,
    })
}

fn rownum_wrap(base: &Statement, ordering: Option<&Ordering>, window: Window) -> Result<PagePlan> {
    // ROWNUM is assigned before ORDER BY is applied, so the ordering must sit
    // inside the innermost query for the numbering to be deterministic.
    let ordering = ordering.ok_or(ShimError::AmbiguousPagination)?;
    let inner = format!("{} ORDER BY {}", base.sql(), ordering.to_sql());
    let mut mid = format!("SELECT ROWNUM AS \"_RN\", \"_SUB\".* FROM ({inner}) \"_SUB\"");
    if let Some(high) = window.high {
        mid.push_str(&format!(" WHERE ROWNUM <= {high}"));
    }
    let outer = format!("SELECT * FROM ({mid}) WHERE \"_RN\" > {}", window.low_mark());
    Ok(PagePlan::Rewritten {
        stmt: Statement::new(outer, base.params().to_vec()),
        strip_leading_rownum: true,
    })
}

/// Temp-table pagination sequence for backends without window functions.
///
/// The cursor façade drives it in order: execute the base query once as a
/// metadata probe, create the temp table from the probed column types, insert
/// the base query's rows, select the requested range ordered by the identity
/// column, and finally drop the table (teardown runs even when a step fails).
/// Not safe to interleave with other statements on the same connection.
#[derive(Debug, Clone)]
pub struct MaterializePlan {
    base: Statement,
    order_by: Option<String>,
    window: Window,
}

impl MaterializePlan {
    pub fn base(&self) -> &Statement {
        &self.base
    }

    pub fn window(&self) -> Window {
        self.window
    }

    /// CREATE TABLE statement derived from the probed column metadata.
    ///
    /// Columns are positionally aliased (`c0`, `c1`, ...) since the base
    /// query may project the same name from two tables.
    pub fn create_table_sql(&self, cols: &[ColumnMeta]) -> Result<String> {
        let mut defs = vec![format!("{SORT_COLUMN} int IDENTITY (1, 1) NOT NULL")];
        for (i, meta) in cols.iter().enumerate() {
            let null_sql = if meta.nullable { "NULL" } else { "NOT NULL" };
            defs.push(format!("c{i} {} {null_sql}", column_ddl(meta)?));
        }
        Ok(format!("CREATE TABLE {TEMP_TABLE} ({})", defs.join(", ")))
    }

    /// INSERT ... SELECT moving the base query's rows into the temp table.
    pub fn insert_sql(&self, cols: &[ColumnMeta]) -> String {
        let mut select = self.base.sql().to_string();
        if let Some(ob) = &self.order_by {
            select.push_str(" ORDER BY ");
            select.push_str(ob);
        }
        format!(
            "INSERT INTO {TEMP_TABLE} ({}) {select}",
            positional_names(cols.len())
        )
    }

    /// Windowed select over the materialized rows.
    pub fn select_sql(&self, cols: &[ColumnMeta]) -> String {
        let low = self.window.low_mark();
        let mut sql = format!(
            "SELECT {} FROM {TEMP_TABLE} WHERE {SORT_COLUMN} > {low}",
            positional_names(cols.len())
        );
        if let Some(high) = self.window.high {
            sql.push_str(&format!(" AND {SORT_COLUMN} <= {high}"));
        }
        sql.push_str(&format!(" ORDER BY {SORT_COLUMN}"));
        sql
    }

    pub fn drop_sql() -> String {
        format!("DROP TABLE {TEMP_TABLE}")
    }
}

fn positional_names(count: usize) -> String {
    (0..count)
        .map(|i| format!("c{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Temp-table column DDL for a probed column.
fn column_ddl(meta: &ColumnMeta) -> Result<String> {
    let ddl = match meta.type_code {
        WireTypeCode::Bit => "bit".to_string(),
        WireTypeCode::TinyInt | WireTypeCode::SmallInt | WireTypeCode::Integer => {
            "int".to_string()
        }
        WireTypeCode::BigInt => "bigint".to_string(),
        WireTypeCode::Numeric => {
            format!("numeric({}, {})", meta.precision.max(1), meta.scale.max(0))
        }
        WireTypeCode::Float => "double precision".to_string(),
        WireTypeCode::Real => "real".to_string(),
        WireTypeCode::Char | WireTypeCode::VarChar => {
            // Precision outside the nvarchar range looks like a dodgy
            // declaration; fall back to an unsized text column.
            if (1..=8000).contains(&meta.precision) {
                format!("nvarchar({})", meta.precision)
            } else {
                "ntext".to_string()
            }
        }
        WireTypeCode::LongVarChar => "ntext".to_string(),
        WireTypeCode::Date | WireTypeCode::Time | WireTypeCode::Timestamp => {
            "datetime".to_string()
        }
        WireTypeCode::Binary => "image".to_string(),
        WireTypeCode::Other => {
            return Err(ShimError::unsupported(format!(
                "cannot materialize column '{}' of unknown SQL type",
                meta.name
            )))
        }
    };
    Ok(ddl)
}

/// Extract the output column names of a SELECT statement's select list.
///
/// Handles `expr AS alias`, qualified `t.col` and bracket/quote-delimited
/// identifiers; commas and `AS` inside parenthesized expressions are ignored
/// via a bracket stack. Select items that are bare expressions without an
/// alias cannot be re-projected and fail with `MalformedStatement`.
pub fn select_aliases(sql: &str) -> Result<Vec<String>> {
    let trimmed = sql.trim_start();
    let rest = strip_keyword(trimmed, "SELECT").ok_or_else(|| {
        ShimError::malformed("row-number pagination requires a plain SELECT statement")
    })?;
    let rest = strip_keyword(rest, "DISTINCT").unwrap_or(rest);
    let (list, _) = split_at_top_level_from(rest)
        .ok_or_else(|| ShimError::malformed("could not locate the FROM clause"))?;
    split_top_level_commas(list)
        .iter()
        .map(|item| alias_of(item))
        .collect()
}

fn strip_keyword<'a>(s: &'a str, keyword: &str) -> Option<&'a str> {
    let n = keyword.len();
    if s.len() > n
        && s.as_bytes()[..n].eq_ignore_ascii_case(keyword.as_bytes())
        && s.as_bytes()[n].is_ascii_whitespace()
    {
        return Some(s[n..].trim_start());
    }
    None
}

fn split_at_top_level_from(s: &str) -> Option<(&str, &str)> {
    let bytes = s.as_bytes();
    let mut depth = 0i32;
    let mut in_quote = false;
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if in_quote {
            if c == '\'' {
                in_quote = false;
            }
            i += 1;
            continue;
        }
        match c {
            '\'' => in_quote = true,
            '(' => depth += 1,
            ')' => depth -= 1,
            'f' | 'F' if depth == 0 => {
                let prev_is_ws = i > 0 && bytes[i - 1].is_ascii_whitespace();
                if prev_is_ws
                    && i + 5 <= bytes.len()
                    && bytes[i..i + 4].eq_ignore_ascii_case(b"FROM")
                    && bytes[i + 4].is_ascii_whitespace()
                {
                    return Some((&s[..i], &s[i..]));
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn split_top_level_commas(s: &str) -> Vec<String> {
    let mut depth = 0i32;
    let mut in_quote = false;
    let mut buf = String::new();
    let mut out = Vec::new();
    for c in s.chars() {
        if in_quote {
            buf.push(c);
            if c == '\'' {
                in_quote = false;
            }
            continue;
        }
        match c {
            ',' if depth == 0 => {
                out.push(buf.trim().to_string());
                buf.clear();
            }
            '\'' => {
                in_quote = true;
                buf.push(c);
            }
            '(' => {
                depth += 1;
                buf.push(c);
            }
            ')' => {
                depth -= 1;
                buf.push(c);
            }
            _ => buf.push(c),
        }
    }
    out.push(buf.trim().to_string());
    out
}

fn alias_of(item: &str) -> Result<String> {
    let alias = match find_top_level_as(item) {
        Some(idx) => item[idx..].trim(),
        None => item.trim(),
    };
    let last = alias.rsplit('.').next().unwrap_or(alias);
    let name = unquote(last);
    if name.is_empty() || name.contains('(') || name.contains(char::is_whitespace) {
        return Err(ShimError::malformed(format!(
            "cannot derive an output column name from select item '{item}'; alias it explicitly"
        )));
    }
    Ok(name.to_string())
}

/// Byte offset just past the last top-level ` AS ` keyword, if any.
fn find_top_level_as(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut depth = 0i32;
    let mut in_quote = false;
    let mut last = None;
    let mut i = 0;
    while i + 4 <= bytes.len() {
        let c = bytes[i] as char;
        if in_quote {
            if c == '\'' {
                in_quote = false;
            }
            i += 1;
            continue;
        }
        match c {
            '\'' => in_quote = true,
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {
                if depth == 0
                    && bytes[i].is_ascii_whitespace()
                    && bytes[i + 1..i + 3].eq_ignore_ascii_case(b"AS")
                    && bytes.get(i + 3).map_or(false, |b| b.is_ascii_whitespace())
                {
                    last = Some(i + 4);
                }
            }
        }
        i += 1;
    }
    last
}

fn unquote(s: &str) -> &str {
    let s = s.trim();
    if s.len() >= 2 {
        let stripped = (s.starts_with('[') && s.ends_with(']'))
            || (s.starts_with('"') && s.ends_with('"'))
            || (s.starts_with('`') && s.ends_with('`'));
        if stripped {
            return &s[1..s.len() - 1];
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MSSQL, MSSQL2000, MYSQL, ORACLE, POSTGRES, SQLITE};

    fn base() -> Statement {
        Statement::bare("SELECT id, name FROM t")
    }

    fn rewritten_sql(plan: PagePlan) -> String {
        match plan {
            PagePlan::Rewritten { stmt, .. } => stmt.sql().to_string(),
            other => panic!("expected a rewritten plan, got {other:?}"),
        }
    }

    #[test]
    fn test_unbounded_window_is_passthrough() {
        let plan = plan(&POSTGRES, &base(), None, Window::default()).unwrap();
        assert_eq!(rewritten_sql(plan), "SELECT id, name FROM t");
    }

    #[test]
    fn test_unbounded_window_keeps_the_ordering() {
        let ord = Ordering::asc("id");
        let sql = rewritten_sql(plan(&POSTGRES, &base(), Some(&ord), Window::default()).unwrap());
        assert_eq!(sql, "SELECT id, name FROM t ORDER BY id ASC");

        // The same shape as an explicit zero offset with no upper bound.
        let zero_offset = rewritten_sql(
            plan(&POSTGRES, &base(), Some(&ord), Window::new(Some(0), None)).unwrap(),
        );
        assert_eq!(sql, zero_offset);

        // Row-number dialects do not need a wrapper when nothing is limited.
        let sql = rewritten_sql(plan(&ORACLE, &base(), Some(&ord), Window::default()).unwrap());
        assert_eq!(sql, "SELECT id, name FROM t ORDER BY id ASC");
    }

    #[test]
    fn test_empty_window_short_circuits() {
        let w = Window::new(Some(4), Some(4));
        assert!(matches!(
            plan(&POSTGRES, &base(), None, w).unwrap(),
            PagePlan::Empty
        ));
    }

    #[test]
    fn test_limit_offset_native() {
        let w = Window::new(Some(2), Some(4));
        let sql = rewritten_sql(
            plan(&POSTGRES, &base(), Some(&Ordering::asc("id")), w).unwrap(),
        );
        assert_eq!(sql, "SELECT id, name FROM t ORDER BY id ASC LIMIT 2 OFFSET 2");
    }

    #[test]
    fn test_limit_offset_low_zero_omits_offset() {
        let w = Window::new(None, Some(5));
        let sql = rewritten_sql(
            plan(&POSTGRES, &base(), Some(&Ordering::asc("id")), w).unwrap(),
        );
        assert_eq!(sql, "SELECT id, name FROM t ORDER BY id ASC LIMIT 5");
    }

    #[test]
    fn test_bare_offset_uses_no_limit_literal() {
        let w = Window::new(Some(10), None);
        let sql = rewritten_sql(plan(&MYSQL, &base(), None, w).unwrap());
        assert_eq!(
            sql,
            "SELECT id, name FROM t LIMIT 18446744073709551615 OFFSET 10"
        );

        let sql = rewritten_sql(plan(&SQLITE, &base(), None, w).unwrap());
        assert_eq!(sql, "SELECT id, name FROM t LIMIT -1 OFFSET 10");

        // PostgreSQL accepts a bare OFFSET.
        let sql = rewritten_sql(plan(&POSTGRES, &base(), None, w).unwrap());
        assert_eq!(sql, "SELECT id, name FROM t OFFSET 10");
    }

    #[test]
    fn test_row_number_wrapper() {
        let w = Window::new(Some(2), Some(4));
        let sql = rewritten_sql(
            plan(&MSSQL, &base(), Some(&Ordering::asc("id")), w).unwrap(),
        );
        assert!(sql.starts_with("SELECT id, name FROM ("));
        assert!(sql.contains("ROW_NUMBER() OVER (ORDER BY id ASC) AS _rn"));
        assert!(sql.contains("FROM (SELECT id, name FROM t) AS _sub"));
        assert!(sql.contains("WHERE _rn > 2 AND _rn <= 4"));
    }

    #[test]
    fn test_row_number_unbounded_high() {
        let w = Window::new(Some(2), None);
        let sql = rewritten_sql(
            plan(&MSSQL, &base(), Some(&Ordering::asc("id")), w).unwrap(),
        );
        assert!(sql.contains("WHERE _rn > 2"));
        assert!(!sql.contains("_rn <="));
    }

    #[test]
    fn test_rownum_wrap() {
        let w = Window::new(Some(2), Some(4));
        let p = plan(&ORACLE, &base(), Some(&Ordering::asc("id")), w).unwrap();
        match p {
            PagePlan::Rewritten {
                stmt,
                strip_leading_rownum,
            } => {
                assert!(strip_leading_rownum);
                let sql = stmt.sql();
                assert_eq!(
                    sql,
                    "SELECT * FROM (SELECT ROWNUM AS \"_RN\", \"_SUB\".* FROM \
                     (SELECT id, name FROM t ORDER BY id ASC) \"_SUB\" \
                     WHERE ROWNUM <= 4) WHERE \"_RN\" > 2"
                );
            }
            other => panic!("expected a rewritten plan, got {other:?}"),
        }
    }

    #[test]
    fn test_ambiguous_pagination_without_ordering() {
        let w = Window::new(Some(2), Some(4));
        assert!(matches!(
            plan(&MSSQL, &base(), None, w),
            Err(ShimError::AmbiguousPagination)
        ));
        assert!(matches!(
            plan(&ORACLE, &base(), Some(&Ordering::default()), w),
            Err(ShimError::AmbiguousPagination)
        ));
        // Native LIMIT dialects accept unordered pagination.
        assert!(plan(&POSTGRES, &base(), None, w).is_ok());
    }

    #[test]
    fn test_materialize_plan_sql() {
        let w = Window::new(Some(2), Some(4));
        let p = plan(&MSSQL2000, &base(), Some(&Ordering::asc("id")), w).unwrap();
        let mat = match p {
            PagePlan::Materialize(m) => m,
            other => panic!("expected a materialize plan, got {other:?}"),
        };
        let cols = vec![
            ColumnMeta::new("id", WireTypeCode::Integer).not_null(),
            ColumnMeta::new("name", WireTypeCode::VarChar).with_precision(50, 0),
        ];
        assert_eq!(
            mat.create_table_sql(&cols).unwrap(),
            "CREATE TABLE #page_shim (page_shim_sort_id int IDENTITY (1, 1) NOT NULL, \
             c0 int NOT NULL, c1 nvarchar(50) NULL)"
        );
        assert_eq!(
            mat.insert_sql(&cols),
            "INSERT INTO #page_shim (c0, c1) SELECT id, name FROM t ORDER BY id ASC"
        );
        assert_eq!(
            mat.select_sql(&cols),
            "SELECT c0, c1 FROM #page_shim WHERE page_shim_sort_id > 2 \
             AND page_shim_sort_id <= 4 ORDER BY page_shim_sort_id"
        );
        assert_eq!(MaterializePlan::drop_sql(), "DROP TABLE #page_shim");
    }

    #[test]
    fn test_materialize_column_ddl_variants() {
        let mat = match plan(
            &MSSQL2000,
            &base(),
            None,
            Window::new(None, Some(10)),
        )
        .unwrap()
        {
            PagePlan::Materialize(m) => m,
            other => panic!("expected a materialize plan, got {other:?}"),
        };
        let cols = vec![
            ColumnMeta::new("flag", WireTypeCode::Bit),
            ColumnMeta::new("amount", WireTypeCode::Numeric).with_precision(10, 2),
            ColumnMeta::new("body", WireTypeCode::LongVarChar),
            ColumnMeta::new("huge", WireTypeCode::VarChar).with_precision(9000, 0),
            ColumnMeta::new("at", WireTypeCode::Timestamp),
        ];
        let sql = mat.create_table_sql(&cols).unwrap();
        assert!(sql.contains("c0 bit"));
        assert!(sql.contains("c1 numeric(10, 2)"));
        assert!(sql.contains("c2 ntext"));
        assert!(sql.contains("c3 ntext"));
        assert!(sql.contains("c4 datetime"));
    }

    #[test]
    fn test_select_aliases_plain_and_qualified() {
        assert_eq!(
            select_aliases("SELECT id, name FROM t").unwrap(),
            vec!["id", "name"]
        );
        assert_eq!(
            select_aliases("SELECT t.id, u.name FROM t JOIN u ON u.tid = t.id").unwrap(),
            vec!["id", "name"]
        );
        assert_eq!(
            select_aliases("SELECT [t].[order-id], \"u\".\"name\" FROM t, u").unwrap(),
            vec!["order-id", "name"]
        );
    }

    #[test]
    fn test_select_aliases_with_expressions() {
        assert_eq!(
            select_aliases("SELECT COUNT(*) AS total, MAX(a, b) AS peak FROM t").unwrap(),
            vec!["total", "peak"]
        );
        // CAST's internal AS must not be mistaken for an alias.
        assert_eq!(
            select_aliases("SELECT CAST(n AS int) AS n2 FROM t").unwrap(),
            vec!["n2"]
        );
        // DISTINCT is skipped, subquery FROM is not the split point.
        assert_eq!(
            select_aliases("SELECT DISTINCT id, (SELECT x FROM s) AS sx FROM t").unwrap(),
            vec!["id", "sx"]
        );
    }

    #[test]
    fn test_select_aliases_rejects_unaliased_expressions() {
        assert!(select_aliases("SELECT COUNT(*) FROM t").is_err());
        assert!(select_aliases("DELETE FROM t").is_err());
    }
}
