//! Dialect descriptors.
//!
//! A [`Dialect`] is a static table of per-backend facts: placeholder syntax,
//! pagination strategy, type-coercion knobs, and driver/JDBC metadata. It is
//! plain data selected once at configuration time; the rewriter, coercer,
//! planner, and cursor façade are all parameterized by it, so adding a
//! backend means adding a table entry, not a subclass.

use std::collections::BTreeMap;

use crate::config::ConnectionSettings;
use crate::error::{Result, ShimError};

/// Native parameter placeholder syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// Anonymous positional markers: `?` (JDBC, MySQL, SQLite).
    Positional,
    /// Numbered markers with a 1-based index: `$1` (PostgreSQL), `@P1`
    /// (SQL Server), `:1` (Oracle).
    Numbered { prefix: &'static str },
}

/// How LIMIT/OFFSET semantics are achieved on this backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationStrategy {
    /// Native `LIMIT n OFFSET m` clause.
    LimitOffset,
    /// `ROW_NUMBER() OVER (ORDER BY ...)` wrapper (SQL Server 2005+).
    RowNumber,
    /// Nested `ROWNUM` filter (Oracle).
    RownumWrap,
    /// Materialize into a session temp table with an identity sort column
    /// (SQL Server 2000, no window functions).
    Materialize,
}

/// Widest integer the driver binds losslessly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegerWidth {
    Int32,
    Int64,
}

/// Sub-second precision the backend stores for timestamps and times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampPrecision {
    Microseconds,
    Milliseconds,
    Seconds,
}

/// Static per-backend configuration. Immutable after initialization;
/// process-wide lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct Dialect {
    pub name: &'static str,
    pub placeholder: PlaceholderStyle,
    pub pagination: PaginationStrategy,

    // Coercion knobs
    pub native_booleans: bool,
    pub integer_width: IntegerWidth,
    pub timestamp_precision: TimestampPrecision,
    pub tz_aware_timestamps: bool,
    /// Backend stores TIME values as a datetime anchored at 1900-01-01.
    pub time_as_datetime: bool,

    // Pagination knobs
    /// Pagination without an explicit ordering is nondeterministic here and
    /// must be rejected.
    pub requires_ordering: bool,
    /// Literal used for "no upper bound" when the backend needs a LIMIT to
    /// accept a bare OFFSET; `None` means LIMIT can simply be omitted.
    pub no_limit_value: Option<&'static str>,

    // Connection behavior
    /// Connections become unusable after an error until rolled back.
    pub rollback_on_error: bool,
    /// Statements to run once per fresh connection.
    pub session_init: &'static [&'static str],

    // Driver metadata
    pub driver_class: &'static str,
    /// URL template with `{host}`, `{port}` (pre-rendered `:n` segment) and
    /// `{name}` markers.
    pub jdbc_url_pattern: &'static str,
    pub default_port: Option<u16>,
}

/// Session setup for SQL Server connections. ANSI flags are required for
/// indexed-view compatibility; the date format pins server-side parsing.
const MSSQL_SESSION_INIT: &[&str] = &[
    "SET DATEFORMAT ymd",
    "SET ARITHABORT ON",
    "SET CONCAT_NULL_YIELDS_NULL ON",
    "SET QUOTED_IDENTIFIER ON",
    "SET ANSI_NULLS ON",
    "SET ANSI_PADDING ON",
    "SET ANSI_WARNINGS ON",
    "SET NUMERIC_ROUNDABORT OFF",
];

pub static POSTGRES: Dialect = Dialect {
    name: "postgres",
    placeholder: PlaceholderStyle::Numbered { prefix: "$" },
    pagination: PaginationStrategy::LimitOffset,
    native_booleans: true,
    integer_width: IntegerWidth::Int64,
    timestamp_precision: TimestampPrecision::Microseconds,
    tz_aware_timestamps: true,
    time_as_datetime: false,
    requires_ordering: false,
    no_limit_value: None,
    rollback_on_error: true,
    session_init: &[],
    driver_class: "org.postgresql.Driver",
    jdbc_url_pattern: "jdbc:postgresql://{host}{port}/{name}",
    default_port: Some(5432),
};

pub static MYSQL: Dialect = Dialect {
    name: "mysql",
    placeholder: PlaceholderStyle::Positional,
    pagination: PaginationStrategy::LimitOffset,
    native_booleans: false,
    integer_width: IntegerWidth::Int64,
    timestamp_precision: TimestampPrecision::Seconds,
    tz_aware_timestamps: false,
    time_as_datetime: false,
    requires_ordering: false,
    // 2^64 - 1, as recommended by the MySQL documentation
    no_limit_value: Some("18446744073709551615"),
    rollback_on_error: true,
    session_init: &[],
    driver_class: "com.mysql.jdbc.Driver",
    jdbc_url_pattern: "jdbc:mysql://{host}{port}/{name}",
    default_port: Some(3306),
};

pub static SQLITE: Dialect = Dialect {
    name: "sqlite",
    placeholder: PlaceholderStyle::Positional,
    pagination: PaginationStrategy::LimitOffset,
    native_booleans: false,
    integer_width: IntegerWidth::Int64,
    timestamp_precision: TimestampPrecision::Microseconds,
    tz_aware_timestamps: false,
    time_as_datetime: false,
    requires_ordering: false,
    no_limit_value: Some("-1"),
    rollback_on_error: false,
    session_init: &[],
    driver_class: "org.sqlite.JDBC",
    jdbc_url_pattern: "jdbc:sqlite:{name}",
    default_port: None,
};

pub static ORACLE: Dialect = Dialect {
    name: "oracle",
    placeholder: PlaceholderStyle::Positional,
    pagination: PaginationStrategy::RownumWrap,
    native_booleans: false,
    integer_width: IntegerWidth::Int64,
    timestamp_precision: TimestampPrecision::Microseconds,
    tz_aware_timestamps: false,
    time_as_datetime: true,
    requires_ordering: true,
    no_limit_value: None,
    rollback_on_error: false,
    session_init: &[],
    driver_class: "oracle.jdbc.OracleDriver",
    jdbc_url_pattern: "jdbc:oracle:thin:@{host}{port}/{name}",
    default_port: Some(1521),
};

pub static MSSQL: Dialect = Dialect {
    name: "mssql",
    placeholder: PlaceholderStyle::Positional,
    pagination: PaginationStrategy::RowNumber,
    native_booleans: false,
    integer_width: IntegerWidth::Int64,
    timestamp_precision: TimestampPrecision::Milliseconds,
    tz_aware_timestamps: false,
    time_as_datetime: true,
    requires_ordering: true,
    no_limit_value: None,
    rollback_on_error: false,
    session_init: MSSQL_SESSION_INIT,
    driver_class: "net.sourceforge.jtds.jdbc.Driver",
    jdbc_url_pattern: "jdbc:jtds:sqlserver://{host}{port}/{name}",
    default_port: Some(1433),
};

pub static MSSQL2000: Dialect = Dialect {
    name: "mssql2000",
    placeholder: PlaceholderStyle::Positional,
    pagination: PaginationStrategy::Materialize,
    native_booleans: false,
    // jTDS on SQL Server 2000 cannot bind bigints reliably.
    integer_width: IntegerWidth::Int32,
    timestamp_precision: TimestampPrecision::Milliseconds,
    tz_aware_timestamps: false,
    time_as_datetime: true,
    requires_ordering: false,
    no_limit_value: None,
    rollback_on_error: false,
    session_init: MSSQL_SESSION_INIT,
    driver_class: "net.sourceforge.jtds.jdbc.Driver",
    jdbc_url_pattern: "jdbc:jtds:sqlserver://{host}{port}/{name}",
    default_port: Some(1433),
};

/// Everything a driver adapter needs to establish a connection: the rendered
/// URL, credentials, the driver class to load, and pass-through options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectInfo {
    pub url: String,
    pub user: String,
    pub password: String,
    pub driver_class: &'static str,
    pub properties: BTreeMap<String, String>,
}

impl Dialect {
    /// Look up a builtin dialect by name.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the name is not recognized.
    pub fn from_name(name: &str) -> Result<&'static Dialect> {
        match name.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(&POSTGRES),
            "mysql" | "mariadb" => Ok(&MYSQL),
            "sqlite" | "sqlite3" => Ok(&SQLITE),
            "oracle" => Ok(&ORACLE),
            "mssql" | "sqlserver" | "sql_server" => Ok(&MSSQL),
            "mssql2000" | "mssql2k" => Ok(&MSSQL2000),
            other => Err(ShimError::Config(format!(
                "Unknown dialect: '{other}'. Supported: postgres, mysql, sqlite, oracle, mssql, mssql2000"
            ))),
        }
    }

    /// Build the JDBC URL for this dialect from connection settings.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the database name is empty.
    pub fn jdbc_url(&self, settings: &ConnectionSettings) -> Result<String> {
        if settings.name.is_empty() {
            return Err(ShimError::Config(
                "You need to specify a database name in the connection settings".to_string(),
            ));
        }
        Ok(self
            .jdbc_url_pattern
            .replace("{host}", settings.effective_host())
            .replace("{port}", &settings.port_segment(self.default_port))
            .replace("{name}", &settings.name))
    }

    /// Bundle the settings into what a driver adapter hands to its connect
    /// call. Extra options are passed through verbatim as driver properties.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the database name is empty.
    pub fn connect_info(&self, settings: &ConnectionSettings) -> Result<ConnectInfo> {
        Ok(ConnectInfo {
            url: self.jdbc_url(settings)?,
            user: settings.user.clone(),
            password: settings.password.clone(),
            driver_class: self.driver_class,
            properties: settings.options.clone(),
        })
    }
}
