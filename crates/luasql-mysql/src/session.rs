//! Owner of the client connection.
//!
//! A `Session` is shared by a connection object and the statements prepared
//! on it. Results are read completely before returning (client-side store),
//! so cursors never hold the connection.

use crate::config::ConnectConfig;
use crate::types::{FieldType, render_value, type_label};
use luasql_core::{
    ColumnInfo, ConnectionError, ConnectionErrorKind, DeferredError, Error, ObjectKind, QueryError,
    QueryErrorKind, Result, ResultSet, Row, RowCursor,
};
use mysql::prelude::{Protocol, Queryable};
use mysql::{Conn, Params, QueryResult};
use std::cell::RefCell;
use std::sync::Arc;

/// What a statement produced.
#[derive(Debug)]
pub enum QueryOutcome {
    /// The statement returned a result set
    Rows(RowCursor),
    /// The statement returned no columns; affected-row count
    Affected(u64),
}

pub struct Session {
    conn: RefCell<Option<Conn>>,
    target: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("target", &self.target)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Session {
    /// Open a new connection.
    #[tracing::instrument(level = "debug", skip(config), fields(target = %config.display_target()))]
    pub fn connect(config: &ConnectConfig) -> Result<Self> {
        let opts = config.to_opts()?;
        let conn = Conn::new(opts).map_err(|e| {
            tracing::debug!(error = %e, "MySQL connect failed");
            Error::Connection(ConnectionError {
                kind: ConnectionErrorKind::Connect,
                message: error_message(&e),
                source: Some(Box::new(e)),
            })
        })?;
        tracing::debug!(
            connection_id = conn.connection_id(),
            "MySQL connection established"
        );
        Ok(Self {
            conn: RefCell::new(Some(conn)),
            target: config.display_target(),
        })
    }

    pub fn is_closed(&self) -> bool {
        self.conn.try_borrow().is_ok_and(|c| c.is_none())
    }

    /// Close the connection. Returns `false` if it was already closed.
    pub fn close(&self) -> bool {
        let Ok(mut guard) = self.conn.try_borrow_mut() else {
            return false;
        };
        match guard.take() {
            Some(conn) => {
                tracing::debug!(target_host = %self.target, "Closing MySQL connection");
                drop(conn);
                true
            }
            None => false,
        }
    }

    fn with_conn<T>(&self, f: impl FnOnce(&mut Conn) -> Result<T>) -> Result<T> {
        let mut guard = self
            .conn
            .try_borrow_mut()
            .map_err(|_| Error::Custom("connection is busy".to_string()))?;
        let conn = guard.as_mut().ok_or(Error::Closed(ObjectKind::Connection))?;
        f(conn)
    }

    /// Run SQL text (possibly several statements) and buffer every result.
    #[tracing::instrument(level = "debug", skip(self, sql), fields(sql_len = sql.len()))]
    pub fn query(&self, sql: &str) -> Result<QueryOutcome> {
        tracing::trace!(sql = sql, "Executing query");
        self.with_conn(|conn| {
            let result = conn
                .query_iter(sql)
                .map_err(|e| query_error(QueryErrorKind::Execute, e))?;
            buffer_results(result)
        })
    }

    /// Prepare a server-side statement.
    #[tracing::instrument(level = "debug", skip(self, sql))]
    pub fn prepare(&self, sql: &str) -> Result<mysql::Statement> {
        self.with_conn(|conn| {
            let stmt = conn
                .prep(sql)
                .map_err(|e| query_error(QueryErrorKind::Prepare, e))?;
            tracing::debug!(
                statement_id = stmt.id(),
                params = stmt.num_params(),
                "Prepared statement"
            );
            Ok(stmt)
        })
    }

    /// Execute a prepared statement with positional parameters.
    #[tracing::instrument(level = "debug", skip(self, stmt, params), fields(statement_id = stmt.id()))]
    pub fn execute(
        &self,
        stmt: &mysql::Statement,
        params: Vec<mysql::Value>,
    ) -> Result<QueryOutcome> {
        let params = if params.is_empty() {
            Params::Empty
        } else {
            Params::Positional(params)
        };
        self.with_conn(|conn| {
            let result = conn
                .exec_iter(stmt, params)
                .map_err(|e| query_error(QueryErrorKind::Execute, e))?;
            buffer_results(result)
        })
    }

    /// Release a server-side statement.
    ///
    /// Closing after the connection itself was closed is a no-op.
    pub fn close_statement(&self, stmt: mysql::Statement) -> Result<()> {
        if self.is_closed() {
            return Ok(());
        }
        let id = stmt.id();
        self.with_conn(|conn| {
            conn.close(stmt)
                .map_err(|e| query_error(QueryErrorKind::Execute, e))
        })?;
        tracing::trace!(statement_id = id, "Closed prepared statement");
        Ok(())
    }

    /// Check that the server is reachable.
    ///
    /// `Ok(false)` when the connection is closed or the server went away;
    /// a server-reported error is returned as `Err`.
    pub fn ping(&self) -> Result<bool> {
        if self.is_closed() {
            return Ok(false);
        }
        self.with_conn(|conn| match conn.ping() {
            Ok(()) => Ok(true),
            Err(e @ mysql::Error::MySqlError(_)) => Err(Error::Connection(ConnectionError {
                kind: ConnectionErrorKind::Disconnected,
                message: error_message(&e),
                source: Some(Box::new(e)),
            })),
            Err(e) => {
                tracing::debug!(error = %e, "MySQL ping failed; server gone");
                Ok(false)
            }
        })
    }

    pub fn commit(&self) -> Result<()> {
        self.simple("COMMIT")
    }

    pub fn rollback(&self) -> Result<()> {
        self.simple("ROLLBACK")
    }

    pub fn set_autocommit(&self, on: bool) -> Result<()> {
        self.simple(if on {
            "SET autocommit=1"
        } else {
            "SET autocommit=0"
        })
    }

    fn simple(&self, sql: &'static str) -> Result<()> {
        tracing::debug!(sql = sql, "Executing");
        self.with_conn(|conn| {
            conn.query_drop(sql)
                .map_err(|e| query_error(QueryErrorKind::Execute, e))
        })
    }

    /// AUTO_INCREMENT value generated by the last INSERT.
    pub fn last_insert_id(&self) -> Result<u64> {
        self.with_conn(|conn| Ok(conn.last_insert_id()))
    }

    /// Escape `input` for this connection's SQL mode.
    ///
    /// Client side only: `NO_BACKSLASH_ESCAPES` comes from the server status
    /// flags of the last reply, so the stored OK packet is left untouched.
    pub fn escape(&self, input: &[u8]) -> Result<Vec<u8>> {
        self.with_conn(|conn| Ok(crate::types::escape(input, conn.no_backslash_escape())))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.get_mut().take() {
            tracing::trace!(target_host = %self.target, "Releasing MySQL connection");
            drop(conn);
        }
    }
}

/// Message as the C client reports it (no "ERROR nnnn (state):" prefix).
fn error_message(err: &mysql::Error) -> String {
    match err {
        mysql::Error::MySqlError(e) => e.message.clone(),
        other => other.to_string(),
    }
}

fn query_error(kind: QueryErrorKind, err: mysql::Error) -> Error {
    let (code, sqlstate) = match &err {
        mysql::Error::MySqlError(e) => (Some(e.code), Some(e.state.clone())),
        _ => (None, None),
    };
    Error::Query(QueryError {
        kind,
        code,
        sqlstate,
        message: error_message(&err),
        source: Some(Box::new(err)),
    })
}

fn deferred_error(err: &mysql::Error) -> DeferredError {
    let code = match err {
        mysql::Error::MySqlError(e) => i64::from(e.code),
        _ => 0,
    };
    DeferredError {
        code,
        message: error_message(err),
    }
}

fn column_info(columns: &[mysql::Column]) -> (Arc<ColumnInfo>, Vec<FieldType>) {
    let names = columns
        .iter()
        .map(|c| c.name_str().into_owned())
        .collect();
    let labels = columns.iter().map(type_label).collect();
    let types = columns.iter().map(FieldType::of_column).collect();
    (Arc::new(ColumnInfo::new(names, labels)), types)
}

/// Read every result set. A failure in the first set fails the call; a
/// failure in a later one is kept for `nextresult`.
fn buffer_results<P: Protocol>(mut result: QueryResult<'_, '_, '_, P>) -> Result<QueryOutcome> {
    let mut sets: Vec<ResultSet> = Vec::new();
    let mut deferred = None;

    while let Some(mut set) = result.iter() {
        let (columns, types) = column_info(set.columns().as_ref());
        let affected_rows = set.affected_rows();
        let mut rows = Vec::new();
        let mut failure = None;

        for row in &mut set {
            match row {
                Ok(row) => {
                    let values = mysql::Row::unwrap(row)
                        .into_iter()
                        .zip(&types)
                        .map(|(value, ty)| render_value(*ty, value))
                        .collect();
                    rows.push(Row::with_columns(Arc::clone(&columns), values));
                }
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        if let Some(err) = failure {
            if sets.is_empty() {
                return Err(query_error(QueryErrorKind::Retrieve, err));
            }
            tracing::debug!(set_index = sets.len(), error = %err, "Deferred multi-statement error");
            deferred = Some(deferred_error(&err));
            break;
        }

        tracing::debug!(
            set_index = sets.len(),
            row_count = rows.len(),
            affected_rows = affected_rows,
            "Buffered result set"
        );
        sets.push(ResultSet {
            columns,
            rows,
            affected_rows,
        });
    }
    drop(result);

    let Some(first) = sets.first() else {
        return Ok(QueryOutcome::Affected(0));
    };
    if !first.has_columns() {
        return Ok(QueryOutcome::Affected(first.affected_rows));
    }
    match RowCursor::from_sets(sets, deferred) {
        Some(cursor) => Ok(QueryOutcome::Rows(cursor)),
        None => Ok(QueryOutcome::Affected(0)),
    }
}
