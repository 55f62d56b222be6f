//! Prepared statements and their cursors.

use crate::session::{QueryOutcome, Session};
use crate::types::to_param;
use luasql_core::{
    Error, FetchMode, ObjectKind, QueryError, QueryErrorKind, Result, RowCursor, Value,
    already_closed, fill_table, respond, string_list,
};
use mlua::prelude::*;
use std::rc::Rc;

/// Parameter values bound so far, one slot per `?` placeholder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSlots {
    slots: Vec<Option<Value>>,
}

impl ParamSlots {
    pub fn new(count: usize) -> Self {
        Self {
            slots: vec![None; count],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Bind `value` to the 1-based placeholder `index`.
    pub fn bind(&mut self, index: i64, value: Value) -> Result<()> {
        let slot = usize::try_from(index)
            .ok()
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| self.slots.get_mut(i))
            .ok_or_else(|| Error::Argument("Invalid parameter index".to_string()))?;
        *slot = Some(value);
        Ok(())
    }

    /// Parameters in placeholder order. Every slot must be bound.
    pub fn to_params(&self) -> Result<Vec<mysql::Value>> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, slot)| {
                slot.clone().map(to_param).ok_or_else(|| {
                    Error::Query(QueryError::new(
                        QueryErrorKind::Bind,
                        format!("parameter {} is not bound", i + 1),
                    ))
                })
            })
            .collect()
    }
}

/// A server-side prepared statement. Keeps its connection open.
#[derive(Debug)]
pub struct Statement {
    session: Rc<Session>,
    stmt: Option<mysql::Statement>,
    params: ParamSlots,
}

impl Statement {
    pub fn new(session: Rc<Session>, stmt: mysql::Statement) -> Self {
        let params = ParamSlots::new(usize::from(stmt.num_params()));
        Self {
            session,
            stmt: Some(stmt),
            params,
        }
    }

    fn finalize(&mut self) {
        if let Some(stmt) = self.stmt.take() {
            if let Err(e) = self.session.close_statement(stmt) {
                tracing::debug!(error = %e, "Failed to close prepared statement");
            }
        }
    }

    fn open(&self) -> Result<&mysql::Statement> {
        self.stmt.as_ref().ok_or(Error::Closed(ObjectKind::Statement))
    }

    fn execute(&self) -> Result<QueryOutcome> {
        let stmt = self.open()?;
        let params = self.params.to_params()?;
        self.session.execute(stmt, params)
    }
}

impl Drop for Statement {
    fn drop(&mut self) {
        self.finalize();
    }
}

impl LuaUserData for Statement {
    fn add_methods<M: LuaUserDataMethods<Self>>(methods: &mut M) {
        methods.add_method_mut("bind", |lua, this, (index, value): (i64, LuaValue)| {
            this.open()?;
            let Some(value) = Value::from_lua(&value) else {
                return respond::<bool>(
                    lua,
                    Err(Error::Query(QueryError::new(
                        QueryErrorKind::Bind,
                        "Invalid parameter type",
                    ))),
                );
            };
            this.params.bind(index, value)?;
            true.into_lua_multi(lua)
        });

        methods.add_method("execute", |lua, this, ()| match this.execute() {
            Ok(QueryOutcome::Rows(rows)) => StatementCursor::new(rows).into_lua_multi(lua),
            Ok(QueryOutcome::Affected(n)) => Value::from_u64_clamped(n).into_lua_multi(lua),
            Err(err) => respond::<bool>(lua, Err(err)),
        });

        methods.add_method_mut("finalize", |_, this, ()| {
            this.finalize();
            Ok(true)
        });

        methods.add_meta_method(LuaMetaMethod::ToString, |_, this, ()| {
            Ok(ObjectKind::Statement.describe(this, this.stmt.is_none()))
        });

        #[cfg(feature = "lua54")]
        methods.add_meta_method_mut(LuaMetaMethod::Close, |_, this, _: LuaMultiValue| {
            this.finalize();
            Ok(())
        });
    }
}

/// Rows produced by executing a prepared statement.
#[derive(Debug)]
pub struct StatementCursor {
    rows: Option<RowCursor>,
}

impl StatementCursor {
    pub fn new(rows: RowCursor) -> Self {
        Self { rows: Some(rows) }
    }

    fn rows(&mut self) -> LuaResult<&mut RowCursor> {
        self.rows
            .as_mut()
            .ok_or_else(|| Error::Closed(ObjectKind::StatementCursor).into_lua_error())
    }

    /// "n" anywhere in the mode selects integer keys, otherwise column names.
    fn mode(modes: Option<&str>) -> FetchMode {
        let numeric = modes.is_none_or(|m| m.contains('n'));
        FetchMode {
            numeric,
            alphanumeric: !numeric,
        }
    }
}

impl LuaUserData for StatementCursor {
    fn add_methods<M: LuaUserDataMethods<Self>>(methods: &mut M) {
        methods.add_method_mut("fetch", |lua, this, modes: Option<String>| {
            let rows = this.rows()?;
            if let Some(row) = rows.next_row() {
                let table = lua.create_table()?;
                fill_table(lua, &table, row, Self::mode(modes.as_deref()))?;
                return Ok(LuaValue::Table(table));
            }
            this.rows = None;
            Ok(LuaValue::Nil)
        });

        methods.add_method_mut("fields", |lua, this, ()| {
            string_list(lua, this.rows()?.columns().names())
        });

        methods.add_method_mut("close", |lua, this, ()| {
            if this.rows.take().is_some() {
                true.into_lua_multi(lua)
            } else {
                already_closed(lua, "cursor is already closed")
            }
        });

        methods.add_meta_method(LuaMetaMethod::ToString, |_, this, ()| {
            Ok(ObjectKind::StatementCursor.describe(this, this.rows.is_none()))
        });

        #[cfg(feature = "lua54")]
        methods.add_meta_method_mut(LuaMetaMethod::Close, |_, this, _: LuaMultiValue| {
            this.rows = None;
            Ok(())
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use luasql_core::{ColumnInfo, ResultSet, Row};
    use std::sync::Arc;

    #[test]
    fn bind_checks_index_range() {
        let mut slots = ParamSlots::new(2);
        assert!(slots.bind(1, Value::Integer(5)).is_ok());
        assert!(slots.bind(2, Value::Null).is_ok());

        for bad in [0, 3, -1] {
            let err = slots.bind(bad, Value::Null).unwrap_err();
            assert_eq!(err.to_string(), "Invalid parameter index");
        }
    }

    #[test]
    fn unbound_parameters_fail() {
        let mut slots = ParamSlots::new(2);
        slots.bind(2, Value::from("x")).unwrap();
        let err = slots.to_params().unwrap_err();
        assert_eq!(
            err.to_string(),
            "error executing query. parameter 1 is not bound"
        );

        slots.bind(1, Value::Bool(false)).unwrap();
        assert_eq!(
            slots.to_params().unwrap(),
            vec![mysql::Value::Int(0), mysql::Value::Bytes(b"x".to_vec())]
        );
    }

    #[test]
    fn rebinding_replaces_value() {
        let mut slots = ParamSlots::new(1);
        slots.bind(1, Value::Integer(1)).unwrap();
        slots.bind(1, Value::Number(2.5)).unwrap();
        assert_eq!(slots.to_params().unwrap(), vec![mysql::Value::Double(2.5)]);
        assert!(ParamSlots::new(0).to_params().unwrap().is_empty());
    }

    #[test]
    fn fetch_mode_selection() {
        assert_eq!(StatementCursor::mode(None), FetchMode::default());
        assert!(StatementCursor::mode(Some("n")).numeric);
        let named = StatementCursor::mode(Some("a"));
        assert!(named.alphanumeric && !named.numeric);
    }

    #[test]
    fn statement_cursor_in_lua() {
        let columns = Arc::new(ColumnInfo::new(
            vec!["a".to_string(), "b".to_string()],
            vec!["number(11)".to_string(), "string(8)".to_string()],
        ));
        let rows = vec![
            Row::with_columns(Arc::clone(&columns), vec![Value::from("1"), Value::from("x")]),
            Row::with_columns(Arc::clone(&columns), vec![Value::from("2"), Value::Null]),
        ];
        let cursor = StatementCursor::new(RowCursor::new(ResultSet {
            columns,
            rows,
            affected_rows: 0,
        }));

        let lua = Lua::new();
        lua.globals().set("cur", cursor).unwrap();
        lua.load(
            r#"
            local f = cur:fields()
            assert(f[1] == "a" and f[2] == "b")
            local r = cur:fetch()
            assert(r[1] == "1" and r[2] == "x")
            r = cur:fetch("a")
            assert(r.a == "2" and r.b == nil and r[1] == nil)
            assert(cur:fetch() == nil)
            local ok, err = cur:close()
            assert(ok == false and err == "cursor is already closed")
            "#,
        )
        .exec()
        .unwrap();
    }
}
