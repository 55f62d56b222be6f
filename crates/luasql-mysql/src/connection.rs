//! The connection object returned by `env:connect`.

use crate::cursor::Cursor;
use crate::session::{QueryOutcome, Session};
use crate::statement::Statement;
use luasql_core::{ConnectionErrorKind, Error, ObjectKind, Value, already_closed, respond};
use mlua::prelude::*;
use std::rc::Rc;

/// Script handle on a [`Session`].
///
/// Statements share the session, so the client connection lives until the
/// last of them is collected or `close` is called explicitly.
#[derive(Debug)]
pub struct Connection {
    session: Rc<Session>,
}

impl Connection {
    pub fn new(session: Session) -> Self {
        Self {
            session: Rc::new(session),
        }
    }

    pub fn session(&self) -> &Rc<Session> {
        &self.session
    }

    fn execute(&self, lua: &Lua, sql: &LuaString) -> LuaResult<LuaMultiValue> {
        let sql = sql.to_str()?;
        match self.session.query(&sql) {
            Ok(QueryOutcome::Rows(rows)) => Cursor::new(rows).into_lua_multi(lua),
            Ok(QueryOutcome::Affected(n)) => Value::from_u64_clamped(n).into_lua_multi(lua),
            Err(err) => respond::<bool>(lua, Err(err)),
        }
    }

    fn prepare(&self, lua: &Lua, sql: &LuaString) -> LuaResult<LuaMultiValue> {
        let sql = sql.to_str()?;
        let result = self
            .session
            .prepare(&sql)
            .map(|stmt| Statement::new(Rc::clone(&self.session), stmt));
        respond(lua, result)
    }

    /// `true`/`false` for transaction control; a closed connection raises.
    fn succeeded(result: luasql_core::Result<()>) -> LuaResult<bool> {
        match result {
            Ok(()) => Ok(true),
            Err(err @ Error::Closed(_)) => Err(err.into_lua_error()),
            Err(err) => {
                tracing::debug!(error = %err, "Transaction command failed");
                Ok(false)
            }
        }
    }
}

impl LuaUserData for Connection {
    fn add_methods<M: LuaUserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("execute", |lua, this, sql: LuaString| this.execute(lua, &sql));

        methods.add_method("prepare", |lua, this, sql: LuaString| this.prepare(lua, &sql));

        methods.add_method("escape", |lua, this, input: LuaString| {
            let escaped = this.session.escape(&input.as_bytes())?;
            lua.create_string(escaped)
        });

        methods.add_method("commit", |_, this, ()| {
            Self::succeeded(this.session.commit())
        });

        methods.add_method("rollback", |_, this, ()| {
            Self::succeeded(this.session.rollback())
        });

        methods.add_method("setautocommit", |_, this, on: Option<bool>| {
            if let Err(err) = this.session.set_autocommit(on.unwrap_or(false)) {
                if matches!(err, Error::Closed(_)) {
                    return Err(err.into_lua_error());
                }
                tracing::warn!(error = %err, "Failed to change autocommit mode");
            }
            Ok(true)
        });

        methods.add_method("getlastautoid", |_, this, ()| {
            let id = this.session.last_insert_id()?;
            Ok(Value::from_u64_clamped(id))
        });

        methods.add_method("ping", |_, this, ()| match this.session.ping() {
            Ok(alive) => Ok(alive),
            Err(Error::Connection(err)) if err.kind == ConnectionErrorKind::Disconnected => {
                Err(LuaError::RuntimeError(err.message))
            }
            Err(err) => Err(err.into_lua_error()),
        });

        methods.add_method("close", |lua, this, ()| {
            if this.session.close() {
                true.into_lua_multi(lua)
            } else {
                already_closed(lua, "Connection is already closed")
            }
        });

        methods.add_meta_method(LuaMetaMethod::ToString, |_, this, ()| {
            Ok(ObjectKind::Connection.describe(this, this.session.is_closed()))
        });

        #[cfg(feature = "lua54")]
        methods.add_meta_method(LuaMetaMethod::Close, |_, this, _: LuaMultiValue| {
            this.session.close();
            Ok(())
        });
    }
}
