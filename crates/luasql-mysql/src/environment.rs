//! The environment object created by `luasql.mysql.mysql()`.

use crate::config::ConnectConfig;
use crate::connection::Connection;
use crate::session::Session;
use luasql_core::{Error, ObjectKind, already_closed, respond};
use mlua::prelude::*;

#[derive(Debug, Default)]
pub struct Environment {
    closed: bool,
}

type ConnectArgs = (
    LuaValue,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<u16>,
    Option<String>,
    Option<u32>,
);

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    fn config_from_args(lua: &Lua, args: ConnectArgs) -> LuaResult<ConnectConfig> {
        let (source, user, password, host, port, socket, flags) = args;
        let source = match source {
            LuaValue::Table(table) => return Ok(ConnectConfig::from_lua_table(lua, table)?),
            LuaValue::Nil => None,
            other => Some(String::from_lua(other, lua)?),
        };
        Ok(ConnectConfig::from_args(
            source, user, password, host, port, socket, flags,
        ))
    }

    fn connect(&self, lua: &Lua, args: ConnectArgs) -> LuaResult<LuaMultiValue> {
        if self.closed {
            return Err(Error::Closed(ObjectKind::Environment).into_lua_error());
        }
        let config = Self::config_from_args(lua, args)?;
        let result = Session::connect(&config).map(Connection::new);
        respond(lua, result)
    }
}

impl LuaUserData for Environment {
    fn add_methods<M: LuaUserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("connect", |lua, this, args: ConnectArgs| this.connect(lua, args));

        methods.add_method_mut("close", |lua, this, ()| {
            if this.closed {
                return already_closed(lua, "env is already closed");
            }
            this.closed = true;
            true.into_lua_multi(lua)
        });

        methods.add_meta_method(LuaMetaMethod::ToString, |_, this, ()| {
            Ok(ObjectKind::Environment.describe(this, this.closed))
        });

        #[cfg(feature = "lua54")]
        methods.add_meta_method_mut(LuaMetaMethod::Close, |_, this, _: LuaMultiValue| {
            this.closed = true;
            Ok(())
        });
    }
}
