//! Return conventions shared by every driver.
//!
//! Database failures come back to scripts as `nil, "LuaSQL: <message>"`.
//! Misuse of a closed object is raised as an error instead.

use crate::error::Error;
use mlua::prelude::*;

pub const LUASQL_PREFIX: &str = "LuaSQL: ";

pub const LUASQL_VERSION: &str = concat!("LuaSQL ", env!("CARGO_PKG_VERSION"));
pub const LUASQL_DESCRIPTION: &str = "Database connectivity for the Lua programming language";
pub const LUASQL_COPYRIGHT: &str = "Copyright (C) 2003-2024 Kepler Project";

/// The kinds of objects a driver hands out to scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Environment,
    Connection,
    Cursor,
    Statement,
    StatementCursor,
}

impl ObjectKind {
    /// Name used in "<name> is closed" errors.
    pub fn short_name(self) -> &'static str {
        match self {
            ObjectKind::Environment => "environment",
            ObjectKind::Connection => "connection",
            ObjectKind::Cursor | ObjectKind::StatementCursor => "cursor",
            ObjectKind::Statement => "statement",
        }
    }

    /// Type name reported by `__tostring`.
    pub fn type_name(self) -> &'static str {
        match self {
            ObjectKind::Environment => "MySQL environment",
            ObjectKind::Connection => "MySQL connection",
            ObjectKind::Cursor => "MySQL cursor",
            ObjectKind::Statement => "MySQL statement",
            ObjectKind::StatementCursor => "MySQL statement cursor",
        }
    }

    /// `"MySQL cursor (0x...)"` while open, `"MySQL cursor (closed)"` after.
    pub fn describe<T>(self, object: &T, closed: bool) -> String {
        if closed {
            format!("{} (closed)", self.type_name())
        } else {
            format!("{} ({:p})", self.type_name(), object)
        }
    }
}

/// Soft failure: returns `nil, "LuaSQL: <err>"`.
pub fn fail(lua: &Lua, err: impl std::fmt::Display) -> LuaResult<LuaMultiValue> {
    tracing::debug!(error = %err, "returning failure to script");
    (LuaValue::Nil, format!("{LUASQL_PREFIX}{err}")).into_lua_multi(lua)
}

/// Turn a driver result into a script return.
///
/// Closed objects and bad arguments raise; database failures become
/// `nil, message`.
pub fn respond<T: IntoLuaMulti>(lua: &Lua, result: crate::Result<T>) -> LuaResult<LuaMultiValue> {
    match result {
        Ok(value) => value.into_lua_multi(lua),
        Err(err @ (Error::Closed(_) | Error::Argument(_))) => Err(err.into_lua_error()),
        Err(err) => fail(lua, err),
    }
}

/// Result of closing an object twice: `false, <msg>`.
pub fn already_closed(lua: &Lua, msg: &str) -> LuaResult<LuaMultiValue> {
    (false, msg).into_lua_multi(lua)
}

/// Sets the informational fields every LuaSQL module table carries.
pub fn set_info(table: &LuaTable) -> LuaResult<()> {
    table.set("_COPYRIGHT", LUASQL_COPYRIGHT)?;
    table.set("_DESCRIPTION", LUASQL_DESCRIPTION)?;
    table.set("_VERSION", LUASQL_VERSION)?;
    Ok(())
}
