//! MySQL driver for LuaSQL Rust.
//!
//! Exposes the `luasql.mysql` module to Lua: an environment creates
//! connections, connections run SQL text or prepare statements, and
//! cursors walk the returned rows. The client side of the protocol is
//! the `mysql` crate; this crate only maps its API onto Lua objects.
//!
//! # Example
//!
//! ```lua
//! local driver = require "luasql.mysql"
//! local env = driver.mysql()
//! local conn = assert(env:connect("test", "root", "secret", "127.0.0.1"))
//! local cur = assert(conn:execute("SELECT id, name FROM people"))
//! local row = cur:fetch({}, "a")
//! while row do
//!   print(row.id, row.name)
//!   row = cur:fetch(row, "a")
//! end
//! conn:close()
//! env:close()
//! ```
//!
//! Build the loadable module with
//! `cargo build --release --no-default-features --features lua54,module`.

pub mod config;
pub mod connection;
pub mod cursor;
pub mod environment;
pub mod session;
pub mod statement;
pub mod types;

pub use config::ConnectConfig;
pub use connection::Connection;
pub use cursor::Cursor;
pub use environment::Environment;
pub use session::{QueryOutcome, Session};
pub use statement::{ParamSlots, Statement, StatementCursor};
pub use types::FieldType;

use mlua::prelude::*;

/// Client library reported as `_CLIENTVERSION`.
pub const CLIENT_VERSION: &str = "rust-mysql-simple 25";

/// Build the module table: `mysql()` plus the informational fields.
pub fn open(lua: &Lua) -> LuaResult<LuaTable> {
    let module = lua.create_table()?;
    module.set(
        "mysql",
        lua.create_function(|_, ()| {
            tracing::trace!("Creating MySQL environment");
            Ok(Environment::new())
        })?,
    )?;
    luasql_core::set_info(&module)?;
    module.set("_CLIENTVERSION", CLIENT_VERSION)?;
    Ok(module)
}

/// `require "luasql.mysql"`
#[cfg(feature = "module")]
#[allow(unsafe_code)]
#[mlua::lua_module]
fn luasql_mysql(lua: &Lua) -> LuaResult<LuaTable> {
    open(lua)
}

/// `require "mysql"`, kept for scripts written against older releases.
#[cfg(feature = "module")]
#[allow(unsafe_code)]
#[mlua::lua_module(name = "mysql")]
fn mysql_legacy(lua: &Lua) -> LuaResult<LuaTable> {
    open(lua)
}
