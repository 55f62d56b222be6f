//! Moving buffered rows into Lua.

use crate::row::Row;
use mlua::prelude::*;

/// How `fetch` keys the row table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchMode {
    /// Integer keys `1..=n` ("n")
    pub numeric: bool,
    /// Column-name keys ("a")
    pub alphanumeric: bool,
}

impl Default for FetchMode {
    fn default() -> Self {
        Self {
            numeric: true,
            alphanumeric: false,
        }
    }
}

impl FetchMode {
    /// Parse a mode string; unknown letters are ignored.
    pub fn parse(modes: Option<&str>) -> Self {
        match modes {
            None => Self::default(),
            Some(s) => Self {
                numeric: s.contains('n'),
                alphanumeric: s.contains('a'),
            },
        }
    }
}

/// Write a row into `table` according to `mode`.
pub fn fill_table(lua: &Lua, table: &LuaTable, row: &Row, mode: FetchMode) -> LuaResult<()> {
    for (i, (name, value)) in row.iter().enumerate() {
        let value = value.into_lua(lua)?;
        if mode.numeric {
            table.raw_set(i + 1, value.clone())?;
        }
        if mode.alphanumeric {
            table.raw_set(name, value)?;
        }
    }
    Ok(())
}

/// A row as one return value per column.
pub fn row_to_values(lua: &Lua, row: &Row) -> LuaResult<LuaMultiValue> {
    row.values()
        .iter()
        .map(|v| v.into_lua(lua))
        .collect::<LuaResult<LuaMultiValue>>()
}

/// A 1-based Lua array of strings.
pub fn string_list(lua: &Lua, items: &[String]) -> LuaResult<LuaTable> {
    lua.create_sequence_from(items.iter().map(String::as_str))
}
