//! Cursor over the results of `conn:execute`.

use luasql_core::{
    Error, FetchMode, NextSet, ObjectKind, RowCursor, already_closed, fill_table, row_to_values,
    string_list,
};
use mlua::prelude::*;

/// Buffered query result handed to scripts. `None` once closed.
#[derive(Debug)]
pub struct Cursor {
    rows: Option<RowCursor>,
}

impl Cursor {
    pub fn new(rows: RowCursor) -> Self {
        Self { rows: Some(rows) }
    }

    pub fn is_closed(&self) -> bool {
        self.rows.is_none()
    }

    fn rows(&mut self) -> LuaResult<&mut RowCursor> {
        self.rows
            .as_mut()
            .ok_or_else(|| Error::Closed(ObjectKind::Cursor).into_lua_error())
    }

    fn fetch(
        &mut self,
        lua: &Lua,
        table: LuaValue,
        modes: Option<String>,
    ) -> LuaResult<LuaMultiValue> {
        let rows = self.rows()?;
        if let Some(row) = rows.next_row() {
            return match table {
                LuaValue::Table(t) => {
                    fill_table(lua, &t, row, FetchMode::parse(modes.as_deref()))?;
                    t.into_lua_multi(lua)
                }
                _ => row_to_values(lua, row),
            };
        }
        // Keep the cursor open while further result sets are pending.
        if !rows.has_next_set() {
            tracing::trace!("Cursor exhausted; closing");
            self.rows = None;
        }
        LuaValue::Nil.into_lua_multi(lua)
    }

    fn next_result(&mut self, lua: &Lua) -> LuaResult<LuaMultiValue> {
        match self.rows()?.next_set() {
            NextSet::Rows => true.into_lua_multi(lua),
            NextSet::NoRows { affected_rows } => {
                tracing::trace!(affected_rows, "Next result has no rows");
                (false, 0, "no result set").into_lua_multi(lua)
            }
            NextSet::Failed(err) => (false, err.code, err.message).into_lua_multi(lua),
            NextSet::Exhausted => (false, -1).into_lua_multi(lua),
        }
    }
}

impl LuaUserData for Cursor {
    fn add_methods<M: LuaUserDataMethods<Self>>(methods: &mut M) {
        methods.add_method_mut(
            "fetch",
            |lua, this, (table, modes): (LuaValue, Option<String>)| this.fetch(lua, table, modes),
        );

        methods.add_method_mut("getcolnames", |lua, this, ()| {
            string_list(lua, this.rows()?.columns().names())
        });

        methods.add_method_mut("getcoltypes", |lua, this, ()| {
            string_list(lua, this.rows()?.columns().types())
        });

        methods.add_method_mut("numrows", |_, this, ()| Ok(this.rows()?.row_count()));

        methods.add_method_mut("seek", |_, this, offset: i64| {
            // A negative offset lands past the last row.
            this.rows()?.seek(usize::try_from(offset).unwrap_or(usize::MAX));
            Ok(())
        });

        methods.add_method_mut("nextresult", |lua, this, ()| this.next_result(lua));

        methods.add_method_mut("hasnextresult", |_, this, ()| {
            Ok(this.rows()?.has_next_set())
        });

        methods.add_method_mut("close", |lua, this, ()| {
            if this.rows.take().is_some() {
                true.into_lua_multi(lua)
            } else {
                already_closed(lua, "cursor is already closed")
            }
        });

        methods.add_meta_method(LuaMetaMethod::ToString, |_, this, ()| {
            Ok(ObjectKind::Cursor.describe(this, this.is_closed()))
        });

        #[cfg(feature = "lua54")]
        methods.add_meta_method_mut(LuaMetaMethod::Close, |_, this, _: LuaMultiValue| {
            this.rows = None;
            Ok(())
        });
    }
}
