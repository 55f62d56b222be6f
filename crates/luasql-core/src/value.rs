//! Driver-neutral values exchanged with scripts.

use mlua::prelude::*;

/// A single cell or parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL, `nil` in Lua
    Null,
    Bool(bool),
    Integer(i64),
    Number(f64),
    /// Text or binary data, passed to Lua as a (binary safe) string
    Bytes(Vec<u8>),
}

impl Value {
    /// Check if this value is NULL.
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Name of the variant, for diagnostics.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "BOOLEAN",
            Value::Integer(_) => "INTEGER",
            Value::Number(_) => "DOUBLE",
            Value::Bytes(_) => "BYTES",
        }
    }

    /// Convert a u64 counter (affected rows, insert ids) to an integer value.
    ///
    /// Lua integers are signed 64-bit; anything above `i64::MAX` is clamped.
    #[must_use]
    pub fn from_u64_clamped(v: u64) -> Self {
        if let Ok(signed) = i64::try_from(v) {
            Value::Integer(signed)
        } else {
            tracing::warn!(
                value = v,
                clamped_to = i64::MAX,
                "u64 value exceeds i64::MAX; clamping to i64::MAX"
            );
            Value::Integer(i64::MAX)
        }
    }

    /// Convert a Lua value into a bindable value.
    ///
    /// Returns `None` for tables, functions, userdata and threads.
    pub fn from_lua(value: &LuaValue) -> Option<Self> {
        match value {
            LuaValue::Nil => Some(Value::Null),
            LuaValue::Boolean(b) => Some(Value::Bool(*b)),
            LuaValue::Integer(i) => Some(Value::Integer(*i)),
            LuaValue::Number(n) => Some(Value::Number(*n)),
            LuaValue::String(s) => Some(Value::Bytes(s.as_bytes().to_vec())),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Bytes(s.as_bytes().to_vec())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl IntoLua for Value {
    fn into_lua(self, lua: &Lua) -> LuaResult<LuaValue> {
        match self {
            Value::Null => Ok(LuaValue::Nil),
            Value::Bool(b) => Ok(LuaValue::Boolean(b)),
            Value::Integer(i) => Ok(LuaValue::Integer(i)),
            Value::Number(n) => Ok(LuaValue::Number(n)),
            Value::Bytes(bytes) => lua.create_string(bytes).map(LuaValue::String),
        }
    }
}

impl IntoLua for &Value {
    fn into_lua(self, lua: &Lua) -> LuaResult<LuaValue> {
        match self {
            Value::Bytes(bytes) => lua.create_string(bytes).map(LuaValue::String),
            other => other.clone().into_lua(lua),
        }
    }
}
