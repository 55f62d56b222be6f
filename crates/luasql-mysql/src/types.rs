//! MySQL column types and value conversion.
//!
//! Fetched values are handed to scripts as strings, the way the C client
//! returns them. The binary protocol used by prepared statements delivers
//! typed values, which are rendered to the same text here.

use luasql_core::Value;

/// MySQL field type codes (`MYSQL_TYPE_*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FieldType {
    Decimal = 0x00,
    Tiny = 0x01,
    Short = 0x02,
    Long = 0x03,
    Float = 0x04,
    Double = 0x05,
    Null = 0x06,
    Timestamp = 0x07,
    LongLong = 0x08,
    Int24 = 0x09,
    Date = 0x0A,
    Time = 0x0B,
    DateTime = 0x0C,
    Year = 0x0D,
    NewDate = 0x0E,
    VarChar = 0x0F,
    Bit = 0x10,
    Timestamp2 = 0x11,
    DateTime2 = 0x12,
    Time2 = 0x13,
    Json = 0xF5,
    NewDecimal = 0xF6,
    Enum = 0xF7,
    Set = 0xF8,
    TinyBlob = 0xF9,
    MediumBlob = 0xFA,
    LongBlob = 0xFB,
    Blob = 0xFC,
    VarString = 0xFD,
    String = 0xFE,
    Geometry = 0xFF,
    /// Code this driver does not know
    Unknown = 0x14,
}

impl FieldType {
    #[must_use]
    pub fn from_u8(value: u8) -> Self {
        match value {
            0x00 => FieldType::Decimal,
            0x01 => FieldType::Tiny,
            0x02 => FieldType::Short,
            0x03 => FieldType::Long,
            0x04 => FieldType::Float,
            0x05 => FieldType::Double,
            0x06 => FieldType::Null,
            0x07 => FieldType::Timestamp,
            0x08 => FieldType::LongLong,
            0x09 => FieldType::Int24,
            0x0A => FieldType::Date,
            0x0B => FieldType::Time,
            0x0C => FieldType::DateTime,
            0x0D => FieldType::Year,
            0x0E => FieldType::NewDate,
            0x0F => FieldType::VarChar,
            0x10 => FieldType::Bit,
            0x11 => FieldType::Timestamp2,
            0x12 => FieldType::DateTime2,
            0x13 => FieldType::Time2,
            0xF5 => FieldType::Json,
            0xF6 => FieldType::NewDecimal,
            0xF7 => FieldType::Enum,
            0xF8 => FieldType::Set,
            0xF9 => FieldType::TinyBlob,
            0xFA => FieldType::MediumBlob,
            0xFB => FieldType::LongBlob,
            0xFC => FieldType::Blob,
            0xFD => FieldType::VarString,
            0xFE => FieldType::String,
            0xFF => FieldType::Geometry,
            _ => FieldType::Unknown,
        }
    }

    /// Type of a result column as reported by the client library.
    pub fn of_column(column: &mysql::Column) -> Self {
        Self::from_u8(column.column_type() as u8)
    }

    /// Coarse type name shown by `cursor:getcoltypes()`.
    #[must_use]
    pub const fn logical_name(self) -> &'static str {
        match self {
            FieldType::VarString | FieldType::String | FieldType::VarChar => "string",
            FieldType::Decimal
            | FieldType::NewDecimal
            | FieldType::Tiny
            | FieldType::Short
            | FieldType::Long
            | FieldType::Float
            | FieldType::Double
            | FieldType::LongLong
            | FieldType::Int24
            | FieldType::Year => "number",
            FieldType::TinyBlob
            | FieldType::MediumBlob
            | FieldType::LongBlob
            | FieldType::Blob => "binary",
            FieldType::Date | FieldType::NewDate => "date",
            FieldType::DateTime => "datetime",
            FieldType::Time => "time",
            FieldType::Timestamp => "timestamp",
            FieldType::Enum | FieldType::Set => "set",
            FieldType::Null => "null",
            _ => "undefined",
        }
    }

    #[must_use]
    pub const fn is_date_only(self) -> bool {
        matches!(self, FieldType::Date | FieldType::NewDate)
    }
}

/// Type label with display length, e.g. `number(11)`.
pub fn column_type_label(field_type: FieldType, length: u32) -> String {
    format!("{}({})", field_type.logical_name(), length)
}

/// Label for a result column.
pub fn type_label(column: &mysql::Column) -> String {
    column_type_label(FieldType::of_column(column), column.column_length())
}

/// Render a fetched value as the text the client library would return.
pub fn render_value(field_type: FieldType, value: mysql::Value) -> Value {
    match value {
        mysql::Value::NULL => Value::Null,
        mysql::Value::Bytes(bytes) => Value::Bytes(bytes),
        mysql::Value::Int(i) => text(i.to_string()),
        mysql::Value::UInt(u) => text(u.to_string()),
        mysql::Value::Float(f) => text(f.to_string()),
        mysql::Value::Double(d) => text(d.to_string()),
        mysql::Value::Date(year, month, day, hour, minute, second, micros) => {
            if field_type.is_date_only() {
                text(format!("{year:04}-{month:02}-{day:02}"))
            } else if micros > 0 {
                text(format!(
                    "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}.{micros:06}"
                ))
            } else {
                text(format!(
                    "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}"
                ))
            }
        }
        mysql::Value::Time(negative, days, hours, minutes, seconds, micros) => {
            let total_hours = days * 24 + u32::from(hours);
            let sign = if negative { "-" } else { "" };
            if micros > 0 {
                text(format!(
                    "{sign}{total_hours:02}:{minutes:02}:{seconds:02}.{micros:06}"
                ))
            } else {
                text(format!("{sign}{total_hours:02}:{minutes:02}:{seconds:02}"))
            }
        }
    }
}

fn text(s: String) -> Value {
    Value::Bytes(s.into_bytes())
}

/// Convert a bound parameter to a client library value.
pub fn to_param(value: Value) -> mysql::Value {
    match value {
        Value::Null => mysql::Value::NULL,
        Value::Bool(b) => mysql::Value::Int(i64::from(b)),
        Value::Integer(i) => mysql::Value::Int(i),
        Value::Number(n) => mysql::Value::Double(n),
        Value::Bytes(bytes) => mysql::Value::Bytes(bytes),
    }
}

/// Escape a string for inclusion between quotes in SQL text.
///
/// With `no_backslash_escapes` (the server's `NO_BACKSLASH_ESCAPES` SQL
/// mode) only single quotes are doubled.
pub fn escape(input: &[u8], no_backslash_escapes: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len() * 2);
    for &byte in input {
        if no_backslash_escapes {
            if byte == b'\'' {
                out.extend_from_slice(b"''");
            } else {
                out.push(byte);
            }
            continue;
        }
        match byte {
            0 => out.extend_from_slice(b"\\0"),
            b'\n' => out.extend_from_slice(b"\\n"),
            b'\r' => out.extend_from_slice(b"\\r"),
            b'\\' => out.extend_from_slice(b"\\\\"),
            b'\'' => out.extend_from_slice(b"\\'"),
            b'"' => out.extend_from_slice(b"\\\""),
            0x1a => out.extend_from_slice(b"\\Z"),
            other => out.push(other),
        }
    }
    out
}
