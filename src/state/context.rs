//! Dialog context
//!
//! Form data accumulated across the steps of one dialog instance. The
//! context travels inside the state token, so its JSON text has to stay
//! stable: keys keep insertion order and the layout matches the
//! `{"key": value, "other": value}` form written by earlier deployments,
//! with every non-ASCII character escaped as `\uXXXX`.

use std::io;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use crate::utils::errors::{ConsultBotError, Result};

/// Key/value map carried between steps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context(Map<String, Value>);

impl Context {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Store a value, replacing any previous one under the same key
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<()> {
        let json_value = serde_json::to_value(value)?;
        self.0.insert(key.to_string(), json_value);
        Ok(())
    }

    /// Read a required string field
    pub fn require_str(&self, key: &str) -> Result<&str> {
        self.get_str(key).ok_or_else(|| {
            ConsultBotError::InvalidInput(format!("Missing context field: {}", key))
        })
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    /// Read an id stored either as a number or as a numeric string
    pub fn get_id(&self, key: &str) -> Option<i32> {
        match self.0.get(key)? {
            Value::Number(number) => number.as_i64().and_then(|id| i32::try_from(id).ok()),
            Value::String(text) => text.parse::<i32>().ok(),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serialize in the token layout
    pub fn to_json(&self) -> Result<String> {
        let mut buffer = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, TokenFormatter);
        self.0.serialize(&mut serializer)?;
        // TokenFormatter only ever writes ASCII
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Parse a context segment; anything but a JSON object is rejected
    pub fn from_json(text: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str::<Map<String, Value>>(text).map(Self)
    }
}

/// `", "` / `": "` separators and ASCII-only strings
struct TokenFormatter;

impl serde_json::ser::Formatter for TokenFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if ch.is_ascii() {
                writer.write_all(&[ch as u8])?;
            } else {
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}
