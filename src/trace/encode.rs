//! Value encoders for the data trace.
//!
//! Every encoder is total: it never fails, whatever [`Value`] it is handed. Values that do
//! not match the encoder's category are written in their natural text form, with line
//! breaks escaped so every encoded value occupies exactly one line of the trace.

use std::borrow::Cow;
use std::fmt;

use super::constants::{NONSENSICAL, NULL_LITERAL};

/// A raw column value as read from a row source.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Real(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The natural text form of the value, without any quoting.
    fn text(&self) -> Cow<'_, str> {
        match self {
            Value::Null => Cow::Borrowed(NULL_LITERAL),
            Value::Int(v) => Cow::Owned(v.to_string()),
            Value::Real(v) => Cow::Owned(v.to_string()),
            Value::Text(s) => Cow::Borrowed(s.as_str()),
            Value::Bytes(b) => String::from_utf8_lossy(b),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Encoding strategy bound to a field by the type classifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Encoder {
    /// Numbers: natural text form, `nonsensical` when absent.
    Plain,
    /// Strings and temporal values: double quoted and escaped, `null` when absent.
    Quoted,
    /// Single-byte bit fields: the unsigned ordinal of the byte.
    Bit,
    /// Binary blobs: bracketed list of signed bytes.
    Bytes,
    /// Set columns: bracketed list of quoted members.
    Set,
}

impl Encoder {
    pub fn encode(&self, value: &Value) -> String {
        match self {
            Encoder::Plain => encode_plain(value),
            Encoder::Quoted => encode_quoted(value),
            Encoder::Bit => encode_bit(value),
            Encoder::Bytes => encode_bytes(value),
            Encoder::Set => encode_set(value),
        }
    }
}

fn encode_plain(value: &Value) -> String {
    match value {
        Value::Null => NONSENSICAL.to_string(),
        other => single_line(&other.text()),
    }
}

fn encode_quoted(value: &Value) -> String {
    match value {
        Value::Null => NULL_LITERAL.to_string(),
        other => quote(&other.text()),
    }
}

fn encode_bit(value: &Value) -> String {
    match value {
        Value::Null => NONSENSICAL.to_string(),
        Value::Bytes(b) => b
            .first()
            .map_or_else(|| NONSENSICAL.to_string(), |byte| byte.to_string()),
        Value::Text(s) => s
            .as_bytes()
            .first()
            .map_or_else(|| NONSENSICAL.to_string(), |byte| byte.to_string()),
        other => other.text().into_owned(),
    }
}

fn encode_bytes(value: &Value) -> String {
    let bytes = match value {
        Value::Null => return NONSENSICAL.to_string(),
        Value::Bytes(b) => b.as_slice(),
        Value::Text(s) => s.as_bytes(),
        other => return other.text().into_owned(),
    };
    let items: Vec<String> = bytes.iter().map(|&b| (b as i8).to_string()).collect();
    format!("[{}]", items.join(" "))
}

fn encode_set(value: &Value) -> String {
    let joined = match value {
        Value::Null => return NONSENSICAL.to_string(),
        other => other.text(),
    };
    if joined.is_empty() {
        return NONSENSICAL.to_string();
    }
    let members: Vec<String> = joined.split(',').map(quote).collect();
    format!("[{}]", members.join(" "))
}

/// Wraps `s` in double quotes, escaping quotes and control characters.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    push_escaped(&mut out, s);
    out.push('"');
    out
}

/// `s` with the same escapes as [`quote`] but no surrounding quotes.
fn single_line(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    push_escaped(&mut out, s);
    out
}

fn push_escaped(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            c => out.push(c),
        }
    }
}
