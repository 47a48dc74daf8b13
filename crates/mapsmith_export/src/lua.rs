//! Lua table writer
//!
//! Produces a `return { ... }` chunk loadable by any Lua 5.1+ runtime.

use crate::error::ExportError;
use serde::Serialize;
use serde_json::Value as Json;
use std::fmt::{self, Write};

const KEYWORDS: &[&str] = &[
    "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "goto", "if", "in",
    "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
];

/// Serialize any value as a Lua `return` statement
pub fn to_lua<T: Serialize>(value: &T) -> Result<String, ExportError> {
    let json = serde_json::to_value(value)?;
    let mut out = String::from("return ");
    write_value(&mut out, &json, 0)?;
    out.push('\n');
    Ok(out)
}

fn is_scalar(v: &Json) -> bool {
    !matches!(v, Json::Array(_) | Json::Object(_))
}

fn write_value(out: &mut String, v: &Json, depth: usize) -> fmt::Result {
    match v {
        Json::Null => out.write_str("nil"),
        Json::Bool(b) => write!(out, "{b}"),
        Json::Number(n) => write_number(out, n),
        Json::String(s) => write_string(out, s),
        Json::Array(items) if items.is_empty() => out.write_str("{}"),
        Json::Array(items) if items.iter().all(is_scalar) => {
            out.write_str("{ ")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.write_str(", ")?;
                }
                write_value(out, item, depth + 1)?;
            }
            out.write_str(" }")
        }
        Json::Array(items) => {
            out.write_str("{\n")?;
            for item in items {
                indent(out, depth + 1)?;
                write_value(out, item, depth + 1)?;
                out.write_str(",\n")?;
            }
            indent(out, depth)?;
            out.write_str("}")
        }
        Json::Object(map) if map.is_empty() => out.write_str("{}"),
        Json::Object(map) => {
            out.write_str("{\n")?;
            for (key, item) in map {
                indent(out, depth + 1)?;
                write_key(out, key)?;
                out.write_str(" = ")?;
                write_value(out, item, depth + 1)?;
                out.write_str(",\n")?;
            }
            indent(out, depth)?;
            out.write_str("}")
        }
    }
}

fn indent(out: &mut String, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        out.write_str("  ")?;
    }
    Ok(())
}

fn write_number(out: &mut String, n: &serde_json::Number) -> fmt::Result {
    if let Some(i) = n.as_i64() {
        return write!(out, "{i}");
    }
    if let Some(u) = n.as_u64() {
        return write!(out, "{u}");
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => write!(out, "{}", f as i64),
        Some(f) => write!(out, "{f}"),
        None => out.write_str("0"),
    }
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !KEYWORDS.contains(&key)
}

/// Object keys are always strings; digits stay quoted so `"2"` never aliases `[2]`
fn write_key(out: &mut String, key: &str) -> fmt::Result {
    if is_identifier(key) {
        out.write_str(key)
    } else {
        out.write_str("[")?;
        write_string(out, key)?;
        out.write_str("]")
    }
}

fn write_string(out: &mut String, s: &str) -> fmt::Result {
    out.write_char('"')?;
    for c in s.chars() {
        match c {
            '"' => out.write_str("\\\"")?,
            '\\' => out.write_str("\\\\")?,
            '\n' => out.write_str("\\n")?,
            '\r' => out.write_str("\\r")?,
            '\t' => out.write_str("\\t")?,
            c if (c as u32) < 0x20 || c as u32 == 0x7f => write!(out, "\\{:03}", c as u32)?,
            c => out.write_char(c)?,
        }
    }
    out.write_char('"')
}
