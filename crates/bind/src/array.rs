//! Database array literals (`{1,2,"a b",NULL}`).

use std::fmt::Write as _;

use crate::encode::{format_float32, format_float64, format_timestamp, non_finite, reduced_number};
use crate::error::{Error, Result};
use crate::value::Value;

/// Renders `items` as an unquoted array literal.
pub(crate) fn render_array(items: &[Value]) -> String {
    let mut out = String::from("{");
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        render_element(item, &mut out);
    }
    out.push('}');
    out
}

fn render_element(value: &Value, out: &mut String) {
    match value {
        Value::Null | Value::Custom(None) => out.push_str("NULL"),
        Value::Bool(v) => out.push_str(if *v { "true" } else { "false" }),
        Value::I8(v) => push_display(out, v),
        Value::I16(v) => push_display(out, v),
        Value::I32(v) => push_display(out, v),
        Value::I64(v) => push_display(out, v),
        Value::U8(v) => push_display(out, v),
        Value::U16(v) => push_display(out, v),
        Value::U32(v) => push_display(out, v),
        Value::U64(v) => push_display(out, v),
        Value::F32(v) => match non_finite(f64::from(*v)) {
            Some(name) => quote_element(name, out),
            None => out.push_str(&format_float32(*v)),
        },
        Value::F64(v) => match non_finite(*v) {
            Some(name) => quote_element(name, out),
            None => out.push_str(&format_float64(*v)),
        },
        Value::Str(s) => quote_element(s, out),
        Value::Raw(bytes) => out.push_str(&String::from_utf8_lossy(bytes)),
        Value::Timestamp(t) => quote_element(&format_timestamp(t), out),
        Value::Custom(Some(inner)) => match reduced_number(inner) {
            Some(number) => out.push_str(number),
            None => render_element(inner, out),
        },
        Value::Array(items) => out.push_str(&render_array(items)),
        Value::Json(doc) => quote_element(&doc.to_string(), out),
    }
}

fn push_display(out: &mut String, v: impl std::fmt::Display) {
    let _ = write!(out, "{v}");
}

fn quote_element(s: &str, out: &mut String) {
    out.push('"');
    for ch in s.chars() {
        if ch == '"' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
}

/// Splits a one-dimensional array literal into its elements. Unquoted `NULL`
/// elements come back as `None`.
///
/// `T` names the destination in error messages.
pub(crate) fn parse_array<T: ?Sized>(literal: &str) -> Result<Vec<Option<String>>> {
    let invalid = || Error::mismatch::<T>(format!("array({literal:?})"));

    let mut body = literal.trim();
    // dimension decoration, e.g. `[0:2]={1,2,3}`
    if body.starts_with('[') {
        body = body.split_once('=').map(|(_, rest)| rest.trim()).ok_or_else(invalid)?;
    }
    let body = body.strip_prefix('{').and_then(|b| b.strip_suffix('}')).ok_or_else(invalid)?;
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut elements = Vec::new();
    let mut chars = body.chars().peekable();
    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        match chars.peek() {
            Some('{') => return Err(invalid()),
            Some('"') => {
                chars.next();
                let mut element = String::new();
                loop {
                    match chars.next() {
                        Some('\\') => element.push(chars.next().ok_or_else(invalid)?),
                        Some('"') => break,
                        Some(c) => element.push(c),
                        None => return Err(invalid()),
                    }
                }
                elements.push(Some(element));
            }
            _ => {
                let mut element = String::new();
                while let Some(c) = chars.next_if(|c| *c != ',') {
                    if c == '\\' {
                        element.push(chars.next().ok_or_else(invalid)?);
                    } else {
                        element.push(c);
                    }
                }
                let element = element.trim();
                if element.is_empty() {
                    return Err(invalid());
                }
                if element.eq_ignore_ascii_case("null") {
                    elements.push(None);
                } else {
                    elements.push(Some(element.to_string()));
                }
            }
        }

        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        match chars.next() {
            Some(',') => {}
            None => break,
            Some(_) => return Err(invalid()),
        }
    }
    Ok(elements)
}
