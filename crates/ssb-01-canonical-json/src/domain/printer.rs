//! # Canonical Printer
//!
//! Emits a value the way `JSON.stringify(value, null, 2)` does: two spaces
//! per level, `": "` between key and value, `{}` and `[]` for empty
//! containers, ECMAScript string quoting and ECMAScript number formatting.

use super::value::{JsonObject, JsonString, JsonValue};

const INDENT: &str = "  ";

/// Characters below 0x20 that have a short escape. Everything else below 0x20
/// is written as `\u00xx`.
const SHORT_ESCAPES: [(u16, &str); 5] = [
    (0x08, "\\b"),
    (0x09, "\\t"),
    (0x0A, "\\n"),
    (0x0C, "\\f"),
    (0x0D, "\\r"),
];

pub(crate) fn write_value(out: &mut String, value: &JsonValue, level: usize) {
    match value {
        JsonValue::Null => out.push_str("null"),
        JsonValue::Bool(true) => out.push_str("true"),
        JsonValue::Bool(false) => out.push_str("false"),
        JsonValue::Number(n) => out.push_str(&format_number(*n)),
        JsonValue::String(s) => quote(out, s),
        JsonValue::Array(items) => write_array(out, items, level),
        JsonValue::Object(obj) => write_object(out, obj, level),
    }
}

pub(crate) fn write_object(out: &mut String, obj: &JsonObject, level: usize) {
    if obj.is_empty() {
        out.push_str("{}");
        return;
    }
    out.push('{');
    for (i, (key, value)) in obj.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        newline(out, level + 1);
        quote(out, key);
        out.push_str(": ");
        write_value(out, value, level + 1);
    }
    newline(out, level);
    out.push('}');
}

fn write_array(out: &mut String, items: &[JsonValue], level: usize) {
    if items.is_empty() {
        out.push_str("[]");
        return;
    }
    out.push('[');
    for (i, value) in items.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        newline(out, level + 1);
        write_value(out, value, level + 1);
    }
    newline(out, level);
    out.push(']');
}

fn newline(out: &mut String, level: usize) {
    out.push('\n');
    for _ in 0..level {
        out.push_str(INDENT);
    }
}

/// Quote a string following ECMAScript `QuoteJSONString`.
pub(crate) fn quote(out: &mut String, s: &JsonString) {
    out.push('"');
    for decoded in char::decode_utf16(s.units().iter().copied()) {
        match decoded {
            Ok('"') => out.push_str("\\\""),
            Ok('\\') => out.push_str("\\\\"),
            Ok(c) if (c as u32) < 0x20 => {
                let unit = c as u16;
                match SHORT_ESCAPES.iter().find(|(u, _)| *u == unit) {
                    Some((_, esc)) => out.push_str(esc),
                    None => out.push_str(&format!("\\u{unit:04x}")),
                }
            }
            Ok(c) => out.push(c),
            Err(lone) => out.push_str(&format!("\\u{:04x}", lone.unpaired_surrogate())),
        }
    }
    out.push('"');
}

/// Format a finite number the way ECMAScript `Number::toString` does.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        // Covers -0.
        return "0".to_string();
    }
    let sign = if value < 0.0 { "-" } else { "" };

    // `{:e}` yields the shortest round-trip digits as `d[.ddd]e<exp>`.
    let sci = format!("{:e}", value.abs());
    let (mantissa, exp) = match sci.split_once('e') {
        Some(parts) => parts,
        None => (sci.as_str(), "0"),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let exp: i32 = exp.parse().unwrap_or(0);
    let k = digits.len() as i32;
    let n = exp + 1;

    let body = if k <= n && n <= 21 {
        format!("{digits}{}", "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        format!("{int}.{frac}")
    } else if -6 < n && n <= 0 {
        format!("0.{}{digits}", "0".repeat((-n) as usize))
    } else {
        let e = n - 1;
        let e_sign = if e < 0 { '-' } else { '+' };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{first}e{e_sign}{}", e.abs())
        } else {
            format!("{first}.{rest}e{e_sign}{}", e.abs())
        }
    };
    format!("{sign}{body}")
}
