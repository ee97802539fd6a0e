// src/markup.rs

//! Serializes a [`Value`] tree into the generic XML document that templates
//! are written against:
//!
//! ```xml
//! <?xml version="1.0"?>
//! <configuration>
//!   <map>
//!     <entry><key><string>port</string></key><value><string>80</string></value></entry>
//!   </map>
//! </configuration>
//! ```
//!
//! (shown indented; the real output has no whitespace between elements).

use std::borrow::Cow;

use crate::value::Value;

pub const XML_DECLARATION: &str = r#"<?xml version="1.0"?>"#;
pub const ROOT_ELEMENT: &str = "configuration";

/// Serialize `value` as a complete document. Never fails.
///
/// `Nil` and `Number` both serialize to empty content; numbers are not
/// produced by the parser today, so nothing depends on their payload.
pub fn to_markup(value: &Value) -> String {
    let mut out = String::with_capacity(128);
    out.push_str(XML_DECLARATION);
    out.push('<');
    out.push_str(ROOT_ELEMENT);
    out.push('>');
    write_value(&mut out, value);
    out.push_str("</");
    out.push_str(ROOT_ELEMENT);
    out.push('>');
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Nil | Value::Number(_) => {}
        Value::String(text) => {
            out.push_str("<string>");
            out.push_str(&escape_text(text));
            out.push_str("</string>");
        }
        Value::List(items) => {
            out.push_str("<list>");
            for item in items {
                write_value(out, item);
            }
            out.push_str("</list>");
        }
        Value::Map(entries) => {
            out.push_str("<map>");
            for (key, value) in entries {
                out.push_str("<entry><key>");
                write_value(out, key);
                out.push_str("</key><value>");
                write_value(out, value);
                out.push_str("</value></entry>");
            }
            out.push_str("</map>");
        }
    }
}

/// Escape character data for use inside an element.
pub fn escape_text(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>']) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// Escape text for use inside a double-quoted attribute value.
pub fn escape_attribute(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"']) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}
