// src/value.rs

//! Generic tree used as the intermediate form between a parsed definition
//! file and the markup handed to the template engine.
//!
//! Every node owns its children outright; trees are built bottom-up by the
//! parser (or by hand in tests) and dropped at the end of a compile.

use std::fmt;

/// A parsed configuration value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Value {
    #[default]
    Nil,
    /// Nothing produces numbers yet; the serializer emits them as empty content.
    Number(i64),
    String(String),
    List(Vec<Value>),
    /// Ordered key/value pairs. Duplicate keys are kept as written.
    Map(Vec<(Value, Value)>),
}

/// Discriminant of a [`Value`], handy for logging and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Nil,
    Number,
    String,
    List,
    Map,
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Nil => ValueKind::Nil,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::List(_) => ValueKind::List,
            Value::Map(_) => ValueKind::Map,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// First value in a map whose key is the string `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries
                .iter()
                .find(|(k, _)| k.as_str() == Some(key))
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Every value stored under the string `key`, in insertion order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        let entries: &[(Value, Value)] = match self {
            Value::Map(entries) => entries,
            _ => &[],
        };
        entries
            .iter()
            .filter(move |(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    /// Number of direct children (list items or map entries).
    pub fn len(&self) -> usize {
        match self {
            Value::List(items) => items.len(),
            Value::Map(entries) => entries.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn write_tree(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let pad = "    ".repeat(indent);
        match self {
            Value::Nil => writeln!(f, "{pad}nil"),
            Value::Number(_) => writeln!(f, "{pad}number"),
            Value::String(s) => writeln!(f, "{pad}string: '{s}'"),
            Value::List(items) => {
                writeln!(f, "{pad}list:")?;
                for item in items {
                    item.write_tree(f, indent + 1)?;
                }
                Ok(())
            }
            Value::Map(entries) => {
                writeln!(f, "{pad}map:")?;
                for (key, value) in entries {
                    writeln!(f, "{pad}    (key)")?;
                    key.write_tree(f, indent + 1)?;
                    writeln!(f, "{pad}    (value)")?;
                    value.write_tree(f, indent + 1)?;
                }
                Ok(())
            }
        }
    }
}

/// Indented tree dump, one node per line.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tree(f, 0)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl FromIterator<(Value, Value)> for Value {
    fn from_iter<T: IntoIterator<Item = (Value, Value)>>(iter: T) -> Self {
        Value::Map(iter.into_iter().collect())
    }
}
