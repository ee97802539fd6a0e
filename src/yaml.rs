// src/yaml.rs

//! Builds a [`Value`] tree from the `yaml-rust2` event stream.
//!
//! Only the shape of the document matters here: every scalar becomes a
//! string, there is no tag or type resolution, and only the first document of
//! a stream is read. Malformed input is always a recoverable error for the
//! caller; it never takes the daemon down.

use std::path::Path;

use tracing::trace;
use yaml_rust2::parser::{Event, Parser};

use crate::errors::{ConfigdError, Result};
use crate::fs::FileSystem;
use crate::value::Value;

/// Deepest nesting of sequences/mappings accepted before giving up.
pub const MAX_DEPTH: usize = 256;

/// Parse a whole document held in memory.
///
/// An empty stream yields [`Value::Nil`].
pub fn parse_str(source: &str) -> Result<Value> {
    let mut reader = EventReader::new(Parser::new_from_str(source));
    let first = reader.next_event()?;
    reader.parse_value(first, 0)
}

/// Read and parse a definition file.
pub fn parse_file(fs: &dyn FileSystem, path: &Path) -> Result<Value> {
    let source = fs
        .read_to_string(path)
        .map_err(|err| ConfigdError::SourceUnreadable {
            path: path.to_path_buf(),
            message: format!("{err:#}"),
        })?;
    parse_str(&source)
}

struct EventReader<T> {
    parser: Parser<T>,
}

impl<T: Iterator<Item = char>> EventReader<T> {
    fn new(parser: Parser<T>) -> Self {
        Self { parser }
    }

    fn next_event(&mut self) -> Result<Event> {
        let (event, marker) = self.parser.next_token()?;
        trace!(?event, line = marker.line(), col = marker.col(), "yaml event");
        Ok(event)
    }

    fn parse_value(&mut self, event: Event, depth: usize) -> Result<Value> {
        if depth > MAX_DEPTH {
            return Err(ConfigdError::TooDeep(MAX_DEPTH));
        }

        match event {
            Event::StreamEnd { .. } | Event::DocumentEnd { .. } => Ok(Value::Nil),
            Event::StreamStart { .. } | Event::DocumentStart { .. } => {
                let next = self.next_event()?;
                self.parse_value(next, depth)
            }
            Event::Scalar(text, ..) => Ok(Value::String(text)),
            Event::SequenceStart { .. } => self.parse_sequence(depth + 1),
            Event::MappingStart { .. } => self.parse_mapping(depth + 1),
            other => Err(ConfigdError::UnexpectedEvent(format!("{other:?}"))),
        }
    }

    fn parse_sequence(&mut self, depth: usize) -> Result<Value> {
        let mut items = Vec::new();
        loop {
            let event = self.next_event()?;
            if matches!(event, Event::SequenceEnd { .. }) {
                return Ok(Value::List(items));
            }
            ensure_open(&event, "sequence")?;
            items.push(self.parse_value(event, depth)?);
        }
    }

    fn parse_mapping(&mut self, depth: usize) -> Result<Value> {
        let mut entries = Vec::new();
        loop {
            let event = self.next_event()?;
            if matches!(event, Event::MappingEnd { .. }) {
                return Ok(Value::Map(entries));
            }
            ensure_open(&event, "mapping")?;
            let key = self.parse_value(event, depth)?;

            let event = self.next_event()?;
            if matches!(event, Event::MappingEnd { .. }) {
                // A key without a value is dropped rather than reported.
                trace!(?key, "dropping mapping key without value");
                return Ok(Value::Map(entries));
            }
            ensure_open(&event, "mapping")?;
            let value = self.parse_value(event, depth)?;
            entries.push((key, value));
        }
    }
}

/// The parser keeps yielding `StreamEnd` once input is exhausted, so a
/// collection that sees it would never terminate.
fn ensure_open(event: &Event, collection: &str) -> Result<()> {
    if matches!(event, Event::StreamEnd { .. }) {
        return Err(ConfigdError::UnexpectedEvent(format!(
            "end of stream inside an unterminated {collection}"
        )));
    }
    Ok(())
}
