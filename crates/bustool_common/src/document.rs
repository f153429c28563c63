//! Loading bus description documents from JSON or TOML into a [`Node`] tree.

use crate::node::Node;
use bustool_diagnostics::{Diagnostic, DiagnosticCode, Location};
use indexmap::IndexMap;
use serde::de::{self, DeserializeSeed, Deserializer, MapAccess, SeqAccess, Visitor};
use std::cell::RefCell;
use std::fmt;
use std::path::Path;

/// A mapping repeats a key. Shares its code with the descriptor-level
/// duplicate identifier error.
pub const E205: DiagnosticCode = DiagnosticCode::error(205);

/// The document could not be read or parsed.
pub const E502: DiagnosticCode = DiagnosticCode::error(502);

/// Errors that can occur when loading a description document.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// An I/O error occurred while reading the document.
    #[error("failed to read document: {0}")]
    IoError(#[from] std::io::Error),

    /// The JSON content could not be parsed.
    #[error("failed to parse JSON document: {0}")]
    JsonError(String),

    /// The TOML content could not be parsed.
    #[error("failed to parse TOML document: {0}")]
    TomlError(String),

    /// The document holds a value the generator has no use for (floats, nulls, dates).
    #[error("unsupported {kind} value at `{path}`")]
    UnsupportedValue {
        /// Dotted path of the offending value.
        path: String,
        /// Human-readable name of the value type.
        kind: &'static str,
    },

    /// A mapping names the same key twice.
    #[error("duplicate identifier `{key}` in `{path}`")]
    DuplicateKey {
        /// Dotted path of the mapping, `<root>` for the top level.
        path: String,
        /// The repeated key.
        key: String,
    },

    /// The file extension does not name a known document format.
    #[error("unknown document format `{0}`, expected `.json` or `.toml`")]
    UnknownFormat(String),
}

impl DocumentError {
    /// Returns the diagnostic code for this error.
    pub fn code(&self) -> DiagnosticCode {
        match self {
            DocumentError::DuplicateKey { .. } => E205,
            _ => E502,
        }
    }

    /// Converts this error into a diagnostic.
    ///
    /// Paths inside the document are split into the entity (the first
    /// segment) and the field within it.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let location = match self {
            DocumentError::DuplicateKey { path, key } if path == ROOT => Location::entity(key),
            DocumentError::DuplicateKey { path, .. }
            | DocumentError::UnsupportedValue { path, .. } => path_location(path),
            _ => Location::UNKNOWN,
        };
        Diagnostic::error(self.code(), self.to_string(), location)
    }
}

/// Placeholder path naming the top-level mapping.
const ROOT: &str = "<root>";

fn path_location(path: &str) -> Location {
    if path == ROOT {
        return Location::UNKNOWN;
    }
    let split = path.find(|c: char| c == '.' || c == '[').unwrap_or(path.len());
    let (entity, rest) = path.split_at(split);
    match rest.strip_prefix('.').unwrap_or(rest) {
        "" => Location::entity(entity),
        field => Location::field(entity, field),
    }
}

/// Serialization format of a description document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// JSON text.
    Json,
    /// TOML text.
    Toml,
}

impl DocumentFormat {
    /// Picks the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, DocumentError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        match ext {
            "json" => Ok(DocumentFormat::Json),
            "toml" => Ok(DocumentFormat::Toml),
            other => Err(DocumentError::UnknownFormat(other.to_string())),
        }
    }

    /// Guesses the format of unnamed text (e.g. standard input).
    ///
    /// A document whose first non-blank character opens a JSON object is
    /// JSON; anything else is read as TOML.
    pub fn detect(text: &str) -> Self {
        if text.trim_start().starts_with('{') {
            DocumentFormat::Json
        } else {
            DocumentFormat::Toml
        }
    }
}

/// Loads a description document from disk, choosing the format by extension.
pub fn load_document(path: &Path) -> Result<Node, DocumentError> {
    let format = DocumentFormat::from_path(path)?;
    let content = std::fs::read_to_string(path)?;
    load_document_from_str(&content, format)
}

/// Parses a description document from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_document_from_str(content: &str, format: DocumentFormat) -> Result<Node, DocumentError> {
    match format {
        DocumentFormat::Json => from_json(content),
        DocumentFormat::Toml => {
            let value: toml::Table =
                toml::from_str(content).map_err(|e| DocumentError::TomlError(e.to_string()))?;
            from_toml(&toml::Value::Table(value), "")
        }
    }
}

/// Appends a mapping key to a dotted path.
fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

/// Appends a sequence index to a dotted path.
fn index_path(parent: &str, index: usize) -> String {
    format!("{parent}[{index}]")
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        ROOT.to_string()
    } else {
        path.to_string()
    }
}

fn unsupported(path: &str, kind: &'static str) -> DocumentError {
    DocumentError::UnsupportedValue {
        path: display_path(path),
        kind,
    }
}

/// Parses JSON text straight into a [`Node`] tree.
///
/// Going through `serde_json::Value` would silently keep only the last of
/// two equal keys, so the tree is built by [`JsonNode`] instead.
fn from_json(content: &str) -> Result<Node, DocumentError> {
    let failure = RefCell::new(None);
    let mut de = serde_json::Deserializer::from_str(content);
    let root = JsonNode {
        path: String::new(),
        failure: &failure,
    };
    root.deserialize(&mut de)
        .and_then(|node| de.end().map(|()| node))
        .map_err(|e| {
            failure
                .take()
                .unwrap_or_else(|| DocumentError::JsonError(e.to_string()))
        })
}

/// Builds the [`Node`] at `path`.
///
/// Structured failures are parked in `failure` so the loader can report
/// them instead of serde's flattened message.
struct JsonNode<'a> {
    path: String,
    failure: &'a RefCell<Option<DocumentError>>,
}

impl<'a> JsonNode<'a> {
    fn child(&self, path: String) -> JsonNode<'a> {
        JsonNode {
            path,
            failure: self.failure,
        }
    }

    fn fail<E: de::Error>(&self, err: DocumentError) -> E {
        let message = err.to_string();
        self.failure.borrow_mut().get_or_insert(err);
        E::custom(message)
    }
}

impl<'de> DeserializeSeed<'de> for JsonNode<'_> {
    type Value = Node;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Node, D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for JsonNode<'_> {
    type Value = Node;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a description document value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Node, E> {
        Ok(Node::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Node, E> {
        Ok(Node::Integer(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Node, E> {
        match i64::try_from(v) {
            Ok(v) => Ok(Node::Integer(v)),
            Err(_) => Err(self.fail(unsupported(&self.path, "out-of-range integer"))),
        }
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<Node, E> {
        Err(self.fail(unsupported(&self.path, "non-integer number")))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Node, E> {
        Err(self.fail(unsupported(&self.path, "null")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Node, E> {
        Ok(Node::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Node, E> {
        Ok(Node::String(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Node, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        loop {
            let slot = self.child(index_path(&self.path, items.len()));
            match seq.next_element_seed(slot)? {
                Some(item) => items.push(item),
                None => break,
            }
        }
        Ok(Node::Sequence(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Node, A::Error> {
        let mut out = IndexMap::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(key) = map.next_key::<String>()? {
            if out.contains_key(&key) {
                return Err(self.fail(DocumentError::DuplicateKey {
                    path: display_path(&self.path),
                    key,
                }));
            }
            let item = map.next_value_seed(self.child(child_path(&self.path, &key)))?;
            out.insert(key, item);
        }
        Ok(Node::Mapping(out))
    }
}

fn from_toml(value: &toml::Value, path: &str) -> Result<Node, DocumentError> {
    use toml::Value;
    match value {
        Value::Boolean(b) => Ok(Node::Bool(*b)),
        Value::Integer(n) => Ok(Node::Integer(*n)),
        Value::String(s) => Ok(Node::String(s.clone())),
        Value::Float(_) => Err(unsupported(path, "float")),
        Value::Datetime(_) => Err(unsupported(path, "datetime")),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| from_toml(item, &index_path(path, i)))
            .collect::<Result<Vec<_>, _>>()
            .map(Node::Sequence),
        Value::Table(table) => {
            let mut out = IndexMap::with_capacity(table.len());
            for (key, item) in table {
                out.insert(key.clone(), from_toml(item, &child_path(path, key))?);
            }
            Ok(Node::Mapping(out))
        }
    }
}
