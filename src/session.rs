//! JSON session snapshots.
//!
//! A session file holds the document text and everything annotated on it:
//!
//! ```json
//! { "text": "...", "annotations": [...], "connections": [...], "connectionTypes": [...] }
//! ```
//!
//! `connections` and `connectionTypes` are optional on load. Derived state
//! (layout, viewport) is never written.

use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SessionError;
use crate::model::{char_len, Annotation, Connection, ConnectionType};
use crate::registry::default_connection_types;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFile {
    pub text: String,
    pub annotations: Vec<Annotation>,
    pub connections: Vec<Connection>,
    pub connection_types: Vec<ConnectionType>,
}

impl SessionFile {
    /// Pretty-printed JSON, two-space indented.
    pub fn to_json(&self) -> Result<String, SessionError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate a session document.
    ///
    /// `text` must be a non-empty string and `annotations` an array. Missing
    /// (or null) `connections` default to none and missing `connectionTypes`
    /// to the built-in five. Annotations come back sorted by `start`.
    pub fn from_json(json: &str) -> Result<Self, SessionError> {
        let mut root: Value = serde_json::from_str(json)?;
        let Some(obj) = root.as_object_mut() else {
            return Err(SessionError::Format("expected a JSON object".into()));
        };

        let text = match obj.remove("text") {
            Some(Value::String(text)) if !text.is_empty() => text,
            _ => return Err(SessionError::Format("missing document text".into())),
        };
        let annotations = match obj.remove("annotations") {
            Some(value @ Value::Array(_)) => value,
            _ => return Err(SessionError::Format("`annotations` must be an array".into())),
        };
        let mut annotations: Vec<Annotation> =
            serde_json::from_value(annotations).map_err(|err| SessionError::Format(err.to_string()))?;

        let connections: Vec<Connection> = match obj.remove("connections") {
            None | Some(Value::Null) => Vec::new(),
            Some(value) => serde_json::from_value(value).map_err(|err| SessionError::Format(err.to_string()))?,
        };
        let connection_types: Vec<ConnectionType> = match obj.remove("connectionTypes") {
            None | Some(Value::Null) => default_connection_types(),
            Some(value) => serde_json::from_value(value).map_err(|err| SessionError::Format(err.to_string()))?,
        };

        let len = char_len(&text);
        if let Some(ann) = annotations.iter().find(|ann| ann.end > len) {
            return Err(SessionError::Format(format!(
                "annotation {} ends at {} past text length {}",
                ann.id, ann.end, len
            )));
        }
        annotations.sort_by_key(|ann| ann.start);

        debug!(
            "parsed session: {} annotations, {} connections, {} connection types",
            annotations.len(),
            connections.len(),
            connection_types.len()
        );
        Ok(Self {
            text,
            annotations,
            connections,
            connection_types,
        })
    }

    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)?;
        info!("session saved to {}", path.display());
        Ok(())
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let path = path.as_ref();
        let session = Self::from_json(&fs::read_to_string(path)?)?;
        info!("session loaded from {}", path.display());
        Ok(session)
    }
}
