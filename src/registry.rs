//! User-editable connection type labels.

use crate::error::ConnectionTypeError;
use crate::model::{ConnectionType, ConnectionTypeId};
use log::info;

/// Labels every new session starts with.
pub const DEFAULT_LABELS: [&str; 5] = ["settings", "description", "relationship", "cause", "effect"];

/// The five built-in connection types, with ids `ct-<label>`.
pub fn default_connection_types() -> Vec<ConnectionType> {
    DEFAULT_LABELS
        .iter()
        .map(|label| ConnectionType {
            id: ConnectionTypeId::from_raw(format!("ct-{label}")),
            label: (*label).to_string(),
        })
        .collect()
}

/// Ordered set of connection types with case-insensitively unique labels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionTypeRegistry {
    types: Vec<ConnectionType>,
}

impl Default for ConnectionTypeRegistry {
    fn default() -> Self {
        Self {
            types: default_connection_types(),
        }
    }
}

impl ConnectionTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_types(types: Vec<ConnectionType>) -> Self {
        Self { types }
    }

    pub fn types(&self) -> &[ConnectionType] {
        &self.types
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn get(&self, id: &ConnectionTypeId) -> Option<&ConnectionType> {
        self.types.iter().find(|ty| &ty.id == id)
    }

    pub fn find_by_label(&self, label: &str) -> Option<&ConnectionType> {
        let needle = label.trim().to_lowercase();
        self.types.iter().find(|ty| ty.label.to_lowercase() == needle)
    }

    pub fn contains_label(&self, label: &str) -> bool {
        self.find_by_label(label).is_some()
    }

    /// Register a new label. Whitespace is trimmed before checking.
    pub fn add(&mut self, label: &str) -> Result<&ConnectionType, ConnectionTypeError> {
        let label = self.check_label(label, None)?;
        let ty = ConnectionType {
            id: ConnectionTypeId::generate(),
            label,
        };
        info!("connection type {} added", ty.id);
        self.types.push(ty);
        Ok(&self.types[self.types.len() - 1])
    }

    /// Change a label in place. Returns the previous label so callers can
    /// relabel existing connections.
    pub fn rename(&mut self, id: &ConnectionTypeId, label: &str) -> Result<String, ConnectionTypeError> {
        let label = self.check_label(label, Some(id))?;
        let ty = self
            .types
            .iter_mut()
            .find(|ty| &ty.id == id)
            .ok_or_else(|| ConnectionTypeError::NotFound(id.clone()))?;
        info!("connection type {} renamed", id);
        Ok(std::mem::replace(&mut ty.label, label))
    }

    /// Remove a type. Connections using its label are the caller's concern.
    pub fn remove(&mut self, id: &ConnectionTypeId) -> Result<ConnectionType, ConnectionTypeError> {
        let index = self
            .types
            .iter()
            .position(|ty| &ty.id == id)
            .ok_or_else(|| ConnectionTypeError::NotFound(id.clone()))?;
        info!("connection type {} removed", id);
        Ok(self.types.remove(index))
    }

    pub fn reset(&mut self) {
        self.types = default_connection_types();
    }

    fn check_label(&self, label: &str, except: Option<&ConnectionTypeId>) -> Result<String, ConnectionTypeError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(ConnectionTypeError::EmptyLabel);
        }
        match self.find_by_label(label) {
            Some(existing) if Some(&existing.id) != except => {
                Err(ConnectionTypeError::DuplicateLabel(label.to_string()))
            }
            _ => Ok(label.to_string()),
        }
    }
}
