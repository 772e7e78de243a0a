use crate::error::ConnectionError;
use crate::model::{AnnotationId, Connection, ConnectionId};
use log::{info, warn};
use std::collections::HashMap;
use thiserror::Error;

/// A connection waiting for its target annotation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingConnection {
    pub from: AnnotationId,
    pub connection_type: String,
}

/// Directed, typed edges between annotations.
///
/// Connections are created in two steps: [`begin`](Self::begin) records the
/// source and type, [`complete`](Self::complete) validates and inserts the
/// edge. The pending state is cleared whatever the outcome so the
/// interaction can never get stuck.
pub struct ConnectionGraph {
    connections: Vec<Connection>,
    pending: Option<PendingConnection>,
    validator: Box<dyn ConnectionValidator>,
}

impl Default for ConnectionGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionGraph {
    /// Create an empty graph using [`default_validator`].
    pub fn new() -> Self {
        Self::with_validator(default_validator())
    }

    pub fn with_validator<V: ConnectionValidator + 'static>(validator: V) -> Self {
        Self {
            connections: Vec::new(),
            pending: None,
            validator: Box::new(validator),
        }
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn pending(&self) -> Option<&PendingConnection> {
        self.pending.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Enter pending-connection mode. Replaces any earlier pending source.
    pub fn begin(&mut self, from: AnnotationId, connection_type: impl Into<String>) {
        self.pending = Some(PendingConnection {
            from,
            connection_type: connection_type.into(),
        });
    }

    /// Finish the pending connection at `to`.
    pub fn complete(&mut self, to: AnnotationId) -> Result<Connection, ConnectionError> {
        let pending = self.pending.take().ok_or(ConnectionError::NotPending)?;

        if let ValidationResult::Invalid(err) =
            self.validator.validate(&pending.from, &to, &self.connections)
        {
            warn!("connection {} -> {} rejected: {}", pending.from, to, err);
            return Err(err.into());
        }

        let connection = Connection {
            id: ConnectionId::generate(),
            from: pending.from,
            to,
            connection_type: pending.connection_type,
        };
        info!(
            "connection {} added: {} -[{}]-> {}",
            connection.id, connection.from, connection.connection_type, connection.to
        );
        self.connections.push(connection.clone());
        Ok(connection)
    }

    /// Leave pending-connection mode without touching the graph.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Remove every connection touching `id`. Returns how many were removed.
    ///
    /// A pending connection starting at `id` is cancelled too.
    pub fn delete_by_annotation(&mut self, id: &AnnotationId) -> usize {
        let before = self.connections.len();
        self.connections.retain(|conn| !conn.touches(id));
        if self.pending.as_ref().is_some_and(|p| &p.from == id) {
            self.pending = None;
        }
        before - self.connections.len()
    }

    /// Remove every connection labelled `label`. Returns how many were removed.
    pub fn delete_by_type(&mut self, label: &str) -> usize {
        let before = self.connections.len();
        self.connections.retain(|conn| conn.connection_type != label);
        if self.pending.as_ref().is_some_and(|p| p.connection_type == label) {
            self.pending = None;
        }
        before - self.connections.len()
    }

    /// Rename a type label on every connection (and a pending one) using it.
    pub fn relabel(&mut self, old: &str, new: &str) -> usize {
        let mut count = 0;
        for conn in self.connections.iter_mut().filter(|c| c.connection_type == old) {
            conn.connection_type = new.to_string();
            count += 1;
        }
        if let Some(pending) = self.pending.as_mut().filter(|p| p.connection_type == old) {
            pending.connection_type = new.to_string();
        }
        count
    }

    pub fn remove(&mut self, id: &ConnectionId) -> Option<Connection> {
        let index = self.connections.iter().position(|conn| &conn.id == id)?;
        Some(self.connections.remove(index))
    }

    /// Replace all connections, e.g. from a loaded session.
    pub fn replace_all(&mut self, connections: Vec<Connection>) {
        self.connections = connections;
        self.pending = None;
    }

    pub fn clear(&mut self) {
        self.connections.clear();
        self.pending = None;
    }

    /// Number of connections (in + out) touching `id`.
    pub fn degree(&self, id: &AnnotationId) -> usize {
        self.connections.iter().filter(|conn| conn.touches(id)).count()
    }

    /// Degree of every annotation that has at least one connection.
    pub fn degrees(&self) -> HashMap<&AnnotationId, usize> {
        let mut counts = HashMap::new();
        for conn in &self.connections {
            *counts.entry(&conn.from).or_insert(0) += 1;
            *counts.entry(&conn.to).or_insert(0) += 1;
        }
        counts
    }
}

// ============================================================================
// Connection Validation Framework
// ============================================================================

/// Result of connection validation with optional rejection reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// Connection is valid
    Valid,
    /// Connection is invalid with a reason
    Invalid(ValidationError),
}

impl ValidationResult {
    /// Check if the result is valid
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    /// Combine two results (AND logic): returns first error if any
    pub fn and(self, other: ValidationResult) -> ValidationResult {
        match self {
            ValidationResult::Valid => other,
            invalid => invalid,
        }
    }
}

/// Reasons why a connection validation failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Cannot connect an annotation to itself
    #[error("cannot connect an annotation to itself")]
    SelfConnection,
    /// The pair is already connected, in either direction
    #[error("a connection between these two annotations already exists")]
    DuplicateConnection,
    /// Custom validation failure
    #[error("{0}")]
    Custom(String),
}

/// Trait for custom connection validation logic.
///
/// Implement this to add rules for connecting annotations. Compose with
/// [`CompositeValidator`] or install on a graph with
/// [`ConnectionGraph::with_validator`].
///
/// # Example
///
/// ```ignore
/// struct NoSelfLoops;
///
/// impl ConnectionValidator for NoSelfLoops {
///     fn validate(&self, from: &AnnotationId, to: &AnnotationId, _: &[Connection]) -> ValidationResult {
///         if from == to {
///             ValidationResult::Invalid(ValidationError::SelfConnection)
///         } else {
///             ValidationResult::Valid
///         }
///     }
/// }
/// ```
pub trait ConnectionValidator {
    /// Check if a connection from `from` to `to` is allowed given the
    /// existing `connections`.
    fn validate(
        &self,
        from: &AnnotationId,
        to: &AnnotationId,
        connections: &[Connection],
    ) -> ValidationResult;
}

/// Rejects connecting an annotation to itself.
#[derive(Clone, Copy, Debug, Default)]
pub struct DistinctEndpointsValidator;

impl ConnectionValidator for DistinctEndpointsValidator {
    fn validate(&self, from: &AnnotationId, to: &AnnotationId, _connections: &[Connection]) -> ValidationResult {
        if from == to {
            ValidationResult::Invalid(ValidationError::SelfConnection)
        } else {
            ValidationResult::Valid
        }
    }
}

/// Rejects a second connection on the same unordered pair, whatever its
/// direction or type.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDuplicatePairValidator;

impl ConnectionValidator for NoDuplicatePairValidator {
    fn validate(&self, from: &AnnotationId, to: &AnnotationId, connections: &[Connection]) -> ValidationResult {
        if connection_exists_between(from, to, connections) {
            ValidationResult::Invalid(ValidationError::DuplicateConnection)
        } else {
            ValidationResult::Valid
        }
    }
}

/// Composite validator that combines multiple validators
///
/// All validators must return Valid for the connection to be valid (AND
/// logic). Returns the first error encountered.
#[derive(Default)]
pub struct CompositeValidator {
    validators: Vec<Box<dyn ConnectionValidator>>,
}

impl CompositeValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validator to the composite. Validators run in insertion order.
    pub fn add<V: ConnectionValidator + 'static>(mut self, validator: V) -> Self {
        self.validators.push(Box::new(validator));
        self
    }
}

impl ConnectionValidator for CompositeValidator {
    fn validate(&self, from: &AnnotationId, to: &AnnotationId, connections: &[Connection]) -> ValidationResult {
        for v in &self.validators {
            let result = v.validate(from, to, connections);
            if !result.is_valid() {
                return result;
            }
        }
        ValidationResult::Valid
    }
}

/// The rules every annotation graph enforces: distinct endpoints and at most
/// one connection per unordered pair.
pub fn default_validator() -> CompositeValidator {
    CompositeValidator::new()
        .add(DistinctEndpointsValidator)
        .add(NoDuplicatePairValidator)
}

/// Convenience function to validate a connection with any validator
pub fn validate_connection<V: ConnectionValidator + ?Sized>(
    from: &AnnotationId,
    to: &AnnotationId,
    connections: &[Connection],
    validator: &V,
) -> ValidationResult {
    validator.validate(from, to, connections)
}

/// Whether `a` and `b` are already connected in either direction.
pub fn connection_exists_between(a: &AnnotationId, b: &AnnotationId, connections: &[Connection]) -> bool {
    connections.iter().any(|conn| conn.joins(a, b))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> AnnotationId {
        AnnotationId::from_raw(raw)
    }

    fn connect(graph: &mut ConnectionGraph, from: &str, to: &str, ty: &str) -> Result<Connection, ConnectionError> {
        graph.begin(id(from), ty);
        graph.complete(id(to))
    }

    // ========================================================================
    // begin() / complete() / cancel()
    // ========================================================================

    #[test]
    fn test_complete_creates_connection() {
        let mut graph = ConnectionGraph::new();
        let conn = connect(&mut graph, "a", "b", "cause").unwrap();
        assert_eq!(conn.from, id("a"));
        assert_eq!(conn.to, id("b"));
        assert_eq!(conn.connection_type, "cause");
        assert_eq!(graph.len(), 1);
        assert!(!graph.is_pending());
    }

    #[test]
    fn test_complete_without_pending() {
        let mut graph = ConnectionGraph::new();
        assert_eq!(graph.complete(id("b")), Err(ConnectionError::NotPending));
        assert!(graph.is_empty());
    }

    #[test]
    fn test_complete_rejects_self_connection() {
        let mut graph = ConnectionGraph::new();
        let err = connect(&mut graph, "a", "a", "cause").unwrap_err();
        assert_eq!(err, ConnectionError::Invalid(ValidationError::SelfConnection));
        assert!(graph.is_empty());
        assert!(!graph.is_pending());
    }

    #[test]
    fn test_complete_rejects_reverse_duplicate() {
        let mut graph = ConnectionGraph::new();
        connect(&mut graph, "a", "b", "cause").unwrap();
        let err = connect(&mut graph, "b", "a", "effect").unwrap_err();
        assert_eq!(err, ConnectionError::Invalid(ValidationError::DuplicateConnection));
        assert_eq!(graph.len(), 1);
        assert!(!graph.is_pending(), "pending state must reset after a rejection");
    }

    #[test]
    fn test_cancel_clears_pending() {
        let mut graph = ConnectionGraph::new();
        graph.begin(id("a"), "cause");
        assert_eq!(
            graph.pending(),
            Some(&PendingConnection { from: id("a"), connection_type: "cause".into() })
        );
        graph.cancel();
        assert!(graph.pending().is_none());
        assert!(graph.is_empty());
    }

    // ========================================================================
    // Cascades
    // ========================================================================

    #[test]
    fn test_delete_by_annotation_removes_both_directions() {
        let mut graph = ConnectionGraph::new();
        connect(&mut graph, "a", "b", "cause").unwrap();
        connect(&mut graph, "b", "c", "effect").unwrap();
        assert_eq!(graph.delete_by_annotation(&id("b")), 2);
        assert!(graph.is_empty());
    }

    #[test]
    fn test_delete_by_annotation_cancels_pending_source() {
        let mut graph = ConnectionGraph::new();
        graph.begin(id("a"), "cause");
        graph.delete_by_annotation(&id("a"));
        assert!(!graph.is_pending());
    }

    #[test]
    fn test_delete_by_type() {
        let mut graph = ConnectionGraph::new();
        connect(&mut graph, "a", "b", "cause").unwrap();
        connect(&mut graph, "b", "c", "effect").unwrap();
        connect(&mut graph, "a", "c", "cause").unwrap();
        assert_eq!(graph.delete_by_type("cause"), 2);
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.connections()[0].connection_type, "effect");
    }

    #[test]
    fn test_relabel() {
        let mut graph = ConnectionGraph::new();
        connect(&mut graph, "a", "b", "cause").unwrap();
        graph.begin(id("b"), "cause");
        assert_eq!(graph.relabel("cause", "reason"), 1);
        assert_eq!(graph.connections()[0].connection_type, "reason");
        assert_eq!(graph.pending().unwrap().connection_type, "reason");
    }

    // ========================================================================
    // degree()
    // ========================================================================

    #[test]
    fn test_degrees() {
        let mut graph = ConnectionGraph::new();
        connect(&mut graph, "a", "b", "cause").unwrap();
        connect(&mut graph, "b", "c", "cause").unwrap();
        assert_eq!(graph.degree(&id("b")), 2);
        assert_eq!(graph.degree(&id("a")), 1);
        assert_eq!(graph.degree(&id("z")), 0);
        let degrees = graph.degrees();
        assert_eq!(degrees[&id("b")], 2);
        assert_eq!(degrees.len(), 3);
    }

    // ========================================================================
    // Validators
    // ========================================================================

    #[test]
    fn test_no_duplicate_pair_accepts_new_pair() {
        let mut graph = ConnectionGraph::new();
        connect(&mut graph, "a", "b", "cause").unwrap();
        let result = NoDuplicatePairValidator.validate(&id("a"), &id("c"), graph.connections());
        assert!(result.is_valid());
    }

    #[test]
    fn test_composite_short_circuits_on_first_error() {
        let validator = default_validator();
        let result = validator.validate(&id("a"), &id("a"), &[]);
        assert_eq!(result, ValidationResult::Invalid(ValidationError::SelfConnection));
    }

    #[test]
    fn test_validate_connection_convenience_function() {
        let result = validate_connection(&id("a"), &id("b"), &[], &DistinctEndpointsValidator);
        assert!(result.is_valid());
    }

    #[test]
    fn test_validation_result_and_combinator() {
        assert!(ValidationResult::Valid.and(ValidationResult::Valid).is_valid());
        assert_eq!(
            ValidationResult::Valid.and(ValidationResult::Invalid(ValidationError::SelfConnection)),
            ValidationResult::Invalid(ValidationError::SelfConnection)
        );
        // First error wins
        assert_eq!(
            ValidationResult::Invalid(ValidationError::DuplicateConnection)
                .and(ValidationResult::Invalid(ValidationError::SelfConnection)),
            ValidationResult::Invalid(ValidationError::DuplicateConnection)
        );
    }

    #[test]
    fn test_validation_error_display() {
        assert_eq!(
            ValidationError::SelfConnection.to_string(),
            "cannot connect an annotation to itself"
        );
        assert_eq!(
            ValidationError::DuplicateConnection.to_string(),
            "a connection between these two annotations already exists"
        );
        assert_eq!(ValidationError::Custom("nope".into()).to_string(), "nope");
    }

    #[test]
    fn test_custom_validator() {
        struct OnlyCause;

        impl ConnectionValidator for OnlyCause {
            fn validate(&self, from: &AnnotationId, _to: &AnnotationId, connections: &[Connection]) -> ValidationResult {
                if connections.iter().any(|c| &c.from == from) {
                    ValidationResult::Invalid(ValidationError::Custom("one outgoing edge only".into()))
                } else {
                    ValidationResult::Valid
                }
            }
        }

        let mut graph = ConnectionGraph::with_validator(default_validator().add(OnlyCause));
        connect(&mut graph, "a", "b", "cause").unwrap();
        let err = connect(&mut graph, "a", "c", "cause").unwrap_err();
        assert_eq!(err.to_string(), "one outgoing edge only");
    }
}
