use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImportError {
    #[error("Unsupported element type '{dtype}' for {context}")]
    UnsupportedType { dtype: String, context: String },
    #[error("Unknown node kind: {kind}")]
    UnknownNodeKind { kind: String },
    #[error("Node {node} is missing required attribute '{attribute}'")]
    MissingAttribute { node: String, attribute: String },
    #[error("Node {node} has invalid attribute '{attribute}': {reason}")]
    InvalidAttribute {
        node: String,
        attribute: String,
        reason: String,
    },
    #[error("Invalid node {node}: {reason}")]
    InvalidNode { node: String, reason: String },
    #[error("Tensor '{name}' is already defined")]
    DuplicateName { name: String },
    #[error("Unknown tensor '{name}' referenced by {referenced_by}")]
    UnknownTensor { name: String, referenced_by: String },
    #[error("Shape mismatch for tensor '{name}': expected {expected} elements, found {actual}")]
    ShapeMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("Invalid tensor '{name}': {reason}")]
    InvalidTensor { name: String, reason: String },
}
