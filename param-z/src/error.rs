//! Error types for parameter operations.

use std::fmt;

use crate::parameter::ParameterKind;

/// Errors surfaced by parameter stores, clients, and value accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamError {
    /// The named parameter is not present in the store.
    NotFound(String),

    /// A typed accessor was called on a value holding a different variant.
    WrongType {
        expected: ParameterKind,
        actual: ParameterKind,
    },

    /// No matching response arrived within the caller-specified deadline.
    Timeout { node_id: String },

    /// The request could not be published to the bus.
    Transport(String),
}

impl fmt::Display for ParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(name) => write!(f, "parameter '{}' not found", name),
            Self::WrongType { expected, actual } => {
                write!(f, "wrong parameter type: expected {}, got {}", expected, actual)
            }
            Self::Timeout { node_id } => {
                write!(f, "no response from node '{}' - timeout", node_id)
            }
            Self::Transport(reason) => write!(f, "transport error: {}", reason),
        }
    }
}

impl std::error::Error for ParamError {}
