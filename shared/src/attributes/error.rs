use thiserror::Error;

use super::value::AttrKey;

/// Errors that can occur while reading or restructuring an attribute tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
    /// No value is stored under the given key or index
    #[error("Attribute `{key}` not found")]
    NotFound { key: AttrKey },

    /// Attempted to place a node that already has a parent or owner into a
    /// second location (or into its own subtree), or to change the owner of
    /// a node that is not a tree root
    #[error("{kind} reused at `{key}`. A node must be detached (popped, deleted or cleared) before it is attached again")]
    OwnershipViolation { kind: &'static str, key: AttrKey },

    /// The stored value is not of the requested kind
    #[error("Attribute `{key}` holds {found}, expected {expected}")]
    TypeMismatch {
        key: AttrKey,
        expected: &'static str,
        found: &'static str,
    },
}
