//! Error types for registration, persistence, and expression loading.
//!
//! Everything here is a construction/load-time failure. Once a registry is
//! sealed and an expression is resolved, evaluation cannot fail.

use thiserror::Error;

use crate::id::Tag;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
    /// Malformed path at registration: empty or blank segment, leading,
    /// trailing or consecutive delimiters, non-ASCII input, or a path
    /// deeper than the supported maximum.
    #[error("invalid tag path `{path}`: {reason}")]
    InvalidTagPath { path: String, reason: String },

    /// A tag handle or path that this registry instance does not know.
    /// Guards against mixing handles across registries.
    #[error("unknown tag {ident} for this registry")]
    UnknownTag { ident: String },

    /// Mutation attempted after [`TagRegistry::seal`].
    ///
    /// [`TagRegistry::seal`]: crate::registry::TagRegistry::seal
    #[error("registry is sealed, registration is no longer allowed")]
    RegistryAlreadySealed,

    /// Structural violation in a persisted query record: a leaf carrying
    /// children, a composite carrying tags, or `Not` with arity != 1.
    #[error("invalid expression shape: {detail}")]
    InvalidExpressionShape { detail: String },

    /// Two distinct paths hashed to the same identity. Rename one of them.
    #[error("tag id collision between `{path}` and `{existing}`")]
    TagCollision { path: String, existing: String },
}

impl TagError {
    pub(crate) fn invalid_path(path: &str, reason: impl Into<String>) -> Self {
        Self::InvalidTagPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unknown_tag(tag: Tag) -> Self {
        Self::UnknownTag {
            ident: format!("{:#034x}", tag.id()),
        }
    }

    pub(crate) fn unknown_path(path: &str) -> Self {
        Self::UnknownTag {
            ident: format!("`{path}`"),
        }
    }

    pub(crate) fn shape(detail: impl Into<String>) -> Self {
        Self::InvalidExpressionShape {
            detail: detail.into(),
        }
    }
}
