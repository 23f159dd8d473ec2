//! Boolean query expressions over tag containers.
//!
//! A [`QueryExpression`] is an immutable predicate tree: leaves match a tag
//! list against the container (always hierarchically), composites combine
//! child results with and/or/not. Trees are built once, from code or from a
//! persisted [`QueryRecord`], and are then freely shareable; evaluation is
//! a pure function and cannot fail.

use serde::{Deserialize, Serialize};

use crate::container::TagContainer;
use crate::error::TagError;
use crate::id::Tag;
use crate::registry::TagRegistry;

/// Nesting bound for persisted records, checked at load time so that
/// evaluation depth is always finite.
const MAX_NESTING: usize = 64;

/// The kind tag of a query node. `None` through `NoneMatch` are leaves,
/// the rest are composites.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExprKind {
    #[default]
    None,
    AnyMatch,
    AllMatch,
    NoneMatch,
    And,
    Or,
    Not,
}

impl ExprKind {
    pub fn is_leaf(self) -> bool {
        matches!(
            self,
            Self::None | Self::AnyMatch | Self::AllMatch | Self::NoneMatch
        )
    }

    pub fn is_composite(self) -> bool {
        !self.is_leaf()
    }
}

/// An immutable boolean predicate over an entity's tag set.
///
/// The enum shape makes the structural invariants unrepresentable to
/// violate: a leaf cannot carry children, a composite cannot carry tags,
/// and `Not` has exactly one child by construction. Malformed persisted
/// data is rejected when a [`QueryRecord`] is resolved, never here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryExpression {
    /// No constraint; always matches.
    None,
    /// At least one listed tag is held (hierarchically). Empty list never
    /// matches.
    AnyMatch(Vec<Tag>),
    /// Every listed tag is held (hierarchically). Empty list always
    /// matches.
    AllMatch(Vec<Tag>),
    /// No listed tag is held (hierarchically). Empty list always matches.
    NoneMatch(Vec<Tag>),
    /// All children match. No children: matches.
    And(Vec<QueryExpression>),
    /// At least one child matches. No children: does not match.
    Or(Vec<QueryExpression>),
    /// The single child does not match.
    Not(Box<QueryExpression>),
}

impl QueryExpression {
    pub fn kind(&self) -> ExprKind {
        match self {
            Self::None => ExprKind::None,
            Self::AnyMatch(_) => ExprKind::AnyMatch,
            Self::AllMatch(_) => ExprKind::AllMatch,
            Self::NoneMatch(_) => ExprKind::NoneMatch,
            Self::And(_) => ExprKind::And,
            Self::Or(_) => ExprKind::Or,
            Self::Not(_) => ExprKind::Not,
        }
    }

    /// Evaluate against a container. Pure and total; leaves always match
    /// hierarchically. `And`/`Or` short-circuit left to right, which is
    /// unobservable since children are pure.
    pub fn evaluate(&self, container: &TagContainer) -> bool {
        match self {
            Self::None => true,
            Self::AnyMatch(tags) => container.has_any(tags, true),
            Self::AllMatch(tags) => container.has_all(tags, true),
            Self::NoneMatch(tags) => container.has_none(tags, true),
            Self::And(children) => children.iter().all(|child| child.evaluate(container)),
            Self::Or(children) => children.iter().any(|child| child.evaluate(container)),
            Self::Not(child) => !child.evaluate(container),
        }
    }

    /// Pure shape change: a new node of `kind` reusing whatever of this
    /// node still applies.
    ///
    /// - leaf → leaf keeps the tag list (`None` excepted, it carries no
    ///   tags)
    /// - leaf → composite starts with no children (`Not`: one `None`
    ///   placeholder)
    /// - `And` ↔ `Or` keeps the children; → `Not` keeps a sole child,
    ///   otherwise falls back to the placeholder
    /// - composite → leaf starts with an empty tag list
    pub fn with_kind(&self, kind: ExprKind) -> QueryExpression {
        match kind {
            ExprKind::None => Self::None,
            ExprKind::AnyMatch => Self::AnyMatch(self.leaf_tags().to_vec()),
            ExprKind::AllMatch => Self::AllMatch(self.leaf_tags().to_vec()),
            ExprKind::NoneMatch => Self::NoneMatch(self.leaf_tags().to_vec()),
            ExprKind::And => Self::And(self.children().to_vec()),
            ExprKind::Or => Self::Or(self.children().to_vec()),
            ExprKind::Not => {
                let child = match self.children() {
                    [only] => only.clone(),
                    _ => Self::None,
                };
                Self::Not(Box::new(child))
            }
        }
    }

    /// Load from a persisted record, validating shape and resolving paths.
    pub fn from_record(
        record: &QueryRecord,
        registry: &TagRegistry,
    ) -> Result<QueryExpression, TagError> {
        record.resolve(registry)
    }

    /// Convert to the persistence record form.
    ///
    /// # Errors
    ///
    /// [`TagError::UnknownTag`] if a leaf holds a handle foreign to
    /// `registry`.
    pub fn to_record(&self, registry: &TagRegistry) -> Result<QueryRecord, TagError> {
        let pathify = |tags: &[Tag]| -> Result<Vec<String>, TagError> {
            tags.iter()
                .map(|&tag| registry.path_of(tag).map(str::to_owned))
                .collect()
        };
        let recurse = |children: &[QueryExpression]| -> Result<Vec<QueryRecord>, TagError> {
            children
                .iter()
                .map(|child| child.to_record(registry))
                .collect()
        };

        let record = match self {
            Self::None => QueryRecord::leaf(ExprKind::None, Vec::new()),
            Self::AnyMatch(tags) => QueryRecord::leaf(ExprKind::AnyMatch, pathify(tags)?),
            Self::AllMatch(tags) => QueryRecord::leaf(ExprKind::AllMatch, pathify(tags)?),
            Self::NoneMatch(tags) => QueryRecord::leaf(ExprKind::NoneMatch, pathify(tags)?),
            Self::And(children) => QueryRecord::composite(ExprKind::And, recurse(children)?),
            Self::Or(children) => QueryRecord::composite(ExprKind::Or, recurse(children)?),
            Self::Not(child) => {
                QueryRecord::composite(ExprKind::Not, vec![child.to_record(registry)?])
            }
        };
        Ok(record)
    }

    fn leaf_tags(&self) -> &[Tag] {
        match self {
            Self::AnyMatch(tags) | Self::AllMatch(tags) | Self::NoneMatch(tags) => tags,
            _ => &[],
        }
    }

    fn children(&self) -> &[QueryExpression] {
        match self {
            Self::And(children) | Self::Or(children) => children,
            Self::Not(child) => std::slice::from_ref(child),
            _ => &[],
        }
    }
}

/// Persistence form of a query node: `{ kind, tags, children }`.
///
/// Unlike [`QueryExpression`], a record can be structurally malformed (a
/// leaf with children, `Not` with the wrong arity); [`QueryRecord::resolve`]
/// validates eagerly and refuses such data with
/// [`TagError::InvalidExpressionShape`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRecord {
    pub kind: ExprKind,
    /// Tag paths; meaningful on leaves only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Nested records; meaningful on composites only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<QueryRecord>,
}

impl QueryRecord {
    pub fn leaf(kind: ExprKind, tags: Vec<String>) -> Self {
        Self {
            kind,
            tags,
            children: Vec::new(),
        }
    }

    pub fn composite(kind: ExprKind, children: Vec<QueryRecord>) -> Self {
        Self {
            kind,
            tags: Vec::new(),
            children,
        }
    }

    /// Validate shape and resolve tag paths into a [`QueryExpression`].
    ///
    /// # Errors
    ///
    /// - [`TagError::InvalidExpressionShape`] for structural violations
    /// - [`TagError::UnknownTag`] for unregistered tag paths
    pub fn resolve(&self, registry: &TagRegistry) -> Result<QueryExpression, TagError> {
        self.resolve_at(registry, 0)
    }

    fn resolve_at(
        &self,
        registry: &TagRegistry,
        nesting: usize,
    ) -> Result<QueryExpression, TagError> {
        if nesting > MAX_NESTING {
            return Err(TagError::shape(format!(
                "expression nested deeper than {MAX_NESTING} levels"
            )));
        }
        if self.kind.is_leaf() && !self.children.is_empty() {
            return Err(TagError::shape(format!(
                "{:?} leaf carries {} child expressions",
                self.kind,
                self.children.len()
            )));
        }
        if self.kind.is_composite() && !self.tags.is_empty() {
            return Err(TagError::shape(format!(
                "{:?} composite carries {} tags",
                self.kind,
                self.tags.len()
            )));
        }

        let resolve_tags = || -> Result<Vec<Tag>, TagError> {
            self.tags
                .iter()
                .map(|path| {
                    registry
                        .resolve(path)
                        .ok_or_else(|| TagError::unknown_path(path))
                })
                .collect()
        };
        let resolve_children = || -> Result<Vec<QueryExpression>, TagError> {
            self.children
                .iter()
                .map(|child| child.resolve_at(registry, nesting + 1))
                .collect()
        };

        match self.kind {
            ExprKind::None => {
                if !self.tags.is_empty() {
                    return Err(TagError::shape("None leaf carries tags"));
                }
                Ok(QueryExpression::None)
            }
            ExprKind::AnyMatch => Ok(QueryExpression::AnyMatch(resolve_tags()?)),
            ExprKind::AllMatch => Ok(QueryExpression::AllMatch(resolve_tags()?)),
            ExprKind::NoneMatch => Ok(QueryExpression::NoneMatch(resolve_tags()?)),
            ExprKind::And => Ok(QueryExpression::And(resolve_children()?)),
            ExprKind::Or => Ok(QueryExpression::Or(resolve_children()?)),
            ExprKind::Not => {
                if self.children.len() != 1 {
                    return Err(TagError::shape(format!(
                        "Not requires exactly one child, got {}",
                        self.children.len()
                    )));
                }
                Ok(QueryExpression::Not(Box::new(
                    self.children[0].resolve_at(registry, nesting + 1)?,
                )))
            }
        }
    }
}
