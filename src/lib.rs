//! # Hierarchical gameplay tags with boolean query evaluation (tag-query)
//!
//! Entities are labeled with dot-structured tags (`Enemy.Flying.Boss`);
//! gameplay logic asks whether an entity's tag set satisfies an
//! arbitrarily nested boolean query ("any of {Enemy}, none of
//! {Enemy.Ground}, and not {Player}").
//!
//! Three cooperating pieces:
//!
//! - [`TagRegistry`] — interns paths into stable [`Tag`] identities and
//!   answers ancestor/descendant questions. Two-phase lifecycle: register
//!   everything at startup, then [`TagRegistry::seal`] freezes it for
//!   lock-free concurrent reads.
//! - [`TagContainer`] — one entity's tag set, with exact and
//!   hierarchy-aware membership queries. A held `Enemy.Flying.Boss`
//!   satisfies a query for the broader `Enemy`.
//! - [`QueryExpression`] — an immutable predicate tree evaluated against a
//!   container; built in code or loaded from a persisted [`QueryRecord`].
//!
//! ## Design
//!
//! A [`Tag`] is a `u128` hierarchical hash with its depth embedded in the
//! top 3 bits and one hash slice per level, so subtree membership is a
//! single mask comparison needing no registry lookup. Per-entity query
//! evaluation every frame therefore costs integer compares only.
//!
//! ```
//! use tag_query::{QueryExpression, TagContainer, TagRegistry};
//!
//! let mut registry = TagRegistry::new();
//! let boss = registry.register("Enemy.Flying.Boss")?;
//! let enemy = registry.resolve("Enemy").unwrap();
//! let ground = registry.register("Enemy.Ground")?;
//! registry.seal();
//!
//! let entity = TagContainer::single(boss);
//! let query = QueryExpression::And(vec![
//!     QueryExpression::AllMatch(vec![enemy]),
//!     QueryExpression::NoneMatch(vec![ground]),
//! ]);
//! assert!(query.evaluate(&entity));
//! # Ok::<(), tag_query::TagError>(())
//! ```

pub mod container;
pub mod ecs;
pub mod error;
pub mod id;
pub mod query;
pub mod registry;

pub use container::TagContainer;
pub use ecs::{EntityTags, TagPlugin};
pub use error::TagError;
pub use id::{Tag, TagId, MAX_DEPTH};
pub use query::{ExprKind, QueryExpression, QueryRecord};
pub use registry::{TagEntry, TagRegistry, DELIMITER};
