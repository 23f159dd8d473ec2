//! Entity-scoped tag membership with hierarchy awareness.
//!
//! A [`TagContainer`] is owned by exactly one entity. Reads are safe to
//! share; concurrent mutation of the same container needs external
//! synchronization by the caller.

use std::collections::HashSet;

use crate::error::TagError;
use crate::id::Tag;
use crate::registry::TagRegistry;

/// The set of tags held by one entity.
///
/// Exact membership is O(1); the hierarchical queries are O(n) over the
/// held tags and allocation-free, since subtree checks are pure bit
/// operations on the [`Tag`] handles themselves.
///
/// Hierarchical matching means a held tag satisfies queries for any of its
/// ancestors: holding `Enemy.Flying.Boss` satisfies a query for `Enemy`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagContainer {
    tags: HashSet<Tag>,
}

impl TagContainer {
    /// An empty container.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// A container holding a single tag.
    #[inline]
    pub fn single(tag: Tag) -> Self {
        let mut tags = HashSet::new();
        tags.insert(tag);
        Self { tags }
    }

    /// Builder method: add a tag and return self.
    #[inline]
    pub fn with(mut self, tag: Tag) -> Self {
        self.tags.insert(tag);
        self
    }

    /// Add a tag. Returns `true` if it was newly inserted.
    #[inline]
    pub fn insert(&mut self, tag: Tag) -> bool {
        self.tags.insert(tag)
    }

    /// Remove a tag. Returns `true` if it was present.
    #[inline]
    pub fn remove(&mut self, tag: Tag) -> bool {
        self.tags.remove(&tag)
    }

    /// Exact membership test (no hierarchy).
    #[inline]
    pub fn contains(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }

    /// Membership test. Non-hierarchical is [`contains`](Self::contains);
    /// hierarchical also succeeds when any held tag lies in `tag`'s
    /// subtree.
    #[inline]
    pub fn has_tag(&self, tag: Tag, hierarchical: bool) -> bool {
        if hierarchical {
            self.tags.iter().any(|held| held.is_under(tag))
        } else {
            self.contains(tag)
        }
    }

    /// True iff at least one of `tags` satisfies
    /// [`has_tag`](Self::has_tag). Empty `tags` → `false`.
    pub fn has_any(&self, tags: &[Tag], hierarchical: bool) -> bool {
        tags.iter().any(|&tag| self.has_tag(tag, hierarchical))
    }

    /// True iff every one of `tags` satisfies [`has_tag`](Self::has_tag).
    /// Empty `tags` → `true`.
    pub fn has_all(&self, tags: &[Tag], hierarchical: bool) -> bool {
        tags.iter().all(|&tag| self.has_tag(tag, hierarchical))
    }

    /// True iff none of `tags` satisfies [`has_tag`](Self::has_tag).
    /// Empty `tags` → `true`.
    pub fn has_none(&self, tags: &[Tag], hierarchical: bool) -> bool {
        !self.has_any(tags, hierarchical)
    }

    /// Iterate over all held tags (unspecified order).
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = Tag> + '_ {
        self.tags.iter().copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.tags.clear();
    }

    /// Serialize as a sorted list of tag path strings.
    ///
    /// # Errors
    ///
    /// [`TagError::UnknownTag`] if a held handle does not belong to
    /// `registry`.
    pub fn to_paths(&self, registry: &TagRegistry) -> Result<Vec<String>, TagError> {
        let mut paths = self
            .tags
            .iter()
            .map(|&tag| registry.path_of(tag).map(str::to_owned))
            .collect::<Result<Vec<_>, _>>()?;
        paths.sort();
        Ok(paths)
    }

    /// Deserialize from path strings, registering any unknown path. Use
    /// during the registration phase.
    pub fn from_paths<I, S>(registry: &mut TagRegistry, paths: I) -> Result<Self, TagError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tags = HashSet::new();
        for path in paths {
            tags.insert(registry.register(path.as_ref())?);
        }
        Ok(Self { tags })
    }

    /// Deserialize from path strings against a read-only (typically
    /// sealed) registry. Unknown paths fail with [`TagError::UnknownTag`].
    pub fn resolve_paths<I, S>(registry: &TagRegistry, paths: I) -> Result<Self, TagError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tags = HashSet::new();
        for path in paths {
            let path = path.as_ref();
            let tag = registry
                .resolve(path)
                .ok_or_else(|| TagError::unknown_path(path))?;
            tags.insert(tag);
        }
        Ok(Self { tags })
    }
}

impl FromIterator<Tag> for TagContainer {
    fn from_iter<T: IntoIterator<Item = Tag>>(iter: T) -> Self {
        Self {
            tags: iter.into_iter().collect(),
        }
    }
}

impl Extend<Tag> for TagContainer {
    fn extend<T: IntoIterator<Item = Tag>>(&mut self, iter: T) {
        self.tags.extend(iter);
    }
}
