//! Tag registry — canonical interning, validation, sealing, and the
//! hierarchy index.
//!
//! The registry has a two-phase lifecycle: a mutable registration phase at
//! startup, then [`TagRegistry::seal`] freezes it for the rest of the
//! process. A sealed registry is plain read-only data and safe to share
//! across worker threads without locking.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::error::TagError;
use crate::id::{id_for_segments, Tag, TagId, MAX_DEPTH};

/// Path segment separator.
pub const DELIMITER: char = '.';

/// One registered tag with its canonical path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagEntry {
    pub tag: Tag,
    pub path: String,
    /// True while this tag only exists as an auto-created ancestor of a
    /// deeper registration. Cleared if the path is later registered
    /// directly.
    pub is_implicit: bool,
}

/// Registry of hierarchical tags.
///
/// Provides:
/// - Path ↔ [`Tag`] bidirectional lookup
/// - Strict and direct-only descendant tests
/// - Hierarchy-filtered enumeration for picker tooling
/// - DFS-ordered iteration (parents before children, siblings alphabetical)
#[derive(Clone, Debug, PartialEq)]
pub struct TagRegistry {
    case_sensitive: bool,
    sealed: bool,
    /// Deepest registered level + 1 (0 = empty registry).
    max_depth: usize,
    entries: Vec<TagEntry>,
    path_to_idx: HashMap<String, usize>,
    id_to_idx: HashMap<TagId, usize>,
    dfs_order: Vec<Tag>,
}

impl Default for TagRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TagRegistry {
    /// A new, empty, case-sensitive registry.
    pub fn new() -> Self {
        Self::with_case_sensitivity(true)
    }

    /// A new, empty registry. With `case_sensitive = false`, paths are
    /// canonicalized to ASCII lowercase on registration and lookup.
    pub fn with_case_sensitivity(case_sensitive: bool) -> Self {
        Self {
            case_sensitive,
            sealed: false,
            max_depth: 0,
            entries: Vec::new(),
            path_to_idx: HashMap::new(),
            id_to_idx: HashMap::new(),
            dfs_order: Vec::new(),
        }
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Register a tag path, e.g. `"Enemy.Flying.Boss"`.
    ///
    /// Idempotent: an already-known path returns its existing [`Tag`].
    /// Missing ancestors are created implicitly, so every registered tag's
    /// parent is itself registered.
    ///
    /// # Errors
    ///
    /// - [`TagError::RegistryAlreadySealed`] after [`seal`](Self::seal)
    /// - [`TagError::InvalidTagPath`] for malformed paths
    /// - [`TagError::TagCollision`] if the path hashes onto an existing id
    pub fn register(&mut self, path: &str) -> Result<Tag, TagError> {
        if self.sealed {
            return Err(TagError::RegistryAlreadySealed);
        }

        let canonical = self.canonicalize(path);
        validate_path(path, &canonical)?;

        if let Some(&idx) = self.path_to_idx.get(&canonical) {
            let entry = &mut self.entries[idx];
            entry.is_implicit = false;
            return Ok(entry.tag);
        }

        let segment_count = canonical.split(DELIMITER).count();

        // Auto-create missing ancestors, shallowest first.
        for i in 0..segment_count - 1 {
            let ancestor = ancestor_path(&canonical, i);
            if !self.path_to_idx.contains_key(ancestor) {
                self.insert_entry(ancestor.to_string(), true)?;
            }
        }

        let tag = self.insert_entry(canonical, false)?;
        self.rebuild_dfs_order();

        if segment_count > self.max_depth {
            self.max_depth = segment_count;
        }

        debug!(path, tag = ?tag, "registered tag");
        Ok(tag)
    }

    /// Insert one already-validated canonical path. Does not touch the DFS
    /// order; `register` rebuilds it once per registration.
    fn insert_entry(&mut self, path: String, is_implicit: bool) -> Result<Tag, TagError> {
        let seg_bytes: Vec<&[u8]> = path.split(DELIMITER).map(|s| s.as_bytes()).collect();
        let tag = Tag(id_for_segments(&seg_bytes));

        if let Some(&idx) = self.id_to_idx.get(&tag.id()) {
            return Err(TagError::TagCollision {
                path,
                existing: self.entries[idx].path.clone(),
            });
        }

        let idx = self.entries.len();
        self.id_to_idx.insert(tag.id(), idx);
        self.path_to_idx.insert(path.clone(), idx);
        self.entries.push(TagEntry {
            tag,
            path,
            is_implicit,
        });
        Ok(tag)
    }

    /// Freeze the registry. Registration is rejected afterwards; reads are
    /// then safe from any number of threads without synchronization.
    /// Idempotent.
    pub fn seal(&mut self) {
        if !self.sealed {
            self.sealed = true;
            info!(tags = self.entries.len(), "tag registry sealed");
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Path → tag, honoring the case-sensitivity configuration.
    pub fn resolve(&self, path: &str) -> Option<Tag> {
        let canonical = self.canonicalize(path);
        self.path_to_idx.get(&canonical).map(|&i| self.entries[i].tag)
    }

    /// Tag → canonical path.
    ///
    /// # Errors
    ///
    /// [`TagError::UnknownTag`] if the handle does not belong to this
    /// registry.
    pub fn path_of(&self, tag: Tag) -> Result<&str, TagError> {
        Ok(self.entries[self.idx_of(tag)?].path.as_str())
    }

    /// Parent tag, or `None` for roots.
    pub fn parent(&self, tag: Tag) -> Result<Option<Tag>, TagError> {
        self.idx_of(tag)?;
        // The registration invariant guarantees the parent is registered.
        Ok(tag.parent())
    }

    /// Strict descendant test: `tag == ancestor` is `false`. With
    /// `direct_only`, restricts to immediate children.
    pub fn is_descendant_of(
        &self,
        tag: Tag,
        ancestor: Tag,
        direct_only: bool,
    ) -> Result<bool, TagError> {
        self.idx_of(tag)?;
        self.idx_of(ancestor)?;
        if direct_only {
            Ok(tag.is_child_of(ancestor))
        } else {
            Ok(tag != ancestor && tag.is_under(ancestor))
        }
    }

    /// Hierarchy-filtered enumeration for tag-picker tooling: all strict
    /// descendants of `parent` (immediate children only with
    /// `direct_only`), preceded by `parent` itself when `include_parent`.
    /// Results come back in DFS order.
    pub fn tags_under(
        &self,
        parent: Tag,
        include_parent: bool,
        direct_only: bool,
    ) -> Result<Vec<Tag>, TagError> {
        self.idx_of(parent)?;
        let mut out = Vec::new();
        for &tag in &self.dfs_order {
            if tag == parent {
                if include_parent {
                    out.push(tag);
                }
            } else if direct_only {
                if tag.is_child_of(parent) {
                    out.push(tag);
                }
            } else if tag.is_under(parent) {
                out.push(tag);
            }
        }
        Ok(out)
    }

    /// Whether a path is registered.
    pub fn contains_path(&self, path: &str) -> bool {
        self.path_to_idx.contains_key(&self.canonicalize(path))
    }

    /// Whether a tag handle belongs to this registry.
    pub fn contains(&self, tag: Tag) -> bool {
        self.id_to_idx.contains_key(&tag.id())
    }

    /// Number of registered tags, implicit ancestors included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Deepest registered level + 1 (0 for an empty registry).
    pub fn tree_depth(&self) -> usize {
        self.max_depth
    }

    /// All entries in registration order.
    pub fn entries(&self) -> &[TagEntry] {
        &self.entries
    }

    /// All tags in DFS order: parents before children, siblings
    /// alphabetical by canonical path.
    pub fn iter_dfs(&self) -> impl Iterator<Item = Tag> + '_ {
        self.dfs_order.iter().copied()
    }

    fn idx_of(&self, tag: Tag) -> Result<usize, TagError> {
        self.id_to_idx
            .get(&tag.id())
            .copied()
            .ok_or_else(|| TagError::unknown_tag(tag))
    }

    fn canonicalize(&self, path: &str) -> String {
        if self.case_sensitive {
            path.to_string()
        } else {
            path.to_ascii_lowercase()
        }
    }

    fn rebuild_dfs_order(&mut self) {
        // parent path -> children, sorted for deterministic order
        let mut children: HashMap<Option<&str>, Vec<(&str, Tag)>> = HashMap::new();
        for entry in &self.entries {
            let parent = entry.path.rfind(DELIMITER).map(|pos| &entry.path[..pos]);
            children
                .entry(parent)
                .or_default()
                .push((entry.path.as_str(), entry.tag));
        }
        for list in children.values_mut() {
            list.sort_by_key(|&(path, _)| path);
        }

        let mut order = Vec::with_capacity(self.entries.len());
        dfs_collect(None, &children, &mut order);
        self.dfs_order = order;
    }
}

fn dfs_collect(
    parent: Option<&str>,
    children: &HashMap<Option<&str>, Vec<(&str, Tag)>>,
    out: &mut Vec<Tag>,
) {
    if let Some(kids) = children.get(&parent) {
        for &(path, tag) in kids {
            out.push(tag);
            dfs_collect(Some(path), children, out);
        }
    }
}

/// Prefix of `path` covering segments `0..=i`.
fn ancestor_path(path: &str, i: usize) -> &str {
    match path.match_indices(DELIMITER).nth(i) {
        Some((pos, _)) => &path[..pos],
        None => path,
    }
}

/// Validate the path as given (for error messages) against its canonical
/// form (what gets split and hashed).
fn validate_path(path: &str, canonical: &str) -> Result<(), TagError> {
    if path.is_empty() {
        return Err(TagError::invalid_path(path, "path is empty"));
    }
    if !path.is_ascii() {
        return Err(TagError::invalid_path(path, "path must be ASCII"));
    }
    if path.starts_with(DELIMITER) {
        return Err(TagError::invalid_path(path, "leading delimiter"));
    }
    if path.ends_with(DELIMITER) {
        return Err(TagError::invalid_path(path, "trailing delimiter"));
    }

    let mut depth = 0;
    for segment in canonical.split(DELIMITER) {
        if segment.is_empty() {
            return Err(TagError::invalid_path(path, "empty segment"));
        }
        if segment.trim().is_empty() {
            return Err(TagError::invalid_path(path, "blank segment"));
        }
        depth += 1;
    }
    if depth > MAX_DEPTH {
        return Err(TagError::invalid_path(
            path,
            format!("path has {depth} segments, maximum is {MAX_DEPTH}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_registry() -> TagRegistry {
        let mut reg = TagRegistry::new();
        for path in [
            "Enemy",
            "Enemy.Flying",
            "Enemy.Flying.Boss",
            "Enemy.Ground",
            "Player",
        ] {
            reg.register(path).unwrap();
        }
        reg
    }

    #[test]
    fn register_and_lookup_round_trip() {
        let reg = sample_registry();

        let boss = reg.resolve("Enemy.Flying.Boss").unwrap();
        assert_eq!(reg.path_of(boss).unwrap(), "Enemy.Flying.Boss");
        assert!(reg.contains_path("Enemy.Ground"));
        assert!(!reg.contains_path("Enemy.Swimming"));
        assert_eq!(reg.len(), 5);
        assert_eq!(reg.tree_depth(), 3);
    }

    #[test]
    fn register_is_idempotent() {
        let mut reg = TagRegistry::new();
        let first = reg.register("Enemy.Flying").unwrap();
        let second = reg.register("Enemy.Flying").unwrap();

        assert_eq!(first, second);
        // "Enemy" implicit + "Enemy.Flying"
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn ancestors_are_created_implicitly() {
        let mut reg = TagRegistry::new();
        reg.register("Enemy.Flying.Boss").unwrap();

        assert!(reg.contains_path("Enemy"));
        assert!(reg.contains_path("Enemy.Flying"));

        let implicit: Vec<&str> = reg
            .entries()
            .iter()
            .filter(|e| e.is_implicit)
            .map(|e| e.path.as_str())
            .collect();
        assert_eq!(implicit, vec!["Enemy", "Enemy.Flying"]);

        // Registering an implicit path directly clears the flag.
        reg.register("Enemy").unwrap();
        assert!(!reg.entries().iter().any(|e| e.path == "Enemy" && e.is_implicit));
    }

    #[test]
    fn ids_are_stable_across_registries() {
        let mut a = TagRegistry::new();
        let mut b = TagRegistry::new();

        a.register("Enemy.Flying").unwrap();
        b.register("Player").unwrap();
        b.register("Enemy.Flying").unwrap();

        assert_eq!(a.resolve("Enemy.Flying"), b.resolve("Enemy.Flying"));
    }

    #[test]
    fn rejects_malformed_paths() {
        let mut reg = TagRegistry::new();
        for bad in ["", "a..b", ".a", "a.", "a. .b", "caf\u{e9}"] {
            match reg.register(bad) {
                Err(TagError::InvalidTagPath { .. }) => {}
                other => panic!("expected InvalidTagPath for {bad:?}, got {other:?}"),
            }
        }
        assert!(reg.is_empty(), "failed registrations must not insert");
    }

    #[test]
    fn rejects_overdeep_path() {
        let mut reg = TagRegistry::new();
        let path = "a.b.c.d.e.f.g.h.i"; // 9 segments
        assert!(matches!(
            reg.register(path),
            Err(TagError::InvalidTagPath { .. })
        ));
    }

    #[test]
    fn sealing_stops_registration_but_not_reads() {
        let mut reg = sample_registry();
        let boss = reg.resolve("Enemy.Flying.Boss").unwrap();

        reg.seal();
        assert!(reg.is_sealed());
        assert_eq!(
            reg.register("Enemy.Swimming"),
            Err(TagError::RegistryAlreadySealed)
        );

        // Reads keep working, and sealing twice is a no-op.
        reg.seal();
        assert_eq!(reg.path_of(boss).unwrap(), "Enemy.Flying.Boss");
        assert!(reg.resolve("Player").is_some());
    }

    #[test]
    fn sealed_registry_is_shareable_across_threads() {
        let mut reg = sample_registry();
        reg.seal();

        let reg = std::sync::Arc::new(reg);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let reg = std::sync::Arc::clone(&reg);
                std::thread::spawn(move || {
                    let boss = reg.resolve("Enemy.Flying.Boss").unwrap();
                    let enemy = reg.resolve("Enemy").unwrap();
                    assert!(reg.is_descendant_of(boss, enemy, false).unwrap());
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn case_insensitive_registry_canonicalizes() {
        let mut reg = TagRegistry::with_case_sensitivity(false);
        let tag = reg.register("Enemy.Flying").unwrap();

        assert_eq!(reg.resolve("enemy.flying"), Some(tag));
        assert_eq!(reg.resolve("ENEMY.FLYING"), Some(tag));
        assert_eq!(reg.path_of(tag).unwrap(), "enemy.flying");

        // Case-sensitive registries treat the variants as distinct.
        let mut strict = TagRegistry::new();
        let lower = strict.register("enemy").unwrap();
        let upper = strict.register("Enemy").unwrap();
        assert_ne!(lower, upper);
    }

    #[test]
    fn parent_walks_up_the_hierarchy() {
        let reg = sample_registry();
        let enemy = reg.resolve("Enemy").unwrap();
        let flying = reg.resolve("Enemy.Flying").unwrap();
        let boss = reg.resolve("Enemy.Flying.Boss").unwrap();

        assert_eq!(reg.parent(boss).unwrap(), Some(flying));
        assert_eq!(reg.parent(flying).unwrap(), Some(enemy));
        assert_eq!(reg.parent(enemy).unwrap(), None);
    }

    #[test]
    fn descendant_test_is_strict() {
        let reg = sample_registry();
        let enemy = reg.resolve("Enemy").unwrap();
        let flying = reg.resolve("Enemy.Flying").unwrap();
        let boss = reg.resolve("Enemy.Flying.Boss").unwrap();
        let player = reg.resolve("Player").unwrap();

        assert!(reg.is_descendant_of(boss, enemy, false).unwrap());
        assert!(reg.is_descendant_of(flying, enemy, false).unwrap());
        assert!(!reg.is_descendant_of(enemy, enemy, false).unwrap());
        assert!(!reg.is_descendant_of(enemy, boss, false).unwrap());
        assert!(!reg.is_descendant_of(player, enemy, false).unwrap());

        // direct_only restricts to one hierarchy level
        assert!(reg.is_descendant_of(flying, enemy, true).unwrap());
        assert!(!reg.is_descendant_of(boss, enemy, true).unwrap());
        assert!(reg.is_descendant_of(boss, flying, true).unwrap());
    }

    #[test]
    fn foreign_tag_is_rejected() {
        let reg = sample_registry();
        let mut other = TagRegistry::new();
        let stray = other.register("Outsider").unwrap();

        assert!(matches!(
            reg.path_of(stray),
            Err(TagError::UnknownTag { .. })
        ));
        assert!(matches!(
            reg.parent(stray),
            Err(TagError::UnknownTag { .. })
        ));
        let enemy = reg.resolve("Enemy").unwrap();
        assert!(matches!(
            reg.is_descendant_of(stray, enemy, false),
            Err(TagError::UnknownTag { .. })
        ));
        assert!(matches!(
            reg.tags_under(stray, true, false),
            Err(TagError::UnknownTag { .. })
        ));
    }

    #[test]
    fn tags_under_filters_and_orders() {
        let reg = sample_registry();
        let enemy = reg.resolve("Enemy").unwrap();

        let paths = |tags: Vec<Tag>| -> Vec<String> {
            tags.iter()
                .map(|&t| reg.path_of(t).unwrap().to_string())
                .collect()
        };

        assert_eq!(
            paths(reg.tags_under(enemy, true, false).unwrap()),
            vec!["Enemy", "Enemy.Flying", "Enemy.Flying.Boss", "Enemy.Ground"]
        );
        assert_eq!(
            paths(reg.tags_under(enemy, false, false).unwrap()),
            vec!["Enemy.Flying", "Enemy.Flying.Boss", "Enemy.Ground"]
        );
        assert_eq!(
            paths(reg.tags_under(enemy, false, true).unwrap()),
            vec!["Enemy.Flying", "Enemy.Ground"]
        );
        assert_eq!(
            paths(reg.tags_under(enemy, true, true).unwrap()),
            vec!["Enemy", "Enemy.Flying", "Enemy.Ground"]
        );
    }

    #[test]
    fn dfs_order_is_parent_first_alphabetical() {
        let mut reg = TagRegistry::new();
        reg.register("B").unwrap();
        reg.register("A.C").unwrap();
        reg.register("A.B").unwrap();
        reg.register("B.A").unwrap();

        let paths: Vec<&str> = reg
            .iter_dfs()
            .map(|tag| reg.path_of(tag).unwrap())
            .collect();
        assert_eq!(paths, vec!["A", "A.B", "A.C", "B", "B.A"]);
    }
}
