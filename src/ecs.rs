//! Bevy integration.
//!
//! Provides:
//! - [`TagPlugin`] — builder-pattern plugin that seeds and (by default)
//!   seals a [`TagRegistry`], then inserts it as a `Resource`
//! - [`EntityTags`] — a component wrapping a [`TagContainer`]
//!
//! # Example
//!
//! ```ignore
//! use bevy::prelude::*;
//! use tag_query::{EntityTags, QueryExpression, TagContainer, TagPlugin, TagRegistry};
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(TagPlugin::with_paths(&[
//!             "Enemy.Flying.Boss",
//!             "Enemy.Ground",
//!             "Player",
//!         ]))
//!         .add_systems(Startup, spawn)
//!         .run();
//! }
//!
//! fn spawn(mut commands: Commands, registry: Res<TagRegistry>) {
//!     let boss = registry.resolve("Enemy.Flying.Boss").unwrap();
//!     commands.spawn(EntityTags(TagContainer::single(boss)));
//! }
//! ```

use bevy::prelude::{App, Component, Plugin, Resource};

use crate::container::TagContainer;
use crate::registry::TagRegistry;

impl Resource for TagRegistry {}

/// Bevy plugin for the tag system.
///
/// Registers the configured paths at build time and seals the registry
/// before any system runs, matching the two-phase registry lifecycle.
/// Disable sealing with [`seal_on_build(false)`](Self::seal_on_build) if
/// startup systems still need to register tags; seal manually afterwards.
pub struct TagPlugin {
    paths: &'static [&'static str],
    case_sensitive: bool,
    seal_on_build: bool,
}

impl Default for TagPlugin {
    fn default() -> Self {
        Self {
            paths: &[],
            case_sensitive: true,
            seal_on_build: true,
        }
    }
}

impl TagPlugin {
    /// A plugin with no seed paths.
    pub fn new() -> Self {
        Self::default()
    }

    /// A plugin that registers the given paths.
    pub fn with_paths(paths: &'static [&'static str]) -> Self {
        Self {
            paths,
            ..Self::default()
        }
    }

    /// Configure path case sensitivity (default: sensitive).
    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Whether to seal the registry when the plugin builds (default:
    /// `true`).
    pub fn seal_on_build(mut self, seal: bool) -> Self {
        self.seal_on_build = seal;
        self
    }
}

impl Plugin for TagPlugin {
    fn build(&self, app: &mut App) {
        let mut registry = TagRegistry::with_case_sensitivity(self.case_sensitive);
        for path in self.paths {
            registry
                .register(path)
                .expect("TagPlugin: failed to register seed tag path");
        }
        if self.seal_on_build {
            registry.seal();
        }
        app.insert_resource(registry);
    }
}

/// The tag set carried by one entity.
#[derive(Component, Clone, Debug, Default, PartialEq, Eq)]
pub struct EntityTags(pub TagContainer);

impl std::ops::Deref for EntityTags {
    type Target = TagContainer;

    fn deref(&self) -> &TagContainer {
        &self.0
    }
}

impl std::ops::DerefMut for EntityTags {
    fn deref_mut(&mut self) -> &mut TagContainer {
        &mut self.0
    }
}

impl From<TagContainer> for EntityTags {
    fn from(container: TagContainer) -> Self {
        Self(container)
    }
}
