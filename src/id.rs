//! Tag identity — a self-contained hierarchical hash packed into `u128`.
//!
//! A [`TagId`] carries its own depth (top 3 bits) and one hash slice per
//! hierarchy level in a fixed layout, so parent extraction and subtree
//! membership are pure bit operations that need no registry lookup:
//!
//! ```text
//! ┌─────────┬──────────┬──────────┬──────────┬──────────┬──────────┬──────────┬──────────┬──────────┐
//! │ Depth   │ Level 0  │ Level 1  │ Level 2  │ Level 3  │ Level 4  │ Level 5  │ Level 6  │ Level 7  │
//! │ 3 bits  │ 21 bits  │ 18 bits  │ 16 bits  │ 16 bits  │ 14 bits  │ 14 bits  │ 13 bits  │ 13 bits  │
//! │[127:125]│[124:104] │ [103:86] │ [85:70]  │ [69:54]  │ [53:40]  │ [39:26]  │ [25:13]  │ [12:0]   │
//! └─────────┴──────────┴──────────┴──────────┴──────────┴──────────┴──────────┴──────────┴──────────┘
//! ```
//!
//! Identities are hash-stable: the same path yields the same id in every
//! registry, regardless of registration order.

/// Raw tag identity. The top 3 bits encode the depth (0-7), the remaining
/// 125 bits are partitioned by tree level.
pub type TagId = u128;

/// Maximum supported hierarchy depth (path segment count).
pub const MAX_DEPTH: usize = 8;

const DEPTH_SHIFT: u8 = 125;
const DEPTH_MASK: u128 = 0b111 << DEPTH_SHIFT;

/// Hash bits allocated to each level. Shallow levels get more bits because
/// they host more siblings. Sums to 125 (128 minus the 3 depth bits).
const LEVEL_WIDTHS: [u8; MAX_DEPTH] = [21, 18, 16, 16, 14, 14, 13, 13];

/// Bit offset of each level's slice. Level 0 sits just below the depth
/// bits, level 7 at bit 0.
const LEVEL_OFFSETS: [u8; MAX_DEPTH] = {
    let mut offsets = [0u8; MAX_DEPTH];
    let mut bit = 0u8;
    let mut i = MAX_DEPTH;
    while i > 0 {
        i -= 1;
        offsets[i] = bit;
        bit += LEVEL_WIDTHS[i];
    }
    offsets
};

/// `PREFIX_MASKS[d]` selects the payload bits of levels `0..=d`. Comparing
/// two ids under the ancestor's prefix mask is the whole subtree test.
const PREFIX_MASKS: [u128; MAX_DEPTH] = {
    let mut masks = [0u128; MAX_DEPTH];
    let mut i = 0;
    while i < MAX_DEPTH {
        let mut mask = 0u128;
        let mut j = 0;
        while j <= i {
            mask |= ((1u128 << LEVEL_WIDTHS[j]) - 1) << LEVEL_OFFSETS[j];
            j += 1;
        }
        masks[i] = mask;
        i += 1;
    }
    masks
};

const _: () = {
    let mut total: u16 = 0;
    let mut i = 0;
    while i < MAX_DEPTH {
        total += LEVEL_WIDTHS[i] as u16;
        i += 1;
    }
    assert!(total == 125, "LEVEL_WIDTHS must sum to 125 bits");
};

/// FNV-1a 64-bit — fast, const-compatible, good enough distribution for
/// short path segments.
pub(crate) const fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(0x100000001b3);
        i += 1;
    }
    hash
}

/// Hash one segment into `width` bits. Never returns 0: a zero slice means
/// "no node at this level" and would corrupt prefix comparisons.
const fn segment_hash(segment: &[u8], width: u8) -> u128 {
    let full = fnv1a_64(segment);
    let mixed = full ^ (full >> 32) ^ (full >> 17);
    let mask = (1u128 << width) - 1;
    let val = (mixed as u128) & mask;
    if val == 0 { 1 } else { val }
}

const fn encode(payload: u128, depth: u8) -> TagId {
    debug_assert!(depth < MAX_DEPTH as u8);
    debug_assert!(payload & DEPTH_MASK == 0);
    payload | ((depth as u128) << DEPTH_SHIFT)
}

/// Extract the depth (0-7) from an id.
pub(crate) const fn depth_of(id: TagId) -> u8 {
    ((id >> DEPTH_SHIFT) & 0b111) as u8
}

/// Compute the id for a segment sequence. Depth is encoded automatically.
///
/// # Panics
///
/// Panics if `segments` is empty or longer than [`MAX_DEPTH`]; the registry
/// validates paths before calling this.
pub(crate) const fn id_for_segments(segments: &[&[u8]]) -> TagId {
    assert!(!segments.is_empty(), "segments cannot be empty");
    assert!(segments.len() <= MAX_DEPTH, "path deeper than MAX_DEPTH");

    let depth = (segments.len() - 1) as u8;
    let mut payload: u128 = 0;
    let mut i = 0;
    while i < segments.len() {
        payload |= segment_hash(segments[i], LEVEL_WIDTHS[i]) << LEVEL_OFFSETS[i];
        i += 1;
    }
    encode(payload, depth)
}

/// Parent id, or `None` at root level. Masks out the deepest populated
/// level and decrements the depth bits.
pub(crate) const fn parent_id(id: TagId) -> Option<TagId> {
    let depth = depth_of(id);
    if depth == 0 {
        return None;
    }
    let parent_depth = depth - 1;
    Some(encode(id & PREFIX_MASKS[parent_depth as usize], parent_depth))
}

/// Inclusive subtree test: is `candidate` equal to `ancestor` or somewhere
/// below it? A single mask comparison on the ancestor's prefix, plus a
/// depth check so an ancestor never passes as its own descendant's child.
pub(crate) const fn in_subtree(candidate: TagId, ancestor: TagId) -> bool {
    let ancestor_depth = depth_of(ancestor);
    if depth_of(candidate) < ancestor_depth {
        return false;
    }
    let mask = PREFIX_MASKS[ancestor_depth as usize];
    (candidate & mask) == (ancestor & mask)
}

/// An interned hierarchical tag, e.g. `Enemy.Flying.Boss`.
///
/// `Tag` is a copyable handle over a self-contained [`TagId`]; hierarchy
/// checks between two handles need no registry. Resolving a handle back to
/// its path string does (see [`TagRegistry::path_of`]).
///
/// [`TagRegistry::path_of`]: crate::registry::TagRegistry::path_of
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(pub(crate) TagId);

impl Tag {
    /// The raw packed identity.
    #[inline]
    pub const fn id(self) -> TagId {
        self.0
    }

    /// Hierarchy depth: 0 for roots, 1 for their children, and so on.
    #[inline]
    pub const fn depth(self) -> u8 {
        depth_of(self.0)
    }

    /// The parent tag, or `None` for roots. The registry guarantees the
    /// parent of any registered tag is itself registered.
    #[inline]
    pub const fn parent(self) -> Option<Tag> {
        match parent_id(self.0) {
            Some(id) => Some(Tag(id)),
            None => None,
        }
    }

    /// Inclusive subtree membership: `self == ancestor` or `self` lies
    /// anywhere below `ancestor`. O(1), no registry required.
    #[inline]
    pub const fn is_under(self, ancestor: Tag) -> bool {
        in_subtree(self.0, ancestor.0)
    }

    /// True when `self` sits exactly one level below `ancestor`.
    #[inline]
    pub const fn is_child_of(self, ancestor: Tag) -> bool {
        self.depth() == ancestor.depth() + 1 && in_subtree(self.0, ancestor.0)
    }
}

impl std::fmt::Debug for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tag(depth={}, {:#034x})", self.depth(), self.0)
    }
}
