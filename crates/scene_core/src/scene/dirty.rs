//! Dirty tracking
//!
//! Two levels of change tracking live here:
//! - [`DirtyFlags`]: scene-wide categories that changed since the last frame
//!   boundary.
//! - [`FrameDirtyTracker`]: the ordered, deduplicated list of primitives that
//!   were added, removed or mutated this frame. Each primitive additionally
//!   carries its own [`PrimitiveDirt`] bits.

use bitflags::bitflags;

use super::handle::PrimitiveHandle;

bitflags! {
    /// Scene categories that changed since the last frame boundary
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DirtyFlags: u32 {
        /// Camera view matrix
        const CAMERA_VIEW = 1 << 0;
        /// Camera projection matrix
        const CAMERA_PROJ = 1 << 1;
        /// Any light added, removed or changed
        const LIGHTS      = 1 << 2;
        /// Any primitive transform changed
        const XFORMS      = 1 << 3;
        /// Any material added, removed, changed or rebound
        const MATERIALS   = 1 << 4;
        /// Any texture added or removed
        const TEXTURES    = 1 << 5;
        /// Any primitive added, removed or changed
        const PRIMS       = 1 << 6;
    }
}

bitflags! {
    /// Per-primitive changes, valid only for the current frame
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PrimitiveDirt: u32 {
        /// Added this frame
        const ADDED      = 1 << 0;
        /// Marked for removal; compacted at end of frame
        const REMOVED    = 1 << 1;
        /// Transform changed
        const XFORM      = 1 << 2;
        /// Bound to a different material
        const MATERIAL   = 1 << 3;
        /// Geometry reference replaced
        const GEOMETRY   = 1 << 4;
        /// Visibility toggled
        const VISIBILITY = 1 << 5;
    }
}

const WORD_BITS: usize = u64::BITS as usize;

/// Per-frame list of touched primitive handles
///
/// Handles keep the order in which they were first touched. Membership is
/// answered by a bitset keyed by id, so pushing stays O(1).
#[derive(Debug, Clone, Default)]
pub struct FrameDirtyTracker {
    handles: Vec<PrimitiveHandle>,
    seen: Vec<u64>,
}

impl FrameDirtyTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `handle`; returns false if it was already recorded this frame
    pub fn push(&mut self, handle: PrimitiveHandle) -> bool {
        let (word, bit) = Self::locate(handle);
        if word >= self.seen.len() {
            self.seen.resize(word + 1, 0);
        }
        if self.seen[word] & bit != 0 {
            return false;
        }
        self.seen[word] |= bit;
        self.handles.push(handle);
        true
    }

    /// Whether `handle` was recorded this frame
    pub fn contains(&self, handle: PrimitiveHandle) -> bool {
        let (word, bit) = Self::locate(handle);
        self.seen.get(word).is_some_and(|w| w & bit != 0)
    }

    /// Recorded handles in first-touch order
    pub fn handles(&self) -> &[PrimitiveHandle] {
        &self.handles
    }

    /// Number of recorded handles
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Take the recorded handles and reset the tracker, keeping allocations
    pub fn drain(&mut self) -> std::vec::Drain<'_, PrimitiveHandle> {
        self.seen.iter_mut().for_each(|w| *w = 0);
        self.handles.drain(..)
    }

    fn locate(handle: PrimitiveHandle) -> (usize, u64) {
        let id = handle.id() as usize;
        (id / WORD_BITS, 1u64 << (id % WORD_BITS))
    }
}
