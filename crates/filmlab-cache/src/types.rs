//! Shared types for the filmlab pipeline result cache.

use serde::{Deserialize, Serialize};

use crate::checkpoint::Checkpoint;

/// Frame dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// A rectangular region of interest within a frame.
///
/// A cache entry carrying a `Roi` holds a *partial* recomputation (e.g.
/// a crop preview) rather than the full frame. Such an entry must never
/// be treated as satisfying a full-frame query — see
/// [`PipelineCache::get_full_frame`](crate::PipelineCache::get_full_frame).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roi {
    /// Horizontal origin (pixels from the left edge).
    pub x: u32,
    /// Vertical origin (pixels from the top edge).
    pub y: u32,
    /// Region width in pixels.
    pub width: u32,
    /// Region height in pixels.
    pub height: u32,
}

impl Roi {
    /// Create a new region of interest.
    ///
    /// Bounds are validated against the owning frame when the entry is
    /// constructed, not here — a `Roi` on its own has no frame to check
    /// against.
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether this region lies entirely within a frame of the given
    /// dimensions.
    ///
    /// Uses 64-bit arithmetic so `x + width` cannot overflow.
    #[must_use]
    pub const fn fits_within(&self, dimensions: Dimensions) -> bool {
        self.width > 0
            && self.height > 0
            && self.x as u64 + self.width as u64 <= dimensions.width as u64
            && self.y as u64 + self.height as u64 <= dimensions.height as u64
    }
}

/// Errors that can occur in the pipeline result cache.
///
/// Cache *misses* are not errors — [`PipelineCache::get`] returns
/// `None` for a stale or absent entry, since staleness is the normal
/// signal that drives recomputation. Every variant here is a contract
/// violation the caller must repair; none are retryable.
///
/// [`PipelineCache::get`]: crate::PipelineCache::get
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The configuration contains a value with no deterministic
    /// serialization (e.g. a non-string map key or a non-finite float).
    #[error("configuration cannot be canonically serialized: {0}")]
    UnhashableConfig(String),

    /// A frame buffer was constructed with a zero dimension or with
    /// pixel data that does not match its dimensions.
    #[error("invalid frame buffer: {0}")]
    InvalidBuffer(String),

    /// A cache entry violated a construction invariant, such as a
    /// region of interest extending past the frame bounds.
    #[error("invalid cache entry: {0}")]
    InvalidEntry(String),

    /// The referenced checkpoint is not in the cache's configured set.
    #[error("unknown checkpoint: {0}")]
    UnknownCheckpoint(Checkpoint),
}
