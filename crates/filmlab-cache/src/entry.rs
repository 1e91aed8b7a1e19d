//! Cache entries: one computed stage result plus its identity.

use std::collections::BTreeMap;

use crate::digest::ConfigDigest;
use crate::frame::Frame;
use crate::types::{CacheError, Roi};

/// Auxiliary metrics recorded alongside a stage result (histogram
/// percentiles, clip counts, timings as fractional seconds).
pub type StageMetrics = BTreeMap<String, f64>;

/// An immutable record pairing a configuration digest with the frame it
/// produced.
///
/// Entries are created by the pipeline driver after a successful stage
/// computation and handed to [`PipelineCache::put`]. A fresh result is
/// always a *new* entry — entries are never mutated, only superseded or
/// dropped. The entry exclusively owns its [`Frame`]; consumers borrow.
///
/// [`PipelineCache::put`]: crate::PipelineCache::put
#[derive(Debug)]
pub struct CacheEntry {
    digest: ConfigDigest,
    frame: Frame,
    metrics: StageMetrics,
    roi: Option<Roi>,
}

impl CacheEntry {
    /// Construct an entry for a full-frame result.
    ///
    /// # Errors
    ///
    /// Currently infallible for full-frame results (the digest and
    /// frame types are valid by construction), but returns `Result`
    /// for symmetry with [`with_roi`](Self::with_roi) and so future
    /// invariants don't change the signature.
    pub fn new(
        digest: ConfigDigest,
        frame: Frame,
        metrics: StageMetrics,
    ) -> Result<Self, CacheError> {
        Ok(Self {
            digest,
            frame,
            metrics,
            roi: None,
        })
    }

    /// Construct an entry for a partial (region-of-interest) result.
    ///
    /// The frame holds only the recomputed region; `roi` records where
    /// that region sits in the full-resolution coordinate space of the
    /// stage output. The region must lie within the *stored* frame's
    /// bounds.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidEntry`] if `roi` extends past the
    /// frame's dimensions or has a zero extent.
    pub fn with_roi(
        digest: ConfigDigest,
        frame: Frame,
        metrics: StageMetrics,
        roi: Roi,
    ) -> Result<Self, CacheError> {
        if !roi.fits_within(frame.dimensions()) {
            return Err(CacheError::InvalidEntry(format!(
                "roi {}x{} at ({}, {}) exceeds frame bounds {}x{}",
                roi.width,
                roi.height,
                roi.x,
                roi.y,
                frame.width(),
                frame.height(),
            )));
        }
        Ok(Self {
            digest,
            frame,
            metrics,
            roi: Some(roi),
        })
    }

    /// The digest of the configuration that produced this result.
    #[must_use]
    pub const fn digest(&self) -> &ConfigDigest {
        &self.digest
    }

    /// Read-only view of the computed frame.
    #[must_use]
    pub const fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Metrics recorded by the stage computation.
    #[must_use]
    pub const fn metrics(&self) -> &StageMetrics {
        &self.metrics
    }

    /// The region of interest, or `None` for a full-frame result.
    #[must_use]
    pub const fn roi(&self) -> Option<Roi> {
        self.roi
    }

    /// Whether this entry represents the full frame (no ROI scope).
    #[must_use]
    pub const fn is_full_frame(&self) -> bool {
        self.roi.is_none()
    }
}
