//! The pipeline result cache: one slot per checkpoint, scoped to the
//! active source image.

use crate::checkpoint::Checkpoint;
use crate::digest::ConfigDigest;
use crate::entry::CacheEntry;
use crate::types::CacheError;

/// Caches intermediate pipeline results for the currently active
/// source image.
///
/// The cache holds a fixed, ordered set of checkpoint slots declared at
/// construction (by default all of [`Checkpoint::ALL`]) and the
/// `source_hash` identifying the image every stored entry was computed
/// from. All slots always belong to the same source: switching sources
/// via [`set_active_source`](Self::set_active_source) clears everything
/// before the new hash is adopted, so two slots can never reference
/// results from different images.
///
/// Per-slot lifecycle: `Empty -> Populated` via [`put`](Self::put),
/// `Populated -> Empty` via [`clear`](Self::clear) or a covering
/// [`invalidate_from`](Self::invalidate_from), and `Populated ->
/// Populated` via a `put` overwrite. A slot is never partially
/// populated.
///
/// The cache is an explicitly owned value scoped to one editing
/// session — create it, pass it by reference to whoever needs it, and
/// drop it when the session ends. For cross-thread use wrap it in
/// [`SharedCache`](crate::SharedCache).
///
/// # Example
///
/// ```rust
/// # use filmlab_cache::{
/// #     BaseConfig, CacheEntry, CacheError, Checkpoint, Frame, PipelineCache, StageMetrics,
/// #     digest_config,
/// # };
/// # fn run() -> Result<(), CacheError> {
/// let mut cache = PipelineCache::new();
/// cache.set_active_source("roll3/frame12.tif-hash");
///
/// let config = BaseConfig::default();
/// let digest = digest_config(&config)?;
///
/// if cache.get(Checkpoint::Base, &digest).is_none() {
///     // Miss: recompute the stage, then store the fresh result.
///     let frame = Frame::filled(64, 48, [0.2, 0.2, 0.2])?;
///     let entry = CacheEntry::new(digest.clone(), frame, StageMetrics::new())?;
///     cache.put(Checkpoint::Base, entry)?;
/// }
/// assert!(cache.get(Checkpoint::Base, &digest).is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct PipelineCache {
    source_hash: String,
    checkpoints: Vec<Checkpoint>,
    slots: Vec<Option<CacheEntry>>,
}

impl PipelineCache {
    /// Create a cache with a slot for every checkpoint in
    /// [`Checkpoint::ALL`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_checkpoints(&Checkpoint::ALL)
    }

    /// Create a cache for a subset of checkpoints.
    ///
    /// The slot set is fixed for the cache's lifetime. Duplicates are
    /// collapsed and slots are kept in pipeline order regardless of the
    /// order given, so downstream invalidation always walks the true
    /// stage order.
    #[must_use]
    pub fn with_checkpoints(checkpoints: &[Checkpoint]) -> Self {
        let mut ordered: Vec<Checkpoint> = checkpoints.to_vec();
        ordered.sort_unstable();
        ordered.dedup();
        let slots = ordered.iter().map(|_| None).collect();
        Self {
            source_hash: String::new(),
            checkpoints: ordered,
            slots,
        }
    }

    /// Identity hash of the currently active source image, or the
    /// empty string when no source is active.
    #[must_use]
    pub fn source_hash(&self) -> &str {
        &self.source_hash
    }

    /// The configured checkpoints in pipeline order.
    #[must_use]
    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    /// Number of populated slots.
    #[must_use]
    pub fn populated(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Whether no source is active and no slot is populated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.source_hash.is_empty() && self.populated() == 0
    }

    /// Switch the cache to a new source image.
    ///
    /// If `source_hash` differs from the current one, every slot is
    /// dropped before the new hash is adopted — entries computed from
    /// one image must never be served for another. Idempotent when the
    /// hash is unchanged: redundant calls (e.g. re-selecting the same
    /// frame in the contact sheet) preserve populated slots.
    pub fn set_active_source(&mut self, source_hash: &str) {
        if self.source_hash == source_hash {
            return;
        }
        self.clear();
        self.source_hash = source_hash.to_string();
        log::debug!("cache now scoped to source {source_hash}");
    }

    /// Look up a fresh entry for `checkpoint`.
    ///
    /// Returns the stored entry only if the slot is populated *and* its
    /// digest equals `expected`. A stale digest, an empty slot, or an
    /// unconfigured checkpoint all yield `None` — staleness is the
    /// normal signal that drives recomputation, not an error.
    #[must_use]
    pub fn get(&self, checkpoint: Checkpoint, expected: &ConfigDigest) -> Option<&CacheEntry> {
        let slot = self.slot_index(checkpoint)?;
        self.slots[slot]
            .as_ref()
            .filter(|entry| entry.digest() == expected)
    }

    /// Look up a fresh *full-frame* entry for `checkpoint`.
    ///
    /// As [`get`](Self::get), but an entry scoped to a region of
    /// interest is also a miss: a partial recomputation never satisfies
    /// a full-frame query.
    #[must_use]
    pub fn get_full_frame(
        &self,
        checkpoint: Checkpoint,
        expected: &ConfigDigest,
    ) -> Option<&CacheEntry> {
        self.get(checkpoint, expected)
            .filter(|entry| entry.is_full_frame())
    }

    /// Store a fresh entry for `checkpoint`, dropping any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::UnknownCheckpoint`] if `checkpoint` is not
    /// in the cache's configured set.
    pub fn put(&mut self, checkpoint: Checkpoint, entry: CacheEntry) -> Result<(), CacheError> {
        let slot = self
            .slot_index(checkpoint)
            .ok_or(CacheError::UnknownCheckpoint(checkpoint))?;
        log::debug!(
            "caching {checkpoint} result, digest {}",
            entry.digest().as_str(),
        );
        self.slots[slot] = Some(entry);
        Ok(())
    }

    /// Drop every slot and reset the source hash.
    ///
    /// No-op when already empty.
    pub fn clear(&mut self) {
        if !self.is_empty() {
            log::debug!(
                "clearing cache for source {:?} ({} populated slots)",
                self.source_hash,
                self.populated(),
            );
        }
        self.source_hash.clear();
        for slot in &mut self.slots {
            *slot = None;
        }
    }

    /// Drop `checkpoint` and every checkpoint after it in pipeline
    /// order.
    ///
    /// Downstream stages consume upstream output, so a change that
    /// invalidates one checkpoint invalidates everything that runs
    /// after it. Upstream slots are untouched.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::UnknownCheckpoint`] if `checkpoint` is not
    /// in the cache's configured set.
    pub fn invalidate_from(&mut self, checkpoint: Checkpoint) -> Result<(), CacheError> {
        let slot = self
            .slot_index(checkpoint)
            .ok_or(CacheError::UnknownCheckpoint(checkpoint))?;
        log::debug!("invalidating {checkpoint} and downstream checkpoints");
        for entry in &mut self.slots[slot..] {
            *entry = None;
        }
        Ok(())
    }

    fn slot_index(&self, checkpoint: Checkpoint) -> Option<usize> {
        self.checkpoints.iter().position(|&c| c == checkpoint)
    }
}

impl Default for PipelineCache {
    fn default() -> Self {
        Self::new()
    }
}
