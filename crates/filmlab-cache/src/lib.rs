//! filmlab-cache: pipeline result cache for the filmlab negative editor
//! (sans-IO).
//!
//! The editor runs each frame through a fixed processing pipeline:
//! base decode -> exposure -> retouch -> color lab. Every stage is a
//! pure function of the upstream frame and a configuration value, so
//! its result can be cached under a stable digest of that
//! configuration. This crate owns those cached results: it stores one
//! entry per stage checkpoint for the currently active source image,
//! answers freshness queries by digest, and invalidates downstream
//! checkpoints when an upstream result changes.
//!
//! This crate has **no I/O dependencies** — it never decodes images,
//! touches files, or renders anything. The pipeline driver computes
//! stage results and writes them in; display and export code borrows
//! them back out.
//!
//! # Typical driver loop
//!
//! ```rust
//! # use filmlab_cache::{
//! #     CacheEntry, CacheError, Checkpoint, ExposureConfig, Frame, PipelineCache, StageMetrics,
//! #     digest_config,
//! # };
//! # fn compute_exposure_stage() -> Result<Frame, CacheError> {
//! #     Frame::filled(4, 4, [0.5; 3])
//! # }
//! # fn run() -> Result<(), CacheError> {
//! let mut cache = PipelineCache::new();
//! cache.set_active_source("roll3/frame12.tif-hash");
//!
//! let config = ExposureConfig::default();
//! let digest = digest_config(&config)?;
//!
//! if cache.get(Checkpoint::Exposure, &digest).is_none() {
//!     let frame = compute_exposure_stage()?;
//!     let entry = CacheEntry::new(digest.clone(), frame, StageMetrics::new())?;
//!     // A new exposure result feeds every later stage.
//!     cache.invalidate_from(Checkpoint::Exposure)?;
//!     cache.put(Checkpoint::Exposure, entry)?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod checkpoint;
pub mod config;
pub mod digest;
pub mod entry;
pub mod frame;
pub mod shared;
pub mod types;

pub use cache::PipelineCache;
pub use checkpoint::Checkpoint;
pub use config::{
    BaseConfig, ChannelClip, ExposureConfig, Illuminant, LabConfig, ProcessMode, RetouchConfig,
    SpotEdit, StageConfig,
};
pub use digest::{ConfigDigest, digest_config, digest_display};
pub use entry::{CacheEntry, StageMetrics};
pub use frame::{Frame, Rgb32FImage};
pub use shared::SharedCache;
pub use types::{CacheError, Dimensions, Roi};
