//! Pipeline checkpoint identifiers.
//!
//! Each [`Checkpoint`] variant names the output slot of one processing
//! stage. The set is closed and totally ordered: a stage consumes the
//! output of the stage before it, so invalidating a checkpoint also
//! invalidates everything after it in this order.

use std::fmt;

/// Identifier for one pipeline stage's cache slot.
///
/// Declaration order is pipeline order: `Base < Exposure < Retouch <
/// Lab`. Downstream-invalidation logic relies on [`Self::index`]
/// following this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Checkpoint {
    /// Stage 0: base decode of the source negative.
    Base,
    /// Stage 1: exposure adjustment.
    Exposure,
    /// Stage 2: retouch (spot removal, dust correction).
    Retouch,
    /// Stage 3: color-lab conversion.
    Lab,
}

impl Checkpoint {
    /// All checkpoints in pipeline order.
    pub const ALL: [Self; 4] = [Self::Base, Self::Exposure, Self::Retouch, Self::Lab];

    /// Machine-readable stage name (e.g. `"exposure"`).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Exposure => "exposure",
            Self::Retouch => "retouch",
            Self::Lab => "lab",
        }
    }

    /// Display label for the stage.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Base => "Base",
            Self::Exposure => "Exposure",
            Self::Retouch => "Retouch",
            Self::Lab => "Color Lab",
        }
    }

    /// Zero-based position of this checkpoint in pipeline order.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Base => 0,
            Self::Exposure => 1,
            Self::Retouch => 2,
            Self::Lab => 3,
        }
    }

    /// Map a pipeline position back to its checkpoint.
    ///
    /// Returns `None` for out-of-range indices.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Base),
            1 => Some(Self::Exposure),
            2 => Some(Self::Retouch),
            3 => Some(Self::Lab),
            _ => None,
        }
    }

    /// Whether `self` runs at or after `other` in pipeline order.
    ///
    /// `a.depends_on(b)` means a change to `b`'s output requires
    /// recomputing `a`.
    #[must_use]
    pub const fn depends_on(self, other: Self) -> bool {
        self.index() >= other.index()
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_contains_every_variant_in_pipeline_order() {
        // If you add a variant to Checkpoint, update ALL and this count.
        assert_eq!(Checkpoint::ALL.len(), 4);
        for (position, checkpoint) in Checkpoint::ALL.iter().enumerate() {
            assert_eq!(checkpoint.index(), position);
        }
    }

    #[test]
    fn index_round_trips_through_from_index() {
        for checkpoint in Checkpoint::ALL {
            assert_eq!(Checkpoint::from_index(checkpoint.index()), Some(checkpoint));
        }
        assert_eq!(Checkpoint::from_index(4), None);
    }

    #[test]
    fn ord_matches_pipeline_order() {
        assert!(Checkpoint::Base < Checkpoint::Exposure);
        assert!(Checkpoint::Exposure < Checkpoint::Retouch);
        assert!(Checkpoint::Retouch < Checkpoint::Lab);
    }

    #[test]
    fn downstream_stages_depend_on_upstream() {
        assert!(Checkpoint::Lab.depends_on(Checkpoint::Base));
        assert!(Checkpoint::Exposure.depends_on(Checkpoint::Exposure));
        assert!(!Checkpoint::Base.depends_on(Checkpoint::Exposure));
    }

    #[test]
    fn names_and_labels() {
        assert_eq!(Checkpoint::Base.name(), "base");
        assert_eq!(Checkpoint::Lab.label(), "Color Lab");
        assert_eq!(Checkpoint::Exposure.to_string(), "exposure");
    }
}
