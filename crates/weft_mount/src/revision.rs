//! Revisions - immutable, numbered tree snapshots
//!
//! A revision pairs an opaque tree handle with its position in a surface's
//! history. The mounting core never looks inside the tree; diffing and
//! layout are the concern of the stages that produce revisions.

use std::fmt;
use std::sync::Arc;

use weft_core::{RevisionNumber, SurfaceId};

/// Marker for tree snapshots carried through the pipeline.
///
/// Any owned, thread-safe value qualifies; the pipeline treats it as opaque.
pub trait TreeSnapshot: Send + Sync + 'static {}

// Blanket implementation
impl<T: Send + Sync + 'static> TreeSnapshot for T {}

/// How a revision came to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RevisionSource {
    /// A regular update committed by the render pipeline
    Normal,
    /// An externally triggered rebuild (e.g. a reload)
    External,
}

impl Default for RevisionSource {
    fn default() -> Self {
        Self::Normal
    }
}

/// An immutable snapshot of a surface's tree, tagged with its revision number.
///
/// Revisions are shared as `Arc<Revision>`: the committing thread and the
/// transaction queue hold references until the mount consumer lets go of the
/// last one.
pub struct Revision {
    surface: SurfaceId,
    number: RevisionNumber,
    tree: Arc<dyn TreeSnapshot>,
    source: RevisionSource,
}

impl Revision {
    /// Create a new revision
    pub fn new(
        surface: SurfaceId,
        number: RevisionNumber,
        tree: Arc<dyn TreeSnapshot>,
        source: RevisionSource,
    ) -> Self {
        Self {
            surface,
            number,
            tree,
            source,
        }
    }

    /// The surface this revision belongs to
    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    /// The revision number within the surface's history
    pub fn number(&self) -> RevisionNumber {
        self.number
    }

    /// The opaque tree handle
    pub fn tree(&self) -> &Arc<dyn TreeSnapshot> {
        &self.tree
    }

    /// How the revision was produced
    pub fn source(&self) -> RevisionSource {
        self.source
    }

    /// Whether this is the first revision of the surface's sequence
    pub fn is_first(&self) -> bool {
        self.number == RevisionNumber::FIRST
    }
}

impl fmt::Debug for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Revision")
            .field("surface", &self.surface)
            .field("number", &self.number)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revision_accessors() {
        let tree: Arc<dyn TreeSnapshot> = Arc::new("root");
        let revision = Revision::new(
            SurfaceId::new(1),
            RevisionNumber::FIRST,
            tree,
            RevisionSource::Normal,
        );

        assert_eq!(revision.surface(), SurfaceId::new(1));
        assert_eq!(revision.number(), RevisionNumber::FIRST);
        assert_eq!(revision.source(), RevisionSource::Normal);
        assert!(revision.is_first());
    }

    #[test]
    fn test_revision_is_shared() {
        let tree: Arc<dyn TreeSnapshot> = Arc::new(42u32);
        let revision = Arc::new(Revision::new(
            SurfaceId::new(1),
            RevisionNumber::new(2),
            tree,
            RevisionSource::External,
        ));

        let held = revision.clone();
        drop(revision);
        assert_eq!(held.number().get(), 2);
        assert!(!held.is_first());
    }
}
