//! View mutations - declarative operations against the mounted hierarchy
//!
//! A mutation names the views it touches by tag; property payloads live with
//! the component descriptor registry, outside the ordering core.

use weft_core::ViewTag;

/// A single operation to apply to the native view hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMutation {
    /// Instantiate a view, detached from the hierarchy
    Create { tag: ViewTag },
    /// Destroy a view that is no longer attached
    Delete { tag: ViewTag },
    /// Attach a child under a parent at the given index
    Insert {
        child: ViewTag,
        parent: ViewTag,
        index: u32,
    },
    /// Detach a child from a parent at the given index
    Remove {
        child: ViewTag,
        parent: ViewTag,
        index: u32,
    },
    /// Refresh the properties of a mounted view
    Update { tag: ViewTag },
}

impl ViewMutation {
    /// The view this mutation is primarily about
    pub fn tag(&self) -> ViewTag {
        match self {
            Self::Create { tag } | Self::Delete { tag } | Self::Update { tag } => *tag,
            Self::Insert { child, .. } | Self::Remove { child, .. } => *child,
        }
    }

    /// Whether the mutation changes parent/child relationships
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Insert { .. } | Self::Remove { .. })
    }

    /// The parent view involved, if any
    pub fn parent(&self) -> Option<ViewTag> {
        match self {
            Self::Insert { parent, .. } | Self::Remove { parent, .. } => Some(*parent),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutation_tag() {
        let create = ViewMutation::Create {
            tag: ViewTag::new(10),
        };
        let insert = ViewMutation::Insert {
            child: ViewTag::new(10),
            parent: ViewTag::new(1),
            index: 0,
        };

        assert_eq!(create.tag(), ViewTag::new(10));
        assert_eq!(insert.tag(), ViewTag::new(10));
        assert_eq!(insert.parent(), Some(ViewTag::new(1)));
        assert_eq!(create.parent(), None);
    }

    #[test]
    fn test_structural_mutations() {
        let update = ViewMutation::Update {
            tag: ViewTag::new(3),
        };
        let remove = ViewMutation::Remove {
            child: ViewTag::new(3),
            parent: ViewTag::new(1),
            index: 2,
        };

        assert!(!update.is_structural());
        assert!(remove.is_structural());
    }
}
