//! Identifiers used across the mounting pipeline

use core::fmt;

/// Identifier of an independently rendered UI subtree.
///
/// Each surface carries its own revision sequence; surfaces are fully
/// independent of each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SurfaceId(u64);

impl SurfaceId {
    /// Create a surface ID from a raw value
    #[inline]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    #[inline]
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface:{}", self.0)
    }
}

/// Identifier of a single node in the native view hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewTag(u64);

impl ViewTag {
    /// Create a view tag from a raw value
    #[inline]
    pub const fn new(tag: u64) -> Self {
        Self(tag)
    }

    /// Get the raw tag value
    #[inline]
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ViewTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Number of an immutable tree snapshot within a surface's history.
///
/// Numbers start at [`RevisionNumber::INITIAL`] and advance by exactly one
/// per accepted commit; a number is never reused within a surface lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RevisionNumber(u64);

impl RevisionNumber {
    /// The state before any revision has been mounted
    pub const INITIAL: Self = Self(0);

    /// The first committed revision of a surface
    pub const FIRST: Self = Self(1);

    /// Create a revision number from a raw value
    #[inline]
    pub const fn new(number: u64) -> Self {
        Self(number)
    }

    /// Get the raw value
    #[inline]
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// The revision number that directly follows this one
    #[inline]
    pub const fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for RevisionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_id() {
        let id = SurfaceId::new(7);
        assert_eq!(id.raw(), 7);
        assert_ne!(id, SurfaceId::new(8));
    }

    #[test]
    fn test_revision_number_advances_by_one() {
        let mut number = RevisionNumber::INITIAL;
        number = number.next();
        assert_eq!(number, RevisionNumber::FIRST);
        assert_eq!(number.next().get(), 2);
    }

    #[test]
    fn test_revision_number_ordering() {
        assert!(RevisionNumber::INITIAL < RevisionNumber::FIRST);
        assert!(RevisionNumber::new(3) < RevisionNumber::new(4));
    }
}
