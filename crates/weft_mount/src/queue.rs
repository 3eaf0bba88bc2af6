//! Transaction queue - per-surface revision ordering
//!
//! Commits may race, so transactions can arrive out of order and from
//! different threads. The queue buffers arrivals keyed by revision number
//! and only hands out the transaction that directly follows the last one
//! pulled. A revision-1 push while the sequence is already past 1 signals a
//! reload: buffered history cannot be reconciled and is discarded.

use std::collections::BTreeMap;

use weft_core::{RevisionNumber, SurfaceId};

use crate::transaction::MountTransaction;

/// Orders transactions by revision number, holding gaps until they fill
#[derive(Debug)]
pub struct TransactionQueue {
    surface: SurfaceId,
    buffer: BTreeMap<RevisionNumber, MountTransaction>,
    last_pulled: RevisionNumber,
}

impl TransactionQueue {
    /// Create an empty queue expecting revision 1
    pub fn new(surface: SurfaceId) -> Self {
        Self {
            surface,
            buffer: BTreeMap::new(),
            last_pulled: RevisionNumber::INITIAL,
        }
    }

    /// The surface this queue orders transactions for
    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    /// The revision number the next successful pull will return
    pub fn expected_next(&self) -> RevisionNumber {
        self.last_pulled.next()
    }

    /// Buffer a transaction, resetting the sequence on a mid-stream revision 1.
    ///
    /// Pushing a revision number that was already pulled or is already
    /// buffered is a contract violation: fatal in debug builds, dropped with
    /// a warning in release builds.
    pub fn push(&mut self, transaction: MountTransaction) {
        debug_assert_eq!(
            transaction.surface(),
            self.surface,
            "transaction for {} pushed into queue of {}",
            transaction.surface(),
            self.surface
        );

        let number = transaction.number();

        if number == RevisionNumber::FIRST && self.last_pulled >= RevisionNumber::FIRST {
            // Reload: history cannot be reconciled, restart the sequence.
            log::debug!(
                "{}: revision 1 arrived mid-stream, dropping {} buffered transaction(s)",
                self.surface,
                self.buffer.len()
            );
            self.buffer.clear();
            self.last_pulled = RevisionNumber::INITIAL;
        }

        if number <= self.last_pulled || self.buffer.contains_key(&number) {
            debug_assert!(
                false,
                "duplicate revision {number} pushed for {}",
                self.surface
            );
            log::warn!("{}: ignoring duplicate revision {number}", self.surface);
            return;
        }

        self.buffer.insert(number, transaction);
    }

    /// Remove and return the next in-order transaction, if it has arrived.
    ///
    /// Never blocks; out-of-order arrivals stay buffered until the gap fills.
    pub fn pull(&mut self) -> Option<MountTransaction> {
        let next = self.last_pulled.next();
        let (&minimum, _) = self.buffer.first_key_value()?;
        if minimum != next {
            return None;
        }

        self.last_pulled = next;
        self.buffer.remove(&next)
    }

    /// Whether a pull would currently succeed
    pub fn has_next(&self) -> bool {
        self.buffer
            .first_key_value()
            .is_some_and(|(&minimum, _)| minimum == self.last_pulled.next())
    }

    /// Number of buffered transactions, in-order or not
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the buffer holds nothing at all
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drop all buffered transactions without touching the sequence position
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
