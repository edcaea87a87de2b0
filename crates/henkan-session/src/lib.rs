//! Conversion context wrapping the henkan core for one input string.
//!
//! `ConversionContext` owns the segmentation of the current reading and its
//! segment list. It exposes resize, candidate selection, commit (which feeds
//! the learner and flushes the shared record store) and prediction lookup.

mod commit;
mod convert;
mod types;

#[cfg(test)]
mod tests;

use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

use henkan_core::candidates::Candidate;
use henkan_core::dict::Direction;
use henkan_core::record::RecordStore;
use henkan_core::splitter::SplitterContext;
use henkan_core::{Engine, Segment};

pub use types::ChangeState;

/// One conversion in progress.
pub struct ConversionContext {
    engine: Arc<Engine>,
    /// Learning store, shared between contexts of the same user.
    store: Arc<RwLock<RecordStore>>,
    direction: Direction,

    split: Option<SplitterContext>,
    segments: Vec<Segment>,
    change: ChangeState,
}

impl ConversionContext {
    pub fn new(engine: Arc<Engine>, store: Arc<RwLock<RecordStore>>) -> Self {
        Self {
            engine,
            store,
            direction: Direction::Forward,
            split: None,
            segments: Vec::new(),
            change: ChangeState::default(),
        }
    }

    /// Convert literals back to readings from the next `set_string` on.
    pub fn set_reverse(&mut self, reverse: bool) {
        self.direction = if reverse {
            Direction::Reverse
        } else {
            Direction::Forward
        };
    }

    pub fn is_reverse(&self) -> bool {
        self.direction == Direction::Reverse
    }

    /// The input being converted, empty when idle.
    pub fn text(&self) -> String {
        self.split
            .as_ref()
            .map(|sc| sc.chars().iter().collect())
            .unwrap_or_default()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn candidates(&self, nth: usize) -> Option<&[Candidate]> {
        self.segments.get(nth).map(|s| s.candidates.as_slice())
    }

    /// Segmentation state, for callers that inspect metawords.
    pub fn splitter(&self) -> Option<&SplitterContext> {
        self.split.as_ref()
    }

    /// What the last operation changed.
    pub fn change_state(&self) -> ChangeState {
        self.change
    }

    /// Drop the current conversion without learning from it.
    pub fn reset(&mut self) {
        if self.split.is_some() {
            self.change = ChangeState::ALL;
        }
        self.split = None;
        self.segments.clear();
    }
}

/// The store stays usable after a panic elsewhere; its rows are only
/// ever replaced whole.
fn lock(store: &RwLock<RecordStore>) -> RwLockWriteGuard<'_, RecordStore> {
    store.write().unwrap_or_else(PoisonError::into_inner)
}
