use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, debug_span};

use henkan_core::dict::DictError;
use henkan_core::learn::{learn_commit, predict, Prediction};

use super::types::ChangeState;
use super::{lock, ConversionContext};

impl ConversionContext {
    /// Choose candidate `cand` of segment `nth` for the next commit.
    pub fn select(&mut self, nth: usize, cand: usize) -> bool {
        let Some(seg) = self.segments.get_mut(nth) else {
            return false;
        };
        if cand >= seg.candidates.len() {
            return false;
        }
        seg.committed = Some(cand);
        self.change = ChangeState::CANDIDATES;
        true
    }

    /// Select by literal; handy for callers that only know the text.
    pub fn select_text(&mut self, nth: usize, text: &str) -> bool {
        let Some(cand) = self
            .candidates(nth)
            .and_then(|cands| cands.iter().position(|c| c.text == text))
        else {
            return false;
        };
        self.select(nth, cand)
    }

    /// Commit the selected candidates (the top ones where nothing was
    /// selected), learn from them and flush the store.
    ///
    /// Returns the committed text. The context is idle afterwards.
    pub fn commit(&mut self) -> Result<String, DictError> {
        self.commit_at(unix_now())
    }

    /// [`commit`](Self::commit) with an explicit prediction timestamp.
    pub fn commit_at(&mut self, now: u64) -> Result<String, DictError> {
        let _span = debug_span!("commit", segments = self.segments.len()).entered();
        let Some(sc) = self.split.take() else {
            return Ok(String::new());
        };
        let segments = std::mem::take(&mut self.segments);
        let text: String = segments
            .iter()
            .map(|seg| {
                seg.committed_candidate()
                    .map(|c| c.text.as_str())
                    .unwrap_or(&seg.text)
            })
            .collect();

        let mut store = lock(&self.store);
        learn_commit(&sc, &segments, &mut store, now);
        store.flush()?;
        debug!(text = text.as_str(), "committed");
        self.change = ChangeState::ALL;
        Ok(text)
    }

    /// Learned completions of `prefix`, newest first.
    pub fn predict(&self, prefix: &str) -> Vec<Prediction> {
        predict(&lock(&self.store), prefix)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
