//! Sliding-window majority vote over recent decisions
//!
//! The window keeps the label component of the last `N` decisions (`None` for
//! `Unknown`) and promotes the most frequent one to a [`StableLabel`] once it
//! has at least `min_support` votes.
//!
//! Among labels with equal counts, the one observed most recently wins.

use crate::error::{GestureError, Result};
use crate::types::{LabelId, StableLabel};
use std::collections::VecDeque;

/// Bounded FIFO of recent decisions with a majority-vote output
#[derive(Debug, Clone)]
pub struct SmoothingWindow {
    capacity: usize,
    min_support: usize,
    entries: VecDeque<Option<LabelId>>,
}

impl SmoothingWindow {
    /// Create a window of `capacity` frames requiring `min_support` votes
    pub fn new(capacity: usize, min_support: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(GestureError::Config(
                "smoothing window needs a capacity of at least 1".to_string(),
            ));
        }
        if min_support == 0 || min_support > capacity {
            return Err(GestureError::Config(format!(
                "min_support must be in 1..={}, got {}",
                capacity, min_support
            )));
        }

        Ok(Self {
            capacity,
            min_support,
            entries: VecDeque::with_capacity(capacity),
        })
    }

    /// Append a decision (`None` = `Unknown`) and return the stable label
    pub fn observe(&mut self, label: Option<LabelId>) -> StableLabel {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(label);
        self.stable()
    }

    /// Stable label for the current contents, without observing anything
    pub fn stable(&self) -> StableLabel {
        match self.majority() {
            Some((Some(label), votes)) if votes >= self.min_support => {
                StableLabel::Label { label, votes }
            }
            _ => StableLabel::Unknown,
        }
    }

    /// Most frequent entry and its count, ties broken by recency
    pub fn majority(&self) -> Option<(Option<LabelId>, usize)> {
        let mut best: Option<(Option<LabelId>, usize)> = None;
        // Newest first: a later candidate only wins with a strictly higher count.
        for candidate in self.entries.iter().rev() {
            if best.is_some_and(|(label, _)| label == *candidate) {
                continue;
            }
            let count = self.entries.iter().filter(|e| *e == candidate).count();
            match best {
                Some((_, best_count)) if count <= best_count => {}
                _ => best = Some((*candidate, count)),
            }
        }
        best
    }

    /// Forget all history, e.g. when acquisition restarts
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Entries from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = Option<LabelId>> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn min_support(&self) -> usize {
        self.min_support
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: Option<LabelId> = Some(LabelId(0));
    const B: Option<LabelId> = Some(LabelId(1));
    const UNKNOWN: Option<LabelId> = None;

    fn window() -> SmoothingWindow {
        SmoothingWindow::new(5, 3).unwrap()
    }

    #[test]
    fn test_majority_with_unknown_in_window() {
        let mut w = window();
        let outputs: Vec<_> = [A, A, UNKNOWN, A, B]
            .into_iter()
            .map(|l| w.observe(l))
            .collect();
        assert_eq!(outputs[2], StableLabel::Unknown);
        assert_eq!(
            outputs[3],
            StableLabel::Label {
                label: LabelId(0),
                votes: 3
            }
        );
        assert_eq!(
            outputs[4],
            StableLabel::Label {
                label: LabelId(0),
                votes: 3
            }
        );
    }

    #[test]
    fn test_capacity_is_bounded() {
        let mut w = window();
        for _ in 0..20 {
            w.observe(A);
        }
        assert_eq!(w.len(), 5);
        assert!(w.is_full());
        assert_eq!(w.stable().votes(), 5);
    }

    #[test]
    fn test_oldest_entry_is_evicted() {
        let mut w = window();
        for l in [A, A, A, B, B] {
            w.observe(l);
        }
        // Evicts the first A: A=2, B=3
        let stable = w.observe(B);
        assert_eq!(stable.label(), Some(LabelId(1)));
        assert_eq!(w.iter().collect::<Vec<_>>(), vec![A, A, B, B, B]);
    }

    #[test]
    fn test_unknown_majority_is_unknown() {
        let mut w = window();
        for l in [UNKNOWN, UNKNOWN, UNKNOWN, A, A] {
            w.observe(l);
        }
        assert_eq!(w.stable(), StableLabel::Unknown);
        assert_eq!(w.majority(), Some((UNKNOWN, 3)));
    }

    #[test]
    fn test_tie_goes_to_most_recent() {
        let mut w = SmoothingWindow::new(4, 2).unwrap();
        for l in [A, B, A, B] {
            w.observe(l);
        }
        assert_eq!(w.majority(), Some((B, 2)));
        w.observe(A);
        // Window: B, A, B, A
        assert_eq!(w.majority(), Some((A, 2)));
    }

    #[test]
    fn test_tie_with_unknown_prefers_recent_label() {
        let mut w = SmoothingWindow::new(4, 2).unwrap();
        for l in [UNKNOWN, UNKNOWN, A, A] {
            w.observe(l);
        }
        assert_eq!(
            w.stable(),
            StableLabel::Label {
                label: LabelId(0),
                votes: 2
            }
        );
    }

    #[test]
    fn test_reset_behaves_like_fresh_window() {
        let mut w = window();
        for _ in 0..5 {
            w.observe(A);
        }
        w.reset();
        assert!(w.is_empty());
        assert_eq!(w.observe(A), StableLabel::Unknown);
        assert_eq!(w.observe(A), StableLabel::Unknown);
        assert_eq!(w.observe(A).label(), Some(LabelId(0)));
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(SmoothingWindow::new(0, 1).is_err());
        assert!(SmoothingWindow::new(5, 0).is_err());
        assert!(SmoothingWindow::new(5, 6).is_err());
        assert!(SmoothingWindow::new(1, 1).is_ok());
    }

    #[test]
    fn test_empty_window_has_no_majority() {
        let w = window();
        assert_eq!(w.majority(), None);
        assert_eq!(w.stable(), StableLabel::Unknown);
    }
}
