//! Snapshot undo/redo for timeline state.

use crate::timeline::Timeline;
use std::collections::VecDeque;

/// Default number of undo snapshots retained.
pub const HISTORY_CAPACITY: usize = 50;

/// Bounded undo/redo over whole-timeline snapshots.
///
/// Each checkpoint stores the state as it was before a successful
/// mutation. When the undo stack is full the oldest snapshot is
/// evicted; newer history is never dropped to make room. Any new
/// checkpoint invalidates the redo stack.
#[derive(Debug, Default)]
pub struct History {
    undo: VecDeque<Timeline>,
    redo: Vec<Timeline>,
    capacity: usize,
}

impl History {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            undo: VecDeque::with_capacity(capacity),
            redo: Vec::new(),
            capacity,
        }
    }

    /// Record the pre-mutation state. Clears any redo history.
    pub fn checkpoint(&mut self, before: Timeline) {
        self.redo.clear();
        self.undo.push_back(before);
        if self.undo.len() > self.capacity {
            self.undo.pop_front();
        }
    }

    /// Step back one checkpoint. `current` is pushed onto the redo
    /// stack; the returned timeline becomes the live state.
    pub fn undo(&mut self, current: &Timeline) -> Option<Timeline> {
        let previous = self.undo.pop_back()?;
        self.redo.push(current.clone());
        Some(previous)
    }

    /// Reapply the most recently undone state.
    pub fn redo(&mut self, current: &Timeline) -> Option<Timeline> {
        let next = self.redo.pop()?;
        self.undo.push_back(current.clone());
        if self.undo.len() > self.capacity {
            self.undo.pop_front();
        }
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    /// Forget all history, e.g. after loading a project.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::ClipRef;
    use montage_core::{FrameRate, RationalTime};
    use std::sync::Arc;

    fn timeline_with_segments(n: i64) -> Timeline {
        let clip = Arc::new(ClipRef::new(
            "/media/clip.mp4",
            RationalTime::from_seconds(100),
            FrameRate::FPS_30,
            false,
        ));
        let mut tl = Timeline::new();
        for i in 0..n {
            tl.add_segment(
                clip.clone(),
                RationalTime::from_seconds(i),
                RationalTime::from_seconds(i + 1),
            )
            .unwrap();
        }
        tl
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut history = History::new();
        let before = timeline_with_segments(1);
        let after = timeline_with_segments(2);

        history.checkpoint(before.clone());
        assert!(history.can_undo());

        let restored = history.undo(&after).unwrap();
        assert_eq!(restored, before);
        assert!(history.can_redo());

        let reapplied = history.redo(&restored).unwrap();
        assert_eq!(reapplied, after);
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_undo_on_empty_history() {
        let mut history = History::new();
        assert!(history.undo(&Timeline::new()).is_none());
        assert!(history.redo(&Timeline::new()).is_none());
    }

    #[test]
    fn test_checkpoint_clears_redo() {
        let mut history = History::new();
        history.checkpoint(timeline_with_segments(1));
        let _ = history.undo(&timeline_with_segments(2));
        assert!(history.can_redo());

        history.checkpoint(timeline_with_segments(3));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = History::with_capacity(50);
        for i in 0..51 {
            history.checkpoint(timeline_with_segments(i));
        }
        assert_eq!(history.undo_depth(), 50);

        // walk all the way back: the i=0 snapshot was evicted, so the
        // oldest reachable state is the one-segment timeline
        let mut current = timeline_with_segments(51);
        while let Some(prev) = history.undo(&current) {
            current = prev;
        }
        assert_eq!(current.segments().len(), 1);
    }
}
