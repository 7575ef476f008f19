//! Per-side history of fitted lane lines.
//!
//! When a frame yields no fit for a side, the mean of the last few fits
//! stands in for it, trading a few frames of lag for continuity.

use std::collections::VecDeque;

use lanekeep_core::{CameraSide, LaneLine};

/// Number of past fits remembered per side.
pub const HISTORY_CAPACITY: usize = 5;

/// Bounded FIFO of lane lines; the oldest entry is evicted first.
#[derive(Clone, Debug)]
pub struct LineHistory {
    lines: VecDeque<LaneLine>,
    capacity: usize,
}

impl Default for LineHistory {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }
}

impl LineHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, line: LaneLine) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    /// Coordinate-wise mean of the stored lines, `None` when empty.
    pub fn mean_or_absent(&self) -> Option<LaneLine> {
        LaneLine::mean(&self.lines)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &LaneLine> {
        self.lines.iter()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

/// Left and right histories owned by one detector.
#[derive(Clone, Debug, Default)]
pub struct LaneHistory {
    left: LineHistory,
    right: LineHistory,
}

impl LaneHistory {
    pub fn side(&self, side: CameraSide) -> &LineHistory {
        match side {
            CameraSide::Left => &self.left,
            CameraSide::Right => &self.right,
        }
    }

    pub fn side_mut(&mut self, side: CameraSide) -> &mut LineHistory {
        match side {
            CameraSide::Left => &mut self.left,
            CameraSide::Right => &mut self.right,
        }
    }

    pub fn clear(&mut self) {
        self.left.clear();
        self.right.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(x: i32) -> LaneLine {
        LaneLine::new(x, 480, x + 100, 120)
    }

    #[test]
    fn keeps_the_five_most_recent() {
        let mut history = LineHistory::default();
        for x in 0..6 {
            history.push(line(x));
        }
        assert_eq!(history.len(), 5);
        let xs: Vec<i32> = history.iter().map(|l| l.x1).collect();
        assert_eq!(xs, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn empty_history_is_absent() {
        assert_eq!(LineHistory::default().mean_or_absent(), None);
    }

    #[test]
    fn mean_of_three() {
        let mut history = LineHistory::default();
        history.push(LaneLine::new(10, 480, 200, 120));
        history.push(LaneLine::new(20, 480, 210, 120));
        history.push(LaneLine::new(31, 480, 221, 120));
        // x1: 61 / 3 = 20.33, x2: 631 / 3 = 210.33
        assert_eq!(
            history.mean_or_absent(),
            Some(LaneLine::new(20, 480, 210, 120))
        );
    }

    #[test]
    fn sides_are_independent() {
        let mut lanes = LaneHistory::default();
        lanes.side_mut(CameraSide::Left).push(line(3));
        assert_eq!(lanes.side(CameraSide::Left).len(), 1);
        assert!(lanes.side(CameraSide::Right).is_empty());
        lanes.clear();
        assert!(lanes.side(CameraSide::Left).is_empty());
    }
}
