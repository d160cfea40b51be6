//! Tracks which pixel rows of a tile have been written, so a partially
//! written tile can be told apart from a fully written one and so
//! [`Options::byte_filler`](crate::tilemap::Options) only needs to be
//! applied to rows that were never touched.
//!
//! This tracks completeness at the granularity of pixel rows rather than
//! individual bytes: a write always supplies full rows (callers stitch
//! partial-width requests one row at a time through
//! [`Map`](crate::tilemap::map::Map)'s bit-copy engine), so row-level
//! bookkeeping is both sufficient and far cheaper than a full 2D rectangle
//! set.

/// A mutable record of which of a tile's `height` rows have been written at
/// least once.
#[derive(Clone, Debug)]
pub struct UnsetArea {
    height: u32,
    set_rows: Vec<bool>,
}

impl UnsetArea {
    /// Creates a tracker for a tile with `height` rows, all initially
    /// unset.
    pub fn new(height: u32) -> Self {
        UnsetArea {
            height,
            set_rows: vec![false; height as usize],
        }
    }

    /// Marks rows `[y0, y0 + count)` as written. Idempotent: marking an
    /// already-set row a second time has no further effect.
    pub fn mark_rows(&mut self, y0: u32, count: u32) {
        let end = (y0 + count).min(self.height);
        for row in y0.min(self.height)..end {
            self.set_rows[row as usize] = true;
        }
    }

    pub fn is_row_set(&self, y: u32) -> bool {
        y < self.height && self.set_rows[y as usize]
    }

    pub fn is_fully_set(&self) -> bool {
        self.set_rows.iter().all(|&set| set)
    }

    pub fn is_fully_unset(&self) -> bool {
        self.set_rows.iter().all(|&set| !set)
    }

    /// Row ranges (`[start, end)`, half-open) that remain unset, in
    /// ascending order, merging adjacent unset rows into a single range.
    pub fn unset_ranges(&self) -> Vec<(u32, u32)> {
        let mut ranges = Vec::new();
        let mut start: Option<u32> = None;
        for row in 0..self.height {
            if self.set_rows[row as usize] {
                if let Some(s) = start.take() {
                    ranges.push((s, row));
                }
            } else if start.is_none() {
                start = Some(row);
            }
        }
        if let Some(s) = start {
            ranges.push((s, self.height));
        }
        ranges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_area_is_fully_unset() {
        let area = UnsetArea::new(10);
        assert!(area.is_fully_unset());
        assert!(!area.is_fully_set());
        assert_eq!(area.unset_ranges(), vec![(0, 10)]);
    }

    #[test]
    fn marking_all_rows_makes_it_fully_set() {
        let mut area = UnsetArea::new(4);
        area.mark_rows(0, 4);
        assert!(area.is_fully_set());
        assert!(area.unset_ranges().is_empty());
    }

    #[test]
    fn marking_is_idempotent() {
        let mut area = UnsetArea::new(4);
        area.mark_rows(1, 2);
        let first = area.unset_ranges();
        area.mark_rows(1, 2);
        assert_eq!(first, area.unset_ranges());
    }

    #[test]
    fn unset_ranges_merge_adjacent_gaps() {
        let mut area = UnsetArea::new(6);
        area.mark_rows(2, 1); // row 2 set, rows 0-1 and 3-5 unset
        assert_eq!(area.unset_ranges(), vec![(0, 2), (3, 6)]);
    }

    #[test]
    fn mark_rows_clamps_to_height() {
        let mut area = UnsetArea::new(3);
        area.mark_rows(1, 10);
        assert!(area.is_row_set(1));
        assert!(area.is_row_set(2));
        assert!(!area.is_row_set(0));
    }
}
