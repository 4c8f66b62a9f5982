//! Inclusive N-dimensional blocks, the unit of block-list extraction and persistence.

/// An axis-aligned box `[start, end]` (both inclusive in every dimension).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Block {
    pub start: Vec<u64>,
    pub end: Vec<u64>,
}

impl Block {
    pub fn new(start: Vec<u64>, end: Vec<u64>) -> Block {
        debug_assert_eq!(start.len(), end.len());
        debug_assert!(start.iter().zip(&end).all(|(s, e)| s <= e));
        Block { start, end }
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.start.len()
    }

    /// Number of elements covered by the block.
    pub fn npoints(&self) -> u64 {
        self.start
            .iter()
            .zip(&self.end)
            .map(|(s, e)| e - s + 1)
            .product()
    }

    pub fn contains(&self, coords: &[u64]) -> bool {
        coords.len() == self.rank()
            && coords
                .iter()
                .zip(self.start.iter().zip(&self.end))
                .all(|(c, (s, e))| c >= s && c <= e)
    }

    /// Per-dimension block sizes (`end - start + 1`).
    pub fn shape(&self) -> Vec<u64> {
        self.start
            .iter()
            .zip(&self.end)
            .map(|(s, e)| e - s + 1)
            .collect()
    }
}
