//! Dense bitmap over an N-dimensional extent.

use itertools::Itertools;

/// One flag per element of a row-major extent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenseGrid {
    dims: Vec<u64>,
    bits: Vec<bool>,
}

impl DenseGrid {
    /// Grid with nothing selected.
    pub fn new(dims: &[u64]) -> DenseGrid {
        let len = dims.iter().product::<u64>() as usize;
        DenseGrid {
            dims: dims.to_vec(),
            bits: vec![false; len],
        }
    }

    /// Grid with every element selected.
    pub fn full(dims: &[u64]) -> DenseGrid {
        let mut grid = DenseGrid::new(dims);
        grid.bits.fill(true);
        grid
    }

    /// Grid selecting the regular pattern `(start, stride, count, block)`.
    /// Panics when the pattern leaves the extent.
    pub fn from_hyperslab(
        dims: &[u64],
        start: &[u64],
        stride: &[u64],
        count: &[u64],
        block: &[u64],
    ) -> DenseGrid {
        let mut grid = DenseGrid::new(dims);
        let per_dim = (0..dims.len())
            .map(|d| {
                (0..count[d])
                    .flat_map(|i| {
                        let low = start[d] + i * stride[d];
                        low..low + block[d]
                    })
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();
        for coords in per_dim.into_iter().multi_cartesian_product() {
            grid.set(&coords, true);
        }
        grid
    }

    /// Grid selecting the inclusive box `[start, end]`.
    pub fn from_block(dims: &[u64], start: &[u64], end: &[u64]) -> DenseGrid {
        let ones = vec![1; dims.len()];
        let block = start.iter().zip(end).map(|(s, e)| e - s + 1).collect::<Vec<_>>();
        DenseGrid::from_hyperslab(dims, start, &ones, &ones, &block)
    }

    pub fn dims(&self) -> &[u64] {
        &self.dims
    }

    /// Row-major index of `coords`.
    pub fn linear(&self, coords: &[u64]) -> usize {
        assert_eq!(coords.len(), self.dims.len());
        coords
            .iter()
            .zip(&self.dims)
            .fold(0u64, |acc, (&c, &size)| {
                assert!(c < size, "coordinate {c} outside dimension of size {size}");
                acc * size + c
            }) as usize
    }

    pub fn get(&self, coords: &[u64]) -> bool {
        self.bits[self.linear(coords)]
    }

    pub fn set(&mut self, coords: &[u64], value: bool) {
        let idx = self.linear(coords);
        self.bits[idx] = value;
    }

    /// Number of selected elements.
    pub fn count(&self) -> u64 {
        self.bits.iter().filter(|&&b| b).count() as u64
    }

    pub fn is_empty(&self) -> bool {
        !self.bits.contains(&true)
    }

    /// Selected coordinates in row-major order.
    pub fn coords(&self) -> Vec<Vec<u64>> {
        self.bits
            .iter()
            .positions(|&b| b)
            .map(|idx| self.unlinear(idx as u64))
            .collect()
    }

    /// Selected row-major indices grouped into maximal `(start, len)` runs.
    pub fn runs(&self) -> Vec<(u64, u64)> {
        let mut runs: Vec<(u64, u64)> = Vec::new();
        for idx in self.bits.iter().positions(|&b| b) {
            let idx = idx as u64;
            match runs.last_mut() {
                Some((start, len)) if *start + *len == idx => *len += 1,
                _ => runs.push((idx, 1)),
            }
        }
        runs
    }

    pub fn union(&self, other: &DenseGrid) -> DenseGrid {
        self.zip_with(other, |a, b| a || b)
    }

    pub fn intersect(&self, other: &DenseGrid) -> DenseGrid {
        self.zip_with(other, |a, b| a && b)
    }

    pub fn xor(&self, other: &DenseGrid) -> DenseGrid {
        self.zip_with(other, |a, b| a != b)
    }

    /// Elements of `self` that are not in `other`.
    pub fn difference(&self, other: &DenseGrid) -> DenseGrid {
        self.zip_with(other, |a, b| a && !b)
    }

    fn zip_with(&self, other: &DenseGrid, f: impl Fn(bool, bool) -> bool) -> DenseGrid {
        assert_eq!(self.dims, other.dims);
        DenseGrid {
            dims: self.dims.clone(),
            bits: self
                .bits
                .iter()
                .zip(&other.bits)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        }
    }

    fn unlinear(&self, mut idx: u64) -> Vec<u64> {
        let mut coords = vec![0; self.dims.len()];
        for (c, &size) in coords.iter_mut().zip(&self.dims).rev() {
            *c = idx % size;
            idx /= size;
        }
        coords
    }
}
