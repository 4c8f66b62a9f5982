//! Random generation of hyperslab arguments that fit inside an extent.

use rand::{Rng, SeedableRng, rngs::StdRng};

/// Per-dimension `(start, stride, count, block)` arguments of one hyperslab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HyperslabArgs {
    pub start: Vec<u64>,
    pub stride: Vec<u64>,
    pub count: Vec<u64>,
    pub block: Vec<u64>,
}

impl HyperslabArgs {
    pub fn rank(&self) -> usize {
        self.start.len()
    }

    /// Number of elements the hyperslab selects.
    pub fn npoints(&self) -> u64 {
        self.count
            .iter()
            .zip(&self.block)
            .map(|(c, b)| c * b)
            .product()
    }
}

/// Deterministic generator for reproducible test runs.
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Random hyperslab with non-overlapping blocks that stays inside `dims`.
/// Every dimension must be non-empty.
pub fn random_hyperslab<R: Rng>(rng: &mut R, dims: &[u64]) -> HyperslabArgs {
    let mut args = HyperslabArgs {
        start: Vec::with_capacity(dims.len()),
        stride: Vec::with_capacity(dims.len()),
        count: Vec::with_capacity(dims.len()),
        block: Vec::with_capacity(dims.len()),
    };
    for &size in dims {
        assert!(size > 0);
        let block = rng.random_range(1..=size.min(3));
        let stride = rng.random_range(block..=block + 3);
        let max_count = (size - block) / stride + 1;
        let count = rng.random_range(1..=max_count.min(4));
        let span = stride * (count - 1) + block;
        let start = rng.random_range(0..=size - span);
        args.start.push(start);
        args.stride.push(stride);
        args.count.push(count);
        args.block.push(block);
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_hyperslab_fits_extent() {
        let mut rng = seeded_rng(7);
        let dims = [5u64, 9, 1, 12];
        for _ in 0..500 {
            let args = random_hyperslab(&mut rng, &dims);
            assert_eq!(args.rank(), dims.len());
            for d in 0..dims.len() {
                assert!(args.block[d] <= args.stride[d]);
                let last = args.start[d] + args.stride[d] * (args.count[d] - 1) + args.block[d];
                assert!(last <= dims[d]);
            }
            assert!(args.npoints() > 0);
        }
    }
}
