//! Compact `(start, stride, count, block)` form of a selection that is exactly
//! one regular grid of blocks.

use hyperslab_common::{Result, error::Error};
use itertools::Itertools;

use crate::{
    block::Block,
    span::{Span, SpanTree},
};

/// Regular pattern of one dimension: `count` blocks of `block` indices, the
/// first starting at `start` and each subsequent one `stride` further.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimInfo {
    pub start: u64,
    pub stride: u64,
    pub count: u64,
    pub block: u64,
}

impl DimInfo {
    pub fn new(start: u64, stride: u64, count: u64, block: u64) -> DimInfo {
        DimInfo {
            start,
            stride,
            count,
            block,
        }
    }

    /// Single block `[start, start + block)`.
    pub fn single(start: u64, block: u64) -> DimInfo {
        DimInfo::new(start, 1, 1, block)
    }

    /// Last index covered in this dimension.
    #[inline]
    pub fn end(&self) -> u64 {
        self.start + self.stride * (self.count - 1) + self.block - 1
    }

    #[inline]
    pub fn npoints(&self) -> u64 {
        self.count * self.block
    }

    /// Folds contiguous blocks together: blocks that touch (`stride == block`)
    /// become one larger block, and a lone block gets a unit stride.
    pub fn optimized(&self) -> DimInfo {
        if self.stride == self.block {
            DimInfo::new(self.start, 1, 1, self.count * self.block)
        } else if self.count == 1 {
            DimInfo::new(self.start, 1, 1, self.block)
        } else {
            *self
        }
    }
}

/// Regular description of a whole hyperslab selection.
///
/// Two copies are kept per dimension: `app`, the pattern as the caller
/// specified it, and `opt`, the same point set with contiguous blocks folded.
/// All internal walks use `opt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegularDescriptor {
    app: Vec<DimInfo>,
    opt: Vec<DimInfo>,
}

impl RegularDescriptor {
    /// Builds a descriptor from caller-specified patterns. Counts and blocks
    /// must be non-zero and blocks must not overlap.
    pub fn new(app: Vec<DimInfo>) -> Result<RegularDescriptor> {
        // The block total never exceeds the element total.
        let mut total = 1u64;
        for (dim, info) in app.iter().enumerate() {
            if info.stride == 0 {
                return Err(Error::invalid_dim_arg("stride", dim, "stride must be non-zero"));
            }
            if info.count == 0 || info.block == 0 {
                return Err(Error::invalid_dim_arg(
                    "count/block",
                    dim,
                    "empty pattern has no regular form",
                ));
            }
            if info.count > 1 && info.stride < info.block {
                return Err(Error::invalid_dim_arg(
                    "block",
                    dim,
                    format!(
                        "hyperslab blocks overlap (stride {} < block {})",
                        info.stride, info.block
                    ),
                ));
            }
            let last = info
                .stride
                .checked_mul(info.count - 1)
                .and_then(|v| v.checked_add(info.start))
                .and_then(|v| v.checked_add(info.block - 1));
            if last.is_none() {
                return Err(Error::invalid_dim_arg(
                    "start",
                    dim,
                    "selection extends past the largest representable index",
                ));
            }
            total = info
                .count
                .checked_mul(info.block)
                .and_then(|n| n.checked_mul(total))
                .ok_or_else(|| {
                    Error::invalid_dim_arg(
                        "count",
                        dim,
                        "number of selected elements is not representable",
                    )
                })?;
        }
        let opt = app.iter().map(DimInfo::optimized).collect();
        Ok(RegularDescriptor { app, opt })
    }

    /// Descriptor whose caller-facing and optimized forms coincide.
    pub(crate) fn from_opt(opt: Vec<DimInfo>) -> RegularDescriptor {
        RegularDescriptor {
            app: opt.clone(),
            opt,
        }
    }

    /// One block covering the whole of `dims`.
    pub fn full(dims: &[u64]) -> RegularDescriptor {
        RegularDescriptor::from_opt(dims.iter().map(|&d| DimInfo::single(0, d)).collect())
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.opt.len()
    }

    #[inline]
    pub fn app(&self) -> &[DimInfo] {
        &self.app
    }

    #[inline]
    pub fn opt(&self) -> &[DimInfo] {
        &self.opt
    }

    pub fn npoints(&self) -> u64 {
        self.opt.iter().map(DimInfo::npoints).product()
    }

    pub fn nblocks(&self) -> u64 {
        self.opt.iter().map(|info| info.count).product()
    }

    /// Blocks of the optimized pattern in row-major order.
    pub fn blocks(&self) -> impl Iterator<Item = Block> + '_ {
        self.opt
            .iter()
            .map(|info| 0..info.count)
            .multi_cartesian_product()
            .map(|counts| {
                let start: Vec<u64> = self
                    .opt
                    .iter()
                    .zip(&counts)
                    .map(|(info, &i)| info.start + i * info.stride)
                    .collect();
                let end = self
                    .opt
                    .iter()
                    .zip(&start)
                    .map(|(info, &s)| s + info.block - 1)
                    .collect();
                Block::new(start, end)
            })
    }

    /// Builds the span tree of the pattern. Every span of a dimension shares
    /// the one sub-tree describing the faster dimensions.
    pub fn make_spans(&self) -> SpanTree {
        let mut down: Option<SpanTree> = None;
        for info in self.opt.iter().rev() {
            let spans = (0..info.count)
                .map(|i| {
                    let low = info.start + i * info.stride;
                    Span::new(low, low + info.block - 1, down.clone())
                })
                .collect();
            down = Some(SpanTree::from_spans(spans));
        }
        down.unwrap_or_else(SpanTree::empty)
    }
}
