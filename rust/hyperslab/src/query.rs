//! Read-only queries over hyperslab selections and their dataspaces.

use ahash::AHashSet;
use hyperslab_common::{Result, error::Error};
use itertools::Either;

use crate::{
    block::Block,
    extent::check_rank,
    regular::{DimInfo, RegularDescriptor},
    selection::{Dataspace, Hyperslab, HyperslabSelection, Selection},
    span::{SpanList, SpanTree},
};

impl HyperslabSelection {
    /// Number of blocks: the product of per-dimension counts for a regular
    /// selection, the number of root-to-leaf span paths otherwise.
    pub fn nblocks(&self) -> u64 {
        match self.layout() {
            Hyperslab::Regular(desc) => desc.nblocks(),
            Hyperslab::Irregular(tree) => tree.nblocks(),
        }
    }

    /// Blocks in ascending row-major order of their start corner.
    pub fn blocks(&self) -> impl Iterator<Item = Block> + '_ {
        match self.layout() {
            Hyperslab::Regular(desc) => Either::Left(desc.blocks()),
            Hyperslab::Irregular(tree) => Either::Right(tree.blocks()),
        }
    }

    /// `count` blocks starting with block number `start`.
    pub fn block_list(&self, start: u64, count: u64) -> Vec<Block> {
        let skip = usize::try_from(start).unwrap_or(usize::MAX);
        let take = usize::try_from(count).unwrap_or(usize::MAX);
        self.blocks().skip(skip).take(take).collect()
    }

    /// Smallest block containing every selected element, or `None` when
    /// nothing is selected.
    pub fn bounds(&self) -> Option<Block> {
        if self.is_empty() {
            return None;
        }
        match self.layout() {
            Hyperslab::Regular(desc) => {
                let start = desc.opt().iter().map(|info| info.start).collect();
                let end = desc.opt().iter().map(DimInfo::end).collect();
                Some(Block::new(start, end))
            }
            Hyperslab::Irregular(tree) => {
                let mut start = vec![u64::MAX; self.rank()];
                let mut end = vec![0u64; self.rank()];
                let mut visited = AHashSet::new();
                span_bounds(tree, 0, &mut start, &mut end, &mut visited);
                Some(Block::new(start, end))
            }
        }
    }

    /// Whether the selection, moved by `offset`, lies inside `dims`.
    pub fn is_valid(&self, dims: &[u64], offset: &[i64]) -> bool {
        let Some(bounds) = self.bounds() else {
            return true;
        };
        bounds
            .start
            .iter()
            .zip(&bounds.end)
            .zip(dims.iter().zip(offset))
            .all(|((&low, &high), (&size, &off))| {
                let low = low.checked_add_signed(off);
                let high = high.checked_add_signed(off);
                low.is_some() && high.is_some_and(|h| h < size)
            })
    }

    /// Whether the selection maps onto one contiguous range of a row-major
    /// buffer over `dims`.
    ///
    /// Two shapes qualify: a single block spanning whole rows ("large"), every
    /// dimension but the slowest covering its entire extent; and a single run
    /// inside one row ("small"), every dimension but the fastest selecting a
    /// single index.
    pub fn is_contiguous(&self, dims: &[u64]) -> bool {
        match self.layout() {
            Hyperslab::Regular(desc) => regular_is_contiguous(desc, dims),
            Hyperslab::Irregular(tree) => spans_are_contiguous(tree, dims),
        }
    }

    /// Whether the selection is one block.
    pub fn is_single(&self) -> bool {
        match self.layout() {
            Hyperslab::Regular(desc) => desc.opt().iter().all(|info| info.count == 1),
            Hyperslab::Irregular(tree) => single_path(tree).is_some(),
        }
    }

    /// Whether the selection is stored in the regular form.
    #[inline]
    pub fn is_regular(&self) -> bool {
        matches!(self.layout(), Hyperslab::Regular(_))
    }

    /// Whether any selected element lies inside the inclusive block
    /// `[start, end]`.
    pub fn intersects_block(&self, start: &[u64], end: &[u64]) -> Result<bool> {
        check_block(start, end, self.rank())?;
        Ok(match self.layout() {
            Hyperslab::Regular(desc) => desc
                .opt()
                .iter()
                .zip(start.iter().zip(end))
                .all(|(info, (&s, &e))| dim_intersects(info, s, e)),
            Hyperslab::Irregular(tree) => spans_intersect(tree, 0, start, end),
        })
    }
}

fn check_block(start: &[u64], end: &[u64], rank: usize) -> Result<()> {
    check_rank("start", start, rank)?;
    check_rank("end", end, rank)?;
    if let Some(dim) = start.iter().zip(end).position(|(s, e)| s > e) {
        return Err(Error::invalid_dim_arg("end", dim, "block end precedes its start"));
    }
    Ok(())
}

fn span_bounds(
    list: &SpanTree,
    dim: usize,
    start: &mut [u64],
    end: &mut [u64],
    visited: &mut AHashSet<*const SpanList>,
) {
    if !visited.insert(list.as_ptr()) {
        return;
    }
    let spans = list.spans();
    if let (Some(first), Some(last)) = (spans.first(), spans.last()) {
        start[dim] = start[dim].min(first.low());
        end[dim] = end[dim].max(last.high());
    }
    for span in spans {
        if let Some(down) = span.down() {
            span_bounds(down, dim + 1, start, end, visited);
        }
    }
}

fn regular_is_contiguous(desc: &RegularDescriptor, dims: &[u64]) -> bool {
    let opt = desc.opt();
    let single = opt.iter().all(|info| info.count == 1);
    if !single {
        return false;
    }
    let large = opt
        .iter()
        .zip(dims)
        .skip(1)
        .all(|(info, &size)| info.start == 0 && info.block == size);
    let small = opt[..opt.len() - 1].iter().all(|info| info.block == 1);
    large || small
}

fn spans_are_contiguous(tree: &SpanTree, dims: &[u64]) -> bool {
    let Some(path) = single_path(tree) else {
        return false;
    };
    let large = path
        .iter()
        .zip(dims)
        .skip(1)
        .all(|(&(low, high), &size)| low == 0 && high + 1 == size);
    let small = path[..path.len() - 1].iter().all(|(low, high)| low == high);
    large || small
}

/// The `(low, high)` span of every level when each level holds exactly one.
fn single_path(tree: &SpanTree) -> Option<Vec<(u64, u64)>> {
    let mut path = Vec::new();
    let mut level = Some(tree);
    while let Some(list) = level {
        let [span] = list.spans() else {
            return None;
        };
        path.push((span.low(), span.high()));
        level = span.down();
    }
    Some(path)
}

fn dim_intersects(info: &DimInfo, start: u64, end: u64) -> bool {
    let first_end = info.start + info.block - 1;
    let idx = if start <= first_end {
        0
    } else {
        (start - first_end).div_ceil(info.stride)
    };
    idx < info.count && info.start + idx * info.stride <= end
}

fn spans_intersect(list: &SpanTree, dim: usize, start: &[u64], end: &[u64]) -> bool {
    list.spans()
        .iter()
        .skip_while(|span| span.high() < start[dim])
        .take_while(|span| span.low() <= end[dim])
        .any(|span| match span.down() {
            Some(down) => spans_intersect(down, dim + 1, start, end),
            None => true,
        })
}

impl Dataspace {
    /// Number of blocks of a hyperslab selection.
    pub fn nblocks(&self) -> Result<u64> {
        Ok(self.hyperslab()?.nblocks())
    }

    /// `count` blocks of a hyperslab selection starting with block `start`.
    pub fn block_list(&self, start: u64, count: u64) -> Result<Vec<Block>> {
        Ok(self.hyperslab()?.block_list(start, count))
    }

    /// Bounding block of the selection with the selection offset applied.
    /// The ALL selection ignores the offset.
    pub fn bounds(&self) -> Result<Block> {
        let bounds = match self.selection() {
            Selection::All => {
                let start = vec![0; self.rank()];
                let end = self.extent().dims().iter().map(|&d| d.saturating_sub(1)).collect();
                return Ok(Block::new(start, end));
            }
            Selection::Points(points) if !points.is_empty() => {
                let mut start = vec![u64::MAX; self.rank()];
                let mut end = vec![0u64; self.rank()];
                for point in points.iter() {
                    for (dim, &c) in point.iter().enumerate() {
                        start[dim] = start[dim].min(c);
                        end[dim] = end[dim].max(c);
                    }
                }
                Block::new(start, end)
            }
            Selection::Hyperslab(hyperslab) => match hyperslab.bounds() {
                Some(bounds) => bounds,
                None => return Err(Error::unsupported_op("bounds", "empty hyperslab")),
            },
            other => return Err(Error::unsupported_op("bounds", other.kind_name())),
        };
        let shift = |coords: &[u64]| -> Result<Vec<u64>> {
            coords
                .iter()
                .zip(self.offset())
                .enumerate()
                .map(|(dim, (&c, &off))| {
                    c.checked_add_signed(off).ok_or_else(|| {
                        Error::invalid_dim_arg("offset", dim, "moves the selection below zero")
                    })
                })
                .collect()
        };
        Ok(Block::new(shift(&bounds.start)?, shift(&bounds.end)?))
    }

    /// Whether the selection, moved by the selection offset, lies inside the
    /// extent.
    pub fn is_valid(&self) -> bool {
        let dims = self.extent().dims();
        match self.selection() {
            Selection::None | Selection::All => true,
            Selection::Points(points) => points.iter().all(|point| {
                point
                    .iter()
                    .zip(dims.iter().zip(self.offset()))
                    .all(|(&c, (&size, &off))| c.checked_add_signed(off).is_some_and(|c| c < size))
            }),
            Selection::Hyperslab(hyperslab) => hyperslab.is_valid(dims, self.offset()),
        }
    }

    pub fn is_contiguous(&self) -> bool {
        match self.selection() {
            Selection::None => false,
            Selection::All => true,
            Selection::Points(points) => points.len() == 1,
            Selection::Hyperslab(hyperslab) => hyperslab.is_contiguous(self.extent().dims()),
        }
    }

    pub fn is_single(&self) -> bool {
        match self.selection() {
            Selection::None => false,
            Selection::All => true,
            Selection::Points(points) => points.len() == 1,
            Selection::Hyperslab(hyperslab) => hyperslab.is_single(),
        }
    }

    pub fn is_regular(&self) -> bool {
        match self.selection() {
            Selection::None | Selection::All => true,
            Selection::Points(points) => points.len() == 1,
            Selection::Hyperslab(hyperslab) => hyperslab.is_regular(),
        }
    }

    /// Whether any selected element lies inside the inclusive block
    /// `[start, end]`, ignoring the selection offset.
    pub fn intersects_block(&self, start: &[u64], end: &[u64]) -> Result<bool> {
        check_block(start, end, self.rank())?;
        match self.selection() {
            Selection::None => Ok(false),
            Selection::All => Ok(start
                .iter()
                .zip(self.extent().dims())
                .all(|(&s, &size)| s < size)),
            Selection::Points(points) => {
                let block = Block::new(start.to_vec(), end.to_vec());
                Ok(points.iter().any(|point| block.contains(point)))
            }
            Selection::Hyperslab(hyperslab) => hyperslab.intersects_block(start, end),
        }
    }
}
