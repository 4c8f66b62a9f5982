//! Element-by-element traversal of a selection in row-major order.
//!
//! A [`SelectionIter`] keeps its own position state and, for irregular
//! selections, its own byte-scaled copy of the span tree, so several iterators
//! over one selection never observe each other's progress.
//!
//! Regular selections are walked in closed form: every (possibly flattened)
//! dimension tracks the ordinal of the current element among the elements that
//! dimension selects, and advancing is a mixed-radix carry across those
//! ordinals. Irregular selections are walked span by span with per-dimension
//! current spans and absolute positions.

use std::ops::Range;

use hyperslab_common::{Result, error::Error, verify_arg};
use itertools::Either;

use crate::{
    extent::row_strides,
    regular::{DimInfo, RegularDescriptor},
    selection::{Dataspace, Hyperslab, Selection},
    span::{Span, SpanTree},
};

/// Iterator construction options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterOptions {
    /// Fold dimensions a regular selection covers entirely into their slower
    /// neighbor, so whole rows (or planes) are walked as single runs.
    pub flatten: bool,
}

impl Default for IterOptions {
    fn default() -> Self {
        IterOptions { flatten: true }
    }
}

/// Position within a selection, together with the number of elements left.
#[derive(Debug)]
pub struct SelectionIter {
    pub(crate) elem_size: u64,
    pub(crate) elmt_left: u64,
    pub(crate) dims: Vec<u64>,
    /// Row-major strides of the extent, in elements.
    pub(crate) strides: Vec<u64>,
    /// The selection offset, linearized over `strides`.
    pub(crate) base: i64,
    pub(crate) state: IterState,
}

#[derive(Debug)]
pub(crate) enum IterState {
    Empty,
    Regular(RegularCursor),
    Spans(SpanCursor),
}

impl SelectionIter {
    pub(crate) fn new(
        dims: &[u64],
        offset: &[i64],
        elem_size: u64,
        elmt_left: u64,
        state: IterState,
    ) -> SelectionIter {
        let strides = row_strides(dims, 1);
        let base = offset
            .iter()
            .zip(&strides)
            .fold(0i64, |acc, (&off, &stride)| {
                acc.wrapping_add(off.wrapping_mul(stride as i64))
            });
        SelectionIter {
            elem_size,
            elmt_left,
            dims: dims.to_vec(),
            strides,
            base,
            state,
        }
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    #[inline]
    pub fn elem_size(&self) -> u64 {
        self.elem_size
    }

    /// Number of elements not yet visited.
    #[inline]
    pub fn nelmts(&self) -> u64 {
        self.elmt_left
    }

    /// Coordinates of the current element (without the selection offset).
    pub fn coords(&self) -> Result<Vec<u64>> {
        self.ensure_remaining("coords")?;
        Ok(match &self.state {
            IterState::Empty => Vec::new(),
            IterState::Regular(cursor) => cursor.coords(&self.dims),
            IterState::Spans(cursor) => cursor.off.clone(),
        })
    }

    /// Box from the current element to the last element of its run along the
    /// fastest dimension. At a run boundary this is the whole run.
    pub fn block(&self) -> Result<(Vec<u64>, Vec<u64>)> {
        self.ensure_remaining("block")?;
        Ok(match &self.state {
            IterState::Empty => (Vec::new(), Vec::new()),
            IterState::Regular(cursor) => (cursor.coords(&self.dims), cursor.run_end(&self.dims)),
            IterState::Spans(cursor) => {
                let mut end = cursor.off.clone();
                if let Some(last) = end.last_mut() {
                    *last = cursor.current(cursor.fastest()).high;
                }
                (cursor.off.clone(), end)
            }
        })
    }

    /// Whether another run follows the current one.
    pub fn has_next_block(&self) -> bool {
        self.elmt_left > self.run_left()
    }

    /// Advances by `n` elements.
    pub fn next(&mut self, n: u64) -> Result<()> {
        if n > self.elmt_left {
            return Err(Error::invalid_arg(
                "n",
                format!("cannot advance {n} elements, {} left", self.elmt_left),
            ));
        }
        if n == 0 {
            return Ok(());
        }
        self.elmt_left -= n;
        if self.elmt_left == 0 {
            self.state = IterState::Empty;
            return Ok(());
        }
        match &mut self.state {
            IterState::Empty => {}
            IterState::Regular(cursor) => cursor.advance(n),
            IterState::Spans(cursor) => cursor.advance(n),
        }
        Ok(())
    }

    /// Moves to the start of the next run, consuming the rest of the current
    /// one.
    pub fn next_block(&mut self) -> Result<()> {
        self.ensure_remaining("next block")?;
        self.next(self.run_left())
    }

    /// Drops the iterator's position state and private span tree copy.
    pub fn release(&mut self) {
        self.state = IterState::Empty;
        self.elmt_left = 0;
    }

    /// Turns the iterator into an iterator over the remaining coordinates.
    pub fn into_coords(self) -> Coords {
        Coords { iter: self }
    }

    /// Elements left in the current run along the fastest dimension.
    pub(crate) fn run_left(&self) -> u64 {
        match &self.state {
            IterState::Empty => 0,
            IterState::Regular(cursor) => cursor.run_left(),
            IterState::Spans(cursor) => {
                let fast = cursor.fastest();
                cursor.current(fast).high - cursor.off[fast] + 1
            }
        }
    }

    fn ensure_remaining(&self, op: &str) -> Result<()> {
        if self.elmt_left == 0 {
            return Err(Error::invalid_arg(op, "the iterator has no elements left"));
        }
        Ok(())
    }
}

/// Coordinates of every element left in a [`SelectionIter`].
#[derive(Debug)]
pub struct Coords {
    iter: SelectionIter,
}

impl Iterator for Coords {
    type Item = Vec<u64>;

    fn next(&mut self) -> Option<Vec<u64>> {
        let coords = self.iter.coords().ok()?;
        self.iter.next(1).ok()?;
        Some(coords)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = usize::try_from(self.iter.nelmts()).unwrap_or(usize::MAX);
        (left, Some(left))
    }
}

/// Closed-form position within a regular pattern.
#[derive(Debug)]
pub(crate) struct RegularCursor {
    /// Pattern over the flattened dimensions.
    pub(crate) flat: Vec<DimInfo>,
    /// Extent dimensions folded into each flattened dimension.
    pub(crate) groups: Vec<Range<usize>>,
    /// Ordinal of the current element among those selected in each
    /// flattened dimension.
    pub(crate) ord: Vec<u64>,
}

impl RegularCursor {
    pub(crate) fn new(desc: &RegularDescriptor, dims: &[u64], flatten: bool) -> RegularCursor {
        let opt = desc.opt();
        let mut flat = Vec::with_capacity(opt.len());
        let mut groups = Vec::with_capacity(opt.len());
        let mut acc = 1u64;
        let mut end = opt.len();
        for (dim, info) in opt.iter().enumerate().rev() {
            let whole = info.count == 1 && info.start == 0 && info.block == dims[dim];
            if flatten && dim > 0 && whole {
                acc *= dims[dim];
                continue;
            }
            flat.push(DimInfo::new(
                info.start * acc,
                info.stride * acc,
                info.count,
                info.block * acc,
            ));
            groups.push(dim..end);
            end = dim;
            acc = 1;
        }
        flat.reverse();
        groups.reverse();
        RegularCursor {
            ord: vec![0; flat.len()],
            flat,
            groups,
        }
    }

    /// Current index in flattened dimension `f`.
    #[inline]
    pub(crate) fn position(&self, f: usize) -> u64 {
        let info = &self.flat[f];
        let ord = self.ord[f];
        info.start + (ord / info.block) * info.stride + ord % info.block
    }

    #[inline]
    pub(crate) fn fastest(&self) -> usize {
        self.flat.len() - 1
    }

    pub(crate) fn run_left(&self) -> u64 {
        let fast = self.fastest();
        let block = self.flat[fast].block;
        block - self.ord[fast] % block
    }

    pub(crate) fn advance(&mut self, n: u64) {
        let mut carry = n;
        for (info, ord) in self.flat.iter().zip(self.ord.iter_mut()).rev() {
            if carry == 0 {
                break;
            }
            let total = info.count * info.block;
            let next = *ord + carry;
            *ord = next % total;
            carry = next / total;
        }
    }

    fn coords(&self, dims: &[u64]) -> Vec<u64> {
        let positions = (0..self.flat.len()).map(|f| self.position(f)).collect::<Vec<_>>();
        self.unflatten(&positions, dims)
    }

    fn run_end(&self, dims: &[u64]) -> Vec<u64> {
        let mut positions = (0..self.flat.len()).map(|f| self.position(f)).collect::<Vec<_>>();
        if let Some(last) = positions.last_mut() {
            *last += self.run_left() - 1;
        }
        self.unflatten(&positions, dims)
    }

    /// Mixed-radix decomposition of flattened indices into extent coordinates.
    fn unflatten(&self, positions: &[u64], dims: &[u64]) -> Vec<u64> {
        let mut coords = vec![0u64; dims.len()];
        for (group, &position) in self.groups.iter().zip(positions) {
            let mut rest = position;
            for dim in group.clone().skip(1).rev() {
                coords[dim] = rest % dims[dim];
                rest /= dims[dim];
            }
            coords[group.start] = rest;
        }
        coords
    }
}

/// Position within a span tree: the current list, span and index per
/// dimension.
#[derive(Debug)]
pub(crate) struct SpanCursor {
    pub(crate) lists: Vec<SpanTree>,
    pub(crate) idx: Vec<usize>,
    pub(crate) off: Vec<u64>,
}

impl SpanCursor {
    /// Positions a cursor on the first element of a non-empty tree.
    pub(crate) fn new(tree: SpanTree, rank: usize) -> SpanCursor {
        let mut cursor = SpanCursor {
            lists: Vec::with_capacity(rank),
            idx: vec![0; rank],
            off: vec![0; rank],
        };
        cursor.off[0] = tree.first().map_or(0, Span::low);
        cursor.lists.push(tree);
        cursor.reset_below(0);
        cursor
    }

    #[inline]
    pub(crate) fn fastest(&self) -> usize {
        self.off.len() - 1
    }

    #[inline]
    pub(crate) fn current(&self, dim: usize) -> &Span {
        &self.lists[dim].spans()[self.idx[dim]]
    }

    /// Places every dimension faster than `dim` on the first element of the
    /// sub-tree under the current span of `dim`.
    pub(crate) fn reset_below(&mut self, dim: usize) {
        for d in dim + 1..self.off.len() {
            let Some(down) = self.current(d - 1).down.clone() else {
                break;
            };
            self.off[d] = down.first().map_or(0, Span::low);
            self.idx[d] = 0;
            if d < self.lists.len() {
                self.lists[d] = down;
            } else {
                self.lists.push(down);
            }
        }
    }

    /// Moves dimension `dim` to its next selected index, carrying into slower
    /// dimensions. Returns `false` once the whole tree is exhausted.
    pub(crate) fn step(&mut self, dim: usize) -> bool {
        let mut d = dim;
        loop {
            let span = self.current(d);
            if self.off[d] < span.high {
                self.off[d] += 1;
                break;
            }
            if self.idx[d] + 1 < self.lists[d].len() {
                self.idx[d] += 1;
                self.off[d] = self.current(d).low;
                break;
            }
            if d == 0 {
                return false;
            }
            d -= 1;
        }
        self.reset_below(d);
        true
    }

    pub(crate) fn advance(&mut self, mut n: u64) {
        let fast = self.fastest();
        while n > 0 {
            let high = self.current(fast).high;
            let left = high - self.off[fast] + 1;
            if n < left {
                self.off[fast] += n;
                return;
            }
            n -= left;
            self.off[fast] = high;
            if !self.step(fast) {
                return;
            }
        }
    }
}

impl Dataspace {
    /// Starts an iteration over the selection for elements of `elem_size`
    /// bytes.
    ///
    /// A hyperslab selection must lie inside the extent once the selection
    /// offset is applied. The ALL selection ignores the offset.
    pub fn iter(&self, elem_size: u64, options: IterOptions) -> Result<SelectionIter> {
        verify_arg!(elem_size, elem_size > 0);
        let dims = self.extent().dims();
        let zeros = vec![0i64; dims.len()];
        let iter = match self.selection() {
            Selection::None => SelectionIter::new(dims, &zeros, elem_size, 0, IterState::Empty),
            Selection::All => {
                let cursor = RegularCursor::new(&RegularDescriptor::full(dims), dims, options.flatten);
                SelectionIter::new(
                    dims,
                    &zeros,
                    elem_size,
                    self.extent().npoints(),
                    IterState::Regular(cursor),
                )
            }
            Selection::Points(_) => return Err(Error::unsupported_op("iterate", "point")),
            Selection::Hyperslab(hyperslab) => {
                if !hyperslab.is_valid(dims, self.offset()) {
                    return Err(Error::invalid_arg(
                        "offset",
                        "selection does not lie inside the extent",
                    ));
                }
                let state = match hyperslab.layout() {
                    _ if hyperslab.is_empty() => IterState::Empty,
                    Hyperslab::Regular(desc) => {
                        IterState::Regular(RegularCursor::new(desc, dims, options.flatten))
                    }
                    Hyperslab::Irregular(tree) => {
                        let private = tree.precompute_bytes(elem_size)?;
                        IterState::Spans(SpanCursor::new(private, dims.len()))
                    }
                };
                SelectionIter::new(
                    dims,
                    self.offset(),
                    elem_size,
                    hyperslab.npoints(),
                    state,
                )
            }
        };
        Ok(iter)
    }

    /// Every selected coordinate: in insertion order for point selections,
    /// row-major order otherwise.
    pub fn points(&self) -> Result<impl Iterator<Item = Vec<u64>> + '_> {
        match self.selection() {
            Selection::Points(points) => Ok(Either::Left(points.iter().map(<[u64]>::to_vec))),
            _ => Ok(Either::Right(
                self.iter(1, IterOptions::default())?.into_coords(),
            )),
        }
    }
}
