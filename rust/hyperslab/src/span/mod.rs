//! Span trees: the recursive per-dimension interval representation of
//! irregular hyperslab selections.
//!
//! A [`SpanTree`] is a shared handle to an ascending list of [`Span`]s covering
//! one dimension. Each span of a non-leaf list owns (or shares) a sub-tree
//! describing the next, faster-changing dimension for every index in
//! `[low, high]`. Lists are immutable once published; identical sub-trees are
//! shared between parents through reference counting, and the list is released
//! when the last parent drops its handle.
//!
//! Invariants of a well-formed list:
//! - spans are sorted by `low` and non-overlapping (`prev.high < next.low`);
//! - two adjacent spans (`prev.high + 1 == next.low`) never have structurally
//!   equal sub-trees (they would have been coalesced);
//! - every span of a list has a sub-tree, or none of them do;
//! - sub-trees are never empty.

use std::rc::Rc;

use hyperslab_common::Result;

use crate::block::Block;

pub(crate) mod builder;
pub(crate) mod scratch;

pub(crate) use builder::SpanListBuilder;

/// One contiguous interval `[low, high]` of indices in a single dimension.
#[derive(Debug, Clone)]
pub struct Span {
    pub(crate) low: u64,
    pub(crate) high: u64,
    /// Number of indices in the span (`high - low + 1`); scaled to bytes in
    /// a tree produced by [`SpanTree::precompute_bytes`].
    pub(crate) nelem: u64,
    /// Distance from the previous sibling's `low` (zero for the first span);
    /// scaled to bytes in a tree produced by [`SpanTree::precompute_bytes`].
    pub(crate) pstride: u64,
    pub(crate) down: Option<SpanTree>,
}

impl Span {
    /// Creates a span, sharing `down` with any other parent holding it.
    pub fn new(low: u64, high: u64, down: Option<SpanTree>) -> Span {
        debug_assert!(low <= high);
        Span {
            low,
            high,
            nelem: high - low + 1,
            pstride: 0,
            down,
        }
    }

    #[inline]
    pub fn low(&self) -> u64 {
        self.low
    }

    #[inline]
    pub fn high(&self) -> u64 {
        self.high
    }

    #[inline]
    pub fn nelem(&self) -> u64 {
        self.nelem
    }

    #[inline]
    pub fn pstride(&self) -> u64 {
        self.pstride
    }

    #[inline]
    pub fn down(&self) -> Option<&SpanTree> {
        self.down.as_ref()
    }

    /// Number of indices covered in this dimension.
    #[inline]
    pub fn len(&self) -> u64 {
        self.high - self.low + 1
    }

    /// Copy of the span's own fields, without the sub-tree.
    #[inline]
    pub(crate) fn detached(&self) -> Span {
        Span {
            low: self.low,
            high: self.high,
            nelem: self.nelem,
            pstride: self.pstride,
            down: None,
        }
    }
}

/// Sibling list of spans for one dimension.
#[derive(Debug)]
pub struct SpanList {
    spans: Vec<Span>,
}

/// Shared, immutable handle to a [`SpanList`] and (through its spans) the
/// sub-trees of all faster dimensions.
///
/// Cloning the handle shares the list and bumps its reference count; dropping
/// the last handle releases the list and, in cascade, every sub-tree no
/// longer referenced from elsewhere.
#[derive(Debug, Clone)]
pub struct SpanTree(Rc<SpanList>);

impl SpanTree {
    /// Tree selecting nothing.
    pub fn empty() -> SpanTree {
        SpanTree(Rc::new(SpanList { spans: Vec::new() }))
    }

    /// Builds a list from ascending, non-overlapping spans, computing their
    /// `nelem` and `pstride` fields.
    pub fn from_spans(mut spans: Vec<Span>) -> SpanTree {
        let mut prev_low = None;
        for span in spans.iter_mut() {
            span.nelem = span.high - span.low + 1;
            span.pstride = prev_low.map_or(0, |low| span.low - low);
            prev_low = Some(span.low);
        }
        SpanTree::from_raw(spans)
    }

    /// Wraps spans whose `nelem` and `pstride` fields are already final.
    pub(crate) fn from_raw(spans: Vec<Span>) -> SpanTree {
        let tree = SpanTree(Rc::new(SpanList { spans }));
        #[cfg(debug_assertions)]
        tree.check_list_invariants();
        tree
    }

    /// Tree selecting the single element at `coords`.
    pub fn point(coords: &[u64]) -> SpanTree {
        let mut down = None;
        for &c in coords.iter().rev() {
            down = Some(SpanTree::from_spans(vec![Span::new(c, c, down)]));
        }
        down.unwrap_or_else(SpanTree::empty)
    }

    #[inline]
    pub fn spans(&self) -> &[Span] {
        &self.0.spans
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.spans.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.spans.is_empty()
    }

    #[inline]
    pub fn first(&self) -> Option<&Span> {
        self.0.spans.first()
    }

    /// Number of handles currently sharing this list.
    #[inline]
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    #[inline]
    pub fn ptr_eq(a: &SpanTree, b: &SpanTree) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    #[inline]
    pub(crate) fn as_ptr(&self) -> *const SpanList {
        Rc::as_ptr(&self.0)
    }

    /// Number of dimensions the tree describes (zero for an empty tree).
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut level = Some(self);
        while let Some(list) = level {
            match list.first() {
                Some(span) => {
                    depth += 1;
                    level = span.down();
                }
                None => break,
            }
        }
        depth
    }

    /// Recursive comparison of the interval structure, ignoring `nelem` and
    /// `pstride` scaling. Identical handles compare equal without a walk.
    pub fn structurally_eq(&self, other: &SpanTree) -> bool {
        if SpanTree::ptr_eq(self, other) {
            return true;
        }
        self.len() == other.len()
            && self.spans().iter().zip(other.spans()).all(|(a, b)| {
                a.low == b.low && a.high == b.high && same_tree(a.down(), b.down())
            })
    }

    /// Number of elements selected by the tree.
    pub fn nelem(&self) -> u64 {
        self.spans()
            .iter()
            .map(|span| span.len() * span.down().map_or(1, SpanTree::nelem))
            .sum()
    }

    /// Number of blocks (root-to-leaf span paths) in the tree.
    pub fn nblocks(&self) -> u64 {
        self.spans()
            .iter()
            .map(|span| span.down().map_or(1, SpanTree::nblocks))
            .sum()
    }

    /// Enumerates blocks in ascending (row-major) order of their start corner.
    pub fn blocks(&self) -> SpanBlocks {
        SpanBlocks::new(self)
    }

    /// Deep copy of the tree. Sub-trees shared inside the source stay shared
    /// (once each) inside the copy.
    pub fn copy(&self) -> Result<SpanTree> {
        scratch::rewrite(self, &mut |_, span| Ok(span.detached()))
    }

    /// Copy of the tree with every `nelem` and `pstride` multiplied by
    /// `elem_size`, turning index distances into byte distances. Each distinct
    /// list is scaled exactly once even when shared by several parents.
    pub fn precompute_bytes(&self, elem_size: u64) -> Result<SpanTree> {
        scratch::rewrite(self, &mut |_, span| {
            let mut scaled = span.detached();
            scaled.nelem *= elem_size;
            scaled.pstride *= elem_size;
            Ok(scaled)
        })
    }

    #[cfg(debug_assertions)]
    fn check_list_invariants(&self) {
        let spans = self.spans();
        let leaf = spans.first().is_none_or(|s| s.down.is_none());
        for (i, span) in spans.iter().enumerate() {
            assert!(span.low <= span.high);
            assert_eq!(span.down.is_none(), leaf);
            if let Some(down) = &span.down {
                assert!(!down.is_empty());
            }
            if i > 0 {
                let prev = &spans[i - 1];
                assert!(prev.high < span.low);
            }
        }
    }
}

/// Structural equality of two optional sub-trees; `None` only equals `None`.
pub(crate) fn same_tree(a: Option<&SpanTree>, b: Option<&SpanTree>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.structurally_eq(b),
        _ => false,
    }
}

/// Odometer over the root-to-leaf paths of a span tree.
pub struct SpanBlocks {
    lists: Vec<SpanTree>,
    idx: Vec<usize>,
}

impl SpanBlocks {
    fn new(tree: &SpanTree) -> SpanBlocks {
        let mut blocks = SpanBlocks {
            lists: Vec::new(),
            idx: Vec::new(),
        };
        if !tree.is_empty() {
            blocks.lists.push(tree.clone());
            blocks.idx.push(0);
            blocks.descend();
        }
        blocks
    }

    fn current(&self, dim: usize) -> &Span {
        &self.lists[dim].spans()[self.idx[dim]]
    }

    fn descend(&mut self) {
        while let Some(down) = self.current(self.lists.len() - 1).down.clone() {
            self.lists.push(down);
            self.idx.push(0);
        }
    }
}

impl Iterator for SpanBlocks {
    type Item = Block;

    fn next(&mut self) -> Option<Block> {
        if self.lists.is_empty() {
            return None;
        }
        let rank = self.lists.len();
        let start = (0..rank).map(|d| self.current(d).low).collect();
        let end = (0..rank).map(|d| self.current(d).high).collect();

        while let Some(dim) = self.lists.len().checked_sub(1) {
            if self.idx[dim] + 1 < self.lists[dim].len() {
                self.idx[dim] += 1;
                self.descend();
                break;
            }
            self.lists.pop();
            self.idx.pop();
        }
        Some(Block::new(start, end))
    }
}
