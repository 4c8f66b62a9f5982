//! Hyperslab selections over N-dimensional dataspaces.
//!
//! A hyperslab is a regular grid of N-dimensional blocks described per
//! dimension by `(start, stride, count, block)`. Selections are built by
//! combining hyperslabs with set operators (SET, OR, AND, XOR, NOTB, NOTA) and
//! are stored either in that compact regular form or as a span tree, a
//! recursive per-dimension interval structure whose sub-trees are shared.
//!
//! # Key Types
//!
//! - [`Dataspace`] - An extent with its current selection and selection offset
//! - [`HyperslabSelection`] - A hyperslab selection in regular or span-tree form
//! - [`SpanTree`] - Shared, immutable span lists of an irregular selection
//! - [`SelectionIter`] - Row-major traversal of a selection, element by element
//!   or as `(offset, length)` byte runs via [`SelectionIter::get_seq_list`]
//!
//! Selections are persisted as little-endian block lists (see [`serial`]).

pub mod block;
pub mod clip;
pub mod extent;
pub mod iter;
pub mod merge;
pub mod query;
pub mod rebuild;
pub mod regular;
pub mod selection;
pub mod sequence;
pub mod serial;
pub mod span;

pub use block::Block;
pub use extent::{Extent, MAX_RANK};
pub use iter::{IterOptions, SelectionIter};
pub use regular::{DimInfo, RegularDescriptor};
pub use selection::{Dataspace, Hyperslab, HyperslabSelection, PointList, SelectOp, Selection};
pub use sequence::{SeqList, SeqListLimits};
pub use span::{Span, SpanTree};

#[cfg(test)]
mod tests;
