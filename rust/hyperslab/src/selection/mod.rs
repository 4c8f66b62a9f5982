//! Dataspace selections and the hyperslab operator state machine.
//!
//! A [`Dataspace`] pairs an [`Extent`] with the current [`Selection`] and a
//! per-dimension selection offset. Hyperslab selections carry either a
//! [`RegularDescriptor`] or an irregular [`SpanTree`]; every operator
//! application replaces the selection wholesale and tries to demote the
//! combined span tree back to the regular form.

use std::fmt;

use hyperslab_common::{Result, error::Error};
use log::debug;

use crate::{
    extent::{Extent, check_rank},
    rebuild::rebuild,
    regular::RegularDescriptor,
    span::SpanTree,
};

mod adjust;
mod operate;

/// Operator applied by [`Dataspace::select_hyperslab`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectOp {
    /// Replace the selection.
    Set,
    /// Union with the selection.
    Or,
    /// Intersection with the selection.
    And,
    /// Symmetric difference with the selection.
    Xor,
    /// Elements of the selection that are not in the new hyperslab.
    NotB,
    /// Elements of the new hyperslab that are not in the selection.
    NotA,
}

impl fmt::Display for SelectOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SelectOp::Set => "SET",
            SelectOp::Or => "OR",
            SelectOp::And => "AND",
            SelectOp::Xor => "XOR",
            SelectOp::NotB => "NOTB",
            SelectOp::NotA => "NOTA",
        };
        f.write_str(name)
    }
}

/// Storage of a hyperslab selection.
#[derive(Debug, Clone)]
pub enum Hyperslab {
    /// The selection is exactly one regular grid of blocks.
    Regular(RegularDescriptor),
    /// Anything else, including the empty selection.
    Irregular(SpanTree),
}

/// A hyperslab selection with its cached element count.
#[derive(Debug, Clone)]
pub struct HyperslabSelection {
    rank: usize,
    layout: Hyperslab,
    num_elem: u64,
}

impl HyperslabSelection {
    pub fn regular(desc: RegularDescriptor) -> HyperslabSelection {
        HyperslabSelection {
            rank: desc.rank(),
            num_elem: desc.npoints(),
            layout: Hyperslab::Regular(desc),
        }
    }

    /// Installs a span tree of the given rank, demoting it to the regular form
    /// when possible.
    pub fn from_spans(rank: usize, tree: SpanTree) -> HyperslabSelection {
        let num_elem = tree.nelem();
        HyperslabSelection::from_spans_with_count(rank, tree, num_elem)
    }

    pub(crate) fn from_spans_with_count(
        rank: usize,
        tree: SpanTree,
        num_elem: u64,
    ) -> HyperslabSelection {
        debug_assert_eq!(num_elem, tree.nelem());
        debug_assert!(tree.is_empty() || tree.depth() == rank);
        let layout = match rebuild(&tree) {
            Some(desc) => {
                debug!("span tree with {num_elem} elements rebuilt as regular hyperslab");
                Hyperslab::Regular(desc)
            }
            None => Hyperslab::Irregular(tree),
        };
        HyperslabSelection {
            rank,
            layout,
            num_elem,
        }
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.rank
    }

    #[inline]
    pub fn layout(&self) -> &Hyperslab {
        &self.layout
    }

    pub fn regular_descriptor(&self) -> Option<&RegularDescriptor> {
        match &self.layout {
            Hyperslab::Regular(desc) => Some(desc),
            Hyperslab::Irregular(_) => None,
        }
    }

    /// Number of selected elements.
    #[inline]
    pub fn npoints(&self) -> u64 {
        self.num_elem
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_elem == 0
    }

    /// Span tree of the selection; built on demand for regular selections.
    pub fn spans(&self) -> SpanTree {
        match &self.layout {
            Hyperslab::Regular(desc) => desc.make_spans(),
            Hyperslab::Irregular(tree) => tree.clone(),
        }
    }

    /// Copy that shares nothing with `self`.
    pub fn deep_copy(&self) -> Result<HyperslabSelection> {
        let layout = match &self.layout {
            Hyperslab::Regular(desc) => Hyperslab::Regular(desc.clone()),
            Hyperslab::Irregular(tree) => Hyperslab::Irregular(tree.copy()?),
        };
        Ok(HyperslabSelection {
            rank: self.rank,
            layout,
            num_elem: self.num_elem,
        })
    }
}

/// Explicit list of selected elements, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PointList {
    coords: Vec<Vec<u64>>,
}

impl PointList {
    #[inline]
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u64]> {
        self.coords.iter().map(Vec::as_slice)
    }
}

/// The current selection of a dataspace.
#[derive(Debug, Clone)]
pub enum Selection {
    None,
    All,
    Points(PointList),
    Hyperslab(HyperslabSelection),
}

impl Selection {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Selection::None => "none",
            Selection::All => "all",
            Selection::Points(_) => "point",
            Selection::Hyperslab(_) => "hyperslab",
        }
    }
}

/// An extent together with its current selection and selection offset.
///
/// Cloning a dataspace shares the span tree of an irregular selection.
#[derive(Debug, Clone)]
pub struct Dataspace {
    extent: Extent,
    offset: Vec<i64>,
    selection: Selection,
}

impl Dataspace {
    /// Creates a dataspace over `dims` with every element selected.
    pub fn new(dims: &[u64]) -> Result<Dataspace> {
        let extent = Extent::new(dims)?;
        Ok(Dataspace {
            offset: vec![0; extent.rank()],
            extent,
            selection: Selection::All,
        })
    }

    #[inline]
    pub fn extent(&self) -> &Extent {
        &self.extent
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.extent.rank()
    }

    #[inline]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Per-dimension offset applied to the selection when it is mapped onto
    /// the extent.
    #[inline]
    pub fn offset(&self) -> &[i64] {
        &self.offset
    }

    pub fn has_offset(&self) -> bool {
        self.offset.iter().any(|&o| o != 0)
    }

    pub fn set_offset(&mut self, offset: &[i64]) -> Result<()> {
        check_rank("offset", offset, self.rank())?;
        self.offset.copy_from_slice(offset);
        Ok(())
    }

    pub fn select_all(&mut self) {
        self.selection = Selection::All;
    }

    pub fn select_none(&mut self) {
        self.selection = Selection::None;
    }

    /// Replaces the selection with an explicit list of elements.
    pub fn select_elements(&mut self, coords: Vec<Vec<u64>>) -> Result<()> {
        for (i, point) in coords.iter().enumerate() {
            self.check_point(&format!("coords[{i}]"), point)?;
        }
        self.selection = Selection::Points(PointList { coords });
        Ok(())
    }

    /// Checks that `point` has the dataspace rank and lies inside the extent.
    pub(crate) fn check_point(&self, name: &str, point: &[u64]) -> Result<()> {
        check_rank(name, point, self.rank())?;
        if let Some(dim) = point
            .iter()
            .zip(self.extent.dims())
            .position(|(c, size)| c >= size)
        {
            return Err(Error::invalid_dim_arg(
                name,
                dim,
                format!("index {} lies outside the extent", point[dim]),
            ));
        }
        Ok(())
    }

    /// Number of selected elements, whatever the kind of selection.
    pub fn npoints(&self) -> u64 {
        match &self.selection {
            Selection::None => 0,
            Selection::All => self.extent.npoints(),
            Selection::Points(points) => points.len() as u64,
            Selection::Hyperslab(hyperslab) => hyperslab.npoints(),
        }
    }

    /// The hyperslab selection, or `UnsupportedOperation` for other kinds.
    pub fn hyperslab(&self) -> Result<&HyperslabSelection> {
        match &self.selection {
            Selection::Hyperslab(hyperslab) => Ok(hyperslab),
            other => Err(Error::unsupported_op("hyperslab query", other.kind_name())),
        }
    }

    /// Copy whose selection shares nothing with `self`.
    pub fn deep_copy(&self) -> Result<Dataspace> {
        let selection = match &self.selection {
            Selection::Hyperslab(hyperslab) => Selection::Hyperslab(hyperslab.deep_copy()?),
            other => other.clone(),
        };
        Ok(Dataspace {
            extent: self.extent.clone(),
            offset: self.offset.clone(),
            selection,
        })
    }

    pub(crate) fn install(&mut self, selection: Selection) {
        self.selection = selection;
    }

    pub(crate) fn into_selection(self) -> Selection {
        self.selection
    }
}
