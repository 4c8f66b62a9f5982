use hyperslab_common::{Result, error::Error};
use itertools::izip;
use log::debug;

use super::{Dataspace, HyperslabSelection, SelectOp, Selection};
use crate::{
    clip::{ClipResult, clip},
    extent::check_rank,
    merge::merge,
    regular::{DimInfo, RegularDescriptor},
    span::SpanTree,
};

/// What an operator amounts to given the current selection.
enum Plan {
    /// The selection stays as it is.
    Keep,
    /// The new hyperslab replaces the selection.
    Replace,
    /// The new hyperslab is combined with an existing hyperslab selection.
    Combine(SelectOp, HyperslabSelection),
}

impl Dataspace {
    /// Applies `op` with the hyperslab described by `start`, `stride`, `count`
    /// and `block` (stride and block default to ones).
    ///
    /// On error the current selection is left untouched.
    pub fn select_hyperslab(
        &mut self,
        op: SelectOp,
        start: &[u64],
        stride: Option<&[u64]>,
        count: &[u64],
        block: Option<&[u64]>,
    ) -> Result<()> {
        let rank = self.rank();
        check_rank("start", start, rank)?;
        check_rank("count", count, rank)?;
        let ones = vec![1u64; rank];
        let stride = stride.unwrap_or(&ones);
        let block = block.unwrap_or(&ones);
        check_rank("stride", stride, rank)?;
        check_rank("block", block, rank)?;

        if let Some(dim) = stride.iter().position(|&s| s == 0) {
            return Err(Error::invalid_dim_arg("stride", dim, "stride must be non-zero"));
        }

        if count.contains(&0) || block.contains(&0) {
            match op {
                SelectOp::Set | SelectOp::And | SelectOp::NotA => self.select_none(),
                SelectOp::Or | SelectOp::Xor | SelectOp::NotB => (),
            }
            debug!("{op} with an empty hyperslab: selection is now {}", self.selection.kind_name());
            return Ok(());
        }

        let diminfo = izip!(start, stride, count, block)
            .map(|(&start, &stride, &count, &block)| DimInfo::new(start, stride, count, block))
            .collect();
        let desc = RegularDescriptor::new(diminfo)?;

        let selection = match self.plan(op)? {
            Plan::Keep => return Ok(()),
            Plan::Replace => HyperslabSelection::regular(desc),
            Plan::Combine(op, existing) => existing.operate(op, &desc.make_spans())?,
        };
        debug!(
            "{op}: hyperslab selection with {} elements ({})",
            selection.npoints(),
            if selection.regular_descriptor().is_some() { "regular" } else { "irregular" }
        );
        self.install(Selection::Hyperslab(selection));
        Ok(())
    }

    /// Returns a copy of the dataspace with `op` applied, leaving `self` as is.
    pub fn combine_hyperslab(
        &self,
        op: SelectOp,
        start: &[u64],
        stride: Option<&[u64]>,
        count: &[u64],
        block: Option<&[u64]>,
    ) -> Result<Dataspace> {
        let mut combined = self.clone();
        combined.select_hyperslab(op, start, stride, count, block)?;
        Ok(combined)
    }

    /// Combines the hyperslab selections of two dataspaces of equal rank into
    /// a new dataspace with the extent and offset of `self`.
    pub fn combine_select(&self, op: SelectOp, other: &Dataspace) -> Result<Dataspace> {
        if self.rank() != other.rank() {
            return Err(Error::rank_mismatch("other", self.rank(), other.rank()));
        }
        let a = self.hyperslab()?;
        let b = other.hyperslab()?;
        let selection = match op {
            SelectOp::Set => b.clone(),
            _ => a.operate(op, &b.spans())?,
        };
        let mut combined = self.clone();
        combined.install(Selection::Hyperslab(selection));
        Ok(combined)
    }

    fn plan(&self, op: SelectOp) -> Result<Plan> {
        use SelectOp::*;
        let plan = match (&self.selection, op) {
            (_, Set) => Plan::Replace,
            (Selection::None, Or | Xor | NotA) => Plan::Replace,
            (Selection::None, And | NotB) => Plan::Keep,
            (Selection::All, Or) => Plan::Keep,
            (Selection::All, And) => Plan::Replace,
            (Selection::All, Xor | NotB | NotA) => Plan::Combine(
                op,
                HyperslabSelection::regular(RegularDescriptor::full(self.extent.dims())),
            ),
            (Selection::Points(_), _) => {
                return Err(Error::unsupported_op(op.to_string(), "point"));
            }
            (Selection::Hyperslab(existing), _) => Plan::Combine(op, existing.clone()),
        };
        Ok(plan)
    }
}

impl HyperslabSelection {
    /// Combines the selection (`a`) with the span tree `b` of equal rank.
    pub fn operate(&self, op: SelectOp, b: &SpanTree) -> Result<HyperslabSelection> {
        if !b.is_empty() && b.depth() != self.rank {
            return Err(Error::rank_mismatch("hyperslab", self.rank, b.depth()));
        }
        let a = self.spans();
        let ClipResult {
            a_not_b,
            a_and_b,
            b_not_a,
        } = clip(&a, b)?;

        let (tree, num_elem) = match op {
            SelectOp::Set => (b.clone(), b.nelem()),
            SelectOp::Or => {
                let num_elem = self.num_elem + b_not_a.nelem();
                (merge(&a, &b_not_a)?, num_elem)
            }
            SelectOp::And => {
                let num_elem = a_and_b.nelem();
                (a_and_b, num_elem)
            }
            SelectOp::Xor => {
                let num_elem = a_not_b.nelem() + b_not_a.nelem();
                (merge(&a_not_b, &b_not_a)?, num_elem)
            }
            SelectOp::NotB => {
                let num_elem = a_not_b.nelem();
                (a_not_b, num_elem)
            }
            SelectOp::NotA => {
                let num_elem = b_not_a.nelem();
                (b_not_a, num_elem)
            }
        };
        Ok(HyperslabSelection::from_spans_with_count(
            self.rank, tree, num_elem,
        ))
    }
}
