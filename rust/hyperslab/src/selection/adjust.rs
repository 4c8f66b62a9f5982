//! Moving selections around and building them element by element.

use hyperslab_common::{Result, error::Error};

use super::{Dataspace, Hyperslab, HyperslabSelection, PointList, Selection};
use crate::{
    extent::check_rank,
    merge::merge,
    regular::{DimInfo, RegularDescriptor},
    span::{SpanListBuilder, SpanTree, scratch},
};

impl HyperslabSelection {
    /// Copy of the selection with every coordinate moved by `shift`.
    pub fn shifted(&self, shift: &[i64]) -> Result<HyperslabSelection> {
        check_rank("shift", shift, self.rank)?;
        let layout = match &self.layout {
            Hyperslab::Regular(desc) => {
                let app = desc
                    .app()
                    .iter()
                    .zip(shift)
                    .enumerate()
                    .map(|(dim, (info, &delta))| {
                        Ok(DimInfo {
                            start: shift_coord(info.start, delta, dim)?,
                            ..*info
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Hyperslab::Regular(RegularDescriptor::new(app)?)
            }
            Hyperslab::Irregular(tree) if tree.is_empty() => Hyperslab::Irregular(tree.clone()),
            Hyperslab::Irregular(tree) => {
                let moved = scratch::rewrite(tree, &mut |dim, span| {
                    let mut moved = span.detached();
                    moved.low = shift_coord(span.low, shift[dim], dim)?;
                    moved.high = shift_coord(span.high, shift[dim], dim)?;
                    Ok(moved)
                })?;
                Hyperslab::Irregular(moved)
            }
        };
        Ok(HyperslabSelection {
            rank: self.rank,
            layout,
            num_elem: self.num_elem,
        })
    }
}

fn shift_coord(coord: u64, delta: i64, dim: usize) -> Result<u64> {
    coord.checked_add_signed(delta).ok_or_else(|| {
        Error::invalid_dim_arg(
            "shift",
            dim,
            format!("moving index {coord} by {delta} leaves the representable range"),
        )
    })
}

impl Dataspace {
    /// Moves every selected element by `shift`.
    pub fn adjust(&mut self, shift: &[i64]) -> Result<()> {
        check_rank("shift", shift, self.rank())?;
        let selection = match &self.selection {
            Selection::None => return Ok(()),
            Selection::All => {
                return Err(Error::unsupported_op("adjust", "all"));
            }
            Selection::Points(points) => {
                let coords = points
                    .coords
                    .iter()
                    .map(|point| {
                        point
                            .iter()
                            .zip(shift)
                            .enumerate()
                            .map(|(dim, (&c, &delta))| shift_coord(c, delta, dim))
                            .collect::<Result<Vec<u64>>>()
                    })
                    .collect::<Result<Vec<_>>>()?;
                Selection::Points(PointList { coords })
            }
            Selection::Hyperslab(hyperslab) => Selection::Hyperslab(hyperslab.shifted(shift)?),
        };
        self.install(selection);
        Ok(())
    }

    /// Folds the selection offset into the selected coordinates and clears
    /// it. Returns the previous offset, for [`Self::denormalize_offset`].
    ///
    /// ALL and NONE selections ignore the offset and are left untouched.
    pub fn normalize_offset(&mut self) -> Result<Vec<i64>> {
        let offset = self.offset.clone();
        if self.has_offset() && !self.ignores_offset() {
            self.adjust(&offset)?;
            self.offset.fill(0);
        }
        Ok(offset)
    }

    /// Undoes [`Self::normalize_offset`].
    pub fn denormalize_offset(&mut self, offset: &[i64]) -> Result<()> {
        check_rank("offset", offset, self.rank())?;
        if self.ignores_offset() {
            return Ok(());
        }
        if offset.iter().any(|&o| o != 0) {
            let back: Vec<i64> = offset.iter().map(|&o| -o).collect();
            self.adjust(&back)?;
            self.set_offset(offset)?;
        }
        Ok(())
    }

    fn ignores_offset(&self) -> bool {
        matches!(self.selection, Selection::All | Selection::None)
    }

    /// Adds the single element at `coords` to a hyperslab (or empty) selection.
    pub fn add_point(&mut self, coords: &[u64]) -> Result<()> {
        self.check_point("coords", coords)?;
        let point = SpanTree::point(coords);
        let tree = match &self.selection {
            Selection::None => point,
            Selection::Hyperslab(hyperslab) => merge(&hyperslab.spans(), &point)?,
            other => return Err(Error::unsupported_op("add point", other.kind_name())),
        };
        self.install(Selection::Hyperslab(HyperslabSelection::from_spans(
            self.rank(),
            tree,
        )));
        Ok(())
    }

    /// Converts a point selection into the equivalent hyperslab selection.
    pub fn points_to_hyperslab(&mut self) -> Result<()> {
        let Selection::Points(points) = &self.selection else {
            return Err(Error::unsupported_op(
                "convert to hyperslab",
                self.selection.kind_name(),
            ));
        };
        let mut coords = points.coords.clone();
        coords.sort_unstable();
        coords.dedup();
        let tree = if coords.is_empty() {
            SpanTree::empty()
        } else {
            point_tree(&coords, 0, self.rank())?
        };
        self.install(Selection::Hyperslab(HyperslabSelection::from_spans(
            self.rank(),
            tree,
        )));
        Ok(())
    }
}

/// Span tree of sorted, distinct points sharing their first `dim` coordinates.
fn point_tree(points: &[Vec<u64>], dim: usize, rank: usize) -> Result<SpanTree> {
    let mut out = SpanListBuilder::new();
    for group in points.chunk_by(|a, b| a[dim] == b[dim]) {
        let index = group[0][dim];
        let down = if dim + 1 < rank {
            Some(point_tree(group, dim + 1, rank)?)
        } else {
            None
        };
        out.append(index, index, down)?;
    }
    Ok(out.finish())
}
