//! Union of two span trees.

use hyperslab_common::{Result, error::Error};

use crate::{
    clip::{Overlap, Piece},
    span::{SpanListBuilder, SpanTree},
};

/// Returns the tree selecting every element of `a` or `b`.
///
/// Walks both lists the same way as [`clip`](crate::clip::clip) but emits a
/// single output; overlapping parts get the union of the two sub-trees,
/// everything else keeps (and shares) its own sub-tree. Adjacent output spans
/// with equal sub-trees are coalesced.
pub fn merge(a: &SpanTree, b: &SpanTree) -> Result<SpanTree> {
    merge_lists(a, b, 0)
}

fn merge_lists(a: &SpanTree, b: &SpanTree, dim: usize) -> Result<SpanTree> {
    if b.is_empty() || a.structurally_eq(b) {
        return Ok(a.clone());
    }
    if a.is_empty() {
        return Ok(b.clone());
    }

    let mut out = SpanListBuilder::new();
    let mut a_spans = a.spans().iter();
    let mut b_spans = b.spans().iter();
    let mut cur_a = a_spans.next().map(Piece::of);
    let mut cur_b = b_spans.next().map(Piece::of);

    while let (Some(pa), Some(pb)) = (cur_a, cur_b) {
        match Overlap::classify(&pa, &pb) {
            Overlap::Before => {
                out.append(pa.low, pa.high, pa.owned_down())?;
                cur_a = a_spans.next().map(Piece::of);
            }
            Overlap::After => {
                out.append(pb.low, pb.high, pb.owned_down())?;
                cur_b = b_spans.next().map(Piece::of);
            }
            Overlap::LowEdge => {
                out.append(pa.low, pb.low - 1, pa.owned_down())?;
                let down = merge_downs(pa.down, pb.down, dim)?;
                out.append(pb.low, pa.high, down)?;
                cur_b = Some(pb.tail_after(pa.high));
                cur_a = a_spans.next().map(Piece::of);
            }
            Overlap::Straddle => {
                out.append(pa.low, pb.low - 1, pa.owned_down())?;
                let down = merge_downs(pa.down, pb.down, dim)?;
                out.append(pb.low, pb.high, down)?;
                cur_a = if pa.high > pb.high {
                    Some(pa.tail_after(pb.high))
                } else {
                    a_spans.next().map(Piece::of)
                };
                cur_b = b_spans.next().map(Piece::of);
            }
            Overlap::Inside => {
                if pb.low < pa.low {
                    out.append(pb.low, pa.low - 1, pb.owned_down())?;
                }
                let down = merge_downs(pa.down, pb.down, dim)?;
                out.append(pa.low, pa.high, down)?;
                cur_b = if pb.high > pa.high {
                    Some(pb.tail_after(pa.high))
                } else {
                    b_spans.next().map(Piece::of)
                };
                cur_a = a_spans.next().map(Piece::of);
            }
            Overlap::HighEdge => {
                if pb.low < pa.low {
                    out.append(pb.low, pa.low - 1, pb.owned_down())?;
                }
                let down = merge_downs(pa.down, pb.down, dim)?;
                out.append(pa.low, pb.high, down)?;
                cur_a = Some(pa.tail_after(pb.high));
                cur_b = b_spans.next().map(Piece::of);
            }
        }
    }

    while let Some(pa) = cur_a {
        out.append(pa.low, pa.high, pa.owned_down())?;
        cur_a = a_spans.next().map(Piece::of);
    }
    while let Some(pb) = cur_b {
        out.append(pb.low, pb.high, pb.owned_down())?;
        cur_b = b_spans.next().map(Piece::of);
    }

    Ok(out.finish())
}

fn merge_downs(
    a: Option<&SpanTree>,
    b: Option<&SpanTree>,
    dim: usize,
) -> Result<Option<SpanTree>> {
    match (a, b) {
        (None, None) => Ok(None),
        (Some(a), Some(b)) => Ok(Some(merge_lists(a, b, dim + 1)?)),
        _ => Err(Error::invalid_dim_arg(
            "span tree",
            dim,
            "selections of different rank cannot be combined",
        )),
    }
}
