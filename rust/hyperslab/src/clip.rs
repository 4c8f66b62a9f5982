//! Three-way split of two span trees into `a \ b`, `a ∩ b` and `b \ a`.
//!
//! Both sibling lists of a dimension are walked in ascending order. Each
//! step classifies the current pair of spans into one of six relations and
//! emits the non-overlapping edges into the matching "not" output, recursing
//! into the sub-trees for the overlapping part. The unconsumed tail of a
//! split span becomes the new current span of its side.

use hyperslab_common::{Result, error::Error};

use crate::span::{Span, SpanListBuilder, SpanTree};

/// Outputs of [`clip`]; any of them may be empty.
#[derive(Debug)]
pub struct ClipResult {
    pub a_not_b: SpanTree,
    pub a_and_b: SpanTree,
    pub b_not_a: SpanTree,
}

/// How span `a` sits relative to span `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Overlap {
    /// `a` ends before `b` starts.
    Before,
    /// `a` starts first and ends inside `b`.
    LowEdge,
    /// `a` starts first and ends at or after `b`'s end.
    Straddle,
    /// `a` lies within `b` (possibly sharing either edge).
    Inside,
    /// `a` starts inside `b` and ends after it.
    HighEdge,
    /// `a` starts after `b` ends.
    After,
}

impl Overlap {
    pub(crate) fn classify(a: &Piece, b: &Piece) -> Overlap {
        if a.high < b.low {
            Overlap::Before
        } else if a.low > b.high {
            Overlap::After
        } else if a.low < b.low {
            if a.high < b.high {
                Overlap::LowEdge
            } else {
                Overlap::Straddle
            }
        } else if a.high <= b.high {
            Overlap::Inside
        } else {
            Overlap::HighEdge
        }
    }
}

/// Current, possibly trimmed, span of one side of a walk.
#[derive(Clone, Copy)]
pub(crate) struct Piece<'a> {
    pub low: u64,
    pub high: u64,
    pub down: Option<&'a SpanTree>,
}

impl<'a> Piece<'a> {
    pub fn of(span: &'a Span) -> Piece<'a> {
        Piece {
            low: span.low(),
            high: span.high(),
            down: span.down(),
        }
    }

    /// The part of the piece after index `high`.
    #[inline]
    pub fn tail_after(self, high: u64) -> Piece<'a> {
        debug_assert!(high < self.high);
        Piece {
            low: high + 1,
            ..self
        }
    }

    #[inline]
    pub fn owned_down(&self) -> Option<SpanTree> {
        self.down.cloned()
    }
}

/// Splits `a` and `b` into the elements only in `a`, in both, and only in `b`.
///
/// The trees must describe the same rank. Sub-trees of unsplit spans are
/// shared with the inputs rather than copied.
pub fn clip(a: &SpanTree, b: &SpanTree) -> Result<ClipResult> {
    clip_lists(a, b, 0)
}

fn clip_lists(a: &SpanTree, b: &SpanTree, dim: usize) -> Result<ClipResult> {
    if a.is_empty() || b.is_empty() {
        return Ok(ClipResult {
            a_not_b: a.clone(),
            a_and_b: SpanTree::empty(),
            b_not_a: b.clone(),
        });
    }
    if a.structurally_eq(b) {
        return Ok(ClipResult {
            a_not_b: SpanTree::empty(),
            a_and_b: a.clone(),
            b_not_a: SpanTree::empty(),
        });
    }

    let mut clipper = Clipper {
        a_not_b: SpanListBuilder::new(),
        a_and_b: SpanListBuilder::new(),
        b_not_a: SpanListBuilder::new(),
        dim,
    };

    let mut a_spans = a.spans().iter();
    let mut b_spans = b.spans().iter();
    let mut cur_a = a_spans.next().map(Piece::of);
    let mut cur_b = b_spans.next().map(Piece::of);

    while let (Some(pa), Some(pb)) = (cur_a, cur_b) {
        match Overlap::classify(&pa, &pb) {
            Overlap::Before => {
                clipper.a_not_b.append(pa.low, pa.high, pa.owned_down())?;
                cur_a = a_spans.next().map(Piece::of);
            }
            Overlap::After => {
                clipper.b_not_a.append(pb.low, pb.high, pb.owned_down())?;
                cur_b = b_spans.next().map(Piece::of);
            }
            Overlap::LowEdge => {
                clipper.a_not_b.append(pa.low, pb.low - 1, pa.owned_down())?;
                clipper.overlap(pb.low, pa.high, pa.down, pb.down)?;
                cur_b = Some(pb.tail_after(pa.high));
                cur_a = a_spans.next().map(Piece::of);
            }
            Overlap::Straddle => {
                clipper.a_not_b.append(pa.low, pb.low - 1, pa.owned_down())?;
                clipper.overlap(pb.low, pb.high, pa.down, pb.down)?;
                cur_a = if pa.high > pb.high {
                    Some(pa.tail_after(pb.high))
                } else {
                    a_spans.next().map(Piece::of)
                };
                cur_b = b_spans.next().map(Piece::of);
            }
            Overlap::Inside => {
                if pb.low < pa.low {
                    clipper.b_not_a.append(pb.low, pa.low - 1, pb.owned_down())?;
                }
                clipper.overlap(pa.low, pa.high, pa.down, pb.down)?;
                cur_b = if pb.high > pa.high {
                    Some(pb.tail_after(pa.high))
                } else {
                    b_spans.next().map(Piece::of)
                };
                cur_a = a_spans.next().map(Piece::of);
            }
            Overlap::HighEdge => {
                if pb.low < pa.low {
                    clipper.b_not_a.append(pb.low, pa.low - 1, pb.owned_down())?;
                }
                clipper.overlap(pa.low, pb.high, pa.down, pb.down)?;
                cur_a = Some(pa.tail_after(pb.high));
                cur_b = b_spans.next().map(Piece::of);
            }
        }
    }

    while let Some(pa) = cur_a {
        clipper.a_not_b.append(pa.low, pa.high, pa.owned_down())?;
        cur_a = a_spans.next().map(Piece::of);
    }
    while let Some(pb) = cur_b {
        clipper.b_not_a.append(pb.low, pb.high, pb.owned_down())?;
        cur_b = b_spans.next().map(Piece::of);
    }

    Ok(ClipResult {
        a_not_b: clipper.a_not_b.finish(),
        a_and_b: clipper.a_and_b.finish(),
        b_not_a: clipper.b_not_a.finish(),
    })
}

struct Clipper {
    a_not_b: SpanListBuilder,
    a_and_b: SpanListBuilder,
    b_not_a: SpanListBuilder,
    dim: usize,
}

impl Clipper {
    /// Handles the indices `[low, high]` present on both sides.
    fn overlap(
        &mut self,
        low: u64,
        high: u64,
        a_down: Option<&SpanTree>,
        b_down: Option<&SpanTree>,
    ) -> Result<()> {
        match (a_down, b_down) {
            (None, None) => self.a_and_b.append(low, high, None),
            (Some(a_down), Some(b_down)) => {
                let split = clip_lists(a_down, b_down, self.dim + 1)?;
                if !split.a_not_b.is_empty() {
                    self.a_not_b.append(low, high, Some(split.a_not_b))?;
                }
                if !split.a_and_b.is_empty() {
                    self.a_and_b.append(low, high, Some(split.a_and_b))?;
                }
                if !split.b_not_a.is_empty() {
                    self.b_not_a.append(low, high, Some(split.b_not_a))?;
                }
                Ok(())
            }
            _ => Err(Error::invalid_dim_arg(
                "span tree",
                self.dim,
                "selections of different rank cannot be combined",
            )),
        }
    }
}
