//! Conversion of a selection iterator's remaining elements into `(offset,
//! length)` byte runs against a row-major buffer of the extent.

use hyperslab_common::{Result, error::Error, verify_arg};
use log::trace;

use crate::iter::{IterState, RegularCursor, SelectionIter, SpanCursor};

/// Budget of one [`SelectionIter::get_seq_list`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeqListLimits {
    /// Maximum number of runs returned.
    pub max_sequences: usize,
    /// Maximum number of bytes covered; rounded down to whole elements.
    pub max_bytes: u64,
}

impl SeqListLimits {
    pub fn new(max_sequences: usize, max_bytes: u64) -> SeqListLimits {
        SeqListLimits {
            max_sequences,
            max_bytes,
        }
    }
}

impl Default for SeqListLimits {
    fn default() -> Self {
        SeqListLimits::new(1024, 1024 * 1024)
    }
}

/// Byte runs produced by one [`SelectionIter::get_seq_list`] call, in
/// iteration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeqList {
    pub offsets: Vec<u64>,
    pub lengths: Vec<u64>,
    /// Sum of `lengths`.
    pub nbytes: u64,
}

impl SeqList {
    #[inline]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// `(offset, length)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.offsets.iter().copied().zip(self.lengths.iter().copied())
    }
}

/// Output accumulator: merges a run that starts where the previous one ends.
struct SeqBuffer {
    list: SeqList,
    max_sequences: usize,
}

impl SeqBuffer {
    fn with_capacity(max_sequences: usize, expected: usize) -> Result<SeqBuffer> {
        let mut list = SeqList::default();
        let capacity = max_sequences.min(expected);
        list.offsets
            .try_reserve_exact(capacity)
            .map_err(|e| Error::allocation_failure("sequence offsets", e))?;
        list.lengths
            .try_reserve_exact(capacity)
            .map_err(|e| Error::allocation_failure("sequence lengths", e))?;
        Ok(SeqBuffer {
            list,
            max_sequences,
        })
    }

    #[inline]
    fn is_full(&self) -> bool {
        self.list.offsets.len() >= self.max_sequences
    }

    fn push(&mut self, offset: u64, length: u64) {
        self.list.nbytes += length;
        if let (Some(&last_offset), Some(last_length)) =
            (self.list.offsets.last(), self.list.lengths.last_mut())
        {
            if last_offset + *last_length == offset {
                *last_length += length;
                return;
            }
        }
        self.list.offsets.push(offset);
        self.list.lengths.push(length);
    }
}

/// Extent geometry shared by both walks.
struct Layout<'a> {
    strides: &'a [u64],
    base: i64,
    elem_size: u64,
}

impl Layout<'_> {
    /// Byte offset of the element at linear (row-major) index `index`, with
    /// the selection offset applied. The iterator checked at creation that
    /// the shifted selection lies inside the extent.
    #[inline]
    fn byte_offset(&self, index: u64) -> u64 {
        index.wrapping_add_signed(self.base).wrapping_mul(self.elem_size)
    }
}

impl SelectionIter {
    /// Emits byte runs for the next elements of the iteration and advances
    /// past them.
    ///
    /// Output stops at `max_sequences` runs or `max_bytes` bytes, whichever
    /// comes first, or when the iterator is exhausted. Call repeatedly until
    /// [`SelectionIter::nelmts`] reports zero.
    pub fn get_seq_list(&mut self, limits: SeqListLimits) -> Result<SeqList> {
        verify_arg!(max_sequences, limits.max_sequences > 0);
        verify_arg!(max_bytes, limits.max_bytes >= self.elem_size);

        let budget = (limits.max_bytes / self.elem_size).min(self.elmt_left);
        let expected = usize::try_from(budget).unwrap_or(usize::MAX);
        let mut out = SeqBuffer::with_capacity(limits.max_sequences, expected)?;

        let SelectionIter {
            elem_size,
            elmt_left,
            strides,
            base,
            state,
            ..
        } = self;
        let layout = Layout {
            strides: strides.as_slice(),
            base: *base,
            elem_size: *elem_size,
        };
        let consumed = match state {
            IterState::Empty => 0,
            IterState::Regular(cursor) => regular_runs(cursor, &layout, budget, &mut out),
            IterState::Spans(cursor) => span_runs(cursor, &layout, budget, &mut out),
        };
        *elmt_left -= consumed;
        if *elmt_left == 0 {
            *state = IterState::Empty;
        }

        trace!(
            "get_seq_list: {} sequences, {} bytes, {} elements left",
            out.list.len(),
            out.list.nbytes,
            self.elmt_left
        );
        Ok(out.list)
    }
}

/// Walks a regular pattern row by row: the linear index of the row is
/// computed in closed form from the slower dimensions, then the blocks of the
/// fastest dimension are emitted in an inner loop.
fn regular_runs(
    cursor: &mut RegularCursor,
    layout: &Layout,
    budget: u64,
    out: &mut SeqBuffer,
) -> u64 {
    let fast = cursor.fastest();
    let info = cursor.flat[fast];
    let total = info.count * info.block;
    let mut consumed = 0;
    while consumed < budget && !out.is_full() {
        let row: u64 = (0..fast)
            .map(|f| cursor.position(f) * layout.strides[cursor.groups[f].end - 1])
            .sum();
        let mut ord = cursor.ord[fast];
        let mut in_row = 0;
        while ord < total && consumed + in_row < budget && !out.is_full() {
            let within = ord % info.block;
            let run = (info.block - within).min(budget - consumed - in_row);
            let index = row + info.start + (ord / info.block) * info.stride + within;
            out.push(layout.byte_offset(index), run * layout.elem_size);
            ord += run;
            in_row += run;
        }
        cursor.advance(in_row);
        consumed += in_row;
    }
    consumed
}

/// Walks the fastest dimension's span lists using the byte-scaled `pstride`
/// and `nelem` of the iterator's private tree.
fn span_runs(cursor: &mut SpanCursor, layout: &Layout, budget: u64, out: &mut SeqBuffer) -> u64 {
    let fast = cursor.fastest();
    let elem_size = layout.elem_size;
    let mut consumed = 0;
    while consumed < budget && !out.is_full() {
        let row: u64 = (0..fast).map(|d| cursor.off[d] * layout.strides[d]).sum();
        let list = cursor.lists[fast].clone();
        let spans = list.spans();
        let mut idx = cursor.idx[fast];
        let span = &spans[idx];
        let mut low = layout.byte_offset(row + span.low);
        let skipped = (cursor.off[fast] - span.low) * elem_size;
        let mut pos = low + skipped;
        let mut left = span.nelem - skipped;
        let mut in_row = 0;
        loop {
            let take = left.min((budget - consumed - in_row) * elem_size);
            out.push(pos, take);
            in_row += take / elem_size;
            if take < left || consumed + in_row == budget || out.is_full() {
                break;
            }
            idx += 1;
            let Some(next) = spans.get(idx) else {
                break;
            };
            low += next.pstride;
            pos = low;
            left = next.nelem;
        }
        cursor.advance(in_row);
        consumed += in_row;
    }
    consumed
}
