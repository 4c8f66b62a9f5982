use hyperslab_common::{Result, error::Error};

use super::{Span, SpanTree, same_tree};

/// Accumulates the output list of a clip or merge pass.
///
/// Spans must be appended in ascending order. A span adjacent to the previous
/// one with a structurally equal sub-tree extends the previous span instead of
/// creating a new node; a non-adjacent span with an equal sub-tree shares the
/// previous span's sub-tree handle.
#[derive(Default)]
pub(crate) struct SpanListBuilder {
    spans: Vec<Span>,
}

impl SpanListBuilder {
    pub fn new() -> SpanListBuilder {
        SpanListBuilder::default()
    }

    pub fn append(&mut self, low: u64, high: u64, down: Option<SpanTree>) -> Result<()> {
        debug_assert!(low <= high);
        let mut down = down;
        if let Some(last) = self.spans.last_mut() {
            debug_assert!(last.high < low);
            if same_tree(last.down(), down.as_ref()) {
                if last.high + 1 == low {
                    last.high = high;
                    last.nelem = high - last.low + 1;
                    return Ok(());
                }
                down = last.down.clone();
            }
        }

        let pstride = self.spans.last().map_or(0, |last| low - last.low);
        self.spans
            .try_reserve(1)
            .map_err(|e| Error::allocation_failure("span list", e))?;
        self.spans.push(Span {
            low,
            high,
            nelem: high - low + 1,
            pstride,
            down,
        });
        Ok(())
    }

    pub fn finish(self) -> SpanTree {
        SpanTree::from_raw(self.spans)
    }
}
