//! Traversal-scoped bookkeeping for span lists reachable through more than
//! one parent.
//!
//! Copy-like passes over a span tree must visit each distinct list once, so
//! that a sub-tree shared by several spans in the source is also shared in the
//! result (and scaled or shifted only once). The state lives in a map keyed by
//! list identity that is dropped with the traversal; nothing is recorded on
//! the lists themselves.

use ahash::AHashMap;
use hyperslab_common::{Result, error::Error};

use super::{Span, SpanList, SpanTree};

#[derive(Clone)]
pub(crate) enum Scratch {
    Unvisited,
    InProgress,
    CopiedTo(SpanTree),
}

#[derive(Default)]
pub(crate) struct ScratchMap {
    states: AHashMap<*const SpanList, Scratch>,
}

impl ScratchMap {
    pub fn state(&self, tree: &SpanTree) -> Scratch {
        self.states
            .get(&tree.as_ptr())
            .cloned()
            .unwrap_or(Scratch::Unvisited)
    }

    pub fn set(&mut self, tree: &SpanTree, state: Scratch) {
        self.states.insert(tree.as_ptr(), state);
    }
}

/// Rebuilds `tree` with every span replaced by `f(dim, span)`; the sub-tree
/// of each replacement is the rewritten sub-tree of the source span.
///
/// On failure every list produced so far is released with the scratch map.
pub(crate) fn rewrite<F>(tree: &SpanTree, f: &mut F) -> Result<SpanTree>
where
    F: FnMut(usize, &Span) -> Result<Span>,
{
    let mut rewriter = Rewriter {
        scratch: ScratchMap::default(),
        f,
    };
    rewriter.rewrite_list(tree, 0)
}

struct Rewriter<'a, F> {
    scratch: ScratchMap,
    f: &'a mut F,
}

impl<F> Rewriter<'_, F>
where
    F: FnMut(usize, &Span) -> Result<Span>,
{
    fn rewrite_list(&mut self, list: &SpanTree, dim: usize) -> Result<SpanTree> {
        match self.scratch.state(list) {
            Scratch::CopiedTo(copy) => return Ok(copy),
            Scratch::InProgress => {
                return Err(Error::invalid_arg(
                    "span tree",
                    format!("list at dimension {dim} is its own descendant"),
                ));
            }
            Scratch::Unvisited => {}
        }
        self.scratch.set(list, Scratch::InProgress);

        let mut spans = Vec::new();
        spans
            .try_reserve_exact(list.len())
            .map_err(|e| Error::allocation_failure("span tree copy", e))?;
        for span in list.spans() {
            let down = match span.down() {
                Some(down) => Some(self.rewrite_list(down, dim + 1)?),
                None => None,
            };
            let mut rewritten = (self.f)(dim, span)?;
            rewritten.down = down;
            spans.push(rewritten);
        }

        let copy = SpanTree::from_raw(spans);
        self.scratch.set(list, Scratch::CopiedTo(copy.clone()));
        Ok(copy)
    }
}
