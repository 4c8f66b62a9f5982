//! Recovery of a regular description from a span tree.

use crate::{
    regular::{DimInfo, RegularDescriptor},
    span::SpanTree,
};

/// Returns the regular form of `tree` when every level holds exactly one
/// span, i.e. when the tree is a single N-dimensional block.
pub fn rebuild(tree: &SpanTree) -> Option<RegularDescriptor> {
    let mut diminfo = Vec::new();
    let mut level = Some(tree);
    while let Some(list) = level {
        let [span] = list.spans() else {
            return None;
        };
        diminfo.push(DimInfo::single(span.low(), span.len()));
        level = span.down();
    }
    Some(RegularDescriptor::from_opt(diminfo))
}
