use hyperslab_testkit::DenseGrid;

use crate::{Dataspace, SelectOp};

mod selection_tests;

fn space(dims: &[u64]) -> Dataspace {
    Dataspace::new(dims).unwrap()
}

fn select(
    space: &mut Dataspace,
    op: SelectOp,
    start: &[u64],
    stride: &[u64],
    count: &[u64],
    block: &[u64],
) {
    space
        .select_hyperslab(op, start, Some(stride), count, Some(block))
        .unwrap();
}

/// Applies `op` with the single block `block` at `start`.
fn select_block(space: &mut Dataspace, op: SelectOp, start: &[u64], block: &[u64]) {
    let ones = vec![1; start.len()];
    select(space, op, start, &ones, &ones, block);
}

/// Dense model of whatever the dataspace currently selects.
fn grid_of(space: &Dataspace) -> DenseGrid {
    let mut grid = DenseGrid::new(space.extent().dims());
    for coords in space.points().unwrap() {
        grid.set(&coords, true);
    }
    grid
}

/// Two overlapping blocks and a strided pattern in an 8x8 extent.
fn irregular_8x8() -> Dataspace {
    let mut space = space(&[8, 8]);
    select_block(&mut space, SelectOp::Set, &[0, 0], &[3, 3]);
    select_block(&mut space, SelectOp::Or, &[2, 2], &[3, 4]);
    select(&mut space, SelectOp::Xor, &[5, 0], &[2, 3], &[2, 3], &[1, 2]);
    space
}

fn irregular_8x8_grid() -> DenseGrid {
    let a = DenseGrid::from_block(&[8, 8], &[0, 0], &[2, 2]);
    let b = DenseGrid::from_block(&[8, 8], &[2, 2], &[4, 5]);
    let c = DenseGrid::from_hyperslab(&[8, 8], &[5, 0], &[2, 3], &[2, 3], &[1, 2]);
    a.union(&b).xor(&c)
}
