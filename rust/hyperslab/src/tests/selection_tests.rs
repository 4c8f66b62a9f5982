use hyperslab_testkit::DenseGrid;

use super::{grid_of, irregular_8x8, irregular_8x8_grid, select, select_block, space};
use crate::{
    Block, Dataspace, DimInfo, Hyperslab, SelectOp, Selection, SpanTree,
    selection::HyperslabSelection,
};

#[test]
fn test_single_block_is_regular() {
    let mut space = space(&[10, 10]);
    select_block(&mut space, SelectOp::Set, &[2, 2], &[6, 6]);
    assert_eq!(space.npoints(), 36);
    assert_eq!(space.nblocks().unwrap(), 1);
    assert_eq!(space.bounds().unwrap(), Block::new(vec![2, 2], vec![7, 7]));
    let hyperslab = space.hyperslab().unwrap();
    assert!(hyperslab.is_regular());
    assert!(hyperslab.is_single());
}

#[test]
fn test_or_of_disjoint_blocks() {
    let mut space = space(&[20, 20]);
    select_block(&mut space, SelectOp::Set, &[2, 2], &[6, 6]);
    select_block(&mut space, SelectOp::Or, &[12, 12], &[4, 4]);
    assert_eq!(space.npoints(), 52);
    assert_eq!(space.nblocks().unwrap(), 2);
    assert!(!space.is_regular());
    assert_eq!(space.bounds().unwrap(), Block::new(vec![2, 2], vec![15, 15]));
    assert_eq!(
        space.block_list(0, 10).unwrap(),
        vec![
            Block::new(vec![2, 2], vec![7, 7]),
            Block::new(vec![12, 12], vec![15, 15]),
        ]
    );
}

#[test]
fn test_and_with_itself_is_unchanged() {
    let mut space = space(&[10, 10]);
    select_block(&mut space, SelectOp::Set, &[2, 2], &[6, 6]);
    let before = space.hyperslab().unwrap().regular_descriptor().unwrap().clone();
    select_block(&mut space, SelectOp::And, &[2, 2], &[6, 6]);
    assert_eq!(space.npoints(), 36);
    let after = space.hyperslab().unwrap().regular_descriptor().unwrap();
    assert_eq!(after.opt(), before.opt());
}

#[test]
fn test_self_difference_is_empty_hyperslab() {
    for op in [SelectOp::NotB, SelectOp::Xor, SelectOp::NotA] {
        let mut space = space(&[10, 10]);
        select_block(&mut space, SelectOp::Set, &[2, 2], &[6, 6]);
        select_block(&mut space, op, &[2, 2], &[6, 6]);
        assert_eq!(space.npoints(), 0, "{op}");
        let hyperslab = space.hyperslab().unwrap();
        assert!(hyperslab.is_empty());
        assert_eq!(hyperslab.nblocks(), 0);
        assert!(hyperslab.bounds().is_none());
    }
}

#[test]
fn test_set_replaces_any_selection() {
    let mut space = irregular_8x8();
    select(&mut space, SelectOp::Set, &[1, 0], &[3, 4], &[2, 2], &[2, 2]);
    let desc = space.hyperslab().unwrap().regular_descriptor().unwrap();
    assert_eq!(desc.app()[0], DimInfo::new(1, 3, 2, 2));
    assert_eq!(space.npoints(), 16);

    space.select_none();
    select_block(&mut space, SelectOp::Set, &[0, 0], &[1, 1]);
    assert_eq!(space.npoints(), 1);
}

#[test]
fn test_zero_count_or_block() {
    let mut space = space(&[10, 10]);
    select_block(&mut space, SelectOp::Set, &[2, 2], &[6, 6]);

    for op in [SelectOp::Or, SelectOp::Xor, SelectOp::NotB] {
        select(&mut space, op, &[0, 0], &[1, 1], &[0, 1], &[1, 1]);
        assert_eq!(space.npoints(), 36);
    }
    select(&mut space, SelectOp::And, &[0, 0], &[1, 1], &[1, 1], &[1, 0]);
    assert!(matches!(space.selection(), Selection::None));

    select_block(&mut space, SelectOp::Set, &[2, 2], &[6, 6]);
    select(&mut space, SelectOp::Set, &[0, 0], &[1, 1], &[0, 0], &[1, 1]);
    assert!(matches!(space.selection(), Selection::None));
}

#[test]
fn test_invalid_arguments_leave_selection() {
    let mut space = irregular_8x8();
    let before = grid_of(&space);

    let err = space
        .select_hyperslab(SelectOp::Or, &[0, 0], Some(&[1u64, 0][..]), &[1, 1], None)
        .unwrap_err();
    assert!(err.is_invalid_arg());
    assert!(err.to_string().contains("dimension 1"));

    let err = space
        .select_hyperslab(
            SelectOp::Or,
            &[0, 0],
            Some(&[2u64, 2][..]),
            &[2, 2],
            Some(&[3u64, 1][..]),
        )
        .unwrap_err();
    assert!(err.is_invalid_arg());
    assert!(err.to_string().contains("overlap"));

    let err = space
        .select_hyperslab(SelectOp::And, &[0, 0, 0], None, &[1, 1, 1], None)
        .unwrap_err();
    assert!(err.is_invalid_arg());

    assert_eq!(grid_of(&space), before);
}

#[test]
fn test_all_and_none_transitions() {
    let mut space = space(&[4, 4]);
    select_block(&mut space, SelectOp::Or, &[1, 1], &[2, 2]);
    assert!(matches!(space.selection(), Selection::All));

    select_block(&mut space, SelectOp::NotB, &[1, 1], &[2, 2]);
    assert_eq!(space.npoints(), 12);
    let expected = DenseGrid::full(&[4, 4]).difference(&DenseGrid::from_block(
        &[4, 4],
        &[1, 1],
        &[2, 2],
    ));
    assert_eq!(grid_of(&space), expected);

    space.select_all();
    select_block(&mut space, SelectOp::And, &[1, 1], &[2, 2]);
    assert_eq!(space.npoints(), 4);
    assert!(space.is_regular());

    space.select_none();
    select_block(&mut space, SelectOp::NotB, &[1, 1], &[2, 2]);
    assert!(matches!(space.selection(), Selection::None));
    select_block(&mut space, SelectOp::And, &[1, 1], &[2, 2]);
    assert!(matches!(space.selection(), Selection::None));
    select_block(&mut space, SelectOp::NotA, &[1, 1], &[2, 2]);
    assert_eq!(space.npoints(), 4);
}

#[test]
fn test_point_selection_rejects_operators() {
    let mut space = space(&[4, 4]);
    space.select_elements(vec![vec![0, 1], vec![3, 3]]).unwrap();
    assert_eq!(space.npoints(), 2);
    let err = space
        .select_hyperslab(SelectOp::Or, &[0, 0], None, &[1, 1], None)
        .unwrap_err();
    assert!(err.is_unsupported_op());
    assert!(err.to_string().contains("OR"));
    assert_eq!(space.npoints(), 2);

    select_block(&mut space, SelectOp::Set, &[0, 0], &[2, 2]);
    assert_eq!(space.npoints(), 4);

    assert!(space.select_elements(vec![vec![4, 0]]).unwrap_err().is_invalid_arg());
}

#[test]
fn test_adjacent_blocks_rebuild_to_regular() {
    let mut space = space(&[10, 10]);
    select_block(&mut space, SelectOp::Set, &[0, 0], &[2, 4]);
    select_block(&mut space, SelectOp::Or, &[2, 0], &[3, 4]);
    let hyperslab = space.hyperslab().unwrap();
    assert!(hyperslab.is_regular());
    let desc = hyperslab.regular_descriptor().unwrap();
    assert_eq!(desc.opt(), &[DimInfo::single(0, 5), DimInfo::single(0, 4)]);
    assert_eq!(space.npoints(), 20);
}

#[test]
fn test_descriptor_keeps_caller_form() {
    let mut space = space(&[10, 10]);
    select(&mut space, SelectOp::Set, &[1, 0], &[1, 2], &[1, 3], &[1, 2]);
    let desc = space.hyperslab().unwrap().regular_descriptor().unwrap();
    assert_eq!(desc.app()[1], DimInfo::new(0, 2, 3, 2));
    assert_eq!(desc.opt()[1], DimInfo::new(0, 1, 1, 6));
    assert_eq!(space.nblocks().unwrap(), 1);
}

#[test]
fn test_operators_match_dense_model() {
    let dims = [8u64, 8];
    let base = irregular_8x8_grid();
    let other = DenseGrid::from_hyperslab(&dims, &[1, 1], &[3, 3], &[2, 2], &[2, 2]);
    let cases = [
        (SelectOp::Or, base.union(&other)),
        (SelectOp::And, base.intersect(&other)),
        (SelectOp::Xor, base.xor(&other)),
        (SelectOp::NotB, base.difference(&other)),
        (SelectOp::NotA, other.difference(&base)),
    ];
    for (op, expected) in cases {
        let mut space = irregular_8x8();
        select(&mut space, op, &[1, 1], &[3, 3], &[2, 2], &[2, 2]);
        assert_eq!(grid_of(&space), expected, "{op}");
        assert_eq!(space.npoints(), expected.count(), "{op}");
    }
}

#[test]
fn test_clone_shares_and_deep_copy_detaches() {
    let space = irregular_8x8();
    let Hyperslab::Irregular(tree) = space.hyperslab().unwrap().layout() else {
        panic!("expected an irregular selection");
    };

    let shallow = space.clone();
    let Hyperslab::Irregular(shared) = shallow.hyperslab().unwrap().layout() else {
        panic!("expected an irregular selection");
    };
    assert!(SpanTree::ptr_eq(tree, shared));

    let deep = space.deep_copy().unwrap();
    let Hyperslab::Irregular(copied) = deep.hyperslab().unwrap().layout() else {
        panic!("expected an irregular selection");
    };
    assert!(!SpanTree::ptr_eq(tree, copied));
    assert!(tree.structurally_eq(copied));
    assert_eq!(grid_of(&deep), grid_of(&space));
}

#[test]
fn test_combine_hyperslab_leaves_original() {
    let mut space = space(&[10, 10]);
    select_block(&mut space, SelectOp::Set, &[2, 2], &[6, 6]);
    let combined = space
        .combine_hyperslab(SelectOp::NotB, &[0, 0], None, &[5, 5], None)
        .unwrap();
    assert_eq!(space.npoints(), 36);
    assert_eq!(combined.npoints(), 36 - 9);
}

#[test]
fn test_combine_select() {
    let mut a = space(&[8, 8]);
    select_block(&mut a, SelectOp::Set, &[0, 0], &[4, 4]);
    let mut b = space(&[8, 8]);
    select_block(&mut b, SelectOp::Set, &[2, 2], &[4, 4]);

    assert_eq!(a.combine_select(SelectOp::And, &b).unwrap().npoints(), 4);
    assert_eq!(a.combine_select(SelectOp::Or, &b).unwrap().npoints(), 28);
    assert_eq!(a.combine_select(SelectOp::NotA, &b).unwrap().npoints(), 12);
    let set = a.combine_select(SelectOp::Set, &b).unwrap();
    assert_eq!(set.bounds().unwrap(), Block::new(vec![2, 2], vec![5, 5]));

    let c = space(&[8, 8, 8]);
    assert!(a.combine_select(SelectOp::Or, &c).unwrap_err().is_invalid_arg());
    let all = space(&[8, 8]);
    assert!(a.combine_select(SelectOp::Or, &all).unwrap_err().is_unsupported_op());
}

#[test]
fn test_operate_rejects_rank_mismatch() {
    let mut space = space(&[8, 8]);
    select_block(&mut space, SelectOp::Set, &[0, 0], &[4, 4]);
    let hyperslab = space.hyperslab().unwrap();
    let point = SpanTree::point(&[1, 1, 1]);
    assert!(hyperslab.operate(SelectOp::Or, &point).is_err());
}

#[test]
fn test_adjust() {
    let mut space = irregular_8x8();
    space.select_hyperslab(SelectOp::And, &[0, 0], None, &[5, 8], None).unwrap();
    let before = grid_of(&space);
    space.adjust(&[2, 1]).unwrap();
    assert_eq!(space.npoints(), before.count());
    assert!(space.bounds().unwrap().start == vec![2, 1]);
    space.adjust(&[-2, -1]).unwrap();
    assert_eq!(grid_of(&space), before);

    let err = space.adjust(&[-1, 0]).unwrap_err();
    assert!(err.is_invalid_arg());
    assert_eq!(grid_of(&space), before);

    let mut regular = super::space(&[10, 10]);
    select(&mut regular, SelectOp::Set, &[4, 4], &[3, 1], &[2, 1], &[1, 2]);
    regular.adjust(&[-4, 1]).unwrap();
    let desc = regular.hyperslab().unwrap().regular_descriptor().unwrap();
    assert_eq!(desc.app()[0], DimInfo::new(0, 3, 2, 1));
    assert_eq!(desc.app()[1].start, 5);

    let mut all = super::space(&[4, 4]);
    assert!(all.adjust(&[1, 1]).unwrap_err().is_unsupported_op());
    all.select_elements(vec![vec![1, 2]]).unwrap();
    all.adjust(&[1, -2]).unwrap();
    assert_eq!(all.points().unwrap().collect::<Vec<_>>(), vec![vec![2, 0]]);
}

#[test]
fn test_normalize_offset_round_trip() {
    let mut space = space(&[10, 10]);
    select_block(&mut space, SelectOp::Set, &[2, 2], &[3, 3]);
    space.set_offset(&[1, -2]).unwrap();
    assert!(space.has_offset());
    let bounds = space.bounds().unwrap();

    let offset = space.normalize_offset().unwrap();
    assert_eq!(offset, vec![1, -2]);
    assert!(!space.has_offset());
    assert_eq!(space.bounds().unwrap(), bounds);

    space.denormalize_offset(&offset).unwrap();
    assert_eq!(space.offset(), &[1, -2]);
    assert_eq!(
        space.hyperslab().unwrap().bounds().unwrap(),
        Block::new(vec![2, 2], vec![4, 4])
    );
}

#[test]
fn test_normalize_offset_ignores_all_and_none() {
    let mut space = space(&[4, 4]);
    space.set_offset(&[1, 1]).unwrap();
    let offset = space.normalize_offset().unwrap();
    assert_eq!(offset, vec![1, 1]);
    assert!(matches!(space.selection(), Selection::All));
    assert!(space.is_valid());
    assert_eq!(space.npoints(), 16);

    space.denormalize_offset(&offset).unwrap();
    assert!(matches!(space.selection(), Selection::All));
    assert_eq!(space.offset(), &[1, 1]);

    space.select_none();
    space.normalize_offset().unwrap();
    space.denormalize_offset(&[2, -1]).unwrap();
    assert!(matches!(space.selection(), Selection::None));
    assert!(space.denormalize_offset(&[1]).unwrap_err().is_invalid_arg());
}

#[test]
fn test_add_point_and_points_to_hyperslab() {
    let mut space = space(&[6, 6]);
    space.select_none();
    for coords in [[1u64, 1], [1, 2], [1, 3], [2, 1], [2, 2], [2, 3]] {
        space.add_point(&coords).unwrap();
    }
    assert_eq!(space.npoints(), 6);
    assert!(space.is_regular());
    assert_eq!(space.bounds().unwrap(), Block::new(vec![1, 1], vec![2, 3]));

    space.add_point(&[5, 0]).unwrap();
    assert_eq!(space.npoints(), 7);
    assert_eq!(space.nblocks().unwrap(), 2);

    let mut points = super::space(&[6, 6]);
    points
        .select_elements(vec![vec![4, 4], vec![0, 1], vec![0, 2], vec![4, 4], vec![3, 0]])
        .unwrap();
    points.points_to_hyperslab().unwrap();
    assert_eq!(points.npoints(), 4);
    assert_eq!(
        points.points().unwrap().collect::<Vec<_>>(),
        vec![vec![0, 1], vec![0, 2], vec![3, 0], vec![4, 4]]
    );

    let before = grid_of(&space);
    for coords in [[6u64, 0], [0, 6], [u64::MAX, 1]] {
        assert!(space.add_point(&coords).unwrap_err().is_invalid_arg(), "{coords:?}");
    }
    assert!(space.add_point(&[1]).unwrap_err().is_invalid_arg());
    assert_eq!(grid_of(&space), before);

    let mut all = super::space(&[6, 6]);
    assert!(all.add_point(&[0, 0]).unwrap_err().is_unsupported_op());
    assert!(all.points_to_hyperslab().unwrap_err().is_unsupported_op());
}

#[test]
fn test_from_spans_counts_elements() {
    let tree = SpanTree::point(&[3, 4]);
    let hyperslab = HyperslabSelection::from_spans(2, tree);
    assert_eq!(hyperslab.npoints(), 1);
    assert!(hyperslab.is_regular());
}

#[test]
fn test_unrepresentable_element_count_is_rejected() {
    let mut space = space(&[10, 10]);
    select_block(&mut space, SelectOp::Set, &[1, 1], &[2, 2]);
    let before = grid_of(&space);
    for op in [SelectOp::Set, SelectOp::Or] {
        let err = space
            .select_hyperslab(op, &[0, 0], None, &[1 << 32, 1 << 32], None)
            .unwrap_err();
        assert!(err.is_invalid_arg(), "{op}: {err}");
        assert_eq!(grid_of(&space), before);
    }
    assert!(Dataspace::new(&[1 << 40, 1 << 40]).unwrap_err().is_invalid_arg());
}
