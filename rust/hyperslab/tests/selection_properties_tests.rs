use hyperslab::{Dataspace, IterOptions, SelectOp, SeqListLimits};
use hyperslab_testkit::{DenseGrid, HyperslabArgs, random_hyperslab, seeded_rng};
use rand::Rng;

const OPS: [SelectOp; 6] = [
    SelectOp::Set,
    SelectOp::Or,
    SelectOp::And,
    SelectOp::Xor,
    SelectOp::NotB,
    SelectOp::NotA,
];

fn apply(grid: &DenseGrid, op: SelectOp, args: &HyperslabArgs) -> DenseGrid {
    let other = DenseGrid::from_hyperslab(
        grid.dims(),
        &args.start,
        &args.stride,
        &args.count,
        &args.block,
    );
    match op {
        SelectOp::Set => other,
        SelectOp::Or => grid.union(&other),
        SelectOp::And => grid.intersect(&other),
        SelectOp::Xor => grid.xor(&other),
        SelectOp::NotB => grid.difference(&other),
        SelectOp::NotA => other.difference(grid),
    }
}

fn check_against_model(space: &Dataspace, grid: &DenseGrid, context: &str) {
    assert_eq!(space.npoints(), grid.count(), "{context}");
    assert_eq!(space.points().unwrap().collect::<Vec<_>>(), grid.coords(), "{context}");

    let elem_size = 4;
    let mut iter = space.iter(elem_size, IterOptions::default()).unwrap();
    let list = iter.get_seq_list(SeqListLimits::default()).unwrap();
    let expected = grid
        .runs()
        .into_iter()
        .map(|(start, len)| (start * elem_size, len * elem_size))
        .collect::<Vec<_>>();
    assert_eq!(list.iter().collect::<Vec<_>>(), expected, "{context}");
    assert_eq!(iter.nelmts(), 0, "{context}");

    let hyperslab = space.hyperslab().unwrap();
    let blocks = hyperslab.blocks().collect::<Vec<_>>();
    assert_eq!(blocks.len() as u64, hyperslab.nblocks(), "{context}");
    assert_eq!(
        blocks.iter().map(|b| b.npoints()).sum::<u64>(),
        grid.count(),
        "{context}"
    );

    if let Some(bounds) = hyperslab.bounds() {
        let coords = grid.coords();
        for (dim, (&low, &high)) in bounds.start.iter().zip(&bounds.end).enumerate() {
            assert_eq!(coords.iter().map(|c| c[dim]).min(), Some(low), "{context}");
            assert_eq!(coords.iter().map(|c| c[dim]).max(), Some(high), "{context}");
        }
        if bounds.npoints() == grid.count() {
            assert!(hyperslab.is_regular(), "{context}: a full box stays regular");
        }
    } else {
        assert!(grid.is_empty(), "{context}");
    }

    let bytes = space.serialize().unwrap();
    assert_eq!(bytes.len() as u64, hyperslab.serial_size(), "{context}");
    let mut decoded = Dataspace::new(grid.dims()).unwrap();
    decoded.deserialize_selection(&bytes).unwrap();
    assert_eq!(decoded.npoints(), grid.count(), "{context}");
    assert_eq!(
        decoded.points().unwrap().collect::<Vec<_>>(),
        grid.coords(),
        "{context}"
    );
}

#[test]
fn test_random_operator_sequences() {
    let dims = [6u64, 5, 7];
    let mut rng = seeded_rng(1234);
    for round in 0..40 {
        let mut space = Dataspace::new(&dims).unwrap();
        let mut grid = DenseGrid::full(&dims);
        for step in 0..6 {
            let op = if step == 0 {
                SelectOp::Set
            } else {
                OPS[rng.random_range(1..OPS.len())]
            };
            let args = random_hyperslab(&mut rng, &dims);
            space
                .select_hyperslab(
                    op,
                    &args.start,
                    Some(args.stride.as_slice()),
                    &args.count,
                    Some(args.block.as_slice()),
                )
                .unwrap();
            grid = apply(&grid, op, &args);
            check_against_model(&space, &grid, &format!("round {round}, step {step}: {op}"));
        }
    }
}

#[test]
fn test_random_sequence_limits() {
    let dims = [9u64, 8];
    let mut rng = seeded_rng(99);
    for round in 0..30 {
        let mut space = Dataspace::new(&dims).unwrap();
        let mut grid = DenseGrid::full(&dims);
        for op in [SelectOp::Set, SelectOp::Or, SelectOp::Xor] {
            let args = random_hyperslab(&mut rng, &dims);
            space
                .select_hyperslab(
                    op,
                    &args.start,
                    Some(args.stride.as_slice()),
                    &args.count,
                    Some(args.block.as_slice()),
                )
                .unwrap();
            grid = apply(&grid, op, &args);
        }

        let elem_size = rng.random_range(1..=8u64);
        let limits = SeqListLimits::new(
            rng.random_range(1..=4usize),
            elem_size * rng.random_range(1..=6u64),
        );
        let flatten = rng.random_bool(0.5);
        let mut iter = space.iter(elem_size, IterOptions { flatten }).unwrap();
        let mut covered = DenseGrid::new(&dims);
        while iter.nelmts() > 0 {
            let before = iter.nelmts();
            let list = iter.get_seq_list(limits).unwrap();
            assert!(list.len() <= limits.max_sequences, "round {round}");
            assert!(list.nbytes <= limits.max_bytes, "round {round}");
            assert_eq!(before - iter.nelmts(), list.nbytes / elem_size, "round {round}");
            for (offset, length) in list.iter() {
                assert_eq!(offset % elem_size, 0);
                assert_eq!(length % elem_size, 0);
                for idx in offset / elem_size..(offset + length) / elem_size {
                    let coords = unlinear(idx, &dims);
                    assert!(!covered.get(&coords), "round {round}: {coords:?} twice");
                    covered.set(&coords, true);
                }
            }
        }
        assert_eq!(covered, grid, "round {round}");
    }
}

fn unlinear(mut idx: u64, dims: &[u64]) -> Vec<u64> {
    let mut coords = vec![0; dims.len()];
    for (c, &d) in coords.iter_mut().zip(dims).rev() {
        *c = idx % d;
        idx /= d;
    }
    coords
}

#[test]
fn test_operator_algebra() {
    let dims = [7u64, 6, 5];
    let mut rng = seeded_rng(7);
    for round in 0..50 {
        let a = random_hyperslab(&mut rng, &dims);
        let b = random_hyperslab(&mut rng, &dims);
        let pair = |first: &HyperslabArgs, op: SelectOp, second: &HyperslabArgs| {
            let mut space = Dataspace::new(&dims).unwrap();
            for (op, args) in [(SelectOp::Set, first), (op, second)] {
                space
                    .select_hyperslab(
                        op,
                        &args.start,
                        Some(args.stride.as_slice()),
                        &args.count,
                        Some(args.block.as_slice()),
                    )
                    .unwrap();
            }
            space.points().unwrap().collect::<Vec<_>>()
        };
        assert_eq!(pair(&a, SelectOp::Or, &b), pair(&b, SelectOp::Or, &a), "round {round}");
        assert_eq!(pair(&a, SelectOp::And, &b), pair(&b, SelectOp::And, &a), "round {round}");
        assert_eq!(pair(&a, SelectOp::Xor, &b), pair(&b, SelectOp::Xor, &a), "round {round}");
        assert_eq!(pair(&a, SelectOp::NotB, &b), pair(&b, SelectOp::NotA, &a), "round {round}");
        assert!(pair(&a, SelectOp::Xor, &a).is_empty(), "round {round}");
        assert!(pair(&a, SelectOp::NotB, &a).is_empty(), "round {round}");
        assert_eq!(pair(&a, SelectOp::And, &a), pair(&a, SelectOp::Set, &a), "round {round}");
    }
}

fn select_in_order(dims: &[u64], steps: &[(SelectOp, &HyperslabArgs)]) -> Dataspace {
    let mut space = Dataspace::new(dims).unwrap();
    for &(op, args) in steps {
        space
            .select_hyperslab(
                op,
                &args.start,
                Some(args.stride.as_slice()),
                &args.count,
                Some(args.block.as_slice()),
            )
            .unwrap();
    }
    space
}

#[test]
fn test_union_is_associative() {
    let dims = [6u64, 7, 5];
    let mut rng = seeded_rng(2024);
    for round in 0..50 {
        let a = random_hyperslab(&mut rng, &dims);
        let b = random_hyperslab(&mut rng, &dims);
        let c = random_hyperslab(&mut rng, &dims);

        let left = select_in_order(
            &dims,
            &[(SelectOp::Set, &a), (SelectOp::Or, &b), (SelectOp::Or, &c)],
        );
        let b_or_c = select_in_order(&dims, &[(SelectOp::Set, &b), (SelectOp::Or, &c)]);
        let right = select_in_order(&dims, &[(SelectOp::Set, &a)])
            .combine_select(SelectOp::Or, &b_or_c)
            .unwrap();

        let expected = apply(&apply(&DenseGrid::full(&dims), SelectOp::Set, &a), SelectOp::Or, &b);
        let expected = apply(&expected, SelectOp::Or, &c);
        let left_points = left.points().unwrap().collect::<Vec<_>>();
        assert_eq!(left_points, right.points().unwrap().collect::<Vec<_>>(), "round {round}");
        assert_eq!(left_points, expected.coords(), "round {round}");
        assert_eq!(left.npoints(), right.npoints(), "round {round}");
    }
}
