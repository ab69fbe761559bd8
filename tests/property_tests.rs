//! Property tests for variable layout, intersection and sampling.

use presburger::prelude::*;
use proptest::prelude::*;

fn row_strategy(n_cols: usize) -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(-3i64..=3, n_cols)
}

fn relation_strategy() -> impl Strategy<Value = IntegerRelation> {
    (
        prop::collection::vec(row_strategy(3), 0..4),
        prop::collection::vec(row_strategy(3), 0..2),
    )
        .prop_map(|(ineqs, eqs)| {
            IntegerRelation::from_coefficients::<i64, _>(&ineqs[..], &eqs[..], 1, 1).unwrap()
        })
}

/// Relations over `[x, y, q, 1]` where the local `q = floor((a*x + b*y + c) / d)`
/// is pinned by an inequality pair, plus extra rows that may mention `q`.
fn relation_with_local_strategy() -> impl Strategy<Value = IntegerRelation> {
    (
        prop::collection::vec(row_strategy(3), 0..3),
        prop::collection::vec(row_strategy(3), 0..2),
        (-2i64..=2, -2i64..=2, -3i64..=3, 2i64..=3),
        prop::collection::vec(row_strategy(4), 0..2),
    )
        .prop_map(|(ineqs, eqs, (a, b, c, d), extra)| {
            let mut r = IntegerRelation::from_coefficients::<i64, _>(&ineqs[..], &eqs[..], 1, 1).unwrap();
            r.append_var(VarKind::Local, 1).unwrap();
            r.add_inequality(&[a, b, -d, c]).unwrap();
            r.add_inequality(&[-a, -b, d, -c + d - 1]).unwrap();
            for row in &extra {
                r.add_inequality(&row[..]).unwrap();
            }
            r
        })
}

/// Per-column kind tags for a space, built without any offset arithmetic.
fn column_tags(counts: [usize; 4]) -> Vec<VarKind> {
    VarKind::ALL
        .iter()
        .zip(counts)
        .flat_map(|(&kind, n)| std::iter::repeat(kind).take(n))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_offsets_match_column_tags(counts in prop::array::uniform4(0usize..4)) {
        let space = PresburgerSpace::new(counts[0], counts[1], counts[2], counts[3]);
        let tags = column_tags(counts);

        prop_assert_eq!(space.num_vars(), tags.len());
        for (col, &kind) in tags.iter().enumerate() {
            prop_assert_eq!(space.var_kind_at(col).unwrap(), kind);
        }
        prop_assert!(space.var_kind_at(tags.len()).is_err());

        for kind in VarKind::ALL {
            let first = tags.iter().filter(|&&t| t < kind).count();
            prop_assert_eq!(space.var_kind_offset(kind), first);
            prop_assert_eq!(space.var_kind_end(kind), first + space.num_vars_of_kind(kind));
        }
    }

    #[test]
    fn test_self_intersection_doubles_rows(r in relation_strategy()) {
        let twice = r.intersect(&r).unwrap();
        prop_assert_eq!(twice.num_inequalities(), 2 * r.num_inequalities());
        prop_assert_eq!(twice.num_equalities(), 2 * r.num_equalities());
        prop_assert!(twice.is_equal(&r).unwrap());
    }

    #[test]
    fn test_intersection_is_commutative(a in relation_strategy(), b in relation_strategy()) {
        let ab = a.intersect(&b).unwrap();
        let ba = b.intersect(&a).unwrap();
        prop_assert!(ab.is_equal(&ba).unwrap());
    }

    #[test]
    fn test_local_roundtrip(r in relation_strategy(), count in 1usize..3) {
        let mut modified = r.clone();
        modified.insert_var(VarKind::Local, 0, count).unwrap();
        prop_assert_eq!(modified.num_cols(), r.num_cols() + count);
        modified.remove_var_range(VarKind::Local, 0, count).unwrap();
        prop_assert_eq!(modified, r);
    }

    #[test]
    fn test_sampler_matches_brute_force(
        ineqs in prop::collection::vec(row_strategy(3), 0..4),
        eqs in prop::collection::vec(row_strategy(3), 0..2),
    ) {
        // Bound both variables to [-6, 6] so brute force is exhaustive.
        let mut rows = ineqs.clone();
        rows.extend([vec![1, 0, 6], vec![-1, 0, 6], vec![0, 1, 6], vec![0, -1, 6]]);
        let r = IntegerRelation::from_coefficients::<i64, _>(&rows[..], &eqs[..], 1, 1).unwrap();

        let holds = |row: &Vec<i64>, x: i64, y: i64| row[0] * x + row[1] * y + row[2];
        let brute = (-6i64..=6).any(|x| {
            (-6i64..=6).any(|y| {
                rows.iter().all(|row| holds(row, x, y) >= 0)
                    && eqs.iter().all(|row| holds(row, x, y) == 0)
            })
        });

        match r.find_integer_sample().unwrap() {
            Some(point) => {
                prop_assert!(brute);
                prop_assert!(r.contains_point(&point).unwrap());
            }
            None => prop_assert!(!brute),
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_self_intersection_with_locals(r in relation_with_local_strategy()) {
        let twice = r.intersect(&r).unwrap();
        prop_assert_eq!(twice.num_inequalities(), 2 * r.num_inequalities());
        prop_assert_eq!(twice.num_equalities(), 2 * r.num_equalities());
        prop_assert_eq!(twice.num_local_vars(), 2);
        prop_assert!(twice.is_equal(&r).unwrap());
    }

    #[test]
    fn test_intersection_with_locals_is_commutative(
        a in relation_with_local_strategy(),
        b in relation_with_local_strategy(),
    ) {
        let ab = a.intersect(&b).unwrap();
        let ba = b.intersect(&a).unwrap();
        prop_assert_eq!(ab.num_local_vars(), 2);
        prop_assert!(ab.is_equal(&ba).unwrap());
    }

    #[test]
    fn test_local_free_and_local_operands_commute(
        a in relation_strategy(),
        b in relation_with_local_strategy(),
    ) {
        let ab = a.intersect(&b).unwrap();
        let ba = b.intersect(&a).unwrap();
        prop_assert!(ab.is_equal(&ba).unwrap());
    }
}
