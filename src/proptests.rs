use super::*;
use crate::testing::validate;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::VecDeque;

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 40)]
    PushBack,
    #[proptest(weight = 25)]
    PushFront,
    #[proptest(weight = 20)]
    Get(#[proptest(strategy = "-3000isize..3000")] isize),
    /// Concatenates a fresh run of `n` elements, on the right when the flag is
    /// set and on the left otherwise.
    #[proptest(weight = 10)]
    Concat(#[proptest(strategy = "0usize..1200")] usize, bool),
    #[proptest(weight = 3)]
    Snapshot,
    #[proptest(weight = 2)]
    Normalize,
}

fn model_nth(m: &VecDeque<u32>, index: isize) -> Option<&u32> {
    let index = if index < 0 {
        index + m.len() as isize
    } else {
        index
    };
    usize::try_from(index).ok().and_then(|i| m.get(i))
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(ops in prop::collection::vec(any::<Op>(), 0..=400)) {
        let mut v: Vector<u32> = Vector::new();
        let mut m: VecDeque<u32> = VecDeque::new();
        let mut snapshots: Vec<(Vector<u32>, Vec<u32>)> = Vec::new();
        let mut next = 0u32;

        for op in ops {
            match op {
                Op::PushBack => {
                    v.push_back(next);
                    m.push_back(next);
                    next += 1;
                }
                Op::PushFront => {
                    v.push_front(next);
                    m.push_front(next);
                    next += 1;
                }
                Op::Get(index) => {
                    prop_assert_eq!(v.nth(index), model_nth(&m, index));
                }
                Op::Concat(n, on_right) => {
                    let run: Vec<u32> = (next..next + n as u32).collect();
                    next += n as u32;
                    let other: Vector<u32> = run.iter().copied().collect();
                    if on_right {
                        v.append_all(other);
                        m.extend(run);
                    } else {
                        let mut joined = other;
                        joined.append_all(v);
                        v = joined;
                        for x in run.into_iter().rev() {
                            m.push_front(x);
                        }
                    }
                }
                Op::Snapshot => {
                    snapshots.push((v.clone(), m.iter().copied().collect()));
                }
                Op::Normalize => {
                    v.normalize();
                }
            }

            prop_assert_eq!(v.len(), m.len());
        }

        validate(&v);
        prop_assert!(v.iter().eq(m.iter()));
        for (snapshot, expected) in &snapshots {
            validate(snapshot);
            prop_assert_eq!(&snapshot.iter().copied().collect::<Vec<_>>(), expected);
        }
    }

    #[test]
    fn prop_concat_of_shaped_vectors(
        left_back in 0usize..3000,
        left_front in 0usize..100,
        right_back in 0usize..3000,
        right_front in 0usize..100,
    ) {
        let build = |base: u32, back: usize, front: usize| {
            let mut v: Vector<u32> = Vector::new();
            let mut m: VecDeque<u32> = VecDeque::new();
            for i in 0..back as u32 {
                v.push_back(base + i);
                m.push_back(base + i);
            }
            for i in 0..front as u32 {
                v.push_front(base + 10_000 + i);
                m.push_front(base + 10_000 + i);
            }
            (v, m)
        };
        let (left, mut expected) = build(0, left_back, left_front);
        let (right, right_model) = build(100_000, right_back, right_front);
        expected.extend(right_model);

        let joined = left.concat(&right);
        validate(&joined);
        prop_assert_eq!(joined.len(), expected.len());
        prop_assert!(joined.iter().eq(expected.iter()));
        prop_assert_eq!(left.len(), left_back + left_front);
        prop_assert_eq!(right.len(), right_back + right_front);
    }
}

#[test]
fn exhaustive_concat_size_pairs() {
    let sizes = [0usize, 1, 31, 32, 33, 1023, 1024, 1025, 2053];
    for &a in &sizes {
        for &b in &sizes {
            let left: Vector<usize> = (0..a).collect();
            let right: Vector<usize> = (a..a + b).collect();
            let joined = left.concat(&right);
            validate(&joined);
            assert!(joined.iter().copied().eq(0..a + b), "{a} + {b}");
            if a + b > 0 {
                assert_eq!(joined.nth(-1), Some(&(a + b - 1)), "{a} + {b}");
            }
        }
    }
}

#[test]
fn repeated_concat_stays_shallow() {
    let mut v: Vector<u32> = Vector::new();
    let mut expected = Vec::new();
    for i in 0..300u32 {
        let n = (i * 37) % 97;
        let run: Vec<u32> = (0..n).map(|x| i * 1000 + x).collect();
        v.append_all(run.iter().copied().collect());
        expected.extend(run);
    }
    validate(&v);
    assert!(v.depth() <= 4, "depth {} for {} elements", v.depth(), v.len());
    assert_eq!(v.iter().copied().collect::<Vec<_>>(), expected);
}
