use super::*;

use proptest::prelude::*;
use std::collections::BTreeSet;

/// Walks the node graph and checks every structural invariant: per-node
/// ordering, subtree bounds, parent back-references, the only-full-nodes-
/// route-into-children rule, and agreement between the arena contents and
/// the in-order iteration.
fn validate_tree<T: Ord + std::fmt::Debug>(t: &FanTree<T>) {
    let mut seen = 0usize;
    let mut stack: Vec<(NodeId, Option<&T>, Option<&T>)> = Vec::new();
    if let Some(head) = t.head() {
        assert!(t.node(head).parent.is_none(), "head must have no parent");
        stack.push((head, None, None));
    }

    while let Some((id, lower, upper)) = stack.pop() {
        let node = t.node(id);
        assert!(!node.elems.is_empty(), "nodes are never empty");
        assert!(node.elems.len() <= t.max_node_elems());
        for pair in node.elems.windows(2) {
            assert!(
                pair[0] < pair[1],
                "elements within a node must be strictly increasing"
            );
        }
        if let Some(lo) = lower {
            assert!(
                lo < &node.elems[0],
                "subtree elements must exceed the bounding element to the left"
            );
        }
        if let Some(hi) = upper {
            let max = node.elems.last().expect("non-empty");
            assert!(
                max < hi,
                "subtree elements must stay below the bounding element to the right"
            );
        }

        assert!(node.children.len() <= node.elems.len() + 1);
        if node.children.iter().any(Option::is_some) {
            assert_eq!(
                node.elems.len(),
                t.max_node_elems(),
                "only full nodes may route into children"
            );
        }

        seen += node.elems.len();
        for (slot, child) in node.children.iter().enumerate() {
            let Some(child) = *child else { continue };
            assert_eq!(
                t.node(child).parent,
                Some(id),
                "child's parent back-reference must point at its owner"
            );
            let lo = if slot == 0 {
                lower
            } else {
                Some(&node.elems[slot - 1])
            };
            let hi = if slot < node.elems.len() {
                Some(&node.elems[slot])
            } else {
                upper
            };
            stack.push((child, lo, hi));
        }
    }

    assert_eq!(seen, t.len(), "reachable element count must match len");

    let elems: Vec<&T> = t.iter().collect();
    assert_eq!(elems.len(), t.len());
    for pair in elems.windows(2) {
        assert!(
            pair[0] < pair[1],
            "in-order sequence must be strictly ascending"
        );
    }
}

#[derive(Clone, Debug)]
enum Op {
    Insert(u16),
    Find(u16),
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    // A narrow element domain so duplicate inserts and successful finds
    // occur often.
    let elem = 0u16..300;
    let op = prop_oneof![
        60 => elem.clone().prop_map(Op::Insert),
        40 => elem.prop_map(Op::Find),
    ];
    prop::collection::vec(op, 0..=600)
}

fn elems_strategy() -> impl Strategy<Value = Vec<u16>> {
    prop::collection::vec(0u16..300, 0..=300)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(bound in 1usize..=8, ops in ops_strategy()) {
        let mut t: FanTree<u16> = FanTree::with_max_node_elems(bound);
        let mut m: BTreeSet<u16> = BTreeSet::new();

        for op in ops {
            match op {
                Op::Insert(x) => {
                    let (cursor, inserted) = t.insert(x);
                    prop_assert_eq!(cursor.get(), Some(&x));
                    prop_assert_eq!(inserted, m.insert(x));
                }
                Op::Find(x) => {
                    prop_assert_eq!(t.find(&x).get(), m.get(&x));
                }
            }
            prop_assert_eq!(t.len(), m.len());
        }

        validate_tree(&t);
        let got: Vec<u16> = t.iter().copied().collect();
        let expected: Vec<u16> = m.iter().copied().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_reverse_is_mirror(bound in 1usize..=8, elems in elems_strategy()) {
        let mut t: FanTree<u16> = FanTree::with_max_node_elems(bound);
        t.extend(elems);

        let forward: Vec<u16> = t.iter().copied().collect();
        let mut backward: Vec<u16> = t.iter().rev().copied().collect();
        backward.reverse();
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn prop_cursor_round_trip(
        bound in 1usize..=8,
        elems in prop::collection::vec(0u16..300, 1..=200),
    ) {
        let mut t: FanTree<u16> = FanTree::with_max_node_elems(bound);
        t.extend(elems);
        let n = t.len();

        // begin + (n-1) increments lands on the maximum.
        let mut c = t.cursor_front();
        for _ in 0..n - 1 {
            c.move_next();
        }
        prop_assert_eq!(c.get(), t.last());

        // One more is end; one back revisits the maximum.
        c.move_next();
        prop_assert!(c.is_end());
        prop_assert_eq!(c.clone(), t.cursor_end());
        c.move_prev();
        prop_assert_eq!(c.get(), t.last());

        // All the way back down to begin.
        for _ in 0..n - 1 {
            c.move_prev();
        }
        prop_assert_eq!(c.get(), t.first());
        prop_assert_eq!(c, t.cursor_front());
    }

    #[test]
    fn prop_clone_independent(
        bound in 1usize..=8,
        elems in elems_strategy(),
        extra in 300u16..400,
    ) {
        let mut t: FanTree<u16> = FanTree::with_max_node_elems(bound);
        t.extend(elems);
        let before: Vec<u16> = t.iter().copied().collect();

        let mut copy = t.clone();
        copy.insert(extra);
        validate_tree(&copy);

        // Mutating the copy never shows through the original.
        prop_assert!(copy.contains(&extra));
        prop_assert!(!t.contains(&extra));
        let after: Vec<u16> = t.iter().copied().collect();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn prop_display_tokens(bound in 1usize..=8, elems in elems_strategy()) {
        let mut t: FanTree<u16> = FanTree::with_max_node_elems(bound);
        t.extend(elems);

        let dump = t.to_string();
        prop_assert!(!dump.starts_with(' '));
        prop_assert!(!dump.ends_with(' '));

        // The level-order dump visits every element exactly once.
        let mut tokens: Vec<u16> = if dump.is_empty() {
            Vec::new()
        } else {
            dump.split(' ').map(|s| s.parse().unwrap()).collect()
        };
        prop_assert_eq!(tokens.len(), t.len());
        tokens.sort_unstable();
        let sorted: Vec<u16> = t.iter().copied().collect();
        prop_assert_eq!(tokens, sorted);
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

#[test]
fn exhaustive_insert_order_small_set() {
    let elems: Vec<u32> = vec![1, 2, 3, 4, 5, 6];

    for bound in 1..=3 {
        for_each_permutation(&elems, |perm| {
            let mut t: FanTree<u32> = FanTree::with_max_node_elems(bound);
            for x in perm {
                t.insert(x);
            }

            validate_tree(&t);
            let got: Vec<u32> = t.iter().copied().collect();
            assert_eq!(got, vec![1, 2, 3, 4, 5, 6]);
            let mut rev: Vec<u32> = t.iter().rev().copied().collect();
            rev.reverse();
            assert_eq!(got, rev);
        });
    }
}
