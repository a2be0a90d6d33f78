use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeMap;

fn validate_row(g: &SingleGram) {
    let bytes = g.as_bytes();
    assert!(bytes.len() >= HEADER_SIZE, "row lost its header");
    assert_eq!(
        (bytes.len() - HEADER_SIZE) % RECORD_SIZE,
        0,
        "row payload must be whole records"
    );
    assert_eq!(g.iter().len(), g.len());

    let tokens: Vec<Token> = g.iter().map(|r| r.token).collect();
    for pair in tokens.windows(2) {
        assert!(
            pair[0] < pair[1],
            "tokens must be strictly ascending: {} then {}",
            pair[0],
            pair[1]
        );
    }
}

// Tokens come from a small domain so that inserts collide and removes hit.
#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 4)]
    Insert(#[proptest(strategy = "0u32..64")] Token, u32),
    #[proptest(weight = 3)]
    Remove(#[proptest(strategy = "0u32..64")] Token),
    #[proptest(weight = 2)]
    Set(#[proptest(strategy = "0u32..64")] Token, u32),
    #[proptest(weight = 2)]
    Get(#[proptest(strategy = "0u32..64")] Token),
    #[proptest(weight = 1)]
    Total(u32),
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(ops in prop::collection::vec(any::<Op>(), 0..=500)) {
        let mut g = SingleGram::new();
        let mut m: BTreeMap<Token, u32> = BTreeMap::new();
        let mut total = 0u32;

        for op in ops {
            match op {
                Op::Insert(token, count) => {
                    let before = g.clone();
                    match g.insert_freq(token, count) {
                        Ok(()) => {
                            prop_assert!(m.insert(token, count).is_none());
                        }
                        Err(Error::AlreadyExists(t)) => {
                            prop_assert_eq!(t, token);
                            prop_assert!(m.contains_key(&token));
                            prop_assert_eq!(&g, &before);
                        }
                        Err(e) => prop_assert!(false, "unexpected error {e}"),
                    }
                }
                Op::Remove(token) => {
                    let before = g.clone();
                    let got = g.remove_freq(token).ok();
                    prop_assert_eq!(got, m.remove(&token));
                    if got.is_none() {
                        prop_assert_eq!(&g, &before);
                    }
                }
                Op::Set(token, count) => {
                    let present = m.contains_key(&token);
                    prop_assert_eq!(g.set_freq(token, count).is_ok(), present);
                    if present {
                        m.insert(token, count);
                    }
                }
                Op::Get(token) => {
                    prop_assert_eq!(g.get_freq(token).ok(), m.get(&token).copied());
                }
                Op::Total(t) => {
                    g.set_total_freq(t);
                    total = t;
                }
            }

            prop_assert_eq!(g.len(), m.len());
            prop_assert_eq!(g.get_total_freq(), total);
        }

        validate_row(&g);
        let got: Vec<(Token, u32)> = g.iter().map(|r| (r.token, r.count)).collect();
        let expected: Vec<(Token, u32)> = m.into_iter().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_search_is_exact_range(
        records in prop::collection::btree_map(0u32..1000, 1u32..1000, 0..100),
        begin in 0u32..1100,
        end in 0u32..1100,
    ) {
        let total: u32 = records.values().sum();
        let g = SingleGram::from_records(
            total.max(1),
            records.iter().map(|(&t, &c)| FreqRecord::new(t, c)),
        ).unwrap();

        let got: Vec<Token> = g.search(begin..end).unwrap().into_iter().map(|i| i.token).collect();
        let expected: Vec<Token> = records.keys().copied().filter(|&t| begin <= t && t < end).collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_wire_bytes_decode(
        records in prop::collection::btree_map(any::<u32>(), any::<u32>(), 0..64),
        total in any::<u32>(),
    ) {
        let g = SingleGram::from_records(
            total,
            records.iter().map(|(&t, &c)| FreqRecord::new(t, c)),
        ).unwrap();
        validate_row(&g);

        let decoded = SingleGram::from_bytes(g.clone().into_bytes()).unwrap();
        prop_assert_eq!(decoded.as_bytes(), g.as_bytes());
        prop_assert_eq!(decoded.get_total_freq(), total);
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
    let tokens: Vec<Token> = vec![0, 1, 7, 8, 255, u32::MAX];

    let mut expected_row: Option<SingleGram> = None;
    for_each_permutation(&tokens, |perm| {
        let mut g = SingleGram::new();
        for &t in &perm {
            g.insert_freq(t, t / 2 + 1).unwrap();
        }
        validate_row(&g);

        // Insertion order must not leak into the packed bytes.
        let first = expected_row.get_or_insert_with(|| g.clone());
        assert_eq!(g.as_bytes(), first.as_bytes());
    });
}

#[test]
fn exhaustive_remove_order_small_set() {
    let tokens: Vec<Token> = vec![2, 3, 5, 7, 11, 13];

    let mut base = SingleGram::new();
    for &t in &tokens {
        base.insert_freq(t, t * 10).unwrap();
    }

    for_each_permutation(&tokens, |perm| {
        let mut g = base.clone();
        let mut left: BTreeMap<Token, u32> = tokens.iter().map(|&t| (t, t * 10)).collect();

        for t in perm {
            assert_eq!(g.remove_freq(t).unwrap(), t * 10);
            left.remove(&t);
            validate_row(&g);
            let got: Vec<(Token, u32)> = g.iter().map(|r| (r.token, r.count)).collect();
            let expected: Vec<(Token, u32)> = left.iter().map(|(&t, &c)| (t, c)).collect();
            assert_eq!(got, expected);
        }
        assert!(g.is_empty());
        assert_eq!(g.as_bytes().len(), HEADER_SIZE);
    });
}
