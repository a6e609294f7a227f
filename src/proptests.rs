use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;

use proptest::prelude::*;

use crate::common::{Constant, OctetIndex, OctetNode};
use crate::index::{AddressIndex, Config, DuplicatePolicy};

/// Validate heights, balance and strict key ordering of one level, and of
/// every level below it. Returns the height of `node`.
fn validate_level(node: Option<&OctetNode>, low: Option<u8>, high: Option<u8>) -> u8 {
    let Some(node) = node else {
        return 0;
    };

    if let Some(low) = low {
        assert!(node.key() > low, "key {} must be above {low}", node.key());
    }
    if let Some(high) = high {
        assert!(node.key() < high, "key {} must be below {high}", node.key());
    }

    let left = validate_level(node.left(), low, Some(node.key()));
    let right = validate_level(node.right(), Some(node.key()), high);

    assert!(
        left.abs_diff(right) <= 1,
        "unbalanced node {}: {left} vs {right}",
        node.key()
    );
    assert_eq!(
        node.height(),
        1 + left.max(right),
        "stored height must match children"
    );

    validate_level(node.subtree().root(), None, None);

    node.height()
}

fn validate_tree(index: &OctetIndex) {
    validate_level(index.root(), None, None);
}

#[derive(Clone, Debug)]
enum Op {
    Insert(u8),
    Remove(u8),
    Get(u8),
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        50 => any::<u8>().prop_map(Op::Insert),
        30 => any::<u8>().prop_map(Op::Remove),
        20 => any::<u8>().prop_map(Op::Get),
    ];
    prop::collection::vec(op, 0..=1000)
}

#[derive(Clone, Debug)]
enum Entry {
    Address(Ipv4Addr),
    Subnet(Ipv4Addr, u8),
}

fn entry_strategy() -> impl Strategy<Value = Entry> {
    // A narrow first octet makes overlapping registrations likely.
    let address = (8u8..12, any::<u8>(), any::<u8>(), any::<u8>())
        .prop_map(|(a, b, c, d)| Ipv4Addr::new(a, b, c, d));

    prop_oneof![
        address.clone().prop_map(Entry::Address),
        (address, 8u8..32).prop_map(|(address, len)| {
            let masked = u32::from(address) & (u32::MAX << (32 - len));
            Entry::Subnet(Ipv4Addr::from(masked), len)
        }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn octet_index_matches_btreeset(ops in ops_strategy()) {
        let mut index = OctetIndex::new();
        let mut model = BTreeSet::new();

        for op in ops {
            match op {
                Op::Insert(key) => {
                    prop_assert_eq!(index.insert(key).key(), key);
                    model.insert(key);
                }
                Op::Remove(key) => {
                    prop_assert_eq!(index.remove(key), model.remove(&key));
                }
                Op::Get(key) => {
                    prop_assert_eq!(index.contains(key), model.contains(&key));
                }
            }
            validate_tree(&index);
        }

        prop_assert_eq!(
            index.keys().collect::<Vec<_>>(),
            model.into_iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn registrations_match_linear_scan(
        entries in prop::collection::vec(entry_strategy(), 1..40),
        probes in prop::collection::vec(any::<u32>(), 0..200),
    ) {
        let mut index = AddressIndex::with_config(Config {
            duplicate_handlers: DuplicatePolicy::Ignore,
            ..Default::default()
        });

        // Every entry gets its own name and outcome, so the first entry
        // registered for the most general matching prefix decides.
        let mut model: BTreeMap<(usize, u32), u32> = BTreeMap::new();
        let mut prefixes = Vec::new();

        for (i, entry) in entries.iter().enumerate() {
            let outcome = i as u32 + 1;
            let name = format!("entry-{i}");

            let (network, len) = match entry {
                Entry::Address(address) => {
                    index.add_address(&address.to_string(), &name, Constant(outcome)).unwrap();
                    (*address, 32u8)
                }
                Entry::Subnet(network, len) => {
                    index
                        .add_subnet(&format!("{network}/{len}"), &name, Constant(outcome))
                        .unwrap();
                    (*network, *len)
                }
            };

            // Matching granularity is the octet level the prefix expands into.
            let level = (len as usize).div_ceil(8);
            prefixes.push((level, u32::from(network), len, outcome));
        }

        validate_tree(index.root());

        for probe in probes.into_iter().chain(prefixes.iter().map(|p| p.1)) {
            model.clear();
            for (level, network, len, outcome) in &prefixes {
                let mask = u32::MAX.checked_shl(32 - *len as u32).unwrap_or(0);
                if probe & mask == *network {
                    model.entry((*level, *outcome)).or_insert(*outcome);
                }
            }
            // Lowest level first, then registration order within a level.
            let expected = model.values().next().copied().unwrap_or(0);

            prop_assert_eq!(index.match_addr(probe), expected, "probe {}", Ipv4Addr::from(probe));
        }
    }
}
