use std::collections::HashSet;

use proptest::collection::vec;
use proptest::prelude::*;

use super::{Pool, PoolKey};

#[derive(Debug, Clone)]
enum Op {
    Get,
    Put(usize),
}

fn ops() -> impl Strategy<Value = Vec<Op>> {
    vec(prop_oneof![3 => Just(Op::Get), 2 => any::<usize>().prop_map(Op::Put)], 0..400)
}

proptest! {
    #[test]
    fn balanced_traffic_restores_free_slots(capacity in 0usize..200, ops in ops()) {
        let mut pool = Pool::<u64>::new(capacity);
        let initial = pool.free_count();
        prop_assert_eq!(initial, pool.capacity());

        let mut live: Vec<PoolKey> = Vec::new();
        for (stamp, op) in ops.into_iter().enumerate() {
            match op {
                Op::Get => {
                    let key = pool.get();
                    prop_assert_eq!(pool[key], 0);
                    pool[key] = stamp as u64 + 1;
                    live.push(key);
                }
                Op::Put(pick) if !live.is_empty() => {
                    let key = live.swap_remove(pick % live.len());
                    pool.put(key);
                }
                Op::Put(_) => {}
            }

            let distinct: HashSet<_> = live.iter().copied().collect();
            prop_assert_eq!(distinct.len(), live.len());
            prop_assert_eq!(pool.free_count() + live.len() - pool.overflow_len(), pool.capacity());
        }

        for key in live.drain(..) {
            pool.put(key);
        }
        prop_assert_eq!(pool.free_count(), initial);
        prop_assert_eq!(pool.overflow_len(), 0);
    }
}
