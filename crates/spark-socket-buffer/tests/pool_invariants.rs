use proptest::prelude::*;
use spark_socket_buffer::BufferPool;

#[derive(Clone, Copy, Debug)]
enum Op {
    Acquire(usize),
    ReleaseOldest,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1usize..4096).prop_map(Op::Acquire),
        Just(Op::ReleaseOldest),
    ]
}

proptest! {
    /// No interleaving of acquire/release ever leaves more idle buffers in
    /// the pool than its configured cap.
    #[test]
    fn idle_buffers_never_exceed_max_pool_size(ops in prop::collection::vec(op_strategy(), 0..200)) {
        let max_pool_size = 8;
        let pool = BufferPool::new(max_pool_size);
        let mut leases = Vec::new();

        for op in ops {
            match op {
                Op::Acquire(min_capacity) => {
                    leases.push(pool.acquire(min_capacity));
                }
                Op::ReleaseOldest => {
                    if !leases.is_empty() {
                        leases.remove(0);
                    }
                }
            }
            prop_assert!(pool.stats().idle_buffers <= max_pool_size);
        }

        drop(leases);
        prop_assert!(pool.stats().idle_buffers <= max_pool_size);
        prop_assert_eq!(pool.stats().active_leases, 0);
    }
}
