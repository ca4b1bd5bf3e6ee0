//! A capacity-capped pool of reusable [`bytes::BytesMut`] buffers for the
//! `spark-socket` connection object and streaming helpers.

pub mod pool;

pub use pool::{BufferPool, PoolStats, PooledBuffer};
