use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::BytesMut;

/// Point-in-time counters for a [`BufferPool`]. Cheap to read — each field
/// is an independent atomic snapshot, not a consistent transaction across
/// fields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub idle_buffers: usize,
    pub idle_bytes: usize,
    pub active_leases: usize,
    pub discarded_on_release: u64,
}

struct PoolMetrics {
    active_leases: AtomicUsize,
    discarded_on_release: AtomicUsize,
}

impl PoolMetrics {
    fn new() -> Self {
        Self {
            active_leases: AtomicUsize::new(0),
            discarded_on_release: AtomicUsize::new(0),
        }
    }
}

struct PoolInner {
    free_list: Mutex<Vec<BytesMut>>,
    max_pool_size: usize,
    metrics: PoolMetrics,
}

impl PoolInner {
    fn acquire_buffer(&self, min_capacity: usize) -> BytesMut {
        let mut free_list = self.free_list.lock().expect("buffer pool mutex poisoned");
        if let Some(position) = free_list
            .iter()
            .position(|buf| buf.capacity() >= min_capacity)
        {
            let mut buf = free_list.swap_remove(position);
            buf.clear();
            buf
        } else {
            drop(free_list);
            BytesMut::with_capacity(min_capacity)
        }
    }

    /// Returns a buffer to the free list, or discards it once the pool is
    /// already holding `max_pool_size` idle buffers. This is the cap the
    /// donor's own slab pool doesn't enforce: without it a bursty workload
    /// never gives memory back.
    fn reclaim(&self, mut buf: BytesMut) {
        let mut free_list = self.free_list.lock().expect("buffer pool mutex poisoned");
        if free_list.len() >= self.max_pool_size {
            self.metrics
                .discarded_on_release
                .fetch_add(1, Ordering::Relaxed);
            tracing::trace!(
                max_pool_size = self.max_pool_size,
                "discarding released buffer, pool at capacity"
            );
            return;
        }
        buf.clear();
        free_list.push(buf);
    }
}

/// A capacity-keyed free list of [`BytesMut`] buffers, capped at
/// `max_pool_size` idle entries. Grounded in the donor's slab allocator
/// (first-fit scan over a `Vec<BytesMut>` guarded by a plain mutex); the cap
/// and its discard-on-release behavior are this workspace's addition.
#[derive(Clone)]
pub struct BufferPool {
    inner: Arc<PoolInner>,
}

impl BufferPool {
    pub fn new(max_pool_size: usize) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                free_list: Mutex::new(Vec::new()),
                max_pool_size,
                metrics: PoolMetrics::new(),
            }),
        }
    }

    /// Acquires a buffer with `capacity() >= min_capacity`, reusing an idle
    /// buffer from the pool when one is large enough, else allocating fresh.
    /// The returned [`PooledBuffer`] releases itself back to this pool
    /// exactly once, on drop.
    pub fn acquire(&self, min_capacity: usize) -> PooledBuffer {
        self.inner
            .metrics
            .active_leases
            .fetch_add(1, Ordering::Relaxed);
        let buf = self.inner.acquire_buffer(min_capacity);
        PooledBuffer {
            buf: Some(buf),
            pool: self.inner.clone(),
        }
    }

    pub fn stats(&self) -> PoolStats {
        let free_list = self
            .inner
            .free_list
            .lock()
            .expect("buffer pool mutex poisoned");
        PoolStats {
            idle_buffers: free_list.len(),
            idle_bytes: free_list.iter().map(|buf| buf.capacity()).sum(),
            active_leases: self.inner.metrics.active_leases.load(Ordering::Relaxed),
            discarded_on_release: self.inner.metrics.discarded_on_release.load(Ordering::Relaxed)
                as u64,
        }
    }
}

/// A leased [`BytesMut`] that returns to its pool when dropped. Borrow it via
/// [`PooledBuffer::get`]/[`PooledBuffer::get_mut`] like any other buffer;
/// there is no separate "release" call to remember.
pub struct PooledBuffer {
    buf: Option<BytesMut>,
    pool: Arc<PoolInner>,
}

impl PooledBuffer {
    pub fn get(&self) -> &BytesMut {
        self.buf.as_ref().expect("pooled buffer taken")
    }

    pub fn get_mut(&mut self) -> &mut BytesMut {
        self.buf.as_mut().expect("pooled buffer taken")
    }

    /// Detaches the underlying buffer without returning it to the pool —
    /// for callers handing ownership off across a boundary (e.g. into a
    /// `Bytes` that outlives this lease).
    pub fn take(mut self) -> BytesMut {
        self.buf.take().expect("pooled buffer taken")
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        self.pool
            .metrics
            .active_leases
            .fetch_sub(1, Ordering::Relaxed);
        if let Some(buf) = self.buf.take() {
            self.pool.reclaim(buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reused_buffer_returns_to_pool_on_drop() {
        let pool = BufferPool::new(4);
        {
            let _lease = pool.acquire(256);
            assert_eq!(pool.stats().active_leases, 1);
        }
        assert_eq!(pool.stats().idle_buffers, 1);
        assert_eq!(pool.stats().active_leases, 0);
    }

    #[test]
    fn acquire_reuses_capacity_instead_of_reallocating() {
        let pool = BufferPool::new(4);
        {
            let _lease = pool.acquire(4096);
        }
        assert_eq!(pool.stats().idle_buffers, 1);
        let lease = pool.acquire(128);
        assert!(lease.get().capacity() >= 4096);
    }

    #[test]
    fn release_beyond_cap_is_discarded() {
        let pool = BufferPool::new(1);
        let first = pool.acquire(64);
        let second = pool.acquire(64);
        drop(first);
        assert_eq!(pool.stats().idle_buffers, 1);
        drop(second);
        assert_eq!(pool.stats().idle_buffers, 1);
        assert_eq!(pool.stats().discarded_on_release, 1);
    }

    #[test]
    fn take_detaches_buffer_without_reclaiming() {
        let pool = BufferPool::new(4);
        let lease = pool.acquire(32);
        let buf = lease.take();
        assert!(buf.capacity() >= 32);
        assert_eq!(pool.stats().idle_buffers, 0);
    }
}
