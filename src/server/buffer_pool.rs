//! Pool of fixed-length receive buffers.
//!
//! Each TCP connection borrows one buffer for its lifetime; dropping the
//! [`PooledBuffer`] hands it back. The pool keeps at most `max_idle`
//! buffers around, so a burst of connections does not pin memory forever.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use parking_lot::Mutex;

#[derive(Debug)]
pub struct BufferPool {
    buffer_size: usize,
    max_idle: usize,
    idle: Mutex<Vec<Box<[u8]>>>,
}

impl BufferPool {
    pub fn new(buffer_size: usize, max_idle: usize) -> Arc<Self> {
        Arc::new(Self {
            buffer_size,
            max_idle,
            idle: Mutex::new(Vec::with_capacity(max_idle)),
        })
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Number of buffers waiting for reuse.
    pub fn idle(&self) -> usize {
        self.idle.lock().len()
    }

    /// Takes a zeroed buffer, allocating only when the pool is empty.
    pub fn take(self: &Arc<Self>) -> PooledBuffer {
        let buf = self
            .idle
            .lock()
            .pop()
            .unwrap_or_else(|| vec![0; self.buffer_size].into_boxed_slice());
        PooledBuffer {
            buf: Some(buf),
            pool: Arc::clone(self),
        }
    }

    fn give_back(&self, mut buf: Box<[u8]>) {
        buf.fill(0);
        let mut idle = self.idle.lock();
        if idle.len() < self.max_idle {
            idle.push(buf);
        }
    }
}

/// Receive buffer on loan from a [`BufferPool`].
#[derive(Debug)]
pub struct PooledBuffer {
    buf: Option<Box<[u8]>>,
    pool: Arc<BufferPool>,
}

impl Deref for PooledBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.buf.as_deref().unwrap_or_default()
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.buf.as_deref_mut().unwrap_or_default()
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            self.pool.give_back(buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffers_are_recycled() {
        let pool = BufferPool::new(32, 4);
        {
            let mut buf = pool.take();
            assert_eq!(buf.len(), 32);
            buf[0] = 7;
        }
        assert_eq!(pool.idle(), 1);

        let buf = pool.take();
        assert_eq!(pool.idle(), 0);
        assert_eq!(buf[0], 0);
    }

    #[test]
    fn idle_count_is_bounded() {
        let pool = BufferPool::new(8, 2);
        let held: Vec<_> = (0..5).map(|_| pool.take()).collect();
        drop(held);
        assert_eq!(pool.idle(), 2);
        assert_eq!(pool.buffer_size(), 8);
    }
}
