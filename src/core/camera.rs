//! Frame acquisition contract and the finite frame buffer pool

use crate::error::Result;
use parking_lot::Mutex;
use std::sync::Arc;

/// Produces one compressed still image on demand
pub trait FrameSource: Send {
    /// Capture a single frame into a pooled buffer
    ///
    /// Failures here are transient (peripheral busy, pool exhausted): the
    /// caller skips the cycle and retries after its back-off. Whether the
    /// source could be brought up at all was settled at construction.
    fn capture(&mut self) -> Result<Frame>;
}

/// Finite pool of reusable frame buffers
///
/// Mirrors the peripheral's fixed buffer count: a buffer acquired by a
/// capture stays checked out until its [`Frame`] guard drops. Holding
/// guards across cycles exhausts the pool and fails further captures.
#[derive(Clone, Debug)]
pub struct FramePool {
    free: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl FramePool {
    /// Create a pool of `count` buffers, each preallocated to `capacity`
    pub fn new(count: usize, capacity: usize) -> Self {
        let free = (0..count).map(|_| Vec::with_capacity(capacity)).collect();
        Self {
            free: Arc::new(Mutex::new(free)),
        }
    }

    /// Take a free buffer, or `None` when every buffer is checked out
    pub fn acquire(&self) -> Option<Vec<u8>> {
        self.free.lock().pop()
    }

    /// Return a buffer to the pool, keeping its allocation
    pub fn release(&self, mut buffer: Vec<u8>) {
        buffer.clear();
        self.free.lock().push(buffer);
    }

    /// Number of buffers currently free
    pub fn free_count(&self) -> usize {
        self.free.lock().len()
    }

    /// Wrap a filled buffer into a guard tied to this pool
    pub fn frame(&self, data: Vec<u8>) -> Frame {
        Frame {
            data,
            pool: self.clone(),
        }
    }
}

/// One captured frame
///
/// Owns its buffer exclusively until dropped, at which point the buffer
/// returns to the pool. Release is guaranteed on every exit path,
/// early-return error paths included.
#[derive(Debug)]
pub struct Frame {
    data: Vec<u8>,
    pool: FramePool,
}

impl Frame {
    /// Compressed payload bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True for a zero-length payload
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Drop for Frame {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.data));
    }
}
