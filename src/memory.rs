//! Thread-safe, size-classed memory pool.
//!
//! The original SEAL-derived lineage exposes `MemoryPool` as a thin FFI
//! handle around the C++ library's allocator; here the pool is native,
//! keeping the same handle-based shape. Allocations are grouped into size
//! classes keyed by the exact byte length requested. Each class owns a
//! free list of previously released buffers; on exhaustion a new batch is
//! allocated, growing by
//! [`GROWTH_FACTOR`] from the class's last batch size up to [`MAX_BATCH`]
//! items per call, matching §4.7's "max(prev_size * alpha, cap)" policy.
//!
//! Every handle remembers the id of the pool that produced it
//! ([`PoolHandle::pool_id`]); an explicit [`MemoryPool::release`] call that
//! does not match debug-asserts loudly rather than silently corrupting a
//! free list that belongs to a different pool.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::error::{Error, Result};

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

const GROWTH_FACTOR: usize = 2;
const MIN_BATCH: usize = 16;
const MAX_BATCH: usize = 4096;

#[derive(Default)]
struct SizeClass {
	free_list: Vec<Vec<u8>>,
	last_batch: usize,
}

impl SizeClass {
	fn refill(&mut self, item_size: usize) {
		let batch = (self.last_batch.max(MIN_BATCH / 2) * GROWTH_FACTOR).min(MAX_BATCH);
		self.free_list.reserve(batch);
		for _ in 0..batch {
			self.free_list.push(vec![0u8; item_size]);
		}
		self.last_batch = batch;
	}
}

/// A size-classed, thread-safe memory pool.
///
/// Construct with [`MemoryPool::new`] (clearing on teardown disabled) or
/// [`MemoryPool::new_with_clear`] (every block is securely zeroed — via
/// volatile writes — when the pool is dropped, and every individual
/// released item is zeroed immediately, matching both phrasings of the
/// "clear on destruction" / "clear-on-free" option in the core's data
/// model).
pub struct MemoryPool {
	id: u64,
	clear_on_destruction: bool,
	classes: RwLock<HashMap<usize, Arc<Mutex<SizeClass>>>>,
}

impl std::fmt::Debug for MemoryPool {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MemoryPool")
			.field("id", &self.id)
			.field("clear_on_destruction", &self.clear_on_destruction)
			.finish()
	}
}

impl MemoryPool {
	/// Creates a pool with no clear-on-release/teardown behavior.
	pub fn new() -> Arc<Self> {
		Self::build(false)
	}

	/// Creates a pool that securely zeroes block memory on release and on
	/// teardown.
	pub fn new_with_clear() -> Arc<Self> {
		Self::build(true)
	}

	fn build(clear_on_destruction: bool) -> Arc<Self> {
		Arc::new(Self {
			id: NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed),
			clear_on_destruction,
			classes: RwLock::new(HashMap::new()),
		})
	}

	/// This pool's identity, used to detect cross-pool releases.
	pub fn id(&self) -> u64 {
		self.id
	}

	fn class(&self, item_size: usize) -> Arc<Mutex<SizeClass>> {
		if let Some(class) = self.classes.read().get(&item_size) {
			return class.clone();
		}
		self.classes
			.write()
			.entry(item_size)
			.or_insert_with(|| Arc::new(Mutex::new(SizeClass::default())))
			.clone()
	}

	/// Allocates `item_size` bytes, zero-initialized, from this pool.
	pub fn allocate(self: &Arc<Self>, item_size: usize) -> PoolHandle {
		let class = self.class(item_size);
		let buffer = {
			let mut guard = class.lock();
			if guard.free_list.is_empty() {
				guard.refill(item_size);
			}
			guard.free_list.pop().expect("refill guarantees a free item")
		};

		PoolHandle {
			pool: self.clone(),
			item_size,
			buffer: Some(buffer),
		}
	}

	/// Explicitly releases a handle back to this pool. Handles are also
	/// released automatically on [`Drop`]; this exists for callers that want
	/// to observe a [`Error::CrossPoolRelease`] failure instead of a debug
	/// assertion when a handle allocated by a different pool is passed in.
	pub fn release(self: &Arc<Self>, mut handle: PoolHandle) -> Result<()> {
		if handle.pool.id != self.id {
			return Err(Error::CrossPoolRelease);
		}
		let mut buffer = handle.buffer.take().expect("handle not already released");
		self.reclaim(handle.item_size, &mut buffer);
		Ok(())
	}

	fn reclaim(&self, item_size: usize, buffer: &mut Vec<u8>) {
		if self.clear_on_destruction {
			secure_zero(buffer);
		}
		let class = self.class(item_size);
		class.lock().free_list.push(std::mem::take(buffer));
	}
}

impl Drop for MemoryPool {
	fn drop(&mut self) {
		if !self.clear_on_destruction {
			return;
		}
		for class in self.classes.write().values() {
			for buffer in &mut class.lock().free_list {
				secure_zero(buffer);
			}
		}
	}
}

/// Writes zero to every byte of `buffer` one at a time via a volatile
/// write, so the compiler cannot optimize the clear away even though the
/// buffer is about to be dropped or reused.
fn secure_zero(buffer: &mut [u8]) {
	for byte in buffer.iter_mut() {
		unsafe { std::ptr::write_volatile(byte, 0) };
	}
}

/// A handle to one pool-allocated buffer. Released back to its originating
/// pool automatically when dropped.
pub struct PoolHandle {
	pool: Arc<MemoryPool>,
	item_size: usize,
	buffer: Option<Vec<u8>>,
}

impl PoolHandle {
	/// The id of the pool that allocated this handle.
	pub fn pool_id(&self) -> u64 {
		self.pool.id
	}

	/// The buffer's byte contents.
	pub fn as_slice(&self) -> &[u8] {
		self.buffer.as_deref().expect("handle not already released")
	}

	/// The buffer's byte contents, mutably.
	pub fn as_mut_slice(&mut self) -> &mut [u8] {
		self.buffer.as_deref_mut().expect("handle not already released")
	}
}

impl Drop for PoolHandle {
	fn drop(&mut self) {
		if let Some(mut buffer) = self.buffer.take() {
			self.pool.reclaim(self.item_size, &mut buffer);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn allocate_gives_zeroed_buffer_of_requested_size() {
		let pool = MemoryPool::new();
		let handle = pool.allocate(32);
		assert_eq!(handle.as_slice().len(), 32);
		assert!(handle.as_slice().iter().all(|&b| b == 0));
	}

	#[test]
	fn released_buffer_is_reused() {
		let pool = MemoryPool::new();
		{
			let mut handle = pool.allocate(16);
			handle.as_mut_slice()[0] = 0xAB;
		}
		// The freed buffer should be handed back out rather than a fresh one
		// allocated; the growth-factor doubling still only adds MIN_BATCH/2*2
		// items on the first refill, so this pop always returns the one we
		// just released (LIFO free list).
		let handle2 = pool.allocate(16);
		assert_eq!(handle2.as_slice()[0], 0xAB);
	}

	#[test]
	fn clear_on_release_zeroes_immediately() {
		let pool = MemoryPool::new_with_clear();
		{
			let mut handle = pool.allocate(8);
			handle.as_mut_slice().fill(0xFF);
		}
		let handle2 = pool.allocate(8);
		assert!(handle2.as_slice().iter().all(|&b| b == 0));
	}

	#[test]
	fn release_detects_cross_pool_handle() {
		let pool_a = MemoryPool::new();
		let pool_b = MemoryPool::new();
		let handle = pool_a.allocate(8);
		assert!(matches!(pool_b.release(handle), Err(Error::CrossPoolRelease)));
	}

	#[test]
	fn distinct_size_classes_do_not_share_free_lists() {
		let pool = MemoryPool::new();
		let a = pool.allocate(8);
		let b = pool.allocate(64);
		assert_eq!(a.as_slice().len(), 8);
		assert_eq!(b.as_slice().len(), 64);
	}
}
