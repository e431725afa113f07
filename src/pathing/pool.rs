//! A tiny pool of reusable snapshot buffers. Change notifications snapshot the
//! terrain and object state under a rect before handing work to the
//! background thread, and those buffers churn quickly - the pool hands them
//! back out instead of reallocating per notification.
//!

use std::sync::{Arc, Mutex, PoisonError};

/// Shareable pool of reusable buffers
pub struct ScratchPool<T> {
	/// Idle buffers waiting to be handed out
	idle: Arc<Mutex<Vec<T>>>,
}

impl<T> Clone for ScratchPool<T> {
	fn clone(&self) -> Self {
		ScratchPool {
			idle: Arc::clone(&self.idle),
		}
	}
}

impl<T: Default> Default for ScratchPool<T> {
	fn default() -> Self {
		ScratchPool::new()
	}
}

impl<T: Default> ScratchPool<T> {
	/// Create a new instance of [ScratchPool] with no idle buffers
	pub fn new() -> Self {
		ScratchPool {
			idle: Arc::new(Mutex::new(Vec::new())),
		}
	}
	/// Take an idle buffer or construct a fresh one
	pub fn get(&self) -> T {
		self.idle
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.pop()
			.unwrap_or_default()
	}
	/// Return a buffer to the pool. Callers clear it before handing it back
	pub fn put(&self, item: T) {
		self.idle
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.push(item);
	}
	/// Number of idle buffers
	pub fn idle_count(&self) -> usize {
		self.idle
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.len()
	}
}

// #[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn buffers_are_reused() {
		let pool: ScratchPool<Vec<u32>> = ScratchPool::new();
		let mut buffer = pool.get();
		buffer.push(7);
		buffer.clear();
		pool.put(buffer);
		assert_eq!(1, pool.idle_count());
		let reused = pool.get();
		assert!(reused.is_empty());
		assert_eq!(0, pool.idle_count());
	}
	#[test]
	fn empty_pool_constructs_fresh_buffers() {
		let pool: ScratchPool<Vec<u32>> = ScratchPool::new();
		assert!(pool.get().is_empty());
	}
}
