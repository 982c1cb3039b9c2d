// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Memory-quota accounting. Rust collections own their allocations, so
//! allocators here do not vend buffers; they gate growth. A component
//! that wants `n` bytes asks `try_reserve(n)` before growing and
//! `release(n)` when the storage goes away, usually through a
//! [`Reservation`] guard. Quotas nest: a child observes its own limit,
//! then charges the parent.

use std::{
	fmt::Debug,
	sync::{
		Arc,
		atomic::{AtomicU64, Ordering},
	},
};

pub trait BufferAllocator: Debug + Send + Sync {
	/// Attempts to account `bytes` more. Returns false without side
	/// effects when the quota (own or inherited) does not cover it.
	fn try_reserve(&self, bytes: u64) -> bool;

	/// Returns previously reserved bytes.
	fn release(&self, bytes: u64);

	fn available(&self) -> u64;

	fn usage(&self) -> u64;

	fn quota(&self) -> u64;
}

/// RAII guard for reserved bytes.
pub struct Reservation {
	allocator: Arc<dyn BufferAllocator>,
	bytes: u64,
}

impl Reservation {
	pub fn acquire(allocator: &Arc<dyn BufferAllocator>, bytes: u64) -> Option<Self> {
		if !allocator.try_reserve(bytes) {
			return None;
		}
		Some(Self {
			allocator: Arc::clone(allocator),
			bytes,
		})
	}

	pub fn bytes(&self) -> u64 {
		self.bytes
	}

	pub fn grow(&mut self, additional: u64) -> bool {
		if !self.allocator.try_reserve(additional) {
			return false;
		}
		self.bytes += additional;
		true
	}

	pub fn shrink(&mut self, fewer: u64) {
		let fewer = fewer.min(self.bytes);
		self.allocator.release(fewer);
		self.bytes -= fewer;
	}
}

impl Debug for Reservation {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Reservation").field("bytes", &self.bytes).finish()
	}
}

impl Drop for Reservation {
	fn drop(&mut self) {
		self.allocator.release(self.bytes);
	}
}

/// Root allocator: tracks usage, never refuses.
#[derive(Debug, Default)]
pub struct HeapBufferAllocator {
	used: AtomicU64,
}

impl HeapBufferAllocator {
	pub fn new() -> Self {
		Self::default()
	}
}

impl BufferAllocator for HeapBufferAllocator {
	fn try_reserve(&self, bytes: u64) -> bool {
		self.used.fetch_add(bytes, Ordering::Relaxed);
		true
	}

	fn release(&self, bytes: u64) {
		self.used.fetch_sub(bytes, Ordering::Relaxed);
	}

	fn available(&self) -> u64 {
		u64::MAX - self.used.load(Ordering::Relaxed)
	}

	fn usage(&self) -> u64 {
		self.used.load(Ordering::Relaxed)
	}

	fn quota(&self) -> u64 {
		u64::MAX
	}
}

/// A hard quota enforced against a parent: reservations beyond `quota`
/// fail, accepted ones are charged upward.
#[derive(Debug)]
pub struct MemoryLimit {
	quota: u64,
	parent: Arc<dyn BufferAllocator>,
	used: AtomicU64,
}

impl MemoryLimit {
	pub fn new(quota: u64, parent: Arc<dyn BufferAllocator>) -> Self {
		Self {
			quota,
			parent,
			used: AtomicU64::new(0),
		}
	}
}

impl BufferAllocator for MemoryLimit {
	fn try_reserve(&self, bytes: u64) -> bool {
		let mut current = self.used.load(Ordering::Relaxed);
		loop {
			let next = match current.checked_add(bytes) {
				Some(next) if next <= self.quota => next,
				_ => return false,
			};
			match self.used.compare_exchange(current, next, Ordering::Relaxed, Ordering::Relaxed) {
				Ok(_) => break,
				Err(actual) => current = actual,
			}
		}
		if !self.parent.try_reserve(bytes) {
			self.used.fetch_sub(bytes, Ordering::Relaxed);
			return false;
		}
		true
	}

	fn release(&self, bytes: u64) {
		self.used.fetch_sub(bytes, Ordering::Relaxed);
		self.parent.release(bytes);
	}

	fn available(&self) -> u64 {
		let own = self.quota.saturating_sub(self.used.load(Ordering::Relaxed));
		own.min(self.parent.available())
	}

	fn usage(&self) -> u64 {
		self.used.load(Ordering::Relaxed)
	}

	fn quota(&self) -> u64 {
		self.quota
	}
}

/// Lets a bounded amount of reservation through even when the parent
/// refuses. The buffering sorter sits behind this so its table can keep
/// growing a little past a drained soft quota instead of spilling on
/// every batch.
#[derive(Debug)]
pub struct SoftQuotaBypassingBufferAllocator {
	parent: Arc<dyn BufferAllocator>,
	bypass_quota: u64,
	bypassed: AtomicU64,
}

impl SoftQuotaBypassingBufferAllocator {
	pub fn new(parent: Arc<dyn BufferAllocator>, bypass_quota: u64) -> Self {
		Self {
			parent,
			bypass_quota,
			bypassed: AtomicU64::new(0),
		}
	}
}

impl BufferAllocator for SoftQuotaBypassingBufferAllocator {
	fn try_reserve(&self, bytes: u64) -> bool {
		if self.parent.try_reserve(bytes) {
			return true;
		}
		let mut current = self.bypassed.load(Ordering::Relaxed);
		loop {
			let next = match current.checked_add(bytes) {
				Some(next) if next <= self.bypass_quota => next,
				_ => return false,
			};
			match self.bypassed.compare_exchange(current, next, Ordering::Relaxed, Ordering::Relaxed)
			{
				Ok(_) => return true,
				Err(actual) => current = actual,
			}
		}
	}

	fn release(&self, bytes: u64) {
		// Refill the bypass budget first; whatever remains was parent
		// accounted.
		let mut remaining = bytes;
		let mut current = self.bypassed.load(Ordering::Relaxed);
		loop {
			let back = current.min(remaining);
			if back == 0 {
				break;
			}
			match self.bypassed.compare_exchange(
				current,
				current - back,
				Ordering::Relaxed,
				Ordering::Relaxed,
			) {
				Ok(_) => {
					remaining -= back;
					break;
				}
				Err(actual) => current = actual,
			}
		}
		if remaining > 0 {
			self.parent.release(remaining);
		}
	}

	fn available(&self) -> u64 {
		let bypass_left = self.bypass_quota.saturating_sub(self.bypassed.load(Ordering::Relaxed));
		self.parent.available().saturating_add(bypass_left)
	}

	fn usage(&self) -> u64 {
		self.parent.usage().saturating_add(self.bypassed.load(Ordering::Relaxed))
	}

	fn quota(&self) -> u64 {
		self.parent.quota()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_memory_limit_enforces_quota() {
		let parent: Arc<dyn BufferAllocator> = Arc::new(HeapBufferAllocator::new());
		let limit = MemoryLimit::new(100, parent);

		assert!(limit.try_reserve(60));
		assert!(!limit.try_reserve(50));
		assert!(limit.try_reserve(40));
		assert_eq!(limit.available(), 0);

		limit.release(40);
		assert_eq!(limit.usage(), 60);
		assert_eq!(limit.available(), 40);
	}

	#[test]
	fn test_memory_limit_charges_parent() {
		let root = Arc::new(HeapBufferAllocator::new());
		let parent: Arc<dyn BufferAllocator> = root.clone();
		let limit = MemoryLimit::new(100, parent);

		assert!(limit.try_reserve(30));
		assert_eq!(root.usage(), 30);
		limit.release(30);
		assert_eq!(root.usage(), 0);
	}

	#[test]
	fn test_rejected_reserve_rolls_back_parent() {
		let root: Arc<dyn BufferAllocator> = Arc::new(MemoryLimit::new(50, Arc::new(HeapBufferAllocator::new())));
		let child = MemoryLimit::new(1000, root.clone());

		// Child accepts but the parent refuses; nothing must stay
		// accounted.
		assert!(!child.try_reserve(60));
		assert_eq!(child.usage(), 0);
		assert_eq!(root.usage(), 0);
	}

	#[test]
	fn test_soft_quota_bypass() {
		let parent: Arc<dyn BufferAllocator> = Arc::new(MemoryLimit::new(10, Arc::new(HeapBufferAllocator::new())));
		let bypass = SoftQuotaBypassingBufferAllocator::new(parent.clone(), 25);

		assert!(bypass.try_reserve(10)); // fits the parent
		assert!(bypass.try_reserve(20)); // parent is full, bypassed
		assert!(!bypass.try_reserve(10)); // bypass budget exhausted

		// Releasing refills the bypass budget before the parent.
		bypass.release(20);
		assert_eq!(parent.usage(), 10);
		assert!(bypass.try_reserve(25));
	}

	#[test]
	fn test_reservation_guard_releases_on_drop() {
		let root = Arc::new(HeapBufferAllocator::new());
		let allocator: Arc<dyn BufferAllocator> = root.clone();
		{
			let mut reservation = Reservation::acquire(&allocator, 10).unwrap();
			assert!(reservation.grow(5));
			reservation.shrink(3);
			assert_eq!(root.usage(), 12);
		}
		assert_eq!(root.usage(), 0);
	}
}
