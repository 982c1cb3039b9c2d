// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Byte-packed bit vector with clone-on-write sharing. Column validity
/// bitmaps use this; bit set means the row is defined.
#[derive(Clone, Debug, PartialEq)]
pub struct BitVec {
	inner: Arc<BitVecInner>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct BitVecInner {
	bits: Vec<u8>,
	len: usize,
}

impl Default for BitVec {
	fn default() -> Self {
		Self::empty()
	}
}

impl BitVec {
	pub fn empty() -> Self {
		Self {
			inner: Arc::new(BitVecInner {
				bits: Vec::new(),
				len: 0,
			}),
		}
	}

	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			inner: Arc::new(BitVecInner {
				bits: Vec::with_capacity(capacity.div_ceil(8)),
				len: 0,
			}),
		}
	}

	pub fn repeat(len: usize, value: bool) -> Self {
		if value {
			// Goes through set() so bits past len stay zero; raw
			// byte equality depends on a clean tail.
			return BitVec::from_fn(len, |_| true);
		}
		Self {
			inner: Arc::new(BitVecInner {
				bits: vec![0x00; len.div_ceil(8)],
				len,
			}),
		}
	}

	pub fn from_slice(slice: &[bool]) -> Self {
		let mut bv = BitVec::repeat(slice.len(), false);
		for (i, &bit) in slice.iter().enumerate() {
			if bit {
				bv.set(i, true);
			}
		}
		bv
	}

	pub fn from_fn(len: usize, mut f: impl FnMut(usize) -> bool) -> Self {
		let mut bv = BitVec::repeat(len, false);
		for i in 0..len {
			if f(i) {
				bv.set(i, true);
			}
		}
		bv
	}

	fn make_mut(&mut self) -> &mut BitVecInner {
		Arc::make_mut(&mut self.inner)
	}

	pub fn len(&self) -> usize {
		self.inner.len
	}

	pub fn is_empty(&self) -> bool {
		self.inner.len == 0
	}

	pub fn capacity(&self) -> usize {
		self.inner.bits.capacity() * 8
	}

	pub fn get(&self, index: usize) -> bool {
		debug_assert!(index < self.inner.len);
		let byte = self.inner.bits[index / 8];
		(byte >> (index % 8)) & 1 != 0
	}

	pub fn set(&mut self, index: usize, value: bool) {
		debug_assert!(index < self.inner.len);
		let inner = self.make_mut();
		let byte = &mut inner.bits[index / 8];
		if value {
			*byte |= 1 << (index % 8);
		} else {
			*byte &= !(1 << (index % 8));
		}
	}

	pub fn push(&mut self, value: bool) {
		let inner = self.make_mut();
		if inner.len % 8 == 0 {
			inner.bits.push(0);
		}
		if value {
			inner.bits[inner.len / 8] |= 1 << (inner.len % 8);
		}
		inner.len += 1;
	}

	pub fn clear(&mut self) {
		let inner = self.make_mut();
		inner.bits.clear();
		inner.len = 0;
	}

	pub fn truncate(&mut self, len: usize) {
		if len >= self.inner.len {
			return;
		}
		let inner = self.make_mut();
		inner.len = len;
		inner.bits.truncate(len.div_ceil(8));
		// Zero the dangling bits of the last byte so equality and
		// count_ones stay exact.
		if len % 8 != 0 {
			let mask = (1u8 << (len % 8)) - 1;
			if let Some(last) = inner.bits.last_mut() {
				*last &= mask;
			}
		}
	}

	pub fn extend(&mut self, other: &BitVec) {
		for bit in other.iter() {
			self.push(bit);
		}
	}

	pub fn count_ones(&self) -> usize {
		let full: usize = self.inner.bits.iter().map(|b| b.count_ones() as usize).sum();
		let dangling = if self.inner.len % 8 != 0 {
			let mask = !((1u8 << (self.inner.len % 8)) - 1);
			match self.inner.bits.last() {
				Some(last) => (last & mask).count_ones() as usize,
				None => 0,
			}
		} else {
			0
		};
		full - dangling
	}

	pub fn count_zeros(&self) -> usize {
		self.inner.len - self.count_ones()
	}

	pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
		(0..self.inner.len).map(move |i| self.get(i))
	}
}

impl From<Vec<bool>> for BitVec {
	fn from(value: Vec<bool>) -> Self {
		BitVec::from_slice(&value)
	}
}

impl<const N: usize> From<[bool; N]> for BitVec {
	fn from(value: [bool; N]) -> Self {
		BitVec::from_slice(&value)
	}
}

impl Serialize for BitVec {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		self.inner.serialize(serializer)
	}
}

impl<'de> Deserialize<'de> for BitVec {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		Ok(Self {
			inner: Arc::new(BitVecInner::deserialize(deserializer)?),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_push_and_get() {
		let mut bv = BitVec::empty();
		bv.push(true);
		bv.push(false);
		bv.push(true);

		assert_eq!(bv.len(), 3);
		assert!(bv.get(0));
		assert!(!bv.get(1));
		assert!(bv.get(2));
	}

	#[test]
	fn test_cross_byte_boundary() {
		let bv = BitVec::from_fn(17, |i| i % 3 == 0);
		for i in 0..17 {
			assert_eq!(bv.get(i), i % 3 == 0, "mismatch at bit {i}");
		}
	}

	#[test]
	fn test_count_ones_ignores_dangling_bits() {
		let mut bv = BitVec::repeat(5, true);
		assert_eq!(bv.count_ones(), 5);
		bv.set(2, false);
		assert_eq!(bv.count_ones(), 4);
		assert_eq!(bv.count_zeros(), 1);
	}

	#[test]
	fn test_repeat_true_has_clean_tail() {
		// repeat(_, true) fills whole bytes; count_ones must not see
		// the bits past len.
		let bv = BitVec::repeat(3, true);
		assert_eq!(bv.count_ones(), 3);
	}

	#[test]
	fn test_copy_on_write() {
		let mut a = BitVec::repeat(8, false);
		let b = a.clone();
		a.set(0, true);
		assert!(a.get(0));
		assert!(!b.get(0));
	}

	#[test]
	fn test_extend() {
		let mut a = BitVec::from_slice(&[true, false]);
		a.extend(&BitVec::from_slice(&[false, true]));
		let collected: Vec<bool> = a.iter().collect();
		assert_eq!(collected, vec![true, false, false, true]);
	}
}
