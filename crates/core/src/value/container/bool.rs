// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use serde::{Deserialize, Serialize};

use crate::util::BitVec;

/// Boolean column storage: packed values and a packed validity bitmap.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoolContainer {
	values: BitVec,
	bitvec: BitVec,
}

impl BoolContainer {
	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			values: BitVec::with_capacity(capacity),
			bitvec: BitVec::with_capacity(capacity),
		}
	}

	pub fn from_vec(values: Vec<bool>) -> Self {
		let len = values.len();
		Self {
			values: BitVec::from_slice(&values),
			bitvec: BitVec::repeat(len, true),
		}
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	pub fn capacity(&self) -> usize {
		self.values.capacity()
	}

	pub fn push(&mut self, value: bool) {
		self.values.push(value);
		self.bitvec.push(true);
	}

	pub fn push_undefined(&mut self) {
		self.values.push(false);
		self.bitvec.push(false);
	}

	pub fn get(&self, index: usize) -> Option<bool> {
		if index < self.len() && self.bitvec.get(index) {
			Some(self.values.get(index))
		} else {
			None
		}
	}

	/// Raw value, `false` when undefined. Kernels that already consulted
	/// the skip vector use this to stay branch-free.
	pub fn value(&self, index: usize) -> bool {
		self.values.get(index)
	}

	pub fn is_defined(&self, index: usize) -> bool {
		index < self.len() && self.bitvec.get(index)
	}

	pub fn bitvec(&self) -> &BitVec {
		&self.bitvec
	}

	pub fn set_bitvec(&mut self, bitvec: BitVec) {
		debug_assert_eq!(self.values.len(), bitvec.len());
		self.bitvec = bitvec;
	}

	pub fn clear(&mut self) {
		self.values.clear();
		self.bitvec.clear();
	}

	pub fn extend(&mut self, other: &Self) {
		self.values.extend(&other.values);
		self.bitvec.extend(&other.bitvec);
	}

	pub fn extend_range(&mut self, other: &Self, from: usize, to: usize) {
		for i in from..to {
			self.values.push(other.values.get(i));
			self.bitvec.push(other.bitvec.get(i));
		}
	}

	pub fn slice(&self, start: usize, end: usize) -> Self {
		let mut out = Self::with_capacity(end - start);
		out.extend_range(self, start, end);
		out
	}

	pub fn gather(&self, indices: &[usize]) -> Self {
		let mut out = Self::with_capacity(indices.len());
		for &i in indices {
			out.values.push(self.values.get(i));
			out.bitvec.push(self.bitvec.get(i));
		}
		out
	}

	pub fn as_string(&self, index: usize) -> String {
		match self.get(index) {
			Some(value) => value.to_string(),
			None => "null".to_string(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_push_and_get() {
		let mut c = BoolContainer::with_capacity(4);
		c.push(true);
		c.push_undefined();
		c.push(false);

		assert_eq!(c.get(0), Some(true));
		assert_eq!(c.get(1), None);
		assert_eq!(c.get(2), Some(false));
		assert!(!c.value(1));
	}
}
