// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::arena::{Arena, ArenaRef};
use crate::util::{BitVec, CowVec};

/// Binary column storage; the byte-payload twin of the string container.
#[derive(Clone, Debug, PartialEq)]
pub struct BinaryContainer {
	arena: Arena,
	refs: CowVec<ArenaRef>,
	bitvec: BitVec,
}

impl Default for BinaryContainer {
	fn default() -> Self {
		Self {
			arena: Arena::new(),
			refs: CowVec::default(),
			bitvec: BitVec::empty(),
		}
	}
}

impl BinaryContainer {
	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			arena: Arena::new(),
			refs: CowVec::with_capacity(capacity),
			bitvec: BitVec::with_capacity(capacity),
		}
	}

	pub fn from_vec(values: Vec<Vec<u8>>) -> Self {
		let mut out = Self::with_capacity(values.len());
		for value in &values {
			out.push(value);
		}
		out
	}

	pub fn len(&self) -> usize {
		self.refs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.refs.is_empty()
	}

	pub fn capacity(&self) -> usize {
		self.refs.capacity()
	}

	pub fn push(&mut self, value: &[u8]) {
		let r = self.arena.append(value);
		self.refs.push(r);
		self.bitvec.push(true);
	}

	pub fn push_undefined(&mut self) {
		self.refs.push(ArenaRef::default());
		self.bitvec.push(false);
	}

	pub fn get(&self, index: usize) -> Option<&[u8]> {
		if index < self.len() && self.bitvec.get(index) {
			Some(self.value(index))
		} else {
			None
		}
	}

	pub fn value(&self, index: usize) -> &[u8] {
		self.arena.bytes(self.refs[index])
	}

	pub fn is_defined(&self, index: usize) -> bool {
		index < self.len() && self.bitvec.get(index)
	}

	pub fn bitvec(&self) -> &BitVec {
		&self.bitvec
	}

	pub fn set_bitvec(&mut self, bitvec: BitVec) {
		debug_assert_eq!(self.refs.len(), bitvec.len());
		self.bitvec = bitvec;
	}

	pub fn clear(&mut self) {
		self.refs.clear();
		self.bitvec.clear();
		self.arena.reset();
	}

	pub fn arena_bytes(&self) -> usize {
		self.arena.allocated_bytes()
	}

	pub fn extend(&mut self, other: &Self) {
		self.extend_range(other, 0, other.len());
	}

	pub fn extend_range(&mut self, other: &Self, from: usize, to: usize) {
		for i in from..to {
			match other.get(i) {
				Some(value) => self.push(value),
				None => self.push_undefined(),
			}
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
			match self.get(i) {
				Some(value) => out.push(value),
				None => out.push_undefined(),
			}
		}
		out
	}

	pub fn as_string(&self, index: usize) -> String {
		match self.get(index) {
			Some(value) => value.iter().map(|b| format!("{b:02x}")).collect(),
			None => "null".to_string(),
		}
	}
}

impl Serialize for BinaryContainer {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let values: Vec<Option<&[u8]>> = (0..self.len()).map(|i| self.get(i)).collect();
		values.serialize(serializer)
	}
}

impl<'de> Deserialize<'de> for BinaryContainer {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let values = Vec::<Option<Vec<u8>>>::deserialize(deserializer)?;
		let mut out = Self::with_capacity(values.len());
		for value in &values {
			match value {
				Some(value) => out.push(value),
				None => out.push_undefined(),
			}
		}
		Ok(out)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_push_and_get() {
		let mut c = BinaryContainer::with_capacity(2);
		c.push(&[1, 2, 3]);
		c.push_undefined();
		assert_eq!(c.get(0), Some([1u8, 2, 3].as_slice()));
		assert_eq!(c.get(1), None);
	}
}
