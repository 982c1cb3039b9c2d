// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::arena::{Arena, ArenaRef};
use crate::util::{BitVec, CowVec};

/// String column storage. Values live in an arena owned by the container;
/// the descriptor vector carries `(chunk, offset, len)` triples into it.
/// Undefined slots hold the empty descriptor so positional access stays
/// aligned.
#[derive(Clone, Debug, PartialEq)]
pub struct Utf8Container {
	arena: Arena,
	refs: CowVec<ArenaRef>,
	bitvec: BitVec,
}

impl Default for Utf8Container {
	fn default() -> Self {
		Self {
			arena: Arena::new(),
			refs: CowVec::default(),
			bitvec: BitVec::empty(),
		}
	}
}

impl Utf8Container {
	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			arena: Arena::new(),
			refs: CowVec::with_capacity(capacity),
			bitvec: BitVec::with_capacity(capacity),
		}
	}

	pub fn from_vec(values: Vec<String>) -> Self {
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

	pub fn push(&mut self, value: &str) {
		let r = self.arena.append(value.as_bytes());
		self.refs.push(r);
		self.bitvec.push(true);
	}

	pub fn push_undefined(&mut self) {
		self.refs.push(ArenaRef::default());
		self.bitvec.push(false);
	}

	pub fn get(&self, index: usize) -> Option<&str> {
		if index < self.len() && self.bitvec.get(index) {
			Some(self.value(index))
		} else {
			None
		}
	}

	/// Raw value, `""` when undefined.
	pub fn value(&self, index: usize) -> &str {
		let bytes = self.arena.bytes(self.refs[index]);
		// Descriptors are only ever created from `&str` input, so the
		// bytes are valid UTF-8.
		debug_assert!(std::str::from_utf8(bytes).is_ok());
		unsafe { std::str::from_utf8_unchecked(bytes) }
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

	/// Drops descriptors and payload bytes, keeping descriptor capacity
	/// and the arena's first chunk for reuse.
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
			Some(value) => value.to_string(),
			None => "null".to_string(),
		}
	}
}

impl Serialize for Utf8Container {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let values: Vec<Option<&str>> = (0..self.len()).map(|i| self.get(i)).collect();
		values.serialize(serializer)
	}
}

impl<'de> Deserialize<'de> for Utf8Container {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let values = Vec::<Option<String>>::deserialize(deserializer)?;
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
		let mut c = Utf8Container::with_capacity(4);
		c.push("foo");
		c.push_undefined();
		c.push("bar");

		assert_eq!(c.get(0), Some("foo"));
		assert_eq!(c.get(1), None);
		assert_eq!(c.get(2), Some("bar"));
		assert_eq!(c.value(1), "");
	}

	#[test]
	fn test_clear_resets_arena() {
		let mut c = Utf8Container::with_capacity(2);
		c.push("some payload");
		c.clear();
		assert_eq!(c.len(), 0);
		assert_eq!(c.arena_bytes(), 0);
		c.push("after");
		assert_eq!(c.get(0), Some("after"));
	}

	#[test]
	fn test_stale_view_outlives_clear() {
		let mut c = Utf8Container::with_capacity(2);
		c.push("held");
		let stale = c.clone();
		c.clear();
		assert_eq!(stale.get(0), Some("held"));
	}
}
