// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::{
	num::IsNumber,
	util::{BitVec, CowVec},
};

/// Fixed-width numeric column storage: a value vector and a validity
/// bitmap (bit set = defined).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NumberContainer<T>
where
	T: IsNumber,
{
	values: CowVec<T>,
	bitvec: BitVec,
}

impl<T> Default for NumberContainer<T>
where
	T: IsNumber,
{
	fn default() -> Self {
		Self {
			values: CowVec::default(),
			bitvec: BitVec::empty(),
		}
	}
}

impl<T> NumberContainer<T>
where
	T: IsNumber,
{
	pub fn new(values: Vec<T>, bitvec: BitVec) -> Self {
		debug_assert_eq!(values.len(), bitvec.len());
		Self {
			values: CowVec::new(values),
			bitvec,
		}
	}

	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			values: CowVec::with_capacity(capacity),
			bitvec: BitVec::with_capacity(capacity),
		}
	}

	pub fn from_vec(values: Vec<T>) -> Self {
		let len = values.len();
		Self {
			values: CowVec::new(values),
			bitvec: BitVec::repeat(len, true),
		}
	}

	pub fn len(&self) -> usize {
		debug_assert_eq!(self.values.len(), self.bitvec.len());
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	pub fn capacity(&self) -> usize {
		self.values.capacity()
	}

	pub fn push(&mut self, value: T) {
		self.values.push(value);
		self.bitvec.push(true);
	}

	pub fn push_undefined(&mut self) {
		self.values.push(T::default());
		self.bitvec.push(false);
	}

	pub fn get(&self, index: usize) -> Option<&T> {
		if index < self.len() && self.bitvec.get(index) {
			self.values.get(index)
		} else {
			None
		}
	}

	pub fn is_defined(&self, index: usize) -> bool {
		index < self.len() && self.bitvec.get(index)
	}

	pub fn as_slice(&self) -> &[T] {
		self.values.as_slice()
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
		self.values.extend(other.values.iter().copied());
		self.bitvec.extend(&other.bitvec);
	}

	pub fn extend_range(&mut self, other: &Self, from: usize, to: usize) {
		self.values.extend(other.values.as_slice()[from..to].iter().copied());
		for i in from..to {
			self.bitvec.push(other.bitvec.get(i));
		}
	}

	pub fn iter(&self) -> impl Iterator<Item = Option<T>> + '_ {
		self.values.iter().zip(self.bitvec.iter()).map(|(&v, defined)| {
			if defined {
				Some(v)
			} else {
				None
			}
		})
	}

	pub fn slice(&self, start: usize, end: usize) -> Self {
		let mut out = Self::with_capacity(end - start);
		out.extend_range(self, start, end);
		out
	}

	pub fn gather(&self, indices: &[usize]) -> Self {
		let mut out = Self::with_capacity(indices.len());
		for &i in indices {
			if self.bitvec.get(i) {
				out.push(self.values[i]);
			} else {
				out.push_undefined();
			}
		}
		out
	}

	pub fn as_string(&self, index: usize) -> String
	where
		T: ToString,
	{
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
		let mut c = NumberContainer::<i64>::with_capacity(4);
		c.push(10);
		c.push_undefined();
		c.push(30);

		assert_eq!(c.len(), 3);
		assert_eq!(c.get(0), Some(&10));
		assert_eq!(c.get(1), None);
		assert_eq!(c.get(2), Some(&30));
		// Undefined slots hold the default so positional access stays
		// aligned.
		assert_eq!(c.as_slice(), &[10, 0, 30]);
	}

	#[test]
	fn test_gather() {
		let c = NumberContainer::<i32>::from_vec(vec![5, 6, 7]);
		let g = c.gather(&[2, 0, 0]);
		assert_eq!(g.as_slice(), &[7, 5, 5]);
	}

	#[test]
	fn test_slice() {
		let c = NumberContainer::<i32>::from_vec(vec![1, 2, 3, 4]);
		let s = c.slice(1, 3);
		assert_eq!(s.as_slice(), &[2, 3]);
	}
}
