// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{
	util::{BitVec, CowVec},
	value::IsTemporal,
};

/// Column storage for date and datetime values. Same layout as the
/// numeric container; the separate type keeps ordering and rendering on
/// the temporal domain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TemporalContainer<T>
where
	T: IsTemporal,
{
	values: CowVec<T>,
	bitvec: BitVec,
}

impl<T> Default for TemporalContainer<T>
where
	T: IsTemporal,
{
	fn default() -> Self {
		Self {
			values: CowVec::default(),
			bitvec: BitVec::empty(),
		}
	}
}

impl<T> TemporalContainer<T>
where
	T: IsTemporal,
{
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
		T: Display,
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
	use crate::value::Date;

	#[test]
	fn test_push_and_get() {
		let mut c = TemporalContainer::<Date>::with_capacity(2);
		c.push(Date(7));
		c.push_undefined();
		assert_eq!(c.get(0), Some(&Date(7)));
		assert_eq!(c.get(1), None);
	}
}
