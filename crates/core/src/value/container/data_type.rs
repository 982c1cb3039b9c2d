// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use serde::{Deserialize, Serialize};

use crate::{
	util::{BitVec, CowVec},
	value::DataType,
};

/// Column storage whose values are data types themselves. Rare, but part
/// of the closed type set (reflection over schemas).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DataTypeContainer {
	values: CowVec<DataType>,
	bitvec: BitVec,
}

impl DataTypeContainer {
	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			values: CowVec::with_capacity(capacity),
			bitvec: BitVec::with_capacity(capacity),
		}
	}

	pub fn from_vec(values: Vec<DataType>) -> Self {
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

	pub fn push(&mut self, value: DataType) {
		self.values.push(value);
		self.bitvec.push(true);
	}

	pub fn push_undefined(&mut self) {
		self.values.push(DataType::Int32);
		self.bitvec.push(false);
	}

	pub fn get(&self, index: usize) -> Option<DataType> {
		if index < self.len() && self.bitvec.get(index) {
			Some(self.values[index])
		} else {
			None
		}
	}

	pub fn is_defined(&self, index: usize) -> bool {
		index < self.len() && self.bitvec.get(index)
	}

	pub fn as_slice(&self) -> &[DataType] {
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
		self.extend_range(other, 0, other.len());
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

	pub fn as_string(&self, index: usize) -> String {
		match self.get(index) {
			Some(value) => value.to_string(),
			None => "null".to_string(),
		}
	}
}
