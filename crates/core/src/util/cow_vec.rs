// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::{
	fmt,
	fmt::Debug,
	ops::{Deref, Index},
	sync::Arc,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A clone-on-write vector. Clones share the backing storage; the first
/// mutation through a shared handle forks it. This is what makes views
/// over column data cheap: slicing and passing batches around never
/// copies values.
pub struct CowVec<T> {
	inner: Arc<Vec<T>>,
}

impl<T> CowVec<T> {
	pub fn new(values: Vec<T>) -> Self {
		Self {
			inner: Arc::new(values),
		}
	}

	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			inner: Arc::new(Vec::with_capacity(capacity)),
		}
	}

	pub fn len(&self) -> usize {
		self.inner.len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}

	pub fn capacity(&self) -> usize {
		self.inner.capacity()
	}

	pub fn get(&self, index: usize) -> Option<&T> {
		self.inner.get(index)
	}

	pub fn as_slice(&self) -> &[T] {
		self.inner.as_slice()
	}

	pub fn iter(&self) -> std::slice::Iter<'_, T> {
		self.inner.iter()
	}
}

impl<T: Clone> CowVec<T> {
	pub fn make_mut(&mut self) -> &mut Vec<T> {
		Arc::make_mut(&mut self.inner)
	}

	pub fn push(&mut self, value: T) {
		self.make_mut().push(value);
	}

	pub fn clear(&mut self) {
		self.make_mut().clear();
	}

	pub fn truncate(&mut self, len: usize) {
		self.make_mut().truncate(len);
	}

	pub fn extend(&mut self, values: impl IntoIterator<Item = T>) {
		self.make_mut().extend(values);
	}

	pub fn to_vec(&self) -> Vec<T> {
		self.inner.as_ref().clone()
	}
}

impl<T> Deref for CowVec<T> {
	type Target = [T];

	fn deref(&self) -> &Self::Target {
		self.inner.as_slice()
	}
}

impl<T> Index<usize> for CowVec<T> {
	type Output = T;

	fn index(&self, index: usize) -> &Self::Output {
		&self.inner[index]
	}
}

impl<T> Clone for CowVec<T> {
	fn clone(&self) -> Self {
		Self {
			inner: Arc::clone(&self.inner),
		}
	}
}

impl<T> Default for CowVec<T> {
	fn default() -> Self {
		Self::new(Vec::new())
	}
}

impl<T: Debug> Debug for CowVec<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(self.inner.iter()).finish()
	}
}

impl<T: PartialEq> PartialEq for CowVec<T> {
	fn eq(&self, other: &Self) -> bool {
		self.inner == other.inner
	}
}

impl<T: Clone> From<Vec<T>> for CowVec<T> {
	fn from(values: Vec<T>) -> Self {
		Self::new(values)
	}
}

impl<T: Clone> FromIterator<T> for CowVec<T> {
	fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
		Self::new(iter.into_iter().collect())
	}
}

impl<T: Clone> IntoIterator for CowVec<T> {
	type Item = T;
	type IntoIter = std::vec::IntoIter<T>;

	fn into_iter(self) -> Self::IntoIter {
		match Arc::try_unwrap(self.inner) {
			Ok(values) => values.into_iter(),
			Err(shared) => shared.as_ref().clone().into_iter(),
		}
	}
}

impl<'a, T> IntoIterator for &'a CowVec<T> {
	type Item = &'a T;
	type IntoIter = std::slice::Iter<'a, T>;

	fn into_iter(self) -> Self::IntoIter {
		self.inner.iter()
	}
}

impl<T: Serialize> Serialize for CowVec<T> {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		self.inner.serialize(serializer)
	}
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for CowVec<T> {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		Ok(Self {
			inner: Arc::new(Vec::deserialize(deserializer)?),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_shared_until_mutation() {
		let mut a = CowVec::new(vec![1, 2, 3]);
		let b = a.clone();

		a.push(4);

		assert_eq!(a.as_slice(), &[1, 2, 3, 4]);
		assert_eq!(b.as_slice(), &[1, 2, 3]);
	}

	#[test]
	fn test_unique_mutation_reuses_storage() {
		let mut v: CowVec<i32> = CowVec::with_capacity(8);
		let ptr = v.as_slice().as_ptr();
		v.push(1);
		v.push(2);
		assert_eq!(v.as_slice().as_ptr(), ptr);
	}

	#[test]
	fn test_clear_keeps_capacity() {
		let mut v = CowVec::new(Vec::with_capacity(16));
		v.extend([1, 2, 3]);
		v.clear();
		assert!(v.is_empty());
		assert!(v.capacity() >= 16);
	}
}
