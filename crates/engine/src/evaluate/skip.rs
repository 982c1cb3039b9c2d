// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Skip vectors: one bool per row, `true` meaning "this row must not be
//! computed", either a NULL propagated from below or a row a logical
//! operator short-circuited away. On kernel exit, skipped rows become
//! NULL in the output bitmap.

/// A mutable skip vector of fixed capacity. Kernels index the first
/// `row_count` entries of the current batch.
#[derive(Clone, Debug)]
pub struct SkipVector {
	bits: Vec<bool>,
}

impl SkipVector {
	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			bits: vec![false; capacity],
		}
	}

	pub fn capacity(&self) -> usize {
		self.bits.len()
	}

	pub fn get(&self, index: usize) -> bool {
		self.bits[index]
	}

	pub fn set(&mut self, index: usize, value: bool) {
		self.bits[index] = value;
	}

	pub fn zero(&mut self, row_count: usize) {
		self.bits[..row_count].fill(false);
	}

	pub fn copy_from(&mut self, other: &SkipVector, row_count: usize) {
		self.bits[..row_count].copy_from_slice(&other.bits[..row_count]);
	}

	pub fn count_skipped(&self, row_count: usize) -> usize {
		self.bits[..row_count].iter().filter(|&&skip| skip).count()
	}

	pub fn as_slice(&self, row_count: usize) -> &[bool] {
		&self.bits[..row_count]
	}
}

/// Density check behind the unconditional-write fast path: with
/// `threshold` = 100, true means more than 1% of the batch is skipped.
pub fn selectivity_is_greater_than(skip: &SkipVector, row_count: usize, threshold: usize) -> bool {
	skip.count_skipped(row_count) * threshold > row_count
}

/// Pre-allocated skip-vector storage, one column per output attribute.
#[derive(Debug)]
pub struct BoolBlock {
	columns: Vec<SkipVector>,
	capacity: usize,
}

impl BoolBlock {
	pub fn new(column_count: usize, capacity: usize) -> Self {
		Self {
			columns: (0..column_count).map(|_| SkipVector::with_capacity(capacity)).collect(),
			capacity,
		}
	}

	pub fn capacity(&self) -> usize {
		self.capacity
	}

	pub fn column_count(&self) -> usize {
		self.columns.len()
	}

	pub fn zero(&mut self, row_count: usize) {
		for column in &mut self.columns {
			column.zero(row_count);
		}
	}

	pub fn view(&mut self, row_count: usize) -> BoolView<'_> {
		debug_assert!(row_count <= self.capacity);
		BoolView {
			columns: &mut self.columns,
			row_count,
		}
	}

	/// A view over the first `column_count` columns only; projection
	/// kernels hand children a window matching the child's width.
	pub fn view_prefix(&mut self, column_count: usize, row_count: usize) -> BoolView<'_> {
		debug_assert!(row_count <= self.capacity);
		BoolView {
			columns: &mut self.columns[..column_count],
			row_count,
		}
	}

	pub fn column(&mut self, position: usize) -> &mut SkipVector {
		&mut self.columns[position]
	}

	/// A single-column view; logical kernels keep one private column per
	/// child.
	pub fn view_column(&mut self, position: usize, row_count: usize) -> BoolView<'_> {
		debug_assert!(row_count <= self.capacity);
		BoolView {
			columns: &mut self.columns[position..=position],
			row_count,
		}
	}
}

/// A mutable window over skip vectors for the current batch.
#[derive(Debug)]
pub struct BoolView<'a> {
	columns: &'a mut [SkipVector],
	row_count: usize,
}

impl<'a> BoolView<'a> {
	pub fn column_count(&self) -> usize {
		self.columns.len()
	}

	pub fn row_count(&self) -> usize {
		self.row_count
	}

	pub fn column(&mut self, position: usize) -> &mut SkipVector {
		&mut self.columns[position]
	}

	pub fn column_ref(&self, position: usize) -> &SkipVector {
		&self.columns[position]
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_zero_prefix_only() {
		let mut skip = SkipVector::with_capacity(4);
		skip.set(1, true);
		skip.set(3, true);
		skip.zero(2);
		assert!(!skip.get(1));
		assert!(skip.get(3));
	}

	#[test]
	fn test_selectivity_threshold() {
		let mut skip = SkipVector::with_capacity(1000);
		assert!(!selectivity_is_greater_than(&skip, 1000, 100));
		for i in 0..9 {
			skip.set(i, true);
		}
		// 9 of 1000 is still below 1%... 9 * 100 = 900 <= 1000.
		assert!(!selectivity_is_greater_than(&skip, 1000, 100));
		skip.set(9, true);
		skip.set(10, true);
		assert!(selectivity_is_greater_than(&skip, 1000, 100));
	}

	#[test]
	fn test_bool_block_view() {
		let mut block = BoolBlock::new(2, 8);
		let mut view = block.view(4);
		assert_eq!(view.column_count(), 2);
		view.column(1).set(0, true);
		assert!(view.column_ref(1).get(0));
	}
}
