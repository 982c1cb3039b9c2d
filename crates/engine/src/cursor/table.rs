// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::sync::Arc;

use supersonic_core::{
	ColumnData, Schema, View,
	memory::{BufferAllocator, Reservation},
};

const INITIAL_ROW_CAPACITY: usize = 16;

/// A growable in-memory batch buffer. Growth doubles the row capacity
/// and is gated by the allocator; `write` accepts as many rows as fit
/// and reports zero under memory pressure, which is the buffering
/// sorter's cue to flush.
pub struct Table {
	schema: Schema,
	columns: Vec<ColumnData>,
	row_count: usize,
	row_capacity: usize,
	variable_bytes: u64,
	allocator: Arc<dyn BufferAllocator>,
	reservation: Option<Reservation>,
}

impl Table {
	pub fn new(schema: Schema, allocator: Arc<dyn BufferAllocator>) -> Self {
		let columns =
			schema.attributes().iter().map(|a| ColumnData::with_capacity(a.data_type(), 0)).collect();
		Self {
			schema,
			columns,
			row_count: 0,
			row_capacity: 0,
			variable_bytes: 0,
			allocator,
			reservation: None,
		}
	}

	pub fn schema(&self) -> &Schema {
		&self.schema
	}

	pub fn row_count(&self) -> usize {
		self.row_count
	}

	pub fn view(&self) -> View {
		View::new(self.schema.clone(), self.columns.clone(), self.row_count)
	}

	fn try_reserve_more(&mut self, bytes: u64) -> bool {
		match &mut self.reservation {
			Some(reservation) => reservation.grow(bytes),
			None => match Reservation::acquire(&self.allocator, bytes) {
				Some(reservation) => {
					self.reservation = Some(reservation);
					true
				}
				None => false,
			},
		}
	}

	/// Appends rows of `view` starting at `from`. Returns how many were
	/// accepted; zero means the quota is exhausted at the current
	/// capacity.
	pub fn write(&mut self, view: &View, from: usize) -> usize {
		debug_assert!(from <= view.row_count());
		let requested = view.row_count() - from;
		if requested == 0 {
			return 0;
		}
		if self.row_count == self.row_capacity {
			let grown = self.row_capacity.max(INITIAL_ROW_CAPACITY / 2) * 2;
			let bytes = ((grown - self.row_capacity) * self.schema.fixed_row_bytes()) as u64;
			if !self.try_reserve_more(bytes) {
				return 0;
			}
			self.row_capacity = grown;
		}
		let mut rows = requested.min(self.row_capacity - self.row_count);
		// Variable-length payloads are accounted exactly; shrink the
		// batch until the quota covers it.
		loop {
			let variable: u64 = view
				.columns()
				.iter()
				.map(|src| src.variable_bytes_range(from, from + rows) as u64)
				.sum();
			if variable == 0 || self.try_reserve_more(variable) {
				self.variable_bytes += variable;
				break;
			}
			rows /= 2;
			if rows == 0 {
				return 0;
			}
		}
		for (column, source) in self.columns.iter_mut().zip(view.columns()) {
			column.extend_range(source, from, from + rows);
		}
		self.row_count += rows;
		rows
	}

	/// Drops all rows, keeping fixed-width capacity for reuse.
	pub fn clear(&mut self) {
		for column in &mut self.columns {
			column.clear();
		}
		self.row_count = 0;
		if let Some(reservation) = &mut self.reservation {
			reservation.shrink(self.variable_bytes);
		}
		self.variable_bytes = 0;
	}

	/// Releases the backing storage entirely; the next write starts
	/// from scratch. Used when the quota has no headroom left.
	pub fn compact(&mut self) {
		debug_assert_eq!(self.row_count, 0);
		self.columns = self
			.schema
			.attributes()
			.iter()
			.map(|a| ColumnData::with_capacity(a.data_type(), 0))
			.collect();
		self.row_capacity = 0;
		self.reservation = None;
		self.variable_bytes = 0;
	}
}

#[cfg(test)]
mod tests {
	use supersonic_core::{
		Attribute, DataType,
		memory::{HeapBufferAllocator, MemoryLimit},
	};

	use super::*;

	fn schema() -> Schema {
		Schema::new(vec![
			Attribute::nullable("n", DataType::Int64),
			Attribute::nullable("s", DataType::Utf8),
		])
		.unwrap()
	}

	fn batch(rows: usize) -> View {
		View::new(
			schema(),
			vec![
				ColumnData::int64((0..rows as i64).collect::<Vec<_>>()),
				ColumnData::utf8((0..rows).map(|i| format!("row-{i}"))),
			],
			rows,
		)
	}

	#[test]
	fn test_write_and_view() {
		let allocator: Arc<dyn BufferAllocator> = Arc::new(HeapBufferAllocator::new());
		let mut table = Table::new(schema(), allocator);
		let view = batch(5);
		let mut from = 0;
		while from < view.row_count() {
			let written = table.write(&view, from);
			assert!(written > 0);
			from += written;
		}
		assert_eq!(table.row_count(), 5);
		assert_eq!(table.view().row(4)[0], supersonic_core::Value::Int64(4));
	}

	#[test]
	fn test_write_zero_under_pressure() {
		let allocator: Arc<dyn BufferAllocator> =
			Arc::new(MemoryLimit::new(64, Arc::new(HeapBufferAllocator::new())));
		let mut table = Table::new(schema(), allocator);
		let view = batch(100);
		let mut total = 0;
		loop {
			let written = table.write(&view, total);
			if written == 0 {
				break;
			}
			total += written;
		}
		assert!(total < 100);
	}

	#[test]
	fn test_clear_keeps_capacity_compact_releases() {
		let root = Arc::new(HeapBufferAllocator::new());
		let allocator: Arc<dyn BufferAllocator> = root.clone();
		let mut table = Table::new(schema(), allocator);
		let view = batch(10);
		let mut from = 0;
		while from < view.row_count() {
			from += table.write(&view, from);
		}
		let used = root.usage();
		assert!(used > 0);

		table.clear();
		assert_eq!(table.row_count(), 0);
		assert!(root.usage() > 0);

		table.compact();
		assert_eq!(root.usage(), 0);
	}
}
