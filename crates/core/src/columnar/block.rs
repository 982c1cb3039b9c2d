// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::sync::Arc;

use super::{data::ColumnData, schema::Schema, view::View};
use crate::{
	error::diagnostic::memory,
	memory::{BufferAllocator, Reservation},
};

/// Owned column storage for up to `row_capacity` rows, accounted against
/// a buffer allocator for its lifetime. Expression kernels write their
/// batch output here and hand out views over it.
#[derive(Debug)]
pub struct Block {
	schema: Schema,
	columns: Vec<ColumnData>,
	row_capacity: usize,
	#[allow(dead_code)]
	reservation: Reservation,
}

impl Block {
	pub fn with_capacity(
		schema: Schema,
		allocator: &Arc<dyn BufferAllocator>,
		row_capacity: usize,
	) -> crate::Result<Self> {
		let bytes = (schema.fixed_row_bytes() * row_capacity) as u64;
		let reservation = Reservation::acquire(allocator, bytes).ok_or_else(|| {
			crate::error::Error(memory::memory_exceeded(
				allocator.quota(),
				allocator.available(),
				allocator.usage(),
				allocator.available(),
			))
		})?;
		let columns = schema
			.attributes()
			.iter()
			.map(|a| ColumnData::with_capacity(a.data_type(), row_capacity))
			.collect();
		Ok(Self {
			schema,
			columns,
			row_capacity,
			reservation,
		})
	}

	pub fn schema(&self) -> &Schema {
		&self.schema
	}

	pub fn row_capacity(&self) -> usize {
		self.row_capacity
	}

	pub fn column(&self, position: usize) -> &ColumnData {
		&self.columns[position]
	}

	pub fn column_mut(&mut self, position: usize) -> &mut ColumnData {
		&mut self.columns[position]
	}

	pub fn columns_mut(&mut self) -> &mut [ColumnData] {
		&mut self.columns
	}

	/// Clears every column for the next batch, keeping fixed-width
	/// capacity. Variable-length columns reset their arenas here, the
	/// once-per-evaluate arena reset.
	pub fn clear(&mut self) {
		for column in &mut self.columns {
			column.clear();
		}
	}

	/// A view over the first `row_count` written rows. Cheap: clones
	/// share container storage copy-on-write.
	pub fn view(&self, row_count: usize) -> View {
		debug_assert!(row_count <= self.row_capacity);
		View::new(self.schema.clone(), self.columns.clone(), row_count)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		columnar::schema::Attribute,
		memory::HeapBufferAllocator,
		value::{DataType, Value},
	};

	fn allocator() -> Arc<dyn BufferAllocator> {
		Arc::new(HeapBufferAllocator::new())
	}

	#[test]
	fn test_write_then_view() {
		let schema = Schema::new(vec![Attribute::nullable("a", DataType::Int32)]).unwrap();
		let allocator = allocator();
		let mut block = Block::with_capacity(schema, &allocator, 4).unwrap();

		match block.column_mut(0) {
			ColumnData::Int32(c) => {
				c.push(1);
				c.push(2);
			}
			_ => unreachable!(),
		}

		let view = block.view(2);
		assert_eq!(view.row(1), vec![Value::Int32(2)]);
	}

	#[test]
	fn test_reservation_released_on_drop() {
		let schema = Schema::new(vec![Attribute::nullable("a", DataType::Int64)]).unwrap();
		let root = Arc::new(HeapBufferAllocator::new());
		let allocator: Arc<dyn BufferAllocator> = root.clone();
		{
			let _block = Block::with_capacity(schema, &allocator, 128).unwrap();
			assert!(root.usage() > 0);
		}
		assert_eq!(root.usage(), 0);
	}

	#[test]
	fn test_quota_failure_is_an_error() {
		use crate::memory::MemoryLimit;

		let schema = Schema::new(vec![Attribute::nullable("a", DataType::Int64)]).unwrap();
		let tight: Arc<dyn BufferAllocator> =
			Arc::new(MemoryLimit::new(16, Arc::new(HeapBufferAllocator::new())));
		let result = Block::with_capacity(schema, &tight, 1024);
		assert_eq!(result.unwrap_err().code(), "MEMORY_001");
	}
}
