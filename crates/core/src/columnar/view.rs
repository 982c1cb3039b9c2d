// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use serde::{Deserialize, Serialize};

use super::{data::ColumnData, schema::Schema};
use crate::value::Value;

/// A window onto columnar data: a schema, one column per attribute, and
/// an explicit row count. Cloning shares storage (containers are
/// copy-on-write), so passing views around never copies values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct View {
	schema: Schema,
	columns: Vec<ColumnData>,
	row_count: usize,
}

impl View {
	pub fn new(schema: Schema, columns: Vec<ColumnData>, row_count: usize) -> Self {
		debug_assert_eq!(schema.attribute_count(), columns.len());
		debug_assert!(columns.iter().all(|c| c.len() >= row_count));
		Self {
			schema,
			columns,
			row_count,
		}
	}

	pub fn empty(schema: Schema) -> Self {
		let columns = schema.attributes().iter().map(|a| ColumnData::with_capacity(a.data_type(), 0)).collect();
		Self {
			schema,
			columns,
			row_count: 0,
		}
	}

	pub fn schema(&self) -> &Schema {
		&self.schema
	}

	pub fn column(&self, position: usize) -> &ColumnData {
		&self.columns[position]
	}

	pub fn columns(&self) -> &[ColumnData] {
		&self.columns
	}

	pub fn row_count(&self) -> usize {
		self.row_count
	}

	pub fn is_empty(&self) -> bool {
		self.row_count == 0
	}

	/// A sub-window of `[offset, offset + len)` rows. Copies descriptors
	/// and validity only, never payloads.
	pub fn slice(&self, offset: usize, len: usize) -> View {
		debug_assert!(offset + len <= self.row_count);
		View {
			schema: self.schema.clone(),
			columns: self.columns.iter().map(|c| c.slice(offset, offset + len)).collect(),
			row_count: len,
		}
	}

	/// Row-at-a-time access for tests and diagnostics.
	pub fn row(&self, index: usize) -> Vec<Value> {
		debug_assert!(index < self.row_count);
		self.columns.iter().map(|c| c.get_value(index)).collect()
	}

	pub fn rows(&self) -> impl Iterator<Item = Vec<Value>> + '_ {
		(0..self.row_count).map(|i| self.row(i))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::columnar::schema::Attribute;
	use crate::value::DataType;

	fn view() -> View {
		let schema = Schema::new(vec![Attribute::nullable("x", DataType::Int64)]).unwrap();
		View::new(schema, vec![ColumnData::int64([1, 2, 3, 4])], 4)
	}

	#[test]
	fn test_slice() {
		let sliced = view().slice(1, 2);
		assert_eq!(sliced.row_count(), 2);
		assert_eq!(sliced.row(0), vec![Value::Int64(2)]);
		assert_eq!(sliced.row(1), vec![Value::Int64(3)]);
	}

	#[test]
	fn test_clone_shares_storage() {
		let a = view();
		let b = a.clone();
		assert_eq!(a.row(0), b.row(0));
	}
}
