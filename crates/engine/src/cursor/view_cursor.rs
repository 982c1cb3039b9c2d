// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::sync::atomic::{AtomicBool, Ordering};

use supersonic_core::{Permutation, Schema, View, error::diagnostic::operation};

use super::{Cursor, CursorId, NextResult};

/// Streams a view in batches, optionally through a row permutation. The
/// backing storage is shared copy-on-write, so a permuted cursor only
/// materializes the rows of the batch it hands out.
pub struct ViewCursor {
	view: View,
	selection: Option<Permutation>,
	position: usize,
	interrupted: AtomicBool,
}

impl ViewCursor {
	pub fn new(view: View) -> Self {
		Self {
			view,
			selection: None,
			position: 0,
			interrupted: AtomicBool::new(false),
		}
	}

	/// Reads rows in permutation order; the sorted-run read path.
	pub fn with_selection(view: View, selection: Permutation) -> Self {
		debug_assert_eq!(view.row_count(), selection.len());
		Self {
			view,
			selection: Some(selection),
			position: 0,
			interrupted: AtomicBool::new(false),
		}
	}

	fn remaining(&self) -> usize {
		self.view.row_count() - self.position
	}
}

impl Cursor for ViewCursor {
	fn schema(&self) -> &Schema {
		self.view.schema()
	}

	fn next(&mut self, max_row_count: usize) -> crate::Result<NextResult> {
		if self.interrupted.load(Ordering::Relaxed) {
			return Err(supersonic_core::Error(operation::interrupted()));
		}
		if self.remaining() == 0 {
			return Ok(NextResult::Eos);
		}
		let rows = self.remaining().min(max_row_count).max(1);
		let batch = match &self.selection {
			Some(selection) => {
				let indices = &selection.positions()[self.position..self.position + rows];
				let columns =
					self.view.columns().iter().map(|c| c.gather(indices)).collect();
				View::new(self.view.schema().clone(), columns, rows)
			}
			None => self.view.slice(self.position, rows),
		};
		self.position += rows;
		Ok(NextResult::Batch(batch))
	}

	fn interrupt(&self) {
		self.interrupted.store(true, Ordering::Relaxed);
	}

	fn cursor_id(&self) -> CursorId {
		CursorId::View
	}
}

#[cfg(test)]
mod tests {
	use supersonic_core::{Attribute, ColumnData, DataType, Value};

	use super::*;

	fn view() -> View {
		let schema = Schema::new(vec![Attribute::nullable("x", DataType::Int64)]).unwrap();
		View::new(schema, vec![ColumnData::int64([5, 4, 1, 4])], 4)
	}

	#[test]
	fn test_batches() {
		let mut cursor = ViewCursor::new(view());
		match cursor.next(3).unwrap() {
			NextResult::Batch(batch) => assert_eq!(batch.row_count(), 3),
			_ => panic!("expected a batch"),
		}
		match cursor.next(3).unwrap() {
			NextResult::Batch(batch) => assert_eq!(batch.row_count(), 1),
			_ => panic!("expected a batch"),
		}
		assert!(cursor.next(3).unwrap().is_eos());
	}

	#[test]
	fn test_selection_order() {
		let mut permutation = Permutation::identity(4);
		let values = [5i64, 4, 1, 4];
		permutation.sort(0, 4, |a, b| values[a] < values[b]);
		let mut cursor = ViewCursor::with_selection(view(), permutation);
		match cursor.next(10).unwrap() {
			NextResult::Batch(batch) => {
				let got: Vec<Value> = batch.rows().map(|r| r[0].clone()).collect();
				assert_eq!(
					got,
					vec![
						Value::Int64(1),
						Value::Int64(4),
						Value::Int64(4),
						Value::Int64(5)
					]
				);
			}
			_ => panic!("expected a batch"),
		}
	}

	#[test]
	fn test_interrupt() {
		let mut cursor = ViewCursor::new(view());
		cursor.interrupt();
		assert_eq!(cursor.next(1).unwrap_err().code(), "OPERATION_001");
	}
}
