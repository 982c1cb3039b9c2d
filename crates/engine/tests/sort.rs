// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::sync::Arc;

use supersonic_core::{
	Attribute, ColumnData, DataType, Schema, SortKey, SortSpecification, Value, View,
	memory::{BufferAllocator, HeapBufferAllocator},
};
use supersonic_engine::{
	cursor::{Cursor, CursorId, CursorTransformer, NextResult, ViewCursor},
	sort::{BufferingSorter, BoundSortOrder, Sorter, bound_extended_sort, bound_sort},
};
use supersonic_testing::SpillDirectory;

fn allocator() -> Arc<dyn BufferAllocator> {
	Arc::new(HeapBufferAllocator::new())
}

fn drain(cursor: &mut dyn Cursor) -> Vec<Vec<Value>> {
	let mut rows = Vec::new();
	loop {
		match cursor.next(1024).unwrap() {
			NextResult::Batch(batch) => rows.extend(batch.rows()),
			NextResult::Eos => return rows,
			NextResult::WaitingOnBarrier => panic!("unexpected barrier"),
		}
	}
}

fn int_view(values: &[i64]) -> View {
	let schema = Schema::new(vec![Attribute::nullable("x", DataType::Int64)]).unwrap();
	View::new(schema, vec![ColumnData::int64(values.to_vec())], values.len())
}

// A deterministic pseudo-random sequence; no global state, reproducible
// failures.
fn pseudo_random(count: usize) -> Vec<i64> {
	let mut state = 0x2545f491_4f6cdd1du64;
	(0..count)
		.map(|_| {
			state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
			(state >> 33) as i64 % 1000
		})
		.collect()
}

#[test]
fn test_sort_single_key() {
	let dir = SpillDirectory::new().unwrap();
	let child = Box::new(ViewCursor::new(int_view(&[5, 4, 1, 4, 3, 3, 4])));
	let mut cursor = bound_sort(
		&[SortKey::ascending("x")],
		None,
		1 << 20,
		dir.path(),
		allocator(),
		child,
	)
	.unwrap();
	let rows = drain(cursor.as_mut());
	let values: Vec<i64> = rows
		.iter()
		.map(|r| match r[0] {
			Value::Int64(v) => v,
			_ => unreachable!(),
		})
		.collect();
	assert_eq!(values, vec![1, 3, 3, 4, 4, 4, 5]);
}

#[test]
fn test_sort_two_keys() {
	let dir = SpillDirectory::new().unwrap();
	let schema = Schema::new(vec![
		Attribute::nullable("first", DataType::Int64),
		Attribute::nullable("second", DataType::Int64),
	])
	.unwrap();
	let view = View::new(
		schema,
		vec![
			ColumnData::int64([5, 4, 1, 4, 3, 3, 4]),
			ColumnData::int64([3, 2, 2, 5, 1, 3, 1]),
		],
		7,
	);
	let child = Box::new(ViewCursor::new(view));
	let mut cursor = bound_sort(
		&[SortKey::ascending("first"), SortKey::ascending("second")],
		None,
		1 << 20,
		dir.path(),
		allocator(),
		child,
	)
	.unwrap();
	let rows = drain(cursor.as_mut());
	let pairs: Vec<(Value, Value)> =
		rows.into_iter().map(|mut r| (r.remove(0), r.remove(0))).collect();
	let expected = [(1, 2), (3, 1), (3, 3), (4, 1), (4, 2), (4, 5), (5, 3)];
	for (i, (a, b)) in expected.iter().enumerate() {
		assert_eq!(pairs[i], (Value::Int64(*a), Value::Int64(*b)));
	}
}

#[test]
fn test_sort_descending_puts_nulls_last() {
	let dir = SpillDirectory::new().unwrap();
	let schema = Schema::new(vec![Attribute::nullable("x", DataType::Int64)]).unwrap();
	let column = ColumnData::from_options(
		DataType::Int64,
		[Some(Value::Int64(1)), None, Some(Value::Int64(3))],
	);
	let view = View::new(schema, vec![column], 3);
	let mut cursor = bound_sort(
		&[SortKey::descending("x")],
		None,
		1 << 20,
		dir.path(),
		allocator(),
		Box::new(ViewCursor::new(view)),
	)
	.unwrap();
	let rows = drain(cursor.as_mut());
	assert_eq!(rows[0][0], Value::Int64(3));
	assert_eq!(rows[1][0], Value::Int64(1));
	assert_eq!(rows[2][0], Value::Undefined);
}

#[test]
fn test_spill_and_merge_under_tight_quota() {
	let dir = SpillDirectory::new().unwrap();
	let mut values = pseudo_random(5000);
	let schema = Schema::new(vec![Attribute::nullable("x", DataType::Int64)]).unwrap();
	let order = BoundSortOrder::bind(&[SortKey::ascending("x")], &schema).unwrap();

	// A quota that holds around a thousand rows; five thousand rows
	// must spill.
	let mut sorter = BufferingSorter::new(
		schema.clone(),
		order,
		32 * 1024,
		dir.path(),
		allocator(),
	);
	for chunk in values.chunks(700) {
		let view = int_view(chunk);
		let mut from = 0;
		while from < view.row_count() {
			let remainder = view.slice(from, view.row_count() - from);
			from += sorter.write(&remainder).unwrap();
		}
	}

	// The quota pushed at least one run to disk.
	assert!(dir.file_count().unwrap() >= 1, "expected spill files, found none");

	let mut cursor = Box::new(sorter).get_result_cursor().unwrap();
	let rows = drain(cursor.as_mut());
	let sorted: Vec<i64> = rows
		.iter()
		.map(|r| match r[0] {
			Value::Int64(v) => v,
			_ => unreachable!(),
		})
		.collect();
	values.sort_unstable();
	assert_eq!(sorted, values);

	// Spill files remove themselves once the merge is done with them.
	drop(cursor);
	assert_eq!(dir.file_count().unwrap(), 0);
}

#[test]
fn test_batchwise_sort_then_merge_equals_global_sort() {
	let dir = SpillDirectory::new().unwrap();
	let mut values = pseudo_random(2000);
	let schema = Schema::new(vec![Attribute::nullable("x", DataType::Int64)]).unwrap();
	let order = BoundSortOrder::bind(&[SortKey::ascending("x")], &schema).unwrap();

	// Every batch becomes its own sorted run; the merge must
	// reconstruct the global order for any partitioning.
	let mut sorter =
		supersonic_engine::sort::UnbufferedSorter::new(schema.clone(), order, dir.path());
	for chunk in values.chunks(333) {
		let view = int_view(chunk);
		assert_eq!(sorter.write(&view).unwrap(), view.row_count());
	}
	let mut cursor = Box::new(sorter).get_result_cursor().unwrap();
	let rows = drain(cursor.as_mut());
	let merged: Vec<i64> = rows
		.iter()
		.map(|r| match r[0] {
			Value::Int64(v) => v,
			_ => unreachable!(),
		})
		.collect();
	values.sort_unstable();
	assert_eq!(merged, values);
}

#[test]
fn test_extended_sort_case_insensitive() {
	let dir = SpillDirectory::new().unwrap();
	let schema = Schema::new(vec![Attribute::nullable("s", DataType::Utf8)]).unwrap();
	let view = View::new(
		schema,
		vec![ColumnData::utf8(["abc", "zzz", "ABC", "aBc", "ZZZ"])],
		5,
	);
	let specification = SortSpecification::new(vec![SortKey::ascending("s").case_insensitive()]);
	let mut cursor = bound_extended_sort(
		&specification,
		None,
		1 << 20,
		dir.path(),
		allocator(),
		1024,
		Box::new(ViewCursor::new(view)),
	)
	.unwrap();
	let rows = drain(cursor.as_mut());

	// The derived uppercase key is projected back out.
	assert_eq!(cursor.schema().attribute_count(), 1);
	assert_eq!(cursor.schema().attribute(0).name(), "s");

	// All case variants of "abc" are adjacent and precede "zzz".
	let lowered: Vec<String> = rows
		.iter()
		.map(|r| match &r[0] {
			Value::Utf8(s) => s.to_ascii_lowercase(),
			_ => unreachable!(),
		})
		.collect();
	assert_eq!(lowered, vec!["abc", "abc", "abc", "zzz", "zzz"]);
}

#[test]
fn test_extended_sort_with_limit() {
	let dir = SpillDirectory::new().unwrap();
	let schema = Schema::new(vec![Attribute::nullable("s", DataType::Utf8)]).unwrap();
	let view = View::new(schema, vec![ColumnData::utf8(["abc", "ABC", "aBc"])], 3);
	let specification =
		SortSpecification::new(vec![SortKey::ascending("s").case_insensitive()]).with_limit(1);
	let mut cursor = bound_extended_sort(
		&specification,
		None,
		1 << 20,
		dir.path(),
		allocator(),
		1024,
		Box::new(ViewCursor::new(view)),
	)
	.unwrap();
	let rows = drain(cursor.as_mut());
	assert_eq!(rows.len(), 1);
}

#[test]
fn test_extended_sort_rejects_duplicate_keys() {
	let dir = SpillDirectory::new().unwrap();
	let schema = Schema::new(vec![Attribute::nullable("s", DataType::Utf8)]).unwrap();
	let view = View::new(schema, vec![ColumnData::utf8(["a"])], 1);
	let specification = SortSpecification::new(vec![
		SortKey::ascending("s").case_insensitive(),
		SortKey::descending("s").case_insensitive(),
	]);
	let err = bound_extended_sort(
		&specification,
		None,
		1 << 20,
		dir.path(),
		allocator(),
		1024,
		Box::new(ViewCursor::new(view)),
	)
	.unwrap_err();
	assert_eq!(err.code(), "OPERATION_002");
}

#[test]
fn test_sort_interrupt() {
	let dir = SpillDirectory::new().unwrap();
	let mut cursor = bound_sort(
		&[SortKey::ascending("x")],
		None,
		1 << 20,
		dir.path(),
		allocator(),
		Box::new(ViewCursor::new(int_view(&[3, 1, 2]))),
	)
	.unwrap();
	cursor.interrupt();
	assert_eq!(cursor.next(16).unwrap_err().code(), "OPERATION_001");
}

/// A child that suspends on a barrier once between batches; the sort
/// operator must checkpoint, report the barrier, and finish on retry.
struct StutterCursor {
	inner: ViewCursor,
	barriers_left: usize,
	served_first: bool,
}

impl Cursor for StutterCursor {
	fn schema(&self) -> &Schema {
		self.inner.schema()
	}

	fn next(&mut self, max_row_count: usize) -> supersonic_core::Result<NextResult> {
		if self.served_first && self.barriers_left > 0 {
			self.barriers_left -= 1;
			return Ok(NextResult::WaitingOnBarrier);
		}
		self.served_first = true;
		self.inner.next(max_row_count.min(2))
	}

	fn is_waiting_on_barrier_supported(&self) -> bool {
		true
	}

	fn cursor_id(&self) -> CursorId {
		self.inner.cursor_id()
	}
}

#[test]
fn test_sort_resumes_after_barrier() {
	let dir = SpillDirectory::new().unwrap();
	let child = Box::new(StutterCursor {
		inner: ViewCursor::new(int_view(&[4, 1, 3, 2])),
		barriers_left: 1,
		served_first: false,
	});
	let mut cursor = bound_sort(
		&[SortKey::ascending("x")],
		None,
		1 << 20,
		dir.path(),
		allocator(),
		child,
	)
	.unwrap();
	assert!(cursor.is_waiting_on_barrier_supported());

	// First pull hits the barrier; the ingest position is saved.
	assert!(cursor.next(16).unwrap().is_waiting_on_barrier());

	let rows = drain(cursor.as_mut());
	let values: Vec<i64> = rows
		.iter()
		.map(|r| match r[0] {
			Value::Int64(v) => v,
			_ => unreachable!(),
		})
		.collect();
	assert_eq!(values, vec![1, 2, 3, 4]);
}

/// A transformer that only counts visits; checks the rewiring hook is
/// threaded through the operator tree.
struct CountingTransformer {
	visited: usize,
}

impl CursorTransformer for CountingTransformer {
	fn transform(&mut self, _cursor: &mut Box<dyn Cursor>) {
		self.visited += 1;
	}
}

#[test]
fn test_apply_to_children() {
	let dir = SpillDirectory::new().unwrap();
	let mut cursor = bound_sort(
		&[SortKey::ascending("x")],
		None,
		1 << 20,
		dir.path(),
		allocator(),
		Box::new(ViewCursor::new(int_view(&[2, 1]))),
	)
	.unwrap();
	let mut transformer = CountingTransformer {
		visited: 0,
	};
	cursor.apply_to_children(&mut transformer);
	assert_eq!(transformer.visited, 1);
}
