// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Column-wise progressive sort of a single batch. The permutation is
//! sorted by the first key over the whole input; runs of equal values
//! become the active ranges for the second key, and so on until every
//! key is processed or every row is distinguished. Nullable key columns
//! are partitioned first; nulls compare below every value, so they sit
//! in front under ascending order and behind under descending, which
//! keeps null checks out of the comparison loop entirely.
//!
//! Each `(type, direction)` pair gets its own monomorphized comparator;
//! the dispatch happens once per key column, never per row.

use supersonic_core::{ColumnData, Permutation, SortDirection, View};

use super::order::BoundSortOrder;

#[derive(Clone, Copy, Debug)]
struct Range {
	from: usize,
	to: usize,
}

/// Sorts `permutation` so that it enumerates `input`'s rows in key
/// order. The permutation must be identity-sized to the input.
pub fn sort_permutation(order: &BoundSortOrder, input: &View, permutation: &mut Permutation) {
	assert_eq!(input.row_count(), permutation.len());
	let mut source = vec![Range {
		from: 0,
		to: input.row_count(),
	}];
	let mut target: Vec<Range> = Vec::new();
	for key in 0..order.key_count() {
		let column = input.column(order.source_position(key));
		let descending = order.direction(key) == SortDirection::Descending;
		let is_last = key + 1 == order.key_count();
		sort_typed_column(column, descending, &source, &mut target, permutation, is_last);
		if target.is_empty() {
			break;
		}
		std::mem::swap(&mut source, &mut target);
		target.clear();
	}
}

/// Selects the typed comparator once for the whole column, then walks
/// every active range with it.
fn sort_typed_column(
	column: &ColumnData,
	descending: bool,
	source: &[Range],
	target: &mut Vec<Range>,
	permutation: &mut Permutation,
	is_last: bool,
) {
	let nullable = column.bitvec().count_zeros() > 0;
	let is_null_at = |row: usize| !column.is_defined(row);
	match column {
		ColumnData::Int32(c) => {
			let v = c.as_slice();
			sort_column(source, target, permutation, is_last, descending, nullable, is_null_at, |a, b| {
				v[a] < v[b]
			})
		}
		ColumnData::Int64(c) => {
			let v = c.as_slice();
			sort_column(source, target, permutation, is_last, descending, nullable, is_null_at, |a, b| {
				v[a] < v[b]
			})
		}
		ColumnData::Uint32(c) => {
			let v = c.as_slice();
			sort_column(source, target, permutation, is_last, descending, nullable, is_null_at, |a, b| {
				v[a] < v[b]
			})
		}
		ColumnData::Uint64(c) => {
			let v = c.as_slice();
			sort_column(source, target, permutation, is_last, descending, nullable, is_null_at, |a, b| {
				v[a] < v[b]
			})
		}
		ColumnData::Float(c) => {
			let v = c.as_slice();
			sort_column(source, target, permutation, is_last, descending, nullable, is_null_at, |a, b| {
				v[a].total_cmp(&v[b]) == std::cmp::Ordering::Less
			})
		}
		ColumnData::Double(c) => {
			let v = c.as_slice();
			sort_column(source, target, permutation, is_last, descending, nullable, is_null_at, |a, b| {
				v[a].total_cmp(&v[b]) == std::cmp::Ordering::Less
			})
		}
		ColumnData::Bool(c) => {
			sort_column(source, target, permutation, is_last, descending, nullable, is_null_at, |a, b| {
				!c.value(a) & c.value(b)
			})
		}
		ColumnData::Date(c) => {
			let v = c.as_slice();
			sort_column(source, target, permutation, is_last, descending, nullable, is_null_at, |a, b| {
				v[a] < v[b]
			})
		}
		ColumnData::DateTime(c) => {
			let v = c.as_slice();
			sort_column(source, target, permutation, is_last, descending, nullable, is_null_at, |a, b| {
				v[a] < v[b]
			})
		}
		ColumnData::Utf8(c) => {
			sort_column(source, target, permutation, is_last, descending, nullable, is_null_at, |a, b| {
				c.value(a) < c.value(b)
			})
		}
		ColumnData::Binary(c) => {
			sort_column(source, target, permutation, is_last, descending, nullable, is_null_at, |a, b| {
				c.value(a) < c.value(b)
			})
		}
		ColumnData::Enum(c) => {
			let v = c.as_slice();
			sort_column(source, target, permutation, is_last, descending, nullable, is_null_at, |a, b| {
				v[a] < v[b]
			})
		}
		ColumnData::DataType(c) => {
			let v = c.as_slice();
			sort_column(source, target, permutation, is_last, descending, nullable, is_null_at, |a, b| {
				v[a] < v[b]
			})
		}
	}
}

/// Splits into one monomorphized instantiation per direction by folding
/// the direction into the comparator.
#[allow(clippy::too_many_arguments)]
fn sort_column(
	source: &[Range],
	target: &mut Vec<Range>,
	permutation: &mut Permutation,
	is_last: bool,
	descending: bool,
	nullable: bool,
	is_null_at: impl Fn(usize) -> bool + Copy,
	less: impl Fn(usize, usize) -> bool + Copy,
) {
	if descending {
		for &range in source {
			sort_range(range, target, permutation, is_last, true, nullable, is_null_at, |a, b| {
				less(b, a)
			});
		}
	} else {
		for &range in source {
			sort_range(range, target, permutation, is_last, false, nullable, is_null_at, less);
		}
	}
}

/// Handles one active range: partitions nulls out, sorts the non-null
/// span, and queues sub-ranges still undecided for the next key.
#[allow(clippy::too_many_arguments)]
fn sort_range(
	range: Range,
	target: &mut Vec<Range>,
	permutation: &mut Permutation,
	is_last: bool,
	descending: bool,
	nullable: bool,
	is_null_at: impl Fn(usize) -> bool + Copy,
	less: impl Fn(usize, usize) -> bool + Copy,
) {
	if !nullable {
		sort_non_null_range(range, target, permutation, is_last, less);
		return;
	}
	// Ascending puts the null group in front, descending puts the
	// non-null group in front.
	let front =
		permutation.partition(range.from, range.to, |row| is_null_at(row) != descending);
	if front > 1 {
		let group = Range {
			from: range.from,
			to: range.from + front,
		};
		if descending {
			sort_non_null_range(group, target, permutation, is_last, less);
		} else if !is_last {
			// All nulls: equal under this key, still undecided.
			target.push(group);
		}
	}
	if range.to - (range.from + front) > 1 {
		let group = Range {
			from: range.from + front,
			to: range.to,
		};
		if descending {
			if !is_last {
				target.push(group);
			}
		} else {
			sort_non_null_range(group, target, permutation, is_last, less);
		}
	}
}

fn sort_non_null_range(
	range: Range,
	target: &mut Vec<Range>,
	permutation: &mut Permutation,
	is_last: bool,
	less: impl Fn(usize, usize) -> bool + Copy,
) {
	permutation.sort(range.from, range.to, less);
	if is_last {
		return;
	}
	// Scan for maximal runs of equal values; single rows are fully
	// decided.
	let mut run_start = range.from;
	for j in range.from + 1..range.to {
		if less(permutation.at(run_start), permutation.at(j)) {
			if j - run_start > 1 {
				target.push(Range {
					from: run_start,
					to: j,
				});
			}
			run_start = j;
		}
	}
	if range.to - run_start > 1 {
		target.push(Range {
			from: run_start,
			to: range.to,
		});
	}
}

#[cfg(test)]
mod tests {
	use supersonic_core::{Attribute, DataType, Schema, SortKey, Value};

	use super::*;

	fn sorted_values(view: &View, order: &BoundSortOrder) -> Vec<Vec<Value>> {
		let mut permutation = Permutation::identity(view.row_count());
		sort_permutation(order, view, &mut permutation);
		permutation.positions().iter().map(|&row| view.row(row)).collect()
	}

	#[test]
	fn test_single_key() {
		let schema = Schema::new(vec![Attribute::nullable("x", DataType::Int64)]).unwrap();
		let view = View::new(schema.clone(), vec![ColumnData::int64([5, 4, 1, 4, 3, 3, 4])], 7);
		let order = BoundSortOrder::bind(&[SortKey::ascending("x")], &schema).unwrap();

		let rows = sorted_values(&view, &order);
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
	fn test_two_keys() {
		let schema = Schema::new(vec![
			Attribute::nullable("first", DataType::Int64),
			Attribute::nullable("second", DataType::Int64),
		])
		.unwrap();
		let view = View::new(
			schema.clone(),
			vec![
				ColumnData::int64([5, 4, 1, 4, 3, 3, 4]),
				ColumnData::int64([3, 2, 2, 5, 1, 3, 1]),
			],
			7,
		);
		let order = BoundSortOrder::bind(
			&[SortKey::ascending("first"), SortKey::ascending("second")],
			&schema,
		)
		.unwrap();

		let rows = sorted_values(&view, &order);
		let pairs: Vec<(i64, i64)> = rows
			.iter()
			.map(|r| match (&r[0], &r[1]) {
				(Value::Int64(a), Value::Int64(b)) => (*a, *b),
				_ => unreachable!(),
			})
			.collect();
		assert_eq!(pairs, vec![(1, 2), (3, 1), (3, 3), (4, 1), (4, 2), (4, 5), (5, 3)]);
	}

	#[test]
	fn test_nulls_first_ascending_last_descending() {
		let schema = Schema::new(vec![Attribute::nullable("x", DataType::Int32)]).unwrap();
		let column = ColumnData::from_options(
			DataType::Int32,
			[Some(Value::Int32(2)), None, Some(Value::Int32(1)), None],
		);
		let view = View::new(schema.clone(), vec![column], 4);

		let ascending = BoundSortOrder::bind(&[SortKey::ascending("x")], &schema).unwrap();
		let rows = sorted_values(&view, &ascending);
		assert_eq!(rows[0][0], Value::Undefined);
		assert_eq!(rows[1][0], Value::Undefined);
		assert_eq!(rows[2][0], Value::Int32(1));
		assert_eq!(rows[3][0], Value::Int32(2));

		let descending = BoundSortOrder::bind(&[SortKey::descending("x")], &schema).unwrap();
		let rows = sorted_values(&view, &descending);
		assert_eq!(rows[0][0], Value::Int32(2));
		assert_eq!(rows[1][0], Value::Int32(1));
		assert_eq!(rows[2][0], Value::Undefined);
		assert_eq!(rows[3][0], Value::Undefined);
	}

	#[test]
	fn test_permutation_is_bijective_over_duplicates() {
		let schema = Schema::new(vec![Attribute::nullable("x", DataType::Utf8)]).unwrap();
		let view = View::new(
			schema.clone(),
			vec![ColumnData::utf8(["b", "a", "b", "a", "a"])],
			5,
		);
		let order = BoundSortOrder::bind(&[SortKey::ascending("x")], &schema).unwrap();
		let mut permutation = Permutation::identity(5);
		sort_permutation(&order, &view, &mut permutation);
		let mut seen = permutation.positions().to_vec();
		seen.sort_unstable();
		assert_eq!(seen, vec![0, 1, 2, 3, 4]);
	}

	#[test]
	fn test_second_key_under_null_group() {
		// Rows with a null first key stay grouped and are ordered by
		// the second key within the group.
		let schema = Schema::new(vec![
			Attribute::nullable("a", DataType::Int32),
			Attribute::nullable("b", DataType::Int32),
		])
		.unwrap();
		let first = ColumnData::from_options(
			DataType::Int32,
			[None, Some(Value::Int32(1)), None, Some(Value::Int32(1))],
		);
		let second = ColumnData::int32([9, 8, 7, 6]);
		let view = View::new(schema.clone(), vec![first, second], 4);
		let order = BoundSortOrder::bind(
			&[SortKey::ascending("a"), SortKey::ascending("b")],
			&schema,
		)
		.unwrap();

		let rows = sorted_values(&view, &order);
		assert_eq!(rows[0], vec![Value::Undefined, Value::Int32(7)]);
		assert_eq!(rows[1], vec![Value::Undefined, Value::Int32(9)]);
		assert_eq!(rows[2], vec![Value::Int32(1), Value::Int32(6)]);
		assert_eq!(rows[3], vec![Value::Int32(1), Value::Int32(8)]);
	}
}
