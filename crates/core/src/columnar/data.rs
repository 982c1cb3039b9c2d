// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::{
	util::BitVec,
	value::{
		DataType, Date, DateTime, Value,
		container::{
			BinaryContainer, BoolContainer, DataTypeContainer, NumberContainer, TemporalContainer,
			Utf8Container,
		},
	},
};

/// Typed column storage, one variant per data type. Kernels match on this
/// once per batch and run a monomorphized loop; per-row dispatch happens
/// only on the slow `Value` paths.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ColumnData {
	Int32(NumberContainer<i32>),
	Int64(NumberContainer<i64>),
	Uint32(NumberContainer<u32>),
	Uint64(NumberContainer<u64>),
	Float(NumberContainer<f32>),
	Double(NumberContainer<f64>),
	Bool(BoolContainer),
	Date(TemporalContainer<Date>),
	DateTime(TemporalContainer<DateTime>),
	Utf8(Utf8Container),
	Binary(BinaryContainer),
	Enum(NumberContainer<i32>),
	DataType(DataTypeContainer),
}

macro_rules! for_every_container {
	($self:expr, $container:ident => $body:expr) => {
		match $self {
			ColumnData::Int32($container) => $body,
			ColumnData::Int64($container) => $body,
			ColumnData::Uint32($container) => $body,
			ColumnData::Uint64($container) => $body,
			ColumnData::Float($container) => $body,
			ColumnData::Double($container) => $body,
			ColumnData::Bool($container) => $body,
			ColumnData::Date($container) => $body,
			ColumnData::DateTime($container) => $body,
			ColumnData::Utf8($container) => $body,
			ColumnData::Binary($container) => $body,
			ColumnData::Enum($container) => $body,
			ColumnData::DataType($container) => $body,
		}
	};
}

impl ColumnData {
	pub fn with_capacity(data_type: DataType, capacity: usize) -> Self {
		match data_type {
			DataType::Int32 => ColumnData::Int32(NumberContainer::with_capacity(capacity)),
			DataType::Int64 => ColumnData::Int64(NumberContainer::with_capacity(capacity)),
			DataType::Uint32 => ColumnData::Uint32(NumberContainer::with_capacity(capacity)),
			DataType::Uint64 => ColumnData::Uint64(NumberContainer::with_capacity(capacity)),
			DataType::Float => ColumnData::Float(NumberContainer::with_capacity(capacity)),
			DataType::Double => ColumnData::Double(NumberContainer::with_capacity(capacity)),
			DataType::Bool => ColumnData::Bool(BoolContainer::with_capacity(capacity)),
			DataType::Date => ColumnData::Date(TemporalContainer::with_capacity(capacity)),
			DataType::DateTime => ColumnData::DateTime(TemporalContainer::with_capacity(capacity)),
			DataType::Utf8 => ColumnData::Utf8(Utf8Container::with_capacity(capacity)),
			DataType::Binary => ColumnData::Binary(BinaryContainer::with_capacity(capacity)),
			DataType::Enum => ColumnData::Enum(NumberContainer::with_capacity(capacity)),
			DataType::DataType => ColumnData::DataType(DataTypeContainer::with_capacity(capacity)),
		}
	}

	pub fn int32(values: impl IntoIterator<Item = i32>) -> Self {
		ColumnData::Int32(NumberContainer::from_vec(values.into_iter().collect()))
	}

	pub fn int64(values: impl IntoIterator<Item = i64>) -> Self {
		ColumnData::Int64(NumberContainer::from_vec(values.into_iter().collect()))
	}

	pub fn uint32(values: impl IntoIterator<Item = u32>) -> Self {
		ColumnData::Uint32(NumberContainer::from_vec(values.into_iter().collect()))
	}

	pub fn uint64(values: impl IntoIterator<Item = u64>) -> Self {
		ColumnData::Uint64(NumberContainer::from_vec(values.into_iter().collect()))
	}

	pub fn float(values: impl IntoIterator<Item = f32>) -> Self {
		ColumnData::Float(NumberContainer::from_vec(values.into_iter().collect()))
	}

	pub fn double(values: impl IntoIterator<Item = f64>) -> Self {
		ColumnData::Double(NumberContainer::from_vec(values.into_iter().collect()))
	}

	pub fn bool(values: impl IntoIterator<Item = bool>) -> Self {
		ColumnData::Bool(BoolContainer::from_vec(values.into_iter().collect()))
	}

	pub fn date(values: impl IntoIterator<Item = Date>) -> Self {
		ColumnData::Date(TemporalContainer::from_vec(values.into_iter().collect()))
	}

	pub fn datetime(values: impl IntoIterator<Item = DateTime>) -> Self {
		ColumnData::DateTime(TemporalContainer::from_vec(values.into_iter().collect()))
	}

	pub fn utf8<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
		ColumnData::Utf8(Utf8Container::from_vec(values.into_iter().map(Into::into).collect()))
	}

	pub fn binary(values: impl IntoIterator<Item = Vec<u8>>) -> Self {
		ColumnData::Binary(BinaryContainer::from_vec(values.into_iter().collect()))
	}

	/// Builds a column from optional values; `None` becomes an undefined
	/// row.
	pub fn from_options(data_type: DataType, values: impl IntoIterator<Item = Option<Value>>) -> Self {
		let values: Vec<Option<Value>> = values.into_iter().collect();
		let mut out = Self::with_capacity(data_type, values.len());
		for value in &values {
			match value {
				Some(value) => out.push_value(value),
				None => out.push_undefined(),
			}
		}
		out
	}

	pub fn get_type(&self) -> DataType {
		match self {
			ColumnData::Int32(_) => DataType::Int32,
			ColumnData::Int64(_) => DataType::Int64,
			ColumnData::Uint32(_) => DataType::Uint32,
			ColumnData::Uint64(_) => DataType::Uint64,
			ColumnData::Float(_) => DataType::Float,
			ColumnData::Double(_) => DataType::Double,
			ColumnData::Bool(_) => DataType::Bool,
			ColumnData::Date(_) => DataType::Date,
			ColumnData::DateTime(_) => DataType::DateTime,
			ColumnData::Utf8(_) => DataType::Utf8,
			ColumnData::Binary(_) => DataType::Binary,
			ColumnData::Enum(_) => DataType::Enum,
			ColumnData::DataType(_) => DataType::DataType,
		}
	}

	pub fn len(&self) -> usize {
		for_every_container!(self, container => container.len())
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn capacity(&self) -> usize {
		for_every_container!(self, container => container.capacity())
	}

	pub fn is_defined(&self, index: usize) -> bool {
		for_every_container!(self, container => container.is_defined(index))
	}

	pub fn bitvec(&self) -> &BitVec {
		for_every_container!(self, container => container.bitvec())
	}

	/// Replaces the validity bitmap wholesale; the batch-exit path from a
	/// kernel's skip vector.
	pub fn set_bitvec(&mut self, bitvec: BitVec) {
		for_every_container!(self, container => container.set_bitvec(bitvec))
	}

	/// Clears values and validity, keeping capacity. Variable-length
	/// columns also reset their arena.
	pub fn clear(&mut self) {
		for_every_container!(self, container => container.clear())
	}

	pub fn push_undefined(&mut self) {
		for_every_container!(self, container => container.push_undefined())
	}

	pub fn push_value(&mut self, value: &Value) {
		match (self, value) {
			(data, Value::Undefined) => data.push_undefined(),
			(ColumnData::Int32(c), Value::Int32(v)) => c.push(*v),
			(ColumnData::Int64(c), Value::Int64(v)) => c.push(*v),
			(ColumnData::Uint32(c), Value::Uint32(v)) => c.push(*v),
			(ColumnData::Uint64(c), Value::Uint64(v)) => c.push(*v),
			(ColumnData::Float(c), Value::Float(v)) => c.push(*v),
			(ColumnData::Double(c), Value::Double(v)) => c.push(*v),
			(ColumnData::Bool(c), Value::Bool(v)) => c.push(*v),
			(ColumnData::Date(c), Value::Date(v)) => c.push(*v),
			(ColumnData::DateTime(c), Value::DateTime(v)) => c.push(*v),
			(ColumnData::Utf8(c), Value::Utf8(v)) => c.push(v),
			(ColumnData::Binary(c), Value::Binary(v)) => c.push(v),
			(ColumnData::Enum(c), Value::Enum(v)) => c.push(*v),
			(ColumnData::DataType(c), Value::DataType(v)) => c.push(*v),
			(data, value) => {
				unreachable!("value {value:?} pushed into {} column", data.get_type())
			}
		}
	}

	pub fn get_value(&self, index: usize) -> Value {
		match self {
			ColumnData::Int32(c) => c.get(index).map_or(Value::Undefined, |v| Value::Int32(*v)),
			ColumnData::Int64(c) => c.get(index).map_or(Value::Undefined, |v| Value::Int64(*v)),
			ColumnData::Uint32(c) => c.get(index).map_or(Value::Undefined, |v| Value::Uint32(*v)),
			ColumnData::Uint64(c) => c.get(index).map_or(Value::Undefined, |v| Value::Uint64(*v)),
			ColumnData::Float(c) => c.get(index).map_or(Value::Undefined, |v| Value::Float(*v)),
			ColumnData::Double(c) => c.get(index).map_or(Value::Undefined, |v| Value::Double(*v)),
			ColumnData::Bool(c) => c.get(index).map_or(Value::Undefined, Value::Bool),
			ColumnData::Date(c) => c.get(index).map_or(Value::Undefined, |v| Value::Date(*v)),
			ColumnData::DateTime(c) => {
				c.get(index).map_or(Value::Undefined, |v| Value::DateTime(*v))
			}
			ColumnData::Utf8(c) => {
				c.get(index).map_or(Value::Undefined, |v| Value::Utf8(v.to_string()))
			}
			ColumnData::Binary(c) => {
				c.get(index).map_or(Value::Undefined, |v| Value::Binary(v.to_vec()))
			}
			ColumnData::Enum(c) => c.get(index).map_or(Value::Undefined, |v| Value::Enum(*v)),
			ColumnData::DataType(c) => c.get(index).map_or(Value::Undefined, Value::DataType),
		}
	}

	/// Appends row `index` of `other` to this column. Both sides must
	/// carry the same type; the merge and the table buffer guarantee it.
	pub fn push_from(&mut self, other: &ColumnData, index: usize) {
		match (self, other) {
			(ColumnData::Int32(dst), ColumnData::Int32(src)) => match src.get(index) {
				Some(v) => dst.push(*v),
				None => dst.push_undefined(),
			},
			(ColumnData::Int64(dst), ColumnData::Int64(src)) => match src.get(index) {
				Some(v) => dst.push(*v),
				None => dst.push_undefined(),
			},
			(ColumnData::Uint32(dst), ColumnData::Uint32(src)) => match src.get(index) {
				Some(v) => dst.push(*v),
				None => dst.push_undefined(),
			},
			(ColumnData::Uint64(dst), ColumnData::Uint64(src)) => match src.get(index) {
				Some(v) => dst.push(*v),
				None => dst.push_undefined(),
			},
			(ColumnData::Float(dst), ColumnData::Float(src)) => match src.get(index) {
				Some(v) => dst.push(*v),
				None => dst.push_undefined(),
			},
			(ColumnData::Double(dst), ColumnData::Double(src)) => match src.get(index) {
				Some(v) => dst.push(*v),
				None => dst.push_undefined(),
			},
			(ColumnData::Bool(dst), ColumnData::Bool(src)) => match src.get(index) {
				Some(v) => dst.push(v),
				None => dst.push_undefined(),
			},
			(ColumnData::Date(dst), ColumnData::Date(src)) => match src.get(index) {
				Some(v) => dst.push(*v),
				None => dst.push_undefined(),
			},
			(ColumnData::DateTime(dst), ColumnData::DateTime(src)) => match src.get(index) {
				Some(v) => dst.push(*v),
				None => dst.push_undefined(),
			},
			(ColumnData::Utf8(dst), ColumnData::Utf8(src)) => match src.get(index) {
				Some(v) => dst.push(v),
				None => dst.push_undefined(),
			},
			(ColumnData::Binary(dst), ColumnData::Binary(src)) => match src.get(index) {
				Some(v) => dst.push(v),
				None => dst.push_undefined(),
			},
			(ColumnData::Enum(dst), ColumnData::Enum(src)) => match src.get(index) {
				Some(v) => dst.push(*v),
				None => dst.push_undefined(),
			},
			(ColumnData::DataType(dst), ColumnData::DataType(src)) => match src.get(index) {
				Some(v) => dst.push(v),
				None => dst.push_undefined(),
			},
			(dst, src) => {
				unreachable!("appending {} row into {} column", src.get_type(), dst.get_type())
			}
		}
	}

	/// Appends rows `[from, to)` of `other`. Same-type requirement as
	/// [`push_from`](Self::push_from).
	pub fn extend_range(&mut self, other: &ColumnData, from: usize, to: usize) {
		match (self, other) {
			(ColumnData::Int32(dst), ColumnData::Int32(src)) => dst.extend_range(src, from, to),
			(ColumnData::Int64(dst), ColumnData::Int64(src)) => dst.extend_range(src, from, to),
			(ColumnData::Uint32(dst), ColumnData::Uint32(src)) => dst.extend_range(src, from, to),
			(ColumnData::Uint64(dst), ColumnData::Uint64(src)) => dst.extend_range(src, from, to),
			(ColumnData::Float(dst), ColumnData::Float(src)) => dst.extend_range(src, from, to),
			(ColumnData::Double(dst), ColumnData::Double(src)) => dst.extend_range(src, from, to),
			(ColumnData::Bool(dst), ColumnData::Bool(src)) => dst.extend_range(src, from, to),
			(ColumnData::Date(dst), ColumnData::Date(src)) => dst.extend_range(src, from, to),
			(ColumnData::DateTime(dst), ColumnData::DateTime(src)) => {
				dst.extend_range(src, from, to)
			}
			(ColumnData::Utf8(dst), ColumnData::Utf8(src)) => dst.extend_range(src, from, to),
			(ColumnData::Binary(dst), ColumnData::Binary(src)) => dst.extend_range(src, from, to),
			(ColumnData::Enum(dst), ColumnData::Enum(src)) => dst.extend_range(src, from, to),
			(ColumnData::DataType(dst), ColumnData::DataType(src)) => {
				dst.extend_range(src, from, to)
			}
			(dst, src) => {
				unreachable!("extending {} column from {}", dst.get_type(), src.get_type())
			}
		}
	}

	pub fn slice(&self, start: usize, end: usize) -> Self {
		match self {
			ColumnData::Int32(c) => ColumnData::Int32(c.slice(start, end)),
			ColumnData::Int64(c) => ColumnData::Int64(c.slice(start, end)),
			ColumnData::Uint32(c) => ColumnData::Uint32(c.slice(start, end)),
			ColumnData::Uint64(c) => ColumnData::Uint64(c.slice(start, end)),
			ColumnData::Float(c) => ColumnData::Float(c.slice(start, end)),
			ColumnData::Double(c) => ColumnData::Double(c.slice(start, end)),
			ColumnData::Bool(c) => ColumnData::Bool(c.slice(start, end)),
			ColumnData::Date(c) => ColumnData::Date(c.slice(start, end)),
			ColumnData::DateTime(c) => ColumnData::DateTime(c.slice(start, end)),
			ColumnData::Utf8(c) => ColumnData::Utf8(c.slice(start, end)),
			ColumnData::Binary(c) => ColumnData::Binary(c.slice(start, end)),
			ColumnData::Enum(c) => ColumnData::Enum(c.slice(start, end)),
			ColumnData::DataType(c) => ColumnData::DataType(c.slice(start, end)),
		}
	}

	/// Materializes `indices` in order; the permutation-selection read
	/// path of the sorter.
	pub fn gather(&self, indices: &[usize]) -> Self {
		match self {
			ColumnData::Int32(c) => ColumnData::Int32(c.gather(indices)),
			ColumnData::Int64(c) => ColumnData::Int64(c.gather(indices)),
			ColumnData::Uint32(c) => ColumnData::Uint32(c.gather(indices)),
			ColumnData::Uint64(c) => ColumnData::Uint64(c.gather(indices)),
			ColumnData::Float(c) => ColumnData::Float(c.gather(indices)),
			ColumnData::Double(c) => ColumnData::Double(c.gather(indices)),
			ColumnData::Bool(c) => ColumnData::Bool(c.gather(indices)),
			ColumnData::Date(c) => ColumnData::Date(c.gather(indices)),
			ColumnData::DateTime(c) => ColumnData::DateTime(c.gather(indices)),
			ColumnData::Utf8(c) => ColumnData::Utf8(c.gather(indices)),
			ColumnData::Binary(c) => ColumnData::Binary(c.gather(indices)),
			ColumnData::Enum(c) => ColumnData::Enum(c.gather(indices)),
			ColumnData::DataType(c) => ColumnData::DataType(c.gather(indices)),
		}
	}

	/// Payload bytes of rows `[from, to)` beyond the fixed-width
	/// estimate; used for quota accounting of buffered writes.
	pub fn variable_bytes_range(&self, from: usize, to: usize) -> usize {
		match self {
			ColumnData::Utf8(c) => (from..to).map(|i| c.value(i).len()).sum(),
			ColumnData::Binary(c) => (from..to).map(|i| c.value(i).len()).sum(),
			_ => 0,
		}
	}

	pub fn as_string(&self, index: usize) -> String {
		for_every_container!(self, container => container.as_string(index))
	}
}

/// Three-way row comparison between same-typed columns. Undefined sorts
/// smaller than any value (so ascending puts nulls first); floats compare
/// by total order.
pub fn compare_rows(a: &ColumnData, a_row: usize, b: &ColumnData, b_row: usize) -> Ordering {
	match (a.is_defined(a_row), b.is_defined(b_row)) {
		(false, false) => return Ordering::Equal,
		(false, true) => return Ordering::Less,
		(true, false) => return Ordering::Greater,
		(true, true) => {}
	}
	match (a, b) {
		(ColumnData::Int32(x), ColumnData::Int32(y)) => x.as_slice()[a_row].cmp(&y.as_slice()[b_row]),
		(ColumnData::Int64(x), ColumnData::Int64(y)) => x.as_slice()[a_row].cmp(&y.as_slice()[b_row]),
		(ColumnData::Uint32(x), ColumnData::Uint32(y)) => x.as_slice()[a_row].cmp(&y.as_slice()[b_row]),
		(ColumnData::Uint64(x), ColumnData::Uint64(y)) => x.as_slice()[a_row].cmp(&y.as_slice()[b_row]),
		(ColumnData::Float(x), ColumnData::Float(y)) => {
			x.as_slice()[a_row].total_cmp(&y.as_slice()[b_row])
		}
		(ColumnData::Double(x), ColumnData::Double(y)) => {
			x.as_slice()[a_row].total_cmp(&y.as_slice()[b_row])
		}
		(ColumnData::Bool(x), ColumnData::Bool(y)) => x.value(a_row).cmp(&y.value(b_row)),
		(ColumnData::Date(x), ColumnData::Date(y)) => x.as_slice()[a_row].cmp(&y.as_slice()[b_row]),
		(ColumnData::DateTime(x), ColumnData::DateTime(y)) => {
			x.as_slice()[a_row].cmp(&y.as_slice()[b_row])
		}
		(ColumnData::Utf8(x), ColumnData::Utf8(y)) => x.value(a_row).cmp(y.value(b_row)),
		(ColumnData::Binary(x), ColumnData::Binary(y)) => x.value(a_row).cmp(y.value(b_row)),
		(ColumnData::Enum(x), ColumnData::Enum(y)) => x.as_slice()[a_row].cmp(&y.as_slice()[b_row]),
		(ColumnData::DataType(x), ColumnData::DataType(y)) => {
			x.as_slice()[a_row].cmp(&y.as_slice()[b_row])
		}
		(a, b) => unreachable!("comparing {} row against {}", a.get_type(), b.get_type()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_round_trip_values() {
		let mut col = ColumnData::with_capacity(DataType::Utf8, 2);
		col.push_value(&Value::Utf8("abc".to_string()));
		col.push_undefined();
		assert_eq!(col.get_value(0), Value::Utf8("abc".to_string()));
		assert_eq!(col.get_value(1), Value::Undefined);
	}

	#[test]
	fn test_compare_rows_nulls_first() {
		let col = ColumnData::from_options(
			DataType::Int32,
			[Some(Value::Int32(1)), None, Some(Value::Int32(2))],
		);
		assert_eq!(compare_rows(&col, 1, &col, 0), Ordering::Less);
		assert_eq!(compare_rows(&col, 0, &col, 2), Ordering::Less);
		assert_eq!(compare_rows(&col, 1, &col, 1), Ordering::Equal);
	}

	#[test]
	fn test_gather() {
		let col = ColumnData::utf8(["a", "b", "c"]);
		let gathered = col.gather(&[2, 1]);
		assert_eq!(gathered.get_value(0), Value::Utf8("c".to_string()));
		assert_eq!(gathered.get_value(1), Value::Utf8("b".to_string()));
	}
}
