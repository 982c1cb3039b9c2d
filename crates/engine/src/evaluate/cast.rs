// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Type coercion. Binding realizes the numeric promotion lattice by
//! wrapping children in internal casts, so arithmetic and comparison
//! loops only ever see one concrete type. `CAST` is the user-visible
//! form; string-to-number goes through the separate `PARSE_STRING`
//! kernels.

use std::{collections::BTreeSet, sync::Arc};

use supersonic_core::{
	Block, ColumnData, DataType, Schema, View,
	error::diagnostic::{evaluation, schema},
	memory::BufferAllocator,
};

use super::{BoolView, BoundExpression, is_nullable, scalar_schema, set_output_validity};
use crate::expression::FailurePolicy;

/// The promotion lattice. Equal-signedness integers widen; mixed
/// signedness widens to `Int64` unless `Uint64` is involved (which has
/// no signed container); floats absorb integers into `Double`.
pub(crate) fn common_numeric_type(operation: &str, left: DataType, right: DataType) -> crate::Result<DataType> {
	for side in [left, right] {
		if !side.is_numeric() {
			return Err(supersonic_core::Error(schema::type_mismatch(
				operation,
				"a numeric type",
				side,
			)));
		}
	}
	if left == right {
		return Ok(left);
	}
	if left == DataType::Double || right == DataType::Double {
		return Ok(DataType::Double);
	}
	if left == DataType::Float || right == DataType::Float {
		return Ok(if left.is_integer() || right.is_integer() {
			DataType::Double
		} else {
			DataType::Float
		});
	}
	let signed = |t: DataType| matches!(t, DataType::Int32 | DataType::Int64);
	match (signed(left), signed(right)) {
		(true, true) => Ok(DataType::Int64),
		(false, false) => Ok(DataType::Uint64),
		_ => {
			if left == DataType::Uint64 || right == DataType::Uint64 {
				return Err(supersonic_core::Error(schema::no_common_type(
					operation, left, right,
				)));
			}
			Ok(DataType::Int64)
		}
	}
}

/// A comparable common type: numerics promote, temporals widen to
/// datetime, everything else must match exactly.
pub(crate) fn common_comparable_type(operation: &str, left: DataType, right: DataType) -> crate::Result<DataType> {
	if left == right {
		return Ok(left);
	}
	if left.is_numeric() && right.is_numeric() {
		return common_numeric_type(operation, left, right);
	}
	match (left, right) {
		(DataType::Date, DataType::DateTime) | (DataType::DateTime, DataType::Date) => {
			Ok(DataType::DateTime)
		}
		_ => Err(supersonic_core::Error(schema::no_common_type(operation, left, right))),
	}
}

fn castable(from: DataType, to: DataType) -> bool {
	if from == to {
		return true;
	}
	if from.is_numeric() && to.is_numeric() {
		return true;
	}
	match (from, to) {
		(DataType::Date, DataType::DateTime) => true,
		(DataType::Enum, DataType::Int32) => true,
		(from, DataType::Utf8) => {
			from.is_numeric() || matches!(from, DataType::Bool | DataType::Date | DataType::DateTime)
		}
		_ => false,
	}
}

/// Wraps `argument` in a cast when its type differs from `to`; the
/// promotion path of every polymorphic kernel.
pub(crate) fn cast_to(
	argument: Box<dyn BoundExpression>,
	to: DataType,
	allocator: &Arc<dyn BufferAllocator>,
	max_row_count: usize,
) -> crate::Result<Box<dyn BoundExpression>> {
	let from = argument.result_schema().attribute(0).data_type();
	if from == to {
		return Ok(argument);
	}
	if !castable(from, to) {
		return Err(supersonic_core::Error(schema::unsupported_cast(from, to)));
	}
	let name = argument.result_schema().attribute(0).name().to_string();
	let schema = scalar_schema(name, to, is_nullable(argument.as_ref()));
	let block = Block::with_capacity(schema.clone(), allocator, max_row_count)?;
	Ok(Box::new(BoundCast {
		schema,
		block,
		argument,
	}))
}

pub(crate) fn bind_cast(
	name: String,
	argument: Box<dyn BoundExpression>,
	to: DataType,
	allocator: &Arc<dyn BufferAllocator>,
	max_row_count: usize,
) -> crate::Result<Box<dyn BoundExpression>> {
	let from = argument.result_schema().attribute(0).data_type();
	if from == to {
		return Ok(argument);
	}
	if !castable(from, to) {
		return Err(supersonic_core::Error(schema::unsupported_cast(from, to)));
	}
	let schema = scalar_schema(name, to, is_nullable(argument.as_ref()));
	let block = Block::with_capacity(schema.clone(), allocator, max_row_count)?;
	Ok(Box::new(BoundCast {
		schema,
		block,
		argument,
	}))
}

pub(crate) struct BoundCast {
	schema: Schema,
	block: Block,
	argument: Box<dyn BoundExpression>,
}

macro_rules! numeric_cast_loop {
	($out:expr, $src:expr, $skip:expr, $row_count:expr, $to:ty) => {{
		let values = $src.as_slice();
		for i in 0..$row_count {
			if $skip.get(i) {
				$out.push_undefined();
			} else {
				$out.push(values[i] as $to);
			}
		}
	}};
}

macro_rules! display_cast_loop {
	($out:expr, $src:expr, $skip:expr, $row_count:expr) => {{
		let values = $src.as_slice();
		for i in 0..$row_count {
			if $skip.get(i) {
				$out.push_undefined();
			} else {
				$out.push(&values[i].to_string());
			}
		}
	}};
}

impl BoundExpression for BoundCast {
	fn result_schema(&self) -> &Schema {
		&self.schema
	}

	fn do_evaluate(&mut self, input: &View, skip: &mut BoolView<'_>) -> crate::Result<View> {
		debug_assert_eq!(skip.column_count(), 1);
		let argument = self.argument.do_evaluate(input, skip)?;
		let row_count = input.row_count();
		self.block.clear();
		let vector = skip.column(0);
		let source = argument.column(0);
		match (self.block.column_mut(0), source) {
			// Numeric widening, narrowing and float conversion follow
			// `as` semantics: narrowing integers truncate, floats
			// saturate into integers.
			(ColumnData::Int32(out), ColumnData::Int64(src)) => {
				numeric_cast_loop!(out, src, vector, row_count, i32)
			}
			(ColumnData::Int32(out), ColumnData::Uint32(src)) => {
				numeric_cast_loop!(out, src, vector, row_count, i32)
			}
			(ColumnData::Int32(out), ColumnData::Uint64(src)) => {
				numeric_cast_loop!(out, src, vector, row_count, i32)
			}
			(ColumnData::Int32(out), ColumnData::Float(src)) => {
				numeric_cast_loop!(out, src, vector, row_count, i32)
			}
			(ColumnData::Int32(out), ColumnData::Double(src)) => {
				numeric_cast_loop!(out, src, vector, row_count, i32)
			}
			(ColumnData::Int64(out), ColumnData::Int32(src)) => {
				numeric_cast_loop!(out, src, vector, row_count, i64)
			}
			(ColumnData::Int64(out), ColumnData::Uint32(src)) => {
				numeric_cast_loop!(out, src, vector, row_count, i64)
			}
			(ColumnData::Int64(out), ColumnData::Uint64(src)) => {
				numeric_cast_loop!(out, src, vector, row_count, i64)
			}
			(ColumnData::Int64(out), ColumnData::Float(src)) => {
				numeric_cast_loop!(out, src, vector, row_count, i64)
			}
			(ColumnData::Int64(out), ColumnData::Double(src)) => {
				numeric_cast_loop!(out, src, vector, row_count, i64)
			}
			(ColumnData::Uint32(out), ColumnData::Int32(src)) => {
				numeric_cast_loop!(out, src, vector, row_count, u32)
			}
			(ColumnData::Uint32(out), ColumnData::Int64(src)) => {
				numeric_cast_loop!(out, src, vector, row_count, u32)
			}
			(ColumnData::Uint32(out), ColumnData::Uint64(src)) => {
				numeric_cast_loop!(out, src, vector, row_count, u32)
			}
			(ColumnData::Uint32(out), ColumnData::Float(src)) => {
				numeric_cast_loop!(out, src, vector, row_count, u32)
			}
			(ColumnData::Uint32(out), ColumnData::Double(src)) => {
				numeric_cast_loop!(out, src, vector, row_count, u32)
			}
			(ColumnData::Uint64(out), ColumnData::Int32(src)) => {
				numeric_cast_loop!(out, src, vector, row_count, u64)
			}
			(ColumnData::Uint64(out), ColumnData::Int64(src)) => {
				numeric_cast_loop!(out, src, vector, row_count, u64)
			}
			(ColumnData::Uint64(out), ColumnData::Uint32(src)) => {
				numeric_cast_loop!(out, src, vector, row_count, u64)
			}
			(ColumnData::Uint64(out), ColumnData::Float(src)) => {
				numeric_cast_loop!(out, src, vector, row_count, u64)
			}
			(ColumnData::Uint64(out), ColumnData::Double(src)) => {
				numeric_cast_loop!(out, src, vector, row_count, u64)
			}
			(ColumnData::Float(out), ColumnData::Int32(src)) => {
				numeric_cast_loop!(out, src, vector, row_count, f32)
			}
			(ColumnData::Float(out), ColumnData::Int64(src)) => {
				numeric_cast_loop!(out, src, vector, row_count, f32)
			}
			(ColumnData::Float(out), ColumnData::Uint32(src)) => {
				numeric_cast_loop!(out, src, vector, row_count, f32)
			}
			(ColumnData::Float(out), ColumnData::Uint64(src)) => {
				numeric_cast_loop!(out, src, vector, row_count, f32)
			}
			(ColumnData::Float(out), ColumnData::Double(src)) => {
				numeric_cast_loop!(out, src, vector, row_count, f32)
			}
			(ColumnData::Double(out), ColumnData::Int32(src)) => {
				numeric_cast_loop!(out, src, vector, row_count, f64)
			}
			(ColumnData::Double(out), ColumnData::Int64(src)) => {
				numeric_cast_loop!(out, src, vector, row_count, f64)
			}
			(ColumnData::Double(out), ColumnData::Uint32(src)) => {
				numeric_cast_loop!(out, src, vector, row_count, f64)
			}
			(ColumnData::Double(out), ColumnData::Uint64(src)) => {
				numeric_cast_loop!(out, src, vector, row_count, f64)
			}
			(ColumnData::Double(out), ColumnData::Float(src)) => {
				numeric_cast_loop!(out, src, vector, row_count, f64)
			}

			// Base-10 rendering into strings.
			(ColumnData::Utf8(out), ColumnData::Int32(src)) => {
				display_cast_loop!(out, src, vector, row_count)
			}
			(ColumnData::Utf8(out), ColumnData::Int64(src)) => {
				display_cast_loop!(out, src, vector, row_count)
			}
			(ColumnData::Utf8(out), ColumnData::Uint32(src)) => {
				display_cast_loop!(out, src, vector, row_count)
			}
			(ColumnData::Utf8(out), ColumnData::Uint64(src)) => {
				display_cast_loop!(out, src, vector, row_count)
			}
			(ColumnData::Utf8(out), ColumnData::Float(src)) => {
				display_cast_loop!(out, src, vector, row_count)
			}
			(ColumnData::Utf8(out), ColumnData::Double(src)) => {
				display_cast_loop!(out, src, vector, row_count)
			}
			(ColumnData::Utf8(out), ColumnData::Date(src)) => {
				display_cast_loop!(out, src, vector, row_count)
			}
			(ColumnData::Utf8(out), ColumnData::DateTime(src)) => {
				display_cast_loop!(out, src, vector, row_count)
			}
			(ColumnData::Utf8(out), ColumnData::Bool(src)) => {
				for i in 0..row_count {
					if vector.get(i) {
						out.push_undefined();
					} else if src.value(i) {
						out.push("true");
					} else {
						out.push("false");
					}
				}
			}

			(ColumnData::DateTime(out), ColumnData::Date(src)) => {
				let values = src.as_slice();
				for i in 0..row_count {
					if vector.get(i) {
						out.push_undefined();
					} else {
						out.push(values[i].at_midnight());
					}
				}
			}
			(ColumnData::Int32(out), ColumnData::Enum(src)) => {
				numeric_cast_loop!(out, src, vector, row_count, i32)
			}
			_ => unreachable!("cast bound over an unsupported type pair"),
		}
		set_output_validity(self.block.column_mut(0), skip.column(0), row_count);
		Ok(self.block.view(row_count))
	}

	fn row_capacity(&self) -> usize {
		self.block.row_capacity().min(self.argument.row_capacity())
	}

	fn collect_referred_attribute_names(&self, names: &mut BTreeSet<String>) {
		self.argument.collect_referred_attribute_names(names);
	}
}

/// Strict string parsing: the whole string must be a literal of the
/// target type, with no trimming and no trailing garbage. Failures follow the
/// kernel's policy.
pub(crate) struct BoundParseString {
	policy: FailurePolicy,
	schema: Schema,
	block: Block,
	argument: Box<dyn BoundExpression>,
}

pub(crate) fn bind_parse_string(
	policy: FailurePolicy,
	name: String,
	argument: Box<dyn BoundExpression>,
	to: DataType,
	allocator: &Arc<dyn BufferAllocator>,
	max_row_count: usize,
) -> crate::Result<Box<dyn BoundExpression>> {
	let from = argument.result_schema().attribute(0).data_type();
	if from != DataType::Utf8 {
		return Err(supersonic_core::Error(schema::type_mismatch(
			"PARSE_STRING",
			"a string argument",
			from,
		)));
	}
	if !(to.is_numeric() || to == DataType::Bool) {
		return Err(supersonic_core::Error(schema::unsupported_cast(from, to)));
	}
	let nullable = matches!(policy, FailurePolicy::Nulling) || is_nullable(argument.as_ref());
	let schema = scalar_schema(name, to, nullable);
	let block = Block::with_capacity(schema.clone(), allocator, max_row_count)?;
	Ok(Box::new(BoundParseString {
		policy,
		schema,
		block,
		argument,
	}))
}

macro_rules! parse_loop {
	($policy:expr, $out:expr, $src:expr, $skip:expr, $row_count:expr, $to:expr, $ty:ty) => {{
		for i in 0..$row_count {
			if $skip.get(i) {
				$out.push_undefined();
				continue;
			}
			match $src.value(i).parse::<$ty>() {
				Ok(value) => $out.push(value),
				Err(_) => match $policy {
					FailurePolicy::Signaling | FailurePolicy::Quiet => {
						return Err(supersonic_core::Error(evaluation::parse_failure(
							$src.value(i),
							$to,
						)));
					}
					FailurePolicy::Nulling => {
						$skip.set(i, true);
						$out.push_undefined();
					}
				},
			}
		}
	}};
}

impl BoundExpression for BoundParseString {
	fn result_schema(&self) -> &Schema {
		&self.schema
	}

	fn do_evaluate(&mut self, input: &View, skip: &mut BoolView<'_>) -> crate::Result<View> {
		debug_assert_eq!(skip.column_count(), 1);
		let argument = self.argument.do_evaluate(input, skip)?;
		let row_count = input.row_count();
		self.block.clear();
		let vector = skip.column(0);
		let source = match argument.column(0) {
			ColumnData::Utf8(container) => container,
			_ => unreachable!("parse_string bound over a non-string argument"),
		};
		let policy = self.policy;
		match self.block.column_mut(0) {
			ColumnData::Int32(out) => {
				parse_loop!(policy, out, source, vector, row_count, DataType::Int32, i32)
			}
			ColumnData::Int64(out) => {
				parse_loop!(policy, out, source, vector, row_count, DataType::Int64, i64)
			}
			ColumnData::Uint32(out) => {
				parse_loop!(policy, out, source, vector, row_count, DataType::Uint32, u32)
			}
			ColumnData::Uint64(out) => {
				parse_loop!(policy, out, source, vector, row_count, DataType::Uint64, u64)
			}
			ColumnData::Float(out) => {
				parse_loop!(policy, out, source, vector, row_count, DataType::Float, f32)
			}
			ColumnData::Double(out) => {
				parse_loop!(policy, out, source, vector, row_count, DataType::Double, f64)
			}
			ColumnData::Bool(out) => {
				parse_loop!(policy, out, source, vector, row_count, DataType::Bool, bool)
			}
			_ => unreachable!("parse_string bound over an unsupported target"),
		}
		set_output_validity(self.block.column_mut(0), skip.column(0), row_count);
		Ok(self.block.view(row_count))
	}

	fn row_capacity(&self) -> usize {
		self.block.row_capacity().min(self.argument.row_capacity())
	}

	fn collect_referred_attribute_names(&self, names: &mut BTreeSet<String>) {
		self.argument.collect_referred_attribute_names(names);
	}
}
