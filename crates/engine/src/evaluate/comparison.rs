// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Comparison kernels. Three-valued NULL semantics come for free from
//! the skip vector: a comparison never reads a skipped row, and skipped
//! rows surface as NULL. `IS_NULL` is the exception: it inspects the
//! argument's validity bitmap directly and never propagates skips
//! upward.

use std::{cmp::Ordering, collections::BTreeSet, sync::Arc};

use supersonic_core::{
	Block, ColumnData, DataType, Schema, View,
	memory::BufferAllocator,
	value::container::BoolContainer,
};

use super::{BoolBlock, BoolView, BoundExpression, SkipVector, is_nullable, scalar_schema, set_output_validity};

#[derive(Clone, Copy, Debug)]
pub(crate) enum ComparisonOp {
	Equal,
	NotEqual,
	Less,
	LessOrEqual,
	Greater,
	GreaterOrEqual,
}

impl ComparisonOp {
	fn holds(&self, ordering: Ordering) -> bool {
		match self {
			ComparisonOp::Equal => ordering == Ordering::Equal,
			ComparisonOp::NotEqual => ordering != Ordering::Equal,
			ComparisonOp::Less => ordering == Ordering::Less,
			ComparisonOp::LessOrEqual => ordering != Ordering::Greater,
			ComparisonOp::Greater => ordering == Ordering::Greater,
			ComparisonOp::GreaterOrEqual => ordering != Ordering::Less,
		}
	}
}

pub(crate) struct BoundComparison {
	op: ComparisonOp,
	schema: Schema,
	block: Block,
	left: Box<dyn BoundExpression>,
	right: Box<dyn BoundExpression>,
}

/// Children must already share one type.
pub(crate) fn bind_comparison(
	op: ComparisonOp,
	name: String,
	left: Box<dyn BoundExpression>,
	right: Box<dyn BoundExpression>,
	allocator: &Arc<dyn BufferAllocator>,
	max_row_count: usize,
) -> crate::Result<Box<dyn BoundExpression>> {
	let nullable = is_nullable(left.as_ref()) || is_nullable(right.as_ref());
	let schema = scalar_schema(name, DataType::Bool, nullable);
	let block = Block::with_capacity(schema.clone(), allocator, max_row_count)?;
	Ok(Box::new(BoundComparison {
		op,
		schema,
		block,
		left,
		right,
	}))
}

fn ordering_loop(
	op: ComparisonOp,
	out: &mut BoolContainer,
	skip: &SkipVector,
	row_count: usize,
	ordering_at: impl Fn(usize) -> Ordering,
) {
	for i in 0..row_count {
		if skip.get(i) {
			out.push_undefined();
		} else {
			out.push(op.holds(ordering_at(i)));
		}
	}
}

impl BoundExpression for BoundComparison {
	fn result_schema(&self) -> &Schema {
		&self.schema
	}

	fn do_evaluate(&mut self, input: &View, skip: &mut BoolView<'_>) -> crate::Result<View> {
		debug_assert_eq!(skip.column_count(), 1);
		let left = self.left.do_evaluate(input, skip)?;
		let right = self.right.do_evaluate(input, skip)?;
		let row_count = input.row_count();
		self.block.clear();
		let vector = skip.column(0);
		let op = self.op;
		let out = match self.block.column_mut(0) {
			ColumnData::Bool(out) => out,
			_ => unreachable!("comparison output block is not boolean"),
		};
		match (left.column(0), right.column(0)) {
			(ColumnData::Int32(l), ColumnData::Int32(r)) => {
				let (lv, rv) = (l.as_slice(), r.as_slice());
				ordering_loop(op, out, vector, row_count, |i| lv[i].cmp(&rv[i]));
			}
			(ColumnData::Int64(l), ColumnData::Int64(r)) => {
				let (lv, rv) = (l.as_slice(), r.as_slice());
				ordering_loop(op, out, vector, row_count, |i| lv[i].cmp(&rv[i]));
			}
			(ColumnData::Uint32(l), ColumnData::Uint32(r)) => {
				let (lv, rv) = (l.as_slice(), r.as_slice());
				ordering_loop(op, out, vector, row_count, |i| lv[i].cmp(&rv[i]));
			}
			(ColumnData::Uint64(l), ColumnData::Uint64(r)) => {
				let (lv, rv) = (l.as_slice(), r.as_slice());
				ordering_loop(op, out, vector, row_count, |i| lv[i].cmp(&rv[i]));
			}
			(ColumnData::Float(l), ColumnData::Float(r)) => {
				let (lv, rv) = (l.as_slice(), r.as_slice());
				ordering_loop(op, out, vector, row_count, |i| lv[i].total_cmp(&rv[i]));
			}
			(ColumnData::Double(l), ColumnData::Double(r)) => {
				let (lv, rv) = (l.as_slice(), r.as_slice());
				ordering_loop(op, out, vector, row_count, |i| lv[i].total_cmp(&rv[i]));
			}
			(ColumnData::Bool(l), ColumnData::Bool(r)) => {
				ordering_loop(op, out, vector, row_count, |i| l.value(i).cmp(&r.value(i)));
			}
			(ColumnData::Date(l), ColumnData::Date(r)) => {
				let (lv, rv) = (l.as_slice(), r.as_slice());
				ordering_loop(op, out, vector, row_count, |i| lv[i].cmp(&rv[i]));
			}
			(ColumnData::DateTime(l), ColumnData::DateTime(r)) => {
				let (lv, rv) = (l.as_slice(), r.as_slice());
				ordering_loop(op, out, vector, row_count, |i| lv[i].cmp(&rv[i]));
			}
			(ColumnData::Utf8(l), ColumnData::Utf8(r)) => {
				ordering_loop(op, out, vector, row_count, |i| l.value(i).cmp(r.value(i)));
			}
			(ColumnData::Binary(l), ColumnData::Binary(r)) => {
				ordering_loop(op, out, vector, row_count, |i| l.value(i).cmp(r.value(i)));
			}
			(ColumnData::Enum(l), ColumnData::Enum(r)) => {
				let (lv, rv) = (l.as_slice(), r.as_slice());
				ordering_loop(op, out, vector, row_count, |i| lv[i].cmp(&rv[i]));
			}
			(ColumnData::DataType(l), ColumnData::DataType(r)) => {
				let (lv, rv) = (l.as_slice(), r.as_slice());
				ordering_loop(op, out, vector, row_count, |i| lv[i].cmp(&rv[i]));
			}
			_ => unreachable!("comparison bound over mismatched column types"),
		}
		set_output_validity(self.block.column_mut(0), skip.column(0), row_count);
		Ok(self.block.view(row_count))
	}

	fn row_capacity(&self) -> usize {
		self.block.row_capacity().min(self.left.row_capacity()).min(self.right.row_capacity())
	}

	fn collect_referred_attribute_names(&self, names: &mut BTreeSet<String>) {
		self.left.collect_referred_attribute_names(names);
		self.right.collect_referred_attribute_names(names);
	}
}

/// `IS_NULL(x)` reads the argument's validity bitmap. The argument is
/// evaluated against a private copy of the incoming skip vector, so its
/// NULLs never leak into the caller's view of the batch.
pub(crate) struct BoundIsNull {
	schema: Schema,
	block: Block,
	argument: Box<dyn BoundExpression>,
	local: BoolBlock,
}

pub(crate) fn bind_is_null(
	name: String,
	argument: Box<dyn BoundExpression>,
	allocator: &Arc<dyn BufferAllocator>,
	max_row_count: usize,
) -> crate::Result<Box<dyn BoundExpression>> {
	let schema = scalar_schema(name, DataType::Bool, false);
	let block = Block::with_capacity(schema.clone(), allocator, max_row_count)?;
	Ok(Box::new(BoundIsNull {
		schema,
		block,
		argument,
		local: BoolBlock::new(1, max_row_count),
	}))
}

impl BoundExpression for BoundIsNull {
	fn result_schema(&self) -> &Schema {
		&self.schema
	}

	fn do_evaluate(&mut self, input: &View, skip: &mut BoolView<'_>) -> crate::Result<View> {
		debug_assert_eq!(skip.column_count(), 1);
		let row_count = input.row_count();
		{
			let incoming = skip.column_ref(0).clone();
			self.local.column(0).copy_from(&incoming, row_count);
		}
		let argument = {
			let mut local = self.local.view(row_count);
			self.argument.do_evaluate(input, &mut local)?
		};
		self.block.clear();
		let vector = skip.column(0);
		let out = match self.block.column_mut(0) {
			ColumnData::Bool(out) => out,
			_ => unreachable!("is_null output block is not boolean"),
		};
		let column = argument.column(0);
		for i in 0..row_count {
			if vector.get(i) {
				out.push_undefined();
			} else {
				out.push(!column.is_defined(i));
			}
		}
		set_output_validity(self.block.column_mut(0), skip.column(0), row_count);
		Ok(self.block.view(row_count))
	}

	fn row_capacity(&self) -> usize {
		self.block
			.row_capacity()
			.min(self.argument.row_capacity())
			.min(self.local.capacity())
	}

	fn collect_referred_attribute_names(&self, names: &mut BTreeSet<String>) {
		self.argument.collect_referred_attribute_names(names);
	}
}
