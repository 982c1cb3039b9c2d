// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Logical kernels with three-valued semantics. AND and OR
//! short-circuit: rows the left side already decides are marked in the
//! right side's private skip vector before the right side runs, so the
//! expensive branch is never computed for them. Kleene rules make the
//! decided value win over NULL: `NULL AND false = false`,
//! `NULL OR true = true`.

use std::{collections::BTreeSet, sync::Arc};

use supersonic_core::{
	Block, ColumnData, DataType, Schema, View,
	memory::BufferAllocator,
	value::container::BoolContainer,
};

use super::{BoolBlock, BoolView, BoundExpression, is_nullable, scalar_schema, set_output_validity};

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum ShortCircuitOp {
	And,
	Or,
}

impl ShortCircuitOp {
	/// The left-side value that decides the result without looking
	/// right: false for AND, true for OR.
	fn deciding_value(&self) -> bool {
		matches!(self, ShortCircuitOp::Or)
	}
}

pub(crate) struct BoundShortCircuit {
	op: ShortCircuitOp,
	schema: Schema,
	block: Block,
	left: Box<dyn BoundExpression>,
	right: Box<dyn BoundExpression>,
	/// Column 0 feeds the left child, column 1 the right child.
	local: BoolBlock,
}

pub(crate) fn bind_short_circuit(
	op: ShortCircuitOp,
	name: String,
	left: Box<dyn BoundExpression>,
	right: Box<dyn BoundExpression>,
	allocator: &Arc<dyn BufferAllocator>,
	max_row_count: usize,
) -> crate::Result<Box<dyn BoundExpression>> {
	let nullable = is_nullable(left.as_ref()) || is_nullable(right.as_ref());
	let schema = scalar_schema(name, DataType::Bool, nullable);
	let block = Block::with_capacity(schema.clone(), allocator, max_row_count)?;
	Ok(Box::new(BoundShortCircuit {
		op,
		schema,
		block,
		left,
		right,
		local: BoolBlock::new(2, max_row_count),
	}))
}

fn bool_column(view: &View) -> &BoolContainer {
	match view.column(0) {
		ColumnData::Bool(container) => container,
		_ => unreachable!("logical kernel bound over a non-boolean child"),
	}
}

impl BoundExpression for BoundShortCircuit {
	fn result_schema(&self) -> &Schema {
		&self.schema
	}

	fn do_evaluate(&mut self, input: &View, skip: &mut BoolView<'_>) -> crate::Result<View> {
		debug_assert_eq!(skip.column_count(), 1);
		let row_count = input.row_count();
		let deciding = self.op.deciding_value();

		let incoming = skip.column_ref(0).clone();
		self.local.column(0).copy_from(&incoming, row_count);
		let left = {
			let mut view = self.local.view_column(0, row_count);
			self.left.do_evaluate(input, &mut view)?
		};

		// Tighten the right side's skip vector: rows the left side
		// decided need no further work.
		self.local.column(1).copy_from(&incoming, row_count);
		{
			let left = bool_column(&left);
			let vector = self.local.column(1);
			for i in 0..row_count {
				if !incoming.get(i) && left.is_defined(i) && left.value(i) == deciding {
					vector.set(i, true);
				}
			}
		}
		let right = {
			let mut view = self.local.view_column(1, row_count);
			self.right.do_evaluate(input, &mut view)?
		};

		self.block.clear();
		let vector = skip.column(0);
		let out = match self.block.column_mut(0) {
			ColumnData::Bool(out) => out,
			_ => unreachable!("logical output block is not boolean"),
		};
		let left = bool_column(&left);
		let right = bool_column(&right);
		for i in 0..row_count {
			if vector.get(i) {
				out.push_undefined();
				continue;
			}
			if left.is_defined(i) && left.value(i) == deciding {
				out.push(deciding);
				continue;
			}
			// Left is the non-deciding value or NULL; a decided right
			// still wins over a NULL left.
			if right.is_defined(i) && right.value(i) == deciding {
				out.push(deciding);
				continue;
			}
			if !left.is_defined(i) || !right.is_defined(i) {
				vector.set(i, true);
				out.push_undefined();
				continue;
			}
			out.push(!deciding);
		}
		set_output_validity(self.block.column_mut(0), skip.column(0), row_count);
		Ok(self.block.view(row_count))
	}

	fn row_capacity(&self) -> usize {
		self.block
			.row_capacity()
			.min(self.left.row_capacity())
			.min(self.right.row_capacity())
			.min(self.local.capacity())
	}

	fn collect_referred_attribute_names(&self, names: &mut BTreeSet<String>) {
		self.left.collect_referred_attribute_names(names);
		self.right.collect_referred_attribute_names(names);
	}
}

/// Exclusive or does not short-circuit; either NULL operand nulls the
/// row, so both children share the caller's skip vector.
pub(crate) struct BoundXor {
	schema: Schema,
	block: Block,
	left: Box<dyn BoundExpression>,
	right: Box<dyn BoundExpression>,
}

pub(crate) fn bind_xor(
	name: String,
	left: Box<dyn BoundExpression>,
	right: Box<dyn BoundExpression>,
	allocator: &Arc<dyn BufferAllocator>,
	max_row_count: usize,
) -> crate::Result<Box<dyn BoundExpression>> {
	let nullable = is_nullable(left.as_ref()) || is_nullable(right.as_ref());
	let schema = scalar_schema(name, DataType::Bool, nullable);
	let block = Block::with_capacity(schema.clone(), allocator, max_row_count)?;
	Ok(Box::new(BoundXor {
		schema,
		block,
		left,
		right,
	}))
}

impl BoundExpression for BoundXor {
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
		let out = match self.block.column_mut(0) {
			ColumnData::Bool(out) => out,
			_ => unreachable!("logical output block is not boolean"),
		};
		let left = bool_column(&left);
		let right = bool_column(&right);
		for i in 0..row_count {
			if vector.get(i) {
				out.push_undefined();
			} else {
				out.push(left.value(i) ^ right.value(i));
			}
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

pub(crate) struct BoundNot {
	schema: Schema,
	block: Block,
	argument: Box<dyn BoundExpression>,
}

pub(crate) fn bind_not(
	name: String,
	argument: Box<dyn BoundExpression>,
	allocator: &Arc<dyn BufferAllocator>,
	max_row_count: usize,
) -> crate::Result<Box<dyn BoundExpression>> {
	let schema = scalar_schema(name, DataType::Bool, is_nullable(argument.as_ref()));
	let block = Block::with_capacity(schema.clone(), allocator, max_row_count)?;
	Ok(Box::new(BoundNot {
		schema,
		block,
		argument,
	}))
}

impl BoundExpression for BoundNot {
	fn result_schema(&self) -> &Schema {
		&self.schema
	}

	fn do_evaluate(&mut self, input: &View, skip: &mut BoolView<'_>) -> crate::Result<View> {
		debug_assert_eq!(skip.column_count(), 1);
		let argument = self.argument.do_evaluate(input, skip)?;
		let row_count = input.row_count();
		self.block.clear();
		let vector = skip.column(0);
		let out = match self.block.column_mut(0) {
			ColumnData::Bool(out) => out,
			_ => unreachable!("logical output block is not boolean"),
		};
		let argument = bool_column(&argument);
		for i in 0..row_count {
			if vector.get(i) {
				out.push_undefined();
			} else {
				out.push(!argument.value(i));
			}
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
