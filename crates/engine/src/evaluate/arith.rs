// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Arithmetic kernels. Binding inserts internal casts so every loop runs
//! over one promoted type; the failing operators (divide, power, square
//! root) are bound over doubles and carry a failure policy, modulo runs
//! over integers with signaling or nulling semantics.

use std::{collections::BTreeSet, sync::Arc};

use supersonic_core::{
	Block, ColumnData, DataType, Schema, View,
	error::diagnostic::evaluation,
	memory::BufferAllocator,
	num::{IntegerRemainder, WrappingArithmetic},
	value::container::NumberContainer,
};

use super::{BoolView, BoundExpression, SkipVector, is_nullable, scalar_schema, set_output_validity};
use crate::expression::FailurePolicy;

#[derive(Clone, Copy, Debug)]
pub(crate) enum BinaryArithmeticOp {
	Plus,
	Minus,
	Multiply,
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum UnaryArithmeticOp {
	Negate,
	Abs,
}

trait SignedArithmetic: WrappingArithmetic {
	fn wrapping_neg(self) -> Self;
	fn wrapping_abs(self) -> Self;
}

macro_rules! impl_signed_int {
	($($ty:ty),*) => {
		$(
			impl SignedArithmetic for $ty {
				fn wrapping_neg(self) -> Self {
					<$ty>::wrapping_neg(self)
				}

				fn wrapping_abs(self) -> Self {
					<$ty>::wrapping_abs(self)
				}
			}
		)*
	};
}

macro_rules! impl_signed_float {
	($($ty:ty),*) => {
		$(
			impl SignedArithmetic for $ty {
				fn wrapping_neg(self) -> Self {
					-self
				}

				fn wrapping_abs(self) -> Self {
					self.abs()
				}
			}
		)*
	};
}

impl_signed_int!(i32, i64);
impl_signed_float!(f32, f64);

pub(crate) struct BoundBinaryArithmetic {
	op: BinaryArithmeticOp,
	schema: Schema,
	block: Block,
	left: Box<dyn BoundExpression>,
	right: Box<dyn BoundExpression>,
}

/// `left` and `right` must already be cast to the same numeric type.
pub(crate) fn bind_binary_arithmetic(
	op: BinaryArithmeticOp,
	name: String,
	left: Box<dyn BoundExpression>,
	right: Box<dyn BoundExpression>,
	allocator: &Arc<dyn BufferAllocator>,
	max_row_count: usize,
) -> crate::Result<Box<dyn BoundExpression>> {
	let data_type = left.result_schema().attribute(0).data_type();
	debug_assert_eq!(data_type, right.result_schema().attribute(0).data_type());
	let nullable = is_nullable(left.as_ref()) || is_nullable(right.as_ref());
	let schema = scalar_schema(name, data_type, nullable);
	let block = Block::with_capacity(schema.clone(), allocator, max_row_count)?;
	Ok(Box::new(BoundBinaryArithmetic {
		op,
		schema,
		block,
		left,
		right,
	}))
}

fn binary_loop<T: WrappingArithmetic>(
	op: BinaryArithmeticOp,
	out: &mut NumberContainer<T>,
	left: &NumberContainer<T>,
	right: &NumberContainer<T>,
	skip: &SkipVector,
	row_count: usize,
) {
	let lv = left.as_slice();
	let rv = right.as_slice();
	for i in 0..row_count {
		if skip.get(i) {
			out.push_undefined();
			continue;
		}
		let value = match op {
			BinaryArithmeticOp::Plus => lv[i].wrapping_add(rv[i]),
			BinaryArithmeticOp::Minus => lv[i].wrapping_sub(rv[i]),
			BinaryArithmeticOp::Multiply => lv[i].wrapping_mul(rv[i]),
		};
		out.push(value);
	}
}

impl BoundExpression for BoundBinaryArithmetic {
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
		match (self.block.column_mut(0), left.column(0), right.column(0)) {
			(ColumnData::Int32(out), ColumnData::Int32(l), ColumnData::Int32(r)) => {
				binary_loop(self.op, out, l, r, vector, row_count)
			}
			(ColumnData::Int64(out), ColumnData::Int64(l), ColumnData::Int64(r)) => {
				binary_loop(self.op, out, l, r, vector, row_count)
			}
			(ColumnData::Uint32(out), ColumnData::Uint32(l), ColumnData::Uint32(r)) => {
				binary_loop(self.op, out, l, r, vector, row_count)
			}
			(ColumnData::Uint64(out), ColumnData::Uint64(l), ColumnData::Uint64(r)) => {
				binary_loop(self.op, out, l, r, vector, row_count)
			}
			(ColumnData::Float(out), ColumnData::Float(l), ColumnData::Float(r)) => {
				binary_loop(self.op, out, l, r, vector, row_count)
			}
			(ColumnData::Double(out), ColumnData::Double(l), ColumnData::Double(r)) => {
				binary_loop(self.op, out, l, r, vector, row_count)
			}
			_ => unreachable!("arithmetic bound over mismatched column types"),
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

pub(crate) struct BoundUnaryArithmetic {
	op: UnaryArithmeticOp,
	schema: Schema,
	block: Block,
	argument: Box<dyn BoundExpression>,
}

pub(crate) fn bind_unary_arithmetic(
	op: UnaryArithmeticOp,
	name: String,
	argument: Box<dyn BoundExpression>,
	allocator: &Arc<dyn BufferAllocator>,
	max_row_count: usize,
) -> crate::Result<Box<dyn BoundExpression>> {
	let data_type = argument.result_schema().attribute(0).data_type();
	let schema = scalar_schema(name, data_type, is_nullable(argument.as_ref()));
	let block = Block::with_capacity(schema.clone(), allocator, max_row_count)?;
	Ok(Box::new(BoundUnaryArithmetic {
		op,
		schema,
		block,
		argument,
	}))
}

fn unary_loop<T: SignedArithmetic>(
	op: UnaryArithmeticOp,
	out: &mut NumberContainer<T>,
	argument: &NumberContainer<T>,
	skip: &SkipVector,
	row_count: usize,
) {
	let values = argument.as_slice();
	for i in 0..row_count {
		if skip.get(i) {
			out.push_undefined();
			continue;
		}
		let value = match op {
			UnaryArithmeticOp::Negate => values[i].wrapping_neg(),
			UnaryArithmeticOp::Abs => values[i].wrapping_abs(),
		};
		out.push(value);
	}
}

impl BoundExpression for BoundUnaryArithmetic {
	fn result_schema(&self) -> &Schema {
		&self.schema
	}

	fn do_evaluate(&mut self, input: &View, skip: &mut BoolView<'_>) -> crate::Result<View> {
		debug_assert_eq!(skip.column_count(), 1);
		let argument = self.argument.do_evaluate(input, skip)?;
		let row_count = input.row_count();
		self.block.clear();
		let vector = skip.column(0);
		match (self.block.column_mut(0), argument.column(0)) {
			(ColumnData::Int32(out), ColumnData::Int32(a)) => {
				unary_loop(self.op, out, a, vector, row_count)
			}
			(ColumnData::Int64(out), ColumnData::Int64(a)) => {
				unary_loop(self.op, out, a, vector, row_count)
			}
			(ColumnData::Float(out), ColumnData::Float(a)) => {
				unary_loop(self.op, out, a, vector, row_count)
			}
			(ColumnData::Double(out), ColumnData::Double(a)) => {
				unary_loop(self.op, out, a, vector, row_count)
			}
			_ => unreachable!("unary arithmetic bound over unsupported column type"),
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

/// Division binds over doubles for every policy, so the quiet variant
/// can produce IEEE infinities.
pub(crate) struct BoundDivide {
	policy: FailurePolicy,
	schema: Schema,
	block: Block,
	left: Box<dyn BoundExpression>,
	right: Box<dyn BoundExpression>,
}

pub(crate) fn bind_divide(
	policy: FailurePolicy,
	name: String,
	left: Box<dyn BoundExpression>,
	right: Box<dyn BoundExpression>,
	allocator: &Arc<dyn BufferAllocator>,
	max_row_count: usize,
) -> crate::Result<Box<dyn BoundExpression>> {
	// A nulling divide can introduce nulls regardless of the inputs.
	let nullable = matches!(policy, FailurePolicy::Nulling)
		|| is_nullable(left.as_ref())
		|| is_nullable(right.as_ref());
	let schema = scalar_schema(name, DataType::Double, nullable);
	let block = Block::with_capacity(schema.clone(), allocator, max_row_count)?;
	Ok(Box::new(BoundDivide {
		policy,
		schema,
		block,
		left,
		right,
	}))
}

impl BoundExpression for BoundDivide {
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
		let (out, lv, rv) = match (self.block.column_mut(0), left.column(0), right.column(0)) {
			(ColumnData::Double(out), ColumnData::Double(l), ColumnData::Double(r)) => {
				(out, l.as_slice(), r.as_slice())
			}
			_ => unreachable!("divide bound over non-double columns"),
		};
		for i in 0..row_count {
			if vector.get(i) {
				out.push_undefined();
				continue;
			}
			if rv[i] == 0.0 {
				match self.policy {
					FailurePolicy::Signaling => {
						return Err(supersonic_core::Error(evaluation::division_by_zero()));
					}
					FailurePolicy::Nulling => {
						vector.set(i, true);
						out.push_undefined();
						continue;
					}
					FailurePolicy::Quiet => {}
				}
			}
			out.push(lv[i] / rv[i]);
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

pub(crate) struct BoundModulo {
	policy: FailurePolicy,
	schema: Schema,
	block: Block,
	left: Box<dyn BoundExpression>,
	right: Box<dyn BoundExpression>,
}

pub(crate) fn bind_modulo(
	policy: FailurePolicy,
	name: String,
	left: Box<dyn BoundExpression>,
	right: Box<dyn BoundExpression>,
	allocator: &Arc<dyn BufferAllocator>,
	max_row_count: usize,
) -> crate::Result<Box<dyn BoundExpression>> {
	let data_type = left.result_schema().attribute(0).data_type();
	let nullable = matches!(policy, FailurePolicy::Nulling)
		|| is_nullable(left.as_ref())
		|| is_nullable(right.as_ref());
	let schema = scalar_schema(name, data_type, nullable);
	let block = Block::with_capacity(schema.clone(), allocator, max_row_count)?;
	Ok(Box::new(BoundModulo {
		policy,
		schema,
		block,
		left,
		right,
	}))
}

fn modulo_loop<T: IntegerRemainder>(
	policy: FailurePolicy,
	out: &mut NumberContainer<T>,
	left: &NumberContainer<T>,
	right: &NumberContainer<T>,
	skip: &mut SkipVector,
	row_count: usize,
) -> crate::Result<()> {
	let lv = left.as_slice();
	let rv = right.as_slice();
	for i in 0..row_count {
		if skip.get(i) {
			out.push_undefined();
			continue;
		}
		if rv[i].is_zero() {
			match policy {
				FailurePolicy::Signaling | FailurePolicy::Quiet => {
					return Err(supersonic_core::Error(evaluation::modulo_by_zero()));
				}
				FailurePolicy::Nulling => {
					skip.set(i, true);
					out.push_undefined();
					continue;
				}
			}
		}
		out.push(lv[i].wrapping_rem(rv[i]));
	}
	Ok(())
}

impl BoundExpression for BoundModulo {
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
		match (self.block.column_mut(0), left.column(0), right.column(0)) {
			(ColumnData::Int32(out), ColumnData::Int32(l), ColumnData::Int32(r)) => {
				modulo_loop(self.policy, out, l, r, vector, row_count)?
			}
			(ColumnData::Int64(out), ColumnData::Int64(l), ColumnData::Int64(r)) => {
				modulo_loop(self.policy, out, l, r, vector, row_count)?
			}
			(ColumnData::Uint32(out), ColumnData::Uint32(l), ColumnData::Uint32(r)) => {
				modulo_loop(self.policy, out, l, r, vector, row_count)?
			}
			(ColumnData::Uint64(out), ColumnData::Uint64(l), ColumnData::Uint64(r)) => {
				modulo_loop(self.policy, out, l, r, vector, row_count)?
			}
			_ => unreachable!("modulo bound over non-integer columns"),
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

pub(crate) struct BoundPower {
	policy: FailurePolicy,
	schema: Schema,
	block: Block,
	left: Box<dyn BoundExpression>,
	right: Box<dyn BoundExpression>,
}

pub(crate) fn bind_power(
	policy: FailurePolicy,
	name: String,
	left: Box<dyn BoundExpression>,
	right: Box<dyn BoundExpression>,
	allocator: &Arc<dyn BufferAllocator>,
	max_row_count: usize,
) -> crate::Result<Box<dyn BoundExpression>> {
	let nullable = matches!(policy, FailurePolicy::Nulling)
		|| is_nullable(left.as_ref())
		|| is_nullable(right.as_ref());
	let schema = scalar_schema(name, DataType::Double, nullable);
	let block = Block::with_capacity(schema.clone(), allocator, max_row_count)?;
	Ok(Box::new(BoundPower {
		policy,
		schema,
		block,
		left,
		right,
	}))
}

impl BoundExpression for BoundPower {
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
		let (out, lv, rv) = match (self.block.column_mut(0), left.column(0), right.column(0)) {
			(ColumnData::Double(out), ColumnData::Double(l), ColumnData::Double(r)) => {
				(out, l.as_slice(), r.as_slice())
			}
			_ => unreachable!("power bound over non-double columns"),
		};
		for i in 0..row_count {
			if vector.get(i) {
				out.push_undefined();
				continue;
			}
			let (base, exponent) = (lv[i], rv[i]);
			let out_of_domain =
				(base < 0.0 && exponent.fract() != 0.0) || (base == 0.0 && exponent < 0.0);
			if out_of_domain {
				match self.policy {
					FailurePolicy::Signaling => {
						return Err(supersonic_core::Error(evaluation::power_domain(
							base, exponent,
						)));
					}
					FailurePolicy::Nulling => {
						vector.set(i, true);
						out.push_undefined();
						continue;
					}
					FailurePolicy::Quiet => {}
				}
			}
			out.push(base.powf(exponent));
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

pub(crate) struct BoundSqrt {
	policy: FailurePolicy,
	schema: Schema,
	block: Block,
	argument: Box<dyn BoundExpression>,
}

pub(crate) fn bind_sqrt(
	policy: FailurePolicy,
	name: String,
	argument: Box<dyn BoundExpression>,
	allocator: &Arc<dyn BufferAllocator>,
	max_row_count: usize,
) -> crate::Result<Box<dyn BoundExpression>> {
	let nullable = matches!(policy, FailurePolicy::Nulling) || is_nullable(argument.as_ref());
	let schema = scalar_schema(name, DataType::Double, nullable);
	let block = Block::with_capacity(schema.clone(), allocator, max_row_count)?;
	Ok(Box::new(BoundSqrt {
		policy,
		schema,
		block,
		argument,
	}))
}

impl BoundExpression for BoundSqrt {
	fn result_schema(&self) -> &Schema {
		&self.schema
	}

	fn do_evaluate(&mut self, input: &View, skip: &mut BoolView<'_>) -> crate::Result<View> {
		debug_assert_eq!(skip.column_count(), 1);
		let argument = self.argument.do_evaluate(input, skip)?;
		let row_count = input.row_count();
		self.block.clear();
		let vector = skip.column(0);
		let (out, values) = match (self.block.column_mut(0), argument.column(0)) {
			(ColumnData::Double(out), ColumnData::Double(a)) => (out, a.as_slice()),
			_ => unreachable!("sqrt bound over non-double column"),
		};
		for i in 0..row_count {
			if vector.get(i) {
				out.push_undefined();
				continue;
			}
			let value = values[i];
			if value < 0.0 {
				match self.policy {
					FailurePolicy::Signaling => {
						return Err(supersonic_core::Error(
							evaluation::negative_square_root(value),
						));
					}
					FailurePolicy::Nulling => {
						vector.set(i, true);
						out.push_undefined();
						continue;
					}
					FailurePolicy::Quiet => {}
				}
			}
			out.push(value.sqrt());
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
