// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::collections::BTreeSet;

use supersonic_core::{BitVec, ColumnData, Schema, View, error::diagnostic::schema};

pub(crate) mod arith;
pub(crate) mod cast;
pub(crate) mod comparison;
pub(crate) mod conditional;
pub(crate) mod constant;
pub(crate) mod logic;
pub(crate) mod projection;
pub(crate) mod regexp;
mod skip;
pub(crate) mod string;

pub use skip::{BoolBlock, BoolView, SkipVector, selectivity_is_greater_than};

/// An executable expression: types, nullability and scratch storage are
/// fully resolved. Evaluation runs only the rows whose skip bit is
/// clear; on return, every skipped row is NULL in the output.
pub trait BoundExpression {
	/// Most expressions produce a single attribute; projections may
	/// produce arbitrarily many.
	fn result_schema(&self) -> &Schema;

	/// Evaluates one batch. `skip` carries one column per result
	/// attribute and exactly `input.row_count()` active rows.
	fn do_evaluate(&mut self, input: &View, skip: &mut BoolView<'_>) -> crate::Result<View>;

	/// The largest batch this expression can take without overflowing
	/// its scratch blocks. Exceeding it is a caller error.
	fn row_capacity(&self) -> usize;

	fn is_constant(&self) -> bool {
		false
	}

	/// Adds the input attribute names this expression depends on; never
	/// removes existing entries.
	fn collect_referred_attribute_names(&self, names: &mut BTreeSet<String>);
}

/// An owned list of bound expressions, for variadic operators.
pub struct BoundExpressionList {
	expressions: Vec<Box<dyn BoundExpression>>,
}

impl BoundExpressionList {
	pub fn new() -> Self {
		Self {
			expressions: Vec::new(),
		}
	}

	pub fn add(&mut self, expression: Box<dyn BoundExpression>) -> &mut Self {
		self.expressions.push(expression);
		self
	}

	pub fn len(&self) -> usize {
		self.expressions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.expressions.is_empty()
	}

	pub fn get(&self, position: usize) -> &dyn BoundExpression {
		self.expressions[position].as_ref()
	}

	pub fn get_mut(&mut self, position: usize) -> &mut Box<dyn BoundExpression> {
		&mut self.expressions[position]
	}

	pub fn iter(&self) -> impl Iterator<Item = &Box<dyn BoundExpression>> {
		self.expressions.iter()
	}

	pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn BoundExpression>> {
		self.expressions.iter_mut()
	}

	pub fn collect_referred_attribute_names(&self, names: &mut BTreeSet<String>) {
		for expression in &self.expressions {
			expression.collect_referred_attribute_names(names);
		}
	}
}

impl Default for BoundExpressionList {
	fn default() -> Self {
		Self::new()
	}
}

impl FromIterator<Box<dyn BoundExpression>> for BoundExpressionList {
	fn from_iter<I: IntoIterator<Item = Box<dyn BoundExpression>>>(iter: I) -> Self {
		Self {
			expressions: iter.into_iter().collect(),
		}
	}
}

/// The evaluation driver: a root bound expression plus pre-allocated
/// skip vectors, one per output attribute.
pub struct BoundExpressionTree {
	root: Box<dyn BoundExpression>,
	skip: BoolBlock,
}

impl std::fmt::Debug for BoundExpressionTree {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("BoundExpressionTree").finish_non_exhaustive()
	}
}

impl BoundExpressionTree {
	pub(crate) fn new(root: Box<dyn BoundExpression>, max_row_count: usize) -> Self {
		let skip = BoolBlock::new(root.result_schema().attribute_count(), max_row_count);
		Self {
			root,
			skip,
		}
	}

	pub fn result_schema(&self) -> &Schema {
		self.root.result_schema()
	}

	pub fn row_capacity(&self) -> usize {
		self.root.row_capacity().min(self.skip.capacity())
	}

	pub fn is_constant(&self) -> bool {
		self.root.is_constant()
	}

	pub fn referred_attribute_names(&self) -> BTreeSet<String> {
		let mut names = BTreeSet::new();
		self.root.collect_referred_attribute_names(&mut names);
		names
	}

	/// Evaluates the tree over one batch. The returned view borrows the
	/// tree's scratch storage: consume it before the next call, or pay
	/// a copy-on-write fork.
	pub fn evaluate(&mut self, input: &View) -> crate::Result<View> {
		assert!(
			input.row_count() <= self.row_capacity(),
			"batch of {} rows exceeds the bound row capacity {}",
			input.row_count(),
			self.row_capacity(),
		);
		self.skip.zero(input.row_count());
		let mut skip = self.skip.view(input.row_count());
		self.root.do_evaluate(input, &mut skip)
	}
}

/// Result schema of an ordinary scalar kernel.
pub(crate) fn scalar_schema(name: String, data_type: supersonic_core::DataType, nullable: bool) -> Schema {
	let nullability = if nullable {
		supersonic_core::Nullability::Nullable
	} else {
		supersonic_core::Nullability::NotNullable
	};
	Schema::single(supersonic_core::Attribute::new(name, data_type, nullability))
}

pub(crate) fn is_nullable(expression: &dyn BoundExpression) -> bool {
	expression.result_schema().attribute(0).is_nullable()
}

pub(crate) fn check_attribute_count(operation: &str, schema: &Schema, expected: usize) -> crate::Result<()> {
	if schema.attribute_count() != expected {
		return Err(supersonic_core::Error(schema::attribute_count_mismatch(
			operation,
			expected,
			schema.attribute_count(),
		)));
	}
	Ok(())
}

/// Batch-exit step of every kernel: a skipped row is a NULL row. The
/// bitmap covers the whole column (constant blocks are longer than the
/// batch); rows past the batch stay defined.
pub(crate) fn set_output_validity(column: &mut ColumnData, skip: &SkipVector, row_count: usize) {
	let len = column.len();
	column.set_bitvec(BitVec::from_fn(len, |i| i >= row_count || !skip.get(i)));
}
