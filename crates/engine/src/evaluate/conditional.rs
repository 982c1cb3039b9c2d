// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Conditional kernels. Each branch is evaluated only for the rows that
//! select it: the branch's skip vector is the caller's plus every row
//! routed elsewhere.

use std::{collections::BTreeSet, sync::Arc};

use supersonic_core::{
	Block, ColumnData, Schema, View,
	columnar::compare_rows,
	memory::BufferAllocator,
	value::container::BoolContainer,
};

use super::{BoolBlock, BoolView, BoundExpression, BoundExpressionList, is_nullable, scalar_schema, set_output_validity};

fn bool_column(view: &View) -> &BoolContainer {
	match view.column(0) {
		ColumnData::Bool(container) => container,
		_ => unreachable!("condition bound over a non-boolean child"),
	}
}

/// `IF(cond, then, else)`. A NULL condition selects neither branch and
/// yields NULL.
pub(crate) struct BoundIf {
	schema: Schema,
	block: Block,
	condition: Box<dyn BoundExpression>,
	then: Box<dyn BoundExpression>,
	otherwise: Box<dyn BoundExpression>,
	local: BoolBlock,
}

pub(crate) fn bind_if(
	name: String,
	condition: Box<dyn BoundExpression>,
	then: Box<dyn BoundExpression>,
	otherwise: Box<dyn BoundExpression>,
	allocator: &Arc<dyn BufferAllocator>,
	max_row_count: usize,
) -> crate::Result<Box<dyn BoundExpression>> {
	let data_type = then.result_schema().attribute(0).data_type();
	let nullable = is_nullable(condition.as_ref())
		|| is_nullable(then.as_ref())
		|| is_nullable(otherwise.as_ref());
	let schema = scalar_schema(name, data_type, nullable);
	let block = Block::with_capacity(schema.clone(), allocator, max_row_count)?;
	Ok(Box::new(BoundIf {
		schema,
		block,
		condition,
		then,
		otherwise,
		local: BoolBlock::new(2, max_row_count),
	}))
}

impl BoundExpression for BoundIf {
	fn result_schema(&self) -> &Schema {
		&self.schema
	}

	fn do_evaluate(&mut self, input: &View, skip: &mut BoolView<'_>) -> crate::Result<View> {
		debug_assert_eq!(skip.column_count(), 1);
		let row_count = input.row_count();
		let condition = self.condition.do_evaluate(input, skip)?;
		let condition = bool_column(&condition);

		let incoming = skip.column_ref(0).clone();
		{
			let vector = self.local.column(0);
			vector.copy_from(&incoming, row_count);
			for i in 0..row_count {
				if !incoming.get(i) && !(condition.is_defined(i) && condition.value(i)) {
					vector.set(i, true);
				}
			}
		}
		let then = {
			let mut view = self.local.view_column(0, row_count);
			self.then.do_evaluate(input, &mut view)?
		};
		{
			let vector = self.local.column(1);
			vector.copy_from(&incoming, row_count);
			for i in 0..row_count {
				if !incoming.get(i) && !(condition.is_defined(i) && !condition.value(i)) {
					vector.set(i, true);
				}
			}
		}
		let otherwise = {
			let mut view = self.local.view_column(1, row_count);
			self.otherwise.do_evaluate(input, &mut view)?
		};

		self.block.clear();
		let vector = skip.column(0);
		let out = self.block.column_mut(0);
		for i in 0..row_count {
			if vector.get(i) {
				out.push_undefined();
				continue;
			}
			if !condition.is_defined(i) {
				vector.set(i, true);
				out.push_undefined();
				continue;
			}
			let branch = if condition.value(i) {
				&then
			} else {
				&otherwise
			};
			if branch.column(0).is_defined(i) {
				out.push_from(branch.column(0), i);
			} else {
				vector.set(i, true);
				out.push_undefined();
			}
		}
		set_output_validity(self.block.column_mut(0), skip.column(0), row_count);
		Ok(self.block.view(row_count))
	}

	fn row_capacity(&self) -> usize {
		self.block
			.row_capacity()
			.min(self.condition.row_capacity())
			.min(self.then.row_capacity())
			.min(self.otherwise.row_capacity())
			.min(self.local.capacity())
	}

	fn collect_referred_attribute_names(&self, names: &mut BTreeSet<String>) {
		self.condition.collect_referred_attribute_names(names);
		self.then.collect_referred_attribute_names(names);
		self.otherwise.collect_referred_attribute_names(names);
	}
}

/// `IFNULL(a, b)`: `a`, with `b` substituted wherever `a` is NULL. The
/// output is nullable only if `b` is.
pub(crate) struct BoundIfNull {
	schema: Schema,
	block: Block,
	argument: Box<dyn BoundExpression>,
	substitute: Box<dyn BoundExpression>,
	local: BoolBlock,
}

pub(crate) fn bind_if_null(
	name: String,
	argument: Box<dyn BoundExpression>,
	substitute: Box<dyn BoundExpression>,
	allocator: &Arc<dyn BufferAllocator>,
	max_row_count: usize,
) -> crate::Result<Box<dyn BoundExpression>> {
	let data_type = argument.result_schema().attribute(0).data_type();
	let schema = scalar_schema(name, data_type, is_nullable(substitute.as_ref()));
	let block = Block::with_capacity(schema.clone(), allocator, max_row_count)?;
	Ok(Box::new(BoundIfNull {
		schema,
		block,
		argument,
		substitute,
		local: BoolBlock::new(2, max_row_count),
	}))
}

impl BoundExpression for BoundIfNull {
	fn result_schema(&self) -> &Schema {
		&self.schema
	}

	fn do_evaluate(&mut self, input: &View, skip: &mut BoolView<'_>) -> crate::Result<View> {
		debug_assert_eq!(skip.column_count(), 1);
		let row_count = input.row_count();
		let incoming = skip.column_ref(0).clone();

		self.local.column(0).copy_from(&incoming, row_count);
		let argument = {
			let mut view = self.local.view_column(0, row_count);
			self.argument.do_evaluate(input, &mut view)?
		};

		// The substitute only runs where the argument came back NULL.
		{
			let vector = self.local.column(1);
			vector.copy_from(&incoming, row_count);
			for i in 0..row_count {
				if !incoming.get(i) && argument.column(0).is_defined(i) {
					vector.set(i, true);
				}
			}
		}
		let substitute = {
			let mut view = self.local.view_column(1, row_count);
			self.substitute.do_evaluate(input, &mut view)?
		};

		self.block.clear();
		let vector = skip.column(0);
		let out = self.block.column_mut(0);
		for i in 0..row_count {
			if vector.get(i) {
				out.push_undefined();
				continue;
			}
			if argument.column(0).is_defined(i) {
				out.push_from(argument.column(0), i);
			} else if substitute.column(0).is_defined(i) {
				out.push_from(substitute.column(0), i);
			} else {
				vector.set(i, true);
				out.push_undefined();
			}
		}
		set_output_validity(self.block.column_mut(0), skip.column(0), row_count);
		Ok(self.block.view(row_count))
	}

	fn row_capacity(&self) -> usize {
		self.block
			.row_capacity()
			.min(self.argument.row_capacity())
			.min(self.substitute.row_capacity())
			.min(self.local.capacity())
	}

	fn collect_referred_attribute_names(&self, names: &mut BTreeSet<String>) {
		self.argument.collect_referred_attribute_names(names);
		self.substitute.collect_referred_attribute_names(names);
	}
}

/// `CASE(case, else, when₁, then₁, …)`. The leftmost matching WHEN
/// selects its THEN; a NULL case value matches nothing and falls through
/// to ELSE.
pub(crate) struct BoundCase {
	schema: Schema,
	block: Block,
	/// `[case, else, when₁, then₁, …]`, the symbolic argument order.
	arguments: BoundExpressionList,
	local: BoolBlock,
}

pub(crate) fn bind_case(
	name: String,
	arguments: BoundExpressionList,
	allocator: &Arc<dyn BufferAllocator>,
	max_row_count: usize,
) -> crate::Result<Box<dyn BoundExpression>> {
	debug_assert!(arguments.len() >= 4 && arguments.len() % 2 == 0);
	let data_type = arguments.get(1).result_schema().attribute(0).data_type();
	let mut nullable = is_nullable(arguments.get(0)) || is_nullable(arguments.get(1));
	for position in (3..arguments.len()).step_by(2) {
		nullable = nullable || is_nullable(arguments.get(position));
	}
	let schema = scalar_schema(name, data_type, nullable);
	let block = Block::with_capacity(schema.clone(), allocator, max_row_count)?;
	Ok(Box::new(BoundCase {
		schema,
		block,
		arguments,
		local: BoolBlock::new(2, max_row_count),
	}))
}

impl BoundExpression for BoundCase {
	fn result_schema(&self) -> &Schema {
		&self.schema
	}

	fn do_evaluate(&mut self, input: &View, skip: &mut BoolView<'_>) -> crate::Result<View> {
		debug_assert_eq!(skip.column_count(), 1);
		let row_count = input.row_count();
		let incoming = skip.column_ref(0).clone();
		let when_count = (self.arguments.len() - 2) / 2;

		// The case value and the WHENs run for every live row; their
		// NULLs select nothing rather than nulling the output.
		self.local.column(0).copy_from(&incoming, row_count);
		let case_view = {
			let mut view = self.local.view_column(0, row_count);
			self.arguments.get_mut(0).do_evaluate(input, &mut view)?
		};
		let mut when_views = Vec::with_capacity(when_count);
		for w in 0..when_count {
			self.local.column(0).copy_from(&incoming, row_count);
			let mut view = self.local.view_column(0, row_count);
			when_views.push(self.arguments.get_mut(2 + 2 * w).do_evaluate(input, &mut view)?);
		}

		// Leftmost matching WHEN wins; usize::MAX routes to ELSE.
		let mut selected = vec![usize::MAX; row_count];
		for i in 0..row_count {
			if incoming.get(i) || !case_view.column(0).is_defined(i) {
				continue;
			}
			for (w, when_view) in when_views.iter().enumerate() {
				if when_view.column(0).is_defined(i)
					&& compare_rows(case_view.column(0), i, when_view.column(0), i)
						== std::cmp::Ordering::Equal
				{
					selected[i] = w;
					break;
				}
			}
		}
		drop(when_views);

		let mut then_views = Vec::with_capacity(when_count);
		for w in 0..when_count {
			{
				let vector = self.local.column(1);
				vector.copy_from(&incoming, row_count);
				for i in 0..row_count {
					if !incoming.get(i) && selected[i] != w {
						vector.set(i, true);
					}
				}
			}
			let mut view = self.local.view_column(1, row_count);
			then_views.push(self.arguments.get_mut(3 + 2 * w).do_evaluate(input, &mut view)?);
		}
		{
			let vector = self.local.column(1);
			vector.copy_from(&incoming, row_count);
			for i in 0..row_count {
				if !incoming.get(i) && selected[i] != usize::MAX {
					vector.set(i, true);
				}
			}
		}
		let else_view = {
			let mut view = self.local.view_column(1, row_count);
			self.arguments.get_mut(1).do_evaluate(input, &mut view)?
		};

		self.block.clear();
		let vector = skip.column(0);
		let out = self.block.column_mut(0);
		for i in 0..row_count {
			if vector.get(i) {
				out.push_undefined();
				continue;
			}
			let branch = if selected[i] == usize::MAX {
				else_view.column(0)
			} else {
				then_views[selected[i]].column(0)
			};
			if branch.is_defined(i) {
				out.push_from(branch, i);
			} else {
				vector.set(i, true);
				out.push_undefined();
			}
		}
		set_output_validity(self.block.column_mut(0), skip.column(0), row_count);
		Ok(self.block.view(row_count))
	}

	fn row_capacity(&self) -> usize {
		let mut capacity = self.block.row_capacity().min(self.local.capacity());
		for expression in self.arguments.iter() {
			capacity = capacity.min(expression.row_capacity());
		}
		capacity
	}

	fn collect_referred_attribute_names(&self, names: &mut BTreeSet<String>) {
		self.arguments.collect_referred_attribute_names(names);
	}
}
