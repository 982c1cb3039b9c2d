// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Regular-expression kernels. Patterns are compile-time constants of
//! the expression tree, compiled exactly once at bind time; a malformed
//! pattern fails the bind, never an evaluation.

use std::{collections::BTreeSet, sync::Arc};

use regex::Regex;
use supersonic_core::{
	Block, ColumnData, DataType, Schema, View,
	error::diagnostic::schema,
	memory::BufferAllocator,
	value::container::Utf8Container,
};

use super::{BoolView, BoundExpression, is_nullable, scalar_schema, set_output_validity};

fn utf8_column(view: &View) -> &Utf8Container {
	match view.column(0) {
		ColumnData::Utf8(container) => container,
		_ => unreachable!("regexp kernel bound over a non-string child"),
	}
}

pub(crate) fn compile(pattern: &str) -> crate::Result<Regex> {
	Regex::new(pattern)
		.map_err(|e| supersonic_core::Error(schema::invalid_regular_expression(pattern, &e.to_string())))
}

/// Anchors the pattern so the whole input must match.
pub(crate) fn compile_full(pattern: &str) -> crate::Result<Regex> {
	Regex::new(&format!(r"\A(?:{pattern})\z"))
		.map_err(|e| supersonic_core::Error(schema::invalid_regular_expression(pattern, &e.to_string())))
}

/// `REGEXP_PARTIAL` / `REGEXP_FULL`: boolean match per row.
pub(crate) struct BoundRegexpMatch {
	regex: Regex,
	schema: Schema,
	block: Block,
	argument: Box<dyn BoundExpression>,
}

pub(crate) fn bind_regexp_match(
	name: String,
	regex: Regex,
	argument: Box<dyn BoundExpression>,
	allocator: &Arc<dyn BufferAllocator>,
	max_row_count: usize,
) -> crate::Result<Box<dyn BoundExpression>> {
	let schema = scalar_schema(name, DataType::Bool, is_nullable(argument.as_ref()));
	let block = Block::with_capacity(schema.clone(), allocator, max_row_count)?;
	Ok(Box::new(BoundRegexpMatch {
		regex,
		schema,
		block,
		argument,
	}))
}

impl BoundExpression for BoundRegexpMatch {
	fn result_schema(&self) -> &Schema {
		&self.schema
	}

	fn do_evaluate(&mut self, input: &View, skip: &mut BoolView<'_>) -> crate::Result<View> {
		debug_assert_eq!(skip.column_count(), 1);
		let argument = self.argument.do_evaluate(input, skip)?;
		let row_count = input.row_count();
		self.block.clear();
		let vector = skip.column(0);
		let source = utf8_column(&argument);
		let out = match self.block.column_mut(0) {
			ColumnData::Bool(out) => out,
			_ => unreachable!("regexp match output block is not boolean"),
		};
		for i in 0..row_count {
			if vector.get(i) {
				out.push_undefined();
			} else {
				out.push(self.regex.is_match(source.value(i)));
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

/// `REGEXP_EXTRACT`: the leftmost match, preferring capture group one
/// when the pattern has groups; no match yields NULL.
pub(crate) struct BoundRegexpExtract {
	regex: Regex,
	use_capture: bool,
	schema: Schema,
	block: Block,
	argument: Box<dyn BoundExpression>,
}

pub(crate) fn bind_regexp_extract(
	name: String,
	regex: Regex,
	argument: Box<dyn BoundExpression>,
	allocator: &Arc<dyn BufferAllocator>,
	max_row_count: usize,
) -> crate::Result<Box<dyn BoundExpression>> {
	let schema = scalar_schema(name, DataType::Utf8, true);
	let block = Block::with_capacity(schema.clone(), allocator, max_row_count)?;
	let use_capture = regex.captures_len() > 1;
	Ok(Box::new(BoundRegexpExtract {
		regex,
		use_capture,
		schema,
		block,
		argument,
	}))
}

impl BoundExpression for BoundRegexpExtract {
	fn result_schema(&self) -> &Schema {
		&self.schema
	}

	fn do_evaluate(&mut self, input: &View, skip: &mut BoolView<'_>) -> crate::Result<View> {
		debug_assert_eq!(skip.column_count(), 1);
		let argument = self.argument.do_evaluate(input, skip)?;
		let row_count = input.row_count();
		self.block.clear();
		let vector = skip.column(0);
		let source = utf8_column(&argument);
		let out = match self.block.column_mut(0) {
			ColumnData::Utf8(out) => out,
			_ => unreachable!("regexp extract output block is not a string column"),
		};
		for i in 0..row_count {
			if vector.get(i) {
				out.push_undefined();
				continue;
			}
			let value = source.value(i);
			let extracted = if self.use_capture {
				self.regex.captures(value).and_then(|c| c.get(1)).map(|m| m.as_str())
			} else {
				self.regex.find(value).map(|m| m.as_str())
			};
			match extracted {
				Some(extracted) => out.push(extracted),
				None => {
					vector.set(i, true);
					out.push_undefined();
				}
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

/// `REGEXP_REPLACE`: every match replaced; `$1`-style references in the
/// substitute expand to capture groups.
pub(crate) struct BoundRegexpReplace {
	regex: Regex,
	schema: Schema,
	block: Block,
	haystack: Box<dyn BoundExpression>,
	substitute: Box<dyn BoundExpression>,
}

pub(crate) fn bind_regexp_replace(
	name: String,
	regex: Regex,
	haystack: Box<dyn BoundExpression>,
	substitute: Box<dyn BoundExpression>,
	allocator: &Arc<dyn BufferAllocator>,
	max_row_count: usize,
) -> crate::Result<Box<dyn BoundExpression>> {
	let nullable = is_nullable(haystack.as_ref()) || is_nullable(substitute.as_ref());
	let schema = scalar_schema(name, DataType::Utf8, nullable);
	let block = Block::with_capacity(schema.clone(), allocator, max_row_count)?;
	Ok(Box::new(BoundRegexpReplace {
		regex,
		schema,
		block,
		haystack,
		substitute,
	}))
}

impl BoundExpression for BoundRegexpReplace {
	fn result_schema(&self) -> &Schema {
		&self.schema
	}

	fn do_evaluate(&mut self, input: &View, skip: &mut BoolView<'_>) -> crate::Result<View> {
		debug_assert_eq!(skip.column_count(), 1);
		let haystack = self.haystack.do_evaluate(input, skip)?;
		let substitute = self.substitute.do_evaluate(input, skip)?;
		let row_count = input.row_count();
		self.block.clear();
		let vector = skip.column(0);
		let haystack = utf8_column(&haystack);
		let substitute = utf8_column(&substitute);
		let out = match self.block.column_mut(0) {
			ColumnData::Utf8(out) => out,
			_ => unreachable!("regexp replace output block is not a string column"),
		};
		for i in 0..row_count {
			if vector.get(i) {
				out.push_undefined();
			} else {
				let replaced = self.regex.replace_all(haystack.value(i), substitute.value(i));
				out.push(&replaced);
			}
		}
		set_output_validity(self.block.column_mut(0), skip.column(0), row_count);
		Ok(self.block.view(row_count))
	}

	fn row_capacity(&self) -> usize {
		self.block
			.row_capacity()
			.min(self.haystack.row_capacity())
			.min(self.substitute.row_capacity())
	}

	fn collect_referred_attribute_names(&self, names: &mut BTreeSet<String>) {
		self.haystack.collect_referred_attribute_names(names);
		self.substitute.collect_referred_attribute_names(names);
	}
}
