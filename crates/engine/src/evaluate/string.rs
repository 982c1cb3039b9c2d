// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! String kernels. Outputs land in the kernel's own arena, reset at the
//! start of each batch. `CONCAT` adapts to skip density: on a
//! nearly-clean batch it writes every row unconditionally and lets the
//! final validity pass mark the skipped ones.

use std::{collections::BTreeSet, sync::Arc};

use supersonic_core::{
	Block, ColumnData, DataType, Schema, View,
	memory::BufferAllocator,
	value::container::Utf8Container,
};

use super::{
	BoolView, BoundExpression, BoundExpressionList, is_nullable, scalar_schema,
	selectivity_is_greater_than, set_output_validity,
};

fn utf8_column(view: &View) -> &Utf8Container {
	match view.column(0) {
		ColumnData::Utf8(container) => container,
		_ => unreachable!("string kernel bound over a non-string child"),
	}
}

pub(crate) struct BoundConcat {
	schema: Schema,
	block: Block,
	arguments: BoundExpressionList,
}

/// Arguments must already be strings (binding stringifies them).
pub(crate) fn bind_concat(
	name: String,
	arguments: BoundExpressionList,
	allocator: &Arc<dyn BufferAllocator>,
	max_row_count: usize,
) -> crate::Result<Box<dyn BoundExpression>> {
	let nullable = arguments.iter().any(|a| is_nullable(a.as_ref()));
	let schema = scalar_schema(name, DataType::Utf8, nullable);
	let block = Block::with_capacity(schema.clone(), allocator, max_row_count)?;
	Ok(Box::new(BoundConcat {
		schema,
		block,
		arguments,
	}))
}

impl BoundExpression for BoundConcat {
	fn result_schema(&self) -> &Schema {
		&self.schema
	}

	fn do_evaluate(&mut self, input: &View, skip: &mut BoolView<'_>) -> crate::Result<View> {
		debug_assert_eq!(skip.column_count(), 1);
		let row_count = input.row_count();
		let mut views = Vec::with_capacity(self.arguments.len());
		for argument in self.arguments.iter_mut() {
			views.push(argument.do_evaluate(input, skip)?);
		}
		let sources: Vec<&Utf8Container> = views.iter().map(utf8_column).collect();

		self.block.clear();
		let vector = skip.column(0);
		let out = match self.block.column_mut(0) {
			ColumnData::Utf8(out) => out,
			_ => unreachable!("concat output block is not a string column"),
		};
		let mut buffer = String::new();
		if !selectivity_is_greater_than(vector, row_count, 100) {
			// Sparse skips: write every row, the validity pass hides
			// the skipped ones.
			for i in 0..row_count {
				buffer.clear();
				for source in &sources {
					buffer.push_str(source.value(i));
				}
				out.push(&buffer);
			}
		} else {
			for i in 0..row_count {
				if vector.get(i) {
					out.push_undefined();
					continue;
				}
				buffer.clear();
				for source in &sources {
					buffer.push_str(source.value(i));
				}
				out.push(&buffer);
			}
		}
		set_output_validity(self.block.column_mut(0), skip.column(0), row_count);
		Ok(self.block.view(row_count))
	}

	fn row_capacity(&self) -> usize {
		let mut capacity = self.block.row_capacity();
		for argument in self.arguments.iter() {
			capacity = capacity.min(argument.row_capacity());
		}
		capacity
	}

	fn collect_referred_attribute_names(&self, names: &mut BTreeSet<String>) {
		self.arguments.collect_referred_attribute_names(names);
	}
}

/// Byte length of a string, as `uint32`.
pub(crate) struct BoundLength {
	schema: Schema,
	block: Block,
	argument: Box<dyn BoundExpression>,
}

pub(crate) fn bind_length(
	name: String,
	argument: Box<dyn BoundExpression>,
	allocator: &Arc<dyn BufferAllocator>,
	max_row_count: usize,
) -> crate::Result<Box<dyn BoundExpression>> {
	let schema = scalar_schema(name, DataType::Uint32, is_nullable(argument.as_ref()));
	let block = Block::with_capacity(schema.clone(), allocator, max_row_count)?;
	Ok(Box::new(BoundLength {
		schema,
		block,
		argument,
	}))
}

impl BoundExpression for BoundLength {
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
			ColumnData::Uint32(out) => out,
			_ => unreachable!("length output block is not uint32"),
		};
		for i in 0..row_count {
			if vector.get(i) {
				out.push_undefined();
			} else {
				out.push(source.value(i).len() as u32);
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

#[derive(Clone, Copy, Debug)]
pub(crate) enum StringTransform {
	Trim,
	Ltrim,
	Rtrim,
	ToUpper,
	ToLower,
}

/// Space trimming and ASCII case mapping.
pub(crate) struct BoundStringTransform {
	transform: StringTransform,
	schema: Schema,
	block: Block,
	argument: Box<dyn BoundExpression>,
}

pub(crate) fn bind_string_transform(
	transform: StringTransform,
	name: String,
	argument: Box<dyn BoundExpression>,
	allocator: &Arc<dyn BufferAllocator>,
	max_row_count: usize,
) -> crate::Result<Box<dyn BoundExpression>> {
	let schema = scalar_schema(name, DataType::Utf8, is_nullable(argument.as_ref()));
	let block = Block::with_capacity(schema.clone(), allocator, max_row_count)?;
	Ok(Box::new(BoundStringTransform {
		transform,
		schema,
		block,
		argument,
	}))
}

impl BoundExpression for BoundStringTransform {
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
			_ => unreachable!("string transform output block is not a string column"),
		};
		let mut buffer = String::new();
		for i in 0..row_count {
			if vector.get(i) {
				out.push_undefined();
				continue;
			}
			let value = source.value(i);
			match self.transform {
				StringTransform::Trim => out.push(value.trim_matches(' ')),
				StringTransform::Ltrim => out.push(value.trim_start_matches(' ')),
				StringTransform::Rtrim => out.push(value.trim_end_matches(' ')),
				StringTransform::ToUpper => {
					buffer.clear();
					buffer.push_str(value);
					buffer.make_ascii_uppercase();
					out.push(&buffer);
				}
				StringTransform::ToLower => {
					buffer.clear();
					buffer.push_str(value);
					buffer.make_ascii_lowercase();
					out.push(&buffer);
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

/// One-based character positions; a negative position counts from the
/// end, position zero is an empty result. Operating on characters keeps
/// multi-byte input intact.
fn substring_of(value: &str, position: i64, length: Option<i64>) -> &str {
	let char_count = value.chars().count() as i64;
	let start = if position > 0 {
		position - 1
	} else if position < 0 {
		char_count + position
	} else {
		return "";
	};
	let start = start.clamp(0, char_count);
	let take = match length {
		Some(length) => length.max(0).min(char_count - start),
		None => char_count - start,
	};
	let byte_at = |char_position: i64| {
		value
			.char_indices()
			.nth(char_position as usize)
			.map(|(offset, _)| offset)
			.unwrap_or(value.len())
	};
	&value[byte_at(start)..byte_at(start + take)]
}

pub(crate) struct BoundSubstring {
	schema: Schema,
	block: Block,
	argument: Box<dyn BoundExpression>,
	position: Box<dyn BoundExpression>,
	length: Option<Box<dyn BoundExpression>>,
}

/// `position` and `length` must already be `int64`.
pub(crate) fn bind_substring(
	name: String,
	argument: Box<dyn BoundExpression>,
	position: Box<dyn BoundExpression>,
	length: Option<Box<dyn BoundExpression>>,
	allocator: &Arc<dyn BufferAllocator>,
	max_row_count: usize,
) -> crate::Result<Box<dyn BoundExpression>> {
	let mut nullable = is_nullable(argument.as_ref()) || is_nullable(position.as_ref());
	if let Some(length) = &length {
		nullable = nullable || is_nullable(length.as_ref());
	}
	let schema = scalar_schema(name, DataType::Utf8, nullable);
	let block = Block::with_capacity(schema.clone(), allocator, max_row_count)?;
	Ok(Box::new(BoundSubstring {
		schema,
		block,
		argument,
		position,
		length,
	}))
}

impl BoundExpression for BoundSubstring {
	fn result_schema(&self) -> &Schema {
		&self.schema
	}

	fn do_evaluate(&mut self, input: &View, skip: &mut BoolView<'_>) -> crate::Result<View> {
		debug_assert_eq!(skip.column_count(), 1);
		let argument = self.argument.do_evaluate(input, skip)?;
		let position = self.position.do_evaluate(input, skip)?;
		let length = match &mut self.length {
			Some(length) => Some(length.do_evaluate(input, skip)?),
			None => None,
		};
		let row_count = input.row_count();
		self.block.clear();
		let vector = skip.column(0);
		let source = utf8_column(&argument);
		let positions = match position.column(0) {
			ColumnData::Int64(c) => c.as_slice(),
			_ => unreachable!("substring position bound over a non-int64 child"),
		};
		let lengths = length.as_ref().map(|view| match view.column(0) {
			ColumnData::Int64(c) => c.as_slice(),
			_ => unreachable!("substring length bound over a non-int64 child"),
		});
		let out = match self.block.column_mut(0) {
			ColumnData::Utf8(out) => out,
			_ => unreachable!("substring output block is not a string column"),
		};
		for i in 0..row_count {
			if vector.get(i) {
				out.push_undefined();
				continue;
			}
			let length = lengths.map(|l| l[i]);
			out.push(substring_of(source.value(i), positions[i], length));
		}
		set_output_validity(self.block.column_mut(0), skip.column(0), row_count);
		Ok(self.block.view(row_count))
	}

	fn row_capacity(&self) -> usize {
		let mut capacity = self.block.row_capacity().min(self.argument.row_capacity());
		capacity = capacity.min(self.position.row_capacity());
		if let Some(length) = &self.length {
			capacity = capacity.min(length.row_capacity());
		}
		capacity
	}

	fn collect_referred_attribute_names(&self, names: &mut BTreeSet<String>) {
		self.argument.collect_referred_attribute_names(names);
		self.position.collect_referred_attribute_names(names);
		if let Some(length) = &self.length {
			length.collect_referred_attribute_names(names);
		}
	}
}

/// One-based character offset of the needle in the haystack, zero when
/// absent.
pub(crate) struct BoundStringOffset {
	schema: Schema,
	block: Block,
	haystack: Box<dyn BoundExpression>,
	needle: Box<dyn BoundExpression>,
}

pub(crate) fn bind_string_offset(
	name: String,
	haystack: Box<dyn BoundExpression>,
	needle: Box<dyn BoundExpression>,
	allocator: &Arc<dyn BufferAllocator>,
	max_row_count: usize,
) -> crate::Result<Box<dyn BoundExpression>> {
	let nullable = is_nullable(haystack.as_ref()) || is_nullable(needle.as_ref());
	let schema = scalar_schema(name, DataType::Uint32, nullable);
	let block = Block::with_capacity(schema.clone(), allocator, max_row_count)?;
	Ok(Box::new(BoundStringOffset {
		schema,
		block,
		haystack,
		needle,
	}))
}

impl BoundExpression for BoundStringOffset {
	fn result_schema(&self) -> &Schema {
		&self.schema
	}

	fn do_evaluate(&mut self, input: &View, skip: &mut BoolView<'_>) -> crate::Result<View> {
		debug_assert_eq!(skip.column_count(), 1);
		let haystack = self.haystack.do_evaluate(input, skip)?;
		let needle = self.needle.do_evaluate(input, skip)?;
		let row_count = input.row_count();
		self.block.clear();
		let vector = skip.column(0);
		let haystack = utf8_column(&haystack);
		let needle = utf8_column(&needle);
		let out = match self.block.column_mut(0) {
			ColumnData::Uint32(out) => out,
			_ => unreachable!("string offset output block is not uint32"),
		};
		for i in 0..row_count {
			if vector.get(i) {
				out.push_undefined();
				continue;
			}
			let offset = match haystack.value(i).find(needle.value(i)) {
				Some(byte_offset) => {
					haystack.value(i)[..byte_offset].chars().count() as u32 + 1
				}
				None => 0,
			};
			out.push(offset);
		}
		set_output_validity(self.block.column_mut(0), skip.column(0), row_count);
		Ok(self.block.view(row_count))
	}

	fn row_capacity(&self) -> usize {
		self.block.row_capacity().min(self.haystack.row_capacity()).min(self.needle.row_capacity())
	}

	fn collect_referred_attribute_names(&self, names: &mut BTreeSet<String>) {
		self.haystack.collect_referred_attribute_names(names);
		self.needle.collect_referred_attribute_names(names);
	}
}

/// Replaces every occurrence of the needle. An empty needle leaves the
/// haystack unchanged.
pub(crate) struct BoundStringReplace {
	schema: Schema,
	block: Block,
	haystack: Box<dyn BoundExpression>,
	needle: Box<dyn BoundExpression>,
	substitute: Box<dyn BoundExpression>,
}

pub(crate) fn bind_string_replace(
	name: String,
	haystack: Box<dyn BoundExpression>,
	needle: Box<dyn BoundExpression>,
	substitute: Box<dyn BoundExpression>,
	allocator: &Arc<dyn BufferAllocator>,
	max_row_count: usize,
) -> crate::Result<Box<dyn BoundExpression>> {
	let nullable = is_nullable(haystack.as_ref())
		|| is_nullable(needle.as_ref())
		|| is_nullable(substitute.as_ref());
	let schema = scalar_schema(name, DataType::Utf8, nullable);
	let block = Block::with_capacity(schema.clone(), allocator, max_row_count)?;
	Ok(Box::new(BoundStringReplace {
		schema,
		block,
		haystack,
		needle,
		substitute,
	}))
}

impl BoundExpression for BoundStringReplace {
	fn result_schema(&self) -> &Schema {
		&self.schema
	}

	fn do_evaluate(&mut self, input: &View, skip: &mut BoolView<'_>) -> crate::Result<View> {
		debug_assert_eq!(skip.column_count(), 1);
		let haystack = self.haystack.do_evaluate(input, skip)?;
		let needle = self.needle.do_evaluate(input, skip)?;
		let substitute = self.substitute.do_evaluate(input, skip)?;
		let row_count = input.row_count();
		self.block.clear();
		let vector = skip.column(0);
		let haystack = utf8_column(&haystack);
		let needle = utf8_column(&needle);
		let substitute = utf8_column(&substitute);
		let out = match self.block.column_mut(0) {
			ColumnData::Utf8(out) => out,
			_ => unreachable!("string replace output block is not a string column"),
		};
		for i in 0..row_count {
			if vector.get(i) {
				out.push_undefined();
				continue;
			}
			if needle.value(i).is_empty() {
				out.push(haystack.value(i));
			} else {
				out.push(&haystack.value(i).replace(needle.value(i), substitute.value(i)));
			}
		}
		set_output_validity(self.block.column_mut(0), skip.column(0), row_count);
		Ok(self.block.view(row_count))
	}

	fn row_capacity(&self) -> usize {
		self.block
			.row_capacity()
			.min(self.haystack.row_capacity())
			.min(self.needle.row_capacity())
			.min(self.substitute.row_capacity())
	}

	fn collect_referred_attribute_names(&self, names: &mut BTreeSet<String>) {
		self.haystack.collect_referred_attribute_names(names);
		self.needle.collect_referred_attribute_names(names);
		self.substitute.collect_referred_attribute_names(names);
	}
}
