// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! A small scalar function registry backing `Call` expressions. Each
//! entry maps a function name to a binder that validates arguments and
//! produces a bound kernel.

use std::{collections::HashMap, sync::Arc};

use supersonic_core::{
	DataType,
	error::diagnostic::schema,
	memory::BufferAllocator,
};

use crate::evaluate::{
	BoundExpression,
	arith::{UnaryArithmeticOp, bind_sqrt, bind_unary_arithmetic},
	cast::cast_to,
	string::{StringTransform, bind_length, bind_string_transform},
};
use crate::expression::FailurePolicy;

type ScalarBinder = fn(
	name: String,
	arguments: Vec<Box<dyn BoundExpression>>,
	allocator: &Arc<dyn BufferAllocator>,
	max_row_count: usize,
) -> crate::Result<Box<dyn BoundExpression>>;

pub struct Functions {
	scalars: HashMap<String, ScalarBinder>,
}

pub struct FunctionsBuilder {
	scalars: HashMap<String, ScalarBinder>,
}

impl Functions {
	pub fn builder() -> FunctionsBuilder {
		FunctionsBuilder {
			scalars: HashMap::new(),
		}
	}

	pub(crate) fn bind_scalar(
		&self,
		function: &str,
		name: String,
		arguments: Vec<Box<dyn BoundExpression>>,
		allocator: &Arc<dyn BufferAllocator>,
		max_row_count: usize,
	) -> crate::Result<Box<dyn BoundExpression>> {
		let binder = self
			.scalars
			.get(function)
			.ok_or_else(|| supersonic_core::Error(schema::unknown_function(function)))?;
		binder(name, arguments, allocator, max_row_count)
	}
}

impl FunctionsBuilder {
	pub fn register_scalar(mut self, function: impl Into<String>, binder: ScalarBinder) -> Self {
		self.scalars.insert(function.into(), binder);
		self
	}

	pub fn build(self) -> Functions {
		Functions {
			scalars: self.scalars,
		}
	}
}

impl Default for Functions {
	fn default() -> Self {
		Functions::builder()
			.register_scalar("abs", bind_abs)
			.register_scalar("sqrt", bind_sqrt_function)
			.register_scalar("length", bind_length_function)
			.register_scalar("upper", bind_upper)
			.register_scalar("lower", bind_lower)
			.build()
	}
}

fn exactly_one(
	function: &str,
	mut arguments: Vec<Box<dyn BoundExpression>>,
) -> crate::Result<Box<dyn BoundExpression>> {
	if arguments.len() != 1 {
		return Err(supersonic_core::Error(schema::arity_mismatch(function, 1, arguments.len())));
	}
	Ok(arguments.remove(0))
}

fn bind_abs(
	name: String,
	arguments: Vec<Box<dyn BoundExpression>>,
	allocator: &Arc<dyn BufferAllocator>,
	max_row_count: usize,
) -> crate::Result<Box<dyn BoundExpression>> {
	let argument = exactly_one("abs", arguments)?;
	let data_type = argument.result_schema().attribute(0).data_type();
	if !data_type.is_numeric() {
		return Err(supersonic_core::Error(schema::unsupported_type("abs", data_type)));
	}
	// Unsigned magnitudes are their own absolute value.
	if matches!(data_type, DataType::Uint32 | DataType::Uint64) {
		return Ok(argument);
	}
	bind_unary_arithmetic(UnaryArithmeticOp::Abs, name, argument, allocator, max_row_count)
}

fn bind_sqrt_function(
	name: String,
	arguments: Vec<Box<dyn BoundExpression>>,
	allocator: &Arc<dyn BufferAllocator>,
	max_row_count: usize,
) -> crate::Result<Box<dyn BoundExpression>> {
	let argument = exactly_one("sqrt", arguments)?;
	let argument = cast_to(argument, DataType::Double, allocator, max_row_count)?;
	bind_sqrt(FailurePolicy::Nulling, name, argument, allocator, max_row_count)
}

fn bind_length_function(
	name: String,
	arguments: Vec<Box<dyn BoundExpression>>,
	allocator: &Arc<dyn BufferAllocator>,
	max_row_count: usize,
) -> crate::Result<Box<dyn BoundExpression>> {
	let argument = exactly_one("length", arguments)?;
	require_string("length", argument.as_ref())?;
	bind_length(name, argument, allocator, max_row_count)
}

fn bind_upper(
	name: String,
	arguments: Vec<Box<dyn BoundExpression>>,
	allocator: &Arc<dyn BufferAllocator>,
	max_row_count: usize,
) -> crate::Result<Box<dyn BoundExpression>> {
	let argument = exactly_one("upper", arguments)?;
	require_string("upper", argument.as_ref())?;
	bind_string_transform(StringTransform::ToUpper, name, argument, allocator, max_row_count)
}

fn bind_lower(
	name: String,
	arguments: Vec<Box<dyn BoundExpression>>,
	allocator: &Arc<dyn BufferAllocator>,
	max_row_count: usize,
) -> crate::Result<Box<dyn BoundExpression>> {
	let argument = exactly_one("lower", arguments)?;
	require_string("lower", argument.as_ref())?;
	bind_string_transform(StringTransform::ToLower, name, argument, allocator, max_row_count)
}

fn require_string(function: &str, argument: &dyn BoundExpression) -> crate::Result<()> {
	let data_type = argument.result_schema().attribute(0).data_type();
	if data_type != DataType::Utf8 {
		return Err(supersonic_core::Error(schema::type_mismatch(
			function,
			"a string argument",
			data_type,
		)));
	}
	Ok(())
}
