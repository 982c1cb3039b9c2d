// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Binding: the type-resolution pass from the symbolic tree to bound
//! kernels. Children bind first; the parent picks its kernel from the
//! resolved argument types, inserting internal casts along the numeric
//! promotion lattice. Binding is pure (the same schema always yields
//! the same tree) and every failure here is a schema-family
//! diagnostic.

use std::sync::Arc;

use supersonic_core::{
	DataType, Schema,
	error::diagnostic::schema,
	memory::BufferAllocator,
};

use super::{Expression, FailurePolicy};
use crate::{
	evaluate::{
		BoundExpression, BoundExpressionList, BoundExpressionTree,
		arith::{
			BinaryArithmeticOp, UnaryArithmeticOp, bind_binary_arithmetic, bind_divide,
			bind_modulo, bind_power, bind_sqrt, bind_unary_arithmetic,
		},
		cast::{bind_cast, bind_parse_string, cast_to, common_comparable_type, common_numeric_type},
		check_attribute_count,
		comparison::{ComparisonOp, bind_comparison, bind_is_null},
		conditional::{bind_case, bind_if, bind_if_null},
		constant::bind_constant,
		logic::{ShortCircuitOp, bind_not, bind_short_circuit, bind_xor},
		projection::{bind_input_attribute_projection, bind_projection},
		regexp::{
			bind_regexp_extract, bind_regexp_match, bind_regexp_replace, compile, compile_full,
		},
		string::{
			StringTransform, bind_concat, bind_length, bind_string_offset, bind_string_replace,
			bind_string_transform, bind_substring,
		},
	},
	function::Functions,
	projector::{MultiSourceProjector, project_all_attributes, project_named_attribute, project_rename},
};

impl Expression {
	/// Resolves this tree against `input`, pre-allocating scratch blocks
	/// sized for `max_row_count` rows, and wraps the result in an
	/// evaluation driver.
	pub fn bind(
		&self,
		input: &Schema,
		allocator: &Arc<dyn BufferAllocator>,
		max_row_count: usize,
	) -> crate::Result<BoundExpressionTree> {
		let root = self.do_bind(input, allocator, max_row_count)?;
		Ok(BoundExpressionTree::new(root, max_row_count))
	}

	pub(crate) fn do_bind(
		&self,
		input: &Schema,
		allocator: &Arc<dyn BufferAllocator>,
		max_row_count: usize,
	) -> crate::Result<Box<dyn BoundExpression>> {
		let name = self.to_string();
		match self {
			Expression::Constant(e) => {
				if let Some(data_type) = e.value.data_type() {
					if data_type != e.data_type {
						return Err(supersonic_core::Error(schema::type_mismatch(
							"CONSTANT",
							"a value of the declared type",
							data_type,
						)));
					}
				}
				bind_constant(name, e.data_type, &e.value, allocator, max_row_count)
			}
			Expression::NamedAttribute(e) => {
				bind_input_attribute_projection(input, &project_named_attribute(&e.name))
			}
			Expression::AttributeAt(e) => bind_input_attribute_projection(
				input,
				&crate::projector::project_attribute_at(e.position),
			),

			Expression::Plus(e) => {
				let (left, right) = self.bind_numeric_pair(
					"ADD", &e.left, &e.right, input, allocator, max_row_count,
				)?;
				bind_binary_arithmetic(
					BinaryArithmeticOp::Plus, name, left, right, allocator, max_row_count,
				)
			}
			Expression::Minus(e) => {
				let (left, right) = self.bind_numeric_pair(
					"SUBTRACT", &e.left, &e.right, input, allocator, max_row_count,
				)?;
				bind_binary_arithmetic(
					BinaryArithmeticOp::Minus, name, left, right, allocator, max_row_count,
				)
			}
			Expression::Multiply(e) => {
				let (left, right) = self.bind_numeric_pair(
					"MULTIPLY", &e.left, &e.right, input, allocator, max_row_count,
				)?;
				bind_binary_arithmetic(
					BinaryArithmeticOp::Multiply, name, left, right, allocator, max_row_count,
				)
			}
			Expression::Negate(e) => {
				let argument = bind_scalar_child("NEGATE", &e.argument, input, allocator, max_row_count)?;
				let data_type = argument.result_schema().attribute(0).data_type();
				if !data_type.is_numeric() {
					return Err(supersonic_core::Error(schema::unsupported_type(
						"NEGATE", data_type,
					)));
				}
				let argument = match data_type {
					DataType::Uint32 => {
						cast_to(argument, DataType::Int64, allocator, max_row_count)?
					}
					DataType::Uint64 => {
						return Err(supersonic_core::Error(schema::unsupported_type(
							"NEGATE",
							DataType::Uint64,
						)));
					}
					_ => argument,
				};
				bind_unary_arithmetic(
					UnaryArithmeticOp::Negate, name, argument, allocator, max_row_count,
				)
			}
			Expression::Abs(e) => {
				let argument = bind_scalar_child("ABS", &e.argument, input, allocator, max_row_count)?;
				let data_type = argument.result_schema().attribute(0).data_type();
				if !data_type.is_numeric() {
					return Err(supersonic_core::Error(schema::unsupported_type(
						"ABS", data_type,
					)));
				}
				if matches!(data_type, DataType::Uint32 | DataType::Uint64) {
					return Ok(argument);
				}
				bind_unary_arithmetic(
					UnaryArithmeticOp::Abs, name, argument, allocator, max_row_count,
				)
			}
			Expression::Divide(e) => {
				let left = bind_scalar_child("DIVIDE", &e.left, input, allocator, max_row_count)?;
				let right = bind_scalar_child("DIVIDE", &e.right, input, allocator, max_row_count)?;
				require_numeric("DIVIDE", left.as_ref())?;
				require_numeric("DIVIDE", right.as_ref())?;
				let left = cast_to(left, DataType::Double, allocator, max_row_count)?;
				let right = cast_to(right, DataType::Double, allocator, max_row_count)?;
				bind_divide(e.policy, name, left, right, allocator, max_row_count)
			}
			Expression::Modulo(e) => {
				if e.policy == FailurePolicy::Quiet {
					return Err(supersonic_core::Error(schema::not_implemented(
						"MODULO_QUIET",
					)));
				}
				let (left, right) = self.bind_numeric_pair(
					"MODULO", &e.left, &e.right, input, allocator, max_row_count,
				)?;
				let data_type = left.result_schema().attribute(0).data_type();
				if !data_type.is_integer() {
					return Err(supersonic_core::Error(schema::unsupported_type(
						"MODULO", data_type,
					)));
				}
				bind_modulo(e.policy, name, left, right, allocator, max_row_count)
			}
			Expression::Power(e) => {
				let left = bind_scalar_child("POWER", &e.left, input, allocator, max_row_count)?;
				let right = bind_scalar_child("POWER", &e.right, input, allocator, max_row_count)?;
				require_numeric("POWER", left.as_ref())?;
				require_numeric("POWER", right.as_ref())?;
				let left = cast_to(left, DataType::Double, allocator, max_row_count)?;
				let right = cast_to(right, DataType::Double, allocator, max_row_count)?;
				bind_power(e.policy, name, left, right, allocator, max_row_count)
			}
			Expression::Sqrt(e) => {
				let argument = bind_scalar_child("SQRT", &e.argument, input, allocator, max_row_count)?;
				require_numeric("SQRT", argument.as_ref())?;
				let argument = cast_to(argument, DataType::Double, allocator, max_row_count)?;
				bind_sqrt(e.policy, name, argument, allocator, max_row_count)
			}

			Expression::Equal(e) => self.bind_comparison_op(
				ComparisonOp::Equal, name, &e.left, &e.right, input, allocator, max_row_count,
			),
			Expression::NotEqual(e) => self.bind_comparison_op(
				ComparisonOp::NotEqual, name, &e.left, &e.right, input, allocator, max_row_count,
			),
			Expression::Less(e) => self.bind_comparison_op(
				ComparisonOp::Less, name, &e.left, &e.right, input, allocator, max_row_count,
			),
			Expression::LessOrEqual(e) => self.bind_comparison_op(
				ComparisonOp::LessOrEqual, name, &e.left, &e.right, input, allocator,
				max_row_count,
			),
			Expression::Greater(e) => self.bind_comparison_op(
				ComparisonOp::Greater, name, &e.left, &e.right, input, allocator, max_row_count,
			),
			Expression::GreaterOrEqual(e) => self.bind_comparison_op(
				ComparisonOp::GreaterOrEqual, name, &e.left, &e.right, input, allocator,
				max_row_count,
			),
			Expression::IsNull(e) => {
				let argument = bind_scalar_child("IS_NULL", &e.argument, input, allocator, max_row_count)?;
				bind_is_null(name, argument, allocator, max_row_count)
			}

			Expression::And(e) => {
				let left = bind_boolean_child("AND", &e.left, input, allocator, max_row_count)?;
				let right = bind_boolean_child("AND", &e.right, input, allocator, max_row_count)?;
				bind_short_circuit(ShortCircuitOp::And, name, left, right, allocator, max_row_count)
			}
			Expression::Or(e) => {
				let left = bind_boolean_child("OR", &e.left, input, allocator, max_row_count)?;
				let right = bind_boolean_child("OR", &e.right, input, allocator, max_row_count)?;
				bind_short_circuit(ShortCircuitOp::Or, name, left, right, allocator, max_row_count)
			}
			Expression::Xor(e) => {
				let left = bind_boolean_child("XOR", &e.left, input, allocator, max_row_count)?;
				let right = bind_boolean_child("XOR", &e.right, input, allocator, max_row_count)?;
				bind_xor(name, left, right, allocator, max_row_count)
			}
			Expression::Not(e) => {
				let argument = bind_boolean_child("NOT", &e.argument, input, allocator, max_row_count)?;
				bind_not(name, argument, allocator, max_row_count)
			}

			Expression::If(e) => {
				let condition = bind_boolean_child("IF", &e.condition, input, allocator, max_row_count)?;
				let then = bind_scalar_child("IF", &e.then, input, allocator, max_row_count)?;
				let otherwise = bind_scalar_child("IF", &e.otherwise, input, allocator, max_row_count)?;
				let common = common_comparable_type(
					"IF",
					then.result_schema().attribute(0).data_type(),
					otherwise.result_schema().attribute(0).data_type(),
				)?;
				let then = cast_to(then, common, allocator, max_row_count)?;
				let otherwise = cast_to(otherwise, common, allocator, max_row_count)?;
				bind_if(name, condition, then, otherwise, allocator, max_row_count)
			}
			Expression::IfNull(e) => {
				let argument = bind_scalar_child("IFNULL", &e.left, input, allocator, max_row_count)?;
				let substitute = bind_scalar_child("IFNULL", &e.right, input, allocator, max_row_count)?;
				let common = common_comparable_type(
					"IFNULL",
					argument.result_schema().attribute(0).data_type(),
					substitute.result_schema().attribute(0).data_type(),
				)?;
				let argument = cast_to(argument, common, allocator, max_row_count)?;
				let substitute = cast_to(substitute, common, allocator, max_row_count)?;
				bind_if_null(name, argument, substitute, allocator, max_row_count)
			}
			Expression::Case(e) => {
				if e.arguments.len() < 4 || e.arguments.len() % 2 != 0 {
					return Err(supersonic_core::Error(schema::arity_mismatch(
						"CASE",
						4,
						e.arguments.len(),
					)));
				}
				let mut bound: Vec<Box<dyn BoundExpression>> = Vec::with_capacity(e.arguments.len());
				for argument in &e.arguments {
					bound.push(bind_scalar_child(
						"CASE", argument, input, allocator, max_row_count,
					)?);
				}
				let mut match_type = bound[0].result_schema().attribute(0).data_type();
				for position in (2..bound.len()).step_by(2) {
					match_type = common_comparable_type(
						"CASE",
						match_type,
						bound[position].result_schema().attribute(0).data_type(),
					)?;
				}
				let mut result_type = bound[1].result_schema().attribute(0).data_type();
				for position in (3..bound.len()).step_by(2) {
					result_type = common_comparable_type(
						"CASE",
						result_type,
						bound[position].result_schema().attribute(0).data_type(),
					)?;
				}
				let mut arguments = BoundExpressionList::new();
				for (position, expression) in bound.into_iter().enumerate() {
					let target = if position == 0 || (position >= 2 && position % 2 == 0) {
						match_type
					} else {
						result_type
					};
					arguments.add(cast_to(expression, target, allocator, max_row_count)?);
				}
				bind_case(name, arguments, allocator, max_row_count)
			}

			Expression::Cast(e) => {
				let argument = bind_scalar_child("CAST", &e.argument, input, allocator, max_row_count)?;
				bind_cast(name, argument, e.to, allocator, max_row_count)
			}
			Expression::ParseString(e) => {
				let argument = bind_scalar_child(
					"PARSE_STRING", &e.argument, input, allocator, max_row_count,
				)?;
				bind_parse_string(e.policy, name, argument, e.to, allocator, max_row_count)
			}
			Expression::ToString(e) => {
				let argument = bind_scalar_child("TOSTRING", &e.argument, input, allocator, max_row_count)?;
				cast_to(argument, DataType::Utf8, allocator, max_row_count)
			}

			Expression::Concat(e) => {
				if e.arguments.is_empty() {
					return Err(supersonic_core::Error(schema::arity_mismatch(
						"CONCAT",
						1,
						0,
					)));
				}
				let mut arguments = BoundExpressionList::new();
				for argument in &e.arguments {
					let bound = bind_scalar_child(
						"CONCAT", argument, input, allocator, max_row_count,
					)?;
					arguments.add(cast_to(bound, DataType::Utf8, allocator, max_row_count)?);
				}
				bind_concat(name, arguments, allocator, max_row_count)
			}
			Expression::Length(e) => {
				let argument = bind_string_child("LENGTH", &e.argument, input, allocator, max_row_count)?;
				bind_length(name, argument, allocator, max_row_count)
			}
			Expression::Trim(e) => {
				let argument = bind_string_child("TRIM", &e.argument, input, allocator, max_row_count)?;
				bind_string_transform(
					StringTransform::Trim, name, argument, allocator, max_row_count,
				)
			}
			Expression::Ltrim(e) => {
				let argument = bind_string_child("LTRIM", &e.argument, input, allocator, max_row_count)?;
				bind_string_transform(
					StringTransform::Ltrim, name, argument, allocator, max_row_count,
				)
			}
			Expression::Rtrim(e) => {
				let argument = bind_string_child("RTRIM", &e.argument, input, allocator, max_row_count)?;
				bind_string_transform(
					StringTransform::Rtrim, name, argument, allocator, max_row_count,
				)
			}
			Expression::ToUpper(e) => {
				let argument = bind_string_child("TOUPPER", &e.argument, input, allocator, max_row_count)?;
				bind_string_transform(
					StringTransform::ToUpper, name, argument, allocator, max_row_count,
				)
			}
			Expression::ToLower(e) => {
				let argument = bind_string_child("TOLOWER", &e.argument, input, allocator, max_row_count)?;
				bind_string_transform(
					StringTransform::ToLower, name, argument, allocator, max_row_count,
				)
			}
			Expression::Substring(e) => {
				let argument = bind_string_child("SUBSTRING", &e.argument, input, allocator, max_row_count)?;
				let position = bind_scalar_child("SUBSTRING", &e.position, input, allocator, max_row_count)?;
				require_numeric("SUBSTRING", position.as_ref())?;
				let position = cast_to(position, DataType::Int64, allocator, max_row_count)?;
				let length = match &e.length {
					Some(length) => {
						let length = bind_scalar_child(
							"SUBSTRING", length, input, allocator, max_row_count,
						)?;
						require_numeric("SUBSTRING", length.as_ref())?;
						Some(cast_to(length, DataType::Int64, allocator, max_row_count)?)
					}
					None => None,
				};
				bind_substring(name, argument, position, length, allocator, max_row_count)
			}
			Expression::StringOffset(e) => {
				let haystack = bind_string_child("STRING_OFFSET", &e.left, input, allocator, max_row_count)?;
				let needle = bind_string_child("STRING_OFFSET", &e.right, input, allocator, max_row_count)?;
				bind_string_offset(name, haystack, needle, allocator, max_row_count)
			}
			Expression::StringReplace(e) => {
				let haystack = bind_string_child("STRING_REPLACE", &e.first, input, allocator, max_row_count)?;
				let needle = bind_string_child("STRING_REPLACE", &e.second, input, allocator, max_row_count)?;
				let substitute = bind_string_child("STRING_REPLACE", &e.third, input, allocator, max_row_count)?;
				bind_string_replace(name, haystack, needle, substitute, allocator, max_row_count)
			}

			Expression::RegexpPartialMatch(e) => {
				let argument = bind_string_child(
					"REGEXP_PARTIAL", &e.argument, input, allocator, max_row_count,
				)?;
				let regex = compile(&e.pattern)?;
				bind_regexp_match(name, regex, argument, allocator, max_row_count)
			}
			Expression::RegexpFullMatch(e) => {
				let argument = bind_string_child(
					"REGEXP_FULL", &e.argument, input, allocator, max_row_count,
				)?;
				let regex = compile_full(&e.pattern)?;
				bind_regexp_match(name, regex, argument, allocator, max_row_count)
			}
			Expression::RegexpExtract(e) => {
				let argument = bind_string_child(
					"REGEXP_EXTRACT", &e.argument, input, allocator, max_row_count,
				)?;
				let regex = compile(&e.pattern)?;
				bind_regexp_extract(name, regex, argument, allocator, max_row_count)
			}
			Expression::RegexpReplace(e) => {
				let haystack = bind_string_child(
					"REGEXP_REPLACE", &e.haystack, input, allocator, max_row_count,
				)?;
				let substitute = bind_scalar_child(
					"REGEXP_REPLACE", &e.substitute, input, allocator, max_row_count,
				)?;
				let substitute = cast_to(substitute, DataType::Utf8, allocator, max_row_count)?;
				let regex = compile(&e.pattern)?;
				bind_regexp_replace(name, regex, haystack, substitute, allocator, max_row_count)
			}
			Expression::RegexpRewrite(_) => {
				Err(supersonic_core::Error(schema::not_implemented("REGEXP_REWRITE")))
			}

			Expression::InputAttributeProjection(e) => {
				bind_input_attribute_projection(input, &e.projector)
			}
			Expression::Projection(e) => {
				self.bind_projection_like(&e.arguments, &e.projector, input, allocator, max_row_count)
			}
			Expression::Compound(e) => {
				let arguments: Vec<Expression> =
					e.entries.iter().map(|entry| entry.argument.clone()).collect();
				let mut projector = MultiSourceProjector::new();
				for (position, entry) in e.entries.iter().enumerate() {
					let single = match &entry.aliases {
						Some(aliases) => {
							project_rename(aliases.clone(), project_all_attributes())
						}
						None => project_all_attributes(),
					};
					projector = projector.add(position, single);
				}
				self.bind_projection_like(&arguments, &projector, input, allocator, max_row_count)
			}
			Expression::Tuple(e) => {
				if e.arguments.is_empty() {
					return Err(supersonic_core::Error(schema::arity_mismatch("TUPLE", 1, 0)));
				}
				let mut projector = MultiSourceProjector::new();
				for position in 0..e.arguments.len() {
					projector = projector.add(position, project_all_attributes());
				}
				self.bind_projection_like(&e.arguments, &projector, input, allocator, max_row_count)
			}
			Expression::Path(_) => {
				Err(supersonic_core::Error(schema::not_implemented("PATH expressions")))
			}

			Expression::Call(e) => {
				let mut arguments = Vec::with_capacity(e.arguments.len());
				for argument in &e.arguments {
					arguments.push(bind_scalar_child(
						&e.function, argument, input, allocator, max_row_count,
					)?);
				}
				Functions::default().bind_scalar(
					&e.function, name, arguments, allocator, max_row_count,
				)
			}
		}
	}

	#[allow(clippy::too_many_arguments)]
	fn bind_comparison_op(
		&self,
		op: ComparisonOp,
		name: String,
		left: &Expression,
		right: &Expression,
		input: &Schema,
		allocator: &Arc<dyn BufferAllocator>,
		max_row_count: usize,
	) -> crate::Result<Box<dyn BoundExpression>> {
		let operation = "comparison";
		let left = bind_scalar_child(operation, left, input, allocator, max_row_count)?;
		let right = bind_scalar_child(operation, right, input, allocator, max_row_count)?;
		let common = common_comparable_type(
			operation,
			left.result_schema().attribute(0).data_type(),
			right.result_schema().attribute(0).data_type(),
		)?;
		let left = cast_to(left, common, allocator, max_row_count)?;
		let right = cast_to(right, common, allocator, max_row_count)?;
		bind_comparison(op, name, left, right, allocator, max_row_count)
	}

	#[allow(clippy::too_many_arguments)]
	fn bind_numeric_pair(
		&self,
		operation: &str,
		left: &Expression,
		right: &Expression,
		input: &Schema,
		allocator: &Arc<dyn BufferAllocator>,
		max_row_count: usize,
	) -> crate::Result<(Box<dyn BoundExpression>, Box<dyn BoundExpression>)> {
		let left = bind_scalar_child(operation, left, input, allocator, max_row_count)?;
		let right = bind_scalar_child(operation, right, input, allocator, max_row_count)?;
		let common = common_numeric_type(
			operation,
			left.result_schema().attribute(0).data_type(),
			right.result_schema().attribute(0).data_type(),
		)?;
		let left = cast_to(left, common, allocator, max_row_count)?;
		let right = cast_to(right, common, allocator, max_row_count)?;
		Ok((left, right))
	}

	fn bind_projection_like(
		&self,
		arguments: &[Expression],
		projector: &MultiSourceProjector,
		input: &Schema,
		allocator: &Arc<dyn BufferAllocator>,
		max_row_count: usize,
	) -> crate::Result<Box<dyn BoundExpression>> {
		let mut bound = BoundExpressionList::new();
		let mut schemata = Vec::with_capacity(arguments.len());
		for argument in arguments {
			let expression = argument.do_bind(input, allocator, max_row_count)?;
			schemata.push(expression.result_schema().clone());
			bound.add(expression);
		}
		let projector = projector.bind(&schemata)?;
		bind_projection(bound, projector, max_row_count)
	}
}

fn bind_scalar_child(
	operation: &str,
	child: &Expression,
	input: &Schema,
	allocator: &Arc<dyn BufferAllocator>,
	max_row_count: usize,
) -> crate::Result<Box<dyn BoundExpression>> {
	let bound = child.do_bind(input, allocator, max_row_count)?;
	check_attribute_count(operation, bound.result_schema(), 1)?;
	Ok(bound)
}

fn bind_boolean_child(
	operation: &str,
	child: &Expression,
	input: &Schema,
	allocator: &Arc<dyn BufferAllocator>,
	max_row_count: usize,
) -> crate::Result<Box<dyn BoundExpression>> {
	let bound = bind_scalar_child(operation, child, input, allocator, max_row_count)?;
	let data_type = bound.result_schema().attribute(0).data_type();
	if data_type != DataType::Bool {
		return Err(supersonic_core::Error(schema::type_mismatch(
			operation,
			"a boolean argument",
			data_type,
		)));
	}
	Ok(bound)
}

fn bind_string_child(
	operation: &str,
	child: &Expression,
	input: &Schema,
	allocator: &Arc<dyn BufferAllocator>,
	max_row_count: usize,
) -> crate::Result<Box<dyn BoundExpression>> {
	let bound = bind_scalar_child(operation, child, input, allocator, max_row_count)?;
	let data_type = bound.result_schema().attribute(0).data_type();
	if data_type != DataType::Utf8 {
		return Err(supersonic_core::Error(schema::type_mismatch(
			operation,
			"a string argument",
			data_type,
		)));
	}
	Ok(bound)
}

fn require_numeric(operation: &str, expression: &dyn BoundExpression) -> crate::Result<()> {
	let data_type = expression.result_schema().attribute(0).data_type();
	if !data_type.is_numeric() {
		return Err(supersonic_core::Error(schema::unsupported_type(operation, data_type)));
	}
	Ok(())
}
