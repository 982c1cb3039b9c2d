// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::sync::Arc;

use supersonic_core::{
	Attribute, ColumnData, DataType, Schema, Value, View,
	memory::{BufferAllocator, HeapBufferAllocator, MemoryLimit},
};
use supersonic_engine::expression::{
	Expression, and, attribute_at, alias, case, cast, concat, constant, divide_nulling,
	divide_quiet, divide_signaling, greater, if_null, if_then_else, is_null, length, less,
	ltrim, minus, modulo_nulling, multiply, named_attribute, not, null, or, parse_string_nulling,
	parse_string_signaling, plus, power_quiet, regexp_extract, regexp_full_match,
	regexp_partial_match, regexp_replace, regexp_rewrite, rtrim, sqrt_nulling, sqrt_quiet,
	sqrt_signaling, string_offset, string_replace, substring, to_lower, to_upper,
	trailing_substring, trim,
};

fn allocator() -> Arc<dyn BufferAllocator> {
	Arc::new(HeapBufferAllocator::new())
}

/// A zero-attribute input with the given number of rows, for constant
/// expressions.
fn unit_input(rows: usize) -> View {
	View::new(Schema::empty(), Vec::new(), rows)
}

fn evaluate(expression: &Expression, input: &View) -> supersonic_core::Result<View> {
	let mut tree = expression.bind(input.schema(), &allocator(), 1024)?;
	tree.evaluate(input)
}

fn values(expression: &Expression, input: &View) -> Vec<Value> {
	let output = evaluate(expression, input).unwrap();
	(0..output.row_count()).map(|i| output.column(0).get_value(i)).collect()
}

fn bind_error(expression: &Expression, input: &View) -> String {
	expression.bind(input.schema(), &allocator(), 1024).unwrap_err().code().to_string()
}

fn strings_input() -> View {
	let schema = Schema::new(vec![
		Attribute::nullable("s", DataType::Utf8),
		Attribute::nullable("t", DataType::Utf8),
	])
	.unwrap();
	View::new(
		schema,
		vec![
			ColumnData::from_options(
				DataType::Utf8,
				[
					Some(Value::Utf8("  Hello World  ".into())),
					Some(Value::Utf8("abc".into())),
					None,
					Some(Value::Utf8("".into())),
				],
			),
			ColumnData::utf8(["foo", "bar", "baz", "qux"]),
		],
		4,
	)
}

fn numbers_input() -> View {
	let schema = Schema::new(vec![
		Attribute::nullable("a", DataType::Int64),
		Attribute::nullable("b", DataType::Int64),
	])
	.unwrap();
	View::new(
		schema,
		vec![
			ColumnData::from_options(
				DataType::Int64,
				[Some(Value::Int64(10)), None, Some(Value::Int64(-4)), Some(Value::Int64(7))],
			),
			ColumnData::int64([3, 5, 2, 0]),
		],
		4,
	)
}

#[test]
fn test_arithmetic_null_propagation() {
	let out = values(&plus(named_attribute("a"), named_attribute("b")), &numbers_input());
	assert_eq!(
		out,
		vec![Value::Int64(13), Value::Undefined, Value::Int64(-2), Value::Int64(7)]
	);
}

#[test]
fn test_divide_policies() {
	let input = unit_input(1);
	let ten = constant(Value::Int64(10));
	let zero = constant(Value::Int64(0));

	assert_eq!(values(&divide_nulling(ten.clone(), zero.clone()), &input), vec![Value::Undefined]);

	let err = evaluate(&divide_signaling(ten.clone(), zero), &input).unwrap_err();
	assert_eq!(err.code(), "EVAL_001");

	let out = values(
		&divide_quiet(constant(Value::Double(10.0)), constant(Value::Double(0.0))),
		&input,
	);
	assert_eq!(out, vec![Value::Double(f64::INFINITY)]);
}

#[test]
fn test_sqrt_policies() {
	let input = unit_input(1);
	let minus_four = constant(Value::Double(-4.0));

	assert_eq!(values(&sqrt_nulling(minus_four.clone()), &input), vec![Value::Undefined]);
	assert_eq!(
		evaluate(&sqrt_signaling(minus_four.clone()), &input).unwrap_err().code(),
		"EVAL_003"
	);
	match &values(&sqrt_quiet(minus_four), &input)[0] {
		Value::Double(v) => assert!(v.is_nan()),
		other => panic!("expected a double, got {other:?}"),
	}
}

#[test]
fn test_power_quiet_edge_cases() {
	let input = unit_input(1);
	let out = values(
		&power_quiet(constant(Value::Double(0.0)), constant(Value::Double(-1.0))),
		&input,
	);
	assert_eq!(out, vec![Value::Double(f64::INFINITY)]);
}

#[test]
fn test_modulo_nulling_by_zero() {
	let out = values(&modulo_nulling(named_attribute("a"), named_attribute("b")), &numbers_input());
	// 10 % 3, null % 5, -4 % 2, 7 % 0 -> null
	assert_eq!(
		out,
		vec![Value::Int64(1), Value::Undefined, Value::Int64(0), Value::Undefined]
	);
}

#[test]
fn test_integer_promotion() {
	let input = unit_input(1);
	let out = evaluate(
		&plus(constant(Value::Int32(1)), constant(Value::Int64(2))),
		&input,
	)
	.unwrap();
	assert_eq!(out.schema().attribute(0).data_type(), DataType::Int64);

	let out = evaluate(
		&multiply(constant(Value::Int32(2)), constant(Value::Double(1.5))),
		&input,
	)
	.unwrap();
	assert_eq!(out.schema().attribute(0).data_type(), DataType::Double);
	assert_eq!(out.column(0).get_value(0), Value::Double(3.0));
}

#[test]
fn test_uint64_with_signed_has_no_common_type() {
	let code = bind_error(
		&plus(constant(Value::Uint64(1)), constant(Value::Int32(1))),
		&unit_input(1),
	);
	assert_eq!(code, "SCHEMA_407");
}

#[test]
fn test_unknown_attribute_is_a_schema_error() {
	assert_eq!(bind_error(&named_attribute("missing"), &numbers_input()), "SCHEMA_401");
}

#[test]
fn test_binding_is_pure() {
	let expression = plus(named_attribute("a"), named_attribute("b"));
	let input = numbers_input();
	let first = expression.bind(input.schema(), &allocator(), 1024).unwrap();
	let second = expression.bind(input.schema(), &allocator(), 1024).unwrap();
	assert_eq!(first.result_schema(), second.result_schema());
	assert_eq!(first.row_capacity(), second.row_capacity());
	assert_eq!(
		first.referred_attribute_names(),
		second.referred_attribute_names()
	);
}

#[test]
fn test_referred_attribute_names() {
	let expression = plus(named_attribute("a"), multiply(named_attribute("b"), named_attribute("a")));
	let tree = expression.bind(numbers_input().schema(), &allocator(), 16).unwrap();
	let names: Vec<String> = tree.referred_attribute_names().into_iter().collect();
	assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn test_concat_propagates_null() {
	let input = unit_input(1);
	let out = values(
		&concat(vec![
			constant(Value::Utf8("foo".into())),
			null(DataType::Utf8),
			constant(Value::Utf8("bar".into())),
		]),
		&input,
	);
	assert_eq!(out, vec![Value::Undefined]);

	let out = values(
		&concat(vec![
			constant(Value::Utf8("foo".into())),
			constant(Value::Utf8("bar".into())),
		]),
		&input,
	);
	assert_eq!(out, vec![Value::Utf8("foobar".into())]);

	let out = values(
		&length(concat(vec![
			constant(Value::Utf8("foo".into())),
			constant(Value::Utf8("bar".into())),
		])),
		&input,
	);
	assert_eq!(out, vec![Value::Uint32(6)]);
}

#[test]
fn test_length_of_concat_adds_up() {
	let input = strings_input();
	let combined = values(
		&length(concat(vec![named_attribute("s"), named_attribute("t")])),
		&input,
	);
	let left = values(&length(named_attribute("s")), &input);
	let right = values(&length(named_attribute("t")), &input);
	for i in 0..input.row_count() {
		match (&combined[i], &left[i], &right[i]) {
			(Value::Uint32(c), Value::Uint32(l), Value::Uint32(r)) => assert_eq!(*c, l + r),
			(Value::Undefined, Value::Undefined, _) => {}
			other => panic!("unexpected row {other:?}"),
		}
	}
}

#[test]
fn test_case_mapping_round_trip() {
	let input = strings_input();
	let twice = values(
		&to_lower(to_upper(to_lower(named_attribute("s")))),
		&input,
	);
	let once = values(&to_lower(named_attribute("s")), &input);
	assert_eq!(twice, once);
}

#[test]
fn test_trim_round_trip() {
	let input = strings_input();
	let nested = values(&trim(ltrim(rtrim(named_attribute("s")))), &input);
	let single = values(&trim(named_attribute("s")), &input);
	assert_eq!(nested, single);
	assert_eq!(single[0], Value::Utf8("Hello World".into()));
}

#[test]
fn test_substring_positions() {
	let input = unit_input(1);
	let hello = constant(Value::Utf8("hello".into()));

	let out = values(
		&substring(hello.clone(), constant(Value::Int64(2)), constant(Value::Int64(3))),
		&input,
	);
	assert_eq!(out, vec![Value::Utf8("ell".into())]);

	// Negative positions count from the end.
	let out = values(
		&trailing_substring(hello.clone(), constant(Value::Int64(-3))),
		&input,
	);
	assert_eq!(out, vec![Value::Utf8("llo".into())]);

	// Position zero yields nothing.
	let out = values(&trailing_substring(hello, constant(Value::Int64(0))), &input);
	assert_eq!(out, vec![Value::Utf8("".into())]);
}

#[test]
fn test_string_offset_and_replace() {
	let input = unit_input(1);
	let out = values(
		&string_offset(constant(Value::Utf8("hayneedlehay".into())), constant(Value::Utf8("needle".into()))),
		&input,
	);
	assert_eq!(out, vec![Value::Uint32(4)]);

	let out = values(
		&string_offset(constant(Value::Utf8("hay".into())), constant(Value::Utf8("needle".into()))),
		&input,
	);
	assert_eq!(out, vec![Value::Uint32(0)]);

	let out = values(
		&string_replace(
			constant(Value::Utf8("a-b-c".into())),
			constant(Value::Utf8("-".into())),
			constant(Value::Utf8("+".into())),
		),
		&input,
	);
	assert_eq!(out, vec![Value::Utf8("a+b+c".into())]);
}

#[test]
fn test_three_valued_and() {
	let schema = Schema::new(vec![
		Attribute::nullable("l", DataType::Bool),
		Attribute::nullable("r", DataType::Bool),
	])
	.unwrap();
	let combos = [
		(Some(true), Some(true), Some(true)),
		(Some(true), Some(false), Some(false)),
		(Some(false), Some(true), Some(false)),
		(Some(false), Some(false), Some(false)),
		(None, Some(false), Some(false)),
		(None, Some(true), None),
		(Some(false), None, Some(false)),
		(Some(true), None, None),
		(None, None, None),
	];
	let input = View::new(
		schema,
		vec![
			ColumnData::from_options(DataType::Bool, combos.iter().map(|c| c.0.map(Value::Bool))),
			ColumnData::from_options(DataType::Bool, combos.iter().map(|c| c.1.map(Value::Bool))),
		],
		combos.len(),
	);
	let out = values(&and(named_attribute("l"), named_attribute("r")), &input);
	for (i, combo) in combos.iter().enumerate() {
		let expected = match combo.2 {
			Some(v) => Value::Bool(v),
			None => Value::Undefined,
		};
		assert_eq!(out[i], expected, "combination {combo:?}");
	}
}

#[test]
fn test_three_valued_or() {
	let schema = Schema::new(vec![Attribute::nullable("l", DataType::Bool)]).unwrap();
	let input = View::new(
		schema,
		vec![ColumnData::from_options(DataType::Bool, [None, None])],
		2,
	);
	// NULL OR true = true, NULL OR false = NULL.
	let out = values(&or(named_attribute("l"), constant(Value::Bool(true))), &input);
	assert_eq!(out[0], Value::Bool(true));
	let out = values(&or(named_attribute("l"), constant(Value::Bool(false))), &input);
	assert_eq!(out[0], Value::Undefined);
}

#[test]
fn test_not_propagates_null() {
	let schema = Schema::new(vec![Attribute::nullable("l", DataType::Bool)]).unwrap();
	let input = View::new(
		schema,
		vec![ColumnData::from_options(
			DataType::Bool,
			[Some(Value::Bool(true)), None],
		)],
		2,
	);
	let out = values(&not(named_attribute("l")), &input);
	assert_eq!(out, vec![Value::Bool(false), Value::Undefined]);
}

#[test]
fn test_comparison_with_nulls() {
	let out = values(&less(named_attribute("a"), named_attribute("b")), &numbers_input());
	assert_eq!(
		out,
		vec![
			Value::Bool(false),
			Value::Undefined,
			Value::Bool(true),
			Value::Bool(false)
		]
	);
}

#[test]
fn test_is_null_reads_bitmap_directly() {
	let out = values(&is_null(named_attribute("a")), &numbers_input());
	assert_eq!(
		out,
		vec![
			Value::Bool(false),
			Value::Bool(true),
			Value::Bool(false),
			Value::Bool(false)
		]
	);
}

#[test]
fn test_is_null_of_nulling_kernel() {
	let input = unit_input(1);
	let out = values(
		&is_null(divide_nulling(constant(Value::Int64(1)), constant(Value::Int64(0)))),
		&input,
	);
	assert_eq!(out, vec![Value::Bool(true)]);
}

#[test]
fn test_if_selects_branches() {
	let out = values(
		&if_then_else(
			greater(named_attribute("a"), constant(Value::Int64(0))),
			constant(Value::Utf8("positive".into())),
			constant(Value::Utf8("non-positive".into())),
		),
		&numbers_input(),
	);
	assert_eq!(
		out,
		vec![
			Value::Utf8("positive".into()),
			// NULL condition selects neither branch.
			Value::Undefined,
			Value::Utf8("non-positive".into()),
			Value::Utf8("positive".into()),
		]
	);
}

#[test]
fn test_if_null_substitutes() {
	let out = values(
		&if_null(named_attribute("a"), constant(Value::Int64(-1))),
		&numbers_input(),
	);
	assert_eq!(
		out,
		vec![Value::Int64(10), Value::Int64(-1), Value::Int64(-4), Value::Int64(7)]
	);
	// The substitute is not nullable, so neither is the output.
	let tree = if_null(named_attribute("a"), constant(Value::Int64(-1)))
		.bind(numbers_input().schema(), &allocator(), 16)
		.unwrap();
	assert!(!tree.result_schema().attribute(0).is_nullable());
}

#[test]
fn test_case_picks_leftmost_match() {
	let out = values(
		&case(vec![
			named_attribute("b"),
			constant(Value::Utf8("other".into())),
			constant(Value::Int64(3)),
			constant(Value::Utf8("three".into())),
			constant(Value::Int64(5)),
			constant(Value::Utf8("five".into())),
			constant(Value::Int64(3)),
			constant(Value::Utf8("shadowed".into())),
		]),
		&numbers_input(),
	);
	assert_eq!(
		out,
		vec![
			Value::Utf8("three".into()),
			Value::Utf8("five".into()),
			Value::Utf8("other".into()),
			Value::Utf8("other".into()),
		]
	);
}

#[test]
fn test_cast_int_to_string() {
	let out = values(&cast(named_attribute("a"), DataType::Utf8), &numbers_input());
	assert_eq!(
		out,
		vec![
			Value::Utf8("10".into()),
			Value::Undefined,
			Value::Utf8("-4".into()),
			Value::Utf8("7".into())
		]
	);
}

#[test]
fn test_unsupported_cast_is_a_schema_error() {
	let code = bind_error(&cast(named_attribute("s"), DataType::Int32), &strings_input());
	assert_eq!(code, "SCHEMA_406");
}

#[test]
fn test_parse_string_is_strict() {
	let schema = Schema::new(vec![Attribute::nullable("raw", DataType::Utf8)]).unwrap();
	let input = View::new(
		schema,
		vec![ColumnData::utf8(["42", " 42", "42x", "-7"])],
		4,
	);
	let out = values(&parse_string_nulling(named_attribute("raw"), DataType::Int64), &input);
	assert_eq!(
		out,
		vec![Value::Int64(42), Value::Undefined, Value::Undefined, Value::Int64(-7)]
	);

	let err = evaluate(&parse_string_signaling(named_attribute("raw"), DataType::Int64), &input)
		.unwrap_err();
	assert_eq!(err.code(), "EVAL_005");
}

#[test]
fn test_regexp_matching() {
	let schema = Schema::new(vec![Attribute::nullable("s", DataType::Utf8)]).unwrap();
	let input = View::new(
		schema,
		vec![ColumnData::from_options(
			DataType::Utf8,
			[
				Some(Value::Utf8("supersonic".into())),
				Some(Value::Utf8("sonic".into())),
				None,
			],
		)],
		3,
	);

	let out = values(&regexp_partial_match(named_attribute("s"), "son"), &input);
	assert_eq!(out, vec![Value::Bool(true), Value::Bool(true), Value::Undefined]);

	let out = values(&regexp_full_match(named_attribute("s"), "son.*"), &input);
	assert_eq!(out, vec![Value::Bool(false), Value::Bool(true), Value::Undefined]);
}

#[test]
fn test_regexp_extract_and_replace() {
	let input = unit_input(1);
	let out = values(
		&regexp_extract(constant(Value::Utf8("order-1234-x".into())), r"(\d+)"),
		&input,
	);
	assert_eq!(out, vec![Value::Utf8("1234".into())]);

	// No match is NULL.
	let out = values(
		&regexp_extract(constant(Value::Utf8("no digits".into())), r"\d+"),
		&input,
	);
	assert_eq!(out, vec![Value::Undefined]);

	let out = values(
		&regexp_replace(
			constant(Value::Utf8("a1b22c".into())),
			r"\d+",
			constant(Value::Utf8("#".into())),
		),
		&input,
	);
	assert_eq!(out, vec![Value::Utf8("a#b#c".into())]);
}

#[test]
fn test_regexp_bind_errors() {
	let input = unit_input(1);
	assert_eq!(
		bind_error(&regexp_partial_match(constant(Value::Utf8("x".into())), "("), &input),
		"SCHEMA_441"
	);
	assert_eq!(
		bind_error(&regexp_rewrite(constant(Value::Utf8("x".into())), "a"), &input),
		"SCHEMA_499"
	);
}

#[test]
fn test_alias_renames_output() {
	let tree = alias("total", plus(named_attribute("a"), named_attribute("b")))
		.bind(numbers_input().schema(), &allocator(), 16)
		.unwrap();
	assert_eq!(tree.result_schema().attribute(0).name(), "total");
}

#[test]
fn test_compound_and_projection_by_position() {
	let expression = supersonic_engine::expression::CompoundExpression::new()
		.add(attribute_at(0))
		.add_as("difference", minus(named_attribute("a"), named_attribute("b")))
		.build();
	let input = numbers_input();
	let mut tree = expression.bind(input.schema(), &allocator(), 16).unwrap();
	let out = tree.evaluate(&input).unwrap();
	assert_eq!(out.schema().attribute_count(), 2);
	assert_eq!(out.schema().attribute(0).name(), "a");
	assert_eq!(out.schema().attribute(1).name(), "difference");
	assert_eq!(out.row(0), vec![Value::Int64(10), Value::Int64(7)]);
	assert_eq!(out.row(1), vec![Value::Undefined, Value::Undefined]);
}

#[test]
fn test_evaluation_reuses_buffers_across_calls() {
	let input = numbers_input();
	let mut tree = plus(named_attribute("a"), named_attribute("b"))
		.bind(input.schema(), &allocator(), 16)
		.unwrap();
	let first: Vec<Value> = {
		let out = tree.evaluate(&input).unwrap();
		(0..out.row_count()).map(|i| out.column(0).get_value(i)).collect()
	};
	let second: Vec<Value> = {
		let out = tree.evaluate(&input).unwrap();
		(0..out.row_count()).map(|i| out.column(0).get_value(i)).collect()
	};
	assert_eq!(first, second);
}

#[test]
fn test_bind_respects_memory_quota() {
	let tight: Arc<dyn BufferAllocator> =
		Arc::new(MemoryLimit::new(8, Arc::new(HeapBufferAllocator::new())));
	let err = plus(named_attribute("a"), named_attribute("b"))
		.bind(numbers_input().schema(), &tight, 1 << 20)
		.unwrap_err();
	assert_eq!(err.code(), "MEMORY_001");
}

#[test]
fn test_row_capacity_is_enforced() {
	let input = numbers_input();
	let mut tree = plus(named_attribute("a"), named_attribute("b"))
		.bind(input.schema(), &allocator(), 2)
		.unwrap();
	assert!(tree.row_capacity() >= 2);
	let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
		let _ = tree.evaluate(&input);
	}));
	assert!(result.is_err());
}
