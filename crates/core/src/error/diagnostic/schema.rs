// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Bind-time schema diagnostics. These occupy the 400 code band: every
//! error a `bind` call can produce without evaluating a single row.

use super::Diagnostic;
use crate::value::DataType;

pub fn unknown_attribute(name: &str, known: impl IntoIterator<Item = impl AsRef<str>>) -> Diagnostic {
	let known = known.into_iter().map(|n| n.as_ref().to_string()).collect::<Vec<_>>().join(", ");
	Diagnostic::new("SCHEMA_401", format!("unknown attribute `{name}`"))
		.with_help(format!("input schema attributes: {known}"))
}

pub fn type_mismatch(operation: &str, expected: &str, actual: DataType) -> Diagnostic {
	Diagnostic::new(
		"SCHEMA_402",
		format!("type mismatch in {operation}: expected {expected}, got {actual}"),
	)
}

pub fn arity_mismatch(operation: &str, expected: usize, actual: usize) -> Diagnostic {
	Diagnostic::new(
		"SCHEMA_403",
		format!("{operation} takes {expected} argument(s), got {actual}"),
	)
}

pub fn unsupported_type(operation: &str, data_type: DataType) -> Diagnostic {
	Diagnostic::new("SCHEMA_404", format!("{operation} does not support {data_type} operands"))
}

pub fn duplicate_attribute(name: &str) -> Diagnostic {
	Diagnostic::new("SCHEMA_405", format!("duplicate attribute name `{name}` in schema"))
}

pub fn unsupported_cast(from: DataType, to: DataType) -> Diagnostic {
	Diagnostic::new("SCHEMA_406", format!("cannot cast {from} to {to}"))
}

pub fn no_common_type(operation: &str, left: DataType, right: DataType) -> Diagnostic {
	Diagnostic::new(
		"SCHEMA_407",
		format!("no common type for {operation} over {left} and {right}"),
	)
	.with_help("uint64 does not combine with signed integers; cast one side explicitly".to_string())
}

pub fn attribute_count_mismatch(operation: &str, expected: usize, actual: usize) -> Diagnostic {
	Diagnostic::new(
		"SCHEMA_408",
		format!("{operation} expects an argument with {expected} attribute(s), got {actual}"),
	)
}

pub fn unknown_function(name: &str) -> Diagnostic {
	Diagnostic::new("SCHEMA_409", format!("unknown function `{name}`"))
}

pub fn position_out_of_range(position: usize, attribute_count: usize) -> Diagnostic {
	Diagnostic::new(
		"SCHEMA_410",
		format!("attribute position {position} out of range for a schema of {attribute_count}"),
	)
}

pub fn invalid_regular_expression(pattern: &str, detail: &str) -> Diagnostic {
	Diagnostic::new("SCHEMA_441", format!("invalid regular expression `{pattern}`: {detail}"))
}

pub fn not_implemented(what: &str) -> Diagnostic {
	Diagnostic::new("SCHEMA_499", format!("{what} is not implemented"))
}
