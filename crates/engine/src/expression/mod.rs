// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! The symbolic expression tree: operation kinds and children, no types
//! resolved yet. Trees are built programmatically through the
//! constructor functions below and turned into executable kernels by
//! [`Expression::bind`].

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use supersonic_core::{DataType, Value};

use crate::projector::{MultiSourceProjector, SingleSourceProjector};

mod bind;

/// What a kernel does when its scalar function fails on a row: raise an
/// evaluation error, turn the row NULL, or produce the IEEE result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailurePolicy {
	Signaling,
	Nulling,
	Quiet,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConstantExpression {
	pub data_type: DataType,
	/// `Value::Undefined` encodes the typed NULL constant.
	pub value: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NamedAttributeExpression {
	pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttributeAtExpression {
	pub position: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnaryExpression {
	pub argument: Box<Expression>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BinaryExpression {
	pub left: Box<Expression>,
	pub right: Box<Expression>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolicyUnaryExpression {
	pub policy: FailurePolicy,
	pub argument: Box<Expression>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolicyBinaryExpression {
	pub policy: FailurePolicy,
	pub left: Box<Expression>,
	pub right: Box<Expression>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IfExpression {
	pub condition: Box<Expression>,
	pub then: Box<Expression>,
	pub otherwise: Box<Expression>,
}

/// Arguments in the order `case_value, else_value, when₁, then₁, …`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CaseExpression {
	pub arguments: Vec<Expression>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CastExpression {
	pub argument: Box<Expression>,
	pub to: DataType,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParseStringExpression {
	pub policy: FailurePolicy,
	pub argument: Box<Expression>,
	pub to: DataType,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ListExpression {
	pub arguments: Vec<Expression>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubstringExpression {
	pub argument: Box<Expression>,
	pub position: Box<Expression>,
	/// Absent for the trailing form, which runs to the end of the
	/// string.
	pub length: Option<Box<Expression>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TernaryExpression {
	pub first: Box<Expression>,
	pub second: Box<Expression>,
	pub third: Box<Expression>,
}

/// The pattern is a compile-time constant: it is compiled once at bind
/// time, and a malformed pattern fails the bind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegexpExpression {
	pub argument: Box<Expression>,
	pub pattern: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegexpReplaceExpression {
	pub haystack: Box<Expression>,
	pub pattern: String,
	pub substitute: Box<Expression>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InputAttributeProjectionExpression {
	pub projector: SingleSourceProjector,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectionExpression {
	pub arguments: Vec<Expression>,
	pub projector: MultiSourceProjector,
}

/// Append-style projection builder: each added argument contributes its
/// output attributes, optionally renamed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CompoundExpression {
	pub entries: Vec<CompoundEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompoundEntry {
	pub argument: Expression,
	/// `None` keeps the argument's own attribute names.
	pub aliases: Option<Vec<String>>,
}

impl CompoundExpression {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add(mut self, argument: Expression) -> Self {
		self.entries.push(CompoundEntry {
			argument,
			aliases: None,
		});
		self
	}

	pub fn add_as(self, alias: impl Into<String>, argument: Expression) -> Self {
		self.add_as_multi(vec![alias.into()], argument)
	}

	pub fn add_as_multi(mut self, aliases: Vec<String>, argument: Expression) -> Self {
		self.entries.push(CompoundEntry {
			argument,
			aliases: Some(aliases),
		});
		self
	}

	pub fn build(self) -> Expression {
		Expression::Compound(self)
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathExpression {
	pub segments: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CallExpression {
	pub function: String,
	pub arguments: Vec<Expression>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Expression {
	Constant(ConstantExpression),
	NamedAttribute(NamedAttributeExpression),
	AttributeAt(AttributeAtExpression),

	Plus(BinaryExpression),
	Minus(BinaryExpression),
	Multiply(BinaryExpression),
	Negate(UnaryExpression),
	Abs(UnaryExpression),
	Divide(PolicyBinaryExpression),
	Modulo(PolicyBinaryExpression),
	Power(PolicyBinaryExpression),
	Sqrt(PolicyUnaryExpression),

	Equal(BinaryExpression),
	NotEqual(BinaryExpression),
	Less(BinaryExpression),
	LessOrEqual(BinaryExpression),
	Greater(BinaryExpression),
	GreaterOrEqual(BinaryExpression),
	IsNull(UnaryExpression),

	And(BinaryExpression),
	Or(BinaryExpression),
	Xor(BinaryExpression),
	Not(UnaryExpression),

	If(IfExpression),
	IfNull(BinaryExpression),
	Case(CaseExpression),

	Cast(CastExpression),
	ParseString(ParseStringExpression),
	ToString(UnaryExpression),

	Concat(ListExpression),
	Length(UnaryExpression),
	Trim(UnaryExpression),
	Ltrim(UnaryExpression),
	Rtrim(UnaryExpression),
	ToUpper(UnaryExpression),
	ToLower(UnaryExpression),
	Substring(SubstringExpression),
	StringOffset(BinaryExpression),
	StringReplace(TernaryExpression),

	RegexpPartialMatch(RegexpExpression),
	RegexpFullMatch(RegexpExpression),
	RegexpExtract(RegexpExpression),
	RegexpReplace(RegexpReplaceExpression),
	/// Reserved; binding it reports not-implemented.
	RegexpRewrite(RegexpExpression),

	InputAttributeProjection(InputAttributeProjectionExpression),
	Projection(ProjectionExpression),
	Compound(CompoundExpression),
	Tuple(ListExpression),
	/// Reserved for nested-column access; binding it reports
	/// not-implemented.
	Path(PathExpression),

	Call(CallExpression),
}

fn unary(argument: Expression) -> UnaryExpression {
	UnaryExpression {
		argument: Box::new(argument),
	}
}

fn binary(left: Expression, right: Expression) -> BinaryExpression {
	BinaryExpression {
		left: Box::new(left),
		right: Box::new(right),
	}
}

fn policy_binary(policy: FailurePolicy, left: Expression, right: Expression) -> PolicyBinaryExpression {
	PolicyBinaryExpression {
		policy,
		left: Box::new(left),
		right: Box::new(right),
	}
}

pub fn constant(value: Value) -> Expression {
	let data_type = value.data_type().unwrap_or(DataType::Int32);
	Expression::Constant(ConstantExpression {
		data_type,
		value,
	})
}

/// The typed NULL literal.
pub fn null(data_type: DataType) -> Expression {
	Expression::Constant(ConstantExpression {
		data_type,
		value: Value::Undefined,
	})
}

pub fn named_attribute(name: impl Into<String>) -> Expression {
	Expression::NamedAttribute(NamedAttributeExpression {
		name: name.into(),
	})
}

pub fn attribute_at(position: usize) -> Expression {
	Expression::AttributeAt(AttributeAtExpression {
		position,
	})
}

pub fn plus(left: Expression, right: Expression) -> Expression {
	Expression::Plus(binary(left, right))
}

pub fn minus(left: Expression, right: Expression) -> Expression {
	Expression::Minus(binary(left, right))
}

pub fn multiply(left: Expression, right: Expression) -> Expression {
	Expression::Multiply(binary(left, right))
}

pub fn negate(argument: Expression) -> Expression {
	Expression::Negate(unary(argument))
}

pub fn abs(argument: Expression) -> Expression {
	Expression::Abs(unary(argument))
}

pub fn divide_signaling(left: Expression, right: Expression) -> Expression {
	Expression::Divide(policy_binary(FailurePolicy::Signaling, left, right))
}

pub fn divide_nulling(left: Expression, right: Expression) -> Expression {
	Expression::Divide(policy_binary(FailurePolicy::Nulling, left, right))
}

pub fn divide_quiet(left: Expression, right: Expression) -> Expression {
	Expression::Divide(policy_binary(FailurePolicy::Quiet, left, right))
}

pub fn modulo_signaling(left: Expression, right: Expression) -> Expression {
	Expression::Modulo(policy_binary(FailurePolicy::Signaling, left, right))
}

pub fn modulo_nulling(left: Expression, right: Expression) -> Expression {
	Expression::Modulo(policy_binary(FailurePolicy::Nulling, left, right))
}

pub fn power_signaling(left: Expression, right: Expression) -> Expression {
	Expression::Power(policy_binary(FailurePolicy::Signaling, left, right))
}

pub fn power_nulling(left: Expression, right: Expression) -> Expression {
	Expression::Power(policy_binary(FailurePolicy::Nulling, left, right))
}

pub fn power_quiet(left: Expression, right: Expression) -> Expression {
	Expression::Power(policy_binary(FailurePolicy::Quiet, left, right))
}

pub fn sqrt_signaling(argument: Expression) -> Expression {
	Expression::Sqrt(PolicyUnaryExpression {
		policy: FailurePolicy::Signaling,
		argument: Box::new(argument),
	})
}

pub fn sqrt_nulling(argument: Expression) -> Expression {
	Expression::Sqrt(PolicyUnaryExpression {
		policy: FailurePolicy::Nulling,
		argument: Box::new(argument),
	})
}

pub fn sqrt_quiet(argument: Expression) -> Expression {
	Expression::Sqrt(PolicyUnaryExpression {
		policy: FailurePolicy::Quiet,
		argument: Box::new(argument),
	})
}

pub fn equal(left: Expression, right: Expression) -> Expression {
	Expression::Equal(binary(left, right))
}

pub fn not_equal(left: Expression, right: Expression) -> Expression {
	Expression::NotEqual(binary(left, right))
}

pub fn less(left: Expression, right: Expression) -> Expression {
	Expression::Less(binary(left, right))
}

pub fn less_or_equal(left: Expression, right: Expression) -> Expression {
	Expression::LessOrEqual(binary(left, right))
}

pub fn greater(left: Expression, right: Expression) -> Expression {
	Expression::Greater(binary(left, right))
}

pub fn greater_or_equal(left: Expression, right: Expression) -> Expression {
	Expression::GreaterOrEqual(binary(left, right))
}

pub fn is_null(argument: Expression) -> Expression {
	Expression::IsNull(unary(argument))
}

pub fn and(left: Expression, right: Expression) -> Expression {
	Expression::And(binary(left, right))
}

pub fn or(left: Expression, right: Expression) -> Expression {
	Expression::Or(binary(left, right))
}

pub fn xor(left: Expression, right: Expression) -> Expression {
	Expression::Xor(binary(left, right))
}

pub fn not(argument: Expression) -> Expression {
	Expression::Not(unary(argument))
}

pub fn if_then_else(condition: Expression, then: Expression, otherwise: Expression) -> Expression {
	Expression::If(IfExpression {
		condition: Box::new(condition),
		then: Box::new(then),
		otherwise: Box::new(otherwise),
	})
}

pub fn if_null(argument: Expression, substitute: Expression) -> Expression {
	Expression::IfNull(binary(argument, substitute))
}

/// `arguments` in the order `case_value, else_value, when₁, then₁, …`;
/// ties go to the leftmost matching WHEN.
pub fn case(arguments: Vec<Expression>) -> Expression {
	Expression::Case(CaseExpression {
		arguments,
	})
}

pub fn cast(argument: Expression, to: DataType) -> Expression {
	Expression::Cast(CastExpression {
		argument: Box::new(argument),
		to,
	})
}

pub fn parse_string_signaling(argument: Expression, to: DataType) -> Expression {
	Expression::ParseString(ParseStringExpression {
		policy: FailurePolicy::Signaling,
		argument: Box::new(argument),
		to,
	})
}

pub fn parse_string_nulling(argument: Expression, to: DataType) -> Expression {
	Expression::ParseString(ParseStringExpression {
		policy: FailurePolicy::Nulling,
		argument: Box::new(argument),
		to,
	})
}

pub fn to_string(argument: Expression) -> Expression {
	Expression::ToString(unary(argument))
}

pub fn concat(arguments: Vec<Expression>) -> Expression {
	Expression::Concat(ListExpression {
		arguments,
	})
}

pub fn length(argument: Expression) -> Expression {
	Expression::Length(unary(argument))
}

pub fn trim(argument: Expression) -> Expression {
	Expression::Trim(unary(argument))
}

pub fn ltrim(argument: Expression) -> Expression {
	Expression::Ltrim(unary(argument))
}

pub fn rtrim(argument: Expression) -> Expression {
	Expression::Rtrim(unary(argument))
}

pub fn to_upper(argument: Expression) -> Expression {
	Expression::ToUpper(unary(argument))
}

pub fn to_lower(argument: Expression) -> Expression {
	Expression::ToLower(unary(argument))
}

/// One-based position; a negative position counts from the end.
pub fn substring(argument: Expression, position: Expression, length: Expression) -> Expression {
	Expression::Substring(SubstringExpression {
		argument: Box::new(argument),
		position: Box::new(position),
		length: Some(Box::new(length)),
	})
}

/// The two-argument form, running to the end of the string.
pub fn trailing_substring(argument: Expression, position: Expression) -> Expression {
	Expression::Substring(SubstringExpression {
		argument: Box::new(argument),
		position: Box::new(position),
		length: None,
	})
}

pub fn string_offset(haystack: Expression, needle: Expression) -> Expression {
	Expression::StringOffset(binary(haystack, needle))
}

pub fn string_replace(haystack: Expression, needle: Expression, substitute: Expression) -> Expression {
	Expression::StringReplace(TernaryExpression {
		first: Box::new(haystack),
		second: Box::new(needle),
		third: Box::new(substitute),
	})
}

pub fn regexp_partial_match(argument: Expression, pattern: impl Into<String>) -> Expression {
	Expression::RegexpPartialMatch(RegexpExpression {
		argument: Box::new(argument),
		pattern: pattern.into(),
	})
}

pub fn regexp_full_match(argument: Expression, pattern: impl Into<String>) -> Expression {
	Expression::RegexpFullMatch(RegexpExpression {
		argument: Box::new(argument),
		pattern: pattern.into(),
	})
}

pub fn regexp_extract(argument: Expression, pattern: impl Into<String>) -> Expression {
	Expression::RegexpExtract(RegexpExpression {
		argument: Box::new(argument),
		pattern: pattern.into(),
	})
}

pub fn regexp_replace(haystack: Expression, pattern: impl Into<String>, substitute: Expression) -> Expression {
	Expression::RegexpReplace(RegexpReplaceExpression {
		haystack: Box::new(haystack),
		pattern: pattern.into(),
		substitute: Box::new(substitute),
	})
}

pub fn regexp_rewrite(argument: Expression, pattern: impl Into<String>) -> Expression {
	Expression::RegexpRewrite(RegexpExpression {
		argument: Box::new(argument),
		pattern: pattern.into(),
	})
}

pub fn input_attribute_projection(projector: SingleSourceProjector) -> Expression {
	Expression::InputAttributeProjection(InputAttributeProjectionExpression {
		projector,
	})
}

pub fn projection(arguments: Vec<Expression>, projector: MultiSourceProjector) -> Expression {
	Expression::Projection(ProjectionExpression {
		arguments,
		projector,
	})
}

/// Renames a single-attribute expression.
pub fn alias(name: impl Into<String>, argument: Expression) -> Expression {
	CompoundExpression::new().add_as(name, argument).build()
}

pub fn tuple(arguments: Vec<Expression>) -> Expression {
	Expression::Tuple(ListExpression {
		arguments,
	})
}

pub fn path(segments: Vec<String>) -> Expression {
	Expression::Path(PathExpression {
		segments,
	})
}

pub fn call(function: impl Into<String>, arguments: Vec<Expression>) -> Expression {
	Expression::Call(CallExpression {
		function: function.into(),
		arguments,
	})
}

impl Display for Expression {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		fn list(f: &mut Formatter<'_>, name: &str, arguments: &[&Expression]) -> fmt::Result {
			write!(f, "{name}(")?;
			for (i, argument) in arguments.iter().enumerate() {
				if i > 0 {
					write!(f, ", ")?;
				}
				write!(f, "{argument}")?;
			}
			write!(f, ")")
		}

		fn policy_suffix(policy: FailurePolicy) -> &'static str {
			match policy {
				FailurePolicy::Signaling => "_SIGNALING",
				FailurePolicy::Nulling => "_NULLING",
				FailurePolicy::Quiet => "_QUIET",
			}
		}

		match self {
			Expression::Constant(e) => write!(f, "{}", e.value),
			Expression::NamedAttribute(e) => f.write_str(&e.name),
			Expression::AttributeAt(e) => write!(f, "attribute_at({})", e.position),
			Expression::Plus(e) => list(f, "ADD", &[&e.left, &e.right]),
			Expression::Minus(e) => list(f, "SUBTRACT", &[&e.left, &e.right]),
			Expression::Multiply(e) => list(f, "MULTIPLY", &[&e.left, &e.right]),
			Expression::Negate(e) => list(f, "NEGATE", &[&e.argument]),
			Expression::Abs(e) => list(f, "ABS", &[&e.argument]),
			Expression::Divide(e) => {
				list(f, &format!("DIVIDE{}", policy_suffix(e.policy)), &[&e.left, &e.right])
			}
			Expression::Modulo(e) => {
				list(f, &format!("MODULO{}", policy_suffix(e.policy)), &[&e.left, &e.right])
			}
			Expression::Power(e) => {
				list(f, &format!("POWER{}", policy_suffix(e.policy)), &[&e.left, &e.right])
			}
			Expression::Sqrt(e) => {
				list(f, &format!("SQRT{}", policy_suffix(e.policy)), &[&e.argument])
			}
			Expression::Equal(e) => list(f, "EQUAL", &[&e.left, &e.right]),
			Expression::NotEqual(e) => list(f, "NOT_EQUAL", &[&e.left, &e.right]),
			Expression::Less(e) => list(f, "LESS", &[&e.left, &e.right]),
			Expression::LessOrEqual(e) => list(f, "LESS_OR_EQUAL", &[&e.left, &e.right]),
			Expression::Greater(e) => list(f, "GREATER", &[&e.left, &e.right]),
			Expression::GreaterOrEqual(e) => list(f, "GREATER_OR_EQUAL", &[&e.left, &e.right]),
			Expression::IsNull(e) => list(f, "IS_NULL", &[&e.argument]),
			Expression::And(e) => list(f, "AND", &[&e.left, &e.right]),
			Expression::Or(e) => list(f, "OR", &[&e.left, &e.right]),
			Expression::Xor(e) => list(f, "XOR", &[&e.left, &e.right]),
			Expression::Not(e) => list(f, "NOT", &[&e.argument]),
			Expression::If(e) => list(f, "IF", &[&e.condition, &e.then, &e.otherwise]),
			Expression::IfNull(e) => list(f, "IFNULL", &[&e.left, &e.right]),
			Expression::Case(e) => {
				let refs: Vec<&Expression> = e.arguments.iter().collect();
				list(f, "CASE", &refs)
			}
			Expression::Cast(e) => write!(f, "CAST_{}({})", e.to, e.argument),
			Expression::ParseString(e) => write!(
				f,
				"PARSE_STRING{}_{}({})",
				policy_suffix(e.policy),
				e.to,
				e.argument
			),
			Expression::ToString(e) => list(f, "TOSTRING", &[&e.argument]),
			Expression::Concat(e) => {
				let refs: Vec<&Expression> = e.arguments.iter().collect();
				list(f, "CONCAT", &refs)
			}
			Expression::Length(e) => list(f, "LENGTH", &[&e.argument]),
			Expression::Trim(e) => list(f, "TRIM", &[&e.argument]),
			Expression::Ltrim(e) => list(f, "LTRIM", &[&e.argument]),
			Expression::Rtrim(e) => list(f, "RTRIM", &[&e.argument]),
			Expression::ToUpper(e) => list(f, "TOUPPER", &[&e.argument]),
			Expression::ToLower(e) => list(f, "TOLOWER", &[&e.argument]),
			Expression::Substring(e) => match &e.length {
				Some(length) => list(f, "SUBSTRING", &[&e.argument, &e.position, length]),
				None => list(f, "SUBSTRING", &[&e.argument, &e.position]),
			},
			Expression::StringOffset(e) => list(f, "STRING_OFFSET", &[&e.left, &e.right]),
			Expression::StringReplace(e) => {
				list(f, "STRING_REPLACE", &[&e.first, &e.second, &e.third])
			}
			Expression::RegexpPartialMatch(e) => {
				write!(f, "REGEXP_PARTIAL({}, /{}/)", e.argument, e.pattern)
			}
			Expression::RegexpFullMatch(e) => {
				write!(f, "REGEXP_FULL({}, /{}/)", e.argument, e.pattern)
			}
			Expression::RegexpExtract(e) => {
				write!(f, "REGEXP_EXTRACT({}, /{}/)", e.argument, e.pattern)
			}
			Expression::RegexpReplace(e) => write!(
				f,
				"REGEXP_REPLACE({}, /{}/, {})",
				e.haystack, e.pattern, e.substitute
			),
			Expression::RegexpRewrite(e) => {
				write!(f, "REGEXP_REWRITE({}, /{}/)", e.argument, e.pattern)
			}
			Expression::InputAttributeProjection(_) => f.write_str("PROJECT_INPUT"),
			Expression::Projection(e) => {
				let refs: Vec<&Expression> = e.arguments.iter().collect();
				list(f, "PROJECT", &refs)
			}
			Expression::Compound(e) => {
				let refs: Vec<&Expression> = e.entries.iter().map(|entry| &entry.argument).collect();
				list(f, "COMPOUND", &refs)
			}
			Expression::Tuple(e) => {
				let refs: Vec<&Expression> = e.arguments.iter().collect();
				list(f, "TUPLE", &refs)
			}
			Expression::Path(e) => write!(f, "PATH(/{})", e.segments.join("/")),
			Expression::Call(e) => {
				let refs: Vec<&Expression> = e.arguments.iter().collect();
				list(f, &e.function.to_uppercase(), &refs)
			}
		}
	}
}
