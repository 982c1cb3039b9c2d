// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{error::diagnostic::schema, value::DataType};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Nullability {
	Nullable,
	NotNullable,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
	name: String,
	data_type: DataType,
	nullability: Nullability,
}

impl Attribute {
	pub fn new(name: impl Into<String>, data_type: DataType, nullability: Nullability) -> Self {
		Self {
			name: name.into(),
			data_type,
			nullability,
		}
	}

	pub fn nullable(name: impl Into<String>, data_type: DataType) -> Self {
		Self::new(name, data_type, Nullability::Nullable)
	}

	pub fn not_nullable(name: impl Into<String>, data_type: DataType) -> Self {
		Self::new(name, data_type, Nullability::NotNullable)
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn data_type(&self) -> DataType {
		self.data_type
	}

	pub fn nullability(&self) -> Nullability {
		self.nullability
	}

	pub fn is_nullable(&self) -> bool {
		self.nullability == Nullability::Nullable
	}

	pub fn renamed(&self, name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			data_type: self.data_type,
			nullability: self.nullability,
		}
	}
}

/// An ordered attribute list with unique names. Cheap to clone; every
/// view over a batch carries one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Schema {
	attributes: Arc<Vec<Attribute>>,
}

impl Schema {
	pub fn new(attributes: Vec<Attribute>) -> crate::Result<Self> {
		for (i, attribute) in attributes.iter().enumerate() {
			if attributes[..i].iter().any(|a| a.name == attribute.name) {
				return Err(crate::error::Error(schema::duplicate_attribute(&attribute.name)));
			}
		}
		Ok(Self {
			attributes: Arc::new(attributes),
		})
	}

	pub fn empty() -> Self {
		Self {
			attributes: Arc::new(Vec::new()),
		}
	}

	/// The common single-attribute result schema of scalar expressions.
	pub fn single(attribute: Attribute) -> Self {
		Self {
			attributes: Arc::new(vec![attribute]),
		}
	}

	pub fn attribute(&self, position: usize) -> &Attribute {
		&self.attributes[position]
	}

	pub fn attributes(&self) -> &[Attribute] {
		&self.attributes
	}

	pub fn attribute_count(&self) -> usize {
		self.attributes.len()
	}

	pub fn lookup_attribute(&self, name: &str) -> Option<(usize, &Attribute)> {
		self.attributes.iter().enumerate().find(|(_, a)| a.name == name)
	}

	pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
		self.attributes.iter().map(|a| a.name.as_str())
	}

	pub fn contains(&self, name: &str) -> bool {
		self.lookup_attribute(name).is_some()
	}

	/// Per-row fixed storage footprint, for quota accounting.
	pub fn fixed_row_bytes(&self) -> usize {
		// One validity bit per attribute rounds up to a byte each.
		self.attributes.iter().map(|a| a.data_type().fixed_width() + 1).sum()
	}

	pub fn human_readable(&self) -> String {
		self.attributes
			.iter()
			.map(|a| {
				let nullable = if a.is_nullable() {
					"nullable"
				} else {
					"not nullable"
				};
				format!("{}: {} ({nullable})", a.name, a.data_type)
			})
			.collect::<Vec<_>>()
			.join(", ")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_duplicate_names_rejected() {
		let result = Schema::new(vec![
			Attribute::nullable("a", DataType::Int32),
			Attribute::nullable("a", DataType::Int64),
		]);
		assert_eq!(result.unwrap_err().code(), "SCHEMA_405");
	}

	#[test]
	fn test_lookup() {
		let schema = Schema::new(vec![
			Attribute::nullable("a", DataType::Int32),
			Attribute::not_nullable("b", DataType::Utf8),
		])
		.unwrap();

		let (position, attribute) = schema.lookup_attribute("b").unwrap();
		assert_eq!(position, 1);
		assert_eq!(attribute.data_type(), DataType::Utf8);
		assert!(!attribute.is_nullable());
		assert!(schema.lookup_attribute("c").is_none());
	}
}
