// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Projectors select, reorder and rename attributes. The symbolic forms
//! bind against a schema into position lists; projecting a view is then
//! a matter of cloning column handles; no data moves.

use serde::{Deserialize, Serialize};
use supersonic_core::{Attribute, Schema, View, error::diagnostic::schema};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SingleSourceProjector {
	AllAttributes,
	AttributesAt(Vec<usize>),
	NamedAttributes(Vec<String>),
	Renamed {
		aliases: Vec<String>,
		inner: Box<SingleSourceProjector>,
	},
}

pub fn project_all_attributes() -> SingleSourceProjector {
	SingleSourceProjector::AllAttributes
}

pub fn project_attribute_at(position: usize) -> SingleSourceProjector {
	SingleSourceProjector::AttributesAt(vec![position])
}

pub fn project_attributes_at(positions: Vec<usize>) -> SingleSourceProjector {
	SingleSourceProjector::AttributesAt(positions)
}

pub fn project_named_attribute(name: impl Into<String>) -> SingleSourceProjector {
	SingleSourceProjector::NamedAttributes(vec![name.into()])
}

pub fn project_named_attributes(names: Vec<String>) -> SingleSourceProjector {
	SingleSourceProjector::NamedAttributes(names)
}

pub fn project_rename(aliases: Vec<String>, inner: SingleSourceProjector) -> SingleSourceProjector {
	SingleSourceProjector::Renamed {
		aliases,
		inner: Box::new(inner),
	}
}

impl SingleSourceProjector {
	pub fn bind(&self, source: &Schema) -> crate::Result<BoundSingleSourceProjector> {
		match self {
			SingleSourceProjector::AllAttributes => {
				BoundSingleSourceProjector::new(source, (0..source.attribute_count()).collect(), None)
			}
			SingleSourceProjector::AttributesAt(positions) => {
				for &position in positions {
					if position >= source.attribute_count() {
						return Err(supersonic_core::Error(schema::position_out_of_range(
							position,
							source.attribute_count(),
						)));
					}
				}
				BoundSingleSourceProjector::new(source, positions.clone(), None)
			}
			SingleSourceProjector::NamedAttributes(names) => {
				let mut positions = Vec::with_capacity(names.len());
				for name in names {
					let (position, _) = source.lookup_attribute(name).ok_or_else(|| {
						supersonic_core::Error(schema::unknown_attribute(
							name,
							source.attribute_names(),
						))
					})?;
					positions.push(position);
				}
				BoundSingleSourceProjector::new(source, positions, None)
			}
			SingleSourceProjector::Renamed {
				aliases,
				inner,
			} => {
				let bound = inner.bind(source)?;
				if aliases.len() != bound.positions.len() {
					return Err(supersonic_core::Error(schema::arity_mismatch(
						"rename projector",
						bound.positions.len(),
						aliases.len(),
					)));
				}
				BoundSingleSourceProjector::new(source, bound.positions, Some(aliases.clone()))
			}
		}
	}
}

/// A resolved attribute selection over one source schema.
#[derive(Clone, Debug)]
pub struct BoundSingleSourceProjector {
	positions: Vec<usize>,
	result_schema: Schema,
}

impl BoundSingleSourceProjector {
	fn new(source: &Schema, positions: Vec<usize>, aliases: Option<Vec<String>>) -> crate::Result<Self> {
		let attributes: Vec<Attribute> = positions
			.iter()
			.enumerate()
			.map(|(i, &position)| {
				let attribute = source.attribute(position);
				match &aliases {
					Some(aliases) => attribute.renamed(&aliases[i]),
					None => attribute.clone(),
				}
			})
			.collect();
		Ok(Self {
			positions,
			result_schema: Schema::new(attributes)?,
		})
	}

	pub fn result_schema(&self) -> &Schema {
		&self.result_schema
	}

	pub fn attribute_count(&self) -> usize {
		self.positions.len()
	}

	pub fn source_position(&self, result_position: usize) -> usize {
		self.positions[result_position]
	}

	pub fn positions(&self) -> &[usize] {
		&self.positions
	}

	/// Projects a view by cloning the selected column handles.
	pub fn project_view(&self, view: &View) -> View {
		let columns = self.positions.iter().map(|&p| view.column(p).clone()).collect();
		View::new(self.result_schema.clone(), columns, view.row_count())
	}
}

/// Orders projections over several sources; the result is the
/// concatenation of the entries' outputs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiSourceProjector {
	entries: Vec<(usize, SingleSourceProjector)>,
}

impl MultiSourceProjector {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add(mut self, source: usize, projector: SingleSourceProjector) -> Self {
		self.entries.push((source, projector));
		self
	}

	pub fn bind(&self, sources: &[Schema]) -> crate::Result<BoundMultiSourceProjector> {
		let mut entries = Vec::with_capacity(self.entries.len());
		let mut attributes = Vec::new();
		for (source, projector) in &self.entries {
			if *source >= sources.len() {
				return Err(supersonic_core::Error(schema::position_out_of_range(
					*source,
					sources.len(),
				)));
			}
			let bound = projector.bind(&sources[*source])?;
			attributes.extend(bound.result_schema().attributes().iter().cloned());
			entries.push((*source, bound));
		}
		Ok(BoundMultiSourceProjector {
			result_schema: Schema::new(attributes)?,
			entries,
		})
	}
}

#[derive(Clone, Debug)]
pub struct BoundMultiSourceProjector {
	entries: Vec<(usize, BoundSingleSourceProjector)>,
	result_schema: Schema,
}

impl BoundMultiSourceProjector {
	pub fn result_schema(&self) -> &Schema {
		&self.result_schema
	}

	pub fn entries(&self) -> &[(usize, BoundSingleSourceProjector)] {
		&self.entries
	}

	/// Interleaves projected columns from per-source views into the
	/// result layout.
	pub fn project_views(&self, sources: &[&View], row_count: usize) -> View {
		let mut columns = Vec::with_capacity(self.result_schema.attribute_count());
		for (source, projector) in &self.entries {
			let view = sources[*source];
			for &position in projector.positions() {
				columns.push(view.column(position).clone());
			}
		}
		View::new(self.result_schema.clone(), columns, row_count)
	}
}

#[cfg(test)]
mod tests {
	use supersonic_core::{ColumnData, DataType, Value};

	use super::*;

	fn schema() -> Schema {
		Schema::new(vec![
			Attribute::nullable("a", DataType::Int32),
			Attribute::nullable("b", DataType::Utf8),
			Attribute::nullable("c", DataType::Bool),
		])
		.unwrap()
	}

	#[test]
	fn test_named_projection() {
		let bound = project_named_attributes(vec!["c".into(), "a".into()]).bind(&schema()).unwrap();
		assert_eq!(bound.positions(), &[2, 0]);
		assert_eq!(bound.result_schema().attribute(0).name(), "c");
	}

	#[test]
	fn test_unknown_name() {
		let err = project_named_attribute("missing").bind(&schema()).unwrap_err();
		assert_eq!(err.code(), "SCHEMA_401");
	}

	#[test]
	fn test_rename() {
		let bound = project_rename(vec!["x".into()], project_attribute_at(1)).bind(&schema()).unwrap();
		assert_eq!(bound.result_schema().attribute(0).name(), "x");
		assert_eq!(bound.result_schema().attribute(0).data_type(), DataType::Utf8);
	}

	#[test]
	fn test_project_view() {
		let view = View::new(
			schema(),
			vec![
				ColumnData::int32([1, 2]),
				ColumnData::utf8(["x", "y"]),
				ColumnData::bool([true, false]),
			],
			2,
		);
		let bound = project_attributes_at(vec![1]).bind(&schema()).unwrap();
		let projected = bound.project_view(&view);
		assert_eq!(projected.schema().attribute_count(), 1);
		assert_eq!(projected.row(1), vec![Value::Utf8("y".to_string())]);
	}
}
