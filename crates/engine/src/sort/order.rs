// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::cmp::Ordering;

use supersonic_core::{
	Schema, SortDirection, SortKey, View,
	columnar::compare_rows,
	error::diagnostic::schema,
};

/// A sort order resolved against a concrete schema: key positions and
/// directions. Nulls order below every value, so ascending keys put
/// them first and descending keys put them last.
#[derive(Clone, Debug)]
pub struct BoundSortOrder {
	schema: Schema,
	positions: Vec<usize>,
	directions: Vec<SortDirection>,
}

impl BoundSortOrder {
	pub fn bind(keys: &[SortKey], input: &Schema) -> crate::Result<Self> {
		let mut positions = Vec::with_capacity(keys.len());
		let mut directions = Vec::with_capacity(keys.len());
		for key in keys {
			let (position, _) = input.lookup_attribute(&key.attribute).ok_or_else(|| {
				supersonic_core::Error(schema::unknown_attribute(
					&key.attribute,
					input.attribute_names(),
				))
			})?;
			positions.push(position);
			directions.push(key.direction);
		}
		Ok(Self {
			schema: input.clone(),
			positions,
			directions,
		})
	}

	pub(crate) fn from_positions(
		positions: Vec<usize>,
		directions: Vec<SortDirection>,
		input: &Schema,
	) -> Self {
		debug_assert_eq!(positions.len(), directions.len());
		Self {
			schema: input.clone(),
			positions,
			directions,
		}
	}

	pub fn key_count(&self) -> usize {
		self.positions.len()
	}

	pub fn source_position(&self, key: usize) -> usize {
		self.positions[key]
	}

	pub fn direction(&self, key: usize) -> SortDirection {
		self.directions[key]
	}

	pub fn schema(&self) -> &Schema {
		&self.schema
	}

	/// Compares two rows over all keys, honoring per-key direction.
	pub fn compare(&self, a: &View, a_row: usize, b: &View, b_row: usize) -> Ordering {
		for key in 0..self.key_count() {
			let position = self.positions[key];
			let ordering = compare_rows(a.column(position), a_row, b.column(position), b_row);
			let ordering = match self.directions[key] {
				SortDirection::Ascending => ordering,
				SortDirection::Descending => ordering.reverse(),
			};
			if ordering != Ordering::Equal {
				return ordering;
			}
		}
		Ordering::Equal
	}
}

#[cfg(test)]
mod tests {
	use supersonic_core::{Attribute, ColumnData, DataType};

	use super::*;

	#[test]
	fn test_bind_unknown_attribute() {
		let schema = Schema::new(vec![Attribute::nullable("a", DataType::Int32)]).unwrap();
		let err = BoundSortOrder::bind(&[SortKey::ascending("missing")], &schema).unwrap_err();
		assert_eq!(err.code(), "SCHEMA_401");
	}

	#[test]
	fn test_compare_with_direction() {
		let schema = Schema::new(vec![Attribute::nullable("a", DataType::Int32)]).unwrap();
		let view = View::new(schema.clone(), vec![ColumnData::int32([1, 2])], 2);

		let ascending = BoundSortOrder::bind(&[SortKey::ascending("a")], &schema).unwrap();
		assert_eq!(ascending.compare(&view, 0, &view, 1), Ordering::Less);

		let descending = BoundSortOrder::bind(&[SortKey::descending("a")], &schema).unwrap();
		assert_eq!(descending.compare(&view, 0, &view, 1), Ordering::Greater);
	}
}
