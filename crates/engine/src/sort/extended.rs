// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Extended sort: case-insensitive string keys and an optional limit.
//! Every case-insensitive string key gets a derived uppercase column
//! with a fresh unique name, computed by a compound expression over the
//! child; those columns replace the originals in the sort order and a
//! result projector drops them from the output.

use std::{
	collections::BTreeSet,
	path::Path,
	sync::Arc,
};

use supersonic_core::{
	DataType, Schema, SortSpecification,
	error::diagnostic::operation,
	memory::BufferAllocator,
};

use super::{cursor::bound_sort_with_order, order::BoundSortOrder};
use crate::{
	cursor::{ComputeCursor, Cursor, LimitCursor},
	expression::{CompoundExpression, attribute_at, named_attribute, to_upper},
	projector::{BoundSingleSourceProjector, project_attributes_at},
};

const UPPERCASE_PREFIX: &str = "tmp_uppercase_version_of_";

fn unique_name(base: String, schema: &Schema, taken: &BTreeSet<String>) -> String {
	let mut candidate = base;
	while schema.contains(&candidate) || taken.contains(&candidate) {
		candidate.push('_');
	}
	candidate
}

/// Whether this key sorts by the derived uppercase column.
fn folds_case(specification_case_sensitive: bool, key_type: Option<DataType>) -> bool {
	!specification_case_sensitive && key_type == Some(DataType::Utf8)
}

pub fn bound_extended_sort(
	specification: &SortSpecification,
	result_projector: Option<BoundSingleSourceProjector>,
	memory_quota: u64,
	temporary_directory_prefix: &Path,
	allocator: Arc<dyn BufferAllocator>,
	max_row_count: usize,
	child: Box<dyn Cursor>,
) -> crate::Result<Box<dyn Cursor>> {
	let input_schema = child.schema().clone();

	// Duplicate keys are rejected per case-sensitivity bucket.
	let mut case_insensitive_keys = BTreeSet::new();
	let mut case_sensitive_keys = BTreeSet::new();
	for key in &specification.keys {
		let key_type = input_schema.lookup_attribute(&key.attribute).map(|(_, a)| a.data_type());
		let bucket = if folds_case(key.case_sensitive, key_type) {
			&mut case_insensitive_keys
		} else {
			&mut case_sensitive_keys
		};
		if !bucket.insert(key.attribute.clone()) {
			return Err(supersonic_core::Error(operation::duplicate_sort_key(
				&key.attribute,
				key.case_sensitive,
			)));
		}
	}

	// Pass every input attribute through, then append one uppercase
	// column per case-insensitive string key.
	let initial_attribute_count = input_schema.attribute_count();
	let mut compound = CompoundExpression::new();
	for position in 0..initial_attribute_count {
		compound = compound.add(attribute_at(position));
	}
	let mut uppercase_position = std::collections::BTreeMap::new();
	let mut derived_names = BTreeSet::new();
	let mut next_position = initial_attribute_count;
	for key in &specification.keys {
		let key_type = input_schema.lookup_attribute(&key.attribute).map(|(_, a)| a.data_type());
		if !folds_case(key.case_sensitive, key_type) {
			continue;
		}
		if uppercase_position.contains_key(&key.attribute) {
			continue;
		}
		let derived = unique_name(
			format!("{UPPERCASE_PREFIX}{}", key.attribute),
			&input_schema,
			&derived_names,
		);
		derived_names.insert(derived.clone());
		compound = compound.add_as(derived, to_upper(named_attribute(&key.attribute)));
		uppercase_position.insert(key.attribute.clone(), next_position);
		next_position += 1;
	}

	let tree = compound.build().bind(&input_schema, &allocator, max_row_count)?;
	let computed_schema = tree.result_schema().clone();
	let child: Box<dyn Cursor> = Box::new(ComputeCursor::new(tree, child));

	// The sort order reads the derived columns in place of the
	// original case-insensitive keys.
	let mut positions = Vec::with_capacity(specification.keys.len());
	let mut directions = Vec::with_capacity(specification.keys.len());
	for key in &specification.keys {
		let position = match uppercase_position.get(&key.attribute) {
			Some(&position) => position,
			None => match computed_schema.lookup_attribute(&key.attribute) {
				Some((position, _)) => position,
				None => {
					return Err(supersonic_core::Error(
						supersonic_core::error::diagnostic::schema::unknown_attribute(
							&key.attribute,
							input_schema.attribute_names(),
						),
					));
				}
			},
		};
		positions.push(position);
		directions.push(key.direction);
	}
	let order = BoundSortOrder::from_positions(positions, directions, &computed_schema);

	// Project the derived columns back out.
	let result_projector = match result_projector {
		Some(projector) => projector,
		None => project_attributes_at((0..initial_attribute_count).collect())
			.bind(&computed_schema)?,
	};

	let sorted = bound_sort_with_order(
		order,
		Some(result_projector),
		memory_quota,
		temporary_directory_prefix,
		allocator,
		child,
	)?;

	Ok(match specification.limit {
		Some(limit) => Box::new(LimitCursor::new(0, limit as usize, sorted)),
		None => sorted,
	})
}
