// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::{collections::BTreeSet, sync::Arc};

use supersonic_core::{
	Attribute, Block, DataType, Nullability, Schema, Value, View, memory::BufferAllocator,
};

use super::{BoolView, BoundExpression, set_output_validity};

/// A constant column. The block is filled once at bind time; evaluation
/// only adjusts validity for the requested batch.
pub(crate) struct BoundConstant {
	schema: Schema,
	block: Block,
	undefined: bool,
}

pub(crate) fn bind_constant(
	name: String,
	data_type: DataType,
	value: &Value,
	allocator: &Arc<dyn BufferAllocator>,
	max_row_count: usize,
) -> crate::Result<Box<dyn BoundExpression>> {
	let undefined = value.is_undefined();
	let nullability = if undefined {
		Nullability::Nullable
	} else {
		Nullability::NotNullable
	};
	let schema = Schema::single(Attribute::new(name, data_type, nullability));
	let mut block = Block::with_capacity(schema.clone(), allocator, max_row_count)?;
	for _ in 0..max_row_count {
		block.column_mut(0).push_value(value);
	}
	Ok(Box::new(BoundConstant {
		schema,
		block,
		undefined,
	}))
}

impl BoundExpression for BoundConstant {
	fn result_schema(&self) -> &Schema {
		&self.schema
	}

	fn do_evaluate(&mut self, input: &View, skip: &mut BoolView<'_>) -> crate::Result<View> {
		debug_assert_eq!(skip.column_count(), 1);
		let row_count = input.row_count();
		let vector = skip.column(0);
		if self.undefined {
			for i in 0..row_count {
				vector.set(i, true);
			}
		}
		set_output_validity(self.block.column_mut(0), vector, row_count);
		Ok(self.block.view(row_count))
	}

	fn row_capacity(&self) -> usize {
		self.block.row_capacity()
	}

	fn is_constant(&self) -> bool {
		true
	}

	fn collect_referred_attribute_names(&self, _names: &mut BTreeSet<String>) {}
}
