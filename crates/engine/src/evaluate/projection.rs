// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::collections::BTreeSet;

use supersonic_core::{Schema, View};

use super::{BoolBlock, BoolView, BoundExpression, BoundExpressionList};
use crate::projector::{BoundMultiSourceProjector, BoundSingleSourceProjector};

/// Selects and renames input attributes by position. No data is copied;
/// the only per-row work is folding each nullable input's null bitmap
/// into the corresponding skip vector, which is how input NULLs start
/// propagating through a kernel tree.
pub(crate) struct BoundInputAttributeProjection {
	projector: BoundSingleSourceProjector,
	referred: Vec<String>,
	nullable: Vec<bool>,
}

pub(crate) fn bind_input_attribute_projection(
	input_schema: &Schema,
	projector: &crate::projector::SingleSourceProjector,
) -> crate::Result<Box<dyn BoundExpression>> {
	let bound = projector.bind(input_schema)?;
	let referred = bound.positions().iter().map(|&p| input_schema.attribute(p).name().to_string()).collect();
	let nullable = bound.positions().iter().map(|&p| input_schema.attribute(p).is_nullable()).collect();
	Ok(Box::new(BoundInputAttributeProjection {
		projector: bound,
		referred,
		nullable,
	}))
}

impl BoundExpression for BoundInputAttributeProjection {
	fn result_schema(&self) -> &Schema {
		self.projector.result_schema()
	}

	fn do_evaluate(&mut self, input: &View, skip: &mut BoolView<'_>) -> crate::Result<View> {
		debug_assert_eq!(skip.column_count(), self.projector.attribute_count());
		let row_count = input.row_count();
		for (attr, &position) in self.projector.positions().iter().enumerate() {
			if !self.nullable[attr] {
				continue;
			}
			let bitvec = input.column(position).bitvec();
			let vector = skip.column(attr);
			for i in 0..row_count {
				if !bitvec.get(i) {
					vector.set(i, true);
				}
			}
		}
		Ok(self.projector.project_view(input))
	}

	fn row_capacity(&self) -> usize {
		usize::MAX
	}

	fn collect_referred_attribute_names(&self, names: &mut BTreeSet<String>) {
		for name in &self.referred {
			names.insert(name.clone());
		}
	}
}

/// Evaluates a list of sub-expressions and interleaves their output
/// columns per the projector. Each child sees the slice of skip vectors
/// its outputs map to, copied through a scratch block sized for the
/// widest child.
pub(crate) struct BoundProjection {
	arguments: BoundExpressionList,
	projector: BoundMultiSourceProjector,
	/// `output_positions[child][attr]` lists the result positions the
	/// child's attribute lands in (possibly several, possibly none).
	output_positions: Vec<Vec<Vec<usize>>>,
	scratch: BoolBlock,
}

pub(crate) fn bind_projection(
	arguments: BoundExpressionList,
	projector: BoundMultiSourceProjector,
	max_row_count: usize,
) -> crate::Result<Box<dyn BoundExpression>> {
	let mut output_positions: Vec<Vec<Vec<usize>>> =
		(0..arguments.len()).map(|i| vec![Vec::new(); arguments.get(i).result_schema().attribute_count()]).collect();
	let mut output = 0;
	for (source, bound) in projector.entries() {
		for &attr in bound.positions() {
			output_positions[*source][attr].push(output);
			output += 1;
		}
	}
	let widest = (0..arguments.len())
		.map(|i| arguments.get(i).result_schema().attribute_count())
		.max()
		.unwrap_or(0);
	Ok(Box::new(BoundProjection {
		arguments,
		projector,
		output_positions,
		scratch: BoolBlock::new(widest, max_row_count),
	}))
}

impl BoundExpression for BoundProjection {
	fn result_schema(&self) -> &Schema {
		self.projector.result_schema()
	}

	fn do_evaluate(&mut self, input: &View, skip: &mut BoolView<'_>) -> crate::Result<View> {
		debug_assert_eq!(skip.column_count(), self.projector.result_schema().attribute_count());
		let row_count = input.row_count();
		let mut views: Vec<View> = Vec::with_capacity(self.arguments.len());
		for (child, mapping) in self.arguments.iter_mut().zip(&self.output_positions) {
			let width = child.result_schema().attribute_count();
			// Seed the child's skip vectors from the mapped output
			// columns; unmapped attributes start clear.
			for (attr, outputs) in mapping.iter().enumerate() {
				match outputs.first() {
					Some(&p) => {
						let source = skip.column_ref(p).clone();
						self.scratch.column(attr).copy_from(&source, row_count);
					}
					None => self.scratch.column(attr).zero(row_count),
				}
			}
			let mut child_skip = self.scratch.view_prefix(width, row_count);
			let view = child.do_evaluate(input, &mut child_skip)?;
			for (attr, outputs) in mapping.iter().enumerate() {
				for &p in outputs {
					let source = self.scratch.column(attr).clone();
					skip.column(p).copy_from(&source, row_count);
				}
			}
			views.push(view);
		}
		let refs: Vec<&View> = views.iter().collect();
		Ok(self.projector.project_views(&refs, row_count))
	}

	fn row_capacity(&self) -> usize {
		let mut capacity = self.scratch.capacity();
		for expression in self.arguments.iter() {
			capacity = capacity.min(expression.row_capacity());
		}
		capacity
	}

	fn collect_referred_attribute_names(&self, names: &mut BTreeSet<String>) {
		self.arguments.collect_referred_attribute_names(names);
	}
}
