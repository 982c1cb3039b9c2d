// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use supersonic_core::Schema;

use super::{Cursor, CursorId, CursorTransformer, NextResult};
use crate::evaluate::BoundExpressionTree;

/// Evaluates a bound expression tree over every batch of the child.
pub struct ComputeCursor {
	tree: BoundExpressionTree,
	child: Box<dyn Cursor>,
}

impl ComputeCursor {
	pub fn new(tree: BoundExpressionTree, child: Box<dyn Cursor>) -> Self {
		Self {
			tree,
			child,
		}
	}
}

impl Cursor for ComputeCursor {
	fn schema(&self) -> &Schema {
		self.tree.result_schema()
	}

	fn next(&mut self, max_row_count: usize) -> crate::Result<NextResult> {
		let max_row_count = max_row_count.min(self.tree.row_capacity());
		match self.child.next(max_row_count)? {
			NextResult::Batch(batch) => Ok(NextResult::Batch(self.tree.evaluate(&batch)?)),
			other => Ok(other),
		}
	}

	fn interrupt(&self) {
		self.child.interrupt();
	}

	fn is_waiting_on_barrier_supported(&self) -> bool {
		self.child.is_waiting_on_barrier_supported()
	}

	fn apply_to_children(&mut self, transformer: &mut dyn CursorTransformer) {
		transformer.transform(&mut self.child);
	}

	fn cursor_id(&self) -> CursorId {
		CursorId::Compute
	}
}
