// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use supersonic_core::Schema;

use super::{Cursor, CursorId, CursorTransformer, NextResult};
use crate::projector::BoundSingleSourceProjector;

/// Applies a bound projector to every batch of the child.
pub struct ProjectCursor {
	projector: BoundSingleSourceProjector,
	child: Box<dyn Cursor>,
}

impl ProjectCursor {
	pub fn new(projector: BoundSingleSourceProjector, child: Box<dyn Cursor>) -> Self {
		Self {
			projector,
			child,
		}
	}
}

impl Cursor for ProjectCursor {
	fn schema(&self) -> &Schema {
		self.projector.result_schema()
	}

	fn next(&mut self, max_row_count: usize) -> crate::Result<NextResult> {
		match self.child.next(max_row_count)? {
			NextResult::Batch(batch) => Ok(NextResult::Batch(self.projector.project_view(&batch))),
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
		CursorId::Project
	}
}
