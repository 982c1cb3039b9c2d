// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use supersonic_core::Schema;

use super::{Cursor, CursorId, CursorTransformer, NextResult};

/// Skips `offset` rows, then passes through at most `limit` rows.
pub struct LimitCursor {
	offset: usize,
	remaining: usize,
	child: Box<dyn Cursor>,
}

impl LimitCursor {
	pub fn new(offset: usize, limit: usize, child: Box<dyn Cursor>) -> Self {
		Self {
			offset,
			remaining: limit,
			child,
		}
	}
}

impl Cursor for LimitCursor {
	fn schema(&self) -> &Schema {
		self.child.schema()
	}

	fn next(&mut self, max_row_count: usize) -> crate::Result<NextResult> {
		if self.remaining == 0 {
			return Ok(NextResult::Eos);
		}
		loop {
			let batch = match self.child.next(max_row_count)? {
				NextResult::Batch(batch) => batch,
				other => return Ok(other),
			};
			if self.offset >= batch.row_count() {
				self.offset -= batch.row_count();
				continue;
			}
			let start = self.offset;
			self.offset = 0;
			let rows = (batch.row_count() - start).min(self.remaining);
			self.remaining -= rows;
			return Ok(NextResult::Batch(batch.slice(start, rows)));
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
		CursorId::Limit
	}
}
