// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! The pull-based execution surface. A cursor yields view batches until
//! end of stream; it may also suspend on a barrier (the caller retries
//! later) and can be interrupted from another thread between batches.

use supersonic_core::{Schema, View};

mod compute;
mod limit;
mod merge;
mod project;
mod spill;
mod table;
mod view_cursor;

pub use compute::ComputeCursor;
pub use limit::LimitCursor;
pub use merge::MergeUnionAllCursor;
pub use project::ProjectCursor;
pub(crate) use spill::{SpillHandle, SpillWriter, spill_reader};
pub use table::Table;
pub use view_cursor::ViewCursor;

/// Default batch granularity of cursors that choose their own.
pub const DEFAULT_ROW_COUNT: usize = 1024;

/// One step of a cursor. Failures travel through `crate::Result`.
#[derive(Clone, Debug)]
pub enum NextResult {
	Batch(View),
	Eos,
	/// Progress is blocked on an external event; call `next` again
	/// later. Not an error.
	WaitingOnBarrier,
}

impl NextResult {
	pub fn is_eos(&self) -> bool {
		matches!(self, NextResult::Eos)
	}

	pub fn is_waiting_on_barrier(&self) -> bool {
		matches!(self, NextResult::WaitingOnBarrier)
	}
}

/// Discriminates cursor kinds for instrumentation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CursorId {
	Compute,
	Limit,
	MergeUnionAll,
	Project,
	Sort,
	SpillRead,
	View,
}

/// Pipeline rewriting hook: cursors pass each direct child through the
/// transformer, which may replace it wholesale.
pub trait CursorTransformer {
	fn transform(&mut self, cursor: &mut Box<dyn Cursor>);
}

pub trait Cursor {
	fn schema(&self) -> &Schema;

	/// Produces at most `max_row_count` rows. The returned view stays
	/// valid until the next call on this cursor.
	fn next(&mut self, max_row_count: usize) -> crate::Result<NextResult>;

	/// Requests cancellation; observed between batches. Safe to call
	/// concurrently with `next`.
	fn interrupt(&self) {}

	/// Whether this cursor tolerates `WaitingOnBarrier` from below and
	/// reports it upward.
	fn is_waiting_on_barrier_supported(&self) -> bool {
		false
	}

	fn apply_to_children(&mut self, _transformer: &mut dyn CursorTransformer) {}

	fn cursor_id(&self) -> CursorId;
}

impl std::fmt::Debug for dyn Cursor {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Cursor").field("cursor_id", &self.cursor_id()).finish()
	}
}
