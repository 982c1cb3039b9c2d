// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::{
	path::Path,
	sync::{
		Arc,
		atomic::{AtomicBool, Ordering},
	},
};

use supersonic_core::{
	Schema, SortKey, View,
	error::diagnostic::operation,
	memory::BufferAllocator,
};
use tracing::instrument;

use super::{order::BoundSortOrder, sorter::{BufferingSorter, Sorter}};
use crate::{
	cursor::{Cursor, CursorId, CursorTransformer, DEFAULT_ROW_COUNT, NextResult, ProjectCursor},
	projector::{BoundSingleSourceProjector, project_all_attributes},
};

/// The sort operator: drains the child into the buffering sorter, then
/// serves batches from the merged result. The ingest loop checkpoints
/// its position inside the current batch, so a child that suspends on a
/// barrier resumes exactly where it left off.
pub struct SortCursor {
	projector: BoundSingleSourceProjector,
	child: Box<dyn Cursor>,
	sorter: Option<BufferingSorter>,
	result: Option<Box<dyn Cursor>>,
	/// The batch currently being fed to the sorter and how much of it
	/// is already written; this is the barrier checkpoint.
	pending: Option<(View, usize)>,
	child_eos: bool,
	waiting_on_barrier_supported: bool,
	interrupted: Arc<AtomicBool>,
}

/// Sorts `child` by `keys` (case-sensitive comparison) under the given
/// memory quota, spilling under `temporary_directory_prefix`. A missing
/// result projector keeps all attributes.
pub fn bound_sort(
	keys: &[SortKey],
	result_projector: Option<BoundSingleSourceProjector>,
	memory_quota: u64,
	temporary_directory_prefix: &Path,
	allocator: Arc<dyn BufferAllocator>,
	child: Box<dyn Cursor>,
) -> crate::Result<Box<dyn Cursor>> {
	let order = BoundSortOrder::bind(keys, child.schema())?;
	bound_sort_with_order(
		order,
		result_projector,
		memory_quota,
		temporary_directory_prefix,
		allocator,
		child,
	)
}

pub(crate) fn bound_sort_with_order(
	order: BoundSortOrder,
	result_projector: Option<BoundSingleSourceProjector>,
	memory_quota: u64,
	temporary_directory_prefix: &Path,
	allocator: Arc<dyn BufferAllocator>,
	child: Box<dyn Cursor>,
) -> crate::Result<Box<dyn Cursor>> {
	let schema = child.schema().clone();
	let projector = match result_projector {
		Some(projector) => projector,
		None => project_all_attributes().bind(&schema)?,
	};
	let sorter = BufferingSorter::new(
		schema,
		order,
		memory_quota,
		temporary_directory_prefix,
		allocator,
	);
	Ok(Box::new(SortCursor {
		waiting_on_barrier_supported: child.is_waiting_on_barrier_supported(),
		projector,
		child,
		sorter: Some(sorter),
		result: None,
		pending: None,
		child_eos: false,
		interrupted: Arc::new(AtomicBool::new(false)),
	}))
}

impl SortCursor {
	/// Feeds the child into the sorter until end of stream; on a
	/// barrier, returns with the current position saved. Once the child
	/// is drained, finalizes the sorter into the result cursor.
	#[instrument(level = "trace", skip_all, name = "sort::process_data")]
	fn process_data(&mut self) -> crate::Result<()> {
		let sorter = match &mut self.sorter {
			Some(sorter) => sorter,
			None => unreachable!("sort input processed after finalization"),
		};
		loop {
			if self.interrupted.load(Ordering::Relaxed) {
				return Err(supersonic_core::Error(operation::interrupted()));
			}
			if let Some((view, offset)) = &mut self.pending {
				while *offset < view.row_count() {
					let remainder = view.slice(*offset, view.row_count() - *offset);
					*offset += sorter.write(&remainder)?;
				}
				self.pending = None;
			}
			if self.child_eos {
				break;
			}
			match self.child.next(DEFAULT_ROW_COUNT)? {
				NextResult::Batch(batch) => self.pending = Some((batch, 0)),
				NextResult::Eos => self.child_eos = true,
				// Better luck next time; the checkpoint makes re-entry
				// cheap.
				NextResult::WaitingOnBarrier => return Ok(()),
			}
		}
		let sorter = match self.sorter.take() {
			Some(sorter) => Box::new(sorter),
			None => unreachable!("sorter taken twice"),
		};
		let merged = sorter.get_result_cursor()?;
		self.result = Some(Box::new(ProjectCursor::new(self.projector.clone(), merged)));
		Ok(())
	}
}

impl Cursor for SortCursor {
	fn schema(&self) -> &Schema {
		self.projector.result_schema()
	}

	#[instrument(level = "trace", skip_all, name = "sort::next")]
	fn next(&mut self, max_row_count: usize) -> crate::Result<NextResult> {
		if self.result.is_none() {
			self.process_data()?;
			if self.result.is_none() {
				// No failure, but not complete: the child is waiting.
				return Ok(NextResult::WaitingOnBarrier);
			}
		}
		match &mut self.result {
			Some(result) => result.next(max_row_count),
			None => unreachable!("result presence established above"),
		}
	}

	fn interrupt(&self) {
		self.interrupted.store(true, Ordering::Relaxed);
		self.child.interrupt();
		// Benign race with process_data installing the result cursor:
		// worst case the flag is observed on the next batch instead.
		if let Some(result) = &self.result {
			result.interrupt();
		}
	}

	fn is_waiting_on_barrier_supported(&self) -> bool {
		self.waiting_on_barrier_supported
	}

	fn apply_to_children(&mut self, transformer: &mut dyn CursorTransformer) {
		transformer.transform(&mut self.child);
	}

	fn cursor_id(&self) -> CursorId {
		CursorId::Sort
	}
}
