// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! K-way merge of sorted sources. A binary heap of source indices is
//! ordered by each source's current head row under the sort order; ties
//! resolve by source position, so earlier spills win over later ones
//! and the residual in-memory run comes last.

use std::{
	cmp::Ordering,
	sync::atomic::{AtomicBool, Ordering as AtomicOrdering},
};

use supersonic_core::{ColumnData, Schema, View, error::diagnostic::operation};

use super::{Cursor, CursorId, CursorTransformer, DEFAULT_ROW_COUNT, NextResult};
use crate::sort::BoundSortOrder;

struct MergeSource {
	cursor: Box<dyn Cursor>,
	batch: Option<View>,
	position: usize,
	done: bool,
}

enum Refill {
	Ready,
	Drained,
	Waiting,
}

impl MergeSource {
	/// Makes the head row available, pulling the next batch if the
	/// current one is consumed.
	fn refill(&mut self) -> crate::Result<Refill> {
		loop {
			if self.done {
				return Ok(Refill::Drained);
			}
			if let Some(batch) = &self.batch {
				if self.position < batch.row_count() {
					return Ok(Refill::Ready);
				}
			}
			match self.cursor.next(DEFAULT_ROW_COUNT)? {
				NextResult::Batch(batch) => {
					self.batch = Some(batch);
					self.position = 0;
				}
				NextResult::Eos => {
					self.done = true;
					self.batch = None;
				}
				NextResult::WaitingOnBarrier => return Ok(Refill::Waiting),
			}
		}
	}

	fn head(&self) -> (&View, usize) {
		match &self.batch {
			Some(batch) => (batch, self.position),
			None => unreachable!("head of a drained merge source"),
		}
	}
}

pub struct MergeUnionAllCursor {
	schema: Schema,
	order: BoundSortOrder,
	sources: Vec<MergeSource>,
	/// Source indices, heap-ordered by head row.
	heap: Vec<usize>,
	initialized: bool,
	interrupted: AtomicBool,
}

impl MergeUnionAllCursor {
	pub fn new(order: BoundSortOrder, schema: Schema, cursors: Vec<Box<dyn Cursor>>) -> Self {
		let sources = cursors
			.into_iter()
			.map(|cursor| MergeSource {
				cursor,
				batch: None,
				position: 0,
				done: false,
			})
			.collect();
		Self {
			schema,
			order,
			sources,
			heap: Vec::new(),
			initialized: false,
			interrupted: AtomicBool::new(false),
		}
	}

	fn less(order: &BoundSortOrder, sources: &[MergeSource], a: usize, b: usize) -> bool {
		let (a_view, a_row) = sources[a].head();
		let (b_view, b_row) = sources[b].head();
		match order.compare(a_view, a_row, b_view, b_row) {
			Ordering::Less => true,
			Ordering::Greater => false,
			// Tie-break by source position: spills in creation order,
			// the residual run last.
			Ordering::Equal => a < b,
		}
	}

	fn sift_down(&mut self, mut at: usize) {
		loop {
			let left = 2 * at + 1;
			if left >= self.heap.len() {
				return;
			}
			let right = left + 1;
			let mut smallest = at;
			if Self::less(&self.order, &self.sources, self.heap[left], self.heap[smallest]) {
				smallest = left;
			}
			if right < self.heap.len()
				&& Self::less(&self.order, &self.sources, self.heap[right], self.heap[smallest])
			{
				smallest = right;
			}
			if smallest == at {
				return;
			}
			self.heap.swap(at, smallest);
			at = smallest;
		}
	}

	fn build_heap(&mut self) {
		self.heap.clear();
		for (index, source) in self.sources.iter().enumerate() {
			if !source.done {
				self.heap.push(index);
			}
		}
		for at in (0..self.heap.len() / 2).rev() {
			self.sift_down(at);
		}
	}

	/// Pulls initial batches. Suspends (and resumes incrementally) when
	/// a source is waiting on a barrier.
	fn initialize(&mut self) -> crate::Result<Option<NextResult>> {
		for source in &mut self.sources {
			if let Refill::Waiting = source.refill()? {
				return Ok(Some(NextResult::WaitingOnBarrier));
			}
		}
		self.build_heap();
		self.initialized = true;
		Ok(None)
	}
}

impl Cursor for MergeUnionAllCursor {
	fn schema(&self) -> &Schema {
		&self.schema
	}

	fn next(&mut self, max_row_count: usize) -> crate::Result<NextResult> {
		if self.interrupted.load(AtomicOrdering::Relaxed) {
			return Err(supersonic_core::Error(operation::interrupted()));
		}
		if !self.initialized {
			if let Some(result) = self.initialize()? {
				return Ok(result);
			}
		}
		if self.heap.is_empty() {
			return Ok(NextResult::Eos);
		}

		let mut columns: Vec<ColumnData> = self
			.schema
			.attributes()
			.iter()
			.map(|a| ColumnData::with_capacity(a.data_type(), max_row_count.min(DEFAULT_ROW_COUNT)))
			.collect();
		let mut rows = 0;
		while rows < max_row_count && !self.heap.is_empty() {
			// The previous iteration may have left the top source at a
			// batch boundary: refill it, then restore heap order, since
			// a fresh batch changes its head.
			match self.sources[self.heap[0]].refill()? {
				Refill::Ready => {}
				Refill::Drained => {
					let last = self.heap.len() - 1;
					self.heap.swap(0, last);
					self.heap.pop();
					self.sift_down(0);
					continue;
				}
				Refill::Waiting => {
					// A stalled source blocks the merge; rows from the
					// others might order after its pending ones.
					if rows == 0 {
						return Ok(NextResult::WaitingOnBarrier);
					}
					break;
				}
			}
			self.sift_down(0);

			let top = self.heap[0];
			let (batch, position) = self.sources[top].head();
			for (column, source) in columns.iter_mut().zip(batch.columns()) {
				column.push_from(source, position);
			}
			rows += 1;
			self.sources[top].position += 1;
		}
		if rows == 0 {
			return Ok(NextResult::Eos);
		}
		Ok(NextResult::Batch(View::new(self.schema.clone(), columns, rows)))
	}

	fn interrupt(&self) {
		self.interrupted.store(true, AtomicOrdering::Relaxed);
		for source in &self.sources {
			source.cursor.interrupt();
		}
	}

	fn is_waiting_on_barrier_supported(&self) -> bool {
		self.sources.iter().all(|s| s.cursor.is_waiting_on_barrier_supported())
	}

	fn apply_to_children(&mut self, transformer: &mut dyn CursorTransformer) {
		for source in &mut self.sources {
			transformer.transform(&mut source.cursor);
		}
	}

	fn cursor_id(&self) -> CursorId {
		CursorId::MergeUnionAll
	}
}
