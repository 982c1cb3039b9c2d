// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! External sorting. The unbuffered sorter turns every incoming batch
//! into a sorted spill file; the buffering sorter accumulates rows in
//! memory under a soft quota and only spills when the quota pushes
//! back. Finalization k-way merges the spills with the residual
//! in-memory run.

use std::{
	path::{Path, PathBuf},
	sync::Arc,
};

use supersonic_core::{
	Permutation, Schema, View,
	error::diagnostic::{memory, operation},
	memory::{BufferAllocator, MemoryLimit, SoftQuotaBypassingBufferAllocator},
};
use tracing::debug;

use super::{order::BoundSortOrder, progressive::sort_permutation};
use crate::cursor::{
	Cursor, DEFAULT_ROW_COUNT, MergeUnionAllCursor, NextResult, SpillHandle, SpillWriter, Table,
	ViewCursor, spill_reader,
};

/// Accepts batches and eventually yields them globally sorted.
pub trait Sorter {
	/// Accepts up to `view.row_count()` rows; a short count means the
	/// caller should retry with the remainder.
	fn write(&mut self, view: &View) -> crate::Result<usize>;

	/// Finalizes and returns the sorted output.
	fn get_result_cursor(self: Box<Self>) -> crate::Result<Box<dyn Cursor>>;
}

/// Collects sorted runs as spill files and merges them on demand.
pub(crate) struct Merger {
	schema: Schema,
	directory: PathBuf,
	spills: Vec<SpillHandle>,
}

impl Merger {
	pub(crate) fn new(schema: Schema, directory: &Path) -> Self {
		Self {
			schema,
			directory: directory.to_path_buf(),
			spills: Vec::new(),
		}
	}

	/// Drains an already sorted cursor into a fresh spill file. The
	/// basic merger cannot checkpoint a half-written run, so a source
	/// that suspends on a barrier is rejected.
	pub(crate) fn add_sorted(&mut self, cursor: &mut dyn Cursor) -> crate::Result<()> {
		let mut writer = SpillWriter::create(&self.directory)?;
		let mut rows = 0usize;
		loop {
			match cursor.next(DEFAULT_ROW_COUNT)? {
				NextResult::Batch(batch) => {
					rows += batch.row_count();
					writer.write_batch(&batch)?;
				}
				NextResult::Eos => break,
				NextResult::WaitingOnBarrier => {
					return Err(supersonic_core::Error(operation::not_implemented(
						"suspending on a barrier while spilling a sorted run",
					)));
				}
			}
		}
		self.spills.push(writer.finish()?);
		debug!(rows, spills = self.spills.len(), "spilled sorted run");
		Ok(())
	}

	pub(crate) fn is_empty(&self) -> bool {
		self.spills.is_empty()
	}

	/// Opens every spill and k-way merges them, plus an optional
	/// residual cursor as the last source.
	pub(crate) fn merge(
		self,
		order: &BoundSortOrder,
		additional: Option<Box<dyn Cursor>>,
	) -> crate::Result<Box<dyn Cursor>> {
		let mut cursors: Vec<Box<dyn Cursor>> = Vec::with_capacity(self.spills.len() + 1);
		for handle in self.spills {
			cursors.push(Box::new(spill_reader(handle, self.schema.clone())?));
		}
		if let Some(additional) = additional {
			cursors.push(additional);
		}
		debug!(sources = cursors.len(), "merging sorted runs");
		Ok(Box::new(MergeUnionAllCursor::new(order.clone(), self.schema, cursors)))
	}
}

/// Sorts each written batch on its own and spills it immediately. The
/// building block under the buffering sorter; also usable directly when
/// batches are large.
pub struct UnbufferedSorter {
	order: BoundSortOrder,
	merger: Merger,
}

impl UnbufferedSorter {
	pub fn new(schema: Schema, order: BoundSortOrder, temporary_directory_prefix: &Path) -> Self {
		let merger = Merger::new(schema, temporary_directory_prefix);
		Self {
			order,
			merger,
		}
	}

	/// Sorts a single view into a cursor that reads it in key order.
	fn sort_view(&self, view: &View) -> ViewCursor {
		let mut permutation = Permutation::identity(view.row_count());
		sort_permutation(&self.order, view, &mut permutation);
		ViewCursor::with_selection(view.clone(), permutation)
	}

	/// Finalizes, merging spills with an optional residual sorted
	/// cursor. A spill-free sorter returns the residual untouched.
	fn result_merged_with(self, additional: Option<Box<dyn Cursor>>) -> crate::Result<Box<dyn Cursor>> {
		match additional {
			Some(additional) if self.merger.is_empty() => Ok(additional),
			additional => self.merger.merge(&self.order, additional),
		}
	}
}

impl Sorter for UnbufferedSorter {
	fn write(&mut self, view: &View) -> crate::Result<usize> {
		let mut sorted = self.sort_view(view);
		self.merger.add_sorted(&mut sorted)?;
		Ok(view.row_count())
	}

	fn get_result_cursor(self: Box<Self>) -> crate::Result<Box<dyn Cursor>> {
		self.result_merged_with(None)
	}
}

/// Buffers rows in a growable table before sorting. Two nested
/// allocators govern it: the bypass allows a bounded overshoot past the
/// parent's soft quota, and the hard materialization limit is half the
/// nominal quota because the table doubles its storage as it grows.
pub struct BufferingSorter {
	materialization_allocator: Arc<dyn BufferAllocator>,
	parent_allocator: Arc<dyn BufferAllocator>,
	memory_buffer: Table,
	unbuffered: UnbufferedSorter,
}

impl BufferingSorter {
	pub fn new(
		schema: Schema,
		order: BoundSortOrder,
		memory_quota: u64,
		temporary_directory_prefix: &Path,
		allocator: Arc<dyn BufferAllocator>,
	) -> Self {
		let softquota_bypass: Arc<dyn BufferAllocator> =
			Arc::new(SoftQuotaBypassingBufferAllocator::new(allocator.clone(), memory_quota / 4));
		let materialization: Arc<dyn BufferAllocator> =
			Arc::new(MemoryLimit::new(memory_quota / 2, softquota_bypass));
		let memory_buffer = Table::new(schema.clone(), materialization.clone());
		let unbuffered = UnbufferedSorter::new(schema, order, temporary_directory_prefix);
		Self {
			materialization_allocator: materialization,
			parent_allocator: allocator,
			memory_buffer,
			unbuffered,
		}
	}

	/// Spills the buffered rows as one sorted run and empties the
	/// buffer. When the quota is fully drawn down, the buffer's backing
	/// storage is released too.
	fn flush(&mut self) -> crate::Result<()> {
		if self.memory_buffer.row_count() == 0 {
			return Ok(());
		}
		debug!(rows = self.memory_buffer.row_count(), "flushing sort buffer to disk");
		let view = self.memory_buffer.view();
		let written = self.unbuffered.write(&view)?;
		debug_assert_eq!(written, self.memory_buffer.row_count());
		self.memory_buffer.clear();
		if self.materialization_allocator.available() == 0 {
			self.memory_buffer.compact();
		}
		Ok(())
	}
}

impl Sorter for BufferingSorter {
	fn write(&mut self, view: &View) -> crate::Result<usize> {
		if view.is_empty() {
			return Ok(0);
		}
		let written = self.memory_buffer.write(view, 0);
		if written > 0 {
			return Ok(written);
		}
		// Nothing fit: flush and retry once against the empty buffer.
		self.flush()?;
		debug_assert_eq!(0, self.memory_buffer.row_count());
		let written = self.memory_buffer.write(view, 0);
		if written > 0 {
			return Ok(written);
		}
		Err(supersonic_core::Error(memory::memory_exceeded(
			self.materialization_allocator.quota(),
			self.materialization_allocator.available(),
			self.materialization_allocator.usage(),
			self.parent_allocator.available(),
		)))
	}

	fn get_result_cursor(self: Box<Self>) -> crate::Result<Box<dyn Cursor>> {
		// The current buffer contents need no flush: they merge as the
		// residual run, read straight from memory.
		let residual = self.unbuffered.sort_view(&self.memory_buffer.view());
		self.unbuffered.result_merged_with(Some(Box::new(residual)))
	}
}
