// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Spill files: sorted runs persisted under a caller-provided directory
//! prefix, written once and read back once. Frames are length-prefixed
//! bincode batches. Every file is wrapped in a scoped remover, so it
//! disappears when the last holder drops, on success and on error
//! paths alike.

use std::{
	fs::{self, File},
	io::{BufReader, BufWriter, ErrorKind, Read, Write},
	path::{Path, PathBuf},
	sync::atomic::{AtomicBool, Ordering},
};

use bincode::{
	config::standard,
	serde::{decode_from_slice, encode_to_vec},
};
use serde::{Deserialize, Serialize};
use supersonic_core::{
	ColumnData, Schema, View,
	error::diagnostic::{operation, spill},
};
use tracing::debug;
use uuid::Uuid;

use super::{Cursor, CursorId, NextResult};

/// Removes the file when dropped.
#[derive(Debug)]
struct SpillFile {
	path: PathBuf,
}

impl Drop for SpillFile {
	fn drop(&mut self) {
		let _ = fs::remove_file(&self.path);
	}
}

#[derive(Serialize, Deserialize)]
struct SpillBatch {
	row_count: u64,
	columns: Vec<ColumnData>,
}

#[derive(Debug)]
pub(crate) struct SpillWriter {
	file: BufWriter<File>,
	guard: SpillFile,
}

/// A finished spill, ready to be read back exactly once.
#[derive(Debug)]
pub(crate) struct SpillHandle {
	guard: SpillFile,
}

impl SpillWriter {
	pub(crate) fn create(directory: &Path) -> crate::Result<Self> {
		fs::create_dir_all(directory)
			.map_err(|e| supersonic_core::Error(spill::temp_file_creation(directory, &e.to_string())))?;
		let path = directory.join(format!("sort-spill-{}.run", Uuid::new_v4()));
		let file = File::create(&path)
			.map_err(|e| supersonic_core::Error(spill::temp_file_creation(directory, &e.to_string())))?;
		debug!(path = %path.display(), "created spill file");
		Ok(Self {
			file: BufWriter::new(file),
			guard: SpillFile {
				path,
			},
		})
	}

	pub(crate) fn write_batch(&mut self, view: &View) -> crate::Result<()> {
		let batch = SpillBatch {
			row_count: view.row_count() as u64,
			columns: view.columns().to_vec(),
		};
		let frame = encode_to_vec(&batch, standard())
			.map_err(|e| supersonic_core::Error(spill::io(&self.guard.path, &e.to_string())))?;
		let io_error = |e: std::io::Error| supersonic_core::Error(spill::io(&self.guard.path, &e.to_string()));
		self.file.write_all(&(frame.len() as u64).to_le_bytes()).map_err(io_error)?;
		self.file.write_all(&frame).map_err(io_error)?;
		Ok(())
	}

	pub(crate) fn finish(mut self) -> crate::Result<SpillHandle> {
		self.file
			.flush()
			.map_err(|e| supersonic_core::Error(spill::io(&self.guard.path, &e.to_string())))?;
		Ok(SpillHandle {
			guard: self.guard,
		})
	}
}

/// Opens the spilled run for its single read-back.
pub(crate) fn spill_reader(handle: SpillHandle, schema: Schema) -> crate::Result<SpillReaderCursor> {
	let file = File::open(&handle.guard.path)
		.map_err(|e| supersonic_core::Error(spill::io(&handle.guard.path, &e.to_string())))?;
	Ok(SpillReaderCursor {
		schema,
		file: BufReader::new(file),
		guard: handle.guard,
		current: None,
		offset: 0,
		eos: false,
		interrupted: AtomicBool::new(false),
	})
}

pub(crate) struct SpillReaderCursor {
	schema: Schema,
	file: BufReader<File>,
	guard: SpillFile,
	current: Option<View>,
	offset: usize,
	eos: bool,
	interrupted: AtomicBool,
}

impl SpillReaderCursor {
	fn read_frame(&mut self) -> crate::Result<Option<View>> {
		let mut length = [0u8; 8];
		match self.file.read_exact(&mut length) {
			Ok(()) => {}
			Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
			Err(e) => {
				return Err(supersonic_core::Error(spill::io(&self.guard.path, &e.to_string())));
			}
		}
		let mut frame = vec![0u8; u64::from_le_bytes(length) as usize];
		self.file
			.read_exact(&mut frame)
			.map_err(|e| supersonic_core::Error(spill::io(&self.guard.path, &e.to_string())))?;
		let (batch, _): (SpillBatch, usize) = decode_from_slice(&frame, standard())
			.map_err(|e| supersonic_core::Error(spill::corrupt(&self.guard.path, &e.to_string())))?;
		Ok(Some(View::new(self.schema.clone(), batch.columns, batch.row_count as usize)))
	}
}

impl Cursor for SpillReaderCursor {
	fn schema(&self) -> &Schema {
		&self.schema
	}

	fn next(&mut self, max_row_count: usize) -> crate::Result<NextResult> {
		if self.interrupted.load(Ordering::Relaxed) {
			return Err(supersonic_core::Error(operation::interrupted()));
		}
		if self.current.is_none() {
			if self.eos {
				return Ok(NextResult::Eos);
			}
			match self.read_frame()? {
				Some(view) => {
					self.current = Some(view);
					self.offset = 0;
				}
				None => {
					self.eos = true;
					return Ok(NextResult::Eos);
				}
			}
		}
		let view = match &self.current {
			Some(view) => view,
			None => unreachable!("frame presence established above"),
		};
		let remaining = view.row_count() - self.offset;
		let rows = remaining.min(max_row_count).max(1);
		let batch = view.slice(self.offset, rows);
		self.offset += rows;
		if self.offset == view.row_count() {
			self.current = None;
		}
		Ok(NextResult::Batch(batch))
	}

	fn interrupt(&self) {
		self.interrupted.store(true, Ordering::Relaxed);
	}

	fn cursor_id(&self) -> CursorId {
		CursorId::SpillRead
	}
}

#[cfg(test)]
mod tests {
	use supersonic_core::{Attribute, DataType, Value};

	use super::*;

	fn schema() -> Schema {
		Schema::new(vec![Attribute::nullable("v", DataType::Int64)]).unwrap()
	}

	#[test]
	fn test_round_trip_and_removal() {
		let dir = supersonic_testing::SpillDirectory::new().unwrap();
		let mut writer = SpillWriter::create(dir.path()).unwrap();
		let path = writer.guard.path.clone();
		let view = View::new(schema(), vec![ColumnData::int64([1, 2, 3])], 3);
		writer.write_batch(&view).unwrap();
		let handle = writer.finish().unwrap();
		assert!(path.exists());

		let mut reader = spill_reader(handle, schema()).unwrap();
		match reader.next(10).unwrap() {
			NextResult::Batch(batch) => {
				assert_eq!(batch.row(2), vec![Value::Int64(3)]);
			}
			_ => panic!("expected a batch"),
		}
		assert!(reader.next(10).unwrap().is_eos());

		drop(reader);
		assert!(!path.exists());
	}

	#[test]
	fn test_creation_failure_diagnostic() {
		let err = SpillWriter::create(Path::new("/proc/definitely/not/writable")).unwrap_err();
		assert_eq!(err.code(), "SPILL_001");
	}
}
