// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::sync::Arc;

use serde::{Deserialize, Serialize};

const INITIAL_CHUNK_BYTES: usize = 4096;

/// Bump storage for variable-length payloads. Grows in doubling chunks;
/// values are addressed by `(chunk, offset, len)` descriptors, so a chunk
/// never moves once written. Clone-on-write sharing keeps a stale view's
/// bytes alive after the owning container resets.
#[derive(Clone, Debug, PartialEq)]
pub struct Arena {
	inner: Arc<ArenaInner>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct ArenaInner {
	chunks: Vec<Vec<u8>>,
}

/// Descriptor of a value inside an [`Arena`]. Only meaningful against the
/// arena that produced it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArenaRef {
	chunk: u32,
	offset: u32,
	len: u32,
}

impl ArenaRef {
	pub fn len(&self) -> usize {
		self.len as usize
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}
}

impl Default for Arena {
	fn default() -> Self {
		Self::new()
	}
}

impl Arena {
	pub fn new() -> Self {
		Self {
			inner: Arc::new(ArenaInner {
				chunks: vec![Vec::with_capacity(INITIAL_CHUNK_BYTES)],
			}),
		}
	}

	pub fn append(&mut self, bytes: &[u8]) -> ArenaRef {
		let inner = Arc::make_mut(&mut self.inner);
		let fits = match inner.chunks.last() {
			Some(chunk) => chunk.capacity() - chunk.len() >= bytes.len(),
			None => false,
		};
		if !fits {
			let grown = inner.chunks.last().map_or(INITIAL_CHUNK_BYTES, |c| c.capacity() * 2);
			inner.chunks.push(Vec::with_capacity(grown.max(bytes.len())));
		}
		let chunk = inner.chunks.len() - 1;
		let target = &mut inner.chunks[chunk];
		let offset = target.len();
		target.extend_from_slice(bytes);
		ArenaRef {
			chunk: chunk as u32,
			offset: offset as u32,
			len: bytes.len() as u32,
		}
	}

	pub fn bytes(&self, r: ArenaRef) -> &[u8] {
		let chunk = &self.inner.chunks[r.chunk as usize];
		&chunk[r.offset as usize..r.offset as usize + r.len as usize]
	}

	/// Drops everything written so far. The first chunk keeps its
	/// capacity, later chunks are released; fixed-width buffers of the
	/// owning block are untouched.
	pub fn reset(&mut self) {
		let inner = Arc::make_mut(&mut self.inner);
		inner.chunks.truncate(1);
		match inner.chunks.first_mut() {
			Some(chunk) => chunk.clear(),
			None => inner.chunks.push(Vec::with_capacity(INITIAL_CHUNK_BYTES)),
		}
	}

	pub fn allocated_bytes(&self) -> usize {
		self.inner.chunks.iter().map(|c| c.len()).sum()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_append_and_read() {
		let mut arena = Arena::new();
		let a = arena.append(b"hello");
		let b = arena.append(b"world");
		assert_eq!(arena.bytes(a), b"hello");
		assert_eq!(arena.bytes(b), b"world");
		assert_eq!(arena.allocated_bytes(), 10);
	}

	#[test]
	fn test_growth_past_first_chunk() {
		let mut arena = Arena::new();
		let big = vec![7u8; INITIAL_CHUNK_BYTES + 1];
		let small = arena.append(b"x");
		let huge = arena.append(&big);
		assert_eq!(arena.bytes(small), b"x");
		assert_eq!(arena.bytes(huge), big.as_slice());
	}

	#[test]
	fn test_reset_keeps_first_chunk() {
		let mut arena = Arena::new();
		arena.append(&vec![1u8; INITIAL_CHUNK_BYTES * 3]);
		arena.reset();
		assert_eq!(arena.allocated_bytes(), 0);
		let r = arena.append(b"fresh");
		assert_eq!(arena.bytes(r), b"fresh");
	}

	#[test]
	fn test_stale_clone_survives_reset() {
		let mut arena = Arena::new();
		let r = arena.append(b"keep");
		let stale = arena.clone();
		arena.reset();
		assert_eq!(stale.bytes(r), b"keep");
	}
}
