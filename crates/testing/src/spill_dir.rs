// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::{
	env, fs, io,
	path::{Path, PathBuf},
};

use uuid::Uuid;

/// A scoped spill directory for tests that exercise the external sorter.
/// Created under the system temp dir with a unique name and removed when
/// the guard drops, so a panicking test still cleans up after itself.
pub struct SpillDirectory {
	path: PathBuf,
}

impl SpillDirectory {
	pub fn new() -> io::Result<Self> {
		let path = env::temp_dir().join(format!("supersonic-spill-{}", Uuid::new_v4()));
		fs::create_dir(&path)?;
		Ok(Self {
			path,
		})
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// How many spill files currently live here. Sorter tests assert on
	/// this: non-zero after a forced flush, zero once every scoped
	/// remover has run.
	pub fn file_count(&self) -> io::Result<usize> {
		Ok(fs::read_dir(&self.path)?.count())
	}
}

impl Drop for SpillDirectory {
	fn drop(&mut self) {
		let _ = fs::remove_dir_all(&self.path);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_created_empty_and_removed_on_drop() {
		let dir = SpillDirectory::new().unwrap();
		let path = dir.path().to_path_buf();
		assert!(path.is_dir());
		assert_eq!(dir.file_count().unwrap(), 0);

		fs::write(path.join("sort-spill-0.run"), b"run").unwrap();
		assert_eq!(dir.file_count().unwrap(), 1);

		drop(dir);
		assert!(!path.exists());
	}
}
