// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 DocLite

use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;

/// A uniquely named directory under the system temp dir, removed on drop.
pub struct TempDir {
	path: PathBuf,
}

impl TempDir {
	pub fn new() -> TempDir {
		let path = std::env::temp_dir().join(format!("doclite-test-{}", Uuid::new_v4()));
		fs::create_dir_all(&path).expect("failed to create temp dir");
		TempDir { path }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

impl Default for TempDir {
	fn default() -> Self {
		Self::new()
	}
}

impl Drop for TempDir {
	fn drop(&mut self) {
		let _ = fs::remove_dir_all(&self.path);
	}
}

/// Runs `f` with a fresh scratch directory that is removed afterwards,
/// including when `f` returns early with an error.
pub fn temp_dir<T>(f: impl FnOnce(&Path) -> T) -> T {
	let dir = TempDir::new();
	f(dir.path())
}
