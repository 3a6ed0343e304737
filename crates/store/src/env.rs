// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 DocLite

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::txn::{Txn, TxnMode};
use crate::{Result, StoreError};

const DATA_FILE: &str = "data.db";
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_IDLE_READERS: usize = 2;

/// Environment configuration supplied at open time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreOptions {
	/// Upper bound on the size of the data file, in bytes.
	pub max_bytes: u64,
}

impl Default for StoreOptions {
	fn default() -> StoreOptions {
		StoreOptions { max_bytes: 1 << 30 }
	}
}

/// One storage environment per on-disk directory. Holds the single writer
/// connection (so at most one write transaction exists at a time) and a
/// small pool of idle reader connections.
#[derive(Clone, Debug)]
pub struct StoreEnv {
	inner: Arc<EnvInner>,
}

#[derive(Debug)]
struct EnvInner {
	path: PathBuf,
	options: StoreOptions,
	writer: Mutex<Option<Connection>>,
	readers: Mutex<Vec<Connection>>,
	next_txn_id: AtomicU64,
}

impl StoreEnv {
	/// Opens (creating if needed) the environment directory.
	pub fn open(path: impl AsRef<Path>, options: StoreOptions) -> Result<StoreEnv> {
		let path = path.as_ref().to_path_buf();
		fs::create_dir_all(&path)?;
		let writer = connect(&path.join(DATA_FILE), &options)?;
		tracing::debug!("opened store environment at {}", path.display());
		Ok(StoreEnv {
			inner: Arc::new(EnvInner {
				path,
				options,
				writer: Mutex::new(Some(writer)),
				readers: Mutex::new(Vec::new()),
				next_txn_id: AtomicU64::new(1),
			}),
		})
	}

	pub fn path(&self) -> &Path {
		&self.inner.path
	}

	pub fn options(&self) -> &StoreOptions {
		&self.inner.options
	}

	/// Begins a transaction. Write transactions claim the single writer
	/// connection; read transactions pin a snapshot that stays stable for
	/// the life of the transaction regardless of later commits.
	pub fn begin(&self, mode: TxnMode) -> Result<Txn> {
		let id = self.inner.next_txn_id.fetch_add(1, Ordering::Relaxed);
		match mode {
			TxnMode::Write => {
				let conn =
					self.inner.writer.lock().take().ok_or(StoreError::WriteActive)?;
				if let Err(error) = conn.execute_batch("BEGIN IMMEDIATE") {
					*self.inner.writer.lock() = Some(conn);
					return Err(error.into());
				}
				Ok(Txn::new(self.clone(), mode, id, conn))
			}
			TxnMode::Read => {
				let conn = self.reader_conn()?;
				if let Err(error) = conn.execute_batch("BEGIN") {
					self.recycle(conn, TxnMode::Read);
					return Err(error.into());
				}
				// Force snapshot acquisition now, not at the first read.
				let pin: std::result::Result<i64, _> =
					conn.query_row("SELECT count(*) FROM sqlite_schema", [], |row| row.get(0));
				if let Err(error) = pin {
					let _ = conn.execute_batch("ROLLBACK");
					self.recycle(conn, TxnMode::Read);
					return Err(error.into());
				}
				Ok(Txn::new(self.clone(), mode, id, conn))
			}
		}
	}

	/// Durability flush: checkpoints the write-ahead log into the data
	/// file. `force` also truncates the log.
	pub fn sync(&self, force: bool) -> Result<()> {
		let conn = self.reader_conn()?;
		let sql = if force {
			"PRAGMA wal_checkpoint(TRUNCATE)"
		} else {
			"PRAGMA wal_checkpoint(PASSIVE)"
		};
		let result = conn.query_row(sql, [], |_row| Ok(()));
		self.recycle(conn, TxnMode::Read);
		result.map_err(Into::into)
	}

	fn reader_conn(&self) -> Result<Connection> {
		if let Some(conn) = self.inner.readers.lock().pop() {
			return Ok(conn);
		}
		connect(&self.inner.path.join(DATA_FILE), &self.inner.options)
	}

	pub(crate) fn recycle(&self, conn: Connection, mode: TxnMode) {
		match mode {
			TxnMode::Write => {
				*self.inner.writer.lock() = Some(conn);
			}
			TxnMode::Read => {
				let mut readers = self.inner.readers.lock();
				if readers.len() < MAX_IDLE_READERS {
					readers.push(conn);
				}
			}
		}
	}
}

fn connect(file: &Path, options: &StoreOptions) -> Result<Connection> {
	let conn = Connection::open(file)?;
	conn.busy_timeout(BUSY_TIMEOUT)?;
	// journal_mode reports the resulting mode back as a row.
	let _mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
	conn.execute_batch("PRAGMA synchronous=NORMAL")?;
	let page_size: i64 = conn.query_row("PRAGMA page_size", [], |row| row.get(0))?;
	let pages = (options.max_bytes / page_size.max(1) as u64).max(16);
	let _limit: i64 = conn.query_row(&format!("PRAGMA max_page_count={pages}"), [], |row| row.get(0))?;
	Ok(conn)
}
