// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 DocLite

use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};

use crate::env::StoreEnv;
use crate::sub_store::{SubStore, TABLE_PREFIX};
use crate::{Result, StoreError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxnMode {
	Read,
	Write,
}

/// A transaction handle. Cheap to clone; the underlying connection is
/// returned to the environment when the transaction ends (or when the last
/// clone is dropped, which aborts it).
#[derive(Clone, Debug)]
pub struct Txn {
	inner: Arc<TxnInner>,
}

#[derive(Debug)]
struct TxnInner {
	env: StoreEnv,
	mode: TxnMode,
	id: u64,
	conn: Mutex<Option<Connection>>,
}

impl Txn {
	pub(crate) fn new(env: StoreEnv, mode: TxnMode, id: u64, conn: Connection) -> Txn {
		Txn {
			inner: Arc::new(TxnInner {
				env,
				mode,
				id,
				conn: Mutex::new(Some(conn)),
			}),
		}
	}

	/// Serial number unique within the environment; lets callers observe
	/// reader reuse without reaching into the engine.
	pub fn id(&self) -> u64 {
		self.inner.id
	}

	pub fn mode(&self) -> TxnMode {
		self.inner.mode
	}

	pub fn is_open(&self) -> bool {
		self.inner.conn.lock().is_some()
	}

	pub fn commit(&self) -> Result<()> {
		let conn = self.inner.conn.lock().take().ok_or(StoreError::Closed)?;
		let result = conn.execute_batch("COMMIT");
		if result.is_err() {
			let _ = conn.execute_batch("ROLLBACK");
		}
		self.inner.env.recycle(conn, self.inner.mode);
		result.map_err(Into::into)
	}

	pub fn abort(&self) -> Result<()> {
		let conn = self.inner.conn.lock().take().ok_or(StoreError::Closed)?;
		let result = conn.execute_batch("ROLLBACK");
		self.inner.env.recycle(conn, self.inner.mode);
		result.map_err(Into::into)
	}

	pub(crate) fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
		let guard = self.inner.conn.lock();
		let conn = guard.as_ref().ok_or(StoreError::Closed)?;
		f(conn)
	}

	fn require_write(&self) -> Result<()> {
		if self.inner.mode == TxnMode::Write {
			Ok(())
		} else {
			Err(StoreError::ReadOnly)
		}
	}

	// ── Key/value operations ────────────────────────────────────

	pub fn get(&self, sub_store: &SubStore, key: &[u8]) -> Result<Option<Vec<u8>>> {
		self.with_conn(|conn| {
			let sql = format!("SELECT v FROM {} WHERE k = ?1", sub_store.table());
			conn.query_row(&sql, params![key], |row| row.get(0)).optional().map_err(Into::into)
		})
	}

	/// Stores `value` under `key`. With `no_overwrite`, an existing key
	/// fails with [`StoreError::KeyExists`] and leaves the value intact.
	pub fn put(&self, sub_store: &SubStore, key: &[u8], value: &[u8], no_overwrite: bool) -> Result<()> {
		self.require_write()?;
		self.with_conn(|conn| {
			let sql = if no_overwrite {
				format!("INSERT INTO {} (k, v) VALUES (?1, ?2)", sub_store.table())
			} else {
				format!(
					"INSERT INTO {} (k, v) VALUES (?1, ?2) ON CONFLICT(k) DO UPDATE SET v = excluded.v",
					sub_store.table()
				)
			};
			conn.execute(&sql, params![key, value])?;
			Ok(())
		})
	}

	/// Deletes `key`. A missing key is a non-fatal signal (`Ok(false)`).
	pub fn delete(&self, sub_store: &SubStore, key: &[u8]) -> Result<bool> {
		self.require_write()?;
		self.with_conn(|conn| {
			let sql = format!("DELETE FROM {} WHERE k = ?1", sub_store.table());
			let rows = conn.execute(&sql, params![key])?;
			Ok(rows > 0)
		})
	}

	// ── Sub-store management ────────────────────────────────────

	pub fn create_sub_store(&self, name: &str) -> Result<SubStore> {
		self.require_write()?;
		let sub_store = SubStore::new(name)?;
		self.with_conn(|conn| {
			let sql = format!(
				"CREATE TABLE IF NOT EXISTS {} (k BLOB PRIMARY KEY, v BLOB NOT NULL) WITHOUT ROWID",
				sub_store.table()
			);
			conn.execute_batch(&sql)?;
			Ok(())
		})?;
		Ok(sub_store)
	}

	pub fn drop_sub_store(&self, name: &str) -> Result<()> {
		self.require_write()?;
		let sub_store = SubStore::new(name)?;
		self.with_conn(|conn| {
			conn.execute_batch(&format!("DROP TABLE IF EXISTS {}", sub_store.table()))?;
			Ok(())
		})
	}

	pub fn sub_store_exists(&self, name: &str) -> Result<bool> {
		let sub_store = SubStore::new(name)?;
		self.with_conn(|conn| {
			let found: Option<i64> = conn
				.query_row(
					"SELECT 1 FROM sqlite_schema WHERE type = 'table' AND name = ?1",
					params![sub_store.table_name()],
					|row| row.get(0),
				)
				.optional()?;
			Ok(found.is_some())
		})
	}

	pub fn list_sub_stores(&self) -> Result<Vec<String>> {
		self.with_conn(|conn| {
			let mut stmt = conn.prepare(
				"SELECT name FROM sqlite_schema WHERE type = 'table' AND name LIKE 'ss!_%' ESCAPE '!' ORDER BY name",
			)?;
			let names = stmt
				.query_map([], |row| row.get::<_, String>(0))?
				.collect::<std::result::Result<Vec<_>, _>>()?;
			Ok(names
				.into_iter()
				.filter_map(|n| n.strip_prefix(TABLE_PREFIX).map(str::to_string))
				.collect())
		})
	}
}

impl Drop for TxnInner {
	fn drop(&mut self) {
		// An open transaction abandoned by its last holder aborts.
		if let Some(conn) = self.conn.get_mut().take() {
			if let Err(error) = conn.execute_batch("ROLLBACK") {
				tracing::warn!("rollback of abandoned transaction {} failed: {error}", self.id);
			}
			self.env.recycle(conn, self.mode);
		}
	}
}
