// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 DocLite

//! The database handle and its CRUD surface.
//!
//! Operations bracket themselves in a transaction obtained from the
//! manager: the explicit transaction when one is active, otherwise an
//! auto-commit transaction that is committed on success and aborted on
//! every error path.

mod collection;
mod count;
mod delete;
mod find;
mod insert;
mod transaction;
mod update;

use std::path::Path;
use std::sync::Arc;

use bson::Document;
use doclite_catalog::Catalog;
use doclite_store::{StoreEnv, StoreOptions, Txn};
use doclite_transaction::TransactionManager;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Handle configuration supplied at open time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatabaseOptions {
	/// Upper bound on the size of the data file, in bytes.
	pub max_bytes: u64,
}

impl Default for DatabaseOptions {
	fn default() -> DatabaseOptions {
		DatabaseOptions { max_bytes: 1 << 30 }
	}
}

/// Options for [`Database::find`].
#[derive(Clone, Debug, Default)]
pub struct FindOptions {
	/// Matches to pass over before emitting.
	pub skip: u64,
	/// Maximum documents to emit; zero means no limit.
	pub limit: u64,
	/// Field paths mapped to 1 (ascending) or -1 (descending).
	pub sort: Option<Document>,
	/// Projection applied to every emitted document.
	pub projection: Option<Document>,
}

/// An embedded document database over one on-disk directory.
#[derive(Clone)]
pub struct Database {
	inner: Arc<DbInner>,
}

struct DbInner {
	env: StoreEnv,
	manager: TransactionManager,
	options: DatabaseOptions,
}

impl Database {
	/// Opens (creating if needed) the database directory.
	pub fn open(path: impl AsRef<Path>, options: DatabaseOptions) -> Result<Database> {
		let env = StoreEnv::open(path, StoreOptions { max_bytes: options.max_bytes })?;
		let manager = TransactionManager::new(env.clone());
		let database = Database {
			inner: Arc::new(DbInner { env, manager, options }),
		};
		database.with_write(|txn| Catalog::init(txn).map(|()| ((), 0)))?;
		Ok(database)
	}

	pub fn path(&self) -> &Path {
		self.inner.env.path()
	}

	pub fn options(&self) -> &DatabaseOptions {
		&self.inner.options
	}

	/// Flushes the storage engine's log to the data file. The pooled
	/// reader is drained first; its open snapshot would otherwise block a
	/// forced checkpoint.
	pub fn sync(&self, force: bool) -> Result<()> {
		self.inner.manager.invalidate_readers();
		self.inner.env.sync(force)?;
		Ok(())
	}

	pub(crate) fn manager(&self) -> &TransactionManager {
		&self.inner.manager
	}

	/// The handle's transaction manager, for callers that drive the
	/// transaction lifecycle directly.
	pub fn transaction_manager(&self) -> &TransactionManager {
		&self.inner.manager
	}

	/// Runs `f` under a write transaction; `f` returns its output and the
	/// number of modifications to account to `changes()` on commit.
	pub(crate) fn with_write<T>(&self, f: impl FnOnce(&Txn) -> Result<(T, u64)>) -> Result<T> {
		let guard = self.inner.manager.write_txn()?;
		match f(&guard.txn) {
			Ok((out, changes)) => {
				self.inner.manager.commit_if_auto(guard, changes)?;
				Ok(out)
			}
			Err(error) => {
				self.inner.manager.abort_if_auto(guard);
				Err(error)
			}
		}
	}

	/// Runs `f` under a read transaction, returning the reader to the
	/// pool afterwards (snapshot included) on success and failure alike.
	pub(crate) fn with_read<T>(&self, f: impl FnOnce(&Txn) -> Result<T>) -> Result<T> {
		let guard = self.inner.manager.read_txn()?;
		let result = f(&guard.txn);
		self.inner.manager.release_read(guard);
		result
	}
}

pub(crate) fn validate_collection_arg(collection: &str) -> Result<()> {
	if collection.is_empty() {
		return Err(doclite_type::Error::InvalidArgument("collection name is empty".into()));
	}
	Ok(())
}
