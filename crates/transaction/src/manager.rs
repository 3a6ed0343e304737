// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 DocLite

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use doclite_store::{StoreEnv, Txn, TxnMode};
use doclite_type::Error;
use parking_lot::Mutex;
use tracing::instrument;

use crate::Result;

/// A transaction leased to one operation.
///
/// Auto guards were begun by the manager for this operation and must be
/// ended through [`TransactionManager::commit_if_auto`],
/// [`TransactionManager::abort_if_auto`] or
/// [`TransactionManager::release_read`]. Non-auto guards borrow the
/// explicit transaction; ending them is a no-op.
pub struct TxnGuard {
	pub txn: Txn,
	auto: bool,
}

impl TxnGuard {
	pub fn is_auto(&self) -> bool {
		self.auto
	}
}

/// Multiplexes explicit multi-statement transactions and per-operation
/// auto-commit transactions over one store environment, and caches at most
/// one idle read transaction for reuse.
#[derive(Clone)]
pub struct TransactionManager {
	inner: Arc<ManagerInner>,
}

struct ManagerInner {
	env: StoreEnv,
	/// Capacity-1 pool of an idle auto reader, kept with its snapshot.
	pooled: Mutex<Option<Txn>>,
	/// The explicit transaction, when one is active.
	explicit: Mutex<Option<Txn>>,
	/// Modifications staged inside the explicit transaction.
	pending: AtomicU64,
	/// Modifications committed since the handle was opened.
	committed: AtomicU64,
}

impl TransactionManager {
	pub fn new(env: StoreEnv) -> TransactionManager {
		TransactionManager {
			inner: Arc::new(ManagerInner {
				env,
				pooled: Mutex::new(None),
				explicit: Mutex::new(None),
				pending: AtomicU64::new(0),
				committed: AtomicU64::new(0),
			}),
		}
	}

	pub fn in_transaction(&self) -> bool {
		self.inner.explicit.lock().is_some()
	}

	/// Modifications committed through this handle since open.
	pub fn changes(&self) -> u64 {
		self.inner.committed.load(Ordering::Relaxed)
	}

	// ── Explicit transactions ───────────────────────────────────

	#[instrument(name = "transaction::begin", level = "trace", skip(self))]
	pub fn begin(&self) -> Result<()> {
		let mut slot = self.inner.explicit.lock();
		if slot.is_some() {
			return Err(Error::TransactionActive);
		}
		// Writers must not leave a stale reader behind.
		self.invalidate_readers();
		let txn = self.inner.env.begin(TxnMode::Write)?;
		*slot = Some(txn);
		Ok(())
	}

	#[instrument(name = "transaction::commit", level = "trace", skip(self))]
	pub fn commit(&self) -> Result<()> {
		let txn = self.inner.explicit.lock().take().ok_or(Error::NoTransaction)?;
		txn.commit().map_err(Error::from)?;
		let pending = self.inner.pending.swap(0, Ordering::Relaxed);
		self.inner.committed.fetch_add(pending, Ordering::Relaxed);
		Ok(())
	}

	#[instrument(name = "transaction::rollback", level = "trace", skip(self))]
	pub fn rollback(&self) -> Result<()> {
		let txn = self.inner.explicit.lock().take().ok_or(Error::NoTransaction)?;
		self.inner.pending.store(0, Ordering::Relaxed);
		txn.abort().map_err(Error::from)?;
		Ok(())
	}

	// ── Per-operation leases ────────────────────────────────────

	/// The explicit transaction if one is active, else a fresh auto write
	/// transaction. Any pooled reader is drained and aborted first so it
	/// cannot serve a stale snapshot after this write commits.
	pub fn write_txn(&self) -> Result<TxnGuard> {
		let explicit = self.inner.explicit.lock();
		if let Some(txn) = explicit.as_ref() {
			return Ok(TxnGuard { txn: txn.clone(), auto: false });
		}
		drop(explicit);
		self.invalidate_readers();
		let txn = self.inner.env.begin(TxnMode::Write)?;
		Ok(TxnGuard { txn, auto: true })
	}

	/// The explicit transaction if one is active (writes can read), else
	/// the pooled reader, else a fresh auto read transaction.
	pub fn read_txn(&self) -> Result<TxnGuard> {
		let explicit = self.inner.explicit.lock();
		if let Some(txn) = explicit.as_ref() {
			return Ok(TxnGuard { txn: txn.clone(), auto: false });
		}
		drop(explicit);
		if let Some(txn) = self.inner.pooled.lock().take() {
			return Ok(TxnGuard { txn, auto: true });
		}
		let txn = self.inner.env.begin(TxnMode::Read)?;
		Ok(TxnGuard { txn, auto: true })
	}

	/// Returns an auto reader to the pool. A second idle reader (or a
	/// borrowed explicit transaction) is simply dropped.
	pub fn release_read(&self, guard: TxnGuard) {
		if guard.auto && guard.txn.mode() == TxnMode::Read && guard.txn.is_open() {
			let mut slot = self.inner.pooled.lock();
			if slot.is_none() {
				*slot = Some(guard.txn);
			}
		}
	}

	/// Commits an auto write transaction, recording `changes` committed
	/// modifications; stages the count when the guard borrows an explicit
	/// transaction.
	pub fn commit_if_auto(&self, guard: TxnGuard, changes: u64) -> Result<()> {
		if guard.auto {
			guard.txn.commit().map_err(Error::from)?;
			self.inner.committed.fetch_add(changes, Ordering::Relaxed);
		} else {
			self.inner.pending.fetch_add(changes, Ordering::Relaxed);
		}
		Ok(())
	}

	/// Aborts an auto transaction; an explicit transaction is left in its
	/// prior state for the caller to decide.
	pub fn abort_if_auto(&self, guard: TxnGuard) {
		if guard.auto {
			let _ = guard.txn.abort();
		}
	}

	/// Drains and aborts the pooled reader.
	pub fn invalidate_readers(&self) {
		if let Some(txn) = self.inner.pooled.lock().take() {
			let _ = txn.abort();
		}
	}
}

#[cfg(test)]
mod tests {
	use doclite_store::{StoreEnv, StoreOptions, TxnMode};
	use doclite_testing::tempdir::temp_dir;
	use doclite_type::Error;

	use super::TransactionManager;

	fn manager(path: &std::path::Path) -> TransactionManager {
		TransactionManager::new(StoreEnv::open(path, StoreOptions::default()).unwrap())
	}

	#[test]
	fn test_reader_pool_reuse() {
		temp_dir(|path| {
			let manager = manager(path);

			let first = manager.read_txn().unwrap();
			let first_id = first.txn.id();
			manager.release_read(first);

			// The pooled reader comes back with the same serial.
			let second = manager.read_txn().unwrap();
			assert_eq!(second.txn.id(), first_id);
			manager.release_read(second);
		})
	}

	#[test]
	fn test_write_invalidates_pooled_reader() {
		temp_dir(|path| {
			let manager = manager(path);

			let reader = manager.read_txn().unwrap();
			let stale_id = reader.txn.id();
			manager.release_read(reader);

			let writer = manager.write_txn().unwrap();
			manager.commit_if_auto(writer, 0).unwrap();

			let fresh = manager.read_txn().unwrap();
			assert_ne!(fresh.txn.id(), stale_id);
			manager.release_read(fresh);
		})
	}

	#[test]
	fn test_pool_capacity_is_one() {
		temp_dir(|path| {
			let manager = manager(path);

			let first = manager.read_txn().unwrap();
			let second = manager.read_txn().unwrap();
			let first_id = first.txn.id();

			manager.release_read(first);
			// The pool already holds the first reader; the second drops.
			manager.release_read(second);

			let next = manager.read_txn().unwrap();
			assert_eq!(next.txn.id(), first_id);
			manager.release_read(next);
		})
	}

	#[test]
	fn test_explicit_lifecycle_errors() {
		temp_dir(|path| {
			let manager = manager(path);

			assert!(matches!(manager.commit().unwrap_err(), Error::NoTransaction));
			assert!(matches!(manager.rollback().unwrap_err(), Error::NoTransaction));

			manager.begin().unwrap();
			assert!(manager.in_transaction());
			assert!(matches!(manager.begin().unwrap_err(), Error::TransactionActive));
			manager.commit().unwrap();
			assert!(!manager.in_transaction());
		})
	}

	#[test]
	fn test_leases_share_the_explicit_transaction() {
		temp_dir(|path| {
			let manager = manager(path);
			manager.begin().unwrap();

			let write = manager.write_txn().unwrap();
			assert!(!write.is_auto());
			assert_eq!(write.txn.mode(), TxnMode::Write);
			let write_id = write.txn.id();
			manager.commit_if_auto(write, 1).unwrap();

			// Reads inside the transaction see the write handle too.
			let read = manager.read_txn().unwrap();
			assert!(!read.is_auto());
			assert_eq!(read.txn.id(), write_id);
			manager.release_read(read);

			// Nothing is committed yet.
			assert_eq!(manager.changes(), 0);
			manager.commit().unwrap();
			assert_eq!(manager.changes(), 1);
		})
	}

	#[test]
	fn test_rollback_discards_pending_changes() {
		temp_dir(|path| {
			let manager = manager(path);
			manager.begin().unwrap();
			let guard = manager.write_txn().unwrap();
			manager.commit_if_auto(guard, 5).unwrap();
			manager.rollback().unwrap();
			assert_eq!(manager.changes(), 0);
		})
	}

	#[test]
	fn test_auto_commit_counts_changes() {
		temp_dir(|path| {
			let manager = manager(path);
			let guard = manager.write_txn().unwrap();
			assert!(guard.is_auto());
			manager.commit_if_auto(guard, 3).unwrap();
			assert_eq!(manager.changes(), 3);

			let guard = manager.write_txn().unwrap();
			manager.abort_if_auto(guard);
			assert_eq!(manager.changes(), 3);
		})
	}
}
