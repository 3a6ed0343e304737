// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 DocLite

use thiserror::Error;

/// Error kinds surfaced by the ordered-KV adapter.
#[derive(Debug, Error)]
pub enum StoreError {
	/// The key (or sub-store) is absent; callers treat this as a signal,
	/// not a failure.
	#[error("key not found")]
	NotFound,

	/// A no-overwrite put hit an existing key.
	#[error("key already exists")]
	KeyExists,

	/// A sub-store name contained bytes outside `[A-Za-z0-9_.-]`.
	#[error("invalid sub-store name: {0:?}")]
	InvalidName(String),

	/// The named sub-store does not exist in this transaction's snapshot.
	#[error("sub-store not found: {0}")]
	SubStoreMissing(String),

	/// The configured size bound was reached.
	#[error("storage is full")]
	MapFull,

	/// A single transaction grew past what the engine can hold.
	#[error("transaction is full")]
	TxnFull,

	/// The engine is locked by another connection.
	#[error("storage is busy")]
	Busy,

	/// The transaction handle was already committed or aborted.
	#[error("transaction is closed")]
	Closed,

	/// A write was attempted through a read transaction.
	#[error("transaction is read-only")]
	ReadOnly,

	/// A second write transaction was requested while one is active.
	#[error("a write transaction is already active")]
	WriteActive,

	#[error(transparent)]
	Io(#[from] std::io::Error),

	/// Any other engine failure, stringified.
	#[error("storage backend: {0}")]
	Backend(String),
}

impl From<rusqlite::Error> for StoreError {
	fn from(error: rusqlite::Error) -> StoreError {
		if let rusqlite::Error::SqliteFailure(code, message) = &error {
			if let Some(message) = message {
				if let Some(name) = message.strip_prefix("no such table: ") {
					return StoreError::SubStoreMissing(name.to_string());
				}
			}
			return match code.code {
				rusqlite::ErrorCode::ConstraintViolation => StoreError::KeyExists,
				rusqlite::ErrorCode::DiskFull => StoreError::MapFull,
				rusqlite::ErrorCode::TooBig => StoreError::TxnFull,
				rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked => {
					StoreError::Busy
				}
				_ => StoreError::Backend(error.to_string()),
			};
		}
		StoreError::Backend(error.to_string())
	}
}

impl From<StoreError> for doclite_type::Error {
	fn from(error: StoreError) -> doclite_type::Error {
		match error {
			// The only no-overwrite writer is the insert path, so a key
			// collision always means a duplicate identifier.
			StoreError::KeyExists => doclite_type::Error::DuplicateId,
			other => doclite_type::Error::Storage(other.to_string()),
		}
	}
}
