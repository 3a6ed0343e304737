// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 DocLite

use rusqlite::{OptionalExtension, params};

use crate::sub_store::SubStore;
use crate::txn::Txn;
use crate::Result;

enum Position {
	Start,
	SeekGe(Vec<u8>),
	After(Vec<u8>),
}

/// Byte-ordered cursor over one sub-store.
///
/// The cursor is stateless on the engine side: each step re-seeks past the
/// last returned key. That keeps it valid while the same transaction
/// rewrites or deletes rows under it, which the update and delete paths
/// rely on.
pub struct KvCursor {
	txn: Txn,
	table: String,
	position: Position,
}

impl KvCursor {
	pub fn new(txn: &Txn, sub_store: &SubStore) -> KvCursor {
		KvCursor {
			txn: txn.clone(),
			table: sub_store.table().to_string(),
			position: Position::Start,
		}
	}

	/// Repositions before the first key.
	pub fn seek_first(&mut self) {
		self.position = Position::Start;
	}

	/// Repositions so the next step returns the first key `>= key`.
	pub fn seek(&mut self, key: &[u8]) {
		self.position = Position::SeekGe(key.to_vec());
	}

	/// Advances and returns the entry at the new position, or `None` once
	/// the sub-store is exhausted.
	pub fn next(&mut self) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
		let row = self.txn.with_conn(|conn| {
			let (sql, bound) = match &self.position {
				Position::Start => {
					(format!("SELECT k, v FROM {} ORDER BY k LIMIT 1", self.table), None)
				}
				Position::SeekGe(key) => (
					format!("SELECT k, v FROM {} WHERE k >= ?1 ORDER BY k LIMIT 1", self.table),
					Some(key.clone()),
				),
				Position::After(key) => (
					format!("SELECT k, v FROM {} WHERE k > ?1 ORDER BY k LIMIT 1", self.table),
					Some(key.clone()),
				),
			};
			let entry = |row: &rusqlite::Row| {
				Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, Vec<u8>>(1)?))
			};
			match bound {
				Some(bound) => {
					conn.query_row(&sql, params![bound], entry).optional().map_err(Into::into)
				}
				None => conn.query_row(&sql, [], entry).optional().map_err(Into::into),
			}
		})?;
		if let Some((key, _)) = &row {
			self.position = Position::After(key.clone());
		}
		Ok(row)
	}
}
