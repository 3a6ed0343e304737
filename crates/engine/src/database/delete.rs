// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 DocLite

use bson::Document;
use bson::raw::RawDocument;
use doclite_catalog::Catalog;
use doclite_store::KvCursor;
use tracing::instrument;

use super::update::{CompiledFilter, compile_filter};
use super::{Database, validate_collection_arg};
use crate::Result;

impl Database {
	/// Deletes the first matching document. Returns the deleted count.
	#[instrument(name = "database::delete_one", level = "debug", skip(self, filter))]
	pub fn delete_one(&self, collection: &str, filter: Option<&Document>) -> Result<u64> {
		self.run_delete(collection, filter, true)
	}

	/// Deletes every matching document.
	#[instrument(name = "database::delete_many", level = "debug", skip(self, filter))]
	pub fn delete_many(&self, collection: &str, filter: Option<&Document>) -> Result<u64> {
		self.run_delete(collection, filter, false)
	}

	fn run_delete(
		&self,
		collection: &str,
		filter: Option<&Document>,
		first_only: bool,
	) -> Result<u64> {
		validate_collection_arg(collection)?;
		let filter = compile_filter(filter)?;
		self.with_write(|txn| {
			Catalog::get_def(txn, collection)?;
			let sub_store = Catalog::data_sub_store(txn, collection)?;
			let mut deleted = 0u64;

			if let CompiledFilter::Exact(id) = &filter {
				if txn.delete(&sub_store, &id.bytes())? {
					deleted = 1;
				}
			} else {
				let mut kv = KvCursor::new(txn, &sub_store);
				kv.seek_first();
				while let Some((key, bytes)) = kv.next()? {
					let matched = match &filter {
						CompiledFilter::All => true,
						CompiledFilter::Matcher(matcher) => {
							match RawDocument::from_bytes(&bytes) {
								Ok(raw) => matcher.matches(raw),
								Err(_) => false,
							}
						}
						CompiledFilter::Exact(_) => unreachable!("handled above"),
					};
					if !matched {
						continue;
					}
					txn.delete(&sub_store, &key)?;
					deleted += 1;
					if first_only {
						break;
					}
				}
			}

			if deleted > 0 {
				Catalog::add_count(txn, collection, -(deleted as i64))?;
			}
			Ok((deleted, deleted))
		})
	}
}
