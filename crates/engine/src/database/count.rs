// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 DocLite

use bson::Document;
use doclite_catalog::Catalog;
use tracing::instrument;

use super::{Database, FindOptions, validate_collection_arg};
use crate::Result;

impl Database {
	/// Number of documents in the collection. Without a filter this reads
	/// the collection counter; with one it runs a filtered scan.
	#[instrument(name = "database::count", level = "debug", skip(self, filter))]
	pub fn count(&self, collection: &str, filter: Option<&Document>) -> Result<u64> {
		validate_collection_arg(collection)?;
		match filter {
			None => self.with_read(|txn| Ok(Catalog::get_def(txn, collection)?.count)),
			Some(filter) if filter.is_empty() => {
				self.with_read(|txn| Ok(Catalog::get_def(txn, collection)?.count))
			}
			Some(filter) => {
				let mut cursor = self.find(collection, Some(filter), FindOptions::default())?;
				let mut matched = 0u64;
				while cursor.try_next()?.is_some() {
					matched += 1;
				}
				Ok(matched)
			}
		}
	}
}
