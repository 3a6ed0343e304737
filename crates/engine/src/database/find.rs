// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 DocLite

use bson::Document;
use doclite_catalog::Catalog;
use doclite_store::SubStore;
use tracing::instrument;

use super::{Database, FindOptions, validate_collection_arg};
use crate::cursor::Cursor;
use crate::matcher::{self, Matcher};
use crate::Result;

impl Database {
	/// Opens a cursor over the collection. An exact `{_id: <object id>}`
	/// filter becomes a point lookup instead of a scan.
	#[instrument(name = "database::find", level = "debug", skip(self, filter, options))]
	pub fn find(
		&self,
		collection: &str,
		filter: Option<&Document>,
		options: FindOptions,
	) -> Result<Cursor> {
		validate_collection_arg(collection)?;
		let guard = self.manager().read_txn()?;
		let prepared = prepare(&guard.txn, collection, filter);
		let (sub_store, matcher, exact) = match prepared {
			Ok(prepared) => prepared,
			Err(error) => {
				self.manager().release_read(guard);
				return Err(error);
			}
		};
		let mut cursor = Cursor::new(self.manager().clone(), guard, sub_store, matcher, exact);
		cursor.set_skip(options.skip).expect("cursor not started");
		cursor.set_limit(options.limit).expect("cursor not started");
		cursor.set_sort(options.sort).expect("cursor not started");
		cursor.set_projection(options.projection).expect("cursor not started");
		Ok(cursor)
	}

	/// Returns the first matching document, if any.
	#[instrument(name = "database::find_one", level = "debug", skip(self, filter))]
	pub fn find_one(&self, collection: &str, filter: Option<&Document>) -> Result<Option<Document>> {
		let mut cursor =
			self.find(collection, filter, FindOptions { limit: 1, ..FindOptions::default() })?;
		cursor.try_next()
	}

	/// Compiles an extended-JSON predicate and runs [`Database::find`].
	pub fn find_json(&self, collection: &str, filter: &str, options: FindOptions) -> Result<Cursor> {
		let filter = crate::document::document_from_json(filter)
			.map_err(|e| doclite_type::Error::PredicateCompile(e.to_string()))?;
		self.find(collection, Some(&filter), options)
	}
}

type Prepared = (SubStore, Option<Matcher>, Option<bson::oid::ObjectId>);

fn prepare(
	txn: &doclite_store::Txn,
	collection: &str,
	filter: Option<&Document>,
) -> Result<Prepared> {
	Catalog::get_def(txn, collection)?;
	let sub_store = Catalog::data_sub_store(txn, collection)?;
	let (matcher, exact) = match filter {
		None => (None, None),
		Some(filter) if filter.is_empty() => (None, None),
		Some(filter) => match matcher::as_id_lookup(filter) {
			Some(id) => (None, Some(id)),
			None => (Some(Matcher::new(filter)?), None),
		},
	};
	Ok((sub_store, matcher, exact))
}
