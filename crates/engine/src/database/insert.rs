// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 DocLite

use bson::{Document, oid::ObjectId};
use doclite_catalog::Catalog;
use doclite_store::Txn;
use tracing::instrument;

use super::{Database, validate_collection_arg};
use crate::{Result, document};

impl Database {
	/// Inserts one document, generating an identifier when `_id` is
	/// absent. A colliding identifier fails with the duplicate error and
	/// leaves the collection unchanged.
	#[instrument(name = "database::insert_one", level = "debug", skip(self, document))]
	pub fn insert_one(&self, collection: &str, document: &Document) -> Result<ObjectId> {
		validate_collection_arg(collection)?;
		self.with_write(|txn| {
			Catalog::get_def(txn, collection)?;
			let id = insert_into(txn, collection, document)?;
			Catalog::add_count(txn, collection, 1)?;
			Ok((id, 1))
		})
	}

	/// Inserts documents in order under one transaction, stopping at the
	/// first failure. In auto-commit mode a failure rolls the whole batch
	/// back; inside an explicit transaction the caller decides.
	#[instrument(name = "database::insert_many", level = "debug", skip(self, documents))]
	pub fn insert_many(&self, collection: &str, documents: &[Document]) -> Result<Vec<ObjectId>> {
		validate_collection_arg(collection)?;
		self.with_write(|txn| {
			Catalog::get_def(txn, collection)?;
			let mut ids = Vec::with_capacity(documents.len());
			for document in documents {
				ids.push(insert_into(txn, collection, document)?);
			}
			Catalog::add_count(txn, collection, ids.len() as i64)?;
			let inserted = ids.len() as u64;
			Ok((ids, inserted))
		})
	}
}

fn insert_into(txn: &Txn, collection: &str, input: &Document) -> Result<ObjectId> {
	let (id, stored) = document::prepare_for_insert(input)?;
	let bytes = document::encode(&stored)?;
	let sub_store = Catalog::data_sub_store(txn, collection)?;
	// No-overwrite put; a key collision surfaces as the duplicate error.
	txn.put(&sub_store, &id.bytes(), &bytes, true)?;
	Ok(id)
}
