// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 DocLite

use bson::Document;
use doclite_catalog::{Catalog, CollectionDef};
use tracing::instrument;

use super::{Database, validate_collection_arg};
use crate::Result;

impl Database {
	#[instrument(name = "database::create_collection", level = "debug", skip(self))]
	pub fn create_collection(&self, collection: &str) -> Result<()> {
		self.create_collection_with_options(collection, None)
	}

	/// Creates a collection with an attached configuration record.
	pub fn create_collection_with_options(
		&self,
		collection: &str,
		options: Option<Document>,
	) -> Result<()> {
		validate_collection_arg(collection)?;
		self.with_write(|txn| {
			Catalog::create_collection(txn, collection, options).map(|_| ((), 0))
		})
	}

	/// Drops a collection and all of its documents.
	#[instrument(name = "database::drop_collection", level = "debug", skip(self))]
	pub fn drop_collection(&self, collection: &str) -> Result<()> {
		validate_collection_arg(collection)?;
		self.with_write(|txn| Catalog::drop_collection(txn, collection).map(|()| ((), 0)))
	}

	pub fn collection_exists(&self, collection: &str) -> Result<bool> {
		validate_collection_arg(collection)?;
		self.with_read(|txn| Catalog::collection_exists(txn, collection))
	}

	pub fn list_collections(&self) -> Result<Vec<String>> {
		self.with_read(Catalog::list_collections)
	}

	/// The collection's catalog record: name, document counter and the
	/// configuration record it was created with.
	pub fn collection_info(&self, collection: &str) -> Result<CollectionDef> {
		validate_collection_arg(collection)?;
		self.with_read(|txn| Catalog::get_def(txn, collection))
	}
}
