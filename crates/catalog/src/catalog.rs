// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 DocLite

//! Catalog of collections.
//!
//! One record per collection in the `__catalog` sub-store, keyed by the
//! collection name and holding a BSON-encoded definition: name, document
//! counter, optional configuration record. The counter is persisted under
//! the same transaction as the data it counts, so abort rolls both back.

use bson::{Bson, Document, doc};
use doclite_store::{KvCursor, SubStore, Txn};
use doclite_type::Error;
use tracing::instrument;

use crate::Result;

/// Name of the sub-store holding collection records.
pub const CATALOG_SUB_STORE: &str = "__catalog";

/// A collection's catalog record.
#[derive(Clone, Debug, PartialEq)]
pub struct CollectionDef {
	pub name: String,
	pub count: u64,
	pub options: Option<Document>,
}

/// Catalog operations. Stateless; every call runs under the caller's
/// transaction.
pub struct Catalog;

impl Catalog {
	/// Creates the catalog sub-store. Run once per environment open,
	/// under a write transaction.
	pub fn init(txn: &Txn) -> Result<()> {
		txn.create_sub_store(CATALOG_SUB_STORE)?;
		Ok(())
	}

	#[instrument(name = "catalog::collection::create", level = "trace", skip(txn, options))]
	pub fn create_collection(
		txn: &Txn,
		name: &str,
		options: Option<Document>,
	) -> Result<CollectionDef> {
		validate_collection_name(name)?;
		if Self::collection_exists(txn, name)? {
			return Err(Error::CollectionExists(name.to_string()));
		}
		txn.create_sub_store(name)?;
		let def = CollectionDef { name: name.to_string(), count: 0, options };
		Self::write_def(txn, &def)?;
		Ok(def)
	}

	#[instrument(name = "catalog::collection::drop", level = "trace", skip(txn))]
	pub fn drop_collection(txn: &Txn, name: &str) -> Result<()> {
		validate_collection_name(name)?;
		if !Self::collection_exists(txn, name)? {
			return Err(Error::CollectionNotFound(name.to_string()));
		}
		txn.drop_sub_store(name)?;
		txn.delete(&catalog_store()?, name.as_bytes())?;
		Ok(())
	}

	pub fn collection_exists(txn: &Txn, name: &str) -> Result<bool> {
		if name.is_empty() {
			return Err(Error::InvalidArgument("collection name is empty".into()));
		}
		Ok(Self::find_def(txn, name)?.is_some())
	}

	#[instrument(name = "catalog::collection::list", level = "debug", skip(txn))]
	pub fn list_collections(txn: &Txn) -> Result<Vec<String>> {
		let store = catalog_store()?;
		let mut cursor = KvCursor::new(txn, &store);
		cursor.seek_first();
		let mut names = Vec::new();
		while let Some((key, _)) = cursor.next().map_err(Error::from)? {
			match String::from_utf8(key) {
				Ok(name) => names.push(name),
				Err(_) => return Err(Error::Storage("corrupt catalog key".into())),
			}
		}
		Ok(names)
	}

	pub fn find_def(txn: &Txn, name: &str) -> Result<Option<CollectionDef>> {
		let bytes = match txn.get(&catalog_store()?, name.as_bytes()) {
			Ok(bytes) => bytes,
			Err(error) => return Err(error.into()),
		};
		bytes.map(|bytes| decode_def(&bytes)).transpose()
	}

	/// Like [`Catalog::find_def`] but a missing collection is an error.
	pub fn get_def(txn: &Txn, name: &str) -> Result<CollectionDef> {
		if name.is_empty() {
			return Err(Error::InvalidArgument("collection name is empty".into()));
		}
		Self::find_def(txn, name)?.ok_or_else(|| Error::CollectionNotFound(name.to_string()))
	}

	/// Adjusts the document counter by `delta` within the caller's write
	/// transaction.
	pub fn add_count(txn: &Txn, name: &str, delta: i64) -> Result<()> {
		let mut def = Self::get_def(txn, name)?;
		let count = (def.count as i64).saturating_add(delta).max(0);
		def.count = count as u64;
		Self::write_def(txn, &def)
	}

	/// Resolves the collection's data sub-store.
	pub fn data_sub_store(txn: &Txn, name: &str) -> Result<SubStore> {
		if !txn.sub_store_exists(name)? {
			return Err(Error::CollectionNotFound(name.to_string()));
		}
		Ok(SubStore::new(name)?)
	}

	fn write_def(txn: &Txn, def: &CollectionDef) -> Result<()> {
		let store = catalog_store()?;
		txn.put(&store, def.name.as_bytes(), &encode_def(def)?, false)?;
		Ok(())
	}
}

fn catalog_store() -> Result<SubStore> {
	Ok(SubStore::new(CATALOG_SUB_STORE)?)
}

fn validate_collection_name(name: &str) -> Result<()> {
	if name.is_empty() {
		return Err(Error::InvalidArgument("collection name is empty".into()));
	}
	if name.starts_with("__") {
		return Err(Error::InvalidArgument(format!("collection name is reserved: {name}")));
	}
	SubStore::new(name)
		.map_err(|_| Error::InvalidArgument(format!("invalid collection name: {name}")))?;
	Ok(())
}

fn encode_def(def: &CollectionDef) -> Result<Vec<u8>> {
	let mut record = doc! {
		"name": &def.name,
		"count": def.count as i64,
	};
	if let Some(options) = &def.options {
		record.insert("options", options.clone());
	}
	let mut bytes = Vec::new();
	record.to_writer(&mut bytes).map_err(|e| Error::Storage(e.to_string()))?;
	Ok(bytes)
}

fn decode_def(bytes: &[u8]) -> Result<CollectionDef> {
	let record = Document::from_reader(bytes).map_err(|e| Error::Storage(e.to_string()))?;
	let name = match record.get("name") {
		Some(Bson::String(name)) => name.clone(),
		_ => return Err(Error::Storage("corrupt catalog record: name".into())),
	};
	let count = match record.get("count") {
		Some(Bson::Int64(count)) => (*count).max(0) as u64,
		_ => return Err(Error::Storage("corrupt catalog record: count".into())),
	};
	let options = match record.get("options") {
		Some(Bson::Document(options)) => Some(options.clone()),
		_ => None,
	};
	Ok(CollectionDef { name, count, options })
}
