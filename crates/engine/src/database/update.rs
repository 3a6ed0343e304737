// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 DocLite

use bson::Document;
use bson::raw::RawDocument;
use doclite_catalog::Catalog;
use doclite_store::{KvCursor, Txn};
use doclite_type::Error;
use tracing::instrument;

use super::{Database, validate_collection_arg};
use crate::matcher::{self, Matcher};
use crate::{Result, document, update};

impl Database {
	/// Applies the update to the first matching document. Returns the
	/// number of modified documents (0 or 1).
	#[instrument(name = "database::update_one", level = "debug", skip(self, filter, update))]
	pub fn update_one(
		&self,
		collection: &str,
		filter: Option<&Document>,
		update: &Document,
	) -> Result<u64> {
		self.run_update(collection, filter, update, true)
	}

	/// Applies the update to every matching document.
	#[instrument(name = "database::update_many", level = "debug", skip(self, filter, update))]
	pub fn update_many(
		&self,
		collection: &str,
		filter: Option<&Document>,
		update: &Document,
	) -> Result<u64> {
		self.run_update(collection, filter, update, false)
	}

	/// Replaces the first matching document wholesale, preserving its
	/// identifier. The replacement must not carry modifier keys.
	#[instrument(name = "database::replace_one", level = "debug", skip(self, filter, replacement))]
	pub fn replace_one(
		&self,
		collection: &str,
		filter: Option<&Document>,
		replacement: &Document,
	) -> Result<u64> {
		if replacement.keys().any(|k| k.starts_with('$')) {
			return Err(Error::MalformedUpdate(
				"replacement document cannot contain modifiers".into(),
			));
		}
		self.run_update(collection, filter, replacement, true)
	}

	fn run_update(
		&self,
		collection: &str,
		filter: Option<&Document>,
		update: &Document,
		first_only: bool,
	) -> Result<u64> {
		validate_collection_arg(collection)?;
		let matcher = compile_filter(filter)?;
		self.with_write(|txn| {
			Catalog::get_def(txn, collection)?;
			let modified = apply_to_matches(txn, collection, &matcher, first_only, |existing| {
				update::apply_update(existing, update)
			})?;
			Ok((modified, modified))
		})
	}
}

pub(super) enum CompiledFilter {
	All,
	Exact(bson::oid::ObjectId),
	Matcher(Matcher),
}

pub(super) fn compile_filter(filter: Option<&Document>) -> Result<CompiledFilter> {
	Ok(match filter {
		None => CompiledFilter::All,
		Some(filter) if filter.is_empty() => CompiledFilter::All,
		Some(filter) => match matcher::as_id_lookup(filter) {
			Some(id) => CompiledFilter::Exact(id),
			None => CompiledFilter::Matcher(Matcher::new(filter)?),
		},
	})
}

/// Walks the collection, applies `transform` to each match and overwrites
/// the stored document with the result. Returns the modified count.
pub(super) fn apply_to_matches(
	txn: &Txn,
	collection: &str,
	filter: &CompiledFilter,
	first_only: bool,
	mut transform: impl FnMut(&Document) -> Result<Document>,
) -> Result<u64> {
	let sub_store = Catalog::data_sub_store(txn, collection)?;
	let mut modified = 0u64;

	// Exact-identifier filters touch one key.
	if let CompiledFilter::Exact(id) = filter {
		if let Some(bytes) = txn.get(&sub_store, &id.bytes())? {
			let existing = document::decode(&bytes)?;
			let next = transform(&existing)?;
			txn.put(&sub_store, &id.bytes(), &document::encode(&next)?, false)?;
			modified = 1;
		}
		return Ok(modified);
	}

	let mut kv = KvCursor::new(txn, &sub_store);
	kv.seek_first();
	while let Some((key, bytes)) = kv.next()? {
		let matched = match filter {
			CompiledFilter::All => true,
			CompiledFilter::Matcher(matcher) => match RawDocument::from_bytes(&bytes) {
				Ok(raw) => matcher.matches(raw),
				Err(_) => false,
			},
			CompiledFilter::Exact(_) => unreachable!("handled above"),
		};
		if !matched {
			continue;
		}
		let existing = document::decode(&bytes)?;
		let next = transform(&existing)?;
		txn.put(&sub_store, &key, &document::encode(&next)?, false)?;
		modified += 1;
		if first_only {
			break;
		}
	}
	Ok(modified)
}
