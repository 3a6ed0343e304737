// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 DocLite

//! Document helpers shared by the façade and the cursor: identifier
//! handling, encode/decode error funneling, extended-JSON parsing,
//! sort-key extraction and projection.

use bson::{Bson, Document, oid::ObjectId};
use doclite_type::Error;

use crate::Result;

/// Validates and normalizes a document for insertion: a missing `_id`
/// gets a freshly generated identifier, a present `_id` must be an
/// object id, and the identifier always leads the stored document.
pub(crate) fn prepare_for_insert(document: &Document) -> Result<(ObjectId, Document)> {
	let id = match document.get("_id") {
		None => ObjectId::new(),
		Some(Bson::ObjectId(id)) => *id,
		Some(_) => return Err(Error::InvalidIdType),
	};
	let mut stored = Document::new();
	stored.insert("_id", id);
	for (key, value) in document.iter() {
		if key != "_id" {
			stored.insert(key.clone(), value.clone());
		}
	}
	Ok((id, stored))
}

pub(crate) fn encode(document: &Document) -> Result<Vec<u8>> {
	let mut bytes = Vec::new();
	document
		.to_writer(&mut bytes)
		.map_err(|e| Error::InvalidDocument(e.to_string()))?;
	Ok(bytes)
}

pub(crate) fn decode(bytes: &[u8]) -> Result<Document> {
	Document::from_reader(bytes).map_err(|e| Error::InvalidDocument(e.to_string()))
}

/// Parses an extended-JSON object into a document.
pub fn document_from_json(json: &str) -> Result<Document> {
	let value: serde_json::Value =
		serde_json::from_str(json).map_err(|e| Error::InvalidDocument(e.to_string()))?;
	let value = Bson::try_from(value).map_err(|e| Error::InvalidDocument(e.to_string()))?;
	match value {
		Bson::Document(document) => Ok(document),
		_ => Err(Error::InvalidDocument("expected a JSON object".into())),
	}
}

/// Extracts the value at a dotted path for sort-key purposes; a missing
/// field becomes a null placeholder.
pub(crate) fn sort_key<'a>(document: &'a Document, path: &str) -> &'a Bson {
	let segments: Vec<&str> = path.split('.').collect();
	crate::update::path::get(document, &segments).unwrap_or(&Bson::Null)
}

/// Applies a projection in place. Any true-ish non-`_id` entry switches to
/// inclusion mode (listed top-level fields kept, `_id` kept unless
/// excluded); otherwise the listed fields are removed.
pub(crate) fn apply_projection(document: &mut Document, projection: &Document) {
	let inclusion = projection.iter().any(|(key, value)| key != "_id" && truthy(value));
	if inclusion {
		let keep: Vec<&str> = projection
			.iter()
			.filter(|(_, value)| truthy(value))
			.map(|(key, _)| key.split('.').next().unwrap_or(key.as_str()))
			.collect();
		let id_excluded = matches!(projection.get("_id"), Some(value) if !truthy(value));
		let keys: Vec<String> = document.keys().cloned().collect();
		for key in keys {
			if key == "_id" {
				if id_excluded {
					document.remove(&key);
				}
			} else if !keep.contains(&key.as_str()) {
				document.remove(&key);
			}
		}
	} else {
		for (key, _) in projection.iter() {
			let top = key.split('.').next().unwrap_or(key.as_str());
			document.remove(top);
		}
	}
}

fn truthy(value: &Bson) -> bool {
	match value {
		Bson::Boolean(b) => *b,
		Bson::Int32(n) => *n != 0,
		Bson::Int64(n) => *n != 0,
		Bson::Double(n) => *n != 0.0,
		Bson::Null => false,
		_ => true,
	}
}
