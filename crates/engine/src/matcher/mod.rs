// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 DocLite

//! Predicate compilation and evaluation.
//!
//! A predicate document compiles once into an immutable tree; evaluation
//! walks encoded documents directly and only materializes the leaf values
//! it actually compares. The global regex cache is the single piece of
//! shared mutable state compiled trees reference.

use std::sync::Arc;

use bson::{Bson, Document, oid::ObjectId};
use bson::raw::RawDocument;

use crate::Result;

mod compile;
mod eval;
pub mod regex_cache;

/// A compiled predicate.
#[derive(Debug)]
pub struct Matcher {
	root: Predicate,
}

impl Matcher {
	/// Compiles a predicate document. Unknown operators, malformed
	/// combinator operands and invalid regexes are rejected here;
	/// evaluation itself never fails.
	pub fn new(filter: &Document) -> Result<Matcher> {
		Ok(Matcher { root: compile::compile(filter)? })
	}

	/// Compiles an extended-JSON predicate string.
	pub fn from_json(json: &str) -> Result<Matcher> {
		let filter = crate::document::document_from_json(json)
			.map_err(|e| doclite_type::Error::PredicateCompile(e.to_string()))?;
		Matcher::new(&filter)
	}

	/// Evaluates against an encoded document.
	pub fn matches(&self, document: &RawDocument) -> bool {
		eval::eval(&self.root, document)
	}

	/// Evaluates against raw document bytes; undecodable bytes never match.
	pub fn matches_bytes(&self, bytes: &[u8]) -> bool {
		match RawDocument::from_bytes(bytes) {
			Ok(document) => self.matches(document),
			Err(_) => false,
		}
	}
}

#[derive(Debug)]
pub(crate) enum Predicate {
	/// The empty filter.
	All,
	And(Vec<Predicate>),
	Or(Vec<Predicate>),
	Nor(Vec<Predicate>),
	Not(Box<Predicate>),
	Field(FieldPredicate),
}

#[derive(Debug)]
pub(crate) struct FieldPredicate {
	pub path: Vec<String>,
	pub op: FieldOp,
}

#[derive(Debug)]
pub(crate) enum FieldOp {
	Eq(Bson),
	Ne(Bson),
	Gt(Bson),
	Gte(Bson),
	Lt(Bson),
	Lte(Bson),
	In(Vec<Bson>),
	Nin(Vec<Bson>),
	Exists(bool),
	Type(u8),
	Size(i64),
	All(Vec<Bson>),
	ElemMatch(Box<Predicate>),
	Regex(Arc<regex::Regex>),
}

/// Detects the `{_id: <object id>}` shape the façade turns into a point
/// lookup instead of a scan.
pub(crate) fn as_id_lookup(filter: &Document) -> Option<ObjectId> {
	if filter.len() != 1 {
		return None;
	}
	match filter.get("_id") {
		Some(Bson::ObjectId(id)) => Some(*id),
		_ => None,
	}
}
