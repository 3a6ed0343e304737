// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 DocLite

use std::cmp::Ordering;

use bson::{Bson, Document, oid::ObjectId};
use bson::raw::RawDocument;
use doclite_store::{KvCursor, SubStore};
use doclite_transaction::{TransactionManager, TxnGuard};
use doclite_type::Error;
use doclite_type::value::compare;

use crate::matcher::Matcher;
use crate::{Result, document};

/// Lazy iterator over a collection or a filtered scan.
///
/// Options may be changed until the first `next`; `more` only peeks and
/// does not freeze them. Without a sort the scan streams in identifier
/// order; with one, matches are materialized and ordered by extracted
/// sort keys before skip/limit apply. Dropping the cursor releases the
/// store cursor and returns an auto-acquired read transaction to the
/// handle's pool.
pub struct Cursor {
	manager: TransactionManager,
	guard: Option<TxnGuard>,
	sub_store: SubStore,
	matcher: Option<Matcher>,
	/// Point-lookup key for an exact `{_id}` filter.
	exact: Option<ObjectId>,
	skip: u64,
	limit: u64,
	sort: Option<Document>,
	projection: Option<Document>,
	started: bool,
	exhausted: bool,
	exact_consumed: bool,
	kv: Option<KvCursor>,
	sorted: Option<std::vec::IntoIter<Document>>,
	peeked: Option<Document>,
	skipped: u64,
	emitted: u64,
}

impl std::fmt::Debug for Cursor {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Cursor").finish_non_exhaustive()
	}
}

impl Cursor {
	pub(crate) fn new(
		manager: TransactionManager,
		guard: TxnGuard,
		sub_store: SubStore,
		matcher: Option<Matcher>,
		exact: Option<ObjectId>,
	) -> Cursor {
		Cursor {
			manager,
			guard: Some(guard),
			sub_store,
			matcher,
			exact,
			skip: 0,
			limit: 0,
			sort: None,
			projection: None,
			started: false,
			exhausted: false,
			exact_consumed: false,
			kv: None,
			sorted: None,
			peeked: None,
			skipped: 0,
			emitted: 0,
		}
	}

	/// Number of matches to pass over before emitting.
	pub fn set_skip(&mut self, skip: u64) -> Result<()> {
		self.ensure_not_started()?;
		self.reset_scan();
		self.skip = skip;
		Ok(())
	}

	/// Maximum number of documents to emit; zero means no limit.
	pub fn set_limit(&mut self, limit: u64) -> Result<()> {
		self.ensure_not_started()?;
		self.reset_scan();
		self.limit = limit;
		Ok(())
	}

	/// Sort specification: field paths mapped to 1 (ascending) or -1.
	pub fn set_sort(&mut self, sort: Option<Document>) -> Result<()> {
		self.ensure_not_started()?;
		self.reset_scan();
		self.sort = sort;
		Ok(())
	}

	/// Projection document applied to every emitted document.
	pub fn set_projection(&mut self, projection: Option<Document>) -> Result<()> {
		self.ensure_not_started()?;
		self.reset_scan();
		self.projection = projection;
		Ok(())
	}

	/// Whether another document is available. Peeking does not count as
	/// starting iteration; options stay changeable until the first `next`.
	pub fn more(&mut self) -> Result<bool> {
		if self.peeked.is_none() {
			self.peeked = self.fetch()?;
		}
		Ok(self.peeked.is_some())
	}

	/// Returns the next matching document, or `None` once exhausted.
	pub fn try_next(&mut self) -> Result<Option<Document>> {
		self.started = true;
		if let Some(document) = self.peeked.take() {
			return Ok(Some(document));
		}
		let next = self.fetch()?;
		if next.is_none() {
			self.finish();
		}
		Ok(next)
	}

	fn ensure_not_started(&self) -> Result<()> {
		if self.started { Err(Error::CursorStarted) } else { Ok(()) }
	}

	/// Discards peeked state so the scan restarts under new options.
	/// Only reachable before the first `next`, where nothing has been
	/// handed out yet.
	fn reset_scan(&mut self) {
		self.peeked = None;
		self.kv = None;
		self.sorted = None;
		self.exact_consumed = false;
		self.skipped = 0;
		self.emitted = 0;
	}

	fn fetch(&mut self) -> Result<Option<Document>> {
		if self.exhausted {
			return Ok(None);
		}
		if self.limit > 0 && self.emitted >= self.limit {
			return Ok(None);
		}
		let next = self.advance();
		match next {
			Ok(Some(mut document)) => {
				self.emitted += 1;
				if let Some(projection) = &self.projection {
					document::apply_projection(&mut document, projection);
				}
				Ok(Some(document))
			}
			Ok(None) => Ok(None),
			Err(error) => {
				self.finish();
				Err(error)
			}
		}
	}

	fn advance(&mut self) -> Result<Option<Document>> {
		if self.sort.is_some() && self.sorted.is_none() {
			self.materialize_sorted()?;
		}
		if let Some(sorted) = &mut self.sorted {
			return Ok(sorted.next());
		}
		loop {
			let Some(candidate) = self.scan_step()? else { return Ok(None) };
			if self.skipped < self.skip {
				self.skipped += 1;
				continue;
			}
			return Ok(Some(candidate));
		}
	}

	/// One raw step: the next stored document passing the filter.
	fn scan_step(&mut self) -> Result<Option<Document>> {
		let Some(guard) = &self.guard else { return Ok(None) };

		// Exact-identifier filters read one key instead of scanning.
		if let Some(id) = self.exact {
			if self.exact_consumed {
				return Ok(None);
			}
			self.exact_consumed = true;
			let bytes = guard.txn.get(&self.sub_store, &id.bytes())?;
			return match bytes {
				Some(bytes) => Ok(Some(document::decode(&bytes)?)),
				None => Ok(None),
			};
		}
		if self.kv.is_none() {
			let mut kv = KvCursor::new(&guard.txn, &self.sub_store);
			kv.seek_first();
			self.kv = Some(kv);
		}
		let kv = self.kv.as_mut().expect("cursor just opened");
		loop {
			let Some((_, bytes)) = kv.next()? else { return Ok(None) };
			let matched = match &self.matcher {
				None => true,
				Some(matcher) => match RawDocument::from_bytes(&bytes) {
					Ok(raw) => matcher.matches(raw),
					Err(_) => false,
				},
			};
			if matched {
				return Ok(Some(document::decode(&bytes)?));
			}
		}
	}

	fn materialize_sorted(&mut self) -> Result<()> {
		let mut matches = Vec::new();
		while let Some(document) = self.scan_step()? {
			matches.push(document);
		}
		let spec = self.sort.clone().unwrap_or_default();
		matches.sort_by(|a, b| compare_by_spec(a, b, &spec));
		let mut iter = matches.into_iter();
		for _ in 0..self.skip {
			if iter.next().is_none() {
				break;
			}
		}
		self.sorted = Some(iter);
		Ok(())
	}

	fn finish(&mut self) {
		self.exhausted = true;
		self.kv = None;
		self.sorted = None;
		if let Some(guard) = self.guard.take() {
			self.manager.release_read(guard);
		}
	}
}

impl Iterator for Cursor {
	type Item = Result<Document>;

	fn next(&mut self) -> Option<Self::Item> {
		self.try_next().transpose()
	}
}

impl Drop for Cursor {
	fn drop(&mut self) {
		self.finish();
	}
}

fn compare_by_spec(a: &Document, b: &Document, spec: &Document) -> Ordering {
	for (path, direction) in spec.iter() {
		let order = compare(document::sort_key(a, path), document::sort_key(b, path));
		let order = if descending(direction) { order.reverse() } else { order };
		if order != Ordering::Equal {
			return order;
		}
	}
	Ordering::Equal
}

fn descending(direction: &Bson) -> bool {
	match direction {
		Bson::Int32(n) => *n < 0,
		Bson::Int64(n) => *n < 0,
		Bson::Double(n) => *n < 0.0,
		_ => false,
	}
}
