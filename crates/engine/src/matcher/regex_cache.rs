// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 DocLite

//! Process-wide cache of compiled regexes, keyed by (pattern, options).
//!
//! Entries are immutable and shared by reference count. The cache is
//! bounded and evicts in insertion order; it is cold after warm-up, so a
//! single mutex is enough.

use std::collections::VecDeque;
use std::sync::Arc;

use doclite_type::Error;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;

use crate::Result;

const CAPACITY: usize = 64;

struct Entry {
	pattern: String,
	options: String,
	regex: Arc<Regex>,
}

static CACHE: Lazy<Mutex<VecDeque<Entry>>> = Lazy::new(|| Mutex::new(VecDeque::new()));

/// Returns the cached regex for (pattern, options), compiling and
/// inserting it on a miss.
pub fn compile(pattern: &str, options: &str) -> Result<Arc<Regex>> {
	let mut cache = CACHE.lock();
	if let Some(entry) =
		cache.iter().find(|e| e.pattern == pattern && e.options == options)
	{
		return Ok(entry.regex.clone());
	}
	let translated = translate(pattern, options)?;
	let regex = Arc::new(
		Regex::new(&translated)
			.map_err(|e| Error::PredicateCompile(format!("invalid regex: {e}")))?,
	);
	cache.push_back(Entry {
		pattern: pattern.to_string(),
		options: options.to_string(),
		regex: regex.clone(),
	});
	if cache.len() > CAPACITY {
		cache.pop_front();
	}
	Ok(regex)
}

/// Empties the cache. Tests call this to tear down process state.
pub fn clear() {
	CACHE.lock().clear();
}

/// Number of cached entries.
pub fn len() -> usize {
	CACHE.lock().len()
}

fn translate(pattern: &str, options: &str) -> Result<String> {
	let mut flags = String::new();
	for flag in options.chars() {
		match flag {
			'i' | 'm' | 's' | 'x' => {
				if !flags.contains(flag) {
					flags.push(flag);
				}
			}
			// Locale and unicode options have no counterpart here and do
			// not change matching.
			'l' | 'u' => {}
			other => {
				return Err(Error::PredicateCompile(format!(
					"unsupported regex option: {other}"
				)));
			}
		}
	}
	if flags.is_empty() {
		Ok(pattern.to_string())
	} else {
		Ok(format!("(?{flags}){pattern}"))
	}
}
