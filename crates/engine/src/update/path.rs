// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 DocLite

//! Dotted-path access over owned documents, used by the update executor
//! and by sort-key extraction. Numeric segments index into arrays.

use bson::{Bson, Document};
use doclite_type::Error;

pub(crate) fn get<'a>(document: &'a Document, path: &[&str]) -> Option<&'a Bson> {
	let (first, rest) = path.split_first()?;
	let mut current = document.get(*first)?;
	for segment in rest {
		current = match current {
			Bson::Document(child) => child.get(*segment)?,
			Bson::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
			_ => return None,
		};
	}
	Some(current)
}

pub(crate) fn get_mut<'a>(document: &'a mut Document, path: &[&str]) -> Option<&'a mut Bson> {
	let (first, rest) = path.split_first()?;
	let mut current = document.get_mut(*first)?;
	for segment in rest {
		current = match current {
			Bson::Document(child) => child.get_mut(*segment)?,
			Bson::Array(items) => {
				let index = segment.parse::<usize>().ok()?;
				items.get_mut(index)?
			}
			_ => return None,
		};
	}
	Some(current)
}

/// Sets the value at `path`, creating missing intermediate embedded
/// documents. Descending through an existing non-document (or past an
/// array bound) fails.
pub(crate) fn set(document: &mut Document, path: &[&str], value: Bson) -> crate::Result<()> {
	let (first, rest) = path.split_first().expect("path is never empty");
	if rest.is_empty() {
		document.insert(*first, value);
		return Ok(());
	}
	if document.get(*first).is_none() {
		document.insert(*first, Document::new());
	}
	let child = document.get_mut(*first).expect("present or just inserted");
	set_value(child, first, rest, value)
}

fn set_value(target: &mut Bson, parent: &str, path: &[&str], value: Bson) -> crate::Result<()> {
	match target {
		Bson::Document(child) => set(child, path, value),
		Bson::Array(items) => {
			let index: usize = path[0].parse().map_err(|_| {
				Error::MalformedUpdate(format!("cannot create field {} in array {parent}", path[0]))
			})?;
			let Some(element) = items.get_mut(index) else {
				return Err(Error::MalformedUpdate(format!(
					"index {index} out of bounds in {parent}"
				)));
			};
			if path.len() == 1 {
				*element = value;
				Ok(())
			} else {
				set_value(element, path[0], &path[1..], value)
			}
		}
		_ => Err(Error::MalformedUpdate(format!(
			"cannot create field under non-document value {parent}"
		))),
	}
}

/// Removes the value at `path`, returning it. Absent paths are a no-op.
pub(crate) fn remove(document: &mut Document, path: &[&str]) -> Option<Bson> {
	let (first, rest) = path.split_first()?;
	if rest.is_empty() {
		return document.remove(*first);
	}
	match document.get_mut(*first)? {
		Bson::Document(child) => remove(child, rest),
		_ => None,
	}
}
