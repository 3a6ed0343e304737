// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 DocLite

//! The update executor: interprets a modifier document against an existing
//! document and produces the new one.
//!
//! A document with no `$`-prefixed top-level key is a replacement. Either
//! way the result is built in a scratch document and the store is only
//! touched on success; `_id` always survives unchanged and leads the
//! result.

use std::cmp::Ordering;

use bson::{Bson, Document};
use doclite_type::Error;
use doclite_type::value::compare;

use crate::Result;

pub(crate) mod path;

/// Applies `update` to `existing` and returns the new document.
pub fn apply_update(existing: &Document, update: &Document) -> Result<Document> {
	let id = existing.get("_id").cloned();
	let modifiers = update.keys().filter(|k| k.starts_with('$')).count();
	if modifiers == 0 {
		let mut replacement = update.clone();
		replacement.remove("_id");
		return Ok(with_id_first(replacement, id));
	}
	if modifiers != update.len() {
		return Err(Error::MalformedUpdate("cannot mix modifiers and fields".into()));
	}

	let mut document = existing.clone();
	for (modifier, operand) in update.iter() {
		let Bson::Document(operand) = operand else {
			return Err(Error::MalformedUpdate(format!("{modifier} requires a document")));
		};
		for (field_path, value) in operand.iter() {
			apply_modifier(&mut document, modifier, field_path, value)?;
		}
	}
	Ok(with_id_first(document, id))
}

fn apply_modifier(
	document: &mut Document,
	modifier: &str,
	field_path: &str,
	value: &Bson,
) -> Result<()> {
	let segments: Vec<&str> = field_path.split('.').collect();
	if segments.first() == Some(&"_id") {
		return Err(Error::IdImmutable);
	}
	match modifier {
		"$set" => path::set(document, &segments, value.clone()),
		"$unset" => {
			path::remove(document, &segments);
			Ok(())
		}
		"$inc" => apply_inc(document, &segments, field_path, value),
		"$rename" => apply_rename(document, &segments, value),
		"$push" => apply_push(document, &segments, field_path, value),
		"$pull" => apply_pull(document, &segments, field_path, value),
		other => Err(Error::MalformedUpdate(format!("unknown modifier: {other}"))),
	}
}

/// Adds the operand to the existing value (or to a zero of the operand's
/// type when absent). The result takes the wider of the two physical
/// widths and wraps within it.
fn apply_inc(
	document: &mut Document,
	segments: &[&str],
	field_path: &str,
	value: &Bson,
) -> Result<()> {
	if !is_number(value) {
		return Err(Error::MalformedUpdate("$inc requires a numeric operand".into()));
	}
	let next = match path::get(document, segments) {
		None => value.clone(),
		Some(current) => add_numbers(current, value).ok_or_else(|| {
			Error::MalformedUpdate(format!("$inc target {field_path} is not numeric"))
		})?,
	};
	path::set(document, segments, next)
}

fn apply_rename(document: &mut Document, segments: &[&str], value: &Bson) -> Result<()> {
	let Bson::String(destination) = value else {
		return Err(Error::MalformedUpdate("$rename requires a string destination".into()));
	};
	let destination_segments: Vec<&str> = destination.split('.').collect();
	if destination_segments.first() == Some(&"_id") {
		return Err(Error::IdImmutable);
	}
	// Renaming a field onto itself (or an absent source) is a no-op.
	if destination_segments == segments {
		return Ok(());
	}
	match path::remove(document, segments) {
		Some(moved) => path::set(document, &destination_segments, moved),
		None => Ok(()),
	}
}

fn apply_push(
	document: &mut Document,
	segments: &[&str],
	field_path: &str,
	value: &Bson,
) -> Result<()> {
	match path::get_mut(document, segments) {
		None => path::set(document, segments, Bson::Array(vec![value.clone()])),
		Some(Bson::Array(items)) => {
			items.push(value.clone());
			Ok(())
		}
		Some(_) => {
			Err(Error::MalformedUpdate(format!("$push target {field_path} is not an array")))
		}
	}
}

fn apply_pull(
	document: &mut Document,
	segments: &[&str],
	field_path: &str,
	value: &Bson,
) -> Result<()> {
	match path::get_mut(document, segments) {
		None => Ok(()),
		Some(Bson::Array(items)) => {
			items.retain(|element| compare(element, value) != Ordering::Equal);
			Ok(())
		}
		Some(_) => {
			Err(Error::MalformedUpdate(format!("$pull target {field_path} is not an array")))
		}
	}
}

fn is_number(value: &Bson) -> bool {
	matches!(value, Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_))
}

fn add_numbers(a: &Bson, b: &Bson) -> Option<Bson> {
	Some(match (a, b) {
		(Bson::Int32(x), Bson::Int32(y)) => Bson::Int32(x.wrapping_add(*y)),
		(Bson::Int32(x), Bson::Int64(y)) => Bson::Int64(i64::from(*x).wrapping_add(*y)),
		(Bson::Int64(x), Bson::Int32(y)) => Bson::Int64(x.wrapping_add(i64::from(*y))),
		(Bson::Int64(x), Bson::Int64(y)) => Bson::Int64(x.wrapping_add(*y)),
		(Bson::Double(x), y) => Bson::Double(x + as_f64(y)?),
		(x, Bson::Double(y)) => Bson::Double(as_f64(x)? + y),
		_ => return None,
	})
}

fn as_f64(value: &Bson) -> Option<f64> {
	match value {
		Bson::Int32(v) => Some(f64::from(*v)),
		Bson::Int64(v) => Some(*v as f64),
		Bson::Double(v) => Some(*v),
		_ => None,
	}
}

/// Rebuilds the document with `_id` as the first element.
fn with_id_first(document: Document, id: Option<Bson>) -> Document {
	let Some(id) = id else { return document };
	let mut ordered = Document::new();
	ordered.insert("_id", id);
	for (key, value) in document.iter() {
		if key != "_id" {
			ordered.insert(key.clone(), value.clone());
		}
	}
	ordered
}

#[cfg(test)]
mod tests {
	use bson::{Bson, doc, oid::ObjectId};
	use doclite_type::Error;

	use super::apply_update;

	#[test]
	fn test_replacement_preserves_id() {
		let id = ObjectId::new();
		let existing = doc! { "_id": id, "name": "old", "age": 3 };
		let replaced = apply_update(&existing, &doc! { "name": "new" }).unwrap();
		assert_eq!(replaced, doc! { "_id": id, "name": "new" });

		// A conflicting _id in the replacement is overridden.
		let other = ObjectId::new();
		let replaced = apply_update(&existing, &doc! { "_id": other, "x": 1 }).unwrap();
		assert_eq!(replaced.get_object_id("_id").unwrap(), id);
	}

	#[test]
	fn test_set_creates_nested_fields() {
		let existing = doc! { "_id": 1 };
		let updated =
			apply_update(&existing, &doc! { "$set": { "a.b.c": 5, "top": true } }).unwrap();
		assert_eq!(updated, doc! { "_id": 1, "a": { "b": { "c": 5 } }, "top": true });
	}

	#[test]
	fn test_unset_twice_equals_once() {
		let existing = doc! { "_id": 1, "gone": "x", "kept": 2 };
		let update = doc! { "$unset": { "gone": 1 } };
		let once = apply_update(&existing, &update).unwrap();
		let twice = apply_update(&once, &update).unwrap();
		assert_eq!(once, doc! { "_id": 1, "kept": 2 });
		assert_eq!(once, twice);
	}

	#[test]
	fn test_inc_widths() {
		let existing = doc! { "_id": 1, "i": 1_i32, "l": 1_i64, "d": 1.5 };
		let updated = apply_update(
			&existing,
			&doc! { "$inc": { "i": 2_i32, "l": 2_i32, "d": 2_i32, "fresh": 4_i64 } },
		)
		.unwrap();
		assert_eq!(updated.get("i"), Some(&Bson::Int32(3)));
		assert_eq!(updated.get("l"), Some(&Bson::Int64(3)));
		assert_eq!(updated.get("d"), Some(&Bson::Double(3.5)));
		// Absent target: zero of the operand's type plus the operand.
		assert_eq!(updated.get("fresh"), Some(&Bson::Int64(4)));
	}

	#[test]
	fn test_inc_int32_by_double_widens() {
		let existing = doc! { "_id": 1, "n": 2_i32 };
		let updated = apply_update(&existing, &doc! { "$inc": { "n": 0.5 } }).unwrap();
		assert_eq!(updated.get("n"), Some(&Bson::Double(2.5)));
	}

	#[test]
	fn test_inc_non_numeric_target_fails() {
		let existing = doc! { "_id": 1, "s": "text" };
		let err = apply_update(&existing, &doc! { "$inc": { "s": 1 } }).unwrap_err();
		assert!(matches!(err, Error::MalformedUpdate(_)));
		let err = apply_update(&existing, &doc! { "$inc": { "s": "one" } }).unwrap_err();
		assert!(matches!(err, Error::MalformedUpdate(_)));
	}

	#[test]
	fn test_rename_semantics() {
		let existing = doc! { "_id": 1, "a": 7, "b": 8 };
		// Source to itself is a no-op.
		let updated = apply_update(&existing, &doc! { "$rename": { "a": "a" } }).unwrap();
		assert_eq!(updated, existing);
		// Missing source is a no-op.
		let updated = apply_update(&existing, &doc! { "$rename": { "zzz": "y" } }).unwrap();
		assert_eq!(updated, existing);
		// Destination is overwritten.
		let updated = apply_update(&existing, &doc! { "$rename": { "a": "b" } }).unwrap();
		assert_eq!(updated, doc! { "_id": 1, "b": 7 });
	}

	#[test]
	fn test_push_and_pull() {
		let existing = doc! { "_id": 1, "tags": ["a"] };
		let updated = apply_update(&existing, &doc! { "$push": { "tags": "b" } }).unwrap();
		assert_eq!(updated.get("tags"), Some(&Bson::Array(vec!["a".into(), "b".into()])));

		// Pushing to an absent path creates a one-element array.
		let updated = apply_update(&existing, &doc! { "$push": { "fresh": 1 } }).unwrap();
		assert_eq!(updated.get("fresh"), Some(&Bson::Array(vec![Bson::Int32(1)])));

		let existing = doc! { "_id": 1, "tags": ["x", "y", "x"] };
		let updated = apply_update(&existing, &doc! { "$pull": { "tags": "x" } }).unwrap();
		assert_eq!(updated.get("tags"), Some(&Bson::Array(vec!["y".into()])));

		// Pulling from an absent path is a no-op.
		let updated = apply_update(&existing, &doc! { "$pull": { "none": 1 } }).unwrap();
		assert_eq!(updated, existing);
	}

	#[test]
	fn test_push_pull_non_array_fails() {
		let existing = doc! { "_id": 1, "n": 3 };
		assert!(apply_update(&existing, &doc! { "$push": { "n": 1 } }).is_err());
		assert!(apply_update(&existing, &doc! { "$pull": { "n": 1 } }).is_err());
	}

	#[test]
	fn test_pull_uses_numeric_equality() {
		let existing = doc! { "_id": 1, "ns": [1_i32, 2_i64, 3.0] };
		let updated = apply_update(&existing, &doc! { "$pull": { "ns": 2.0 } }).unwrap();
		assert_eq!(updated.get("ns"), Some(&Bson::Array(vec![Bson::Int32(1), Bson::Double(3.0)])));
	}

	#[test]
	fn test_id_is_immutable() {
		let existing = doc! { "_id": 1, "a": 2 };
		for update in [
			doc! { "$set": { "_id": 9 } },
			doc! { "$unset": { "_id": 1 } },
			doc! { "$rename": { "_id": "other" } },
			doc! { "$rename": { "a": "_id" } },
			doc! { "$inc": { "_id": 1 } },
		] {
			let err = apply_update(&existing, &update).unwrap_err();
			assert!(matches!(err, Error::IdImmutable), "{update:?}");
		}
	}

	#[test]
	fn test_mixed_update_rejected() {
		let existing = doc! { "_id": 1 };
		let err = apply_update(&existing, &doc! { "$set": { "a": 1 }, "plain": 2 }).unwrap_err();
		assert!(matches!(err, Error::MalformedUpdate(_)));
	}

	#[test]
	fn test_unknown_modifier_rejected() {
		let existing = doc! { "_id": 1 };
		let err = apply_update(&existing, &doc! { "$mul": { "a": 2 } }).unwrap_err();
		assert!(matches!(err, Error::MalformedUpdate(_)));
	}

	#[test]
	fn test_combined_modifiers() {
		let id = ObjectId::new();
		let existing =
			doc! { "_id": id, "name": "Test", "age": 30, "score": 100, "old_field": "x" };
		let update = doc! {
			"$set": { "name": "Test Updated" },
			"$inc": { "age": 1, "score": 50 },
			"$unset": { "old_field": 1 },
		};
		let updated = apply_update(&existing, &update).unwrap();
		assert_eq!(
			updated,
			doc! { "_id": id, "name": "Test Updated", "age": 31, "score": 150 }
		);
	}

	#[test]
	fn test_id_leads_the_result() {
		let id = ObjectId::new();
		let existing = doc! { "name": "n", "_id": id };
		let updated = apply_update(&existing, &doc! { "$set": { "z": 1 } }).unwrap();
		assert_eq!(updated.keys().next().map(String::as_str), Some("_id"));
	}
}
