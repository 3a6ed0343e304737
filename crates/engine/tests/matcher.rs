// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 DocLite

//! Predicate compilation and evaluation against encoded documents.

use bson::{Bson, Document, doc, oid::ObjectId};
use doclite_engine::Matcher;
use doclite_type::Error;

fn matches(filter: Document, document: Document) -> bool {
	let matcher = Matcher::new(&filter).expect("filter compiles");
	let mut bytes = Vec::new();
	document.to_writer(&mut bytes).unwrap();
	matcher.matches_bytes(&bytes)
}

#[test]
fn test_empty_filter_matches_everything() {
	assert!(matches(doc! {}, doc! {}));
	assert!(matches(doc! {}, doc! { "a": 1 }));
}

#[test]
fn test_implicit_equality() {
	assert!(matches(doc! { "name": "amy" }, doc! { "name": "amy", "age": 3 }));
	assert!(!matches(doc! { "name": "amy" }, doc! { "name": "bob" }));
	assert!(!matches(doc! { "name": "amy" }, doc! {}));
	// Numeric equality crosses physical widths.
	assert!(matches(doc! { "n": 42_i64 }, doc! { "n": 42_i32 }));
	assert!(matches(doc! { "n": 42.0 }, doc! { "n": 42_i32 }));
}

#[test]
fn test_equality_on_embedded_documents() {
	assert!(matches(doc! { "a": { "b": 1 } }, doc! { "a": { "b": 1 } }));
	assert!(!matches(doc! { "a": { "b": 1 } }, doc! { "a": { "b": 2 } }));
	assert!(!matches(doc! { "a": { "b": 1 } }, doc! { "a": { "b": 1, "c": 2 } }));
}

#[test]
fn test_array_equality_matches_whole_or_element() {
	let stored = doc! { "tags": ["a", "b"] };
	assert!(matches(doc! { "tags": "a" }, stored.clone()));
	assert!(matches(doc! { "tags": ["a", "b"] }, stored.clone()));
	assert!(!matches(doc! { "tags": "c" }, stored.clone()));
	assert!(!matches(doc! { "tags": ["b", "a"] }, stored));
}

#[test]
fn test_null_equality_matches_missing_field() {
	assert!(matches(doc! { "gone": null }, doc! { "other": 1 }));
	assert!(matches(doc! { "gone": null }, doc! { "gone": null }));
	assert!(!matches(doc! { "gone": null }, doc! { "gone": 1 }));
}

#[test]
fn test_comparison_operators() {
	let stored = doc! { "age": 30 };
	assert!(matches(doc! { "age": { "$gt": 29 } }, stored.clone()));
	assert!(!matches(doc! { "age": { "$gt": 30 } }, stored.clone()));
	assert!(matches(doc! { "age": { "$gte": 30 } }, stored.clone()));
	assert!(matches(doc! { "age": { "$lt": 31 } }, stored.clone()));
	assert!(!matches(doc! { "age": { "$lt": 30 } }, stored.clone()));
	assert!(matches(doc! { "age": { "$lte": 30 } }, stored.clone()));
	assert!(matches(doc! { "age": { "$ne": 31 } }, stored.clone()));
	assert!(!matches(doc! { "age": { "$ne": 30 } }, stored.clone()));
	// Conjunction of operators on one path.
	assert!(matches(doc! { "age": { "$gte": 25, "$lte": 35 } }, stored.clone()));
	assert!(!matches(doc! { "age": { "$gte": 25, "$lte": 29 } }, stored));
}

#[test]
fn test_comparisons_stay_within_type() {
	// The ladder orders numbers below strings, but range predicates do
	// not cross types.
	assert!(!matches(doc! { "v": { "$lt": "zzz" } }, doc! { "v": 1 }));
	assert!(!matches(doc! { "v": { "$gt": 0 } }, doc! { "v": "abc" }));
}

#[test]
fn test_comparison_on_array_elements() {
	let stored = doc! { "scores": [3, 9, 4] };
	assert!(matches(doc! { "scores": { "$gt": 8 } }, stored.clone()));
	assert!(!matches(doc! { "scores": { "$gt": 9 } }, stored));
}

#[test]
fn test_in_and_nin() {
	let stored = doc! { "color": "red" };
	assert!(matches(doc! { "color": { "$in": ["blue", "red"] } }, stored.clone()));
	assert!(!matches(doc! { "color": { "$in": ["blue"] } }, stored.clone()));
	assert!(!matches(doc! { "color": { "$nin": ["blue", "red"] } }, stored.clone()));
	assert!(matches(doc! { "color": { "$nin": ["blue"] } }, stored));
	// $in against an array field matches any element.
	assert!(matches(doc! { "tags": { "$in": ["x"] } }, doc! { "tags": ["x", "y"] }));
	// A missing field is matched by a null in the list.
	assert!(matches(doc! { "gone": { "$in": [null] } }, doc! {}));
}

#[test]
fn test_exists() {
	assert!(matches(doc! { "a": { "$exists": true } }, doc! { "a": null }));
	assert!(!matches(doc! { "a": { "$exists": true } }, doc! { "b": 1 }));
	assert!(matches(doc! { "a": { "$exists": false } }, doc! { "b": 1 }));
	assert!(!matches(doc! { "a": { "$exists": false } }, doc! { "a": 0 }));
}

#[test]
fn test_type_by_tag_and_alias() {
	let stored = doc! { "s": "text", "n": 42, "arr": [1] };
	assert!(matches(doc! { "s": { "$type": "string" } }, stored.clone()));
	assert!(matches(doc! { "s": { "$type": 2 } }, stored.clone()));
	assert!(matches(doc! { "n": { "$type": "int" } }, stored.clone()));
	assert!(!matches(doc! { "n": { "$type": "string" } }, stored.clone()));
	assert!(matches(doc! { "arr": { "$type": "array" } }, stored.clone()));
	// An array also matches its element type.
	assert!(matches(doc! { "arr": { "$type": "int" } }, stored));
}

#[test]
fn test_size() {
	let stored = doc! { "tags": ["a", "b", "c"] };
	assert!(matches(doc! { "tags": { "$size": 3 } }, stored.clone()));
	assert!(!matches(doc! { "tags": { "$size": 2 } }, stored.clone()));
	assert!(!matches(doc! { "name": { "$size": 1 } }, doc! { "name": "x" }));
	assert!(!matches(doc! { "tags": { "$size": 0 } }, stored));
}

#[test]
fn test_all() {
	let stored = doc! { "tags": ["a", "b", "c"] };
	assert!(matches(doc! { "tags": { "$all": ["a", "c"] } }, stored.clone()));
	assert!(!matches(doc! { "tags": { "$all": ["a", "z"] } }, stored));
	// A scalar field satisfies $all when it equals every listed value.
	assert!(matches(doc! { "v": { "$all": [7] } }, doc! { "v": 7 }));
	assert!(!matches(doc! { "v": { "$all": [7, 8] } }, doc! { "v": 7 }));
}

#[test]
fn test_elem_match() {
	let stored = doc! { "items": [ { "qty": 2, "sku": "a" }, { "qty": 9, "sku": "b" } ] };
	assert!(matches(doc! { "items": { "$elemMatch": { "qty": { "$gt": 5 } } } }, stored.clone()));
	assert!(matches(
		doc! { "items": { "$elemMatch": { "qty": { "$gt": 5 }, "sku": "b" } } },
		stored.clone()
	));
	assert!(!matches(
		doc! { "items": { "$elemMatch": { "qty": { "$gt": 5 }, "sku": "a" } } },
		stored.clone()
	));
	// Non-array fields and non-document elements never satisfy it.
	assert!(!matches(doc! { "items": { "$elemMatch": { "x": 1 } } }, doc! { "items": 3 }));
	assert!(!matches(doc! { "items": { "$elemMatch": { "x": 1 } } }, doc! { "items": [1, 2] }));
}

#[test]
fn test_regex_operator_and_literal() {
	let stored = doc! { "name": "Alice Cooper" };
	assert!(matches(doc! { "name": { "$regex": "^Alice" } }, stored.clone()));
	assert!(!matches(doc! { "name": { "$regex": "^alice" } }, stored.clone()));
	assert!(matches(
		doc! { "name": { "$regex": "^alice", "$options": "i" } },
		stored.clone()
	));
	let literal = Bson::RegularExpression(bson::Regex {
		pattern: "cooper$".into(),
		options: "i".into(),
	});
	assert!(matches(doc! { "name": literal }, stored.clone()));
	// Regexes match strings only.
	assert!(!matches(doc! { "age": { "$regex": "1" } }, doc! { "age": 123 }));
}

#[test]
fn test_logical_combinators() {
	let stored = doc! { "a": 1, "b": 2 };
	assert!(matches(doc! { "$and": [ { "a": 1 }, { "b": 2 } ] }, stored.clone()));
	assert!(!matches(doc! { "$and": [ { "a": 1 }, { "b": 3 } ] }, stored.clone()));
	assert!(matches(doc! { "$or": [ { "a": 9 }, { "b": 2 } ] }, stored.clone()));
	assert!(!matches(doc! { "$or": [ { "a": 9 }, { "b": 9 } ] }, stored.clone()));
	assert!(matches(doc! { "$nor": [ { "a": 9 }, { "b": 9 } ] }, stored.clone()));
	assert!(!matches(doc! { "$nor": [ { "a": 1 } ] }, stored.clone()));
	assert!(matches(doc! { "$not": { "a": 9 } }, stored.clone()));
	assert!(!matches(doc! { "$not": { "a": 1 } }, stored));
}

#[test]
fn test_dotted_paths() {
	let stored = doc! { "a": { "b": { "c": 5 } } };
	assert!(matches(doc! { "a.b.c": 5 }, stored.clone()));
	assert!(!matches(doc! { "a.b.c": 6 }, stored.clone()));
	assert!(!matches(doc! { "a.b.z": 5 }, stored));
}

#[test]
fn test_dotted_paths_through_arrays() {
	let stored = doc! { "items": [ { "price": 5 }, { "price": 11 } ] };
	// Element-wise traversal: any element may satisfy the predicate.
	assert!(matches(doc! { "items.price": 11 }, stored.clone()));
	assert!(matches(doc! { "items.price": { "$lt": 6 } }, stored.clone()));
	assert!(!matches(doc! { "items.price": 99 }, stored.clone()));
	// Numeric segments index into the array.
	assert!(matches(doc! { "items.0.price": 5 }, stored.clone()));
	assert!(!matches(doc! { "items.0.price": 11 }, stored.clone()));
	assert!(matches(doc! { "items.1.price": 11 }, stored));
}

#[test]
fn test_id_equality() {
	let id = ObjectId::new();
	let stored = doc! { "_id": id, "x": 1 };
	assert!(matches(doc! { "_id": id }, stored.clone()));
	assert!(!matches(doc! { "_id": ObjectId::new() }, stored));
}

#[test]
fn test_compile_errors() {
	let cases = vec![
		doc! { "$unknown": 1 },
		doc! { "a": { "$badop": 1 } },
		doc! { "$and": "not an array" },
		doc! { "$and": [] },
		doc! { "$or": [ "not a document" ] },
		doc! { "$not": 5 },
		doc! { "a": { "$in": 5 } },
		doc! { "a": { "$size": "big" } },
		doc! { "a": { "$type": "nonsense" } },
		doc! { "a": { "$elemMatch": 3 } },
		doc! { "a": { "$regex": "(" } },
		doc! { "a": { "$options": "i" } },
		doc! { "a": { "$gt": 1, "plain": 2 } },
	];
	for filter in cases {
		let err = Matcher::new(&filter).expect_err(&format!("{filter:?} should not compile"));
		assert!(matches!(err, Error::PredicateCompile(_)), "{filter:?}");
		assert_eq!(err.code(), 5);
	}
}

#[test]
fn test_from_json() {
	let matcher = Matcher::from_json(r#"{ "age": { "$gte": 25 } }"#).unwrap();
	let mut bytes = Vec::new();
	doc! { "age": 30 }.to_writer(&mut bytes).unwrap();
	assert!(matcher.matches_bytes(&bytes));
	assert!(Matcher::from_json("{ nope").is_err());
}

#[test]
fn test_evaluation_is_pure() {
	let matcher = Matcher::new(&doc! { "n": { "$gt": 5 } }).unwrap();
	let mut bytes = Vec::new();
	doc! { "n": 10 }.to_writer(&mut bytes).unwrap();
	for _ in 0..3 {
		assert!(matcher.matches_bytes(&bytes));
	}
	// Undecodable bytes never match and never fail.
	assert!(!matcher.matches_bytes(b"\x01\x02\x03"));
}
